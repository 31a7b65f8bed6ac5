// src/services/prompt_builder.rs
use crate::models::Settings;

/// Heading under which the analysis text is embedded in every story prompt.
pub const VISUAL_DETAILS_MARKER: &str = "VISUAL DETAILS FROM IMAGES";

/// Fixed instruction for the analysis pass.
pub const ANALYSIS_PROMPT: &str = r#"Study these images closely and describe everything a storyteller would need to know about them.

Report on each of the following under its own heading:
1. OBJECTS: every visible object, person, animal, vehicle and structure
2. SCENE: the setting and location (for example a beach, a forest, a city street, a room)
3. MOOD/ATMOSPHERE: the emotional tone of the scene
4. COLORS: the dominant colors and overall palette
5. TIME OF DAY: morning, afternoon, evening, night, or unclear
6. WEATHER/CONDITIONS: weather, lighting and environmental conditions
7. COMPOSITION: arrangement, perspective and focal points
8. ACTIVITY: any actions or movement taking place
9. DETAILS: distinctive textures, patterns or unusual features

Be specific. The description will be used to write a story that must clearly reference these visual elements."#;

pub fn creativity_description(creativity: u8) -> &'static str {
    match creativity {
        0..=3 => "literal and straightforward",
        4..=6 => "moderately creative with some imaginative elements",
        7..=8 => "highly creative and imaginative",
        _ => "extremely creative, imaginative, and unconventional",
    }
}

/// Composes the story-generation instruction. Pure and deterministic.
pub fn build_prompt(settings: &Settings, visual_details: &str) -> String {
    let word_range = settings.length.word_range();
    let creativity = creativity_description(settings.creativity);
    let style = settings.writing_style.to_lowercase();
    let tone = settings.tone.to_string().to_lowercase();
    let perspective = settings.perspective.to_string().to_lowercase();
    let audience = settings.audience.to_string().to_lowercase();

    let mut prompt = format!(
        "Write a {genre_lower} story inspired by the images provided and the visual analysis below.

{marker}:
{visual_details}

STORY REQUIREMENTS:
- Genre: {genre}
- Writing Style: {writing_style}
- Tone: {tone_name}
- Language: {language}
- Length: {word_range}
- Narrative Perspective: {perspective_name}
- Target Audience: {audience_name}
- Creativity Level: {creativity}

GROUNDING RULES:
1. Build the story on the visual details above. Name specific objects, places, colors and elements that appear in the images.
2. Do not invent a setting unrelated to the images. If they show a harbor at dawn, the story happens at that harbor at dawn.
3. Setting, objects, mood and any visible people must match what the images show. Characters you add must fit the scene.
4. Write in a {style} style with a {tone} tone, suitable for {audience}.
5. Tell the story in the {perspective} perspective from start to finish.
6. Aim for roughly {word_range}.
7. Be {creativity} in your interpretation while staying anchored to the images.
8. Give the story a clear narrative arc and separate paragraphs with blank lines.
",
        genre_lower = settings.genre.to_lowercase(),
        marker = VISUAL_DETAILS_MARKER,
        genre = settings.genre,
        writing_style = settings.writing_style,
        tone_name = settings.tone,
        language = settings.language,
        perspective_name = settings.perspective,
        audience_name = settings.audience,
    );

    let mut guideline = 9;
    if settings.include_title {
        prompt.push_str(&format!(
            "{guideline}. Put a short, evocative title alone on the first line.\n"
        ));
        guideline += 1;
    }

    if settings.allow_emojis {
        prompt.push_str(&format!(
            "{guideline}. Emojis are allowed, but use them sparingly.\n"
        ));
    } else {
        prompt.push_str(&format!("{guideline}. Do not use any emojis.\n"));
    }

    prompt.push_str(&format!(
        "\nWrite the story in {}. Begin now:",
        settings.language
    ));

    prompt
}
