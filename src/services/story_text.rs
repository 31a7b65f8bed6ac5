// src/services/story_text.rs
//! Post-processing of generated story text.

const TITLE_SCAN_LINES: usize = 5;
const TITLE_MAX_CHARS: usize = 100;

/// Returns the first of the first five non-blank lines that looks like a
/// title, or `None`.
pub fn extract_title(text: &str) -> Option<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .take(TITLE_SCAN_LINES)
        .find(|line| is_title_line(line))
        .map(str::to_string)
}

fn is_title_line(line: &str) -> bool {
    let starts_upper = line.chars().next().is_some_and(char::is_uppercase);
    starts_upper
        && line.chars().count() < TITLE_MAX_CHARS
        && !line.ends_with(['.', '!', '?'])
}

/// Removes the first occurrence of `title` and any leading blank lines.
pub fn remove_title(text: &str, title: &str) -> String {
    text.replacen(title, "", 1).trim().to_string()
}

/// Prefixes each paragraph with a numbered chapter heading.
pub fn format_chapters(text: &str) -> String {
    text.split("\n\n")
        .map(str::trim)
        .filter(|paragraph| !paragraph.is_empty())
        .enumerate()
        .map(|(index, paragraph)| format!("## Chapter {}\n\n{}", index + 1, paragraph))
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn finds_title_on_first_line() {
        let text = "The Lighthouse Keeper\n\nThe lamp had not been lit in years.";
        assert_eq!(extract_title(text).as_deref(), Some("The Lighthouse Keeper"));
    }

    #[test]
    fn skips_blank_lines_before_title() {
        let text = "\n\n   \n\n\nThe Quiet Harbor\n\nBoats rocked gently.";
        assert_eq!(extract_title(text).as_deref(), Some("The Quiet Harbor"));
    }

    #[test]
    fn rejects_sentences_and_lowercase_lines() {
        assert_eq!(extract_title("It was a dark night."), None);
        assert_eq!(extract_title("what a day"), None);
        assert_eq!(extract_title("Where did they go?"), None);
        assert_eq!(extract_title("Run!"), None);
    }

    #[test]
    fn rejects_long_lines() {
        let long = format!("A{}", "b".repeat(TITLE_MAX_CHARS));
        assert_eq!(extract_title(&long), None);
        let just_under = format!("A{}", "b".repeat(TITLE_MAX_CHARS - 2));
        assert_eq!(extract_title(&just_under), Some(just_under.clone()));
    }

    #[test]
    fn only_scans_five_lines() {
        let text = "one.\ntwo.\nthree.\nfour.\nfive.\nThe Late Title";
        assert_eq!(extract_title(text), None);
    }

    #[test]
    fn removes_title_and_leading_blank_line() {
        let text = "The Sunset Voyage\n\nAs the sun dipped low, the boat rested.";
        assert_eq!(
            remove_title(text, "The Sunset Voyage"),
            "As the sun dipped low, the boat rested."
        );
    }

    #[test]
    fn numbers_chapters_and_drops_empty_paragraphs() {
        let text = "First part.\n\n\n\nSecond part.\n\n   \n\nThird part.";
        let formatted = format_chapters(text);
        assert_eq!(
            formatted,
            "## Chapter 1\n\nFirst part.\n\n## Chapter 2\n\nSecond part.\n\n## Chapter 3\n\nThird part."
        );
    }

    #[test]
    fn empty_body_formats_to_nothing() {
        assert_eq!(format_chapters("\n\n  \n\n"), "");
    }
}
