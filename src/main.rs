// src/main.rs
use actix_web::{App, HttpServer, middleware, web};
use log::info;
use std::sync::Arc;

use story_imager::config::AppConfig;
use story_imager::handlers::{self, AppState};
use story_imager::services::{ImageProcessor, StoryService, connect_backend};

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));

    info!("Starting story-imager service...");

    let config = AppConfig::from_env()?;
    let backend = connect_backend(&config).await?;

    let mut story_service = StoryService::new(backend);
    if let Some(scenario) = config.mock_scenario {
        info!("Mock story scenario: {}", scenario);
        story_service = story_service.with_mock_scenario(scenario);
    }

    let app_state = AppState {
        story_service: Arc::new(story_service),
        image_processor: Arc::new(ImageProcessor::from_config(&config)),
    };

    info!("Starting HTTP server on {}", config.bind_address);

    HttpServer::new(move || {
        App::new()
            .app_data(web::Data::new(app_state.clone()))
            .wrap(middleware::Logger::default())
            .configure(handlers::configure)
    })
    .bind(&config.bind_address)?
    .run()
    .await?;

    Ok(())
}
