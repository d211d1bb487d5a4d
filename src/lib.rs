pub mod commands;
pub mod config;
pub mod error;
pub mod models;
pub mod services;

use commands::AppState;
use config::{Cli, Command, ModelAction};
use error::AppError;
use services::content::catalog::ContentCatalog;

pub async fn run(cli: Cli) -> Result<(), AppError> {
    let Cli { config, command } = cli;

    if let Command::Thumbnail { url } = &command {
        return commands::content::show_thumbnail(url);
    }

    tokio::fs::create_dir_all(&config.data_dir).await.map_err(|e| AppError {
        message: format!("Failed to create data directory {}: {}", config.data_dir.display(), e),
    })?;

    let catalog = if matches!(command, Command::Model { .. }) {
        ContentCatalog::default()
    } else {
        ContentCatalog::load(&config.content).await?
    };
    let mut state = AppState::new(config, catalog);

    match command {
        Command::Classify { image, label, output } => {
            commands::classifier::classify_image(&mut state, &image, label, output).await
        }
        Command::Content { label, output } => commands::content::show_content(&mut state, &label, output).await,
        Command::Thumbnail { .. } => Ok(()),
        Command::Check => commands::content::check_content(&mut state).await.map(|_| ()),
        Command::Model { action: ModelAction::Status } => {
            let status = commands::classifier::get_model_status(&state).await;
            println!("{}", serde_json::to_string_pretty(&status)?);
            Ok(())
        }
        Command::Model { action: ModelAction::Download } => commands::classifier::download_model(&state).await,
        Command::Session => {
            let stdin = tokio::io::BufReader::new(tokio::io::stdin());
            commands::session::start_session(&mut state, stdin).await
        }
    }
}
