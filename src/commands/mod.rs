use crate::config::{AppConfig, OutputArgs};
use crate::error::AppError;
use crate::models::view_types::PageView;
use crate::services::classifier::model_manager::ModelManager;
use crate::services::content::catalog::ContentCatalog;
use crate::services::view;

pub mod classifier;
pub mod content;
pub mod session;

/// Everything a command handler needs, built once at startup.
pub struct AppState {
    pub config: AppConfig,
    pub model_manager: ModelManager,
    pub catalog: ContentCatalog,
}

impl AppState {
    pub fn new(config: AppConfig, catalog: ContentCatalog) -> Self {
        let model_manager = ModelManager::new(
            &config.data_dir,
            &config.model_file,
            config.model_source(),
            config.crop_size,
        );
        Self {
            config,
            model_manager,
            catalog,
        }
    }
}

pub(crate) fn print_view(page: &PageView, output: OutputArgs) -> Result<(), AppError> {
    if output.json {
        println!("{}", serde_json::to_string_pretty(page)?);
    } else {
        print!("{}", view::render_text(page));
    }
    Ok(())
}
