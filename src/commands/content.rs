use crate::commands::classifier::bind_cached_vocabulary;
use crate::commands::{print_view, AppState};
use crate::config::OutputArgs;
use crate::error::AppError;
use crate::models::content_types::CatalogReport;
use crate::models::view_types::PageView;
use crate::services::content::video;

pub async fn show_content(state: &mut AppState, label: &str, output: OutputArgs) -> Result<(), AppError> {
    // Positional keys only resolve once the vocabulary is known.
    if state.model_manager.config_path().exists() {
        bind_cached_vocabulary(state).await?;
    }
    print_view(&PageView::for_label(label, &state.catalog), output)
}

pub fn show_thumbnail(url: &str) -> Result<(), AppError> {
    let thumb = video::thumbnail_url(url).ok_or_else(|| AppError {
        message: format!("No video id found in {}", url),
    })?;
    println!("{}", thumb);
    Ok(())
}

pub async fn check_content(state: &mut AppState) -> Result<CatalogReport, AppError> {
    let report = bind_cached_vocabulary(state).await?;

    if report.is_clean() {
        println!("OK: {} labels, every one has content", state.catalog.len());
    }
    for label in &report.missing {
        println!("missing content for label `{}`", label);
    }
    for key in &report.unknown {
        println!("content for unknown label `{}`", key);
    }
    for key in &report.unresolved {
        println!("positional key `{}` is outside the vocabulary", key);
    }
    Ok(report)
}
