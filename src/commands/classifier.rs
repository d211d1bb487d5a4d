use crate::commands::{print_view, AppState};
use crate::config::OutputArgs;
use crate::error::AppError;
use crate::models::classify_types::ModelStatus;
use crate::models::content_types::CatalogReport;
use crate::models::view_types::PageView;
use crate::services::classifier::ImageClassifier;
use crate::services::media;
use crate::services::session::SessionContext;
use std::path::Path;

pub async fn get_model_status(state: &AppState) -> ModelStatus {
    let mut status = state.model_manager.status().await;
    if state.model_manager.config_path().exists() {
        // Counting labels only needs the config, not a session.
        match state.model_manager.load_labels().await {
            Ok(labels) => status.labels = labels.len(),
            Err(e) => {
                tracing::warn!(error = %e, "cached model config is unusable");
                status.error = Some(e.message);
            }
        }
    }
    status
}

pub async fn download_model(state: &AppState) -> Result<(), AppError> {
    state.model_manager.download_model().await
}

/// Make sure the model is cached and loaded, then bind the catalog to its
/// vocabulary. Returns the vocabulary.
pub async fn prepare_model(state: &mut AppState) -> Result<Vec<String>, AppError> {
    if !state.model_manager.is_downloaded() {
        state.model_manager.download_model().await?;
    }
    state.model_manager.load_model(!state.config.cpu).await?;

    let vocabulary = state.model_manager.vocabulary()?;
    log_report(&state.catalog.bind_vocabulary(&vocabulary));
    Ok(vocabulary)
}

/// Vocabulary-only variant for commands that never run inference.
pub async fn bind_cached_vocabulary(state: &mut AppState) -> Result<CatalogReport, AppError> {
    let vocabulary = state.model_manager.load_labels().await?;
    let report = state.catalog.bind_vocabulary(&vocabulary);
    log_report(&report);
    Ok(report)
}

fn log_report(report: &CatalogReport) {
    if report.is_clean() {
        tracing::info!("content covers every label");
    } else {
        tracing::warn!(
            missing = report.missing.len(),
            unknown = report.unknown.len(),
            unresolved = report.unresolved.len(),
            "content file does not match the model vocabulary"
        );
    }
}

pub async fn classify_image(
    state: &mut AppState,
    image: &Path,
    label: Option<String>,
    output: OutputArgs,
) -> Result<(), AppError> {
    let vocabulary = prepare_model(state).await?;

    let mut session = SessionContext::new();
    session.submit_image(media::read_upload(image).await?);
    if let Some(label) = label {
        session.select_label(label);
    }

    session.evaluate_blocking(&state.model_manager).await?;

    print_view(&PageView::build(&session, &vocabulary, &state.catalog), output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Cli;
    use crate::services::content::catalog::ContentCatalog;
    use clap::Parser;

    fn state_in(dir: &Path) -> AppState {
        let cli = Cli::try_parse_from([
            "label-showcase",
            "--data-dir",
            dir.to_str().unwrap(),
            "model",
            "status",
        ])
        .unwrap();
        AppState::new(cli.config, ContentCatalog::default())
    }

    #[tokio::test]
    async fn malformed_config_is_reported_in_status() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        std::fs::create_dir_all(&state.model_manager.model_dir).unwrap();
        std::fs::write(state.model_manager.config_path(), "{ not json").unwrap();

        let status = get_model_status(&state).await;
        assert!(!status.ready);
        assert_eq!(status.labels, 0);
        assert!(status.error.unwrap().contains("Failed to parse config JSON"));
    }

    #[tokio::test]
    async fn status_counts_cached_labels() {
        let dir = tempfile::tempdir().unwrap();
        let state = state_in(dir.path());
        std::fs::create_dir_all(&state.model_manager.model_dir).unwrap();
        std::fs::write(state.model_manager.config_path(), r#"{"id2label": {"0": "a", "1": "b"}}"#).unwrap();

        let status = get_model_status(&state).await;
        assert_eq!(status.labels, 2);
        assert!(status.error.is_none());
        assert!(!status.downloaded);
    }
}
