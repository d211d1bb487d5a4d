use crate::error::AppError;
use crate::models::classify_types::PredictionResult;
use crate::services::classifier::ImageClassifier;
use crate::services::media;

/// Per-user state carried between interactions. Every field is replaced
/// wholesale; nothing is merged.
#[derive(Debug, Default, Clone)]
pub struct SessionContext {
    image: Option<Vec<u8>>,
    preview: Option<String>,
    last_prediction: Option<PredictionResult>,
    selected_label: Option<String>,
}

impl SessionContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store a new submission. Empty input leaves the session untouched and
    /// returns `false`.
    pub fn submit_image(&mut self, bytes: Vec<u8>) -> bool {
        if bytes.is_empty() {
            return false;
        }
        self.image = Some(bytes);
        self.preview = None;
        self.last_prediction = None;
        self.selected_label = None;
        true
    }

    pub fn image(&self) -> Option<&[u8]> {
        self.image.as_deref()
    }

    pub fn preview(&self) -> Option<&str> {
        self.preview.as_deref()
    }

    pub fn record_prediction(&mut self, prediction: PredictionResult) {
        self.last_prediction = Some(prediction);
    }

    pub fn last_prediction(&self) -> Option<&PredictionResult> {
        self.last_prediction.as_ref()
    }

    pub fn select_label(&mut self, label: impl Into<String>) {
        self.selected_label = Some(label.into());
    }

    /// Label for the content panel: explicit choice, then prediction, then
    /// the first vocabulary label. Choices outside the vocabulary are ignored.
    pub fn display_label<'a>(&'a self, vocabulary: &'a [String]) -> Option<&'a str> {
        let in_vocab = |label: &&String| vocabulary.contains(*label);
        self.selected_label
            .as_ref()
            .filter(in_vocab)
            .or_else(|| self.last_prediction.as_ref().map(|p| &p.label).filter(in_vocab))
            .or_else(|| vocabulary.first())
            .map(String::as_str)
    }

    /// Classify the stored image if it has not been classified yet.
    pub fn evaluate(&mut self, classifier: &dyn ImageClassifier) -> Result<Option<&PredictionResult>, AppError> {
        let Some(bytes) = self.image.as_deref() else {
            return Ok(None);
        };

        if self.last_prediction.is_none() {
            let image = media::decode_submission(bytes)?;
            let prediction = classifier.classify(&image)?;
            tracing::info!(label = %prediction.label, "prediction");
            self.preview = media::preview_data_uri(&image)
                .map_err(|e| tracing::warn!(error = %e, "could not build preview"))
                .ok();
            self.last_prediction = Some(prediction);
        }

        Ok(self.last_prediction.as_ref())
    }

    /// `evaluate` on the blocking pool. The session is only updated when
    /// classification succeeds.
    pub async fn evaluate_blocking<C>(&mut self, classifier: &C) -> Result<(), AppError>
    where
        C: ImageClassifier + Clone + Send + 'static,
    {
        if self.image.is_none() || self.last_prediction.is_some() {
            return Ok(());
        }

        let mut working = self.clone();
        let classifier = classifier.clone();
        let working = tokio::task::spawn_blocking(move || -> Result<SessionContext, AppError> {
            working.evaluate(&classifier)?;
            Ok(working)
        })
        .await
        .map_err(|e| AppError {
            message: format!("Classification task failed: {}", e),
        })??;

        *self = working;
        Ok(())
    }
}
