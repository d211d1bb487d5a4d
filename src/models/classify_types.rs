use serde::Serialize;

#[derive(Debug, Serialize, Clone)]
pub struct ModelStatus {
    pub downloaded: bool,
    pub loading: bool,
    pub ready: bool,
    pub labels: usize,
    pub error: Option<String>,
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct Prediction {
    pub class_name: String,
    pub confidence: f32,
}

/// Outcome of classifying one submitted image.
///
/// `probabilities` holds one entry per vocabulary label, in vocabulary order.
#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct PredictionResult {
    pub label: String,
    pub probabilities: Vec<Prediction>,
}

impl PredictionResult {
    /// Pair a probability vector with the vocabulary and pick the arg-max label.
    ///
    /// Indices beyond the vocabulary get a `class_<idx>` placeholder name.
    pub fn from_probabilities(labels: &[String], probabilities: &[f32]) -> Option<Self> {
        let probabilities: Vec<Prediction> = probabilities
            .iter()
            .enumerate()
            .map(|(idx, &confidence)| Prediction {
                class_name: labels
                    .get(idx)
                    .cloned()
                    .unwrap_or_else(|| format!("class_{}", idx)),
                confidence,
            })
            .collect();

        let best = probabilities.iter().fold(None::<&Prediction>, |best, p| match best {
            Some(b) if b.confidence >= p.confidence => Some(b),
            _ => Some(p),
        })?;

        Some(Self {
            label: best.class_name.clone(),
            probabilities,
        })
    }

    pub fn confidence_of(&self, label: &str) -> Option<f32> {
        self.probabilities
            .iter()
            .find(|p| p.class_name == label)
            .map(|p| p.confidence)
    }

    /// Predictions sorted by confidence, highest first. Ties keep vocabulary order.
    pub fn ranked(&self) -> Vec<&Prediction> {
        let mut ranked: Vec<&Prediction> = self.probabilities.iter().collect();
        ranked.sort_by(|a, b| b.confidence.partial_cmp(&a.confidence).unwrap_or(std::cmp::Ordering::Equal));
        ranked
    }
}
