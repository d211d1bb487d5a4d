use crate::error::AppError;
use crate::models::classify_types::PredictionResult;
use image::DynamicImage;

pub mod inference;
pub mod model_manager;

/// Anything that maps an image to a label distribution over a fixed vocabulary.
pub trait ImageClassifier {
    fn vocabulary(&self) -> Result<Vec<String>, AppError>;
    fn classify(&self, image: &DynamicImage) -> Result<PredictionResult, AppError>;
}
