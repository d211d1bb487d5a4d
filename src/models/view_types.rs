use crate::models::content_types::VideoCard;
use serde::Serialize;

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct ProbabilityBar {
    pub label: String,
    pub percent: f32,
    pub highlight: bool,
}

/// Everything one evaluation of the session shows.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct PageView {
    pub prediction: Option<String>,
    pub image_preview: Option<String>,
    pub probabilities: Vec<ProbabilityBar>,
    pub content_label: Option<String>,
    pub texts: Vec<String>,
    pub images: Vec<String>,
    pub videos: Vec<VideoCard>,
    pub notice: Option<String>,
}
