use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Curated material for one label, as authored in the content file.
///
/// Items are kept as raw JSON values so that numbers, nulls or blank strings
/// in the file are tolerated and filtered at lookup time.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct ContentEntry {
    #[serde(default)]
    pub texts: Vec<Value>,
    #[serde(default)]
    pub images: Vec<Value>,
    #[serde(default)]
    pub videos: Vec<Value>,
}

#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct LabelContent {
    pub texts: Vec<String>,
    pub images: Vec<String>,
    pub videos: Vec<String>,
}

impl LabelContent {
    pub fn is_empty(&self) -> bool {
        self.texts.is_empty() && self.images.is_empty() && self.videos.is_empty()
    }
}

#[derive(Debug, Serialize, Clone, PartialEq)]
pub struct VideoCard {
    pub url: String,
    /// `None` means the link is shown without a preview.
    pub thumbnail: Option<String>,
}

/// Result of checking a content file against the classifier vocabulary.
#[derive(Debug, Serialize, Clone, Default, PartialEq)]
pub struct CatalogReport {
    /// Vocabulary labels without an entry, in vocabulary order.
    pub missing: Vec<String>,
    /// Entry keys that are not part of the vocabulary.
    pub unknown: Vec<String>,
    /// Positional `#<n>` keys that point outside the vocabulary.
    pub unresolved: Vec<String>,
}

impl CatalogReport {
    pub fn is_clean(&self) -> bool {
        self.missing.is_empty() && self.unknown.is_empty() && self.unresolved.is_empty()
    }
}
