use crate::error::AppError;
use crate::models::content_types::{CatalogReport, ContentEntry, LabelContent};
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

/// At most this many items of each kind are shown for a label.
pub const CONTENT_LIMIT: usize = 3;

/// Keep the first `limit` items that are strings with non-whitespace content.
pub fn pick_first_non_blank(items: &[Value], limit: usize) -> Vec<String> {
    items
        .iter()
        .filter_map(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .take(limit)
        .map(str::to_string)
        .collect()
}

/// Label → curated content mapping, loaded once and read-only afterwards.
#[derive(Debug, Clone, Default)]
pub struct ContentCatalog {
    entries: HashMap<String, ContentEntry>,
}

impl ContentCatalog {
    pub fn new(entries: HashMap<String, ContentEntry>) -> Self {
        Self { entries }
    }

    pub fn from_json_str(json: &str) -> Result<Self, AppError> {
        let entries: HashMap<String, ContentEntry> = serde_json::from_str(json).map_err(|e| AppError {
            message: format!("Failed to parse content file: {}", e),
        })?;
        Ok(Self { entries })
    }

    pub async fn load(path: &Path) -> Result<Self, AppError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|e| AppError {
            message: format!("Failed to read content file {}: {}", path.display(), e),
        })?;
        let catalog = Self::from_json_str(&raw)?;
        tracing::info!(path = %path.display(), entries = catalog.len(), "loaded content catalog");
        Ok(catalog)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.entries.contains_key(label)
    }

    /// Content for an exact label match. Unknown labels give empty content.
    pub fn lookup(&self, label: &str) -> LabelContent {
        match self.entries.get(label) {
            Some(entry) => LabelContent {
                texts: pick_first_non_blank(&entry.texts, CONTENT_LIMIT),
                images: pick_first_non_blank(&entry.images, CONTENT_LIMIT),
                videos: pick_first_non_blank(&entry.videos, CONTENT_LIMIT),
            },
            None => LabelContent::default(),
        }
    }

    /// Resolve `#<n>` keys to vocabulary labels and report coverage gaps.
    ///
    /// A literal label key takes precedence over a positional key naming the
    /// same label. Missing labels are logged as warnings.
    pub fn bind_vocabulary(&mut self, vocabulary: &[String]) -> CatalogReport {
        let mut report = CatalogReport::default();

        let mut positional: Vec<(PositionalKey, String)> = self
            .entries
            .keys()
            .filter_map(|k| positional_key(k).map(|p| (p, k.clone())))
            .collect();
        positional.sort();

        for (position, key) in positional {
            let Some(entry) = self.entries.remove(&key) else {
                continue;
            };
            let PositionalKey::Index(idx) = position else {
                tracing::warn!(key = %key, "positional content key is not a canonical index");
                report.unresolved.push(key);
                continue;
            };
            match vocabulary.get(idx) {
                Some(label) if self.entries.contains_key(label) => {
                    tracing::warn!(key = %key, label = %label, "positional content key shadowed by literal label key");
                }
                Some(label) => {
                    tracing::debug!(key = %key, label = %label, "resolved positional content key");
                    self.entries.insert(label.clone(), entry);
                }
                None => {
                    tracing::warn!(key = %key, labels = vocabulary.len(), "positional content key outside vocabulary");
                    report.unresolved.push(key);
                }
            }
        }
        report.unresolved.sort();

        for label in vocabulary {
            if !self.entries.contains_key(label) {
                tracing::warn!(label = %label, "no content configured for label");
                report.missing.push(label.clone());
            }
        }

        let mut unknown: Vec<String> = self
            .entries
            .keys()
            .filter(|k| !vocabulary.contains(k))
            .cloned()
            .collect();
        unknown.sort();
        for key in &unknown {
            tracing::warn!(key = %key, "content configured for a label the model does not produce");
        }
        report.unknown = unknown;

        report
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum PositionalKey {
    Index(usize),
    /// Numeric but not written canonically, e.g. `#00` or `#+1`.
    Malformed,
}

/// Classify `#<n>` keys. Anything that does not parse as a number stays a
/// literal label key.
fn positional_key(key: &str) -> Option<PositionalKey> {
    let digits = key.strip_prefix('#')?;
    let idx: usize = digits.parse().ok()?;
    let canonical = digits.bytes().all(|b| b.is_ascii_digit()) && (digits == "0" || !digits.starts_with('0'));
    Some(if canonical {
        PositionalKey::Index(idx)
    } else {
        PositionalKey::Malformed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn catalog(value: Value) -> ContentCatalog {
        ContentCatalog::from_json_str(&value.to_string()).unwrap()
    }

    fn vocab(labels: &[&str]) -> Vec<String> {
        labels.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn unknown_label_is_empty() {
        let catalog = catalog(json!({ "cat": { "texts": ["a"] } }));
        let content = catalog.lookup("dog");
        assert!(content.is_empty());
        assert_eq!(content, LabelContent::default());
    }

    #[test]
    fn caps_each_list_in_order() {
        let catalog = catalog(json!({
            "cat": {
                "texts": ["a", "b", "c", "d"],
                "images": ["i1", "i2", "i3", "i4", "i5"],
                "videos": ["v2", "v1"]
            }
        }));
        let content = catalog.lookup("cat");
        assert_eq!(content.texts, vec!["a", "b", "c"]);
        assert_eq!(content.images, vec!["i1", "i2", "i3"]);
        assert_eq!(content.videos, vec!["v2", "v1"]);
    }

    #[test]
    fn blank_and_non_string_items_are_skipped_before_the_cap() {
        let catalog = catalog(json!({
            "cat": { "texts": ["", "  ", 7, null, "a", "\t", "b", {"x": 1}, "c", "d"] }
        }));
        assert_eq!(catalog.lookup("cat").texts, vec!["a", "b", "c"]);
    }

    #[test]
    fn duplicates_are_kept() {
        let catalog = catalog(json!({ "cat": { "texts": ["a", "a"] } }));
        assert_eq!(catalog.lookup("cat").texts, vec!["a", "a"]);
    }

    #[test]
    fn missing_lists_are_empty() {
        let catalog = catalog(json!({ "cat": { "videos": ["https://youtu.be/gHXfCWGZWNs"] } }));
        let content = catalog.lookup("cat");
        assert!(content.texts.is_empty());
        assert!(content.images.is_empty());
        assert_eq!(content.videos.len(), 1);
    }

    #[test]
    fn lookup_is_exact_match() {
        let catalog = catalog(json!({ "Cat": { "texts": ["a"] } }));
        assert!(catalog.lookup("cat").is_empty());
        assert!(catalog.lookup("Cat ").is_empty());
        assert!(!catalog.lookup("Cat").is_empty());
    }

    #[test]
    fn rejects_non_object_document() {
        assert!(ContentCatalog::from_json_str("[1, 2]").is_err());
        assert!(ContentCatalog::from_json_str(r#"{"cat": {"texts": "a"}}"#).is_err());
    }

    #[test]
    fn bind_reports_missing_and_unknown() {
        let mut catalog = catalog(json!({
            "cat": { "texts": ["a"] },
            "fish": { "texts": ["b"] }
        }));
        let report = catalog.bind_vocabulary(&vocab(&["cat", "dog", "bird"]));
        assert_eq!(report.missing, vec!["dog", "bird"]);
        assert_eq!(report.unknown, vec!["fish"]);
        assert!(report.unresolved.is_empty());
        assert!(!report.is_clean());
    }

    #[test]
    fn bind_resolves_positional_keys() {
        let mut catalog = catalog(json!({
            "#0": { "texts": ["first"] },
            "#2": { "texts": ["third"] },
            "#9": { "texts": ["nowhere"] }
        }));
        let report = catalog.bind_vocabulary(&vocab(&["dynamax", "mega", "tera"]));
        assert_eq!(catalog.lookup("dynamax").texts, vec!["first"]);
        assert_eq!(catalog.lookup("tera").texts, vec!["third"]);
        assert_eq!(report.missing, vec!["mega"]);
        assert_eq!(report.unresolved, vec!["#9"]);
        assert!(!catalog.contains("#9"));
    }

    #[test]
    fn literal_key_beats_positional_key() {
        let mut catalog = catalog(json!({
            "#0": { "texts": ["positional"] },
            "cat": { "texts": ["literal"] }
        }));
        let report = catalog.bind_vocabulary(&vocab(&["cat"]));
        assert_eq!(catalog.lookup("cat").texts, vec!["literal"]);
        assert!(report.is_clean());
    }

    #[test]
    fn non_canonical_positional_keys_are_unresolved() {
        let mut catalog = catalog(json!({
            "#00": { "texts": ["padded"] },
            "#+0": { "texts": ["signed"] },
            "#01": { "texts": ["padded one"] },
            "#1": { "texts": ["second"] }
        }));
        let report = catalog.bind_vocabulary(&vocab(&["dynamax", "mega"]));
        assert!(catalog.lookup("dynamax").is_empty());
        assert_eq!(catalog.lookup("mega").texts, vec!["second"]);
        assert_eq!(report.missing, vec!["dynamax"]);
        assert_eq!(report.unresolved, vec!["#+0", "#00", "#01"]);
        assert!(report.unknown.is_empty());
    }

    #[test]
    fn hash_prefixed_words_stay_literal() {
        let mut catalog = catalog(json!({ "#tag": { "texts": ["literal"] } }));
        let report = catalog.bind_vocabulary(&vocab(&["#tag"]));
        assert_eq!(catalog.lookup("#tag").texts, vec!["literal"]);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("content.json");
        std::fs::write(&path, r#"{"cat": {"texts": ["a"]}}"#).unwrap();
        let catalog = ContentCatalog::load(&path).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.lookup("cat").texts, vec!["a"]);
    }

    #[tokio::test]
    async fn load_missing_file_errors() {
        let err = ContentCatalog::load(Path::new("/nonexistent/content.json")).await.unwrap_err();
        assert!(err.message.contains("Failed to read content file"));
    }
}
