use crate::models::content_types::VideoCard;
use crate::models::view_types::{PageView, ProbabilityBar};
use crate::services::content::catalog::ContentCatalog;
use crate::services::session::SessionContext;
use std::fmt::Write;

const BAR_WIDTH: usize = 30;
const NO_IMAGE_NOTICE: &str = "Take a photo or upload an image to see results.";

impl PageView {
    /// Project the current session state into what the user sees.
    pub fn build(session: &SessionContext, vocabulary: &[String], catalog: &ContentCatalog) -> Self {
        if session.image().is_none() {
            return PageView {
                notice: Some(NO_IMAGE_NOTICE.to_string()),
                ..PageView::default()
            };
        }

        let mut view = PageView {
            image_preview: session.preview().map(str::to_string),
            ..PageView::default()
        };

        if let Some(prediction) = session.last_prediction() {
            view.prediction = Some(prediction.label.clone());
            view.probabilities = prediction
                .ranked()
                .into_iter()
                .map(|p| ProbabilityBar {
                    label: p.class_name.clone(),
                    percent: p.confidence * 100.0,
                    highlight: p.class_name == prediction.label,
                })
                .collect();
        }

        if let Some(label) = session.display_label(vocabulary) {
            view.fill_content(label, catalog);
        }

        view
    }

    /// Only the content panel for `label`.
    pub fn for_label(label: &str, catalog: &ContentCatalog) -> Self {
        let mut view = PageView::default();
        view.fill_content(label, catalog);
        view
    }

    fn fill_content(&mut self, label: &str, catalog: &ContentCatalog) {
        let content = catalog.lookup(label);
        if content.is_empty() {
            self.notice = Some(format!("No content yet for label `{}`.", label));
        }
        self.content_label = Some(label.to_string());
        self.texts = content.texts;
        self.images = content.images;
        self.videos = content.videos.iter().map(|v| VideoCard::from_url(v)).collect();
    }
}

pub fn render_text(view: &PageView) -> String {
    let mut out = String::new();

    if let Some(prediction) = &view.prediction {
        let _ = writeln!(out, "Prediction: {}", prediction);
        let _ = writeln!(out);
    }

    if !view.probabilities.is_empty() {
        let _ = writeln!(out, "Probabilities");
        let width = view.probabilities.iter().map(|b| b.label.chars().count()).max().unwrap_or(0);
        for bar in &view.probabilities {
            let filled = ((bar.percent / 100.0) * BAR_WIDTH as f32).round().clamp(0.0, BAR_WIDTH as f32) as usize;
            let marker = if bar.highlight { '#' } else { '=' };
            let _ = writeln!(
                out,
                "  {:<width$}  [{}{}] {:>6.2}%",
                bar.label,
                marker.to_string().repeat(filled),
                " ".repeat(BAR_WIDTH - filled),
                bar.percent,
                width = width,
            );
        }
        let _ = writeln!(out);
    }

    if let Some(label) = &view.content_label {
        let _ = writeln!(out, "Content for `{}`", label);
        for text in &view.texts {
            let _ = writeln!(out, "  [text]  {}", text);
        }
        for image in &view.images {
            let _ = writeln!(out, "  [image] {}", abbreviate(image));
        }
        for video in &view.videos {
            match &video.thumbnail {
                Some(thumb) => {
                    let _ = writeln!(out, "  [video] {} (thumbnail: {})", video.url, thumb);
                }
                None => {
                    let _ = writeln!(out, "  [video] {}", video.url);
                }
            }
        }
    }

    if let Some(notice) = &view.notice {
        let _ = writeln!(out, "{}", notice);
    }

    out
}

// Inline data URIs can be tens of kilobytes.
fn abbreviate(reference: &str) -> String {
    const MAX: usize = 96;
    if reference.chars().count() <= MAX {
        return reference.to_string();
    }
    let head: String = reference.chars().take(MAX).collect();
    format!("{}…", head)
}
