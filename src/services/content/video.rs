use crate::models::content_types::VideoCard;
use once_cell::sync::Lazy;
use regex::Regex;

const THUMBNAIL_TEMPLATE_PREFIX: &str = "https://img.youtube.com/vi/";
const THUMBNAIL_TEMPLATE_SUFFIX: &str = "/hqdefault.jpg";

// Tried in order; the first pattern that matches decides the id.
static VIDEO_ID_PATTERNS: Lazy<[Regex; 2]> = Lazy::new(|| {
    [
        Regex::new(r"(?:v=|/)([0-9A-Za-z_-]{11})(?:\?|&|/|\n?$)").expect("query/path id pattern"),
        Regex::new(r"youtu\.be/([0-9A-Za-z_-]{11})").expect("short link id pattern"),
    ]
});

/// Extract the 11-character video id from a watch URL, embed path or short link.
pub fn youtube_id(url: &str) -> Option<&str> {
    if url.is_empty() {
        return None;
    }
    VIDEO_ID_PATTERNS
        .iter()
        .find_map(|re| re.captures(url).and_then(|c| c.get(1)))
        .map(|m| m.as_str())
}

pub fn thumbnail_url(url: &str) -> Option<String> {
    youtube_id(url).map(|id| format!("{}{}{}", THUMBNAIL_TEMPLATE_PREFIX, id, THUMBNAIL_TEMPLATE_SUFFIX))
}

impl VideoCard {
    pub fn from_url(url: &str) -> Self {
        VideoCard {
            url: url.to_string(),
            thumbnail: thumbnail_url(url),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn watch_query_parameter() {
        assert_eq!(youtube_id("https://example.com/watch?v=bHMxGDIVBxM"), Some("bHMxGDIVBxM"));
        assert_eq!(
            youtube_id("https://www.youtube.com/watch?v=LJ6eRZcymmk&t=42s"),
            Some("LJ6eRZcymmk")
        );
    }

    #[test]
    fn trailing_newline_after_id() {
        assert_eq!(
            youtube_id("https://www.youtube.com/watch?v=bHMxGDIVBxM\n"),
            Some("bHMxGDIVBxM")
        );
        assert_eq!(youtube_id("https://example.com/watch?v=bHMxGDIVBxM\n\n"), None);
    }

    #[test]
    fn short_link() {
        assert_eq!(youtube_id("https://youtu.be/gHXfCWGZWNs"), Some("gHXfCWGZWNs"));
        assert_eq!(youtube_id("youtu.be/gHXfCWGZWNs?si=abc"), Some("gHXfCWGZWNs"));
    }

    #[test]
    fn embed_path() {
        assert_eq!(
            youtube_id("https://www.youtube.com/embed/bHMxGDIVBxM/"),
            Some("bHMxGDIVBxM")
        );
    }

    #[test]
    fn unrecognized_urls() {
        assert_eq!(youtube_id("https://example.com/about"), None);
        assert_eq!(youtube_id(""), None);
        assert_eq!(youtube_id("not a url at all"), None);
        // twelve characters is not an id
        assert_eq!(youtube_id("https://example.com/watch?v=bHMxGDIVBxMx"), None);
        assert_eq!(thumbnail_url("https://example.com/about"), None);
    }

    #[test]
    fn thumbnail_from_id() {
        assert_eq!(
            thumbnail_url("https://www.youtube.com/watch?v=bHMxGDIVBxM").as_deref(),
            Some("https://img.youtube.com/vi/bHMxGDIVBxM/hqdefault.jpg")
        );
    }

    #[test]
    fn video_card_falls_back_to_plain_link() {
        let card = VideoCard::from_url("https://vimeo.com/about");
        assert_eq!(card.url, "https://vimeo.com/about");
        assert!(card.thumbnail.is_none());

        let card = VideoCard::from_url("https://youtu.be/gHXfCWGZWNs");
        assert_eq!(
            card.thumbnail.as_deref(),
            Some("https://img.youtube.com/vi/gHXfCWGZWNs/hqdefault.jpg")
        );
    }

    #[test]
    fn same_input_same_output() {
        let fixtures = [
            "https://www.youtube.com/watch?v=bHMxGDIVBxM",
            "https://youtu.be/gHXfCWGZWNs",
            "https://example.com/about",
        ];
        for url in fixtures {
            assert_eq!(thumbnail_url(url), thumbnail_url(url));
        }
    }
}
