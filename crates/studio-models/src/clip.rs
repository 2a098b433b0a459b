//! Clip models.
//!
//! Clips come from two places that share one shape:
//! - the job-scoped library (`GET /api/library/{job_id}`), keyed by `filename`
//! - the curated global library (`GET /api/clips`), keyed by `clip_id`

use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;

/// Clip identifier, unique within a result set.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClipId(pub String);

impl ClipId {
    pub fn from_string(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ClipId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ClipId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// A candidate clip. Immutable once fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Clip {
    /// `clip_id` in the curated library, `filename` in the job library
    #[serde(rename = "clip_id", alias = "filename")]
    pub id: ClipId,

    /// Meme caption shown over the clip
    #[serde(default, deserialize_with = "null_as_default", rename = "meme_caption", alias = "caption")]
    pub caption_text: String,

    /// What happens on screen
    #[serde(default, deserialize_with = "null_as_default", rename = "what_happens_visually")]
    pub visual_description: String,

    /// Quoted dialogue hook
    #[serde(default, deserialize_with = "null_as_default")]
    pub dialogue_hook: String,

    /// Human label of the source video
    #[serde(default, deserialize_with = "null_as_default")]
    pub source_label: String,

    /// Timestamp of the clip inside its source (e.g. "12:04")
    #[serde(default, deserialize_with = "null_as_default", rename = "timestamp")]
    pub timestamp_in_source: String,

    /// Clip length in seconds
    #[serde(default, deserialize_with = "null_as_default", rename = "duration_seconds", alias = "duration")]
    pub duration_seconds: f64,

    /// Virality score used for filtering and sorting
    #[serde(default, deserialize_with = "null_as_default", rename = "meme_score", alias = "score")]
    pub meme_score: f64,

    /// Target audience tag
    #[serde(default, deserialize_with = "null_as_default", rename = "audience")]
    pub audience_tag: String,

    /// Clip type badge (job library only)
    #[serde(default, rename = "type", skip_serializing_if = "Option::is_none")]
    pub clip_type: Option<String>,

    /// Whether a previewable rendition exists
    #[serde(default, deserialize_with = "null_as_default", rename = "rendered")]
    pub rendered_flag: bool,

    /// Preview URL, when the backend serves one
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
}

/// Treat JSON `null` like a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

impl Clip {
    /// A clip is previewable when it was rendered or the backend gave us a URL.
    pub fn is_previewable(&self) -> bool {
        self.rendered_flag || self.url.is_some()
    }

    /// Caption, falling back to the identifier when empty.
    pub fn display_caption(&self) -> &str {
        if self.caption_text.trim().is_empty() {
            self.id.as_str()
        } else {
            &self.caption_text
        }
    }
}

/// Query for the curated global library.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct LibraryFilter {
    /// Minimum meme score (inclusive)
    pub min_score: u32,
    /// Source slug, `None` for all sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

impl LibraryFilter {
    pub fn new(min_score: u32, source: Option<String>) -> Self {
        let source = source.filter(|s| !s.trim().is_empty());
        Self { min_score, source }
    }

    /// Query-string pairs for the library endpoint.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = vec![("min_score", self.min_score.to_string())];
        if let Some(source) = &self.source {
            pairs.push(("source", source.clone()));
        }
        pairs
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_curated_clip_shape() {
        let json = r#"{
            "clip_id": "sv1_42",
            "source_slug": "sv1",
            "source_label": "Silicon Valley 1",
            "timestamp": "00:42",
            "start_seconds": 42,
            "duration_seconds": 12,
            "what_happens_visually": "Richard panics",
            "dialogue_hook": "It's not a bug",
            "meme_caption": "when prod goes down",
            "meme_score": 9,
            "audience": "devs",
            "rendered": true
        }"#;
        let clip: Clip = serde_json::from_str(json).unwrap();
        assert_eq!(clip.id.as_str(), "sv1_42");
        assert_eq!(clip.caption_text, "when prod goes down");
        assert_eq!(clip.duration_seconds, 12.0);
        assert_eq!(clip.meme_score, 9.0);
        assert!(clip.rendered_flag);
        assert!(clip.is_previewable());
    }

    #[test]
    fn test_job_library_clip_shape() {
        let json = r#"{
            "filename": "clip_01.mp4",
            "url": "/api/library/j1/clip_01.mp4",
            "caption": "",
            "type": "meme",
            "duration": 8.4,
            "score": 7
        }"#;
        let clip: Clip = serde_json::from_str(json).unwrap();
        assert_eq!(clip.id.as_str(), "clip_01.mp4");
        assert_eq!(clip.clip_type.as_deref(), Some("meme"));
        assert_eq!(clip.display_caption(), "clip_01.mp4");
        assert!(!clip.rendered_flag);
        assert!(clip.is_previewable());
    }

    #[test]
    fn test_null_fields_read_as_empty() {
        let json = r#"{
            "clip_id": "sv1_7",
            "meme_caption": null,
            "what_happens_visually": null,
            "dialogue_hook": null,
            "timestamp": null,
            "duration_seconds": null,
            "meme_score": 6,
            "audience": null,
            "rendered": null
        }"#;
        let clip: Clip = serde_json::from_str(json).unwrap();
        assert_eq!(clip.caption_text, "");
        assert_eq!(clip.duration_seconds, 0.0);
        assert_eq!(clip.meme_score, 6.0);
        assert!(!clip.rendered_flag);
        assert_eq!(clip.display_caption(), "sv1_7");
    }

    #[test]
    fn test_filter_query_pairs() {
        let filter = LibraryFilter::new(7, Some("office".into()));
        assert_eq!(
            filter.query_pairs(),
            vec![("min_score", "7".to_string()), ("source", "office".to_string())]
        );
        let all = LibraryFilter::new(0, Some("  ".into()));
        assert_eq!(all.source, None);
        assert_eq!(all.query_pairs().len(), 1);
    }
}
