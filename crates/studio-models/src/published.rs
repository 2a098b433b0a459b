//! Published videos and the daily publishing quota.

use serde::{Deserialize, Serialize};

/// A finalized output video.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PublishedVideo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default)]
    pub size_mb: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
    /// Date folder the video was saved under
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub folder: Option<String>,
    /// Path relative to the published root, used for deletion
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rel_path: Option<String>,
}

impl PublishedVideo {
    /// Path used to address this video in `DELETE /api/published/{path}`.
    pub fn path(&self) -> Option<&str> {
        self.rel_path.as_deref().or(self.filename.as_deref())
    }

    pub fn display_name(&self) -> &str {
        self.filename
            .as_deref()
            .or(self.url.as_deref())
            .unwrap_or("untitled")
    }
}

/// Full published view, replaced wholesale on every refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PublishedSnapshot {
    #[serde(default)]
    pub videos: Vec<PublishedVideo>,
    #[serde(default)]
    pub today_count: u32,
    #[serde(default)]
    pub daily_target: u32,
}

impl PublishedSnapshot {
    pub fn is_empty(&self) -> bool {
        self.videos.is_empty()
    }

    /// True once today's publishing target is met.
    pub fn quota_reached(&self) -> bool {
        self.daily_target > 0 && self.today_count >= self.daily_target
    }

    /// Quota label, e.g. `"1/2 today"`.
    pub fn quota_label(&self) -> String {
        format!("{}/{} today", self.today_count, self.daily_target)
    }
}
