//! Request and response bodies of the studio HTTP API.

use serde::{Deserialize, Serialize};

use crate::{Clip, ClipId, JobId, RenderJobId};

/// Placements for which `frequency` is meaningful.
const FREQUENCY_PLACEMENTS: &[&str] = &["between", "both"];

/// Response of `POST /api/upload`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadResponse {
    pub job_id: JobId,
}

/// Ad insertion settings for a pipeline run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdConfig {
    pub enabled: bool,
    /// Selected ad asset filename
    pub asset: Option<String>,
    /// Where ads go (`start`, `end`, `between`, `both`)
    pub placement: String,
    /// Every how many clips an ad is inserted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub frequency: Option<u32>,
    /// Seconds an image ad stays on screen
    pub image_duration: u32,
}

impl AdConfig {
    pub fn new(
        asset: Option<String>,
        placement: impl Into<String>,
        frequency: u32,
        image_duration: u32,
    ) -> Self {
        let placement = placement.into();
        let frequency = Self::placement_uses_frequency(&placement).then_some(frequency);
        Self {
            enabled: true,
            asset: asset.filter(|a| !a.is_empty()),
            placement,
            frequency,
            image_duration,
        }
    }

    pub fn placement_uses_frequency(placement: &str) -> bool {
        FREQUENCY_PLACEMENTS.contains(&placement)
    }
}

/// Body of `POST /api/pipeline/start`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStartRequest {
    pub job_id: JobId,
    pub clip_types: Vec<String>,
    pub add_narration: bool,
    pub count: u32,
    pub audience: String,
    /// Serialized as `null` when ads are disabled
    pub ad_config: Option<AdConfig>,
}

/// Response of `GET /api/library/{job_id}`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LibraryResponse {
    #[serde(default)]
    pub clips: Vec<Clip>,
}

/// Body of `POST /api/library/{job_id}/save`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveClipsRequest {
    pub clips: Vec<ClipId>,
}

/// Response of the save call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveClipsResponse {
    pub ok: bool,
    #[serde(default)]
    pub saved: u32,
    #[serde(default)]
    pub dest: String,
}

/// Body of `POST /api/render`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderRequest {
    pub hook_clip_id: ClipId,
    pub hook_caption: String,
    pub body_script: String,
    /// Serialized as `null` when no narration was generated
    pub body_audio_file: Option<String>,
    pub cta_tagline: String,
    pub output_name: String,
}

/// Response of the render submission; the server echoes the whole job,
/// only the id matters to the client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderSubmitted {
    pub id: RenderJobId,
}

/// An uploaded ad asset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdAsset {
    pub filename: String,
}

/// Response of `GET /api/ads`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdAssetList {
    #[serde(default)]
    pub ads: Vec<AdAsset>,
}
