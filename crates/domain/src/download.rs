use serde::{Deserialize, Serialize};

use crate::PhotoId;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    /// Empty means the whole gallery.
    pub photo_ids: Vec<PhotoId>,
    pub resolution: DownloadResolution,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DownloadResolution {
    #[default]
    Original,
    Web,
}

/// The backend either hands back a ready archive URL or starts building one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum DownloadResponse {
    Redirect { url: String },
    Pending { job_id: String },
}
