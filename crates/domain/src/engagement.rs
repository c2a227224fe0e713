use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

use crate::{GalleryId, MediaType, Photo, PhotoId};

/// Images viewed for less than this are not reported as a view.
pub const IMAGE_VIEW_THRESHOLD_MS: u64 = 500;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EngagementKind {
    FirstView,
    View,
    Play,
    Pause,
    Complete,
    Download,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngagementEvent {
    pub gallery_id: GalleryId,
    pub photo_id: Option<PhotoId>,
    pub kind: EngagementKind,
    pub elapsed_ms: u64,
}

impl EngagementEvent {
    /// Downloads need no view bookkeeping, so they can be built without a session.
    pub fn download(gallery_id: GalleryId, photo_id: Option<PhotoId>) -> Self {
        Self {
            gallery_id,
            photo_id,
            kind: EngagementKind::Download,
            elapsed_ms: 0,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct ViewStart {
    started_ms: u64,
    media_type: MediaType,
    duration_secs: Option<f64>,
}

/// Per-session engagement bookkeeping. One instance lives for one browsing
/// session of one gallery.
#[derive(Debug, Clone)]
pub struct EngagementSession {
    gallery_id: GalleryId,
    view_started: HashMap<PhotoId, ViewStart>,
    first_views: HashSet<PhotoId>,
}

impl EngagementSession {
    pub fn new(gallery_id: GalleryId) -> Self {
        Self {
            gallery_id,
            view_started: HashMap::new(),
            first_views: HashSet::new(),
        }
    }

    pub fn gallery_id(&self) -> &GalleryId {
        &self.gallery_id
    }

    pub fn is_viewing(&self, photo_id: &PhotoId) -> bool {
        self.view_started.contains_key(photo_id)
    }

    /// Records the view start; returns a first-view event the first time a
    /// photo is seen in this session.
    pub fn begin_view(&mut self, photo: &Photo, now_ms: u64) -> Option<EngagementEvent> {
        self.view_started.insert(
            photo.id.clone(),
            ViewStart {
                started_ms: now_ms,
                media_type: photo.media_type,
                duration_secs: photo.duration_secs,
            },
        );
        if !self.first_views.insert(photo.id.clone()) {
            return None;
        }
        Some(self.event(Some(photo.id.clone()), EngagementKind::FirstView, 0))
    }

    pub fn end_view(&mut self, photo_id: &PhotoId, now_ms: u64) -> Option<EngagementEvent> {
        let start = self.view_started.remove(photo_id)?;
        let elapsed_ms = now_ms.saturating_sub(start.started_ms);

        let kind = match start.media_type {
            MediaType::Image if elapsed_ms > IMAGE_VIEW_THRESHOLD_MS => EngagementKind::View,
            MediaType::Image => return None,
            MediaType::Video => match start.duration_secs {
                Some(duration) if elapsed_ms as f64 >= duration * 1_000.0 => {
                    EngagementKind::Complete
                }
                _ => EngagementKind::Pause,
            },
        };
        Some(self.event(Some(photo_id.clone()), kind, elapsed_ms))
    }

    pub fn playback_started(&self, photo_id: &PhotoId, now_ms: u64) -> EngagementEvent {
        let elapsed_ms = self
            .view_started
            .get(photo_id)
            .map(|start| now_ms.saturating_sub(start.started_ms))
            .unwrap_or(0);
        self.event(Some(photo_id.clone()), EngagementKind::Play, elapsed_ms)
    }

    pub fn download(&self, photo_id: Option<PhotoId>) -> EngagementEvent {
        EngagementEvent::download(self.gallery_id.clone(), photo_id)
    }

    fn event(
        &self,
        photo_id: Option<PhotoId>,
        kind: EngagementKind,
        elapsed_ms: u64,
    ) -> EngagementEvent {
        EngagementEvent {
            gallery_id: self.gallery_id.clone(),
            photo_id,
            kind,
            elapsed_ms,
        }
    }
}
