use std::collections::VecDeque;

use shotbook_domain::{
    CommitOutcome, EngagementSession, GalleryFeed, Lightbox, LightboxEffect, LightboxInput,
    LightboxItem, LightboxTimings, Photo,
};
use tracing::{debug, warn};

use crate::{
    AddCommentCommand, ApplicationError, ApplicationService, EngagementTracker,
    LoadGalleryCommand, ToggleFavoriteCommand,
};

/// One lightbox browsing session over a loaded feed. Inputs go through the
/// lightbox state machine and the resulting effects are carried out here,
/// so a window only has to render and forward events.
pub struct ViewerSession<'a> {
    service: &'a ApplicationService,
    feed: GalleryFeed,
    lightbox: Lightbox,
    tracker: EngagementTracker<'a>,
    status: Option<String>,
}

impl<'a> ViewerSession<'a> {
    pub fn new(
        service: &'a ApplicationService,
        feed: GalleryFeed,
        timings: LightboxTimings,
    ) -> Self {
        let lightbox = Lightbox::from_photos(feed.photos(), timings);
        let tracker =
            service.engagement_tracker(EngagementSession::new(feed.gallery_id().clone()));
        Self {
            service,
            feed,
            lightbox,
            tracker,
            status: None,
        }
    }

    pub fn feed(&self) -> &GalleryFeed {
        &self.feed
    }

    pub fn lightbox(&self) -> &Lightbox {
        &self.lightbox
    }

    pub fn current_photo(&self) -> Option<&Photo> {
        let item = self.lightbox.current()?;
        self.feed.photo(&item.photo_id)
    }

    /// Last user-facing message from a favorite, comment or paging action.
    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn into_feed(self) -> GalleryFeed {
        self.feed
    }

    /// Feeds one input to the lightbox and performs every effect it caused,
    /// including follow-ups such as a selection change after the feed grew.
    /// Returns all effects in the order they were applied.
    pub fn handle(
        &mut self,
        input: LightboxInput,
    ) -> Result<Vec<LightboxEffect>, ApplicationError> {
        let now = self.service.now_millis();
        let mut pending: VecDeque<LightboxEffect> = self.lightbox.handle(input, now)?.into();
        let mut applied = Vec::with_capacity(pending.len());
        while let Some(effect) = pending.pop_front() {
            self.apply(&effect, &mut pending);
            applied.push(effect);
        }
        Ok(applied)
    }

    fn apply(&mut self, effect: &LightboxEffect, pending: &mut VecDeque<LightboxEffect>) {
        match effect {
            LightboxEffect::SelectionChanged { photo_id, .. } => {
                if let Some(photo) = self.feed.photo(photo_id) {
                    self.tracker.selection_changed(photo);
                }
            }
            LightboxEffect::SelectionEnded { photo_id } => self.tracker.selection_ended(photo_id),
            LightboxEffect::PlayVideo { photo_id } => self.tracker.playback_started(photo_id),
            LightboxEffect::ToggleFavorite { photo_id } => {
                let command = ToggleFavoriteCommand {
                    photo_id: photo_id.clone(),
                };
                self.status = Some(match self.service.toggle_favorite(&mut self.feed, command) {
                    Ok(true) => "Added to favorites".to_string(),
                    Ok(false) => "Removed from favorites".to_string(),
                    Err(error) => format!("Favorite failed: {error}"),
                });
            }
            LightboxEffect::SubmitAnnotation {
                photo_id,
                annotation,
                text,
            } => {
                let command = AddCommentCommand {
                    photo_id: photo_id.clone(),
                    text: text.clone(),
                    annotation: Some(annotation.clone()),
                    video_timestamp_secs: None,
                };
                self.status = Some(match self.service.add_comment(&mut self.feed, command) {
                    Ok(_) => "Feedback sent".to_string(),
                    Err(error) => format!("Feedback failed: {error}"),
                });
            }
            LightboxEffect::NearEnd => self.load_more(pending),
            LightboxEffect::PauseVideo { .. }
            | LightboxEffect::ControlsVisibility(_)
            | LightboxEffect::Closed => {}
        }
    }

    fn load_more(&mut self, pending: &mut VecDeque<LightboxEffect>) {
        match self
            .service
            .load_gallery(&mut self.feed, LoadGalleryCommand { load_more: true })
        {
            Ok(Some(CommitOutcome::Appended { added })) if added > 0 => {
                debug!(added, "lightbox items extended");
                let items = self.feed.photos().iter().map(LightboxItem::from).collect();
                pending.extend(self.lightbox.replace_items(items, self.service.now_millis()));
            }
            Ok(_) => {}
            Err(error) => warn!(%error, "prefetch of next page failed"),
        }
    }
}
