use shotbook_domain::{EngagementEvent, EngagementSession, Photo, PhotoId};
use tracing::{debug, warn};

use crate::{AnalyticsSink, ApplicationService, Clock};

/// Turns selection changes into analytics events for one session.
/// Delivery failures are logged and otherwise ignored.
pub struct EngagementTracker<'a> {
    session: EngagementSession,
    sink: &'a dyn AnalyticsSink,
    clock: &'a dyn Clock,
}

impl<'a> EngagementTracker<'a> {
    pub fn new(
        session: EngagementSession,
        sink: &'a dyn AnalyticsSink,
        clock: &'a dyn Clock,
    ) -> Self {
        Self {
            session,
            sink,
            clock,
        }
    }

    pub fn session(&self) -> &EngagementSession {
        &self.session
    }

    pub fn selection_changed(&mut self, photo: &Photo) {
        let now = self.clock.now_millis();
        if let Some(event) = self.session.begin_view(photo, now) {
            self.emit(event);
        }
    }

    pub fn selection_ended(&mut self, photo_id: &PhotoId) {
        let now = self.clock.now_millis();
        if let Some(event) = self.session.end_view(photo_id, now) {
            self.emit(event);
        }
    }

    pub fn playback_started(&mut self, photo_id: &PhotoId) {
        let event = self
            .session
            .playback_started(photo_id, self.clock.now_millis());
        self.emit(event);
    }

    fn emit(&self, event: EngagementEvent) {
        let kind = event.kind;
        match self.sink.record(event) {
            Ok(()) => debug!(?kind, "engagement event queued"),
            Err(error) => warn!(?kind, %error, "engagement event dropped"),
        }
    }
}

impl ApplicationService {
    pub fn engagement_tracker(&self, session: EngagementSession) -> EngagementTracker<'_> {
        EngagementTracker::new(
            session,
            self.ports.analytics.as_ref(),
            self.ports.clock.as_ref(),
        )
    }
}
