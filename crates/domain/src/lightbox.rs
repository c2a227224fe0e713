//! Full-screen single-item viewer.
//!
//! [`Lightbox::handle`] consumes one input with the current timestamp and
//! returns the effects the caller must perform (network calls, playback,
//! analytics). The machine itself never talks to the outside world.

use crate::{Annotation, DomainError, MediaType, Photo, PhotoId, Point};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Previous,
    Next,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LightboxTimings {
    pub wheel_debounce_ms: u64,
    pub double_tap_ms: u64,
    pub autoplay_delay_ms: u64,
    pub swipe_min_distance: f64,
    pub prefetch_margin: usize,
}

impl Default for LightboxTimings {
    fn default() -> Self {
        Self {
            wheel_debounce_ms: 400,
            double_tap_ms: 300,
            autoplay_delay_ms: 500,
            swipe_min_distance: 50.0,
            prefetch_margin: 3,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LightboxItem {
    pub photo_id: PhotoId,
    pub media_type: MediaType,
}

impl From<&Photo> for LightboxItem {
    fn from(photo: &Photo) -> Self {
        Self {
            photo_id: photo.id.clone(),
            media_type: photo.media_type,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationStage {
    Drawing { points: Vec<Point> },
    Composing { annotation: Annotation },
}

#[derive(Debug, Clone, PartialEq)]
pub enum LightboxState {
    Closed,
    ViewingImage,
    ViewingVideoPaused,
    ViewingVideoPlaying,
    EditingAnnotation(AnnotationStage),
}

impl LightboxState {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Closed => "closed",
            Self::ViewingImage => "viewing image",
            Self::ViewingVideoPaused => "viewing paused video",
            Self::ViewingVideoPlaying => "viewing playing video",
            Self::EditingAnnotation(AnnotationStage::Drawing { .. }) => "drawing annotation",
            Self::EditingAnnotation(AnnotationStage::Composing { .. }) => "composing feedback",
        }
    }

    fn for_media(media_type: MediaType) -> Self {
        match media_type {
            MediaType::Image => Self::ViewingImage,
            MediaType::Video => Self::ViewingVideoPaused,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Key {
    ArrowUp,
    ArrowDown,
    ArrowLeft,
    ArrowRight,
    Escape,
    Space,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LightboxInput {
    Open { index: usize },
    Navigate(Direction),
    Wheel { delta_y: f64 },
    TouchStart { x: f64, y: f64 },
    TouchEnd { x: f64, y: f64 },
    Key(Key),
    Tap,
    TogglePlayback,
    StartAnnotation,
    /// Coordinates are normalized to the displayed image.
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    SubmitFeedback { text: String },
    CancelFeedback,
    Close,
    BackdropClick,
    StartSlideshow { interval_ms: u64 },
    StopSlideshow,
    Tick,
}

#[derive(Debug, Clone, PartialEq)]
pub enum LightboxEffect {
    SelectionChanged { photo_id: PhotoId, generation: u64 },
    SelectionEnded { photo_id: PhotoId },
    PlayVideo { photo_id: PhotoId },
    PauseVideo { photo_id: PhotoId },
    ToggleFavorite { photo_id: PhotoId },
    ControlsVisibility(bool),
    SubmitAnnotation {
        photo_id: PhotoId,
        annotation: Annotation,
        text: String,
    },
    NearEnd,
    Closed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Slideshow {
    interval_ms: u64,
    next_due_ms: u64,
}

#[derive(Debug, Clone)]
pub struct Lightbox {
    items: Vec<LightboxItem>,
    index: usize,
    state: LightboxState,
    timings: LightboxTimings,
    generation: u64,
    controls_visible: bool,
    last_tap_ms: Option<u64>,
    last_wheel_ms: Option<u64>,
    touch_start: Option<(f64, f64)>,
    autoplay_due_ms: Option<u64>,
    slideshow: Option<Slideshow>,
}

impl Lightbox {
    pub fn new(items: Vec<LightboxItem>, timings: LightboxTimings) -> Self {
        Self {
            items,
            index: 0,
            state: LightboxState::Closed,
            timings,
            generation: 0,
            controls_visible: true,
            last_tap_ms: None,
            last_wheel_ms: None,
            touch_start: None,
            autoplay_due_ms: None,
            slideshow: None,
        }
    }

    pub fn from_photos(photos: &[Photo], timings: LightboxTimings) -> Self {
        Self::new(photos.iter().map(LightboxItem::from).collect(), timings)
    }

    pub fn state(&self) -> &LightboxState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state != LightboxState::Closed
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn items(&self) -> &[LightboxItem] {
        &self.items
    }

    pub fn current(&self) -> Option<&LightboxItem> {
        if self.is_open() {
            self.items.get(self.index)
        } else {
            None
        }
    }

    pub fn controls_visible(&self) -> bool {
        self.controls_visible
    }

    pub fn slideshow_active(&self) -> bool {
        self.slideshow.is_some()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// True when a result requested for `generation` still belongs to the
    /// visible selection.
    pub fn is_current(&self, generation: u64) -> bool {
        self.is_open() && generation == self.generation
    }

    pub fn handle(
        &mut self,
        input: LightboxInput,
        now_ms: u64,
    ) -> Result<Vec<LightboxEffect>, DomainError> {
        let mut effects = Vec::new();

        if let LightboxInput::Open { index } = input {
            self.open(index, now_ms, &mut effects)?;
            return Ok(effects);
        }
        if !self.is_open() {
            return Ok(effects);
        }

        let editing = matches!(self.state, LightboxState::EditingAnnotation(_));
        let suspended = editing && is_gesture(&input);

        match input {
            LightboxInput::Open { .. } => {}
            LightboxInput::Close
            | LightboxInput::BackdropClick
            | LightboxInput::Key(Key::Escape) => {
                self.close(&mut effects);
            }
            _ if suspended => {}
            LightboxInput::Navigate(direction) => self.navigate(direction, now_ms, &mut effects),
            LightboxInput::Wheel { delta_y } => self.wheel(delta_y, now_ms, &mut effects),
            LightboxInput::TouchStart { x, y } => self.touch_start = Some((x, y)),
            LightboxInput::TouchEnd { x, y } => self.touch_end(x, y, now_ms, &mut effects),
            LightboxInput::Key(Key::ArrowDown) | LightboxInput::Key(Key::ArrowRight) => {
                self.navigate(Direction::Next, now_ms, &mut effects)
            }
            LightboxInput::Key(Key::ArrowUp) | LightboxInput::Key(Key::ArrowLeft) => {
                self.navigate(Direction::Previous, now_ms, &mut effects)
            }
            LightboxInput::Key(Key::Space) => {
                if self.current_media() == Some(MediaType::Video) {
                    self.toggle_playback(&mut effects)?;
                }
            }
            LightboxInput::Tap => self.tap(now_ms, &mut effects),
            LightboxInput::TogglePlayback => self.toggle_playback(&mut effects)?,
            LightboxInput::StartAnnotation => {
                if self.state != LightboxState::ViewingImage {
                    return Err(self.invalid("start annotation"));
                }
                self.touch_start = None;
                self.state = LightboxState::EditingAnnotation(AnnotationStage::Drawing {
                    points: Vec::new(),
                });
            }
            LightboxInput::PointerDown { x, y } => {
                if let LightboxState::EditingAnnotation(AnnotationStage::Drawing { points }) =
                    &mut self.state
                {
                    points.clear();
                    points.push(Point::normalized(x, y)?);
                }
            }
            LightboxInput::PointerMove { x, y } => {
                if let LightboxState::EditingAnnotation(AnnotationStage::Drawing { points }) =
                    &mut self.state
                {
                    if !points.is_empty() {
                        points.push(Point::normalized(x, y)?);
                    }
                }
            }
            LightboxInput::PointerUp => self.pointer_up()?,
            LightboxInput::SubmitFeedback { text } => {
                let photo_id = self.current_photo_id()?;
                let state = std::mem::replace(&mut self.state, LightboxState::ViewingImage);
                match state {
                    LightboxState::EditingAnnotation(AnnotationStage::Composing { annotation }) => {
                        effects.push(LightboxEffect::SubmitAnnotation {
                            photo_id,
                            annotation,
                            text,
                        });
                    }
                    other => {
                        self.state = other;
                        return Err(self.invalid("submit feedback"));
                    }
                }
            }
            LightboxInput::CancelFeedback => {
                if editing {
                    self.state = LightboxState::ViewingImage;
                }
            }
            LightboxInput::StartSlideshow { interval_ms } => {
                if interval_ms == 0 {
                    return Err(DomainError::validation(
                        "slideshow interval",
                        "must be greater than zero",
                    ));
                }
                self.slideshow = Some(Slideshow {
                    interval_ms,
                    next_due_ms: now_ms + interval_ms,
                });
            }
            LightboxInput::StopSlideshow => self.slideshow = None,
            LightboxInput::Tick => self.tick(now_ms, &mut effects),
        }

        Ok(effects)
    }

    /// Swaps in a new item list (e.g. after load-more) while keeping the
    /// current photo selected when it is still present.
    pub fn replace_items(&mut self, items: Vec<LightboxItem>, now_ms: u64) -> Vec<LightboxEffect> {
        let mut effects = Vec::new();
        let current = self.current().map(|item| item.photo_id.clone());
        self.items = items;

        let Some(current) = current else {
            self.index = self.index.min(self.items.len().saturating_sub(1));
            return effects;
        };

        if let Some(position) = self.items.iter().position(|item| item.photo_id == current) {
            self.index = position;
            return effects;
        }

        if self.items.is_empty() {
            self.end_selection_of(current, &mut effects);
            self.reset_to_closed(&mut effects);
            return effects;
        }

        self.end_selection_of(current, &mut effects);
        let index = self.index.min(self.items.len() - 1);
        self.enter(index, now_ms, &mut effects);
        effects
    }

    fn open(
        &mut self,
        index: usize,
        now_ms: u64,
        effects: &mut Vec<LightboxEffect>,
    ) -> Result<(), DomainError> {
        if self.items.is_empty() {
            return Err(DomainError::EmptyLightbox);
        }
        if index >= self.items.len() {
            return Err(DomainError::IndexOutOfRange {
                index,
                len: self.items.len(),
            });
        }
        if self.is_open() {
            if index == self.index {
                return Ok(());
            }
            self.leave_current(effects);
        }
        self.controls_visible = true;
        self.enter(index, now_ms, effects);
        Ok(())
    }

    fn navigate(&mut self, direction: Direction, now_ms: u64, effects: &mut Vec<LightboxEffect>) {
        let len = self.items.len();
        if len == 0 {
            return;
        }
        let next = match direction {
            Direction::Next => (self.index + 1) % len,
            Direction::Previous => (self.index + len - 1) % len,
        };
        if let Some(slideshow) = self.slideshow.as_mut() {
            slideshow.next_due_ms = now_ms + slideshow.interval_ms;
        }
        if next == self.index {
            return;
        }
        self.leave_current(effects);
        self.enter(next, now_ms, effects);
    }

    fn wheel(&mut self, delta_y: f64, now_ms: u64, effects: &mut Vec<LightboxEffect>) {
        if !delta_y.is_finite() || delta_y == 0.0 {
            return;
        }
        if let Some(last) = self.last_wheel_ms {
            if now_ms.saturating_sub(last) < self.timings.wheel_debounce_ms {
                return;
            }
        }
        self.last_wheel_ms = Some(now_ms);
        let direction = if delta_y > 0.0 {
            Direction::Next
        } else {
            Direction::Previous
        };
        self.navigate(direction, now_ms, effects);
    }

    fn touch_end(&mut self, x: f64, y: f64, now_ms: u64, effects: &mut Vec<LightboxEffect>) {
        let Some((start_x, start_y)) = self.touch_start.take() else {
            return;
        };
        let dx = x - start_x;
        let dy = y - start_y;
        let min = self.timings.swipe_min_distance;

        if dx.abs() < min && dy.abs() < min {
            self.tap(now_ms, effects);
            return;
        }
        // Horizontal swipes are intentionally inert.
        if dy.abs() <= dx.abs() || dy.abs() < min {
            return;
        }
        let direction = if dy < 0.0 {
            Direction::Next
        } else {
            Direction::Previous
        };
        self.navigate(direction, now_ms, effects);
    }

    fn tap(&mut self, now_ms: u64, effects: &mut Vec<LightboxEffect>) {
        if let Some(last) = self.last_tap_ms {
            if now_ms.saturating_sub(last) < self.timings.double_tap_ms {
                self.last_tap_ms = None;
                if let Some(item) = self.items.get(self.index) {
                    effects.push(LightboxEffect::ToggleFavorite {
                        photo_id: item.photo_id.clone(),
                    });
                }
                return;
            }
        }
        self.last_tap_ms = Some(now_ms);
        self.controls_visible = !self.controls_visible;
        effects.push(LightboxEffect::ControlsVisibility(self.controls_visible));
    }

    fn toggle_playback(&mut self, effects: &mut Vec<LightboxEffect>) -> Result<(), DomainError> {
        let photo_id = self.current_photo_id()?;
        match self.state {
            LightboxState::ViewingVideoPaused => {
                self.autoplay_due_ms = None;
                self.state = LightboxState::ViewingVideoPlaying;
                effects.push(LightboxEffect::PlayVideo { photo_id });
                Ok(())
            }
            LightboxState::ViewingVideoPlaying => {
                self.state = LightboxState::ViewingVideoPaused;
                effects.push(LightboxEffect::PauseVideo { photo_id });
                Ok(())
            }
            _ => Err(self.invalid("toggle playback")),
        }
    }

    fn pointer_up(&mut self) -> Result<(), DomainError> {
        let LightboxState::EditingAnnotation(AnnotationStage::Drawing { points }) = &mut self.state
        else {
            return Ok(());
        };
        if points.len() < Annotation::MIN_POINTS {
            self.state = LightboxState::ViewingImage;
            return Ok(());
        }
        let annotation = Annotation::new(std::mem::take(points))?;
        self.state = LightboxState::EditingAnnotation(AnnotationStage::Composing { annotation });
        Ok(())
    }

    fn tick(&mut self, now_ms: u64, effects: &mut Vec<LightboxEffect>) {
        if let Some(due) = self.autoplay_due_ms {
            if now_ms >= due && self.state == LightboxState::ViewingVideoPaused {
                self.autoplay_due_ms = None;
                if let Some(item) = self.items.get(self.index) {
                    self.state = LightboxState::ViewingVideoPlaying;
                    effects.push(LightboxEffect::PlayVideo {
                        photo_id: item.photo_id.clone(),
                    });
                }
            }
        }

        let Some(slideshow) = self.slideshow else {
            return;
        };
        if now_ms < slideshow.next_due_ms
            || matches!(self.state, LightboxState::EditingAnnotation(_))
        {
            return;
        }
        self.navigate(Direction::Next, now_ms, effects);
    }

    fn close(&mut self, effects: &mut Vec<LightboxEffect>) {
        self.leave_current(effects);
        self.reset_to_closed(effects);
    }

    fn reset_to_closed(&mut self, effects: &mut Vec<LightboxEffect>) {
        self.state = LightboxState::Closed;
        self.slideshow = None;
        self.autoplay_due_ms = None;
        self.touch_start = None;
        self.last_tap_ms = None;
        self.last_wheel_ms = None;
        effects.push(LightboxEffect::Closed);
    }

    fn leave_current(&mut self, effects: &mut Vec<LightboxEffect>) {
        let Some(item) = self.items.get(self.index) else {
            return;
        };
        let photo_id = item.photo_id.clone();
        if self.state == LightboxState::ViewingVideoPlaying {
            effects.push(LightboxEffect::PauseVideo {
                photo_id: photo_id.clone(),
            });
        }
        self.end_selection_of(photo_id, effects);
    }

    fn end_selection_of(&mut self, photo_id: PhotoId, effects: &mut Vec<LightboxEffect>) {
        effects.push(LightboxEffect::SelectionEnded { photo_id });
    }

    fn enter(&mut self, index: usize, now_ms: u64, effects: &mut Vec<LightboxEffect>) {
        let item = &self.items[index];
        self.index = index;
        self.generation += 1;
        self.state = LightboxState::for_media(item.media_type);
        self.autoplay_due_ms = match item.media_type {
            MediaType::Video => Some(now_ms + self.timings.autoplay_delay_ms),
            MediaType::Image => None,
        };
        effects.push(LightboxEffect::SelectionChanged {
            photo_id: item.photo_id.clone(),
            generation: self.generation,
        });
        if index + self.timings.prefetch_margin >= self.items.len() {
            effects.push(LightboxEffect::NearEnd);
        }
    }

    fn current_media(&self) -> Option<MediaType> {
        self.items.get(self.index).map(|item| item.media_type)
    }

    fn current_photo_id(&self) -> Result<PhotoId, DomainError> {
        self.items
            .get(self.index)
            .map(|item| item.photo_id.clone())
            .ok_or(DomainError::IndexOutOfRange {
                index: self.index,
                len: self.items.len(),
            })
    }

    fn invalid(&self, action: &'static str) -> DomainError {
        DomainError::InvalidTransition {
            action,
            state: self.state.name(),
        }
    }
}

fn is_gesture(input: &LightboxInput) -> bool {
    matches!(
        input,
        LightboxInput::Navigate(_)
            | LightboxInput::Wheel { .. }
            | LightboxInput::TouchStart { .. }
            | LightboxInput::TouchEnd { .. }
            | LightboxInput::Key(_)
            | LightboxInput::Tap
            | LightboxInput::TogglePlayback
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(id: &str, media_type: MediaType) -> LightboxItem {
        LightboxItem {
            photo_id: PhotoId::new(id).expect("id"),
            media_type,
        }
    }

    fn images(ids: &[&str]) -> Lightbox {
        let timings = LightboxTimings {
            prefetch_margin: 0,
            ..LightboxTimings::default()
        };
        Lightbox::new(
            ids.iter().map(|id| item(id, MediaType::Image)).collect(),
            timings,
        )
    }

    fn current_id(lightbox: &Lightbox) -> &str {
        lightbox.current().expect("open").photo_id.as_str()
    }

    #[test]
    fn next_wraps_from_last_to_first() {
        let mut lightbox = images(&["A", "B", "C"]);
        lightbox.handle(LightboxInput::Open { index: 1 }, 0).expect("open");

        lightbox
            .handle(LightboxInput::Navigate(Direction::Next), 10)
            .expect("next");
        assert_eq!((lightbox.index(), current_id(&lightbox)), (2, "C"));

        lightbox
            .handle(LightboxInput::Navigate(Direction::Next), 20)
            .expect("next");
        assert_eq!((lightbox.index(), current_id(&lightbox)), (0, "A"));
    }

    #[test]
    fn previous_wraps_from_first_to_last() {
        for len in 1..6 {
            let ids: Vec<String> = (0..len).map(|i| format!("p{i}")).collect();
            let refs: Vec<&str> = ids.iter().map(String::as_str).collect();
            let mut lightbox = images(&refs);
            lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");
            lightbox
                .handle(LightboxInput::Navigate(Direction::Previous), 1)
                .expect("previous");
            assert_eq!(lightbox.index(), len - 1);
        }
    }

    #[test]
    fn open_rejects_out_of_range_and_empty() {
        let mut lightbox = images(&["A"]);
        assert!(matches!(
            lightbox.handle(LightboxInput::Open { index: 3 }, 0),
            Err(DomainError::IndexOutOfRange { index: 3, len: 1 })
        ));

        let mut empty = images(&[]);
        assert!(matches!(
            empty.handle(LightboxInput::Open { index: 0 }, 0),
            Err(DomainError::EmptyLightbox)
        ));
    }

    #[test]
    fn navigation_emits_selection_lifecycle() {
        let mut lightbox = images(&["A", "B"]);
        let opened = lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");
        assert_eq!(
            opened,
            vec![LightboxEffect::SelectionChanged {
                photo_id: PhotoId::new("A").expect("id"),
                generation: 1,
            }]
        );

        let effects = lightbox
            .handle(LightboxInput::Key(Key::ArrowDown), 5)
            .expect("key");
        assert_eq!(
            effects,
            vec![
                LightboxEffect::SelectionEnded {
                    photo_id: PhotoId::new("A").expect("id"),
                },
                LightboxEffect::SelectionChanged {
                    photo_id: PhotoId::new("B").expect("id"),
                    generation: 2,
                },
            ]
        );
    }

    #[test]
    fn double_tap_toggles_favorite_within_window() {
        let mut lightbox = images(&["A"]);
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");

        lightbox.handle(LightboxInput::Tap, 1_000).expect("tap");
        let effects = lightbox.handle(LightboxInput::Tap, 1_200).expect("tap");
        assert_eq!(
            effects,
            vec![LightboxEffect::ToggleFavorite {
                photo_id: PhotoId::new("A").expect("id"),
            }]
        );
        assert_eq!(lightbox.state(), &LightboxState::ViewingImage);
    }

    #[test]
    fn slow_taps_only_toggle_controls() {
        let mut lightbox = images(&["A"]);
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");
        assert!(lightbox.controls_visible());

        let first = lightbox.handle(LightboxInput::Tap, 1_000).expect("tap");
        let second = lightbox.handle(LightboxInput::Tap, 1_500).expect("tap");

        assert_eq!(first, vec![LightboxEffect::ControlsVisibility(false)]);
        assert_eq!(second, vec![LightboxEffect::ControlsVisibility(true)]);
        assert!(lightbox.controls_visible());
    }

    #[test]
    fn wheel_is_debounced() {
        let mut lightbox = images(&["A", "B", "C", "D"]);
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");

        lightbox.handle(LightboxInput::Wheel { delta_y: 120.0 }, 1_000).expect("wheel");
        lightbox.handle(LightboxInput::Wheel { delta_y: 120.0 }, 1_100).expect("wheel");
        lightbox.handle(LightboxInput::Wheel { delta_y: 120.0 }, 1_399).expect("wheel");
        assert_eq!(lightbox.index(), 1);

        lightbox.handle(LightboxInput::Wheel { delta_y: -3.0 }, 1_400).expect("wheel");
        assert_eq!(lightbox.index(), 0);
    }

    #[test]
    fn vertical_swipe_navigates_and_horizontal_is_ignored() {
        let mut lightbox = images(&["A", "B", "C"]);
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");

        lightbox.handle(LightboxInput::TouchStart { x: 100.0, y: 400.0 }, 10).expect("start");
        lightbox.handle(LightboxInput::TouchEnd { x: 110.0, y: 200.0 }, 20).expect("end");
        assert_eq!(lightbox.index(), 1);

        lightbox.handle(LightboxInput::TouchStart { x: 100.0, y: 400.0 }, 30).expect("start");
        lightbox.handle(LightboxInput::TouchEnd { x: 400.0, y: 380.0 }, 40).expect("end");
        assert_eq!(lightbox.index(), 1);

        lightbox.handle(LightboxInput::TouchStart { x: 100.0, y: 200.0 }, 50).expect("start");
        lightbox.handle(LightboxInput::TouchEnd { x: 100.0, y: 420.0 }, 60).expect("end");
        assert_eq!(lightbox.index(), 0);
    }

    #[test]
    fn short_touch_counts_as_tap() {
        let mut lightbox = images(&["A"]);
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");
        lightbox.handle(LightboxInput::TouchStart { x: 10.0, y: 10.0 }, 100).expect("start");
        let effects = lightbox
            .handle(LightboxInput::TouchEnd { x: 12.0, y: 14.0 }, 150)
            .expect("end");
        assert_eq!(effects, vec![LightboxEffect::ControlsVisibility(false)]);
    }

    #[test]
    fn video_autoplays_after_delay() {
        let mut lightbox = Lightbox::new(
            vec![item("V", MediaType::Video)],
            LightboxTimings::default(),
        );
        lightbox.handle(LightboxInput::Open { index: 0 }, 1_000).expect("open");
        assert_eq!(lightbox.state(), &LightboxState::ViewingVideoPaused);

        assert!(lightbox.handle(LightboxInput::Tick, 1_499).expect("tick").is_empty());
        let effects = lightbox.handle(LightboxInput::Tick, 1_500).expect("tick");
        assert_eq!(
            effects,
            vec![LightboxEffect::PlayVideo {
                photo_id: PhotoId::new("V").expect("id"),
            }]
        );
        assert_eq!(lightbox.state(), &LightboxState::ViewingVideoPlaying);

        lightbox.handle(LightboxInput::TogglePlayback, 2_000).expect("pause");
        assert_eq!(lightbox.state(), &LightboxState::ViewingVideoPaused);
    }

    #[test]
    fn manual_pause_before_autoplay_cancels_it() {
        let mut lightbox = Lightbox::new(
            vec![item("V", MediaType::Video)],
            LightboxTimings::default(),
        );
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");
        lightbox.handle(LightboxInput::TogglePlayback, 100).expect("play");
        lightbox.handle(LightboxInput::TogglePlayback, 200).expect("pause");

        assert!(lightbox.handle(LightboxInput::Tick, 1_000).expect("tick").is_empty());
        assert_eq!(lightbox.state(), &LightboxState::ViewingVideoPaused);
    }

    #[test]
    fn leaving_a_playing_video_pauses_it() {
        let mut lightbox = Lightbox::new(
            vec![item("V", MediaType::Video), item("I", MediaType::Image)],
            LightboxTimings {
                prefetch_margin: 0,
                ..LightboxTimings::default()
            },
        );
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");
        lightbox.handle(LightboxInput::Tick, 600).expect("autoplay");

        let effects = lightbox
            .handle(LightboxInput::Navigate(Direction::Next), 700)
            .expect("next");
        assert_eq!(
            effects[0],
            LightboxEffect::PauseVideo {
                photo_id: PhotoId::new("V").expect("id"),
            }
        );
        assert_eq!(lightbox.state(), &LightboxState::ViewingImage);
    }

    #[test]
    fn playback_toggle_on_image_is_rejected() {
        let mut lightbox = images(&["A"]);
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");
        assert!(matches!(
            lightbox.handle(LightboxInput::TogglePlayback, 1),
            Err(DomainError::InvalidTransition { .. })
        ));
    }

    #[test]
    fn annotation_flow_captures_polygon_and_submits() {
        let mut lightbox = images(&["A", "B"]);
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");
        lightbox.handle(LightboxInput::StartAnnotation, 10).expect("start");

        lightbox.handle(LightboxInput::PointerDown { x: 0.1, y: 0.1 }, 11).expect("down");
        lightbox.handle(LightboxInput::Navigate(Direction::Next), 12).expect("suspended");
        lightbox.handle(LightboxInput::Tap, 13).expect("suspended");
        lightbox.handle(LightboxInput::Tap, 14).expect("suspended");
        lightbox.handle(LightboxInput::PointerMove { x: 0.4, y: 0.2 }, 15).expect("move");
        lightbox.handle(LightboxInput::PointerMove { x: 0.3, y: 0.6 }, 16).expect("move");
        lightbox.handle(LightboxInput::PointerUp, 17).expect("up");

        assert_eq!(lightbox.index(), 0);
        assert!(matches!(
            lightbox.state(),
            LightboxState::EditingAnnotation(AnnotationStage::Composing { .. })
        ));

        let effects = lightbox
            .handle(
                LightboxInput::SubmitFeedback {
                    text: "retouch here".to_string(),
                },
                20,
            )
            .expect("submit");
        match &effects[..] {
            [LightboxEffect::SubmitAnnotation {
                photo_id,
                annotation,
                text,
            }] => {
                assert_eq!(photo_id.as_str(), "A");
                assert_eq!(annotation.points().len(), 3);
                assert_eq!(text, "retouch here");
            }
            other => panic!("unexpected effects: {other:?}"),
        }
        assert_eq!(lightbox.state(), &LightboxState::ViewingImage);
    }

    #[test]
    fn pointer_up_without_enough_points_cancels_drawing() {
        let mut lightbox = images(&["A"]);
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");
        lightbox.handle(LightboxInput::StartAnnotation, 1).expect("start");
        lightbox.handle(LightboxInput::PointerDown { x: 0.5, y: 0.5 }, 2).expect("down");
        lightbox.handle(LightboxInput::PointerUp, 3).expect("up");
        assert_eq!(lightbox.state(), &LightboxState::ViewingImage);
    }

    #[test]
    fn annotation_is_image_only() {
        let mut lightbox = Lightbox::new(
            vec![item("V", MediaType::Video)],
            LightboxTimings::default(),
        );
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");
        assert!(matches!(
            lightbox.handle(LightboxInput::StartAnnotation, 1),
            Err(DomainError::InvalidTransition { action: "start annotation", .. })
        ));
    }

    #[test]
    fn escape_closes_from_any_state_and_stops_slideshow() {
        let mut lightbox = images(&["A", "B"]);
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");
        lightbox
            .handle(LightboxInput::StartSlideshow { interval_ms: 1_000 }, 0)
            .expect("slideshow");
        lightbox.handle(LightboxInput::StartAnnotation, 1).expect("annotate");

        let effects = lightbox.handle(LightboxInput::Key(Key::Escape), 2).expect("escape");
        assert_eq!(effects.last(), Some(&LightboxEffect::Closed));
        assert_eq!(lightbox.state(), &LightboxState::Closed);
        assert!(!lightbox.slideshow_active());
        assert!(lightbox.current().is_none());
    }

    #[test]
    fn slideshow_advances_on_tick() {
        let mut lightbox = images(&["A", "B", "C"]);
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");
        lightbox
            .handle(LightboxInput::StartSlideshow { interval_ms: 3_000 }, 0)
            .expect("slideshow");

        lightbox.handle(LightboxInput::Tick, 2_999).expect("tick");
        assert_eq!(lightbox.index(), 0);
        lightbox.handle(LightboxInput::Tick, 3_000).expect("tick");
        assert_eq!(lightbox.index(), 1);
        lightbox.handle(LightboxInput::Tick, 5_000).expect("tick");
        assert_eq!(lightbox.index(), 1);
        lightbox.handle(LightboxInput::Tick, 6_000).expect("tick");
        assert_eq!(lightbox.index(), 2);
    }

    #[test]
    fn stale_generation_is_not_current() {
        let mut lightbox = images(&["A", "B"]);
        lightbox.handle(LightboxInput::Open { index: 0 }, 0).expect("open");
        let requested_for = lightbox.generation();
        lightbox
            .handle(LightboxInput::Navigate(Direction::Next), 1)
            .expect("next");

        assert!(!lightbox.is_current(requested_for));
        assert!(lightbox.is_current(lightbox.generation()));
    }

    #[test]
    fn near_end_is_signalled_inside_prefetch_margin() {
        let mut lightbox = Lightbox::new(
            ["A", "B", "C", "D", "E"]
                .iter()
                .map(|id| item(id, MediaType::Image))
                .collect(),
            LightboxTimings {
                prefetch_margin: 2,
                ..LightboxTimings::default()
            },
        );
        let effects = lightbox.handle(LightboxInput::Open { index: 2 }, 0).expect("open");
        assert!(!effects.contains(&LightboxEffect::NearEnd));

        let effects = lightbox
            .handle(LightboxInput::Navigate(Direction::Next), 1)
            .expect("next");
        assert!(effects.contains(&LightboxEffect::NearEnd));
    }

    #[test]
    fn replace_items_keeps_current_selection() {
        let mut lightbox = images(&["A", "B"]);
        lightbox.handle(LightboxInput::Open { index: 1 }, 0).expect("open");
        let generation = lightbox.generation();

        let effects = lightbox.replace_items(
            vec![
                item("Z", MediaType::Image),
                item("A", MediaType::Image),
                item("B", MediaType::Image),
                item("C", MediaType::Image),
            ],
            5,
        );
        assert!(effects.is_empty());
        assert_eq!((lightbox.index(), current_id(&lightbox)), (2, "B"));
        assert!(lightbox.is_current(generation));
    }

    #[test]
    fn replace_items_without_current_reselects() {
        let mut lightbox = images(&["A", "B"]);
        lightbox.handle(LightboxInput::Open { index: 1 }, 0).expect("open");

        let effects = lightbox.replace_items(vec![item("C", MediaType::Image)], 5);
        assert_eq!(current_id(&lightbox), "C");
        assert!(matches!(effects[0], LightboxEffect::SelectionEnded { .. }));
        assert!(matches!(effects[1], LightboxEffect::SelectionChanged { .. }));

        let effects = lightbox.replace_items(Vec::new(), 6);
        assert_eq!(effects.last(), Some(&LightboxEffect::Closed));
        assert!(!lightbox.is_open());
    }

    #[test]
    fn inputs_are_ignored_while_closed() {
        let mut lightbox = images(&["A", "B"]);
        assert!(lightbox
            .handle(LightboxInput::Navigate(Direction::Next), 0)
            .expect("ignored")
            .is_empty());
        assert_eq!(lightbox.index(), 0);
    }
}
