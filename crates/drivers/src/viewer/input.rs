use minifb::Key as WindowKey;
use shotbook_domain::{AnnotationStage, Key, LightboxInput, LightboxState};

use super::draw::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Browsing,
    Drawing,
    Composing,
}

impl Mode {
    pub fn of(state: &LightboxState) -> Self {
        match state {
            LightboxState::EditingAnnotation(AnnotationStage::Drawing { .. }) => Self::Drawing,
            LightboxState::EditingAnnotation(AnnotationStage::Composing { .. }) => Self::Composing,
            _ => Self::Browsing,
        }
    }
}

/// Turns raw window events into lightbox inputs. Mouse presses act as
/// touches while browsing and as pen strokes while drawing.
#[derive(Debug, Default)]
pub struct InputMapper {
    was_down: bool,
    press: Option<(f32, f32)>,
    last_position: Option<(f32, f32)>,
    draft: String,
}

impl InputMapper {
    pub fn draft(&self) -> &str {
        &self.draft
    }

    pub fn key(
        &mut self,
        key: WindowKey,
        mode: Mode,
        slideshow_active: bool,
        slideshow_interval_ms: u64,
    ) -> Option<LightboxInput> {
        if mode == Mode::Composing {
            return match key {
                WindowKey::Enter => Some(LightboxInput::SubmitFeedback {
                    text: std::mem::take(&mut self.draft),
                }),
                WindowKey::Backspace => {
                    self.draft.pop();
                    None
                }
                WindowKey::Delete => {
                    self.draft.clear();
                    Some(LightboxInput::CancelFeedback)
                }
                WindowKey::Escape => {
                    self.draft.clear();
                    Some(LightboxInput::Key(Key::Escape))
                }
                _ => None,
            };
        }

        let input = match key {
            WindowKey::Left => LightboxInput::Key(Key::ArrowLeft),
            WindowKey::Right => LightboxInput::Key(Key::ArrowRight),
            WindowKey::Up => LightboxInput::Key(Key::ArrowUp),
            WindowKey::Down => LightboxInput::Key(Key::ArrowDown),
            WindowKey::Escape => LightboxInput::Key(Key::Escape),
            WindowKey::Space => LightboxInput::Key(Key::Space),
            WindowKey::Delete if mode == Mode::Drawing => LightboxInput::CancelFeedback,
            WindowKey::A if mode == Mode::Browsing => LightboxInput::StartAnnotation,
            WindowKey::P => LightboxInput::TogglePlayback,
            WindowKey::S if slideshow_active => LightboxInput::StopSlideshow,
            WindowKey::S => LightboxInput::StartSlideshow {
                interval_ms: slideshow_interval_ms,
            },
            _ => return None,
        };
        Some(input)
    }

    pub fn typed(&mut self, ch: char, mode: Mode) {
        if mode == Mode::Composing && !ch.is_control() {
            self.draft.push(ch);
        }
    }

    /// Vertical wheel movement; positive scrolls toward later items.
    pub fn wheel(&self, scroll_y: f32, mode: Mode) -> Option<LightboxInput> {
        if mode != Mode::Browsing || scroll_y == 0.0 {
            return None;
        }
        Some(LightboxInput::Wheel {
            delta_y: -f64::from(scroll_y),
        })
    }

    /// `image` is where the current media is drawn, if it is loaded.
    pub fn pointer(
        &mut self,
        down: bool,
        position: Option<(f32, f32)>,
        mode: Mode,
        stage: Rect,
        image: Option<Rect>,
    ) -> Vec<LightboxInput> {
        let pressed = down && !self.was_down;
        let released = !down && self.was_down;
        self.was_down = down;
        let moved = position.is_some() && position != self.last_position;
        if position.is_some() {
            self.last_position = position;
        }

        let mut inputs = Vec::new();
        match mode {
            Mode::Composing => self.press = None,
            Mode::Browsing => {
                if let (true, Some((x, y))) = (pressed, position) {
                    if stage.contains(x, y) {
                        self.press = Some((x, y));
                        inputs.push(LightboxInput::TouchStart {
                            x: f64::from(x),
                            y: f64::from(y),
                        });
                    } else {
                        inputs.push(LightboxInput::BackdropClick);
                    }
                }
                if released && self.press.take().is_some() {
                    if let Some((x, y)) = self.last_position {
                        inputs.push(LightboxInput::TouchEnd {
                            x: f64::from(x),
                            y: f64::from(y),
                        });
                    }
                }
            }
            Mode::Drawing => {
                let normalized = match (image, position) {
                    (Some(area), Some((x, y))) => area.normalize(x, y),
                    _ => None,
                };
                if pressed {
                    if let Some((x, y)) = normalized {
                        self.press = position;
                        inputs.push(LightboxInput::PointerDown { x, y });
                    }
                } else if down && moved && self.press.is_some() {
                    if let Some((x, y)) = normalized {
                        inputs.push(LightboxInput::PointerMove { x, y });
                    }
                }
                if released && self.press.take().is_some() {
                    inputs.push(LightboxInput::PointerUp);
                }
            }
        }
        inputs
    }
}
