mod draw;
mod input;

use std::cell::RefCell;
use std::rc::Rc;
use std::time::Duration;

use minifb::{InputCallback, KeyRepeat, MouseButton, MouseMode, Window, WindowOptions};
use shotbook_application::{MediaLoader, MediaRequest, ViewerSession};
use shotbook_domain::{AnnotationStage, LightboxEffect, LightboxInput, LightboxState, PhotoId};
use tracing::{debug, warn};

use draw::{Canvas, Rect};
use input::{InputMapper, Mode};

const WINDOW_WIDTH: usize = 1280;
const WINDOW_HEIGHT: usize = 800;
const HEADER_HEIGHT: usize = 36;
const FOOTER_HEIGHT: usize = 52;
const TEXT_INSET: usize = 14;

const HELP: &str =
    "arrows: browse  double-click: favorite  A: annotate  P/space: play  S: slideshow  esc: close";

pub struct ViewerOptions {
    pub start_index: usize,
    pub slideshow_interval_ms: u64,
}

/// Shared between the window's text callback and the event loop.
#[derive(Default)]
struct TypedChars(Rc<RefCell<Vec<char>>>);

impl InputCallback for TypedChars {
    fn add_char(&mut self, uni_char: u32) {
        if let Some(ch) = char::from_u32(uni_char) {
            self.0.borrow_mut().push(ch);
        }
    }
}

struct Displayed {
    photo_id: PhotoId,
    has_still: bool,
    canvas: Option<Canvas>,
}

/// Runs the lightbox window until it is closed, by the user or because the
/// gallery became empty.
pub fn launch_viewer(
    session: &mut ViewerSession<'_>,
    loader: &dyn MediaLoader,
    options: ViewerOptions,
) -> Result<(), String> {
    let mut window = Window::new(
        &format!("shotbook | {}", gallery_title(session)),
        WINDOW_WIDTH,
        WINDOW_HEIGHT,
        WindowOptions::default(),
    )
    .map_err(|error| format!("failed to start viewer window: {error}"))?;
    window.limit_update_rate(Some(Duration::from_micros(16_000)));

    let typed = Rc::new(RefCell::new(Vec::new()));
    window.set_input_callback(Box::new(TypedChars(Rc::clone(&typed))));

    let mut buffer = vec![draw::BACKGROUND; WINDOW_WIDTH * WINDOW_HEIGHT];
    let mut mapper = InputMapper::default();
    let mut displayed: Option<Displayed> = None;
    let mut notice: Option<String> = None;

    let opened = session
        .handle(LightboxInput::Open {
            index: options.start_index,
        })
        .map_err(|error| format!("cannot open viewer: {error}"))?;
    request_media(session, loader, &opened, &mut displayed);

    let stage = stage_rect(WINDOW_WIDTH, WINDOW_HEIGHT);
    while window.is_open() && session.lightbox().is_open() {
        let mode = Mode::of(session.lightbox().state());
        let mut inputs = Vec::new();

        for ch in typed.borrow_mut().drain(..) {
            mapper.typed(ch, mode);
        }
        for key in window.get_keys_pressed(KeyRepeat::No) {
            inputs.extend(mapper.key(
                key,
                mode,
                session.lightbox().slideshow_active(),
                options.slideshow_interval_ms,
            ));
        }
        if let Some((_, scroll_y)) = window.get_scroll_wheel() {
            inputs.extend(mapper.wheel(scroll_y, mode));
        }
        let image_area = displayed
            .as_ref()
            .and_then(|shown| shown.canvas.as_ref())
            .map(|canvas| canvas.placement(stage));
        inputs.extend(mapper.pointer(
            window.get_mouse_down(MouseButton::Left),
            window.get_mouse_pos(MouseMode::Discard),
            mode,
            stage,
            image_area,
        ));
        inputs.push(LightboxInput::Tick);

        for input in inputs {
            match session.handle(input) {
                Ok(effects) => {
                    if !effects.is_empty() {
                        notice = None;
                    }
                    request_media(session, loader, &effects, &mut displayed);
                }
                Err(error) => notice = Some(error.to_string()),
            }
        }

        match loader.try_receive() {
            Ok(Some(media)) if session.lightbox().is_current(media.generation) => {
                let shown = displayed
                    .as_mut()
                    .filter(|shown| shown.photo_id == media.photo_id);
                if let Some(shown) = shown {
                    shown.canvas = Canvas::fit(
                        media.width as usize,
                        media.height as usize,
                        &media.pixels,
                        stage,
                    );
                }
            }
            Ok(Some(media)) => debug!(photo_id = %media.photo_id, "ignoring stale media"),
            Ok(None) => {}
            Err(error) => {
                warn!(%error, "media loader stopped");
                notice = Some(error.to_string());
            }
        }

        render(&mut buffer, session, &mapper, displayed.as_ref(), notice.as_deref(), stage);
        window
            .update_with_buffer(&buffer, WINDOW_WIDTH, WINDOW_HEIGHT)
            .map_err(|error| format!("failed to update viewer window: {error}"))?;
    }

    if session.lightbox().is_open() {
        session
            .handle(LightboxInput::Close)
            .map_err(|error| format!("failed to close viewer: {error}"))?;
    }
    Ok(())
}

fn gallery_title(session: &ViewerSession<'_>) -> String {
    session
        .feed()
        .gallery()
        .map(|gallery| gallery.name.clone())
        .unwrap_or_else(|| session.feed().gallery_id().to_string())
}

fn stage_rect(width: usize, height: usize) -> Rect {
    Rect {
        left: 0,
        top: HEADER_HEIGHT,
        width,
        height: height.saturating_sub(HEADER_HEIGHT + FOOTER_HEIGHT),
    }
}

fn request_media(
    session: &ViewerSession<'_>,
    loader: &dyn MediaLoader,
    effects: &[LightboxEffect],
    displayed: &mut Option<Displayed>,
) {
    for effect in effects {
        match effect {
            LightboxEffect::SelectionChanged {
                photo_id,
                generation,
            } => {
                let url = session
                    .feed()
                    .photo(photo_id)
                    .and_then(|photo| photo.display_url());
                *displayed = Some(Displayed {
                    photo_id: photo_id.clone(),
                    has_still: url.is_some(),
                    canvas: None,
                });
                let Some(url) = url else {
                    debug!(%photo_id, "photo has no displayable rendition");
                    continue;
                };
                let request = MediaRequest {
                    photo_id: photo_id.clone(),
                    url: url.to_string(),
                    generation: *generation,
                };
                if let Err(error) = loader.submit(request) {
                    warn!(%photo_id, %error, "could not queue media load");
                }
            }
            LightboxEffect::Closed => *displayed = None,
            _ => {}
        }
    }
}

fn render(
    buffer: &mut [u32],
    session: &ViewerSession<'_>,
    mapper: &InputMapper,
    displayed: Option<&Displayed>,
    notice: Option<&str>,
    stage: Rect,
) {
    let width = WINDOW_WIDTH;
    buffer.fill(draw::BACKGROUND);
    draw::fill_rect(buffer, width, stage, draw::STAGE);

    let canvas = displayed.and_then(|shown| shown.canvas.as_ref());
    match canvas {
        Some(canvas) => draw::blit(buffer, width, canvas, canvas.placement(stage)),
        None => {
            let placeholder = match displayed {
                Some(shown) if !shown.has_still => "no preview available",
                _ => "loading...",
            };
            draw::draw_text(
                buffer,
                width,
                (stage.left + stage.width / 2).saturating_sub(placeholder.len() * 4),
                stage.top + stage.height / 2,
                placeholder,
                draw::MUTED,
            );
        }
    }

    let lightbox = session.lightbox();
    if let (Some(canvas), LightboxState::EditingAnnotation(editing)) = (canvas, lightbox.state()) {
        let area = canvas.placement(stage);
        draw::draw_rect(buffer, width, area, draw::INK);
        let points: Vec<(f64, f64)> = match editing {
            AnnotationStage::Drawing { points } => points.iter().map(|p| (p.x, p.y)).collect(),
            AnnotationStage::Composing { annotation } => {
                annotation.points().iter().map(|p| (p.x, p.y)).collect()
            }
        };
        draw::draw_stroke(buffer, width, area, &points, draw::INK);
    }

    let max_chars = width.saturating_sub(2 * TEXT_INSET) / 8;
    if lightbox.controls_visible() {
        let header = match session.current_photo() {
            Some(photo) => format!(
                "{}/{}  {}  {} {}  {} comments",
                lightbox.index() + 1,
                lightbox.items().len(),
                photo.filename,
                if photo.is_favorite { "[fav]" } else { "favorites" },
                photo.favorites_count,
                photo.comments_count,
            ),
            None => String::new(),
        };
        let header = draw::ellipsize(&header, max_chars);
        draw::draw_text(buffer, width, TEXT_INSET, 14, &header, draw::TEXT);
        draw::draw_text(
            buffer,
            width,
            TEXT_INSET,
            WINDOW_HEIGHT - FOOTER_HEIGHT + 10,
            &draw::ellipsize(HELP, max_chars),
            draw::MUTED,
        );
    }

    let state_line = match lightbox.state() {
        LightboxState::EditingAnnotation(AnnotationStage::Drawing { .. }) => {
            "draw on the image, release to finish (del: cancel)".to_string()
        }
        LightboxState::EditingAnnotation(AnnotationStage::Composing { .. }) => {
            format!("feedback: {}_  (enter: send, del: cancel)", mapper.draft())
        }
        other => {
            let mut line = other.name().to_string();
            if lightbox.slideshow_active() {
                line.push_str("  slideshow");
            }
            if let Some(message) = notice.or(session.status()) {
                line.push_str("  ");
                line.push_str(message);
            }
            line
        }
    };
    draw::draw_text(
        buffer,
        width,
        TEXT_INSET,
        WINDOW_HEIGHT - FOOTER_HEIGHT + 30,
        &draw::ellipsize(&state_line, max_chars),
        draw::ACCENT,
    );
}
