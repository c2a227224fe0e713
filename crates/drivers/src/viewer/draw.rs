use font8x8::UnicodeFonts;

pub const BACKGROUND: u32 = 0x141414;
pub const STAGE: u32 = 0x000000;
pub const TEXT: u32 = 0xEDEDED;
pub const MUTED: u32 = 0x9A9A9A;
pub const ACCENT: u32 = 0xE0A33A;
pub const INK: u32 = 0xFF3B30;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: usize,
    pub top: usize,
    pub width: usize,
    pub height: usize,
}

impl Rect {
    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.left as f32
            && y >= self.top as f32
            && x < (self.left + self.width) as f32
            && y < (self.top + self.height) as f32
    }

    /// Maps window coordinates to `0..=1` within the rect.
    pub fn normalize(&self, x: f32, y: f32) -> Option<(f64, f64)> {
        if !self.contains(x, y) || self.width == 0 || self.height == 0 {
            return None;
        }
        let nx = (x - self.left as f32) / self.width as f32;
        let ny = (y - self.top as f32) / self.height as f32;
        Some((f64::from(nx).clamp(0.0, 1.0), f64::from(ny).clamp(0.0, 1.0)))
    }
}

/// Decoded media already scaled to fit the stage.
#[derive(Debug, Clone)]
pub struct Canvas {
    pub width: usize,
    pub height: usize,
    pub pixels: Vec<u32>,
}

impl Canvas {
    pub fn fit(src_width: usize, src_height: usize, pixels: &[u32], bounds: Rect) -> Option<Self> {
        if src_width == 0 || src_height == 0 || pixels.len() < src_width * src_height {
            return None;
        }
        let max_width = bounds.width.max(1);
        let max_height = bounds.height.max(1);
        let scale =
            (max_width as f32 / src_width as f32).min(max_height as f32 / src_height as f32);
        let width = ((src_width as f32 * scale).round() as usize).clamp(1, max_width);
        let height = ((src_height as f32 * scale).round() as usize).clamp(1, max_height);

        let mut scaled = vec![0_u32; width * height];
        for y in 0..height {
            let src_y = y * src_height / height;
            for x in 0..width {
                let src_x = x * src_width / width;
                scaled[y * width + x] = pixels[src_y * src_width + src_x];
            }
        }
        Some(Self {
            width,
            height,
            pixels: scaled,
        })
    }

    /// Where the canvas lands when centered in `stage`.
    pub fn placement(&self, stage: Rect) -> Rect {
        Rect {
            left: stage.left + stage.width.saturating_sub(self.width) / 2,
            top: stage.top + stage.height.saturating_sub(self.height) / 2,
            width: self.width.min(stage.width),
            height: self.height.min(stage.height),
        }
    }
}

pub fn blit(buffer: &mut [u32], width: usize, canvas: &Canvas, at: Rect) {
    for y in 0..at.height {
        for x in 0..at.width {
            set_pixel(buffer, width, at.left + x, at.top + y, canvas.pixels[y * canvas.width + x]);
        }
    }
}

pub fn fill_rect(buffer: &mut [u32], width: usize, rect: Rect, color: u32) {
    for y in rect.top..rect.top.saturating_add(rect.height) {
        for x in rect.left..rect.left.saturating_add(rect.width) {
            set_pixel(buffer, width, x, y, color);
        }
    }
}

pub fn draw_rect(buffer: &mut [u32], width: usize, rect: Rect, color: u32) {
    if rect.width == 0 || rect.height == 0 {
        return;
    }
    let right = rect.left + rect.width - 1;
    let bottom = rect.top + rect.height - 1;
    for x in rect.left..=right {
        set_pixel(buffer, width, x, rect.top, color);
        set_pixel(buffer, width, x, bottom, color);
    }
    for y in rect.top..=bottom {
        set_pixel(buffer, width, rect.left, y, color);
        set_pixel(buffer, width, right, y, color);
    }
}

/// Draws a polyline through normalized points inside `area`.
pub fn draw_stroke(
    buffer: &mut [u32],
    width: usize,
    area: Rect,
    points: &[(f64, f64)],
    color: u32,
) {
    let to_window = |(x, y): (f64, f64)| {
        (
            area.left as f64 + x * area.width as f64,
            area.top as f64 + y * area.height as f64,
        )
    };
    for pair in points.windows(2) {
        let (x0, y0) = to_window(pair[0]);
        let (x1, y1) = to_window(pair[1]);
        let steps = (x1 - x0).abs().max((y1 - y0).abs()).ceil().max(1.0) as usize;
        for step in 0..=steps {
            let t = step as f64 / steps as f64;
            let x = (x0 + (x1 - x0) * t).round() as usize;
            let y = (y0 + (y1 - y0) * t).round() as usize;
            let dot = Rect {
                left: x.saturating_sub(1),
                top: y.saturating_sub(1),
                width: 3,
                height: 3,
            };
            fill_rect(buffer, width, dot, color);
        }
    }
}

pub fn set_pixel(buffer: &mut [u32], width: usize, x: usize, y: usize, color: u32) {
    let height = buffer.len() / width.max(1);
    if x < width && y < height {
        buffer[y * width + x] = color;
    }
}

pub fn draw_text(buffer: &mut [u32], width: usize, x: usize, y: usize, text: &str, color: u32) {
    let mut cursor_x = x;
    for ch in text.chars().filter(|ch| *ch != '\n') {
        draw_char(buffer, width, cursor_x, y, ch, color);
        cursor_x = cursor_x.saturating_add(8);
    }
}

fn draw_char(buffer: &mut [u32], width: usize, x: usize, y: usize, ch: char, color: u32) {
    let glyph = font8x8::BASIC_FONTS.get(ch).unwrap_or([0; 8]);
    for (row, bits) in glyph.iter().enumerate() {
        for col in 0..8 {
            if (bits >> col) & 1 == 1 {
                set_pixel(buffer, width, x + col, y + row, color);
            }
        }
    }
}

/// Shortens `text` to at most `max_chars` glyphs, marking the cut.
pub fn ellipsize(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let kept: String = text.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{kept}...")
}
