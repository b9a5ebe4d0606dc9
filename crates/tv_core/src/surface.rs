//! Drawing surface abstraction consumed by scenes and the rendering system.
//!
//! Every coordinate is in the logical base resolution (see `BASE_WIDTH` /
//! `BASE_HEIGHT`). The host is responsible for letterboxing that space into
//! whatever window size it has. Transforms are limited to translate + scale,
//! which is all sprite mirroring and camera shake need.

use crate::assets::ImageHandle;

pub const BASE_WIDTH: f32 = 800.0;
pub const BASE_HEIGHT: f32 = 600.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub w: f32,
    pub h: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { x, y, w, h }
    }

    pub fn right(&self) -> f32 {
        self.x + self.w
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.h
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.w * 0.5, self.y + self.h * 0.5)
    }

    pub fn contains(&self, px: f32, py: f32) -> bool {
        px >= self.x && px < self.right() && py >= self.y && py < self.bottom()
    }

    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.right()
            && other.x < self.right()
            && self.y < other.bottom()
            && other.y < self.bottom()
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Rect {
        Rect::new(self.x + dx, self.y + dy, self.w, self.h)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Parse a `#rrggbb` hex string; anything malformed yields magenta so it
    /// stands out on screen.
    pub fn hex(value: &str) -> Self {
        let digits = value.trim_start_matches('#');
        let channel = |i: usize| {
            digits
                .get(i..i + 2)
                .and_then(|s| u8::from_str_radix(s, 16).ok())
        };
        match (digits.len(), channel(0), channel(2), channel(4)) {
            (6, Some(r), Some(g), Some(b)) => {
                Self::rgb(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0)
            }
            _ => Self::rgb(1.0, 0.0, 1.0),
        }
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Draw primitives a host must provide.
pub trait RenderSurface {
    fn fill_rect(&mut self, rect: Rect, color: Color);
    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32);
    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color);
    fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color, line_width: f32);
    /// `x`/`y` is the top-left of the text box; `size` is the font height.
    fn fill_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Color);
    /// Blit `src` (image pixels, whole image when `None`) into `dst`.
    fn draw_image(&mut self, image: &ImageHandle, src: Option<Rect>, dst: Rect);

    fn save(&mut self);
    fn restore(&mut self);
    fn translate(&mut self, dx: f32, dy: f32);
    fn scale(&mut self, sx: f32, sy: f32);
    /// Multiplied into every subsequent draw until the matching `restore`.
    fn set_alpha(&mut self, alpha: f32);
}

#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    FillRect(Rect, Color),
    StrokeRect(Rect, Color),
    FillCircle { cx: f32, cy: f32, radius: f32 },
    StrokeCircle { cx: f32, cy: f32, radius: f32 },
    Text(String),
    Image { path: String, src: Option<Rect>, dst: Rect },
    Save,
    Restore,
    Translate(f32, f32),
    Scale(f32, f32),
    Alpha(f32),
}

/// Surface that records every call. Used by tests and by anything that needs
/// to inspect what a scene would draw without a GPU.
#[derive(Debug, Default)]
pub struct RecordingSurface {
    pub commands: Vec<DrawCommand>,
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn texts(&self) -> Vec<&str> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                DrawCommand::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    pub fn contains_text(&self, needle: &str) -> bool {
        self.texts().iter().any(|t| t.contains(needle))
    }

    pub fn image_count(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Image { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl RenderSurface for RecordingSurface {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        self.commands.push(DrawCommand::FillRect(rect, color));
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, _line_width: f32) {
        self.commands.push(DrawCommand::StrokeRect(rect, color));
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, _color: Color) {
        self.commands.push(DrawCommand::FillCircle { cx, cy, radius });
    }

    fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, _color: Color, _line_width: f32) {
        self.commands
            .push(DrawCommand::StrokeCircle { cx, cy, radius });
    }

    fn fill_text(&mut self, text: &str, _x: f32, _y: f32, _size: f32, _color: Color) {
        self.commands.push(DrawCommand::Text(text.to_string()));
    }

    fn draw_image(&mut self, image: &ImageHandle, src: Option<Rect>, dst: Rect) {
        self.commands.push(DrawCommand::Image {
            path: image.path().to_string(),
            src,
            dst,
        });
    }

    fn save(&mut self) {
        self.commands.push(DrawCommand::Save);
    }

    fn restore(&mut self) {
        self.commands.push(DrawCommand::Restore);
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.commands.push(DrawCommand::Translate(dx, dy));
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.commands.push(DrawCommand::Scale(sx, sy));
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.commands.push(DrawCommand::Alpha(alpha));
    }
}
