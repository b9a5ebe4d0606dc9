//! CPU-side mesh builder behind `RenderSurface`.
//!
//! Every primitive becomes indexed triangles in logical coordinates. Solid
//! shapes sample `WHITE_TEXTURE`; images sample the texture registered under
//! their asset path. Consecutive primitives that share a texture collapse into
//! one `DrawCall`, so a frame of placeholder rectangles is a single draw.
//!
//! Text is not rasterised here. `fill_text` records a `TextRun` in canvas
//! space and the egui overlay paints the runs above the sprite pass.

use std::sync::Arc;

use tv_core::{Color, ImageHandle, Rect, RenderSurface};

use crate::vertex::SpriteVertex;

pub const WHITE_TEXTURE: &str = "__white";
const CIRCLE_SEGMENTS: u32 = 32;

/// A contiguous run of indices that share the same texture binding.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawCall {
    pub texture_key: Arc<str>,
    pub index_start: u32,
    pub index_count: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextRun {
    pub text: String,
    pub x: f32,
    pub y: f32,
    pub size: f32,
    pub color: [f32; 4],
}

#[derive(Debug, Clone, Copy, PartialEq)]
struct DrawState {
    tx: f32,
    ty: f32,
    sx: f32,
    sy: f32,
    alpha: f32,
}

impl Default for DrawState {
    fn default() -> Self {
        Self {
            tx: 0.0,
            ty: 0.0,
            sx: 1.0,
            sy: 1.0,
            alpha: 1.0,
        }
    }
}

#[derive(Debug, Default)]
pub struct QuadBatch {
    vertices: Vec<SpriteVertex>,
    indices: Vec<u32>,
    draw_calls: Vec<DrawCall>,
    texts: Vec<TextRun>,
    state: DrawState,
    stack: Vec<DrawState>,
    white: Option<Arc<str>>,
}

impl QuadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drop last frame's geometry and reset the transform stack.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
        self.draw_calls.clear();
        self.texts.clear();
        self.state = DrawState::default();
        self.stack.clear();
    }

    pub fn vertices(&self) -> &[SpriteVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn draw_calls(&self) -> &[DrawCall] {
        &self.draw_calls
    }

    pub fn texts(&self) -> &[TextRun] {
        &self.texts
    }

    /// Number of bind-group switches the draw calls need.
    pub fn texture_binds(&self) -> usize {
        let mut binds = 0;
        let mut current: Option<&str> = None;
        for draw in &self.draw_calls {
            let key: &str = &draw.texture_key;
            if current != Some(key) {
                current = Some(key);
                binds += 1;
            }
        }
        binds
    }

    fn white_key(&mut self) -> Arc<str> {
        self.white.get_or_insert_with(|| Arc::from(WHITE_TEXTURE)).clone()
    }

    fn map(&self, x: f32, y: f32) -> [f32; 2] {
        [x * self.state.sx + self.state.tx, y * self.state.sy + self.state.ty]
    }

    fn tint(&self, color: Color) -> [f32; 4] {
        let [r, g, b, a] = color.to_array();
        [r, g, b, a * self.state.alpha]
    }

    /// Append triangles over `vertices` (already mapped) and record the draw.
    fn push_mesh(&mut self, texture_key: Arc<str>, vertices: &[SpriteVertex], indices: &[u32]) {
        let base = self.vertices.len() as u32;
        self.vertices.extend_from_slice(vertices);
        let start = self.indices.len() as u32;
        self.indices.extend(indices.iter().map(|i| base + i));
        push_draw_call(&mut self.draw_calls, texture_key, start, indices.len() as u32);
    }

    /// `uv` is `[u0, v0, u1, v1]` for the rect's top-left and bottom-right.
    fn push_rect(&mut self, texture_key: Arc<str>, rect: Rect, uv: [f32; 4], color: [f32; 4]) {
        let [u0, v0, u1, v1] = uv;
        let quad = [
            SpriteVertex::new(self.map(rect.x, rect.y), [u0, v0], color),
            SpriteVertex::new(self.map(rect.right(), rect.y), [u1, v0], color),
            SpriteVertex::new(self.map(rect.right(), rect.bottom()), [u1, v1], color),
            SpriteVertex::new(self.map(rect.x, rect.bottom()), [u0, v1], color),
        ];
        self.push_mesh(texture_key, &quad, &[0, 1, 2, 0, 2, 3]);
    }

    fn solid_rect(&mut self, rect: Rect, color: [f32; 4]) {
        let key = self.white_key();
        self.push_rect(key, rect, [0.0, 0.0, 1.0, 1.0], color);
    }

    fn ring_point(&self, cx: f32, cy: f32, radius: f32, i: u32) -> [f32; 2] {
        let angle = i as f32 / CIRCLE_SEGMENTS as f32 * std::f32::consts::TAU;
        self.map(cx + radius * angle.cos(), cy + radius * angle.sin())
    }
}

/// Append a draw call, merging with the previous one when the texture matches
/// and indices are contiguous.
fn push_draw_call(
    draw_calls: &mut Vec<DrawCall>,
    texture_key: Arc<str>,
    index_start: u32,
    index_count: u32,
) {
    if let Some(last) = draw_calls.last_mut() {
        let contiguous = last.index_start + last.index_count == index_start;
        if *last.texture_key == *texture_key && contiguous {
            last.index_count += index_count;
            return;
        }
    }
    draw_calls.push(DrawCall {
        texture_key,
        index_start,
        index_count,
    });
}

impl RenderSurface for QuadBatch {
    fn fill_rect(&mut self, rect: Rect, color: Color) {
        let color = self.tint(color);
        if color[3] > 0.0 {
            self.solid_rect(rect, color);
        }
    }

    fn stroke_rect(&mut self, rect: Rect, color: Color, line_width: f32) {
        let color = self.tint(color);
        if color[3] <= 0.0 {
            return;
        }
        let lw = line_width.max(0.0);
        let half = lw * 0.5;
        let outer = Rect::new(rect.x - half, rect.y - half, rect.w + lw, rect.h + lw);
        self.solid_rect(Rect::new(outer.x, outer.y, outer.w, lw), color);
        self.solid_rect(Rect::new(outer.x, outer.bottom() - lw, outer.w, lw), color);
        self.solid_rect(Rect::new(outer.x, outer.y + lw, lw, outer.h - 2.0 * lw), color);
        self.solid_rect(
            Rect::new(outer.right() - lw, outer.y + lw, lw, outer.h - 2.0 * lw),
            color,
        );
    }

    fn fill_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color) {
        let color = self.tint(color);
        if color[3] <= 0.0 || radius <= 0.0 {
            return;
        }
        let mut vertices = Vec::with_capacity(CIRCLE_SEGMENTS as usize + 1);
        vertices.push(SpriteVertex::new(self.map(cx, cy), [0.5, 0.5], color));
        for i in 0..CIRCLE_SEGMENTS {
            vertices.push(SpriteVertex::new(self.ring_point(cx, cy, radius, i), [0.5, 0.5], color));
        }
        let indices: Vec<u32> = (0..CIRCLE_SEGMENTS)
            .flat_map(|i| [0, 1 + i, 1 + (i + 1) % CIRCLE_SEGMENTS])
            .collect();
        let key = self.white_key();
        self.push_mesh(key, &vertices, &indices);
    }

    fn stroke_circle(&mut self, cx: f32, cy: f32, radius: f32, color: Color, line_width: f32) {
        let color = self.tint(color);
        if color[3] <= 0.0 || radius <= 0.0 {
            return;
        }
        let inner = (radius - line_width * 0.5).max(0.0);
        let outer = radius + line_width * 0.5;
        let mut vertices = Vec::with_capacity(CIRCLE_SEGMENTS as usize * 2);
        for i in 0..CIRCLE_SEGMENTS {
            vertices.push(SpriteVertex::new(self.ring_point(cx, cy, inner, i), [0.5, 0.5], color));
            vertices.push(SpriteVertex::new(self.ring_point(cx, cy, outer, i), [0.5, 0.5], color));
        }
        let indices: Vec<u32> = (0..CIRCLE_SEGMENTS)
            .flat_map(|i| {
                let a = 2 * i;
                let b = 2 * ((i + 1) % CIRCLE_SEGMENTS);
                [a, a + 1, b + 1, a, b + 1, b]
            })
            .collect();
        let key = self.white_key();
        self.push_mesh(key, &vertices, &indices);
    }

    fn fill_text(&mut self, text: &str, x: f32, y: f32, size: f32, color: Color) {
        let color = self.tint(color);
        if color[3] <= 0.0 || text.is_empty() {
            return;
        }
        let [px, py] = self.map(x, y);
        self.texts.push(TextRun {
            text: text.to_string(),
            x: px,
            y: py,
            size: size * self.state.sy.abs(),
            color,
        });
    }

    fn draw_image(&mut self, image: &ImageHandle, src: Option<Rect>, dst: Rect) {
        let Some((width, height)) = image.size() else {
            return;
        };
        let color = self.tint(Color::WHITE);
        if color[3] <= 0.0 || width == 0 || height == 0 {
            return;
        }
        let src = src.unwrap_or(Rect::new(0.0, 0.0, width as f32, height as f32));
        let (w, h) = (width as f32, height as f32);
        let uv = [src.x / w, src.y / h, src.right() / w, src.bottom() / h];
        self.push_rect(Arc::from(image.path()), dst, uv, color);
    }

    fn save(&mut self) {
        self.stack.push(self.state);
    }

    fn restore(&mut self) {
        if let Some(state) = self.stack.pop() {
            self.state = state;
        }
    }

    fn translate(&mut self, dx: f32, dy: f32) {
        self.state.tx += dx * self.state.sx;
        self.state.ty += dy * self.state.sy;
    }

    fn scale(&mut self, sx: f32, sy: f32) {
        self.state.sx *= sx;
        self.state.sy *= sy;
    }

    fn set_alpha(&mut self, alpha: f32) {
        self.state.alpha = alpha.clamp(0.0, 1.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tv_core::SpriteSheet;

    fn position_of(batch: &QuadBatch, index: usize) -> [f32; 2] {
        batch.vertices()[index].position
    }

    #[test]
    fn consecutive_solid_shapes_share_one_draw_call() {
        let mut batch = QuadBatch::new();
        batch.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        batch.fill_rect(Rect::new(20.0, 0.0, 10.0, 10.0), Color::BLACK);
        batch.fill_circle(50.0, 50.0, 5.0, Color::WHITE);
        assert_eq!(batch.draw_calls().len(), 1);
        assert_eq!(
            batch.draw_calls()[0].index_count as usize,
            12 + 3 * CIRCLE_SEGMENTS as usize
        );
    }

    #[test]
    fn texture_change_splits_draw_calls() {
        let mut batch = QuadBatch::new();
        let image = ImageHandle::preloaded("hero.png", 64, 64);
        batch.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        batch.draw_image(&image, None, Rect::new(0.0, 0.0, 64.0, 64.0));
        batch.draw_image(&image, None, Rect::new(64.0, 0.0, 64.0, 64.0));
        batch.fill_rect(Rect::new(0.0, 0.0, 10.0, 10.0), Color::WHITE);
        let keys: Vec<&str> = batch.draw_calls().iter().map(|d| &*d.texture_key).collect();
        assert_eq!(keys, vec![WHITE_TEXTURE, "hero.png", WHITE_TEXTURE]);
        assert_eq!(batch.draw_calls()[1].index_count, 12);
        assert_eq!(batch.texture_binds(), 3);
    }

    #[test]
    fn images_that_are_not_loaded_draw_nothing() {
        let loader = tv_core::AssetLoader::new();
        let pending = loader.load("later.png");
        let mut batch = QuadBatch::new();
        batch.draw_image(&pending, None, Rect::new(0.0, 0.0, 8.0, 8.0));
        assert!(batch.vertices().is_empty());
        assert!(batch.draw_calls().is_empty());
    }

    #[test]
    fn transforms_apply_until_restore() {
        let mut batch = QuadBatch::new();
        batch.save();
        batch.translate(10.0, 20.0);
        batch.scale(2.0, 2.0);
        batch.fill_rect(Rect::new(1.0, 1.0, 5.0, 5.0), Color::WHITE);
        batch.restore();
        batch.fill_rect(Rect::new(1.0, 1.0, 5.0, 5.0), Color::WHITE);
        assert_eq!(position_of(&batch, 0), [12.0, 22.0]);
        assert_eq!(position_of(&batch, 2), [22.0, 32.0]);
        assert_eq!(position_of(&batch, 4), [1.0, 1.0]);
    }

    #[test]
    fn alpha_scales_vertex_colour() {
        let mut batch = QuadBatch::new();
        batch.save();
        batch.set_alpha(0.5);
        batch.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE.with_alpha(0.5));
        batch.restore();
        batch.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        assert_eq!(batch.vertices()[0].color[3], 0.25);
        assert_eq!(batch.vertices()[4].color[3], 1.0);
    }

    #[test]
    fn mirrored_frame_swaps_horizontal_uvs() {
        let sheet = SpriteSheet::new(ImageHandle::preloaded("sheet.png", 64, 32), 32.0, 32.0);
        let mut batch = QuadBatch::new();
        assert!(sheet.draw_frame(&mut batch, 0, Rect::new(100.0, 0.0, 32.0, 32.0), true));
        let left = batch
            .vertices()
            .iter()
            .find(|v| v.position == [100.0, 0.0])
            .map(|v| v.tex_coords);
        assert_eq!(left, Some([0.5, 0.0]));
    }

    #[test]
    fn text_is_collected_in_canvas_space() {
        let mut batch = QuadBatch::new();
        batch.translate(5.0, 5.0);
        batch.fill_text("Hello", 10.0, 20.0, 16.0, Color::WHITE);
        batch.fill_text("", 0.0, 0.0, 16.0, Color::WHITE);
        assert_eq!(batch.texts().len(), 1);
        assert_eq!((batch.texts()[0].x, batch.texts()[0].y), (15.0, 25.0));
        assert!(batch.vertices().is_empty());
    }

    #[test]
    fn clear_resets_geometry_and_transform() {
        let mut batch = QuadBatch::new();
        batch.save();
        batch.translate(100.0, 0.0);
        batch.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        batch.clear();
        batch.fill_rect(Rect::new(0.0, 0.0, 1.0, 1.0), Color::WHITE);
        assert_eq!(batch.vertices().len(), 4);
        assert_eq!(position_of(&batch, 0), [0.0, 0.0]);
    }
}
