//! Grid sprite sheets: frame index -> source rectangle.

use crate::assets::ImageHandle;
use crate::surface::{Rect, RenderSurface};

#[derive(Debug, Clone)]
pub struct SpriteSheet {
    image: ImageHandle,
    frame_width: f32,
    frame_height: f32,
    frames_per_row_override: Option<u32>,
}

impl SpriteSheet {
    pub fn new(image: ImageHandle, frame_width: f32, frame_height: f32) -> Self {
        Self {
            image,
            frame_width,
            frame_height,
            frames_per_row_override: None,
        }
    }

    /// Some sheets have padding or unused columns on the right; callers can pin
    /// the column count instead of deriving it from the image width.
    pub fn set_frames_per_row(&mut self, frames_per_row: u32) {
        self.frames_per_row_override = Some(frames_per_row.max(1));
    }

    pub fn image(&self) -> &ImageHandle {
        &self.image
    }

    pub fn is_loaded(&self) -> bool {
        self.image.is_loaded()
    }

    pub fn frame_size(&self) -> (f32, f32) {
        (self.frame_width, self.frame_height)
    }

    /// `None` until the image has loaded (the derived count needs its width).
    pub fn frames_per_row(&self) -> Option<u32> {
        if let Some(n) = self.frames_per_row_override {
            return Some(n);
        }
        let (width, _) = self.image.size()?;
        let derived = (width as f32 / self.frame_width).floor() as u32;
        Some(derived.max(1))
    }

    pub fn source_rect(&self, index: usize) -> Option<Rect> {
        if !self.image.is_loaded() {
            return None;
        }
        let per_row = self.frames_per_row()? as usize;
        let row = index / per_row;
        let col = index % per_row;
        Some(Rect::new(
            col as f32 * self.frame_width,
            row as f32 * self.frame_height,
            self.frame_width,
            self.frame_height,
        ))
    }

    /// Draw one frame into `dst`. Mirroring negates the horizontal scale around
    /// the right edge of `dst`, so the flipped frame occupies the same box.
    /// Returns `false` when the image is not ready and nothing was drawn.
    pub fn draw_frame(
        &self,
        surface: &mut dyn RenderSurface,
        index: usize,
        dst: Rect,
        flip_x: bool,
    ) -> bool {
        let Some(src) = self.source_rect(index) else {
            return false;
        };
        if flip_x {
            surface.save();
            surface.translate(dst.x + dst.w, dst.y);
            surface.scale(-1.0, 1.0);
            surface.draw_image(&self.image, Some(src), Rect::new(0.0, 0.0, dst.w, dst.h));
            surface.restore();
        } else {
            surface.draw_image(&self.image, Some(src), dst);
        }
        true
    }
}
