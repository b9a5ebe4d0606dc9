use glam::{Mat4, Vec2};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
}

/// Physical-pixel rectangle the logical canvas is drawn into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Letterbox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    /// Physical pixels per logical unit.
    pub scale: f32,
}

/// Maps the fixed logical canvas (y down, origin top-left) onto the window,
/// preserving aspect ratio with black bars on the long axis.
pub struct Camera2D {
    pub position: Vec2,
    pub zoom: f32,
    pub logical: (f32, f32),
    pub viewport: (u32, u32),
}

impl Camera2D {
    pub fn new(
        logical_width: f32,
        logical_height: f32,
        viewport_width: u32,
        viewport_height: u32,
    ) -> Self {
        Self {
            position: Vec2::ZERO,
            zoom: 1.0,
            logical: (logical_width, logical_height),
            viewport: (viewport_width, viewport_height),
        }
    }

    pub fn letterbox(&self) -> Letterbox {
        let (lw, lh) = self.logical;
        let vw = self.viewport.0.max(1) as f32;
        let vh = self.viewport.1.max(1) as f32;
        let scale = (vw / lw).min(vh / lh);
        let width = lw * scale;
        let height = lh * scale;
        Letterbox {
            x: ((vw - width) * 0.5).floor(),
            y: ((vh - height) * 0.5).floor(),
            width,
            height,
            scale,
        }
    }

    /// Window pixel to logical coordinates; `None` on the bars.
    pub fn to_logical(&self, px: f32, py: f32) -> Option<(f32, f32)> {
        let fit = self.letterbox();
        let lx = (px - fit.x) / fit.scale;
        let ly = (py - fit.y) / fit.scale;
        let inside = (0.0..self.logical.0).contains(&lx) && (0.0..self.logical.1).contains(&ly);
        inside.then_some((lx, ly))
    }

    pub fn to_physical(&self, lx: f32, ly: f32) -> (f32, f32) {
        let fit = self.letterbox();
        (fit.x + lx * fit.scale, fit.y + ly * fit.scale)
    }

    /// Projection for the letterboxed viewport; the pass sets the viewport
    /// to `letterbox()` so this only spans the logical canvas.
    pub fn build_uniform(&self) -> CameraUniform {
        let w = self.logical.0 / self.zoom;
        let h = self.logical.1 / self.zoom;

        let proj = Mat4::orthographic_rh(
            self.position.x,
            self.position.x + w,
            self.position.y + h,
            self.position.y,
            -1.0,
            1.0,
        );

        CameraUniform {
            view_proj: proj.to_cols_array_2d(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wide_window_gets_side_bars() {
        let camera = Camera2D::new(800.0, 600.0, 1600, 900);
        let fit = camera.letterbox();
        assert_eq!(fit.scale, 1.5);
        assert_eq!(fit.width, 1200.0);
        assert_eq!(fit.x, 200.0);
        assert_eq!(fit.y, 0.0);
    }

    #[test]
    fn tall_window_gets_top_and_bottom_bars() {
        let camera = Camera2D::new(800.0, 600.0, 800, 800);
        let fit = camera.letterbox();
        assert_eq!(fit.scale, 1.0);
        assert_eq!(fit.x, 0.0);
        assert_eq!(fit.y, 100.0);
    }

    #[test]
    fn click_mapping_round_trips() {
        let camera = Camera2D::new(800.0, 600.0, 1600, 900);
        let (px, py) = camera.to_physical(123.0, 456.0);
        let (lx, ly) = camera.to_logical(px, py).unwrap();
        assert!((lx - 123.0).abs() < 1e-3);
        assert!((ly - 456.0).abs() < 1e-3);
    }

    #[test]
    fn clicks_on_the_bars_map_to_nothing() {
        let camera = Camera2D::new(800.0, 600.0, 1600, 900);
        assert_eq!(camera.to_logical(100.0, 450.0), None);
        assert_eq!(camera.to_logical(1500.0, 450.0), None);
    }

    #[test]
    fn projection_maps_canvas_corners_to_clip_space() {
        let camera = Camera2D::new(800.0, 600.0, 800, 600);
        let m = Mat4::from_cols_array_2d(&camera.build_uniform().view_proj);
        let top_left = m.project_point3(glam::Vec3::new(0.0, 0.0, 0.0));
        let bottom_right = m.project_point3(glam::Vec3::new(800.0, 600.0, 0.0));
        assert!((top_left.x + 1.0).abs() < 1e-5 && (top_left.y - 1.0).abs() < 1e-5);
        assert!((bottom_right.x - 1.0).abs() < 1e-5 && (bottom_right.y + 1.0).abs() < 1e-5);
    }
}
