//! egui layer drawn on top of the sprite pass.
//!
//! It paints three things: the scene's text runs (the quad batch does not
//! rasterise glyphs), the HP/mana bars from `SharedHud`, and, when toggled
//! with F3, a debug window with frame and scene statistics.
//!
//! egui needs a three-phase render split because `egui_wgpu::Renderer::render()`
//! wants a `RenderPass<'static>` while `begin_render_pass` borrows the encoder:
//!
//!   1. `prepare()` -- run egui UI logic, produce tessellated primitives
//!   2. `upload()`  -- upload textures and update GPU buffers (borrows encoder mutably)
//!   3. `paint()`   -- render into a new render pass with `forget_lifetime()`
//!   4. `cleanup()` -- free textures egui no longer references

use egui::{Align2, Color32, FontId, Id, LayerId, Order, Painter, Pos2, Rect, Stroke, StrokeKind};
use tv_core::{HP_BAR, MANA_BAR};
use tv_render::{Letterbox, TextRun};
use winit::window::Window;

use crate::hud::SharedHud;

const HUD_ORIGIN: (f32, f32) = (580.0, 10.0);
const HUD_BAR_SIZE: (f32, f32) = (200.0, 16.0);
const HUD_BAR_GAP: f32 = 6.0;

#[derive(Debug, Clone, Default)]
pub struct OverlayStats {
    pub fps: f64,
    pub frame_time_ms: f64,
    pub frame_count: u64,
    pub clamped_frames: u64,
    pub scene_name: String,
    pub scene_index: usize,
    pub scene_count: usize,
    pub paused: bool,
    pub draw_calls: u32,
    pub texture_binds: u32,
    pub vertex_count: u32,
    pub pending_assets: u32,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct OverlayActions {
    pub toggle_pause: bool,
    pub restart_scene: bool,
    /// Jump straight to a scene by index.
    pub goto_scene: Option<usize>,
}

pub struct DebugOverlay {
    pub egui_ctx: egui::Context,
    pub egui_winit_state: egui_winit::State,
    pub egui_renderer: egui_wgpu::Renderer,
    pub visible: bool,
}

impl DebugOverlay {
    pub fn new(
        device: &wgpu::Device,
        surface_format: wgpu::TextureFormat,
        window: &Window,
    ) -> Self {
        let egui_ctx = egui::Context::default();
        let egui_winit_state = egui_winit::State::new(
            egui_ctx.clone(),
            egui_ctx.viewport_id(),
            window,
            None,
            None,
            None,
        );
        let egui_renderer = egui_wgpu::Renderer::new(device, surface_format, None, 1, false);

        Self {
            egui_ctx,
            egui_winit_state,
            egui_renderer,
            visible: false,
        }
    }

    /// Feed a window event to egui. Returns `true` if egui consumed it.
    pub fn handle_window_event(
        &mut self,
        window: &Window,
        event: &winit::event::WindowEvent,
    ) -> bool {
        let response = self.egui_winit_state.on_window_event(window, event);
        response.consumed
    }

    pub fn toggle(&mut self) {
        self.visible = !self.visible;
        log::info!("Debug overlay: {}", if self.visible { "ON" } else { "OFF" });
    }

    pub fn prepare(
        &mut self,
        window: &Window,
        stats: &OverlayStats,
        texts: &[TextRun],
        letterbox: Letterbox,
        hud: &SharedHud,
    ) -> (
        Vec<egui::ClippedPrimitive>,
        egui::TexturesDelta,
        OverlayActions,
    ) {
        let mut actions = OverlayActions::default();
        let raw_input = self.egui_winit_state.take_egui_input(window);
        let visible = self.visible;
        let full_output = self.egui_ctx.run(raw_input, |ctx| {
            let canvas = CanvasMapping::new(letterbox, ctx.pixels_per_point());
            let painter = ctx
                .layer_painter(LayerId::new(Order::Background, Id::new("scene-text")))
                .with_clip_rect(canvas.bounds());
            paint_texts(&painter, &canvas, texts);
            paint_hud(&painter, &canvas, hud);

            if visible {
                debug_window(ctx, stats, &mut actions);
            }
        });

        self.egui_winit_state
            .handle_platform_output(window, full_output.platform_output);

        let primitives = self
            .egui_ctx
            .tessellate(full_output.shapes, full_output.pixels_per_point);

        (primitives, full_output.textures_delta, actions)
    }

    /// Upload textures and update buffers. Call before creating the egui render pass.
    pub fn upload(
        &mut self,
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        encoder: &mut wgpu::CommandEncoder,
        primitives: &[egui::ClippedPrimitive],
        textures_delta: &egui::TexturesDelta,
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        for (id, image_delta) in &textures_delta.set {
            self.egui_renderer
                .update_texture(device, queue, *id, image_delta);
        }

        self.egui_renderer
            .update_buffers(device, queue, encoder, primitives, screen_descriptor);
    }

    /// Render into an existing render pass. Call after `upload()`.
    pub fn paint(
        &self,
        render_pass: &mut wgpu::RenderPass<'static>,
        primitives: &[egui::ClippedPrimitive],
        screen_descriptor: &egui_wgpu::ScreenDescriptor,
    ) {
        self.egui_renderer
            .render(render_pass, primitives, screen_descriptor);
    }

    /// Free textures that egui no longer needs. Call after rendering.
    pub fn cleanup(&mut self, textures_delta: &egui::TexturesDelta) {
        for id in &textures_delta.free {
            self.egui_renderer.free_texture(id);
        }
    }
}

/// Canvas coordinates to egui points.
#[derive(Debug, Clone, Copy)]
struct CanvasMapping {
    letterbox: Letterbox,
    pixels_per_point: f32,
}

impl CanvasMapping {
    fn new(letterbox: Letterbox, pixels_per_point: f32) -> Self {
        Self {
            letterbox,
            pixels_per_point: pixels_per_point.max(f32::EPSILON),
        }
    }

    fn point(&self, x: f32, y: f32) -> Pos2 {
        let fit = &self.letterbox;
        Pos2::new(
            (fit.x + x * fit.scale) / self.pixels_per_point,
            (fit.y + y * fit.scale) / self.pixels_per_point,
        )
    }

    fn length(&self, value: f32) -> f32 {
        value * self.letterbox.scale / self.pixels_per_point
    }

    fn rect(&self, x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::from_min_max(self.point(x, y), self.point(x + w, y + h))
    }

    fn bounds(&self) -> Rect {
        let fit = &self.letterbox;
        Rect::from_min_size(
            self.point(0.0, 0.0),
            egui::vec2(
                fit.width / self.pixels_per_point,
                fit.height / self.pixels_per_point,
            ),
        )
    }
}

fn color32(rgba: [f32; 4]) -> Color32 {
    let [r, g, b, a] = rgba.map(|c| (c.clamp(0.0, 1.0) * 255.0).round() as u8);
    Color32::from_rgba_unmultiplied(r, g, b, a)
}

fn paint_texts(painter: &Painter, canvas: &CanvasMapping, texts: &[TextRun]) {
    for run in texts {
        painter.text(
            canvas.point(run.x, run.y),
            Align2::LEFT_TOP,
            &run.text,
            FontId::proportional(canvas.length(run.size).max(1.0)),
            color32(run.color),
        );
    }
}

fn paint_hud(painter: &Painter, canvas: &CanvasMapping, hud: &SharedHud) {
    let (x, mut y) = HUD_ORIGIN;
    let (w, h) = HUD_BAR_SIZE;
    for (id, bar) in hud.snapshot() {
        let fill = match id.as_str() {
            HP_BAR => Color32::from_rgb(200, 60, 60),
            MANA_BAR => Color32::from_rgb(60, 110, 220),
            _ => Color32::from_gray(160),
        };
        let back = canvas.rect(x, y, w, h);
        painter.rect_filled(back, 2.0, Color32::from_black_alpha(170));
        let filled = canvas.rect(x, y, w * bar.percent / 100.0, h);
        painter.rect_filled(filled, 2.0, fill);
        let outline = Stroke::new(1.0, Color32::from_gray(220));
        painter.rect_stroke(back, 2.0, outline, StrokeKind::Inside);
        painter.text(
            back.center(),
            Align2::CENTER_CENTER,
            &bar.text,
            FontId::proportional(canvas.length(h * 0.75).max(1.0)),
            Color32::WHITE,
        );
        y += h + HUD_BAR_GAP;
    }
}

fn debug_window(ctx: &egui::Context, stats: &OverlayStats, actions: &mut OverlayActions) {
    egui::Window::new("Debug")
        .default_pos([10.0, 10.0])
        .show(ctx, |ui| {
            ui.label(format!("FPS: {:.1}", stats.fps));
            ui.label(format!("Frame time: {:.2} ms", stats.frame_time_ms));
            ui.label(format!("Frame: {}", stats.frame_count));
            ui.label(format!("Clamped frames: {}", stats.clamped_frames));

            ui.separator();
            ui.label(format!(
                "Scene: {} ({}/{})",
                stats.scene_name,
                stats.scene_index + 1,
                stats.scene_count
            ));
            ui.horizontal_wrapped(|ui| {
                for index in 0..stats.scene_count {
                    if ui.button(format!("{}", index + 1)).clicked() {
                        actions.goto_scene = Some(index);
                    }
                }
            });
            ui.horizontal(|ui| {
                let pause_label = if stats.paused { "Resume" } else { "Pause" };
                if ui.button(pause_label).clicked() {
                    actions.toggle_pause = true;
                }
                if ui.button("Restart scene").clicked() {
                    actions.restart_scene = true;
                }
            });
            if stats.paused {
                ui.label("\u{23f8} PAUSED");
            }

            ui.separator();
            ui.label(format!("Draw calls: {}", stats.draw_calls));
            ui.label(format!("Texture binds: {}", stats.texture_binds));
            ui.label(format!("Vertices: {}", stats.vertex_count));
            ui.label(format!("Pending images: {}", stats.pending_assets));
        });
}
