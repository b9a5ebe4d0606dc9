//! Thornveil -- window, renderer and entry point.
//!
//! Architecture: winit drives the event loop via `ApplicationHandler`. The
//! game runs on `tv_core::GameLoop` with a `RedrawScheduler`, so each frame is
//! one `RedrawRequested`:
//!
//!   1. Finish queued image loads (decode, upload, mark the handle)
//!   2. `GameLoop::tick` -- clamped dt, `Game::update`, `Game::render` into the
//!      `QuadBatch`, then request the next redraw
//!   3. Stream the batch into GPU buffers and draw it inside the letterboxed
//!      viewport
//!   4. Composite the egui overlay: scene text, HUD bars, F3 debug window
//!
//! Input is forwarded as-is: winit key codes map to `Key`, and left clicks
//! are converted through the letterbox into canvas coordinates.

mod combat;
mod config;
mod enemy;
mod hero;
mod npc;
mod scenes;
mod sprites;

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use wgpu::util::DeviceExt;
use winit::application::ApplicationHandler;
use winit::event::{ElementState, MouseButton, WindowEvent};
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::keyboard::{KeyCode, PhysicalKey};
use winit::window::{Window, WindowId};

use config::{load_config_or_default, GameConfig, CONFIG_PATH};
use tv_core::{
    FrameHandler, FrameScheduler, FrameToken, Game, GameLoop, Key, BASE_HEIGHT, BASE_WIDTH,
};
use tv_devtools::{DebugOverlay, OverlayStats, SharedHud};
use tv_render::{
    Camera2D, GpuContext, QuadBatch, SpritePipeline, SpriteVertex, Texture, WHITE_TEXTURE,
};

const LETTERBOX_COLOR: wgpu::Color = wgpu::Color::BLACK;

struct GpuSpriteTexture {
    texture: Texture,
    bind_group: wgpu::BindGroup,
}

/// Frames are redraw requests. A request cannot be withdrawn, so a
/// cancelled token is only logged; `GameLoop::tick` ignores frames that
/// arrive after `stop()`.
struct RedrawScheduler {
    window: Arc<Window>,
    next: u64,
}

impl FrameScheduler for RedrawScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next += 1;
        self.window.request_redraw();
        FrameToken(self.next)
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        log::debug!("Frame {} cancelled", token.0);
    }
}

struct GameFrame<'a> {
    game: &'a mut Game,
    batch: &'a mut QuadBatch,
}

impl FrameHandler for GameFrame<'_> {
    fn update(&mut self, dt: f64) {
        self.game.update(dt as f32);
    }

    fn render(&mut self) {
        self.batch.clear();
        self.game.render(&mut *self.batch);
    }
}

/// Everything that needs the window. Constructed in
/// `ApplicationHandler::resumed` once the window and GPU surface exist.
struct EngineState {
    window: Arc<Window>,
    gpu: GpuContext,
    camera: Camera2D,
    sprite_pipeline: SpritePipeline,
    debug_overlay: DebugOverlay,
    game: Game,
    hud: SharedHud,
    game_loop: GameLoop<RedrawScheduler>,
    clock: Instant,
    cursor: (f64, f64),
    batch: QuadBatch,
    textures: HashMap<Arc<str>, GpuSpriteTexture>,

    // The batch is rebuilt on the CPU each frame and streamed into these
    // buffers. They grow (power-of-two) but never shrink.
    vertex_buffer: wgpu::Buffer,
    index_buffer: wgpu::Buffer,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    mesh_vertex_capacity: usize,
    mesh_index_capacity: usize,
}

impl EngineState {
    fn new(window: Arc<Window>, config: &GameConfig) -> Self {
        let gpu = GpuContext::new(window.clone());
        let sprite_pipeline = SpritePipeline::new(&gpu.device, gpu.surface_format);
        let debug_overlay = DebugOverlay::new(&gpu.device, gpu.surface_format, &window);
        let camera = Camera2D::new(BASE_WIDTH, BASE_HEIGHT, gpu.size.0, gpu.size.1);

        let camera_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Camera Uniform Buffer"),
                contents: bytemuck::cast_slice(&[camera.build_uniform()]),
                usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            });
        let camera_bind_group =
            sprite_pipeline.create_camera_bind_group(&gpu.device, &camera_buffer);

        let mut textures = HashMap::new();
        let white = Texture::white(&gpu.device, &gpu.queue);
        let white_bind_group = sprite_pipeline.create_texture_bind_group(&gpu.device, &white);
        textures.insert(
            Arc::from(WHITE_TEXTURE),
            GpuSpriteTexture {
                texture: white,
                bind_group: white_bind_group,
            },
        );

        let hud = SharedHud::new();
        let mut game = Game::new(
            config.player,
            scenes::build_scenes(config),
            Box::new(hud.clone()),
        );
        game.begin();

        let clock = Instant::now();
        let mut game_loop = GameLoop::new(RedrawScheduler {
            window: window.clone(),
            next: 0,
        });
        game_loop.start(0.0);

        let vertex_buffer = create_vertex_buffer(&gpu.device, 1);
        let index_buffer = create_index_buffer(&gpu.device, 1);

        Self {
            window,
            gpu,
            camera,
            sprite_pipeline,
            debug_overlay,
            game,
            hud,
            game_loop,
            clock,
            cursor: (0.0, 0.0),
            batch: QuadBatch::new(),
            textures,
            vertex_buffer,
            index_buffer,
            camera_buffer,
            camera_bind_group,
            mesh_vertex_capacity: 0,
            mesh_index_capacity: 0,
        }
    }

    fn now_ms(&self) -> f64 {
        self.clock.elapsed().as_secs_f64() * 1000.0
    }

    /// Complete every image the scenes asked for since the last frame.
    /// Failures stay failed; the scene keeps drawing its placeholder.
    fn load_pending_images(&mut self) {
        for handle in self.game.assets().take_pending() {
            let path = handle.path();
            let loaded =
                load_texture_asset(&self.gpu.device, &self.gpu.queue, &self.sprite_pipeline, path);
            match loaded {
                Ok(texture) => {
                    let (width, height) = texture.texture.size;
                    handle.mark_loaded(width, height);
                    log::info!("Loaded image '{path}' ({width}x{height})");
                    self.textures.insert(Arc::from(path), texture);
                }
                Err(err) => {
                    log::warn!("{err}. Drawing a placeholder instead.");
                    handle.mark_failed();
                }
            }
        }
    }

    fn ensure_mesh_capacity(&mut self, vertex_count: usize, index_count: usize) {
        let needed_vertices = vertex_count.max(1);
        if needed_vertices > self.mesh_vertex_capacity {
            self.mesh_vertex_capacity = needed_vertices.next_power_of_two();
            self.vertex_buffer = create_vertex_buffer(&self.gpu.device, self.mesh_vertex_capacity);
        }
        let needed_indices = index_count.max(1);
        if needed_indices > self.mesh_index_capacity {
            self.mesh_index_capacity = needed_indices.next_power_of_two();
            self.index_buffer = create_index_buffer(&self.gpu.device, self.mesh_index_capacity);
        }
    }

    fn upload_mesh(&mut self) {
        self.ensure_mesh_capacity(self.batch.vertices().len(), self.batch.indices().len());
        if !self.batch.vertices().is_empty() {
            self.gpu.queue.write_buffer(
                &self.vertex_buffer,
                0,
                bytemuck::cast_slice(self.batch.vertices()),
            );
            self.gpu.queue.write_buffer(
                &self.index_buffer,
                0,
                bytemuck::cast_slice(self.batch.indices()),
            );
        }
        self.gpu.queue.write_buffer(
            &self.camera_buffer,
            0,
            bytemuck::cast_slice(&[self.camera.build_uniform()]),
        );
    }

    fn overlay_stats(&self) -> OverlayStats {
        let frames = &self.game_loop.stats;
        OverlayStats {
            fps: frames.smoothed_fps,
            frame_time_ms: frames.smoothed_frame_time_ms,
            frame_count: frames.frame_count,
            clamped_frames: frames.clamped_frames,
            scene_name: self.game.current_scene_name().unwrap_or("-").to_string(),
            scene_index: self.game.current_index(),
            scene_count: self.game.scene_count(),
            paused: self.game.is_paused(),
            draw_calls: self.batch.draw_calls().len() as u32,
            texture_binds: self.batch.texture_binds() as u32,
            vertex_count: self.batch.vertices().len() as u32,
            pending_assets: self.game.assets().pending_count() as u32,
        }
    }

    fn redraw(&mut self) {
        if self.gpu.size.0 == 0 || self.gpu.size.1 == 0 {
            return;
        }
        self.load_pending_images();

        let now = self.now_ms();
        let mut frame = GameFrame {
            game: &mut self.game,
            batch: &mut self.batch,
        };
        if !self.game_loop.tick(now, &mut frame) {
            return;
        }
        self.upload_mesh();

        let Some((output, view)) = self.gpu.begin_frame() else {
            return;
        };

        let letterbox = self.camera.letterbox();
        let stats = self.overlay_stats();
        let (egui_primitives, egui_textures_delta, overlay_actions) = self.debug_overlay.prepare(
            &self.window,
            &stats,
            self.batch.texts(),
            letterbox,
            &self.hud,
        );

        let screen_descriptor = egui_wgpu::ScreenDescriptor {
            size_in_pixels: [self.gpu.size.0, self.gpu.size.1],
            pixels_per_point: self.window.scale_factor() as f32,
        };
        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });
        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Scene Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(LETTERBOX_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            render_pass.set_viewport(
                letterbox.x,
                letterbox.y,
                letterbox.width,
                letterbox.height,
                0.0,
                1.0,
            );
            render_pass.set_pipeline(&self.sprite_pipeline.render_pipeline);
            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            render_pass.set_vertex_buffer(0, self.vertex_buffer.slice(..));
            render_pass.set_index_buffer(self.index_buffer.slice(..), wgpu::IndexFormat::Uint32);
            let mut last_bound_texture_key: Option<&Arc<str>> = None;
            for draw in self.batch.draw_calls() {
                let Some(texture) = self.textures.get(&draw.texture_key) else {
                    log::trace!("No texture for '{}'", draw.texture_key);
                    continue;
                };
                let need_rebind = match last_bound_texture_key {
                    Some(last) => **last != *draw.texture_key,
                    None => true,
                };
                if need_rebind {
                    render_pass.set_bind_group(1, &texture.bind_group, &[]);
                    last_bound_texture_key = Some(&draw.texture_key);
                }
                render_pass.draw_indexed(
                    draw.index_start..(draw.index_start + draw.index_count),
                    0,
                    0..1,
                );
            }
        }
        self.debug_overlay.upload(
            &self.gpu.device,
            &self.gpu.queue,
            &mut encoder,
            &egui_primitives,
            &egui_textures_delta,
            &screen_descriptor,
        );
        {
            let mut egui_pass = encoder
                .begin_render_pass(&wgpu::RenderPassDescriptor {
                    label: Some("egui Render Pass"),
                    color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                        view: &view,
                        resolve_target: None,
                        ops: wgpu::Operations {
                            load: wgpu::LoadOp::Load,
                            store: wgpu::StoreOp::Store,
                        },
                    })],
                    depth_stencil_attachment: None,
                    ..Default::default()
                })
                .forget_lifetime();
            self.debug_overlay
                .paint(&mut egui_pass, &egui_primitives, &screen_descriptor);
        }
        self.debug_overlay.cleanup(&egui_textures_delta);
        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        // Overlay buttons act between frames, like any other input.
        if overlay_actions.toggle_pause {
            self.game.set_paused(!self.game.is_paused());
        }
        if overlay_actions.restart_scene {
            self.game.restart_scene();
        }
        if let Some(index) = overlay_actions.goto_scene {
            self.game.set_scene(index);
        }
    }

    fn shutdown(&mut self) {
        self.game.shutdown();
        self.game_loop.stop();
    }
}

struct App {
    config: GameConfig,
    state: Option<EngineState>,
}

impl App {
    fn new(config: GameConfig) -> Self {
        Self {
            config,
            state: None,
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.state.is_some() {
            return;
        }
        let window = tv_platform::create_window(event_loop, &self.config.platform_config());
        self.state = Some(EngineState::new(window, &self.config));
    }

    fn window_event(
        &mut self,
        event_loop: &ActiveEventLoop,
        _window_id: WindowId,
        event: WindowEvent,
    ) {
        let state = match self.state.as_mut() {
            Some(s) => s,
            None => return,
        };

        let egui_consumed = state
            .debug_overlay
            .handle_window_event(&state.window, &event);

        match event {
            WindowEvent::CloseRequested => {
                log::info!("Close requested, exiting.");
                state.shutdown();
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                let w = physical_size.width;
                let h = physical_size.height;
                if w > 0 && h > 0 {
                    state.gpu.resize(w, h);
                    state.camera.viewport = (w, h);
                    log::debug!("Resized to {}x{}", w, h);
                }
            }
            WindowEvent::KeyboardInput { event, .. } if !egui_consumed => {
                let PhysicalKey::Code(key_code) = event.physical_key else {
                    return;
                };
                if key_code == KeyCode::F3 && event.state.is_pressed() && !event.repeat {
                    state.debug_overlay.toggle();
                }
                if let Some(key) = map_key(key_code) {
                    match event.state {
                        ElementState::Pressed => state.game.input().key_down(key),
                        ElementState::Released => state.game.input().key_up(key),
                    }
                }
            }
            WindowEvent::Focused(focused) => focus_changed(&state.game, focused),
            WindowEvent::CursorMoved { position, .. } => {
                state.cursor = (position.x, position.y);
            }
            WindowEvent::MouseInput {
                state: ElementState::Pressed,
                button: MouseButton::Left,
                ..
            } if !egui_consumed => {
                let (x, y) = state.cursor;
                if let Some((lx, ly)) = state.camera.to_logical(x as f32, y as f32) {
                    state.game.input().click(lx, ly);
                }
            }
            WindowEvent::RedrawRequested => state.redraw(),
            _ => {}
        }
    }
}

fn create_vertex_buffer(device: &wgpu::Device, vertex_capacity: usize) -> wgpu::Buffer {
    let byte_len = (vertex_capacity * std::mem::size_of::<SpriteVertex>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Vertex Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::VERTEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn create_index_buffer(device: &wgpu::Device, index_capacity: usize) -> wgpu::Buffer {
    let byte_len = (index_capacity * std::mem::size_of::<u32>()).max(1) as u64;
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some("Scene Index Buffer"),
        size: byte_len,
        usage: wgpu::BufferUsages::INDEX | wgpu::BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

fn load_texture_asset(
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    pipeline: &SpritePipeline,
    asset_path: &str,
) -> Result<GpuSpriteTexture, String> {
    let bytes = std::fs::read(asset_path)
        .map_err(|e| format!("Failed to read image '{}': {e}", asset_path))?;
    let texture = Texture::from_bytes(device, queue, &bytes, asset_path)?;
    let bind_group = pipeline.create_texture_bind_group(device, &texture);
    Ok(GpuSpriteTexture {
        texture,
        bind_group,
    })
}

/// Key-up events are lost while unfocused, so held keys are dropped.
fn focus_changed(game: &Game, focused: bool) {
    if !focused {
        log::debug!("Focus lost, releasing held keys");
        game.input().cleanup();
    }
}

fn map_key(key_code: KeyCode) -> Option<Key> {
    match key_code {
        KeyCode::ArrowLeft => Some(Key::Left),
        KeyCode::ArrowRight => Some(Key::Right),
        KeyCode::ArrowUp => Some(Key::Up),
        KeyCode::ArrowDown => Some(Key::Down),
        KeyCode::KeyW => Some(Key::W),
        KeyCode::KeyA => Some(Key::A),
        KeyCode::KeyS => Some(Key::S),
        KeyCode::KeyD => Some(Key::D),
        KeyCode::KeyE => Some(Key::E),
        KeyCode::KeyP => Some(Key::P),
        KeyCode::KeyQ => Some(Key::Q),
        KeyCode::KeyR => Some(Key::R),
        KeyCode::Space => Some(Key::Space),
        KeyCode::Enter | KeyCode::NumpadEnter => Some(Key::Enter),
        KeyCode::Escape => Some(Key::Escape),
        KeyCode::Digit1 | KeyCode::Numpad1 => Some(Key::Digit1),
        KeyCode::Digit2 | KeyCode::Numpad2 => Some(Key::Digit2),
        KeyCode::Digit3 | KeyCode::Numpad3 => Some(Key::Digit3),
        KeyCode::Digit4 | KeyCode::Numpad4 => Some(Key::Digit4),
        KeyCode::F3 => Some(Key::F3),
        _ => None,
    }
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Thornveil starting...");

    let config = load_config_or_default(Path::new(CONFIG_PATH));

    let event_loop = EventLoop::new().expect("Failed to create event loop");
    // Frames are driven by redraw requests from the game loop.
    event_loop.set_control_flow(ControlFlow::Wait);

    let mut app = App::new(config);
    event_loop.run_app(&mut app).expect("Event loop error");
}
