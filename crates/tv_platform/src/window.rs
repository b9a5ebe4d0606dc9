use std::sync::Arc;
use winit::dpi::LogicalSize;
use winit::event_loop::ActiveEventLoop;
use winit::window::{Window, WindowAttributes};

/// Window settings. The game renders at a fixed logical resolution and is
/// letterboxed, so any size works; the default is twice the base resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct PlatformConfig {
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for PlatformConfig {
    fn default() -> Self {
        Self {
            title: "Thornveil".to_string(),
            width: 1600,
            height: 1200,
            min_width: 400,
            min_height: 300,
        }
    }
}

impl PlatformConfig {
    fn attributes(&self) -> WindowAttributes {
        WindowAttributes::default()
            .with_title(&self.title)
            .with_inner_size(LogicalSize::new(self.width, self.height))
            .with_min_inner_size(LogicalSize::new(
                self.min_width.min(self.width),
                self.min_height.min(self.height),
            ))
    }
}

pub fn create_window(event_loop: &ActiveEventLoop, config: &PlatformConfig) -> Arc<Window> {
    let window = event_loop
        .create_window(config.attributes())
        .expect("Failed to create window");
    log::info!(
        "Created window '{}' ({}x{})",
        config.title,
        config.width,
        config.height
    );
    Arc::new(window)
}
