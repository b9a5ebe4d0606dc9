pub mod debug_overlay;
pub mod hud;

pub use debug_overlay::{DebugOverlay, OverlayActions, OverlayStats};
pub use hud::{HudBar, HudState, SharedHud};
