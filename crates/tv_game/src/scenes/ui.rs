//! Drawing helpers shared by the scenes: solid panels, outlined buttons and
//! plain text over placeholder art.

use tv_core::{Color, Rect, RenderSurface, BASE_HEIGHT, BASE_WIDTH};

pub const SCREEN: Rect = Rect::new(0.0, 0.0, BASE_WIDTH, BASE_HEIGHT);
pub const DIALOGUE_BOX: Rect = Rect::new(40.0, 430.0, 720.0, 140.0);

pub const TEXT: Color = Color::rgb(0.95, 0.93, 0.88);
pub const ACCENT: Color = Color::rgb(0.95, 0.78, 0.35);
pub const PANEL: Color = Color::rgba(0.05, 0.05, 0.08, 0.85);

pub fn clear(surface: &mut dyn RenderSurface, color: Color) {
    surface.fill_rect(SCREEN, color);
}

/// Full-screen black overlay; 0 is invisible, 1 is opaque.
pub fn fade(surface: &mut dyn RenderSurface, amount: f32) {
    let amount = amount.clamp(0.0, 1.0);
    if amount > 0.0 {
        surface.fill_rect(SCREEN, Color::BLACK.with_alpha(amount));
    }
}

pub fn centered_text(surface: &mut dyn RenderSurface, text: &str, y: f32, size: f32, color: Color) {
    // Rough advance of half the font size per glyph.
    let width = text.chars().count() as f32 * size * 0.5;
    surface.fill_text(text, (BASE_WIDTH - width) * 0.5, y, size, color);
}

pub fn dialogue_box(surface: &mut dyn RenderSurface, speaker: &str, line: &str) {
    surface.fill_rect(DIALOGUE_BOX, PANEL);
    surface.stroke_rect(DIALOGUE_BOX, ACCENT, 2.0);
    if !speaker.is_empty() {
        surface.fill_text(speaker, DIALOGUE_BOX.x + 16.0, DIALOGUE_BOX.y + 12.0, 18.0, ACCENT);
    }
    surface.fill_text(line, DIALOGUE_BOX.x + 16.0, DIALOGUE_BOX.y + 44.0, 16.0, TEXT);
}

pub fn button(surface: &mut dyn RenderSurface, rect: Rect, label: &str, highlighted: bool) {
    surface.fill_rect(rect, PANEL);
    let border = if highlighted { ACCENT } else { TEXT.with_alpha(0.6) };
    surface.stroke_rect(rect, border, 2.0);
    surface.fill_text(label, rect.x + 12.0, rect.y + rect.h * 0.5 - 8.0, 16.0, TEXT);
}

/// Horizontal bar filled to `fraction`.
pub fn bar(surface: &mut dyn RenderSurface, rect: Rect, fraction: f32, fill: Color) {
    surface.fill_rect(rect, Color::BLACK.with_alpha(0.6));
    let w = rect.w * fraction.clamp(0.0, 1.0);
    if w > 0.0 {
        surface.fill_rect(Rect::new(rect.x, rect.y, w, rect.h), fill);
    }
}

/// Rows of a vertical choice list below the dialogue line.
pub fn choice_rect(index: usize) -> Rect {
    Rect::new(
        DIALOGUE_BOX.x + 24.0,
        DIALOGUE_BOX.y - 200.0 + index as f32 * 48.0,
        DIALOGUE_BOX.w - 48.0,
        40.0,
    )
}

/// Index of the choice row under `(x, y)`, among the first `count`.
pub fn choice_at(x: f32, y: f32, count: usize) -> Option<usize> {
    (0..count).find(|&i| choice_rect(i).contains(x, y))
}
