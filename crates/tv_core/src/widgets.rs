//! Small interaction helpers shared by the scene state machines.

use crate::surface::{Color, Rect, RenderSurface};
use crate::timer::{TimerId, TimerQueue};

/// Seconds a confirm prompt ignores input after its state is entered.
pub const PROMPT_COOLDOWN: f32 = 0.4;
const PROMPT_BLINK_PERIOD: f32 = 1.0;

/// Delay between a button click and its action.
pub const SETTLE_DELAY: f32 = 0.15;
/// Vertical offset of a pressed button.
pub const PRESS_OFFSET: f32 = 2.0;

/// Blinking "press Enter" indicator with an input cooldown, so the key that
/// entered a state cannot also confirm it.
#[derive(Debug, Clone)]
pub struct ContinuePrompt {
    cooldown: f32,
    elapsed: f32,
}

impl ContinuePrompt {
    pub fn new() -> Self {
        Self::with_cooldown(PROMPT_COOLDOWN)
    }

    pub fn with_cooldown(cooldown: f32) -> Self {
        Self {
            cooldown: cooldown.max(0.0),
            elapsed: 0.0,
        }
    }

    /// Call on every state entry.
    pub fn reset(&mut self) {
        self.elapsed = 0.0;
    }

    pub fn update(&mut self, dt: f32) {
        self.elapsed += dt;
    }

    pub fn is_ready(&self) -> bool {
        self.elapsed >= self.cooldown
    }

    /// Blink phase: visible for the first half of each period once ready.
    pub fn is_visible(&self) -> bool {
        let phase = (self.elapsed - self.cooldown) % PROMPT_BLINK_PERIOD;
        self.is_ready() && phase < PROMPT_BLINK_PERIOD * 0.5
    }

    pub fn render(&self, surface: &mut dyn RenderSurface, text: &str, x: f32, y: f32) {
        if self.is_visible() {
            surface.fill_text(text, x, y, 16.0, Color::WHITE);
        }
    }
}

impl Default for ContinuePrompt {
    fn default() -> Self {
        Self::new()
    }
}

/// Turns a held key into a single trigger: fires on the first tick the key is
/// down and not again until it has been released.
#[derive(Debug, Clone, Copy, Default)]
pub struct OneShot {
    latched: bool,
}

impl OneShot {
    pub fn trigger(&mut self, down: bool) -> bool {
        let fired = down && !self.latched;
        self.latched = down;
        fired
    }

    /// Treat the key as already held, so it must be released before firing.
    pub fn latch(&mut self) {
        self.latched = true;
    }
}

/// Press-and-settle button group. A click marks the button pressed (drawn
/// `PRESS_OFFSET` lower) and schedules the action on the owner's timer queue;
/// further clicks are ignored until the owner calls `settle`.
#[derive(Debug, Clone, Default)]
pub struct PressSettle {
    pressed: Option<usize>,
    timer: Option<TimerId>,
}

impl PressSettle {
    /// Returns `false` when a press is already settling.
    pub fn press<E>(&mut self, button: usize, timers: &mut TimerQueue<E>, event: E) -> bool {
        if self.pressed.is_some() {
            return false;
        }
        self.pressed = Some(button);
        self.timer = Some(timers.schedule(SETTLE_DELAY, event));
        true
    }

    /// Call when the scheduled event fires.
    pub fn settle(&mut self) {
        self.pressed = None;
        self.timer = None;
    }

    pub fn pressed(&self) -> Option<usize> {
        self.pressed
    }

    pub fn is_settling(&self) -> bool {
        self.pressed.is_some()
    }

    /// Where to draw button `button` given its resting rect.
    pub fn button_rect(&self, button: usize, rest: Rect) -> Rect {
        if self.pressed == Some(button) {
            rest.offset(0.0, PRESS_OFFSET)
        } else {
            rest
        }
    }

    pub fn cancel<E>(&mut self, timers: &mut TimerQueue<E>) {
        if let Some(id) = self.timer.take() {
            timers.cancel(id);
        }
        self.pressed = None;
    }
}

/// Position in a fixed script of dialogue lines.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DialogueCursor {
    index: usize,
    len: usize,
}

impl DialogueCursor {
    pub fn new(len: usize) -> Self {
        Self { index: 0, len }
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn line<'a, T>(&self, lines: &'a [T]) -> Option<&'a T> {
        lines.get(self.index)
    }

    pub fn is_last(&self) -> bool {
        self.index + 1 >= self.len
    }

    /// Move to the next line. Returns `false` (and stays put) at the end.
    pub fn advance(&mut self) -> bool {
        if self.is_last() {
            return false;
        }
        self.index += 1;
        true
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }
}

/// Highlighted entry in a vertical list of choices.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChoiceList {
    selected: usize,
    count: usize,
}

impl ChoiceList {
    pub fn new(count: usize) -> Self {
        Self { selected: 0, count }
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn count(&self) -> usize {
        self.count
    }

    pub fn up(&mut self) {
        if self.count > 0 {
            self.selected = (self.selected + self.count - 1) % self.count;
        }
    }

    pub fn down(&mut self) {
        if self.count > 0 {
            self.selected = (self.selected + 1) % self.count;
        }
    }

    /// Out-of-range picks are ignored.
    pub fn select(&mut self, index: usize) -> bool {
        if index < self.count {
            self.selected = index;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::RecordingSurface;

    #[test]
    fn prompt_ignores_input_during_cooldown() {
        let mut prompt = ContinuePrompt::new();
        prompt.update(0.3);
        assert!(!prompt.is_ready());
        prompt.update(0.15);
        assert!(prompt.is_ready());
        prompt.reset();
        assert!(!prompt.is_ready());
    }

    #[test]
    fn prompt_blinks_once_ready() {
        let mut prompt = ContinuePrompt::with_cooldown(0.0);
        let mut surface = RecordingSurface::new();
        prompt.update(0.1);
        prompt.render(&mut surface, "Enter", 0.0, 0.0);
        assert!(surface.contains_text("Enter"));
        surface.clear();
        prompt.update(0.5);
        prompt.render(&mut surface, "Enter", 0.0, 0.0);
        assert!(surface.texts().is_empty());
    }

    #[test]
    fn one_shot_fires_once_per_press() {
        let mut shot = OneShot::default();
        assert!(shot.trigger(true));
        assert!(!shot.trigger(true));
        assert!(!shot.trigger(false));
        assert!(shot.trigger(true));
    }

    #[test]
    fn latched_one_shot_needs_release() {
        let mut shot = OneShot::default();
        shot.latch();
        assert!(!shot.trigger(true));
        shot.trigger(false);
        assert!(shot.trigger(true));
    }

    #[test]
    fn press_settle_delays_action() {
        let mut timers = TimerQueue::new();
        let mut buttons = PressSettle::default();
        let rest = Rect::new(10.0, 10.0, 100.0, 30.0);

        assert!(buttons.press(1, &mut timers, "apply"));
        assert!(!buttons.press(0, &mut timers, "other"));
        assert_eq!(buttons.button_rect(1, rest).y, 12.0);
        assert_eq!(buttons.button_rect(0, rest).y, 10.0);

        assert!(timers.advance(0.1).is_empty());
        assert_eq!(timers.advance(0.06), vec!["apply"]);
        buttons.settle();
        assert_eq!(buttons.pressed(), None);
    }

    #[test]
    fn press_settle_cancel_drops_timer() {
        let mut timers = TimerQueue::new();
        let mut buttons = PressSettle::default();
        buttons.press(2, &mut timers, ());
        buttons.cancel(&mut timers);
        assert!(timers.is_empty());
        assert!(!buttons.is_settling());
    }

    #[test]
    fn dialogue_cursor_stops_at_last_line() {
        let lines = ["a", "b"];
        let mut cursor = DialogueCursor::new(lines.len());
        assert_eq!(cursor.line(&lines), Some(&"a"));
        assert!(cursor.advance());
        assert!(cursor.is_last());
        assert!(!cursor.advance());
        assert_eq!(cursor.line(&lines), Some(&"b"));
    }

    #[test]
    fn choice_list_wraps() {
        let mut choices = ChoiceList::new(3);
        choices.up();
        assert_eq!(choices.selected(), 2);
        choices.down();
        assert_eq!(choices.selected(), 0);
        assert!(!choices.select(3));
        assert!(choices.select(1));
    }
}
