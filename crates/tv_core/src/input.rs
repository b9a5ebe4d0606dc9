//! Keyboard/pointer state plus keyed event subscriptions.
//!
//! - **Level queries:** `get_keys()` hands out a `KeySnapshot` copy of which
//!   keys are down. Scenes read it every tick for movement and for one-shot
//!   actions (see `widgets::OneShot`).
//!
//! - **Event subscriptions:** `on_key_down` / `on_key_up` / `on_click` register
//!   a closure and return a `Subscription`. Dropping the subscription (or
//!   calling `unsubscribe`) removes the handler, so a scene that keeps its
//!   subscriptions in a `Vec` and clears it in `cleanup()` can never leak
//!   handlers into the next scene or into its own restart.
//!
//! Down handlers fire on every `key_down`, including OS auto-repeat, matching
//! how browsers deliver keydown. Debouncing is the subscriber's job.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::{Rc, Weak};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Key {
    Left,
    Right,
    Up,
    Down,
    W,
    A,
    S,
    D,
    E,
    P,
    Q,
    R,
    Space,
    Enter,
    Escape,
    Digit1,
    Digit2,
    Digit3,
    Digit4,
    F3,
}

impl Key {
    /// Number keys map to zero-based choice slots.
    pub fn choice_index(self) -> Option<usize> {
        match self {
            Key::Digit1 => Some(0),
            Key::Digit2 => Some(1),
            Key::Digit3 => Some(2),
            Key::Digit4 => Some(3),
            _ => None,
        }
    }

    pub const DIGITS: [Key; 4] = [Key::Digit1, Key::Digit2, Key::Digit3, Key::Digit4];
}

/// Copy of the pressed-key set at one instant.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct KeySnapshot {
    down: HashSet<Key>,
}

impl KeySnapshot {
    pub fn from_keys(keys: &[Key]) -> Self {
        Self {
            down: keys.iter().copied().collect(),
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.down.contains(&key)
    }

    pub fn any_down(&self, keys: &[Key]) -> bool {
        keys.iter().any(|k| self.down.contains(k))
    }

    pub fn is_empty(&self) -> bool {
        self.down.is_empty()
    }

    /// Horizontal/vertical intent from arrows or WASD, each axis in -1..=1.
    pub fn movement_axis(&self) -> (f32, f32) {
        let mut x = 0.0;
        let mut y = 0.0;
        if self.any_down(&[Key::Left, Key::A]) {
            x -= 1.0;
        }
        if self.any_down(&[Key::Right, Key::D]) {
            x += 1.0;
        }
        if self.any_down(&[Key::Up, Key::W]) {
            y -= 1.0;
        }
        if self.any_down(&[Key::Down, Key::S]) {
            y += 1.0;
        }
        (x, y)
    }
}

type KeyHandler = Rc<RefCell<dyn FnMut()>>;
type ClickHandler = Rc<RefCell<dyn FnMut(f32, f32)>>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Channel {
    Down(Key),
    Up(Key),
    Click,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    key_handlers: HashMap<u64, (Channel, KeyHandler)>,
    click_handlers: HashMap<u64, ClickHandler>,
    order: Vec<u64>,
}

impl Registry {
    fn allocate(&mut self) -> u64 {
        self.next_id += 1;
        self.order.push(self.next_id);
        self.next_id
    }

    fn remove(&mut self, id: u64) {
        self.key_handlers.remove(&id);
        self.click_handlers.remove(&id);
        self.order.retain(|&other| other != id);
    }

    fn ids_for(&self, channel: Channel) -> Vec<u64> {
        self.order
            .iter()
            .copied()
            .filter(|id| match channel {
                Channel::Click => self.click_handlers.contains_key(id),
                _ => self
                    .key_handlers
                    .get(id)
                    .is_some_and(|(c, _)| *c == channel),
            })
            .collect()
    }
}

/// Disposer returned by the `on_*` registration calls. Removing happens on
/// `unsubscribe()` or on drop, whichever comes first.
#[must_use = "dropping a Subscription immediately removes its handler"]
pub struct Subscription {
    registry: Weak<RefCell<Registry>>,
    id: u64,
}

impl Subscription {
    pub fn unsubscribe(self) {
        // Drop does the work.
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            registry.borrow_mut().remove(self.id);
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").field("id", &self.id).finish()
    }
}

pub struct InputManager {
    held: RefCell<HashSet<Key>>,
    registry: Rc<RefCell<Registry>>,
}

impl InputManager {
    pub fn new() -> Self {
        Self {
            held: RefCell::new(HashSet::new()),
            registry: Rc::new(RefCell::new(Registry::default())),
        }
    }

    pub fn on_key_down(&self, key: Key, handler: impl FnMut() + 'static) -> Subscription {
        self.subscribe_key(Channel::Down(key), handler)
    }

    pub fn on_key_up(&self, key: Key, handler: impl FnMut() + 'static) -> Subscription {
        self.subscribe_key(Channel::Up(key), handler)
    }

    pub fn on_click(&self, handler: impl FnMut(f32, f32) + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.allocate();
        let handler: ClickHandler = Rc::new(RefCell::new(handler));
        registry.click_handlers.insert(id, handler);
        Subscription {
            registry: Rc::downgrade(&self.registry),
            id,
        }
    }

    fn subscribe_key(&self, channel: Channel, handler: impl FnMut() + 'static) -> Subscription {
        let mut registry = self.registry.borrow_mut();
        let id = registry.allocate();
        let handler: KeyHandler = Rc::new(RefCell::new(handler));
        registry.key_handlers.insert(id, (channel, handler));
        Subscription {
            registry: Rc::downgrade(&self.registry),
            id,
        }
    }

    pub fn key_down(&self, key: Key) {
        self.held.borrow_mut().insert(key);
        self.dispatch_key(Channel::Down(key));
    }

    pub fn key_up(&self, key: Key) {
        self.held.borrow_mut().remove(&key);
        self.dispatch_key(Channel::Up(key));
    }

    /// Pointer click in logical coordinates.
    pub fn click(&self, x: f32, y: f32) {
        let ids = self.registry.borrow().ids_for(Channel::Click);
        for id in ids {
            // Re-check: an earlier handler may have unsubscribed this one.
            let handler = self.registry.borrow().click_handlers.get(&id).cloned();
            if let Some(handler) = handler {
                (&mut *handler.borrow_mut())(x, y);
            }
        }
    }

    fn dispatch_key(&self, channel: Channel) {
        let ids = self.registry.borrow().ids_for(channel);
        for id in ids {
            let handler = self
                .registry
                .borrow()
                .key_handlers
                .get(&id)
                .map(|(_, h)| h.clone());
            if let Some(handler) = handler {
                (&mut *handler.borrow_mut())();
            }
        }
    }

    pub fn is_down(&self, key: Key) -> bool {
        self.held.borrow().contains(&key)
    }

    /// Defensive copy of the pressed-key set.
    pub fn get_keys(&self) -> KeySnapshot {
        KeySnapshot {
            down: self.held.borrow().clone(),
        }
    }

    pub fn subscription_count(&self) -> usize {
        self.registry.borrow().order.len()
    }

    /// Forget all pressed keys (e.g. window focus lost).
    pub fn cleanup(&self) {
        self.held.borrow_mut().clear();
    }
}

impl Default for InputManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn counter() -> (Rc<Cell<u32>>, impl FnMut() + 'static) {
        let count = Rc::new(Cell::new(0));
        let c = count.clone();
        (count, move || c.set(c.get() + 1))
    }

    #[test]
    fn key_down_sets_state_and_fires_handler() {
        let input = InputManager::new();
        let (count, handler) = counter();
        let _sub = input.on_key_down(Key::Space, handler);
        input.key_down(Key::Space);
        assert!(input.is_down(Key::Space));
        assert_eq!(count.get(), 1);
    }

    #[test]
    fn repeated_key_down_fires_every_time() {
        let input = InputManager::new();
        let (count, handler) = counter();
        let _sub = input.on_key_down(Key::Space, handler);
        input.key_down(Key::Space);
        input.key_down(Key::Space);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn handlers_are_keyed() {
        let input = InputManager::new();
        let (count, handler) = counter();
        let _sub = input.on_key_down(Key::Enter, handler);
        input.key_down(Key::Space);
        input.key_up(Key::Enter);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn key_up_handler_fires_on_release() {
        let input = InputManager::new();
        let (count, handler) = counter();
        let _sub = input.on_key_up(Key::Q, handler);
        input.key_down(Key::Q);
        assert_eq!(count.get(), 0);
        input.key_up(Key::Q);
        assert_eq!(count.get(), 1);
        assert!(!input.is_down(Key::Q));
    }

    #[test]
    fn unsubscribe_removes_handler() {
        let input = InputManager::new();
        let (count, handler) = counter();
        let sub = input.on_key_down(Key::A, handler);
        sub.unsubscribe();
        input.key_down(Key::A);
        assert_eq!(count.get(), 0);
        assert_eq!(input.subscription_count(), 0);
    }

    #[test]
    fn dropping_subscription_removes_handler() {
        let input = InputManager::new();
        let (count, handler) = counter();
        {
            let _sub = input.on_key_down(Key::A, handler);
        }
        input.key_down(Key::A);
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn subscription_outliving_manager_is_harmless() {
        let (_count, handler) = counter();
        let sub = {
            let input = InputManager::new();
            input.on_key_down(Key::A, handler)
        };
        drop(sub);
    }

    #[test]
    fn snapshot_is_a_copy() {
        let input = InputManager::new();
        input.key_down(Key::W);
        let snapshot = input.get_keys();
        input.key_up(Key::W);
        input.key_down(Key::S);
        assert!(snapshot.is_down(Key::W));
        assert!(!snapshot.is_down(Key::S));
    }

    #[test]
    fn click_dispatches_position() {
        let input = InputManager::new();
        let seen = Rc::new(Cell::new((0.0f32, 0.0f32)));
        let s = seen.clone();
        let _sub = input.on_click(move |x, y| s.set((x, y)));
        input.click(120.0, 45.5);
        assert_eq!(seen.get(), (120.0, 45.5));
    }

    #[test]
    fn cleanup_clears_pressed_state_only() {
        let input = InputManager::new();
        let (count, handler) = counter();
        let _sub = input.on_key_down(Key::D, handler);
        input.key_down(Key::D);
        input.cleanup();
        assert!(input.get_keys().is_empty());
        input.key_down(Key::D);
        assert_eq!(count.get(), 2);
    }

    #[test]
    fn movement_axis_combines_arrows_and_wasd() {
        let keys = KeySnapshot::from_keys(&[Key::A, Key::Right, Key::Up]);
        assert_eq!(keys.movement_axis(), (0.0, -1.0));
        let keys = KeySnapshot::from_keys(&[Key::D, Key::S]);
        assert_eq!(keys.movement_axis(), (1.0, 1.0));
    }

    #[test]
    fn digit_keys_map_to_choices() {
        assert_eq!(Key::Digit1.choice_index(), Some(0));
        assert_eq!(Key::Digit4.choice_index(), Some(3));
        assert_eq!(Key::Enter.choice_index(), None);
    }
}
