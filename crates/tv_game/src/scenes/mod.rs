//! The five scenes, in play order, plus the plumbing they share.
//!
//! Each scene is an enum-state machine: `update` and `render` match on the
//! state and hand off to one method per state. Key subscriptions taken in
//! `init` push into the scene's `Inbox`, which `update` drains at the top of
//! the tick, so handlers never touch scene state directly.

pub mod boss;
pub mod cinematic;
pub mod race;
pub mod riddle;
pub mod roguelike;
mod ui;

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use tv_core::{InputManager, Key, Scene, Subscription};

use crate::config::GameConfig;

pub fn build_scenes(config: &GameConfig) -> Vec<Box<dyn Scene>> {
    vec![
        Box::new(cinematic::CinematicScene::new(config.cinematic)),
        Box::new(roguelike::RoguelikeScene::new(config.combat.clone())),
        Box::new(riddle::RiddleScene::new(config.riddle.clone())),
        Box::new(boss::BossScene::new(config.boss.clone())),
        Box::new(race::RaceScene::new(config.race.clone())),
    ]
}

/// Queue filled by input subscriptions and drained by the owning scene.
pub struct Inbox<A> {
    queue: Rc<RefCell<VecDeque<A>>>,
}

impl<A: Clone + 'static> Inbox<A> {
    pub fn new() -> Self {
        Self {
            queue: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Queue `action` on every key-down of `key`.
    pub fn on_key(&self, input: &InputManager, key: Key, action: A) -> Subscription {
        let queue = self.queue.clone();
        input.on_key_down(key, move || queue.borrow_mut().push_back(action.clone()))
    }

    /// Queue whatever `hit` maps a click to, if anything.
    pub fn on_click(
        &self,
        input: &InputManager,
        hit: impl Fn(f32, f32) -> Option<A> + 'static,
    ) -> Subscription {
        let queue = self.queue.clone();
        input.on_click(move |x, y| {
            if let Some(action) = hit(x, y) {
                queue.borrow_mut().push_back(action);
            }
        })
    }

    pub fn drain(&self) -> Vec<A> {
        self.queue.borrow_mut().drain(..).collect()
    }

    pub fn clear(&self) {
        self.queue.borrow_mut().clear();
    }
}

impl<A: Clone + 'static> Default for Inbox<A> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use tv_core::{
        AssetLoader, InputManager, Key, PlayerData, RecordingSurface, Scene, SceneContext,
        SceneRequest,
    };

    /// Stand-in for `Game` that runs one scene and reports its requests.
    pub struct Harness {
        pub data: PlayerData,
        pub initial: PlayerData,
        pub input: InputManager,
        pub assets: AssetLoader,
    }

    impl Harness {
        pub fn new() -> Self {
            Self::with_player(PlayerData::default())
        }

        pub fn with_player(initial: PlayerData) -> Self {
            Self {
                data: initial,
                initial,
                input: InputManager::new(),
                assets: AssetLoader::new(),
            }
        }

        pub fn init(&mut self, scene: &mut dyn Scene) -> Option<SceneRequest> {
            let mut ctx =
                SceneContext::new(&mut self.data, self.initial, &self.input, &self.assets);
            scene.init(&mut ctx);
            ctx.take_request()
        }

        /// One tick with the live key state.
        pub fn update(&mut self, scene: &mut dyn Scene, dt: f32) -> Option<SceneRequest> {
            let keys = self.input.get_keys();
            let mut ctx =
                SceneContext::new(&mut self.data, self.initial, &self.input, &self.assets);
            scene.update(dt, &keys, &mut ctx);
            ctx.take_request()
        }

        /// Tick in `step` slices for `secs`, stopping at the first request.
        pub fn run(&mut self, scene: &mut dyn Scene, secs: f32, step: f32) -> Option<SceneRequest> {
            let mut elapsed = 0.0;
            while elapsed < secs - 1e-6 {
                if let Some(request) = self.update(scene, step) {
                    return Some(request);
                }
                elapsed += step;
            }
            None
        }

        /// Press, tick once, release.
        pub fn tap(&mut self, scene: &mut dyn Scene, key: Key) -> Option<SceneRequest> {
            self.input.key_down(key);
            let request = self.update(scene, 0.016);
            self.input.key_up(key);
            request
        }

        pub fn click(&mut self, x: f32, y: f32) {
            self.input.click(x, y);
        }

        pub fn render(&self, scene: &dyn Scene) -> RecordingSurface {
            let mut surface = RecordingSurface::new();
            scene.render(&mut surface);
            surface
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use testing::Harness;

    #[test]
    fn scene_order_matches_play_order() {
        let names: Vec<_> = build_scenes(&GameConfig::default())
            .iter()
            .map(|s| s.name())
            .collect();
        assert_eq!(names, vec!["cinematic", "roguelike", "riddle", "boss", "race"]);
    }

    #[test]
    fn every_scene_renders_before_init() {
        let harness = Harness::new();
        for scene in build_scenes(&GameConfig::default()) {
            let surface = harness.render(scene.as_ref());
            assert!(!surface.commands.is_empty(), "{} drew nothing", scene.name());
        }
    }

    #[test]
    fn every_scene_restarts_without_duplicate_subscriptions() {
        let mut harness = Harness::new();
        for mut scene in build_scenes(&GameConfig::default()) {
            harness.init(scene.as_mut());
            let first = harness.input.subscription_count();
            scene.cleanup();
            assert_eq!(harness.input.subscription_count(), 0, "{}", scene.name());
            harness.init(scene.as_mut());
            assert_eq!(harness.input.subscription_count(), first, "{}", scene.name());
            scene.cleanup();
        }
    }

    #[test]
    fn inbox_collects_keyed_actions() {
        let input = InputManager::new();
        let inbox: Inbox<u8> = Inbox::new();
        let _a = inbox.on_key(&input, Key::Enter, 1);
        let _b = inbox.on_click(&input, |x, _| (x > 10.0).then_some(2));
        input.key_down(Key::Enter);
        input.click(5.0, 0.0);
        input.click(20.0, 0.0);
        assert_eq!(inbox.drain(), vec![1, 2]);
        assert!(inbox.drain().is_empty());
    }
}
