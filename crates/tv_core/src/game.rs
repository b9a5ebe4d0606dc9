//! Top-level orchestrator: owns the scene list, the persistent player record,
//! input, asset loader and pause state.

use std::cell::Cell;
use std::rc::Rc;

use crate::assets::AssetLoader;
use crate::input::{InputManager, Key, Subscription};
use crate::player::{PlayerData, PlayerDataPatch};
use crate::scene::{Scene, SceneContext, SceneRequest};
use crate::surface::{Color, Rect, RenderSurface, BASE_HEIGHT, BASE_WIDTH};

pub const HP_BAR: &str = "hp-bar";
pub const MANA_BAR: &str = "mana-bar";

/// Receiver for the HP/mana bars drawn outside the scene surface.
pub trait HudSink {
    fn set_bar(&mut self, id: &str, percent: f32, text: &str);
}

/// Discards HUD updates.
#[derive(Debug, Default)]
pub struct NullHud;

impl HudSink for NullHud {
    fn set_bar(&mut self, _id: &str, _percent: f32, _text: &str) {}
}

pub struct Game {
    scenes: Vec<Box<dyn Scene>>,
    current: usize,
    started: bool,
    player: PlayerData,
    initial_player: PlayerData,
    input: InputManager,
    assets: AssetLoader,
    hud: Box<dyn HudSink>,
    paused: Rc<Cell<bool>>,
    _pause_subscriptions: [Subscription; 2],
}

impl Game {
    pub fn new(
        initial_player: PlayerData,
        scenes: Vec<Box<dyn Scene>>,
        hud: Box<dyn HudSink>,
    ) -> Self {
        let input = InputManager::new();
        let paused = Rc::new(Cell::new(false));

        // Toggle once per physical press; auto-repeat is ignored.
        let held = Rc::new(Cell::new(false));
        let down = {
            let paused = paused.clone();
            let held = held.clone();
            input.on_key_down(Key::P, move || {
                if !held.replace(true) {
                    paused.set(!paused.get());
                    log::info!("{}", if paused.get() { "Paused" } else { "Resumed" });
                }
            })
        };
        let up = input.on_key_up(Key::P, move || held.set(false));

        Self {
            scenes,
            current: 0,
            started: false,
            player: initial_player,
            initial_player,
            input,
            assets: AssetLoader::new(),
            hud,
            paused,
            _pause_subscriptions: [down, up],
        }
    }

    /// Initialise the first scene.
    pub fn begin(&mut self) {
        if self.scenes.is_empty() {
            log::warn!("Game started with no scenes");
            return;
        }
        self.current = 0;
        self.started = true;
        log::info!("Starting with scene '{}'", self.scenes[0].name());
        let request = self.run_scene(|scene, ctx| scene.init(ctx));
        self.apply(request);
        self.sync_hud();
    }

    /// Clean up the outgoing scene and initialise scene `index`.
    /// Out-of-range indices are ignored.
    pub fn set_scene(&mut self, index: usize) {
        if index >= self.scenes.len() {
            log::warn!(
                "Ignoring switch to scene {index}: only {} scenes",
                self.scenes.len()
            );
            return;
        }
        if self.started {
            self.scenes[self.current].cleanup();
        }
        log::info!(
            "Scene '{}' -> '{}'",
            self.scenes[self.current].name(),
            self.scenes[index].name()
        );
        self.current = index;
        self.started = true;
        let request = self.run_scene(|scene, ctx| scene.init(ctx));
        self.apply(request);
    }

    pub fn next_scene(&mut self) {
        if self.current + 1 < self.scenes.len() {
            self.set_scene(self.current + 1);
        } else {
            log::info!("Already on the last scene");
        }
    }

    pub fn restart_scene(&mut self) {
        if !self.started || self.scenes.is_empty() {
            return;
        }
        log::info!("Restarting scene '{}'", self.scenes[self.current].name());
        self.scenes[self.current].cleanup();
        let request = self.run_scene(|scene, ctx| scene.init(ctx));
        self.apply(request);
    }

    pub fn player_data(&self) -> PlayerData {
        self.player
    }

    pub fn set_player_data(&mut self, patch: PlayerDataPatch) {
        patch.apply_to(&mut self.player);
        self.sync_hud();
    }

    pub fn update(&mut self, dt: f32) {
        if self.paused.get() || !self.started {
            return;
        }
        let keys = self.input.get_keys();
        let request = self.run_scene(|scene, ctx| scene.update(dt, &keys, ctx));
        self.apply(request);
        self.sync_hud();
    }

    pub fn render(&self, surface: &mut dyn RenderSurface) {
        if let Some(scene) = self.scenes.get(self.current) {
            scene.render(surface);
        }
        if self.paused.get() {
            surface.fill_rect(
                Rect::new(0.0, 0.0, BASE_WIDTH, BASE_HEIGHT),
                Color::BLACK.with_alpha(0.5),
            );
            let (x, y) = (BASE_WIDTH * 0.5 - 48.0, BASE_HEIGHT * 0.5);
            surface.fill_text("PAUSED", x, y, 32.0, Color::WHITE);
            surface.fill_text(
                "Press P to resume",
                BASE_WIDTH * 0.5 - 70.0,
                BASE_HEIGHT * 0.5 + 36.0,
                16.0,
                Color::WHITE,
            );
        }
    }

    /// Clean up the current scene before the host exits.
    pub fn shutdown(&mut self) {
        if self.started {
            self.scenes[self.current].cleanup();
            self.started = false;
        }
    }

    pub fn input(&self) -> &InputManager {
        &self.input
    }

    pub fn assets(&self) -> &AssetLoader {
        &self.assets
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_scene_name(&self) -> Option<&'static str> {
        self.scenes.get(self.current).map(|s| s.name())
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn is_paused(&self) -> bool {
        self.paused.get()
    }

    pub fn set_paused(&self, paused: bool) {
        if self.paused.replace(paused) != paused {
            log::info!("{}", if paused { "Paused" } else { "Resumed" });
        }
    }

    fn run_scene(
        &mut self,
        f: impl FnOnce(&mut dyn Scene, &mut SceneContext),
    ) -> Option<SceneRequest> {
        let scene = self.scenes.get_mut(self.current)?;
        let mut ctx =
            SceneContext::new(&mut self.player, self.initial_player, &self.input, &self.assets);
        f(scene.as_mut(), &mut ctx);
        ctx.take_request()
    }

    fn apply(&mut self, request: Option<SceneRequest>) {
        match request {
            Some(SceneRequest::Next) => self.next_scene(),
            Some(SceneRequest::Goto(index)) => self.set_scene(index),
            Some(SceneRequest::Restart) => self.restart_scene(),
            None => {}
        }
    }

    fn sync_hud(&mut self) {
        let p = self.player;
        self.hud.set_bar(
            HP_BAR,
            p.hp_fraction() * 100.0,
            &format!("{:.0}/{:.0}", p.hp, p.max_hp),
        );
        self.hud.set_bar(
            MANA_BAR,
            p.mana_fraction() * 100.0,
            &format!("{:.0}/{:.0}", p.mana, p.max_mana),
        );
    }
}

impl Drop for Game {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::KeySnapshot;
    use crate::surface::RecordingSurface;
    use std::cell::RefCell;

    type Log = Rc<RefCell<Vec<String>>>;

    /// Scene that logs lifecycle calls and counts Space presses through a
    /// subscription taken in `init`.
    struct Probe {
        name: &'static str,
        log: Log,
        presses: Rc<Cell<u32>>,
        subscriptions: Vec<Subscription>,
        request_after_update: Option<SceneRequest>,
    }

    impl Probe {
        fn boxed(name: &'static str, log: &Log, presses: &Rc<Cell<u32>>) -> Box<dyn Scene> {
            Box::new(Probe {
                name,
                log: log.clone(),
                presses: presses.clone(),
                subscriptions: Vec::new(),
                request_after_update: None,
            })
        }
    }

    impl Scene for Probe {
        fn name(&self) -> &'static str {
            self.name
        }

        fn init(&mut self, ctx: &mut SceneContext) {
            self.log.borrow_mut().push(format!("{}:init", self.name));
            let presses = self.presses.clone();
            self.subscriptions
                .push(ctx.input().on_key_down(Key::Space, move || presses.set(presses.get() + 1)));
        }

        fn update(&mut self, _dt: f32, _keys: &KeySnapshot, ctx: &mut SceneContext) {
            self.log.borrow_mut().push(format!("{}:update", self.name));
            match self.request_after_update.take() {
                Some(SceneRequest::Next) => ctx.next_scene(),
                Some(SceneRequest::Goto(i)) => ctx.set_scene(i),
                Some(SceneRequest::Restart) => ctx.restart_scene(),
                None => {}
            }
        }

        fn render(&self, surface: &mut dyn RenderSurface) {
            surface.fill_text(self.name, 0.0, 0.0, 12.0, Color::WHITE);
        }

        fn cleanup(&mut self) {
            self.log.borrow_mut().push(format!("{}:cleanup", self.name));
            self.subscriptions.clear();
        }
    }

    #[derive(Default)]
    struct BarLog(Rc<RefCell<Vec<(String, f32)>>>);

    impl HudSink for BarLog {
        fn set_bar(&mut self, id: &str, percent: f32, _text: &str) {
            self.0.borrow_mut().push((id.to_string(), percent));
        }
    }

    fn two_scene_game() -> (Game, Log, Rc<Cell<u32>>) {
        let log: Log = Rc::default();
        let presses = Rc::new(Cell::new(0));
        let scenes = vec![Probe::boxed("a", &log, &presses), Probe::boxed("b", &log, &presses)];
        let game = Game::new(PlayerData::default(), scenes, Box::new(NullHud));
        (game, log, presses)
    }

    #[test]
    fn set_scene_cleans_up_then_inits() {
        let (mut game, log, _) = two_scene_game();
        game.begin();
        game.set_scene(1);
        assert_eq!(*log.borrow(), vec!["a:init", "a:cleanup", "b:init"]);
        assert_eq!(game.current_scene_name(), Some("b"));
    }

    #[test]
    fn out_of_range_set_scene_is_ignored() {
        let (mut game, log, _) = two_scene_game();
        game.begin();
        game.set_scene(7);
        assert_eq!(game.current_index(), 0);
        assert_eq!(*log.borrow(), vec!["a:init"]);
    }

    #[test]
    fn next_scene_stops_at_last() {
        let (mut game, _, _) = two_scene_game();
        game.begin();
        game.next_scene();
        game.next_scene();
        assert_eq!(game.current_index(), 1);
    }

    #[test]
    fn old_scene_subscriptions_do_not_fire_after_switch() {
        let (mut game, _, presses) = two_scene_game();
        game.begin();
        game.input().key_down(Key::Space);
        assert_eq!(presses.get(), 1);
        game.set_scene(1);
        game.input().key_up(Key::Space);
        game.input().key_down(Key::Space);
        // Only scene b's handler is live now.
        assert_eq!(presses.get(), 2);
        assert_eq!(game.input().subscription_count(), 3);
    }

    #[test]
    fn restart_does_not_duplicate_handlers() {
        let (mut game, _, presses) = two_scene_game();
        game.begin();
        game.restart_scene();
        game.restart_scene();
        game.input().key_down(Key::Space);
        assert_eq!(presses.get(), 1);
    }

    #[test]
    fn scene_requests_apply_after_update() {
        let log: Log = Rc::default();
        let presses = Rc::new(Cell::new(0));
        let first: Box<dyn Scene> = Box::new(Probe {
            name: "a",
            log: log.clone(),
            presses: presses.clone(),
            subscriptions: Vec::new(),
            request_after_update: Some(SceneRequest::Next),
        });
        let scenes: Vec<Box<dyn Scene>> = vec![first, Probe::boxed("b", &log, &presses)];
        let mut game = Game::new(PlayerData::default(), scenes, Box::new(NullHud));
        game.begin();
        game.update(0.016);
        assert_eq!(
            *log.borrow(),
            vec!["a:init", "a:update", "a:cleanup", "b:init"]
        );
    }

    #[test]
    fn pause_freezes_updates_and_draws_banner() {
        let (mut game, log, _) = two_scene_game();
        game.begin();
        game.input().key_down(Key::P);
        // Auto-repeat does not toggle back.
        game.input().key_down(Key::P);
        assert!(game.is_paused());
        game.update(0.016);
        assert_eq!(*log.borrow(), vec!["a:init"]);

        let mut surface = RecordingSurface::new();
        game.render(&mut surface);
        assert!(surface.contains_text("PAUSED"));

        game.input().key_up(Key::P);
        game.input().key_down(Key::P);
        assert!(!game.is_paused());
    }

    #[test]
    fn set_paused_agrees_with_the_p_key() {
        let (mut game, log, _) = two_scene_game();
        game.begin();
        game.set_paused(true);
        game.update(0.016);
        assert_eq!(*log.borrow(), vec!["a:init"]);
        game.input().key_down(Key::P);
        assert!(!game.is_paused());
    }

    #[test]
    fn update_syncs_hud_bars() {
        let bars = BarLog::default();
        let seen = bars.0.clone();
        let mut game = Game::new(
            PlayerData {
                hp: 50.0,
                ..Default::default()
            },
            vec![Probe::boxed("a", &Rc::default(), &Rc::new(Cell::new(0)))],
            Box::new(bars),
        );
        game.begin();
        seen.borrow_mut().clear();
        game.update(0.016);
        assert_eq!(
            *seen.borrow(),
            vec![(HP_BAR.to_string(), 50.0), (MANA_BAR.to_string(), 100.0)]
        );
    }

    #[test]
    fn player_data_patches_merge() {
        let (mut game, _, _) = two_scene_game();
        game.set_player_data(PlayerDataPatch {
            toxicity: Some(5.0),
            ..Default::default()
        });
        assert_eq!(game.player_data().toxicity, 5.0);
        assert_eq!(game.player_data().hp, 100.0);
    }
}
