//! Scene lifecycle contract and the context scenes use to reach the game.
//!
//! A scene is initialised when it becomes current, updated and rendered every
//! frame, and cleaned up when it is left or restarted. `init` must work again
//! after `cleanup`, and `render` must not panic before the first `init`.
//!
//! Scenes never hold a pointer back to `Game`. Everything they need from it
//! arrives through `SceneContext`; scene switches are recorded as a
//! `SceneRequest` and carried out by `Game` once the scene call returns, so a
//! scene is never cleaned up while one of its own methods is on the stack.

use crate::assets::AssetLoader;
use crate::input::{InputManager, KeySnapshot};
use crate::player::{PlayerData, PlayerDataPatch};
use crate::surface::RenderSurface;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SceneRequest {
    Next,
    Goto(usize),
    Restart,
}

pub trait Scene {
    fn name(&self) -> &'static str;
    fn init(&mut self, ctx: &mut SceneContext);
    fn update(&mut self, dt: f32, keys: &KeySnapshot, ctx: &mut SceneContext);
    fn render(&self, surface: &mut dyn RenderSurface);
    fn cleanup(&mut self);
}

pub struct SceneContext<'a> {
    player: &'a mut PlayerData,
    initial_player: PlayerData,
    input: &'a InputManager,
    assets: &'a AssetLoader,
    request: Option<SceneRequest>,
}

impl<'a> SceneContext<'a> {
    pub fn new(
        player: &'a mut PlayerData,
        initial_player: PlayerData,
        input: &'a InputManager,
        assets: &'a AssetLoader,
    ) -> Self {
        Self {
            player,
            initial_player,
            input,
            assets,
            request: None,
        }
    }

    pub fn player_data(&self) -> PlayerData {
        *self.player
    }

    /// Shallow merge. Values are written as given; callers clamp first.
    pub fn set_player_data(&mut self, patch: PlayerDataPatch) {
        patch.apply_to(self.player);
    }

    pub fn reset_player_data(&mut self) {
        *self.player = self.initial_player;
        log::info!("Player data reset");
    }

    pub fn next_scene(&mut self) {
        self.request = Some(SceneRequest::Next);
    }

    pub fn set_scene(&mut self, index: usize) {
        self.request = Some(SceneRequest::Goto(index));
    }

    pub fn restart_scene(&mut self) {
        self.request = Some(SceneRequest::Restart);
    }

    pub fn input(&self) -> &InputManager {
        self.input
    }

    pub fn assets(&self) -> &AssetLoader {
        self.assets
    }

    pub fn request(&self) -> Option<SceneRequest> {
        self.request
    }

    pub fn take_request(&mut self) -> Option<SceneRequest> {
        self.request.take()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn last_request_wins() {
        let mut data = PlayerData::default();
        let input = InputManager::new();
        let assets = AssetLoader::new();
        let mut ctx = SceneContext::new(&mut data, PlayerData::default(), &input, &assets);
        assert_eq!(ctx.request(), None);
        ctx.next_scene();
        ctx.set_scene(0);
        assert_eq!(ctx.take_request(), Some(SceneRequest::Goto(0)));
        assert_eq!(ctx.request(), None);
    }

    #[test]
    fn reset_restores_initial_values() {
        let initial = PlayerData::default();
        let mut data = PlayerData {
            hp: 3.0,
            strength: 40.0,
            ..initial
        };
        let input = InputManager::new();
        let assets = AssetLoader::new();
        let mut ctx = SceneContext::new(&mut data, initial, &input, &assets);
        ctx.set_player_data(PlayerDataPatch {
            mana: Some(1.0),
            ..Default::default()
        });
        assert_eq!(ctx.player_data().mana, 1.0);
        ctx.reset_player_data();
        assert_eq!(ctx.player_data(), initial);
    }
}
