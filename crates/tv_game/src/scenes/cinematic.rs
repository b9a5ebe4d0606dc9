//! Opening narration over a walking hero.

use tv_core::{
    Color, ContinuePrompt, DialogueCursor, Key, KeySnapshot, Rect, RenderSurface,
    RenderingSystem, Scene, SceneContext, Subscription,
};

use super::{ui, Inbox};
use crate::config::CinematicConfig;
use crate::hero::Hero;
use crate::sprites::hero_sheet;

const GROUND_Y: f32 = 360.0;

const PAGES: [&str; 4] = [
    "Long ago the Thornveil swallowed the valley road.",
    "Those who entered came back changed, or not at all.",
    "Now the thorns creep toward the last village.",
    "Someone has to walk into the Veil and end it.",
];

#[derive(Debug, Clone, Copy, PartialEq)]
enum CinematicState {
    FadeIn { elapsed: f32 },
    Narration,
    FadeOut { elapsed: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CinematicInput {
    Advance,
    Skip,
}

pub struct CinematicScene {
    config: CinematicConfig,
    state: CinematicState,
    page: DialogueCursor,
    prompt: ContinuePrompt,
    hero: Option<Hero>,
    inbox: Inbox<CinematicInput>,
    subscriptions: Vec<Subscription>,
}

impl CinematicScene {
    pub fn new(config: CinematicConfig) -> Self {
        Self {
            config,
            state: CinematicState::FadeIn { elapsed: 0.0 },
            page: DialogueCursor::new(PAGES.len()),
            prompt: ContinuePrompt::new(),
            hero: None,
            inbox: Inbox::new(),
            subscriptions: Vec::new(),
        }
    }

    fn skip(&mut self) {
        if !matches!(self.state, CinematicState::FadeOut { .. }) {
            log::info!("Intro skipped");
            self.state = CinematicState::FadeOut { elapsed: 0.0 };
        }
    }

    fn update_fade_in(&mut self, dt: f32, elapsed: f32) {
        let elapsed = elapsed + dt;
        self.state = if elapsed >= self.config.fade {
            self.prompt.reset();
            CinematicState::Narration
        } else {
            CinematicState::FadeIn { elapsed }
        };
    }

    fn update_narration(&mut self, inputs: &[CinematicInput]) {
        for input in inputs {
            if *input == CinematicInput::Advance && self.prompt.is_ready() {
                if self.page.advance() {
                    self.prompt.reset();
                } else {
                    self.state = CinematicState::FadeOut { elapsed: 0.0 };
                }
                return;
            }
        }
    }

    fn update_fade_out(&mut self, dt: f32, elapsed: f32, ctx: &mut SceneContext) {
        let elapsed = elapsed + dt;
        self.state = CinematicState::FadeOut { elapsed };
        if elapsed >= self.config.fade {
            ctx.next_scene();
        }
    }

    fn update_hero(&mut self, dt: f32) {
        if let Some(hero) = &mut self.hero {
            let w = hero.entity.width;
            let lane = Rect::new(-w, 0.0, ui::SCREEN.w + w * 2.0, ui::SCREEN.h);
            hero.walk((1.0, 0.0), self.config.walk_speed, dt, lane);
            hero.tick(dt, usize::MAX);
            // Wrap once fully off the right edge.
            if hero.entity.x >= ui::SCREEN.w {
                hero.entity.x = -hero.entity.width;
            }
        }
    }

    fn render_scenery(&self, surface: &mut dyn RenderSurface) {
        ui::clear(surface, Color::hex("#1b1f3a"));
        surface.fill_circle(640.0, 110.0, 40.0, Color::hex("#e8e2c8"));
        surface.fill_rect(
            Rect::new(0.0, GROUND_Y + 32.0, ui::SCREEN.w, ui::SCREEN.h - GROUND_Y - 32.0),
            Color::hex("#2e3b24"),
        );
        for i in 0..8 {
            let x = 40.0 + i as f32 * 100.0;
            surface.fill_rect(Rect::new(x, GROUND_Y - 60.0, 18.0, 92.0), Color::hex("#3c2a1e"));
            surface.fill_circle(x + 9.0, GROUND_Y - 70.0, 34.0, Color::hex("#24361f"));
        }
    }
}

impl Default for CinematicScene {
    fn default() -> Self {
        Self::new(CinematicConfig::default())
    }
}

impl Scene for CinematicScene {
    fn name(&self) -> &'static str {
        "cinematic"
    }

    fn init(&mut self, ctx: &mut SceneContext) {
        self.state = CinematicState::FadeIn { elapsed: 0.0 };
        self.page.reset();
        self.prompt.reset();
        self.hero = Some(Hero::new(
            hero_sheet(ctx.assets()),
            0.0,
            GROUND_Y,
            self.config.player_size,
            self.config.walk_frame_duration,
        ));
        self.inbox.clear();
        self.subscriptions = vec![
            self.inbox.on_key(ctx.input(), Key::Enter, CinematicInput::Advance),
            self.inbox.on_key(ctx.input(), Key::Escape, CinematicInput::Skip),
        ];
    }

    fn update(&mut self, dt: f32, _keys: &KeySnapshot, ctx: &mut SceneContext) {
        let inputs = self.inbox.drain();
        if inputs.contains(&CinematicInput::Skip) {
            self.skip();
        }
        self.prompt.update(dt);
        self.update_hero(dt);

        match self.state {
            CinematicState::FadeIn { elapsed } => self.update_fade_in(dt, elapsed),
            CinematicState::Narration => self.update_narration(&inputs),
            CinematicState::FadeOut { elapsed } => self.update_fade_out(dt, elapsed, ctx),
        }
    }

    fn render(&self, surface: &mut dyn RenderSurface) {
        self.render_scenery(surface);
        if let Some(hero) = &self.hero {
            RenderingSystem::draw(surface, hero);
        }

        match self.state {
            CinematicState::FadeIn { elapsed } => {
                ui::fade(surface, 1.0 - elapsed / self.config.fade);
            }
            CinematicState::Narration => {
                if let Some(line) = self.page.line(&PAGES) {
                    ui::dialogue_box(surface, "", line);
                }
                let (x, y) = (
                    ui::DIALOGUE_BOX.right() - 90.0,
                    ui::DIALOGUE_BOX.bottom() - 28.0,
                );
                self.prompt.render(surface, "Enter >", x, y);
            }
            CinematicState::FadeOut { elapsed } => {
                ui::fade(surface, elapsed / self.config.fade);
            }
        }
        surface.fill_text("Esc to skip", 680.0, 16.0, 12.0, ui::TEXT.with_alpha(0.6));
    }

    fn cleanup(&mut self) {
        self.subscriptions.clear();
        self.inbox.clear();
        self.hero = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenes::testing::Harness;
    use tv_core::SceneRequest;

    fn started() -> (CinematicScene, Harness) {
        let mut scene = CinematicScene::new(CinematicConfig::default());
        let mut harness = Harness::new();
        harness.init(&mut scene);
        (scene, harness)
    }

    #[test]
    fn fades_in_to_narration() {
        let (mut scene, mut h) = started();
        h.run(&mut scene, 0.5, 0.05);
        assert!(matches!(scene.state, CinematicState::FadeIn { .. }));
        h.run(&mut scene, 0.55, 0.05);
        assert_eq!(scene.state, CinematicState::Narration);
        assert!(h.render(&scene).contains_text(PAGES[0]));
    }

    #[test]
    fn enter_is_gated_by_prompt_cooldown() {
        let (mut scene, mut h) = started();
        h.run(&mut scene, 1.05, 0.05);
        h.tap(&mut scene, Key::Enter);
        assert_eq!(scene.page.index(), 0);
        h.run(&mut scene, 0.5, 0.05);
        h.tap(&mut scene, Key::Enter);
        assert_eq!(scene.page.index(), 1);
    }

    #[test]
    fn last_page_fades_out_to_next_scene() {
        let (mut scene, mut h) = started();
        h.run(&mut scene, 1.05, 0.05);
        for _ in 0..PAGES.len() {
            h.run(&mut scene, 0.5, 0.05);
            h.tap(&mut scene, Key::Enter);
        }
        assert!(matches!(scene.state, CinematicState::FadeOut { .. }));
        assert_eq!(h.run(&mut scene, 1.1, 0.05), Some(SceneRequest::Next));
    }

    #[test]
    fn escape_skips_from_fade_in() {
        let (mut scene, mut h) = started();
        h.tap(&mut scene, Key::Escape);
        assert!(matches!(scene.state, CinematicState::FadeOut { .. }));
        assert_eq!(h.run(&mut scene, 1.1, 0.05), Some(SceneRequest::Next));
    }

    #[test]
    fn fade_length_and_hero_size_come_from_config() {
        let config = CinematicConfig {
            fade: 0.2,
            player_size: 32.0,
            ..CinematicConfig::default()
        };
        let mut scene = CinematicScene::new(config);
        let mut h = Harness::new();
        h.init(&mut scene);
        assert_eq!(scene.hero.as_ref().map(|hero| hero.entity.width), Some(32.0));
        h.run(&mut scene, 0.25, 0.05);
        assert_eq!(scene.state, CinematicState::Narration);
    }

    #[test]
    fn hero_keeps_walking() {
        let (mut scene, mut h) = started();
        let start = scene.hero.as_ref().map(|hero| hero.entity.x);
        h.run(&mut scene, 1.0, 0.05);
        let end = scene.hero.as_ref().map(|hero| hero.entity.x);
        assert!(end > start);
    }
}
