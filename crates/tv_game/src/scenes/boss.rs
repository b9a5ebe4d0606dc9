//! Turn-based war of words with the Warden, then a short walk to the exit.

use tv_core::{
    ChoiceList, Color, ContinuePrompt, DialogueCursor, Key, KeySnapshot, PlayerData, PressSettle,
    Rect, RenderSurface, RenderingSystem, Scene, SceneContext, Subscription, TimerQueue,
};

use super::{ui, Inbox};
use crate::config::{BossConfig, BossResponse};
use crate::hero::Hero;
use crate::npc::Npc;
use crate::sprites::{hero_sheet, WARDEN_SHEET};

const HERO_START: (f32, f32) = (160.0, 320.0);
const WALK_AREA: Rect = Rect::new(20.0, 120.0, 760.0, 300.0);

#[derive(Debug, Clone, Copy, PartialEq)]
enum BossState {
    IntroDialogue,
    BossTalk,
    PlayerChoice,
    Result,
    VictoryDialogue,
    FreeRoam,
    RaceTransition { elapsed: f32 },
    DefeatDialogue,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BossInput {
    Confirm,
    Up,
    Down,
    Pick(usize),
    Click(usize),
    Restart,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BossEvent {
    Settled(usize),
}

/// Damage actually dealt in one exchange, after stat modifiers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Exchange {
    pub boss_damage: f32,
    pub player_damage: f32,
}

impl Exchange {
    /// Positive boss damage gains `strength / 5`; player damage loses
    /// `endurance / 10`, floored at zero.
    pub fn resolve(response: &BossResponse, player: &PlayerData) -> Self {
        let boss_damage = if response.boss_damage > 0.0 {
            response.boss_damage + player.strength / 5.0
        } else {
            response.boss_damage.max(0.0)
        };
        let player_damage = (response.player_damage - player.endurance / 10.0).max(0.0);
        Self {
            boss_damage,
            player_damage,
        }
    }
}

pub struct BossScene {
    config: BossConfig,
    state: BossState,
    resolve: f32,
    turn: usize,
    cursor: DialogueCursor,
    choices: ChoiceList,
    last_exchange: Option<Exchange>,
    prompt: ContinuePrompt,
    buttons: PressSettle,
    timers: TimerQueue<BossEvent>,
    hero: Option<Hero>,
    warden: Option<Npc>,
    inbox: Inbox<BossInput>,
    subscriptions: Vec<Subscription>,
}

impl BossScene {
    pub fn new(config: BossConfig) -> Self {
        let resolve = config.resolve;
        let cursor = DialogueCursor::new(config.intro_lines.len());
        Self {
            config,
            state: BossState::IntroDialogue,
            resolve,
            turn: 0,
            cursor,
            choices: ChoiceList::default(),
            last_exchange: None,
            prompt: ContinuePrompt::new(),
            buttons: PressSettle::default(),
            timers: TimerQueue::new(),
            hero: None,
            warden: None,
            inbox: Inbox::new(),
            subscriptions: Vec::new(),
        }
    }

    pub fn resolve(&self) -> f32 {
        self.resolve
    }

    fn responses(&self) -> &[BossResponse] {
        self.config
            .turns
            .get(self.turn)
            .map(|t| t.responses.as_slice())
            .unwrap_or(&[])
    }

    fn enter(&mut self, state: BossState) {
        log::debug!("Boss state {:?} -> {:?}", self.state, state);
        match state {
            BossState::IntroDialogue => {
                self.cursor = DialogueCursor::new(self.config.intro_lines.len())
            }
            BossState::VictoryDialogue => {
                self.cursor = DialogueCursor::new(self.config.victory_lines.len())
            }
            BossState::DefeatDialogue => {
                self.cursor = DialogueCursor::new(self.config.defeat_lines.len())
            }
            BossState::PlayerChoice => {
                self.choices = ChoiceList::new(self.responses().len());
                self.buttons = PressSettle::default();
            }
            _ => {}
        }
        self.state = state;
        self.prompt.reset();
    }

    fn confirmed(&self, inputs: &[BossInput]) -> bool {
        inputs.contains(&BossInput::Confirm) && self.prompt.is_ready()
    }

    /// Step a dialogue script; moves to `then` after its last line.
    fn update_script(&mut self, inputs: &[BossInput], then: BossState) {
        if !self.confirmed(inputs) {
            return;
        }
        if self.cursor.advance() {
            self.prompt.reset();
        } else {
            self.enter(then);
        }
    }

    fn update_choice(&mut self, inputs: &[BossInput], ctx: &mut SceneContext) {
        for input in inputs {
            if self.buttons.is_settling() {
                break;
            }
            match *input {
                BossInput::Up => self.choices.up(),
                BossInput::Down => self.choices.down(),
                BossInput::Pick(i) => {
                    self.choices.select(i);
                }
                BossInput::Click(i) => {
                    if self.choices.select(i) {
                        self.buttons.press(i, &mut self.timers, BossEvent::Settled(i));
                    }
                }
                BossInput::Confirm => {
                    if self.prompt.is_ready() {
                        self.answer(ctx);
                        return;
                    }
                }
                BossInput::Restart => {}
            }
        }
    }

    fn answer(&mut self, ctx: &mut SceneContext) {
        let Some(response) = self.responses().get(self.choices.selected()).cloned() else {
            return;
        };
        let player = ctx.player_data();
        let exchange = Exchange::resolve(&response, &player);
        self.resolve = (self.resolve - exchange.boss_damage).max(0.0);
        ctx.set_player_data(player.damaged(exchange.player_damage));
        log::info!(
            "Turn {}: boss -{:.0} (resolve {:.0}), player -{:.0}",
            self.turn + 1,
            exchange.boss_damage,
            self.resolve,
            exchange.player_damage
        );
        self.last_exchange = Some(exchange);
        self.enter(BossState::Result);
    }

    fn update_result(&mut self, inputs: &[BossInput], ctx: &mut SceneContext) {
        if !self.confirmed(inputs) {
            return;
        }
        if self.resolve <= 0.0 {
            log::info!("Boss defeated");
            self.enter(BossState::VictoryDialogue);
        } else if ctx.player_data().is_dead() {
            log::info!("Defeated by the boss");
            self.enter(BossState::DefeatDialogue);
        } else {
            self.turn = (self.turn + 1) % self.config.turns.len().max(1);
            self.enter(BossState::BossTalk);
        }
    }

    fn update_free_roam(&mut self, dt: f32, keys: &KeySnapshot) {
        let portal = self.config.portal_rect();
        let Some(hero) = &mut self.hero else {
            return;
        };
        hero.walk(keys.movement_axis(), self.config.player_speed, dt, WALK_AREA);
        hero.tick(dt, usize::MAX);
        if hero.entity.bounds().intersects(&portal) {
            log::info!("Portal reached");
            self.enter(BossState::RaceTransition { elapsed: 0.0 });
        }
    }

    fn render_prompt(&self, surface: &mut dyn RenderSurface) {
        self.prompt.render(
            surface,
            "Enter >",
            ui::DIALOGUE_BOX.right() - 90.0,
            ui::DIALOGUE_BOX.bottom() - 28.0,
        );
    }

    fn render_choices(&self, surface: &mut dyn RenderSurface) {
        let line = self
            .config
            .turns
            .get(self.turn)
            .map(|t| t.boss_line.as_str())
            .unwrap_or("");
        ui::dialogue_box(surface, &self.config.name, line);
        for (i, response) in self.responses().iter().enumerate() {
            let rect = self.buttons.button_rect(i, ui::choice_rect(i));
            ui::button(
                surface,
                rect,
                &format!("{}. {}", i + 1, response.text),
                self.choices.selected() == i,
            );
        }
    }

    fn render_result(&self, surface: &mut dyn RenderSurface) {
        let text = match self.last_exchange {
            Some(e) if e.boss_damage > 0.0 => format!(
                "Your words land ({:.0}). The Warden strikes back ({:.0}).",
                e.boss_damage, e.player_damage
            ),
            Some(e) => format!("The Warden is unmoved. You take {:.0}.", e.player_damage),
            None => String::new(),
        };
        ui::dialogue_box(surface, "", &text);
    }
}

impl Scene for BossScene {
    fn name(&self) -> &'static str {
        "boss"
    }

    fn init(&mut self, ctx: &mut SceneContext) {
        self.resolve = self.config.resolve;
        self.turn = 0;
        self.last_exchange = None;
        self.timers.cancel_all();
        self.enter(BossState::IntroDialogue);
        self.hero = Some(Hero::new(
            hero_sheet(ctx.assets()),
            HERO_START.0,
            HERO_START.1,
            self.config.player_size,
            self.config.attack_frame_duration,
        ));
        self.warden = Some(Npc::new(
            ctx.assets(),
            WARDEN_SHEET,
            &self.config.name,
            Rect::new(540.0, 180.0, 112.0, 160.0),
            Color::hex("#5b2c6f"),
        ));

        self.inbox.clear();
        let input = ctx.input();
        let mut subscriptions = vec![
            self.inbox.on_key(input, Key::Enter, BossInput::Confirm),
            self.inbox.on_key(input, Key::Up, BossInput::Up),
            self.inbox.on_key(input, Key::Down, BossInput::Down),
            self.inbox.on_key(input, Key::R, BossInput::Restart),
            self.inbox
                .on_click(input, |x, y| ui::choice_at(x, y, 3).map(BossInput::Click)),
        ];
        for (i, key) in Key::DIGITS.iter().enumerate().take(3) {
            subscriptions.push(self.inbox.on_key(input, *key, BossInput::Pick(i)));
        }
        self.subscriptions = subscriptions;
    }

    fn update(&mut self, dt: f32, keys: &KeySnapshot, ctx: &mut SceneContext) {
        for BossEvent::Settled(i) in self.timers.advance(dt) {
            self.buttons.settle();
            if self.state == BossState::PlayerChoice && self.choices.select(i) {
                self.answer(ctx);
            }
        }
        let inputs = self.inbox.drain();
        self.prompt.update(dt);
        if let Some(npc) = &mut self.warden {
            npc.tick(dt);
        }

        match self.state {
            BossState::IntroDialogue => self.update_script(&inputs, BossState::BossTalk),
            BossState::BossTalk => {
                if self.confirmed(&inputs) {
                    self.enter(BossState::PlayerChoice);
                }
            }
            BossState::PlayerChoice => self.update_choice(&inputs, ctx),
            BossState::Result => self.update_result(&inputs, ctx),
            BossState::VictoryDialogue => self.update_script(&inputs, BossState::FreeRoam),
            BossState::FreeRoam => self.update_free_roam(dt, keys),
            BossState::RaceTransition { elapsed } => {
                let elapsed = elapsed + dt;
                self.state = BossState::RaceTransition { elapsed };
                if elapsed >= self.config.race_transition {
                    ctx.next_scene();
                }
            }
            BossState::DefeatDialogue => self.update_script(&inputs, BossState::GameOver),
            BossState::GameOver => {
                if inputs.contains(&BossInput::Restart) {
                    log::info!("Retrying the boss");
                    ctx.reset_player_data();
                    ctx.restart_scene();
                }
            }
        }
    }

    fn render(&self, surface: &mut dyn RenderSurface) {
        ui::clear(surface, Color::hex("#120d16"));
        surface.fill_rect(Rect::new(0.0, 360.0, ui::SCREEN.w, 240.0), Color::hex("#2a1f2d"));
        for x in [80.0, 280.0, 480.0, 680.0] {
            surface.fill_rect(Rect::new(x, 60.0, 40.0, 300.0), Color::hex("#3d3042"));
        }

        let roaming = matches!(
            self.state,
            BossState::FreeRoam | BossState::RaceTransition { .. }
        );
        if roaming {
            let portal = self.config.portal_rect();
            surface.fill_rect(portal, Color::hex("#6c3bd1").with_alpha(0.8));
            surface.stroke_rect(portal, Color::hex("#c9b3ff"), 2.0);
        } else if let Some(npc) = &self.warden {
            RenderingSystem::draw(surface, npc);
            ui::bar(
                surface,
                Rect::new(250.0, 24.0, 300.0, 14.0),
                self.resolve / self.config.resolve,
                Color::hex("#b45fdb"),
            );
            surface.fill_text("Resolve", 180.0, 24.0, 14.0, ui::TEXT);
        }
        if let Some(hero) = &self.hero {
            RenderingSystem::draw(surface, hero);
        }

        match self.state {
            BossState::IntroDialogue => {
                if let Some(line) = self.cursor.line(&self.config.intro_lines) {
                    ui::dialogue_box(surface, &self.config.name, line);
                }
                self.render_prompt(surface);
            }
            BossState::BossTalk => {
                if let Some(turn) = self.config.turns.get(self.turn) {
                    ui::dialogue_box(surface, &self.config.name, &turn.boss_line);
                }
                self.render_prompt(surface);
            }
            BossState::PlayerChoice => self.render_choices(surface),
            BossState::Result => {
                self.render_result(surface);
                self.render_prompt(surface);
            }
            BossState::VictoryDialogue => {
                if let Some(line) = self.cursor.line(&self.config.victory_lines) {
                    ui::dialogue_box(surface, &self.config.name, line);
                }
                self.render_prompt(surface);
            }
            BossState::FreeRoam => {
                ui::centered_text(surface, "Walk into the portal", 40.0, 18.0, ui::TEXT);
            }
            BossState::RaceTransition { elapsed } => {
                ui::fade(surface, elapsed / self.config.race_transition);
            }
            BossState::DefeatDialogue => {
                if let Some(line) = self.cursor.line(&self.config.defeat_lines) {
                    ui::dialogue_box(surface, &self.config.name, line);
                }
                self.render_prompt(surface);
            }
            BossState::GameOver => {
                surface.fill_rect(ui::SCREEN, Color::BLACK.with_alpha(0.7));
                ui::centered_text(surface, "Defeated", 250.0, 36.0, Color::hex("#d9534f"));
                ui::centered_text(surface, "Press R to restart", 310.0, 18.0, ui::TEXT);
            }
        }
    }

    fn cleanup(&mut self) {
        self.timers.cancel_all();
        self.subscriptions.clear();
        self.inbox.clear();
        self.buttons = PressSettle::default();
        self.hero = None;
        self.warden = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BossTurn;
    use crate::scenes::testing::Harness;
    use tv_core::SceneRequest;

    fn one_turn(boss_damage: f32, player_damage: f32) -> BossConfig {
        BossConfig {
            turns: vec![BossTurn {
                boss_line: "Speak.".to_string(),
                responses: vec![
                    BossResponse {
                        text: "a".to_string(),
                        boss_damage,
                        player_damage,
                    },
                    BossResponse {
                        text: "b".to_string(),
                        boss_damage: 0.0,
                        player_damage: 0.0,
                    },
                ],
            }],
            ..BossConfig::default()
        }
    }

    fn started(config: BossConfig) -> (BossScene, Harness) {
        let mut scene = BossScene::new(config);
        let mut h = Harness::new();
        h.init(&mut scene);
        (scene, h)
    }

    /// Wait out the prompt cooldown and press Enter.
    fn confirm(scene: &mut BossScene, h: &mut Harness) -> Option<SceneRequest> {
        h.run(scene, 0.45, 0.05);
        h.tap(scene, Key::Enter)
    }

    fn to_choice(scene: &mut BossScene, h: &mut Harness) {
        for _ in 0..scene.config.intro_lines.len() {
            confirm(scene, h);
        }
        assert_eq!(scene.state, BossState::BossTalk);
        confirm(scene, h);
        assert_eq!(scene.state, BossState::PlayerChoice);
    }

    #[test]
    fn exchange_applies_stat_modifiers() {
        let player = PlayerData::default();
        let hit = Exchange::resolve(
            &BossResponse {
                text: String::new(),
                boss_damage: 25.0,
                player_damage: 5.0,
            },
            &player,
        );
        assert_eq!(hit.boss_damage, 27.0);
        assert_eq!(hit.player_damage, 4.0);

        let whiff = Exchange::resolve(
            &BossResponse {
                text: String::new(),
                boss_damage: 0.0,
                player_damage: 0.5,
            },
            &player,
        );
        assert_eq!(whiff.boss_damage, 0.0);
        assert_eq!(whiff.player_damage, 0.0);
    }

    #[test]
    fn a_turn_damages_both_sides() {
        let (mut scene, mut h) = started(one_turn(25.0, 5.0));
        to_choice(&mut scene, &mut h);
        confirm(&mut scene, &mut h);
        assert_eq!(scene.state, BossState::Result);
        assert_eq!(scene.resolve(), 73.0);
        assert_eq!(h.data.hp, 96.0);

        confirm(&mut scene, &mut h);
        assert_eq!(scene.state, BossState::BossTalk);
        assert_eq!(scene.turn, 0);
    }

    #[test]
    fn victory_leads_through_free_roam_to_next_scene() {
        let (mut scene, mut h) = started(one_turn(500.0, 0.0));
        to_choice(&mut scene, &mut h);
        confirm(&mut scene, &mut h);
        confirm(&mut scene, &mut h);
        assert_eq!(scene.state, BossState::VictoryDialogue);
        for _ in 0..scene.config.victory_lines.len() {
            confirm(&mut scene, &mut h);
        }
        assert_eq!(scene.state, BossState::FreeRoam);

        h.input.key_down(Key::Right);
        let reached = h.run(&mut scene, 10.0, 0.05);
        h.input.key_up(Key::Right);
        assert_eq!(reached, Some(SceneRequest::Next));
    }

    #[test]
    fn defeat_ends_in_game_over_and_restart() {
        let (mut scene, mut h) = started(one_turn(1.0, 500.0));
        to_choice(&mut scene, &mut h);
        confirm(&mut scene, &mut h);
        assert_eq!(h.data.hp, 0.0);
        confirm(&mut scene, &mut h);
        assert_eq!(scene.state, BossState::DefeatDialogue);
        for _ in 0..scene.config.defeat_lines.len() {
            confirm(&mut scene, &mut h);
        }
        assert_eq!(scene.state, BossState::GameOver);
        assert_eq!(h.tap(&mut scene, Key::R), Some(SceneRequest::Restart));
        assert_eq!(h.data.hp, 100.0);
    }

    #[test]
    fn second_response_by_digit() {
        let (mut scene, mut h) = started(one_turn(25.0, 5.0));
        to_choice(&mut scene, &mut h);
        h.tap(&mut scene, Key::Digit2);
        confirm(&mut scene, &mut h);
        assert_eq!(scene.resolve(), 100.0);
        assert_eq!(h.data.hp, 100.0);
    }

    #[test]
    fn turn_table_wraps() {
        let (mut scene, mut h) = started(BossConfig::default());
        to_choice(&mut scene, &mut h);
        let turns = scene.config.turns.len();
        for _ in 0..turns {
            // Second response: minimal boss damage, keeps the fight going.
            h.tap(&mut scene, Key::Digit2);
            confirm(&mut scene, &mut h);
            confirm(&mut scene, &mut h);
            confirm(&mut scene, &mut h);
        }
        assert_eq!(scene.turn, 0);
        assert_eq!(scene.state, BossState::PlayerChoice);
    }

    #[test]
    fn hero_size_comes_from_config() {
        let mut scene = BossScene::new(BossConfig {
            player_size: 30.0,
            ..BossConfig::default()
        });
        let mut h = Harness::new();
        h.init(&mut scene);
        assert_eq!(scene.hero.as_ref().map(|hero| hero.entity.width), Some(30.0));
    }
}
