//! Wave-based arena combat with an upgrade pick between waves.

use tv_core::{
    Color, Key, KeySnapshot, OneShot, PlayerData, PlayerDataPatch, PressSettle, Rect,
    RenderSurface, RenderingSystem, Scene, SceneContext, Subscription, TimerQueue,
};

use super::{ui, Inbox};
use crate::combat::{nearest_within, separate_enemies, spawn_ring};
use crate::config::CombatConfig;
use crate::enemy::Enemy;
use crate::hero::Hero;
use crate::sprites::{enemy_sheet, hero_sheet};

const SPECIAL_FLASH_SECS: f32 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq)]
enum CombatState {
    WaitingForWave { countdown: f32 },
    ActiveCombat,
    UpgradeMenu,
    AllWavesComplete { linger: f32 },
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upgrade {
    Strength,
    Endurance,
    Toxicity,
}

impl Upgrade {
    pub const ALL: [Upgrade; 3] = [Upgrade::Strength, Upgrade::Endurance, Upgrade::Toxicity];

    fn label(self) -> &'static str {
        match self {
            Upgrade::Strength => "1. Strength +5",
            Upgrade::Endurance => "2. Endurance +5, Max HP +10",
            Upgrade::Toxicity => "3. Toxicity +5, Max Mana +10",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum CombatEvent {
    SpecialReady,
    ApplyUpgrade(Upgrade),
}

/// Keys read as one-shots from the per-tick snapshot.
#[derive(Debug, Default)]
struct Triggers {
    attack: OneShot,
    special: OneShot,
    restart: OneShot,
    digits: [OneShot; 3],
}

#[derive(Debug, Default)]
struct Pressed {
    attack: bool,
    special: bool,
    restart: bool,
    digit: Option<usize>,
}

impl Triggers {
    fn read(&mut self, keys: &KeySnapshot) -> Pressed {
        let mut pressed = Pressed {
            attack: self.attack.trigger(keys.is_down(Key::Space)),
            special: self.special.trigger(keys.is_down(Key::Q)),
            restart: self.restart.trigger(keys.is_down(Key::R)),
            digit: None,
        };
        for (i, shot) in self.digits.iter_mut().enumerate() {
            if shot.trigger(keys.is_down(Key::DIGITS[i])) && pressed.digit.is_none() {
                pressed.digit = Some(i);
            }
        }
        pressed
    }

    /// Keys held while entering the scene must be released before they count.
    fn latch_all(&mut self) {
        self.attack.latch();
        self.special.latch();
        self.restart.latch();
        for shot in &mut self.digits {
            shot.latch();
        }
    }
}

pub fn upgrade_button_rect(index: usize) -> Rect {
    Rect::new(200.0, 220.0 + index as f32 * 70.0, 400.0, 54.0)
}

fn upgrade_button_at(x: f32, y: f32) -> Option<usize> {
    (0..Upgrade::ALL.len()).find(|&i| upgrade_button_rect(i).contains(x, y))
}

pub struct RoguelikeScene {
    config: CombatConfig,
    state: CombatState,
    hero: Option<Hero>,
    enemies: Vec<Enemy>,
    corpses: Vec<Enemy>,
    wave_index: usize,
    /// Next enemy (by index) to consider for an attack.
    enemy_turn: usize,
    enemy_attack_cooldown: f32,
    special_ready: bool,
    special_flash: f32,
    timers: TimerQueue<CombatEvent>,
    buttons: PressSettle,
    triggers: Triggers,
    clicks: Inbox<usize>,
    subscriptions: Vec<Subscription>,
}

impl RoguelikeScene {
    pub fn new(config: CombatConfig) -> Self {
        let countdown = config.wave_countdown;
        Self {
            config,
            state: CombatState::WaitingForWave { countdown },
            hero: None,
            enemies: Vec::new(),
            corpses: Vec::new(),
            wave_index: 0,
            enemy_turn: 0,
            enemy_attack_cooldown: 0.0,
            special_ready: true,
            special_flash: 0.0,
            timers: TimerQueue::new(),
            buttons: PressSettle::default(),
            triggers: Triggers::default(),
            clicks: Inbox::new(),
            subscriptions: Vec::new(),
        }
    }

    fn arena(&self) -> Rect {
        self.config.arena_rect()
    }

    fn hero_center(&self) -> (f32, f32) {
        self.hero
            .as_ref()
            .map(|h| h.entity.center())
            .unwrap_or_else(|| self.arena().center())
    }

    fn spawn_wave(&mut self, ctx: &mut SceneContext) {
        let Some(kinds) = self.config.waves.get(self.wave_index) else {
            return;
        };
        let arena = self.arena();
        let points = spawn_ring(kinds.len(), arena.center(), self.config.spawn_radius);
        self.enemies = kinds
            .iter()
            .zip(points)
            .map(|(&kind, (x, y))| {
                let stats = self.config.enemies.stats(kind);
                let mut enemy = Enemy::new(kind, stats, enemy_sheet(ctx.assets(), kind), x, y);
                enemy.entity.clamp_to(arena);
                enemy
            })
            .collect();
        self.enemy_turn = 0;
        self.enemy_attack_cooldown = self.config.enemy_attack_cooldown;
        log::info!(
            "Wave {}/{} started with {} enemies",
            self.wave_index + 1,
            self.config.waves.len(),
            self.enemies.len()
        );
        self.state = CombatState::ActiveCombat;
    }

    fn update_waiting(
        &mut self,
        dt: f32,
        keys: &KeySnapshot,
        countdown: f32,
        ctx: &mut SceneContext,
    ) {
        self.move_hero(dt, keys);
        let countdown = countdown - dt;
        if countdown <= 0.0 {
            self.spawn_wave(ctx);
        } else {
            self.state = CombatState::WaitingForWave { countdown };
        }
    }

    fn update_combat(
        &mut self,
        dt: f32,
        keys: &KeySnapshot,
        pressed: &Pressed,
        ctx: &mut SceneContext,
    ) {
        let player = ctx.player_data();
        ctx.set_player_data(player.with_mana_regen(self.config.mana_regen * dt));

        if let Some(hero) = self.hero.as_mut().filter(|h| h.is_dying()) {
            hero.tick(dt, self.config.attack_hit_frame);
            if hero.death_finished() {
                log::info!("Player fell on wave {}", self.wave_index + 1);
                self.state = CombatState::GameOver;
            }
            for enemy in &mut self.enemies {
                enemy.tick(dt);
            }
            return;
        }

        self.move_hero(dt, keys);
        if pressed.attack {
            if let Some(hero) = &mut self.hero {
                hero.start_attack();
            }
        }
        if pressed.special {
            self.try_special(ctx);
        }
        let connected = match &mut self.hero {
            Some(hero) => hero.tick(dt, self.config.attack_hit_frame),
            None => false,
        };
        if connected {
            self.melee_hit(ctx.player_data());
        }

        let target = self.hero_center();
        let stop = self.config.enemy_attack_range * 0.8;
        for enemy in &mut self.enemies {
            enemy.chase(target, stop, dt);
        }
        let arena = self.arena();
        separate_enemies(&mut self.enemies, arena);
        for enemy in &mut self.enemies {
            enemy.tick(dt);
        }

        self.enemy_attacks(dt, ctx);
        if ctx.player_data().is_dead() {
            if let Some(hero) = &mut self.hero {
                hero.die();
            }
        }

        self.evict_dead();

        if self.enemies.is_empty() && !self.hero.as_ref().is_some_and(Hero::is_dying) {
            if self.wave_index + 1 < self.config.waves.len() {
                log::info!("Wave {} cleared", self.wave_index + 1);
                self.buttons = PressSettle::default();
                self.state = CombatState::UpgradeMenu;
            } else {
                log::info!("All waves cleared");
                self.state = CombatState::AllWavesComplete {
                    linger: self.config.completion_linger,
                };
            }
        }
    }

    fn move_hero(&mut self, dt: f32, keys: &KeySnapshot) {
        let arena = self.arena();
        if let Some(hero) = &mut self.hero {
            hero.walk(keys.movement_axis(), self.config.player_speed, dt, arena);
        }
    }

    fn melee_hit(&mut self, player: PlayerData) {
        let center = self.hero_center();
        if let Some(i) = nearest_within(&self.enemies, center, self.config.melee_radius) {
            self.enemies[i].take_damage(player.strength);
        }
    }

    fn try_special(&mut self, ctx: &mut SceneContext) {
        if !self.special_ready {
            return;
        }
        let player = ctx.player_data();
        let Some(patch) = player.with_mana_spent(self.config.special_cost) else {
            log::debug!("Special ignored: not enough mana");
            return;
        };
        ctx.set_player_data(patch);
        self.special_ready = false;
        self.special_flash = SPECIAL_FLASH_SECS;
        self.timers
            .schedule(self.config.special_cooldown, CombatEvent::SpecialReady);

        let center = self.hero_center();
        if let Some(i) = nearest_within(&self.enemies, center, self.config.special_radius) {
            self.enemies[i].take_damage(2.0 * player.strength + player.toxicity);
        }
    }

    /// Round-robin: once the shared cooldown has elapsed, the first live enemy
    /// in range, starting from the one after the last attacker, strikes.
    fn enemy_attacks(&mut self, dt: f32, ctx: &mut SceneContext) {
        self.enemy_attack_cooldown = (self.enemy_attack_cooldown - dt).max(0.0);
        if self.enemy_attack_cooldown > 0.0 || self.enemies.is_empty() {
            return;
        }
        let Some(hero) = &self.hero else {
            return;
        };
        let n = self.enemies.len();
        for k in 0..n {
            let i = (self.enemy_turn + k) % n;
            let enemy = &mut self.enemies[i];
            let in_range =
                enemy.entity.distance_to(&hero.entity) <= self.config.enemy_attack_range;
            if !enemy.is_alive() || !in_range {
                continue;
            }
            enemy.start_attack();
            let player = ctx.player_data();
            ctx.set_player_data(player.damaged(enemy.stats.damage));
            log::debug!("{:?} enemy hit for {}", enemy.kind, enemy.stats.damage);
            self.enemy_turn = (i + 1) % n;
            self.enemy_attack_cooldown = self.config.enemy_attack_cooldown;
            return;
        }
    }

    fn evict_dead(&mut self) {
        let before = self.enemies.len();
        let mut i = 0;
        while i < self.enemies.len() {
            if self.enemies[i].is_alive() {
                i += 1;
            } else {
                self.corpses.push(self.enemies.remove(i));
                if self.enemy_turn > i {
                    self.enemy_turn -= 1;
                }
            }
        }
        if self.enemies.len() != before && !self.enemies.is_empty() {
            self.enemy_turn %= self.enemies.len();
        }
    }

    fn update_upgrade_menu(
        &mut self,
        pressed: &Pressed,
        clicks: &[usize],
        ctx: &mut SceneContext,
    ) {
        if let Some(i) = pressed.digit {
            self.buttons.cancel(&mut self.timers);
            self.apply_upgrade(Upgrade::ALL[i], ctx);
            return;
        }
        if let Some(&i) = clicks.first() {
            self.buttons
                .press(i, &mut self.timers, CombatEvent::ApplyUpgrade(Upgrade::ALL[i]));
        }
    }

    fn apply_upgrade(&mut self, upgrade: Upgrade, ctx: &mut SceneContext) {
        if self.state != CombatState::UpgradeMenu {
            return;
        }
        let p = ctx.player_data();
        let step = &self.config.upgrades;
        let patch = match upgrade {
            Upgrade::Strength => PlayerDataPatch {
                strength: Some(p.strength + step.strength),
                ..Default::default()
            },
            Upgrade::Endurance => {
                let raised = PlayerData {
                    max_hp: p.max_hp + step.endurance_max_hp,
                    ..p
                };
                PlayerDataPatch {
                    endurance: Some(p.endurance + step.endurance),
                    max_hp: Some(raised.max_hp),
                    ..Default::default()
                }
                .merge(raised.healed(step.endurance_max_hp))
            }
            Upgrade::Toxicity => PlayerDataPatch {
                toxicity: Some(p.toxicity + step.toxicity),
                max_mana: Some(p.max_mana + step.toxicity_max_mana),
                ..Default::default()
            },
        };
        ctx.set_player_data(patch);
        log::info!("Upgrade chosen: {upgrade:?}");

        self.wave_index += 1;
        self.state = if self.wave_index < self.config.waves.len() {
            CombatState::WaitingForWave {
                countdown: self.config.wave_countdown,
            }
        } else {
            CombatState::AllWavesComplete {
                linger: self.config.completion_linger,
            }
        };
    }

    fn update_complete(
        &mut self,
        dt: f32,
        keys: &KeySnapshot,
        linger: f32,
        ctx: &mut SceneContext,
    ) {
        self.move_hero(dt, keys);
        let linger = linger - dt;
        self.state = CombatState::AllWavesComplete { linger };
        if linger <= 0.0 {
            ctx.next_scene();
        }
    }

    fn update_game_over(&mut self, pressed: &Pressed, ctx: &mut SceneContext) {
        if pressed.restart {
            log::info!("Restarting combat");
            ctx.reset_player_data();
            ctx.restart_scene();
        }
    }

    fn tick_corpses(&mut self, dt: f32) {
        for corpse in &mut self.corpses {
            corpse.tick(dt);
        }
        self.corpses.retain(|c| !c.death_finished());
    }

    fn render_arena(&self, surface: &mut dyn RenderSurface) {
        ui::clear(surface, Color::hex("#14110f"));
        let arena = self.arena();
        surface.fill_rect(arena, Color::hex("#3a3226"));
        surface.stroke_rect(arena, Color::hex("#6b5b45"), 3.0);
    }

    fn render_actors(&self, surface: &mut dyn RenderSurface) {
        for corpse in &self.corpses {
            surface.save();
            surface.set_alpha(corpse.corpse_alpha());
            RenderingSystem::draw(surface, corpse);
            surface.restore();
        }
        for enemy in &self.enemies {
            RenderingSystem::draw(surface, enemy);
            let b = enemy.entity.bounds();
            ui::bar(
                surface,
                Rect::new(b.x, b.y - 8.0, b.w, 4.0),
                enemy.hp_fraction(),
                Color::hex("#d9534f"),
            );
        }
        if let Some(hero) = &self.hero {
            RenderingSystem::draw(surface, hero);
            if self.special_flash > 0.0 {
                let (cx, cy) = hero.entity.center();
                let alpha = self.special_flash / SPECIAL_FLASH_SECS;
                surface.stroke_circle(
                    cx,
                    cy,
                    self.config.special_radius,
                    Color::hex("#7fd34e").with_alpha(alpha),
                    3.0,
                );
            }
        }
    }

    fn render_upgrade_menu(&self, surface: &mut dyn RenderSurface) {
        surface.fill_rect(ui::SCREEN, Color::BLACK.with_alpha(0.5));
        ui::centered_text(surface, "Choose an upgrade", 170.0, 24.0, ui::ACCENT);
        for (i, upgrade) in Upgrade::ALL.iter().enumerate() {
            let rect = self.buttons.button_rect(i, upgrade_button_rect(i));
            ui::button(surface, rect, upgrade.label(), self.buttons.pressed() == Some(i));
        }
    }

    fn render_status(&self, surface: &mut dyn RenderSurface) {
        let waves = self.config.waves.len();
        let wave = (self.wave_index + 1).min(waves);
        surface.fill_text(&format!("Wave {wave}/{waves}"), 60.0, 20.0, 16.0, ui::TEXT);
        let special = if self.special_ready { "Q: special ready" } else { "Q: recharging" };
        surface.fill_text(special, 600.0, 20.0, 14.0, ui::TEXT.with_alpha(0.8));
    }
}

impl Scene for RoguelikeScene {
    fn name(&self) -> &'static str {
        "roguelike"
    }

    fn init(&mut self, ctx: &mut SceneContext) {
        let (cx, cy) = self.arena().center();
        self.hero = Some(Hero::new(
            hero_sheet(ctx.assets()),
            cx,
            cy,
            self.config.player_size,
            self.config.attack_frame_duration,
        ));
        for kinds in &self.config.waves {
            for &kind in kinds {
                enemy_sheet(ctx.assets(), kind);
            }
        }
        self.enemies.clear();
        self.corpses.clear();
        self.wave_index = 0;
        self.enemy_turn = 0;
        self.enemy_attack_cooldown = 0.0;
        self.special_ready = true;
        self.special_flash = 0.0;
        self.timers.cancel_all();
        self.buttons = PressSettle::default();
        self.triggers = Triggers::default();
        self.triggers.latch_all();
        self.clicks.clear();
        self.state = CombatState::WaitingForWave {
            countdown: self.config.wave_countdown,
        };
        self.subscriptions = vec![self.clicks.on_click(ctx.input(), upgrade_button_at)];
        log::info!("Combat arena ready: {} waves", self.config.waves.len());
    }

    fn update(&mut self, dt: f32, keys: &KeySnapshot, ctx: &mut SceneContext) {
        for event in self.timers.advance(dt) {
            match event {
                CombatEvent::SpecialReady => self.special_ready = true,
                CombatEvent::ApplyUpgrade(upgrade) => {
                    self.buttons.settle();
                    self.apply_upgrade(upgrade, ctx);
                }
            }
        }
        let clicks = self.clicks.drain();
        let pressed = self.triggers.read(keys);
        self.special_flash = (self.special_flash - dt).max(0.0);
        self.tick_corpses(dt);

        match self.state {
            CombatState::WaitingForWave { countdown } => {
                self.update_waiting(dt, keys, countdown, ctx)
            }
            CombatState::ActiveCombat => self.update_combat(dt, keys, &pressed, ctx),
            CombatState::UpgradeMenu => self.update_upgrade_menu(&pressed, &clicks, ctx),
            CombatState::AllWavesComplete { linger } => {
                self.update_complete(dt, keys, linger, ctx)
            }
            CombatState::GameOver => self.update_game_over(&pressed, ctx),
        }
    }

    fn render(&self, surface: &mut dyn RenderSurface) {
        self.render_arena(surface);
        self.render_actors(surface);
        self.render_status(surface);

        match self.state {
            CombatState::WaitingForWave { countdown } => {
                let title = format!("Wave {}", self.wave_index + 1);
                ui::centered_text(surface, &title, 250.0, 32.0, ui::ACCENT);
                let seconds = format!("{:.0}", countdown.ceil());
                ui::centered_text(surface, &seconds, 300.0, 24.0, ui::TEXT);
            }
            CombatState::ActiveCombat => {
                let left = format!("Enemies: {}", self.enemies.len());
                surface.fill_text(&left, 340.0, 20.0, 16.0, ui::TEXT);
            }
            CombatState::UpgradeMenu => self.render_upgrade_menu(surface),
            CombatState::AllWavesComplete { .. } => {
                ui::centered_text(surface, "The arena falls silent.", 260.0, 28.0, ui::ACCENT);
            }
            CombatState::GameOver => {
                surface.fill_rect(ui::SCREEN, Color::BLACK.with_alpha(0.6));
                ui::centered_text(surface, "You died", 250.0, 36.0, Color::hex("#d9534f"));
                ui::centered_text(surface, "Press R to restart", 310.0, 18.0, ui::TEXT);
            }
        }
    }

    fn cleanup(&mut self) {
        self.timers.cancel_all();
        self.subscriptions.clear();
        self.clicks.clear();
        self.enemies.clear();
        self.corpses.clear();
        self.hero = None;
        self.buttons = PressSettle::default();
    }
}
