//! Three-lane runner: dodge until the clock runs out.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tv_core::{
    Color, ContinuePrompt, Entity, Key, KeySnapshot, OneShot, Rect, RenderSurface,
    RenderingSystem, Scene, SceneContext, Subscription, BASE_HEIGHT, BASE_WIDTH,
};

use super::{ui, Inbox};
use crate::config::RaceConfig;
use crate::hero::Hero;
use crate::sprites::hero_sheet;

const CONFETTI_COLORS: [&str; 5] = ["#f4d35e", "#ee6c4d", "#3bceac", "#a06cd5", "#f7f7ff"];

#[derive(Debug, Clone, Copy, PartialEq)]
enum RaceState {
    Countdown { remaining: f32 },
    Racing { elapsed: f32 },
    Victory,
    GameOver,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RaceInput {
    Confirm,
    Restart,
}

#[derive(Debug, Clone, Copy)]
struct Particle {
    x: f32,
    y: f32,
    vx: f32,
    vy: f32,
    size: f32,
    color: Color,
}

fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}

pub struct RaceScene {
    config: RaceConfig,
    state: RaceState,
    rng: StdRng,
    lane: usize,
    hero: Option<Hero>,
    obstacles: Vec<Entity>,
    next_spawn: f32,
    confetti: Vec<Particle>,
    up: OneShot,
    down: OneShot,
    prompt: ContinuePrompt,
    inbox: Inbox<RaceInput>,
    subscriptions: Vec<Subscription>,
}

impl RaceScene {
    pub fn new(config: RaceConfig) -> Self {
        let rng = make_rng(config.seed);
        let lane = config.lanes.len() / 2;
        Self {
            state: RaceState::Countdown {
                remaining: config.countdown,
            },
            rng,
            lane,
            hero: None,
            obstacles: Vec::new(),
            next_spawn: 0.0,
            confetti: Vec::new(),
            up: OneShot::default(),
            down: OneShot::default(),
            prompt: ContinuePrompt::new(),
            inbox: Inbox::new(),
            subscriptions: Vec::new(),
            config,
        }
    }

    /// Scroll speed after `elapsed` seconds of racing.
    pub fn speed_at(&self, elapsed: f32) -> f32 {
        self.config.base_speed + self.config.speed_growth * elapsed
    }

    fn lane_y(&self, lane: usize) -> f32 {
        self.config
            .lanes
            .get(lane)
            .copied()
            .unwrap_or(BASE_HEIGHT * 0.5)
    }

    fn roll_interval(&mut self) -> f32 {
        let (min, max) = (self.config.spawn_interval_min, self.config.spawn_interval_max);
        if max > min {
            self.rng.gen_range(min..max)
        } else {
            min
        }
    }

    fn spawn_obstacle(&mut self) {
        let lanes = self.config.lanes.len();
        if lanes == 0 {
            return;
        }
        let lane = self.rng.gen_range(0..lanes);
        let size = self.config.obstacle_size;
        let y = self.lane_y(lane) - size * 0.5;
        self.obstacles.push(Entity::new(BASE_WIDTH, y, size, size));
        log::trace!("Obstacle in lane {lane}");
    }

    fn spawn_confetti(&mut self) {
        self.confetti = (0..self.config.confetti_count)
            .map(|i| Particle {
                x: self.rng.gen_range(0.0..BASE_WIDTH),
                y: self.rng.gen_range(-BASE_HEIGHT * 0.5..0.0),
                vx: self.rng.gen_range(-40.0..40.0),
                vy: self.rng.gen_range(0.0..60.0),
                size: self.rng.gen_range(4.0..9.0),
                color: Color::hex(CONFETTI_COLORS[i % CONFETTI_COLORS.len()]),
            })
            .collect();
    }

    fn steer(&mut self, dt: f32, keys: &KeySnapshot) {
        let last = self.config.lanes.len().saturating_sub(1);
        if self.up.trigger(keys.is_down(Key::Up) || keys.is_down(Key::W)) {
            self.lane = self.lane.saturating_sub(1);
        }
        if self.down.trigger(keys.is_down(Key::Down) || keys.is_down(Key::S)) {
            self.lane = (self.lane + 1).min(last);
        }

        let target = self.lane_y(self.lane);
        let blend = (self.config.lane_smoothing * dt).min(1.0);
        if let Some(hero) = &mut self.hero {
            let (cx, cy) = hero.entity.center();
            hero.entity.set_center(cx, cy + (target - cy) * blend);
            // Run in place; the road scrolls.
            hero.walk((1.0, 0.0), 0.0, dt, ui::SCREEN);
            hero.tick(dt, usize::MAX);
        }
    }

    fn update_countdown(&mut self, dt: f32, remaining: f32) {
        let remaining = remaining - dt;
        if remaining <= 0.0 {
            log::info!("Race started");
            self.next_spawn = self.roll_interval();
            self.state = RaceState::Racing { elapsed: 0.0 };
        } else {
            self.state = RaceState::Countdown { remaining };
        }
    }

    fn update_racing(&mut self, dt: f32, elapsed: f32, keys: &KeySnapshot) {
        let elapsed = elapsed + dt;
        self.steer(dt, keys);

        self.next_spawn -= dt;
        if self.next_spawn <= 0.0 {
            self.spawn_obstacle();
            self.next_spawn = self.roll_interval();
        }

        let dx = -self.speed_at(elapsed) * dt;
        for obstacle in &mut self.obstacles {
            obstacle.x += dx;
        }
        self.obstacles.retain(|o| o.bounds().right() > 0.0);

        let hit = self.hero.as_ref().is_some_and(|hero| {
            let bounds = hero.entity.bounds();
            self.obstacles.iter().any(|o| o.bounds().intersects(&bounds))
        });
        if hit {
            log::info!("Crashed after {elapsed:.1}s");
            self.state = RaceState::GameOver;
        } else if elapsed >= self.config.duration {
            log::info!("Race survived");
            self.spawn_confetti();
            self.prompt.reset();
            self.state = RaceState::Victory;
        } else {
            self.state = RaceState::Racing { elapsed };
        }
    }

    fn update_confetti(&mut self, dt: f32) {
        let gravity = self.config.gravity;
        for p in &mut self.confetti {
            p.vy += gravity * dt;
            p.x += p.vx * dt;
            p.y += p.vy * dt;
            if p.y > BASE_HEIGHT {
                p.y -= BASE_HEIGHT + 20.0;
                p.vy = 0.0;
            }
        }
    }

    fn render_road(&self, surface: &mut dyn RenderSurface) {
        ui::clear(surface, Color::hex("#3a5a40"));
        let half = self.config.obstacle_size;
        let top = self.config.lanes.first().copied().unwrap_or(250.0) - half;
        let bottom = self.config.lanes.last().copied().unwrap_or(450.0) + half;
        surface.fill_rect(Rect::new(0.0, top, BASE_WIDTH, bottom - top), Color::hex("#6b5b4b"));
        for pair in self.config.lanes.windows(2) {
            let y = (pair[0] + pair[1]) * 0.5;
            surface.fill_rect(Rect::new(0.0, y - 1.0, BASE_WIDTH, 2.0), ui::TEXT.with_alpha(0.35));
        }
    }
}

impl Scene for RaceScene {
    fn name(&self) -> &'static str {
        "race"
    }

    fn init(&mut self, ctx: &mut SceneContext) {
        self.rng = make_rng(self.config.seed);
        self.state = RaceState::Countdown {
            remaining: self.config.countdown,
        };
        self.lane = self.config.lanes.len() / 2;
        self.obstacles.clear();
        self.confetti.clear();
        self.up.latch();
        self.down.latch();
        self.prompt.reset();
        self.hero = Some(Hero::new(
            hero_sheet(ctx.assets()),
            self.config.player_x,
            self.lane_y(self.lane),
            self.config.player_size,
            self.config.attack_frame_duration,
        ));

        self.inbox.clear();
        self.subscriptions = vec![
            self.inbox.on_key(ctx.input(), Key::Enter, RaceInput::Confirm),
            self.inbox.on_key(ctx.input(), Key::R, RaceInput::Restart),
        ];
    }

    fn update(&mut self, dt: f32, keys: &KeySnapshot, ctx: &mut SceneContext) {
        let inputs = self.inbox.drain();
        self.prompt.update(dt);

        match self.state {
            RaceState::Countdown { remaining } => {
                // Let the one-shots track releases so a held key is not a switch.
                self.up.trigger(keys.is_down(Key::Up) || keys.is_down(Key::W));
                self.down.trigger(keys.is_down(Key::Down) || keys.is_down(Key::S));
                self.update_countdown(dt, remaining);
            }
            RaceState::Racing { elapsed } => self.update_racing(dt, elapsed, keys),
            RaceState::Victory => {
                self.update_confetti(dt);
                if inputs.contains(&RaceInput::Confirm) && self.prompt.is_ready() {
                    log::info!("Playing again from the start");
                    ctx.reset_player_data();
                    ctx.set_scene(0);
                }
            }
            RaceState::GameOver => {
                if inputs.contains(&RaceInput::Restart) {
                    log::info!("Retrying the race");
                    ctx.reset_player_data();
                    ctx.restart_scene();
                }
            }
        }
    }

    fn render(&self, surface: &mut dyn RenderSurface) {
        self.render_road(surface);
        for obstacle in &self.obstacles {
            let b = obstacle.bounds();
            surface.fill_rect(b, Color::hex("#8d6e63"));
            surface.stroke_rect(b, Color::hex("#4e342e"), 2.0);
        }
        if let Some(hero) = &self.hero {
            RenderingSystem::draw(surface, hero);
        }

        match self.state {
            RaceState::Countdown { remaining } => {
                let shown = remaining.ceil().max(1.0) as u32;
                ui::centered_text(surface, &shown.to_string(), 120.0, 48.0, ui::ACCENT);
            }
            RaceState::Racing { elapsed } => {
                let left = (self.config.duration - elapsed).max(0.0);
                surface.fill_text(&format!("Time: {left:.1}s"), 20.0, 20.0, 18.0, ui::TEXT);
                if elapsed < 0.5 {
                    ui::centered_text(surface, "GO!", 120.0, 48.0, ui::ACCENT);
                }
            }
            RaceState::Victory => {
                for p in &self.confetti {
                    surface.fill_rect(Rect::new(p.x, p.y, p.size, p.size * 0.6), p.color);
                }
                ui::centered_text(surface, "You escaped the Thornveil!", 200.0, 32.0, ui::ACCENT);
                if self.prompt.is_visible() {
                    ui::centered_text(surface, "Press Enter to play again", 260.0, 18.0, ui::TEXT);
                }
            }
            RaceState::GameOver => {
                surface.fill_rect(ui::SCREEN, Color::BLACK.with_alpha(0.7));
                ui::centered_text(surface, "Crashed", 250.0, 36.0, Color::hex("#d9534f"));
                ui::centered_text(surface, "Press R to restart", 310.0, 18.0, ui::TEXT);
            }
        }
    }

    fn cleanup(&mut self) {
        self.subscriptions.clear();
        self.inbox.clear();
        self.obstacles.clear();
        self.confetti.clear();
        self.hero = None;
    }
}
