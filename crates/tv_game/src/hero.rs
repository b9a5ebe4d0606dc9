//! The player character: movement, facing, and the melee swing clip.

use tv_core::{Animation, Color, Entity, Rect, Renderable, SpriteSheet};

use crate::sprites::{hero_clips, HeroClips};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeroAction {
    Idle,
    Walk,
    Attack,
    Death,
}

#[derive(Debug, Clone)]
pub struct Hero {
    pub entity: Entity,
    sheet: SpriteSheet,
    idle: Animation,
    walk: Animation,
    attack: Animation,
    death: Animation,
    action: HeroAction,
    /// Set once the current swing has dealt its damage.
    damage_applied: bool,
}

impl Hero {
    pub fn new(
        sheet: SpriteSheet,
        cx: f32,
        cy: f32,
        size: f32,
        attack_frame_duration: f32,
    ) -> Self {
        let HeroClips {
            idle,
            walk,
            attack,
            death,
        } = hero_clips(attack_frame_duration);
        let mut hero = Self {
            entity: Entity::centered_at(cx, cy, size, size),
            sheet,
            idle: Animation::from_def(&idle),
            walk: Animation::from_def(&walk),
            attack: Animation::from_def(&attack),
            death: Animation::from_def(&death),
            action: HeroAction::Idle,
            damage_applied: false,
        };
        hero.idle.play();
        hero
    }

    pub fn action(&self) -> HeroAction {
        self.action
    }

    pub fn is_attacking(&self) -> bool {
        self.action == HeroAction::Attack
    }

    pub fn is_dying(&self) -> bool {
        self.action == HeroAction::Death
    }

    pub fn death_finished(&self) -> bool {
        self.is_dying() && self.death.is_finished()
    }

    /// Walk along `axis` (each component in -1..=1), kept inside `bounds`.
    /// Ignored mid-swing and while dying.
    pub fn walk(&mut self, axis: (f32, f32), speed: f32, dt: f32, bounds: Rect) {
        if matches!(self.action, HeroAction::Attack | HeroAction::Death) {
            return;
        }
        let (mut ax, mut ay) = axis;
        let len = (ax * ax + ay * ay).sqrt();
        if len > 0.0 {
            ax /= len;
            ay /= len;
            self.entity.translate(ax * speed * dt, ay * speed * dt);
            self.entity.clamp_to(bounds);
            self.switch(HeroAction::Walk);
        } else {
            self.switch(HeroAction::Idle);
        }
    }

    /// Begin a swing. Returns `false` if already swinging or dying.
    pub fn start_attack(&mut self) -> bool {
        if matches!(self.action, HeroAction::Attack | HeroAction::Death) {
            return false;
        }
        self.damage_applied = false;
        self.switch(HeroAction::Attack);
        true
    }

    pub fn die(&mut self) {
        if !self.is_dying() {
            self.switch(HeroAction::Death);
            self.entity.is_alive = false;
        }
    }

    /// Advance the active clip. Returns `true` on the tick the swing reaches
    /// `hit_frame`; at most once per swing, even if a long tick skips past it.
    pub fn tick(&mut self, dt: f32, hit_frame: usize) -> bool {
        let mut connected = false;
        match self.action {
            HeroAction::Idle => self.idle.update(dt),
            HeroAction::Walk => self.walk.update(dt),
            HeroAction::Death => self.death.update(dt),
            HeroAction::Attack => {
                self.attack.update(dt);
                if !self.damage_applied && self.attack.current_frame() >= hit_frame {
                    self.damage_applied = true;
                    connected = true;
                }
                if self.attack.is_finished() {
                    self.switch(HeroAction::Idle);
                }
            }
        }
        connected
    }

    fn switch(&mut self, action: HeroAction) {
        if self.action == action && action != HeroAction::Attack {
            return;
        }
        self.action = action;
        match action {
            HeroAction::Idle => self.idle.play(),
            HeroAction::Walk => self.walk.play(),
            HeroAction::Attack => self.attack.play(),
            HeroAction::Death => self.death.play(),
        }
    }
}

impl Renderable for Hero {
    fn bounds(&self) -> Rect {
        self.entity.bounds()
    }

    fn sprite_sheet(&self) -> Option<&SpriteSheet> {
        Some(&self.sheet)
    }

    fn current_animation(&self) -> Option<&Animation> {
        Some(match self.action {
            HeroAction::Idle => &self.idle,
            HeroAction::Walk => &self.walk,
            HeroAction::Attack => &self.attack,
            HeroAction::Death => &self.death,
        })
    }

    fn should_flip_x(&self) -> bool {
        self.entity.faces_left()
    }

    fn placeholder_color(&self) -> Color {
        if self.is_attacking() {
            Color::hex("#f2d16b")
        } else {
            Color::hex("#4f8fd6")
        }
    }
}
