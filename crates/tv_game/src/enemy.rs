use tv_core::{Animation, Color, Entity, Rect, Renderable, SpriteSheet};

use crate::config::{EnemyKind, EnemyStats};
use crate::sprites::{enemy_clips, EnemyClips};

const HURT_FLASH_SECS: f32 = 0.15;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnemyAction {
    Walk,
    Attack,
    Death,
}

#[derive(Debug, Clone)]
pub struct Enemy {
    pub entity: Entity,
    pub kind: EnemyKind,
    pub stats: EnemyStats,
    pub hp: f32,
    sheet: SpriteSheet,
    walk: Animation,
    attack: Animation,
    death: Animation,
    action: EnemyAction,
    hurt_flash: f32,
}

impl Enemy {
    pub fn new(kind: EnemyKind, stats: EnemyStats, sheet: SpriteSheet, cx: f32, cy: f32) -> Self {
        let EnemyClips {
            walk,
            attack,
            death,
        } = enemy_clips();
        let mut enemy = Self {
            entity: Entity::centered_at(cx, cy, stats.size, stats.size),
            kind,
            stats,
            hp: stats.hp,
            sheet,
            walk: Animation::from_def(&walk),
            attack: Animation::from_def(&attack),
            death: Animation::from_def(&death),
            action: EnemyAction::Walk,
            hurt_flash: 0.0,
        };
        enemy.walk.play();
        enemy
    }

    pub fn is_alive(&self) -> bool {
        self.entity.is_alive
    }

    pub fn action(&self) -> EnemyAction {
        self.action
    }

    /// Apply a hit. Returns `true` if this hit killed the enemy.
    pub fn take_damage(&mut self, amount: f32) -> bool {
        if !self.is_alive() {
            return false;
        }
        self.hp = (self.hp - amount).max(0.0);
        self.hurt_flash = HURT_FLASH_SECS;
        if self.hp <= 0.0 {
            self.entity.is_alive = false;
            self.action = EnemyAction::Death;
            self.death.play();
            log::debug!("{:?} enemy died", self.kind);
            return true;
        }
        false
    }

    /// Step toward `target` unless already within `stop_distance` of it.
    pub fn chase(&mut self, target: (f32, f32), stop_distance: f32, dt: f32) {
        if !self.is_alive() {
            return;
        }
        let (cx, cy) = self.entity.center();
        let (dx, dy) = (target.0 - cx, target.1 - cy);
        let dist = (dx * dx + dy * dy).sqrt();
        if dist <= stop_distance || dist == 0.0 {
            return;
        }
        let step = (self.stats.speed * dt).min(dist - stop_distance);
        self.entity.translate(dx / dist * step, dy / dist * step);
    }

    pub fn start_attack(&mut self) {
        if self.is_alive() {
            self.action = EnemyAction::Attack;
            self.attack.play();
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.hurt_flash = (self.hurt_flash - dt).max(0.0);
        match self.action {
            EnemyAction::Walk => self.walk.update(dt),
            EnemyAction::Death => self.death.update(dt),
            EnemyAction::Attack => {
                self.attack.update(dt);
                if self.attack.is_finished() {
                    self.action = EnemyAction::Walk;
                    self.walk.play();
                }
            }
        }
    }

    pub fn death_finished(&self) -> bool {
        self.action == EnemyAction::Death && self.death.is_finished()
    }

    /// Remaining fade for the corpse, 1.0 fresh to 0.0 gone.
    pub fn corpse_alpha(&self) -> f32 {
        let total = self.death.total_duration();
        if total <= 0.0 || self.death.is_finished() {
            return 0.0;
        }
        let elapsed = self.death.current_frame() as f32 * total / self.death.frame_count() as f32;
        (1.0 - elapsed / total).clamp(0.0, 1.0)
    }

    pub fn hp_fraction(&self) -> f32 {
        if self.stats.hp > 0.0 {
            self.hp / self.stats.hp
        } else {
            0.0
        }
    }
}

impl Renderable for Enemy {
    fn bounds(&self) -> Rect {
        self.entity.bounds()
    }

    fn sprite_sheet(&self) -> Option<&SpriteSheet> {
        Some(&self.sheet)
    }

    fn current_animation(&self) -> Option<&Animation> {
        Some(match self.action {
            EnemyAction::Walk => &self.walk,
            EnemyAction::Attack => &self.attack,
            EnemyAction::Death => &self.death,
        })
    }

    fn should_flip_x(&self) -> bool {
        self.entity.faces_left()
    }

    fn placeholder_color(&self) -> Color {
        if self.hurt_flash > 0.0 {
            return Color::WHITE;
        }
        match self.kind {
            EnemyKind::Weak => Color::hex("#6aa84f"),
            EnemyKind::Normal => Color::hex("#c27c0e"),
            EnemyKind::Strong => Color::hex("#a61c1c"),
        }
    }
}
