//! Sprite sheet paths and clip tables.
//!
//! Frame indices are absolute positions on each sheet (row-major). Sheets that
//! have not loaded yet draw as solid placeholders.

use tv_core::{AnimationDef, AssetLoader, SpriteSheet};

use crate::config::{EnemyKind, ATTACK_FRAME_COUNT};

pub const HERO_SHEET: &str = "assets/sprites/hero.png";
pub const WEAK_SHEET: &str = "assets/sprites/enemy_weak.png";
pub const NORMAL_SHEET: &str = "assets/sprites/enemy_normal.png";
pub const STRONG_SHEET: &str = "assets/sprites/enemy_strong.png";
pub const GATEKEEPER_SHEET: &str = "assets/sprites/gatekeeper.png";
pub const WARDEN_SHEET: &str = "assets/sprites/warden.png";

const HERO_FRAME: f32 = 64.0;
const ENEMY_FRAME: f32 = 48.0;
const NPC_FRAME: f32 = 64.0;

pub struct HeroClips {
    pub idle: AnimationDef,
    pub walk: AnimationDef,
    pub attack: AnimationDef,
    pub death: AnimationDef,
}

pub fn hero_clips(attack_frame_duration: f32) -> HeroClips {
    HeroClips {
        idle: AnimationDef::range(0, 4, 0.15, true),
        walk: AnimationDef::range(8, 6, 0.1, true),
        attack: AnimationDef::range(16, ATTACK_FRAME_COUNT, attack_frame_duration, false),
        death: AnimationDef::range(24, 6, 0.12, false),
    }
}

pub struct EnemyClips {
    pub walk: AnimationDef,
    pub attack: AnimationDef,
    pub death: AnimationDef,
}

pub fn enemy_clips() -> EnemyClips {
    EnemyClips {
        walk: AnimationDef::range(0, 4, 0.12, true),
        attack: AnimationDef::range(4, 4, 0.1, false),
        death: AnimationDef::range(8, 4, 0.12, false),
    }
}

pub fn npc_idle() -> AnimationDef {
    AnimationDef::range(0, 4, 0.2, true)
}

pub fn hero_sheet(assets: &AssetLoader) -> SpriteSheet {
    SpriteSheet::new(assets.load(HERO_SHEET), HERO_FRAME, HERO_FRAME)
}

pub fn enemy_sheet(assets: &AssetLoader, kind: EnemyKind) -> SpriteSheet {
    let path = match kind {
        EnemyKind::Weak => WEAK_SHEET,
        EnemyKind::Normal => NORMAL_SHEET,
        EnemyKind::Strong => STRONG_SHEET,
    };
    SpriteSheet::new(assets.load(path), ENEMY_FRAME, ENEMY_FRAME)
}

pub fn npc_sheet(assets: &AssetLoader, path: &str) -> SpriteSheet {
    SpriteSheet::new(assets.load(path), NPC_FRAME, NPC_FRAME)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clip_tables_validate() {
        let hero = hero_clips(0.08);
        for (name, def) in [
            ("idle", &hero.idle),
            ("walk", &hero.walk),
            ("attack", &hero.attack),
            ("death", &hero.death),
        ] {
            def.validate(name).expect("hero clip should validate");
        }
        let enemy = enemy_clips();
        enemy.death.validate("death").expect("enemy clip should validate");
        assert!(!hero.attack.looping);
        assert_eq!(hero.attack.frames.len(), ATTACK_FRAME_COUNT);
    }

    #[test]
    fn sheets_share_handles_per_path() {
        let assets = AssetLoader::new();
        let a = enemy_sheet(&assets, EnemyKind::Weak);
        let b = enemy_sheet(&assets, EnemyKind::Weak);
        assert!(a.image().ptr_eq(b.image()));
        assert_eq!(assets.pending_count(), 1);
    }
}
