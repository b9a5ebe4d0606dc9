use tv_core::{Animation, AssetLoader, Color, Entity, Rect, Renderable, SpriteSheet};

use crate::sprites::{npc_idle, npc_sheet};

/// Stationary speaker in the dialogue scenes.
#[derive(Debug, Clone)]
pub struct Npc {
    pub name: String,
    pub entity: Entity,
    sheet: SpriteSheet,
    idle: Animation,
    color: Color,
}

impl Npc {
    pub fn new(
        assets: &AssetLoader,
        sheet_path: &str,
        name: &str,
        bounds: Rect,
        color: Color,
    ) -> Self {
        let mut idle = Animation::from_def(&npc_idle());
        idle.play();
        let mut entity = Entity::new(bounds.x, bounds.y, bounds.w, bounds.h);
        entity.direction = tv_core::Direction::Left;
        Self {
            name: name.to_string(),
            entity,
            sheet: npc_sheet(assets, sheet_path),
            idle,
            color,
        }
    }

    pub fn tick(&mut self, dt: f32) {
        self.idle.update(dt);
    }
}

impl Renderable for Npc {
    fn bounds(&self) -> Rect {
        self.entity.bounds()
    }

    fn sprite_sheet(&self) -> Option<&SpriteSheet> {
        Some(&self.sheet)
    }

    fn current_animation(&self) -> Option<&Animation> {
        Some(&self.idle)
    }

    fn should_flip_x(&self) -> bool {
        self.entity.faces_left()
    }

    fn placeholder_color(&self) -> Color {
        self.color
    }
}
