//! Drawing for anything with a box and (optionally) an animated sprite.

use crate::animation::Animation;
use crate::sprite::SpriteSheet;
use crate::surface::{Color, Rect, RenderSurface};

pub trait Renderable {
    fn bounds(&self) -> Rect;

    fn sprite_sheet(&self) -> Option<&SpriteSheet> {
        None
    }

    fn current_animation(&self) -> Option<&Animation> {
        None
    }

    fn should_flip_x(&self) -> bool {
        false
    }

    /// Solid fill used until the sheet is loaded (or forever, if it failed).
    fn placeholder_color(&self) -> Color {
        Color::rgb(1.0, 0.0, 1.0)
    }
}

pub struct RenderingSystem;

impl RenderingSystem {
    /// Draw the current animation frame, or the placeholder rectangle when
    /// there is no sheet or its image is not ready.
    pub fn draw(surface: &mut dyn RenderSurface, item: &dyn Renderable) {
        let bounds = item.bounds();
        let frame = item
            .current_animation()
            .map(Animation::current_frame_index)
            .unwrap_or(0);
        let drawn = item
            .sprite_sheet()
            .is_some_and(|sheet| sheet.draw_frame(surface, frame, bounds, item.should_flip_x()));
        if !drawn {
            surface.fill_rect(bounds, item.placeholder_color());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::ImageHandle;
    use crate::surface::{DrawCommand, RecordingSurface};

    struct Crate {
        sheet: SpriteSheet,
        anim: Animation,
    }

    impl Renderable for Crate {
        fn bounds(&self) -> Rect {
            Rect::new(5.0, 5.0, 32.0, 32.0)
        }

        fn sprite_sheet(&self) -> Option<&SpriteSheet> {
            Some(&self.sheet)
        }

        fn current_animation(&self) -> Option<&Animation> {
            Some(&self.anim)
        }

        fn placeholder_color(&self) -> Color {
            Color::rgb(0.5, 0.3, 0.1)
        }
    }

    #[test]
    fn draws_current_frame_when_loaded() {
        let mut anim = Animation::new(vec![4, 5], 0.1, true);
        anim.play();
        anim.update(0.1);
        let item = Crate {
            sheet: SpriteSheet::new(ImageHandle::preloaded("crate.png", 128, 64), 32.0, 32.0),
            anim,
        };
        let mut surface = RecordingSurface::new();
        RenderingSystem::draw(&mut surface, &item);
        // Frame 5 on a 4-wide sheet is column 1 of row 1.
        assert!(matches!(
            surface.commands.as_slice(),
            [DrawCommand::Image { src: Some(r), .. }] if r.x == 32.0 && r.y == 32.0
        ));
    }

    #[test]
    fn falls_back_to_placeholder() {
        let item = Crate {
            sheet: SpriteSheet::new(crate::assets::AssetLoader::new().load("x.png"), 32.0, 32.0),
            anim: Animation::new(vec![0], 0.1, false),
        };
        let mut surface = RecordingSurface::new();
        RenderingSystem::draw(&mut surface, &item);
        assert!(matches!(
            surface.commands.as_slice(),
            [DrawCommand::FillRect(r, _)] if r.w == 32.0
        ));
    }
}
