//! Positional state shared by the player, enemies and NPCs.

use crate::surface::Rect;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Direction {
    Left,
    #[default]
    Right,
    Up,
    Down,
}

impl Direction {
    /// Facing implied by a movement vector; `None` when standing still.
    /// Horizontal motion wins ties so sprites keep a left/right facing.
    pub fn from_motion(dx: f32, dy: f32) -> Option<Direction> {
        if dx == 0.0 && dy == 0.0 {
            None
        } else if dx.abs() >= dy.abs() {
            Some(if dx < 0.0 {
                Direction::Left
            } else {
                Direction::Right
            })
        } else {
            Some(if dy < 0.0 { Direction::Up } else { Direction::Down })
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Entity {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub direction: Direction,
    pub is_alive: bool,
}

impl Entity {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
            direction: Direction::default(),
            is_alive: true,
        }
    }

    /// Entity of the given size whose centre sits at `(cx, cy)`.
    pub fn centered_at(cx: f32, cy: f32, width: f32, height: f32) -> Self {
        Self::new(cx - width * 0.5, cy - height * 0.5, width, height)
    }

    pub fn bounds(&self) -> Rect {
        Rect::new(self.x, self.y, self.width, self.height)
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn set_center(&mut self, cx: f32, cy: f32) {
        self.x = cx - self.width * 0.5;
        self.y = cy - self.height * 0.5;
    }

    pub fn distance_to(&self, other: &Entity) -> f32 {
        let (ax, ay) = self.center();
        let (bx, by) = other.center();
        ((bx - ax).powi(2) + (by - ay).powi(2)).sqrt()
    }

    pub fn distance_to_point(&self, px: f32, py: f32) -> f32 {
        let (cx, cy) = self.center();
        ((px - cx).powi(2) + (py - cy).powi(2)).sqrt()
    }

    /// Keep the whole box inside `area`.
    pub fn clamp_to(&mut self, area: Rect) {
        let max_x = (area.right() - self.width).max(area.x);
        let max_y = (area.bottom() - self.height).max(area.y);
        self.x = self.x.clamp(area.x, max_x);
        self.y = self.y.clamp(area.y, max_y);
    }

    /// Move by `(dx, dy)` and update the facing.
    pub fn translate(&mut self, dx: f32, dy: f32) {
        self.x += dx;
        self.y += dy;
        if let Some(direction) = Direction::from_motion(dx, dy) {
            self.direction = direction;
        }
    }

    pub fn faces_left(&self) -> bool {
        self.direction == Direction::Left
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn centered_constructor_round_trips() {
        let e = Entity::centered_at(100.0, 50.0, 20.0, 40.0);
        assert_eq!((e.x, e.y), (90.0, 30.0));
        assert_eq!(e.center(), (100.0, 50.0));
    }

    #[test]
    fn clamp_keeps_box_inside() {
        let area = Rect::new(0.0, 0.0, 100.0, 100.0);
        let mut e = Entity::new(95.0, -10.0, 10.0, 10.0);
        e.clamp_to(area);
        assert_eq!((e.x, e.y), (90.0, 0.0));
    }

    #[test]
    fn translate_updates_direction() {
        let mut e = Entity::new(0.0, 0.0, 10.0, 10.0);
        e.translate(-3.0, 1.0);
        assert_eq!(e.direction, Direction::Left);
        e.translate(0.0, 2.0);
        assert_eq!(e.direction, Direction::Down);
        e.translate(0.0, 0.0);
        assert_eq!(e.direction, Direction::Down);
    }

    #[test]
    fn distance_uses_centres() {
        let a = Entity::centered_at(0.0, 0.0, 10.0, 10.0);
        let b = Entity::centered_at(3.0, 4.0, 30.0, 30.0);
        assert!((a.distance_to(&b) - 5.0).abs() < 1e-6);
    }
}
