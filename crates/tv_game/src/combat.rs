//! Arena geometry shared by the combat scene: spawn rings, target picking and
//! enemy separation.

use tv_core::{Entity, Rect};

use crate::enemy::Enemy;

/// `count` points evenly spaced on a circle of `radius` around `center`,
/// starting at angle zero.
pub fn spawn_ring(count: usize, center: (f32, f32), radius: f32) -> Vec<(f32, f32)> {
    (0..count)
        .map(|i| {
            let angle = i as f32 / count as f32 * std::f32::consts::TAU;
            (center.0 + angle.cos() * radius, center.1 + angle.sin() * radius)
        })
        .collect()
}

/// Index of the nearest live enemy whose centre is within `radius` of `point`.
pub fn nearest_within(enemies: &[Enemy], point: (f32, f32), radius: f32) -> Option<usize> {
    enemies
        .iter()
        .enumerate()
        .filter(|(_, e)| e.is_alive())
        .map(|(i, e)| (i, e.entity.distance_to_point(point.0, point.1)))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal))
        .map(|(i, _)| i)
}

/// Push every overlapping pair apart along the line between their centres,
/// half the overlap each. Coincident centres split along +x. Both are
/// clamped back into `arena` afterwards; when a wall eats part of one push,
/// the partner takes the remainder.
///
/// Overlap is measured against the sum of half-widths, treating each enemy as
/// a circle of diameter `width`.
pub fn separate(entities: &mut [Entity], arena: Rect) {
    let n = entities.len();
    for i in 0..n {
        for j in (i + 1)..n {
            let (head, tail) = entities.split_at_mut(j);
            let a = &mut head[i];
            let b = &mut tail[0];
            if !a.is_alive || !b.is_alive {
                continue;
            }
            let (ax, ay) = a.center();
            let (bx, by) = b.center();
            let (mut dx, mut dy) = (bx - ax, by - ay);
            let dist = (dx * dx + dy * dy).sqrt();
            let min_dist = (a.width + b.width) * 0.5;
            if dist >= min_dist {
                continue;
            }
            if dist > f32::EPSILON {
                dx /= dist;
                dy /= dist;
            } else {
                dx = 1.0;
                dy = 0.0;
            }
            let push = (min_dist - dist) * 0.5;
            a.x -= dx * push;
            a.y -= dy * push;
            b.x += dx * push;
            b.y += dy * push;
            a.clamp_to(arena);
            b.clamp_to(arena);

            let left = min_dist - a.distance_to(b);
            if left > 0.0 {
                b.x += dx * left;
                b.y += dy * left;
                b.clamp_to(arena);
            }
            let left = min_dist - a.distance_to(b);
            if left > 0.0 {
                a.x -= dx * left;
                a.y -= dy * left;
                a.clamp_to(arena);
            }
        }
    }
}

/// Separation over the enemies' entities.
pub fn separate_enemies(enemies: &mut [Enemy], arena: Rect) {
    let mut entities: Vec<Entity> = enemies.iter().map(|e| e.entity).collect();
    separate(&mut entities, arena);
    for (enemy, entity) in enemies.iter_mut().zip(entities) {
        enemy.entity.x = entity.x;
        enemy.entity.y = entity.y;
    }
}
