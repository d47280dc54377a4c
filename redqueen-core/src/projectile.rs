//! Projectiles and swept hit testing

use crate::arena::Vec2;
use crate::team::Team;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Projectile {
    /// Id of the firing tank
    pub owner: usize,
    pub team: Team,
    pub position: Vec2,
    /// Position before the last advance, for swept collision
    pub previous: Vec2,
    pub velocity: Vec2,
    pub damage: f32,
    /// Seconds left before the shell expires
    pub lifetime: f32,
}

impl Projectile {
    pub fn new(owner: usize, team: Team, origin: Vec2, direction: Vec2, speed: f32, damage: f32, lifetime: f32) -> Self {
        Self {
            owner,
            team,
            position: origin,
            previous: origin,
            velocity: direction.normalized() * speed,
            damage,
            lifetime,
        }
    }

    pub fn advance(&mut self, dt: f32) {
        self.previous = self.position;
        self.position += self.velocity * dt;
        self.lifetime -= dt;
    }

    pub fn expired(&self) -> bool {
        self.lifetime <= 0.0
    }

    /// Fraction of the last step at which its path entered a square box
    pub fn swept_entry(&self, center: Vec2, half_size: f32) -> Option<f32> {
        segment_hits_box(self.previous, self.position, center, half_size)
    }
}

/// Slab test of segment `a -> b` against an axis-aligned square.
///
/// Returns the entry point as a fraction of the segment in `[0, 1]`,
/// 0 when `a` already lies inside the box.
pub fn segment_hits_box(a: Vec2, b: Vec2, center: Vec2, half: f32) -> Option<f32> {
    let min = Vec2::new(center.x - half, center.y - half);
    let max = Vec2::new(center.x + half, center.y + half);
    let d = b - a;

    let mut t_enter = 0.0f32;
    let mut t_exit = 1.0f32;

    for (origin, delta, lo, hi) in [(a.x, d.x, min.x, max.x), (a.y, d.y, min.y, max.y)] {
        if delta.abs() < 1e-9 {
            if origin < lo || origin > hi {
                return None;
            }
            continue;
        }
        let t1 = (lo - origin) / delta;
        let t2 = (hi - origin) / delta;
        let (near, far) = if t1 < t2 { (t1, t2) } else { (t2, t1) };
        t_enter = t_enter.max(near);
        t_exit = t_exit.min(far);
        if t_enter > t_exit {
            return None;
        }
    }

    Some(t_enter)
}
