//! Battlefield geometry: 2D vectors, obstacles, spawn lines
//!
//! The arena is an axis-aligned rectangle with (0, 0) in the top-left
//! corner. Red spawns along the left edge, Blue along the right edge, and
//! the control point sits at the centre.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::ops::{Add, AddAssign, Mul, Sub};

use crate::team::Team;

/// Distance from the side edge to each team's spawn line
const SPAWN_MARGIN: f32 = 60.0;

/// Clear space kept around the control point and spawn lines when placing obstacles
const OBSTACLE_CLEARANCE: f32 = 40.0;

/// Placement attempts per obstacle before giving up on it
const PLACEMENT_ATTEMPTS: usize = 32;

// ============================================================================
// VECTOR
// ============================================================================

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f32 {
        (self.x * self.x + self.y * self.y).sqrt()
    }

    pub fn distance(self, other: Vec2) -> f32 {
        (self - other).length()
    }

    /// Unit vector, or zero for a (near) zero vector
    pub fn normalized(self) -> Vec2 {
        let len = self.length();
        if len < 1e-6 {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / len, self.y / len)
        }
    }

    /// Counter-clockwise perpendicular
    pub fn perp(self) -> Vec2 {
        Vec2::new(-self.y, self.x)
    }

    pub fn rotated(self, angle: f32) -> Vec2 {
        let (s, c) = angle.sin_cos();
        Vec2::new(self.x * c - self.y * s, self.x * s + self.y * c)
    }
}

impl Add for Vec2 {
    type Output = Vec2;
    fn add(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x + rhs.x, self.y + rhs.y)
    }
}

impl AddAssign for Vec2 {
    fn add_assign(&mut self, rhs: Vec2) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl Sub for Vec2 {
    type Output = Vec2;
    fn sub(self, rhs: Vec2) -> Vec2 {
        Vec2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

impl Mul<f32> for Vec2 {
    type Output = Vec2;
    fn mul(self, rhs: f32) -> Vec2 {
        Vec2::new(self.x * rhs, self.y * rhs)
    }
}

// ============================================================================
// OBSTACLES
// ============================================================================

/// Circular obstacle: blocks tanks and absorbs projectiles
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Obstacle {
    pub center: Vec2,
    pub radius: f32,
}

impl Obstacle {
    pub fn contains(&self, p: Vec2) -> bool {
        self.center.distance(p) <= self.radius
    }

    /// Push a circle of radius `r` at `p` out of the obstacle, if overlapping
    pub fn push_out(&self, p: Vec2, r: f32) -> Vec2 {
        let offset = p - self.center;
        let min_dist = self.radius + r;
        let dist = offset.length();
        if dist >= min_dist {
            return p;
        }
        let dir = if dist < 1e-6 { Vec2::new(1.0, 0.0) } else { offset.normalized() };
        self.center + dir * min_dist
    }
}

// ============================================================================
// ARENA
// ============================================================================

/// Battlefield layout
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Arena {
    pub width: f32,
    pub height: f32,
    pub obstacles: Vec<Obstacle>,
}

impl Arena {
    /// Empty arena
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            obstacles: Vec::new(),
        }
    }

    /// Arena with seeded obstacles placed in the middle band, clear of the
    /// control point (radius `keep_clear`) and both spawn lines.
    pub fn generate<R: Rng>(
        width: f32,
        height: f32,
        obstacle_count: usize,
        keep_clear: f32,
        rng: &mut R,
    ) -> Self {
        let mut arena = Self::new(width, height);
        let center = arena.center();
        let band = (SPAWN_MARGIN + OBSTACLE_CLEARANCE * 2.0, width - SPAWN_MARGIN - OBSTACLE_CLEARANCE * 2.0);
        if band.0 >= band.1 {
            return arena;
        }

        for _ in 0..obstacle_count {
            for _ in 0..PLACEMENT_ATTEMPTS {
                let radius = rng.gen_range(18.0..42.0);
                let candidate = Obstacle {
                    center: Vec2::new(
                        rng.gen_range(band.0..band.1),
                        rng.gen_range(radius..(height - radius).max(radius + 1.0)),
                    ),
                    radius,
                };

                let clear_of_hill =
                    candidate.center.distance(center) > keep_clear + radius + OBSTACLE_CLEARANCE;
                let clear_of_others = arena.obstacles.iter().all(|o| {
                    o.center.distance(candidate.center) > o.radius + radius + OBSTACLE_CLEARANCE
                });

                if clear_of_hill && clear_of_others {
                    arena.obstacles.push(candidate);
                    break;
                }
            }
        }

        arena
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.width / 2.0, self.height / 2.0)
    }

    /// Evenly spaced spawn points along a team's edge
    pub fn spawn_points(&self, team: Team, count: usize) -> Vec<Vec2> {
        let x = match team {
            Team::Red => SPAWN_MARGIN,
            Team::Blue => self.width - SPAWN_MARGIN,
        };
        let step = self.height / (count as f32 + 1.0);
        (1..=count).map(|i| Vec2::new(x, step * i as f32)).collect()
    }

    pub fn in_bounds(&self, p: Vec2) -> bool {
        p.x >= 0.0 && p.x <= self.width && p.y >= 0.0 && p.y <= self.height
    }

    /// Clamp a circle of radius `r` inside the arena and outside obstacles
    pub fn confine(&self, p: Vec2, r: f32) -> Vec2 {
        let mut q = p;
        for o in &self.obstacles {
            q = o.push_out(q, r);
        }
        Vec2::new(q.x.clamp(r, self.width - r), q.y.clamp(r, self.height - r))
    }

    pub fn blocked(&self, p: Vec2) -> bool {
        self.obstacles.iter().any(|o| o.contains(p))
    }
}
