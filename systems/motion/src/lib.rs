#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Trajectory generation that turns waypoint paths into per-tick motion
//! samples.
//!
//! A [`Trajectory`] is a forward-only cursor over the interpolated waypoint
//! stream of one enemy: each pull yields the next position together with the
//! facing flip derived from the travel direction. [`Ballistic`] is the
//! straight-line counterpart used by projectiles. Both cursors are finite;
//! exhaustion signals arrival rather than an error.

use glam::Vec2;
use rand::Rng;

/// Vertical offset anchoring a sprite's feet inside its spawn tile.
///
/// Positions are computed from sprite centers, so without this correction a
/// jittered spawn point could place the visible body outside its tile.
const FOOT_ANCHOR: f32 = -30.0;

/// Interpolation curve applied across each waypoint segment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Easing {
    /// Constant-rate interpolation.
    Linear,
    /// Cubic ease-in-out for visual smoothing at segment boundaries.
    #[default]
    CubeInOut,
}

impl Easing {
    /// Maps a parameter in `[0, 1]` through the curve.
    #[must_use]
    pub fn apply(self, t: f32) -> f32 {
        match self {
            Self::Linear => t,
            Self::CubeInOut => {
                if t < 0.5 {
                    4.0 * t * t * t
                } else {
                    let p = 2.0 * t - 2.0;
                    0.5 * p * p * p + 1.0
                }
            }
        }
    }
}

/// One per-tick motion sample consumed by a trajectory-driven entity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct MotionSample {
    /// Center position for this tick, jitter already applied.
    pub position: Vec2,
    /// Sprite rotation in whole degrees.
    pub rotation: i16,
    /// Whether the sprite faces against its default horizontal heading.
    pub flip_x: bool,
}

/// Finite, forward-only sequence of motion samples derived from a path.
///
/// Restartable only by rebuilding from the source path; once the cursor is
/// exhausted the owning entity has reached its destination.
#[derive(Clone, Debug)]
pub struct Trajectory {
    points: Vec<Vec2>,
    cursor: usize,
    jitter: Vec2,
}

impl Trajectory {
    /// Builds a trajectory by interpolating each consecutive waypoint pair
    /// with `steps_per_segment` subdivisions.
    ///
    /// A single positional jitter bounded by `jitter_range` is drawn per
    /// trajectory and applied uniformly to every sample so concurrent
    /// walkers do not share identical spawn and despawn points.
    pub fn build<R: Rng>(
        waypoints: &[Vec2],
        steps_per_segment: u32,
        jitter_range: i32,
        easing: Easing,
        rng: &mut R,
    ) -> Self {
        let mut points = Vec::new();
        if waypoints.len() >= 2 && steps_per_segment > 0 {
            points.reserve((waypoints.len() - 1) * (steps_per_segment as usize + 1));
            for pair in waypoints.windows(2) {
                let (a, b) = (pair[0], pair[1]);
                for m in 0..=steps_per_segment {
                    let t = m as f32 / steps_per_segment as f32;
                    points.push(a + (b - a) * easing.apply(t));
                }
            }
        }

        let jitter = if jitter_range > 0 {
            rng.gen_range(-jitter_range..=jitter_range) as f32
        } else {
            0.0
        };

        Self {
            points,
            cursor: 0,
            jitter: Vec2::new(jitter, FOOT_ANCHOR + jitter),
        }
    }

    /// Pulls the next motion sample, or `None` once the destination is
    /// reached.
    ///
    /// Consecutive coincident points cannot be normalized into a travel
    /// direction and are skipped without emitting a sample.
    pub fn next(&mut self) -> Option<MotionSample> {
        while self.cursor + 1 < self.points.len() {
            let v1 = self.points[self.cursor];
            let v2 = self.points[self.cursor + 1];
            self.cursor += 1;

            if v1 == v2 {
                continue;
            }
            let (Some(heading), Some(travel)) = (v1.try_normalize(), (v2 - v1).try_normalize())
            else {
                continue;
            };

            return Some(MotionSample {
                position: v2 + self.jitter,
                rotation: 0,
                flip_x: heading.dot(travel) < 0.0,
            });
        }
        None
    }
}

/// Straight-line flight cursor for projectiles.
///
/// Advances a fixed distance per tick toward the aim point, capped at a
/// maximum travel distance; exhaustion means the projectile should explode.
#[derive(Clone, Copy, Debug)]
pub struct Ballistic {
    position: Vec2,
    step: Vec2,
    rotation: i16,
    remaining: u32,
}

impl Ballistic {
    /// Aims a flight from `from` toward `to` at `speed` pixels per tick.
    ///
    /// Returns `None` when the aim is degenerate: coincident endpoints have
    /// no direction to normalize, and non-positive speed or range would
    /// never terminate.
    #[must_use]
    pub fn aim(from: Vec2, to: Vec2, speed: f32, max_distance: f32) -> Option<Self> {
        if speed <= 0.0 || max_distance <= 0.0 {
            return None;
        }
        let direction = (to - from).try_normalize()?;
        Some(Self {
            position: from,
            step: direction * speed,
            rotation: angle_between(to, from).round() as i16,
            remaining: (max_distance / speed).ceil() as u32,
        })
    }

    /// Facing of the flight in whole degrees.
    #[must_use]
    pub const fn rotation(&self) -> i16 {
        self.rotation
    }

    /// Pulls the next flight position and facing, or `None` at max range.
    pub fn next(&mut self) -> Option<(Vec2, i16)> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        self.position += self.step;
        Some((self.position, self.rotation))
    }
}

/// Finds the angle between two vectors in screen coordinates.
///
/// The y axis grows downward on screen, so the vertical component is negated
/// before `atan2` to express the result in the usual counter-clockwise
/// degrees.
#[must_use]
pub fn angle_between(v1: Vec2, v2: Vec2) -> f32 {
    let delta = v1 - v2;
    let rads = (-delta.y).atan2(delta.x);
    rads.to_degrees().rem_euclid(360.0)
}
