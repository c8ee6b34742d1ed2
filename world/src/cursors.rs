//! Explicit cursor structs driving rotation, animation, and sound-cue
//! cycles.
//!
//! Infinite cycles are wraparound arithmetic, finite rolls signal
//! exhaustion through `None`, and every cursor owns exactly the parameters
//! it needs to produce its next value.

use tower_defence_core::Cue;

use crate::sprites::SpriteId;

/// Per-entity source of target rotation angles.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RotationCursor {
    /// Yields the same angle forever; used by fixed-orientation entities.
    Fixed(i16),
    /// Sweeps between two bounds, reversing at each; used by sight cones.
    Sweep(SweepCursor),
    /// Defers to the angle emitted by the active trajectory or flight.
    FollowPath,
}

impl RotationCursor {
    /// Pulls the next target angle, or `None` when the angle comes from the
    /// entity's motion sample instead.
    pub fn next_angle(&mut self) -> Option<i16> {
        match self {
            Self::Fixed(angle) => Some(*angle),
            Self::Sweep(sweep) => Some(sweep.next_angle()),
            Self::FollowPath => None,
        }
    }
}

/// Angle cursor that oscillates between two inclusive bounds.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SweepCursor {
    min: i16,
    max: i16,
    step: i16,
    current: i16,
    rising: bool,
}

impl SweepCursor {
    /// Creates a sweep between `min` and `max`, advancing `step` degrees per
    /// tick and starting at the lower bound.
    #[must_use]
    pub fn new(min: i16, max: i16, step: i16) -> Self {
        debug_assert!(min <= max, "sweep bounds out of order");
        debug_assert!(step > 0, "sweep step must be positive");
        Self {
            min,
            max,
            step,
            current: min,
            rising: true,
        }
    }

    /// Pulls the next sweep angle, reversing direction at either bound.
    pub fn next_angle(&mut self) -> i16 {
        let angle = self.current;
        if self.rising {
            self.current = (self.current + self.step).min(self.max);
            if self.current == self.max {
                self.rising = false;
            }
        } else {
            self.current = (self.current - self.step).max(self.min);
            if self.current == self.min {
                self.rising = true;
            }
        }
        angle
    }
}

/// Animation frame cursor with a per-frame tick dwell.
///
/// Looping rolls (walking) wrap around forever; finite rolls (dying,
/// exploding) yield `None` once the last frame's dwell elapses, which the
/// update loop consumes as the normal terminal signal.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnimationRoll {
    frames: Vec<SpriteId>,
    dwell: u32,
    looping: bool,
    cursor: usize,
    ticks: u32,
}

impl AnimationRoll {
    /// Creates a roll that repeats its frames forever.
    #[must_use]
    pub fn looping(frames: Vec<SpriteId>, dwell: u32) -> Self {
        Self::new(frames, dwell, true)
    }

    /// Creates a roll that plays its frames once.
    #[must_use]
    pub fn finite(frames: Vec<SpriteId>, dwell: u32) -> Self {
        Self::new(frames, dwell, false)
    }

    fn new(frames: Vec<SpriteId>, dwell: u32, looping: bool) -> Self {
        Self {
            frames,
            dwell: dwell.max(1),
            looping,
            cursor: 0,
            ticks: 0,
        }
    }

    /// Pulls the frame to display this tick, or `None` once exhausted.
    pub fn next(&mut self) -> Option<SpriteId> {
        if self.frames.is_empty() {
            return None;
        }
        if self.cursor >= self.frames.len() {
            if self.looping {
                self.cursor = 0;
            } else {
                return None;
            }
        }

        let frame = self.frames[self.cursor];
        self.ticks += 1;
        if self.ticks >= self.dwell {
            self.ticks = 0;
            self.cursor += 1;
        }
        Some(frame)
    }
}

/// Cyclic sound-cue schedule; `None` slots are silent ticks.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CueCursor {
    slots: Vec<Option<Cue>>,
    cursor: usize,
}

impl CueCursor {
    /// Creates a cue cycle from the provided slots.
    #[must_use]
    pub fn new(slots: Vec<Option<Cue>>) -> Self {
        Self { slots, cursor: 0 }
    }

    /// Pulls the cue scheduled for this tick, advancing cyclically.
    pub fn next(&mut self) -> Option<Cue> {
        if self.slots.is_empty() {
            return None;
        }
        let cue = self.slots[self.cursor];
        self.cursor = (self.cursor + 1) % self.slots.len();
        cue
    }
}
