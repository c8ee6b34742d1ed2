#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Game modes and the procedural wave scheduler.
//!
//! A [`GameMode`] owns the kill and escape bookkeeping, decides how many
//! enemies spawn each tick, evaluates the end conditions, and gates turret
//! placement. [`Elimination`] is the shipped mode: an infinite survival
//! scheduler whose intensity scales with confirmed kills.

use rand::{Rng, RngCore};

/// Ticks of quiet before each wave cycle begins.
const LEAD_IN_TICKS: u32 = 30;

/// Inclusive bounds of the random idle gap between spawn pulses.
const GAP_TICKS_MIN: u32 = 10;
const GAP_TICKS_MAX: u32 = 50;

/// Difficulty step reported when a kill threshold is crossed.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IntensityShift {
    /// Intensity level after the raise.
    pub intensity: u32,
    /// Turret allowance after the raise.
    pub max_defenses: u32,
}

/// Contract every game mode implements.
///
/// The collision resolver reports kills and escapes through `record_kill`
/// and `record_escape`; the engine polls `next` once per tick for spawn
/// decisions and checks the end conditions afterwards.
pub trait GameMode: std::fmt::Debug {
    /// Restores the mode to its initial state for a fresh level.
    fn reset(&mut self);

    /// Reports whether the player has won.
    fn has_won(&self) -> bool;

    /// Reports whether the player has lost.
    fn has_lost(&self) -> bool;

    /// Number of enemies to spawn this tick.
    fn next(&mut self, rng: &mut dyn RngCore) -> u32;

    /// Whether another turret may be placed given the current count.
    fn allows_placement(&self, existing_defenses: usize) -> bool;

    /// Records a confirmed kill, reporting an intensity raise if one fired.
    fn record_kill(&mut self) -> Option<IntensityShift>;

    /// Records an enemy that reached an escape portal alive.
    fn record_escape(&mut self);

    /// Confirmed kills since the last reset.
    fn killed(&self) -> u32;

    /// Escaped enemies since the last reset.
    fn escaped(&self) -> u32;

    /// Current difficulty scalar.
    fn intensity(&self) -> u32;

    /// Current turret allowance.
    fn max_defenses(&self) -> u32;
}

/// Tuning surface for [`Elimination`].
#[derive(Clone, Copy, Debug)]
pub struct EliminationConfig {
    /// Escapes tolerated per intensity level before the game is lost.
    pub max_escaped: u32,
    /// Kills per intensity level required to raise the difficulty.
    pub intensity_frequency: u32,
    /// Turret allowance at intensity one.
    pub base_defenses: u32,
    /// Ticks of quiet before each wave cycle.
    pub lead_in_ticks: u32,
}

impl Default for EliminationConfig {
    fn default() -> Self {
        Self {
            max_escaped: 20,
            intensity_frequency: 10,
            base_defenses: 3,
            lead_in_ticks: LEAD_IN_TICKS,
        }
    }
}

/// Infinite survival mode.
///
/// The wave generator repeats cycles of a quiet lead-in followed by
/// `intensity` single-spawn pulses, each separated by a random idle gap.
/// Crossing `intensity * intensity_frequency` kills raises the intensity
/// and the turret allowance by one and rebuilds the generator; there is no
/// win condition.
#[derive(Clone, Debug)]
pub struct Elimination {
    config: EliminationConfig,
    killed: u32,
    escaped: u32,
    intensity: u32,
    max_defenses: u32,
    cursor: WaveCursor,
}

impl Elimination {
    /// Creates an elimination mode with the provided tuning.
    #[must_use]
    pub fn new(config: EliminationConfig) -> Self {
        Self {
            config,
            killed: 0,
            escaped: 0,
            intensity: 1,
            max_defenses: config.base_defenses,
            cursor: WaveCursor::new(1, config.lead_in_ticks),
        }
    }
}

impl Default for Elimination {
    fn default() -> Self {
        Self::new(EliminationConfig::default())
    }
}

impl GameMode for Elimination {
    fn reset(&mut self) {
        *self = Self::new(self.config);
    }

    fn has_won(&self) -> bool {
        false
    }

    fn has_lost(&self) -> bool {
        self.escaped > self.config.max_escaped * self.intensity
    }

    fn next(&mut self, rng: &mut dyn RngCore) -> u32 {
        self.cursor.next(rng)
    }

    fn allows_placement(&self, existing_defenses: usize) -> bool {
        existing_defenses < self.max_defenses as usize
    }

    fn record_kill(&mut self) -> Option<IntensityShift> {
        self.killed += 1;
        if self.killed < self.intensity * self.config.intensity_frequency {
            return None;
        }

        self.intensity += 1;
        self.max_defenses += 1;
        // The old generator is discarded wholesale; the new one starts a
        // fresh cycle at the raised intensity.
        self.cursor = WaveCursor::new(self.intensity, self.config.lead_in_ticks);
        Some(IntensityShift {
            intensity: self.intensity,
            max_defenses: self.max_defenses,
        })
    }

    fn record_escape(&mut self) {
        self.escaped += 1;
    }

    fn killed(&self) -> u32 {
        self.killed
    }

    fn escaped(&self) -> u32 {
        self.escaped
    }

    fn intensity(&self) -> u32 {
        self.intensity
    }

    fn max_defenses(&self) -> u32 {
        self.max_defenses
    }
}

/// Infinite pulse generator backing [`Elimination`].
///
/// `idle` counts down silent ticks; each time it runs out the cursor emits
/// one single-spawn pulse and schedules the next idle span: a random gap
/// between pulses, or the full lead-in once a cycle's pulses are spent.
#[derive(Clone, Debug, PartialEq, Eq)]
struct WaveCursor {
    intensity: u32,
    lead_in: u32,
    idle: u32,
    pulses_left: u32,
}

impl WaveCursor {
    fn new(intensity: u32, lead_in_ticks: u32) -> Self {
        Self {
            intensity: intensity.max(1),
            lead_in: lead_in_ticks,
            idle: lead_in_ticks,
            pulses_left: intensity.max(1),
        }
    }

    fn next(&mut self, rng: &mut dyn RngCore) -> u32 {
        if self.idle > 0 {
            self.idle -= 1;
            return 0;
        }

        if self.pulses_left == 0 {
            self.pulses_left = self.intensity;
        }
        self.pulses_left -= 1;
        self.idle = if self.pulses_left == 0 {
            self.lead_in
        } else {
            rng.gen_range(GAP_TICKS_MIN..=GAP_TICKS_MAX)
        };
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0xbeef)
    }

    fn drain_cycle(mode: &mut Elimination, rng: &mut ChaCha8Rng, ticks: u32) -> Vec<u32> {
        (0..ticks).map(|_| mode.next(rng)).collect()
    }

    #[test]
    fn lead_in_is_quiet() {
        let mut mode = Elimination::default();
        let mut rng = rng();
        let spawns = drain_cycle(&mut mode, &mut rng, 30);
        assert!(spawns.iter().all(|count| *count == 0));
        assert_eq!(mode.next(&mut rng), 1, "first pulse follows the lead-in");
    }

    #[test]
    fn cycle_emits_intensity_pulses_with_bounded_gaps() {
        let mut cursor = WaveCursor::new(3, 5);
        let mut rng = rng();
        let mut pulses = 0;
        let mut gap: u32 = 0;
        let mut gaps = Vec::new();
        // One full cycle: stop once the post-cycle lead-in begins.
        for _ in 0..500 {
            if cursor.next(&mut rng) == 1 {
                if pulses > 0 {
                    gaps.push(gap);
                }
                pulses += 1;
                gap = 0;
                if pulses == 3 {
                    break;
                }
            } else {
                gap += 1;
            }
        }
        assert_eq!(pulses, 3);
        assert_eq!(gaps.len(), 2);
        assert!(gaps
            .iter()
            .all(|gap| (GAP_TICKS_MIN..=GAP_TICKS_MAX).contains(gap)));
    }

    #[test]
    fn loss_boundary_is_exclusive() {
        let mut mode = Elimination::new(EliminationConfig {
            max_escaped: 20,
            ..EliminationConfig::default()
        });
        for _ in 0..20 {
            mode.record_escape();
        }
        assert!(!mode.has_lost(), "twenty escapes is still survivable");
        mode.record_escape();
        assert!(mode.has_lost(), "twenty-one escapes loses the game");
    }

    #[test]
    fn loss_threshold_scales_with_intensity() {
        let mut mode = Elimination::new(EliminationConfig {
            max_escaped: 5,
            intensity_frequency: 1,
            ..EliminationConfig::default()
        });
        assert!(mode.record_kill().is_some());
        assert_eq!(mode.intensity(), 2);
        for _ in 0..10 {
            mode.record_escape();
        }
        assert!(!mode.has_lost());
        mode.record_escape();
        assert!(mode.has_lost());
    }

    #[test]
    fn kill_threshold_raises_intensity_and_allowance_exactly_once() {
        let mut mode = Elimination::new(EliminationConfig {
            intensity_frequency: 4,
            base_defenses: 3,
            ..EliminationConfig::default()
        });
        for _ in 0..3 {
            assert_eq!(mode.record_kill(), None);
        }
        let shift = mode.record_kill().expect("fourth kill raises intensity");
        assert_eq!(
            shift,
            IntensityShift {
                intensity: 2,
                max_defenses: 4,
            }
        );
        assert_eq!(mode.intensity(), 2);
        assert_eq!(mode.max_defenses(), 4);
        // The next threshold sits at 2 * 4 kills.
        for _ in 0..3 {
            assert_eq!(mode.record_kill(), None);
        }
        assert!(mode.record_kill().is_some());
        assert_eq!(mode.intensity(), 3);
    }

    #[test]
    fn rebuilt_generator_reflects_the_raised_intensity() {
        let mut mode = Elimination::new(EliminationConfig {
            intensity_frequency: 1,
            lead_in_ticks: 4,
            ..EliminationConfig::default()
        });
        let mut rng = rng();
        assert!(mode.record_kill().is_some());
        assert_eq!(mode.intensity(), 2);

        // After the fresh lead-in, a full cycle now carries two pulses.
        let mut pulses = 0;
        let mut lead_in_seen = 0;
        for _ in 0..200 {
            if mode.next(&mut rng) == 1 {
                pulses += 1;
            } else {
                lead_in_seen += 1;
            }
            if pulses == 2 {
                break;
            }
        }
        assert_eq!(pulses, 2);
        assert!(lead_in_seen >= 4);
    }

    #[test]
    fn placement_is_gated_by_the_allowance() {
        let mode = Elimination::new(EliminationConfig {
            base_defenses: 2,
            ..EliminationConfig::default()
        });
        assert!(mode.allows_placement(0));
        assert!(mode.allows_placement(1));
        assert!(!mode.allows_placement(2));
    }

    #[test]
    fn reset_restores_the_initial_state() {
        let mut mode = Elimination::new(EliminationConfig {
            intensity_frequency: 1,
            ..EliminationConfig::default()
        });
        assert!(mode.record_kill().is_some());
        mode.record_escape();
        mode.reset();
        assert_eq!(mode.killed(), 0);
        assert_eq!(mode.escaped(), 0);
        assert_eq!(mode.intensity(), 1);
        assert!(!mode.has_lost());
        assert!(!mode.has_won());
    }
}
