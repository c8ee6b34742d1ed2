//! Entity variants composed from a shared capability record.
//!
//! Rather than a class hierarchy of sprite types, each entity couples one
//! [`Body`] (the capabilities every sprite shares) with an [`EntityKind`]
//! holding only the fields its kind needs.

use std::sync::Arc;

use glam::Vec2;
use tower_defence_core::{AnimationState, Cue, EntityId, Layer, MotionState};
use tower_defence_system_motion::{Ballistic, Trajectory};

use crate::cursors::{AnimationRoll, CueCursor, RotationCursor};
use crate::sprites::{Frame, SpriteId};

/// Starting health assigned to spawned enemies.
///
/// Hits resolve as instant kills, so the counter only ever drops straight
/// to zero; it is kept because the wave data model carries it.
pub const ENEMY_HEALTH: u32 = 3;

/// Ticks a turret must wait between successive shots.
pub const TURRET_COOLDOWN: u32 = 60;

/// Lower sweep bound of a turret sight cone, in degrees.
pub const SIGHT_SWEEP_MIN: i16 = -60;

/// Upper sweep bound of a turret sight cone, in degrees.
pub const SIGHT_SWEEP_MAX: i16 = 60;

/// Degrees a sight cone turns per tick.
pub const SIGHT_SWEEP_STEP: i16 = 2;

/// Capability record shared by every entity kind.
#[derive(Clone, Debug)]
pub struct Body {
    pub(crate) sprite: SpriteId,
    pub(crate) frame: Arc<Frame>,
    pub(crate) position: Vec2,
    pub(crate) flip_x: bool,
    pub(crate) flip_y: bool,
    pub(crate) layer: Layer,
    pub(crate) rotation: RotationCursor,
    pub(crate) last_angle: Option<i16>,
    pub(crate) animation_state: AnimationState,
    pub(crate) roll: Option<AnimationRoll>,
    pub(crate) cues: Option<CueCursor>,
}

impl Body {
    /// Creates a body rendered with `frame` at `angle` degrees.
    #[must_use]
    pub fn new(
        sprite: SpriteId,
        frame: Arc<Frame>,
        position: Vec2,
        layer: Layer,
        rotation: RotationCursor,
        angle: i16,
    ) -> Self {
        Self {
            sprite,
            frame,
            position,
            flip_x: false,
            flip_y: false,
            layer,
            rotation,
            last_angle: Some(angle.rem_euclid(360)),
            animation_state: AnimationState::Stopped,
            roll: None,
            cues: None,
        }
    }

    /// Attaches an animation roll and its driving state.
    #[must_use]
    pub fn with_animation(mut self, state: AnimationState, roll: AnimationRoll) -> Self {
        self.animation_state = state;
        self.roll = Some(roll);
        self
    }

    /// Attaches a sound-cue cycle.
    #[must_use]
    pub fn with_cues(mut self, cues: CueCursor) -> Self {
        self.cues = Some(cues);
        self
    }

    /// Sprite currently displayed by the body.
    #[must_use]
    pub const fn sprite(&self) -> SpriteId {
        self.sprite
    }

    /// Frame currently displayed by the body; its mask is the collision
    /// source of truth.
    #[must_use]
    pub fn frame(&self) -> &Arc<Frame> {
        &self.frame
    }

    /// Center position of the body in pixels.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Whether the sprite is mirrored horizontally.
    #[must_use]
    pub const fn flip_x(&self) -> bool {
        self.flip_x
    }

    /// Draw-order and collision layer of the body.
    #[must_use]
    pub const fn layer(&self) -> Layer {
        self.layer
    }

    /// Current animation state.
    #[must_use]
    pub const fn animation_state(&self) -> AnimationState {
        self.animation_state
    }

    /// Angle the body was last rendered at, in `[0, 360)` degrees.
    #[must_use]
    pub const fn last_angle(&self) -> Option<i16> {
        self.last_angle
    }

    /// Top-left corner of the displayed frame in pixels.
    #[must_use]
    pub fn top_left(&self) -> Vec2 {
        self.position - self.frame.size() * 0.5
    }

    /// Centroid of the displayed silhouette in world pixels.
    #[must_use]
    pub(crate) fn world_centroid(&self) -> Option<Vec2> {
        self.frame
            .centroid()
            .map(|centroid| self.top_left() + centroid)
    }
}

/// Kind-specific state carried next to the shared body.
#[derive(Clone, Debug)]
pub enum EntityKind {
    /// Mobile attacker walking a trajectory toward an escape portal.
    Enemy {
        /// Remaining health; every hit is an instant kill.
        health: u32,
        /// Whether the enemy is idle, walking, or arrived.
        motion: MotionState,
        /// Forward-only motion cursor; `None` for statically placed enemies.
        trajectory: Option<Trajectory>,
    },
    /// Stationary defence paired 1:1 with a sight cone.
    Turret {
        /// Ticks required between successive shots.
        cooldown: u32,
        /// Ticks left until the turret may fire again.
        cooldown_remaining: u32,
        /// Identifier of the co-created sight cone.
        sight: EntityId,
        /// False while the turret is a selection following the cursor.
        placed: bool,
    },
    /// Sweeping detection cone owned by a turret.
    TurretSight {
        /// Identifier of the owning turret.
        turret: EntityId,
    },
    /// In-flight shot. Source and target are weak references: they never
    /// extend the referenced entities' lifetimes.
    Projectile {
        /// Turret that fired the shot.
        source: EntityId,
        /// Enemy the shot was aimed at.
        target: EntityId,
        /// Straight-line flight cursor capped at max travel distance.
        flight: Ballistic,
    },
    /// Decorative shrub placed by the editor; persisted with the level.
    Shrub {
        /// Tile art the shrub displays.
        kind: tower_defence_core::TileKind,
        /// Placement orientation, persisted with the level.
        orientation: tower_defence_core::Orientation,
    },
    /// Painted decoration with no behaviour and no persistence.
    Decal {
        /// Tile art the decal displays.
        kind: tower_defence_core::TileKind,
    },
    /// Heads-up display panel owned by the engine.
    Hud {
        /// Text rendered by the display collaborator.
        text: String,
    },
}

/// One live entity: shared capabilities plus kind-specific state.
#[derive(Clone, Debug)]
pub struct Entity {
    pub(crate) body: Body,
    pub(crate) kind: EntityKind,
}

impl Entity {
    /// Couples a body with its kind-specific state.
    #[must_use]
    pub fn new(body: Body, kind: EntityKind) -> Self {
        Self { body, kind }
    }

    /// Shared capability record of the entity.
    #[must_use]
    pub const fn body(&self) -> &Body {
        &self.body
    }

    /// Kind-specific state of the entity.
    #[must_use]
    pub const fn kind(&self) -> &EntityKind {
        &self.kind
    }
}

/// Tests whether the displayed silhouettes of two entities overlap.
#[must_use]
pub fn entities_overlap(a: &Entity, b: &Entity) -> bool {
    let offset = b.body.top_left() - a.body.top_left();
    a.body.frame.mask().overlaps(
        b.body.frame.mask(),
        offset.x.round() as i32,
        offset.y.round() as i32,
    )
}

/// Footstep cue cadence attached to spawned enemies.
#[must_use]
pub fn footstep_cues() -> CueCursor {
    let mut slots = vec![None; 12];
    slots[0] = Some(Cue::Footsteps);
    CueCursor::new(slots)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprites::Frame;

    fn body_at(position: Vec2, frame: Frame) -> Body {
        Body::new(
            SpriteId::Turret,
            Arc::new(frame),
            position,
            Layer::Turret,
            RotationCursor::Fixed(0),
            0,
        )
    }

    #[test]
    fn overlap_respects_entity_positions() {
        let solid = Frame::from_fn(10, 10, |_, _| true);
        let a = Entity::new(
            body_at(Vec2::new(50.0, 50.0), solid.clone()),
            EntityKind::Decal {
                kind: tower_defence_core::TileKind::Grass,
            },
        );
        let touching = Entity::new(
            body_at(Vec2::new(58.0, 50.0), solid.clone()),
            EntityKind::Decal {
                kind: tower_defence_core::TileKind::Grass,
            },
        );
        let apart = Entity::new(
            body_at(Vec2::new(70.0, 50.0), solid),
            EntityKind::Decal {
                kind: tower_defence_core::TileKind::Grass,
            },
        );

        assert!(entities_overlap(&a, &touching));
        assert!(!entities_overlap(&a, &apart));
    }

    #[test]
    fn world_centroid_accounts_for_frame_placement() {
        let frame = Frame::from_fn(10, 10, |x, _| x < 2);
        let body = body_at(Vec2::new(100.0, 100.0), frame);
        let centroid = body.world_centroid().expect("opaque pixels");
        assert_eq!(centroid, Vec2::new(96.0, 100.0));
    }
}
