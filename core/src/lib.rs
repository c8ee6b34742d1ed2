#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Tower Defence engine.
//!
//! This crate defines the vocabulary that connects the authoritative world,
//! the pure systems, the orchestrating engine, and the adapters: tile and
//! entity identifiers, layers, animation and motion states, the event stream
//! broadcast after every tick, and the level-document schema consumed and
//! produced by the persistence layer.

use glam::Vec2;
use serde::{Deserialize, Serialize};

/// Default number of tile columns in a level grid.
pub const DEFAULT_TILES_X: u32 = 15;

/// Default number of tile rows in a level grid.
pub const DEFAULT_TILES_Y: u32 = 8;

/// Side length of a square tile measured in pixels.
pub const TILE_LENGTH: f32 = 64.0;

/// Semantic identity of a single grid tile.
///
/// The serialized names are the exact id strings used by the level document;
/// loaders reject anything outside this set.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TileKind {
    /// Plain road surface that routes enemy traffic.
    Road,
    /// Road tile that marks a valid path start portal.
    RoadSpawn,
    /// Road tile that marks a valid path stop portal.
    RoadEscape,
    /// Empty background tile.
    Blank,
    /// Decorative grass, usable as a shrub sprite.
    Grass,
    /// Decorative rocks, usable as a shrub sprite.
    Rocks,
}

impl TileKind {
    /// Reports whether enemies may walk across the tile.
    #[must_use]
    pub const fn is_walkable(self) -> bool {
        matches!(self, Self::Road)
    }

    /// Reports whether the tile is a spawn portal.
    #[must_use]
    pub const fn is_spawn(self) -> bool {
        matches!(self, Self::RoadSpawn)
    }

    /// Reports whether the tile is an escape portal.
    #[must_use]
    pub const fn is_escape(self) -> bool {
        matches!(self, Self::RoadEscape)
    }

    /// Reports whether the tile participates in path graphs.
    ///
    /// Portals route traffic even though they are not part of the plain
    /// walkable set.
    #[must_use]
    pub const fn routes_traffic(self) -> bool {
        self.is_walkable() || self.is_spawn() || self.is_escape()
    }

    /// Reports whether the tile is decorative art usable as a shrub.
    #[must_use]
    pub const fn is_decorative(self) -> bool {
        matches!(self, Self::Grass | Self::Rocks)
    }
}

/// Right-angle orientation applied to placed tiles and shrubs.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum Orientation {
    /// No rotation.
    #[default]
    Deg0,
    /// Quarter turn.
    Deg90,
    /// Half turn.
    Deg180,
    /// Three-quarter turn.
    Deg270,
}

impl Orientation {
    /// Parses an orientation from whole degrees.
    #[must_use]
    pub const fn from_degrees(degrees: u16) -> Option<Self> {
        match degrees {
            0 => Some(Self::Deg0),
            90 => Some(Self::Deg90),
            180 => Some(Self::Deg180),
            270 => Some(Self::Deg270),
            _ => None,
        }
    }

    /// Whole degrees represented by the orientation.
    #[must_use]
    pub const fn degrees(self) -> u16 {
        match self {
            Self::Deg0 => 0,
            Self::Deg90 => 90,
            Self::Deg180 => 180,
            Self::Deg270 => 270,
        }
    }

    /// The orientation one quarter turn clockwise from this one.
    #[must_use]
    pub const fn rotated_cw(self) -> Self {
        match self {
            Self::Deg0 => Self::Deg90,
            Self::Deg90 => Self::Deg180,
            Self::Deg180 => Self::Deg270,
            Self::Deg270 => Self::Deg0,
        }
    }
}

impl TryFrom<u16> for Orientation {
    type Error = String;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::from_degrees(value)
            .ok_or_else(|| format!("orientation must be one of 0/90/180/270, got {value}"))
    }
}

impl From<Orientation> for u16 {
    fn from(value: Orientation) -> Self {
        value.degrees()
    }
}

/// Location of a single grid tile expressed as column and row coordinates.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct GridCoord {
    column: u32,
    row: u32,
}

impl GridCoord {
    /// Creates a new grid coordinate.
    #[must_use]
    pub const fn new(column: u32, row: u32) -> Self {
        Self { column, row }
    }

    /// Zero-based column index of the tile.
    #[must_use]
    pub const fn column(&self) -> u32 {
        self.column
    }

    /// Zero-based row index of the tile.
    #[must_use]
    pub const fn row(&self) -> u32 {
        self.row
    }

    /// Computes the Manhattan distance between two grid coordinates.
    #[must_use]
    pub fn manhattan_distance(self, other: GridCoord) -> u32 {
        self.column.abs_diff(other.column) + self.row.abs_diff(other.row)
    }
}

/// Unique identifier assigned to an entity by the registry.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
pub struct EntityId(u32);

impl EntityId {
    /// Creates a new entity identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Draw-order bucket doubling as the collision category of an entity.
///
/// Lower layers are drawn before higher layers; the collision resolver
/// addresses entity groups by this tag.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Layer {
    /// Static level backdrop.
    Background,
    /// Painted decals with no behaviour.
    Decal,
    /// Placed turret bodies.
    Turret,
    /// Turret sight cones, drawn above their turrets.
    TurretSight,
    /// Decorative shrubs placed by the editor.
    Shrub,
    /// Mobile enemies.
    Enemy,
    /// In-flight projectiles.
    Projectile,
    /// Heads-up display panels, always on top.
    Hud,
}

impl Layer {
    /// Numeric draw-order bucket for the layer.
    #[must_use]
    pub const fn draw_order(self) -> u8 {
        match self {
            Self::Background => 0,
            Self::Decal => 10,
            Self::Turret => 20,
            Self::TurretSight => 21,
            Self::Shrub => 25,
            Self::Enemy => 30,
            Self::Projectile => 40,
            Self::Hud => 60,
        }
    }
}

/// Animation state driving the frame roll attached to an entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AnimationState {
    /// No animation is advancing.
    #[default]
    Stopped,
    /// Looping walk roll for mobile enemies.
    Walking,
    /// Finite death roll; terminal for enemies.
    Dying,
    /// Finite explosion roll; terminal for projectiles.
    Exploding,
}

impl AnimationState {
    /// Reports whether exhausting the roll in this state destroys the entity.
    #[must_use]
    pub const fn kills_sprite(self) -> bool {
        matches!(self, Self::Dying | Self::Exploding)
    }
}

/// Motion state of a trajectory-driven entity.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum MotionState {
    /// The entity has no trajectory assigned.
    #[default]
    Idle,
    /// The entity is consuming trajectory samples.
    Moving,
    /// The trajectory is exhausted; the entity reached its destination.
    Stopped,
}

/// Sound cue forwarded to the audio collaborator through the event stream.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cue {
    /// Enemy footstep cadence.
    Footsteps,
    /// Turret muzzle report.
    TurretFire,
    /// Projectile impact.
    Impact,
    /// Score ticker for an escaped enemy.
    Score,
}

/// Events broadcast by the engine after each simulation tick.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Event {
    /// A level document finished loading into the world.
    LevelLoaded {
        /// Number of tile columns in the loaded grid.
        columns: u32,
        /// Number of tile rows in the loaded grid.
        rows: u32,
    },
    /// The wave scheduler requested enemy spawns this tick.
    WavePulse {
        /// Number of enemies actually spawned.
        spawned: u32,
    },
    /// A turret fired a projectile at an enemy.
    TurretFired {
        /// Identifier of the firing turret.
        turret: EntityId,
        /// Identifier of the targeted enemy.
        enemy: EntityId,
    },
    /// A projectile struck an enemy.
    EnemyKilled {
        /// Identifier of the struck enemy.
        enemy: EntityId,
        /// Identifier of the colliding projectile.
        projectile: EntityId,
    },
    /// An enemy exhausted its trajectory without being killed.
    EnemyEscaped {
        /// Identifier of the escaped enemy.
        enemy: EntityId,
    },
    /// A projectile reached its maximum travel distance.
    ProjectileExploded {
        /// Identifier of the exploding projectile.
        projectile: EntityId,
    },
    /// The elimination mode raised its difficulty scalar.
    IntensityRaised {
        /// New intensity level.
        intensity: u32,
        /// New maximum concurrent turret allowance.
        max_defenses: u32,
    },
    /// A sound cue should be played by the audio collaborator.
    CuePlayed {
        /// Cue to play.
        cue: Cue,
    },
}

/// A single background cell of the level document.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TileSpec {
    /// Tile id string.
    pub index: TileKind,
    /// Placement orientation in whole degrees.
    pub orientation: Orientation,
}

/// A single decorative shrub of the level document.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ShrubSpec {
    /// Shrub id string.
    pub index: TileKind,
    /// Pixel-center position of the shrub.
    pub position: Vec2,
    /// Placement orientation in whole degrees.
    pub orientation: Orientation,
}

/// Structured level document exchanged with the persistence collaborator.
///
/// The document carries no version field; loaders must tolerate exactly this
/// shape and fail fast on anything else.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct LevelDocument {
    /// Row-major background grid, one entry per cell.
    pub background: Vec<Vec<TileSpec>>,
    /// Decorative shrubs placed over the background.
    pub shrubs: Vec<ShrubSpec>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::de::DeserializeOwned;

    #[test]
    fn manhattan_distance_matches_expectation() {
        let origin = GridCoord::new(1, 1);
        let destination = GridCoord::new(4, 3);
        assert_eq!(origin.manhattan_distance(destination), 5);
        assert_eq!(destination.manhattan_distance(origin), 5);
    }

    #[test]
    fn orientation_parses_only_right_angles() {
        assert_eq!(Orientation::from_degrees(90), Some(Orientation::Deg90));
        assert_eq!(Orientation::from_degrees(91), None);
        assert_eq!(Orientation::Deg270.degrees(), 270);
        assert_eq!(Orientation::Deg270.rotated_cw(), Orientation::Deg0);
    }

    #[test]
    fn layer_draw_order_is_strictly_increasing() {
        let layers = [
            Layer::Background,
            Layer::Decal,
            Layer::Turret,
            Layer::TurretSight,
            Layer::Shrub,
            Layer::Enemy,
            Layer::Projectile,
            Layer::Hud,
        ];
        for pair in layers.windows(2) {
            assert!(pair[0].draw_order() < pair[1].draw_order());
            assert!(pair[0] < pair[1]);
        }
    }

    #[test]
    fn kill_states_are_exactly_dying_and_exploding() {
        assert!(AnimationState::Dying.kills_sprite());
        assert!(AnimationState::Exploding.kills_sprite());
        assert!(!AnimationState::Stopped.kills_sprite());
        assert!(!AnimationState::Walking.kills_sprite());
    }

    fn assert_round_trip<T>(value: &T)
    where
        T: serde::Serialize + DeserializeOwned + PartialEq + std::fmt::Debug,
    {
        let bytes = bincode::serialize(value).expect("serialize");
        let restored: T = bincode::deserialize(&bytes).expect("deserialize");
        assert_eq!(&restored, value);
    }

    #[test]
    fn entity_id_round_trips_through_bincode() {
        assert_round_trip(&EntityId::new(42));
    }

    #[test]
    fn grid_coord_round_trips_through_bincode() {
        assert_round_trip(&GridCoord::new(5, 7));
    }

    #[test]
    fn tile_kind_uses_level_document_id_strings() {
        let json = serde_json::to_string(&TileKind::RoadSpawn).expect("serialize");
        assert_eq!(json, "\"road_spawn\"");
        let parsed: TileKind = serde_json::from_str("\"road_escape\"").expect("deserialize");
        assert_eq!(parsed, TileKind::RoadEscape);
    }

    #[test]
    fn orientation_serializes_as_integer_degrees() {
        let json = serde_json::to_string(&Orientation::Deg180).expect("serialize");
        assert_eq!(json, "180");
        assert!(serde_json::from_str::<Orientation>("45").is_err());
    }

    #[test]
    fn level_document_round_trips_through_json() {
        let document = LevelDocument {
            background: vec![vec![
                TileSpec {
                    index: TileKind::RoadSpawn,
                    orientation: Orientation::Deg0,
                },
                TileSpec {
                    index: TileKind::Road,
                    orientation: Orientation::Deg90,
                },
            ]],
            shrubs: vec![ShrubSpec {
                index: TileKind::Grass,
                position: Vec2::new(96.0, 32.0),
                orientation: Orientation::Deg0,
            }],
        };

        let json = serde_json::to_string(&document).expect("serialize");
        let restored: LevelDocument = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(restored, document);
    }
}
