//! Built-in demo layout used when no level file is provided.

use glam::Vec2;
use tower_defence_core::{
    LevelDocument, Orientation, ShrubSpec, TileKind, TileSpec, TILE_LENGTH,
};

const DEMO_COLUMNS: usize = 10;
const DEMO_ROWS: usize = 6;
const ROAD_ROW: usize = 2;

/// A single west-to-east road with a handful of shrubs around it.
pub(crate) fn demo_level() -> LevelDocument {
    let mut background = Vec::with_capacity(DEMO_ROWS);
    for row in 0..DEMO_ROWS {
        let mut entries = Vec::with_capacity(DEMO_COLUMNS);
        for column in 0..DEMO_COLUMNS {
            let kind = if row == ROAD_ROW {
                match column {
                    0 => TileKind::RoadSpawn,
                    _ if column == DEMO_COLUMNS - 1 => TileKind::RoadEscape,
                    _ => TileKind::Road,
                }
            } else {
                TileKind::Blank
            };
            entries.push(TileSpec {
                index: kind,
                orientation: Orientation::Deg0,
            });
        }
        background.push(entries);
    }

    let shrubs = vec![
        ShrubSpec {
            index: TileKind::Grass,
            position: Vec2::new(TILE_LENGTH * 2.5, TILE_LENGTH * 1.3),
            orientation: Orientation::Deg0,
        },
        ShrubSpec {
            index: TileKind::Rocks,
            position: Vec2::new(TILE_LENGTH * 6.2, TILE_LENGTH * 4.4),
            orientation: Orientation::Deg90,
        },
    ];

    LevelDocument { background, shrubs }
}

/// Center of the `slot`-th turret position, spread along the road.
pub(crate) fn turret_position(slot: u32) -> Vec2 {
    let column = 2 + slot as usize * 3;
    let column = column.min(DEMO_COLUMNS - 2);
    Vec2::new(
        (column as f32 + 0.5) * TILE_LENGTH,
        (ROAD_ROW as f32 + 0.5) * TILE_LENGTH,
    )
}
