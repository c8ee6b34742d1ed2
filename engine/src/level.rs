//! Level-document validation and conversion.
//!
//! The document shape is fixed: a rectangular background grid plus a shrub
//! list. Validation runs in full before any world state is touched, so a
//! malformed document can never leave a partial load behind.

use std::{error::Error, fmt};

use tower_defence_core::{GridCoord, LevelDocument, ShrubSpec, TileKind, TileSpec};
use tower_defence_world::entity::EntityKind;
use tower_defence_world::grid::Grid;
use tower_defence_world::World;

use crate::StateError;

/// Errors surfaced by level loading; the load fails fast and whole.
#[derive(Debug)]
pub enum LevelError {
    /// The engine was not in a state that allows loading.
    State(StateError),
    /// The background grid carried no rows or no columns.
    EmptyBackground,
    /// A background row did not match the width of the first row.
    RaggedRow {
        /// Zero-based index of the offending row.
        row: usize,
        /// Width of the first row.
        expected: usize,
        /// Width of the offending row.
        actual: usize,
    },
    /// A shrub referenced tile art that is not decorative.
    ShrubNotDecorative {
        /// Zero-based index of the offending shrub.
        index: usize,
        /// Tile kind the shrub referenced.
        kind: TileKind,
    },
    /// A shrub's pixel center fell outside the background grid.
    ShrubOutOfBounds {
        /// Zero-based index of the offending shrub.
        index: usize,
    },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::State(error) => write!(f, "level load refused: {error}"),
            Self::EmptyBackground => write!(f, "level document has an empty background grid"),
            Self::RaggedRow {
                row,
                expected,
                actual,
            } => write!(
                f,
                "background row {row} holds {actual} tiles, expected {expected}"
            ),
            Self::ShrubNotDecorative { index, kind } => {
                write!(f, "shrub {index} references non-decorative tile {kind:?}")
            }
            Self::ShrubOutOfBounds { index } => {
                write!(f, "shrub {index} lies outside the background grid")
            }
        }
    }
}

impl Error for LevelError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::State(error) => Some(error),
            _ => None,
        }
    }
}

/// Builds a grid from the document's background, validating its shape.
pub(crate) fn grid_from_document(document: &LevelDocument) -> Result<Grid, LevelError> {
    let rows = document.background.len();
    let columns = document.background.first().map_or(0, Vec::len);
    if rows == 0 || columns == 0 {
        return Err(LevelError::EmptyBackground);
    }

    for (row, entries) in document.background.iter().enumerate() {
        if entries.len() != columns {
            return Err(LevelError::RaggedRow {
                row,
                expected: columns,
                actual: entries.len(),
            });
        }
    }

    let mut grid = Grid::new(columns as u32, rows as u32);
    for (row, entries) in document.background.iter().enumerate() {
        for (column, spec) in entries.iter().enumerate() {
            let _ = grid.set_tile(
                GridCoord::new(column as u32, row as u32),
                spec.index,
                spec.orientation,
            );
        }
    }
    Ok(grid)
}

/// Validates the shrub list against the already-validated grid.
pub(crate) fn validate_shrubs(document: &LevelDocument, grid: &Grid) -> Result<(), LevelError> {
    for (index, shrub) in document.shrubs.iter().enumerate() {
        if !shrub.index.is_decorative() {
            return Err(LevelError::ShrubNotDecorative {
                index,
                kind: shrub.index,
            });
        }
        let inside = shrub.position.x >= 0.0
            && shrub.position.y >= 0.0
            && shrub.position.x <= grid.pixel_width()
            && shrub.position.y <= grid.pixel_height();
        if !inside {
            return Err(LevelError::ShrubOutOfBounds { index });
        }
    }
    Ok(())
}

/// Produces the persistence document for the current world state.
pub(crate) fn document_from_world(world: &World) -> LevelDocument {
    let grid = world.grid();
    let mut background = Vec::with_capacity(grid.rows() as usize);
    for row in 0..grid.rows() {
        let mut entries = Vec::with_capacity(grid.columns() as usize);
        for column in 0..grid.columns() {
            let tile = grid
                .tile(GridCoord::new(column, row))
                .expect("grid iteration stays in bounds");
            entries.push(TileSpec {
                index: tile.kind(),
                orientation: tile.orientation(),
            });
        }
        background.push(entries);
    }

    let shrubs = world
        .registry()
        .layer(tower_defence_core::Layer::Shrub)
        .filter_map(|(_, entity)| match entity.kind() {
            EntityKind::Shrub { kind, orientation } => Some(ShrubSpec {
                index: *kind,
                position: entity.body().position(),
                orientation: *orientation,
            }),
            _ => None,
        })
        .collect();

    LevelDocument { background, shrubs }
}
