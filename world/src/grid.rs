//! Tile grid owned by the world and edited by the map editor.

use glam::Vec2;
use tower_defence_core::{GridCoord, Orientation, TileKind, TILE_LENGTH};

/// One placed background tile.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Tile {
    kind: TileKind,
    orientation: Orientation,
}

impl Tile {
    /// Creates a tile with the provided kind and orientation.
    #[must_use]
    pub const fn new(kind: TileKind, orientation: Orientation) -> Self {
        Self { kind, orientation }
    }

    /// Semantic kind of the tile.
    #[must_use]
    pub const fn kind(&self) -> TileKind {
        self.kind
    }

    /// Placement orientation of the tile.
    #[must_use]
    pub const fn orientation(&self) -> Orientation {
        self.orientation
    }
}

/// Dense row-major tile grid.
///
/// The background layer is total: every cell holds exactly one tile from
/// construction onward. Only the map editor mutates the grid; pathfinding
/// and play read it.
#[derive(Clone, Debug)]
pub struct Grid {
    columns: u32,
    rows: u32,
    tiles: Vec<Tile>,
}

impl Grid {
    /// Creates a grid of the given dimensions filled with blank tiles.
    #[must_use]
    pub fn new(columns: u32, rows: u32) -> Self {
        let capacity = columns as usize * rows as usize;
        Self {
            columns,
            rows,
            tiles: vec![Tile::new(TileKind::Blank, Orientation::Deg0); capacity],
        }
    }

    /// Number of tile columns.
    #[must_use]
    pub const fn columns(&self) -> u32 {
        self.columns
    }

    /// Number of tile rows.
    #[must_use]
    pub const fn rows(&self) -> u32 {
        self.rows
    }

    /// Tile stored at the provided coordinate, if it lies within the grid.
    #[must_use]
    pub fn tile(&self, coord: GridCoord) -> Option<&Tile> {
        self.index(coord).map(|index| &self.tiles[index])
    }

    /// Replaces the tile at `coord`, returning false when out of bounds.
    pub fn set_tile(&mut self, coord: GridCoord, kind: TileKind, orientation: Orientation) -> bool {
        match self.index(coord) {
            Some(index) => {
                self.tiles[index] = Tile::new(kind, orientation);
                true
            }
            None => false,
        }
    }

    /// Pixel-center position of the tile at `coord`.
    #[must_use]
    pub fn center_of(&self, coord: GridCoord) -> Vec2 {
        Vec2::new(
            (coord.column() as f32 + 0.5) * TILE_LENGTH,
            (coord.row() as f32 + 0.5) * TILE_LENGTH,
        )
    }

    /// Grid coordinate containing the provided pixel position, if any.
    #[must_use]
    pub fn coord_at(&self, position: Vec2) -> Option<GridCoord> {
        if position.x < 0.0 || position.y < 0.0 {
            return None;
        }
        let column = (position.x / TILE_LENGTH) as u32;
        let row = (position.y / TILE_LENGTH) as u32;
        let coord = GridCoord::new(column, row);
        self.index(coord).map(|_| coord)
    }

    /// Total pixel width of the grid.
    #[must_use]
    pub fn pixel_width(&self) -> f32 {
        self.columns as f32 * TILE_LENGTH
    }

    /// Total pixel height of the grid.
    #[must_use]
    pub fn pixel_height(&self) -> f32 {
        self.rows as f32 * TILE_LENGTH
    }

    /// Iterates every cell in row-major order.
    pub fn iter(&self) -> impl Iterator<Item = (GridCoord, &Tile)> {
        self.tiles.iter().enumerate().map(|(index, tile)| {
            let column = index as u32 % self.columns;
            let row = index as u32 / self.columns;
            (GridCoord::new(column, row), tile)
        })
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        if coord.column() < self.columns && coord.row() < self.rows {
            Some((coord.row() * self.columns + coord.column()) as usize)
        } else {
            None
        }
    }
}
