#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Grid pathfinding: portal discovery, island graph construction, and the
//! randomized depth-first search that turns a tile grid into walkable
//! routes.
//!
//! Graphs are ephemeral by design: every query flood-fills a fresh
//! [`IslandGraph`] from the grid rather than caching connectivity, so map
//! edits can never leave a stale graph behind. The search is deliberately
//! not shortest-path: shuffling the neighbour order makes enemies wander
//! organically while the visited set still guarantees termination.

use std::collections::{HashMap, HashSet};

use rand::seq::SliceRandom;
use rand::Rng;
use tower_defence_core::GridCoord;
use tower_defence_world::grid::Grid;

/// Spawn and escape portals discovered in a grid.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Portals {
    spawns: Vec<GridCoord>,
    escapes: Vec<GridCoord>,
}

impl Portals {
    /// Walks the grid tile by tile and records every portal position.
    #[must_use]
    pub fn scan(grid: &Grid) -> Self {
        let mut portals = Self::default();
        for (coord, tile) in grid.iter() {
            if tile.kind().is_spawn() {
                portals.spawns.push(coord);
            } else if tile.kind().is_escape() {
                portals.escapes.push(coord);
            }
        }
        portals
    }

    /// Spawn portal positions in row-major order.
    #[must_use]
    pub fn spawns(&self) -> &[GridCoord] {
        &self.spawns
    }

    /// Escape portal positions in row-major order.
    #[must_use]
    pub fn escapes(&self) -> &[GridCoord] {
        &self.escapes
    }
}

/// Index of a node within an [`IslandGraph`] arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

#[derive(Clone, Debug)]
struct Node {
    coord: GridCoord,
    neighbors: [Option<NodeId>; 4],
}

/// Adjacency graph over one island of traffic-routing tiles.
///
/// Nodes are arena-allocated and wired with up to four cardinal neighbour
/// indices. A node exists iff its tile routes traffic (walkable or portal).
/// The graph is scoped to a single pathfinding query.
#[derive(Clone, Debug)]
pub struct IslandGraph {
    nodes: Vec<Node>,
    index: HashMap<GridCoord, NodeId>,
}

impl IslandGraph {
    /// Flood-fills the island containing `start`.
    ///
    /// Returns `None` when the start tile itself does not route traffic.
    #[must_use]
    pub fn flood(grid: &Grid, start: GridCoord) -> Option<Self> {
        let routes = |coord: GridCoord| {
            grid.tile(coord)
                .is_some_and(|tile| tile.kind().routes_traffic())
        };
        if !routes(start) {
            return None;
        }

        let mut graph = Self {
            nodes: Vec::new(),
            index: HashMap::new(),
        };
        let start_id = graph.push(start);
        let mut frontier = vec![start_id];

        while let Some(node_id) = frontier.pop() {
            let coord = graph.nodes[node_id.0].coord;
            for (slot, neighbor) in cardinal_neighbors(coord).into_iter().enumerate() {
                let Some(neighbor) = neighbor else {
                    continue;
                };
                if !routes(neighbor) {
                    continue;
                }
                let neighbor_id = match graph.index.get(&neighbor) {
                    Some(existing) => *existing,
                    None => {
                        let created = graph.push(neighbor);
                        frontier.push(created);
                        created
                    }
                };
                graph.nodes[node_id.0].neighbors[slot] = Some(neighbor_id);
            }
        }

        Some(graph)
    }

    /// Node covering `coord`, if the island contains it.
    #[must_use]
    pub fn node_at(&self, coord: GridCoord) -> Option<NodeId> {
        self.index.get(&coord).copied()
    }

    /// Grid coordinate of a node.
    #[must_use]
    pub fn coord(&self, node: NodeId) -> GridCoord {
        self.nodes[node.0].coord
    }

    /// Cardinal neighbour slots of a node; absent slots are `None`.
    #[must_use]
    pub fn neighbors(&self, node: NodeId) -> [Option<NodeId>; 4] {
        self.nodes[node.0].neighbors
    }

    /// Number of nodes in the island.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Reports whether the island holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn push(&mut self, coord: GridCoord) -> NodeId {
        let id = NodeId(self.nodes.len());
        self.nodes.push(Node {
            coord,
            neighbors: [None; 4],
        });
        let _ = self.index.insert(coord, id);
        id
    }
}

/// One spawn portal together with the escape portals its island reaches.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IslandRoute {
    /// Spawn portal anchoring the island.
    pub spawn: GridCoord,
    /// Escape portals reachable from the spawn.
    pub escapes: Vec<GridCoord>,
}

/// Pairs every spawn portal with the escape portals its island reaches.
///
/// Each spawn consumes its own flood fill, so disconnected islands are
/// partitioned correctly without any global connectivity analysis. Spawns
/// that reach no escape contribute nothing: the caller treats an empty
/// result as "no enemy can currently spawn via pathing".
#[must_use]
pub fn reachable_routes(grid: &Grid) -> Vec<IslandRoute> {
    let portals = Portals::scan(grid);
    let mut routes = Vec::new();

    for &spawn in portals.spawns() {
        let Some(graph) = IslandGraph::flood(grid, spawn) else {
            continue;
        };
        let escapes: Vec<GridCoord> = portals
            .escapes()
            .iter()
            .copied()
            .filter(|escape| graph.node_at(*escape).is_some())
            .collect();
        if !escapes.is_empty() {
            routes.push(IslandRoute { spawn, escapes });
        }
    }

    routes
}

/// Randomized depth-first search from `start` to any of `stops`.
///
/// Returns the visited node coordinates in walk order, start and stop
/// included, or an empty vector when no stop is reachable. The path is
/// *a* path, never guaranteed shortest; the shuffled neighbour order gives
/// route diversity across calls. Every node appears at most once and the
/// visited set bounds the recursion by the island size.
#[must_use]
pub fn find_path<R: Rng>(
    graph: &IslandGraph,
    start: GridCoord,
    stops: &[GridCoord],
    rng: &mut R,
) -> Vec<GridCoord> {
    let Some(start_id) = graph.node_at(start) else {
        return Vec::new();
    };
    let stop_set: HashSet<GridCoord> = stops.iter().copied().collect();
    if stop_set.is_empty() {
        return Vec::new();
    }

    let mut visited: HashSet<GridCoord> = HashSet::new();
    let mut path = Vec::new();
    if walk(graph, start_id, &stop_set, &mut visited, &mut path, rng) {
        path
    } else {
        Vec::new()
    }
}

fn walk<R: Rng>(
    graph: &IslandGraph,
    node: NodeId,
    stops: &HashSet<GridCoord>,
    visited: &mut HashSet<GridCoord>,
    path: &mut Vec<GridCoord>,
    rng: &mut R,
) -> bool {
    let coord = graph.coord(node);
    if !visited.insert(coord) {
        return false;
    }
    path.push(coord);

    if stops.contains(&coord) {
        return true;
    }

    let mut directions = graph.neighbors(node);
    directions.shuffle(rng);
    for next in directions.into_iter().flatten() {
        if walk(graph, next, stops, visited, path, rng) {
            return true;
        }
    }

    let _ = path.pop();
    false
}

fn cardinal_neighbors(coord: GridCoord) -> [Option<GridCoord>; 4] {
    let east = Some(GridCoord::new(coord.column() + 1, coord.row()));
    let west = coord
        .column()
        .checked_sub(1)
        .map(|column| GridCoord::new(column, coord.row()));
    let north = coord
        .row()
        .checked_sub(1)
        .map(|row| GridCoord::new(coord.column(), row));
    let south = Some(GridCoord::new(coord.column(), coord.row() + 1));
    [east, west, north, south]
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tower_defence_core::{Orientation, TileKind};

    fn rng() -> ChaCha8Rng {
        ChaCha8Rng::seed_from_u64(0xdf5)
    }

    fn paint(grid: &mut Grid, coord: GridCoord, kind: TileKind) {
        assert!(grid.set_tile(coord, kind, Orientation::Deg0));
    }

    /// A single straight road: spawn at (0,0), escape at (3,0).
    fn straight_grid() -> Grid {
        let mut grid = Grid::new(4, 2);
        paint(&mut grid, GridCoord::new(0, 0), TileKind::RoadSpawn);
        paint(&mut grid, GridCoord::new(1, 0), TileKind::Road);
        paint(&mut grid, GridCoord::new(2, 0), TileKind::Road);
        paint(&mut grid, GridCoord::new(3, 0), TileKind::RoadEscape);
        grid
    }

    #[test]
    fn scan_finds_every_portal() {
        let grid = straight_grid();
        let portals = Portals::scan(&grid);
        assert_eq!(portals.spawns(), &[GridCoord::new(0, 0)]);
        assert_eq!(portals.escapes(), &[GridCoord::new(3, 0)]);
    }

    #[test]
    fn flood_covers_exactly_the_island() {
        let grid = straight_grid();
        let graph = IslandGraph::flood(&grid, GridCoord::new(0, 0)).expect("spawn routes traffic");
        assert_eq!(graph.len(), 4);
        assert!(graph.node_at(GridCoord::new(3, 0)).is_some());
        assert!(graph.node_at(GridCoord::new(0, 1)).is_none());
    }

    #[test]
    fn flood_rejects_non_routing_starts() {
        let grid = straight_grid();
        assert!(IslandGraph::flood(&grid, GridCoord::new(0, 1)).is_none());
        assert!(IslandGraph::flood(&grid, GridCoord::new(100, 100)).is_none());
    }

    #[test]
    fn straight_path_is_returned_in_line() {
        let grid = straight_grid();
        let graph = IslandGraph::flood(&grid, GridCoord::new(0, 0)).expect("island");
        let path = find_path(
            &graph,
            GridCoord::new(0, 0),
            &[GridCoord::new(3, 0)],
            &mut rng(),
        );
        assert_eq!(
            path,
            vec![
                GridCoord::new(0, 0),
                GridCoord::new(1, 0),
                GridCoord::new(2, 0),
                GridCoord::new(3, 0),
            ]
        );
    }

    #[test]
    fn paths_never_repeat_a_node() {
        let mut grid = Grid::new(5, 5);
        for row in 0..5 {
            for column in 0..5 {
                paint(&mut grid, GridCoord::new(column, row), TileKind::Road);
            }
        }
        paint(&mut grid, GridCoord::new(0, 0), TileKind::RoadSpawn);
        paint(&mut grid, GridCoord::new(4, 4), TileKind::RoadEscape);

        let graph = IslandGraph::flood(&grid, GridCoord::new(0, 0)).expect("island");
        for seed in 0..32 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let path = find_path(
                &graph,
                GridCoord::new(0, 0),
                &[GridCoord::new(4, 4)],
                &mut rng,
            );
            assert_eq!(path.first(), Some(&GridCoord::new(0, 0)));
            assert_eq!(path.last(), Some(&GridCoord::new(4, 4)));
            let unique: HashSet<GridCoord> = path.iter().copied().collect();
            assert_eq!(unique.len(), path.len(), "path repeats a node");
        }
    }

    #[test]
    fn unreachable_stop_yields_an_empty_path() {
        let mut grid = Grid::new(5, 1);
        paint(&mut grid, GridCoord::new(0, 0), TileKind::RoadSpawn);
        paint(&mut grid, GridCoord::new(1, 0), TileKind::Road);
        // (2,0) stays blank: the escape is cut off.
        paint(&mut grid, GridCoord::new(3, 0), TileKind::Road);
        paint(&mut grid, GridCoord::new(4, 0), TileKind::RoadEscape);

        let graph = IslandGraph::flood(&grid, GridCoord::new(0, 0)).expect("island");
        let path = find_path(
            &graph,
            GridCoord::new(0, 0),
            &[GridCoord::new(4, 0)],
            &mut rng(),
        );
        assert!(path.is_empty());
    }

    #[test]
    fn zero_walkable_grid_terminates_with_no_routes() {
        let mut grid = Grid::new(3, 3);
        paint(&mut grid, GridCoord::new(0, 0), TileKind::RoadSpawn);
        paint(&mut grid, GridCoord::new(2, 2), TileKind::RoadEscape);
        assert!(reachable_routes(&grid).is_empty());
    }

    #[test]
    fn islands_are_partitioned_per_spawn() {
        // Two disconnected corridors sharing one grid.
        let mut grid = Grid::new(5, 3);
        paint(&mut grid, GridCoord::new(0, 0), TileKind::RoadSpawn);
        paint(&mut grid, GridCoord::new(1, 0), TileKind::Road);
        paint(&mut grid, GridCoord::new(2, 0), TileKind::RoadEscape);
        paint(&mut grid, GridCoord::new(0, 2), TileKind::RoadSpawn);
        paint(&mut grid, GridCoord::new(1, 2), TileKind::Road);
        paint(&mut grid, GridCoord::new(2, 2), TileKind::Road);
        paint(&mut grid, GridCoord::new(3, 2), TileKind::RoadEscape);

        let routes = reachable_routes(&grid);
        assert_eq!(routes.len(), 2);
        assert_eq!(routes[0].spawn, GridCoord::new(0, 0));
        assert_eq!(routes[0].escapes, vec![GridCoord::new(2, 0)]);
        assert_eq!(routes[1].spawn, GridCoord::new(0, 2));
        assert_eq!(routes[1].escapes, vec![GridCoord::new(3, 2)]);
    }

    #[test]
    fn shuffling_produces_route_diversity() {
        let mut grid = Grid::new(3, 3);
        for row in 0..3 {
            for column in 0..3 {
                paint(&mut grid, GridCoord::new(column, row), TileKind::Road);
            }
        }
        paint(&mut grid, GridCoord::new(0, 0), TileKind::RoadSpawn);
        paint(&mut grid, GridCoord::new(2, 2), TileKind::RoadEscape);

        let graph = IslandGraph::flood(&grid, GridCoord::new(0, 0)).expect("island");
        let mut observed = HashSet::new();
        for seed in 0..16 {
            let mut rng = ChaCha8Rng::seed_from_u64(seed);
            let path = find_path(
                &graph,
                GridCoord::new(0, 0),
                &[GridCoord::new(2, 2)],
                &mut rng,
            );
            assert!(!path.is_empty());
            let _ = observed.insert(path);
        }
        assert!(observed.len() > 1, "expected diverse routes across seeds");
    }
}
