#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Orchestrating engine for the Tower Defence core.
//!
//! The engine owns the authoritative world, the pathfinding routes, the
//! active game mode and the session RNG, and drives the fixed tick order:
//! input application, mode advancement (spawn decisions), entity update
//! (animation and motion), collision resolution, event broadcast. The
//! excluded game-loop/UI layer calls into this crate and receives the event
//! stream back; rendering and audio react to it elsewhere.

mod assets;
mod level;

pub use level::LevelError;

use std::{error::Error, fmt};

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tracing::{debug, info};

use tower_defence_core::{
    Cue, EntityId, Event, GridCoord, LevelDocument, Orientation, TileKind, DEFAULT_TILES_X,
    DEFAULT_TILES_Y,
};
use tower_defence_system_combat::{resolve, Action};
use tower_defence_system_motion::{Ballistic, Easing, Trajectory};
use tower_defence_system_pathfinding::{
    find_path, reachable_routes, IslandGraph, IslandRoute, Portals,
};
use tower_defence_system_waves::{Elimination, GameMode};
use tower_defence_world::entity::EntityKind;
use tower_defence_world::grid::Grid;
use tower_defence_world::World;

/// Interpolation steps per path segment; governs walking speed.
const ENEMY_STEPS_PER_SEGMENT: u32 = 40;

/// Bound of the per-enemy spawn jitter in pixels.
const ENEMY_JITTER: i32 = 10;

/// Projectile speed in pixels per tick.
const PROJECTILE_SPEED: f32 = 8.0;

/// Maximum projectile travel distance before it auto-explodes.
const PROJECTILE_MAX_DISTANCE: f32 = 480.0;

/// Minimal game-state contract needed to drive the core loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameState {
    /// Nothing is set up yet; only `initialize` is legal.
    Initializing,
    /// Assets registered; a level may be loaded and a session started.
    Initialized,
    /// The map editor owns the session.
    MapEditing,
    /// A battle is running.
    Playing,
    /// The battle ended; the orchestrator decides what happens next.
    Ended,
}

/// Raised when an operation requires a game state the engine is not in.
///
/// Fatal to the calling operation and surfaced immediately; the
/// orchestrating loop decides whether to abort to its menu or hard-fail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct StateError {
    /// States the operation would have accepted.
    pub expected: &'static [GameState],
    /// State the engine was actually in.
    pub actual: GameState,
}

impl fmt::Display for StateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "expected state to be one of {:?}, not {:?}",
            self.expected, self.actual
        )
    }
}

impl Error for StateError {}

/// Player intents applied at the start of a tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Input {
    /// Pick up a new turret selection at the cursor.
    SelectTurret {
        /// Cursor position in pixels.
        position: Vec2,
    },
    /// Pick up a new shrub selection at the cursor (editor only).
    SelectShrub {
        /// Decorative tile art to place.
        kind: TileKind,
        /// Cursor position in pixels.
        position: Vec2,
    },
    /// Drag the current selection to the cursor.
    MoveSelection {
        /// Cursor position in pixels.
        position: Vec2,
    },
    /// Commit the current selection at the cursor.
    PlaceSelection {
        /// Cursor position in pixels.
        position: Vec2,
    },
    /// Discard the current selection.
    ClearSelection,
    /// Replace a background tile (editor only).
    PaintTile {
        /// Cell to repaint.
        coord: GridCoord,
        /// New tile kind.
        kind: TileKind,
        /// New tile orientation.
        orientation: Orientation,
    },
    /// Stamp a decorative decal at the cursor (editor only).
    PaintDecal {
        /// Decorative tile art to stamp.
        kind: TileKind,
        /// Cursor position in pixels.
        position: Vec2,
    },
}

/// The simulation root invoked by the excluded game-loop layer.
#[derive(Debug)]
pub struct Engine {
    state: GameState,
    world: World,
    mode: Box<dyn GameMode>,
    rng: ChaCha8Rng,
    routes: Vec<IslandRoute>,
    selection: Option<EntityId>,
    hud: Option<EntityId>,
    pending: Vec<Event>,
}

impl Engine {
    /// Creates an engine seeded for reproducible sessions, running the
    /// default elimination mode.
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self::with_mode(seed, Box::<Elimination>::default())
    }

    /// Creates an engine running the provided game mode.
    #[must_use]
    pub fn with_mode(seed: u64, mode: Box<dyn GameMode>) -> Self {
        Self {
            state: GameState::Initializing,
            world: World::new(Grid::new(DEFAULT_TILES_X, DEFAULT_TILES_Y)),
            mode,
            rng: ChaCha8Rng::seed_from_u64(seed),
            routes: Vec::new(),
            selection: None,
            hud: None,
            pending: Vec::new(),
        }
    }

    /// Registers sprite frames and readies the engine.
    pub fn initialize(&mut self) -> Result<(), StateError> {
        self.assert_state(&[GameState::Initializing])?;
        assets::register_frames(self.world.atlas_mut());
        self.state = GameState::Initialized;
        info!("engine initialized");
        Ok(())
    }

    /// Current engine state.
    #[must_use]
    pub fn state(&self) -> GameState {
        self.state
    }

    /// Read access to the active game mode's counters.
    #[must_use]
    pub fn mode(&self) -> &dyn GameMode {
        self.mode.as_ref()
    }

    /// Read access to the authoritative world.
    #[must_use]
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Loads a level document, replacing the whole world state.
    ///
    /// Validation runs before any mutation: a rejected document leaves the
    /// previous level untouched.
    pub fn load_level(&mut self, document: &LevelDocument) -> Result<(), LevelError> {
        self.assert_state(&[
            GameState::Initialized,
            GameState::MapEditing,
            GameState::Ended,
        ])
        .map_err(LevelError::State)?;

        let grid = level::grid_from_document(document)?;
        level::validate_shrubs(document, &grid)?;

        let columns = grid.columns();
        let rows = grid.rows();
        self.world.reset_level(grid);
        for shrub in &document.shrubs {
            let _ = self
                .world
                .spawn_shrub(shrub.index, shrub.position, shrub.orientation);
        }
        let hud_position = Vec2::new(self.world.grid().pixel_width() * 0.5, 14.0);
        self.hud = self.world.install_hud(String::new(), hud_position);
        self.routes = reachable_routes(self.world.grid());
        self.mode.reset();
        self.selection = None;
        if self.state == GameState::Ended {
            self.state = GameState::Initialized;
        }
        self.pending.push(Event::LevelLoaded { columns, rows });
        info!(
            columns,
            rows,
            shrubs = document.shrubs.len(),
            routes = self.routes.len(),
            "level loaded"
        );
        Ok(())
    }

    /// Produces the persistence document for the current level.
    pub fn save_level(&self) -> Result<LevelDocument, StateError> {
        self.assert_state(&[
            GameState::Initialized,
            GameState::MapEditing,
            GameState::Playing,
            GameState::Ended,
        ])?;
        Ok(level::document_from_world(&self.world))
    }

    /// Hands the session to the map editor.
    pub fn enter_editor(&mut self) -> Result<(), StateError> {
        self.assert_state(&[GameState::Initialized, GameState::Ended])?;
        self.state = GameState::MapEditing;
        Ok(())
    }

    /// Starts a battle with the active game mode.
    pub fn start_game(&mut self) -> Result<(), StateError> {
        self.assert_state(&[
            GameState::Initialized,
            GameState::MapEditing,
            GameState::Ended,
        ])?;
        self.mode.reset();
        self.state = GameState::Playing;
        Ok(())
    }

    /// Advances the simulation by one tick.
    ///
    /// Fixed order within the tick: inputs, mode advancement (spawn
    /// decisions), entity update, collision resolution. Events describing
    /// everything that happened are returned for the rendering and audio
    /// collaborators.
    pub fn tick(&mut self, inputs: &[Input]) -> Result<Vec<Event>, StateError> {
        self.assert_state(&[GameState::Playing, GameState::MapEditing])?;
        let mut events = std::mem::take(&mut self.pending);

        for input in inputs {
            self.apply_input(*input);
        }

        if self.state == GameState::Playing {
            let requested = self.mode.next(&mut self.rng);
            if requested > 0 {
                let mut spawned = 0;
                for _ in 0..requested {
                    if self.spawn_pathed_enemy() {
                        spawned += 1;
                    }
                }
                events.push(Event::WavePulse { spawned });
            }
        }

        self.world.update_entities(&mut events);

        if self.state == GameState::Playing {
            let mut actions = Vec::new();
            resolve(&self.world, &mut actions);
            self.apply_actions(&actions, &mut events);

            if self.mode.has_lost() {
                info!(
                    escaped = self.mode.escaped(),
                    intensity = self.mode.intensity(),
                    "battle lost"
                );
                self.state = GameState::Ended;
            }
        }

        self.refresh_hud();
        Ok(events)
    }

    /// Spawns one enemy immediately, outside the wave schedule.
    ///
    /// Returns false when no route exists: the spawn is skipped during
    /// play, while the editor falls back to a static placement.
    pub fn spawn_enemy(&mut self) -> Result<bool, StateError> {
        self.assert_state(&[GameState::Playing, GameState::MapEditing])?;
        Ok(self.spawn_pathed_enemy())
    }

    /// Ids of the entities whose center lies within the given tile.
    #[must_use]
    pub fn entities_at(&self, coord: GridCoord) -> Vec<EntityId> {
        self.world.entities_at(coord)
    }

    /// Picks up a new turret selection, honouring the mode's allowance.
    pub fn select_turret(&mut self, position: Vec2) -> Option<EntityId> {
        if self.state == GameState::Playing
            && !self
                .mode
                .allows_placement(self.world.placed_turret_count())
        {
            return None;
        }
        if !matches!(self.state, GameState::Playing | GameState::MapEditing) {
            return None;
        }
        let _ = self.drop_selection();
        let (turret, _) = self.world.spawn_turret(position, false)?;
        self.selection = Some(turret);
        Some(turret)
    }

    /// Picks up a new shrub selection; editor only.
    pub fn select_shrub(&mut self, kind: TileKind, position: Vec2) -> Option<EntityId> {
        if self.state != GameState::MapEditing || !kind.is_decorative() {
            return None;
        }
        let _ = self.drop_selection();
        let shrub = self
            .world
            .spawn_shrub(kind, position, Orientation::Deg0)?;
        self.selection = Some(shrub);
        Some(shrub)
    }

    /// Drags the current selection to the cursor.
    pub fn move_selection(&mut self, position: Vec2) -> bool {
        match self.selection {
            Some(id) => self.world.move_entity(id, position),
            None => false,
        }
    }

    /// Commits the current selection at `position`.
    ///
    /// Turrets snap to the center of the tile under the cursor; shrubs are
    /// placed free-form. Returns false when there is no selection or the
    /// cursor is outside the grid.
    pub fn place_selection(&mut self, position: Vec2) -> bool {
        let Some(id) = self.selection else {
            return false;
        };
        let is_turret = match self.world.registry().get(id) {
            Some(entity) => matches!(entity.kind(), EntityKind::Turret { .. }),
            None => {
                self.selection = None;
                return false;
            }
        };
        let target = if is_turret {
            match self.world.grid().coord_at(position) {
                Some(coord) => self.world.grid().center_of(coord),
                None => return false,
            }
        } else {
            position
        };
        if self.world.finalize_placement(id, target) {
            self.selection = None;
            true
        } else {
            false
        }
    }

    /// Discards the current selection, destroying its entities.
    pub fn clear_selection(&mut self) -> bool {
        self.drop_selection()
    }

    /// Repaints a background tile; editor only. Routes are rebuilt because
    /// terrain edits change the connectivity graph.
    pub fn paint_tile(
        &mut self,
        coord: GridCoord,
        kind: TileKind,
        orientation: Orientation,
    ) -> bool {
        if self.state != GameState::MapEditing {
            return false;
        }
        if !self.world.grid_mut().set_tile(coord, kind, orientation) {
            return false;
        }
        self.routes = reachable_routes(self.world.grid());
        true
    }

    /// Stamps a decorative decal; editor only.
    pub fn paint_decal(&mut self, kind: TileKind, position: Vec2) -> Option<EntityId> {
        if self.state != GameState::MapEditing || !kind.is_decorative() {
            return None;
        }
        self.world.spawn_decal(kind, position)
    }

    fn apply_input(&mut self, input: Input) {
        match input {
            Input::SelectTurret { position } => {
                let _ = self.select_turret(position);
            }
            Input::SelectShrub { kind, position } => {
                let _ = self.select_shrub(kind, position);
            }
            Input::MoveSelection { position } => {
                let _ = self.move_selection(position);
            }
            Input::PlaceSelection { position } => {
                let _ = self.place_selection(position);
            }
            Input::ClearSelection => {
                let _ = self.clear_selection();
            }
            Input::PaintTile {
                coord,
                kind,
                orientation,
            } => {
                let _ = self.paint_tile(coord, kind, orientation);
            }
            Input::PaintDecal { kind, position } => {
                let _ = self.paint_decal(kind, position);
            }
        }
    }

    fn drop_selection(&mut self) -> bool {
        match self.selection.take() {
            Some(id) => self.world.remove_entity(id).is_some(),
            None => false,
        }
    }

    fn spawn_pathed_enemy(&mut self) -> bool {
        if self.routes.is_empty() {
            return self.spawn_unpathed_enemy();
        }
        let index = self.rng.gen_range(0..self.routes.len());
        let route = self.routes[index].clone();

        let path = match IslandGraph::flood(self.world.grid(), route.spawn) {
            Some(graph) => find_path(&graph, route.spawn, &route.escapes, &mut self.rng),
            None => Vec::new(),
        };
        if path.is_empty() {
            return self.spawn_unpathed_enemy();
        }

        let waypoints: Vec<Vec2> = path
            .iter()
            .map(|coord| self.world.grid().center_of(*coord))
            .collect();
        let trajectory = Trajectory::build(
            &waypoints,
            ENEMY_STEPS_PER_SEGMENT,
            ENEMY_JITTER,
            Easing::CubeInOut,
            &mut self.rng,
        );
        let spawned = self
            .world
            .spawn_enemy_entity(waypoints[0], Some(trajectory))
            .is_some();
        if spawned {
            debug!(spawn = ?route.spawn, hops = path.len(), "enemy spawned");
        }
        spawned
    }

    /// No-route fallback: recoverable, never fatal. The editor places the
    /// enemy statically on a spawn portal; play skips the spawn this tick.
    fn spawn_unpathed_enemy(&mut self) -> bool {
        if self.state != GameState::MapEditing {
            return false;
        }
        let portals = Portals::scan(self.world.grid());
        if portals.spawns().is_empty() {
            return false;
        }
        let index = self.rng.gen_range(0..portals.spawns().len());
        let center = self.world.grid().center_of(portals.spawns()[index]);
        self.world.spawn_enemy_entity(center, None).is_some()
    }

    fn apply_actions(&mut self, actions: &[Action], events: &mut Vec<Event>) {
        for action in actions {
            match *action {
                Action::Fire { turret, enemy } => {
                    let Some(from) = self
                        .world
                        .registry()
                        .get(turret)
                        .map(|entity| entity.body().position())
                    else {
                        continue;
                    };
                    let Some(to) = self
                        .world
                        .registry()
                        .get(enemy)
                        .map(|entity| entity.body().position())
                    else {
                        continue;
                    };
                    // Coincident centers cannot be aimed at; skip the shot.
                    let Some(flight) =
                        Ballistic::aim(from, to, PROJECTILE_SPEED, PROJECTILE_MAX_DISTANCE)
                    else {
                        continue;
                    };
                    if !self.world.reset_turret_cooldown(turret) {
                        continue;
                    }
                    if self.world.spawn_projectile(turret, enemy, flight).is_some() {
                        debug!(turret = turret.get(), enemy = enemy.get(), "turret fired");
                        events.push(Event::TurretFired { turret, enemy });
                        events.push(Event::CuePlayed {
                            cue: Cue::TurretFire,
                        });
                    }
                }
                Action::Hit { enemy, projectile } => {
                    if self.world.kill_enemy(enemy) {
                        debug!(enemy = enemy.get(), "enemy killed");
                        events.push(Event::EnemyKilled { enemy, projectile });
                        if let Some(shift) = self.mode.record_kill() {
                            info!(
                                intensity = shift.intensity,
                                max_defenses = shift.max_defenses,
                                "intensity raised"
                            );
                            events.push(Event::IntensityRaised {
                                intensity: shift.intensity,
                                max_defenses: shift.max_defenses,
                            });
                        }
                    }
                    if self.world.explode_projectile(projectile) {
                        events.push(Event::CuePlayed { cue: Cue::Impact });
                    }
                }
                Action::Escape { enemy } => {
                    if self.world.escape_enemy(enemy) {
                        debug!(enemy = enemy.get(), "enemy escaped");
                        self.mode.record_escape();
                        events.push(Event::EnemyEscaped { enemy });
                        events.push(Event::CuePlayed { cue: Cue::Score });
                    }
                }
            }
        }
    }

    fn refresh_hud(&mut self) {
        if let Some(hud) = self.hud {
            let text = format!(
                "kills {}  escaped {}  intensity {}",
                self.mode.killed(),
                self.mode.escaped(),
                self.mode.intensity()
            );
            let _ = self.world.set_hud_text(hud, text);
        }
    }

    fn assert_state(&self, expected: &'static [GameState]) -> Result<(), StateError> {
        if expected.contains(&self.state) {
            Ok(())
        } else {
            Err(StateError {
                expected,
                actual: self.state,
            })
        }
    }
}
