#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative world state for the Tower Defence engine.
//!
//! The world owns the tile grid, the layered entity registry, and the
//! sprite atlas together with its rotation cache. The per-tick entity
//! update lives here: rotation cursors advance, frames re-render through
//! the cache only when the target angle changes, animation rolls drive
//! frame swaps and entity destruction, and every frame change keeps the
//! collision mask synchronized with the displayed image.

pub mod cursors;
pub mod entity;
pub mod grid;
pub mod mask;
pub mod registry;
pub mod sprites;

use glam::Vec2;
use tower_defence_core::{
    AnimationState, EntityId, Event, GridCoord, Layer, MotionState, Orientation, TileKind,
};
use tower_defence_system_motion::{Ballistic, Trajectory};

use crate::cursors::{RotationCursor, SweepCursor};
use crate::entity::{
    footstep_cues, Body, Entity, EntityKind, ENEMY_HEALTH, SIGHT_SWEEP_MAX, SIGHT_SWEEP_MIN,
    SIGHT_SWEEP_STEP, TURRET_COOLDOWN,
};
use crate::grid::Grid;
use crate::registry::Registry;
use crate::sprites::{
    enemy_death_roll, enemy_walk_roll, explosion_roll, RotationCache, SpriteAtlas, SpriteId,
};

/// Authoritative simulation state: grid, entities, and render caches.
#[derive(Debug)]
pub struct World {
    grid: Grid,
    registry: Registry,
    atlas: SpriteAtlas,
    rotations: RotationCache,
}

impl World {
    /// Creates a world around the provided grid with empty caches.
    #[must_use]
    pub fn new(grid: Grid) -> Self {
        Self {
            grid,
            registry: Registry::new(),
            atlas: SpriteAtlas::new(),
            rotations: RotationCache::new(),
        }
    }

    /// Replaces the grid and drops every entity.
    ///
    /// The sprite atlas and rotation cache survive level changes: frames
    /// are registered once at initialization and only read afterwards.
    pub fn reset_level(&mut self, grid: Grid) {
        self.grid = grid;
        self.registry.clear();
    }

    /// Read-only access to the tile grid.
    #[must_use]
    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Editor access to the tile grid.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    /// Read-only access to the entity registry.
    #[must_use]
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Access to the sprite atlas for init-time frame registration.
    pub fn atlas_mut(&mut self) -> &mut SpriteAtlas {
        &mut self.atlas
    }

    /// Read-only access to the sprite atlas.
    #[must_use]
    pub fn atlas(&self) -> &SpriteAtlas {
        &self.atlas
    }

    /// Read-only access to the rotation cache.
    #[must_use]
    pub fn rotations(&self) -> &RotationCache {
        &self.rotations
    }

    /// Advances every entity by one tick.
    ///
    /// Per entity: the rotation cursor advances; the frame re-renders
    /// through the cache only when the target angle differs from the last
    /// rendered angle; the animation roll advances, swapping the displayed
    /// frame on index change; roll exhaustion in a kill state destroys the
    /// entity, otherwise the animation state resets to stopped. Entities
    /// are removed only after the full pass, never mid-update.
    pub fn update_entities(&mut self, out_events: &mut Vec<Event>) {
        let ids = self.registry.ids();
        let mut doomed: Vec<EntityId> = Vec::new();

        for id in ids {
            let Some(entity) = self.registry.get_mut(id) else {
                continue;
            };

            let mut target_angle = entity.body.rotation.next_angle();
            let mut stepped = false;

            match &mut entity.kind {
                EntityKind::Enemy {
                    motion, trajectory, ..
                } => {
                    if entity.body.animation_state != AnimationState::Dying {
                        if let Some(active) = trajectory.as_mut() {
                            match active.next() {
                                Some(sample) => {
                                    *motion = MotionState::Moving;
                                    entity.body.position = sample.position;
                                    set_flip_x(
                                        &mut entity.body,
                                        sample.flip_x,
                                        &self.atlas,
                                        &mut self.rotations,
                                    );
                                    target_angle = Some(sample.rotation);
                                    stepped = true;
                                }
                                None => {
                                    if *motion == MotionState::Moving {
                                        *motion = MotionState::Stopped;
                                    }
                                }
                            }
                        }
                    }
                }
                EntityKind::Projectile { flight, .. } => {
                    if entity.body.animation_state != AnimationState::Exploding {
                        match flight.next() {
                            Some((position, rotation)) => {
                                entity.body.position = position;
                                target_angle = Some(rotation);
                            }
                            None => {
                                entity.body.animation_state = AnimationState::Exploding;
                                entity.body.roll = Some(explosion_roll());
                                out_events.push(Event::ProjectileExploded { projectile: id });
                            }
                        }
                    }
                }
                EntityKind::Turret {
                    cooldown_remaining, ..
                } => {
                    *cooldown_remaining = cooldown_remaining.saturating_sub(1);
                }
                _ => {}
            }

            if let Some(angle) = target_angle {
                render_angle(&mut entity.body, angle, &self.atlas, &mut self.rotations);
            }

            if animate(&mut entity.body, &self.atlas, &mut self.rotations) {
                doomed.push(id);
            }

            if stepped {
                if let Some(cues) = entity.body.cues.as_mut() {
                    if let Some(cue) = cues.next() {
                        out_events.push(Event::CuePlayed { cue });
                    }
                }
            }
        }

        for id in doomed {
            let _ = self.registry.remove(id);
        }
    }

    /// Spawns an enemy at `position`, walking `trajectory` if one exists.
    ///
    /// Enemies without a trajectory are statically placed and never escape.
    pub fn spawn_enemy_entity(
        &mut self,
        position: Vec2,
        trajectory: Option<Trajectory>,
    ) -> Option<EntityId> {
        let sprite = SpriteId::EnemyWalk(0);
        let frame = self
            .rotations
            .get_or_render(&self.atlas, sprite, false, false, 0)?;
        let motion = if trajectory.is_some() {
            MotionState::Moving
        } else {
            MotionState::Idle
        };
        let body = Body::new(
            sprite,
            frame,
            position,
            Layer::Enemy,
            RotationCursor::FollowPath,
            0,
        )
        .with_animation(AnimationState::Walking, enemy_walk_roll())
        .with_cues(footstep_cues());
        Some(self.registry.insert(Entity::new(
            body,
            EntityKind::Enemy {
                health: ENEMY_HEALTH,
                motion,
                trajectory,
            },
        )))
    }

    /// Spawns a turret and its sight cone as a co-created pair.
    ///
    /// Returns `(turret, sight)` ids. An unplaced turret is a transient
    /// selection: it follows the cursor and never fires until placed.
    pub fn spawn_turret(&mut self, position: Vec2, placed: bool) -> Option<(EntityId, EntityId)> {
        let turret_frame = self
            .rotations
            .get_or_render(&self.atlas, SpriteId::Turret, false, false, 0)?;
        let sight_frame = self.rotations.get_or_render(
            &self.atlas,
            SpriteId::TurretSight,
            false,
            false,
            SIGHT_SWEEP_MIN,
        )?;

        let turret_id = self.registry.reserve();
        let sight_id = self.registry.reserve();

        let turret_body = Body::new(
            SpriteId::Turret,
            turret_frame,
            position,
            Layer::Turret,
            RotationCursor::Fixed(0),
            0,
        );
        self.registry.install(
            turret_id,
            Entity::new(
                turret_body,
                EntityKind::Turret {
                    cooldown: TURRET_COOLDOWN,
                    cooldown_remaining: 0,
                    sight: sight_id,
                    placed,
                },
            ),
        );

        let sight_body = Body::new(
            SpriteId::TurretSight,
            sight_frame,
            position,
            Layer::TurretSight,
            RotationCursor::Sweep(SweepCursor::new(
                SIGHT_SWEEP_MIN,
                SIGHT_SWEEP_MAX,
                SIGHT_SWEEP_STEP,
            )),
            SIGHT_SWEEP_MIN,
        );
        self.registry.install(
            sight_id,
            Entity::new(sight_body, EntityKind::TurretSight { turret: turret_id }),
        );

        Some((turret_id, sight_id))
    }

    /// Spawns a projectile flying `flight` from `source` toward `target`.
    pub fn spawn_projectile(
        &mut self,
        source: EntityId,
        target: EntityId,
        flight: Ballistic,
    ) -> Option<EntityId> {
        let position = self.registry.get(source)?.body.position;
        let frame = self.rotations.get_or_render(
            &self.atlas,
            SpriteId::Projectile,
            false,
            false,
            flight.rotation(),
        )?;
        let body = Body::new(
            SpriteId::Projectile,
            frame,
            position,
            Layer::Projectile,
            RotationCursor::FollowPath,
            flight.rotation(),
        );
        Some(self.registry.insert(Entity::new(
            body,
            EntityKind::Projectile {
                source,
                target,
                flight,
            },
        )))
    }

    /// Spawns a decorative shrub persisted with the level.
    pub fn spawn_shrub(
        &mut self,
        kind: TileKind,
        position: Vec2,
        orientation: Orientation,
    ) -> Option<EntityId> {
        let angle = orientation.degrees() as i16;
        let frame =
            self.rotations
                .get_or_render(&self.atlas, SpriteId::Tile(kind), false, false, angle)?;
        let body = Body::new(
            SpriteId::Tile(kind),
            frame,
            position,
            Layer::Shrub,
            RotationCursor::Fixed(angle),
            angle,
        );
        Some(self
            .registry
            .insert(Entity::new(body, EntityKind::Shrub { kind, orientation })))
    }

    /// Spawns a painted decoration with no behaviour.
    pub fn spawn_decal(&mut self, kind: TileKind, position: Vec2) -> Option<EntityId> {
        let frame =
            self.rotations
                .get_or_render(&self.atlas, SpriteId::Tile(kind), false, false, 0)?;
        let body = Body::new(
            SpriteId::Tile(kind),
            frame,
            position,
            Layer::Decal,
            RotationCursor::Fixed(0),
            0,
        );
        Some(self
            .registry
            .insert(Entity::new(body, EntityKind::Decal { kind })))
    }

    /// Installs the heads-up display panel.
    pub fn install_hud(&mut self, text: String, position: Vec2) -> Option<EntityId> {
        let frame =
            self.rotations
                .get_or_render(&self.atlas, SpriteId::HudPanel, false, false, 0)?;
        let body = Body::new(
            SpriteId::HudPanel,
            frame,
            position,
            Layer::Hud,
            RotationCursor::Fixed(0),
            0,
        );
        Some(self
            .registry
            .insert(Entity::new(body, EntityKind::Hud { text })))
    }

    /// Replaces the text of a HUD panel.
    pub fn set_hud_text(&mut self, id: EntityId, text: String) -> bool {
        if let Some(entity) = self.registry.get_mut(id) {
            if let EntityKind::Hud { text: current } = &mut entity.kind {
                *current = text;
                return true;
            }
        }
        false
    }

    /// Text currently shown by a HUD panel.
    #[must_use]
    pub fn hud_text(&self, id: EntityId) -> Option<&str> {
        match self.registry.get(id)?.kind() {
            EntityKind::Hud { text } => Some(text),
            _ => None,
        }
    }

    /// Transitions an enemy into its terminal dying state.
    ///
    /// Returns false when the id does not name a live enemy or the enemy is
    /// already dying; the dying state is terminal and further hits are
    /// no-ops.
    pub fn kill_enemy(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.registry.get_mut(id) else {
            return false;
        };
        let EntityKind::Enemy { health, .. } = &mut entity.kind else {
            return false;
        };
        if entity.body.animation_state == AnimationState::Dying {
            return false;
        }
        *health = 0;
        entity.body.animation_state = AnimationState::Dying;
        entity.body.roll = Some(enemy_death_roll());
        true
    }

    /// Transitions a projectile into its terminal exploding state.
    pub fn explode_projectile(&mut self, id: EntityId) -> bool {
        let Some(entity) = self.registry.get_mut(id) else {
            return false;
        };
        if !matches!(entity.kind, EntityKind::Projectile { .. }) {
            return false;
        }
        if entity.body.animation_state == AnimationState::Exploding {
            return false;
        }
        entity.body.animation_state = AnimationState::Exploding;
        entity.body.roll = Some(explosion_roll());
        true
    }

    /// Removes an enemy that exhausted its trajectory without being killed.
    pub fn escape_enemy(&mut self, id: EntityId) -> bool {
        match self.registry.get(id) {
            Some(entity)
                if matches!(entity.kind, EntityKind::Enemy { .. })
                    && entity.body.animation_state != AnimationState::Dying => {}
            _ => return false,
        }
        self.registry.remove(id).is_some()
    }

    /// Removes an entity; a turret and its sight are co-destroyed.
    pub fn remove_entity(&mut self, id: EntityId) -> Option<Entity> {
        let removed = self.registry.remove(id)?;
        match removed.kind {
            EntityKind::Turret { sight, .. } => {
                let _ = self.registry.remove(sight);
            }
            EntityKind::TurretSight { turret } => {
                let _ = self.registry.remove(turret);
            }
            _ => {}
        }
        Some(removed)
    }

    /// Rearms a turret's cooldown after it fired.
    pub fn reset_turret_cooldown(&mut self, id: EntityId) -> bool {
        if let Some(entity) = self.registry.get_mut(id) {
            if let EntityKind::Turret {
                cooldown,
                cooldown_remaining,
                ..
            } = &mut entity.kind
            {
                *cooldown_remaining = *cooldown;
                return true;
            }
        }
        false
    }

    /// Moves an entity to `position`; a turret drags its sight along.
    pub fn move_entity(&mut self, id: EntityId, position: Vec2) -> bool {
        let sight = match self.registry.get(id) {
            Some(entity) => match entity.kind {
                EntityKind::Turret { sight, .. } => Some(sight),
                _ => None,
            },
            None => return false,
        };
        if let Some(entity) = self.registry.get_mut(id) {
            entity.body.position = position;
        }
        if let Some(sight_id) = sight {
            if let Some(entity) = self.registry.get_mut(sight_id) {
                entity.body.position = position;
            }
        }
        true
    }

    /// Finalizes a selection at `position`, marking turrets as placed.
    pub fn finalize_placement(&mut self, id: EntityId, position: Vec2) -> bool {
        if !self.move_entity(id, position) {
            return false;
        }
        if let Some(entity) = self.registry.get_mut(id) {
            if let EntityKind::Turret { placed, .. } = &mut entity.kind {
                *placed = true;
            }
        }
        true
    }

    /// Number of turrets that are placed rather than transient selections.
    #[must_use]
    pub fn placed_turret_count(&self) -> usize {
        self.registry
            .layer(Layer::Turret)
            .filter(|(_, entity)| matches!(entity.kind(), EntityKind::Turret { placed: true, .. }))
            .count()
    }

    /// Ids of every entity whose center lies within the tile at `coord`.
    #[must_use]
    pub fn entities_at(&self, coord: GridCoord) -> Vec<EntityId> {
        self.registry
            .iter()
            .filter(|(_, entity)| self.grid.coord_at(entity.body().position()) == Some(coord))
            .map(|(id, _)| id)
            .collect()
    }
}

/// Applies a horizontal flip, correcting the position by the mask-centroid
/// delta so the visible silhouette does not jump.
fn set_flip_x(body: &mut Body, flip_x: bool, atlas: &SpriteAtlas, rotations: &mut RotationCache) {
    if body.flip_x == flip_x {
        return;
    }
    let before = body.world_centroid();
    body.flip_x = flip_x;
    let angle = body.last_angle.unwrap_or(0);
    if let Some(frame) = rotations.get_or_render(atlas, body.sprite, body.flip_x, body.flip_y, angle)
    {
        body.frame = frame;
    }
    let after = body.world_centroid();
    if let (Some(before), Some(after)) = (before, after) {
        body.position += before - after;
    }
}

/// Re-renders the body at `angle` through the cache, skipping the work when
/// the angle matches the last rendered one.
fn render_angle(body: &mut Body, angle: i16, atlas: &SpriteAtlas, rotations: &mut RotationCache) {
    let normalized = angle.rem_euclid(360);
    if body.last_angle == Some(normalized) {
        return;
    }
    if let Some(frame) =
        rotations.get_or_render(atlas, body.sprite, body.flip_x, body.flip_y, normalized)
    {
        body.frame = frame;
    }
    body.last_angle = Some(normalized);
}

/// Advances the animation roll; returns true when the entity must die.
fn animate(body: &mut Body, atlas: &SpriteAtlas, rotations: &mut RotationCache) -> bool {
    let Some(roll) = body.roll.as_mut() else {
        return false;
    };
    match roll.next() {
        Some(sprite) => {
            if sprite != body.sprite {
                body.sprite = sprite;
                let angle = body.last_angle.unwrap_or(0);
                if let Some(frame) =
                    rotations.get_or_render(atlas, sprite, body.flip_x, body.flip_y, angle)
                {
                    body.frame = frame;
                }
            }
            false
        }
        None => {
            let kills = body.animation_state.kills_sprite();
            body.animation_state = AnimationState::Stopped;
            body.roll = None;
            kills
        }
    }
}
