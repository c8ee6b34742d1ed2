#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick collision and combat resolution.
//!
//! The resolver scans the pre-tick entity snapshot with non-destructive
//! mask overlap queries and emits an ordered [`Action`] list; the engine
//! applies the actions afterwards. Because rule one's projectiles are
//! spawned only during application, a shot fired this tick can never also
//! resolve a hit this tick. The one-tick fire latency is structural, and
//! gameplay balance depends on it.

use std::collections::HashSet;

use tower_defence_core::{AnimationState, EntityId, Layer, MotionState};
use tower_defence_world::entity::{entities_overlap, Entity, EntityKind};
use tower_defence_world::World;

/// One combat side effect to apply after the scan.
///
/// Actions are emitted strictly in rule order: turret fire, then enemy
/// hits, then escapes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Action {
    /// An off-cooldown turret's sight cone caught an enemy.
    Fire {
        /// Turret that fires.
        turret: EntityId,
        /// Enemy the shot is aimed at.
        enemy: EntityId,
    },
    /// A projectile silhouette touched a live enemy.
    Hit {
        /// Enemy that was struck.
        enemy: EntityId,
        /// Projectile that struck it.
        projectile: EntityId,
    },
    /// An enemy exhausted its trajectory without being killed.
    Escape {
        /// Enemy that reached the escape portal.
        enemy: EntityId,
    },
}

/// Scans the world snapshot and appends combat actions in rule order.
pub fn resolve(world: &World, out: &mut Vec<Action>) {
    let registry = world.registry();
    let enemies: Vec<(EntityId, &Entity)> = registry.layer(Layer::Enemy).collect();
    let sights: Vec<(EntityId, &Entity)> = registry.layer(Layer::TurretSight).collect();
    let projectiles: Vec<(EntityId, &Entity)> = registry.layer(Layer::Projectile).collect();

    // Rule one: sight cones versus enemies. A turret fires at most once per
    // tick even when several enemies cross its cone.
    let mut fired: HashSet<EntityId> = HashSet::new();
    for (enemy_id, enemy) in &enemies {
        if enemy.body().animation_state() == AnimationState::Dying {
            continue;
        }
        for (_, sight) in &sights {
            if !entities_overlap(sight, enemy) {
                continue;
            }
            let EntityKind::TurretSight { turret } = sight.kind() else {
                continue;
            };
            if fired.contains(turret) {
                continue;
            }
            let Some(owner) = registry.get(*turret) else {
                continue;
            };
            let EntityKind::Turret {
                cooldown_remaining,
                placed,
                ..
            } = owner.kind()
            else {
                continue;
            };
            // A selection still following the cursor never fires.
            if !*placed || *cooldown_remaining > 0 {
                continue;
            }
            let _ = fired.insert(*turret);
            out.push(Action::Fire {
                turret: *turret,
                enemy: *enemy_id,
            });
        }
    }

    // Rule two: enemies versus projectiles. Dying is terminal, so a dying
    // enemy is skipped entirely; every projectile touching a live enemy
    // explodes.
    for (enemy_id, enemy) in &enemies {
        if enemy.body().animation_state() == AnimationState::Dying {
            continue;
        }
        for (projectile_id, projectile) in &projectiles {
            if projectile.body().animation_state() == AnimationState::Exploding {
                continue;
            }
            if entities_overlap(enemy, projectile) {
                out.push(Action::Hit {
                    enemy: *enemy_id,
                    projectile: *projectile_id,
                });
            }
        }
    }

    // Rule three: the escape check is positional, not mask-based.
    for (enemy_id, enemy) in &enemies {
        if enemy.body().animation_state() == AnimationState::Dying {
            continue;
        }
        let EntityKind::Enemy { motion, .. } = enemy.kind() else {
            continue;
        };
        if *motion == MotionState::Stopped {
            out.push(Action::Escape { enemy: *enemy_id });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tower_defence_core::{Event, TileKind};
    use tower_defence_system_motion::{Ballistic, Easing, Trajectory};
    use tower_defence_world::grid::Grid;
    use tower_defence_world::sprites::{
        Frame, SpriteId, ENEMY_DEATH_FRAMES, ENEMY_WALK_FRAMES, EXPLOSION_FRAMES,
    };

    fn world() -> World {
        let mut world = World::new(Grid::new(8, 8));
        let atlas = world.atlas_mut();
        for index in 0..ENEMY_WALK_FRAMES {
            atlas.register(SpriteId::EnemyWalk(index), Frame::from_fn(12, 12, |_, _| true));
        }
        for index in 0..ENEMY_DEATH_FRAMES {
            atlas.register(SpriteId::EnemyDeath(index), Frame::from_fn(12, 12, |_, _| true));
        }
        for index in 0..EXPLOSION_FRAMES {
            atlas.register(SpriteId::Explosion(index), Frame::from_fn(8, 8, |_, _| true));
        }
        atlas.register(SpriteId::Turret, Frame::from_fn(10, 10, |_, _| true));
        // A square cone keeps the overlap geometry independent of the sweep
        // angle the sight happens to be rendered at.
        atlas.register(SpriteId::TurretSight, Frame::from_fn(40, 40, |_, _| true));
        atlas.register(SpriteId::Projectile, Frame::from_fn(4, 4, |_, _| true));
        atlas.register(
            SpriteId::Tile(TileKind::Grass),
            Frame::from_fn(8, 8, |_, _| true),
        );
        world
    }

    fn actions(world: &World) -> Vec<Action> {
        let mut out = Vec::new();
        resolve(world, &mut out);
        out
    }

    #[test]
    fn sight_overlap_fires_a_ready_turret() {
        let mut world = world();
        let (turret, _) = world
            .spawn_turret(Vec2::new(100.0, 100.0), true)
            .expect("turret");
        let enemy = world
            .spawn_enemy_entity(Vec2::new(110.0, 100.0), None)
            .expect("enemy");

        assert_eq!(actions(&world), vec![Action::Fire { turret, enemy }]);
    }

    #[test]
    fn unplaced_or_cooling_turrets_never_fire() {
        let mut world = world();
        let (selection, _) = world
            .spawn_turret(Vec2::new(100.0, 100.0), false)
            .expect("selection");
        let _ = world
            .spawn_enemy_entity(Vec2::new(110.0, 100.0), None)
            .expect("enemy");
        assert!(actions(&world).is_empty(), "selections must not fire");

        assert!(world.finalize_placement(selection, Vec2::new(100.0, 100.0)));
        assert!(world.reset_turret_cooldown(selection));
        assert!(actions(&world).is_empty(), "cooldown must gate firing");
    }

    #[test]
    fn turret_fires_once_per_tick_across_enemies() {
        let mut world = world();
        let (turret, _) = world
            .spawn_turret(Vec2::new(100.0, 100.0), true)
            .expect("turret");
        let first = world
            .spawn_enemy_entity(Vec2::new(92.0, 100.0), None)
            .expect("enemy");
        let _ = world
            .spawn_enemy_entity(Vec2::new(108.0, 100.0), None)
            .expect("enemy");

        assert_eq!(
            actions(&world),
            vec![Action::Fire {
                turret,
                enemy: first,
            }],
        );
    }

    #[test]
    fn projectile_overlap_hits_live_enemies_only() {
        let mut world = world();
        let (turret, sight) = world
            .spawn_turret(Vec2::new(300.0, 300.0), true)
            .expect("turret");
        // Keep the sight cone away from the action for this test.
        let _ = world.remove_entity(sight);
        assert!(world.registry().get(turret).is_none());

        let enemy = world
            .spawn_enemy_entity(Vec2::new(100.0, 100.0), None)
            .expect("enemy");
        let flight =
            Ballistic::aim(Vec2::new(98.0, 100.0), Vec2::new(200.0, 100.0), 4.0, 400.0)
                .expect("aim");
        let projectile = world
            .spawn_projectile(enemy, enemy, flight)
            .expect("projectile");

        assert_eq!(actions(&world), vec![Action::Hit { enemy, projectile }]);

        assert!(world.kill_enemy(enemy));
        assert!(
            actions(&world).is_empty(),
            "dying enemies are skipped by every rule"
        );
    }

    #[test]
    fn exploding_projectiles_are_inert() {
        let mut world = world();
        let enemy = world
            .spawn_enemy_entity(Vec2::new(100.0, 100.0), None)
            .expect("enemy");
        let flight =
            Ballistic::aim(Vec2::new(98.0, 100.0), Vec2::new(200.0, 100.0), 4.0, 400.0)
                .expect("aim");
        let projectile = world
            .spawn_projectile(enemy, enemy, flight)
            .expect("projectile");
        assert!(world.explode_projectile(projectile));

        assert!(actions(&world).is_empty());
    }

    #[test]
    fn stopped_enemies_escape() {
        let mut world = world();
        let mut events: Vec<Event> = Vec::new();
        // An empty waypoint list exhausts on the first update, leaving the
        // enemy stopped.
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let enemy = world
            .spawn_enemy_entity(
                Vec2::new(100.0, 100.0),
                Some(Trajectory::build(&[], 1, 0, Easing::Linear, &mut rng)),
            )
            .expect("enemy");
        world.update_entities(&mut events);

        assert_eq!(actions(&world), vec![Action::Escape { enemy }]);
    }

    #[test]
    fn fire_precedes_hit_precedes_escape() {
        let mut world = world();
        let (turret, _) = world
            .spawn_turret(Vec2::new(100.0, 100.0), true)
            .expect("turret");
        let enemy = world
            .spawn_enemy_entity(Vec2::new(110.0, 100.0), None)
            .expect("enemy");
        let flight =
            Ballistic::aim(Vec2::new(108.0, 100.0), Vec2::new(200.0, 100.0), 4.0, 400.0)
                .expect("aim");
        let projectile = world
            .spawn_projectile(enemy, enemy, flight)
            .expect("projectile");

        let mut events = Vec::new();
        // Stop the enemy so all three rules trigger in one scan.
        world.update_entities(&mut events);

        let observed = actions(&world);
        let fire = observed
            .iter()
            .position(|action| matches!(action, Action::Fire { .. }));
        let hit = observed
            .iter()
            .position(|action| matches!(action, Action::Hit { .. }));
        assert!(fire.is_some() && hit.is_some());
        assert!(fire < hit, "rule one precedes rule two");
        let _ = (turret, projectile);
    }
}
