//! Shared draw/update registry keyed by entity id and grouped by layer.

use std::collections::BTreeMap;

use tower_defence_core::{EntityId, Layer};

use crate::entity::Entity;

/// Id-keyed entity store with deterministic iteration order.
///
/// Identifiers are allocated monotonically and never reused within a
/// session, so a stale id held by a projectile simply fails to resolve
/// after its target is gone.
#[derive(Debug, Default)]
pub struct Registry {
    next_id: u32,
    entities: BTreeMap<EntityId, Entity>,
}

impl Registry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocates the next entity identifier without storing anything.
    ///
    /// Used when two entities must know each other's ids before either is
    /// installed, such as a turret and its sight cone.
    pub fn reserve(&mut self) -> EntityId {
        let id = EntityId::new(self.next_id);
        self.next_id += 1;
        id
    }

    /// Stores an entity under a previously reserved identifier.
    pub fn install(&mut self, id: EntityId, entity: Entity) {
        debug_assert!(
            !self.entities.contains_key(&id),
            "entity id installed twice"
        );
        let _ = self.entities.insert(id, entity);
    }

    /// Stores an entity under a freshly allocated identifier.
    pub fn insert(&mut self, entity: Entity) -> EntityId {
        let id = self.reserve();
        self.install(id, entity);
        id
    }

    /// Removes and returns the entity stored under `id`.
    pub fn remove(&mut self, id: EntityId) -> Option<Entity> {
        self.entities.remove(&id)
    }

    /// Entity stored under `id`, if present.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(&id)
    }

    /// Mutable access to the entity stored under `id`.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(&id)
    }

    /// All live entity ids in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        self.entities.keys().copied().collect()
    }

    /// Iterates every entity in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.entities.iter().map(|(id, entity)| (*id, entity))
    }

    /// Iterates the entities of one layer in ascending id order.
    pub fn layer(&self, layer: Layer) -> impl Iterator<Item = (EntityId, &Entity)> {
        self.iter().filter(move |(_, entity)| entity.body().layer() == layer)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Reports whether the registry holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Drops every entity while keeping the id sequence monotonic.
    pub fn clear(&mut self) {
        self.entities.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cursors::RotationCursor;
    use crate::entity::{Body, EntityKind};
    use crate::sprites::{Frame, SpriteId};
    use glam::Vec2;
    use std::sync::Arc;
    use tower_defence_core::TileKind;

    fn decal(layer: Layer) -> Entity {
        let frame = Arc::new(Frame::from_fn(4, 4, |_, _| true));
        Entity::new(
            Body::new(
                SpriteId::Tile(TileKind::Grass),
                frame,
                Vec2::ZERO,
                layer,
                RotationCursor::Fixed(0),
                0,
            ),
            EntityKind::Decal {
                kind: TileKind::Grass,
            },
        )
    }

    #[test]
    fn ids_are_monotonic_and_never_reused() {
        let mut registry = Registry::new();
        let first = registry.insert(decal(Layer::Decal));
        let second = registry.insert(decal(Layer::Decal));
        assert!(first < second);

        assert!(registry.remove(first).is_some());
        let third = registry.insert(decal(Layer::Decal));
        assert!(second < third);
    }

    #[test]
    fn layer_iteration_filters_by_group() {
        let mut registry = Registry::new();
        let _ = registry.insert(decal(Layer::Decal));
        let shrub = registry.insert(decal(Layer::Shrub));
        let _ = registry.insert(decal(Layer::Decal));

        let shrubs: Vec<EntityId> = registry.layer(Layer::Shrub).map(|(id, _)| id).collect();
        assert_eq!(shrubs, vec![shrub]);
        assert_eq!(registry.layer(Layer::Decal).count(), 2);
        assert_eq!(registry.layer(Layer::Enemy).count(), 0);
    }

    #[test]
    fn clear_keeps_the_id_sequence_monotonic() {
        let mut registry = Registry::new();
        let before = registry.insert(decal(Layer::Decal));
        registry.clear();
        assert!(registry.is_empty());
        let after = registry.insert(decal(Layer::Decal));
        assert!(before < after);
    }
}
