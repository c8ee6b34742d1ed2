//! Sprite frames, the flip-variant atlas, and the shared rotation cache.

use std::collections::HashMap;
use std::sync::Arc;

use glam::Vec2;
use tower_defence_core::TileKind;

use crate::cursors::AnimationRoll;
use crate::mask::Mask;

/// Number of frames in the enemy walk roll.
pub const ENEMY_WALK_FRAMES: u8 = 4;

/// Number of frames in the enemy death roll.
pub const ENEMY_DEATH_FRAMES: u8 = 4;

/// Number of frames in the projectile explosion roll.
pub const EXPLOSION_FRAMES: u8 = 3;

const WALK_DWELL: u32 = 6;
const DEATH_DWELL: u32 = 8;
const EXPLOSION_DWELL: u32 = 5;

/// Typed handle naming one sprite variant in the atlas.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SpriteId {
    /// Tile art, shared by background cells and shrubs.
    Tile(TileKind),
    /// Enemy walk roll frame.
    EnemyWalk(u8),
    /// Enemy death roll frame.
    EnemyDeath(u8),
    /// Turret body.
    Turret,
    /// Turret sight cone.
    TurretSight,
    /// Projectile body.
    Projectile,
    /// Projectile explosion roll frame.
    Explosion(u8),
    /// Heads-up display panel.
    HudPanel,
}

/// One displayable sprite frame together with its collision mask.
///
/// Pixel decoding is an excluded collaborator, so a frame carries only the
/// opaque silhouette; the mask is the single source of truth for collision
/// and stays synchronized with whatever frame an entity currently displays.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Frame {
    mask: Mask,
}

impl Frame {
    /// Builds a frame by sampling the opacity predicate per pixel.
    #[must_use]
    pub fn from_fn<F>(width: u32, height: u32, opaque: F) -> Self
    where
        F: Fn(u32, u32) -> bool,
    {
        Self {
            mask: Mask::from_fn(width, height, opaque),
        }
    }

    /// Width of the frame in pixels.
    #[must_use]
    pub const fn width(&self) -> u32 {
        self.mask.width()
    }

    /// Height of the frame in pixels.
    #[must_use]
    pub const fn height(&self) -> u32 {
        self.mask.height()
    }

    /// Frame dimensions as a vector.
    #[must_use]
    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width() as f32, self.height() as f32)
    }

    /// Collision mask of the frame.
    #[must_use]
    pub const fn mask(&self) -> &Mask {
        &self.mask
    }

    /// Centroid of the opaque silhouette, if any pixel is opaque.
    #[must_use]
    pub fn centroid(&self) -> Option<Vec2> {
        self.mask.centroid()
    }

    /// Mirrored variant of the frame.
    #[must_use]
    pub fn flipped(&self, flip_x: bool, flip_y: bool) -> Self {
        let mut mask = self.mask.clone();
        if flip_x {
            mask = mask.flipped_x();
        }
        if flip_y {
            mask = mask.flipped_y();
        }
        Self { mask }
    }

    /// Rotated variant of the frame.
    #[must_use]
    pub fn rotated(&self, degrees: i16) -> Self {
        Self {
            mask: self.mask.rotated(degrees),
        }
    }
}

/// Init-once table of base frames keyed by `(flip_x, flip_y, sprite)`.
///
/// All four mirror variants are derived at registration time so play-time
/// lookups never mutate the table.
#[derive(Debug, Default)]
pub struct SpriteAtlas {
    frames: HashMap<(bool, bool, SpriteId), Arc<Frame>>,
}

impl SpriteAtlas {
    /// Creates an empty atlas.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a sprite and derives its mirror variants.
    pub fn register(&mut self, id: SpriteId, frame: Frame) {
        for flip_x in [false, true] {
            for flip_y in [false, true] {
                let variant = if flip_x || flip_y {
                    frame.flipped(flip_x, flip_y)
                } else {
                    frame.clone()
                };
                let _ = self.frames.insert((flip_x, flip_y, id), Arc::new(variant));
            }
        }
    }

    /// Looks up the base frame for a sprite variant.
    #[must_use]
    pub fn frame(&self, flip_x: bool, flip_y: bool, id: SpriteId) -> Option<Arc<Frame>> {
        self.frames.get(&(flip_x, flip_y, id)).cloned()
    }

    /// Reports whether the sprite has been registered.
    #[must_use]
    pub fn contains(&self, id: SpriteId) -> bool {
        self.frames.contains_key(&(false, false, id))
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
struct RotationKey {
    id: SpriteId,
    flip_x: bool,
    flip_y: bool,
    angle: u16,
}

/// Shared cache of rotated frames keyed by sprite variant and angle.
///
/// Rotation is the expensive step of the render path; the cache guarantees
/// that a key rendered once is never recomputed and that repeated lookups
/// return the identical allocation. The key space is bounded by the finite
/// set of `(sprite, angle)` combinations the simulation actually uses.
#[derive(Debug, Default)]
pub struct RotationCache {
    rendered: HashMap<RotationKey, Arc<Frame>>,
}

impl RotationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the rotated frame for the requested key, rendering and
    /// caching it on first use.
    ///
    /// Angles are normalized into `[0, 360)`. Returns `None` only when the
    /// sprite was never registered in the atlas.
    pub fn get_or_render(
        &mut self,
        atlas: &SpriteAtlas,
        id: SpriteId,
        flip_x: bool,
        flip_y: bool,
        angle: i16,
    ) -> Option<Arc<Frame>> {
        let normalized = angle.rem_euclid(360) as u16;
        let key = RotationKey {
            id,
            flip_x,
            flip_y,
            angle: normalized,
        };
        if let Some(frame) = self.rendered.get(&key) {
            return Some(Arc::clone(frame));
        }

        let base = atlas.frame(flip_x, flip_y, id)?;
        let frame = if normalized == 0 {
            base
        } else {
            Arc::new(base.rotated(normalized as i16))
        };
        let _ = self.rendered.insert(key, Arc::clone(&frame));
        Some(frame)
    }

    /// Number of distinct keys rendered so far.
    #[must_use]
    pub fn len(&self) -> usize {
        self.rendered.len()
    }

    /// Reports whether nothing has been rendered yet.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rendered.is_empty()
    }
}

/// Looping walk roll for enemies.
#[must_use]
pub fn enemy_walk_roll() -> AnimationRoll {
    AnimationRoll::looping(
        (0..ENEMY_WALK_FRAMES).map(SpriteId::EnemyWalk).collect(),
        WALK_DWELL,
    )
}

/// Finite death roll for enemies.
#[must_use]
pub fn enemy_death_roll() -> AnimationRoll {
    AnimationRoll::finite(
        (0..ENEMY_DEATH_FRAMES).map(SpriteId::EnemyDeath).collect(),
        DEATH_DWELL,
    )
}

/// Finite explosion roll for projectiles.
#[must_use]
pub fn explosion_roll() -> AnimationRoll {
    AnimationRoll::finite(
        (0..EXPLOSION_FRAMES).map(SpriteId::Explosion).collect(),
        EXPLOSION_DWELL,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn asymmetric_frame() -> Frame {
        Frame::from_fn(10, 6, |x, _| x < 4)
    }

    #[test]
    fn register_derives_all_flip_variants() {
        let mut atlas = SpriteAtlas::new();
        atlas.register(SpriteId::Turret, asymmetric_frame());
        for flip_x in [false, true] {
            for flip_y in [false, true] {
                assert!(atlas.frame(flip_x, flip_y, SpriteId::Turret).is_some());
            }
        }
        assert!(atlas.frame(false, false, SpriteId::Projectile).is_none());
    }

    #[test]
    fn flip_variant_mirrors_the_silhouette() {
        let mut atlas = SpriteAtlas::new();
        atlas.register(SpriteId::Turret, asymmetric_frame());
        let base = atlas.frame(false, false, SpriteId::Turret).expect("base");
        let flipped = atlas.frame(true, false, SpriteId::Turret).expect("flipped");
        assert!(base.mask().get(0, 0));
        assert!(!flipped.mask().get(0, 0));
        assert!(flipped.mask().get(9, 0));
    }

    #[test]
    fn cache_returns_the_identical_allocation() {
        let mut atlas = SpriteAtlas::new();
        atlas.register(SpriteId::Turret, asymmetric_frame());
        let mut cache = RotationCache::new();

        let first = cache
            .get_or_render(&atlas, SpriteId::Turret, false, false, 45)
            .expect("registered sprite");
        let second = cache
            .get_or_render(&atlas, SpriteId::Turret, false, false, 45)
            .expect("registered sprite");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn cache_normalizes_angles() {
        let mut atlas = SpriteAtlas::new();
        atlas.register(SpriteId::Turret, asymmetric_frame());
        let mut cache = RotationCache::new();

        let positive = cache
            .get_or_render(&atlas, SpriteId::Turret, false, false, 270)
            .expect("registered sprite");
        let negative = cache
            .get_or_render(&atlas, SpriteId::Turret, false, false, -90)
            .expect("registered sprite");
        assert!(Arc::ptr_eq(&positive, &negative));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn distinct_flips_render_distinct_frames() {
        let mut atlas = SpriteAtlas::new();
        atlas.register(SpriteId::Turret, asymmetric_frame());
        let mut cache = RotationCache::new();

        let plain = cache
            .get_or_render(&atlas, SpriteId::Turret, false, false, 0)
            .expect("registered sprite");
        let mirrored = cache
            .get_or_render(&atlas, SpriteId::Turret, true, false, 0)
            .expect("registered sprite");
        assert!(!Arc::ptr_eq(&plain, &mirrored));
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn rolls_cover_their_declared_frame_counts() {
        let mut walk = enemy_walk_roll();
        assert_eq!(walk.next(), Some(SpriteId::EnemyWalk(0)));

        let mut death = enemy_death_roll();
        let mut frames = 0;
        while death.next().is_some() {
            frames += 1;
        }
        assert_eq!(frames, u32::from(ENEMY_DEATH_FRAMES) * DEATH_DWELL);
    }
}
