//! Synthetic sprite silhouettes registered at initialization.
//!
//! Decoding real art from disk belongs to an excluded collaborator; the
//! engine registers deterministic placeholder silhouettes with the same
//! dimensions and asymmetries the art would have, so rotation, flipping,
//! centroid correction and mask collision all behave as they would with
//! decoded pixels.

use tower_defence_core::{TileKind, TILE_LENGTH};
use tower_defence_world::sprites::{
    Frame, SpriteAtlas, SpriteId, ENEMY_DEATH_FRAMES, ENEMY_WALK_FRAMES, EXPLOSION_FRAMES,
};

/// Registers every sprite the simulation uses.
pub(crate) fn register_frames(atlas: &mut SpriteAtlas) {
    let tile = TILE_LENGTH as u32;
    for kind in [
        TileKind::Road,
        TileKind::RoadSpawn,
        TileKind::RoadEscape,
        TileKind::Blank,
    ] {
        atlas.register(SpriteId::Tile(kind), Frame::from_fn(tile, tile, |_, _| true));
    }
    atlas.register(
        SpriteId::Tile(TileKind::Grass),
        Frame::from_fn(40, 28, ellipse(20.0, 14.0, 19.0, 13.0)),
    );
    atlas.register(
        SpriteId::Tile(TileKind::Rocks),
        Frame::from_fn(36, 24, ellipse(18.0, 12.0, 17.0, 11.0)),
    );

    for index in 0..ENEMY_WALK_FRAMES {
        atlas.register(SpriteId::EnemyWalk(index), walk_frame(index));
    }
    for index in 0..ENEMY_DEATH_FRAMES {
        atlas.register(SpriteId::EnemyDeath(index), death_frame(index));
    }

    atlas.register(SpriteId::Turret, turret_frame());
    atlas.register(SpriteId::TurretSight, sight_frame());
    atlas.register(
        SpriteId::Projectile,
        Frame::from_fn(12, 12, ellipse(6.0, 6.0, 5.0, 5.0)),
    );
    for index in 0..EXPLOSION_FRAMES {
        atlas.register(SpriteId::Explosion(index), explosion_frame(index));
    }

    atlas.register(SpriteId::HudPanel, Frame::from_fn(220, 28, |_, _| true));
}

fn ellipse(cx: f32, cy: f32, rx: f32, ry: f32) -> impl Fn(u32, u32) -> bool {
    move |x, y| {
        let dx = (x as f32 + 0.5 - cx) / rx;
        let dy = (y as f32 + 0.5 - cy) / ry;
        dx * dx + dy * dy <= 1.0
    }
}

/// Walker silhouette: a left-of-center body with a snout reaching right.
///
/// The horizontal asymmetry is what the flip centroid correction pushes
/// against. The gait alternates the leg rows per frame.
fn walk_frame(index: u8) -> Frame {
    let body = ellipse(18.0, 26.0, 14.0, 19.0);
    Frame::from_fn(44, 52, move |x, y| {
        if body(x, y) {
            return true;
        }
        // Snout.
        if (28..44).contains(&x) && (20..29).contains(&y) {
            return true;
        }
        // Legs, shifting with the walk cycle.
        let stride = u32::from(index % 2) * 4;
        y >= 45 && ((x + stride) % 12) < 5 && (6..38).contains(&x)
    })
}

/// Death roll: the body collapses toward the ground frame by frame.
fn death_frame(index: u8) -> Frame {
    let shrink = f32::from(index) / f32::from(ENEMY_DEATH_FRAMES);
    let ry = 19.0 * (1.0 - shrink) + 3.0;
    let cy = 45.0 - ry;
    let body = ellipse(18.0, cy, 14.0 + 4.0 * shrink, ry);
    Frame::from_fn(44, 52, body)
}

fn turret_frame() -> Frame {
    let base = ellipse(24.0, 24.0, 21.0, 21.0);
    Frame::from_fn(48, 48, move |x, y| {
        // Barrel pointing along the default facing.
        base(x, y) || ((24..48).contains(&x) && (20..28).contains(&y))
    })
}

/// Sight cone: an apex-left triangle that widens toward the muzzle side.
fn sight_frame() -> Frame {
    Frame::from_fn(128, 64, |x, y| {
        let halfwidth = x as f32 * 0.25;
        (y as f32 + 0.5 - 32.0).abs() <= halfwidth
    })
}

fn explosion_frame(index: u8) -> Frame {
    let outer = 8.0 + 8.0 * f32::from(index);
    let inner = outer - 5.0;
    Frame::from_fn(40, 40, move |x, y| {
        let dx = x as f32 + 0.5 - 20.0;
        let dy = y as f32 + 0.5 - 20.0;
        let distance = (dx * dx + dy * dy).sqrt();
        distance <= outer && distance >= inner
    })
}
