//! Render context, block images, and the tile renderer contract (spec.md §4.6).
//!
//! The isometric projection constants (`SPRITE_SIZE`, the `BLOCK_OFFSET_*`
//! family, `TILE_RENDER_CHUNK_OFFSETS`) are carried over from the teacher's
//! `render::{Renderer, DimensionRenderer}` — that geometry is exactly the
//! "exact side-view chunk-to-tile polygon" spec.md §9 leaves as an open
//! question, and it is grounded directly in the one place this crate family
//! already worked it out. `BlockImages`'s read-through cache is the same
//! shape as the teacher's `render::texture::TextureCache`: optimistic read,
//! populate-on-miss under a short write lock. Rendermode/overlay shading and
//! the block-image atlas's own pixel content are out of scope (spec.md §1);
//! `TileRenderer` only needs *some* sprite per block state to composite, so
//! `BlockImages` hands back whatever `image::RgbaImage` was registered for
//! a state's short name, or a flat placeholder if none was.

mod sideiso;
mod topdown;

use std::collections::HashMap;
use std::sync::Arc;

use image::{Rgba, RgbaImage};
use parking_lot::RwLock;

pub use sideiso::SideIsoRenderer;
pub use topdown::TopDownRenderer;

use crate::tileset::TilePos;
use crate::world::cache::WorldCache;
use crate::world::BlockState;

/// Width/height in pixels of one block sprite, isometric or top-down.
pub const SPRITE_SIZE: usize = 16;

/// Shared, read-only sprite lookup by block short name (spec.md §4.6
/// "Render context & block images"). Population is the block-image atlas's
/// job (out of scope); this only defines the narrow read interface
/// `TileRenderer` consumes, plus a way to seed it for tests/CLIs that don't
/// have the real atlas available.
pub struct BlockImages {
    sprites: RwLock<HashMap<String, Arc<RgbaImage>>>,
    placeholder: Arc<RgbaImage>,
}

impl BlockImages {
    pub fn new() -> Self {
        let mut placeholder = RgbaImage::new(SPRITE_SIZE as u32, SPRITE_SIZE as u32);
        for pixel in placeholder.pixels_mut() {
            *pixel = Rgba([200, 0, 200, 255]);
        }
        Self {
            sprites: RwLock::new(HashMap::new()),
            placeholder: Arc::new(placeholder),
        }
    }

    pub fn insert(&self, short_name: impl Into<String>, image: RgbaImage) {
        self.sprites.write().insert(short_name.into(), Arc::new(image));
    }

    pub fn get(&self, state: &BlockState) -> Arc<RgbaImage> {
        if let Some(image) = self.sprites.read().get(state.short_name()) {
            return image.clone();
        }
        let mut sprites = self.sprites.write();
        sprites
            .entry(state.short_name().to_string())
            .or_insert_with(|| self.placeholder.clone())
            .clone()
    }
}

impl Default for BlockImages {
    fn default() -> Self {
        Self::new()
    }
}

/// View-specific parameters for the side (isometric) renderer: a 5-tuple of
/// shadow edge weights. Default rule (spec.md §4.6): indices 0, 2, 3, 4
/// default to 2, index 1 defaults to 1.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ShadowWeights(pub [u8; 5]);

impl Default for ShadowWeights {
    fn default() -> Self {
        Self([2, 1, 2, 2, 2])
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub enum RenderMode {
    #[default]
    Normal,
}

/// Everything a `TileRenderer` needs to render one leaf tile, all read-only
/// and freely shareable across worker threads (spec.md §5).
pub struct RenderContext {
    pub block_images: Arc<BlockImages>,
    pub world_cache: Arc<WorldCache>,
    pub render_mode: RenderMode,
    pub shadow_weights: ShadowWeights,
}

/// Narrow capability set a view exposes (spec.md §9: tagged-variant, not a
/// deep type hierarchy).
pub trait TileRenderer: Send + Sync {
    /// Render leaf tile `pos`, `tile_width` pixels square.
    fn render_tile(&self, pos: TilePos, tile_width: u32, ctx: &RenderContext) -> RgbaImage;
}

/// `configureTileRenderer` (spec.md §4.6): apply view-specific parameters.
pub fn configure_tile_renderer(weights: Option<[u8; 5]>) -> ShadowWeights {
    match weights {
        Some(w) => ShadowWeights(w),
        None => ShadowWeights::default(),
    }
}

/// 2x2 downsample of up to four child tiles into one parent (spec.md §6:
/// "each composite is the 2x2 downsample of its four children, missing
/// children = transparent").
pub fn composite_children(children: [Option<&RgbaImage>; 4], tile_width: u32) -> RgbaImage {
    let mut parent = RgbaImage::from_pixel(tile_width, tile_width, Rgba([0, 0, 0, 0]));
    let half = tile_width / 2;
    let offsets = [(0u32, 0u32), (half, 0), (0, half), (half, half)];
    for (child, (ox, oy)) in children.into_iter().zip(offsets) {
        let Some(child) = child else { continue };
        let resized = image::imageops::resize(child, half, half, image::imageops::FilterType::Triangle);
        image::imageops::overlay(&mut parent, &resized, ox as i64, oy as i64);
    }
    parent
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shadow_weights_default_rule() {
        let weights = configure_tile_renderer(None);
        assert_eq!(weights.0, [2, 1, 2, 2, 2]);
    }

    #[test]
    fn block_images_falls_back_to_placeholder() {
        let images = BlockImages::new();
        let state = BlockState::new(crate::util::intern_str("minecraft:unregistered_block"));
        let sprite = images.get(&state);
        assert_eq!(sprite.dimensions(), (SPRITE_SIZE as u32, SPRITE_SIZE as u32));
    }

    #[test]
    fn composite_is_transparent_where_children_absent() {
        let image = composite_children([None, None, None, None], 32);
        assert_eq!(image.get_pixel(0, 0), &Rgba([0, 0, 0, 0]));
    }
}
