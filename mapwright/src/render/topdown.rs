//! Top-down tile renderer (spec.md §4.5/§4.6, `TopDown` variant).
//!
//! Each base-zoom tile covers one chunk. For every (x, z) column the
//! highest non-air block's sprite color (tinted by its effective light
//! level, the way the teacher's `LightLevel::effective` was meant to be
//! consumed) is written to that column's pixel, then the 16x16 block image
//! is scaled up to `tile_width`.

use image::{Rgba, RgbaImage};

use crate::render::{RenderContext, TileRenderer};
use crate::tileset::TilePos;
use crate::world::{BIndex, CCoords, CHUNK_SIZE, WORLD_HEIGHT};

pub struct TopDownRenderer;

impl TileRenderer for TopDownRenderer {
    fn render_tile(&self, pos: TilePos, tile_width: u32, ctx: &RenderContext) -> RgbaImage {
        let mut columns = RgbaImage::new(CHUNK_SIZE, CHUNK_SIZE);
        let coords = CCoords((pos.x, pos.y).into());
        let chunk = ctx.world_cache.get(coords).unwrap_or_else(|err| {
            log::warn!("chunk load failed at {coords:?}: {err}");
            None
        });

        if let Some(chunk) = chunk {
            for x in 0..CHUNK_SIZE {
                for z in 0..CHUNK_SIZE {
                    let mut pixel = Rgba([0, 0, 0, 0]);
                    for y in (0..WORLD_HEIGHT).rev() {
                        let section_index = y / CHUNK_SIZE;
                        let Some(section) = chunk.sections.get(section_index as usize) else {
                            continue;
                        };
                        let index = BIndex((x, z, y % CHUNK_SIZE).into());
                        let block = section.get_block(index);
                        if block.state.short_name() == "air" {
                            continue;
                        }
                        let sprite = ctx.block_images.get(block.state);
                        let base = sprite.get_pixel(0, 0);
                        let shade = block.lighting.effective();
                        pixel = shade_pixel(*base, shade);
                        break;
                    }
                    columns.put_pixel(x, z, pixel);
                }
            }
        }

        image::imageops::resize(&columns, tile_width, tile_width, image::imageops::FilterType::Nearest)
    }
}

fn shade_pixel(base: Rgba<u8>, light: u8) -> Rgba<u8> {
    let factor = light as f32 / 15.0;
    Rgba([
        (base.0[0] as f32 * factor) as u8,
        (base.0[1] as f32 * factor) as u8,
        (base.0[2] as f32 * factor) as u8,
        base.0[3],
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shading_scales_toward_black_at_zero_light() {
        let base = Rgba([200, 100, 50, 255]);
        let shaded = shade_pixel(base, 0);
        assert_eq!(shaded, Rgba([0, 0, 0, 255]));
    }

    #[test]
    fn shading_is_identity_at_full_light() {
        let base = Rgba([200, 100, 50, 255]);
        let shaded = shade_pixel(base, 15);
        assert_eq!(shaded, base);
    }
}
