//! Chunk NBT decoding: packed block-state and biome palettes (spec.md §4.3).
//!
//! Grounded on the teacher's `RawChunk::parse` (`world/mod.rs`), split out
//! into its own module and stripped of the asset-rule lookups the teacher
//! did inline during decode — that coupling belongs to rendering, not to
//! the chunk data model, so palette entries here are plain `BlockState`s.

use std::cmp::max;

use arcstr::ArcStr;
use bitfields::bitfield;

use crate::proplist::DefaultPropList as PropList;
use crate::util::intern_str;
use crate::world::nbt;
use crate::world::{BCoords, BIndex, CCoords, CHUNK_SIZE};

pub const SECTION_BLOCK_COUNT: usize = (CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) as usize;
const SECTION_BIOME_COUNT: usize = SECTION_BLOCK_COUNT / (4 * 4 * 4);

#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    #[error("failed to parse chunk NBT: {0}")]
    Nbt(#[from] fastnbt::error::Error),
}

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct BlockState {
    pub name: ArcStr,
    pub properties: PropList,
}

impl BlockState {
    pub fn new(name: ArcStr) -> BlockState {
        BlockState {
            name,
            properties: PropList::new(),
        }
    }

    /// Name without namespace prefix, e.g. `water` instead of `minecraft:water`.
    pub fn short_name(&self) -> &str {
        match self.name.split_once(':') {
            Some((_left, right)) => right,
            None => self.name.as_str(),
        }
    }

    pub fn with_property<K: AsRef<str>, V: AsRef<str>>(mut self, key: K, value: V) -> Self {
        self.properties.insert(key.as_ref(), value.as_ref());
        self
    }

    pub fn get_property(&self, key: &str) -> Option<&str> {
        self.properties.get(key)
    }
}

impl std::fmt::Display for BlockState {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str(&self.name)?;
        if !self.properties.is_empty() {
            write!(f, "{{{}}}", self.properties)?;
        }
        Ok(())
    }
}

#[bitfield(u8)]
#[derive(Clone, Copy)]
pub struct LightLevel {
    #[bits(4)]
    block: u8,
    #[bits(4)]
    sky: u8,
}

impl LightLevel {
    #[inline(always)]
    pub fn with_block(mut self, v: u8) -> Self {
        self.set_block(v);
        self
    }

    #[inline(always)]
    pub fn with_sky(mut self, v: u8) -> Self {
        self.set_sky(v);
        self
    }

    #[inline(always)]
    pub fn effective(self) -> u8 {
        std::cmp::max(self.block(), self.sky())
    }
}

#[bitfield(u32)]
#[derive(Clone, Copy)]
pub struct BlockData {
    state_index: u16,
    biome_index: u8,
    #[bits(8)]
    lighting: LightLevel,
}

#[derive(Clone, Debug)]
pub struct BlockInfo<'a> {
    pub index: BIndex,
    pub state: &'a BlockState,
    pub biome: ArcStr,
    pub lighting: LightLevel,
}

#[derive(Debug)]
pub struct Section {
    pub base: BCoords,
    pub block_data: Vec<BlockData>,
    pub block_palette: Vec<BlockState>,
    pub biome_palette: Vec<ArcStr>,
}

impl Section {
    pub fn get_block(&self, index: BIndex) -> BlockInfo<'_> {
        let data = self.block_data[index.to_flat_index()];
        let state = &self.block_palette[data.state_index() as usize];
        let biome = self.biome_palette[data.biome_index() as usize].clone();
        BlockInfo {
            index,
            state,
            biome,
            lighting: data.lighting(),
        }
    }

    pub fn iter_blocks(&self) -> impl Iterator<Item = BlockInfo<'_>> {
        self.block_data.iter().enumerate().map(|(i, &data)| {
            let index = BIndex::from_flat_index(i);
            let state = &self.block_palette[data.state_index() as usize];
            let biome = self.biome_palette[data.biome_index() as usize].clone();
            BlockInfo {
                index,
                state,
                biome,
                lighting: data.lighting(),
            }
        })
    }
}

#[derive(Debug)]
pub struct Chunk {
    pub coords: CCoords,
    pub sections: Vec<Section>,
    pub fully_generated: bool,
}

impl Chunk {
    pub fn iter_blocks(&self) -> impl Iterator<Item = BlockInfo<'_>> {
        self.sections.iter().enumerate().flat_map(|(i, section)| {
            let y_offset = i * CHUNK_SIZE as usize;
            section.iter_blocks().map(move |block| BlockInfo {
                index: block.index + BIndex((0, 0, y_offset as u32).into()),
                ..block
            })
        })
    }

    /// Parse a chunk from its decompressed NBT payload (spec.md §4.1, §4.3).
    pub fn parse(data: &[u8]) -> Result<Chunk, ChunkError> {
        let chunk_nbt: nbt::Chunk = fastnbt::from_bytes(data)?;

        let mut chunk = Chunk {
            coords: CCoords((chunk_nbt.x_pos, chunk_nbt.z_pos).into()),
            sections: Vec::with_capacity(chunk_nbt.sections.len()),
            fully_generated: chunk_nbt.status == "minecraft:full",
        };
        let chunk_base_coords = BCoords(
            (
                chunk.coords.x() * CHUNK_SIZE as i32,
                chunk.coords.z() * CHUNK_SIZE as i32,
                chunk_nbt.y_pos * CHUNK_SIZE as i32,
            )
                .into(),
        );

        let mut sky_light_data: Vec<Option<fastnbt::ByteArray>> = Vec::with_capacity(chunk_nbt.sections.len());

        for section_nbt in chunk_nbt.sections.into_iter() {
            let block_palette: Vec<BlockState> = section_nbt
                .block_states
                .palette
                .into_iter()
                .map(|bs| BlockState {
                    name: intern_str(bs.name),
                    properties: bs.properties.unwrap_or_default(),
                })
                .collect();

            let mut block_data = vec![BlockData::new(); SECTION_BLOCK_COUNT];
            if let Some(data) = section_nbt.block_states.data {
                decode_packed_indices(&data, block_palette.len(), SECTION_BLOCK_COUNT, true)
                    .zip(block_data.iter_mut())
                    .for_each(|(v, data)| {
                        data.set_state_index(v as u16);
                    });
            }

            let biome_palette: Vec<ArcStr> = section_nbt
                .biomes
                .palette
                .into_iter()
                .map(intern_str)
                .collect();

            if let Some(data) = section_nbt.biomes.data {
                let mut indices = [0u8; SECTION_BIOME_COUNT];
                decode_packed_indices(&data, biome_palette.len(), SECTION_BIOME_COUNT, false)
                    .zip(indices.iter_mut())
                    .for_each(|(v, index)| {
                        *index = v as u8;
                    });
                block_data.iter_mut().enumerate().for_each(|(i, data)| {
                    let block_index = BIndex::from_flat_index(i);
                    let biome_index = to_biome_index(block_index);
                    data.set_biome_index(indices[biome_index]);
                });
            }

            if let Some(data) = section_nbt.block_light {
                data.iter()
                    .flat_map(|v| {
                        let v = v as u8;
                        [v & 0xF, v >> 4]
                    })
                    .zip(block_data.iter_mut())
                    .for_each(|(v, block_data)| {
                        block_data.set_lighting(block_data.lighting().with_block(v));
                    });
            }

            sky_light_data.push(section_nbt.sky_light);

            chunk.sections.push(Section {
                base: BCoords(
                    (
                        chunk_base_coords.x(),
                        chunk_base_coords.z(),
                        section_nbt.y as i32 * CHUNK_SIZE as i32,
                    )
                        .into(),
                ),
                block_data,
                block_palette,
                biome_palette,
            });
        }

        // Sky light is processed top-to-bottom because absent sections inherit
        // the bottom layer of the section above (default at the top is full
        // light, 0xFF per byte).
        let mut sky_light = [-1i8; 2048];
        for (data, section) in sky_light_data.into_iter().rev().zip(chunk.sections.iter_mut().rev()) {
            const LAYER_LEN: usize = (CHUNK_SIZE * CHUNK_SIZE) as usize / 2;
            if let Some(data) = data {
                sky_light.copy_from_slice(&data);
            } else {
                for i in (LAYER_LEN..sky_light.len()).step_by(LAYER_LEN) {
                    sky_light.copy_within(0..LAYER_LEN, i);
                }
            }
            sky_light
                .iter()
                .copied()
                .flat_map(|v| {
                    let v = v as u8;
                    [v & 0xF, v >> 4]
                })
                .zip(section.block_data.iter_mut())
                .for_each(|(v, block_data)| {
                    block_data.set_lighting(block_data.lighting().with_sky(v));
                });
        }

        Ok(chunk)
    }
}

fn to_biome_index(index: BIndex) -> usize {
    let i = ((index.y() / 4) << 4) | ((index.z() / 4) << 2) | (index.x() / 4);
    i as usize
}

/// Decode a packed-palette `i64` array into per-entry indices (spec.md §4.3,
/// "modern" post-1.16 packed-palette encoding: each `i64` holds as many
/// fixed-width entries as fit, any leftover high bits in a long are unused
/// padding rather than spilling into the next long).
///
/// `block_floor` applies the teacher's `max(4, ..)` bit-width floor used for
/// block-state palettes; biome palettes use the raw bit width with no floor.
fn decode_packed_indices(
    data: &[i64],
    palette_len: usize,
    count: usize,
    block_floor: bool,
) -> impl Iterator<Item = u32> + '_ {
    let palette_count = palette_len.max(1) as u64;
    let raw_bits = u64::BITS - (palette_count - 1).leading_zeros();
    let bits = if block_floor { max(4, raw_bits) } else { raw_bits.max(1) } as usize;
    let packing = u64::BITS as usize / bits;
    let mask = (1u64 << bits) - 1;
    data.iter()
        .flat_map(move |&v| {
            let mut v = v as u64;
            std::iter::repeat_with(move || {
                let next = v & mask;
                v >>= bits;
                next as u32
            })
            .take(packing)
        })
        .take(count)
}

/// Unpack a `Heightmaps` long array: 37 longs of seven 9-bit values each,
/// packed low-to-high within each long with one wasted high bit
/// (spec.md §6), truncated to the 256 (x, z) columns of a chunk.
pub fn decode_heightmap(data: &[i64]) -> Vec<u16> {
    const BITS: u32 = 9;
    const PACKING: usize = u64::BITS as usize / BITS as usize;
    const MASK: u64 = (1 << BITS) - 1;
    data.iter()
        .flat_map(|&v| {
            let mut v = v as u64;
            std::iter::repeat_with(move || {
                let next = v & MASK;
                v >>= BITS;
                next as u16
            })
            .take(PACKING)
        })
        .take(256)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_heightmap_unpacks_256_columns() {
        let data = [0i64; 37];
        assert_eq!(decode_heightmap(&data).len(), 256);
    }

    #[test]
    fn decode_packed_indices_does_not_cross_long_boundary() {
        // 5 entries per long at 4 bits (16 entries fit, 4 wasted bits), palette of 5 states.
        let packed = [0x0000_0000_0004_3210u64 as i64];
        let decoded: Vec<u32> = decode_packed_indices(&packed, 5, 5, true).collect();
        assert_eq!(decoded, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn single_entry_palette_uses_floor_bit_width_for_blocks() {
        let packed = [0i64; 1];
        let decoded: Vec<u32> = decode_packed_indices(&packed, 1, 16, true).collect();
        assert_eq!(decoded, vec![0; 16]);
    }

    #[test]
    fn short_name_strips_namespace() {
        let state = BlockState::new(intern_str("minecraft:oak_log"));
        assert_eq!(state.short_name(), "oak_log");
        let state = BlockState::new(intern_str("oak_log"));
        assert_eq!(state.short_name(), "oak_log");
    }

    /// Pack `indices` the same way a vanilla section's `block_states.data`
    /// would be written, for round-tripping through `decode_packed_indices`
    /// in the test below (spec.md §8 testable property #3).
    fn pack_indices(indices: &[u32], bits: usize) -> Vec<i64> {
        let packing = u64::BITS as usize / bits;
        indices
            .chunks(packing)
            .map(|chunk| {
                let mut word = 0u64;
                for (i, &v) in chunk.iter().enumerate() {
                    word |= (v as u64) << (bits * i);
                }
                word as i64
            })
            .collect()
    }

    #[test]
    fn packed_palette_round_trips_for_random_indices() {
        use rand::Rng;
        const M: usize = 4096;
        let mut rng = rand::rng();
        for palette_len in [256usize, 511, 512, 700, 1000, 1024] {
            let bits = max(4, u64::BITS - (palette_len as u64 - 1).leading_zeros()) as usize;
            let indices: Vec<u32> = (0..M).map(|_| rng.random_range(0..palette_len) as u32).collect();
            let packed = pack_indices(&indices, bits);
            let decoded: Vec<u32> = decode_packed_indices(&packed, palette_len, M, true).collect();
            assert_eq!(decoded, indices, "round-trip failed for palette_len={palette_len}");
        }
    }
}
