//! Minecraft region/chunk decoding, world cropping, tile set addressing, and
//! concurrent tile rendering (spec.md §1-§5).

pub mod coords;
pub mod crop;
pub mod dispatch;
pub mod error;
pub mod nbt;
pub mod proplist;
pub mod region;
pub mod render;
pub mod settings;
pub mod tileset;
pub mod util;
pub mod world;

pub use crop::{BlockMask, Bounds, Shape, WorldCrop};
pub use dispatch::{Dispatcher, NullProgress, ProgressHandle, RenderWork, RenderWorkResult, TileStatus, WorkKind};
pub use error::{ChunkLoadError, InvalidBlockMaskSpec, NbtError, RegionError};
pub use region::RegionFile;
pub use settings::Settings;
pub use tileset::{TileGeometry, TilePath, TilePos, TileSet, Variant};
pub use world::{
    BlockData, BlockInfo, BlockState, CCoords, Chunk, ChunkBounds, DimensionID, DimensionInfo, RCoords, Section,
    WorldCache, WorldInfo,
};
