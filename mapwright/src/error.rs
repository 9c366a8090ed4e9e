//! Per-module error kinds (spec.md §7).
//!
//! Leaf modules return their own `thiserror`-derived enum so callers can
//! match on a specific failure; `anyhow` is still used at the CLI/driver
//! boundary the way the original code already does it.

use thiserror::Error;

/// Errors from the generic NBT tag-tree codec (`nbt` module).
#[derive(Debug, Error)]
pub enum NbtError {
    #[error("truncated NBT data: expected {needed} more byte(s)")]
    Truncated { needed: usize },
    #[error("malformed NBT: invalid tag id {0}")]
    InvalidTagId(u8),
    #[error("malformed NBT: invalid list element type {0}")]
    InvalidListElementType(u8),
    #[error("malformed NBT: negative length {0}")]
    NegativeLength(i32),
    #[error("malformed NBT: non-UTF8 name or string")]
    InvalidUtf8,
    #[error("tag {name:?} exists but has the wrong type (expected {expected}, found {found})")]
    TagTypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    #[error("failed to decompress NBT payload: {0}")]
    DecompressionFailed(#[from] std::io::Error),
}

/// Errors from the region container (`region` module), spec.md §4.2.
#[derive(Debug, Error)]
pub enum RegionError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("region header is truncated or out of range")]
    BadRegionHeader,
    #[error("chunk sector offset {offset} is out of range for this region file")]
    InvalidSectorOffset { offset: u64 },
    #[error("unsupported chunk compression scheme {0}")]
    UnsupportedCompression(u8),
    #[error("no chunk present at {0:?}")]
    MissingChunk(crate::world::CCoords),
    #[error("failed to decompress chunk payload: {0}")]
    DecompressionFailed(std::io::Error),
}

/// Errors from block mask spec parsing, spec.md §4.4.
#[derive(Debug, Error)]
#[error("invalid block mask spec: {token:?}: {reason}")]
pub struct InvalidBlockMaskSpec {
    pub token: String,
    pub reason: &'static str,
}

/// Errors from the read-through world cache, spec.md §4.8.
#[derive(Debug, Error)]
pub enum ChunkLoadError {
    #[error("region I/O failed: {0}")]
    Region(#[from] RegionError),
    #[error("chunk NBT was malformed: {0}")]
    Nbt(#[from] crate::world::chunk::ChunkError),
}
