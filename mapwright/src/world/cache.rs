//! Thread-safe read-through chunk cache (spec.md §4.8).
//!
//! The teacher's `ChunkCache` wraps a plain `LruCache` behind `&mut self`,
//! which is fine for a single-threaded render but not for the work
//! dispatcher's worker pool, where many tiles decode chunks concurrently.
//! This keeps the teacher's `get_or_insert`-style LRU bookkeeping
//! (`lru::LruCache`) but only uses it to hand out a per-chunk slot; the
//! actual decode happens under that slot's own lock (not the top-level LRU
//! lock), the way `render::texture::TextureCache` reads through its
//! `RwLock<HashMap>` — optimistic lookup, then populate without blocking
//! unrelated keys. Unlike a `OnceLock`-backed slot, a failed load leaves the
//! slot empty rather than caching the failure (spec.md §4.8: "failure to
//! load propagates ... the slot is not cached on failure"), so the next
//! reader retries instead of being stuck with a permanent miss.

use std::sync::Arc;

use parking_lot::Mutex;

use crate::error::ChunkLoadError;
use crate::world::{CCoords, Chunk, DimensionInfo, RCoords, REGION_SIZE};

#[derive(Clone, Debug, Default)]
pub enum ChunkBounds {
    #[default]
    Unbounded,
    MinMax(CCoords, CCoords),
}

impl ChunkBounds {
    pub fn single_chunk(coords: CCoords) -> Self {
        ChunkBounds::MinMax(coords, coords + CCoords((1, 1).into()))
    }

    pub fn single_region(coords: RCoords) -> Self {
        let base = coords.to_chunk_coords();
        ChunkBounds::MinMax(base, base + CCoords((REGION_SIZE as i32, REGION_SIZE as i32).into()))
    }

    pub fn contains(&self, coords: &CCoords) -> bool {
        match self {
            ChunkBounds::Unbounded => true,
            ChunkBounds::MinMax(min, max) => {
                (min.x()..max.x()).contains(&coords.x()) && (min.z()..max.z()).contains(&coords.z())
            }
        }
    }
}

/// `None` while unresolved, `Some(None)` once resolved as "absent or not
/// fully generated" (a stable fact, safe to cache forever), `Some(Some(_))`
/// once resolved as present.
type Slot = Arc<Mutex<Option<Option<Arc<Chunk>>>>>;

/// Read-through chunk cache shared by every worker thread rendering tiles
/// from one dimension.
pub struct WorldCache {
    dim_info: Arc<DimensionInfo>,
    bounds: ChunkBounds,
    slots: Mutex<lru::LruCache<CCoords, Slot>>,
}

impl WorldCache {
    pub fn new(dim_info: Arc<DimensionInfo>, bounds: ChunkBounds, capacity: usize) -> Self {
        Self {
            dim_info,
            bounds,
            slots: Mutex::new(lru::LruCache::new(capacity.try_into().unwrap())),
        }
    }

    /// Get (loading and decoding if necessary) the chunk at `coords`. `Ok(None)`
    /// means out of bounds, absent, or not fully generated; `Err` is a
    /// genuine I/O or NBT failure and leaves the slot empty for a retry.
    pub fn get(&self, coords: CCoords) -> Result<Option<Arc<Chunk>>, ChunkLoadError> {
        if !self.bounds.contains(&coords) {
            return Ok(None);
        }

        let slot = {
            let mut slots = self.slots.lock();
            slots.get_or_insert(coords, Slot::default).clone()
        };

        let mut resolved = slot.lock();
        if let Some(chunk) = resolved.as_ref() {
            return Ok(chunk.clone());
        }
        let chunk = load_chunk(&self.dim_info, coords)?;
        *resolved = Some(chunk.clone());
        Ok(chunk)
    }
}

fn load_chunk(dim_info: &DimensionInfo, coords: CCoords) -> Result<Option<Arc<Chunk>>, ChunkLoadError> {
    let Some(data) = dim_info.get_raw_chunk(coords)? else {
        return Ok(None);
    };
    let chunk = Chunk::parse(&data)?;
    Ok(if chunk.fully_generated { Some(Arc::new(chunk)) } else { None })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bounds_single_chunk_contains_only_that_chunk() {
        let bounds = ChunkBounds::single_chunk(CCoords((3, 4).into()));
        assert!(bounds.contains(&CCoords((3, 4).into())));
        assert!(!bounds.contains(&CCoords((4, 4).into())));
        assert!(!bounds.contains(&CCoords((3, 5).into())));
    }

    #[test]
    fn bounds_single_region_spans_32x32_chunks() {
        let bounds = ChunkBounds::single_region(RCoords((0, 0).into()));
        assert!(bounds.contains(&CCoords((0, 0).into())));
        assert!(bounds.contains(&CCoords((31, 31).into())));
        assert!(!bounds.contains(&CCoords((32, 0).into())));
    }

    #[test]
    fn absent_chunk_is_ok_none_not_an_error() {
        let dim_info = Arc::new(DimensionInfo {
            path: std::path::PathBuf::new(),
            regions: std::collections::BTreeMap::new(),
        });
        let cache = WorldCache::new(dim_info, ChunkBounds::Unbounded, 4);
        assert!(matches!(cache.get(CCoords((0, 0).into())), Ok(None)));
    }

    #[test]
    fn load_failure_is_not_cached_and_can_be_retried() {
        use crate::world::RegionInfo;
        use std::io::Write;

        let dir = std::env::temp_dir().join(format!("mapwright-cache-test-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let region_path = dir.join("r.0.0.mca");
        // A truncated header is a `RegionError::BadRegionHeader`, not a missing chunk.
        std::fs::File::create(&region_path).unwrap().write_all(&[0u8; 100]).unwrap();

        let region_info = RegionInfo::try_from_path(region_path.clone()).unwrap();
        let mut regions = std::collections::BTreeMap::new();
        regions.insert(region_info.coords, region_info);
        let dim_info = Arc::new(DimensionInfo { path: dir.clone(), regions });
        let cache = WorldCache::new(dim_info, ChunkBounds::Unbounded, 4);

        assert!(cache.get(CCoords((0, 0).into())).is_err());
        // Retried rather than permanently cached as a failure.
        assert!(cache.get(CCoords((0, 0).into())).is_err());

        std::fs::remove_dir_all(&dir).ok();
    }
}
