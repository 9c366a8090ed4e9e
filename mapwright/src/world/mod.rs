/*
Anvil file format notes:

- A region's chunk offset table is ordered by (Z, X).
- A chunk's blocks are ordered by (Y, Z, X).
 */

pub mod cache;
pub mod chunk;
mod nbt;

pub use cache::{ChunkBounds, WorldCache};
pub use chunk::{decode_heightmap, BlockData, BlockInfo, BlockState, Chunk, ChunkError, LightLevel, Section};

use std::cmp::{max, min};
use std::collections::{BTreeMap, HashMap};
use std::fs::File;
use std::path::PathBuf;
use std::str::FromStr;
use std::fs;

use anyhow::anyhow;

use crate::coords::{CoordsXZ, CoordsXZY, IndexXZ, IndexXZY};
use crate::error::RegionError;
use crate::region::RegionFile;

pub const REGION_SIZE: u32 = 32;
pub const CHUNK_SIZE: u32 = 16;
pub const WORLD_HEIGHT: u32 = 384;

#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub enum DimensionID {
    Overworld,
    Nether,
    TheEnd,
}

impl FromStr for DimensionID {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "overworld" => Ok(DimensionID::Overworld),
            "nether" => Ok(DimensionID::Nether),
            "end" => Ok(DimensionID::TheEnd),
            other => Err(anyhow!("unknown dimension {other:?}, expected overworld|nether|end")),
        }
    }
}

/// Global region coordinates.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
    derive_more::Deref,
    derive_more::DerefMut,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Mul,
    derive_more::MulAssign,
)]
pub struct RCoords(pub CoordsXZ);

impl RCoords {
    pub fn to_chunk_coords(self) -> CCoords {
        CCoords((self.x() * REGION_SIZE as i32, self.z() * REGION_SIZE as i32).into())
    }
}

/// Global chunk coordinates.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
    derive_more::Deref,
    derive_more::DerefMut,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Mul,
    derive_more::MulAssign,
)]
pub struct CCoords(pub CoordsXZ);

impl CCoords {
    pub fn south(self) -> Self {
        (self.0 + (0, 1).into()).into()
    }

    pub fn east(self) -> Self {
        (self.0 + (1, 0).into()).into()
    }

    pub fn to_region_coords(self) -> (RCoords, CIndex) {
        (
            RCoords(
                (
                    self.x().div_euclid(REGION_SIZE as i32),
                    self.z().div_euclid(REGION_SIZE as i32),
                )
                    .into(),
            ),
            CIndex(
                (
                    self.x().rem_euclid(REGION_SIZE as i32) as u32,
                    self.z().rem_euclid(REGION_SIZE as i32) as u32,
                )
                    .into(),
            ),
        )
    }
}

/// Region-relative chunk index, i.e. position within a region's 32x32 grid.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
    derive_more::Deref,
    derive_more::DerefMut,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Mul,
    derive_more::MulAssign,
)]
pub struct CIndex(pub IndexXZ);

impl CIndex {
    pub fn to_chunk_coords(self, region_coords: RCoords) -> CCoords {
        CCoords(
            (
                region_coords.x() * REGION_SIZE as i32 + self.x() as i32,
                region_coords.z() * REGION_SIZE as i32 + self.z() as i32,
            )
                .into(),
        )
    }

    pub fn to_flat_index(self) -> usize {
        (self.z() * REGION_SIZE + self.x()) as usize
    }

    pub fn from_flat_index(index: usize) -> Self {
        assert!(index < (REGION_SIZE * REGION_SIZE) as usize, "not a valid region chunk index");
        Self((index as u32 % REGION_SIZE, index as u32 / REGION_SIZE).into())
    }
}

/// Global block coordinates.
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
    derive_more::Deref,
    derive_more::DerefMut,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Mul,
    derive_more::MulAssign,
)]
pub struct BCoords(pub CoordsXZY);

/// Block index within a chunk section (0..4096, ordered Y, Z, X).
#[derive(
    Clone,
    Copy,
    Debug,
    Default,
    Eq,
    PartialEq,
    Ord,
    PartialOrd,
    Hash,
    derive_more::From,
    derive_more::Into,
    derive_more::Display,
    derive_more::Deref,
    derive_more::DerefMut,
    derive_more::Add,
    derive_more::AddAssign,
    derive_more::Sub,
    derive_more::SubAssign,
    derive_more::Mul,
    derive_more::MulAssign,
)]
pub struct BIndex(pub IndexXZY);

impl BIndex {
    #[inline(always)]
    pub fn up(self) -> Self {
        (self.0 + (0, 0, 1).into()).into()
    }

    #[inline(always)]
    pub fn south(self) -> Self {
        (self.0 + (0, 1, 0).into()).into()
    }

    #[inline(always)]
    pub fn east(self) -> Self {
        (self.0 + (1, 0, 0).into()).into()
    }

    pub fn to_flat_index(self) -> usize {
        (self.y() * CHUNK_SIZE * CHUNK_SIZE + self.z() * CHUNK_SIZE + self.x()) as usize
    }

    pub fn from_flat_index(index: usize) -> Self {
        assert!(index < (CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) as usize, "not a valid section block index");
        let x = index & 0xF;
        let z = (index >> 4) & 0xF;
        let y = (index >> 8) & 0xF;
        Self((x as u32, z as u32, y as u32).into())
    }
}

#[derive(Debug)]
pub struct WorldInfo {
    pub path: PathBuf,
    pub dimensions: HashMap<DimensionID, DimensionInfo>,
}

impl WorldInfo {
    pub fn try_from_path(path: PathBuf) -> anyhow::Result<Self> {
        let mut dimensions = HashMap::new();
        if let Ok(dimension_info) = DimensionInfo::try_from_path(path.clone()) {
            dimensions.insert(DimensionID::Overworld, dimension_info);
        }
        if let Ok(dimension_info) = DimensionInfo::try_from_path(path.join("DIM-1")) {
            dimensions.insert(DimensionID::Nether, dimension_info);
        }
        if let Ok(dimension_info) = DimensionInfo::try_from_path(path.join("DIM1")) {
            dimensions.insert(DimensionID::TheEnd, dimension_info);
        }
        if dimensions.is_empty() {
            Err(anyhow!("no dimensions found"))
        } else {
            Ok(Self { path, dimensions })
        }
    }

    pub fn get_dimension(&self, id: &DimensionID) -> Option<&DimensionInfo> {
        self.dimensions.get(id)
    }
}

#[derive(Debug)]
pub struct DimensionInfo {
    pub path: PathBuf,
    pub regions: BTreeMap<RCoords, RegionInfo>,
}

impl DimensionInfo {
    pub fn try_from_path(path: PathBuf) -> anyhow::Result<Self> {
        log::debug!("DimensionInfo::try_from_path: {:?}", path);
        let regions_path = path.join("region");
        if !regions_path.is_dir() {
            return Err(anyhow!("not a dimension directory"));
        }
        let mut regions = BTreeMap::new();
        for entry in fs::read_dir(regions_path)? {
            if let Ok(region) = RegionInfo::try_from_path(entry?.path()) {
                regions.insert(region.coords, region);
            }
        }
        if regions.is_empty() {
            return Err(anyhow!("no regions found"));
        }
        Ok(Self { path, regions })
    }

    pub fn get_region(&self, region_coords: RCoords) -> Option<&RegionInfo> {
        self.regions.get(&region_coords)
    }

    /// Minimum region coordinates such that every region has `x() >= min.x()` and `z() >= min.z()`.
    pub fn min_region_coords(&self) -> RCoords {
        self.regions
            .keys()
            .cloned()
            .reduce(|acc, k| RCoords((min(acc.x(), k.x()), min(acc.z(), k.z())).into()))
            .unwrap()
    }

    /// Exclusive upper bound on region coordinates, i.e. every region has `x() < max.x()` and `z() < max.z()`.
    pub fn max_region_coords(&self) -> RCoords {
        RCoords((1, 1).into())
            + self
                .regions
                .keys()
                .cloned()
                .reduce(|acc, k| RCoords((max(acc.x(), k.x()), max(acc.z(), k.z())).into()))
                .unwrap()
    }

    /// Decompressed chunk NBT bytes at `chunk_coords`, if such a chunk has data.
    pub fn get_raw_chunk(&self, chunk_coords: CCoords) -> Result<Option<Vec<u8>>, RegionError> {
        let (region_coords, chunk_index) = chunk_coords.to_region_coords();
        let Some(region_info) = self.regions.get(&region_coords) else {
            return Ok(None);
        };
        let region = region_info.open()?;
        match region.chunk_data(chunk_index) {
            Ok(data) => Ok(Some(data)),
            Err(RegionError::MissingChunk(_)) => Ok(None),
            Err(e) => Err(e),
        }
    }
}

#[derive(Clone, Debug)]
pub struct RegionInfo {
    pub coords: RCoords,
    pub path: PathBuf,
}

impl RegionInfo {
    pub fn try_from_path(path: PathBuf) -> anyhow::Result<Self> {
        if !path.is_file() {
            return Err(anyhow!("not a file"));
        }
        let filename = path.file_name().unwrap().to_str().ok_or(anyhow!("invalid filename"))?;
        if let Some(next) = filename.strip_suffix(".mca")
            && let Some(next) = next.strip_prefix("r.")
            && let Some((raw_x, raw_z)) = next.split_once(".")
            && let Ok(x) = i32::from_str(raw_x)
            && let Ok(z) = i32::from_str(raw_z)
        {
            Ok(Self {
                coords: RCoords((x, z).into()),
                path,
            })
        } else {
            Err(anyhow!("not a region filename (r.X.Z.mca)"))
        }
    }

    pub fn open(&self) -> Result<RegionFile, RegionError> {
        let file = File::open(&self.path)?;
        RegionFile::read(self.coords, file)
    }
}
