use std::collections::HashMap;

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, File, FileFormat};
use image::Rgb;
use serde::Deserialize;

use crate::crop::{BlockMask, Bounds, WorldCrop};
use crate::world::DimensionID;

#[derive(Debug, Default, Deserialize)]
struct RawColorEntry {
    color: u32,
    #[serde(default)]
    aliases: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawColorMap(HashMap<String, RawColorEntry>);

#[derive(Debug)]
pub struct BiomeColorMap {
    default: Rgb<u8>,
    biomes: HashMap<String, Rgb<u8>>,
}

impl BiomeColorMap {
    fn from_raw(mut raw: RawColorMap) -> anyhow::Result<BiomeColorMap> {
        let Some(raw_default) = raw.0.remove("_default") else {
            return Err(anyhow::anyhow!(
                "missing _default.color in biome_colors.<kind> config"
            ));
        };
        let default = convert_rgb(raw_default.color);
        let mut biomes = HashMap::new();
        for (biome, RawColorEntry { color, aliases }) in raw.0.into_iter() {
            let color = convert_rgb(color);
            biomes.insert(biome, color);
            for alias in aliases.into_iter() {
                biomes.insert(alias, color);
            }
        }
        Ok(BiomeColorMap { default, biomes })
    }

    pub fn get(&self, biome: &str) -> Rgb<u8> {
        self.biomes.get(biome).cloned().unwrap_or(self.default)
    }
}

#[derive(Debug)]
pub struct BiomeColors {
    pub grass: BiomeColorMap,
    pub foliage: BiomeColorMap,
    pub dry_foliage: BiomeColorMap,
    pub water: BiomeColorMap,
}

/// Inclusive (x, y, z) corner used by the `crop.from`/`crop.to` config keys.
#[derive(Debug, Default, Deserialize)]
struct RawCorner {
    x: Option<i32>,
    y: Option<i32>,
    z: Option<i32>,
}

#[derive(Debug, Default, Deserialize)]
struct RawCropSettings {
    from: Option<RawCorner>,
    to: Option<RawCorner>,
    #[serde(default)]
    crop_unpopulated_chunks: bool,
}

fn bounds_from_corners(from: Option<i32>, to: Option<i32>) -> Bounds<i32> {
    match (from, to) {
        (None, None) => Bounds::unbounded(),
        (a, b) => {
            let lo = match (a, b) {
                (Some(a), Some(b)) => a.min(b),
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => unreachable!(),
            };
            let hi = match (a, b) {
                (Some(a), Some(b)) => a.max(b),
                (Some(a), None) => a,
                (None, Some(b)) => b,
                (None, None) => unreachable!(),
            };
            Bounds::new(Some(lo), Some(hi))
        }
    }
}

fn crop_from_raw(raw: RawCropSettings) -> WorldCrop {
    let from = raw.from.unwrap_or_default();
    let to = raw.to.unwrap_or_default();
    let x = bounds_from_corners(from.x, to.x);
    let z = bounds_from_corners(from.z, to.z);
    let y = bounds_from_corners(from.y, to.y);
    let mut crop = WorldCrop::rect(x, z, y);
    crop.crop_unpopulated_chunks = raw.crop_unpopulated_chunks;
    crop
}

/// Ambient run parameters this spec owns (spec.md §4.4, §5, §6), layered
/// over the same `config` source as the asset-facing settings below.
#[derive(Debug)]
pub struct Settings {
    pub workers: usize,
    pub dimension: DimensionID,
    pub crop: WorldCrop,
    pub biome_colors: BiomeColors,
}

impl Settings {
    pub fn config_builder() -> ConfigBuilder<DefaultState> {
        Config::builder().add_source(File::from_str(
            include_str!("settings_default.toml"),
            FileFormat::Toml,
        ))
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Settings> {
        let workers = config
            .get::<usize>("workers")
            .unwrap_or_else(|_| std::thread::available_parallelism().map(|n| n.get()).unwrap_or(1));
        let dimension = config
            .get::<String>("dimension")
            .unwrap_or_else(|_| "overworld".to_string())
            .parse()?;
        let crop = crop_from_raw(config.get::<RawCropSettings>("crop").unwrap_or_default());
        let crop = match config.get::<String>("block_mask") {
            Ok(spec) => crop.with_mask(BlockMask::parse(&spec)?),
            Err(_) => crop,
        };

        Ok(Settings {
            workers,
            dimension,
            crop,
            biome_colors: BiomeColors {
                grass: BiomeColorMap::from_raw(config.get("biome_colors.grass")?)?,
                foliage: BiomeColorMap::from_raw(config.get("biome_colors.foliage")?)?,
                dry_foliage: BiomeColorMap::from_raw(config.get("biome_colors.dry_foliage")?)?,
                water: BiomeColorMap::from_raw(config.get("biome_colors.water")?)?,
            },
        })
    }
}

const fn convert_rgb(raw: u32) -> Rgb<u8> {
    Rgb([(raw >> 16) as u8, (raw >> 8) as u8, raw as u8])
}
