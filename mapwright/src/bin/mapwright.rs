//! Inspection CLI (spec.md §6): the only binary this crate ships, replacing
//! the teacher's old `bin/mcrender.rs` render-only driver. Subscriber setup
//! lives here, not in the library, the way the teacher's `main` already did
//! it.

use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use mapwright::crop::{Bounds, WorldCrop};
use mapwright::nbt::{self, CompoundExt, Tag};
use mapwright::world::{decode_heightmap, Chunk, DimensionID, DimensionInfo, RCoords, RegionInfo, WorldInfo};
use mapwright::RegionFile;

/// Region coordinates don't matter for a standalone `r.X.Z.mca` scan except
/// to label output, so recover them from the filename when possible (spec.md
/// §6 layout) instead of requiring a whole world directory.
fn region_coords_from_path(path: &std::path::Path) -> RCoords {
    RegionInfo::try_from_path(path.to_path_buf()).map(|info| info.coords).unwrap_or(RCoords((0, 0).into()))
}

#[derive(Parser, Debug)]
#[command(name = "mapwright", about = "Inspect Minecraft region and chunk data")]
struct Cli {
    /// Emit human-readable NBT of every chunk in a region file.
    #[arg(long, value_name = "REGION_FILE")]
    dump: Option<PathBuf>,

    /// Emit one JSON line per section within the crop, for a world directory.
    #[arg(long, value_name = "WORLD_DIR")]
    block_states: Option<PathBuf>,

    /// Emit `cx cz h0,h1,...,h255` rows for a region file.
    #[arg(long, value_name = "REGION_FILE")]
    height_maps: Option<PathBuf>,

    /// Scan a single region file for block-entity items, instead of a whole world directory.
    #[arg(long, value_name = "REGION_FILE")]
    region: Option<PathBuf>,

    /// World directory to scan for block-entity items (positional form of `--region`).
    world_dir: Option<PathBuf>,

    /// Inclusive crop corner, `x,y,z`.
    #[arg(long, value_name = "X,Y,Z")]
    from: Option<String>,
    /// Inclusive crop corner, `x,y,z`.
    #[arg(long, value_name = "X,Y,Z")]
    to: Option<String>,

    #[arg(long, default_value = "overworld")]
    dimension: String,
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    if let Some(region_path) = &cli.dump {
        return dump_region(region_path);
    }
    if let Some(world_dir) = &cli.block_states {
        let crop = build_crop(cli.from.as_deref(), cli.to.as_deref())?;
        let dimension: DimensionID = cli.dimension.parse()?;
        return dump_block_states(world_dir, &dimension, &crop);
    }
    if let Some(region_path) = &cli.height_maps {
        return dump_height_maps(region_path);
    }
    if let Some(region_path) = &cli.region {
        return dump_items_region(region_path);
    }
    if let Some(world_dir) = &cli.world_dir {
        let dimension: DimensionID = cli.dimension.parse()?;
        return dump_items_world(world_dir, &dimension);
    }
    anyhow::bail!("no command given: expected one of --dump, --block-states, --height-maps, --region, or a world directory");
}

fn parse_xyz(s: &str) -> anyhow::Result<(i32, i32, i32)> {
    let mut parts = s.split(',');
    let (Some(x), Some(y), Some(z), None) = (parts.next(), parts.next(), parts.next(), parts.next()) else {
        anyhow::bail!("expected x,y,z, got {s:?}");
    };
    Ok((x.trim().parse()?, y.trim().parse()?, z.trim().parse()?))
}

fn axis_bounds(from: Option<i32>, to: Option<i32>) -> Bounds<i32> {
    match (from, to) {
        (None, None) => Bounds::unbounded(),
        (Some(a), Some(b)) => Bounds::new(Some(a.min(b)), Some(a.max(b))),
        (Some(a), None) => Bounds::new(Some(a), None),
        (None, Some(b)) => Bounds::new(None, Some(b)),
    }
}

fn build_crop(from: Option<&str>, to: Option<&str>) -> anyhow::Result<WorldCrop> {
    let from = from.map(parse_xyz).transpose()?;
    let to = to.map(parse_xyz).transpose()?;
    let x = axis_bounds(from.map(|(x, _, _)| x), to.map(|(x, _, _)| x));
    let y = axis_bounds(from.map(|(_, y, _)| y), to.map(|(_, y, _)| y));
    let z = axis_bounds(from.map(|(_, _, z)| z), to.map(|(_, _, z)| z));
    Ok(WorldCrop::rect(x, z, y))
}

fn dump_region(path: &PathBuf) -> anyhow::Result<()> {
    let file = std::fs::File::open(path)?;
    let region = RegionFile::read(region_coords_from_path(path), file)?;
    for chunk_coords in region.containing_chunks() {
        let (_, index) = chunk_coords.to_region_coords();
        let data = region.chunk_data(index)?;
        let tag = nbt::decode(&data, region.chunk_blob(index)?.compression)?;
        println!("chunk {chunk_coords:?}:");
        print_compound(&tag, 1);
    }
    Ok(())
}

fn print_compound(compound: &nbt::Compound, indent: usize) {
    for (name, tag) in compound {
        print_tag(name, tag, indent);
    }
}

fn print_tag(name: &str, tag: &Tag, indent: usize) {
    let pad = "  ".repeat(indent);
    match tag {
        Tag::Compound(inner) => {
            println!("{pad}{name}:");
            print_compound(inner, indent + 1);
        }
        Tag::List(items) => {
            println!("{pad}{name}: [{} items]", items.len());
            for (i, item) in items.iter().enumerate() {
                print_tag(&i.to_string(), item, indent + 1);
            }
        }
        other => println!("{pad}{name} ({}) = {:?}", other.type_name(), other),
    }
}

fn dump_block_states(world_dir: &PathBuf, dimension: &DimensionID, crop: &WorldCrop) -> anyhow::Result<()> {
    let world = WorldInfo::try_from_path(world_dir.clone())?;
    let dim_info = world.get_dimension(dimension).ok_or_else(|| anyhow::anyhow!("dimension not present in world"))?;
    for (region_coords, region_info) in &dim_info.regions {
        if !crop.is_region_contained(*region_coords) {
            continue;
        }
        for chunk_coords in region_info.open()?.containing_chunks() {
            if !crop.is_chunk_contained(chunk_coords) {
                continue;
            }
            let Some(data) = dim_info.get_raw_chunk(chunk_coords)? else {
                continue;
            };
            let chunk = Chunk::parse(&data)?;
            for section in &chunk.sections {
                let palette: Vec<String> = section.block_palette.iter().map(|s| s.to_string()).collect();
                let block_states: Vec<u16> = section.block_data.iter().map(|d| d.state_index()).collect();
                let line = serde_json::json!({
                    "section": [chunk_coords.x(), section.base.y() / 16, chunk_coords.z()],
                    "palette": palette,
                    "block_states": block_states,
                });
                println!("{line}");
            }
        }
    }
    Ok(())
}

fn dump_height_maps(path: &PathBuf) -> anyhow::Result<()> {
    let file = std::fs::File::open(path)?;
    let region = RegionFile::read(region_coords_from_path(path), file)?;
    for chunk_coords in region.containing_chunks() {
        let (_, index) = chunk_coords.to_region_coords();
        let data = region.chunk_data(index)?;
        let blob_compression = region.chunk_blob(index)?.compression;
        let tag = nbt::decode(&data, blob_compression)?;
        let Some(Tag::Compound(heightmaps)) = tag.get("Heightmaps") else {
            continue;
        };
        let Some((_, Tag::LongArray(longs))) =
            heightmaps.get("WORLD_SURFACE").map(|t| ("WORLD_SURFACE", t)).or_else(|| heightmaps.iter().next().map(|(k, v)| (k.as_str(), v)))
        else {
            continue;
        };
        let cx = tag.find_tag::<i32>("xPos")?.unwrap_or_default();
        let cz = tag.find_tag::<i32>("zPos")?.unwrap_or_default();
        let heights = decode_heightmap(longs);
        let row = heights.iter().map(u16::to_string).collect::<Vec<_>>().join(",");
        println!("{cx} {cz} {row}");
    }
    Ok(())
}

fn dump_items_region(path: &PathBuf) -> anyhow::Result<()> {
    let file = std::fs::File::open(path)?;
    let region = RegionFile::read(region_coords_from_path(path), file)?;
    for chunk_coords in region.containing_chunks() {
        let (_, index) = chunk_coords.to_region_coords();
        let data = region.chunk_data(index)?;
        let blob_compression = region.chunk_blob(index)?.compression;
        let tag = nbt::decode(&data, blob_compression)?;
        dump_items_chunk(&tag)?;
    }
    Ok(())
}

fn dump_items_world(world_dir: &PathBuf, dimension: &DimensionID) -> anyhow::Result<()> {
    let world = WorldInfo::try_from_path(world_dir.clone())?;
    let dim_info: &DimensionInfo =
        world.get_dimension(dimension).ok_or_else(|| anyhow::anyhow!("dimension not present in world"))?;
    for region_info in dim_info.regions.values() {
        let region = region_info.open()?;
        for chunk_coords in region.containing_chunks() {
            let (_, index) = chunk_coords.to_region_coords();
            let data = region.chunk_data(index)?;
            let blob_compression = region.chunk_blob(index)?.compression;
            let tag = nbt::decode(&data, blob_compression)?;
            dump_items_chunk(&tag)?;
        }
    }
    Ok(())
}

fn dump_items_chunk(chunk: &nbt::Compound) -> anyhow::Result<()> {
    let Some(Tag::List(block_entities)) = chunk.get("block_entities") else {
        return Ok(());
    };
    for entity in block_entities {
        let Tag::Compound(entity) = entity else { continue };
        let Some(id) = entity.find_tag::<String>("id")? else { continue };
        let x = entity.find_tag::<i32>("x")?.unwrap_or_default();
        let y = entity.find_tag::<i32>("y")?.unwrap_or_default();
        let z = entity.find_tag::<i32>("z")?.unwrap_or_default();
        dump_items_of(&id, x, y, z, entity);
    }
    Ok(())
}

fn dump_items_of(entity_id: &str, x: i32, y: i32, z: i32, compound: &nbt::Compound) {
    let Some(Tag::List(items)) = compound.get("Items") else {
        return;
    };
    for item in items {
        let Tag::Compound(item) = item else { continue };
        let Some(item_id) = item.get("id").and_then(Tag::as_str) else { continue };
        let slot = tag_as_i64(item.get("Slot")).unwrap_or_default();
        let count = tag_as_i64(item.get("count")).or_else(|| tag_as_i64(item.get("Count"))).unwrap_or_default();
        println!("{entity_id} {x},{y},{z} item={item_id} slot={slot} count={count}");

        if let Some(Tag::Compound(tag)) = item.get("tag")
            && let Some(Tag::Compound(nested)) = tag.get("BlockEntityTag")
        {
            dump_items_of(item_id, x, y, z, nested);
        }
    }
}

fn tag_as_i64(tag: Option<&Tag>) -> Option<i64> {
    match tag? {
        Tag::Byte(v) => Some(*v as i64),
        Tag::Short(v) => Some(*v as i64),
        Tag::Int(v) => Some(*v as i64),
        Tag::Long(v) => Some(*v),
        _ => None,
    }
}
