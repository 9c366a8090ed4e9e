//! Work dispatcher: worker pool, compositing, progress (spec.md §4.7, §5).
//!
//! No teacher analogue exists for the queue/condvar protocol itself (the
//! teacher rendered single-threaded), but the synchronization primitives
//! follow the same `parking_lot::{Mutex, Condvar}` idiom the teacher uses
//! for its caches, and the read-only shared state (`TileSet`, `BlockImages`,
//! `WorldCache`) is passed in as `Arc`s the way the teacher shares its own
//! `Settings`/`AssetCache` across renders.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Arc;
use std::thread;

use image::RgbaImage;
use parking_lot::{Condvar, Mutex};

use crate::render::{composite_children, RenderContext, TileRenderer};
use crate::tileset::{TilePath, TileSet};

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum WorkKind {
    RenderLeaf,
    CompositeParent,
}

#[derive(Clone, Debug)]
pub struct RenderWork {
    pub path: TilePath,
    pub kind: WorkKind,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum TileStatus {
    Done,
    Failed,
}

pub struct RenderWorkResult {
    pub path: TilePath,
    pub image: Option<Arc<RgbaImage>>,
    pub status: TileStatus,
}

/// Progress sink carried by the dispatcher instead of reaching into a
/// global logger (spec.md §9 "Global logging").
pub trait ProgressHandle: Send + Sync {
    fn tile_done(&self, path: &TilePath, status: TileStatus);
    fn run_finished(&self, completed: usize, total: usize);
}

pub struct NullProgress;

impl ProgressHandle for NullProgress {
    fn tile_done(&self, _path: &TilePath, _status: TileStatus) {}
    fn run_finished(&self, _completed: usize, _total: usize) {}
}

struct Shared {
    work_queue: Mutex<VecDeque<RenderWork>>,
    work_extra_queue: Mutex<VecDeque<RenderWork>>,
    work_available: Condvar,
    results: Mutex<Vec<RenderWorkResult>>,
    images: Mutex<HashMap<TilePath, Arc<RgbaImage>>>,
    rendered_tiles: Mutex<HashSet<TilePath>>,
    pending_children: Mutex<HashMap<TilePath, u8>>,
    finished: Mutex<bool>,
    total_targets: usize,
}

/// Fixed-size worker pool that renders every leaf in `TileSet::render_leaves`
/// and composites every ancestor in `TileSet::require_composites` (spec.md
/// §4.7, §5).
pub struct Dispatcher {
    shared: Arc<Shared>,
}

impl Dispatcher {
    pub fn run(
        tile_set: &TileSet,
        renderer: Arc<dyn TileRenderer>,
        ctx: Arc<RenderContext>,
        tile_width: u32,
        worker_count: usize,
        progress: Arc<dyn ProgressHandle>,
    ) -> HashMap<TilePath, Arc<RgbaImage>> {
        let total_targets = tile_set.render_leaves().len() + tile_set.require_composites().len();
        let shared = Arc::new(Shared {
            work_queue: Mutex::new(
                tile_set
                    .render_leaves()
                    .iter()
                    .cloned()
                    .map(|path| RenderWork { path, kind: WorkKind::RenderLeaf })
                    .collect(),
            ),
            work_extra_queue: Mutex::new(VecDeque::new()),
            work_available: Condvar::new(),
            results: Mutex::new(Vec::new()),
            images: Mutex::new(HashMap::new()),
            rendered_tiles: Mutex::new(HashSet::new()),
            pending_children: Mutex::new(HashMap::new()),
            finished: Mutex::new(false),
            total_targets,
        });

        // Root-level composites can only become eligible once their children
        // land in `rendered_tiles`; track how many children each composite is
        // still waiting on so `work_finished` knows when to enqueue it. Only
        // count children that will actually be produced (queued as a render
        // leaf or another composite) — a sparse world leaves most quadrants
        // absent, and waiting on all four unconditionally never reaches zero.
        {
            let produced: HashSet<&TilePath> =
                tile_set.render_leaves().iter().chain(tile_set.require_composites()).collect();
            let mut pending_children = shared.pending_children.lock();
            for composite in tile_set.require_composites() {
                let count = composite.children().iter().filter(|child| produced.contains(child)).count() as u8;
                pending_children.insert(composite.clone(), count);
            }
        }

        thread::scope(|scope| {
            for _ in 0..worker_count.max(1) {
                let shared = shared.clone();
                let renderer = renderer.clone();
                let ctx = ctx.clone();
                let progress = progress.clone();
                scope.spawn(move || worker_loop(shared, renderer, ctx, tile_width, progress));
            }
        });

        shared.images.lock().clone()
    }
}

fn worker_loop(
    shared: Arc<Shared>,
    renderer: Arc<dyn TileRenderer>,
    ctx: Arc<RenderContext>,
    tile_width: u32,
    progress: Arc<dyn ProgressHandle>,
) {
    loop {
        let Some(work) = get_work(&shared) else {
            return;
        };

        let (image, status) = match work.kind {
            WorkKind::RenderLeaf => {
                let pos = leaf_tile_pos(&work.path);
                let image = renderer.render_tile(pos, tile_width, &ctx);
                (Some(Arc::new(image)), TileStatus::Done)
            }
            WorkKind::CompositeParent => {
                let images = shared.images.lock();
                let children: Vec<Option<Arc<RgbaImage>>> =
                    work.path.children().into_iter().map(|child| images.get(&child).cloned()).collect();
                drop(images);
                let refs = [
                    children[0].as_deref(),
                    children[1].as_deref(),
                    children[2].as_deref(),
                    children[3].as_deref(),
                ];
                let image = composite_children(refs, tile_width);
                (Some(Arc::new(image)), TileStatus::Done)
            }
        };

        progress.tile_done(&work.path, status);
        work_finished(&shared, work.path, image, status, &progress);
    }
}

/// Leaf `TilePos` is recovered from the path by treating its own depth as
/// the addressing depth; leaves are only ever dequeued at their own level.
fn leaf_tile_pos(path: &TilePath) -> crate::tileset::TilePos {
    path.to_tile_pos(path.level() as u32)
}

fn get_work(shared: &Shared) -> Option<RenderWork> {
    loop {
        if let Some(work) = shared.work_extra_queue.lock().pop_front() {
            return Some(work);
        }
        let mut queue = shared.work_queue.lock();
        if let Some(work) = queue.pop_front() {
            return Some(work);
        }
        if *shared.finished.lock() {
            return None;
        }
        shared.work_available.wait(&mut queue);
    }
}

fn work_finished(
    shared: &Shared,
    path: TilePath,
    image: Option<Arc<RgbaImage>>,
    status: TileStatus,
    progress: &Arc<dyn ProgressHandle>,
) {
    if let Some(image) = &image {
        shared.images.lock().insert(path.clone(), image.clone());
    }
    shared.results.lock().push(RenderWorkResult { path: path.clone(), image, status });
    shared.rendered_tiles.lock().insert(path.clone());

    if let Some(parent) = path.parent() {
        let mut pending_children = shared.pending_children.lock();
        if let Some(remaining) = pending_children.get_mut(&parent) {
            *remaining -= 1;
            if *remaining == 0 {
                shared.work_extra_queue.lock().push_back(RenderWork { path: parent, kind: WorkKind::CompositeParent });
                shared.work_available.notify_all();
            }
        }
    }

    let rendered = shared.rendered_tiles.lock().len();
    if rendered >= shared.total_targets {
        *shared.finished.lock() = true;
        progress.run_finished(rendered, shared.total_targets);
        shared.work_available.notify_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::{BlockImages, RenderMode, ShadowWeights};
    use crate::tileset::{TileGeometry, Variant};
    use crate::world::cache::{ChunkBounds, WorldCache};
    use crate::world::{CCoords, DimensionInfo};
    use std::collections::BTreeMap;

    struct SolidRenderer;

    impl TileRenderer for SolidRenderer {
        fn render_tile(&self, _pos: crate::tileset::TilePos, tile_width: u32, _ctx: &RenderContext) -> RgbaImage {
            RgbaImage::from_pixel(tile_width, tile_width, image::Rgba([1, 2, 3, 255]))
        }
    }

    fn empty_context() -> Arc<RenderContext> {
        let dim_info = Arc::new(DimensionInfo {
            path: std::path::PathBuf::new(),
            regions: BTreeMap::new(),
        });
        Arc::new(RenderContext {
            block_images: Arc::new(BlockImages::new()),
            world_cache: Arc::new(WorldCache::new(dim_info, ChunkBounds::Unbounded, 16)),
            render_mode: RenderMode::Normal,
            shadow_weights: ShadowWeights::default(),
        })
    }

    #[test]
    fn s5_dispatcher_scenario_renders_leaves_and_root_composite() {
        let mut tile_set = TileSet::new(Variant::TopDown(TileGeometry { tile_chunks: 1 }));
        let chunks = vec![
            (CCoords((0, 0).into()), 100),
            (CCoords((0, 1).into()), 100),
            (CCoords((1, 0).into()), 100),
            (CCoords((1, 1).into()), 100),
        ];
        tile_set.scan(chunks, 0);
        tile_set.close();
        tile_set.freeze();

        let images = Dispatcher::run(
            &tile_set,
            Arc::new(SolidRenderer),
            empty_context(),
            8,
            2,
            Arc::new(NullProgress),
        );

        for leaf in tile_set.render_leaves() {
            assert!(images.contains_key(leaf));
        }
        assert!(images.contains_key(&TilePath::root()));
    }
}
