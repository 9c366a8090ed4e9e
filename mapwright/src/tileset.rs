//! Tile set and tile path quadtree (spec.md §4.5).
//!
//! Chunk-to-tile geometry for the side (isometric) view is grounded on the
//! teacher's `render::TILE_RENDER_CHUNK_OFFSETS` (`render/mod.rs`): each
//! chunk's isometric footprint spans a 2-wide diagonal band of tile
//! columns, which is why `SideIso::chunk_tiles` below yields the two tiles
//! whose projected diamonds can overlap a given chunk instead of the single
//! tile `TopDown` maps to.

use std::collections::{BTreeSet, HashSet};

use crate::world::CCoords;

/// Tile coordinates at the leaf zoom level (spec.md §3 `TilePos`).
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TilePos {
    pub x: i32,
    pub y: i32,
}

/// Quadtree address of a tile (or composite), root-to-leaf, each step in
/// {1,2,3,4}. Lexicographic order matches total order over paths.
#[derive(Clone, Debug, Default, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct TilePath(Vec<u8>);

impl TilePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn level(&self) -> usize {
        self.0.len()
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn parent(&self) -> Option<TilePath> {
        if self.0.is_empty() {
            None
        } else {
            Some(TilePath(self.0[..self.0.len() - 1].to_vec()))
        }
    }

    pub fn child(&self, quadrant: u8) -> TilePath {
        debug_assert!((1..=4).contains(&quadrant));
        let mut path = self.0.clone();
        path.push(quadrant);
        TilePath(path)
    }

    pub fn children(&self) -> [TilePath; 4] {
        [self.child(1), self.child(2), self.child(3), self.child(4)]
    }

    /// Ancestors from immediate parent up to (and including) the root.
    pub fn ancestors(&self) -> impl Iterator<Item = TilePath> + '_ {
        (0..self.0.len()).rev().map(|i| TilePath(self.0[..i].to_vec()))
    }

    /// Leaf-level tile position addressed by this path at `root_depth`.
    ///
    /// The quadtree itself only ever addresses non-negative coordinates in
    /// `[0, 2^root_depth)`; tile positions are signed (a chunk at negative x
    /// or z is common), so the root is centered on `tile_offset(root_depth)`
    /// and every signed position is shifted into that range before/after
    /// addressing.
    pub fn to_tile_pos(&self, root_depth: u32) -> TilePos {
        let offset = tile_offset(root_depth);
        let mut x: i64 = 0;
        let mut y: i64 = 0;
        for (depth, &quadrant) in self.0.iter().enumerate() {
            let half = 1i64 << (root_depth as usize - depth - 1);
            match quadrant {
                1 => {}
                2 => x += half,
                3 => y += half,
                4 => {
                    x += half;
                    y += half;
                }
                _ => unreachable!("quadrant out of range"),
            }
        }
        TilePos { x: (x - offset) as i32, y: (y - offset) as i32 }
    }

    pub fn from_tile_pos(pos: TilePos, root_depth: u32) -> TilePath {
        let offset = tile_offset(root_depth);
        let mut path = Vec::with_capacity(root_depth as usize);
        let mut x = pos.x as i64 + offset;
        let mut y = pos.y as i64 + offset;
        for depth in 0..root_depth {
            let half = 1i64 << (root_depth - depth - 1);
            let quadrant = match (x >= half, y >= half) {
                (false, false) => 1,
                (true, false) => 2,
                (false, true) => 3,
                (true, true) => 4,
            };
            if x >= half {
                x -= half;
            }
            if y >= half {
                y -= half;
            }
            path.push(quadrant);
        }
        TilePath(path)
    }

    pub fn segments(&self) -> &[u8] {
        &self.0
    }

    /// Filesystem path fragment per tile, e.g. `2/4/1` (root is `base`).
    pub fn display_path(&self) -> String {
        if self.0.is_empty() {
            "base".to_string()
        } else {
            self.0.iter().map(|q| q.to_string()).collect::<Vec<_>>().join("/")
        }
    }
}

/// Half-width of the quadtree's addressable range at `root_depth`, i.e. the
/// shift that centers the root on signed tile position (0, 0).
fn tile_offset(root_depth: u32) -> i64 {
    1i64 << root_depth.saturating_sub(1)
}

/// How many chunks (per axis) one base-zoom tile covers.
#[derive(Clone, Copy, Debug)]
pub struct TileGeometry {
    pub tile_chunks: u32,
}

#[derive(Clone, Copy, Debug)]
pub enum Variant {
    TopDown(TileGeometry),
    SideIso(TileGeometry),
}

impl Variant {
    /// The tile(s) a chunk projects onto (spec.md §4.5).
    pub fn chunk_tiles(&self, chunk: CCoords) -> Vec<TilePos> {
        match self {
            Variant::TopDown(geom) => vec![TilePos {
                x: chunk.x().div_euclid(geom.tile_chunks as i32),
                y: chunk.z().div_euclid(geom.tile_chunks as i32),
            }],
            Variant::SideIso(geom) => {
                // Isometric projection places (x, z) at screen column x+z and
                // screen row z-x; a chunk's 16x16 footprint therefore spans
                // the two adjacent diagonal tile columns whose bounding
                // diamonds its corners fall into.
                let column = (chunk.x() + chunk.z()).div_euclid(geom.tile_chunks as i32);
                let row = (chunk.z() - chunk.x()).div_euclid(geom.tile_chunks as i32);
                vec![
                    TilePos { x: column, y: row },
                    TilePos { x: column, y: row + 1 },
                ]
            }
        }
    }
}

/// Quadtree-addressed set of tiles required for a render (spec.md §3/§4.5).
#[derive(Debug)]
pub struct TileSet {
    variant: Variant,
    root_depth: u32,
    render_leaves: BTreeSet<TilePath>,
    require_composites: BTreeSet<TilePath>,
    all_leaves: BTreeSet<TilePath>,
    frozen: bool,
}

impl TileSet {
    pub fn new(variant: Variant) -> Self {
        Self {
            variant,
            root_depth: 1,
            render_leaves: BTreeSet::new(),
            require_composites: BTreeSet::new(),
            all_leaves: BTreeSet::new(),
            frozen: false,
        }
    }

    /// Scan step: for every chunk whose mtime is newer than `last_check_time`
    /// (or that has never been rendered), mark its tile(s) for (re-)render.
    pub fn scan<I>(&mut self, chunks: I, last_check_time: u32)
    where
        I: IntoIterator<Item = (CCoords, u32)>,
    {
        assert!(!self.frozen, "cannot scan a frozen TileSet");
        let mut max_coord: i64 = 0;
        let mut all_positions = HashSet::new();
        let mut render_positions = HashSet::new();
        for (chunk, mtime) in chunks {
            for tile in self.variant.chunk_tiles(chunk) {
                max_coord = max_coord.max(tile.x.unsigned_abs() as i64).max(tile.y.unsigned_abs() as i64);
                all_positions.insert(tile);
                if mtime > last_check_time {
                    render_positions.insert(tile);
                }
            }
        }
        self.root_depth = root_depth_for(max_coord);
        self.all_leaves = all_positions
            .into_iter()
            .map(|p| TilePath::from_tile_pos(p, self.root_depth))
            .collect();
        self.render_leaves = render_positions
            .into_iter()
            .map(|p| TilePath::from_tile_pos(p, self.root_depth))
            .collect();
    }

    /// Close step: compute the transitive ancestor closure of `render_leaves`.
    pub fn close(&mut self) {
        assert!(!self.frozen, "cannot close a frozen TileSet");
        let mut composites = BTreeSet::new();
        for leaf in &self.render_leaves {
            for ancestor in leaf.ancestors() {
                composites.insert(ancestor);
            }
        }
        self.require_composites = composites;
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn root_depth(&self) -> u32 {
        self.root_depth
    }

    pub fn render_leaves(&self) -> &BTreeSet<TilePath> {
        &self.render_leaves
    }

    pub fn require_composites(&self) -> &BTreeSet<TilePath> {
        &self.require_composites
    }

    pub fn all_leaves(&self) -> &BTreeSet<TilePath> {
        &self.all_leaves
    }
}

fn root_depth_for(max_coord: i64) -> u32 {
    let mut depth = 1u32;
    while (1i64 << (depth - 1)) <= max_coord {
        depth += 1;
    }
    depth
}

pub fn tile_geometry(tile_width: u32, chunk_pixels: u32) -> TileGeometry {
    TileGeometry {
        tile_chunks: (tile_width / chunk_pixels).max(1),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn path_child_parent_round_trip() {
        let root = TilePath::root();
        let child = root.child(3);
        assert_eq!(child.parent().unwrap(), root);
        assert_eq!(child.level(), 1);
    }

    #[test]
    fn tile_pos_round_trips_through_path() {
        let depth = 4;
        for x in 0..8 {
            for y in 0..8 {
                let pos = TilePos { x, y };
                let path = TilePath::from_tile_pos(pos, depth);
                assert_eq!(path.to_tile_pos(depth), pos);
            }
        }
    }

    #[test]
    fn tile_pos_round_trips_negative_coordinates() {
        let depth = 5;
        for x in -10..10 {
            for y in -10..10 {
                let pos = TilePos { x, y };
                let path = TilePath::from_tile_pos(pos, depth);
                assert_eq!(path.to_tile_pos(depth), pos, "x={x} y={y}");
            }
        }
    }

    #[test]
    fn require_composites_closed_under_parent() {
        let mut set = TileSet::new(Variant::TopDown(TileGeometry { tile_chunks: 1 }));
        let chunks = vec![
            (CCoords((0, 0).into()), 100),
            (CCoords((0, 1).into()), 100),
            (CCoords((1, 0).into()), 100),
            (CCoords((1, 1).into()), 100),
        ];
        set.scan(chunks, 0);
        set.close();
        set.freeze();
        for path in set.require_composites() {
            assert!(path.is_root() || set.require_composites().contains(&path.parent().unwrap()));
        }
    }

    #[test]
    fn top_down_chunk_maps_to_one_tile() {
        let variant = Variant::TopDown(TileGeometry { tile_chunks: 2 });
        let tiles = variant.chunk_tiles(CCoords((3, 5).into()));
        assert_eq!(tiles, vec![TilePos { x: 1, y: 2 }]);
    }

    #[test]
    fn side_iso_chunk_maps_to_two_tiles() {
        let variant = Variant::SideIso(TileGeometry { tile_chunks: 1 });
        let tiles = variant.chunk_tiles(CCoords((0, 0).into()));
        assert_eq!(tiles.len(), 2);
    }
}
