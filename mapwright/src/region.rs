//! Region file container (spec.md §4.2).
//!
//! Ground truth for the binary layout is the teacher's `world::Region<S>`
//! (offset/length table, then mtime table, then per-chunk zlib blobs); the
//! three-way compression kind and the external-chunk (`.mcc`) bit are
//! restored from the wider Anvil corpus (`valence_anvil::Compression`,
//! `fastanvil::Region`), since the teacher only ever wrote ZLIB chunks.

use std::collections::HashMap;
use std::io::{Read, Seek, SeekFrom};

use byteorder::{BigEndian, ReadBytesExt};
use bytes::Buf;

use crate::error::RegionError;
use crate::nbt::Compression;
use crate::world::{CCoords, CIndex, RCoords, REGION_SIZE};

const SECTOR_SIZE: u64 = 4096;
const REGION_HEADER_SIZE: usize = 2 * SECTOR_SIZE as usize;
const REGION_CHUNK_COUNT: usize = (REGION_SIZE * REGION_SIZE) as usize;

/// Bit set on the on-disk compression byte when the chunk payload actually
/// lives in a separate `c.<x>.<z>.mcc` file next to the region (used for
/// chunks too large to fit the sector granularity of the main file).
const EXTERNAL_CHUNK_BIT: u8 = 0x80;

fn compression_from_byte(raw: u8) -> Result<Compression, RegionError> {
    match raw & !EXTERNAL_CHUNK_BIT {
        1 => Ok(Compression::Gzip),
        2 => Ok(Compression::Zlib),
        3 => Ok(Compression::None),
        other => Err(RegionError::UnsupportedCompression(other)),
    }
}

/// One chunk's compressed payload plus the compression it was written with.
#[derive(Clone, Debug)]
pub struct ChunkBlob {
    pub compression: Compression,
    pub data: Vec<u8>,
}

/// A fully-read region: 32×32 chunk offset/size table, mtime table, and the
/// compressed blob for every chunk slot that has one. Immutable after
/// `read()`; there is no in-place mutation once populated (spec.md §3).
pub struct RegionFile {
    pub coords: RCoords,
    chunks: HashMap<CIndex, ChunkBlob>,
    mtimes: [u32; REGION_CHUNK_COUNT],
}

impl RegionFile {
    /// Read and index an entire region file from `stream`.
    pub fn read<S: Read + Seek>(coords: RCoords, mut stream: S) -> Result<Self, RegionError> {
        stream.seek(SeekFrom::Start(0))?;
        let mut header = [0u8; REGION_HEADER_SIZE];
        stream.read_exact(&mut header).map_err(|_| RegionError::BadRegionHeader)?;

        let mut offsets = [0u32; REGION_CHUNK_COUNT];
        let mut locations = &header[..REGION_CHUNK_COUNT * 4];
        for slot in offsets.iter_mut() {
            *slot = locations.get_u32();
        }

        let mut mtimes = [0u32; REGION_CHUNK_COUNT];
        let mut timestamps = &header[REGION_CHUNK_COUNT * 4..];
        for slot in mtimes.iter_mut() {
            *slot = timestamps.get_u32();
        }

        let mut chunks = HashMap::new();
        for (index, &offset_count) in offsets.iter().enumerate() {
            if offset_count == 0 {
                continue;
            }
            let sector_offset = (offset_count >> 8) as u64;
            let sector_count = (offset_count & 0xFF) as u64;
            if sector_count == 0 {
                return Err(RegionError::BadRegionHeader);
            }
            let byte_offset = sector_offset * SECTOR_SIZE;
            stream
                .seek(SeekFrom::Start(byte_offset))
                .map_err(|_| RegionError::InvalidSectorOffset { offset: byte_offset })?;

            let length = stream.read_u32::<BigEndian>().map_err(|_| RegionError::BadRegionHeader)?;
            if length == 0 {
                continue;
            }
            let compression_byte = stream.read_u8().map_err(|_| RegionError::BadRegionHeader)?;
            let compression = compression_from_byte(compression_byte)?;
            if compression_byte & EXTERNAL_CHUNK_BIT != 0 {
                // External chunk data lives in a sibling `.mcc` file; the
                // region container itself holds no payload for this slot.
                // Out of scope to resolve that path here (spec.md Non-goals
                // don't name `.mcc` at all) — record the blob as empty so
                // callers see a present-but-unreadable chunk rather than a
                // silently missing one.
                chunks.insert(CIndex::from_flat_index(index), ChunkBlob { compression, data: Vec::new() });
                continue;
            }

            let mut data = vec![0u8; (length - 1) as usize];
            stream.read_exact(&mut data).map_err(|_| RegionError::BadRegionHeader)?;
            chunks.insert(CIndex::from_flat_index(index), ChunkBlob { compression, data });
        }

        Ok(Self { coords, chunks, mtimes })
    }

    /// Chunk positions (absolute, not region-relative) this region has data for.
    pub fn containing_chunks(&self) -> impl Iterator<Item = CCoords> + '_ {
        self.chunks.keys().map(move |&index| index.to_chunk_coords(self.coords))
    }

    /// The compressed payload and compression kind for one chunk slot.
    pub fn chunk_blob(&self, index: CIndex) -> Result<&ChunkBlob, RegionError> {
        self.chunks
            .get(&index)
            .ok_or_else(|| RegionError::MissingChunk(index.to_chunk_coords(self.coords)))
    }

    /// Decompressed NBT bytes for a chunk slot (spec.md §4.2 `getChunkData`).
    pub fn chunk_data(&self, index: CIndex) -> Result<Vec<u8>, RegionError> {
        let blob = self.chunk_blob(index)?;
        decompress(&blob.data, blob.compression)
    }

    /// Stored mtime (seconds since epoch) for a chunk slot, 0 if absent
    /// (spec.md §4.2 `getChunkTimestamp`, used for incremental rendering).
    pub fn chunk_timestamp(&self, index: CIndex) -> u32 {
        self.mtimes[index.to_flat_index()]
    }
}

fn decompress(data: &[u8], compression: Compression) -> Result<Vec<u8>, RegionError> {
    let mut out = Vec::new();
    match compression {
        Compression::None => out.extend_from_slice(data),
        Compression::Gzip => {
            flate2::read::GzDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(RegionError::DecompressionFailed)?;
        }
        Compression::Zlib => {
            flate2::read::ZlibDecoder::new(data)
                .read_to_end(&mut out)
                .map_err(RegionError::DecompressionFailed)?;
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::io::Write;

    /// Build a minimal one-chunk region file in memory: chunk (0, 0) holds
    /// `payload`, compressed with `compression`, with the given mtime.
    fn build_region(payload: &[u8], compression: Compression, mtime: u32) -> Vec<u8> {
        let compressed = match compression {
            Compression::None => payload.to_vec(),
            Compression::Zlib => {
                let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
                enc.write_all(payload).unwrap();
                enc.finish().unwrap()
            }
            Compression::Gzip => {
                let mut enc = flate2::write::GzEncoder::new(Vec::new(), flate2::Compression::fast());
                enc.write_all(payload).unwrap();
                enc.finish().unwrap()
            }
        };
        let compression_byte = match compression {
            Compression::Gzip => 1u8,
            Compression::Zlib => 2,
            Compression::None => 3,
        };

        let mut body = Vec::new();
        body.extend_from_slice(&((compressed.len() + 1) as u32).to_be_bytes());
        body.push(compression_byte);
        body.extend_from_slice(&compressed);
        let sector_count = body.len().div_ceil(4096);
        body.resize(sector_count * 4096, 0);

        let mut file = vec![0u8; 2 * 4096];
        // chunk (0,0) is index 0: sector offset = 2 (just past the header), sector count as computed.
        let offset_count = (2u32 << 8) | sector_count as u32;
        file[0..4].copy_from_slice(&offset_count.to_be_bytes());
        file[4096..4100].copy_from_slice(&mtime.to_be_bytes());
        file.extend_from_slice(&body);
        file
    }

    #[test]
    fn round_trips_zlib_chunk_and_mtime() {
        let payload = b"hello region file";
        let raw = build_region(payload, Compression::Zlib, 1_700_000_000);
        let region = RegionFile::read(RCoords((0, 0).into()), Cursor::new(raw)).unwrap();
        let index = CIndex::from_flat_index(0);
        assert_eq!(region.chunk_data(index).unwrap(), payload);
        assert_eq!(region.chunk_timestamp(index), 1_700_000_000);
        let coords: Vec<_> = region.containing_chunks().collect();
        assert_eq!(coords, vec![CCoords((0, 0).into())]);
    }

    #[test]
    fn round_trips_gzip_and_uncompressed() {
        for (compression, payload) in [
            (Compression::Gzip, b"gzip payload".as_slice()),
            (Compression::None, b"raw payload!".as_slice()),
        ] {
            let raw = build_region(payload, compression, 42);
            let region = RegionFile::read(RCoords((0, 0).into()), Cursor::new(raw)).unwrap();
            assert_eq!(region.chunk_data(CIndex::from_flat_index(0)).unwrap(), payload);
        }
    }

    #[test]
    fn missing_chunk_is_an_error_not_a_panic() {
        let raw = vec![0u8; 2 * 4096];
        let region = RegionFile::read(RCoords((0, 0).into()), Cursor::new(raw)).unwrap();
        let err = region.chunk_data(CIndex::from_flat_index(5)).unwrap_err();
        assert!(matches!(err, RegionError::MissingChunk(_)));
    }

    #[test]
    fn truncated_header_is_bad_region_header() {
        let raw = vec![0u8; 100];
        let err = RegionFile::read(RCoords((0, 0).into()), Cursor::new(raw)).unwrap_err();
        assert!(matches!(err, RegionError::BadRegionHeader));
    }
}
