//! Generic NBT tag-tree codec (spec.md §4.1).
//!
//! This is a hand-rolled decoder/encoder for the raw, untyped tag tree, used
//! by the inspection CLI's `--dump` contract and by the round-trip tests in
//! spec.md §8. The structured, serde-driven view used by the hot chunk-decode
//! path lives in `crate::world::nbt` and goes through `fastnbt`
//! instead — the two are grounded in different corners of the same format,
//! the way `fastnbt`/`fastanvil` split "generic `Value`" from "serde schema".

use std::io::{Cursor, Read};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};
use indexmap::IndexMap;

use crate::error::NbtError;

pub const TAG_END: u8 = 0;
pub const TAG_BYTE: u8 = 1;
pub const TAG_SHORT: u8 = 2;
pub const TAG_INT: u8 = 3;
pub const TAG_LONG: u8 = 4;
pub const TAG_FLOAT: u8 = 5;
pub const TAG_DOUBLE: u8 = 6;
pub const TAG_BYTE_ARRAY: u8 = 7;
pub const TAG_STRING: u8 = 8;
pub const TAG_LIST: u8 = 9;
pub const TAG_COMPOUND: u8 = 10;
pub const TAG_INT_ARRAY: u8 = 11;
pub const TAG_LONG_ARRAY: u8 = 12;

/// How a region or standalone NBT payload is compressed on disk.
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum Compression {
    Gzip,
    #[default]
    Zlib,
    None,
}

/// An ordered name → tag map. Insertion order is preserved (spec.md §4.1),
/// which `IndexMap` gives us for free without reimplementing an ordered map.
pub type Compound = IndexMap<String, Tag>;

/// The recursive NBT tag union (spec.md §3).
#[derive(Clone, Debug, PartialEq)]
pub enum Tag {
    Byte(i8),
    Short(i16),
    Int(i32),
    Long(i64),
    Float(f32),
    Double(f64),
    ByteArray(Vec<i8>),
    String(String),
    List(Vec<Tag>),
    Compound(Compound),
    IntArray(Vec<i32>),
    LongArray(Vec<i64>),
}

impl Tag {
    pub fn type_id(&self) -> u8 {
        match self {
            Tag::Byte(_) => TAG_BYTE,
            Tag::Short(_) => TAG_SHORT,
            Tag::Int(_) => TAG_INT,
            Tag::Long(_) => TAG_LONG,
            Tag::Float(_) => TAG_FLOAT,
            Tag::Double(_) => TAG_DOUBLE,
            Tag::ByteArray(_) => TAG_BYTE_ARRAY,
            Tag::String(_) => TAG_STRING,
            Tag::List(_) => TAG_LIST,
            Tag::Compound(_) => TAG_COMPOUND,
            Tag::IntArray(_) => TAG_INT_ARRAY,
            Tag::LongArray(_) => TAG_LONG_ARRAY,
        }
    }

    pub fn type_name(&self) -> &'static str {
        type_name_of(self.type_id())
    }

    pub fn as_compound(&self) -> Option<&Compound> {
        match self {
            Tag::Compound(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[Tag]> {
        match self {
            Tag::List(l) => Some(l),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Tag::String(s) => Some(s),
            _ => None,
        }
    }
}

fn type_name_of(id: u8) -> &'static str {
    match id {
        TAG_END => "end",
        TAG_BYTE => "byte",
        TAG_SHORT => "short",
        TAG_INT => "int",
        TAG_LONG => "long",
        TAG_FLOAT => "float",
        TAG_DOUBLE => "double",
        TAG_BYTE_ARRAY => "byte_array",
        TAG_STRING => "string",
        TAG_LIST => "list",
        TAG_COMPOUND => "compound",
        TAG_INT_ARRAY => "int_array",
        TAG_LONG_ARRAY => "long_array",
        _ => "unknown",
    }
}

/// Extraction trait backing `findTag<T>` (spec.md §4.1): types that a `Tag`
/// can be narrowed to, with a [`NbtError::TagTypeMismatch`] on a type clash.
pub trait FromTag: Sized {
    const TYPE_NAME: &'static str;
    fn from_tag(tag: &Tag) -> Option<Self>;
}

macro_rules! from_tag_numeric {
    ($t:ty, $variant:ident, $name:literal) => {
        impl FromTag for $t {
            const TYPE_NAME: &'static str = $name;
            fn from_tag(tag: &Tag) -> Option<Self> {
                match tag {
                    Tag::$variant(v) => Some(*v),
                    _ => None,
                }
            }
        }
    };
}

from_tag_numeric!(i8, Byte, "byte");
from_tag_numeric!(i16, Short, "short");
from_tag_numeric!(i32, Int, "int");
from_tag_numeric!(i64, Long, "long");
from_tag_numeric!(f32, Float, "float");
from_tag_numeric!(f64, Double, "double");

impl FromTag for String {
    const TYPE_NAME: &'static str = "string";
    fn from_tag(tag: &Tag) -> Option<Self> {
        match tag {
            Tag::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromTag for Vec<i8> {
    const TYPE_NAME: &'static str = "byte_array";
    fn from_tag(tag: &Tag) -> Option<Self> {
        match tag {
            Tag::ByteArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromTag for Vec<i32> {
    const TYPE_NAME: &'static str = "int_array";
    fn from_tag(tag: &Tag) -> Option<Self> {
        match tag {
            Tag::IntArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromTag for Vec<i64> {
    const TYPE_NAME: &'static str = "long_array";
    fn from_tag(tag: &Tag) -> Option<Self> {
        match tag {
            Tag::LongArray(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Extension methods implementing `findTag`/`hasTag` over a [`Compound`].
pub trait CompoundExt {
    fn has_tag(&self, name: &str) -> bool;
    fn find_tag<T: FromTag>(&self, name: &str) -> Result<Option<T>, NbtError>;
}

impl CompoundExt for Compound {
    fn has_tag(&self, name: &str) -> bool {
        self.contains_key(name)
    }

    fn find_tag<T: FromTag>(&self, name: &str) -> Result<Option<T>, NbtError> {
        match self.get(name) {
            None => Ok(None),
            Some(tag) => match T::from_tag(tag) {
                Some(v) => Ok(Some(v)),
                None => Err(NbtError::TagTypeMismatch {
                    name: name.to_string(),
                    expected: T::TYPE_NAME,
                    found: tag.type_name(),
                }),
            },
        }
    }
}

/// Decompress `raw` per `compression`, returning the uncompressed NBT bytes.
fn decompress(raw: &[u8], compression: Compression) -> Result<Vec<u8>, NbtError> {
    let mut out = Vec::new();
    match compression {
        Compression::None => out.extend_from_slice(raw),
        Compression::Gzip => {
            flate2::read::GzDecoder::new(raw)
                .read_to_end(&mut out)
                .map_err(NbtError::DecompressionFailed)?;
        }
        Compression::Zlib => {
            flate2::read::ZlibDecoder::new(raw)
                .read_to_end(&mut out)
                .map_err(NbtError::DecompressionFailed)?;
        }
    }
    Ok(out)
}

/// Decode a complete named-root NBT document, decompressing first if needed.
///
/// Returns the root compound only; the root's own name (almost always `""`
/// for chunk data) is discarded, matching every downstream consumer which
/// looks tags up by name within the root, never the root's own name.
pub fn decode(raw: &[u8], compression: Compression) -> Result<Compound, NbtError> {
    let data = decompress(raw, compression)?;
    let mut cursor = Cursor::new(data.as_slice());
    let type_id = read_u8(&mut cursor)?;
    if type_id == TAG_END {
        return Ok(Compound::new());
    }
    let _name = read_name(&mut cursor)?;
    let tag = read_payload(&mut cursor, type_id)?;
    match tag {
        Tag::Compound(c) => Ok(c),
        other => Err(NbtError::TagTypeMismatch {
            name: String::new(),
            expected: "compound",
            found: type_name_of(other.type_id()),
        }),
    }
}

fn read_u8(r: &mut impl Read) -> Result<u8, NbtError> {
    r.read_u8()
        .map_err(|_| NbtError::Truncated { needed: 1 })
}

fn read_name(r: &mut impl Read) -> Result<String, NbtError> {
    let len = r
        .read_u16::<BigEndian>()
        .map_err(|_| NbtError::Truncated { needed: 2 })? as usize;
    let mut buf = vec![0u8; len];
    r.read_exact(&mut buf)
        .map_err(|_| NbtError::Truncated { needed: len })?;
    String::from_utf8(buf).map_err(|_| NbtError::InvalidUtf8)
}

fn read_payload(r: &mut impl Read, type_id: u8) -> Result<Tag, NbtError> {
    Ok(match type_id {
        TAG_BYTE => Tag::Byte(r.read_i8().map_err(|_| NbtError::Truncated { needed: 1 })?),
        TAG_SHORT => Tag::Short(
            r.read_i16::<BigEndian>()
                .map_err(|_| NbtError::Truncated { needed: 2 })?,
        ),
        TAG_INT => Tag::Int(
            r.read_i32::<BigEndian>()
                .map_err(|_| NbtError::Truncated { needed: 4 })?,
        ),
        TAG_LONG => Tag::Long(
            r.read_i64::<BigEndian>()
                .map_err(|_| NbtError::Truncated { needed: 8 })?,
        ),
        TAG_FLOAT => Tag::Float(
            r.read_f32::<BigEndian>()
                .map_err(|_| NbtError::Truncated { needed: 4 })?,
        ),
        TAG_DOUBLE => Tag::Double(
            r.read_f64::<BigEndian>()
                .map_err(|_| NbtError::Truncated { needed: 8 })?,
        ),
        TAG_BYTE_ARRAY => {
            let len = read_array_len(r)?;
            let mut v = Vec::new();
            for _ in 0..len {
                v.push(r.read_i8().map_err(|_| NbtError::Truncated { needed: 1 })?);
            }
            Tag::ByteArray(v)
        }
        TAG_STRING => Tag::String(read_name(r)?),
        TAG_LIST => {
            let elem_type = read_u8(r)?;
            let len = read_array_len(r)?;
            if len > 0 && elem_type == TAG_END {
                return Err(NbtError::InvalidListElementType(elem_type));
            }
            let mut items = Vec::new();
            for _ in 0..len {
                items.push(read_payload(r, elem_type)?);
            }
            Tag::List(items)
        }
        TAG_COMPOUND => {
            let mut map = Compound::new();
            loop {
                let child_type = read_u8(r)?;
                if child_type == TAG_END {
                    break;
                }
                let name = read_name(r)?;
                let value = read_payload(r, child_type)?;
                map.insert(name, value);
            }
            Tag::Compound(map)
        }
        TAG_INT_ARRAY => {
            let len = read_array_len(r)?;
            let mut v = Vec::new();
            for _ in 0..len {
                v.push(
                    r.read_i32::<BigEndian>()
                        .map_err(|_| NbtError::Truncated { needed: 4 })?,
                );
            }
            Tag::IntArray(v)
        }
        TAG_LONG_ARRAY => {
            let len = read_array_len(r)?;
            let mut v = Vec::new();
            for _ in 0..len {
                v.push(
                    r.read_i64::<BigEndian>()
                        .map_err(|_| NbtError::Truncated { needed: 8 })?,
                );
            }
            Tag::LongArray(v)
        }
        other => return Err(NbtError::InvalidTagId(other)),
    })
}

fn read_array_len(r: &mut impl Read) -> Result<usize, NbtError> {
    let len = r
        .read_i32::<BigEndian>()
        .map_err(|_| NbtError::Truncated { needed: 4 })?;
    if len < 0 {
        return Err(NbtError::NegativeLength(len));
    }
    Ok(len as usize)
}

/// Encode a root compound back to uncompressed big-endian NBT bytes.
/// Used by the round-trip property tests (spec.md §8 #1); the name of the
/// root tag is always written as the empty string, matching what every
/// chunk payload in practice uses.
pub fn encode(root: &Compound) -> Vec<u8> {
    let mut out = Vec::new();
    out.write_u8(TAG_COMPOUND).unwrap();
    write_name(&mut out, "");
    write_compound(&mut out, root);
    out
}

fn write_name(w: &mut Vec<u8>, name: &str) {
    w.write_u16::<BigEndian>(name.len() as u16).unwrap();
    w.extend_from_slice(name.as_bytes());
}

fn write_compound(w: &mut Vec<u8>, c: &Compound) {
    for (name, tag) in c.iter() {
        w.write_u8(tag.type_id()).unwrap();
        write_name(w, name);
        write_payload(w, tag);
    }
    w.write_u8(TAG_END).unwrap();
}

fn write_payload(w: &mut Vec<u8>, tag: &Tag) {
    match tag {
        Tag::Byte(v) => w.write_i8(*v).unwrap(),
        Tag::Short(v) => w.write_i16::<BigEndian>(*v).unwrap(),
        Tag::Int(v) => w.write_i32::<BigEndian>(*v).unwrap(),
        Tag::Long(v) => w.write_i64::<BigEndian>(*v).unwrap(),
        Tag::Float(v) => w.write_f32::<BigEndian>(*v).unwrap(),
        Tag::Double(v) => w.write_f64::<BigEndian>(*v).unwrap(),
        Tag::ByteArray(v) => {
            w.write_i32::<BigEndian>(v.len() as i32).unwrap();
            for b in v {
                w.write_i8(*b).unwrap();
            }
        }
        Tag::String(s) => write_name(w, s),
        Tag::List(items) => {
            let elem_type = items.first().map(Tag::type_id).unwrap_or(TAG_END);
            w.write_u8(elem_type).unwrap();
            w.write_i32::<BigEndian>(items.len() as i32).unwrap();
            for item in items {
                write_payload(w, item);
            }
        }
        Tag::Compound(c) => write_compound(w, c),
        Tag::IntArray(v) => {
            w.write_i32::<BigEndian>(v.len() as i32).unwrap();
            for i in v {
                w.write_i32::<BigEndian>(*i).unwrap();
            }
        }
        Tag::LongArray(v) => {
            w.write_i32::<BigEndian>(v.len() as i32).unwrap();
            for i in v {
                w.write_i64::<BigEndian>(*i).unwrap();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Compound {
        let mut inner = Compound::new();
        inner.insert("a".to_string(), Tag::Byte(1));
        inner.insert("b".to_string(), Tag::String("hello".to_string()));

        let mut root = Compound::new();
        root.insert("first".to_string(), Tag::Int(42));
        root.insert(
            "list".to_string(),
            Tag::List(vec![Tag::Long(1), Tag::Long(2), Tag::Long(3)]),
        );
        root.insert("nested".to_string(), Tag::Compound(inner));
        root.insert("ints".to_string(), Tag::IntArray(vec![1, 2, 3]));
        root.insert("longs".to_string(), Tag::LongArray(vec![-1, -2]));
        root
    }

    #[test]
    fn round_trip_preserves_order_and_values() {
        let root = sample();
        let bytes = encode(&root);
        let decoded = decode(&bytes, Compression::None).unwrap();
        assert_eq!(decoded, root);
        // Order must survive, not just equality of the map contents.
        let keys: Vec<_> = decoded.keys().collect();
        assert_eq!(keys, vec!["first", "list", "nested", "ints", "longs"]);
    }

    #[test]
    fn find_tag_type_mismatch() {
        let root = sample();
        let err = root.find_tag::<i32>("list").unwrap_err();
        matches!(err, NbtError::TagTypeMismatch { .. });
    }

    #[test]
    fn has_tag_ignores_kind() {
        let root = sample();
        assert!(root.has_tag("first"));
        assert!(!root.has_tag("missing"));
    }

    #[test]
    fn malformed_tag_id_is_rejected() {
        let bytes = vec![0xFFu8, 0x00, 0x00];
        let err = decode(&bytes, Compression::None).unwrap_err();
        assert!(matches!(err, NbtError::InvalidTagId(0xFF)));
    }

    #[test]
    fn zlib_round_trip() {
        let root = sample();
        let raw = encode(&root);
        let mut enc = flate2::write::ZlibEncoder::new(Vec::new(), flate2::Compression::fast());
        std::io::Write::write_all(&mut enc, &raw).unwrap();
        let compressed = enc.finish().unwrap();
        let decoded = decode(&compressed, Compression::Zlib).unwrap();
        assert_eq!(decoded, root);
    }
}
