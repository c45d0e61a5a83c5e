//! Parse-in-place chunked container.
//!
//! A [ChunkContainer] is a flat, length-prefixed stream of chunks. Parsing
//! builds an index from tag to byte range without copying any payload.
use std::io::Cursor;

use binrw::BinReaderExt;
use indexmap::IndexMap;
use log::trace;

use crate::error::ContainerError;

/// A 64-bit identifier for a chunk kind.
///
/// Known tags are ASCII mnemonics packed little-endian into a `u64`,
/// the same trick `xc3_lib` uses for 4-byte magic values, just twice as wide.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ChunkTag(pub u64);

impl ChunkTag {
    pub const DICTIONARY_TEXT: ChunkTag = ChunkTag(u64::from_le_bytes(*b"DICT_TXT"));
    pub const DICTIONARY_SPIRV: ChunkTag = ChunkTag(u64::from_le_bytes(*b"DICT_SPV"));
    pub const MATERIAL_GLSL: ChunkTag = ChunkTag(u64::from_le_bytes(*b"MAT_GLSL"));
    pub const MATERIAL_METAL: ChunkTag = ChunkTag(u64::from_le_bytes(*b"MAT_MTL\0"));
    pub const MATERIAL_SPIRV: ChunkTag = ChunkTag(u64::from_le_bytes(*b"MAT_SPV\0"));
}

#[derive(Debug, Clone, Copy)]
struct ChunkRange {
    start: usize,
    end: usize,
}

/// A chunk header as it appears on the wire: `(tag: u64, size: u32)` followed
/// by `size` bytes of payload.
#[derive(Debug, Clone, Copy, binrw::BinRead, binrw::BinWrite)]
#[brw(little)]
pub struct ChunkHeader {
    pub tag: u64,
    pub size: u32,
}

/// A parsed view over a chunk stream. Holds no copies of payload bytes;
/// every accessor borrows from the buffer passed to [ChunkContainer::parse].
pub struct ChunkContainer<'a> {
    buffer: &'a [u8],
    /// Chunks in original stream order, for copy-through rewriting.
    order: Vec<(ChunkTag, ChunkRange)>,
    /// First occurrence of each tag, for random-access lookup.
    by_tag: IndexMap<ChunkTag, ChunkRange>,
}

impl<'a> ChunkContainer<'a> {
    pub fn parse(buffer: &'a [u8]) -> Result<Self, ContainerError> {
        let mut order = Vec::new();
        let mut by_tag = IndexMap::new();

        let mut cursor = Cursor::new(buffer);
        while (cursor.position() as usize) < buffer.len() {
            let remaining = buffer.len() - cursor.position() as usize;
            if remaining < 12 {
                return Err(ContainerError::TruncatedHeader { remaining });
            }

            let header: ChunkHeader = cursor
                .read_le()
                .map_err(|_| ContainerError::TruncatedHeader { remaining })?;
            let tag = ChunkTag(header.tag);

            let start = cursor.position() as usize;
            let end = start
                .checked_add(header.size as usize)
                .filter(|&end| end <= buffer.len())
                .ok_or(ContainerError::ChunkOverrunsBuffer {
                    tag,
                    size: header.size,
                    len: buffer.len(),
                })?;

            trace!("chunk {:#018x}: [{}, {})", tag.0, start, end);

            let range = ChunkRange { start, end };
            order.push((tag, range));
            by_tag.entry(tag).or_insert(range);

            cursor.set_position(end as u64);
        }

        Ok(Self {
            buffer,
            order,
            by_tag,
        })
    }

    pub fn has(&self, tag: ChunkTag) -> bool {
        self.by_tag.contains_key(&tag)
    }

    /// The payload bytes for the first chunk with `tag`, if present.
    pub fn payload(&self, tag: ChunkTag) -> Option<&'a [u8]> {
        self.by_tag
            .get(&tag)
            .map(|range| &self.buffer[range.start..range.end])
    }

    /// The start offset (into the original buffer) of the first chunk with `tag`.
    pub fn start(&self, tag: ChunkTag) -> Option<usize> {
        self.by_tag.get(&tag).map(|range| range.start)
    }

    /// The end offset (into the original buffer) of the first chunk with `tag`.
    pub fn end(&self, tag: ChunkTag) -> Option<usize> {
        self.by_tag.get(&tag).map(|range| range.end)
    }

    /// All chunks in original stream order, with their tags and payloads.
    pub fn chunks(&self) -> impl Iterator<Item = (ChunkTag, &'a [u8])> + '_ {
        self.order
            .iter()
            .map(move |(tag, range)| (*tag, &self.buffer[range.start..range.end]))
    }
}

/// Append `(tag, payload)` to `out` as a chunk header followed by the payload bytes.
pub fn write_chunk(out: &mut Vec<u8>, tag: ChunkTag, payload: &[u8]) {
    out.extend_from_slice(&tag.0.to_le_bytes());
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk_bytes(tag: ChunkTag, payload: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        write_chunk(&mut out, tag, payload);
        out
    }

    #[test]
    fn parse_empty_buffer() {
        let container = ChunkContainer::parse(&[]).unwrap();
        assert!(!container.has(ChunkTag::MATERIAL_GLSL));
    }

    #[test]
    fn parse_single_chunk() {
        let bytes = chunk_bytes(ChunkTag::MATERIAL_GLSL, &[1, 2, 3]);
        let container = ChunkContainer::parse(&bytes).unwrap();
        assert!(container.has(ChunkTag::MATERIAL_GLSL));
        assert_eq!(container.payload(ChunkTag::MATERIAL_GLSL), Some(&[1u8, 2, 3][..]));
        assert!(!container.has(ChunkTag::MATERIAL_SPIRV));
    }

    #[test]
    fn parse_preserves_order_for_unknown_tags() {
        let mut bytes = Vec::new();
        bytes.extend(chunk_bytes(ChunkTag(0xDEADBEEF01020304), &[0x01, 0x02, 0x03]));
        bytes.extend(chunk_bytes(ChunkTag::MATERIAL_GLSL, &[9, 9]));

        let container = ChunkContainer::parse(&bytes).unwrap();
        let tags: Vec<_> = container.chunks().map(|(t, _)| t).collect();
        assert_eq!(tags, vec![ChunkTag(0xDEADBEEF01020304), ChunkTag::MATERIAL_GLSL]);
    }

    #[test]
    fn parse_rejects_overrun() {
        let mut bytes = Vec::new();
        let header = ChunkHeader {
            tag: ChunkTag::MATERIAL_GLSL.0,
            size: 100,
        };
        let mut cursor = Cursor::new(Vec::new());
        binrw::BinWrite::write_le(&header, &mut cursor).unwrap();
        bytes.extend(cursor.into_inner());
        bytes.extend_from_slice(&[1, 2, 3]);

        let err = ChunkContainer::parse(&bytes).unwrap_err();
        assert!(matches!(err, ContainerError::ChunkOverrunsBuffer { .. }));
    }

    #[test]
    fn parse_rejects_truncated_header() {
        let err = ChunkContainer::parse(&[1, 2, 3]).unwrap_err();
        assert!(matches!(err, ContainerError::TruncatedHeader { .. }));
    }
}
