//! Ordered, append-only collection of text-shader lines (C3).
//!
//! Distinct from [crate::blob_dict::BlobDictionary] only in element type and
//! in that indices are 16-bit: `DictionaryText.count` must not exceed 65535.
use indexmap::IndexMap;

use crate::error::PackageError;

pub const MAX_LINES: usize = 65535;

/// Ordered sequence of text-shader lines, addressed by 16-bit index, with an
/// `add_or_get` side table for O(1) dedup on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StringDictionary {
    lines: Vec<String>,
    index: IndexMap<String, u16>,
}

impl StringDictionary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a dictionary from an already-ordered list of lines, as read from
    /// a `DictionaryText` chunk payload.
    pub fn from_lines(lines: Vec<String>) -> Result<Self, PackageError> {
        if lines.len() > MAX_LINES {
            return Err(PackageError::TooManyLines);
        }
        let index = lines
            .iter()
            .enumerate()
            .map(|(i, s)| (s.clone(), i as u16))
            .collect();
        Ok(Self { lines, index })
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn get(&self, index: u16) -> Option<&str> {
        self.lines.get(index as usize).map(String::as_str)
    }

    /// Return the index of `line`, inserting it at the end if absent.
    pub fn add_or_get(&mut self, line: &str) -> Result<u16, PackageError> {
        if let Some(&index) = self.index.get(line) {
            return Ok(index);
        }
        if self.lines.len() >= MAX_LINES {
            return Err(PackageError::TooManyLines);
        }
        let index = self.lines.len() as u16;
        self.lines.push(line.to_string());
        self.index.insert(line.to_string(), index);
        Ok(index)
    }

    /// Encode as a `DictionaryText` chunk payload: `count: u32 LE`, then
    /// `count` null-terminated UTF-8 strings.
    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(self.lines.len() as u32).to_le_bytes());
        for line in &self.lines {
            out.extend_from_slice(line.as_bytes());
            out.push(0);
        }
        out
    }

    /// Decode a `DictionaryText` chunk payload.
    pub fn decode(payload: &[u8]) -> Result<Self, PackageError> {
        if payload.len() < 4 {
            return Err(PackageError::InternalEncodingError {
                reason: "DictionaryText payload shorter than its count field".into(),
            });
        }
        let count = u32::from_le_bytes(payload[0..4].try_into().unwrap()) as usize;

        let mut lines = Vec::with_capacity(count);
        let mut pos = 4;
        for _ in 0..count {
            let nul = payload[pos..]
                .iter()
                .position(|&b| b == 0)
                .ok_or_else(|| PackageError::InternalEncodingError {
                    reason: "DictionaryText string is not null-terminated".into(),
                })?;
            let s = std::str::from_utf8(&payload[pos..pos + nul])
                .map_err(|e| PackageError::InternalEncodingError {
                    reason: format!("DictionaryText string is not valid UTF-8: {e}"),
                })?
                .to_string();
            lines.push(s);
            pos += nul + 1;
        }

        Self::from_lines(lines)
    }
}
