//! Encode/decode a `MaterialGlsl`/`MaterialMetal` chunk of shader text
//! records, each compressed as a sequence of line indices into a
//! [StringDictionary] (C4).
use crate::error::PackageError;
use crate::package::ShaderKey;
use crate::string_dict::StringDictionary;

/// A single record as the caller sees it: a key and its full source text.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "arbitrary", derive(arbitrary::Arbitrary))]
pub struct TextShaderRecord {
    pub key: ShaderKey,
    pub text: String,
}

/// A single record as stored on disk: a key and the line indices that
/// reconstruct its text against a [StringDictionary].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TextShaderEntry {
    pub key: ShaderKey,
    pub line_indices: Vec<u16>,
    /// `sum(len(dictionary[i]) + 1 for i in line_indices)`, descriptive only:
    /// decode reconstructs text purely from `line_indices` (§9 Decision).
    pub string_length: u32,
}

/// A decoded (or about-to-be-encoded) `MaterialGlsl`/`MaterialMetal` chunk.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TextShaderChunk {
    pub records: Vec<TextShaderEntry>,
}

impl TextShaderChunk {
    /// Start building a chunk from logical `(key, text)` records. Call
    /// [TextShaderBuilder::encode_with_dictionary] to split each record's
    /// text into dictionary lines and produce the chunk payload.
    pub fn from_records(records: Vec<TextShaderRecord>) -> TextShaderBuilder {
        TextShaderBuilder { records }
    }

    /// Reconstruct the text for `entry` by concatenating
    /// `dictionary[line_indices[i]] + "\n"` in index order.
    pub fn text(&self, dict: &StringDictionary, entry: &TextShaderEntry) -> Result<String, PackageError> {
        let mut text = String::new();
        for &index in &entry.line_indices {
            let line = dict
                .get(index)
                .ok_or(PackageError::LineIndexOutOfRange {
                    index,
                    size: dict.len(),
                })?;
            text.push_str(line);
            text.push('\n');
        }
        Ok(text)
    }

    /// Decode every record's text against `dict`, for the re-indexing step
    /// of the rewrite algorithm (§4.4 encode step 1).
    pub fn decode_all_text(&self, dict: &StringDictionary) -> Result<Vec<TextShaderRecord>, PackageError> {
        self.records
            .iter()
            .map(|entry| {
                Ok(TextShaderRecord {
                    key: entry.key,
                    text: self.text(dict, entry)?,
                })
            })
            .collect()
    }

    /// Decode a `MaterialGlsl`/`MaterialMetal` chunk payload into raw
    /// `(key, line_indices)` entries, without resolving text.
    pub fn decode(payload: &[u8]) -> Result<Self, PackageError> {
        let internal = |reason: String| PackageError::InternalEncodingError { reason };

        if payload.len() < 8 {
            return Err(internal("material chunk shorter than its record_count header".into()));
        }
        let record_count = u64::from_le_bytes(payload[0..8].try_into().unwrap()) as usize;

        let fixed_start = 8;
        let fixed_entry_size = 7; // model:u8, variant:u8, stage:u8, offset:u32
        let fixed_end = fixed_start
            .checked_add(record_count * fixed_entry_size)
            .filter(|&end| end <= payload.len())
            .ok_or_else(|| internal("material chunk fixed-entry region runs past payload end".into()))?;

        let mut records = Vec::with_capacity(record_count);
        for i in 0..record_count {
            let entry = &payload[fixed_start + i * fixed_entry_size..fixed_start + i * fixed_entry_size + fixed_entry_size];
            let key = ShaderKey::new(entry[0], entry[1], entry[2]);
            let offset = u32::from_le_bytes(entry[3..7].try_into().unwrap()) as usize;

            if offset + 8 > payload.len() {
                return Err(internal(format!("record {i} tail offset runs past payload end")));
            }
            let string_length = u32::from_le_bytes(payload[offset..offset + 4].try_into().unwrap());
            let line_count = u32::from_le_bytes(payload[offset + 4..offset + 8].try_into().unwrap()) as usize;

            let indices_start = offset + 8;
            let indices_end = indices_start
                .checked_add(line_count * 2)
                .filter(|&end| end <= payload.len())
                .ok_or_else(|| internal(format!("record {i} line indices run past payload end")))?;

            let line_indices = payload[indices_start..indices_end]
                .chunks_exact(2)
                .map(|b| u16::from_le_bytes([b[0], b[1]]))
                .collect();

            records.push(TextShaderEntry {
                key,
                line_indices,
                string_length,
            });
        }

        if fixed_end > payload.len() {
            return Err(internal("material chunk fixed-entry region runs past payload end".into()));
        }

        Ok(Self { records })
    }

    /// Encode raw entries (already indexed against a dictionary) into a
    /// `MaterialGlsl`/`MaterialMetal` chunk payload (§4.4 encode steps 5-6).
    pub fn encode(&self) -> Result<Vec<u8>, PackageError> {
        let fixed_entry_size = 7;
        let fixed_region_len = self.records.len() * fixed_entry_size;
        let header_len = 8;

        let mut tails = Vec::with_capacity(self.records.len());
        let mut cursor = header_len + fixed_region_len;
        for entry in &self.records {
            tails.push(cursor);
            cursor += 8 + entry.line_indices.len() * 2;
        }

        let mut out = Vec::with_capacity(cursor);
        out.extend_from_slice(&(self.records.len() as u64).to_le_bytes());

        for (entry, &tail_offset) in self.records.iter().zip(&tails) {
            out.push(entry.key.model);
            out.push(entry.key.variant);
            out.push(entry.key.stage);
            out.extend_from_slice(&(tail_offset as u32).to_le_bytes());
        }

        for entry in &self.records {
            out.extend_from_slice(&entry.string_length.to_le_bytes());
            out.extend_from_slice(&(entry.line_indices.len() as u32).to_le_bytes());
            for &index in &entry.line_indices {
                out.extend_from_slice(&index.to_le_bytes());
            }
        }

        if out.len() != cursor {
            return Err(PackageError::InternalEncodingError {
                reason: format!("computed chunk length {cursor} does not match written length {}", out.len()),
            });
        }

        Ok(out)
    }
}

/// Builds a [TextShaderChunk] from logical `(key, text)` records by indexing
/// every line against a shared [StringDictionary].
pub struct TextShaderBuilder {
    records: Vec<TextShaderRecord>,
}

impl TextShaderBuilder {
    /// Split each record's text on `'\n'` (ignoring a trailing newline),
    /// look up or insert each line into `dict`, and encode the resulting
    /// chunk payload (§4.4 encode steps 3-6).
    pub fn encode_with_dictionary(self, dict: &mut StringDictionary) -> Result<Vec<u8>, PackageError> {
        let mut entries = Vec::with_capacity(self.records.len());
        for record in &self.records {
            let mut text = record.text.as_str();
            if let Some(stripped) = text.strip_suffix('\n') {
                text = stripped;
            }
            let lines: Vec<&str> = if text.is_empty() {
                Vec::new()
            } else {
                text.split('\n').collect()
            };

            let mut line_indices = Vec::with_capacity(lines.len());
            let mut string_length = 0u32;
            for line in lines {
                string_length += line.len() as u32 + 1;
                line_indices.push(dict.add_or_get(line)?);
            }

            entries.push(TextShaderEntry {
                key: record.key,
                line_indices,
                string_length,
            });
        }

        TextShaderChunk { records: entries }.encode()
    }
}
