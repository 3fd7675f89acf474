//! Directory model and the 16-byte on-disk directory record.
//!
//! ```text
//! [0:4)  i32 offset   absolute byte offset of the lump data
//! [4:8)  i32 size     lump length in bytes
//! [8:16) name         ASCII, NUL-padded, not NUL-terminated at 8 chars
//! ```
//!
//! Positions are never stored: an [`Entry`]'s position is assigned by the
//! [`Directory`] that owns it and always equals its index.

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use serde::Serialize;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::error::{Result, WadError};

pub const DIRECTORY_RECORD_SIZE: usize = 16;
pub const NAME_LEN: usize = 8;

// ── Names ────────────────────────────────────────────────────────────────────

/// Clamp a requested lump name to the first 8 characters.
///
/// This is where over-long names are shortened; the encoder itself refuses
/// names that were not passed through here.
pub fn lump_name(name: &str) -> String {
    name.chars().take(NAME_LEN).collect()
}

/// Lump name for a file being imported: its stem, uppercased, first 8 chars.
pub fn lump_name_from_path(path: &Path) -> Option<String> {
    let stem = path.file_stem()?.to_string_lossy();
    Some(lump_name(&stem.to_uppercase()))
}

/// Pad `name` with NULs to exactly 8 bytes.
pub fn encode_name(name: &str) -> Result<[u8; NAME_LEN]> {
    if name.len() > NAME_LEN || !name.is_ascii() {
        return Err(WadError::InvalidName(name.to_owned()));
    }
    let mut raw = [0u8; NAME_LEN];
    raw[..name.len()].copy_from_slice(name.as_bytes());
    Ok(raw)
}

/// ASCII-decode a raw name and drop trailing NULs. Bytes above 0x7F become `?`.
pub fn decode_name(raw: &[u8; NAME_LEN]) -> String {
    let end = raw.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
    raw[..end]
        .iter()
        .map(|&b| if b.is_ascii() { b as char } else { '?' })
        .collect()
}

/// `name` as a single file name, for writing a lump out to disk.
///
/// Lump names come from the file being read, so anything that would leave the
/// target directory (separators, `.`/`..`, drive prefixes) or that no
/// filesystem accepts (empty, NUL) is refused with [`WadError::InvalidName`].
pub fn extract_file_name(name: &str) -> Result<&str> {
    let unsafe_char = |c: char| matches!(c, '/' | '\\' | ':' | '\0');
    if name.is_empty() || name == "." || name == ".." || name.contains(unsafe_char) {
        return Err(WadError::InvalidName(name.to_owned()));
    }
    Ok(name)
}

// ── Entry ────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Entry {
    name:     String,
    offset:   i32,
    size:     i32,
    position: usize,
}

impl Entry {
    pub fn name(&self) -> &str { &self.name }

    pub fn offset(&self) -> i32 { self.offset }

    pub fn size(&self) -> i32 { self.size }

    pub fn position(&self) -> usize { self.position }

    /// One past the last byte of the lump, or `None` if the record is nonsensical.
    pub fn end(&self) -> Option<u64> {
        if self.offset < 0 || self.size < 0 {
            return None;
        }
        Some(self.offset as u64 + self.size as u64)
    }
}

/// Read the record at `index` of a directory starting at `directory_offset`.
pub fn read_record<R: Read + Seek>(
    mut reader: R,
    directory_offset: u64,
    index: usize,
) -> Result<(i32, i32, String)> {
    let at = directory_offset + (index * DIRECTORY_RECORD_SIZE) as u64;
    reader.seek(SeekFrom::Start(at))?;
    let short = |e| WadError::from_read(e, at, DIRECTORY_RECORD_SIZE as u64);
    let offset = reader.read_i32::<LittleEndian>().map_err(short)?;
    let size = reader.read_i32::<LittleEndian>().map_err(short)?;
    let mut raw = [0u8; NAME_LEN];
    reader.read_exact(&mut raw).map_err(short)?;
    Ok((offset, size, decode_name(&raw)))
}

pub fn write_record<W: Write>(mut writer: W, offset: i32, size: i32, name: &str) -> Result<()> {
    let raw = encode_name(name)?;
    writer.write_i32::<LittleEndian>(offset)?;
    writer.write_i32::<LittleEndian>(size)?;
    writer.write_all(&raw)?;
    Ok(())
}

// ── Directory ────────────────────────────────────────────────────────────────

/// Ordered lump directory. Keeps `entries[i].position() == i`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Directory {
    entries: Vec<Entry>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: String, offset: i32, size: i32) -> &Entry {
        let position = self.entries.len();
        self.entries.push(Entry { name, offset, size, position });
        &self.entries[position]
    }

    pub fn entries(&self) -> &[Entry] { &self.entries }

    pub fn len(&self) -> usize { self.entries.len() }

    pub fn is_empty(&self) -> bool { self.entries.is_empty() }

    pub fn get(&self, position: usize) -> Option<&Entry> {
        self.entries.get(position)
    }

    /// First entry in directory order whose name matches exactly.
    pub fn find(&self, name: &str) -> Option<&Entry> {
        self.entries.iter().find(|e| e.name == name)
    }

    pub fn total_size(&self) -> i64 {
        self.entries.iter().map(|e| e.size as i64).sum()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Entry> {
        self.entries.iter()
    }
}

impl<'a> IntoIterator for &'a Directory {
    type Item = &'a Entry;
    type IntoIter = std::slice::Iter<'a, Entry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
