//! Single-lump reads.
//!
//! The blocking and async readers share one contract: seek to the entry's
//! offset and read exactly `size` bytes, failing with
//! [`WadError::Truncated`] when the file is shorter than the entry claims.
//! The range is checked against the file length before any buffer is
//! allocated, so a corrupt directory cannot trigger a huge allocation.

use std::io::{Read, Seek, SeekFrom};

use crate::directory::Entry;
use crate::error::{Result, WadError};

/// Validate `entry` against a file of `file_len` bytes; returns (offset, size).
pub(crate) fn checked_range(entry: &Entry, file_len: u64) -> Result<(u64, usize)> {
    let truncated = || WadError::Truncated {
        offset:   entry.offset().max(0) as u64,
        expected: entry.size().max(0) as u64,
    };
    let end = entry.end().ok_or_else(truncated)?;
    if end > file_len {
        return Err(truncated());
    }
    Ok((entry.offset() as u64, entry.size() as usize))
}

pub fn read_lump<R: Read + Seek>(mut reader: R, entry: &Entry) -> Result<Vec<u8>> {
    let file_len = reader.seek(SeekFrom::End(0))?;
    read_lump_within(reader, entry, file_len)
}

/// [`read_lump`] for callers that already know the file length, so a run of
/// reads over one buffered handle does not seek to EOF each time.
pub fn read_lump_within<R: Read + Seek>(mut reader: R, entry: &Entry, file_len: u64) -> Result<Vec<u8>> {
    let (offset, size) = checked_range(entry, file_len)?;

    reader.seek(SeekFrom::Start(offset))?;
    let mut contents = vec![0u8; size];
    reader
        .read_exact(&mut contents)
        .map_err(|e| WadError::from_read(e, offset, size as u64))?;
    Ok(contents)
}

/// Async counterpart of [`read_lump`]. Opens its own handle on every call, so
/// concurrent reads against one file never share a cursor.
#[cfg(feature = "async")]
pub async fn read_lump_async(path: &std::path::Path, entry: &Entry) -> Result<Vec<u8>> {
    use tokio::io::{AsyncReadExt, AsyncSeekExt};

    let mut file = tokio::fs::File::open(path).await?;
    let file_len = file.metadata().await?.len();
    let (offset, size) = checked_range(entry, file_len)?;

    file.seek(SeekFrom::Start(offset)).await?;
    let mut contents = vec![0u8; size];
    file.read_exact(&mut contents)
        .await
        .map_err(|e| WadError::from_read(e, offset, size as u64))?;
    Ok(contents)
}
