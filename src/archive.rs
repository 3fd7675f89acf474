//! High-level [`Wad`] API — the primary embedding surface.
//!
//! ```no_run
//! use wadutil::{Wad, WadKind};
//!
//! Wad::create_empty("maps.wad", WadKind::Pwad)?;
//! let mut wad = Wad::open("maps.wad")?;
//! wad.append("DEMO1", b"demo bytes")?;
//!
//! let entry = wad.find("DEMO1")?.clone();
//! assert_eq!(wad.read_lump(&entry)?, b"demo bytes");
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Rebuilds
//! Every structural edit rewrites the whole file: all current lumps are read
//! into memory, the new container is encoded into a temporary file next to
//! the original, and the temporary file is renamed over the original once it
//! is complete. A failed rebuild leaves the original untouched.

use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::directory::{self, Directory, Entry};
use crate::error::{Result, WadError};
use crate::header::WadKind;
use crate::io_stream::{self, WadReader, WadWriter};
use crate::lump;

// ── RebuildOptions ───────────────────────────────────────────────────────────

/// Configuration for [`Wad::append_with`] and [`Wad::remove_with`].
#[derive(Debug, Clone)]
pub struct RebuildOptions {
    /// fsync the rebuilt file before it replaces the original.
    pub sync: bool,
}

impl Default for RebuildOptions {
    fn default() -> Self {
        Self { sync: true }
    }
}

// ── Wad ──────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct Wad {
    path:      PathBuf,
    kind:      WadKind,
    directory: Directory,
}

impl Wad {
    // ── Constructors ─────────────────────────────────────────────────────────

    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref().to_owned();
        let file = File::open(&path)?;
        let file_len = file.metadata()?.len();
        let reader = WadReader::new(BufReader::new(file))?;

        for entry in &reader.directory {
            if entry.end().map_or(true, |end| end > file_len) {
                warn!(
                    name = entry.name(),
                    position = entry.position(),
                    offset = entry.offset(),
                    size = entry.size(),
                    "lump lies outside of the file"
                );
            }
        }
        debug!(path = %path.display(), kind = %reader.kind(), lumps = reader.directory.len(), "opened wad");

        Ok(Self {
            path,
            kind: reader.kind(),
            directory: reader.directory,
        })
    }

    /// Write a zero-lump container at `path`, replacing anything already there.
    pub fn create_empty<P: AsRef<Path>>(path: P, kind: WadKind) -> Result<()> {
        let path = path.as_ref();
        replace_atomic(path, &RebuildOptions::default(), |out| {
            WadWriter::new(out, kind)?.finish()?;
            Ok(())
        })?;
        info!(path = %path.display(), %kind, "created empty wad");
        Ok(())
    }

    // ── Metadata ─────────────────────────────────────────────────────────────

    pub fn path(&self) -> &Path { &self.path }

    pub fn kind(&self) -> WadKind { self.kind }

    pub fn directory(&self) -> &Directory { &self.directory }

    pub fn entries(&self) -> &[Entry] { self.directory.entries() }

    pub fn len(&self) -> usize { self.directory.len() }

    pub fn is_empty(&self) -> bool { self.directory.is_empty() }

    /// Sum of every lump's declared size.
    pub fn total_size(&self) -> i64 { self.directory.total_size() }

    pub fn entry(&self, position: usize) -> Result<&Entry> {
        self.directory.get(position).ok_or(WadError::OutOfRange {
            position: i64::try_from(position).unwrap_or(i64::MAX),
            len:      self.directory.len(),
        })
    }

    pub fn find(&self, name: &str) -> Result<&Entry> {
        self.directory
            .find(name)
            .ok_or_else(|| WadError::NotFound(name.to_owned()))
    }

    // ── Read ─────────────────────────────────────────────────────────────────

    pub fn read_lump(&self, entry: &Entry) -> Result<Vec<u8>> {
        let file = File::open(&self.path)?;
        lump::read_lump(file, entry)
    }

    #[cfg(feature = "async")]
    pub async fn read_lump_async(&self, entry: &Entry) -> Result<Vec<u8>> {
        lump::read_lump_async(&self.path, entry).await
    }

    /// Every lump's bytes, in directory order.
    ///
    /// This materialises the whole container in memory; rebuilds rely on it
    /// because the source file is overwritten afterwards.
    pub fn read_all(&self) -> Result<Vec<(String, Vec<u8>)>> {
        let file = File::open(&self.path)?;
        let file_len = file.metadata()?.len();
        let mut reader = BufReader::new(file);
        self.directory
            .iter()
            .map(|e| Ok((e.name().to_owned(), lump::read_lump_within(&mut reader, e, file_len)?)))
            .collect()
    }

    // ── Rebuild ──────────────────────────────────────────────────────────────

    /// Add a lump after all existing ones. Names longer than 8 characters
    /// keep their first 8.
    pub fn append(&mut self, name: &str, data: &[u8]) -> Result<()> {
        self.append_with(name, data, &RebuildOptions::default())
    }

    pub fn append_with(&mut self, name: &str, data: &[u8], opts: &RebuildOptions) -> Result<()> {
        let mut lumps = self.read_all()?;
        let name = directory::lump_name(name);
        info!(path = %self.path.display(), name = %name, bytes = data.len(), "appending lump");
        lumps.push((name, data.to_vec()));
        self.rebuild(lumps, opts)
    }

    /// Drop the lump at `position`; later lumps move up by one.
    pub fn remove(&mut self, position: usize) -> Result<()> {
        self.remove_with(position, &RebuildOptions::default())
    }

    pub fn remove_with(&mut self, position: usize, opts: &RebuildOptions) -> Result<()> {
        let removed = self.entry(position)?.name().to_owned();
        let mut lumps = self.read_all()?;
        lumps.remove(position);
        info!(path = %self.path.display(), name = %removed, position, "removing lump");
        self.rebuild(lumps, opts)
    }

    fn rebuild(&mut self, lumps: Vec<(String, Vec<u8>)>, opts: &RebuildOptions) -> Result<()> {
        let kind = self.kind;
        let directory = replace_atomic(&self.path, opts, |out| {
            let (_, directory) = io_stream::encode(out, kind, lumps)?;
            Ok(directory)
        })?;
        debug!(path = %self.path.display(), lumps = directory.len(), "rebuilt wad");
        self.directory = directory;
        Ok(())
    }
}

/// Run `write` against a temporary file beside `path`, then rename it over
/// `path`. The temporary file is deleted if `write` or the rename fails.
fn replace_atomic<T, F>(path: &Path, opts: &RebuildOptions, write: F) -> Result<T>
where
    F: FnOnce(&mut BufWriter<&mut File>) -> Result<T>,
{
    let dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;

    let out = {
        let mut w = BufWriter::new(tmp.as_file_mut());
        let out = write(&mut w)?;
        w.flush()?;
        out
    };

    if let Ok(meta) = fs::metadata(path) {
        tmp.as_file().set_permissions(meta.permissions())?;
    }
    if opts.sync {
        tmp.as_file().sync_all()?;
    }
    tmp.persist(path).map_err(|e| WadError::Io(e.error))?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_create_empty_bytes() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("empty.wad");
        Wad::create_empty(&path, WadKind::Iwad).unwrap();
        assert_eq!(fs::read(&path).unwrap(), b"IWAD\0\0\0\0\x0c\0\0\0");

        let wad = Wad::open(&path).unwrap();
        assert_eq!(wad.kind(), WadKind::Iwad);
        assert!(wad.is_empty());
    }

    #[test]
    fn test_create_empty_overwrites() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("x.wad");
        fs::write(&path, b"garbage that is longer than a header").unwrap();
        Wad::create_empty(&path, WadKind::Pwad).unwrap();
        assert_eq!(fs::read(&path).unwrap().len(), 12);
    }

    #[test]
    fn test_rebuild_leaves_no_temp_files() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("t.wad");
        Wad::create_empty(&path, WadKind::Pwad).unwrap();
        let mut wad = Wad::open(&path).unwrap();
        wad.append("A", b"1").unwrap();
        wad.remove(0).unwrap();
        let names: Vec<_> = fs::read_dir(dir.path()).unwrap().map(|e| e.unwrap().file_name()).collect();
        assert_eq!(names, vec![std::ffi::OsString::from("t.wad")]);
    }

    #[test]
    fn test_failed_rebuild_keeps_original() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("keep.wad");
        Wad::create_empty(&path, WadKind::Pwad).unwrap();
        let mut wad = Wad::open(&path).unwrap();
        wad.append("OK", b"payload").unwrap();
        let before = fs::read(&path).unwrap();

        // Non-ASCII names are refused by the encoder after the temp file is opened.
        let err = wad.append("NÖPE", b"x").unwrap_err();
        assert!(matches!(err, WadError::InvalidName(_)));
        assert_eq!(fs::read(&path).unwrap(), before);
        assert_eq!(wad.len(), 1);
        assert_eq!(fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_entry_out_of_range() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("r.wad");
        Wad::create_empty(&path, WadKind::Pwad).unwrap();
        let wad = Wad::open(&path).unwrap();
        assert!(matches!(wad.entry(0), Err(WadError::OutOfRange { position: 0, len: 0 })));
        assert!(matches!(wad.find("NOPE"), Err(WadError::NotFound(_))));
    }
}
