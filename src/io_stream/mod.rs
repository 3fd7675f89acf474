//! Streaming WAD engine — writer and reader.
//!
//! # Writer
//! [`WadWriter`] reserves the 12-byte header, then accepts lumps one at a
//! time and writes their bytes back to back, recording each start offset.
//! [`WadWriter::finish`] appends the directory after the last lump and
//! patches the header at offset 0 with the final count and directory offset.
//! Offsets are always computed from the stream position, never supplied.
//!
//! # Reader
//! [`WadReader`] parses the header and then seeks to each directory record
//! individually (`directory_offset + i * 16`). It makes no assumption that
//! the directory is contiguous with anything else in the file, and it does
//! not validate lump ranges: a lump that points past EOF only fails when it
//! is read.

use std::io::{self, Read, Seek, SeekFrom, Write};

use crate::directory::{self, Directory, Entry};
use crate::error::{Result, WadError};
use crate::header::{Header, WadKind, HEADER_SIZE};
use crate::lump;

// ── Writer ───────────────────────────────────────────────────────────────────

pub struct WadWriter<W: Write + Seek> {
    writer:        W,
    pub kind:      WadKind,
    pub directory: Directory,
}

impl<W: Write + Seek> WadWriter<W> {
    pub fn new(mut writer: W, kind: WadKind) -> Result<Self> {
        writer.seek(SeekFrom::Start(0))?;
        writer.write_all(&[0u8; HEADER_SIZE])?; // reserved; overwritten on finish
        Ok(Self {
            writer,
            kind,
            directory: Directory::new(),
        })
    }

    /// Append one lump's bytes. `name` must already be at most 8 ASCII chars;
    /// use [`directory::lump_name`] to shorten user input first.
    pub fn add_lump(&mut self, name: &str, data: &[u8]) -> Result<&Entry> {
        directory::encode_name(name)?;
        let offset = self.writer.stream_position()?;
        let end = offset + data.len() as u64;
        if end > i32::MAX as u64 {
            return Err(WadError::TooLarge(end));
        }
        self.writer.write_all(data)?;
        Ok(self.directory.push(name.to_owned(), offset as i32, data.len() as i32))
    }

    /// Write the directory, patch the header, and hand back the sink.
    pub fn finish(mut self) -> Result<(W, Directory)> {
        let directory_offset = self.writer.stream_position()?;
        let end = directory_offset + (self.directory.len() * directory::DIRECTORY_RECORD_SIZE) as u64;
        if end > i32::MAX as u64 {
            return Err(WadError::TooLarge(end));
        }

        for entry in &self.directory {
            directory::write_record(&mut self.writer, entry.offset(), entry.size(), entry.name())?;
        }

        let header = Header {
            kind:             self.kind,
            entry_count:      self.directory.len() as i32,
            directory_offset: directory_offset as i32,
        };
        self.writer.seek(SeekFrom::Start(0))?;
        header.write(&mut self.writer)?;
        self.writer.seek(SeekFrom::End(0))?;
        self.writer.flush()?;

        Ok((self.writer, self.directory))
    }
}

/// Encode a whole container from `(name, bytes)` pairs in order.
pub fn encode<W, I, N, D>(writer: W, kind: WadKind, lumps: I) -> Result<(W, Directory)>
where
    W: Write + Seek,
    I: IntoIterator<Item = (N, D)>,
    N: AsRef<str>,
    D: AsRef<[u8]>,
{
    let mut w = WadWriter::new(writer, kind)?;
    for (name, data) in lumps {
        w.add_lump(name.as_ref(), data.as_ref())?;
    }
    w.finish()
}

// ── Reader ───────────────────────────────────────────────────────────────────

#[derive(Debug)]
pub struct WadReader<R: Read + Seek> {
    reader:        R,
    pub header:    Header,
    pub directory: Directory,
}

impl<R: Read + Seek> WadReader<R> {
    pub fn new(mut reader: R) -> Result<Self> {
        reader.seek(SeekFrom::Start(0))?;
        let header = Header::read(&mut reader)?;

        let mut dir = Directory::new();
        let count = header.lump_count();
        if count == 0 {
            return Ok(Self { reader, header, directory: dir });
        }

        // Only meaningful once there is at least one record to read.
        let directory_offset = u64::try_from(header.directory_offset).map_err(|_| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("directory offset {} is before the start of the file", header.directory_offset),
            )
        })?;
        for index in 0..count {
            let (offset, size, name) = directory::read_record(&mut reader, directory_offset, index)?;
            dir.push(name, offset, size);
        }

        Ok(Self { reader, header, directory: dir })
    }

    pub fn kind(&self) -> WadKind {
        self.header.kind
    }

    pub fn read_lump(&mut self, entry: &Entry) -> Result<Vec<u8>> {
        lump::read_lump(&mut self.reader, entry)
    }

    /// Read every lump in directory order.
    pub fn read_all(&mut self) -> Result<Vec<Vec<u8>>> {
        let file_len = self.reader.seek(SeekFrom::End(0))?;
        let reader = &mut self.reader;
        self.directory
            .iter()
            .map(|e| lump::read_lump_within(&mut *reader, e, file_len))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn build(lumps: &[(&str, &[u8])]) -> Vec<u8> {
        let (cursor, _) = encode(Cursor::new(Vec::new()), WadKind::Pwad, lumps.iter().copied()).unwrap();
        cursor.into_inner()
    }

    #[test]
    fn test_empty_container_layout() {
        let bytes = build(&[]);
        assert_eq!(bytes, b"PWAD\0\0\0\0\x0c\0\0\0");
    }

    #[test]
    fn test_writer_byte_layout() {
        let bytes = build(&[("A", &b"xyz"[..]), ("BB", &b"12"[..])]);
        // header + 5 data bytes + 2 records
        assert_eq!(bytes.len(), 12 + 5 + 32);
        assert_eq!(&bytes[4..8], &2i32.to_le_bytes());
        assert_eq!(&bytes[8..12], &17i32.to_le_bytes());
        assert_eq!(&bytes[12..17], b"xyz12");
        // first record
        assert_eq!(&bytes[17..21], &12i32.to_le_bytes());
        assert_eq!(&bytes[21..25], &3i32.to_le_bytes());
        assert_eq!(&bytes[25..33], b"A\0\0\0\0\0\0\0");
        // second record
        assert_eq!(&bytes[33..37], &15i32.to_le_bytes());
        assert_eq!(&bytes[37..41], &2i32.to_le_bytes());
        assert_eq!(&bytes[41..49], b"BB\0\0\0\0\0\0");
    }

    #[test]
    fn test_reader_parses_writer_output() {
        let bytes = build(&[("PLAYPAL", &[1u8, 2, 3, 4][..]), ("E1M1", &[][..]), ("VERTEXES", &[9u8; 10][..])]);
        let mut r = WadReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(r.kind(), WadKind::Pwad);
        assert_eq!(r.header.entry_count, 3);
        let names: Vec<&str> = r.directory.iter().map(|e| e.name()).collect();
        assert_eq!(names, ["PLAYPAL", "E1M1", "VERTEXES"]);
        let all = r.read_all().unwrap();
        assert_eq!(all, vec![vec![1, 2, 3, 4], vec![], vec![9; 10]]);
    }

    #[test]
    fn test_writer_rejects_unshortened_name() {
        let mut w = WadWriter::new(Cursor::new(Vec::new()), WadKind::Iwad).unwrap();
        assert!(matches!(w.add_lump("TOOLONGNAME", b""), Err(WadError::InvalidName(_))));
    }

    #[test]
    fn test_reader_follows_directory_offset() {
        // Directory placed right after the header, lump data after it.
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"IWAD");
        bytes.extend_from_slice(&1i32.to_le_bytes());
        bytes.extend_from_slice(&12i32.to_le_bytes());
        bytes.extend_from_slice(&28i32.to_le_bytes());
        bytes.extend_from_slice(&3i32.to_le_bytes());
        bytes.extend_from_slice(b"DEMO1\0\0\0");
        bytes.extend_from_slice(b"abc");

        let mut r = WadReader::new(Cursor::new(bytes)).unwrap();
        assert_eq!(r.kind(), WadKind::Iwad);
        let entry = r.directory.get(0).unwrap().clone();
        assert_eq!(entry.name(), "DEMO1");
        assert_eq!(r.read_lump(&entry).unwrap(), b"abc");
    }

    fn raw_header(count: i32, directory_offset: i32) -> Vec<u8> {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"PWAD");
        bytes.extend_from_slice(&count.to_le_bytes());
        bytes.extend_from_slice(&directory_offset.to_le_bytes());
        bytes
    }

    #[test]
    fn test_empty_container_ignores_directory_offset() {
        for directory_offset in [-1, i32::MIN, 0, 4096] {
            let r = WadReader::new(Cursor::new(raw_header(0, directory_offset))).unwrap();
            assert!(r.directory.is_empty());
            assert_eq!(r.header.directory_offset, directory_offset);
        }
    }

    #[test]
    fn test_negative_count_reads_no_records() {
        let r = WadReader::new(Cursor::new(raw_header(-3, -1))).unwrap();
        assert_eq!(r.kind(), WadKind::Pwad);
        assert!(r.directory.is_empty());
    }

    #[test]
    fn test_negative_directory_offset_fails_when_records_exist() {
        let err = WadReader::new(Cursor::new(raw_header(1, -16))).unwrap_err();
        assert!(matches!(err, WadError::Io(ref e) if e.kind() == io::ErrorKind::InvalidInput));
    }

    #[test]
    fn test_reader_truncated_directory() {
        let mut bytes = Vec::new();
        bytes.extend_from_slice(b"PWAD");
        bytes.extend_from_slice(&2i32.to_le_bytes());
        bytes.extend_from_slice(&12i32.to_le_bytes());
        bytes.extend_from_slice(&[0u8; 16]);
        assert!(matches!(
            WadReader::new(Cursor::new(bytes)),
            Err(WadError::Truncated { offset: 28, .. })
        ));
    }
}
