use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fmt;
use std::io::{Read, Write};
use crate::error::{Result, WadError};

pub const MAGIC_IWAD: &[u8; 4] = b"IWAD";
pub const MAGIC_PWAD: &[u8; 4] = b"PWAD";
pub const HEADER_SIZE: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WadKind {
    Iwad,
    Pwad,
}

impl WadKind {
    pub fn magic(self) -> &'static [u8; 4] {
        match self {
            WadKind::Iwad => MAGIC_IWAD,
            WadKind::Pwad => MAGIC_PWAD,
        }
    }

    pub fn from_magic(magic: &[u8; 4]) -> Option<Self> {
        match magic {
            m if m == MAGIC_IWAD => Some(WadKind::Iwad),
            m if m == MAGIC_PWAD => Some(WadKind::Pwad),
            _ => None,
        }
    }
}

impl fmt::Display for WadKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            WadKind::Iwad => "IWAD",
            WadKind::Pwad => "PWAD",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Header {
    pub kind: WadKind,
    pub entry_count: i32,
    pub directory_offset: i32,
}

impl Header {
    /// Number of directory records to read. A negative count reads none.
    pub fn lump_count(&self) -> usize {
        self.entry_count.max(0) as usize
    }

    pub fn write<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(self.kind.magic())?;
        writer.write_i32::<LittleEndian>(self.entry_count)?;
        writer.write_i32::<LittleEndian>(self.directory_offset)?;
        Ok(())
    }

    pub fn read<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader
            .read_exact(&mut magic)
            .map_err(|e| WadError::from_read(e, 0, HEADER_SIZE as u64))?;
        let kind = WadKind::from_magic(&magic).ok_or_else(|| {
            WadError::InvalidFormat(format!(
                "bad magic {:?}",
                String::from_utf8_lossy(&magic)
            ))
        })?;
        let entry_count = reader
            .read_i32::<LittleEndian>()
            .map_err(|e| WadError::from_read(e, 4, 4))?;
        let directory_offset = reader
            .read_i32::<LittleEndian>()
            .map_err(|e| WadError::from_read(e, 8, 4))?;
        Ok(Self {
            kind,
            entry_count,
            directory_offset,
        })
    }
}
