//! Error taxonomy shared by every WAD operation.

use std::io;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum WadError {
    /// The file does not start with `IWAD` or `PWAD`.
    #[error("Invalid WAD format: {0}")]
    InvalidFormat(String),

    /// A declared offset/size reaches past the bytes actually present.
    #[error("Truncated read at offset {offset}: expected {expected} bytes")]
    Truncated { offset: u64, expected: u64 },

    #[error("Position {position} outside of directory (len {len})")]
    OutOfRange { position: i64, len: usize },

    #[error("No lump named {0:?}")]
    NotFound(String),

    /// Name longer than 8 bytes or not ASCII when handed to the encoder.
    #[error("Invalid lump name {0:?}")]
    InvalidName(String),

    /// Offset or size no longer fits in the 32-bit directory fields.
    #[error("Container exceeds 32-bit offsets: {0} bytes")]
    TooLarge(u64),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl WadError {
    /// Map a short read into `Truncated`; any other IO failure stays `Io`.
    pub(crate) fn from_read(err: io::Error, offset: u64, expected: u64) -> Self {
        if err.kind() == io::ErrorKind::UnexpectedEof {
            WadError::Truncated { offset, expected }
        } else {
            WadError::Io(err)
        }
    }
}

pub type Result<T> = std::result::Result<T, WadError>;
