pub mod error;
pub mod header;
pub mod directory;
pub mod lump;
pub mod io_stream;
pub mod archive;
pub mod recognize;

pub use error::{Result, WadError};
pub use header::{Header, WadKind};
pub use directory::{extract_file_name, lump_name, lump_name_from_path, Directory, Entry};
pub use io_stream::{WadReader, WadWriter};
pub use archive::{RebuildOptions, Wad};
pub use recognize::{classify, LumpCategory};
