//! Directory-based lump classification.
//!
//! Only map markers are detected: a marker is followed by the fixed run of
//! map data lumps. Lump contents are never inspected.

use std::fmt;

use crate::archive::Wad;
use crate::directory::Directory;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LumpCategory {
    Sound,
    Music,
    Playpal,
    Colormap,
    Endoom,
    Demo,
    Sprite,
    Map,
    Flat,
    /// Anything not recognised.
    Marker,
}

impl fmt::Display for LumpCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            LumpCategory::Sound    => "Sound",
            LumpCategory::Music    => "Music",
            LumpCategory::Playpal  => "Playpal",
            LumpCategory::Colormap => "Colormap",
            LumpCategory::Endoom   => "Endoom",
            LumpCategory::Demo     => "Demo",
            LumpCategory::Sprite   => "Sprite",
            LumpCategory::Map      => "Map",
            LumpCategory::Flat     => "Flat",
            LumpCategory::Marker   => "Marker",
        })
    }
}

/// (distance after the marker, expected name). Distance 9 is left unchecked.
pub const MAP_LUMPS: [(usize, &str); 9] = [
    (1, "THINGS"),
    (2, "LINEDEFS"),
    (3, "SIDEDEFS"),
    (4, "VERTEXES"),
    (5, "SEGS"),
    (6, "SSECTORS"),
    (7, "NODES"),
    (8, "SECTORS"),
    (10, "BLOCKMAP"),
];

pub fn classify(wad: &Wad, position: usize) -> LumpCategory {
    classify_directory(wad.directory(), position)
}

pub fn classify_directory(dir: &Directory, position: usize) -> LumpCategory {
    let is_map = MAP_LUMPS.iter().all(|&(distance, expected)| {
        position
            .checked_add(distance)
            .and_then(|i| dir.get(i))
            .is_some_and(|e| e.name() == expected)
    });
    if is_map {
        LumpCategory::Map
    } else {
        LumpCategory::Marker
    }
}
