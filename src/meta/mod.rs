
//! Describes all meta data possible in a file.
//! Contains functionality to read the magic number, the version word and the header.

pub mod attribute;
pub mod header;

use std::fmt;
use bit_field::BitField;

use crate::io::*;
use crate::error::*;


/// Whether the pixels are stored in lines or in rectangular tiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StorageMode {

    /// Blocks of full-width lines.
    ScanLine,

    /// Rectangular tiles.
    Tiled,
}

impl fmt::Display for StorageMode {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.write_str(match self {
            StorageMode::ScanLine => "scanline",
            StorageMode::Tiled => "tiled",
        })
    }
}


/// The first four bytes of each file.
pub mod magic_number {
    use super::*;

    /// The magic number as a little-endian `u32`.
    pub const VALUE: u32 = 20000630;

    /// The magic number as it appears in a file.
    pub const BYTES: [u8; 4] = [0x76, 0x2f, 0x31, 0x01];

    /// Consume four bytes and fail if they are not the magic number.
    pub fn validate(read: &mut impl Read) -> UnitResult {
        let magic = u32::read(read)?;

        if magic == VALUE { Ok(()) }
        else { Err(Error::BadMagic(magic)) }
    }
}

/// The four bytes after the magic number.
pub mod version {
    use super::*;

    /// Version 2 with all flags unset.
    pub const SCAN_LINE: u32 = 0x2;

    /// Version 2 with the tiled flag set.
    pub const TILED: u32 = 0x202;

    /// Index of the bit that marks tiled files.
    pub const TILED_BIT: usize = 9;

    /// Consume four bytes and determine the storage mode.
    /// Only the exact scan line and tiled version words are accepted.
    pub fn read(read: &mut impl Read) -> Result<StorageMode> {
        let version = u32::read(read)?;

        match version {
            SCAN_LINE | TILED => Ok(
                if version.get_bit(TILED_BIT) { StorageMode::Tiled }
                else { StorageMode::ScanLine }
            ),

            unsupported => Err(Error::UnsupportedVersion(unsupported)),
        }
    }
}
