
//! Read the header of OpenEXR-compatible ACES image container files.
//!
//! Opening a file parses the magic number, the version word and all attributes,
//! validates that every required attribute is present, and keeps the byte source
//! open for pixel extraction by registered decompressors.
//!
//! ```no_run
//! use aces::prelude::*;
//!
//! let file = ImageFile::open("image.exr", ReadOptions::default())?;
//! file.print_header(&mut std::io::stdout(), true)?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]


pub mod io;
pub mod math;
pub mod error;
pub mod meta;
pub mod compression;
pub mod block;
pub mod file;
pub mod write;


/// Export the most important items from `aces`.
pub mod prelude {

    // main exports
    pub use crate::file::{ImageFile, ReadOptions, RgbaImage, read_rgba_image};
    pub use crate::meta::header::Header;
    pub use crate::meta::StorageMode;

    // secondary data types
    pub use crate::meta::attribute::{
        Attribute, AttributeValue, AttributeKind, Text, IntegerBounds, FloatRect,
        ChannelList, ChannelDescription, SampleType, LineOrder, TileDescription, LevelMode,
    };

    pub use crate::compression::{Compression, Codecs, Decompressor, Compressor, UnpackTarget, ChannelOrder};
    pub use crate::block::CompressedBlock;
    pub use crate::math::Vec2;

    pub use crate::meta;
    pub use crate::error::{self, Error, Result, UnitResult};

    // re-export external stuff
    pub use half::f16;
}
