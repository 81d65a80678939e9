
//! Contains the compression attribute definition
//! and the registry of external codecs that unpack compressed blocks.
//! This crate does not contain any codec itself.

use std::collections::HashMap;
use std::fmt;

use crate::block::CompressedBlock;
use crate::error::{Error, Result, UnitResult};
use crate::io::Data;
use crate::meta::header::Header;


/// Specifies which compression method the pixel blocks use.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Compression {

    /// Store uncompressed values.
    Uncompressed,

    /// Run length encoding, one line per block.
    RLE,

    /// ZIP compression of each single line.
    ZIP1,

    /// ZIP compression of blocks of 16 lines.
    ZIP16,

    /// Wavelet and Huffman compression of blocks of 32 lines.
    PIZ,

    /// Lossy 24-bit float compression.
    PXR24,

    /// Lossy 4-by-4 pixel block compression.
    B44,

    /// Lossy 4-by-4 pixel block compression,
    /// with flat areas compressed further.
    B44A,

    /// A compression code this library does not know.
    /// Kept so that the header of such a file can still be inspected.
    Unknown(u8),
}

impl Default for Compression {
    fn default() -> Self { Compression::Uncompressed }
}

impl Compression {

    /// Number of bytes this would consume in a file.
    pub const BYTE_SIZE: usize = u8::BYTE_SIZE;

    /// Convert the code from a file. Unknown codes are kept.
    pub fn from_code(code: u8) -> Self {
        use self::Compression::*;

        match code {
            0 => Uncompressed,
            1 => RLE,
            2 => ZIP1,
            3 => ZIP16,
            4 => PIZ,
            5 => PXR24,
            6 => B44,
            7 => B44A,
            unknown => Unknown(unknown),
        }
    }

    /// The code of this compression method in a file.
    pub fn code(self) -> u8 {
        use self::Compression::*;

        match self {
            Uncompressed => 0,
            RLE => 1,
            ZIP1 => 2,
            ZIP16 => 3,
            PIZ => 4,
            PXR24 => 5,
            B44 => 6,
            B44A => 7,
            Unknown(code) => code,
        }
    }

    /// For scan line images, how many lines are stored in a single block.
    /// Fails for the lossy methods, whose block geometry is not supported yet,
    /// and for unknown compression codes.
    pub fn scan_lines_per_block(self) -> Result<usize> {
        use self::Compression::*;

        match self {
            Uncompressed | RLE | ZIP1 => Ok(1),
            ZIP16 => Ok(16),
            PIZ => Ok(32),
            PXR24 | B44 | B44A => Err(Error::not_implemented(format!("{} compression", self))),
            Unknown(code) => Err(Error::UnsupportedCompression(code)),
        }
    }
}

impl fmt::Display for Compression {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Compression::Uncompressed => formatter.write_str("uncompressed"),
            Compression::RLE => formatter.write_str("rle"),
            Compression::ZIP1 => formatter.write_str("zips"),
            Compression::ZIP16 => formatter.write_str("zip"),
            Compression::PIZ => formatter.write_str("piz"),
            Compression::PXR24 => formatter.write_str("pxr24"),
            Compression::B44 => formatter.write_str("b44"),
            Compression::B44A => formatter.write_str("b44a"),
            Compression::Unknown(code) => write!(formatter, "unknown 0x{:02X} ({})", code, code),
        }
    }
}


/// The order in which channels are placed into each pixel of the destination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChannelOrder {

    /// Alphabetical channel order, as in the channel list.
    Alphabetical,

    /// Reverse alphabetical order, which turns `A,B,G,R` into `R,G,B,A`.
    Reversed,
}

/// Where a decompressor should place the pixels of all blocks.
#[derive(Debug)]
pub struct UnpackTarget<'p> {

    /// Caller-owned pixel memory. Must never be resized.
    pub pixels: &'p mut [u8],

    /// Number of bytes from the start of one line to the start of the next line.
    pub line_stride: usize,

    /// How the channels are interleaved within a pixel.
    pub channel_order: ChannelOrder,
}

/// Decompresses blocks of pixels into an interleaved destination.
/// Registered per compression method.
pub trait Decompressor {

    /// Unpack every block into the target.
    fn unpack(&self, header: &Header, target: UnpackTarget<'_>, blocks: &[CompressedBlock]) -> UnitResult;
}

/// Compresses interleaved pixels into blocks.
/// Registered per compression method, symmetric to `Decompressor`.
pub trait Compressor {

    /// Fill the bytes of every block from the interleaved pixels.
    fn pack(&self, header: &Header, pixels: &[u8], line_stride: usize, blocks: &mut [CompressedBlock]) -> UnitResult;
}


/// The external codecs available to a file, keyed by compression method.
#[derive(Default)]
pub struct Codecs {
    decompressors: HashMap<Compression, Box<dyn Decompressor>>,
    compressors: HashMap<Compression, Box<dyn Compressor>>,
}

impl Codecs {

    /// Use this decompressor for all blocks with the specified compression.
    /// Returns the previously registered decompressor, if any.
    pub fn register_decompressor(
        &mut self, compression: Compression, decompressor: impl Decompressor + 'static
    ) -> Option<Box<dyn Decompressor>>
    {
        log::debug!("registered decompressor for {} compression", compression);
        self.decompressors.insert(compression, Box::new(decompressor))
    }

    /// Use this compressor for all blocks with the specified compression.
    /// Returns the previously registered compressor, if any.
    pub fn register_compressor(
        &mut self, compression: Compression, compressor: impl Compressor + 'static
    ) -> Option<Box<dyn Compressor>>
    {
        log::debug!("registered compressor for {} compression", compression);
        self.compressors.insert(compression, Box::new(compressor))
    }

    /// The decompressor registered for this compression method.
    pub fn decompressor(&self, compression: Compression) -> Option<&dyn Decompressor> {
        self.decompressors.get(&compression).map(|boxed| boxed.as_ref())
    }

    /// The compressor registered for this compression method.
    pub fn compressor(&self, compression: Compression) -> Option<&dyn Compressor> {
        self.compressors.get(&compression).map(|boxed| boxed.as_ref())
    }
}

impl fmt::Debug for Codecs {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("Codecs")
            .field("decompressors", &self.decompressors.keys().collect::<Vec<_>>())
            .field("compressors", &self.compressors.keys().collect::<Vec<_>>())
            .finish()
    }
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn codes(){
        for code in 0 ..= 255_u8 {
            assert_eq!(Compression::from_code(code).code(), code);
        }

        assert_eq!(Compression::from_code(3), Compression::ZIP16);
        assert_eq!(Compression::from_code(8), Compression::Unknown(8));
    }

    #[test]
    fn lines_per_block(){
        assert_eq!(Compression::Uncompressed.scan_lines_per_block().unwrap(), 1);
        assert_eq!(Compression::RLE.scan_lines_per_block().unwrap(), 1);
        assert_eq!(Compression::ZIP1.scan_lines_per_block().unwrap(), 1);
        assert_eq!(Compression::ZIP16.scan_lines_per_block().unwrap(), 16);
        assert_eq!(Compression::PIZ.scan_lines_per_block().unwrap(), 32);

        for &lossy in &[ Compression::PXR24, Compression::B44, Compression::B44A ] {
            assert!(matches!(lossy.scan_lines_per_block(), Err(Error::NotImplemented(_))));
        }

        assert!(matches!(Compression::Unknown(42).scan_lines_per_block(), Err(Error::UnsupportedCompression(42))));
    }

    struct Nothing;
    impl Decompressor for Nothing {
        fn unpack(&self, _: &Header, _: UnpackTarget<'_>, _: &[CompressedBlock]) -> UnitResult { Ok(()) }
    }

    #[test]
    fn registry(){
        let mut codecs = Codecs::default();
        assert!(codecs.decompressor(Compression::ZIP16).is_none());

        assert!(codecs.register_decompressor(Compression::ZIP16, Nothing).is_none());
        assert!(codecs.decompressor(Compression::ZIP16).is_some());
        assert!(codecs.decompressor(Compression::ZIP1).is_none());
        assert!(codecs.compressor(Compression::ZIP16).is_none());

        assert!(codecs.register_decompressor(Compression::ZIP16, Nothing).is_some(), "replaces previous");
    }

    #[test]
    fn names(){
        assert_eq!(Compression::Uncompressed.to_string(), "uncompressed");
        assert_eq!(Compression::Unknown(10).to_string(), "unknown 0x0A (10)");
    }
}
