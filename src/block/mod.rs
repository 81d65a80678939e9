//! Block geometry, the offset table, and gathering compressed blocks from a file.
//! Decompressing the gathered blocks is left to a registered `Decompressor`.

use crate::compression::Compression;
use crate::math::{RoundingMode, Vec2};
use crate::error::{Result, Error, i32_to_usize, u64_to_usize};
use crate::io::{Data, Read, Seek, Tracking};
use crate::meta::attribute::{IntegerBounds, TileDescription};


/// Contains one block of compressed pixel data and where that data should be placed in the image.
#[derive(Clone, Eq, PartialEq, Debug)]
pub struct CompressedBlock {

    /// Index of the top left pixel of the block, relative to the data window.
    pub position: Vec2<usize>,

    /// Number of pixels in this block.
    pub size: Vec2<usize>,

    /// The compressed bytes, exactly as stored in the file.
    pub bytes: Vec<u8>,
}

/// How a scan line image is split into blocks of lines.
#[derive(Clone, Copy, Eq, PartialEq, Debug)]
pub struct ScanLineBlocks {

    /// Number of lines in each block, except possibly the last one.
    pub lines_per_block: usize,

    /// Number of blocks in the image, which is also the number of offset table entries.
    pub block_count: usize,
}

/// How a tiled image is split into tiles.
/// All zero until tile reading is supported.
#[derive(Clone, Copy, Eq, PartialEq, Debug, Default)]
pub struct TileBlocks {

    /// Number of pixels in each tile.
    pub tile_size: Vec2<usize>,

    /// Number of tiles in each dimension.
    pub tile_count: Vec2<usize>,
}

/// Absolute byte position of each block in the file.
pub type OffsetTable = Vec<u64>;


impl ScanLineBlocks {

    /// Derive the block geometry from the compression method and the data window.
    /// The height counts both the first and the last line of the window.
    pub fn compute(compression: Compression, data_window: IntegerBounds) -> Result<Self> {
        let lines_per_block = compression.scan_lines_per_block()?;

        let height = data_window.size().height().max(0) as u64;
        let height = u64_to_usize(height, "data window height")?;

        Ok(ScanLineBlocks {
            lines_per_block,
            block_count: RoundingMode::Up.divide(height, lines_per_block),
        })
    }
}

impl TileBlocks {

    /// Always returns zero tiles of zero size.
    // TODO compute tile counts per level from the tile description when tiled reading is added
    pub fn compute(_tiles: TileDescription, _data_window: IntegerBounds) -> Self {
        TileBlocks::default()
    }
}


/// Read one absolute position for each block.
/// Must be called directly after the header.
pub fn read_offset_table(read: &mut impl Read, block_count: usize) -> Result<OffsetTable> {
    u64::read_vec(read, block_count, u16::MAX as usize)
}

/// Seek to each block of a scan line image and read its compressed bytes.
/// Each block starts with its first `y` coordinate and the number of compressed bytes.
pub fn read_scan_line_blocks<R: Read + Seek>(
    read: &mut Tracking<R>, data_window: IntegerBounds,
    geometry: ScanLineBlocks, offsets: &[u64]
) -> Result<Vec<CompressedBlock>>
{
    let size = data_window.size();
    let width = u64_to_usize(size.width() as u64, "data window width")?;
    let height = size.height();

    let mut blocks = Vec::with_capacity(offsets.len());

    for &offset in offsets {
        read.seek_read_to(u64_to_usize(offset, "block offset")?)?;

        let y = i32::read(read)?;
        let packed_size = i32_to_usize(i32::read(read)?, "negative block size")?;

        let line = y as i64 - data_window.min.y() as i64;
        if line < 0 || line >= height || line as usize % geometry.lines_per_block != 0 {
            return Err(Error::invalid(format!("block y coordinate {} is not the start of a block", y)));
        }

        let line_count = (height - line).min(geometry.lines_per_block as i64) as usize;
        log::trace!("block at byte {} with lines {}..{} and {} bytes", offset, line, line as usize + line_count, packed_size);

        blocks.push(CompressedBlock {
            position: Vec2(0, line as usize),
            size: Vec2(width, line_count),
            bytes: u8::read_vec(read, packed_size, 1024 * 1024)?,
        });
    }

    Ok(blocks)
}


#[cfg(test)]
mod test {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn block_count_uses_inclusive_height(){
        let window = IntegerBounds::new((0, 0), (99, 99)); // 100 lines
        let geometry = ScanLineBlocks::compute(Compression::ZIP16, window).unwrap();
        assert_eq!(geometry, ScanLineBlocks { lines_per_block: 16, block_count: 7 });

        let window = IntegerBounds::new((0, 0), (9, 100)); // 101 lines
        assert_eq!(ScanLineBlocks::compute(Compression::ZIP16, window).unwrap().block_count, 7);

        let window = IntegerBounds::new((0, -8), (9, 7)); // 16 lines
        assert_eq!(ScanLineBlocks::compute(Compression::ZIP16, window).unwrap().block_count, 1);

        let window = IntegerBounds::new((0, -8), (9, 8)); // 17 lines
        assert_eq!(ScanLineBlocks::compute(Compression::ZIP16, window).unwrap().block_count, 2);

        assert_eq!(ScanLineBlocks::compute(Compression::PIZ, window).unwrap().block_count, 1);
        assert_eq!(ScanLineBlocks::compute(Compression::RLE, window).unwrap().block_count, 17);
    }

    #[test]
    fn block_count_failures(){
        let window = IntegerBounds::new((0, 0), (9, 9));
        assert!(matches!(ScanLineBlocks::compute(Compression::B44, window), Err(Error::NotImplemented(_))));
        assert!(matches!(ScanLineBlocks::compute(Compression::Unknown(9), window), Err(Error::UnsupportedCompression(9))));
    }

    #[test]
    fn tiles_are_inert(){
        let tiles = TileDescription {
            tile_size: Vec2(64, 64),
            level_mode: crate::meta::attribute::LevelMode::Singular,
            rounding_mode: RoundingMode::Down,
        };

        let geometry = TileBlocks::compute(tiles, IntegerBounds::new((0, 0), (255, 255)));
        assert_eq!(geometry, TileBlocks { tile_size: Vec2(0, 0), tile_count: Vec2(0, 0) });
    }

    #[test]
    fn gather_blocks(){
        let mut file = Vec::new();
        file.extend_from_slice(&16_u64.to_le_bytes()); // offset table
        file.extend_from_slice(&29_u64.to_le_bytes());

        file.extend_from_slice(&10_i32.to_le_bytes()); // first block
        file.extend_from_slice(&5_i32.to_le_bytes());
        file.extend_from_slice(&[ 1, 2, 3, 4, 5 ]);

        file.extend_from_slice(&26_i32.to_le_bytes()); // second block
        file.extend_from_slice(&1_i32.to_le_bytes());
        file.push(9);

        let window = IntegerBounds::new((0, 10), (3, 29)); // 20 lines
        let geometry = ScanLineBlocks::compute(Compression::ZIP16, window).unwrap();

        let mut read = Tracking::new(Cursor::new(file));
        let offsets = read_offset_table(&mut read, geometry.block_count).unwrap();
        assert_eq!(offsets, vec![ 16, 29 ]);

        let blocks = read_scan_line_blocks(&mut read, window, geometry, &offsets).unwrap();
        assert_eq!(blocks, vec![
            CompressedBlock { position: Vec2(0, 0), size: Vec2(4, 16), bytes: vec![ 1, 2, 3, 4, 5 ] },
            CompressedBlock { position: Vec2(0, 16), size: Vec2(4, 4), bytes: vec![ 9 ] },
        ]);
    }

    #[test]
    fn misplaced_block(){
        let mut file = Vec::new();
        file.extend_from_slice(&8_u64.to_le_bytes());
        file.extend_from_slice(&3_i32.to_le_bytes()); // not a multiple of 16
        file.extend_from_slice(&0_i32.to_le_bytes());

        let window = IntegerBounds::new((0, 0), (3, 19));
        let geometry = ScanLineBlocks { lines_per_block: 16, block_count: 1 };

        let mut read = Tracking::new(Cursor::new(file));
        let offsets = read_offset_table(&mut read, 1).unwrap();
        assert!(matches!(read_scan_line_blocks(&mut read, window, geometry, &offsets), Err(Error::Invalid(_))));
    }
}
