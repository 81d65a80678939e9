
//! Start writing a file.
//! Only the arguments are checked so far; no pixels or headers are written.

use std::io::{Seek, Write};
use std::path::Path;

use crate::compression::Compression;
use crate::error::{Error, UnitResult};
use crate::math::Vec2;


/// Create a file at the path with the specified size, channel count and compression.
/// Fails with `NotImplemented` for every valid set of arguments.
pub fn start_write(
    path: impl AsRef<Path>, size: impl Into<Vec2<usize>>,
    channel_count: usize, compression: Compression
) -> UnitResult
{
    let path = path.as_ref();

    if path.as_os_str().is_empty() {
        return Err(Error::invalid_argument("empty file name"));
    }

    validate_layout(size.into(), channel_count)?;
    log::debug!("refusing to write '{}' with {} compression", path.display(), compression);

    Err(Error::not_implemented("writing files"))
}

/// Write to any seekable byte sink with the specified size, channel count and compression.
/// Fails with `NotImplemented` for every valid set of arguments.
pub fn start_write_stream(
    _write: impl Write + Seek, size: impl Into<Vec2<usize>>,
    channel_count: usize, compression: Compression
) -> UnitResult
{
    validate_layout(size.into(), channel_count)?;
    log::debug!("refusing to write a stream with {} compression", compression);

    Err(Error::not_implemented("writing streams"))
}

fn validate_layout(size: Vec2<usize>, channel_count: usize) -> UnitResult {
    if size.width() == 0 || size.height() == 0 {
        return Err(Error::invalid_argument(format!("image size {} contains zero", size)));
    }

    if channel_count == 0 {
        return Err(Error::invalid_argument("no channels"));
    }

    Ok(())
}
