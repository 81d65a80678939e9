
//! Open a file, parse its header once, and query it.
//! Pixel extraction is delegated to registered decompressors.

use std::fmt;
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::Path;

use crate::block::{self, ScanLineBlocks, TileBlocks};
use crate::compression::{ChannelOrder, Codecs, Compression, Decompressor, UnpackTarget};
use crate::error::*;
use crate::io::{check_host_endianness, CallbackStream, Read, Seek, SeekFrom, Tracking};
use crate::math::Vec2;
use crate::meta::attribute::{IntegerBounds, LevelMode, LineOrder, SampleType};
use crate::meta::header::Header;
use crate::meta::StorageMode;


/// Receives one line for each problem, already prefixed with the source name.
pub type ErrorSink = Box<dyn FnMut(&str)>;

/// The name used in messages for streams opened without a name.
pub const DEFAULT_STREAM_NAME: &str = "<stream>";

/// Print each message to standard error, prefixed with `ERROR: `.
pub fn stderr_sink() -> ErrorSink {
    Box::new(|message: &str| eprintln!("ERROR: {}", message))
}


/// Everything that can be configured when opening a file.
pub struct ReadOptions {

    /// Where to report problems. Defaults to standard error.
    pub error_sink: ErrorSink,

    /// Decompressors used to read pixels. Empty by default.
    pub codecs: Codecs,
}

impl Default for ReadOptions {
    fn default() -> Self {
        ReadOptions { error_sink: stderr_sink(), codecs: Codecs::default() }
    }
}

impl ReadOptions {

    /// Report problems to this function instead of standard error.
    pub fn with_error_sink(self, error_sink: impl FnMut(&str) + 'static) -> Self {
        ReadOptions { error_sink: Box::new(error_sink), ..self }
    }

    /// Use this decompressor for all blocks with the specified compression.
    pub fn with_decompressor(mut self, compression: Compression, decompressor: impl Decompressor + 'static) -> Self {
        self.codecs.register_decompressor(compression, decompressor);
        self
    }
}

impl fmt::Debug for ReadOptions {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("ReadOptions")
            .field("codecs", &self.codecs)
            .finish()
    }
}


/// An opened file with a parsed header.
/// The header cannot change after opening.
pub struct ImageFile<S> {
    source_name: String,

    /// `None` after closing.
    stream: Option<Tracking<S>>,

    header: Header,

    /// The byte directly after the header.
    offset_table_position: usize,

    options: ReadOptions,
}

/// Pixels of a whole image, as returned by `read_rgba_image`.
#[derive(Debug, Clone, PartialEq)]
pub struct RgbaImage {

    /// Width and height of the data window.
    pub size: Vec2<usize>,

    /// Number of interleaved channels per pixel.
    pub channel_count: usize,

    /// The sample type of every channel.
    pub sample_type: SampleType,

    /// Interleaved pixels in reversed alphabetical channel order, line by line.
    pub pixels: Vec<u8>,
}


/// Open a file, read all of its pixels in `R,G,B,A` order, and close it again.
/// Requires all channels to have the same sample type.
pub fn read_rgba_image(path: impl AsRef<Path>, options: ReadOptions) -> Result<RgbaImage> {
    let mut file = ImageFile::open(path, options)?;

    let sample_type = match file.header.channels.uniform_sample_type {
        Some(sample_type) => sample_type,
        None => return Err(file.report(Error::not_implemented("reading channels with different sample types"))),
    };

    let channel_count = file.header.channel_count();
    let bytes_per_pixel = file.header.channels.bytes_per_pixel();

    let layout = file.data_size().and_then(|size| {
        let line_stride = byte_size(Vec2(size.width(), 1), bytes_per_pixel)?;
        Ok((size, line_stride, byte_size(size, bytes_per_pixel)?))
    });

    let (size, line_stride, data_byte_size) = layout.map_err(|error| file.report(error))?;

    // the data window may exceed the display window
    let mut pixels = vec![ 0_u8; file.image_byte_size()?.max(data_byte_size) ];
    file.read_image_rgba(&mut pixels, line_stride)?;
    file.close();

    Ok(RgbaImage { size, channel_count, sample_type, pixels })
}


impl ImageFile<BufReader<File>> {

    /// Open the file at the path and read its header.
    /// Every problem is also reported to the error sink of the options.
    pub fn open(path: impl AsRef<Path>, mut options: ReadOptions) -> Result<Self> {
        let path = path.as_ref();
        let source_name = path.display().to_string();

        if path.as_os_str().is_empty() {
            let error = Error::invalid_argument("empty file name");
            report(&mut options.error_sink, &source_name, &error);
            return Err(error);
        }

        log::debug!("opening '{}'", source_name);

        match File::open(path) {
            Ok(file) => Self::from_named_stream(BufReader::new(file), source_name, options),
            Err(io_error) => {
                let error = Error::Io(io_error);
                report(&mut options.error_sink, &source_name, &error);
                Err(error)
            }
        }
    }
}

impl<R, S> ImageFile<CallbackStream<R, S>>
    where R: FnMut(&mut [u8]) -> IoResult<usize>, S: FnMut(SeekFrom) -> IoResult<u64>
{
    /// Read the header using caller-provided read and seek functions.
    /// An empty source name is replaced by `DEFAULT_STREAM_NAME`.
    pub fn from_callbacks(read: R, seek: S, source_name: &str, options: ReadOptions) -> Result<Self> {
        Self::from_stream(CallbackStream::new(read, seek), source_name, options)
    }
}

impl<S: Read + Seek> ImageFile<S> {

    /// Read the header from any byte source.
    /// An empty source name is replaced by `DEFAULT_STREAM_NAME`.
    pub fn from_stream(stream: S, source_name: &str, options: ReadOptions) -> Result<Self> {
        let source_name = if source_name.is_empty() { DEFAULT_STREAM_NAME } else { source_name };
        Self::from_named_stream(stream, source_name.to_string(), options)
    }

    fn from_named_stream(stream: S, source_name: String, mut options: ReadOptions) -> Result<Self> {
        let parsed = check_host_endianness().and_then(|()| {
            let mut stream = Tracking::new(stream);
            let header = Header::read(&mut stream)?;
            Ok((stream, header))
        });

        match parsed {
            Ok((stream, header)) => {
                log::debug!(
                    "'{}': {} channels, {}, {} user attributes",
                    source_name, header.channel_count(), header.compression, header.attribute_count()
                );

                Ok(ImageFile {
                    offset_table_position: stream.byte_position(),
                    stream: Some(stream),
                    source_name, header, options,
                })
            },

            Err(error) => {
                report(&mut options.error_sink, &source_name, &error);
                Err(error)
            }
        }
    }

    /// The parsed header.
    pub fn header(&self) -> &Header {
        &self.header
    }

    /// The path or stream name used in messages.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    /// Whether `close` was called.
    pub fn is_closed(&self) -> bool {
        self.stream.is_none()
    }

    /// Release the byte source. The header stays available.
    /// Closing an already closed file does nothing.
    pub fn close(&mut self) {
        if self.stream.take().is_some() {
            log::debug!("closed '{}'", self.source_name);
        }
    }

    /// Width and height of the data window.
    pub fn data_size(&self) -> Result<Vec2<usize>> {
        window_size(self.header.data_window)
    }

    /// Width and height of the display window.
    pub fn display_size(&self) -> Result<Vec2<usize>> {
        window_size(self.header.display_window)
    }

    /// Number of bytes all interleaved channels of the display window take up.
    pub fn image_byte_size(&mut self) -> Result<usize> {
        let bytes_per_pixel = self.header.channels.bytes_per_pixel();
        let result = self.display_size().and_then(|size| byte_size(size, bytes_per_pixel));
        result.map_err(|error| self.report(error))
    }

    /// Number of bytes a single channel of the display window takes up.
    pub fn plane_byte_size(&mut self, name: &str) -> Result<usize> {
        let result = self.find_plane(name).and_then(|channel| {
            let bytes_per_sample = self.header.channels.list[channel].sample_type.bytes_per_sample();
            byte_size(self.display_size()?, bytes_per_sample)
        });

        result.map_err(|error| self.report(error))
    }

    /// Fill the destination with all channels interleaved in alphabetical order.
    /// Requires a decompressor for the compression of this file.
    pub fn read_image(&mut self, destination: &mut [u8], line_stride: usize) -> UnitResult {
        let result = self.read_interleaved(destination, line_stride, ChannelOrder::Alphabetical);
        result.map_err(|error| self.report(error))
    }

    /// Fill the destination with all channels interleaved in reverse alphabetical order,
    /// which is `R,G,B,A` for the usual channel names.
    pub fn read_image_rgba(&mut self, destination: &mut [u8], line_stride: usize) -> UnitResult {
        let result = self.read_interleaved(destination, line_stride, ChannelOrder::Reversed);
        result.map_err(|error| self.report(error))
    }

    /// Fill the destination with the samples of a single channel.
    pub fn read_plane(&mut self, name: &str, destination: &mut [u8], line_stride: usize) -> UnitResult {
        let result = self.check_read_arguments(destination, line_stride)
            .and_then(|()| self.find_plane(name))
            .and_then(|_| Err(Error::not_implemented("plane extraction")));

        result.map_err(|error| self.report(error))
    }

    /// Print a summary of the header.
    /// The verbose summary includes every required and user attribute.
    pub fn print_header(&self, write: &mut impl Write, verbose: bool) -> IoResult<()> {
        let header = &self.header;
        let display_size = header.display_window.size();

        writeln!(write, "File '{}':", self.source_name)?;
        writeln!(write, " width: {}", display_size.width())?;
        writeln!(write, " height: {}", display_size.height())?;
        write!(write, " {} channels:", header.channel_count())?;

        for (index, channel) in header.channels.list.iter().enumerate() {
            if index > 0 { write!(write, ",")?; }
            write!(write, " '{}' {}", channel.name, channel.sample_type)?;

            if channel.sampling != Vec2(1, 1) {
                write!(write, " (samp {},{})", channel.sampling.x(), channel.sampling.y())?;
            }
        }

        writeln!(write)?;

        if verbose {
            writeln!(write, " storage: {}", header.storage)?;

            if let Some(tiles) = header.tiles {
                writeln!(write, " tile info: {}", tiles)?;
            }

            writeln!(write, " compression: {}", header.compression)?;
            writeln!(write, " lineorder: {} ({})", header.line_order.code(), header.line_order.name())?;
            writeln!(write, " pixel aspect ratio: {}", header.pixel_aspect)?;
            writeln!(write, " data window: {}", header.data_window)?;
            writeln!(write, " display window: {}", header.display_window)?;
            writeln!(write, " screen window center: {}", header.screen_window_center)?;
            writeln!(write, " screen window width: {}", header.screen_window_width)?;

            if !header.user_attributes.is_empty() {
                writeln!(write, "\n optional/user attributes:")?;

                for attribute in &header.user_attributes {
                    writeln!(write, "  {}: {}", attribute.name, attribute.value)?;
                }
            }
        }

        Ok(())
    }

    fn find_plane(&self, name: &str) -> Result<usize> {
        if name.is_empty() {
            return Err(Error::invalid_argument("missing plane name"));
        }

        self.header.find_channel(name)
            .ok_or_else(|| Error::invalid_argument(format!("unable to find plane '{}'", name)))
    }

    /// The checks shared by all pixel reads, in the order they are reported.
    fn check_read_arguments(&self, destination: &[u8], line_stride: usize) -> UnitResult {
        if destination.is_empty() {
            return Err(Error::invalid_argument("missing destination buffer"));
        }

        if line_stride == 0 {
            return Err(Error::invalid_argument("zero line stride"));
        }

        if self.is_closed() {
            return Err(Error::invalid_argument("file is already closed"));
        }

        self.header.compression.scan_lines_per_block()?;

        if let Some(tiles) = self.header.tiles {
            if tiles.level_mode != LevelMode::Singular {
                return Err(Error::UnsupportedTiling("multiple resolution levels".into()));
            }
        }

        match self.header.line_order {
            LineOrder::Increasing | LineOrder::Decreasing => {},
            LineOrder::Random => return Err(Error::UnsupportedLineOrder("random y order".into())),
            LineOrder::Unknown(code) => return Err(Error::UnsupportedLineOrder(format!("unknown line order {}", code).into())),
        }

        let required_length = self.data_size()?.height().checked_mul(line_stride)
            .ok_or_else(|| Error::invalid_argument("line stride too large"))?;

        if destination.len() < required_length {
            return Err(Error::invalid_argument(format!(
                "destination has {} bytes, but {} are required", destination.len(), required_length
            )));
        }

        Ok(())
    }

    fn read_interleaved(&mut self, destination: &mut [u8], line_stride: usize, channel_order: ChannelOrder) -> UnitResult {
        self.check_read_arguments(destination, line_stride)?;

        let data_window = self.header.data_window;
        let compression = self.header.compression;

        match (self.header.storage, self.header.tiles) {
            (StorageMode::Tiled, Some(tiles)) => {
                let geometry = TileBlocks::compute(tiles, data_window);
                log::debug!("tile geometry {:?}", geometry);
                Err(Error::not_implemented("tile reading"))
            },

            (StorageMode::Tiled, None) => Err(Error::invalid("tiled file without tile description")),

            (StorageMode::ScanLine, _) => {
                let geometry = ScanLineBlocks::compute(compression, data_window)?;

                let decompressor = self.options.codecs.decompressor(compression)
                    .ok_or_else(|| Error::not_implemented(format!("no decompressor registered for {} compression", compression)))?;

                let stream = self.stream.as_mut()
                    .ok_or_else(|| Error::invalid_argument("file is already closed"))?;

                stream.seek_read_to(self.offset_table_position)?;
                let offsets = block::read_offset_table(stream, geometry.block_count)?;
                let blocks = block::read_scan_line_blocks(stream, data_window, geometry, &offsets)?;

                let target = UnpackTarget { pixels: destination, line_stride, channel_order };
                decompressor.unpack(&self.header, target, &blocks)
            },
        }
    }

    /// Send the error to the sink and return it.
    fn report(&mut self, error: Error) -> Error {
        report(&mut self.options.error_sink, &self.source_name, &error);
        error
    }
}

impl<S> fmt::Debug for ImageFile<S> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_struct("ImageFile")
            .field("source_name", &self.source_name)
            .field("closed", &self.stream.is_none())
            .field("header", &self.header)
            .finish()
    }
}


fn window_size(window: IntegerBounds) -> Result<Vec2<usize>> {
    let size = window.size();

    Ok(Vec2(
        u64_to_usize(size.width().max(0) as u64, "window width")?,
        u64_to_usize(size.height().max(0) as u64, "window height")?,
    ))
}

fn byte_size(size: Vec2<usize>, bytes_per_pixel: usize) -> Result<usize> {
    size.width().checked_mul(size.height())
        .and_then(|pixels| pixels.checked_mul(bytes_per_pixel))
        .ok_or_else(|| Error::invalid("byte size exceeds the address space"))
}

fn report(sink: &mut ErrorSink, source_name: &str, error: &Error) {
    log::debug!("'{}': {:?}", source_name, error);

    for line in error.report_lines() {
        sink(&format!("'{}': {}", source_name, line));
    }
}
