
//! Contains all header attributes and how to read them.
//! A header can have any number of [`Attribute`]s, including custom attributes.

use smallvec::SmallVec;
use std::collections::BTreeMap;
use std::convert::TryFrom;
use std::fmt;

use crate::io::*;
use crate::error::*;
use crate::math::{RoundingMode, Vec2};
use crate::compression::Compression;
use half::f16;
use bit_field::BitField;


/// A named value from the header.
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {

    /// The name of this attribute, at most 31 bytes.
    pub name: Text,

    /// The typed contents of this attribute.
    pub value: AttributeValue,
}

/// Contains one of all possible attributes.
/// Includes a variant for custom attributes.
#[derive(Debug, Clone, PartialEq)]
pub enum AttributeValue {

    /// 2D integer rectangle.
    IntegerBounds(IntegerBounds),

    /// 2D float rectangle.
    FloatRect(FloatRect),

    /// Channel meta data.
    ChannelList(ChannelList),

    /// Color space definition.
    Chromaticities(Chromaticities),

    /// Compression method of the pixel blocks.
    Compression(Compression),

    /// 64-bit float
    F64(f64),

    /// This image is an environment map.
    EnvironmentMap(EnvironmentMap),

    /// 32-bit float
    F32(f32),

    /// 32-bit signed integer
    I32(i32),

    /// Film roll information.
    KeyCode(KeyCode),

    /// Order of the blocks in the file.
    LineOrder(LineOrder),

    /// A 3x3 matrix of floats.
    Matrix3x3(Matrix3x3),

    /// A 4x4 matrix of floats.
    Matrix4x4(Matrix4x4),

    /// 8-bit rgba Preview of the image.
    Preview(Preview),

    /// An integer dividend and divisor.
    Rational(Rational),

    /// A string of byte-chars.
    Text(Text),

    /// List of texts.
    TextVector(Vec<Text>),

    /// How to tile up the image.
    TileDescription(TileDescription),

    /// Timepoint and more.
    TimeCode(TimeCode),

    /// 2D integer vector.
    IntVec2(Vec2<i32>),

    /// 2D float vector.
    FloatVec2(Vec2<f32>),

    /// 3D integer vector.
    IntVec3((i32, i32, i32)),

    /// 3D float vector.
    FloatVec3((f32, f32, f32)),

    /// An attribute with a type name that is not known.
    /// Contains the type name of this value.
    Custom {

        /// The name of the type this attribute is an instance of.
        kind: Text,

        /// The unparsed little-endian bytes of the value.
        bytes: Vec<u8>
    },
}


macro_rules! define_attribute_kinds {
    ( $( $(#[$meta: meta])* $variant: ident : $name: expr ),* ) => {

        /// The closed set of attribute type tags.
        #[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
        pub enum AttributeKind {
            $( $(#[$meta])* $variant, )*

            /// Any type name not in the list of known names.
            User,
        }

        impl AttributeKind {

            /// All kinds that have a fixed type name.
            pub const KNOWN: &'static [AttributeKind] = &[ $( AttributeKind::$variant ),* ];

            /// Resolve a type name from a file. The comparison is exact and case-sensitive.
            /// Returns `None` for names that are not known.
            pub fn from_type_name(bytes: &[u8]) -> Option<Self> {
                $( if bytes == $name.as_bytes() { return Some(AttributeKind::$variant) } )*
                None
            }

            /// The type name as it appears in a file, or `"user"` for custom types.
            pub fn type_name(self) -> &'static str {
                match self {
                    $( AttributeKind::$variant => $name, )*
                    AttributeKind::User => "user",
                }
            }
        }
    };
}

define_attribute_kinds! {
    /// `IntegerBounds`
    Box2I: "box2i",
    /// `FloatRect`
    Box2F: "box2f",
    /// `ChannelList`
    ChannelList: "chlist",
    /// `Chromaticities`
    Chromaticities: "chromaticities",
    /// `Compression`
    Compression: "compression",
    /// `f64`
    Double: "double",
    /// `EnvironmentMap`
    EnvironmentMap: "envmap",
    /// `f32`
    Float: "float",
    /// `i32`
    Int: "int",
    /// `KeyCode`
    KeyCode: "keycode",
    /// `LineOrder`
    LineOrder: "lineOrder",
    /// `Matrix3x3`
    M33F: "m33f",
    /// `Matrix4x4`
    M44F: "m44f",
    /// `Preview`
    Preview: "preview",
    /// `Rational`
    Rational: "rational",
    /// `Text`
    String: "string",
    /// A list of `Text`
    StringVector: "stringvector",
    /// `TileDescription`
    TileDescription: "tiledesc",
    /// `TimeCode`
    TimeCode: "timecode",
    /// `Vec2<i32>`
    V2I: "v2i",
    /// `Vec2<f32>`
    V2F: "v2f",
    /// `(i32, i32, i32)`
    V3I: "v3i",
    /// `(f32, f32, f32)`
    V3F: "v3f"
}


/// A byte array with each byte being a char.
/// Not necessarily UTF-8, the bytes are kept exactly as found in the file.
#[derive(Clone, PartialEq, Eq, Ord, PartialOrd, Default, Hash)]
pub struct Text {
    bytes: TextBytes,
}

/// The raw bytes that make up a string in a file.
// will mostly be "R", "G", "B" or short attribute names
pub type TextBytes = SmallVec<[u8; 24]>;

/// Maximum number of bytes in an attribute name, type name or channel name,
/// not counting the null terminator.
pub const MAX_NAME_LENGTH: usize = 31;


/// A rectangular section anywhere in 2D integer space.
/// Both corners are included in the rectangle.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Default, Hash)]
pub struct IntegerBounds {

    /// The top left corner of this rectangle (inclusive).
    pub min: Vec2<i32>,

    /// The bottom right corner of this rectangle (inclusive).
    pub max: Vec2<i32>,
}

/// A rectangular section anywhere in 2D float space.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct FloatRect {

    /// The top left corner location of the rectangle (inclusive)
    pub min: Vec2<f32>,

    /// The bottom right corner location of the rectangle (inclusive)
    pub max: Vec2<f32>
}

/// A list of channels. Channels are sorted alphabetically by name.
#[derive(Clone, Debug, Eq, PartialEq, Hash, Default)]
pub struct ChannelList {

    /// The channels in this list, sorted by name.
    pub list: SmallVec<[ChannelDescription; 5]>,

    /// The sample type of all channels, if all channels have the same type.
    pub uniform_sample_type: Option<SampleType>,
}

/// A single channel of the image.
/// Does not contain the actual pixel data,
/// but instead merely describes it.
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct ChannelDescription {

    /// One of "R", "G", or "B" most of the time.
    pub name: Text,

    /// U32, F16 or F32.
    pub sample_type: SampleType,

    /// Legacy hint for lossy compression methods.
    pub quantize_linearly: bool,

    /// How many of the samples are skipped compared to the other channels.
    /// Both components are at least one.
    pub sampling: Vec2<usize>,
}

/// The type of samples in this channel.
#[derive(Clone, Debug, Eq, PartialEq, Copy, Hash)]
pub enum SampleType {

    /// This channel contains 32-bit unsigned int values.
    U32,

    /// This channel contains 16-bit float values.
    F16,

    /// This channel contains 32-bit float values.
    F32,
}

/// The color space of the pixels.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Chromaticities {

    /// "Red" location on the CIE XY chromaticity diagram.
    pub red: Vec2<f32>,

    /// "Green" location on the CIE XY chromaticity diagram.
    pub green: Vec2<f32>,

    /// "Blue" location on the CIE XY chromaticity diagram.
    pub blue: Vec2<f32>,

    /// "White" location on the CIE XY chromaticity diagram.
    pub white: Vec2<f32>
}

/// If this attribute is present, it describes
/// how this texture should be projected onto an environment.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum EnvironmentMap {

    /// This image is an environment map projected like a world map.
    LatitudeLongitude,

    /// This image contains the six sides of a cube.
    Cube,
}

/// Uniquely identifies a motion picture film frame.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct KeyCode {

    /// Identifies a film manufacturer.
    pub film_manufacturer_code: i32,

    /// Identifies a film type.
    pub film_type: i32,

    /// Specifies the film roll prefix.
    pub film_roll_prefix: i32,

    /// Specifies the film count.
    pub count: i32,

    /// Specifies the perforation offset.
    pub perforation_offset: i32,

    /// Specifies the perforation count of each single frame.
    pub perforations_per_frame: i32,

    /// Specifies the perforation count of each single film.
    pub perforations_per_count: i32,
}

/// In what order the blocks of pixel data appear in a file.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum LineOrder {

    /// The blocks are ordered by increasing y coordinate.
    Increasing,

    /// The blocks are ordered by decreasing y coordinate.
    Decreasing,

    /// The blocks are not ordered in a specific way inside the file.
    /// Files with this order cannot be read yet.
    Random,

    /// A line order code this library does not know.
    Unknown(u8),
}

/// A small `rgba` image of `u8` values that approximates the real image.
#[derive(Clone, Eq, PartialEq)]
pub struct Preview {

    /// The dimensions of the preview image.
    pub size: Vec2<usize>,

    /// An array with a length of 4 × width × height.
    /// Each pixel consists of the four `u8` values red, green, blue, alpha.
    pub pixel_data: Vec<u8>,
}

/// An integer dividend and divisor.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Default)]
pub struct Rational {

    /// The dividend.
    pub numerator: i32,

    /// The divisor.
    pub denominator: u32,
}

/// Describes how the image is divided into tiles.
/// Specifies the size of each tile in the image
/// and whether this image contains multiple resolution levels.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub struct TileDescription {

    /// The size of each tile.
    /// Stays the same number of pixels across all levels.
    pub tile_size: Vec2<usize>,

    /// Whether to also store smaller versions of the image.
    pub level_mode: LevelMode,

    /// Whether to round up or down when calculating Mip/Rip levels.
    pub rounding_mode: RoundingMode,
}

/// Whether to also store increasingly smaller versions of the original image.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum LevelMode {

    /// Only a single level.
    Singular,

    /// Levels with a similar aspect ratio.
    MipMap,

    /// Levels with all possible aspect ratios.
    RipMap,
}

/// Contains time information for this frame within a sequence.
/// The words are kept as found in the file, packed with `TV60` packing.
/// See the [SMPTE standard 12M-1999](https://en.wikipedia.org/wiki/SMPTE_timecode).
#[derive(Copy, Debug, Clone, Eq, PartialEq, Hash, Default)]
pub struct TimeCode {

    /// Hours, minutes, seconds, frame and flags.
    pub time_and_flags: u32,

    /// Eight binary groups of four bits.
    pub user_data: u32,
}

/// A 3×3 matrix of floats, row major.
pub type Matrix3x3 = [f32; 3*3];

/// A 4×4 matrix of floats, row major.
pub type Matrix4x4 = [f32; 4*4];


fn type_mismatch(expected: AttributeKind, found: &AttributeValue) -> Error {
    Error::AttributeTypeMismatch {
        expected: expected.type_name(),
        found: found.type_name().to_string(),
    }
}

fn negative_size() -> Error {
    Error::invalid("negative attribute size")
}


/// The single size checked read that every fixed-size attribute uses.
/// Compares the declared size with the native size of the type
/// before consuming any byte, then reads exactly that many bytes.
fn read_fixed<T>(
    read: &mut impl Read, kind: &Text, declared_size: i32, native_size: usize,
    parse: impl FnOnce(&mut &[u8]) -> Result<T>
) -> Result<T>
{
    const MAX_FIXED_SIZE: usize = Matrix4x4::BYTE_SIZE;
    debug_assert!(native_size <= MAX_FIXED_SIZE, "fixed attribute size bug");

    if usize::try_from(declared_size).ok() != Some(native_size) {
        return Err(Error::SizeMismatch {
            type_name: kind.to_string(),
            declared: declared_size,
            expected: native_size,
        });
    }

    let mut buffer = [0_u8; MAX_FIXED_SIZE];
    let bytes = &mut buffer[.. native_size];
    read.read_exact(bytes)?;

    parse(&mut &bytes[..])
}

/// Number of bytes a 3×3 or 4×4 matrix consumes.
trait MatrixSize { const BYTE_SIZE: usize; }
impl MatrixSize for Matrix3x3 { const BYTE_SIZE: usize = 9 * 4; }
impl MatrixSize for Matrix4x4 { const BYTE_SIZE: usize = 16 * 4; }


impl Text {

    /// Create a `Text` from the given bytes, without validation.
    pub fn from_bytes(bytes: &[u8]) -> Self {
        Text { bytes: SmallVec::from_slice(bytes) }
    }

    /// The underlying bytes that represent this text.
    pub fn bytes(&self) -> &[u8] {
        self.bytes.as_slice()
    }

    /// Number of bytes in this text.
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Whether this text has no bytes.
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Iterate over the individual chars in this text, similar to `String::chars()`.
    pub fn chars(&self) -> impl '_ + Iterator<Item = char> {
        self.bytes.iter().map(|&byte| byte as char)
    }

    /// Compare this `Text` with a plain `&str`.
    pub fn eq(&self, string: &str) -> bool {
        self.bytes() == string.as_bytes()
    }

    /// Read a string until the null-terminator is found, then skip the null-terminator.
    /// Returns an empty text if the first byte is the terminator.
    /// Fails if no terminator is found within `MAX_NAME_LENGTH + 1` bytes.
    pub fn read_null_terminated<R: Read>(read: &mut R, kind: &'static str) -> Result<Self> {
        let mut bytes = TextBytes::new();

        loop {
            match u8::read(read)? {
                0 => break,
                non_terminator => bytes.push(non_terminator),
            }

            if bytes.len() > MAX_NAME_LENGTH {
                return Err(Error::NameTooLong {
                    kind, prefix: Text { bytes }.to_string(),
                })
            }
        }

        Ok(Text { bytes })
    }

    /// Read exactly `size` bytes as a text.
    /// No length prefix and no terminator are expected.
    pub fn read_sized<R: Read>(read: &mut R, size: usize) -> Result<Self> {
        const SMALL_SIZE: usize  = 24;

        // for small strings, read into small vec without heap allocation
        if size <= SMALL_SIZE {
            let mut buffer = [0_u8; SMALL_SIZE];
            let data = &mut buffer[..size];

            read.read_exact(data)?;
            Ok(Text::from_bytes(data))
        }

        // for large strings, read a dynamic vec of arbitrary size
        else {
            Ok(Text { bytes: SmallVec::from_vec(u8::read_vec(read, size, 1024)?) })
        }
    }

    /// Read texts, each with a preceding `i32` length, until `total_byte_size` bytes are consumed.
    fn read_vec_of_i32_sized<R: Read>(read: &mut R, kind: &Text, total_byte_size: usize) -> Result<Vec<Text>> {
        let mut result = Vec::with_capacity(2);
        let mut processed_bytes = 0;

        while processed_bytes < total_byte_size {
            let size = i32_to_usize(i32::read(read)?, "negative text size in text vector")?;
            processed_bytes += i32::BYTE_SIZE + size;

            if processed_bytes > total_byte_size {
                return Err(Error::SizeMismatch {
                    type_name: kind.to_string(),
                    declared: total_byte_size as i32,
                    expected: processed_bytes,
                })
            }

            result.push(Text::read_sized(read, size)?);
        }

        Ok(result)
    }
}

impl PartialEq<str> for Text {
    fn eq(&self, other: &str) -> bool {
        self.eq(other)
    }
}

impl<'s> From<&'s str> for Text {
    fn from(str: &'s str) -> Self {
        Text::from_bytes(str.as_bytes())
    }
}

impl fmt::Debug for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Text(\"{}\")", self)
    }
}

// automatically implements to_string for us
impl fmt::Display for Text {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use std::fmt::Write;

        for &byte in self.bytes.iter() {
            f.write_char(byte as char)?;
        }

        Ok(())
    }
}


impl IntegerBounds {

    /// Number of bytes this would consume in a file.
    pub const BYTE_SIZE: usize = 4 * i32::BYTE_SIZE;

    /// Create a box from its inclusive corners.
    pub fn new(min: impl Into<Vec2<i32>>, max: impl Into<Vec2<i32>>) -> Self {
        IntegerBounds { min: min.into(), max: max.into() }
    }

    /// Width and height, counting both corners.
    /// Computed in `i64` so that no bounds can overflow.
    pub fn size(self) -> Vec2<i64> {
        Vec2(
            self.max.x() as i64 - self.min.x() as i64 + 1,
            self.max.y() as i64 - self.min.y() as i64 + 1,
        )
    }

    /// Whether the maximum corner lies before the minimum corner on any axis.
    pub fn is_inverted(self) -> bool {
        self.max.x() < self.min.x() || self.max.y() < self.min.y()
    }

    /// Read the value without validating.
    pub fn read<R: Read>(read: &mut R) -> Result<Self> {
        let x_min = i32::read(read)?;
        let y_min = i32::read(read)?;
        let x_max = i32::read(read)?;
        let y_max = i32::read(read)?;
        Ok(IntegerBounds::new((x_min, y_min), (x_max, y_max)))
    }
}

impl fmt::Display for IntegerBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {} - {}, {}]", self.min.x(), self.min.y(), self.max.x(), self.max.y())
    }
}


impl FloatRect {

    /// Number of bytes this would consume in a file.
    pub const BYTE_SIZE: usize = 4 * f32::BYTE_SIZE;

    /// Read the value without validating.
    pub fn read<R: Read>(read: &mut R) -> Result<Self> {
        let x_min = f32::read(read)?;
        let y_min = f32::read(read)?;
        let x_max = f32::read(read)?;
        let y_max = f32::read(read)?;

        Ok(FloatRect {
            min: Vec2(x_min, y_min),
            max: Vec2(x_max, y_max)
        })
    }
}


impl SampleType {

    /// How many bytes a single sample takes up.
    pub fn bytes_per_sample(&self) -> usize {
        match self {
            SampleType::F16 => std::mem::size_of::<f16>(),
            SampleType::F32 => f32::BYTE_SIZE,
            SampleType::U32 => u32::BYTE_SIZE,
        }
    }

    /// Read the value, failing for unknown sample type codes.
    pub fn read<R: Read>(read: &mut R) -> Result<Self> {
        Ok(match i32::read(read)? {
            0 => SampleType::U32,
            1 => SampleType::F16,
            2 => SampleType::F32,
            _ => return Err(Error::invalid("channel sample type")),
        })
    }
}

impl fmt::Display for SampleType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            SampleType::U32 => "uint",
            SampleType::F16 => "half",
            SampleType::F32 => "float",
        })
    }
}


impl ChannelDescription {

    /// Create a channel with no subsampling.
    pub fn new(name: impl Into<Text>, sample_type: SampleType, quantize_linearly: bool) -> Self {
        Self { name: name.into(), sample_type, quantize_linearly, sampling: Vec2(1, 1) }
    }

    /// Read the contents of a channel that follow its name.
    pub fn read<R: Read>(read: &mut R, name: Text) -> Result<Self> {
        let sample_type = SampleType::read(read)?;

        let is_linear = match u8::read(read)? {
            1 => true,
            0 => false,
            _ => return Err(Error::invalid("channel linearity attribute value")),
        };

        let mut reserved = [0_u8; 3];
        u8::read_slice(read, &mut reserved)?;

        let x_sampling = i32::read(read)?;
        let y_sampling = i32::read(read)?;

        if x_sampling < 1 || y_sampling < 1 {
            return Err(Error::invalid(format!("channel '{}' sampling must be at least one", name)));
        }

        Ok(ChannelDescription {
            name, sample_type,
            quantize_linearly: is_linear,
            sampling: Vec2(x_sampling as usize, y_sampling as usize),
        })
    }
}


impl ChannelList {

    /// Does not validate channel order.
    pub fn new(channels: SmallVec<[ChannelDescription; 5]>) -> Self {
        let uniform_sample_type = channels.first().and_then(|first| {
            let has_uniform_types = channels.iter().skip(1)
                .all(|channel| channel.sample_type == first.sample_type);

            if has_uniform_types { Some(first.sample_type) } else { None }
        });

        ChannelList { list: channels, uniform_sample_type }
    }

    /// Number of bytes one pixel with all channels takes up, ignoring subsampling.
    pub fn bytes_per_pixel(&self) -> usize {
        self.list.iter().map(|channel| channel.sample_type.bytes_per_sample()).sum()
    }

    /// Return the index of the channel with the exact name, case sensitive.
    pub fn find_index_of_channel(&self, exact_name: &str) -> Option<usize> {
        self.list.iter().position(|channel| channel.name.eq(exact_name))
    }

    /// Read channels until the empty name, sorting them by name.
    /// The number of consumed bytes must match the declared attribute size.
    pub fn read<R: Read>(read: &mut R, kind: &Text, declared_size: i32) -> Result<Self> {
        let expected_size = i32_to_usize(declared_size, "negative attribute size")?;

        let mut read = Tracking::new(read);
        let mut sorted = BTreeMap::new();

        loop {
            let name = Text::read_null_terminated(&mut read, "channel name")?;
            if name.is_empty() { break; }

            if sorted.contains_key(&name) {
                return Err(Error::invalid(format!("duplicate channel name '{}'", name)));
            }

            let channel = ChannelDescription::read(&mut read, name.clone())?;
            log::trace!("channel '{}' {}", name, channel.sample_type);
            sorted.insert(name, channel);
        }

        if read.byte_position() != expected_size {
            return Err(Error::SizeMismatch {
                type_name: kind.to_string(),
                declared: declared_size,
                expected: read.byte_position(),
            });
        }

        Ok(ChannelList::new(sorted.into_values().collect()))
    }
}


impl Chromaticities {

    /// Number of bytes this would consume in a file.
    pub const BYTE_SIZE: usize = 8 * f32::BYTE_SIZE;

    /// Read the value without validating.
    pub fn read<R: Read>(read: &mut R) -> Result<Self> {
        Ok(Chromaticities {
            red: Vec2(f32::read(read)?, f32::read(read)?),
            green: Vec2(f32::read(read)?, f32::read(read)?),
            blue: Vec2(f32::read(read)?, f32::read(read)?),
            white: Vec2(f32::read(read)?, f32::read(read)?),
        })
    }
}


impl EnvironmentMap {

    /// Number of bytes this would consume in a file.
    pub const BYTE_SIZE: usize = u8::BYTE_SIZE;

    /// Read the value, failing for unknown environment map codes.
    pub fn read<R: Read>(read: &mut R) -> Result<Self> {
        Ok(match u8::read(read)? {
            0 => EnvironmentMap::LatitudeLongitude,
            1 => EnvironmentMap::Cube,
            _ => return Err(Error::invalid("environment map attribute value")),
        })
    }
}


impl KeyCode {

    /// Number of bytes this would consume in a file.
    pub const BYTE_SIZE: usize = 7 * i32::BYTE_SIZE;

    /// Read the value without validating.
    pub fn read<R: Read>(read: &mut R) -> Result<Self> {
        Ok(KeyCode {
            film_manufacturer_code: i32::read(read)?,
            film_type: i32::read(read)?,
            film_roll_prefix: i32::read(read)?,
            count: i32::read(read)?,
            perforation_offset: i32::read(read)?,
            perforations_per_frame: i32::read(read)?,
            perforations_per_count: i32::read(read)?,
        })
    }
}


impl LineOrder {

    /// Number of bytes this would consume in a file.
    pub const BYTE_SIZE: usize = u8::BYTE_SIZE;

    /// Convert the code from a file. Unknown codes are kept.
    pub fn from_code(code: u8) -> Self {
        match code {
            0 => LineOrder::Increasing,
            1 => LineOrder::Decreasing,
            2 => LineOrder::Random,
            unknown => LineOrder::Unknown(unknown),
        }
    }

    /// The code of this line order in a file.
    pub fn code(self) -> u8 {
        match self {
            LineOrder::Increasing => 0,
            LineOrder::Decreasing => 1,
            LineOrder::Random => 2,
            LineOrder::Unknown(code) => code,
        }
    }

    /// Read the value without validating.
    pub fn read<R: Read>(read: &mut R) -> Result<Self> {
        Ok(LineOrder::from_code(u8::read(read)?))
    }

    /// A short lowercase description.
    pub fn name(self) -> &'static str {
        match self {
            LineOrder::Increasing => "increasing",
            LineOrder::Decreasing => "decreasing",
            LineOrder::Random => "random",
            LineOrder::Unknown(_) => "unknown",
        }
    }
}


impl Preview {

    /// Read the dimensions and then the pixels.
    /// Declared sizes of 8 bytes or less are rejected before reading anything.
    pub fn read<R: Read>(read: &mut R, kind: &Text, declared_size: i32) -> Result<Self> {
        let size_mismatch = |expected| Error::SizeMismatch {
            type_name: kind.to_string(), declared: declared_size, expected,
        };

        let header_size = 2 * u32::BYTE_SIZE;
        if declared_size <= header_size as i32 {
            return Err(size_mismatch(header_size + 4)); // a single pixel
        }

        let width = u32::read(read)? as usize;
        let height = u32::read(read)? as usize;

        let pixel_byte_count = width.checked_mul(height)
            .and_then(|pixels| pixels.checked_mul(4))
            .ok_or_else(|| Error::invalid("preview dimensions"))?;

        let expected_size = header_size + pixel_byte_count;
        if expected_size != declared_size as usize {
            return Err(size_mismatch(expected_size));
        }

        let pixel_data = u8::read_vec(read, pixel_byte_count, 1024 * 1024 * 4)?;
        Ok(Preview { size: Vec2(width, height), pixel_data })
    }
}

impl fmt::Debug for Preview {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Preview ({}x{} px)", self.size.width(), self.size.height())
    }
}


impl Rational {

    /// Number of bytes this would consume in a file.
    pub const BYTE_SIZE: usize = i32::BYTE_SIZE + u32::BYTE_SIZE;

    /// Read the value without validating.
    pub fn read<R: Read>(read: &mut R) -> Result<Self> {
        Ok(Rational { numerator: i32::read(read)?, denominator: u32::read(read)? })
    }
}


impl TileDescription {

    /// Number of bytes this would consume in a file.
    pub const BYTE_SIZE: usize = 2 * u32::BYTE_SIZE + 1; // size x,y + (level mode + rounding mode)

    /// Read the value, failing for unknown level or rounding modes.
    pub fn read<R: Read>(read: &mut R) -> Result<Self> {
        let x_size = u32::read(read)? as usize;
        let y_size = u32::read(read)? as usize;

        let mode = u8::read(read)?;

        // low nibble is the level mode, high nibble the rounding mode
        let level_mode = mode & 0b00001111;
        let rounding_mode = mode >> 4;

        let level_mode = match level_mode {
            0 => LevelMode::Singular,
            1 => LevelMode::MipMap,
            2 => LevelMode::RipMap,
            _ => return Err(Error::invalid("tile description level mode")),
        };

        let rounding_mode = match rounding_mode {
            0 => RoundingMode::Down,
            1 => RoundingMode::Up,
            _ => return Err(Error::invalid("tile description rounding mode")),
        };

        Ok(TileDescription { tile_size: Vec2(x_size, y_size), level_mode, rounding_mode, })
    }
}

impl fmt::Display for TileDescription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (level_code, level_name) = match self.level_mode {
            LevelMode::Singular => (0, "single image"),
            LevelMode::MipMap => (1, "mipmap"),
            LevelMode::RipMap => (2, "ripmap"),
        };

        let (rounding_code, rounding_name) = match self.rounding_mode {
            RoundingMode::Down => (0, "down"),
            RoundingMode::Up => (1, "up"),
        };

        write!(
            f, "{} x {} level {} ({}) round {} ({})",
            self.tile_size.width(), self.tile_size.height(),
            level_code, level_name, rounding_code, rounding_name
        )
    }
}


// assumes value fits into u8
fn u8_from_decimal32(coded: u32) -> u8 {
    ((coded & 0x0f) + 10 * ((coded >> 4) & 0x0f)) as u8
}

// https://github.com/AcademySoftwareFoundation/openexr/blob/master/src/lib/OpenEXR/ImfTimeCode.cpp
impl TimeCode {

    /// Number of bytes this would consume in a file.
    pub const BYTE_SIZE: usize = 2 * u32::BYTE_SIZE;

    /// Hours 0 - 23 are valid.
    pub fn hours(&self) -> u8 { u8_from_decimal32(self.time_and_flags.get_bits(24..30)) }

    /// Minutes 0 - 59 are valid.
    pub fn minutes(&self) -> u8 { u8_from_decimal32(self.time_and_flags.get_bits(16..23)) }

    /// Seconds 0 - 59 are valid.
    pub fn seconds(&self) -> u8 { u8_from_decimal32(self.time_and_flags.get_bits(8..15)) }

    /// Frame indices 0 - 29 are valid.
    pub fn frame(&self) -> u8 { u8_from_decimal32(self.time_and_flags.get_bits(0..6)) }

    /// Whether this is a drop frame.
    pub fn drop_frame(&self) -> bool { self.time_and_flags.get_bit(6) }

    /// Whether this is a color frame.
    pub fn color_frame(&self) -> bool { self.time_and_flags.get_bit(7) }

    /// Field phase.
    pub fn field_phase(&self) -> bool { self.time_and_flags.get_bit(15) }

    /// Flags for `binary_groups`.
    pub fn binary_group_flags(&self) -> [bool; 3] {
        [
            self.time_and_flags.get_bit(23),
            self.time_and_flags.get_bit(30),
            self.time_and_flags.get_bit(31),
        ]
    }

    /// The user data, split into eight groups of four bits.
    pub fn binary_groups(&self) -> [u8; 8] {
        let mut groups = [0_u8; 8];

        for (group_index, group) in groups.iter_mut().enumerate() {
            let first_bit = group_index * 4;
            *group = self.user_data.get_bits(first_bit .. first_bit + 4) as u8; // cast cannot fail, as these are 4 bits
        }

        groups
    }

    /// Read the time code, without validating.
    pub fn read<R: Read>(read: &mut R) -> Result<Self> {
        let time_and_flags = u32::read(read)?;
        let user_data = u32::read(read)?;
        Ok(TimeCode { time_and_flags, user_data })
    }
}


/// Read one attribute from the header.
/// Returns `Ok(None)` when the empty name at the end of the attribute list is found.
pub fn read(read: &mut impl Read) -> Result<Option<Attribute>> {
    let name = Text::read_null_terminated(read, "attribute name")?;
    if name.is_empty() { return Ok(None); }

    let kind = Text::read_null_terminated(read, "attribute type name")?;
    if kind.is_empty() {
        return Err(Error::UnknownAttributeType { attribute: name.to_string() });
    }

    let size = i32::read(read)?;
    log::trace!("attribute '{}' of type '{}' with {} bytes", name, kind, size);

    let value = AttributeValue::read(read, kind, size)?;
    Ok(Some(Attribute { name, value }))
}


impl AttributeValue {

    /// Read the value of the specified type name and declared size.
    /// Unknown type names are read as `Custom` bytes.
    pub fn read<R: Read>(read: &mut R, kind: Text, size: i32) -> Result<Self> {
        use self::AttributeValue::*;

        let kind_tag = AttributeKind::from_type_name(kind.bytes());
        let fixed = |read: &mut R, native_size, parse: fn(&mut &[u8]) -> Result<AttributeValue>| {
            read_fixed(read, &kind, size, native_size, parse)
        };

        Ok(match kind_tag {
            Some(AttributeKind::Box2I) => fixed(read, self::IntegerBounds::BYTE_SIZE, |bytes| Ok(IntegerBounds(self::IntegerBounds::read(bytes)?)))?,
            Some(AttributeKind::Box2F) => fixed(read, self::FloatRect::BYTE_SIZE, |bytes| Ok(FloatRect(self::FloatRect::read(bytes)?)))?,

            Some(AttributeKind::Int) => fixed(read, i32::BYTE_SIZE, |bytes| Ok(I32(i32::read(bytes)?)))?,
            Some(AttributeKind::Float) => fixed(read, f32::BYTE_SIZE, |bytes| Ok(F32(f32::read(bytes)?)))?,
            Some(AttributeKind::Double) => fixed(read, f64::BYTE_SIZE, |bytes| Ok(F64(f64::read(bytes)?)))?,

            Some(AttributeKind::Rational) => fixed(read, self::Rational::BYTE_SIZE, |bytes| Ok(Rational(self::Rational::read(bytes)?)))?,
            Some(AttributeKind::TimeCode) => fixed(read, self::TimeCode::BYTE_SIZE, |bytes| Ok(TimeCode(self::TimeCode::read(bytes)?)))?,

            Some(AttributeKind::V2I) => fixed(read, 2 * i32::BYTE_SIZE, |bytes| Ok(IntVec2(Vec2(i32::read(bytes)?, i32::read(bytes)?))))?,
            Some(AttributeKind::V2F) => fixed(read, 2 * f32::BYTE_SIZE, |bytes| Ok(FloatVec2(Vec2(f32::read(bytes)?, f32::read(bytes)?))))?,
            Some(AttributeKind::V3I) => fixed(read, 3 * i32::BYTE_SIZE, |bytes| Ok(IntVec3((i32::read(bytes)?, i32::read(bytes)?, i32::read(bytes)?))))?,
            Some(AttributeKind::V3F) => fixed(read, 3 * f32::BYTE_SIZE, |bytes| Ok(FloatVec3((f32::read(bytes)?, f32::read(bytes)?, f32::read(bytes)?))))?,

            Some(AttributeKind::Chromaticities) => fixed(read, self::Chromaticities::BYTE_SIZE, |bytes| Ok(Chromaticities(self::Chromaticities::read(bytes)?)))?,
            Some(AttributeKind::Compression) => fixed(read, self::Compression::BYTE_SIZE, |bytes| Ok(Compression(self::Compression::from_code(u8::read(bytes)?))))?,
            Some(AttributeKind::EnvironmentMap) => fixed(read, self::EnvironmentMap::BYTE_SIZE, |bytes| Ok(EnvironmentMap(self::EnvironmentMap::read(bytes)?)))?,
            Some(AttributeKind::KeyCode) => fixed(read, self::KeyCode::BYTE_SIZE, |bytes| Ok(KeyCode(self::KeyCode::read(bytes)?)))?,
            Some(AttributeKind::LineOrder) => fixed(read, self::LineOrder::BYTE_SIZE, |bytes| Ok(LineOrder(self::LineOrder::read(bytes)?)))?,
            Some(AttributeKind::TileDescription) => fixed(read, self::TileDescription::BYTE_SIZE, |bytes| Ok(TileDescription(self::TileDescription::read(bytes)?)))?,

            Some(AttributeKind::M33F) => fixed(read, self::Matrix3x3::BYTE_SIZE, |bytes| {
                let mut matrix = [0.0; 9];
                f32::read_slice(bytes, &mut matrix)?;
                Ok(Matrix3x3(matrix))
            })?,

            Some(AttributeKind::M44F) => fixed(read, self::Matrix4x4::BYTE_SIZE, |bytes| {
                let mut matrix = [0.0; 16];
                f32::read_slice(bytes, &mut matrix)?;
                Ok(Matrix4x4(matrix))
            })?,

            Some(AttributeKind::ChannelList) => ChannelList(self::ChannelList::read(read, &kind, size)?),
            Some(AttributeKind::Preview) => Preview(self::Preview::read(read, &kind, size)?),

            // the declared size is the text length, there is no length prefix
            Some(AttributeKind::String) => {
                let size = usize::try_from(size).map_err(|_| negative_size())?;
                Text(self::Text::read_sized(read, size)?)
            },

            Some(AttributeKind::StringVector) => {
                let size = usize::try_from(size).map_err(|_| negative_size())?;
                TextVector(self::Text::read_vec_of_i32_sized(read, &kind, size)?)
            },

            Some(AttributeKind::User) | None => {
                let size = usize::try_from(size).map_err(|_| negative_size())?;
                let bytes = u8::read_vec(read, size, 64 * 1024)?;
                Custom { kind, bytes }
            },
        })
    }

    /// The type tag of this value.
    pub fn kind(&self) -> AttributeKind {
        use self::AttributeValue::*;

        match *self {
            IntegerBounds(_) => AttributeKind::Box2I,
            FloatRect(_) => AttributeKind::Box2F,
            ChannelList(_) => AttributeKind::ChannelList,
            Chromaticities(_) => AttributeKind::Chromaticities,
            Compression(_) => AttributeKind::Compression,
            F64(_) => AttributeKind::Double,
            EnvironmentMap(_) => AttributeKind::EnvironmentMap,
            F32(_) => AttributeKind::Float,
            I32(_) => AttributeKind::Int,
            KeyCode(_) => AttributeKind::KeyCode,
            LineOrder(_) => AttributeKind::LineOrder,
            Matrix3x3(_) => AttributeKind::M33F,
            Matrix4x4(_) => AttributeKind::M44F,
            Preview(_) => AttributeKind::Preview,
            Rational(_) => AttributeKind::Rational,
            Text(_) => AttributeKind::String,
            TextVector(_) => AttributeKind::StringVector,
            TileDescription(_) => AttributeKind::TileDescription,
            TimeCode(_) => AttributeKind::TimeCode,
            IntVec2(_) => AttributeKind::V2I,
            FloatVec2(_) => AttributeKind::V2F,
            IntVec3(_) => AttributeKind::V3I,
            FloatVec3(_) => AttributeKind::V3F,
            Custom { .. } => AttributeKind::User,
        }
    }

    /// The type name of this value as it appeared in the file.
    pub fn type_name(&self) -> std::borrow::Cow<'_, str> {
        match self {
            AttributeValue::Custom { kind, .. } => kind.to_string().into(),
            other => other.kind().type_name().into(),
        }
    }
}


macro_rules! define_typed_getters {
    ( $( $(#[$meta: meta])* $getter: ident ( $variant: ident ) -> $result: ty as $kind: ident ),* ) => {
        impl AttributeValue {
            $(
                $(#[$meta])*
                /// Fails with a type mismatch error for any other type.
                pub fn $getter(&self) -> Result<$result> {
                    match self {
                        AttributeValue::$variant(value) => Ok(value.clone()),
                        other => Err(type_mismatch(AttributeKind::$kind, other)),
                    }
                }
            )*
        }
    };
}

define_typed_getters! {
    /// Return the value if this is a `box2i` attribute.
    to_box2i(IntegerBounds) -> IntegerBounds as Box2I,
    /// Return the value if this is a `box2f` attribute.
    to_box2f(FloatRect) -> FloatRect as Box2F,
    /// Return the value if this is a `chlist` attribute.
    to_channel_list(ChannelList) -> ChannelList as ChannelList,
    /// Return the value if this is a `chromaticities` attribute.
    to_chromaticities(Chromaticities) -> Chromaticities as Chromaticities,
    /// Return the value if this is a `compression` attribute.
    to_compression(Compression) -> Compression as Compression,
    /// Return the value if this is a `double` attribute.
    to_f64(F64) -> f64 as Double,
    /// Return the value if this is an `envmap` attribute.
    to_environment_map(EnvironmentMap) -> EnvironmentMap as EnvironmentMap,
    /// Return the value if this is a `float` attribute.
    to_f32(F32) -> f32 as Float,
    /// Return the value if this is an `int` attribute.
    to_i32(I32) -> i32 as Int,
    /// Return the value if this is a `keycode` attribute.
    to_key_code(KeyCode) -> KeyCode as KeyCode,
    /// Return the value if this is a `lineOrder` attribute.
    to_line_order(LineOrder) -> LineOrder as LineOrder,
    /// Return the value if this is an `m33f` attribute.
    to_m33f(Matrix3x3) -> Matrix3x3 as M33F,
    /// Return the value if this is an `m44f` attribute.
    to_m44f(Matrix4x4) -> Matrix4x4 as M44F,
    /// Return the value if this is a `preview` attribute.
    to_preview(Preview) -> Preview as Preview,
    /// Return the value if this is a `rational` attribute.
    to_rational(Rational) -> Rational as Rational,
    /// Return the value if this is a `string` attribute.
    to_text(Text) -> Text as String,
    /// Return the value if this is a `stringvector` attribute.
    to_text_vector(TextVector) -> Vec<Text> as StringVector,
    /// Return the value if this is a `tiledesc` attribute.
    to_tile_description(TileDescription) -> TileDescription as TileDescription,
    /// Return the value if this is a `timecode` attribute.
    to_time_code(TimeCode) -> TimeCode as TimeCode,
    /// Return the value if this is a `v2i` attribute.
    to_v2i(IntVec2) -> Vec2<i32> as V2I,
    /// Return the value if this is a `v2f` attribute.
    to_v2f(FloatVec2) -> Vec2<f32> as V2F,
    /// Return the value if this is a `v3i` attribute.
    to_v3i(IntVec3) -> (i32, i32, i32) as V3I,
    /// Return the value if this is a `v3f` attribute.
    to_v3f(FloatVec3) -> (f32, f32, f32) as V3F
}

impl AttributeValue {

    /// Return the type name and the raw bytes if this attribute has an unknown type.
    /// Fails with a type mismatch error for any known type.
    pub fn to_custom(&self) -> Result<(&Text, &[u8])> {
        match self {
            AttributeValue::Custom { kind, bytes } => Ok((kind, bytes.as_slice())),
            other => Err(type_mismatch(AttributeKind::User, other)),
        }
    }
}


/// Renders the type name followed by the value.
impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use self::AttributeValue::*;

        match self {
            IntegerBounds(value) => write!(f, "box2i [ {}, {} - {} {} ]", value.min.x(), value.min.y(), value.max.x(), value.max.y()),
            FloatRect(value) => write!(f, "box2f [ {}, {} - {} {} ]", value.min.x(), value.min.y(), value.max.x(), value.max.y()),
            ChannelList(_) => f.write_str("channel list"),

            Chromaticities(value) => write!(
                f, "chromaticities r[{}, {}] g[{}, {}] b[{}, {}] w[{}, {}]",
                value.red.x(), value.red.y(), value.green.x(), value.green.y(),
                value.blue.x(), value.blue.y(), value.white.x(), value.white.y()
            ),

            Compression(value) => write!(f, "compression 0x{:02X}", value.code()),
            F64(value) => write!(f, "double {}", value),

            EnvironmentMap(value) => write!(f, "envmap {}", match value {
                self::EnvironmentMap::LatitudeLongitude => "latlong",
                self::EnvironmentMap::Cube => "cube",
            }),

            F32(value) => write!(f, "float {}", value),
            I32(value) => write!(f, "int {}", value),

            KeyCode(value) => write!(
                f, "keycode mfgc {} film {} prefix {} count {} perf_off {} ppf {} ppc {}",
                value.film_manufacturer_code, value.film_type, value.film_roll_prefix,
                value.count, value.perforation_offset, value.perforations_per_frame,
                value.perforations_per_count
            ),

            LineOrder(value) => write!(f, "lineorder {} ({})", value.code(), value.name()),

            Matrix3x3(m) => write!(
                f, "m33f [ [{} {} {}] [{} {} {}] [{} {} {}] ]",
                m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7], m[8]
            ),

            Matrix4x4(m) => write!(
                f, "m44f [ [{} {} {} {}] [{} {} {} {}] [{} {} {} {}] [{} {} {} {}] ]",
                m[0], m[1], m[2], m[3], m[4], m[5], m[6], m[7],
                m[8], m[9], m[10], m[11], m[12], m[13], m[14], m[15]
            ),

            Preview(value) => write!(f, "preview {} x {}", value.size.width(), value.size.height()),

            Rational(value) => {
                write!(f, "rational {} / {}", value.numerator, value.denominator)?;

                if value.denominator != 0 {
                    write!(f, " ({})", value.numerator as f64 / value.denominator as f64)?;
                }

                Ok(())
            },

            Text(value) => write!(f, "'{}'", value),

            TextVector(values) => {
                f.write_str("stringvector [")?;

                for (index, value) in values.iter().enumerate() {
                    if index > 0 { f.write_str(",")?; }
                    write!(f, " '{}'", value)?;
                }

                f.write_str(" ]")
            },

            TileDescription(value) => write!(f, "tile {}", value),
            TimeCode(value) => write!(f, "timecode {} {}", value.time_and_flags, value.user_data),
            IntVec2(value) => write!(f, "v2i [ {}, {} ]", value.x(), value.y()),
            FloatVec2(value) => write!(f, "v2f [ {}, {} ]", value.x(), value.y()),
            IntVec3((x, y, z)) => write!(f, "v3i [ {}, {}, {} ]", x, y, z),
            FloatVec3((x, y, z)) => write!(f, "v3f [ {}, {}, {} ]", x, y, z),
            Custom { kind, bytes } => write!(f, "'{}' (size {})", kind, bytes.len()),
        }
    }
}
