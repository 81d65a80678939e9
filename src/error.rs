
//! Error type definitions.

use std::borrow::Cow;
use std::convert::TryFrom;
use std::fmt;
use std::io::ErrorKind;

pub use std::io::Error as IoError;
pub use std::io::Result as IoResult;


/// A result that may contain an aces error.
pub type Result<T> = std::result::Result<T, Error>;

/// A result that, if ok, contains nothing, and otherwise contains an aces error.
pub type UnitResult = Result<()>;


/// Everything that can go wrong while opening a file, parsing its header
/// or extracting its pixels.
#[derive(Debug)]
pub enum Error {

    /// The caller passed an unusable argument,
    /// for example an empty file name or a destination buffer without bytes.
    InvalidArgument(Cow<'static, str>),

    /// The underlying byte source failed, for example while opening or seeking.
    Io(IoError),

    /// The first four bytes are not the container magic number.
    BadMagic(u32),

    /// The version word is neither the scan line nor the tiled version.
    UnsupportedVersion(u32),

    /// The host does not store integers in little-endian byte order.
    UnsupportedEndianness,

    /// A null-terminated name did not end within 31 bytes.
    NameTooLong {

        /// What kind of name was being read, for example "attribute name".
        kind: &'static str,

        /// The bytes that were read before giving up.
        prefix: String,
    },

    /// The declared byte size of an attribute does not fit its type.
    SizeMismatch {

        /// The type name found in the file.
        type_name: String,

        /// The byte size found in the file.
        declared: i32,

        /// The byte size the type actually requires.
        expected: usize,
    },

    /// The byte source ended early.
    TruncatedRead(Cow<'static, str>),

    /// An attribute has no type name.
    UnknownAttributeType {

        /// The name of the attribute without a type.
        attribute: String,
    },

    /// The header ended without these required attributes.
    /// Contains one entry per missing attribute, in the canonical attribute order.
    MissingRequiredAttributes(Vec<&'static str>),

    /// The compression code is not known.
    UnsupportedCompression(u8),

    /// The line order cannot be read, for example random y order.
    UnsupportedLineOrder(Cow<'static, str>),

    /// The tiling cannot be read, for example mip map levels.
    UnsupportedTiling(Cow<'static, str>),

    /// This part of the format is known, but no code exists to handle it yet.
    NotImplemented(Cow<'static, str>),

    /// A typed attribute getter was called on an attribute of another type.
    AttributeTypeMismatch {

        /// The type name the getter would return.
        expected: &'static str,

        /// The type name of the stored attribute.
        found: String,
    },

    /// The contents of the file are invalid.
    Invalid(Cow<'static, str>),
}


impl Error {

    /// Create an error of the variant `Invalid`.
    pub(crate) fn invalid(message: impl Into<Cow<'static, str>>) -> Self {
        Error::Invalid(message.into())
    }

    /// Create an error of the variant `InvalidArgument`.
    pub(crate) fn invalid_argument(message: impl Into<Cow<'static, str>>) -> Self {
        Error::InvalidArgument(message.into())
    }

    /// Create an error of the variant `NotImplemented`.
    pub(crate) fn not_implemented(message: impl Into<Cow<'static, str>>) -> Self {
        Error::NotImplemented(message.into())
    }

    /// The lines that should reach an error sink for this error.
    /// A missing required attribute list is itemized, one line per attribute,
    /// followed by the aggregate count.
    pub fn report_lines(&self) -> Vec<String> {
        match self {
            Error::MissingRequiredAttributes(names) => {
                names.iter()
                    .map(|name| format!("Missing required attribute '{}'", name))
                    .chain(std::iter::once(self.to_string()))
                    .collect()
            },

            other => vec![ other.to_string() ],
        }
    }
}


/// Enable using the `?` operator on `std::io::Result`.
impl From<IoError> for Error {
    fn from(error: IoError) -> Self {
        if error.kind() == ErrorKind::UnexpectedEof {
            Error::TruncatedRead(Cow::Borrowed("unexpected end of file"))
        }
        else {
            Error::Io(error)
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidArgument(message) => write!(formatter, "invalid argument: {}", message),
            Error::Io(error) => error.fmt(formatter),
            Error::BadMagic(magic) => write!(formatter, "magic number mismatch, expected {}, found {}", crate::meta::magic_number::VALUE, magic),
            Error::UnsupportedVersion(version) => write!(formatter, "unsupported version 0x{:x}, only scan line (0x2) and tiled (0x202) files can be read", version),
            Error::UnsupportedEndianness => formatter.write_str("big-endian hosts are not supported"),
            Error::NameTooLong { kind, prefix } => write!(formatter, "{} '{}...' is longer than 31 characters", kind, prefix),
            Error::SizeMismatch { type_name, declared, expected } => write!(
                formatter, "attribute of type '{}' declares {} bytes, expected {}", type_name, declared, expected
            ),
            Error::TruncatedRead(message) => write!(formatter, "truncated read: {}", message),
            Error::UnknownAttributeType { attribute } => write!(formatter, "attribute '{}' has an unknown type, unable to parse file", attribute),
            Error::MissingRequiredAttributes(names) => write!(formatter, "{} required attribute(s) missing", names.len()),
            Error::UnsupportedCompression(code) => write!(formatter, "unknown compression type {}", code),
            Error::UnsupportedLineOrder(message) => write!(formatter, "unsupported line order: {}", message),
            Error::UnsupportedTiling(message) => write!(formatter, "unsupported tiling: {}", message),
            Error::NotImplemented(message) => write!(formatter, "not yet implemented: {}", message),
            Error::AttributeTypeMismatch { expected, found } => write!(
                formatter, "attribute type mismatch, requested '{}' but attribute is of type '{}'", expected, found
            ),
            Error::Invalid(message) => write!(formatter, "invalid file content: {}", message),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(error) => Some(error),
            _ => None,
        }
    }
}


/// Convert a declared attribute size to `usize`, returning an error for negative values.
#[inline]
pub(crate) fn i32_to_usize(value: i32, error_message: &'static str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::invalid(error_message))
}

/// Convert a size from the file to `usize`, returning an error if it does not fit.
#[inline]
pub(crate) fn u64_to_usize(value: u64, error_message: &'static str) -> Result<usize> {
    usize::try_from(value).map_err(|_| Error::invalid(error_message))
}


#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn unexpected_eof_is_truncated_read(){
        let error = Error::from(IoError::new(ErrorKind::UnexpectedEof, "eof"));
        assert!(matches!(error, Error::TruncatedRead(_)));

        let error = Error::from(IoError::new(ErrorKind::PermissionDenied, "denied"));
        assert!(matches!(error, Error::Io(_)));
    }

    #[test]
    fn missing_attributes_are_itemized(){
        let error = Error::MissingRequiredAttributes(vec![ "channels", "lineOrder" ]);

        assert_eq!(error.report_lines(), vec![
            "Missing required attribute 'channels'".to_string(),
            "Missing required attribute 'lineOrder'".to_string(),
            "2 required attribute(s) missing".to_string(),
        ]);
    }

    #[test]
    fn negative_sizes_are_invalid(){
        assert_eq!(i32_to_usize(7, "size").unwrap(), 7);
        assert!(matches!(i32_to_usize(-1, "size"), Err(Error::Invalid(_))));
    }
}
