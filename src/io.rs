
//! Specialized binary input.
//! Uses the error handling for this crate.

pub use ::std::io::{Read, Seek, SeekFrom};
use lebe::prelude::*;
use crate::error::{Error, Result, UnitResult, IoResult};


/// Fail early on hosts that do not store integers in little-endian order.
pub fn check_host_endianness() -> UnitResult {
    if cfg!(target_endian = "big") { Err(Error::UnsupportedEndianness) }
    else { Ok(()) }
}

/// Skip reading uninteresting bytes without allocating.
#[inline]
pub fn skip_bytes(read: &mut impl Read, count: usize) -> IoResult<()> {
    let skipped = std::io::copy(
        &mut read.by_ref().take(count as u64),
        &mut std::io::sink()
    )?;

    if skipped < count as u64 {
        return Err(std::io::ErrorKind::UnexpectedEof.into());
    }

    Ok(())
}


/// Keep track of what byte we are at.
/// Some byte sources cannot report their position reliably,
/// so the position is counted here instead of asking the source.
#[derive(Debug)]
pub struct Tracking<T> {

    /// Do not expose to prevent seeking without updating position
    inner: T,

    position: usize,
}

impl<T: Read> Read for Tracking<T> {
    fn read(&mut self, buffer: &mut [u8]) -> std::io::Result<usize> {
        let count = self.inner.read(buffer)?;
        self.position += count;
        Ok(count)
    }
}

impl<T> Tracking<T> {

    /// The inner source must never be seeked directly,
    /// but only through this `Tracking` instance.
    pub fn new(inner: T) -> Self {
        Tracking { inner, position: 0 }
    }

    /// Current number of bytes read.
    pub fn byte_position(&self) -> usize {
        self.position
    }
}

impl<T: Read + Seek> Tracking<T> {

    /// Set the reader to the specified byte position.
    /// If it is only a couple of bytes forward, no seek call is performed.
    pub fn seek_read_to(&mut self, target_position: usize) -> std::io::Result<()> {
        let delta = target_position as i64 - self.position as i64;

        if delta > 0 && delta < 16 {
            skip_bytes(self, delta as usize)?; // updates the position while reading
        }
        else if delta != 0 {
            self.inner.seek(SeekFrom::Start(target_position as u64))?;
            self.position = target_position;
        }

        Ok(())
    }
}


/// A byte source assembled from two caller-provided functions.
/// Implements `Read` and `Seek`, so it can be opened like any file.
pub struct CallbackStream<R, S> {
    read: R,
    seek: S,
}

impl<R, S> CallbackStream<R, S>
    where R: FnMut(&mut [u8]) -> IoResult<usize>, S: FnMut(SeekFrom) -> IoResult<u64>
{
    /// Both functions behave like their `std::io` counterparts:
    /// `read` returns the number of bytes written into the buffer, zero at the end of the stream,
    /// and `seek` returns the new absolute position.
    pub fn new(read: R, seek: S) -> Self {
        CallbackStream { read, seek }
    }
}

impl<R, S> Read for CallbackStream<R, S>
    where R: FnMut(&mut [u8]) -> IoResult<usize>
{
    fn read(&mut self, buffer: &mut [u8]) -> IoResult<usize> {
        (self.read)(buffer)
    }
}

impl<R, S> Seek for CallbackStream<R, S>
    where S: FnMut(SeekFrom) -> IoResult<u64>
{
    fn seek(&mut self, position: SeekFrom) -> IoResult<u64> {
        (self.seek)(position)
    }
}

impl<R, S> std::fmt::Debug for CallbackStream<R, S> {
    fn fmt(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        formatter.write_str("CallbackStream")
    }
}


/// Generic trait that defines common binary operations such as reading for this type.
pub trait Data: Sized + Default + Clone {

    /// Number of bytes this value consumes in a file.
    const BYTE_SIZE: usize = ::std::mem::size_of::<Self>();

    /// Read a value of type `Self`.
    fn read(read: &mut impl Read) -> Result<Self>;

    /// Read as many values of type `Self` as fit into the specified slice.
    /// If the slice cannot be filled completely, returns `Error::TruncatedRead`.
    fn read_slice(read: &mut impl Read, slice: &mut[Self]) -> UnitResult;

    /// Read as many values of type `Self` as specified with `data_size`.
    ///
    /// This method will not allocate more memory than `soft_max` at once,
    /// so that a corrupt size cannot allocate memory before the end of the file is reached.
    #[inline]
    fn read_vec(read: &mut impl Read, data_size: usize, soft_max: usize) -> Result<Vec<Self>> {
        let mut vec = Vec::new();
        Self::read_into_vec(read, &mut vec, data_size, soft_max)?;
        Ok(vec)
    }

    /// Read as many values of type `Self` as specified with `data_size` into the provided vector.
    /// This method will not allocate more memory than `soft_max` at once.
    #[inline]
    fn read_into_vec(read: &mut impl Read, data: &mut Vec<Self>, data_size: usize, soft_max: usize) -> UnitResult {
        let soft_max = soft_max.max(1);
        let end = data.len() + data_size;

        // most of the time, this loop will run only once
        while data.len() < end {
            let chunk_start = data.len();
            let chunk_end = (chunk_start + soft_max).min(end);

            data.resize(chunk_end, Self::default());
            Self::read_slice(read, &mut data[chunk_start .. chunk_end])?;
        }

        Ok(())
    }
}


macro_rules! implement_data_for_primitive {
    ($kind: ident) => {
        impl Data for $kind {
            #[inline]
            fn read(read: &mut impl Read) -> Result<Self> {
                Ok(read.read_from_little_endian()?)
            }

            #[inline]
            fn read_slice(read: &mut impl Read, slice: &mut [Self]) -> UnitResult {
                read.read_from_little_endian_into(slice)?;
                Ok(())
            }
        }
    };
}

implement_data_for_primitive!(u8);
implement_data_for_primitive!(u16);
implement_data_for_primitive!(u32);
implement_data_for_primitive!(i32);
implement_data_for_primitive!(u64);
implement_data_for_primitive!(f32);
implement_data_for_primitive!(f64);
