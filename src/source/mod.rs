//! Byte sources the EBML reader parses from.
//!
//! A [`ByteSource`] is a random-access read seam: an in-memory buffer, a
//! local file, or a remote HTTP resource fetched with range requests. The
//! decoder holds its source as `Box<dyn ByteSource>` and drives it from the
//! prefetch worker only.

pub mod buffer;
pub mod file;
pub mod http;

pub use buffer::BufferSource;
pub use file::FileSource;
pub use http::HttpSource;

use crate::common::errors::Result;

/// Random-access byte input.
pub trait ByteSource: Send {
    /// Fill `buf` from offset `*pos`, advancing `*pos` by `buf.len()` on
    /// success.
    ///
    /// Fails with [`Error::OutOfRange`](crate::Error::OutOfRange) when the
    /// read extends past the end of the source, or an I/O variant when the
    /// underlying transport fails. `*pos` is untouched on failure.
    fn read(&mut self, buf: &mut [u8], pos: &mut u64) -> Result<()>;

    /// Total number of bytes available.
    ///
    /// May require a network round trip for remote sources.
    fn length(&mut self) -> Result<u64>;
}

impl<S: ByteSource + ?Sized> ByteSource for Box<S> {
    fn read(&mut self, buf: &mut [u8], pos: &mut u64) -> Result<()> {
        (**self).read(buf, pos)
    }

    fn length(&mut self) -> Result<u64> {
        (**self).length()
    }
}
