use crate::common::errors::{Error, Result};
use crate::source::ByteSource;

/// In-memory byte source.
///
/// Wraps anything dereferencing to a byte slice; used for parsing block
/// payloads as sub-streams and for tests.
pub struct BufferSource<B> {
    data: B,
}

impl<B: AsRef<[u8]>> BufferSource<B> {
    pub fn new(data: B) -> Self {
        Self { data }
    }
}

impl<B: AsRef<[u8]> + Send> ByteSource for BufferSource<B> {
    fn read(&mut self, buf: &mut [u8], pos: &mut u64) -> Result<()> {
        let data = self.data.as_ref();
        let n = buf.len() as u64;
        if *pos + n > data.len() as u64 {
            return Err(Error::OutOfRange {
                pos: *pos,
                requested: n,
                length: data.len() as u64,
            });
        }

        let start = *pos as usize;
        buf.copy_from_slice(&data[start..start + buf.len()]);
        *pos += n;
        Ok(())
    }

    fn length(&mut self) -> Result<u64> {
        Ok(self.data.as_ref().len() as u64)
    }
}
