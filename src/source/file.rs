use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;

use crate::common::errors::{Error, Result};
use crate::source::ByteSource;

/// Read-only local file source.
///
/// Length is taken from metadata at open; short reads are errors.
pub struct FileSource {
    file: File,
    length: u64,
}

impl FileSource {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path)?;
        let length = file.metadata()?.len();
        Ok(Self { file, length })
    }
}

impl ByteSource for FileSource {
    fn read(&mut self, buf: &mut [u8], pos: &mut u64) -> Result<()> {
        let n = buf.len() as u64;
        if *pos + n > self.length {
            return Err(Error::OutOfRange {
                pos: *pos,
                requested: n,
                length: self.length,
            });
        }

        self.file.seek(SeekFrom::Start(*pos))?;
        self.file.read_exact(buf)?;
        *pos += n;
        Ok(())
    }

    fn length(&mut self) -> Result<u64> {
        Ok(self.length)
    }
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use super::*;

    #[test]
    fn read_window() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"abcdefgh").unwrap();

        let mut source = FileSource::open(tmp.path()).unwrap();
        assert_eq!(source.length().unwrap(), 8);

        let mut pos = 2;
        let mut buf = [0u8; 4];
        source.read(&mut buf, &mut pos).unwrap();
        assert_eq!(&buf, b"cdef");
        assert_eq!(pos, 6);
    }

    #[test]
    fn read_past_end() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        tmp.write_all(b"abc").unwrap();

        let mut source = FileSource::open(tmp.path()).unwrap();
        let mut pos = 1;
        let mut buf = [0u8; 4];
        assert!(matches!(
            source.read(&mut buf, &mut pos),
            Err(Error::OutOfRange { .. })
        ));
    }
}
