use std::io::{self, Read, Seek, SeekFrom, Write};

use bytes::Bytes;

/// Positioned reads over a seekable handle.
///
/// Every read repositions the cursor first, so callers never depend on where
/// a previous operation left it.
pub trait ReadAt {
    /// Read exactly `len` bytes starting at `offset`.
    ///
    /// Returns `UnexpectedEof` if the file ends before `len` bytes are read.
    fn read_exact_at(&mut self, offset: u64, len: usize) -> io::Result<Bytes>;

    /// Total length of the underlying file in bytes.
    fn byte_len(&mut self) -> io::Result<u64>;
}

impl<T: Read + Seek + ?Sized> ReadAt for T {
    fn read_exact_at(&mut self, offset: u64, len: usize) -> io::Result<Bytes> {
        self.seek(SeekFrom::Start(offset))?;
        let mut buf = vec![0u8; len];
        self.read_exact(&mut buf)?;
        Ok(Bytes::from(buf))
    }

    fn byte_len(&mut self) -> io::Result<u64> {
        self.seek(SeekFrom::End(0))
    }
}

/// Positioned writes over a seekable handle.
pub trait WriteAt {
    /// Write all of `bytes` starting at `offset`.
    fn write_all_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()>;
}

impl<T: Write + Seek + ?Sized> WriteAt for T {
    fn write_all_at(&mut self, offset: u64, bytes: &[u8]) -> io::Result<()> {
        self.seek(SeekFrom::Start(offset))?;
        self.write_all(bytes)
    }
}
