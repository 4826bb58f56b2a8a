//! Forward-only readers over entry data.

use std::io::{self, Read};

use crate::error::Error;
use crate::io::ReadAt;

/// A bounded window `[pos, end)` of a random access source.
pub(crate) struct SectionReader<'a, R: ReadAt> {
    source: &'a R,
    pos: u64,
    end: u64,
}

impl<'a, R: ReadAt> SectionReader<'a, R> {
    pub(crate) fn new(source: &'a R, offset: u64, len: u64) -> Self {
        Self {
            source,
            pos: offset,
            end: offset.saturating_add(len),
        }
    }
}

impl<R: ReadAt> Read for SectionReader<'_, R> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.pos >= self.end || buf.is_empty() {
            return Ok(0);
        }

        let want = buf.len().min(usize::try_from(self.end - self.pos).unwrap_or(usize::MAX));
        let n = self
            .source
            .read_at(self.pos, &mut buf[..want])
            .map_err(Error::into_io)?;
        if n == 0 {
            return Err(Error::corrupt(format!(
                "unexpected end of archive at offset {}",
                self.pos
            ))
            .into_io());
        }
        self.pos += n as u64;
        Ok(n)
    }
}

/// Decoded content of one entry.
///
/// Yields exactly the declared uncompressed size. Running short, running
/// long or a CRC-32 mismatch fails the read with [`Error::ArchiveCorrupt`].
pub struct EntryReader<'a> {
    inner: Box<dyn Read + 'a>,
    name: String,
    expected_size: u64,
    expected_crc: u32,
    hasher: crc32fast::Hasher,
    produced: u64,
    verified: bool,
}

impl<'a> EntryReader<'a> {
    pub(crate) fn new(inner: Box<dyn Read + 'a>, name: &str, size: u64, crc32: u32) -> Self {
        Self {
            inner,
            name: name.to_string(),
            expected_size: size,
            expected_crc: crc32,
            hasher: crc32fast::Hasher::new(),
            produced: 0,
            verified: false,
        }
    }

    fn corrupt(&self, detail: String) -> io::Error {
        Error::corrupt(format!("entry `{}`: {}", self.name, detail)).into_io()
    }

    /// Decoder failures mean bad compressed data; our own errors pass through.
    fn classify(&self, err: io::Error) -> io::Error {
        if err.get_ref().is_some_and(|inner| inner.is::<Error>()) {
            err
        } else {
            self.corrupt(format!("cannot decode data: {err}"))
        }
    }

    fn verify(&mut self) -> io::Result<()> {
        let mut extra = [0u8; 1];
        loop {
            match self.inner.read(&mut extra) {
                Ok(0) => break,
                Ok(_) => {
                    return Err(self.corrupt(format!(
                        "more data than the declared {} bytes",
                        self.expected_size
                    )));
                }
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(self.classify(e)),
            }
        }

        let crc = self.hasher.clone().finalize();
        if crc != self.expected_crc {
            return Err(self.corrupt(format!(
                "CRC-32 mismatch (expected {:08x}, got {:08x})",
                self.expected_crc, crc
            )));
        }

        self.verified = true;
        Ok(())
    }
}

impl Read for EntryReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        if self.verified || buf.is_empty() {
            return Ok(0);
        }

        let remaining = self.expected_size - self.produced;
        if remaining == 0 {
            self.verify()?;
            return Ok(0);
        }

        let limit = buf.len().min(usize::try_from(remaining).unwrap_or(usize::MAX));
        let n = match self.inner.read(&mut buf[..limit]) {
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => return Err(e),
            Err(e) => return Err(self.classify(e)),
        };
        if n == 0 {
            return Err(self.corrupt(format!(
                "truncated: {} of {} bytes",
                self.produced, self.expected_size
            )));
        }

        self.hasher.update(&buf[..n]);
        self.produced += n as u64;
        Ok(n)
    }
}
