use std::fmt;
use std::io::{self, Write};

use bzip2::write::BzEncoder;
use flate2::write::GzEncoder;
use xz2::write::XzEncoder;

use crate::error::{Error, Result};

/// Level used when none is configured.
pub const DEFAULT_LEVEL: u32 = 9;

/// xz always uses this preset; the configured level does not apply.
pub const XZ_PRESET: u32 = 6;

/// Compression applied on top of the TAR stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Codec {
    #[default]
    None,
    Gzip,
    Bzip2,
    Xz,
}

impl Codec {
    /// File name suffix after `.tar`, if any.
    pub fn extension(self) -> Option<&'static str> {
        match self {
            Codec::None => None,
            Codec::Gzip => Some("gz"),
            Codec::Bzip2 => Some("bz2"),
            Codec::Xz => Some("xz"),
        }
    }

    pub fn supports_level(self) -> bool {
        matches!(self, Codec::Gzip | Codec::Bzip2)
    }
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Codec::None => "none",
            Codec::Gzip => "gzip",
            Codec::Bzip2 => "bzip2",
            Codec::Xz => "xz",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CompressionSpec {
    pub codec: Codec,
    /// 1-9, only honoured by gzip and bzip2.
    pub level: Option<u32>,
}

impl CompressionSpec {
    pub fn new(codec: Codec) -> Self {
        Self { codec, level: None }
    }

    pub fn with_level(mut self, level: u32) -> Self {
        self.level = Some(level);
        self
    }

    pub fn validate(&self) -> Result<()> {
        match self.level {
            Some(level) if !(1..=9).contains(&level) => Err(Error::Config(format!(
                "compression level must be between 1 and 9, got {level}"
            ))),
            _ => Ok(()),
        }
    }

    /// Level actually handed to the encoder.
    pub fn effective_level(&self) -> Option<u32> {
        match self.codec {
            Codec::None => None,
            Codec::Xz => Some(XZ_PRESET),
            Codec::Gzip | Codec::Bzip2 => Some(self.level.unwrap_or(DEFAULT_LEVEL)),
        }
    }
}

/// A sink wrapped in the configured compression filter.
pub enum Encoder<W: Write> {
    Plain(W),
    Gzip(GzEncoder<W>),
    Bzip2(BzEncoder<W>),
    Xz(XzEncoder<W>),
}

impl<W: Write> Encoder<W> {
    pub fn new(sink: W, spec: &CompressionSpec) -> Self {
        let level = spec.effective_level().unwrap_or(DEFAULT_LEVEL);
        match spec.codec {
            Codec::None => Encoder::Plain(sink),
            Codec::Gzip => Encoder::Gzip(GzEncoder::new(sink, flate2::Compression::new(level))),
            Codec::Bzip2 => Encoder::Bzip2(BzEncoder::new(sink, bzip2::Compression::new(level))),
            Codec::Xz => Encoder::Xz(XzEncoder::new(sink, level)),
        }
    }

    /// Write the codec trailer and hand back the sink.
    pub fn finish(self) -> io::Result<W> {
        match self {
            Encoder::Plain(mut sink) => {
                sink.flush()?;
                Ok(sink)
            }
            Encoder::Gzip(enc) => enc.finish(),
            Encoder::Bzip2(enc) => enc.finish(),
            Encoder::Xz(enc) => enc.finish(),
        }
    }
}

impl<W: Write> Write for Encoder<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Encoder::Plain(w) => w.write(buf),
            Encoder::Gzip(w) => w.write(buf),
            Encoder::Bzip2(w) => w.write(buf),
            Encoder::Xz(w) => w.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Encoder::Plain(w) => w.flush(),
            Encoder::Gzip(w) => w.flush(),
            Encoder::Bzip2(w) => w.flush(),
            Encoder::Xz(w) => w.flush(),
        }
    }
}
