#![allow(dead_code)]

use std::io::{Read, Write};
use std::path::{Path, PathBuf};

use bzip2::write::BzEncoder;
use flate2::write::DeflateEncoder;
use zip2tar::Codec;

/// 2015-06-14 13:45:30 in MS-DOS date/time words
pub const DOS_DATE: u16 = ((2015 - 1980) << 9) | (6 << 5) | 14;
pub const DOS_TIME: u16 = (13 << 11) | (45 << 5) | (30 / 2);

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Stored,
    Deflate,
    Bzip2,
}

pub struct ZipEntrySpec {
    /// Raw name bytes, not necessarily UTF-8.
    pub name: Vec<u8>,
    pub content: Vec<u8>,
    pub method: Method,
    pub dos_date: u16,
    pub dos_time: u16,
    pub crc_override: Option<u32>,
    /// Uncompressed size to declare instead of the real one.
    pub size_override: Option<u32>,
}

impl ZipEntrySpec {
    pub fn new(name: impl AsRef<[u8]>, content: &[u8]) -> Self {
        Self {
            name: name.as_ref().to_vec(),
            content: content.to_vec(),
            method: Method::Stored,
            dos_date: DOS_DATE,
            dos_time: DOS_TIME,
            crc_override: None,
            size_override: None,
        }
    }
}

/// Minimal ZIP writer for fixtures.
#[derive(Default)]
pub struct ZipBuilder {
    data: Vec<u8>,
    central: Vec<u8>,
    count: u16,
    comment: Vec<u8>,
    zip64: bool,
}

impl ZipBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn file(self, name: impl AsRef<[u8]>, content: &[u8]) -> Self {
        self.entry(ZipEntrySpec::new(name, content))
    }

    pub fn deflated(self, name: &str, content: &[u8]) -> Self {
        self.entry(ZipEntrySpec {
            method: Method::Deflate,
            ..ZipEntrySpec::new(name, content)
        })
    }

    pub fn dir(self, name: &str) -> Self {
        assert!(name.ends_with('/'));
        self.entry(ZipEntrySpec::new(name, b""))
    }

    pub fn bzip2(self, name: &str, content: &[u8]) -> Self {
        self.entry(ZipEntrySpec {
            method: Method::Bzip2,
            ..ZipEntrySpec::new(name, content)
        })
    }

    /// Saturate the 32-bit size, offset and count fields and carry the real
    /// values in ZIP64 records, like writers do for archives over 4 GiB.
    pub fn zip64(mut self) -> Self {
        self.zip64 = true;
        self
    }

    pub fn comment(mut self, comment: &[u8]) -> Self {
        self.comment = comment.to_vec();
        self
    }

    pub fn entry(mut self, spec: ZipEntrySpec) -> Self {
        let crc = spec.crc_override.unwrap_or_else(|| crc32fast::hash(&spec.content));
        let (method, payload) = match spec.method {
            Method::Stored => (0u16, spec.content.clone()),
            Method::Deflate => {
                let mut enc = DeflateEncoder::new(Vec::new(), flate2::Compression::default());
                enc.write_all(&spec.content).unwrap();
                (8u16, enc.finish().unwrap())
            }
            Method::Bzip2 => {
                let mut enc = BzEncoder::new(Vec::new(), bzip2::Compression::default());
                enc.write_all(&spec.content).unwrap();
                (12u16, enc.finish().unwrap())
            }
        };
        let offset = self.data.len() as u32;
        let name = spec.name.as_slice();
        let size = spec.size_override.unwrap_or(spec.content.len() as u32);

        self.data.extend_from_slice(b"PK\x03\x04");
        self.data.extend_from_slice(&20u16.to_le_bytes());
        self.data.extend_from_slice(&0u16.to_le_bytes());
        self.data.extend_from_slice(&method.to_le_bytes());
        self.data.extend_from_slice(&spec.dos_time.to_le_bytes());
        self.data.extend_from_slice(&spec.dos_date.to_le_bytes());
        self.data.extend_from_slice(&crc.to_le_bytes());
        self.data.extend_from_slice(&(payload.len() as u32).to_le_bytes());
        self.data.extend_from_slice(&size.to_le_bytes());
        self.data.extend_from_slice(&(name.len() as u16).to_le_bytes());
        self.data.extend_from_slice(&0u16.to_le_bytes());
        self.data.extend_from_slice(name);
        self.data.extend_from_slice(&payload);

        let external_attrs: u32 = if name.ends_with(b"/") {
            (0o040755 << 16) | 0x10
        } else {
            0o100644 << 16
        };

        self.central.extend_from_slice(b"PK\x01\x02");
        self.central.extend_from_slice(&0x031Eu16.to_le_bytes());
        self.central.extend_from_slice(&20u16.to_le_bytes());
        self.central.extend_from_slice(&0u16.to_le_bytes());
        self.central.extend_from_slice(&method.to_le_bytes());
        self.central.extend_from_slice(&spec.dos_time.to_le_bytes());
        self.central.extend_from_slice(&spec.dos_date.to_le_bytes());
        self.central.extend_from_slice(&crc.to_le_bytes());
        let mut extra = Vec::new();
        if self.zip64 {
            extra.extend_from_slice(&0x0001u16.to_le_bytes());
            extra.extend_from_slice(&24u16.to_le_bytes());
            extra.extend_from_slice(&u64::from(size).to_le_bytes());
            extra.extend_from_slice(&(payload.len() as u64).to_le_bytes());
            extra.extend_from_slice(&u64::from(offset).to_le_bytes());
        }
        let saturate = |v: u32| if self.zip64 { u32::MAX } else { v };

        self.central.extend_from_slice(&saturate(payload.len() as u32).to_le_bytes());
        self.central.extend_from_slice(&saturate(size).to_le_bytes());
        self.central.extend_from_slice(&(name.len() as u16).to_le_bytes());
        self.central.extend_from_slice(&(extra.len() as u16).to_le_bytes());
        self.central.extend_from_slice(&0u16.to_le_bytes()); // comment
        self.central.extend_from_slice(&0u16.to_le_bytes()); // disk
        self.central.extend_from_slice(&0u16.to_le_bytes()); // internal attrs
        self.central.extend_from_slice(&external_attrs.to_le_bytes());
        self.central.extend_from_slice(&saturate(offset).to_le_bytes());
        self.central.extend_from_slice(name);
        self.central.extend_from_slice(&extra);

        self.count += 1;
        self
    }

    pub fn finish(self) -> Vec<u8> {
        let mut out = self.data;
        let cd_offset = out.len() as u64;
        let cd_size = self.central.len() as u64;
        out.extend_from_slice(&self.central);

        if self.zip64 {
            let eocd64_offset = out.len() as u64;
            out.extend_from_slice(b"PK\x06\x06");
            out.extend_from_slice(&44u64.to_le_bytes());
            out.extend_from_slice(&45u16.to_le_bytes()); // made by
            out.extend_from_slice(&45u16.to_le_bytes()); // needed
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&u64::from(self.count).to_le_bytes());
            out.extend_from_slice(&u64::from(self.count).to_le_bytes());
            out.extend_from_slice(&cd_size.to_le_bytes());
            out.extend_from_slice(&cd_offset.to_le_bytes());

            out.extend_from_slice(b"PK\x06\x07");
            out.extend_from_slice(&0u32.to_le_bytes());
            out.extend_from_slice(&eocd64_offset.to_le_bytes());
            out.extend_from_slice(&1u32.to_le_bytes());
        }

        let (count, cd_size, cd_offset) = if self.zip64 {
            (u16::MAX, u32::MAX, u32::MAX)
        } else {
            (self.count, cd_size as u32, cd_offset as u32)
        };
        out.extend_from_slice(b"PK\x05\x06");
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&0u16.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&count.to_le_bytes());
        out.extend_from_slice(&cd_size.to_le_bytes());
        out.extend_from_slice(&cd_offset.to_le_bytes());
        out.extend_from_slice(&(self.comment.len() as u16).to_le_bytes());
        out.extend_from_slice(&self.comment);
        out
    }
}

/// `abc`, `def`, `ghi`, each holding its own name.
pub fn abc_zip() -> Vec<u8> {
    ZipBuilder::new()
        .file("abc", b"abc")
        .file("def", b"def")
        .file("ghi", b"ghi")
        .finish()
}

pub fn write_zip(dir: &Path, name: &str, bytes: &[u8]) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, bytes).unwrap();
    path
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TarEntry {
    /// Lossy decoding of `raw_name`.
    pub name: String,
    pub raw_name: Vec<u8>,
    pub size: u64,
    pub mtime: u64,
    pub mode: u32,
    pub is_dir: bool,
    pub content: Vec<u8>,
}

fn decoder(path: &Path, codec: Codec) -> Box<dyn Read> {
    let file = std::fs::File::open(path).unwrap();
    match codec {
        Codec::None => Box::new(file),
        Codec::Gzip => Box::new(flate2::read::GzDecoder::new(file)),
        Codec::Bzip2 => Box::new(bzip2::read::BzDecoder::new(file)),
        Codec::Xz => Box::new(xz2::read::XzDecoder::new(file)),
    }
}

/// Every entry of a (compressed) TAR file, in stream order.
pub fn read_tar(path: &Path, codec: Codec) -> Vec<TarEntry> {
    let mut archive = tar::Archive::new(decoder(path, codec));
    archive
        .entries()
        .unwrap()
        .map(|entry| {
            let mut entry = entry.unwrap();
            let header = entry.header().clone();
            let raw_name = entry.path_bytes().into_owned();
            let name = String::from_utf8_lossy(&raw_name).into_owned();
            let mut content = Vec::new();
            entry.read_to_end(&mut content).unwrap();
            TarEntry {
                name,
                raw_name,
                size: header.size().unwrap(),
                mtime: header.mtime().unwrap(),
                mode: header.mode().unwrap(),
                is_dir: header.entry_type().is_dir(),
                content,
            }
        })
        .collect()
}

pub fn names(entries: &[TarEntry]) -> Vec<&str> {
    entries.iter().map(|e| e.name.as_str()).collect()
}

/// Files left in `dir`, sorted.
pub fn dir_listing(dir: &Path) -> Vec<String> {
    let mut listing: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    listing.sort();
    listing
}
