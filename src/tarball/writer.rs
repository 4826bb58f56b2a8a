//! TAR framing over a (compressed) sink.

use std::io::{self, Read, Write};

use tar::{EntryType, Header};

use super::compression::{CompressionSpec, Encoder};
use crate::checksum::ChecksumManifest;
use crate::error::{Error, Result};

/// Name given to GNU long-name records.
const GNU_LONGLINK: &[u8] = b"././@LongLink";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
}

/// One entry ready to be serialized.
pub struct OutputEntry<'a> {
    /// Written to the header byte for byte; no encoding is assumed.
    pub name: &'a [u8],
    pub size: u64,
    pub kind: EntryKind,
    /// Seconds since the epoch; `None` is written as zero.
    pub mtime: Option<u64>,
    pub content: &'a mut dyn Read,
}

/// Serializes entries as a TAR stream into a compressed sink.
pub struct ArchiveWriter<W: Write> {
    builder: tar::Builder<Encoder<W>>,
    reserved_name: Option<Vec<u8>>,
    entries: u64,
    content_bytes: u64,
}

impl<W: Write> ArchiveWriter<W> {
    /// Wrap `sink` in the codec of `compression` and a TAR builder.
    ///
    /// # Arguments
    ///
    /// * `sink` - Destination of the (compressed) TAR stream
    /// * `compression` - Codec and level for the stream
    /// * `reserved_name` - Manifest file name, which no entry may use
    pub fn new(sink: W, compression: &CompressionSpec, reserved_name: Option<Vec<u8>>) -> Self {
        Self {
            builder: tar::Builder::new(Encoder::new(sink, compression)),
            reserved_name,
            entries: 0,
            content_bytes: 0,
        }
    }

    /// Append one entry: header, content and block padding.
    ///
    /// The content must yield exactly `entry.size` bytes; the ZIP side
    /// guarantees that for converted entries.
    ///
    /// # Errors
    ///
    /// * [`Error::NameCollision`] if the name is the reserved manifest name
    /// * Whatever reading `entry.content` fails with, typically
    ///   [`Error::ArchiveCorrupt`]
    /// * [`Error::Io`] if the sink cannot be written
    pub fn write_entry(&mut self, entry: OutputEntry<'_>) -> Result<()> {
        let display = String::from_utf8_lossy(entry.name);
        if self.reserved_name.as_deref() == Some(entry.name) {
            return Err(Error::NameCollision(display.into_owned()));
        }

        let header = entry_header(entry.kind, entry.size, entry.mtime);
        self.append_named(header, entry.name, entry.content)
            .map_err(|err| Error::from(err).context(format_args!("writing `{display}`")))?;

        self.entries += 1;
        self.content_bytes += entry.size;
        Ok(())
    }

    /// Entries appended so far, not counting the manifest.
    pub fn entries_written(&self) -> u64 {
        self.entries
    }

    /// Sum of the declared sizes of those entries.
    pub fn content_bytes(&self) -> u64 {
        self.content_bytes
    }

    /// Append the manifest (when it has lines), terminate the archive and
    /// the compression stream, and return the sink.
    pub fn finish(mut self, manifest: Option<&ChecksumManifest>) -> Result<W> {
        if let Some(manifest) = manifest.filter(|m| !m.is_empty()) {
            let body = manifest.finalize();
            let header = entry_header(EntryKind::File, body.len() as u64, None);
            self.append_named(header, manifest.file_name().as_bytes(), &mut body.as_slice())?;
            tracing::debug!(
                name = manifest.file_name(),
                lines = manifest.len(),
                "wrote checksum manifest"
            );
        }

        let encoder = self.builder.into_inner()?;
        Ok(encoder.finish()?)
    }

    /// Write `header` under `name` byte for byte, using a GNU long-name
    /// record when the name does not fit the 100 byte field.
    fn append_named(&mut self, mut header: Header, bytes: &[u8], data: &mut dyn Read) -> io::Result<()> {
        let field_len = header.as_old().name.len();

        if bytes.len() > field_len {
            let mut long = entry_header(EntryKind::File, bytes.len() as u64 + 1, None);
            long.set_entry_type(EntryType::GNULongName);
            long.as_old_mut().name[..GNU_LONGLINK.len()].copy_from_slice(GNU_LONGLINK);
            long.set_cksum();
            self.builder.append(&long, bytes.chain(&[0u8][..]))?;
        }

        let stored = &bytes[..bytes.len().min(field_len)];
        header.as_old_mut().name[..stored.len()].copy_from_slice(stored);
        header.set_cksum();
        self.builder.append(&header, data)
    }
}

fn entry_header(kind: EntryKind, size: u64, mtime: Option<u64>) -> Header {
    let mut header = Header::new_gnu();
    match kind {
        EntryKind::File => {
            header.set_entry_type(EntryType::Regular);
            header.set_mode(0o644);
        }
        EntryKind::Directory => {
            header.set_entry_type(EntryType::Directory);
            header.set_mode(0o755);
        }
    }
    header.set_size(size);
    header.set_mtime(mtime.unwrap_or(0));
    header.set_uid(0);
    header.set_gid(0);
    header
}
