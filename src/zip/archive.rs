use std::io::{BufReader, Read};
use std::sync::Arc;

use crate::error::{Error, Result};
use crate::io::ReadAt;

use super::content::{EntryReader, SectionReader};
use super::parser::ZipParser;
use super::structures::{CompressionMethod, ZipFileEntry};

/// Read buffer for entry data; large enough to keep Range requests few.
const READ_BUFFER_SIZE: usize = 256 * 1024;

/// An opened ZIP archive with its central directory loaded.
///
/// Entry metadata is read once by [`ZipArchive::open`]; content is only
/// fetched from the source when an entry is opened.
///
/// # Example
///
/// ```no_run
/// use std::io::Read;
/// use std::sync::Arc;
/// use zip2tar::{LocalFileReader, ZipArchive};
///
/// # fn main() -> zip2tar::Result<()> {
/// let reader = LocalFileReader::new("archive.zip".as_ref())?;
/// let archive = ZipArchive::open(Arc::new(reader))?;
/// for entry in archive.entries() {
///     let mut content = Vec::new();
///     archive.open_content(entry)?.read_to_end(&mut content)?;
///     println!("{}: {} bytes", entry.file_name, content.len());
/// }
/// # Ok(())
/// # }
/// ```
pub struct ZipArchive<R: ReadAt> {
    parser: ZipParser<R>,
    entries: Vec<ZipFileEntry>,
}

impl<R: ReadAt> ZipArchive<R> {
    /// Read the central directory of `reader`.
    ///
    /// # Arguments
    ///
    /// * `reader` - Random access source holding the whole archive
    ///
    /// # Errors
    ///
    /// * [`Error::ArchiveCorrupt`] if no End of Central Directory is found or
    ///   the directory is truncated or malformed
    /// * [`Error::Io`] / [`Error::Http`] if the source cannot be read
    pub fn open(reader: Arc<R>) -> Result<Self> {
        let parser = ZipParser::new(reader);
        let entries = parser.list_files()?;
        Ok(Self { parser, entries })
    }

    /// Entries in central directory order.
    pub fn entries(&self) -> std::slice::Iter<'_, ZipFileEntry> {
        self.entries.iter()
    }

    /// Number of entries in the central directory.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Whether some entry is stored under exactly `name`.
    ///
    /// Compares raw name bytes, the same form the entries are written in.
    pub fn contains(&self, name: &[u8]) -> bool {
        self.entries.iter().any(|e| e.raw_name == name)
    }

    /// Open a decoding, verifying stream over the content of `entry`.
    ///
    /// # Arguments
    ///
    /// * `entry` - An entry of this archive, from [`ZipArchive::entries`]
    ///
    /// # Returns
    ///
    /// A reader yielding exactly `entry.uncompressed_size` bytes. Reads fail
    /// with [`Error::ArchiveCorrupt`] (wrapped in `io::Error`) when the data
    /// is shorter, longer or does not match the stored CRC-32.
    ///
    /// # Errors
    ///
    /// [`Error::ArchiveCorrupt`] for encrypted entries, unsupported
    /// compression methods and a bad local file header.
    pub fn open_content(&self, entry: &ZipFileEntry) -> Result<EntryReader<'_>> {
        if entry.is_encrypted() {
            return Err(Error::corrupt(format!(
                "entry `{}` is encrypted, which is not supported",
                entry.file_name
            )));
        }

        let data_offset = self.parser.get_data_offset(entry)?;
        let section = SectionReader::new(
            self.parser.reader().as_ref(),
            data_offset,
            entry.compressed_size,
        );
        let buffered = BufReader::with_capacity(READ_BUFFER_SIZE, section);

        let decoded: Box<dyn Read + '_> = match entry.compression_method {
            CompressionMethod::Stored => Box::new(buffered),
            CompressionMethod::Deflate => Box::new(flate2::bufread::DeflateDecoder::new(buffered)),
            CompressionMethod::Bzip2 => Box::new(bzip2::bufread::BzDecoder::new(buffered)),
            CompressionMethod::Unknown(method) => {
                return Err(Error::corrupt(format!(
                    "entry `{}` uses unsupported compression method {}",
                    entry.file_name, method
                )));
            }
        };

        Ok(EntryReader::new(
            decoded,
            &entry.file_name,
            entry.uncompressed_size,
            entry.crc32,
        ))
    }

    /// Read the whole content of `entry` into memory.
    ///
    /// Same verification as [`ZipArchive::open_content`].
    pub fn read_content(&self, entry: &ZipFileEntry) -> Result<Vec<u8>> {
        let mut content = Vec::with_capacity(entry.uncompressed_size.min(64 << 20) as usize);
        self.open_content(entry)?.read_to_end(&mut content)?;
        Ok(content)
    }
}
