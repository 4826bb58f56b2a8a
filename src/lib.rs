//! # zip2tar
//!
//! Convert a ZIP archive into a TAR archive without extracting it to disk.
//!
//! Entries are enumerated from the ZIP central directory and streamed one at
//! a time into TAR entries, optionally through gzip, bzip2 or xz. The input
//! can be a local file or an HTTP(S) URL read with Range requests.
//!
//! ## Features
//!
//! - STORED, DEFLATE and BZIP2 entries, ZIP64 archives
//! - CRC-32 and size verification of every entry
//! - Timestamps from the ZIP, suppressed (epoch) or fixed
//! - Optional `sum.md5` manifest appended as the last entry
//! - Output appears only after a fully successful run
//!
//! ## Example
//!
//! ```no_run
//! use zip2tar::{Codec, CompressionSpec, Config, Transcoder};
//!
//! fn main() -> zip2tar::Result<()> {
//!     let config = Config {
//!         compression: CompressionSpec::new(Codec::Gzip),
//!         checksum_manifest: true,
//!         ..Config::new("archive.zip")
//!     };
//!
//!     // writes archive.tar.gz
//!     let summary = Transcoder::new(config).run()?;
//!     println!("{} entries", summary.entries);
//!     Ok(())
//! }
//! ```

pub mod checksum;
pub mod cli;
pub mod config;
pub mod error;
pub mod io;
pub mod logging;
pub mod tarball;
pub mod timestamp;
pub mod transcoder;
pub mod zip;

pub use checksum::ChecksumManifest;
pub use cli::Cli;
pub use config::{Config, InputSource};
pub use error::{Error, ErrorKind, Result};
pub use io::{HttpRangeReader, LocalFileReader, ReadAt};
pub use tarball::{ArchiveWriter, Codec, CompressionSpec, EntryKind, OutputEntry, OutputFile};
pub use timestamp::{SourceTimezone, StoredTimestamp, TimestampPolicy, TimestampResolver};
pub use transcoder::{ConversionSummary, Transcoder, convert};
pub use zip::{ZipArchive, ZipFileEntry};
