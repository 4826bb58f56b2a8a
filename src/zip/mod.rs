//! Reading the input ZIP.
//!
//! Only the central directory is trusted for metadata: entry order, names,
//! sizes, CRCs and timestamps all come from it. Local headers are consulted
//! for the one thing the central directory lacks, the offset of the entry's
//! data.
//!
//! - [`structures`]: fixed-layout records (EOCD, ZIP64 EOCD, central and
//!   local file headers)
//! - [`parser`]: locating and decoding those records through [`ReadAt`](crate::io::ReadAt)
//! - [`archive`]: the entry list and verified content streams
//!
//! STORED, DEFLATE and BZIP2 entries are decoded; ZIP64 archives are
//! accepted. Encrypted entries and multi-disk archives are reported as
//! corrupt input.

mod archive;
mod content;
mod parser;
mod structures;

pub use archive::ZipArchive;
pub use content::EntryReader;
pub use parser::ZipParser;
pub use structures::*;
