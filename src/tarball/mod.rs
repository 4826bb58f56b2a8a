//! TAR output: codec filters, entry framing and the output file.

mod compression;
mod output;
mod writer;

pub use compression::{Codec, CompressionSpec, DEFAULT_LEVEL, Encoder, XZ_PRESET};
pub use output::OutputFile;
pub use writer::{ArchiveWriter, EntryKind, OutputEntry};
