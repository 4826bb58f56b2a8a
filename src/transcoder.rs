//! The ZIP → TAR conversion run.
//!
//! A run moves through `Idle → Opened → Streaming → Finalizing → Closed`.
//! Any error ends it in `Failed`: the input handle is dropped, the partial
//! output is deleted and the error is returned. [`Transcoder::run`] takes
//! `self`, so a finished run cannot be reused.

use std::fmt;
use std::io::{self, Read};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Instant;

use crate::config::{Config, InputSource};
use crate::error::{Error, Result};
use crate::io::{HttpRangeReader, LocalFileReader, ReadAt};
use crate::tarball::{ArchiveWriter, EntryKind, OutputEntry, OutputFile};
use crate::timestamp::TimestampResolver;
use crate::zip::ZipArchive;

/// What a successful run produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversionSummary {
    pub output: PathBuf,
    /// Entries copied from the ZIP, not counting the manifest.
    pub entries: u64,
    pub content_bytes: u64,
    pub manifest_written: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Stage {
    Idle,
    Opened,
    Streaming,
    Finalizing,
    Closed,
    Failed,
}

impl Stage {
    /// Terminal state of a run that stopped in `self`.
    fn settle<T>(self, result: &Result<T>) -> Stage {
        match result {
            Ok(_) => Stage::Closed,
            Err(_) => Stage::Failed,
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Stage::Idle => "idle",
            Stage::Opened => "opened",
            Stage::Streaming => "streaming",
            Stage::Finalizing => "finalizing",
            Stage::Closed => "closed",
            Stage::Failed => "failed",
        })
    }
}

/// One ZIP to TAR conversion.
///
/// A `Transcoder` is consumed by [`run`](Self::run); build a new one for
/// every conversion.
pub struct Transcoder {
    config: Config,
    cancel: Option<Arc<AtomicBool>>,
}

impl Transcoder {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel: None,
        }
    }

    /// Abort the run before the next entry once `flag` is set.
    pub fn with_cancel_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.cancel = Some(flag);
        self
    }

    /// Convert the configured input, returning once the output is in place.
    ///
    /// Entries are written in central directory order, followed by the
    /// manifest when one was requested.
    ///
    /// # Errors
    ///
    /// Any [`Error`] variant; see [`ErrorKind`](crate::ErrorKind). Whatever the
    /// failure, nothing is left at the output path.
    pub fn run(self) -> Result<ConversionSummary> {
        let mut stage = Stage::Idle;
        let started = Instant::now();

        let result = self.config.validate().and_then(|()| self.open_input(&mut stage));
        let reached = stage;
        let stage = reached.settle(&result);
        match &result {
            Ok(summary) => tracing::info!(
                output = %summary.output.display(),
                entries = summary.entries,
                bytes = summary.content_bytes,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "conversion complete"
            ),
            Err(err) => {
                tracing::debug!(%stage, %reached, kind = %err.kind(), "conversion failed: {err}")
            }
        }
        result
    }

    fn open_input(&self, stage: &mut Stage) -> Result<ConversionSummary> {
        match &self.config.input {
            InputSource::Path(path) => {
                let reader = LocalFileReader::new(path)
                    .map_err(|e| e.context(format_args!("opening {}", path.display())))?;
                self.convert(Arc::new(reader), stage)
            }
            InputSource::Url(url) => {
                let reader = Arc::new(HttpRangeReader::new(url.clone())?);
                let summary = self.convert(reader.clone(), stage)?;
                tracing::info!(transferred = reader.transferred_bytes(), "remote bytes transferred");
                Ok(summary)
            }
        }
    }

    fn convert<R: ReadAt>(&self, reader: Arc<R>, stage: &mut Stage) -> Result<ConversionSummary> {
        let archive = ZipArchive::open(reader)?;
        let mut manifest = self.config.manifest();

        // Reject the collision before the output file exists.
        if let Some(manifest) = &manifest {
            if archive.contains(manifest.file_name().as_bytes()) {
                return Err(Error::NameCollision(manifest.file_name().to_string()));
            }
        }

        let output_path = self.config.output_path()?;
        let output = OutputFile::create(&output_path)?;
        let mut writer = ArchiveWriter::new(
            output,
            &self.config.compression,
            manifest.as_ref().map(|m| m.file_name().as_bytes().to_vec()),
        );
        *stage = Stage::Opened;
        tracing::debug!(
            input = %self.config.input,
            output = %output_path.display(),
            entries = archive.len(),
            codec = %self.config.compression.codec,
            "opened"
        );

        *stage = Stage::Streaming;
        let resolver = TimestampResolver::new(self.config.timestamps, self.config.source_timezone);
        for entry in archive.entries() {
            self.check_cancelled()?;

            let mtime = resolver.resolve(&entry.file_name, &entry.stored_timestamp())?;
            let kind = if entry.is_directory {
                EntryKind::Directory
            } else {
                EntryKind::File
            };

            match manifest.as_mut() {
                Some(manifest) => {
                    // Hash and write the same buffer; the entry stream only runs once.
                    let content = if entry.is_directory {
                        Vec::new()
                    } else {
                        archive.read_content(entry)?
                    };
                    manifest.record(&entry.raw_name, &content)?;
                    writer.write_entry(OutputEntry {
                        name: &entry.raw_name,
                        size: content.len() as u64,
                        kind,
                        mtime,
                        content: &mut content.as_slice(),
                    })?;
                }
                None => {
                    let (size, mut content): (u64, Box<dyn Read + '_>) = if entry.is_directory {
                        (0, Box::new(io::empty()))
                    } else {
                        (entry.uncompressed_size, Box::new(archive.open_content(entry)?))
                    };
                    writer.write_entry(OutputEntry {
                        name: &entry.raw_name,
                        size,
                        kind,
                        mtime,
                        content: &mut content,
                    })?;
                }
            }

            tracing::debug!(name = %entry.file_name, size = entry.uncompressed_size, ?mtime, "entry");
        }

        *stage = Stage::Finalizing;
        let entries = writer.entries_written();
        let content_bytes = writer.content_bytes();
        let manifest_written = manifest.as_ref().is_some_and(|m| !m.is_empty());
        let output = writer.finish(manifest.as_ref())?;

        let output = output
            .commit()
            .map_err(|e| e.context(format_args!("writing {}", output_path.display())))?;
        *stage = Stage::Closed;

        Ok(ConversionSummary {
            output,
            entries,
            content_bytes,
            manifest_written,
        })
    }

    fn check_cancelled(&self) -> Result<()> {
        match &self.cancel {
            Some(flag) if flag.load(Ordering::Relaxed) => Err(Error::Cancelled),
            _ => Ok(()),
        }
    }
}

/// Convert with `config` in one call.
pub fn convert(config: Config) -> Result<ConversionSummary> {
    Transcoder::new(config).run()
}
