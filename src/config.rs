//! Resolved settings for one conversion run.

use std::fmt;
use std::path::PathBuf;

use crate::checksum::{ChecksumManifest, DEFAULT_MANIFEST_NAME};
use crate::error::{Error, Result};
use crate::tarball::{Codec, CompressionSpec};
use crate::timestamp::{SourceTimezone, TimestampPolicy};

/// Where the ZIP archive comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InputSource {
    Path(PathBuf),
    /// `http://` or `https://` URL read with Range requests
    Url(String),
}

impl InputSource {
    pub fn parse(input: &str) -> Self {
        if input.starts_with("http://") || input.starts_with("https://") {
            InputSource::Url(input.to_string())
        } else {
            InputSource::Path(PathBuf::from(input))
        }
    }
}

impl fmt::Display for InputSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputSource::Path(path) => write!(f, "{}", path.display()),
            InputSource::Url(url) => f.write_str(url),
        }
    }
}

impl From<&str> for InputSource {
    fn from(input: &str) -> Self {
        InputSource::parse(input)
    }
}

impl From<PathBuf> for InputSource {
    fn from(path: PathBuf) -> Self {
        InputSource::Path(path)
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub input: InputSource,
    /// Explicit output path; derived from the input name when absent.
    pub output: Option<PathBuf>,
    pub compression: CompressionSpec,
    pub timestamps: TimestampPolicy,
    pub source_timezone: SourceTimezone,
    pub checksum_manifest: bool,
    pub manifest_file_name: String,
}

impl Config {
    pub fn new(input: impl Into<InputSource>) -> Self {
        Self {
            input: input.into(),
            output: None,
            compression: CompressionSpec::default(),
            timestamps: TimestampPolicy::default(),
            source_timezone: SourceTimezone::default(),
            checksum_manifest: false,
            manifest_file_name: DEFAULT_MANIFEST_NAME.to_string(),
        }
    }

    /// Check the settings before any input is touched.
    ///
    /// # Errors
    ///
    /// [`Error::Config`] for a compression level outside 1..=9, an unusable
    /// manifest name, or an output path equal to the input.
    pub fn validate(&self) -> Result<()> {
        self.compression.validate()?;

        if self.checksum_manifest
            && (self.manifest_file_name.is_empty() || self.manifest_file_name.ends_with('/'))
        {
            return Err(Error::Config(format!(
                "invalid manifest file name `{}`",
                self.manifest_file_name
            )));
        }

        if let (InputSource::Path(input), Some(output)) = (&self.input, &self.output) {
            if input == output {
                return Err(Error::Config(format!(
                    "output {} would overwrite the input",
                    output.display()
                )));
            }
        }

        Ok(())
    }

    /// A fresh manifest when checksums are requested.
    pub fn manifest(&self) -> Option<ChecksumManifest> {
        self.checksum_manifest
            .then(|| ChecksumManifest::new(self.manifest_file_name.clone()))
    }

    /// Explicit output path, or one derived from the input name:
    /// `data.zip` becomes `data.tar`, `data.tar.gz`, ...
    pub fn output_path(&self) -> Result<PathBuf> {
        if let Some(output) = &self.output {
            return Ok(output.clone());
        }

        match &self.input {
            InputSource::Path(path) => {
                let name = path
                    .file_name()
                    .and_then(|n| n.to_str())
                    .ok_or_else(|| cannot_derive(&self.input))?;
                Ok(path.with_file_name(tar_name_for(name, self.compression.codec)))
            }
            InputSource::Url(url) => {
                let name = url_file_name(url).ok_or_else(|| cannot_derive(&self.input))?;
                Ok(PathBuf::from(tar_name_for(name, self.compression.codec)))
            }
        }
    }
}

fn cannot_derive(input: &InputSource) -> Error {
    Error::Config(format!(
        "cannot derive an output name from {input}; pass one explicitly"
    ))
}

fn tar_name_for(zip_name: &str, codec: Codec) -> String {
    let split = zip_name.len().saturating_sub(4);
    let stem = match zip_name.get(split..) {
        Some(suffix) if suffix.eq_ignore_ascii_case(".zip") && split > 0 => &zip_name[..split],
        _ => zip_name,
    };

    match codec.extension() {
        Some(ext) => format!("{stem}.tar.{ext}"),
        None => format!("{stem}.tar"),
    }
}

fn url_file_name(url: &str) -> Option<&str> {
    let url = url.split(['#', '?']).next().unwrap_or(url);
    let (_, path) = url.split_once("://")?;
    let (_, path) = path.split_once('/')?;
    path.rsplit('/').next().filter(|name| !name.is_empty())
}
