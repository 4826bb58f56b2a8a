use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::Parser;

use crate::checksum::DEFAULT_MANIFEST_NAME;
use crate::config::{Config, InputSource};
use crate::tarball::{Codec, CompressionSpec, DEFAULT_LEVEL};
use crate::timestamp::{SourceTimezone, TimestampPolicy};

#[derive(Parser, Debug)]
#[command(name = "zip2tar")]
#[command(version)]
#[command(about = "In-memory ZIP to TAR converter", long_about = None)]
#[command(after_help = "Examples:\n  \
  zip2tar data.zip                  write data.tar\n  \
  zip2tar --xz data.zip             write data.tar.xz\n  \
  zip2tar --gz --md5 data.zip       write data.tar.gz with a sum.md5 entry\n  \
  zip2tar https://example.com/a.zip convert a remote ZIP using Range requests")]
pub struct Cli {
    /// ZIP file path or HTTP URL
    #[arg(value_name = "FILE")]
    pub file: String,

    /// Write xz compressed tar file
    #[arg(long, conflicts_with_all = ["bz2", "gz"])]
    pub xz: bool,

    /// Write bzip2 compressed tar file
    #[arg(long, conflicts_with_all = ["xz", "gz"])]
    pub bz2: bool,

    /// Write gzip compressed tar file
    #[arg(long, conflicts_with_all = ["xz", "bz2"])]
    pub gz: bool,

    /// Compression level for gzip and bzip2
    #[arg(long, value_name = "N", default_value_t = DEFAULT_LEVEL,
          value_parser = clap::value_parser!(u32).range(1..=9))]
    pub compression_level: u32,

    /// Don't take datetime for files from zip -> 1970-01-01
    #[arg(long, conflicts_with = "mtime")]
    pub no_datetime: bool,

    /// Record this RFC 3339 time for every entry
    #[arg(long, value_name = "TIME")]
    pub mtime: Option<DateTime<Utc>>,

    /// Read ZIP timestamps as UTC instead of local time
    #[arg(long)]
    pub utc: bool,

    /// Set tar file name (normally derived from .zip)
    #[arg(long, value_name = "NAME")]
    pub tar_file_name: Option<PathBuf>,

    /// Add a checksum manifest entry (its name cannot already be in the zip)
    #[arg(long)]
    pub md5: bool,

    /// Name of the checksum manifest entry
    #[arg(long, value_name = "NAME", default_value = DEFAULT_MANIFEST_NAME)]
    pub md5_file_name: String,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short = 'v', long = "verbose", action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Only report errors
    #[arg(short = 'q', long, conflicts_with = "verbose")]
    pub quiet: bool,
}

impl Cli {
    pub fn codec(&self) -> Codec {
        if self.xz {
            Codec::Xz
        } else if self.bz2 {
            Codec::Bzip2
        } else if self.gz {
            Codec::Gzip
        } else {
            Codec::None
        }
    }

    /// Filter directive for [`crate::logging::init`].
    pub fn log_directive(&self) -> String {
        let level = match (self.quiet, self.verbose) {
            (true, _) => "error",
            (false, 0) => "warn",
            (false, 1) => "info",
            (false, 2) => "debug",
            (false, _) => "trace",
        };
        format!("warn,zip2tar={level}")
    }

    pub fn to_config(&self) -> Config {
        let timestamps = match (self.no_datetime, self.mtime) {
            (true, _) => TimestampPolicy::Suppressed,
            (false, Some(instant)) => TimestampPolicy::Fixed(instant),
            (false, None) => TimestampPolicy::FromSource,
        };

        let codec = self.codec();
        let compression = if codec.supports_level() {
            CompressionSpec::new(codec).with_level(self.compression_level)
        } else {
            CompressionSpec::new(codec)
        };

        Config {
            output: self.tar_file_name.clone(),
            compression,
            timestamps,
            source_timezone: if self.utc {
                SourceTimezone::utc()
            } else {
                SourceTimezone::Local
            },
            checksum_manifest: self.md5,
            manifest_file_name: self.md5_file_name.clone(),
            ..Config::new(InputSource::parse(&self.file))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once("zip2tar").chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn defaults() {
        let config = parse(&["test.zip"]).to_config();
        assert_eq!(config.input, InputSource::Path(PathBuf::from("test.zip")));
        assert_eq!(config.compression, CompressionSpec::new(Codec::None));
        assert_eq!(config.timestamps, TimestampPolicy::FromSource);
        assert!(!config.checksum_manifest);
        assert_eq!(config.manifest_file_name, "sum.md5");
    }

    #[test]
    fn compression_flags() {
        let config = parse(&["--bz2", "--compression-level", "4", "a.zip"]).to_config();
        assert_eq!(config.compression, CompressionSpec::new(Codec::Bzip2).with_level(4));

        let config = parse(&["--xz", "a.zip"]).to_config();
        assert_eq!(config.compression, CompressionSpec::new(Codec::Xz));

        assert!(Cli::try_parse_from(["zip2tar", "--gz", "--xz", "a.zip"]).is_err());
        assert!(Cli::try_parse_from(["zip2tar", "--compression-level", "0", "a.zip"]).is_err());
    }

    #[test]
    fn timestamp_flags() {
        let config = parse(&["--no-datetime", "a.zip"]).to_config();
        assert_eq!(config.timestamps, TimestampPolicy::Suppressed);

        let config = parse(&["--mtime", "2011-10-02T16:45:00Z", "--utc", "a.zip"]).to_config();
        let expected = Utc.with_ymd_and_hms(2011, 10, 2, 16, 45, 0).unwrap();
        assert_eq!(config.timestamps, TimestampPolicy::Fixed(expected));
        assert_eq!(config.source_timezone, SourceTimezone::utc());
    }

    #[test]
    fn manifest_and_output_flags() {
        let cli = parse(&["--md5", "--tar-file-name", "x.tar", "-vv", "a.zip"]);
        assert_eq!(cli.log_directive(), "warn,zip2tar=debug");
        let config = cli.to_config();
        assert!(config.checksum_manifest);
        assert_eq!(config.output, Some(PathBuf::from("x.tar")));
    }
}
