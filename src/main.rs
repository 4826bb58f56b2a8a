//! Main entry point for the zip2tar CLI application.
//!
//! Parses the command line into a [`Config`](zip2tar::Config), runs one
//! conversion and reports failures on stderr with a non-zero exit status.

use anyhow::Result;
use clap::Parser;

use zip2tar::{Cli, Transcoder, logging};

fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log_directive())?;

    let config = cli.to_config();
    let summary = Transcoder::new(config).run().map_err(|err| {
        let kind = err.kind();
        anyhow::Error::new(err).context(format!("conversion of {} failed ({kind})", cli.file))
    })?;

    tracing::info!(
        "wrote {} ({} entries{})",
        summary.output.display(),
        summary.entries,
        if summary.manifest_written {
            " + checksum manifest"
        } else {
            ""
        }
    );

    Ok(())
}
