use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{Error, Result};

const WRITE_BUFFER_SIZE: usize = 1024 * 1024;

/// Output file that only appears at its destination once committed.
///
/// Bytes go to a temporary file in the destination directory. Dropping an
/// `OutputFile` without calling [`OutputFile::commit`] removes that file.
pub struct OutputFile {
    path: PathBuf,
    file: BufWriter<NamedTempFile>,
}

impl OutputFile {
    /// Open a temporary file beside `path`.
    ///
    /// # Errors
    ///
    /// [`Error::Io`] if the destination directory cannot hold a new file.
    pub fn create(path: &Path) -> Result<Self> {
        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        let mut builder = tempfile::Builder::new();
        builder.prefix(".zip2tar-").suffix(".part");
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            builder.permissions(std::fs::Permissions::from_mode(0o666));
        }

        let tmp = builder.tempfile_in(dir).map_err(|e| {
            Error::Io(io::Error::new(
                e.kind(),
                format!("cannot create output next to {}: {}", path.display(), e),
            ))
        })?;
        tracing::debug!(tmp = %tmp.path().display(), "opened temporary output");

        Ok(Self {
            path: path.to_path_buf(),
            file: BufWriter::with_capacity(WRITE_BUFFER_SIZE, tmp),
        })
    }

    /// Flush, sync and move the file into place.
    pub fn commit(self) -> Result<PathBuf> {
        let tmp = self.file.into_inner().map_err(|e| e.into_error())?;
        tmp.as_file().sync_all()?;
        tmp.persist(&self.path).map_err(|e| e.error)?;
        Ok(self.path)
    }
}

impl Write for OutputFile {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.file.write(buf)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.file.flush()
    }
}
