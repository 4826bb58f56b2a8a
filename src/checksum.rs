//! MD5 manifest in `md5sum` format.

use crate::error::{Error, Result};

pub const DEFAULT_MANIFEST_NAME: &str = "sum.md5";

/// Ordered digests of every converted entry, written as the last TAR entry.
#[derive(Debug, Clone)]
pub struct ChecksumManifest {
    file_name: String,
    /// (hex digest, raw entry name)
    lines: Vec<(String, Vec<u8>)>,
}

impl ChecksumManifest {
    pub fn new(file_name: impl Into<String>) -> Self {
        Self {
            file_name: file_name.into(),
            lines: Vec::new(),
        }
    }

    /// Name of the manifest entry itself.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    /// Hash `content` and remember it under `name`. Returns the hex digest.
    ///
    /// `name` is the entry name as stored in the ZIP and lands in the
    /// manifest unchanged, even when it is not UTF-8.
    ///
    /// # Errors
    ///
    /// [`Error::NameCollision`] when `name` is the manifest's own name.
    pub fn record(&mut self, name: &[u8], content: &[u8]) -> Result<String> {
        if name == self.file_name.as_bytes() {
            return Err(Error::NameCollision(self.file_name.clone()));
        }

        let digest = format!("{:x}", md5::compute(content));
        self.lines.push((digest.clone(), name.to_vec()));
        Ok(digest)
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Manifest body: one `"<digest>  <name>\n"` line per recorded entry.
    pub fn finalize(&self) -> Vec<u8> {
        let mut body = Vec::new();
        for (digest, name) in &self.lines {
            body.extend_from_slice(digest.as_bytes());
            body.extend_from_slice(b"  ");
            body.extend_from_slice(name);
            body.push(b'\n');
        }
        body
    }
}

impl Default for ChecksumManifest {
    fn default() -> Self {
        Self::new(DEFAULT_MANIFEST_NAME)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn md5sum_format() {
        let mut manifest = ChecksumManifest::default();
        let digest = manifest.record(b"abc", b"abc").unwrap();
        assert_eq!(digest, "900150983cd24fb0d6963f7d28e17f72");
        manifest.record(b"dir/empty", b"").unwrap();

        assert_eq!(
            String::from_utf8(manifest.finalize()).unwrap(),
            "900150983cd24fb0d6963f7d28e17f72  abc\n\
             d41d8cd98f00b204e9800998ecf8427e  dir/empty\n"
        );
        assert_eq!(manifest.len(), 2);
    }

    #[test]
    fn empty_manifest_has_no_bytes() {
        assert!(ChecksumManifest::default().finalize().is_empty());
    }

    #[test]
    fn refuses_to_hash_itself() {
        let mut manifest = ChecksumManifest::new("checksums.md5");
        let err = manifest.record(b"checksums.md5", b"").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::NameCollision);
        assert!(manifest.is_empty());
    }

    #[test]
    fn legacy_names_are_kept_byte_for_byte() {
        let mut manifest = ChecksumManifest::default();
        manifest.record(b"caf\x82", b"").unwrap();
        manifest.record(b"caf\x83", b"").unwrap();

        let body = manifest.finalize();
        let lines: Vec<&[u8]> = body.split(|&b| b == b'\n').filter(|l| !l.is_empty()).collect();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].ends_with(b"  caf\x82"));
        assert!(lines[1].ends_with(b"  caf\x83"));
    }
}
