// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Document loading — path in, raw document handle out.

use std::borrow::Cow;
use std::path::{Path, PathBuf};

use ppdwerk_core::error::{PpdError, Result};
use tracing::{debug, instrument};

use crate::gzip;
use crate::raw::RawDocument;
use crate::reader;

/// Opens documents by path. The handle is owned by the caller for a single
/// build and never shared.
pub trait DocumentLoader {
    /// Open and parse the document at `path`.
    ///
    /// Any failure (missing file, decompression, rejected content) is
    /// reported as `DocumentUnreadable`, except a temporary-name collision,
    /// which is `TempFileConflict`.
    fn load(&self, path: &Path) -> Result<RawDocument> {
        let source = self.source_bytes(path)?;
        self.load_source(path, &source)
    }

    /// Parse `source`, the stored bytes previously read from `path`.
    fn load_source(&self, path: &Path, source: &[u8]) -> Result<RawDocument>;

    /// Bytes of the source as stored (still compressed for `.gz` inputs),
    /// used to detect changes between requests.
    fn source_bytes(&self, path: &Path) -> Result<Vec<u8>> {
        std::fs::read(path).map_err(|err| {
            PpdError::DocumentUnreadable(format!("cannot read {}: {err}", path.display()))
        })
    }

    /// Write the plaintext document into `dir`, returning the new path.
    fn extract(&self, path: &Path, dir: &Path) -> Result<PathBuf> {
        gzip::extract_plaintext(path, dir)
    }
}

/// Loader for documents on the local filesystem, plain or gzip-packed.
#[derive(Debug, Clone)]
pub struct FileLoader {
    temp_dir: PathBuf,
}

impl FileLoader {
    /// `temp_dir` receives decompressed copies; `None` uses the system
    /// temporary directory.
    pub fn new(temp_dir: Option<PathBuf>) -> Self {
        Self {
            temp_dir: temp_dir.unwrap_or_else(std::env::temp_dir),
        }
    }
}

impl Default for FileLoader {
    fn default() -> Self {
        Self::new(None)
    }
}

impl DocumentLoader for FileLoader {
    #[instrument(skip(self, source), fields(path = %path.display(), len = source.len()))]
    fn load_source(&self, path: &Path, source: &[u8]) -> Result<RawDocument> {
        // The temporary copy, if any, lives until the end of this call.
        let temp = if gzip::is_gzip_path(path) {
            Some(gzip::decompress_reader(path, source, &self.temp_dir)?)
        } else {
            None
        };

        let plain = match &temp {
            Some(temp) => Cow::Owned(std::fs::read(temp.path()).map_err(|err| {
                PpdError::DocumentUnreadable(format!("cannot read {}: {err}", path.display()))
            })?),
            None => Cow::Borrowed(source),
        };
        let doc = reader::read_bytes(&plain).map_err(|err| {
            PpdError::DocumentUnreadable(format!("{}: {err}", path.display()))
        })?;

        debug!(compressed = temp.is_some(), "document opened");
        Ok(doc)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    const DOC: &str = "*PPD-Adobe: \"4.3\"\n*Manufacturer: \"Acme\"\n";

    #[test]
    fn plain_and_gzip_load_identically() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let plain = dir.path().join("acme.ppd");
        std::fs::write(&plain, DOC).unwrap();

        let gz = dir.path().join("acme.ppd.gz");
        let mut encoder =
            GzEncoder::new(std::fs::File::create(&gz).unwrap(), Compression::best());
        encoder.write_all(DOC.as_bytes()).unwrap();
        encoder.finish().unwrap();

        let loader = FileLoader::new(Some(tmp.path().to_path_buf()));
        assert_eq!(loader.load(&plain).unwrap(), loader.load(&gz).unwrap());
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn rejected_gzip_content_cleans_up() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let gz = dir.path().join("junk.ppd.gz");
        let mut encoder =
            GzEncoder::new(std::fs::File::create(&gz).unwrap(), Compression::default());
        encoder.write_all(b"not a printer description").unwrap();
        encoder.finish().unwrap();

        let loader = FileLoader::new(Some(tmp.path().to_path_buf()));
        let err = loader.load(&gz).unwrap_err();
        assert!(matches!(err, PpdError::DocumentUnreadable(_)));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn multi_member_gzip_reads_every_member() {
        let dir = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let gz = dir.path().join("split.ppd.gz");
        let mut file = std::fs::File::create(&gz).unwrap();
        for part in ["*PPD-Adobe: \"4.3\"\n", "*Manufacturer: \"Acme\"\n"] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(part.as_bytes()).unwrap();
            file.write_all(&encoder.finish().unwrap()).unwrap();
        }
        drop(file);

        let loader = FileLoader::new(Some(tmp.path().to_path_buf()));
        let doc = loader.load(&gz).unwrap();
        assert_eq!(doc.manufacturer.as_deref(), Some("Acme"));
        assert_eq!(std::fs::read_dir(tmp.path()).unwrap().count(), 0);
    }

    #[test]
    fn load_source_parses_the_given_bytes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("acme.ppd");
        std::fs::write(&path, "*PPD-Adobe: \"4.3\"\n*Manufacturer: \"OnDisk\"\n").unwrap();

        let loader = FileLoader::default();
        let doc = loader.load_source(&path, DOC.as_bytes()).unwrap();
        assert_eq!(doc.manufacturer.as_deref(), Some("Acme"));
    }

    #[test]
    fn missing_file_is_unreadable() {
        let loader = FileLoader::default();
        let err = loader.load(Path::new("missing.ppd")).unwrap_err();
        assert_eq!(err.kind(), "DocumentUnreadable");
    }
}
