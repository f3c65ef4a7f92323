// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Gzip-packed PPD handling.
//
// Decompressed copies are written to exclusively-created files (never
// opening an existing name) and removed when their guard is dropped.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use flate2::read::MultiGzDecoder;
use ppdwerk_core::error::{PpdError, Result};
use tracing::{debug, error, instrument, warn};

static TEMP_COUNTER: AtomicU64 = AtomicU64::new(0);

/// Whether the path names a gzip-packed document (`.gz` suffix).
pub fn is_gzip_path(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == "gz")
        && path.file_stem().is_some_and(|stem| !stem.is_empty())
}

/// A decompressed temporary copy, deleted on drop.
#[derive(Debug)]
pub struct TempPpd {
    path: PathBuf,
}

impl TempPpd {
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Keep the file on disk and hand its path to the caller.
    fn persist(mut self) -> PathBuf {
        let path = std::mem::take(&mut self.path);
        std::mem::forget(self);
        path
    }
}

impl Drop for TempPpd {
    fn drop(&mut self) {
        match std::fs::remove_file(&self.path) {
            Ok(()) => debug!(path = %self.path.display(), "temporary PPD removed"),
            Err(err) if err.kind() == io::ErrorKind::NotFound => {}
            Err(err) => warn!(path = %self.path.display(), %err, "cannot remove temporary PPD"),
        }
    }
}

/// Decompress `source` into a fresh temporary file inside `dir`.
///
/// Fails with `DocumentUnreadable` for a missing or corrupt input and with
/// `TempFileConflict` when the temporary name already exists.
#[instrument(skip_all, fields(source = %source.display()))]
pub fn decompress(source: &Path, dir: &Path) -> Result<TempPpd> {
    let input = open_source(source)?;
    decompress_into(source, input, temp_name(dir))
}

/// Like [`decompress`], for compressed bytes already read from `source`.
pub fn decompress_reader(source: &Path, input: impl Read, dir: &Path) -> Result<TempPpd> {
    decompress_into(source, input, temp_name(dir))
}

fn decompress_into(source: &Path, input: impl Read, target: PathBuf) -> Result<TempPpd> {
    let (file, path) = create_exclusive(&target)?;
    let guard = TempPpd { path };

    copy_decompressed(input, file).map_err(|err| {
        PpdError::DocumentUnreadable(format!(
            "gzip decompress of {} failed: {err}",
            source.display()
        ))
    })?;

    debug!(temp = %guard.path.display(), "PPD decompressed");
    Ok(guard)
}

/// Write the plaintext form of `source` into `dir`, keeping its file name
/// without the `.gz` suffix. The file persists; the caller owns it.
#[instrument(skip_all, fields(source = %source.display(), dir = %dir.display()))]
pub fn extract_plaintext(source: &Path, dir: &Path) -> Result<PathBuf> {
    let name = if is_gzip_path(source) {
        source.file_stem()
    } else {
        source.file_name()
    }
    .ok_or_else(|| PpdError::DocumentUnreadable(format!("{} has no file name", source.display())))?;

    let input = open_source(source)?;

    let (file, path) = create_exclusive(&dir.join(name))?;
    // Same cleanup guarantee as `decompress` until the copy is complete.
    let guard = TempPpd { path };

    let copied = if is_gzip_path(source) {
        copy_decompressed(input, file)
    } else {
        copy_plain(input, file)
    };
    copied.map_err(|err| {
        PpdError::DocumentUnreadable(format!("cannot extract {}: {err}", source.display()))
    })?;

    Ok(guard.persist())
}

fn open_source(source: &Path) -> Result<File> {
    File::open(source).map_err(|err| {
        PpdError::DocumentUnreadable(format!("cannot open {}: {err}", source.display()))
    })
}

// Concatenated gzip members decode as one stream.
fn copy_decompressed(input: impl Read, mut output: File) -> io::Result<()> {
    let mut decoder = MultiGzDecoder::new(input);
    io::copy(&mut decoder, &mut output)?;
    output.flush()
}

fn copy_plain(mut input: File, mut output: File) -> io::Result<()> {
    io::copy(&mut input, &mut output)?;
    output.flush()
}

fn temp_name(dir: &Path) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos())
        .unwrap_or(0);
    let seq = TEMP_COUNTER.fetch_add(1, Ordering::Relaxed);
    dir.join(format!("ppdwerk-{}-{seq}-{nanos:08x}.ppd", std::process::id()))
}

/// Create `path` only if it does not exist yet. Never retried.
fn create_exclusive(path: &Path) -> Result<(File, PathBuf)> {
    let mut options = OpenOptions::new();
    options.write(true).create_new(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    match options.open(path) {
        Ok(file) => Ok((file, path.to_path_buf())),
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => {
            error!(path = %path.display(), "possible link attack: temporary file already exists");
            Err(PpdError::TempFileConflict(path.display().to_string()))
        }
        Err(err) => Err(PpdError::Io(err)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;

    fn write_gz(dir: &Path, name: &str, content: &[u8]) -> PathBuf {
        let path = dir.join(name);
        let mut encoder = GzEncoder::new(File::create(&path).unwrap(), Compression::default());
        encoder.write_all(content).unwrap();
        encoder.finish().unwrap();
        path
    }

    fn entries(dir: &Path) -> usize {
        std::fs::read_dir(dir).unwrap().count()
    }

    #[test]
    fn gzip_suffix_detection() {
        assert!(is_gzip_path(Path::new("/usr/share/ppd/acme.ppd.gz")));
        assert!(!is_gzip_path(Path::new("acme.ppd")));
        assert!(!is_gzip_path(Path::new(".gz")));
    }

    #[test]
    fn decompressed_copy_is_removed_on_drop() {
        let src = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let gz = write_gz(src.path(), "a.ppd.gz", b"*PPD-Adobe: \"4.3\"\n");

        let temp = decompress(&gz, tmp.path()).unwrap();
        let text = std::fs::read_to_string(temp.path()).unwrap();
        assert_eq!(text, "*PPD-Adobe: \"4.3\"\n");
        assert_eq!(entries(tmp.path()), 1);

        drop(temp);
        assert_eq!(entries(tmp.path()), 0);
    }

    #[test]
    fn corrupt_stream_leaves_nothing_behind() {
        let src = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let bogus = src.path().join("bogus.ppd.gz");
        std::fs::write(&bogus, b"definitely not gzip").unwrap();

        let err = decompress(&bogus, tmp.path()).unwrap_err();
        assert!(matches!(err, PpdError::DocumentUnreadable(_)));
        assert_eq!(entries(tmp.path()), 0);
    }

    #[test]
    fn missing_source_is_unreadable() {
        let tmp = tempfile::tempdir().unwrap();
        let err = decompress(Path::new("/nonexistent/missing.ppd.gz"), tmp.path()).unwrap_err();
        assert!(matches!(err, PpdError::DocumentUnreadable(_)));
        assert_eq!(entries(tmp.path()), 0);
    }

    #[test]
    fn existing_name_is_a_conflict() {
        let tmp = tempfile::tempdir().unwrap();
        let taken = tmp.path().join("taken.ppd");
        std::fs::write(&taken, b"x").unwrap();

        let err = create_exclusive(&taken).unwrap_err();
        assert!(matches!(err, PpdError::TempFileConflict(_)));
        // The existing file is untouched.
        assert_eq!(std::fs::read(&taken).unwrap(), b"x");
    }

    #[test]
    fn decompress_conflict_keeps_existing_file() {
        let src = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let gz = write_gz(src.path(), "a.ppd.gz", b"*PPD-Adobe: \"4.3\"\n");
        let taken = tmp.path().join("planted.ppd");
        std::fs::write(&taken, b"planted").unwrap();

        let input = File::open(&gz).unwrap();
        let err = decompress_into(&gz, input, taken.clone()).unwrap_err();
        assert!(matches!(err, PpdError::TempFileConflict(_)));

        // Not overwritten, not removed, and no second name was tried.
        assert_eq!(std::fs::read(&taken).unwrap(), b"planted");
        assert_eq!(entries(tmp.path()), 1);
    }

    #[test]
    fn concatenated_members_decode_fully() {
        let src = tempfile::tempdir().unwrap();
        let tmp = tempfile::tempdir().unwrap();
        let gz = src.path().join("multi.ppd.gz");
        let mut bytes = Vec::new();
        for part in [&b"*PPD-Adobe: \"4.3\"\n"[..], &b"*Manufacturer: \"Acme\"\n"[..]] {
            let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
            encoder.write_all(part).unwrap();
            bytes.extend(encoder.finish().unwrap());
        }
        std::fs::write(&gz, &bytes).unwrap();

        let temp = decompress_reader(&gz, &bytes[..], tmp.path()).unwrap();
        let text = std::fs::read_to_string(temp.path()).unwrap();
        assert_eq!(text, "*PPD-Adobe: \"4.3\"\n*Manufacturer: \"Acme\"\n");
    }

    #[test]
    fn extract_copies_plain_documents() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let plain = src.path().join("acme.ppd");
        std::fs::write(&plain, b"*PPD-Adobe: \"4.3\"\n").unwrap();

        let path = extract_plaintext(&plain, out.path()).unwrap();
        assert_eq!(path, out.path().join("acme.ppd"));
        assert_eq!(std::fs::read(&path).unwrap(), b"*PPD-Adobe: \"4.3\"\n");
        // The source is left in place.
        assert!(plain.exists());
    }

    #[test]
    fn extract_keeps_plaintext_name() {
        let src = tempfile::tempdir().unwrap();
        let out = tempfile::tempdir().unwrap();
        let gz = write_gz(src.path(), "acme.ppd.gz", b"*PPD-Adobe: \"4.3\"\n");

        let path = extract_plaintext(&gz, out.path()).unwrap();
        assert_eq!(path, out.path().join("acme.ppd"));
        assert!(path.exists());

        let again = extract_plaintext(&gz, out.path()).unwrap_err();
        assert!(matches!(again, PpdError::TempFileConflict(_)));
    }
}
