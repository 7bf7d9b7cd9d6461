//! Model artifact resolution and downloading.

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use std::fs::{self, File};
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// File name of the engagement classifier artifact.
pub const MODEL_FILENAME: &str = "student_engagement.safetensors";

/// Download progress callback: `(file name, bytes downloaded, total bytes)`.
pub type ProgressCallback = Box<dyn Fn(&str, u64, Option<u64>) + Send + Sync>;

/// Returns the models directory path.
///
/// Uses `XDG_DATA_HOME/engagement/models` or `~/.local/share/engagement/models`.
#[must_use]
pub fn models_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("engagement")
        .join("models")
}

/// Returns the default artifact path inside the models directory.
#[must_use]
pub fn default_model_path() -> PathBuf {
    models_dir().join(MODEL_FILENAME)
}

/// Resolves which model file to load.
///
/// An explicit path (CLI flag, then configuration) always wins. Otherwise the
/// models directory is used, falling back to a copy in the working directory
/// when only that one exists.
#[must_use]
pub fn resolve_model_path(cli: Option<&Path>, configured: Option<&Path>) -> PathBuf {
    if let Some(path) = cli.or(configured) {
        return path.to_path_buf();
    }

    let installed = default_model_path();
    if installed.exists() {
        return installed;
    }

    let local = PathBuf::from(MODEL_FILENAME);
    if local.exists() {
        debug!("Using model from working directory");
        return local;
    }

    installed
}

/// Computes the lowercase hex SHA-256 digest of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn file_sha256(path: &Path) -> Result<String> {
    let mut file =
        File::open(path).with_context(|| format!("Failed to open {}", path.display()))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = file
            .read(&mut buf)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("{:x}", hasher.finalize()))
}

/// Checks a digest against an expected hex string, ignoring case and whitespace.
///
/// # Errors
///
/// Returns an error describing both digests on mismatch.
pub fn verify_checksum(actual: &str, expected: &str) -> Result<()> {
    let expected = expected.trim().to_ascii_lowercase();
    if actual.eq_ignore_ascii_case(&expected) {
        Ok(())
    } else {
        anyhow::bail!("Checksum mismatch: expected {expected}, got {actual}")
    }
}

/// Downloads a model artifact to `dest`.
///
/// The body is streamed to a sibling `.part` file and only renamed into place
/// once the download completed and, if given, the checksum matched.
///
/// # Errors
///
/// Returns an error if:
/// - The destination directory cannot be created
/// - The download fails or returns a non-success status
/// - The checksum doesn't match
pub fn fetch_model(
    url: &str,
    sha256: Option<&str>,
    dest: &Path,
    progress: Option<&ProgressCallback>,
) -> Result<()> {
    if let Some(parent) = dest.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context("Failed to create models directory")?;
    }

    let name = dest
        .file_name()
        .map_or_else(|| MODEL_FILENAME.to_string(), |n| n.to_string_lossy().into_owned());
    info!(url, dest = %dest.display(), "Downloading model");

    let mut response =
        reqwest::blocking::get(url).with_context(|| format!("Failed to download {url}"))?;

    if !response.status().is_success() {
        anyhow::bail!("Download failed with status: {}", response.status());
    }

    let total = response.content_length();
    let part = dest.with_extension("safetensors.part");
    let downloaded = download_part(&mut response, &part, sha256, &name, total, progress)?;

    fs::rename(&part, dest).with_context(|| format!("Failed to move {name} into place"))?;

    info!("Downloaded {} ({} bytes)", name, downloaded);
    Ok(())
}

/// Streams `reader` into `part`, verifying the checksum when one is given.
///
/// Any failure removes the partial file. Returns the number of bytes written.
fn download_part(
    reader: &mut impl Read,
    part: &Path,
    sha256: Option<&str>,
    name: &str,
    total: Option<u64>,
    progress: Option<&ProgressCallback>,
) -> Result<u64> {
    let result = stream_to_file(reader, part, name, total, progress).and_then(
        |(digest, downloaded)| {
            match sha256 {
                Some(expected) => verify_checksum(&digest, expected).with_context(|| {
                    format!("Downloaded {name} is corrupt. Try re-running to download a fresh copy.")
                })?,
                None => debug!(sha256 = %digest, "Skipping checksum verification"),
            }
            Ok(downloaded)
        },
    );

    if result.is_err() && part.exists() {
        if let Err(rm) = fs::remove_file(part) {
            warn!("Failed to remove {}: {rm}", part.display());
        }
    }
    result
}

fn stream_to_file(
    reader: &mut impl Read,
    part: &Path,
    name: &str,
    total: Option<u64>,
    progress: Option<&ProgressCallback>,
) -> Result<(String, u64)> {
    let mut file =
        File::create(part).with_context(|| format!("Failed to create {}", part.display()))?;
    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;
    let mut buf = [0u8; 64 * 1024];

    loop {
        let n = reader
            .read(&mut buf)
            .with_context(|| format!("Failed to read response for {name}"))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
        file.write_all(&buf[..n])
            .with_context(|| format!("Failed to write {}", part.display()))?;
        downloaded += n as u64;
        if let Some(cb) = progress {
            cb(name, downloaded, total);
        }
    }
    file.flush()
        .with_context(|| format!("Failed to write {}", part.display()))?;

    Ok((format!("{:x}", hasher.finalize()), downloaded))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_models_dir() {
        let dir = models_dir();
        assert!(dir.ends_with("engagement/models"));
    }

    #[test]
    fn test_default_model_path() {
        assert!(default_model_path().ends_with("engagement/models/student_engagement.safetensors"));
    }

    #[test]
    fn test_resolve_prefers_cli_over_config() {
        let resolved = resolve_model_path(Some(Path::new("a.safetensors")), Some(Path::new("b")));
        assert_eq!(resolved, PathBuf::from("a.safetensors"));

        let resolved = resolve_model_path(None, Some(Path::new("b.safetensors")));
        assert_eq!(resolved, PathBuf::from("b.safetensors"));
    }

    #[test]
    fn test_verify_checksum() {
        let digest = "ab".repeat(32);
        assert!(verify_checksum(&digest, &"AB".repeat(32)).is_ok());
        assert!(verify_checksum(&digest, &format!(" {digest}\n")).is_ok());
        assert!(verify_checksum(&digest, &"cd".repeat(32)).is_err());
    }

    #[test]
    fn test_file_sha256() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let path = dir.path().join("abc.bin");
        fs::write(&path, b"abc").unwrap_or_else(|e| panic!("{e}"));

        let digest = file_sha256(&path).unwrap_or_else(|e| panic!("{e}"));

        assert_eq!(
            digest,
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_fetch_rejects_unreachable_url() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let dest = dir.path().join(MODEL_FILENAME);

        let result = fetch_model("http://127.0.0.1:9/model.safetensors", None, &dest, None);

        assert!(result.is_err());
        assert!(!dest.exists());
    }

    /// Yields `chunk` once, then fails like a dropped connection.
    struct BrokenStream {
        chunk: Option<Vec<u8>>,
    }

    impl Read for BrokenStream {
        fn read(&mut self, buf: &mut [u8]) -> std::io::Result<usize> {
            match self.chunk.take() {
                Some(chunk) => {
                    buf[..chunk.len()].copy_from_slice(&chunk);
                    Ok(chunk.len())
                }
                None => Err(std::io::Error::new(
                    std::io::ErrorKind::ConnectionReset,
                    "connection reset",
                )),
            }
        }
    }

    #[test]
    fn test_download_part_removes_partial_file_on_read_error() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let part = dir.path().join("model.safetensors.part");
        let mut stream = BrokenStream {
            chunk: Some(b"half a model".to_vec()),
        };

        let err = download_part(&mut stream, &part, None, "model", None, None)
            .err()
            .unwrap_or_else(|| panic!("download should fail"));

        assert!(format!("{err:#}").contains("connection reset"));
        assert!(!part.exists());
    }

    #[test]
    fn test_download_part_removes_partial_file_on_checksum_mismatch() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let part = dir.path().join("model.safetensors.part");

        let result = download_part(
            &mut std::io::Cursor::new(b"abc".to_vec()),
            &part,
            Some(&"00".repeat(32)),
            "model",
            Some(3),
            None,
        );

        assert!(result.is_err());
        assert!(!part.exists());
    }

    #[test]
    fn test_download_part_keeps_verified_file() {
        let dir = tempfile::tempdir().unwrap_or_else(|e| panic!("{e}"));
        let part = dir.path().join("model.safetensors.part");

        let written = download_part(
            &mut std::io::Cursor::new(b"abc".to_vec()),
            &part,
            Some("ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"),
            "model",
            Some(3),
            None,
        )
        .unwrap_or_else(|e| panic!("{e:#}"));

        assert_eq!(written, 3);
        assert_eq!(fs::read(&part).unwrap_or_default(), b"abc");
    }
}
