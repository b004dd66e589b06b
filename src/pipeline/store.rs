//! Persistence: write an uploaded file under the media root.
//!
//! Each upload lands in its own scratch directory (`upload-XXXXXX`) inside the
//! media root. The directory is a [`TempDir`], so it disappears when the
//! [`StoredFile`] is dropped, including on early return or panic. Two
//! concurrent uploads with the same name never see each other's bytes.
//!
//! Client filenames are untrusted. [`sanitize_filename`] keeps only the final
//! path component, so `../../etc/passwd` is stored as `passwd` inside the
//! scratch directory.

use crate::error::DocTranslateError;
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::debug;

/// Name used when the client-supplied one is unusable.
const FALLBACK_NAME: &str = "upload";

/// Longest filename (in bytes) accepted by common filesystems.
const MAX_NAME_BYTES: usize = 255;

/// An upload persisted for the duration of one request.
#[derive(Debug)]
pub struct StoredFile {
    path: PathBuf,
    file_name: String,
    size: usize,
    /// Kept alive until the request finishes; removal happens on drop.
    _scratch: TempDir,
}

impl StoredFile {
    /// Absolute path of the stored bytes.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The sanitised filename the bytes were stored under.
    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn size(&self) -> usize {
        self.size
    }
}

/// Reduce a client-supplied filename to a single safe path component.
///
/// Drops directory parts (either separator), control characters and
/// characters Windows refuses in names. `""`, `.` and `..` become `upload`.
/// Result is capped at 255 bytes on a char boundary.
pub fn sanitize_filename(name: &str) -> String {
    let last = name.rsplit(|c: char| c == '/' || c == '\\').next().unwrap_or("");

    let cleaned: String = last
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| match c {
            '<' | '>' | ':' | '"' | '|' | '?' | '*' => '_',
            other => other,
        })
        .collect();
    let cleaned = cleaned.trim();

    if cleaned.is_empty() || cleaned == "." || cleaned == ".." {
        return FALLBACK_NAME.to_string();
    }

    let mut end = cleaned.len().min(MAX_NAME_BYTES);
    while !cleaned.is_char_boundary(end) {
        end -= 1;
    }
    cleaned[..end].to_string()
}

/// Write `content` verbatim to a fresh scratch directory under `media_root`.
///
/// Creates the media root if it does not exist yet.
pub async fn save_upload(
    media_root: &Path,
    filename: &str,
    content: &[u8],
) -> Result<StoredFile, DocTranslateError> {
    tokio::fs::create_dir_all(media_root)
        .await
        .map_err(|e| DocTranslateError::SaveFailed {
            path: media_root.to_path_buf(),
            source: e,
        })?;

    let scratch = tempfile::Builder::new()
        .prefix("upload-")
        .tempdir_in(media_root)
        .map_err(|e| DocTranslateError::SaveFailed {
            path: media_root.to_path_buf(),
            source: e,
        })?;

    let file_name = sanitize_filename(filename);
    let path = scratch.path().join(&file_name);

    tokio::fs::write(&path, content)
        .await
        .map_err(|e| DocTranslateError::SaveFailed {
            path: path.clone(),
            source: e,
        })?;

    debug!("Stored upload {:?} ({} bytes) at {}", filename, content.len(), path.display());

    Ok(StoredFile {
        path,
        file_name,
        size: content.len(),
        _scratch: scratch,
    })
}
