//! Screenshot export.
//!
//! The manager hands over the display as a PNG blob; this module only
//! checks the signature and writes it out asynchronously.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

const PNG_SIGNATURE: [u8; 8] = [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A];

#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error("screenshot data is not a PNG image")]
    NotPng,

    #[error("I/O error writing screenshot to {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn is_png(bytes: &[u8]) -> bool {
    bytes.starts_with(&PNG_SIGNATURE)
}

/// Writes `png` to `path`, creating the parent directory if needed.
/// An existing file is overwritten.
///
/// # Errors
///
/// Returns [`ScreenshotError::NotPng`] if the blob lacks the PNG signature,
/// or [`ScreenshotError::Io`] if the file cannot be written.
pub async fn save_screenshot(path: &Path, png: &[u8]) -> Result<PathBuf, ScreenshotError> {
    if !is_png(png) {
        return Err(ScreenshotError::NotPng);
    }
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|source| ScreenshotError::Io {
                path: dir.to_path_buf(),
                source,
            })?;
    }
    tokio::fs::write(path, png)
        .await
        .map_err(|source| ScreenshotError::Io {
            path: path.to_path_buf(),
            source,
        })?;
    info!(path = %path.display(), bytes = png.len(), "screenshot saved");
    Ok(path.to_path_buf())
}
