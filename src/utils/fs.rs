//! File-system helpers for the download path.

use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::fs;
use tracing::debug;

use crate::core::OperationKind;
use crate::utils::{ReviveError, ReviveResult};

/// File-name prefix for saved downloads.
const DOWNLOAD_PREFIX: &str = "photorevive-4k";

/// Builds the download file name: `photorevive-4k-<operation>-<unix-millis>.jpg`.
pub fn download_file_name(operation: OperationKind) -> String {
    format!(
        "{DOWNLOAD_PREFIX}-{}-{}.jpg",
        operation.as_str(),
        Utc::now().timestamp_millis()
    )
}

/// Writes the upscaled bytes into `dir` under a generated name.
pub async fn save_download(
    dir: &Path,
    operation: OperationKind,
    bytes: &[u8],
) -> ReviveResult<PathBuf> {
    fs::create_dir_all(dir)
        .await
        .map_err(|e| ReviveError::io(format!("Failed to create download directory: {e}")))?;

    let path = dir.join(download_file_name(operation));
    fs::write(&path, bytes)
        .await
        .map_err(|e| ReviveError::io(format!("Failed to write download: {e}")))?;

    debug!("Download saved to {}", path.display());
    Ok(path)
}
