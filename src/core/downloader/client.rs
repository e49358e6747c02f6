use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{ProgressFn, Transport};

/// Download `url` to `dest` through the transport.
///
/// Bytes land in `<dest>.part` first and are renamed into place once the
/// transfer completed, so an interrupted download never looks present.
pub async fn download_file(
    transport: &dyn Transport,
    url: &str,
    dest: &Path,
    on_progress: ProgressFn<'_>,
) -> LauncherResult<()> {
    if let Some(parent) = dest.parent() {
        tokio::fs::create_dir_all(parent)
            .await
            .map_err(|source| LauncherError::Io {
                path: parent.to_path_buf(),
                source,
            })?;
    }

    let part = part_path(dest);
    if let Err(e) = transport.download_to_file(url, &part, on_progress).await {
        let _ = tokio::fs::remove_file(&part).await;
        return Err(e);
    }

    tokio::fs::rename(&part, dest)
        .await
        .map_err(|source| LauncherError::Io {
            path: dest.to_path_buf(),
            source,
        })?;
    debug!("Downloaded: {} -> {:?}", url, dest);
    Ok(())
}

fn part_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}
