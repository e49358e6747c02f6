// ─── Version Registry ───
// Fetches the channel's latest update manifest and keeps every version seen
// both in memory and under `versions/<version>.json`.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::metadata::VersionMetadata;
use crate::core::config::LauncherConfig;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::Transport;
use crate::core::paths::is_plain_file_name;
use crate::core::state::settings::ReleaseChannel;

pub struct VersionRegistry {
    versions_dir: PathBuf,
    config: LauncherConfig,
    transport: Arc<dyn Transport>,
    cache: HashMap<String, VersionMetadata>,
    latest_version: Option<String>,
}

impl VersionRegistry {
    pub fn new(versions_dir: PathBuf, config: &LauncherConfig, transport: Arc<dyn Transport>) -> Self {
        Self {
            versions_dir,
            config: config.clone(),
            transport,
            cache: HashMap::new(),
            latest_version: None,
        }
    }

    pub fn latest_version(&self) -> Option<&str> {
        self.latest_version.as_deref()
    }

    /// Fetch the newest build published on `channel` and record it.
    pub async fn fetch_latest_version(
        &mut self,
        channel: ReleaseChannel,
    ) -> LauncherResult<VersionMetadata> {
        let url = self.config.update_url(channel.as_str());
        info!("Checking for updates on the {} channel", channel);

        let response = self.transport.get(&url, None).await?.error_for_status(&url)?;
        let meta: VersionMetadata = response.json()?;

        info!("Latest {} version is {}", channel, meta.version);
        self.store_version_metadata(meta.clone()).await?;
        Ok(meta)
    }

    /// Write `meta` to disk and make it the latest known version.
    /// Storing the same version again replaces it.
    pub async fn store_version_metadata(&mut self, meta: VersionMetadata) -> LauncherResult<()> {
        let path = self.metadata_path(&meta.version)?;
        tokio::fs::create_dir_all(&self.versions_dir)
            .await
            .map_err(|source| LauncherError::Io {
                path: self.versions_dir.clone(),
                source,
            })?;

        let json = serde_json::to_string_pretty(&meta)?;
        tokio::fs::write(&path, json)
            .await
            .map_err(|source| LauncherError::Io {
                path: path.clone(),
                source,
            })?;
        debug!("Stored version metadata at {:?}", path);

        self.latest_version = Some(meta.version.clone());
        self.cache.insert(meta.version.clone(), meta);
        Ok(())
    }

    /// Metadata for `version`, from memory or from its persisted file.
    pub async fn read_version_metadata(&mut self, version: &str) -> LauncherResult<VersionMetadata> {
        if let Some(meta) = self.cache.get(version) {
            return Ok(meta.clone());
        }

        let path = self.metadata_path(version)?;
        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(LauncherError::VersionNotFound(version.to_string()))
            }
            Err(source) => return Err(LauncherError::Io { path, source }),
        };

        let meta: VersionMetadata = serde_json::from_slice(&bytes).map_err(|e| {
            warn!("Unreadable version metadata at {:?}: {}", path, e);
            LauncherError::VersionNotFound(version.to_string())
        })?;
        self.cache.insert(version.to_string(), meta.clone());
        Ok(meta)
    }

    fn metadata_path(&self, version: &str) -> LauncherResult<PathBuf> {
        if !is_plain_file_name(version) {
            return Err(LauncherError::VersionNotFound(version.to_string()));
        }
        Ok(self.versions_dir.join(format!("{version}.json")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::MockTransport;
    use std::path::Path;
    use serde_json::json;

    const STABLE_URL: &str = "https://update.seleneworlds.com/selene-client/stable/latest.json";

    fn manifest() -> serde_json::Value {
        json!({
            "version": "1.2.0",
            "url": "https://cdn.example/selene-client-1.2.0.jar",
            "fileName": "selene-client-1.2.0.jar",
            "libraries": {
                "b.jar": "https://cdn.example/libs/b.jar",
                "a.jar": "https://cdn.example/libs/a.jar"
            }
        })
    }

    fn registry(dir: &Path, transport: Arc<MockTransport>) -> VersionRegistry {
        VersionRegistry::new(dir.join("versions"), &LauncherConfig::default(), transport)
    }

    #[tokio::test]
    async fn fetch_persists_and_sets_latest() {
        let temp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::new().json(STABLE_URL, manifest()));
        let mut registry = registry(temp.path(), transport.clone());

        let meta = registry
            .fetch_latest_version(ReleaseChannel::Stable)
            .await
            .unwrap();
        assert_eq!(meta.version, "1.2.0");
        assert_eq!(registry.latest_version(), Some("1.2.0"));
        assert!(temp.path().join("versions/1.2.0.json").exists());

        // A fresh registry reads the persisted copy with library order intact.
        let mut reopened = registry_with_empty_transport(temp.path());
        let read = reopened.read_version_metadata("1.2.0").await.unwrap();
        assert_eq!(read, meta);
        assert_eq!(read.libraries.keys().map(String::as_str).collect::<Vec<_>>(), ["b.jar", "a.jar"]);
    }

    fn registry_with_empty_transport(dir: &Path) -> VersionRegistry {
        registry(dir, Arc::new(MockTransport::new()))
    }

    #[tokio::test]
    async fn failed_fetch_is_download_failed() {
        let temp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::new().route(STABLE_URL, 503, Vec::<u8>::new()));
        let mut registry = registry(temp.path(), transport);

        let err = registry
            .fetch_latest_version(ReleaseChannel::Stable)
            .await
            .unwrap_err();
        assert!(matches!(err, LauncherError::DownloadFailed { status: 503, .. }));
        assert_eq!(registry.latest_version(), None);
    }

    #[tokio::test]
    async fn missing_or_unsafe_versions_are_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let mut registry = registry_with_empty_transport(temp.path());

        for version in ["9.9.9", "../settings", "a/b", ".."] {
            assert!(matches!(
                registry.read_version_metadata(version).await,
                Err(LauncherError::VersionNotFound(_))
            ));
        }
    }

    #[tokio::test]
    async fn malformed_file_is_not_found() {
        let temp = tempfile::tempdir().unwrap();
        let versions = temp.path().join("versions");
        tokio::fs::create_dir_all(&versions).await.unwrap();
        tokio::fs::write(versions.join("1.0.0.json"), b"{ not json").await.unwrap();

        let mut registry = registry_with_empty_transport(temp.path());
        assert!(matches!(
            registry.read_version_metadata("1.0.0").await,
            Err(LauncherError::VersionNotFound(_))
        ));
    }

    #[tokio::test]
    async fn storing_twice_keeps_last_write() {
        let temp = tempfile::tempdir().unwrap();
        let mut registry = registry_with_empty_transport(temp.path());
        let mut meta: VersionMetadata = serde_json::from_value(manifest()).unwrap();

        registry.store_version_metadata(meta.clone()).await.unwrap();
        meta.file_name = "renamed.jar".into();
        registry.store_version_metadata(meta.clone()).await.unwrap();

        let mut reopened = registry_with_empty_transport(temp.path());
        assert_eq!(
            reopened.read_version_metadata("1.2.0").await.unwrap().file_name,
            "renamed.jar"
        );
    }
}
