// ─── Runtime Provisioner ───
// Downloads the pinned Temurin JRE for the host, unpacks it under `jre/`
// and points the launcher settings at it.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{error, info, instrument};

use super::platform::Platform;
use crate::core::downloader::download_file;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::Transport;
use crate::core::native::NativeBoundary;
use crate::core::state::settings::SettingsManager;

const RELEASE_BASE_URL: &str = "https://github.com/adoptium/temurin21-binaries/releases/download";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeStatus {
    #[default]
    Idle,
    Downloading,
    Extracting,
    Done,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RuntimeProgress {
    pub status: RuntimeStatus,
    pub downloaded: u64,
    pub total: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type RuntimeProgressFn<'a> = &'a (dyn Fn(&RuntimeProgress) + Send + Sync);

/// Archive name of the JRE build for `platform`.
pub fn runtime_archive_name(version: &str, platform: Platform) -> String {
    format!(
        "OpenJDK21U-jre_{}_{}_hotspot_{}.{}",
        platform.arch.as_str(),
        platform.os.as_str(),
        version.replace('+', "_"),
        platform.os.archive_extension()
    )
}

pub fn runtime_download_url(version: &str, platform: Platform) -> String {
    format!(
        "{}/jdk-{}/{}",
        RELEASE_BASE_URL,
        version,
        runtime_archive_name(version, platform)
    )
}

pub struct RuntimeProvisioner {
    runtime_dir: PathBuf,
    version: String,
    platform: Option<Platform>,
    transport: Arc<dyn Transport>,
    native: Arc<dyn NativeBoundary>,
    progress: RuntimeProgress,
}

impl RuntimeProvisioner {
    pub fn new(
        runtime_dir: PathBuf,
        version: impl Into<String>,
        transport: Arc<dyn Transport>,
        native: Arc<dyn NativeBoundary>,
    ) -> Self {
        Self {
            runtime_dir,
            version: version.into(),
            platform: None,
            transport,
            native,
            progress: RuntimeProgress::default(),
        }
    }

    /// Provision for `platform` instead of the host.
    pub fn with_platform(mut self, platform: Platform) -> Self {
        self.platform = Some(platform);
        self
    }

    pub fn progress(&self) -> &RuntimeProgress {
        &self.progress
    }

    pub fn runtime_dir(&self) -> &Path {
        &self.runtime_dir
    }

    /// Whether a managed runtime directory exists at all.
    pub async fn is_local_runtime_present(&self) -> bool {
        tokio::fs::try_exists(&self.runtime_dir)
            .await
            .unwrap_or(false)
    }

    /// Fetch and unpack the runtime, then store its path in `settings`.
    ///
    /// An archive already on disk is reused. On failure the progress stays in
    /// the `Error` state until the next attempt.
    #[instrument(skip_all, fields(version = %self.version))]
    pub async fn provision(
        &mut self,
        settings: &mut SettingsManager,
        on_progress: RuntimeProgressFn<'_>,
    ) -> LauncherResult<PathBuf> {
        self.progress = RuntimeProgress {
            status: RuntimeStatus::Downloading,
            ..RuntimeProgress::default()
        };
        on_progress(&self.progress);

        match self.run(settings, on_progress).await {
            Ok(path) => {
                self.progress.status = RuntimeStatus::Done;
                on_progress(&self.progress);
                info!("Java runtime ready at {:?}", path);
                Ok(path)
            }
            Err(e) => {
                error!("Runtime provisioning failed: {}", e);
                self.progress.status = RuntimeStatus::Error;
                self.progress.error = Some(e.to_string());
                on_progress(&self.progress);
                Err(e)
            }
        }
    }

    async fn run(
        &mut self,
        settings: &mut SettingsManager,
        on_progress: RuntimeProgressFn<'_>,
    ) -> LauncherResult<PathBuf> {
        let platform = match self.platform {
            Some(platform) => platform,
            None => Platform::current()?,
        };

        tokio::fs::create_dir_all(&self.runtime_dir)
            .await
            .map_err(|source| LauncherError::Io {
                path: self.runtime_dir.clone(),
                source,
            })?;

        let archive = self
            .runtime_dir
            .join(runtime_archive_name(&self.version, platform));
        if tokio::fs::try_exists(&archive).await.unwrap_or(false) {
            info!("Reusing runtime archive {:?}", archive);
        } else {
            let url = runtime_download_url(&self.version, platform);
            info!("Downloading Java runtime from {}", url);
            self.download(&url, &archive, on_progress).await?;
        }

        self.progress.status = RuntimeStatus::Extracting;
        on_progress(&self.progress);
        let root = self
            .native
            .extract_archive(&archive, &self.runtime_dir)
            .await?;

        let runtime_path = self.runtime_dir.join(root);
        settings.set_runtime_path(runtime_path.to_string_lossy());
        settings.save().await?;
        Ok(runtime_path)
    }

    async fn download(
        &mut self,
        url: &str,
        archive: &Path,
        on_progress: RuntimeProgressFn<'_>,
    ) -> LauncherResult<()> {
        let downloaded = AtomicU64::new(0);
        let total = AtomicU64::new(0);
        let result = download_file(self.transport.as_ref(), url, archive, &|done, size| {
            downloaded.store(done, Ordering::Relaxed);
            total.store(size.unwrap_or(0), Ordering::Relaxed);
            on_progress(&RuntimeProgress {
                status: RuntimeStatus::Downloading,
                downloaded: done,
                total: size.unwrap_or(0),
                error: None,
            });
        })
        .await;

        self.progress.downloaded = downloaded.load(Ordering::Relaxed);
        self.progress.total = total.load(Ordering::Relaxed);
        result
    }
}
