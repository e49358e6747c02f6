// ─── Application Context ───
// Built once at startup and passed explicitly to every command. Operations
// that mutate launcher state take `&mut self`; share the context behind an
// `Arc<tokio::sync::Mutex<_>>` when calling it from several tasks.

use std::sync::Arc;

use tracing::info;

use super::settings::SettingsManager;
use crate::core::auth::{IdentityProvider, SessionManager};
use crate::core::bundles::{BundleCache, BundleProgressFn, BundleReport, BundleSync};
use crate::core::config::LauncherConfig;
use crate::core::downloader::{GameDownloader, StatusFn};
use crate::core::error::LauncherResult;
use crate::core::http::{ReqwestTransport, Transport};
use crate::core::java::{RuntimeProgressFn, RuntimeProvisioner};
use crate::core::launch::{LaunchOptions, LaunchOrchestrator};
use crate::core::native::{NativeBoundary, SystemNative};
use crate::core::paths::LauncherPaths;
use crate::core::servers::ServerDirectory;
use crate::core::version::{VersionMetadata, VersionRegistry};

pub struct AppContext {
    pub paths: LauncherPaths,
    pub config: LauncherConfig,
    pub transport: Arc<dyn Transport>,
    pub native: Arc<dyn NativeBoundary>,
    pub session: SessionManager,
    pub settings: SettingsManager,
    pub versions: VersionRegistry,
    pub downloader: GameDownloader,
    pub runtime: RuntimeProvisioner,
    pub bundles: BundleSync,
    pub launcher: LaunchOrchestrator,
    pub servers: ServerDirectory,
}

impl AppContext {
    /// Context backed by the real network and host.
    pub async fn initialize(config: LauncherConfig) -> LauncherResult<Self> {
        let paths = match &config.data_dir {
            Some(dir) => LauncherPaths::under(dir),
            None => LauncherPaths::from_system(),
        };
        let transport: Arc<dyn Transport> = Arc::new(ReqwestTransport::new()?);
        let native: Arc<dyn NativeBoundary> = Arc::new(SystemNative::new(config.main_class.clone()));
        Self::with_seams(paths, config, transport, native).await
    }

    pub async fn with_seams(
        paths: LauncherPaths,
        config: LauncherConfig,
        transport: Arc<dyn Transport>,
        native: Arc<dyn NativeBoundary>,
    ) -> LauncherResult<Self> {
        paths.ensure_dirs().await?;
        info!("Data directory: {:?}", paths.app_data_dir());

        let session = SessionManager::load(
            IdentityProvider::new(&config),
            transport.clone(),
            paths.auth_file(),
        )
        .await?;
        let settings = SettingsManager::load(&paths.settings_file(), native.as_ref()).await?;
        let versions = VersionRegistry::new(paths.versions_dir(), &config, transport.clone());
        let downloader = GameDownloader::new(paths.game_client_dir(), transport.clone());
        let runtime = RuntimeProvisioner::new(
            paths.runtime_dir(),
            config.runtime_version.clone(),
            transport.clone(),
            native.clone(),
        );
        let bundles = BundleSync::new(
            BundleCache::new(paths.bundles_dir()),
            transport.clone(),
            native.clone(),
        );
        let launcher = LaunchOrchestrator::new(paths.game_client_dir(), paths.game_run_dir());
        let servers = ServerDirectory::new(config.directory_url.clone(), transport.clone());

        Ok(Self {
            paths,
            config,
            transport,
            native,
            session,
            settings,
            versions,
            downloader,
            runtime,
            bundles,
            launcher,
            servers,
        })
    }

    /// Fetch the latest version on the configured release channel.
    pub async fn check_for_update(&mut self) -> LauncherResult<VersionMetadata> {
        let channel = self.settings.settings().release_channel;
        self.versions.fetch_latest_version(channel).await
    }

    pub async fn is_game_downloaded(&mut self, version: &str) -> LauncherResult<bool> {
        let meta = self.versions.read_version_metadata(version).await?;
        Ok(self.downloader.is_downloaded(&meta).await)
    }

    pub async fn download_game(
        &mut self,
        version: &str,
        on_status: StatusFn<'_>,
    ) -> LauncherResult<VersionMetadata> {
        let meta = self.versions.read_version_metadata(version).await?;
        self.downloader.start_download(&meta, on_status).await?;
        Ok(meta)
    }

    pub async fn provision_runtime(
        &mut self,
        on_progress: RuntimeProgressFn<'_>,
    ) -> LauncherResult<std::path::PathBuf> {
        self.runtime
            .provision(&mut self.settings, on_progress)
            .await
    }

    /// Bring the bundles of `server_url` up to date and remember the server.
    pub async fn sync_bundles(
        &mut self,
        server_url: &str,
        on_progress: BundleProgressFn<'_>,
    ) -> LauncherResult<BundleReport> {
        let bearer = self.session.bundle_bearer().await?;
        let check = self.bundles.check_bundles(server_url, &bearer).await?;
        let report = self
            .bundles
            .download_bundles(server_url, &bearer, &check.to_download, on_progress)
            .await?;

        self.settings
            .set_last_joined_server(Some(server_url.to_string()));
        self.settings.save().await?;
        Ok(report)
    }

    pub async fn launch_game(&mut self, version: &str, options: &LaunchOptions) -> LauncherResult<()> {
        let meta = self.versions.read_version_metadata(version).await?;
        let runtime_path = self.settings.settings().runtime_path.clone();
        self.launcher
            .launch(self.native.as_ref(), &meta, &runtime_path, options)
            .await
    }
}
