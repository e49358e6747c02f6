// ─── Game Downloader ───
// Makes sure the client artifact and every library of a version exist under
// `game_client/`. Files already on disk are trusted as-is.

use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, error, info, instrument, warn};

use super::client::download_file;
use crate::core::error::{BatchPolicy, LauncherError, LauncherResult};
use crate::core::http::Transport;
use crate::core::version::{GameFile, VersionMetadata};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FileStatus {
    Downloading,
    Done,
    Error,
}

/// Progress of one file within a download batch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DownloadStatus {
    pub file: String,
    /// 1-based position in the batch.
    pub index: usize,
    pub total: usize,
    /// Percent of this file.
    pub progress: u8,
    /// Percent of the batch completed.
    pub overall: u8,
    pub status: FileStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

pub type StatusFn<'a> = &'a (dyn Fn(&DownloadStatus) + Send + Sync);

pub struct GameDownloader {
    game_dir: PathBuf,
    transport: Arc<dyn Transport>,
    policy: BatchPolicy,
    is_downloading: bool,
    progress: u8,
    error: Option<String>,
    is_complete: bool,
}

impl GameDownloader {
    pub fn new(game_dir: PathBuf, transport: Arc<dyn Transport>) -> Self {
        Self {
            game_dir,
            transport,
            policy: BatchPolicy::FailFast,
            is_downloading: false,
            progress: 0,
            error: None,
            is_complete: false,
        }
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn is_downloading(&self) -> bool {
        self.is_downloading
    }

    /// Overall percent of the last batch.
    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn is_complete(&self) -> bool {
        self.is_complete
    }

    pub fn reset(&mut self) {
        self.is_downloading = false;
        self.progress = 0;
        self.error = None;
        self.is_complete = false;
    }

    /// True when every file `meta` needs is on disk.
    pub async fn is_downloaded(&self, meta: &VersionMetadata) -> bool {
        for file in meta.required_files() {
            let exists = tokio::fs::try_exists(self.game_dir.join(&file.name))
                .await
                .unwrap_or(false);
            if !exists {
                return false;
            }
        }
        true
    }

    /// Download whatever `meta` is missing, one file after another.
    #[instrument(skip(self, meta, on_status), fields(version = %meta.version))]
    pub async fn start_download(
        &mut self,
        meta: &VersionMetadata,
        on_status: StatusFn<'_>,
    ) -> LauncherResult<()> {
        self.reset();
        self.is_downloading = true;

        let result = self.download_all(meta, on_status).await;

        self.is_downloading = false;
        match &result {
            Ok(()) => self.is_complete = true,
            Err(e) => {
                error!("Game download failed: {}", e);
                self.error = Some(e.to_string());
            }
        }
        result
    }

    async fn download_all(
        &mut self,
        meta: &VersionMetadata,
        on_status: StatusFn<'_>,
    ) -> LauncherResult<()> {
        let files = meta.required_files();
        let total = files.len();
        let mut failed = Vec::new();
        info!("Checking {} game files for {}", total, meta.version);

        for (i, file) in files.iter().enumerate() {
            let completed_before = overall_percent(i, total);
            let status = |progress: u8, status: FileStatus, error: Option<String>, overall: u8| {
                DownloadStatus {
                    file: file.name.clone(),
                    index: i + 1,
                    total,
                    progress,
                    overall,
                    status,
                    error,
                }
            };

            match self.fetch_if_missing(file, &|progress| {
                on_status(&status(progress, FileStatus::Downloading, None, completed_before))
            })
            .await
            {
                Ok(()) => {
                    self.progress = overall_percent(i + 1, total);
                    on_status(&status(100, FileStatus::Done, None, self.progress));
                }
                Err(e) => {
                    on_status(&status(0, FileStatus::Error, Some(e.to_string()), completed_before));
                    if self.policy == BatchPolicy::FailFast || !e.is_fetch_failure() {
                        return Err(e);
                    }
                    warn!("Skipping {} after failure: {}", file.name, e);
                    failed.push(file.name.clone());
                }
            }
        }

        if failed.is_empty() {
            Ok(())
        } else {
            Err(LauncherError::Other(format!(
                "{} game files failed to download: {}",
                failed.len(),
                failed.join(", ")
            )))
        }
    }

    async fn fetch_if_missing(
        &self,
        file: &GameFile,
        on_file_progress: &(dyn Fn(u8) + Send + Sync),
    ) -> LauncherResult<()> {
        let dest = self.game_dir.join(&file.name);
        if tokio::fs::try_exists(&dest).await.unwrap_or(false) {
            debug!("{} already present", file.name);
            return Ok(());
        }

        on_file_progress(0);
        let last = AtomicU8::new(0);
        download_file(self.transport.as_ref(), &file.url, &dest, &|done, total| {
            let percent = match total {
                Some(total) if total > 0 => ((done.min(total) * 100) / total) as u8,
                _ => 0,
            };
            if percent > last.load(Ordering::Relaxed) && percent < 100 {
                last.store(percent, Ordering::Relaxed);
                on_file_progress(percent);
            }
        })
        .await
    }
}

fn overall_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((completed as f64 / total as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::test_support::MockTransport;
    use serde_json::json;
    use std::sync::Mutex;

    const CLIENT_URL: &str = "https://cdn.example/selene-client-1.2.0.jar";
    const LIB_URL: &str = "https://cdn.example/libs/kotlin-stdlib.jar";

    fn version() -> VersionMetadata {
        serde_json::from_value(json!({
            "version": "1.2.0",
            "url": CLIENT_URL,
            "fileName": "selene-client-1.2.0.jar",
            "libraries": { "kotlin-stdlib.jar": LIB_URL }
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn downloads_each_file_then_skips_on_repeat() {
        let temp = tempfile::tempdir().unwrap();
        let transport = Arc::new(
            MockTransport::new()
                .route(CLIENT_URL, 200, b"client".to_vec())
                .route(LIB_URL, 200, b"lib".to_vec()),
        );
        let mut downloader = GameDownloader::new(temp.path().join("game_client"), transport.clone());
        let meta = version();
        assert!(!downloader.is_downloaded(&meta).await);

        let events = Mutex::new(Vec::<DownloadStatus>::new());
        downloader
            .start_download(&meta, &|s| events.lock().unwrap().push(s.clone()))
            .await
            .unwrap();

        let done: Vec<_> = events
            .lock()
            .unwrap()
            .iter()
            .filter(|s| s.status == FileStatus::Done)
            .map(|s| (s.file.clone(), s.index, s.overall))
            .collect();
        assert_eq!(
            done,
            [
                ("selene-client-1.2.0.jar".to_string(), 1, 50),
                ("kotlin-stdlib.jar".to_string(), 2, 100)
            ]
        );
        assert!(downloader.is_complete());
        assert_eq!(downloader.progress(), 100);
        assert!(downloader.is_downloaded(&meta).await);
        assert_eq!(transport.request_count(), 2);

        let repeat = Mutex::new(Vec::<DownloadStatus>::new());
        downloader
            .start_download(&meta, &|s| repeat.lock().unwrap().push(s.clone()))
            .await
            .unwrap();
        assert_eq!(transport.request_count(), 2);
        assert!(repeat
            .lock()
            .unwrap()
            .iter()
            .all(|s| s.status == FileStatus::Done && s.progress == 100));
    }

    #[tokio::test]
    async fn missing_library_fails_fast() {
        let temp = tempfile::tempdir().unwrap();
        let transport = Arc::new(MockTransport::new().route(CLIENT_URL, 404, Vec::<u8>::new()));
        let mut downloader = GameDownloader::new(temp.path().join("game_client"), transport.clone());

        let events = Mutex::new(Vec::<DownloadStatus>::new());
        let err = downloader
            .start_download(&version(), &|s| events.lock().unwrap().push(s.clone()))
            .await
            .unwrap_err();

        assert!(matches!(err, LauncherError::DownloadFailed { status: 404, .. }));
        assert_eq!(transport.request_count(), 1);
        let last = events.lock().unwrap().last().cloned().unwrap();
        assert_eq!(last.status, FileStatus::Error);
        assert_eq!(last.index, 1);
        assert!(last.error.is_some());
        assert!(!downloader.is_downloading());
        assert!(!downloader.is_complete());
        assert!(downloader.error().is_some());

        downloader.reset();
        assert!(downloader.error().is_none());
        assert_eq!(downloader.progress(), 0);
    }

    #[tokio::test]
    async fn continue_on_error_fetches_the_rest() {
        let temp = tempfile::tempdir().unwrap();
        let transport = Arc::new(
            MockTransport::new()
                .route(CLIENT_URL, 500, Vec::<u8>::new())
                .route(LIB_URL, 200, b"lib".to_vec()),
        );
        let mut downloader = GameDownloader::new(temp.path().join("game_client"), transport.clone())
            .with_policy(BatchPolicy::ContinueOnError);

        let err = downloader
            .start_download(&version(), &|_| {})
            .await
            .unwrap_err();

        assert!(err.to_string().contains("selene-client-1.2.0.jar"));
        assert_eq!(transport.request_count(), 2);
        assert!(temp.path().join("game_client/kotlin-stdlib.jar").exists());
    }

    #[test]
    fn overall_percent_rounds() {
        assert_eq!(overall_percent(1, 3), 33);
        assert_eq!(overall_percent(2, 3), 67);
        assert_eq!(overall_percent(0, 0), 100);
    }
}
