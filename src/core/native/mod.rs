// ─── Native Boundary ───
// The three operations the pipeline delegates to the host: unpacking an
// archive, spawning the game process and finding a Java install.

pub mod extract;
pub mod process;

use std::path::{Path, PathBuf};

use async_trait::async_trait;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::detect;

/// Everything needed to start the game process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchRequest {
    pub runtime_path: String,
    pub classpath: Vec<PathBuf>,
    pub runtime_args: Vec<String>,
    pub program_args: Vec<String>,
    pub working_dir: PathBuf,
}

#[async_trait]
pub trait NativeBoundary: Send + Sync {
    /// Unpack `archive` into `dest_dir` and return the name of its single
    /// top-level entry, or an empty string when there is more than one.
    async fn extract_archive(&self, archive: &Path, dest_dir: &Path) -> LauncherResult<String>;

    /// Spawn the game. Returns once the process has started.
    async fn launch_process(&self, request: &LaunchRequest) -> LauncherResult<()>;

    /// Locate a usable Java binary already installed on the host.
    async fn find_local_runtime(&self) -> Option<PathBuf>;
}

/// Host implementation: `zip`/`tar` extraction and `std::process` spawning.
#[derive(Debug, Clone)]
pub struct SystemNative {
    main_class: String,
}

impl SystemNative {
    pub fn new(main_class: impl Into<String>) -> Self {
        Self {
            main_class: main_class.into(),
        }
    }
}

#[async_trait]
impl NativeBoundary for SystemNative {
    async fn extract_archive(&self, archive: &Path, dest_dir: &Path) -> LauncherResult<String> {
        let archive = archive.to_path_buf();
        let dest_dir = dest_dir.to_path_buf();
        tokio::task::spawn_blocking(move || extract::extract_file(&archive, &dest_dir))
            .await
            .map_err(|e| LauncherError::Other(format!("Task join error: {e}")))?
    }

    async fn launch_process(&self, request: &LaunchRequest) -> LauncherResult<()> {
        process::spawn_game(request, &self.main_class)
    }

    async fn find_local_runtime(&self) -> Option<PathBuf> {
        tokio::task::spawn_blocking(detect::find_java_path)
            .await
            .ok()
            .flatten()
    }
}
