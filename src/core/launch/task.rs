// ─── Launch Task ───
// Resolves a version into a launch request and hands it to the native side.
// The game process is not monitored once started.

use std::path::PathBuf;

use tracing::info;

use super::classpath::build_classpath;
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::native::{LaunchRequest, NativeBoundary};
use crate::core::version::VersionMetadata;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LaunchOptions {
    /// Arguments for the Java runtime, before `-cp`.
    pub runtime_args: Vec<String>,
    /// Arguments for the game, after the main class.
    pub program_args: Vec<String>,
}

pub struct LaunchOrchestrator {
    game_dir: PathBuf,
    run_dir: PathBuf,
}

impl LaunchOrchestrator {
    pub fn new(game_dir: PathBuf, run_dir: PathBuf) -> Self {
        Self { game_dir, run_dir }
    }

    pub fn build_request(
        &self,
        meta: &VersionMetadata,
        runtime_path: &str,
        options: &LaunchOptions,
    ) -> LaunchRequest {
        LaunchRequest {
            runtime_path: runtime_path.to_string(),
            classpath: build_classpath(meta, &self.game_dir),
            runtime_args: options.runtime_args.clone(),
            program_args: options.program_args.clone(),
            working_dir: self.run_dir.clone(),
        }
    }

    pub async fn launch(
        &self,
        native: &dyn NativeBoundary,
        meta: &VersionMetadata,
        runtime_path: &str,
        options: &LaunchOptions,
    ) -> LauncherResult<()> {
        tokio::fs::create_dir_all(&self.run_dir)
            .await
            .map_err(|source| LauncherError::Io {
                path: self.run_dir.clone(),
                source,
            })?;

        let request = self.build_request(meta, runtime_path, options);
        info!(
            "Launching {} with {} classpath entries",
            meta.version,
            request.classpath.len()
        );
        native.launch_process(&request).await
    }
}
