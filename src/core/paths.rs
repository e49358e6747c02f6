use std::path::{Path, PathBuf};

use crate::core::error::{LauncherError, LauncherResult};

const APP_DIR_NAME: &str = "Selene";

/// On-disk layout of the launcher.
///
/// Game files, versions, the runtime and the small JSON stores live under the
/// roaming data directory; content bundles go to the local data directory.
#[derive(Debug, Clone)]
pub struct LauncherPaths {
    app_data_dir: PathBuf,
    local_data_dir: PathBuf,
}

impl LauncherPaths {
    pub fn new(app_data_dir: PathBuf, local_data_dir: PathBuf) -> Self {
        Self {
            app_data_dir,
            local_data_dir,
        }
    }

    /// Everything under a single root (used by `--data-dir` and tests).
    pub fn under(root: &Path) -> Self {
        Self::new(root.to_path_buf(), root.join("local"))
    }

    pub fn from_system() -> Self {
        let app_data_dir = dirs::data_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);
        let local_data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join(APP_DIR_NAME);
        Self::new(app_data_dir, local_data_dir)
    }

    pub async fn ensure_dirs(&self) -> LauncherResult<()> {
        for dir in [&self.app_data_dir, &self.local_data_dir] {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|source| LauncherError::Io {
                    path: dir.clone(),
                    source,
                })?;
        }
        Ok(())
    }

    pub fn app_data_dir(&self) -> &Path {
        &self.app_data_dir
    }

    pub fn local_data_dir(&self) -> &Path {
        &self.local_data_dir
    }

    pub fn versions_dir(&self) -> PathBuf {
        self.app_data_dir.join("versions")
    }

    pub fn game_client_dir(&self) -> PathBuf {
        self.app_data_dir.join("game_client")
    }

    pub fn game_run_dir(&self) -> PathBuf {
        self.app_data_dir.join("game_run")
    }

    pub fn runtime_dir(&self) -> PathBuf {
        self.app_data_dir.join("jre")
    }

    pub fn bundles_dir(&self) -> PathBuf {
        self.local_data_dir.join("client_bundles")
    }

    pub fn auth_file(&self) -> PathBuf {
        self.app_data_dir.join("auth.json")
    }

    pub fn settings_file(&self) -> PathBuf {
        self.app_data_dir.join("settings.json")
    }
}

/// True when `name` is a single path component that stays inside the
/// directory it is joined onto.
pub fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', ':'])
        && Path::new(name).file_name().is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_file_names_reject_traversal() {
        assert!(is_plain_file_name("1.2.0"));
        assert!(is_plain_file_name("3f2a9c"));
        for name in ["", ".", "..", "../x", "a/b", "/abs", "a\\b", "C:evil"] {
            assert!(!is_plain_file_name(name), "{name:?} accepted");
        }
    }

    #[tokio::test]
    async fn ensure_dirs_creates_both_roots() {
        let temp = tempfile::tempdir().unwrap();
        let paths = LauncherPaths::under(&temp.path().join("data"));
        paths.ensure_dirs().await.unwrap();
        assert!(paths.app_data_dir().is_dir());
        assert!(paths.local_data_dir().is_dir());
    }

    #[test]
    fn single_root_layout() {
        let paths = LauncherPaths::under(Path::new("/data"));
        assert_eq!(paths.versions_dir(), PathBuf::from("/data/versions"));
        assert_eq!(paths.game_client_dir(), PathBuf::from("/data/game_client"));
        assert_eq!(paths.runtime_dir(), PathBuf::from("/data/jre"));
        assert_eq!(
            paths.bundles_dir(),
            PathBuf::from("/data/local/client_bundles")
        );
    }
}
