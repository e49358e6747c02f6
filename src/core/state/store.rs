use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::core::error::{LauncherError, LauncherResult};

/// A JSON object persisted as one file, edited key by key.
///
/// Nothing touches disk until `save`, which writes a sibling temp file and
/// renames it over the original.
#[derive(Debug, Clone)]
pub struct JsonStore {
    path: PathBuf,
    values: Map<String, Value>,
}

impl JsonStore {
    /// Load `path`. A missing file yields an empty store; a corrupt one is
    /// logged and also treated as empty.
    pub async fn load(path: impl Into<PathBuf>) -> LauncherResult<Self> {
        let path = path.into();
        let values = match tokio::fs::read(&path).await {
            Ok(bytes) => match serde_json::from_slice::<Map<String, Value>>(&bytes) {
                Ok(values) => values,
                Err(e) => {
                    warn!("Corrupt store at {:?}, starting empty: {}", path, e);
                    Map::new()
                }
            },
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Map::new(),
            Err(source) => return Err(LauncherError::Io { path, source }),
        };
        Ok(Self { path, values })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Typed read; values of the wrong shape read as `None`.
    pub fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.values.get(key)?;
        serde_json::from_value(value.clone()).ok()
    }

    pub fn set<T: Serialize>(&mut self, key: &str, value: T) -> LauncherResult<()> {
        self.values
            .insert(key.to_string(), serde_json::to_value(value)?);
        Ok(())
    }

    pub async fn save(&self) -> LauncherResult<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| LauncherError::Io {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let payload = serde_json::to_vec_pretty(&self.values)?;
        let tmp_path = self
            .path
            .with_extension(format!("{}.tmp", uuid::Uuid::new_v4().simple()));
        tokio::fs::write(&tmp_path, payload)
            .await
            .map_err(|source| LauncherError::Io {
                path: tmp_path.clone(),
                source,
            })?;
        tokio::fs::rename(&tmp_path, &self.path)
            .await
            .map_err(|source| LauncherError::Io {
                path: self.path.clone(),
                source,
            })
    }
}
