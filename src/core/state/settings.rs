use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::native::NativeBoundary;

use super::store::JsonStore;

const KEY_RELEASE_CHANNEL: &str = "releaseChannel";
const KEY_RUNTIME_PATH: &str = "runtimePath";
const KEY_LEGACY_RUNTIME_PATH: &str = "jrePath";
const KEY_LAST_JOINED_SERVER: &str = "lastJoinedServer";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReleaseChannel {
    #[default]
    Stable,
    Experimental,
}

impl ReleaseChannel {
    pub fn as_str(self) -> &'static str {
        match self {
            ReleaseChannel::Stable => "stable",
            ReleaseChannel::Experimental => "experimental",
        }
    }
}

impl fmt::Display for ReleaseChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReleaseChannel {
    type Err = LauncherError;

    fn from_str(raw: &str) -> Result<Self, Self::Err> {
        match raw {
            "stable" => Ok(ReleaseChannel::Stable),
            "experimental" => Ok(ReleaseChannel::Experimental),
            other => Err(LauncherError::Other(format!(
                "Unknown release channel: {other}"
            ))),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Settings {
    pub release_channel: ReleaseChannel,
    /// Java runtime used to launch the game; empty means `java` on `PATH`.
    pub runtime_path: String,
    pub last_joined_server: Option<String>,
}

/// Owns the launcher settings and their `settings.json` store.
#[derive(Debug)]
pub struct SettingsManager {
    store: JsonStore,
    settings: Settings,
}

impl SettingsManager {
    /// Load persisted settings. Unknown channel values are ignored, and an
    /// empty runtime path is filled in from a locally installed Java.
    pub async fn load(path: &Path, native: &dyn NativeBoundary) -> LauncherResult<Self> {
        let store = JsonStore::load(path).await?;
        let mut settings = Settings::default();

        if let Some(channel) = store
            .get::<String>(KEY_RELEASE_CHANNEL)
            .and_then(|raw| raw.parse::<ReleaseChannel>().ok())
        {
            settings.release_channel = channel;
        }

        if let Some(runtime_path) = store
            .get::<String>(KEY_RUNTIME_PATH)
            .or_else(|| store.get::<String>(KEY_LEGACY_RUNTIME_PATH))
        {
            settings.runtime_path = runtime_path;
        }

        settings.last_joined_server = store
            .get::<String>(KEY_LAST_JOINED_SERVER)
            .filter(|server| !server.is_empty());

        if settings.runtime_path.is_empty() {
            if let Some(found) = native.find_local_runtime().await {
                info!("Using locally installed Java at {:?}", found);
                settings.runtime_path = found.to_string_lossy().to_string();
            }
        }

        Ok(Self { store, settings })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn set_release_channel(&mut self, channel: ReleaseChannel) {
        self.settings.release_channel = channel;
    }

    pub fn set_runtime_path(&mut self, runtime_path: impl Into<String>) {
        self.settings.runtime_path = runtime_path.into();
    }

    pub fn set_last_joined_server(&mut self, server: Option<String>) {
        self.settings.last_joined_server = server;
    }

    pub async fn save(&mut self) -> LauncherResult<()> {
        self.store
            .set(KEY_RELEASE_CHANNEL, self.settings.release_channel.as_str())?;
        self.store
            .set(KEY_RUNTIME_PATH, &self.settings.runtime_path)?;
        self.store.set(
            KEY_LAST_JOINED_SERVER,
            self.settings.last_joined_server.as_deref().unwrap_or(""),
        )?;
        self.store.save().await
    }
}
