use std::path::PathBuf;

use tracing::debug;

const IDENTITY_REALM: &str = "https://id.twelveiterations.com/realms/Selene";
const CLIENT_ID: &str = "selene-launcher";
const REDIRECT_URI: &str = "selene://auth";
const UPDATE_URL: &str = "https://update.seleneworlds.com/selene-client/{{channel}}/latest.json";
const DIRECTORY_URL: &str = "https://telescope.seleneworlds.com";
const RUNTIME_VERSION: &str = "21.0.8+9";
const MAIN_CLASS: &str = "world.selene.client.ClientBootstrapKt";

/// Static launcher configuration: remote endpoints and runtime pins.
#[derive(Debug, Clone)]
pub struct LauncherConfig {
    pub identity_realm: String,
    pub client_id: String,
    pub redirect_uri: String,
    /// Update manifest URL with a `{{channel}}` placeholder.
    pub update_url_template: String,
    pub directory_url: String,
    pub runtime_version: String,
    pub main_class: String,
    pub data_dir: Option<PathBuf>,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            identity_realm: IDENTITY_REALM.into(),
            client_id: CLIENT_ID.into(),
            redirect_uri: REDIRECT_URI.into(),
            update_url_template: UPDATE_URL.into(),
            directory_url: DIRECTORY_URL.into(),
            runtime_version: RUNTIME_VERSION.into(),
            main_class: MAIN_CLASS.into(),
            data_dir: None,
        }
    }
}

impl LauncherConfig {
    /// Defaults, overridden by `SELENE_*` environment variables.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        if let Some(dir) = non_empty("SELENE_DATA_DIR") {
            debug!("Data directory overridden: {}", dir);
            self.data_dir = Some(PathBuf::from(dir));
        }
        if let Some(url) = non_empty("SELENE_UPDATE_URL") {
            self.update_url_template = url;
        }
        if let Some(realm) = non_empty("SELENE_IDENTITY_REALM") {
            self.identity_realm = realm.trim_end_matches('/').to_string();
        }
        self
    }

    pub fn update_url(&self, channel: &str) -> String {
        self.update_url_template.replace("{{channel}}", channel)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn update_url_substitutes_channel() {
        let config = LauncherConfig::default();
        assert_eq!(
            config.update_url("experimental"),
            "https://update.seleneworlds.com/selene-client/experimental/latest.json"
        );
    }

    #[test]
    fn environment_overrides_ignore_blank_values() {
        let config = LauncherConfig::default().with_overrides(|key| match key {
            "SELENE_DATA_DIR" => Some("/tmp/selene".into()),
            "SELENE_IDENTITY_REALM" => Some("https://id.example.com/realms/Test/".into()),
            "SELENE_UPDATE_URL" => Some("   ".into()),
            _ => None,
        });

        assert_eq!(config.data_dir, Some(PathBuf::from("/tmp/selene")));
        assert_eq!(config.identity_realm, "https://id.example.com/realms/Test");
        assert_eq!(config.update_url_template, UPDATE_URL);
    }
}
