// ─── Server Directory ───
// The public server listing: one featured server and the full list.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::core::error::LauncherResult;
use crate::core::http::Transport;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub address: String,
    pub description: String,
}

impl ServerInfo {
    /// Entries need a non-empty `name` and `address`; anything else is dropped.
    fn from_value(value: &Value) -> Option<Self> {
        let field = |key: &str| -> Option<String> {
            match value.get(key)? {
                Value::Null => None,
                Value::String(s) => Some(s.clone()),
                other => Some(other.to_string()),
            }
        };
        let name = field("name").filter(|s| !s.is_empty())?;
        let address = field("address").filter(|s| !s.is_empty())?;
        Some(Self {
            name,
            address,
            description: field("description").unwrap_or_default(),
        })
    }
}

pub struct ServerDirectory {
    base_url: String,
    transport: Arc<dyn Transport>,
}

impl ServerDirectory {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            transport,
        }
    }

    /// The featured server, or `None` when the directory has none to offer.
    pub async fn fetch_featured(&self) -> LauncherResult<Option<ServerInfo>> {
        let url = format!("{}/featured", self.base_url);
        let response = self.transport.get(&url, None).await?;
        if !response.is_success() {
            warn!("Featured server lookup answered {}", response.status);
            return Ok(None);
        }
        let body: Value = response.json()?;
        Ok(ServerInfo::from_value(&body))
    }

    pub async fn fetch_servers(&self) -> LauncherResult<Vec<ServerInfo>> {
        let url = format!("{}/servers", self.base_url);
        let response = self.transport.get(&url, None).await?;
        if !response.is_success() {
            warn!("Server list answered {}", response.status);
            return Ok(Vec::new());
        }
        let body: Value = response.json()?;
        let servers = match body.get("servers").and_then(Value::as_array) {
            Some(entries) => entries.iter().filter_map(ServerInfo::from_value).collect(),
            None => Vec::new(),
        };
        Ok(servers)
    }
}
