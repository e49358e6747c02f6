// ─── Bundle Cache ───
// Extracted bundles live in directories named after their content hash,
// split into a `shared` namespace and one namespace per server.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::warn;

const SHARED_NAMESPACE: &str = "shared";
/// Bundles are unpacked under `<hash>.partial` and renamed once complete.
const STAGING_SUFFIX: &str = ".partial";

/// Lowercase hex SHA-256 of a server connection URL.
pub fn server_hash(server_url: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(server_url.as_bytes());
    hex::encode(hasher.finalize())
}

#[derive(Debug, Clone)]
pub struct BundleCache {
    root: PathBuf,
}

impl BundleCache {
    /// `root` is the `client_bundles` directory.
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn shared_dir(&self) -> PathBuf {
        self.root.join(SHARED_NAMESPACE)
    }

    pub fn server_dir(&self, server_url: &str) -> PathBuf {
        self.root.join(server_hash(server_url))
    }

    /// Namespace a bundle is stored in for `server_url`.
    pub fn namespace_dir(&self, server_url: &str, allow_shared_cache: bool) -> PathBuf {
        if allow_shared_cache {
            self.shared_dir()
        } else {
            self.server_dir(server_url)
        }
    }

    /// Where `hash` is unpacked before it becomes visible as `namespace/hash`.
    pub fn staging_dir(namespace: &Path, hash: &str) -> PathBuf {
        namespace.join(format!("{hash}{STAGING_SUFFIX}"))
    }

    /// Hashes of every bundle already extracted for `server_url`, shared ones
    /// included. Plain files in a namespace are not bundles and are skipped.
    pub async fn get_local_bundle_hashes(&self, server_url: &str) -> HashSet<String> {
        let mut hashes = HashSet::new();
        for dir in [self.shared_dir(), self.server_dir(server_url)] {
            collect_dir_names(&dir, &mut hashes).await;
        }
        hashes
    }
}

async fn collect_dir_names(dir: &Path, into: &mut HashSet<String>) {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return,
        Err(e) => {
            warn!("Cannot read bundle namespace {:?}: {}", dir, e);
            return;
        }
    };

    loop {
        match entries.next_entry().await {
            Ok(Some(entry)) => {
                let is_dir = entry
                    .file_type()
                    .await
                    .map(|t| t.is_dir())
                    .unwrap_or(false);
                let name = entry.file_name().to_string_lossy().to_string();
                if is_dir && !name.ends_with(STAGING_SUFFIX) {
                    into.insert(name);
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Error while listing {:?}: {}", dir, e);
                break;
            }
        }
    }
}
