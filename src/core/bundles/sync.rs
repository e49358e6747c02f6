// ─── Bundle Synchronization ───
// Diffs a server's bundle manifest against the local cache and pulls the
// missing bundles one at a time.

use std::path::Path;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, info, instrument, warn};

use super::cache::BundleCache;
use crate::core::error::{BatchPolicy, LauncherError, LauncherResult};
use crate::core::http::Transport;
use crate::core::native::NativeBoundary;
use crate::core::paths::is_plain_file_name;

/// Batch progress: `None` at the start and end, a message per bundle.
pub type BundleProgressFn<'a> = &'a (dyn Fn(Option<&str>) + Send + Sync);

/// One entry of a server's `/bundles` manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BundleDescriptor {
    pub id: String,
    pub name: String,
    pub hash: String,
    /// Only the first variant is ever downloaded.
    pub variants: Vec<String>,
    pub allow_shared_cache: bool,
}

#[derive(Debug, Deserialize)]
struct RawBundle {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    hash: Option<String>,
    #[serde(default)]
    variants: Option<Vec<String>>,
    #[serde(default)]
    allow_shared_cache: Option<bool>,
}

impl BundleDescriptor {
    /// `None` for entries without variants or without a hash usable as a
    /// directory name.
    fn from_manifest_entry(id: &str, value: &Value) -> Option<Self> {
        let raw: RawBundle = serde_json::from_value(value.clone()).ok()?;
        let hash = raw.hash.filter(|h| is_plain_file_name(h))?;
        let variants = raw.variants.filter(|v| !v.is_empty())?;
        Some(Self {
            id: id.to_string(),
            name: raw.name.unwrap_or_else(|| id.to_string()),
            hash,
            variants,
            allow_shared_cache: raw.allow_shared_cache.unwrap_or(false),
        })
    }
}

#[derive(Debug, Clone, Default)]
pub struct BundleCheck {
    /// The manifest as the server sent it.
    pub manifest: Map<String, Value>,
    /// Every usable manifest entry, in manifest order.
    pub bundles: Vec<BundleDescriptor>,
    /// Entries whose hash is not in the local cache.
    pub to_download: Vec<BundleDescriptor>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BundleReport {
    pub downloaded: Vec<String>,
    pub failed: Vec<String>,
}

impl BundleReport {
    pub fn is_complete(&self) -> bool {
        self.failed.is_empty()
    }
}

pub struct BundleSync {
    cache: BundleCache,
    transport: Arc<dyn Transport>,
    native: Arc<dyn NativeBoundary>,
    policy: BatchPolicy,
}

impl BundleSync {
    pub fn new(
        cache: BundleCache,
        transport: Arc<dyn Transport>,
        native: Arc<dyn NativeBoundary>,
    ) -> Self {
        Self {
            cache,
            transport,
            native,
            policy: BatchPolicy::ContinueOnError,
        }
    }

    pub fn with_policy(mut self, policy: BatchPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn cache(&self) -> &BundleCache {
        &self.cache
    }

    /// Fetch the server's manifest and work out which bundles are missing.
    #[instrument(skip(self, bearer))]
    pub async fn check_bundles(&self, server_url: &str, bearer: &str) -> LauncherResult<BundleCheck> {
        let url = endpoint(server_url, &["bundles"])?;
        let response = self
            .transport
            .get(&url, Some(bearer))
            .await?
            .error_for_status(&url)?;
        let manifest: Map<String, Value> = response.json()?;

        let mut check = BundleCheck::default();
        for (id, value) in &manifest {
            match BundleDescriptor::from_manifest_entry(id, value) {
                Some(bundle) => check.bundles.push(bundle),
                None => debug!("Ignoring bundle '{}': no usable hash or variants", id),
            }
        }
        check.manifest = manifest;

        let local = self.cache.get_local_bundle_hashes(server_url).await;
        check.to_download = check
            .bundles
            .iter()
            .filter(|b| !local.contains(&b.hash))
            .cloned()
            .collect();

        info!(
            "{} bundles declared, {} to download",
            check.bundles.len(),
            check.to_download.len()
        );
        Ok(check)
    }

    /// Download and extract `to_download` in order.
    ///
    /// Fetch failures follow the batch policy; a bundle that cannot be
    /// written or extracted aborts the batch.
    #[instrument(skip(self, bearer, to_download, on_progress), fields(count = to_download.len()))]
    pub async fn download_bundles(
        &self,
        server_url: &str,
        bearer: &str,
        to_download: &[BundleDescriptor],
        on_progress: BundleProgressFn<'_>,
    ) -> LauncherResult<BundleReport> {
        on_progress(None);
        let result = self
            .download_all(server_url, bearer, to_download, on_progress)
            .await;
        on_progress(None);
        result
    }

    async fn download_all(
        &self,
        server_url: &str,
        bearer: &str,
        to_download: &[BundleDescriptor],
        on_progress: BundleProgressFn<'_>,
    ) -> LauncherResult<BundleReport> {
        let mut report = BundleReport::default();

        for bundle in to_download {
            on_progress(Some(format!("Downloading {}...", bundle.name).as_str()));

            match self.download_one(server_url, bearer, bundle).await {
                Ok(()) => report.downloaded.push(bundle.id.clone()),
                Err(e) if e.is_fetch_failure() && self.policy == BatchPolicy::ContinueOnError => {
                    warn!("Failed to download bundle {} ({}): {}", bundle.name, bundle.hash, e);
                    report.failed.push(bundle.id.clone());
                }
                Err(e) => {
                    error!("Bundle {} aborted the batch: {}", bundle.name, e);
                    return Err(e);
                }
            }
        }

        Ok(report)
    }

    async fn download_one(
        &self,
        server_url: &str,
        bearer: &str,
        bundle: &BundleDescriptor,
    ) -> LauncherResult<()> {
        let variant = bundle.variants.first().ok_or_else(|| {
            LauncherError::Other(format!("Bundle {} has no variants", bundle.id))
        })?;
        let url = endpoint(server_url, &["bundles", &bundle.id, variant])?;
        let response = self
            .transport
            .get_binary(&url, Some(bearer))
            .await?
            .error_for_status(&url)?;

        let namespace = self.cache.namespace_dir(server_url, bundle.allow_shared_cache);
        tokio::fs::create_dir_all(&namespace)
            .await
            .map_err(|source| LauncherError::Io {
                path: namespace.clone(),
                source,
            })?;

        let archive = namespace.join(format!("{}.zip", bundle.hash));
        tokio::fs::write(&archive, &response.body)
            .await
            .map_err(|source| LauncherError::Io {
                path: archive.clone(),
                source,
            })?;

        // `<hash>` only appears once its extraction has completed.
        let staging = BundleCache::staging_dir(&namespace, &bundle.hash);
        remove_dir_if_present(&staging).await?;
        let extracted = self.native.extract_archive(&archive, &staging).await;

        if let Err(e) = tokio::fs::remove_file(&archive).await {
            warn!("Could not remove bundle archive {:?}: {}", archive, e);
        }
        if let Err(e) = extracted {
            if let Err(cleanup) = remove_dir_if_present(&staging).await {
                warn!("Could not remove {:?}: {}", staging, cleanup);
            }
            return Err(e);
        }

        let extract_dir = namespace.join(&bundle.hash);
        remove_dir_if_present(&extract_dir).await?;
        tokio::fs::rename(&staging, &extract_dir)
            .await
            .map_err(|source| LauncherError::Io {
                path: extract_dir.clone(),
                source,
            })?;
        debug!("Bundle {} extracted to {:?}", bundle.id, extract_dir);
        Ok(())
    }
}

async fn remove_dir_if_present(path: &Path) -> LauncherResult<()> {
    match tokio::fs::remove_dir_all(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(source) => Err(LauncherError::Io {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// `server_url` with `segments` appended, each percent-encoded.
fn endpoint(server_url: &str, segments: &[&str]) -> LauncherResult<String> {
    let mut url = reqwest::Url::parse(server_url)
        .map_err(|e| LauncherError::Other(format!("Invalid server URL {server_url}: {e}")))?;
    url.path_segments_mut()
        .map_err(|_| LauncherError::Other(format!("Invalid server URL {server_url}")))?
        .pop_if_empty()
        .extend(segments);
    Ok(url.to_string())
}
