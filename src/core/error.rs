use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the entire launcher backend.
/// Every module returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── Network ─────────────────────────────────────────
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Download failed for {url}: HTTP {status}")]
    DownloadFailed { url: String, status: u16 },

    // ── Identity ────────────────────────────────────────
    #[error("Not signed in")]
    Unauthorized,

    #[error("Invalid request: authorization state mismatch")]
    StateMismatch,

    #[error("Identity provider error: {0}")]
    IdentityProvider(String),

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Versions ────────────────────────────────────────
    #[error("Version not found: {0}")]
    VersionNotFound(String),

    // ── Runtime ─────────────────────────────────────────
    #[error("Unsupported platform: {os}/{arch}")]
    UnsupportedPlatform { os: String, arch: String },

    // ── Native boundary ─────────────────────────────────
    #[error("Extraction of {archive:?} failed: {message}")]
    Extraction { archive: PathBuf, message: String },

    #[error("Zip extraction error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("Failed to launch game: {0}")]
    ProcessLaunch(String),

    // ── Generic ─────────────────────────────────────────
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

impl LauncherError {
    /// Failures that only concern the item being fetched: a non-success
    /// status or a transport error. Everything else (disk, extraction,
    /// launch) is fatal to the enclosing operation.
    pub fn is_fetch_failure(&self) -> bool {
        matches!(
            self,
            LauncherError::Http(_) | LauncherError::DownloadFailed { .. }
        )
    }
}

impl From<std::io::Error> for LauncherError {
    fn from(source: std::io::Error) -> Self {
        LauncherError::Io {
            path: PathBuf::new(),
            source,
        }
    }
}

/// How a sequential batch reacts when one item fails to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchPolicy {
    /// Abort the batch and propagate the first failure.
    FailFast,
    /// Log the failure, record it in the batch report, move on.
    ContinueOnError,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fetch_failures_are_distinguished_from_fatal_errors() {
        let status = LauncherError::DownloadFailed {
            url: "https://example.com/a.jar".into(),
            status: 500,
        };
        assert!(status.is_fetch_failure());

        let extraction = LauncherError::Extraction {
            archive: PathBuf::from("a.zip"),
            message: "corrupt".into(),
        };
        assert!(!extraction.is_fetch_failure());
        assert!(!LauncherError::Unauthorized.is_fetch_failure());
    }

    #[test]
    fn unauthorized_message_matches_client_wording() {
        assert_eq!(LauncherError::Unauthorized.to_string(), "Not signed in");
    }
}
