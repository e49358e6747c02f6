//! In-memory stand-ins for the HTTP and native seams.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use async_trait::async_trait;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::http::{HttpResponse, ProgressFn, Transport};
use crate::core::native::{LaunchRequest, NativeBoundary};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedRequest {
    pub method: &'static str,
    pub url: String,
    pub bearer: Option<String>,
    pub form: Vec<(String, String)>,
}

/// Routes URLs to canned responses and records every request.
///
/// Several responses for one URL are served in order; the last one repeats.
/// Unrouted URLs answer 404.
#[derive(Default)]
pub struct MockTransport {
    routes: Mutex<HashMap<String, VecDeque<Canned>>>,
    requests: Mutex<Vec<RecordedRequest>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, url: &str, status: u16, body: impl Into<Vec<u8>>) -> Self {
        self.push(
            url,
            Canned::Response(HttpResponse {
                status,
                body: body.into(),
            }),
        )
    }

    /// `url` fails at the transport level, as if the host were unreachable.
    pub fn unreachable(self, url: &str) -> Self {
        self.push(url, Canned::Unreachable)
    }

    fn push(self, url: &str, canned: Canned) -> Self {
        self.routes
            .lock()
            .unwrap()
            .entry(url.to_string())
            .or_default()
            .push_back(canned);
        self
    }

    pub fn json(self, url: &str, value: serde_json::Value) -> Self {
        self.route(url, 200, serde_json::to_vec(&value).unwrap())
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn count_for(&self, url: &str) -> usize {
        self.requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.url == url)
            .count()
    }

    fn respond(&self, url: &str) -> LauncherResult<HttpResponse> {
        let mut routes = self.routes.lock().unwrap();
        let canned = match routes.get_mut(url) {
            Some(queue) if queue.len() > 1 => queue.pop_front().unwrap(),
            Some(queue) => queue.front().cloned().unwrap(),
            None => Canned::Response(HttpResponse {
                status: 404,
                body: Vec::new(),
            }),
        };
        match canned {
            Canned::Response(response) => Ok(response),
            Canned::Unreachable => Err(LauncherError::Http(transport_error())),
        }
    }

    fn record(&self, method: &'static str, url: &str, bearer: Option<&str>, form: &[(&str, &str)]) {
        self.requests.lock().unwrap().push(RecordedRequest {
            method,
            url: url.to_string(),
            bearer: bearer.map(str::to_string),
            form: form
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
    }
}

#[derive(Clone)]
enum Canned {
    Response(HttpResponse),
    Unreachable,
}

/// A real `reqwest::Error` without touching the network: the request
/// builder rejects the URL.
fn transport_error() -> reqwest::Error {
    match reqwest::Client::new().get("http://unreachable.invalid:port/").build() {
        Err(e) => e,
        Ok(_) => unreachable!("request with an invalid port was accepted"),
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, url: &str, bearer: Option<&str>) -> LauncherResult<HttpResponse> {
        self.record("GET", url, bearer, &[]);
        self.respond(url)
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> LauncherResult<HttpResponse> {
        self.record("POST", url, None, form);
        self.respond(url)
    }

    async fn download_to_file(
        &self,
        url: &str,
        dest: &Path,
        on_progress: ProgressFn<'_>,
    ) -> LauncherResult<()> {
        self.record("GET", url, None, &[]);
        let response = self.respond(url)?.error_for_status(url)?;
        let total = response.body.len() as u64;
        on_progress(0, Some(total));
        tokio::fs::write(dest, &response.body).await?;
        on_progress(total, Some(total));
        Ok(())
    }
}

/// Records extraction and launch requests instead of touching the host.
#[derive(Default)]
pub struct MockNative {
    pub local_runtime: Option<PathBuf>,
    /// Root name reported by every extraction.
    pub extract_root: String,
    pub fail_extraction: bool,
    pub extractions: Mutex<Vec<(PathBuf, PathBuf)>>,
    pub launches: Mutex<Vec<LaunchRequest>>,
}

#[async_trait]
impl NativeBoundary for MockNative {
    async fn extract_archive(&self, archive: &Path, dest_dir: &Path) -> LauncherResult<String> {
        self.extractions
            .lock()
            .unwrap()
            .push((archive.to_path_buf(), dest_dir.to_path_buf()));
        if self.fail_extraction {
            return Err(LauncherError::Extraction {
                archive: archive.to_path_buf(),
                message: "corrupt archive".into(),
            });
        }
        tokio::fs::create_dir_all(dest_dir.join(&self.extract_root)).await?;
        Ok(self.extract_root.clone())
    }

    async fn launch_process(&self, request: &LaunchRequest) -> LauncherResult<()> {
        self.launches.lock().unwrap().push(request.clone());
        Ok(())
    }

    async fn find_local_runtime(&self) -> Option<PathBuf> {
        self.local_runtime.clone()
    }
}
