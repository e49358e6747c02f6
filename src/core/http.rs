use std::path::Path;

use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, ACCEPT_ENCODING};
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use tokio::io::AsyncWriteExt;
use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};

const APP_USER_AGENT: &str = "SeleneLauncher/0.1.0";
const JSON: &str = "application/json";

pub fn build_http_client() -> Result<Client, reqwest::Error> {
    let mut default_headers = HeaderMap::new();
    default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));

    Client::builder()
        .user_agent(APP_USER_AGENT)
        .default_headers(default_headers)
        .build()
}

/// A fully buffered HTTP response.
#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn json<T: DeserializeOwned>(&self) -> LauncherResult<T> {
        Ok(serde_json::from_slice(&self.body)?)
    }

    /// Turn a non-success status into `DownloadFailed` for `url`.
    pub fn error_for_status(self, url: &str) -> LauncherResult<Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: self.status,
            })
        }
    }
}

/// Byte-level progress callback: `(downloaded, total)`.
pub type ProgressFn<'a> = &'a (dyn Fn(u64, Option<u64>) + Send + Sync);

/// The raw HTTP seam every component talks through.
#[async_trait]
pub trait Transport: Send + Sync {
    /// GET a JSON document, optionally with `Authorization: Bearer <token>`.
    async fn get(&self, url: &str, bearer: Option<&str>) -> LauncherResult<HttpResponse>;

    /// GET an opaque payload such as an archive; no `Accept` is negotiated.
    async fn get_binary(&self, url: &str, bearer: Option<&str>) -> LauncherResult<HttpResponse> {
        self.get(url, bearer).await
    }

    /// POST an `application/x-www-form-urlencoded` body.
    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> LauncherResult<HttpResponse>;

    /// Stream `url` into `dest`, reporting bytes as they arrive.
    async fn download_to_file(
        &self,
        url: &str,
        dest: &Path,
        on_progress: ProgressFn<'_>,
    ) -> LauncherResult<()>;
}

/// Default transport backed by a shared `reqwest::Client`.
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new() -> LauncherResult<Self> {
        Ok(Self {
            client: build_http_client()?,
        })
    }

    fn get_request(&self, url: &str, bearer: Option<&str>, accept: Option<&'static str>) -> RequestBuilder {
        let mut request = self.client.get(url);
        if let Some(accept) = accept {
            request = request.header(ACCEPT, accept);
        }
        if let Some(token) = bearer {
            request = request.bearer_auth(token);
        }
        request
    }

    async fn send_get(&self, url: &str, request: RequestBuilder) -> LauncherResult<HttpResponse> {
        let response = request.send().await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!("GET {} -> {} ({} bytes)", url, status, body.len());
        Ok(HttpResponse { status, body })
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn get(&self, url: &str, bearer: Option<&str>) -> LauncherResult<HttpResponse> {
        let request = self.get_request(url, bearer, Some(JSON));
        self.send_get(url, request).await
    }

    async fn get_binary(&self, url: &str, bearer: Option<&str>) -> LauncherResult<HttpResponse> {
        let request = self.get_request(url, bearer, None);
        self.send_get(url, request).await
    }

    async fn post_form(&self, url: &str, form: &[(&str, &str)]) -> LauncherResult<HttpResponse> {
        let response = self
            .client
            .post(url)
            .header(ACCEPT, JSON)
            .form(form)
            .send()
            .await?;
        let status = response.status().as_u16();
        let body = response.bytes().await?.to_vec();
        debug!("POST {} -> {}", url, status);
        Ok(HttpResponse { status, body })
    }

    async fn download_to_file(
        &self,
        url: &str,
        dest: &Path,
        on_progress: ProgressFn<'_>,
    ) -> LauncherResult<()> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(LauncherError::DownloadFailed {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        let total_bytes = response.content_length();
        let mut file = tokio::fs::File::create(dest)
            .await
            .map_err(|source| LauncherError::Io {
                path: dest.to_path_buf(),
                source,
            })?;

        let mut stream = response.bytes_stream();
        let mut downloaded = 0_u64;
        on_progress(downloaded, total_bytes);
        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk)
                .await
                .map_err(|source| LauncherError::Io {
                    path: dest.to_path_buf(),
                    source,
                })?;
            downloaded = downloaded.saturating_add(chunk.len() as u64);
            on_progress(downloaded, total_bytes);
        }

        file.flush().await.map_err(|source| LauncherError::Io {
            path: dest.to_path_buf(),
            source,
        })?;

        debug!("Downloaded: {} -> {:?} ({} bytes)", url, dest, downloaded);
        Ok(())
    }
}
