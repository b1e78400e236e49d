//! Remote call gateway
//!
//! Every backend interaction goes through [`Gateway::call`]. Expected
//! failures (connection errors, non-2xx statuses, bodies that are not JSON)
//! come back as a [`GatewayError`] value and never escape as panics.

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Method {
    Get,
    Post,
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Get => "GET",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        };
        f.write_str(name)
    }
}

/// A local file picked for upload
#[derive(Clone, PartialEq, Eq)]
pub struct UploadFile {
    pub filename: String,
    pub bytes: Vec<u8>,
}

impl UploadFile {
    pub fn new(filename: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            filename: filename.into(),
            bytes: bytes.into(),
        }
    }

    /// Read a file from disk, keeping only its final path component as name.
    pub async fn read(path: &Path) -> std::io::Result<Self> {
        let bytes = tokio::fs::read(path).await?;
        let filename = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Ok(Self { filename, bytes })
    }
}

impl fmt::Debug for UploadFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadFile")
            .field("filename", &self.filename)
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum RequestBody {
    Empty,
    Json(Value),
    /// Single-file multipart form
    File { field: &'static str, file: UploadFile },
}

/// One backend call, addressed relative to the API base URL
#[derive(Debug, Clone, PartialEq)]
pub struct GatewayRequest {
    pub method: Method,
    pub endpoint: String,
    pub body: RequestBody,
}

impl GatewayRequest {
    pub fn get(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Get,
            endpoint: endpoint.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn delete(endpoint: impl Into<String>) -> Self {
        Self {
            method: Method::Delete,
            endpoint: endpoint.into(),
            body: RequestBody::Empty,
        }
    }

    pub fn post_json<T: Serialize>(endpoint: impl Into<String>, body: &T) -> Result<Self, GatewayError> {
        let endpoint = endpoint.into();
        let body = serde_json::to_value(body)
            .map_err(|e| GatewayError::transport(format!("Failed to encode {} body: {}", endpoint, e)))?;
        Ok(Self {
            method: Method::Post,
            endpoint,
            body: RequestBody::Json(body),
        })
    }

    pub fn upload(endpoint: impl Into<String>, field: &'static str, file: UploadFile) -> Self {
        Self {
            method: Method::Post,
            endpoint: endpoint.into(),
            body: RequestBody::File { field, file },
        }
    }
}

/// Normalized failure of a gateway call
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct GatewayError {
    pub message: String,

    /// Set when the message came from the backend's own `error` field on a
    /// non-2xx response rather than from the transport.
    pub reported_by_backend: bool,
}

impl GatewayError {
    pub fn transport(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reported_by_backend: false,
        }
    }

    pub fn backend(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            reported_by_backend: true,
        }
    }
}

impl From<GatewayError> for docflow_common::Error {
    fn from(err: GatewayError) -> Self {
        if err.reported_by_backend {
            docflow_common::Error::RemoteOperation(err.message)
        } else {
            docflow_common::Error::Transport(err.message)
        }
    }
}

/// Typed access to the backend's HTTP surface
#[async_trait]
pub trait Gateway: Send + Sync {
    /// Base URL every endpoint is appended to, without trailing slash
    fn base_url(&self) -> &str;

    /// Perform one JSON call.
    async fn call(&self, request: GatewayRequest) -> Result<Value, GatewayError>;

    /// Fetch raw bytes from an absolute URL, such as a `download_url` the
    /// backend handed out.
    async fn fetch(&self, url: &str) -> Result<Vec<u8>, GatewayError>;

    /// Fetch raw bytes of a downloadable file under the base URL.
    async fn download(&self, endpoint: &str) -> Result<Vec<u8>, GatewayError> {
        self.fetch(&format!("{}{}", self.base_url(), endpoint)).await
    }
}

/// Gateway speaking HTTP through `reqwest`
pub struct HttpGateway {
    base_url: String,
    client: reqwest::Client,
}

impl HttpGateway {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(base_url, reqwest::Client::new())
    }

    pub fn with_user_agent(base_url: impl Into<String>, user_agent: &str) -> Result<Self, GatewayError> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| GatewayError::transport(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self::with_client(base_url, client))
    }

    pub fn with_client(base_url: impl Into<String>, client: reqwest::Client) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { base_url, client }
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }
}

#[async_trait]
impl Gateway for HttpGateway {
    fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn call(&self, request: GatewayRequest) -> Result<Value, GatewayError> {
        let url = self.url(&request.endpoint);
        debug!("{} {}", request.method, url);

        let builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };

        let builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Json(body) => builder.json(&body),
            RequestBody::File { field, file } => {
                let part = Part::bytes(file.bytes).file_name(file.filename);
                builder.multipart(Form::new().part(field, part))
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| GatewayError::transport(format!("Request to {} failed: {}", request.endpoint, e)))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| GatewayError::transport(format!("Failed to read response from {}: {}", request.endpoint, e)))?;

        if !status.is_success() {
            return Err(error_from_status(status, &text));
        }

        serde_json::from_str(&text)
            .map_err(|e| GatewayError::transport(format!("Invalid JSON from {}: {}", request.endpoint, e)))
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, GatewayError> {
        debug!("GET {} (download)", url);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GatewayError::transport(format!("Download of {} failed: {}", url, e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(error_from_status(status, &text));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| GatewayError::transport(format!("Failed to read {}: {}", url, e)))?;
        Ok(bytes.to_vec())
    }
}

/// Prefer the backend's `error` field; fall back to the status line.
fn error_from_status(status: reqwest::StatusCode, body: &str) -> GatewayError {
    let reported = serde_json::from_str::<Value>(body).ok().and_then(|value| {
        value
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
    });

    match reported {
        Some(message) => GatewayError::backend(message),
        None => GatewayError::transport(format!("Backend returned {}", status)),
    }
}
