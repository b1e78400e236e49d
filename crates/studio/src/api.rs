//! Typed wrappers over the backend endpoints
//!
//! A response carrying `success: false` and a failed transport both come
//! back as `Err`, so callers never inspect the envelope themselves.

use docflow_common::models::{
    BatchDeleteRequest, ContentResponse, ExtractResponse, FlowchartRequest, FlowchartResponse,
    InjectResponse, MermaidRequest, MermaidResponse, MessageResponse, OptimizeRequest,
    OptimizeResponse, StageResponse,
};
use docflow_common::{
    Error, GenerateRequest, GenerateResponse, GeneratedArtifactRecord, HistoryEntry, InjectionJob,
    ModelSettings, Result, TemplateRecord,
};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use tracing::debug;

use crate::gateway::{Gateway, GatewayRequest, UploadFile};

/// Client for the document backend
#[derive(Clone)]
pub struct BackendApi {
    gateway: Arc<dyn Gateway>,
}

impl BackendApi {
    pub fn new(gateway: Arc<dyn Gateway>) -> Self {
        Self { gateway }
    }

    pub fn base_url(&self) -> &str {
        self.gateway.base_url()
    }

    /// Stable URL of a generated document.
    pub fn download_url(&self, filename: &str) -> Result<String> {
        Ok(self.file_url("download", filename)?.to_string())
    }

    fn parsed_base(&self) -> Result<Url> {
        Url::parse(self.base_url())
            .map_err(|e| Error::Transport(format!("Invalid API base URL {}: {}", self.base_url(), e)))
    }

    /// `{base}/{route}/{filename}`, the filename encoded as one path segment.
    fn file_url(&self, route: &str, filename: &str) -> Result<Url> {
        let mut url = self.parsed_base()?;
        url.path_segments_mut()
            .map_err(|_| Error::Transport(format!("API base URL {} cannot take a path", self.base_url())))?
            .pop_if_empty()
            .push(route)
            .push(filename);
        Ok(url)
    }

    /// Same as `file_url`, relative to the base URL.
    fn file_endpoint(&self, route: &str, filename: &str) -> Result<String> {
        let base = self.parsed_base()?;
        let url = self.file_url(route, filename)?;
        let prefix = base.path().trim_end_matches('/');
        Ok(url.path().strip_prefix(prefix).unwrap_or(url.path()).to_string())
    }

    /// Resolve a URL handed out by the backend (often host-relative, e.g.
    /// `/api/download/x_v1.pptx`) against the configured base URL.
    pub fn resolve_url(&self, url: &str) -> String {
        match Url::parse(self.base_url()).and_then(|base| base.join(url)) {
            Ok(resolved) => resolved.to_string(),
            Err(_) => url.to_string(),
        }
    }

    async fn call_enveloped<T: DeserializeOwned>(&self, request: GatewayRequest, fallback: &str) -> Result<T> {
        let value = self.gateway.call(request).await?;
        decode_envelope(value, fallback)
    }

    async fn call_plain<T: DeserializeOwned>(&self, request: GatewayRequest) -> Result<T> {
        let value = self.gateway.call(request).await?;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn settings(&self) -> Result<ModelSettings> {
        self.call_plain(GatewayRequest::get("/config")).await
    }

    pub async fn save_settings(&self, settings: &ModelSettings) -> Result<()> {
        let request = GatewayRequest::post_json("/config", settings)?;
        let _: MessageResponse = self.call_enveloped(request, "Failed to save settings").await?;
        Ok(())
    }

    pub async fn generated_documents(&self) -> Result<Vec<GeneratedArtifactRecord>> {
        self.call_plain(GatewayRequest::get("/generated_documents")).await
    }

    pub async fn delete_generated(&self, filename: &str) -> Result<()> {
        let endpoint = self.file_endpoint("delete_generated", filename)?;
        let _: MessageResponse = self
            .call_enveloped(GatewayRequest::delete(endpoint), "Delete failed")
            .await?;
        Ok(())
    }

    pub async fn batch_delete_generated(&self, filenames: &[String]) -> Result<MessageResponse> {
        let body = BatchDeleteRequest {
            filenames: filenames.to_vec(),
        };
        let request = GatewayRequest::post_json("/batch_delete_generated", &body)?;
        self.call_enveloped(request, "Batch delete failed").await
    }

    pub async fn generate(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let request = GatewayRequest::post_json("/generate", request)?;
        self.call_enveloped(request, "Generation failed").await
    }

    pub async fn extract_text(&self, file: UploadFile) -> Result<ExtractResponse> {
        let request = GatewayRequest::upload("/extract_text", "file", file);
        self.call_enveloped(request, "Text extraction failed").await
    }

    pub async fn optimize_requirements(&self, request: &OptimizeRequest) -> Result<OptimizeResponse> {
        let request = GatewayRequest::post_json("/optimize-requirements", request)?;
        self.call_enveloped(request, "Optimization failed").await
    }

    pub async fn history(&self) -> Result<Vec<HistoryEntry>> {
        self.call_plain(GatewayRequest::get("/history")).await
    }

    pub async fn templates(&self) -> Result<Vec<TemplateRecord>> {
        self.call_plain(GatewayRequest::get("/templates")).await
    }

    pub async fn upload_template(&self, file: UploadFile) -> Result<MessageResponse> {
        let request = GatewayRequest::upload("/upload_template", "file", file);
        self.call_enveloped(request, "Template upload failed").await
    }

    pub async fn delete_template(&self, filename: &str) -> Result<()> {
        let endpoint = self.file_endpoint("delete_template", filename)?;
        let _: MessageResponse = self
            .call_enveloped(GatewayRequest::delete(endpoint), "Delete failed")
            .await?;
        Ok(())
    }

    pub async fn view_template(&self, filename: &str) -> Result<String> {
        let endpoint = self.file_endpoint("view_template", filename)?;
        let content: ContentResponse = self
            .call_enveloped(GatewayRequest::get(endpoint), "Failed to load template")
            .await?;
        Ok(content.content)
    }

    pub async fn stage_image(&self, file: UploadFile) -> Result<StageResponse> {
        let request = GatewayRequest::upload("/stage_image", "image", file);
        self.call_enveloped(request, "Image upload failed").await
    }

    pub async fn inject_images(&self, job: &InjectionJob) -> Result<InjectResponse> {
        let request = GatewayRequest::post_json("/inject_images", job)?;
        self.call_enveloped(request, "Image injection failed").await
    }

    pub async fn generate_mermaid(&self, request: &MermaidRequest) -> Result<MermaidResponse> {
        let request = GatewayRequest::post_json("/generate-mermaid", request)?;
        self.call_enveloped(request, "Diagram generation failed").await
    }

    pub async fn generate_flowchart(&self, request: &FlowchartRequest) -> Result<FlowchartResponse> {
        let request = GatewayRequest::post_json("/generate-flowchart", request)?;
        self.call_enveloped(request, "Diagram rendering failed").await
    }

    pub async fn help(&self) -> Result<String> {
        let content: ContentResponse = self
            .call_enveloped(GatewayRequest::get("/help"), "Failed to load help")
            .await?;
        Ok(content.content)
    }

    pub async fn download(&self, filename: &str) -> Result<Vec<u8>> {
        let endpoint = self.file_endpoint("download", filename)?;
        Ok(self.gateway.download(&endpoint).await?)
    }

    /// Bytes behind a URL the backend returned, resolved against the base URL.
    pub async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        Ok(self.gateway.fetch(&self.resolve_url(url)).await?)
    }

    pub async fn download_template(&self, filename: &str) -> Result<Vec<u8>> {
        let endpoint = self.file_endpoint("download_template", filename)?;
        Ok(self.gateway.download(&endpoint).await?)
    }
}

/// Turn `{success: false, error}` into an error, otherwise decode the payload.
pub fn decode_envelope<T: DeserializeOwned>(value: Value, fallback: &str) -> Result<T> {
    if value.get("success") == Some(&Value::Bool(false)) {
        let message = value
            .get("error")
            .and_then(Value::as_str)
            .filter(|m| !m.is_empty())
            .unwrap_or(fallback);
        debug!("Backend reported failure: {}", message);
        return Err(Error::remote(message));
    }

    Ok(serde_json::from_value(value)?)
}
