//! Records exchanged with the document backend
//!
//! Field names follow the backend's JSON. The `success` / `error` envelope
//! is handled by the client before these types are decoded.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;

/// Uploaded template as listed by `GET /templates`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TemplateRecord {
    pub filename: String,

    /// Upper-case extension, e.g. `DOCX`
    #[serde(rename = "type")]
    pub document_type: String,

    #[serde(rename = "size", default)]
    pub size_bytes: u64,

    #[serde(rename = "modified", default)]
    pub last_modified: String,
}

/// Generated document as listed by `GET /generated_documents`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeneratedArtifactRecord {
    pub filename: String,

    #[serde(default)]
    pub format: String,

    #[serde(rename = "size", default)]
    pub size_bytes: u64,

    #[serde(rename = "created", default)]
    pub created_at: String,
}

/// Entry of `GET /history`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    pub filename: String,

    #[serde(default)]
    pub date: String,
}

impl HistoryEntry {
    pub fn is_presentation(&self) -> bool {
        self.filename.ends_with(".pptx")
    }
}

/// AI provider settings stored by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelSettings {
    #[serde(default = "default_api_type")]
    pub api_type: String,

    #[serde(default = "default_openai_model")]
    pub openai_model: String,
}

fn default_api_type() -> String {
    "gemini".to_string()
}

fn default_openai_model() -> String {
    "gpt-4o-mini".to_string()
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_type: default_api_type(),
            openai_model: default_openai_model(),
        }
    }
}

/// Output format of a generated document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Docx,
    Pptx,
    Pdf,
    Md,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 4] = [Self::Docx, Self::Pptx, Self::Pdf, Self::Md];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Docx => "docx",
            Self::Pptx => "pptx",
            Self::Pdf => "pdf",
            Self::Md => "md",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for OutputFormat {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|format| format.as_str() == wanted)
            .ok_or_else(|| Error::validation(format!("Unsupported output format: {}", s)))
    }
}

/// Body of `POST /generate`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenerateRequest {
    pub doc_type: String,
    pub template: String,
    pub requirements: String,
    pub output_format: OutputFormat,

    /// Folder of images extracted from an imported document
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_folder: Option<String>,
}

/// Token accounting reported by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub model: String,

    #[serde(default)]
    pub input_tokens: u64,

    #[serde(default)]
    pub output_tokens: u64,

    /// Estimated cost in USD
    #[serde(default)]
    pub cost: f64,
}

/// Successful `POST /generate` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerateResponse {
    pub filename: String,

    #[serde(default)]
    pub format: String,

    #[serde(default)]
    pub usage: Option<Usage>,

    #[serde(default)]
    pub preview: Option<String>,
}

/// Images pulled out of an imported document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractedImages {
    pub folder: String,

    #[serde(default)]
    pub count: u32,
}

/// Successful `POST /extract_text` payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExtractResponse {
    pub content: String,

    #[serde(default)]
    pub images: Option<ExtractedImages>,
}

/// Body of `POST /optimize-requirements`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OptimizeRequest {
    pub requirements: String,
    pub doc_type: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct OptimizeResponse {
    pub optimized_requirements: String,
}

/// Successful `POST /stage_image` payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct StageResponse {
    pub filename: String,
    pub path: String,
}

/// An uploaded image waiting to be injected into a slide
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StagedImage {
    /// Opaque handle returned by the backend
    pub server_filename: String,
    pub storage_path: String,
    /// Name of the local file, for display only
    pub original_filename: String,
    pub slide_number: u32,
}

impl StagedImage {
    pub fn new(staged: StageResponse, original_filename: String) -> Self {
        Self {
            server_filename: staged.filename,
            storage_path: staged.path,
            original_filename,
            slide_number: 1,
        }
    }
}

/// One image-to-slide binding inside an injection job
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SlideInjection {
    pub image_path: String,
    pub slide_number: u32,
}

/// Body of `POST /inject_images`
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InjectionJob {
    /// Source presentation
    #[serde(rename = "filename")]
    pub source_filename: String,
    pub injections: Vec<SlideInjection>,
}

/// Successful `POST /inject_images` payload
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InjectResponse {
    pub filename: String,
    pub download_url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MermaidRequest {
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct MermaidResponse {
    pub mermaid_code: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FlowchartRequest {
    pub mermaid_code: String,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FlowchartResponse {
    pub download_url: String,
    pub filename: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BatchDeleteRequest {
    pub filenames: Vec<String>,
}

/// Payload carrying a block of text (`/view_template`, `/help`)
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ContentResponse {
    pub content: String,
}

/// Payload of operations that only report a message
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct MessageResponse {
    #[serde(default)]
    pub message: Option<String>,
}
