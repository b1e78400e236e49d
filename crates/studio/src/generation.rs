//! Document generation lifecycle
//!
//! ```text
//! Idle ──submit──▶ (validate) ──▶ Submitting ──▶ Succeeded | Failed
//!   ▲                  │ missing field                 │
//!   └──────────────────┘◀──────── next submit ─────────┘
//! ```

use docflow_common::models::ExtractResponse;
use docflow_common::{Error, GenerateRequest, GenerateResponse, OutputFormat, Result};
use tracing::{info, warn};

use crate::api::BackendApi;
use crate::gateway::UploadFile;

/// Form state of the generation panel
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GenerationDraft {
    pub doc_type: Option<String>,
    pub template: Option<String>,
    pub requirements: String,
    pub output_format: OutputFormat,
    /// Images extracted from an imported document, forwarded on generate
    pub image_folder: Option<String>,
}

impl GenerationDraft {
    fn to_request(&self) -> Result<GenerateRequest> {
        let doc_type = non_blank(&self.doc_type).ok_or_else(|| Error::validation("Choose a document type"))?;
        let template = non_blank(&self.template).ok_or_else(|| Error::validation("Choose a template"))?;

        Ok(GenerateRequest {
            doc_type,
            template,
            requirements: self.requirements.clone(),
            output_format: self.output_format,
            image_folder: self.image_folder.clone(),
        })
    }
}

fn non_blank(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

#[derive(Debug, Clone, Default, PartialEq)]
pub enum GenerationState {
    #[default]
    Idle,
    Submitting,
    Succeeded(GenerateResponse),
    Failed(String),
}

pub struct GenerationLifecycle {
    draft: GenerationDraft,
    state: GenerationState,
    default_format: OutputFormat,
    importing: bool,
}

impl GenerationLifecycle {
    pub fn new(default_format: OutputFormat) -> Self {
        Self {
            draft: GenerationDraft {
                output_format: default_format,
                ..GenerationDraft::default()
            },
            state: GenerationState::Idle,
            default_format,
            importing: false,
        }
    }

    pub fn draft(&self) -> &GenerationDraft {
        &self.draft
    }

    pub fn draft_mut(&mut self) -> &mut GenerationDraft {
        &mut self.draft
    }

    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    pub fn is_submitting(&self) -> bool {
        self.state == GenerationState::Submitting
    }

    pub fn is_importing(&self) -> bool {
        self.importing
    }

    /// Validate the draft and enter `Submitting`, returning the request to
    /// send. A validation failure leaves the lifecycle idle.
    pub fn begin(&mut self) -> Result<GenerateRequest> {
        if self.is_submitting() {
            return Err(Error::Busy("Generation"));
        }

        match self.draft.to_request() {
            Ok(request) => {
                self.state = GenerationState::Submitting;
                Ok(request)
            }
            Err(e) => {
                self.state = GenerationState::Idle;
                Err(e)
            }
        }
    }

    pub fn complete(&mut self, result: Result<GenerateResponse>) -> Result<GenerateResponse> {
        match result {
            Ok(response) => {
                info!("Generated {} ({})", response.filename, response.format);
                self.state = GenerationState::Succeeded(response.clone());
                Ok(response)
            }
            Err(e) => {
                warn!("Generation failed: {}", e);
                self.state = GenerationState::Failed(e.to_string());
                Err(e)
            }
        }
    }

    pub async fn submit(&mut self, api: &BackendApi) -> Result<GenerateResponse> {
        let request = self.begin()?;
        let result = api.generate(&request).await;
        self.complete(result)
    }

    /// Replace the requirements with text extracted from an old document and
    /// remember its image folder for the next generation.
    pub fn apply_import(&mut self, extracted: &ExtractResponse) {
        self.draft.requirements = extracted.content.clone();
        self.draft.image_folder = extracted.images.as_ref().map(|images| images.folder.clone());
    }

    /// Enter the import guard; `complete_import` releases it.
    pub fn begin_import(&mut self) -> Result<()> {
        if self.is_importing() {
            return Err(Error::Busy("Document import"));
        }
        self.importing = true;
        Ok(())
    }

    pub fn complete_import(&mut self, result: Result<ExtractResponse>) -> Result<ExtractResponse> {
        self.importing = false;
        let extracted = result?;
        self.apply_import(&extracted);
        Ok(extracted)
    }

    pub async fn import_document(&mut self, api: &BackendApi, file: UploadFile) -> Result<ExtractResponse> {
        self.begin_import()?;
        let result = api.extract_text(file).await;
        self.complete_import(result)
    }

    /// Reset the form to its initial values and drop the last result.
    pub fn clear_form(&mut self) {
        self.draft = GenerationDraft {
            output_format: self.default_format,
            ..GenerationDraft::default()
        };
        if !self.is_submitting() {
            self.state = GenerationState::Idle;
        }
    }
}
