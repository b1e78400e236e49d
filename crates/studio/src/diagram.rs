//! Flowchart pipeline: description → Mermaid source → rendered PNG
//!
//! Each stage has its own busy flag. The stages are independent: the source
//! can be typed by hand and rendered without ever calling the AI stage.

use docflow_common::models::{FlowchartRequest, FlowchartResponse, MermaidRequest, MermaidResponse};
use docflow_common::{Error, Result};
use tracing::{debug, info};

use crate::api::BackendApi;

/// Rendered image and the name to save it under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedDiagram {
    pub image_url: String,
    pub filename: String,
}

#[derive(Debug, Default)]
pub struct DiagramLifecycle {
    description: String,
    source: Option<String>,
    rendered: Option<RenderedDiagram>,
    generating_source: bool,
    rendering: bool,
}

impl DiagramLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn rendered(&self) -> Option<&RenderedDiagram> {
        self.rendered.as_ref()
    }

    pub fn is_generating_source(&self) -> bool {
        self.generating_source
    }

    pub fn is_rendering(&self) -> bool {
        self.rendering
    }

    pub fn set_description(&mut self, description: impl Into<String>) {
        self.description = description.into();
    }

    /// Manual edit of the Mermaid source.
    pub fn set_source(&mut self, source: impl Into<String>) {
        self.source = Some(source.into());
    }

    pub fn begin_source(&mut self) -> Result<MermaidRequest> {
        if self.generating_source {
            return Err(Error::Busy("Diagram source generation"));
        }
        let description = self.description.trim();
        if description.is_empty() {
            return Err(Error::validation("Describe the process first"));
        }

        self.generating_source = true;
        Ok(MermaidRequest {
            description: description.to_string(),
        })
    }

    /// Success overwrites the source, manual edits included; failure keeps it.
    pub fn complete_source(&mut self, result: Result<MermaidResponse>) -> Result<String> {
        if !self.generating_source {
            debug!("Discarding diagram source that arrived after a reset");
            return Err(Error::validation("The diagram was reset while its source was being generated"));
        }
        self.generating_source = false;

        let response = result?;
        info!("Diagram source generated ({} bytes)", response.mermaid_code.len());
        self.source = Some(response.mermaid_code.clone());
        Ok(response.mermaid_code)
    }

    pub async fn generate_source(&mut self, api: &BackendApi) -> Result<String> {
        let request = self.begin_source()?;
        let result = api.generate_mermaid(&request).await;
        self.complete_source(result)
    }

    pub fn begin_render(&mut self) -> Result<FlowchartRequest> {
        if self.rendering {
            return Err(Error::Busy("Diagram rendering"));
        }
        let source = self.source.as_deref().map(str::trim).unwrap_or_default();
        if source.is_empty() {
            return Err(Error::validation("Generate or enter the Mermaid source first"));
        }

        self.rendering = true;
        Ok(FlowchartRequest {
            mermaid_code: source.to_string(),
        })
    }

    /// Success replaces the image; failure keeps the previous one on screen.
    pub fn complete_render(&mut self, result: Result<FlowchartResponse>) -> Result<RenderedDiagram> {
        if !self.rendering {
            debug!("Discarding rendered diagram that arrived after a reset");
            return Err(Error::validation("The diagram was reset while it was being rendered"));
        }
        self.rendering = false;

        let response = result?;
        let rendered = RenderedDiagram {
            image_url: response.download_url,
            filename: response.filename,
        };
        info!("Diagram rendered as {}", rendered.filename);
        self.rendered = Some(rendered.clone());
        Ok(rendered)
    }

    pub async fn render(&mut self, api: &BackendApi) -> Result<RenderedDiagram> {
        let request = self.begin_render()?;
        let result = api.generate_flowchart(&request).await.map(|mut response| {
            response.download_url = api.resolve_url(&response.download_url);
            response
        });
        self.complete_render(result)
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
