//! AI-assisted rewriting of the requirements text
//!
//! The live requirements field stays owned by the generation draft; this
//! lifecycle only holds the snapshot taken when optimizing started and the
//! optimized text under review.

use docflow_common::models::{OptimizeRequest, OptimizeResponse};
use docflow_common::{Error, Result};
use tracing::{debug, info};

use crate::api::BackendApi;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OptimizationState {
    #[default]
    Idle,
    Optimizing,
    Reviewing,
}

#[derive(Debug, Default)]
pub struct OptimizationLifecycle {
    state: OptimizationState,
    original: Option<String>,
    optimized: Option<String>,
}

impl OptimizationLifecycle {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> OptimizationState {
        self.state
    }

    /// Requirements as they were when the last optimization started
    pub fn original(&self) -> Option<&str> {
        self.original.as_deref()
    }

    /// Text under review
    pub fn optimized(&self) -> Option<&str> {
        self.optimized.as_deref()
    }

    /// Snapshot `requirements` and enter `Optimizing`.
    pub fn begin(&mut self, requirements: &str, doc_type: Option<&str>) -> Result<OptimizeRequest> {
        if self.state == OptimizationState::Optimizing {
            return Err(Error::Busy("Requirement optimization"));
        }

        let trimmed = requirements.trim();
        if trimmed.is_empty() {
            return Err(Error::validation("Enter the requirements first"));
        }
        let doc_type = doc_type
            .map(str::trim)
            .filter(|d| !d.is_empty())
            .ok_or_else(|| Error::validation("Choose a document type first"))?;

        self.original = Some(requirements.to_string());
        self.state = OptimizationState::Optimizing;

        Ok(OptimizeRequest {
            requirements: trimmed.to_string(),
            doc_type: doc_type.to_string(),
        })
    }

    pub fn complete(&mut self, result: Result<OptimizeResponse>) -> Result<String> {
        match result {
            Ok(response) => {
                info!("Optimized requirements ready for review");
                self.optimized = Some(response.optimized_requirements.clone());
                self.state = OptimizationState::Reviewing;
                Ok(response.optimized_requirements)
            }
            Err(e) => {
                // Text already under review survives a failed re-run.
                self.state = if self.optimized.is_some() {
                    OptimizationState::Reviewing
                } else {
                    OptimizationState::Idle
                };
                Err(e)
            }
        }
    }

    pub async fn optimize(&mut self, api: &BackendApi, requirements: &str, doc_type: Option<&str>) -> Result<String> {
        let request = self.begin(requirements, doc_type)?;
        let result = api.optimize_requirements(&request).await;
        self.complete(result)
    }

    /// Manual edit of the text under review.
    pub fn edit_optimized(&mut self, text: impl Into<String>) -> Result<()> {
        self.require_reviewing()?;
        self.optimized = Some(text.into());
        Ok(())
    }

    /// Copy the reviewed text into the live field.
    pub fn accept(&mut self, live: &mut String) -> Result<()> {
        self.require_reviewing()?;
        if let Some(optimized) = self.optimized.take() {
            *live = optimized;
        }
        self.state = OptimizationState::Idle;
        Ok(())
    }

    /// Drop the reviewed text; the live field is left alone.
    pub fn cancel(&mut self) -> Result<()> {
        self.require_reviewing()?;
        self.optimized = None;
        self.state = OptimizationState::Idle;
        Ok(())
    }

    /// Put the snapshot back into the live field. Works after accept too,
    /// until a form reset clears the snapshot.
    pub fn revert(&mut self, live: &mut String) -> Result<()> {
        if self.state == OptimizationState::Optimizing {
            return Err(Error::Busy("Requirement optimization"));
        }
        let original = self
            .original
            .clone()
            .ok_or_else(|| Error::validation("No original requirements to restore"))?;

        if self.state == OptimizationState::Reviewing {
            self.optimized = Some(original.clone());
        }
        *live = original;
        debug!("Restored original requirements");
        Ok(())
    }

    /// Forget the snapshot and any review in progress.
    pub fn reset(&mut self) {
        if self.state != OptimizationState::Optimizing {
            self.state = OptimizationState::Idle;
        }
        self.original = None;
        self.optimized = None;
    }

    fn require_reviewing(&self) -> Result<()> {
        if self.state == OptimizationState::Reviewing {
            Ok(())
        } else {
            Err(Error::validation("There is no optimized text to review"))
        }
    }
}
