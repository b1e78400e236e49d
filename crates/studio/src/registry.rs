//! Staged-image registry
//!
//! Images are uploaded one by one to the backend's temporary area and kept
//! here, each bound to a target slide, until they are injected into a
//! presentation in a single job.

use docflow_common::models::{InjectResponse, SlideInjection};
use docflow_common::{Error, InjectionJob, Result, StagedImage};
use tracing::{info, warn};

use crate::api::BackendApi;
use crate::gateway::UploadFile;

/// Outcome of staging a batch of files
#[derive(Debug, Default)]
pub struct StagingReport {
    /// Original names of files that were staged, in order
    pub staged: Vec<String>,
    /// Files that failed, with the reason
    pub failures: Vec<(String, Error)>,
}

#[derive(Debug, Default)]
pub struct StagedImageRegistry {
    images: Vec<StagedImage>,
    source: Option<String>,
    injecting: bool,
}

impl StagedImageRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn images(&self) -> &[StagedImage] {
        &self.images
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    /// Presentation the images will be injected into
    pub fn source(&self) -> Option<&str> {
        self.source.as_deref()
    }

    pub fn select_source(&mut self, source: Option<String>) {
        self.source = source.filter(|s| !s.trim().is_empty());
    }

    pub fn is_injecting(&self) -> bool {
        self.injecting
    }

    /// Append an image the backend has accepted.
    pub fn push(&mut self, image: StagedImage) {
        self.images.push(image);
    }

    /// Upload `files` in order, one request at a time. A failure skips that
    /// file only; files staged earlier stay staged.
    pub async fn stage_uploads(&mut self, api: &BackendApi, files: Vec<UploadFile>) -> StagingReport {
        let mut report = StagingReport::default();

        for file in files {
            let original_filename = file.filename.clone();
            match api.stage_image(file).await {
                Ok(staged) => {
                    info!("Staged {} as {}", original_filename, staged.filename);
                    self.images.push(StagedImage::new(staged, original_filename.clone()));
                    report.staged.push(original_filename);
                }
                Err(e) => {
                    warn!("Staging {} failed: {}", original_filename, e);
                    report.failures.push((original_filename, e));
                }
            }
        }

        report
    }

    /// Bind the image at `index` to a slide. `value` is user input and must
    /// be a positive integer; the backend decides whether the slide exists.
    pub fn set_slide_number(&mut self, index: usize, value: &str) -> Result<()> {
        let slide_number = value
            .trim()
            .parse::<u32>()
            .ok()
            .filter(|n| *n > 0)
            .ok_or_else(|| Error::validation(format!("Slide number must be a positive integer, got '{}'", value)))?;

        let image = self
            .images
            .get_mut(index)
            .ok_or_else(|| Error::validation(format!("No staged image at position {}", index + 1)))?;
        image.slide_number = slide_number;
        Ok(())
    }

    pub fn remove(&mut self, index: usize) -> Result<StagedImage> {
        if index >= self.images.len() {
            return Err(Error::validation(format!("No staged image at position {}", index + 1)));
        }
        Ok(self.images.remove(index))
    }

    pub fn clear(&mut self) {
        self.images.clear();
    }

    /// Clear images and the chosen source.
    pub fn reset(&mut self) {
        self.images.clear();
        self.source = None;
    }

    /// Build the job from the whole registry, or refuse before any request.
    pub fn build_job(&self) -> Result<InjectionJob> {
        let source = self
            .source
            .clone()
            .ok_or_else(|| Error::validation("Choose a source presentation first"))?;

        if self.images.is_empty() {
            return Err(Error::validation("Upload at least one image"));
        }

        Ok(InjectionJob {
            source_filename: source,
            injections: self
                .images
                .iter()
                .map(|image| SlideInjection {
                    image_path: image.storage_path.clone(),
                    slide_number: image.slide_number,
                })
                .collect(),
        })
    }

    pub fn begin_injection(&mut self) -> Result<InjectionJob> {
        if self.injecting {
            return Err(Error::Busy("Image injection"));
        }
        let job = self.build_job()?;
        self.injecting = true;
        Ok(job)
    }

    /// Finish an injection. Success empties the form; failure keeps the
    /// staged images so the user can retry.
    pub fn complete_injection(&mut self, result: Result<InjectResponse>) -> Result<InjectResponse> {
        self.injecting = false;
        match result {
            Ok(response) => {
                info!("Injection produced {}", response.filename);
                self.reset();
                Ok(response)
            }
            Err(e) => {
                warn!("Injection failed, keeping {} staged images: {}", self.images.len(), e);
                Err(e)
            }
        }
    }

    pub async fn inject(&mut self, api: &BackendApi) -> Result<InjectResponse> {
        let job = self.begin_injection()?;
        let result = api.inject_images(&job).await;
        self.complete_injection(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use docflow_common::models::StageResponse;

    fn staged(name: &str) -> StagedImage {
        StagedImage::new(
            StageResponse {
                filename: format!("1700000000000_{}", name),
                path: format!("/srv/output/temp_images/1700000000000_{}", name),
            },
            name.to_string(),
        )
    }

    fn registry_with(names: &[&str]) -> StagedImageRegistry {
        let mut registry = StagedImageRegistry::new();
        for name in names {
            registry.push(staged(name));
        }
        registry
    }

    fn originals(registry: &StagedImageRegistry) -> Vec<&str> {
        registry.images().iter().map(|i| i.original_filename.as_str()).collect()
    }

    #[test]
    fn test_default_slide_is_one() {
        let registry = registry_with(&["a.png"]);
        assert_eq!(registry.images()[0].slide_number, 1);
    }

    #[test]
    fn test_set_slide_number() {
        let mut registry = registry_with(&["a.png", "b.png"]);
        registry.set_slide_number(1, " 12 ").unwrap();
        assert_eq!(registry.images()[1].slide_number, 12);

        assert!(registry.set_slide_number(0, "0").is_err());
        assert!(registry.set_slide_number(0, "-3").is_err());
        assert!(registry.set_slide_number(0, "two").is_err());
        assert!(registry.set_slide_number(5, "2").is_err());
        assert_eq!(registry.images()[0].slide_number, 1);
    }

    #[test]
    fn test_remove_shifts_later_entries() {
        let mut registry = registry_with(&["a.png", "b.png", "c.png", "d.png"]);
        let removed = registry.remove(1).unwrap();
        assert_eq!(removed.original_filename, "b.png");
        assert_eq!(originals(&registry), vec!["a.png", "c.png", "d.png"]);
        assert!(registry.remove(3).is_err());
    }

    #[test]
    fn test_remove_order_independent() {
        // remove(i) then the shifted j, versus j first then i
        let mut forward = registry_with(&["a.png", "b.png", "c.png", "d.png"]);
        forward.remove(1).unwrap();
        forward.remove(3 - 1).unwrap();

        let mut backward = registry_with(&["a.png", "b.png", "c.png", "d.png"]);
        backward.remove(3).unwrap();
        backward.remove(1).unwrap();

        assert_eq!(originals(&forward), vec!["a.png", "c.png"]);
        assert_eq!(originals(&forward), originals(&backward));
    }

    #[test]
    fn test_build_job_requires_source_and_images() {
        let mut registry = StagedImageRegistry::new();
        registry.select_source(Some("generated_deck.pptx".into()));
        assert!(matches!(registry.build_job(), Err(Error::LocalValidation(_))));

        let mut registry = registry_with(&["a.png"]);
        assert!(matches!(registry.build_job(), Err(Error::LocalValidation(_))));

        registry.select_source(Some("   ".into()));
        assert!(registry.source().is_none());
    }

    #[test]
    fn test_build_job_uses_whole_registry_in_order() {
        let mut registry = registry_with(&["a.png", "b.png"]);
        registry.select_source(Some("generated_deck.pptx".into()));
        registry.set_slide_number(0, "4").unwrap();

        let job = registry.build_job().unwrap();
        assert_eq!(job.source_filename, "generated_deck.pptx");
        assert_eq!(job.injections.len(), 2);
        assert_eq!(job.injections[0].slide_number, 4);
        assert!(job.injections[1].image_path.ends_with("b.png"));
    }

    #[test]
    fn test_injection_guard_and_failure_keeps_images() {
        let mut registry = registry_with(&["a.png"]);
        registry.select_source(Some("generated_deck.pptx".into()));

        registry.begin_injection().unwrap();
        assert_eq!(registry.begin_injection(), Err(Error::Busy("Image injection")));

        let result = registry.complete_injection(Err(Error::remote("源文件不存在")));
        assert!(result.is_err());
        assert!(!registry.is_injecting());
        assert_eq!(registry.len(), 1);
        assert_eq!(registry.source(), Some("generated_deck.pptx"));
    }

    #[test]
    fn test_injection_success_resets_form() {
        let mut registry = registry_with(&["a.png"]);
        registry.select_source(Some("generated_deck.pptx".into()));
        registry.begin_injection().unwrap();

        let response = registry
            .complete_injection(Ok(InjectResponse {
                filename: "generated_deck_v1.pptx".into(),
                download_url: "/api/download/generated_deck_v1.pptx".into(),
            }))
            .unwrap();

        assert_eq!(response.filename, "generated_deck_v1.pptx");
        assert!(registry.is_empty());
        assert!(registry.source().is_none());
    }
}
