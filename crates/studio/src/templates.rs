//! Template catalog
//!
//! Read-through cache of `GET /templates`. Upload and delete go to the
//! backend only; the caller reloads the cache afterwards.

use docflow_common::display::format_file_size;
use docflow_common::{Error, Result, TemplateRecord};
use tracing::{debug, info};

use crate::api::BackendApi;
use crate::gateway::UploadFile;

#[derive(Debug, Default)]
pub struct TemplateCatalog {
    templates: Vec<TemplateRecord>,
}

impl TemplateCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn templates(&self) -> &[TemplateRecord] {
        &self.templates
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.templates.iter().any(|t| t.filename == filename)
    }

    pub fn replace(&mut self, templates: Vec<TemplateRecord>) {
        self.templates = templates;
    }

    /// One line per template with its size and modification date.
    pub fn listing(&self) -> Vec<String> {
        self.templates
            .iter()
            .map(|t| {
                format!(
                    "{:<40} {:<5} {:>10}  {}",
                    t.filename,
                    t.document_type,
                    format_file_size(t.size_bytes),
                    t.last_modified
                )
            })
            .collect()
    }

    pub async fn refresh(&mut self, api: &BackendApi) -> Result<usize> {
        let templates = api.templates().await?;
        debug!("Loaded {} templates", templates.len());
        self.replace(templates);
        Ok(self.templates.len())
    }

    /// Upload a template. Returns the backend's confirmation text.
    pub async fn upload(&self, api: &BackendApi, file: UploadFile) -> Result<String> {
        if file.filename.trim().is_empty() {
            return Err(Error::validation("Choose a template file"));
        }

        let filename = file.filename.clone();
        let response = api.upload_template(file).await?;
        info!("Uploaded template {}", filename);

        Ok(response
            .message
            .unwrap_or_else(|| format!("Template {} uploaded", filename)))
    }

    pub async fn delete(&self, api: &BackendApi, filename: &str) -> Result<()> {
        if filename.trim().is_empty() {
            return Err(Error::validation("Choose a template to delete"));
        }
        api.delete_template(filename).await?;
        info!("Deleted template {}", filename);
        Ok(())
    }

    /// Text content of a template, for preview.
    pub async fn view(&self, api: &BackendApi, filename: &str) -> Result<String> {
        if filename.trim().is_empty() {
            return Err(Error::validation("Choose a template to view"));
        }
        api.view_template(filename).await
    }

    pub async fn download(&self, api: &BackendApi, filename: &str) -> Result<Vec<u8>> {
        if filename.trim().is_empty() {
            return Err(Error::validation("Choose a template to download"));
        }
        api.download_template(filename).await
    }
}
