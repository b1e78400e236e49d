//! Client-side caches of backend listings
//!
//! Both caches are replaced wholesale on refresh. A failed refresh keeps
//! whatever was loaded last. Deletes only talk to the backend; reloading
//! afterwards is up to the caller.

use docflow_common::{classify, Error, FilterKind, GeneratedArtifactRecord, HistoryEntry, Result};
use tracing::{debug, info, warn};

use crate::api::BackendApi;

/// Generated documents, filterable by lineage
#[derive(Debug, Default)]
pub struct ArtifactLibrary {
    records: Vec<GeneratedArtifactRecord>,
    filter: FilterKind,
}

impl ArtifactLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[GeneratedArtifactRecord] {
        &self.records
    }

    pub fn filter(&self) -> FilterKind {
        self.filter
    }

    pub fn set_filter(&mut self, filter: FilterKind) {
        self.filter = filter;
    }

    /// Records admitted by the current filter, in backend order.
    pub fn visible(&self) -> Vec<GeneratedArtifactRecord> {
        classify(&self.records, self.filter)
    }

    pub fn replace(&mut self, records: Vec<GeneratedArtifactRecord>) {
        self.records = records;
    }

    pub async fn refresh(&mut self, api: &BackendApi) -> Result<usize> {
        match api.generated_documents().await {
            Ok(records) => {
                debug!("Loaded {} generated documents", records.len());
                self.replace(records);
                Ok(self.records.len())
            }
            Err(e) => {
                warn!("Refreshing generated documents failed: {}", e);
                Err(e)
            }
        }
    }

    pub async fn delete(&self, api: &BackendApi, filename: &str) -> Result<()> {
        if filename.trim().is_empty() {
            return Err(Error::validation("Choose a document to delete"));
        }
        api.delete_generated(filename).await?;
        info!("Deleted {}", filename);
        Ok(())
    }

    /// Delete several documents in one call. A failed batch may still have
    /// removed some of the files, so callers reload either way.
    pub async fn batch_delete(&self, api: &BackendApi, filenames: &[String]) -> Result<usize> {
        if filenames.is_empty() {
            return Err(Error::validation("Select at least one document"));
        }

        api.batch_delete_generated(filenames).await?;
        info!("Deleted {} documents", filenames.len());
        Ok(filenames.len())
    }

    pub async fn download(&self, api: &BackendApi, filename: &str) -> Result<Vec<u8>> {
        if filename.trim().is_empty() {
            return Err(Error::validation("Choose a document to download"));
        }
        api.download(filename).await
    }
}

/// Presentations an image injection can target, from `/history`
#[derive(Debug, Default)]
pub struct PresentationSources {
    entries: Vec<HistoryEntry>,
}

impl PresentationSources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.entries.iter().any(|entry| entry.filename == filename)
    }

    pub fn replace(&mut self, history: Vec<HistoryEntry>) {
        self.entries = history.into_iter().filter(HistoryEntry::is_presentation).collect();
    }

    pub async fn refresh(&mut self, api: &BackendApi) -> Result<usize> {
        let history = api.history().await?;
        self.replace(history);
        debug!("Loaded {} source presentations", self.entries.len());
        Ok(self.entries.len())
    }
}
