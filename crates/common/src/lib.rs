pub mod display;
pub mod error;
pub mod lineage;
pub mod models;

pub use error::{Error, Result};
pub use lineage::{classify, lineage_of, FilterKind, Lineage};
pub use models::{
    GenerateRequest, GenerateResponse, GeneratedArtifactRecord, HistoryEntry, InjectionJob,
    ModelSettings, OutputFormat, SlideInjection, StagedImage, TemplateRecord, Usage,
};
