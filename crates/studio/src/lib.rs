//! Docflow Studio
//!
//! Client-side workflow layer for the document generation backend.
//!
//! ## Architecture
//!
//! The backend renders documents, calls the AI models and stores files. This
//! crate holds everything the user works with in between: drafts, staged
//! images, review buffers and cached listings, and the rules for moving them
//! through each multi-step operation.
//!
//! **Components:**
//! - `gateway`: Remote call boundary (`Gateway` trait, `HttpGateway`)
//! - `api`: Typed endpoint wrappers and `success`/`error` envelope handling
//! - `generation`: Draft validation and document generation
//! - `optimization`: Requirement optimization with accept/cancel/revert
//! - `registry`: Staged images and slide injection
//! - `diagram`: Description → Mermaid source → rendered flowchart
//! - `library`: Generated documents and source presentations
//! - `templates`: Template catalog
//! - `notify`: Auto-dismissing success/error alerts
//! - `workbench`: Command dispatch over all of the above
//! - `mock_backend`: Scripted gateway for tests and `--mock` runs
//! - `config`: Configuration management
//!
//! **Data Flow:**
//! 1. A front end turns user input into a `Command`
//! 2. `Workbench::dispatch` validates locally, then calls the backend
//! 3. The owning lifecycle records the outcome and mutating calls reload
//!    the affected listing
//! 4. The outcome is pushed to the alert sink on the command's channel

pub mod api;
pub mod config;
pub mod diagram;
pub mod gateway;
pub mod generation;
pub mod library;
pub mod mock_backend;
pub mod notify;
pub mod optimization;
pub mod registry;
pub mod templates;
pub mod workbench;

// Re-export commonly used types
pub use api::BackendApi;
pub use config::Config;
pub use gateway::{Gateway, GatewayError, HttpGateway, UploadFile};
pub use mock_backend::MockBackend;
pub use notify::{Alert, AlertKind, AlertSink, Channel};
pub use workbench::{Command, Workbench};
