//! The interactive workflow as a whole
//!
//! A [`Workbench`] owns every lifecycle and cache and applies [`Command`]s
//! to them one at a time. Each command's outcome is pushed to the alert
//! sink on the command's channel as well as returned.

use docflow_common::{Error, FilterKind, ModelSettings, OutputFormat, Result};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::api::BackendApi;
use crate::config::Config;
use crate::diagram::DiagramLifecycle;
use crate::gateway::{Gateway, UploadFile};
use crate::generation::GenerationLifecycle;
use crate::library::{ArtifactLibrary, PresentationSources};
use crate::notify::{AlertSink, Channel};
use crate::optimization::OptimizationLifecycle;
use crate::registry::StagedImageRegistry;
use crate::templates::TemplateCatalog;

/// A user action
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    // Generation form
    SetDocumentType(Option<String>),
    SetTemplate(Option<String>),
    EditRequirements(String),
    SetOutputFormat(OutputFormat),
    ImportDocument(UploadFile),
    Generate,
    ClearForm,

    // Requirement optimization
    OptimizeRequirements,
    EditOptimized(String),
    AcceptOptimized,
    CancelOptimized,
    RevertRequirements,

    // Generated documents
    RefreshArtifacts,
    SetFilter(FilterKind),
    DeleteArtifact(String),
    BatchDeleteArtifacts(Vec<String>),

    // Image injection
    RefreshSources,
    SelectSource(Option<String>),
    StageImages(Vec<UploadFile>),
    SetSlideNumber { index: usize, value: String },
    RemoveImage(usize),
    InjectImages,
    ClearInjection,

    // Flowchart
    DescribeDiagram(String),
    EditDiagramSource(String),
    GenerateDiagramSource,
    RenderDiagram,
    ResetDiagram,

    // Templates
    RefreshTemplates,
    UploadTemplate(UploadFile),
    DeleteTemplate(String),
    ViewTemplate(String),

    // Settings and help
    LoadSettings,
    SaveSettings(ModelSettings),
    LoadHelp,
}

impl Command {
    /// Panel the command's alerts are shown on
    pub fn channel(&self) -> Channel {
        use Command::*;

        match self {
            SetDocumentType(_) | SetTemplate(_) | EditRequirements(_) | SetOutputFormat(_) | ImportDocument(_)
            | Generate | ClearForm => Channel::Generate,
            OptimizeRequirements | EditOptimized(_) | AcceptOptimized | CancelOptimized | RevertRequirements => {
                Channel::Optimize
            }
            RefreshArtifacts | SetFilter(_) | DeleteArtifact(_) | BatchDeleteArtifacts(_) => Channel::Documents,
            RefreshSources | SelectSource(_) | StageImages(_) | SetSlideNumber { .. } | RemoveImage(_)
            | InjectImages | ClearInjection => Channel::Injection,
            DescribeDiagram(_) | EditDiagramSource(_) | GenerateDiagramSource | RenderDiagram | ResetDiagram => {
                Channel::Diagram
            }
            RefreshTemplates | UploadTemplate(_) | DeleteTemplate(_) | ViewTemplate(_) => Channel::Templates,
            LoadSettings | SaveSettings(_) | LoadHelp => Channel::Settings,
        }
    }
}

pub struct Workbench {
    api: BackendApi,
    alerts: AlertSink,
    generation: GenerationLifecycle,
    optimization: OptimizationLifecycle,
    registry: StagedImageRegistry,
    diagram: DiagramLifecycle,
    library: ArtifactLibrary,
    sources: PresentationSources,
    templates: TemplateCatalog,
    settings: ModelSettings,
    template_preview: Option<(String, String)>,
    help: Option<String>,
}

impl Workbench {
    pub fn new(config: &Config, gateway: Arc<dyn Gateway>) -> Self {
        Self {
            api: BackendApi::new(gateway),
            alerts: AlertSink::new(config.alert_dismiss()),
            generation: GenerationLifecycle::new(config.default_output_format),
            optimization: OptimizationLifecycle::new(),
            registry: StagedImageRegistry::new(),
            diagram: DiagramLifecycle::new(),
            library: ArtifactLibrary::new(),
            sources: PresentationSources::new(),
            templates: TemplateCatalog::new(),
            settings: ModelSettings::default(),
            template_preview: None,
            help: None,
        }
    }

    pub fn api(&self) -> &BackendApi {
        &self.api
    }

    pub fn alerts(&self) -> &AlertSink {
        &self.alerts
    }

    pub fn alerts_mut(&mut self) -> &mut AlertSink {
        &mut self.alerts
    }

    pub fn generation(&self) -> &GenerationLifecycle {
        &self.generation
    }

    pub fn optimization(&self) -> &OptimizationLifecycle {
        &self.optimization
    }

    pub fn registry(&self) -> &StagedImageRegistry {
        &self.registry
    }

    pub fn diagram(&self) -> &DiagramLifecycle {
        &self.diagram
    }

    pub fn library(&self) -> &ArtifactLibrary {
        &self.library
    }

    pub fn sources(&self) -> &PresentationSources {
        &self.sources
    }

    pub fn templates(&self) -> &TemplateCatalog {
        &self.templates
    }

    pub fn settings(&self) -> &ModelSettings {
        &self.settings
    }

    /// Last viewed template as `(filename, content)`
    pub fn template_preview(&self) -> Option<(&str, &str)> {
        self.template_preview
            .as_ref()
            .map(|(name, content)| (name.as_str(), content.as_str()))
    }

    pub fn help(&self) -> Option<&str> {
        self.help.as_deref()
    }

    /// Apply one command. Failures are reported on the command's channel
    /// and returned; successes worth announcing raise a success alert.
    pub async fn dispatch(&mut self, command: Command) -> Result<()> {
        let channel = command.channel();
        debug!(?channel, "Dispatching {:?}", command);

        match self.execute(command).await {
            Ok(Some(message)) => {
                self.alerts.success(channel, message);
                Ok(())
            }
            Ok(None) => Ok(()),
            Err(e) => {
                self.alerts.report(channel, &e);
                Err(e)
            }
        }
    }

    async fn execute(&mut self, command: Command) -> Result<Option<String>> {
        match command {
            Command::SetDocumentType(doc_type) => {
                self.generation.draft_mut().doc_type = doc_type;
                Ok(None)
            }
            Command::SetTemplate(template) => {
                self.generation.draft_mut().template = template;
                Ok(None)
            }
            Command::EditRequirements(text) => {
                self.generation.draft_mut().requirements = text;
                Ok(None)
            }
            Command::SetOutputFormat(format) => {
                self.generation.draft_mut().output_format = format;
                Ok(None)
            }
            Command::ImportDocument(file) => {
                let extracted = self.generation.import_document(&self.api, file).await?;
                let images = extracted.images.as_ref().map(|i| i.count).unwrap_or(0);
                Ok(Some(if images > 0 {
                    format!("Imported document text and {} images", images)
                } else {
                    "Imported document text".to_string()
                }))
            }
            Command::Generate => {
                let response = self.generation.submit(&self.api).await?;
                self.refresh_library_quietly(Channel::Generate).await;
                Ok(Some(format!("Generated {}", response.filename)))
            }
            Command::ClearForm => {
                self.generation.clear_form();
                self.optimization.reset();
                Ok(None)
            }

            Command::OptimizeRequirements => {
                let draft = self.generation.draft();
                let requirements = draft.requirements.clone();
                let doc_type = draft.doc_type.clone();
                self.optimization
                    .optimize(&self.api, &requirements, doc_type.as_deref())
                    .await?;
                Ok(Some("Requirements optimized, review the result".to_string()))
            }
            Command::EditOptimized(text) => {
                self.optimization.edit_optimized(text)?;
                Ok(None)
            }
            Command::AcceptOptimized => {
                self.optimization
                    .accept(&mut self.generation.draft_mut().requirements)?;
                Ok(Some("Optimized requirements applied".to_string()))
            }
            Command::CancelOptimized => {
                self.optimization.cancel()?;
                Ok(None)
            }
            Command::RevertRequirements => {
                self.optimization
                    .revert(&mut self.generation.draft_mut().requirements)?;
                Ok(Some("Original requirements restored".to_string()))
            }

            Command::RefreshArtifacts => {
                self.library.refresh(&self.api).await?;
                Ok(None)
            }
            Command::SetFilter(filter) => {
                self.library.set_filter(filter);
                Ok(None)
            }
            Command::DeleteArtifact(filename) => {
                self.library.delete(&self.api, &filename).await?;
                self.refresh_library_quietly(Channel::Documents).await;
                Ok(Some(format!("Deleted {}", filename)))
            }
            Command::BatchDeleteArtifacts(filenames) => {
                let outcome = self.library.batch_delete(&self.api, &filenames).await;
                if !matches!(outcome, Err(Error::LocalValidation(_))) {
                    self.refresh_library_quietly(Channel::Documents).await;
                }
                let count = outcome?;
                Ok(Some(format!("Deleted {} documents", count)))
            }

            Command::RefreshSources => {
                self.refresh_sources().await?;
                Ok(None)
            }
            Command::SelectSource(source) => {
                self.registry.select_source(source);
                Ok(None)
            }
            Command::StageImages(files) => {
                let report = self.registry.stage_uploads(&self.api, files).await;
                for (filename, e) in &report.failures {
                    self.alerts
                        .error(Channel::Injection, format!("Upload of {} failed: {}", filename, e));
                }
                Ok((!report.staged.is_empty()).then(|| format!("Uploaded {} images", report.staged.len())))
            }
            Command::SetSlideNumber { index, value } => {
                self.registry.set_slide_number(index, &value)?;
                Ok(None)
            }
            Command::RemoveImage(index) => {
                self.registry.remove(index)?;
                Ok(None)
            }
            Command::InjectImages => {
                let response = self.registry.inject(&self.api).await?;
                self.refresh_library_quietly(Channel::Injection).await;
                if let Err(e) = self.refresh_sources().await {
                    warn!("Refreshing source presentations after injection failed: {}", e);
                    self.alerts.report(Channel::Injection, &e);
                }
                Ok(Some(format!("Created {}", response.filename)))
            }
            Command::ClearInjection => {
                self.registry.reset();
                Ok(None)
            }

            Command::DescribeDiagram(description) => {
                self.diagram.set_description(description);
                Ok(None)
            }
            Command::EditDiagramSource(source) => {
                self.diagram.set_source(source);
                Ok(None)
            }
            Command::GenerateDiagramSource => {
                self.diagram.generate_source(&self.api).await?;
                Ok(Some("Flowchart source generated".to_string()))
            }
            Command::RenderDiagram => {
                let rendered = self.diagram.render(&self.api).await?;
                Ok(Some(format!("Rendered {}", rendered.filename)))
            }
            Command::ResetDiagram => {
                self.diagram.reset();
                Ok(None)
            }

            Command::RefreshTemplates => {
                self.refresh_templates().await?;
                Ok(None)
            }
            Command::UploadTemplate(file) => {
                let message = self.templates.upload(&self.api, file).await?;
                self.refresh_templates_quietly().await;
                Ok(Some(message))
            }
            Command::DeleteTemplate(filename) => {
                self.templates.delete(&self.api, &filename).await?;
                self.refresh_templates_quietly().await;
                if self.template_preview.as_ref().map(|(name, _)| name) == Some(&filename) {
                    self.template_preview = None;
                }
                Ok(Some(format!("Deleted template {}", filename)))
            }
            Command::ViewTemplate(filename) => {
                let content = self.templates.view(&self.api, &filename).await?;
                self.template_preview = Some((filename, content));
                Ok(None)
            }

            Command::LoadSettings => {
                self.settings = self.api.settings().await?;
                Ok(None)
            }
            Command::SaveSettings(settings) => {
                if settings.api_type.trim().is_empty() {
                    return Err(Error::validation("Choose an AI provider"));
                }
                self.api.save_settings(&settings).await?;
                self.settings = settings;
                Ok(Some("Settings saved".to_string()))
            }
            Command::LoadHelp => {
                self.help = Some(self.api.help().await?);
                Ok(None)
            }
        }
    }

    /// Reload the document list after a mutation. The mutation itself
    /// succeeded, so a failed reload is only reported.
    async fn refresh_library_quietly(&mut self, channel: Channel) {
        if let Err(e) = self.library.refresh(&self.api).await {
            self.alerts.report(channel, &e);
        }
    }

    /// Reload the template catalog, dropping a chosen template that is gone.
    async fn refresh_templates(&mut self) -> Result<()> {
        self.templates.refresh(&self.api).await?;

        let vanished = self
            .generation
            .draft()
            .template
            .as_deref()
            .map(|template| !self.templates.contains(template))
            .unwrap_or(false);
        if vanished {
            debug!("Chosen template no longer exists");
            self.generation.draft_mut().template = None;
        }
        Ok(())
    }

    async fn refresh_templates_quietly(&mut self) {
        if let Err(e) = self.refresh_templates().await {
            warn!("Refreshing templates failed: {}", e);
            self.alerts.report(Channel::Templates, &e);
        }
    }

    /// Reload source presentations, dropping a chosen source that is gone.
    async fn refresh_sources(&mut self) -> Result<()> {
        self.sources.refresh(&self.api).await?;

        let vanished = self
            .registry
            .source()
            .map(|source| !self.sources.contains(source))
            .unwrap_or(false);
        if vanished {
            debug!("Chosen source presentation no longer exists");
            self.registry.select_source(None);
        }
        Ok(())
    }
}
