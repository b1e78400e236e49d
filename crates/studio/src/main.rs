//! Docflow command-line client
//!
//! Commands:
//! - settings: Show or change the AI provider
//! - templates: List, upload, delete, view and download templates
//! - docs: List, delete and download generated documents
//! - generate: Generate a document, optionally importing and optimizing first
//! - optimize: Rewrite requirements with the AI model
//! - import: Extract requirements text from an existing document
//! - inject: Insert images into slides of a presentation
//! - diagram: Turn a process description into a flowchart
//! - guide: Show the backend's usage guide

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use docflow_common::display::{format_file_size, generation_report};
use docflow_common::{FilterKind, ModelSettings, OutputFormat};
use docflow_studio::generation::GenerationState;
use docflow_studio::{Channel, Command, Config, Gateway, HttpGateway, MockBackend, UploadFile, Workbench};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "docflow")]
#[command(about = "Client for the document generation backend")]
struct Cli {
    /// Backend API base URL (overrides DOCFLOW_API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    /// Answer from the built-in demo backend instead of HTTP
    #[arg(long, global = true)]
    mock: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show or change the AI provider
    Settings {
        #[command(subcommand)]
        action: SettingsAction,
    },

    /// Manage document templates
    Templates {
        #[command(subcommand)]
        action: TemplateAction,
    },

    /// Manage generated documents
    Docs {
        #[command(subcommand)]
        action: DocsAction,
    },

    /// Generate a document from a template
    Generate {
        /// Document type, e.g. report or sop
        #[arg(long)]
        doc_type: String,

        /// Template filename as listed by `templates list`
        #[arg(long)]
        template: String,

        /// Requirements text
        #[arg(short, long, default_value = "")]
        requirements: String,

        /// Read the requirements from a file instead
        #[arg(long, conflicts_with = "requirements")]
        requirements_file: Option<PathBuf>,

        /// Output format: docx, pptx, pdf or md
        #[arg(short, long)]
        format: Option<OutputFormat>,

        /// Start from the text and images of an existing document
        #[arg(long)]
        import: Option<PathBuf>,

        /// Optimize the requirements and use the result
        #[arg(long)]
        optimize: bool,
    },

    /// Rewrite requirements with the AI model
    Optimize {
        #[arg(long)]
        doc_type: String,

        #[arg(short, long)]
        requirements: String,
    },

    /// Extract requirements text from an existing document
    Import {
        file: PathBuf,
    },

    /// Insert images into slides of a generated presentation
    Inject {
        /// Source presentation filename
        #[arg(short, long)]
        source: String,

        /// Image to insert, as `path` or `path@slide` (slide defaults to 1)
        #[arg(short, long = "image", required = true)]
        images: Vec<String>,
    },

    /// Turn a process description into a flowchart
    Diagram {
        #[arg(short, long)]
        description: String,

        /// Also render the flowchart image
        #[arg(long)]
        render: bool,

        /// Save the rendered image here
        #[arg(short, long, requires = "render")]
        output: Option<PathBuf>,
    },

    /// Show the backend's usage guide
    Guide,
}

#[derive(Subcommand)]
enum SettingsAction {
    Show,
    Set {
        /// AI provider, e.g. gemini or openai
        #[arg(long)]
        provider: String,

        /// OpenAI model name
        #[arg(long)]
        model: Option<String>,
    },
}

#[derive(Subcommand)]
enum TemplateAction {
    List,
    Upload { file: PathBuf },
    Delete { filename: String },
    View { filename: String },
    Download {
        filename: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Subcommand)]
enum DocsAction {
    List {
        /// all, generated or optimized
        #[arg(long, default_value = "all")]
        filter: FilterKind,
    },
    Delete { filename: String },
    BatchDelete {
        #[arg(required = true)]
        filenames: Vec<String>,
    },
    Download {
        filename: String,
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docflow=info,docflow_studio=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let mut config = Config::from_env()?;
    if let Some(api_url) = cli.api_url.clone() {
        config.api_base_url = api_url;
        config.validate()?;
    }
    config.mock_mode |= cli.mock;

    let gateway: Arc<dyn Gateway> = if config.mock_mode {
        info!("Using the built-in demo backend");
        Arc::new(MockBackend::demo().await)
    } else {
        info!("Backend: {}", config.api_base_url);
        Arc::new(
            HttpGateway::with_user_agent(config.api_base_url.clone(), &config.user_agent)
                .context("Failed to create HTTP gateway")?,
        )
    };

    let mut bench = Workbench::new(&config, gateway);
    run(&mut bench, cli.command).await
}

async fn run(bench: &mut Workbench, command: Commands) -> Result<()> {
    match command {
        Commands::Settings { action } => match action {
            SettingsAction::Show => {
                step(bench, Command::LoadSettings).await?;
                let settings = bench.settings();
                println!("provider: {}", settings.api_type);
                println!("model:    {}", settings.openai_model);
            }
            SettingsAction::Set { provider, model } => {
                step(bench, Command::LoadSettings).await?;
                let settings = ModelSettings {
                    api_type: provider,
                    openai_model: model.unwrap_or_else(|| bench.settings().openai_model.clone()),
                };
                step(bench, Command::SaveSettings(settings)).await?;
            }
        },

        Commands::Templates { action } => match action {
            TemplateAction::List => {
                step(bench, Command::RefreshTemplates).await?;
                for line in bench.templates().listing() {
                    println!("{}", line);
                }
            }
            TemplateAction::Upload { file } => {
                let file = read_upload(&file).await?;
                step(bench, Command::UploadTemplate(file)).await?;
            }
            TemplateAction::Delete { filename } => {
                step(bench, Command::DeleteTemplate(filename)).await?;
            }
            TemplateAction::View { filename } => {
                step(bench, Command::ViewTemplate(filename)).await?;
                if let Some((_, content)) = bench.template_preview() {
                    println!("{}", content);
                }
            }
            TemplateAction::Download { filename, output } => {
                let bytes = bench.templates().download(bench.api(), &filename).await?;
                save(output.as_deref().unwrap_or(Path::new(&filename)), &bytes).await?;
            }
        },

        Commands::Docs { action } => match action {
            DocsAction::List { filter } => {
                step(bench, Command::RefreshArtifacts).await?;
                step(bench, Command::SetFilter(filter)).await?;
                for record in bench.library().visible() {
                    println!(
                        "{:<48} {:<5} {:>10}  {}",
                        record.filename,
                        record.format,
                        format_file_size(record.size_bytes),
                        record.created_at
                    );
                }
            }
            DocsAction::Delete { filename } => {
                step(bench, Command::DeleteArtifact(filename)).await?;
            }
            DocsAction::BatchDelete { filenames } => {
                step(bench, Command::BatchDeleteArtifacts(filenames)).await?;
            }
            DocsAction::Download { filename, output } => {
                let bytes = bench.library().download(bench.api(), &filename).await?;
                save(output.as_deref().unwrap_or(Path::new(&filename)), &bytes).await?;
            }
        },

        Commands::Generate {
            doc_type,
            template,
            requirements,
            requirements_file,
            format,
            import,
            optimize,
        } => {
            if let Some(path) = import {
                let file = read_upload(&path).await?;
                step(bench, Command::ImportDocument(file)).await?;
            }

            let requirements = match requirements_file {
                Some(path) => Some(
                    tokio::fs::read_to_string(&path)
                        .await
                        .with_context(|| format!("Failed to read {}", path.display()))?,
                ),
                None if !requirements.is_empty() => Some(requirements),
                None => None,
            };
            if let Some(text) = requirements {
                step(bench, Command::EditRequirements(text)).await?;
            }

            step(bench, Command::SetDocumentType(Some(doc_type))).await?;
            step(bench, Command::SetTemplate(Some(template))).await?;
            if let Some(format) = format {
                step(bench, Command::SetOutputFormat(format)).await?;
            }

            if optimize {
                step(bench, Command::OptimizeRequirements).await?;
                step(bench, Command::AcceptOptimized).await?;
            }

            step(bench, Command::Generate).await?;
            if let GenerationState::Succeeded(result) = bench.generation().state() {
                let url = bench.api().download_url(&result.filename)?;
                println!("{}", generation_report(result, &url));
            }
        }

        Commands::Optimize { doc_type, requirements } => {
            step(bench, Command::SetDocumentType(Some(doc_type))).await?;
            step(bench, Command::EditRequirements(requirements)).await?;
            step(bench, Command::OptimizeRequirements).await?;
            if let Some(optimized) = bench.optimization().optimized() {
                println!("{}", optimized);
            }
        }

        Commands::Import { file } => {
            let file = read_upload(&file).await?;
            step(bench, Command::ImportDocument(file)).await?;
            println!("{}", bench.generation().draft().requirements);
            if let Some(folder) = &bench.generation().draft().image_folder {
                println!("\nimage folder: {}", folder);
            }
        }

        Commands::Inject { source, images } => {
            step(bench, Command::RefreshSources).await?;
            step(bench, Command::SelectSource(Some(source))).await?;

            for arg in &images {
                let (path, slide) = parse_image_arg(arg);
                let file = read_upload(&path).await?;
                let before = bench.registry().len();
                step(bench, Command::StageImages(vec![file])).await?;

                if let Some(value) = slide {
                    if bench.registry().len() > before {
                        step(bench, Command::SetSlideNumber { index: before, value }).await?;
                    }
                }
            }

            step(bench, Command::InjectImages).await?;
        }

        Commands::Diagram {
            description,
            render,
            output,
        } => {
            step(bench, Command::DescribeDiagram(description)).await?;
            step(bench, Command::GenerateDiagramSource).await?;
            if let Some(source) = bench.diagram().source() {
                println!("{}", source);
            }

            if render {
                step(bench, Command::RenderDiagram).await?;
                if let Some(rendered) = bench.diagram().rendered().cloned() {
                    println!("\nimage: {}", rendered.image_url);
                    if let Some(path) = output {
                        let bytes = bench.api().fetch(&rendered.image_url).await?;
                        save(&path, &bytes).await?;
                    }
                }
            }
        }

        Commands::Guide => {
            step(bench, Command::LoadHelp).await?;
            if let Some(help) = bench.help() {
                println!("{}", help);
            }
        }
    }

    print_alerts(bench);
    Ok(())
}

/// Dispatch one command and print the alerts it raised.
async fn step(bench: &mut Workbench, command: Command) -> Result<()> {
    let channel = command.channel();
    let result = bench.dispatch(command).await;
    print_alerts(bench);
    result.with_context(|| format!("{} step failed", channel_name(channel)))
}

fn print_alerts(bench: &mut Workbench) {
    for alert in bench.alerts_mut().drain() {
        if alert.is_error() {
            eprintln!("error: {}", alert.message);
        } else {
            println!("{}", alert.message);
        }
    }
}

fn channel_name(channel: Channel) -> &'static str {
    match channel {
        Channel::Generate => "generate",
        Channel::Optimize => "optimize",
        Channel::Documents => "documents",
        Channel::Templates => "templates",
        Channel::Injection => "inject",
        Channel::Diagram => "diagram",
        Channel::Settings => "settings",
    }
}

/// Split `path@slide` into its parts. A suffix that is not all digits is
/// part of the path.
fn parse_image_arg(arg: &str) -> (PathBuf, Option<String>) {
    match arg.rsplit_once('@') {
        Some((path, slide)) if !path.is_empty() && !slide.is_empty() && slide.chars().all(|c| c.is_ascii_digit()) => {
            (PathBuf::from(path), Some(slide.to_string()))
        }
        _ => (PathBuf::from(arg), None),
    }
}

async fn read_upload(path: &Path) -> Result<UploadFile> {
    UploadFile::read(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))
}

async fn save(path: &Path, bytes: &[u8]) -> Result<()> {
    tokio::fs::write(path, bytes)
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    println!("saved {} ({})", path.display(), format_file_size(bytes.len() as u64));
    Ok(())
}
