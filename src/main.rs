use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use labelsmith::extract::{JsonResource, extract_tree};
use labelsmith::llm::{GenerationSettings, LlmClientBuilder, LlmError, Provider};
use labelsmith::models::LabelCatalog;
use labelsmith::store::{CatalogSource, StoreError};
use labelsmith::{
    ConfigError, FailureKind, JsonDocumentStore, LabelStore, LabelSuggester, LabelSuggesterBuilder,
    ServiceError, SuggestionMode, TaggingConfig, TaggingError, TaggingService,
};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// labelsmith - suggest catalog labels for content documents with a language model
#[derive(Parser)]
#[command(name = "labelsmith")]
#[command(about = "Suggest controlled-vocabulary labels for content documents")]
#[command(version)]
struct Cli {
    /// Tagging rules file (default: {config_dir}/labelsmith/config.json if present)
    #[arg(long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Label database (default: {data_dir}/labelsmith/labels.db)
    #[arg(long, global = true, value_name = "PATH")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand)]
enum Commands {
    /// Print a document's tree without excluded keys
    Extract(DocumentArgs),
    /// Print the text that would be sent for classification
    Flatten(FlattenCommand),
    /// Print the label suggestion prompt for a document
    Prompt(CatalogArgs),
    /// Ask the model for labels from the catalog
    Suggest(SuggestCommand),
    /// Ask the model for free-form concepts
    Concepts(ModelCommand),
    /// Classify a document into one content type
    Classify(ModelCommand),
    /// Manage the label catalog
    #[command(subcommand)]
    Catalog(CatalogCommand),
    /// Suggest labels for a stored document and apply them
    Apply(ApplyCommand),
}

#[derive(Args)]
struct DocumentArgs {
    /// JSON document file
    #[arg(value_name = "FILE")]
    file: PathBuf,
}

#[derive(Args)]
struct FlattenCommand {
    #[command(flatten)]
    document: DocumentArgs,

    /// Prepend the page title, name and description
    #[arg(long)]
    header: bool,
}

#[derive(Args)]
struct CatalogArgs {
    #[command(flatten)]
    document: DocumentArgs,

    /// JSON catalog file (label ID -> title) instead of the label database
    #[arg(long, value_name = "PATH")]
    catalog: Option<PathBuf>,
}

#[derive(Args)]
struct ModelArgs {
    /// Model provider (ollama or openai)
    #[arg(long, value_name = "PROVIDER")]
    provider: Option<Provider>,

    /// Model name
    #[arg(short, long, value_name = "MODEL")]
    model: Option<String>,
}

#[derive(Args)]
struct ModelCommand {
    #[command(flatten)]
    document: DocumentArgs,

    #[command(flatten)]
    model: ModelArgs,
}

#[derive(Args)]
struct SuggestCommand {
    #[command(flatten)]
    target: CatalogArgs,

    #[command(flatten)]
    model: ModelArgs,

    /// Map free-form concepts instead of asking for catalog IDs
    #[arg(long)]
    concepts: bool,
}

#[derive(Subcommand)]
enum CatalogCommand {
    /// Import labels from a JSON file (label ID -> title)
    Import {
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
    /// List the labels in the database
    List,
}

#[derive(Args)]
struct ApplyCommand {
    /// Document reference, e.g. /content/site/en/electric-suv
    #[arg(value_name = "REFERENCE")]
    reference: String,

    /// Directory holding the JSON documents
    #[arg(long, value_name = "DIR")]
    root: PathBuf,

    #[command(flatten)]
    model: ModelArgs,

    /// Map free-form concepts instead of asking for catalog IDs
    #[arg(long)]
    concepts: bool,
}

fn main() {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| "labelsmith=info".into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let result = match &cli.command {
        Commands::Extract(cmd) => handle_extract(&cli, cmd),
        Commands::Flatten(cmd) => handle_flatten(&cli, cmd),
        Commands::Prompt(cmd) => handle_prompt(&cli, cmd),
        Commands::Suggest(cmd) => handle_suggest(&cli, cmd),
        Commands::Concepts(cmd) => handle_concepts(&cli, cmd),
        Commands::Classify(cmd) => handle_classify(&cli, cmd),
        Commands::Catalog(cmd) => handle_catalog(&cli, cmd),
        Commands::Apply(cmd) => handle_apply(&cli, cmd),
    };

    if let Err(e) = result {
        let exit_code = if is_user_error(&e) { 1 } else { 2 };
        eprintln!("Error: {e:#}");
        std::process::exit(exit_code);
    }
}

/// Determines if an error is a user error (vs internal error).
///
/// User errors are bad input or configuration: missing files, invalid
/// rules, documents with nothing to tag. Model, network and database
/// failures are internal.
fn is_user_error(error: &anyhow::Error) -> bool {
    error.chain().any(|cause| {
        if let Some(e) = cause.downcast_ref::<ServiceError>() {
            return match e {
                ServiceError::Tagging(e) => is_nothing_to_tag(e),
                ServiceError::Store(e) => matches!(e, StoreError::InvalidReference(_)),
            };
        }
        if let Some(e) = cause.downcast_ref::<TaggingError>() {
            return is_nothing_to_tag(e);
        }
        cause.downcast_ref::<ConfigError>().is_some()
            || cause.downcast_ref::<std::io::Error>().is_some()
            || matches!(cause.downcast_ref::<StoreError>(), Some(StoreError::InvalidReference(_)))
            || matches!(
                cause.downcast_ref::<LlmError>(),
                Some(LlmError::MissingApiKey(_) | LlmError::InvalidUrl(_) | LlmError::InvalidSettings(_))
            )
    })
}

fn is_nothing_to_tag(error: &TaggingError) -> bool {
    matches!(
        error.kind(),
        FailureKind::InputAbsent | FailureKind::EmptyContent | FailureKind::EmptyCatalog
    )
}

fn handle_extract(cli: &Cli, cmd: &DocumentArgs) -> Result<()> {
    let config = load_config(cli)?;
    let document = read_document(&cmd.file)?;
    let name = document_name(&cmd.file);

    let tree = extract_tree(
        Some(&JsonResource::new(&name, &document)),
        &config.excluded_keys,
        config.max_depth,
    );
    println!("{}", serde_json::to_string_pretty(&tree)?);
    Ok(())
}

fn handle_flatten(cli: &Cli, cmd: &FlattenCommand) -> Result<()> {
    let config = load_config(cli)?;
    let document = read_document(&cmd.document.file)?;
    let name = document_name(&cmd.document.file);

    let suggester = offline_suggester(config);
    let prepared = suggester.prepare(&JsonResource::new(&name, &document));

    if cmd.header {
        println!("{}", prepared.content());
    } else {
        println!("{}", prepared.text);
    }
    Ok(())
}

fn handle_prompt(cli: &Cli, cmd: &CatalogArgs) -> Result<()> {
    let config = load_config(cli)?;
    let document = read_document(&cmd.document.file)?;
    let name = document_name(&cmd.document.file);
    let catalog = load_catalog(cli, cmd.catalog.as_deref())?;

    let suggester = offline_suggester(config);
    let prompt = suggester.suggestion_prompt(&JsonResource::new(&name, &document), &catalog)?;
    println!("{prompt}");
    Ok(())
}

fn handle_suggest(cli: &Cli, cmd: &SuggestCommand) -> Result<()> {
    let config = load_config(cli)?;
    let document = read_document(&cmd.target.document.file)?;
    let name = document_name(&cmd.target.document.file);
    let catalog = load_catalog(cli, cmd.target.catalog.as_deref())?;

    let suggester = build_suggester(config, &cmd.model)?;
    let resource = JsonResource::new(&name, &document);
    let labels = if cmd.concepts {
        suggester.suggest_from_concepts(&resource, &catalog)?
    } else {
        suggester.suggest_labels(&resource, &catalog)?
    };

    for label in &labels {
        let title = catalog.title(label.as_str()).unwrap_or_default();
        println!("{label}\t{title}");
    }
    Ok(())
}

fn handle_concepts(cli: &Cli, cmd: &ModelCommand) -> Result<()> {
    let config = load_config(cli)?;
    let document = read_document(&cmd.document.file)?;
    let name = document_name(&cmd.document.file);

    let suggester = build_suggester(config, &cmd.model)?;
    for concept in suggester.extract_concepts(&JsonResource::new(&name, &document))? {
        println!("{concept}");
    }
    Ok(())
}

fn handle_classify(cli: &Cli, cmd: &ModelCommand) -> Result<()> {
    let config = load_config(cli)?;
    let document = read_document(&cmd.document.file)?;
    let name = document_name(&cmd.document.file);

    let suggester = build_suggester(config, &cmd.model)?;
    let content_type = suggester.classify_content_type(&JsonResource::new(&name, &document))?;
    println!("{content_type}");
    Ok(())
}

fn handle_catalog(cli: &Cli, cmd: &CatalogCommand) -> Result<()> {
    let store = open_label_store(cli)?;

    match cmd {
        CatalogCommand::Import { file } => {
            let catalog = read_catalog(file)?;
            let count = store.import_catalog(&catalog).context("Failed to import catalog")?;
            println!("Imported {count} labels");
        }
        CatalogCommand::List => {
            let catalog = store
                .all_available_labels()
                .context("Failed to read catalog")?;
            for (id, title) in catalog.iter() {
                println!("{id}\t{title}");
            }
        }
    }
    Ok(())
}

fn handle_apply(cli: &Cli, cmd: &ApplyCommand) -> Result<()> {
    let config = load_config(cli)?;
    let suggester = build_suggester(config, &cmd.model)?;
    let documents = JsonDocumentStore::new(&cmd.root);
    let labels = open_label_store(cli)?;

    let mode = if cmd.concepts {
        SuggestionMode::Concepts
    } else {
        SuggestionMode::Catalog
    };
    let service = TaggingService::new(&suggester, &documents, &labels, &labels).with_mode(mode);

    let report = service.process(&cmd.reference)?;
    println!(
        "Applied {} of {} suggested labels to {}",
        report.applied,
        report.suggested.len(),
        report.document
    );
    for label in &report.suggested {
        println!("  {label}");
    }
    Ok(())
}

fn load_config(cli: &Cli) -> Result<TaggingConfig> {
    Ok(TaggingConfig::from_file_or_default(cli.config.clone())?)
}

/// Builds a suggester from the environment, overridden by command-line options.
fn build_suggester(config: TaggingConfig, args: &ModelArgs) -> Result<LabelSuggester> {
    let mut builder = LlmClientBuilder::new();
    if let Some(provider) = args.provider {
        builder = builder.provider(provider);
    }
    let client = builder.build()?;

    Ok(LabelSuggesterBuilder::new()
        .client(client)
        .settings(generation_settings(args)?)
        .config(config)
        .build())
}

/// Environment settings with the `--model` override applied and re-checked.
fn generation_settings(args: &ModelArgs) -> Result<GenerationSettings> {
    let mut settings = GenerationSettings::from_env()?;
    if let Some(model) = &args.model {
        settings.model = model.clone();
        settings.validate()?;
    }
    Ok(settings)
}

/// A suggester for commands that never call the model.
fn offline_suggester(config: TaggingConfig) -> LabelSuggester {
    LabelSuggesterBuilder::new()
        .client(std::sync::Arc::new(OfflineClient))
        .config(config)
        .build()
}

struct OfflineClient;

impl labelsmith::llm::LlmClientTrait for OfflineClient {
    fn generate(&self, _prompt: &str, _settings: &GenerationSettings) -> Result<String, LlmError> {
        Err(LlmError::InvalidSettings(
            "this command does not call a model".to_string(),
        ))
    }
}

fn load_catalog(cli: &Cli, file: Option<&Path>) -> Result<LabelCatalog> {
    match file {
        Some(path) => read_catalog(path),
        None => Ok(open_label_store(cli)?
            .all_available_labels()
            .context("Failed to read catalog")?),
    }
}

fn open_label_store(cli: &Cli) -> Result<LabelStore> {
    let path = match &cli.db {
        Some(path) => path.clone(),
        None => LabelStore::default_path()
            .ok_or_else(|| anyhow::anyhow!("Failed to determine data directory"))?,
    };
    ensure_database_directory(&path)?;
    LabelStore::open(&path).context("Failed to open label database")
}

/// Ensures the parent directory of the database file exists.
fn ensure_database_directory(db_path: &Path) -> Result<()> {
    if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).with_context(|| {
            format!("Failed to create database directory: {}", parent.display())
        })?;
    }
    Ok(())
}

fn read_document(path: &Path) -> Result<serde_json::Value> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read document {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid JSON in {}", path.display()))
}

fn read_catalog(path: &Path) -> Result<LabelCatalog> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read catalog {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("Invalid catalog in {}", path.display()))
}

/// Document name from a file path: the file stem.
fn document_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_default()
}
