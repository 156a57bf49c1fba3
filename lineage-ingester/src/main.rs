use std::path::PathBuf;
use std::process;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::{error, info, warn};

use lineage_ingester::report::{self, OutputFormat};
use lineage_ingester::{logging, CatalogBackend, Dependencies, IngestSettings};
use lineage_pipeline::{load_records, CancellationSignal, SourceFormat, TemplateKind};
use lineage_shared::BatchSummary;

/// Exit code for a batch that ran but did not ingest every row.
const EXIT_BATCH_INCOMPLETE: i32 = 2;

#[derive(Parser)]
#[command(name = "lineage-ingest")]
#[command(about = "Batch ingestion of lineage relationships into a catalog", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate rows and submit them to the catalog
    Ingest(IngestArgs),
    /// Validate rows without contacting the catalog
    Validate(InputArgs),
    /// List the available templates and their fields
    Templates,
}

#[derive(Args)]
struct InputArgs {
    /// CSV or JSON file of relationship rows
    #[arg(long, short)]
    file: PathBuf,

    /// Template the rows follow
    #[arg(long, short, default_value = "basic_lineage")]
    template: String,

    /// Input format (inferred from the file extension by default)
    #[arg(long)]
    format: Option<String>,

    /// How to print the summary
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    output: OutputFormat,

    /// Also write the JSON summary to this file
    #[arg(long)]
    report: Option<PathBuf>,
}

#[derive(Args)]
struct IngestArgs {
    #[command(flatten)]
    input: InputArgs,

    /// Catalog implementation to submit to
    #[arg(long, value_enum, default_value_t = CatalogBackend::Http)]
    catalog: CatalogBackend,

    /// Catalog API base URL (overrides CATALOG_URL)
    #[arg(long)]
    catalog_url: Option<String>,

    /// Maximum concurrent catalog calls (overrides INGEST_MAX_CONCURRENCY)
    #[arg(long)]
    concurrency: Option<usize>,

    /// Relationships per call; 1 submits individually (overrides INGEST_CHUNK_SIZE)
    #[arg(long)]
    chunk_size: Option<usize>,

    /// Retries on transient errors (overrides INGEST_MAX_RETRIES)
    #[arg(long)]
    max_retries: Option<u32>,
}

#[tokio::main]
async fn main() {
    dotenv::dotenv().ok();
    logging::init("info");

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Ingest(args) => run_ingest(args).await,
        Commands::Validate(args) => run_validate(args),
        Commands::Templates => {
            print_templates();
            Ok(true)
        }
    };

    match result {
        Ok(true) => {}
        Ok(false) => process::exit(EXIT_BATCH_INCOMPLETE),
        Err(e) => {
            error!(error = %e, "Ingestion failed");
            eprintln!("\nError: {}", e);

            for cause in e.chain().skip(1) {
                eprintln!("  Caused by: {}", cause);
            }
            process::exit(1);
        }
    }
}

/// Returns whether every row was ingested.
async fn run_ingest(args: IngestArgs) -> Result<bool> {
    let mut settings = IngestSettings::from_env()?;
    if let Some(url) = args.catalog_url {
        settings.catalog.base_url = url;
    }
    if let Some(concurrency) = args.concurrency {
        settings.submitter.max_concurrency = concurrency;
    }
    if let Some(chunk_size) = args.chunk_size {
        settings.submitter.chunk_size = chunk_size;
    }
    if let Some(max_retries) = args.max_retries {
        settings.submitter.retry.max_retries = max_retries;
    }

    let deps = Dependencies::new(&settings, args.catalog)?;
    let records = read_input(&args.input)?;

    let cancel = CancellationSignal::new();
    let ctrl_c = {
        let cancel = cancel.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                warn!("Received shutdown signal, finishing in-flight submissions");
                cancel.cancel();
            }
        })
    };

    let summary = deps
        .pipeline
        .run_with_cancellation(&args.input.template, records, &cancel)
        .await?;
    ctrl_c.abort();

    emit(&summary, &args.input)?;
    Ok(summary.is_clean())
}

fn run_validate(args: InputArgs) -> Result<bool> {
    let settings = IngestSettings::from_env()?;
    let deps = Dependencies::new(&settings, CatalogBackend::Memory)?;
    let records = read_input(&args)?;

    let summary = deps.pipeline.validate_only(&args.template, records)?;

    emit(&summary, &args)?;
    Ok(summary.failed == 0)
}

fn read_input(args: &InputArgs) -> Result<Vec<lineage_shared::RawRecord>> {
    let format = args
        .format
        .as_deref()
        .map(str::parse::<SourceFormat>)
        .transpose()?;
    let records = load_records(&args.file, format)
        .with_context(|| format!("Failed to load {}", args.file.display()))?;
    info!(rows = records.len(), template = %args.template, "Input loaded");
    Ok(records)
}

fn emit(summary: &BatchSummary, args: &InputArgs) -> Result<()> {
    println!("{}", report::render(summary, &args.template, args.output)?);

    if let Some(path) = &args.report {
        report::write_json(summary, path)?;
        info!(path = %path.display(), "Report written");
    }
    Ok(())
}

fn print_templates() {
    for kind in TemplateKind::ALL {
        let template = kind.template();
        println!("{}", template.name());
        for field in template.fields() {
            let requirement = if field.is_required() {
                "required".to_string()
            } else {
                match field.default_value() {
                    Some(default) => format!("optional, default {}", default.canonical()),
                    None => "optional".to_string(),
                }
            };
            println!("  {:<20} {:?} ({})", field.name, field.kind, requirement);
        }
        println!();
    }
}
