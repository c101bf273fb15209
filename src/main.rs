use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

use leadtriage::models::Speaker;
use leadtriage::{
    AnalysisMetadata, AnalysisOutput, AppConfig, ClassificationPolicy, HumanReport,
    IngestRequest, IngestionPipeline, ProviderKind, SinkConfig, build_provider, parse_export_file,
};

#[derive(Parser)]
#[command(name = "leadtriage")]
#[command(author, version, about = "Sales-intent triage for exported chat transcripts", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

/// Settings that override the environment
#[derive(clap::Args)]
struct BackendArgs {
    /// Classification backend
    #[arg(long, value_enum)]
    provider: Option<ProviderKind>,

    /// Model identifier
    #[arg(long)]
    model: Option<String>,

    /// Record sink: none, jsonl:<path> or sqlite:<path>
    #[arg(long)]
    sink: Option<SinkConfig>,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify one exported chat
    Analyze {
        /// Exported chat file (plain text)
        #[arg(short, long)]
        input: PathBuf,

        /// Name the seller appears under in the export
        #[arg(short, long)]
        self_name: String,

        /// Write the machine-readable result here (JSON)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Write a human-readable report here (text)
        #[arg(long)]
        report: Option<PathBuf>,

        #[command(flatten)]
        backend: BackendArgs,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Parse an export and print the normalized transcript without classifying it
    Parse {
        /// Exported chat file (plain text)
        #[arg(short, long)]
        input: PathBuf,

        /// Name the seller appears under in the export
        #[arg(short, long)]
        self_name: String,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },

    /// Serve the HTTP API
    Serve {
        /// Address to listen on
        #[arg(long, default_value = "127.0.0.1:8080")]
        bind: SocketAddr,

        #[command(flatten)]
        backend: BackendArgs,

        /// Verbose output
        #[arg(short, long)]
        verbose: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            input,
            self_name,
            output,
            report,
            backend,
            verbose,
        } => {
            setup_logging(verbose);
            analyze_export(input, self_name, output, report, backend).await
        }
        Commands::Parse {
            input,
            self_name,
            verbose,
        } => {
            setup_logging(verbose);
            parse_only(input, &self_name)
        }
        Commands::Serve {
            bind,
            backend,
            verbose,
        } => {
            setup_logging(verbose);
            let pipeline = build_pipeline(backend)?;
            leadtriage::server::serve(Arc::new(pipeline), bind).await
        }
    }
}

fn setup_logging(verbose: bool) {
    let level = if verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level.as_str().to_lowercase()));
    tracing_subscriber::fmt().with_env_filter(filter).init();
}

/// Load configuration, apply CLI overrides and wire the pipeline
fn build_pipeline(backend: BackendArgs) -> Result<IngestionPipeline> {
    let mut config = match backend.provider {
        Some(kind) => {
            // Provider chosen on the command line; read its credential rather than the default's
            let kind_name = kind.as_str();
            AppConfig::from_lookup(|key| {
                if key == leadtriage::config::PROVIDER_VAR {
                    Some(kind_name.to_string())
                } else {
                    std::env::var(key).ok()
                }
            })
        }
        None => AppConfig::from_env(),
    }
    .context("Invalid configuration")?;

    if let Some(model) = backend.model {
        config.provider.model = model;
    }
    if let Some(sink) = backend.sink {
        config.sink = sink;
    }

    info!(
        "Using {} model {} (timeout {:?})",
        config.provider.kind.as_str(),
        config.provider.model,
        config.provider.timeout
    );

    let provider = build_provider(&config.provider).context("Failed to build provider client")?;
    let sink = config.sink.open().context("Failed to open record sink")?;

    let pipeline = IngestionPipeline::new(provider, ClassificationPolicy::default())
        .context("Invalid classification policy")?
        .with_sink(sink)
        .with_sink_timeout(config.sink_timeout);
    Ok(pipeline)
}

async fn analyze_export(
    input: PathBuf,
    self_name: String,
    output: Option<PathBuf>,
    report: Option<PathBuf>,
    backend: BackendArgs,
) -> Result<()> {
    let pipeline = build_pipeline(backend)?;

    info!("Loading export from {:?}", input);
    let raw_text = std::fs::read_to_string(&input)
        .with_context(|| format!("Failed to read file: {:?}", input))?;
    let file_label = input
        .file_name()
        .map(|name| name.to_string_lossy().into_owned());

    let mut request = IngestRequest::new(raw_text, self_name);
    request.file_label = file_label.clone();

    let outcome = pipeline
        .ingest(request)
        .await
        .context("Classification failed")?;

    let transcript = &outcome.transcript;
    let metadata = AnalysisMetadata {
        file_label,
        messages: transcript.messages.len(),
        self_messages: transcript.message_count(Speaker::SelfParty),
        other_messages: transcript.message_count(Speaker::Other),
        parse: transcript.stats,
        fallback_result: outcome.used_fallback,
        truncated: outcome.truncated,
        persisted: outcome.persistence.is_persisted(),
    };
    let analysis = AnalysisOutput::new(outcome.result.clone(), metadata);

    match output {
        Some(path) => {
            analysis.write_json(&path)?;
            info!("Output written to {:?}", path);
        }
        None => {
            let json = serde_json::to_string_pretty(&analysis).context("Failed to serialize result")?;
            println!("{json}");
        }
    }

    if let Some(path) = report {
        HumanReport::new(&outcome.result, &outcome.normalized_text).write_file(&path)?;
        info!("Report written to {:?}", path);
    }

    info!(
        "Complete: {} ({}) from {} messages",
        outcome.result.color,
        outcome.result.intent_level,
        outcome.transcript.messages.len()
    );

    Ok(())
}

fn parse_only(input: PathBuf, self_name: &str) -> Result<()> {
    info!("Parsing export from {:?}", input);
    let transcript =
        parse_export_file(&input, self_name).context("Failed to parse input export")?;
    let policy = ClassificationPolicy::default();

    println!("Export Analysis");
    println!("===============");
    println!("Messages: {}", transcript.messages.len());
    println!(
        "  {}: {}",
        policy.labels.self_label,
        transcript.message_count(Speaker::SelfParty)
    );
    println!(
        "  {}: {}",
        policy.labels.other_label,
        transcript.message_count(Speaker::Other)
    );
    println!("Header lines: {}", transcript.stats.header_lines);
    println!("Continuation lines: {}", transcript.stats.continuation_lines);
    println!("System notices dropped: {}", transcript.stats.system_notices);
    println!("Orphan lines dropped: {}", transcript.stats.orphan_lines);
    if transcript.stats.fallback {
        println!("No message headers recognized; using raw text as one message");
    }
    println!();
    println!("{}", transcript.render(&policy.labels));

    Ok(())
}
