//! agent-websearch CLI - run the agent web search tool from a terminal.

use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

use agent_websearch::settings::{ConfigSource, EnvSource, Layered, MapSource, SEARCH_PROVIDER_KEY};
use agent_websearch::{
    Narrator, ProviderId, SearchOutcome, SearchQuery, TiktokenCounter, WebSearch,
    NOTHING_TO_SEARCH_MESSAGE,
};

/// Agent web search - query the configured search provider
#[derive(Parser)]
#[command(name = "agent-websearch")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Search using the configured provider
    Search(SearchArgs),

    /// List search providers and whether they are configured
    Providers,
}

#[derive(Parser)]
struct SearchArgs {
    /// Search query
    query: String,

    /// Provider to use, overriding AGENT_SEARCH_PROVIDER
    #[arg(short, long)]
    provider: Option<String>,

    /// Maximum number of results to ask for
    #[arg(short, long)]
    limit: Option<u32>,

    /// Result language (e.g. en)
    #[arg(long)]
    language: Option<String>,

    /// Result region (e.g. us)
    #[arg(long)]
    region: Option<String>,

    /// Search timeout in seconds
    #[arg(short, long, default_value = "15")]
    timeout: u64,

    /// Output format
    #[arg(short, long, default_value = "text")]
    format: OutputFormat,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// The text handed to the agent
    Text,
    /// Pretty-printed records
    Json,
}

/// Prints narration to stderr so stdout carries only the payload.
struct StderrNarrator;

impl Narrator for StderrNarrator {
    fn narrate(&self, actor: &str, message: &str) {
        eprintln!("{}: {}", actor, message);
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Search(args) => run_search(args).await,
        Commands::Providers => list_providers(),
    }
}

fn list_providers() -> Result<()> {
    let configured = EnvSource.get(SEARCH_PROVIDER_KEY);
    println!("Search providers:\n");
    for id in ProviderId::ALL {
        let missing: Vec<&str> = id
            .required_keys()
            .iter()
            .copied()
            .filter(|key| EnvSource.get(key).is_none())
            .collect();
        let status = if missing.is_empty() {
            "ready".to_string()
        } else {
            format!("missing {}", missing.join(", "))
        };
        let marker = if configured.as_deref() == Some(id.as_str()) {
            "*"
        } else {
            " "
        };
        println!("  {} {:<22} {:<16} {}", marker, id.as_str(), id.display_name(), status);
    }
    println!();
    println!("Select one with AGENT_SEARCH_PROVIDER (default: {}).", ProviderId::DEFAULT);
    Ok(())
}

async fn run_search(args: SearchArgs) -> Result<()> {
    let mut overrides = MapSource::new();
    if let Some(provider) = &args.provider {
        overrides = overrides.with(SEARCH_PROVIDER_KEY, provider.as_str());
    }

    let tokens = TiktokenCounter::cl100k()?;
    let mut search = WebSearch::new(Arc::new(tokens))?
        .with_settings(Arc::new(Layered::new(overrides, EnvSource)))
        .with_narrator(Arc::new(StderrNarrator));
    search.set_timeout(Duration::from_secs(args.timeout));

    let mut query = SearchQuery::new(&args.query);
    if query.is_blank() {
        println!("{}", NOTHING_TO_SEARCH_MESSAGE);
        return Ok(());
    }
    if let Some(limit) = args.limit {
        query = query.with_limit(limit);
    }
    if let Some(language) = args.language {
        query = query.with_language(language);
    }
    if let Some(region) = args.region {
        query = query.with_region(region);
    }

    let cancel = CancellationToken::new();
    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c.cancel();
        }
    });

    let outcome = search.run(&query, &cancel).await;

    match (args.format, &outcome) {
        (OutputFormat::Json, SearchOutcome::Ok { records, .. }) => {
            println!("{}", serde_json::to_string_pretty(records)?);
        }
        _ => println!("{}", outcome.to_text()),
    }

    if !outcome.is_ok() && !matches!(outcome, SearchOutcome::Empty) {
        std::process::exit(1);
    }
    Ok(())
}
