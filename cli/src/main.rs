use std::io::{self, IsTerminal, Read};
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use clap::Parser;
use label_reader_core::{DiskRecordCache, LookupConfig, LookupError, ResolutionRecord, Resolver};
use serde::{Deserialize, Serialize};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "label-reader")]
#[command(
    about = "Describe food ingredients using additive tables, web search and encyclopedia lookups",
    long_about = "Reads {\"ingredients\": [...]} from stdin unless --ingredients is given, \
                  and prints {\"results\": [...]} as JSON. Configuration comes from \
                  LABEL_READER_* environment variables."
)]
struct Cli {
    /// Comma-separated ingredients, e.g. "turmeric powder, E621, salt"
    #[arg(long)]
    ingredients: Option<String>,

    /// Log every stage decision to stderr
    #[arg(long)]
    debug: bool,

    /// Ignore LABEL_READER_CACHE for this run
    #[arg(long)]
    no_cache: bool,
}

#[derive(Deserialize)]
struct BatchRequest {
    ingredients: Vec<String>,
}

#[derive(Serialize)]
struct BatchResponse<'a> {
    results: &'a [ResolutionRecord],
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_telemetry(cli.debug);

    match run(cli).await {
        Ok(output) => {
            println!("{output}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "lookup failed");
            for cause in e.chain().skip(1) {
                tracing::error!(cause = %cause, "Caused by");
            }

            let response = ErrorResponse {
                error: format!("{e:#}"),
            };
            match serde_json::to_string(&response) {
                Ok(json) => println!("{json}"),
                Err(_) => println!("{{\"error\": \"internal error\"}}"),
            }
            ExitCode::FAILURE
        }
    }
}

fn init_telemetry(debug: bool) {
    let env_filter = if debug {
        EnvFilter::new("label_reader=debug,label_reader_core=debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    let fmt_layer = tracing_subscriber::fmt::layer().with_writer(io::stderr);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

async fn run(cli: Cli) -> Result<String> {
    let ingredients = read_ingredients(cli.ingredients.as_deref()).context("Invalid input")?;

    let config = LookupConfig::from_env().context("Invalid configuration")?;
    let resolver = Arc::new(Resolver::from_config(&config)?);

    let cache_dir = config.cache_dir.as_ref().filter(|_| !cli.no_cache);
    let results = match cache_dir {
        Some(dir) => {
            tracing::info!(dir = %dir.display(), "using record cache");
            let cache = DiskRecordCache::new(dir.clone());
            resolver.lookup_batch_cached(&ingredients, &cache).await
        }
        None => resolver.lookup_batch(&ingredients).await,
    }
    .map_err(|e| match e {
        LookupError::EmptyBatch => anyhow!(e).context("Invalid input"),
        other => anyhow!(other),
    })?;

    Ok(serde_json::to_string_pretty(&BatchResponse { results: &results })?)
}

/// Ingredients from `--ingredients`, or a JSON request on stdin.
fn read_ingredients(arg: Option<&str>) -> Result<Vec<String>> {
    let ingredients = match arg {
        Some(list) => split_list(list),
        None => {
            let stdin = io::stdin();
            if stdin.is_terminal() {
                bail!("pass --ingredients or pipe {{\"ingredients\": [...]}} on stdin");
            }
            let mut body = String::new();
            stdin
                .lock()
                .read_to_string(&mut body)
                .context("Failed to read stdin")?;
            parse_request(&body)?
        }
    };

    if ingredients.is_empty() {
        bail!("no ingredients provided");
    }
    Ok(ingredients)
}

fn split_list(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_request(body: &str) -> Result<Vec<String>> {
    let request: BatchRequest =
        serde_json::from_str(body).context("expected {\"ingredients\": [string, ...]}")?;
    Ok(request.ingredients)
}
