//! # Content Pipeline CLI
//!
//! Runs the research -> critical thinking -> writing pipeline once for a topic
//! and prints the finished article.
//!
//! ## Quick Start
//! ```bash
//! export GEMINI_API_KEY=...
//! cargo run -- "history of tea"
//! ```

use anyhow::{Context, Result};
use clap::Parser;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use content_pipeline::{Config, ModelProvider, Pipeline, PipelineOutput, RigModelClient, WebSearchTool};

/// Topic used when none is given on the command line.
const DEMO_TOPIC: &str = "history of tea";

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
#[derive(Parser, Debug)]
#[command(
    name = "content-pipeline",
    version,
    about = "Research a topic, analyse the findings and write an article about it",
    long_about = r#"
Content Pipeline - research, analyse, write.

For the given topic it will:
  1. Search the web (DuckDuckGo)
  2. Consolidate the findings with an LLM, resolving conflicts and duplicates
  3. Write a 300-500 word Markdown article grounded in that analysis

CONFIGURATION (environment or .env):
  LLM_PROVIDER         gemini (default) or ollama
  LLM_MODEL            e.g. gemini-2.5-pro, gemini-2.5-flash, llama3.2
  GEMINI_API_KEY       required for the gemini provider
  OLLAMA_API_BASE_URL  default http://localhost:11434
  TEMPERATURE          0.0 - 2.0, default 0.7
  MAX_SEARCH_RESULTS   default 5
  RUST_LOG             log filter, default info (--verbose forces debug)

EXAMPLES:
  content-pipeline
  content-pipeline "the James Webb Space Telescope"
  content-pipeline --provider ollama --model llama3.2 "hiking in Patagonia"
  content-pipeline --json "history of tea" > tea.json
"#
)]
struct Args {
    /// The topic to write about
    #[arg(value_name = "TOPIC", default_value = DEMO_TOPIC)]
    topic: String,

    /// Model to use (overrides LLM_MODEL)
    #[arg(short = 'm', long = "model", env = "LLM_MODEL")]
    model: Option<String>,

    /// Model provider to use (overrides LLM_PROVIDER)
    #[arg(short = 'p', long = "provider", env = "LLM_PROVIDER")]
    provider: Option<String>,

    /// Also print the research finding and the analysis
    #[arg(long = "full", default_value = "false")]
    full: bool,

    /// Print the whole final state as JSON instead of the article
    #[arg(long = "json", default_value = "false", conflicts_with = "full")]
    json: bool,

    /// Verbose output (debug logging, overrides RUST_LOG)
    #[arg(short = 'v', long = "verbose", default_value = "false")]
    verbose: bool,
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let mut config = Config::from_env()?;

    init_logging(log_filter(&config.log_level, args.verbose)?)?;

    if let Some(provider) = &args.provider {
        let provider: ModelProvider = provider.parse()?;
        config.set_provider(provider);
    }
    if let Some(model) = args.model {
        info!(model = %model, "Using model from command line");
        config.model = model;
    }

    config.validate()?;

    info!(
        provider = %config.provider,
        model = %config.model,
        max_search_results = config.max_search_results,
        "Configuration loaded"
    );

    let search = Arc::new(WebSearchTool::new(config.max_search_results)?);
    let model = Arc::new(RigModelClient::from_config(&config)?);
    let pipeline = Pipeline::new(search, model)?;

    let output = match pipeline.invoke(&args.topic).await {
        Ok(output) => output,
        Err(e) => {
            error!(error = %e, topic = %args.topic, "Pipeline failed");
            return Err(e.into());
        }
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        print_report(&output, args.full);
    }

    Ok(())
}

/// Print the article (and optionally the intermediate fields) under banners.
fn print_report(output: &PipelineOutput, full: bool) {
    let rule = "=".repeat(60);

    if full {
        println!("\n{}\nRESEARCH FINDING\n{}\n", rule, rule);
        println!("{}", output.finding);
        println!("\n{}\nANALYSIS\n{}\n", rule, rule);
        println!("{}", output.analysis);
    }

    println!("\n{}\nFINAL SCRIPT\n{}\n", rule, rule);
    println!("{}", output.script);
    println!("\n{}", rule);
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Build the log filter from the configured `RUST_LOG` directives.
///
/// `--verbose` replaces whatever was configured with `debug`.
fn log_filter(directives: &str, verbose: bool) -> Result<EnvFilter> {
    if verbose {
        return Ok(EnvFilter::new("debug"));
    }

    EnvFilter::try_new(directives)
        .with_context(|| format!("Invalid RUST_LOG value: '{}'", directives))
}

/// Install the global tracing subscriber.
///
/// Logs go to stderr so that stdout carries only the article (or JSON).
fn init_logging(filter: EnvFilter) -> Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_thread_names(false)
        .with_file(false)
        .with_line_number(false)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| anyhow::anyhow!("Failed to set logging subscriber: {}", e))?;

    Ok(())
}
