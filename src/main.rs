//! # Deep Research Agent
//!
//! A multi-round research pipeline: expand a query, search the web in
//! several rounds, deduplicate what was found, synthesize a report with an
//! LLM and export it as a document.
//!
//! ## Quick Start
//! ```bash
//! cargo run -- --depth deep "The future of quantum computing"
//! ```

// =============================================================================
// MODULE DECLARATIONS
// =============================================================================
/// Configuration management
mod config;

/// Upstream error taxonomy
mod error;

/// Query expansion
mod expander;

/// Report export
mod export;

/// Completion service
mod llm;

/// Shared data types
mod models;

/// Multi-round research pipeline
mod orchestrator;

/// Web search
mod search;

/// Report synthesis
mod synthesis;

#[cfg(test)]
mod testing;

// =============================================================================
// IMPORTS
// =============================================================================
use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::{LlmProvider, ResearchConfig};
use crate::export::{ExportFormat, ReportExporter};
use crate::models::Depth;
use crate::orchestrator::ResearchOrchestrator;
use crate::search::format_sources;

// =============================================================================
// CLI ARGUMENTS
// =============================================================================
#[derive(Parser, Debug)]
#[command(
    name = "deep-research",
    version,
    about = "Multi-round web research with LLM-synthesized reports",
    long_about = r#"
Deep Research - multi-round research reports from the command line.

For each query it will:
  1. Ask the LLM for related queries (standard and deep depth)
  2. Search the web in one to three rounds
  3. Deduplicate the sources found
  4. Analyze them and write a structured report
  5. Export the report (PDF by default) and print its path

PROVIDERS:
  ollama (default)  local models, host from OLLAMA_API_BASE_URL
  gemini            requires GEMINI_API_KEY

EXAMPLES:
  deep-research "solar battery storage"
  deep-research --depth deep --format markdown -o report.md "quantum computing"
  deep-research --quick "Rust web frameworks"
"#
)]
struct Args {
    /// The research topic or question to investigate
    #[arg(value_name = "QUERY")]
    query: String,

    /// Research depth: basic, standard or deep (anything else uses the standard budget)
    #[arg(short = 'd', long = "depth", default_value = "standard")]
    depth: String,

    /// Where to write the report (default: a new temporary directory)
    #[arg(short = 'o', long = "output", value_name = "PATH")]
    output: Option<PathBuf>,

    /// Report format
    #[arg(short = 'f', long = "format", value_enum, default_value_t = ExportFormat::Pdf)]
    format: ExportFormat,

    /// Completion model (overrides RESEARCH_MODEL)
    #[arg(short = 'm', long = "model")]
    model: Option<String>,

    /// Completion provider: ollama or gemini (overrides LLM_PROVIDER)
    #[arg(short = 'p', long = "provider")]
    provider: Option<String>,

    /// Upper bound on unique sources (validated, must be at least 1)
    #[arg(long = "max-sources", default_value_t = 15)]
    max_sources: usize,

    /// Pause between search rounds, in seconds
    #[arg(long = "search-delay", default_value_t = 0.5)]
    search_delay: f64,

    /// Directory containing the LiberationSans font family for PDF output
    #[arg(long = "font-dir", env = "RESEARCH_FONT_DIR")]
    font_dir: Option<PathBuf>,

    /// Quick search mode - one search round, no AI synthesis
    #[arg(short = 'q', long = "quick", default_value = "false")]
    quick: bool,

    /// Enable verbose/debug logging
    #[arg(short = 'v', long = "verbose", default_value = "false")]
    verbose: bool,
}

impl Args {
    /// Layer command-line overrides on top of the environment config.
    fn apply_to(&self, mut config: ResearchConfig) -> Result<ResearchConfig> {
        if let Some(provider) = &self.provider {
            let provider: LlmProvider = provider.parse()?;
            config = config.with_provider(provider);
        }
        if let Some(model) = &self.model {
            info!(model = %model, "Using model from command line");
            config = config.with_model(model.clone());
        }
        config
            .with_max_sources(self.max_sources)
            .with_search_delay_secs(self.search_delay)
    }
}

// =============================================================================
// MAIN FUNCTION
// =============================================================================
#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    init_logging(args.verbose)?;

    let query = args.query.trim();
    if query.is_empty() {
        anyhow::bail!("The research query must not be empty");
    }
    let depth: Depth = args.depth.parse()?;

    let config = args.apply_to(ResearchConfig::from_env()?)?;
    info!(
        provider = %config.provider,
        model = %config.model,
        depth = %depth,
        "Configuration loaded"
    );

    let orchestrator = ResearchOrchestrator::from_config(config)?;

    if args.quick {
        let sources = orchestrator.quick_search(query, &depth).await;
        println!("{}", format_sources(query, &sources));
        return Ok(());
    }

    let result = orchestrator.conduct_research(query, &depth).await;

    let mut exporter = ReportExporter::new();
    if let Some(dir) = &args.font_dir {
        exporter = exporter.with_font_dir(dir);
    }

    match exporter.export(&result, args.format, args.output.as_deref()) {
        Ok(path) => {
            info!(sources_found = result.sources_found, "Research completed successfully");
            println!("{}", path.display());
            Ok(())
        }
        Err(e) => {
            error!(error = %e, "Export failed");
            eprintln!("\nExport failed: {:#}", e);
            eprintln!("Tip: --format markdown or --format text need no fonts.");
            Err(e)
        }
    }
}

// =============================================================================
// LOGGING INITIALIZATION
// =============================================================================
/// Logs go to stderr; stdout only carries the artifact path or results.
///
/// `--verbose` forces DEBUG, otherwise `RUST_LOG` decides (default INFO).
fn init_logging(verbose: bool) -> Result<()> {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

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
