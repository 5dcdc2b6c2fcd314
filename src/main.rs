//! Scrape-Relay main entry point
//!
//! Fetches one page through the extraction backend and presents it.

use anyhow::{anyhow, Context};
use clap::Parser;
use scrape_relay::config::{load_config_with_hash, validate, Config, ExtractionMode};
use scrape_relay::fetch::{HttpExtractor, HttpSessionFactory, Orchestrator, ResolveOptions};
use scrape_relay::output::{default_output_path, saved_notice, write_artifact};
use scrape_relay::render::{RenderChain, Renderer, TerminalRenderer};
use scrape_relay::{Artifact, RelayError};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;
use url::Url;

/// Scrape-Relay: cached page extraction
///
/// Fetches a page as Markdown, cleaned HTML or raw HTML, refusing sites that
/// have a dedicated scraper, then shows it in a viewer, an editor or the
/// terminal, whichever is available first.
#[derive(Parser, Debug)]
#[command(name = "scrape-relay")]
#[command(version)]
#[command(about = "Cached page extraction with viewer fallback", long_about = None)]
struct Cli {
    /// Page to fetch; `https://` is assumed when no scheme is given
    #[arg(value_name = "URL")]
    url: String,

    /// Path to TOML configuration file
    #[arg(short, long, value_name = "CONFIG")]
    config: Option<PathBuf>,

    /// Override the extraction service endpoint
    #[arg(long, value_name = "URL")]
    endpoint: Option<String>,

    /// Override the extraction mode
    #[arg(long, value_parser = parse_mode)]
    mode: Option<ExtractionMode>,

    /// Save the content; without a value the file is named after the domain
    #[arg(short, long, value_name = "OUTPUT", num_args = 0..=1)]
    output: Option<Option<PathBuf>>,

    /// Print the content verbatim instead of opening a viewer
    #[arg(long)]
    raw: bool,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Only log errors
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,
}

fn parse_mode(name: &str) -> Result<ExtractionMode, String> {
    ExtractionMode::from_name(name)
        .ok_or_else(|| format!("unknown mode `{}` (expected markdown, clean-html or raw)", name))
}

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    setup_logging(cli.verbose, cli.quiet);

    let config = load(&cli)?;
    tracing::debug!(
        "Mode {}, pool size {}, endpoint {}",
        config.extractor.mode.as_str(),
        config.pool.size,
        config.extractor.endpoint
    );

    let orchestrator = Orchestrator::from_config(
        &config,
        HttpSessionFactory::from_config(&config.extractor),
        HttpExtractor::from_config(&config.extractor),
    );

    let options = ResolveOptions::from_config(&config.fetch);
    let resolved = orchestrator.resolve(&cli.url, options).await;
    orchestrator.shutdown().await;

    let artifact = match resolved {
        Ok(artifact) => artifact,
        Err(RelayError::SpecializedScraperExists { url }) => {
            eprintln!(
                "A specialized scraper exists for {}; use it instead of generic extraction.",
                url
            );
            return Ok(ExitCode::from(2));
        }
        Err(e) => {
            tracing::error!("Fetch failed: {}", e);
            if e.is_retryable() {
                eprintln!("The failure may be transient; try again shortly.");
            }
            return Err(e).with_context(|| format!("failed to fetch {}", cli.url));
        }
    };

    if let Some(output) = &cli.output {
        let path = save(output.clone(), &artifact)?;
        println!("{}", saved_notice(&path, artifact.content_type));
    }

    if cli.raw {
        TerminalRenderer::stdout().present(&artifact)?;
    } else {
        let report = RenderChain::from_config(&config.render, io::stdout()).present(&artifact)?;
        tracing::info!(
            "Presented with {} (skipped: {}, failed: {})",
            report.presented_by,
            report.skipped.len(),
            report.failed.len()
        );
    }

    Ok(ExitCode::SUCCESS)
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("scrape_relay=info,warn"),
            1 => EnvFilter::new("scrape_relay=debug,info"),
            2 => EnvFilter::new("scrape_relay=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (or defaults) and applies command-line overrides
fn load(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("failed to load {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => Config::default(),
    };

    if let Some(endpoint) = &cli.endpoint {
        config.extractor.endpoint = endpoint.clone();
    }
    if let Some(mode) = cli.mode {
        config.extractor.mode = mode;
    }

    validate(&config).context("invalid configuration")?;
    Ok(config)
}

fn save(output: Option<PathBuf>, artifact: &Artifact) -> anyhow::Result<PathBuf> {
    let path = match output {
        Some(path) => path,
        None => {
            let url = Url::parse(&artifact.url)
                .map_err(|e| anyhow!("artifact has an invalid URL {}: {}", artifact.url, e))?;
            default_output_path(&url, artifact.content_type)
        }
    };

    write_artifact(&path, artifact)
        .with_context(|| format!("failed to save to {}", path.display()))?;
    Ok(path)
}
