//! Valora CLI binary.
//!
//! Fetches market data for a ticker and renders its valuation dashboard.

mod integration;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use integration::cache_manager;
use integration::dashboard_builder::build_dashboard;
use integration::data_pipeline::{FetchConfig, fetch_dataset, open_session};
use serde_json::json;
use std::path::PathBuf;
use std::process;
use std::time::Duration as StdDuration;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};
use valora::{AnalysisRequest, DEFAULT_DESIRED_YIELD};
use valora_data::{Frequency, Lookback, YahooProvider, cache::DEFAULT_TTL_HOURS};
use valora_metrics::{MetricCategory, available_metrics, metrics_by_category};
use valora_output::{ExportFormat, OutputFormat, export_dashboard};

#[derive(Parser)]
#[command(name = "valora")]
#[command(about = "Valora: dividend and fundamental valuation dashboards", long_about = None)]
#[command(version)]
struct Cli {
    /// Log debug output to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct CacheArgs {
    /// Cache database file
    #[arg(long, env = "VALORA_CACHE_PATH")]
    cache_path: Option<PathBuf>,

    /// Hours a cached response stays fresh
    #[arg(long, env = "VALORA_CACHE_TTL_HOURS", default_value_t = DEFAULT_TTL_HOURS)]
    cache_ttl_hours: i64,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the valuation dashboard for a ticker
    Analyze {
        /// Ticker symbol (e.g. KO, AAPL, SAN.MC)
        ticker: String,

        /// Lookback period: 5y, 10y, 15y or 20y
        #[arg(long, default_value = "5y")]
        period: Lookback,

        /// Price frequency: daily or monthly
        #[arg(long, default_value = "daily")]
        interval: Frequency,

        /// Desired dividend yield in percent (at least 0.1)
        #[arg(long, default_value_t = DEFAULT_DESIRED_YIELD)]
        desired_yield: f64,

        /// Output format: text, markdown, html or json
        #[arg(long, default_value = "text")]
        format: OutputFormat,

        /// Write the dashboard to this file instead of stdout
        #[arg(long, short)]
        output: Option<PathBuf>,

        /// Export every table and chart series into this directory
        #[arg(long)]
        export_dir: Option<PathBuf>,

        /// Export format: csv, json or pretty-json
        #[arg(long, default_value = "csv")]
        export_format: ExportFormat,

        /// Disable caching (always fetch fresh data)
        #[arg(long)]
        no_cache: bool,

        /// Force refresh cached data
        #[arg(long)]
        refresh: bool,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// Inspect or clear the HTTP response cache
    Cache {
        #[command(subcommand)]
        action: CacheAction,

        #[command(flatten)]
        cache: CacheArgs,
    },

    /// List the metrics the dashboard computes
    Metrics {
        /// Only list one category
        #[arg(long)]
        category: Option<MetricCategory>,

        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand, Clone, Copy)]
enum CacheAction {
    /// Show entry counts and size
    Stats,
    /// Delete every cached response
    Clear,
    /// Delete expired responses
    Purge,
}

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "valora=debug,valora_data=debug"
    } else {
        "valora=info,valora_data=warn"
    };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default_filter.into()))
        .with(fmt::layer().with_writer(std::io::stderr))
        .init();
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Analyze {
            ticker,
            period,
            interval,
            desired_yield,
            format,
            output,
            export_dir,
            export_format,
            no_cache,
            refresh,
            cache,
        } => {
            let request = AnalysisRequest::new(&ticker, period, interval, desired_yield)?;
            let config = FetchConfig {
                use_cache: !no_cache,
                force_refresh: refresh,
                cache_path: cache.cache_path,
                ttl_hours: cache.cache_ttl_hours,
            };
            let targets = OutputTargets {
                format,
                output,
                export_dir,
                export_format,
            };
            analyze(&request, &config, &targets).await?;
        }
        Commands::Cache { action, cache } => {
            cache_command(action, &cache)?;
        }
        Commands::Metrics { category, json } => {
            list_metrics(category, json)?;
        }
    }

    Ok(())
}

/// Where the rendered dashboard goes.
struct OutputTargets {
    format: OutputFormat,
    output: Option<PathBuf>,
    export_dir: Option<PathBuf>,
    export_format: ExportFormat,
}

async fn analyze(
    request: &AnalysisRequest,
    config: &FetchConfig,
    targets: &OutputTargets,
) -> Result<(), Box<dyn std::error::Error>> {
    info!(
        symbol = request.symbol(),
        period = %request.lookback(),
        interval = %request.frequency(),
        desired_yield = request.desired_yield(),
        cache = ?config.cache_mode(),
        cache_path = %config.cache_path().display(),
        "starting analysis"
    );

    let provider = YahooProvider::new(open_session(config)?);
    let today = Utc::now().date_naive();

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.enable_steady_tick(StdDuration::from_millis(100));
    pb.set_message(format!("Fetching data for {}...", request.symbol()));

    let dataset = match fetch_dataset(&provider, request, today, Some(&pb)).await {
        Ok(dataset) => {
            pb.finish_with_message(format!(
                "Fetched {} prices and {} dividends for {}",
                dataset.prices.len(),
                dataset.dividends.len(),
                request.symbol()
            ));
            dataset
        }
        Err(e) => {
            pb.finish_with_message("Failed!");
            return Err(e.into());
        }
    };

    let dashboard = build_dashboard(&dataset);

    match &targets.output {
        Some(path) => {
            dashboard.write_to(path, targets.format)?;
            eprintln!("Dashboard written to {}", path.display());
        }
        None => println!("{}", dashboard.render(targets.format)?),
    }

    if let Some(dir) = &targets.export_dir {
        let written = export_dashboard(&dashboard, dir, targets.export_format)?;
        eprintln!("Exported {} files to {}", written.len(), dir.display());
    }

    Ok(())
}

fn cache_command(action: CacheAction, args: &CacheArgs) -> Result<(), Box<dyn std::error::Error>> {
    let path = cache_manager::get_cache_path(args.cache_path.as_deref());
    let cache = cache_manager::open_cache(&path, args.cache_ttl_hours)?;

    match action {
        CacheAction::Stats => {
            println!("HTTP cache:");
            cache_manager::print_cache_stats(&path, &cache.get_stats()?);
        }
        CacheAction::Clear => {
            let removed = cache.clear_all()?;
            cache_manager::print_cache_info(&path);
            println!("  Removed {} cached responses", removed);
        }
        CacheAction::Purge => {
            let removed = cache.purge_expired()?;
            cache_manager::print_cache_info(&path);
            println!("  Removed {} expired responses", removed);
        }
    }

    Ok(())
}

fn list_metrics(
    category: Option<MetricCategory>,
    as_json: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let metrics = category.map_or_else(available_metrics, metrics_by_category);

    if as_json {
        let output: Vec<_> = metrics
            .iter()
            .map(|m| {
                json!({
                    "name": m.name,
                    "category": m.category.name(),
                    "description": m.description,
                    "inputs": m.inputs,
                })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&output)?);
        return Ok(());
    }

    for category in MetricCategory::ALL {
        let in_category: Vec<_> = metrics.iter().filter(|m| m.category == category).collect();
        if in_category.is_empty() {
            continue;
        }
        println!("\n{}:", category);
        for metric in in_category {
            println!("  {:<24} {}", metric.name, metric.description);
        }
    }
    println!("\nTotal: {} metrics", metrics.len());

    Ok(())
}
