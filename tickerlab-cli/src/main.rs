//! tickerlab CLI: analyze tickers and inspect saved analyses.
//!
//! Commands:
//! - `analyze`: fetch history, compute indicators, classify the trend,
//!   synthesize an insight, and print (optionally save) one record per ticker
//! - `show`: print a previously saved record

mod logging;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::{Path, PathBuf};
use tickerlab_core::record::ResultRecord;
use tickerlab_runner::{
    print_event, render_report, render_summary, run_batch, write_summary_csv, AnalyzerConfig,
    BatchEvent, Credentials, FileStore, ResultStore, RunOptions, SourceKind,
};
use tracing::info;

#[derive(Parser)]
#[command(
    name = "tickerlab",
    about = "tickerlab CLI: stock trend snapshots with short trading insights"
)]
struct Cli {
    /// Enable debug logging (ignored when RUST_LOG is set).
    #[arg(long, short, global = true, default_value_t = false)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum SourceArg {
    Polygon,
    Csv,
}

impl From<SourceArg> for SourceKind {
    fn from(arg: SourceArg) -> Self {
        match arg {
            SourceArg::Polygon => SourceKind::Polygon,
            SourceArg::Csv => SourceKind::Csv,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze one or more tickers (e.g., AAPL GOOGL TSLA).
    Analyze {
        #[arg(required = true)]
        tickers: Vec<String>,

        /// Save each record as JSON under the output directory.
        #[arg(long, default_value_t = false)]
        save: bool,

        /// Path to a TOML config file.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Price source override.
        #[arg(long, value_enum)]
        source: Option<SourceArg>,

        /// Calendar days of history to request.
        #[arg(long)]
        lookback_days: Option<u32>,

        /// Skip the text generator and use rule-based insights only.
        #[arg(long, default_value_t = false)]
        no_ai: bool,

        /// Directory for saved records.
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Also write a CSV summary of all records to this path.
        #[arg(long)]
        summary_csv: Option<PathBuf>,
    },
    /// Print a saved analysis record.
    Show {
        /// Path to a record JSON file.
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();
    logging::init_logging(cli.verbose);

    match cli.command {
        Commands::Analyze {
            tickers,
            save,
            config,
            source,
            lookback_days,
            no_ai,
            output_dir,
            summary_csv,
        } => run_analyze(AnalyzeArgs {
            tickers,
            save,
            config,
            source,
            lookback_days,
            no_ai,
            output_dir,
            summary_csv,
        }),
        Commands::Show { path } => run_show(&path),
    }
}

struct AnalyzeArgs {
    tickers: Vec<String>,
    save: bool,
    config: Option<PathBuf>,
    source: Option<SourceArg>,
    lookback_days: Option<u32>,
    no_ai: bool,
    output_dir: Option<PathBuf>,
    summary_csv: Option<PathBuf>,
}

fn load_config(args: &AnalyzeArgs) -> Result<AnalyzerConfig> {
    let mut config = match &args.config {
        Some(path) => AnalyzerConfig::from_file(path)?,
        None => AnalyzerConfig::default(),
    };
    if let Some(source) = args.source {
        config.data.source = source.into();
    }
    if let Some(days) = args.lookback_days {
        config.data.lookback_days = days;
    }
    if args.no_ai {
        config.insight.enabled = false;
    }
    if let Some(dir) = &args.output_dir {
        config.output.dir = dir.clone();
    }
    config.validate()?;
    Ok(config)
}

fn run_analyze(args: AnalyzeArgs) -> Result<()> {
    let config = load_config(&args)?;
    let credentials = Credentials::from_env();

    let source = config.price_source(&credentials)?;
    let generator = config.text_generator(&credentials);
    let store = args.save.then(|| FileStore::new(&config.output.dir));
    if let Some(store) = &store {
        info!(dir = %store.root().display(), "saving records");
    }

    let options = RunOptions {
        lookback_days: config.data.lookback_days,
        insight: config.insight_options(),
    };

    let progress: &dyn Fn(&BatchEvent) = &print_event;
    let summary = run_batch(
        source.as_ref(),
        &args.tickers[..],
        generator.as_ref(),
        &options,
        store.as_ref().map(|s| s as &dyn ResultStore),
        Some(progress),
    );
    println!("\n{}", render_summary(&summary));

    if let Some(path) = &args.summary_csv {
        write_summary_csv(&summary.records, path)?;
        info!(path = %path.display(), rows = summary.records.len(), "wrote CSV summary");
    }

    if summary.all_failed() {
        anyhow::bail!("all {} ticker(s) failed", summary.total);
    }
    Ok(())
}

fn run_show(path: &Path) -> Result<()> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    let record = ResultRecord::from_json(&json)
        .with_context(|| format!("failed to parse {}", path.display()))?;
    println!("{}", render_report(&record));
    if let Some(hash) = record.dataset_hash() {
        println!("dataset: {hash}");
    }
    Ok(())
}
