//! IbovETL CLI — local pipeline driver.
//!
//! Commands:
//! - `scrape` — pull the previous trading day's index composition from the
//!   B3 page and land it as a partitioned parquet file
//! - `transform` — run the transform engine over every landed partition
//! - `dispatch` — feed a landing-notification JSON event through the
//!   dispatcher, running the transform job in-process
//!
//! Storage and catalog are filesystem-backed under `--data-dir`; the managed
//! cloud runtime uses the same library crates behind its own adapters.

use anyhow::{bail, Context, Result};
use chrono::{Datelike, NaiveDate};
use clap::{Parser, Subcommand};
use ibovetl_core::catalog::JsonCatalog;
use ibovetl_core::config::PipelineConfig;
use ibovetl_core::jobs::{JobError, JobRun, JobRunner};
use ibovetl_core::store::FsObjectStore;
use ibovetl_core::{previous_trading_day, HolidayCalendar};
use ibovetl_ingest::b3::B3IndexPage;
use ibovetl_ingest::{extract, LandingWriter};
use ibovetl_transform::{Dispatch, Dispatcher, ObjectEvent, TransformEngine, TransformSummary};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "ibovetl", about = "IbovETL CLI — B3 index composition pipeline")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape the previous trading day's composition and land it.
    Scrape {
        /// Pipeline config TOML. Defaults apply when absent.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Root directory for the local object store and catalog.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Reference date (YYYY-MM-DD) for trading-day resolution.
        /// Defaults to today.
        #[arg(long)]
        reference: Option<String>,

        /// Index to scrape.
        #[arg(long, default_value = "IBOV")]
        index: String,
    },
    /// Transform every landed partition into the init and aggregate datasets.
    Transform {
        /// Pipeline config TOML. Defaults apply when absent.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Root directory for the local object store and catalog.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,
    },
    /// Dispatch a landing-notification event, running the job in-process.
    Dispatch {
        /// Pipeline config TOML. Defaults apply when absent.
        #[arg(long)]
        config: Option<PathBuf>,

        /// Root directory for the local object store and catalog.
        #[arg(long, default_value = "data")]
        data_dir: PathBuf,

        /// Path to the event JSON file.
        #[arg(long)]
        event: PathBuf,
    },
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    env_logger::init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Scrape {
            config,
            data_dir,
            reference,
            index,
        } => run_scrape(config, &data_dir, reference, &index),
        Commands::Transform { config, data_dir } => run_transform(config, &data_dir),
        Commands::Dispatch {
            config,
            data_dir,
            event,
        } => run_dispatch(config, &data_dir, &event),
    }
}

fn load_config(path: Option<PathBuf>) -> Result<PipelineConfig> {
    match path {
        Some(path) => PipelineConfig::from_file(&path)
            .with_context(|| format!("loading config from {}", path.display())),
        None => Ok(PipelineConfig::default()),
    }
}

fn store_at(data_dir: &Path) -> FsObjectStore {
    FsObjectStore::new(data_dir.join("store"))
}

fn catalog_at(data_dir: &Path) -> JsonCatalog {
    JsonCatalog::new(data_dir.join("catalog"))
}

fn run_scrape(
    config: Option<PathBuf>,
    data_dir: &Path,
    reference: Option<String>,
    index: &str,
) -> Result<()> {
    let config = load_config(config)?;

    let reference = reference
        .as_deref()
        .map(|s| NaiveDate::parse_from_str(s, "%Y-%m-%d"))
        .transpose()
        .context("parsing --reference")?
        .unwrap_or_else(|| chrono::Local::now().date_naive());

    let calendar = HolidayCalendar::brazil(reference.year() - 1..=reference.year())
        .with_dates(config.extra_holidays.iter().copied());
    let trading_day = previous_trading_day(reference, &calendar);
    println!("Trading day: {trading_day}");

    let mut page = B3IndexPage::for_index(index);
    let rows = extract(&mut page)?;
    println!("Extracted {} constituents", rows.len());

    let store = store_at(data_dir);
    let landed = LandingWriter::new(&store, &config).land(&rows, trading_day)?;
    println!("Landed at {}/{}", landed.bucket, landed.key);

    Ok(())
}

fn run_transform(config: Option<PathBuf>, data_dir: &Path) -> Result<()> {
    let config = load_config(config)?;
    let store = store_at(data_dir);
    let catalog = catalog_at(data_dir);

    let summary = TransformEngine::new(&store, &catalog, &config).run()?;
    print_summary(&summary);

    if !summary.failed.is_empty() {
        bail!("{} partition(s) failed to transform", summary.failed.len());
    }
    Ok(())
}

fn run_dispatch(config: Option<PathBuf>, data_dir: &Path, event_path: &Path) -> Result<()> {
    let config = load_config(config)?;
    let store = store_at(data_dir);
    let catalog = catalog_at(data_dir);

    let text = std::fs::read_to_string(event_path)
        .with_context(|| format!("reading event from {}", event_path.display()))?;
    let event: ObjectEvent = serde_json::from_str(&text).context("parsing event JSON")?;

    let runner = InProcessRunner {
        store: &store,
        catalog: &catalog,
        config: &config,
    };
    let dispatcher = Dispatcher::new(&runner, &config.transform_job_name, &config.landing_prefix);

    match dispatcher.on_object_landed(&event)? {
        Dispatch::Started { job_run_id } => {
            println!("Started job run {job_run_id}");
            Ok(())
        }
        Dispatch::Skipped { key } => {
            println!("Skipped out-of-convention object: {key}");
            Ok(())
        }
    }
}

/// Runs the transform engine in the dispatching process, standing in for the
/// managed job runtime during local runs.
struct InProcessRunner<'a> {
    store: &'a FsObjectStore,
    catalog: &'a JsonCatalog,
    config: &'a PipelineConfig,
}

impl JobRunner for InProcessRunner<'_> {
    fn start_job(
        &self,
        name: &str,
        _arguments: &BTreeMap<String, String>,
    ) -> Result<JobRun, JobError> {
        let summary = TransformEngine::new(self.store, self.catalog, self.config)
            .run()
            .map_err(|e| JobError::Start {
                job: name.to_string(),
                reason: e.to_string(),
            })?;
        print_summary(&summary);
        if let Some((key, error)) = summary.failed.first() {
            return Err(JobError::Start {
                job: name.to_string(),
                reason: format!("{key}: {error}"),
            });
        }
        Ok(JobRun {
            run_id: format!("local-{}", chrono::Local::now().format("%Y%m%d%H%M%S")),
        })
    }
}

fn print_summary(summary: &TransformSummary) {
    for report in &summary.processed {
        println!(
            "Transformed {}: {} init rows, {} aggregate rows",
            report.key, report.init_count, report.agg_count
        );
    }
    for (key, error) in &summary.failed {
        eprintln!("Failed {key}: {error}");
    }
    if summary.processed.is_empty() && summary.failed.is_empty() {
        println!("Nothing to transform");
    }
}
