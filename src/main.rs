use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::{ArgGroup, Parser, Subcommand, ValueEnum};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod db;
mod error;
mod merge;
mod models;
mod parser;
mod render;
mod report;
mod roster;
mod sheet;
mod sort;
mod stats;
mod store;
mod view;

use config::AppConfig;
use error::ParseError;
use models::{PerformanceRecord, RosterEntry, SortOption};
use parser::{HeuristicParser, ParseOutcome, RawInput};
use render::ReportFormat;
use report::{PageLayout, ReportMeta};
use roster::{RosterFetcher, StoreHandles};

#[derive(Parser)]
#[command(name = "prestasi-murid")]
#[command(about = "Student performance dashboard: merge point exports with the class roster", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
enum ReportMode {
    /// One ranked list of every student
    #[default]
    Flat,
    /// One table per class with its own ranking
    Grouped,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the key-value schema in the Postgres roster store
    InitDb,
    /// Load a sample roster into the Postgres roster store
    Seed,
    /// List the classes known to the roster store
    Classes,
    /// Print the ranked student table
    #[command(group(
        ArgGroup::new("source")
            .args(["file", "from_store"])
            .required(true)
            .multiple(false)
    ))]
    Show {
        /// Exported sheet (.csv, .xlsx or .xls)
        #[arg(long)]
        file: Option<PathBuf>,
        /// Use the last sheet saved in the performance store
        #[arg(long)]
        from_store: bool,
        #[arg(long)]
        class: Option<String>,
        #[arg(long, value_enum, default_value_t = SortOption::PointsDesc)]
        sort: SortOption,
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Write a printable report
    #[command(group(
        ArgGroup::new("source")
            .args(["file", "from_store"])
            .required(true)
            .multiple(false)
    ))]
    Report {
        #[arg(long)]
        file: Option<PathBuf>,
        #[arg(long)]
        from_store: bool,
        /// Restricts the report to one class (always a flat list)
        #[arg(long)]
        class: Option<String>,
        #[arg(long, value_enum, default_value_t = SortOption::PointsDesc)]
        sort: SortOption,
        #[arg(long, value_enum, default_value_t = ReportMode::Flat)]
        mode: ReportMode,
        #[arg(long, value_enum, default_value_t = ReportFormat::Markdown)]
        format: ReportFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = AppConfig::from_env();

    match cli.command {
        Commands::InitDb => {
            let store = connect_pg(&config).await?;
            db::init_db(store.pool()).await?;
            println!("Schema ready.");
        }
        Commands::Seed => {
            let store = connect_pg(&config).await?;
            db::seed(store.pool()).await?;
            println!("Sample roster inserted.");
        }
        Commands::Classes => {
            let handles = open_handles(&config).await;
            let roster = load_roster(&handles).await;
            let classes = roster::unique_classes(&roster);
            if classes.is_empty() {
                println!("Tiada maklumat kelas.");
            }
            for class_name in classes {
                println!("- {class_name}");
            }
        }
        Commands::Show {
            file,
            from_store,
            class,
            sort,
            limit,
        } => {
            let handles = open_handles(&config).await;
            let Some(performance) =
                load_performance(file.as_deref(), from_store, &handles).await?
            else {
                return Ok(());
            };
            let roster = load_roster(&handles).await;

            let merged = merge::merge(&performance, &roster);
            let filtered = merge::filter_by_class(&merged, class.as_deref());
            let sorted = sort::sort_by(&filtered, sort);
            let stats = stats::DashboardStats::compute(&filtered, &sorted, sort);

            match &class {
                Some(class_name) => println!("Kelas: {class_name}"),
                None => println!("Paparan Keseluruhan"),
            }
            println!("Susun ikut: {}", sort.label());
            println!();
            print!("{}", view::render_stats(&stats));
            println!();
            print!("{}", view::render_table(&sorted, sort, limit));
        }
        Commands::Report {
            file,
            from_store,
            class,
            sort,
            mode,
            format,
            out,
        } => {
            let handles = open_handles(&config).await;
            let Some(performance) =
                load_performance(file.as_deref(), from_store, &handles).await?
            else {
                return Ok(());
            };
            let roster = load_roster(&handles).await;
            let merged = merge::merge(&performance, &roster);
            let generated_at = chrono::Local::now();

            let document = match (mode, class.as_deref()) {
                (ReportMode::Grouped, None) => {
                    let meta = ReportMeta::new(report::GROUPED_TITLE, sort, generated_at);
                    report::compose_grouped(&merged, sort, &meta, PageLayout::default())
                }
                (_, class_name) => {
                    let filtered = merge::filter_by_class(&merged, class_name);
                    let sorted = sort::sort_by(&filtered, sort);
                    let meta =
                        ReportMeta::new(ReportMeta::flat_title(class_name), sort, generated_at);
                    report::compose_flat(&sorted, &meta, PageLayout::default())
                }
            };

            let path = render::export(&document, format, out.as_deref())?;
            info!(
                pages = document.page_count(),
                tables = document.tables().count(),
                path = %path.display(),
                "report exported"
            );
            println!("Report written to {}.", path.display());
        }
    }

    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn connect_pg(config: &AppConfig) -> anyhow::Result<db::PgStore> {
    let store = config.require_roster()?;
    db::PgStore::connect(&store.url)
        .await
        .context("failed to connect to the Postgres roster store")
}

/// Opens each configured store on its own. Without a roster store the
/// dashboard still runs, with every student unclassified.
async fn open_handles(config: &AppConfig) -> StoreHandles {
    let roster = match &config.roster {
        Some(roster_config) => open_or_warn(roster_config, "roster").await,
        None => {
            warn!("{} is not set; class information unavailable", config::ROSTER_STORE_URL);
            None
        }
    };
    let performance = match &config.performance {
        Some(performance_config) => open_or_warn(performance_config, "performance").await,
        None => None,
    };

    StoreHandles {
        roster,
        performance,
    }
}

async fn open_or_warn(store_config: &config::StoreConfig, role: &str) -> Option<store::StoreHandle> {
    match store::open_store(store_config).await {
        Ok(handle) => Some(handle),
        Err(err) => {
            warn!(error = %err, store = role, "could not open store");
            None
        }
    }
}

/// One fetch per command. Fetch failures and empty rosters both fall back to
/// "no class information".
async fn load_roster(handles: &StoreHandles) -> Vec<RosterEntry> {
    match RosterFetcher::new(handles.clone()).fetch_roster().await {
        Ok(entries) => {
            if entries.is_empty() && handles.roster.is_some() {
                warn!("roster store has no class data");
            }
            entries
        }
        Err(err) => {
            warn!(error = %err, "roster fetch failed; continuing without classes");
            Vec::new()
        }
    }
}

async fn load_performance(
    file: Option<&Path>,
    from_store: bool,
    handles: &StoreHandles,
) -> anyhow::Result<Option<Vec<PerformanceRecord>>> {
    if from_store {
        if handles.performance.is_none() {
            anyhow::bail!("reading from the store needs {}", config::PERFORMANCE_STORE_URL);
        }
        let fetcher = RosterFetcher::new(handles.clone());
        let records = fetcher
            .fetch_performance_snapshot()
            .await
            .context("failed to read the performance store")?;
        if records.is_empty() {
            println!("Tiada data prestasi tersimpan.");
            return Ok(None);
        }
        return Ok(Some(records));
    }

    let path = file.context("no input file given")?;
    let input = match RawInput::read(path) {
        Ok(input) => input,
        Err(ParseError::UnsupportedFile(message)) => {
            println!("{message}");
            return Ok(None);
        }
        Err(err) => return Err(err).context("failed to read input file"),
    };

    match parser::parse_upload(&HeuristicParser, &input) {
        Ok(ParseOutcome::Records(records)) => {
            info!(records = records.len(), file = %path.display(), "loaded performance data");
            Ok(Some(records))
        }
        Ok(ParseOutcome::Empty) => {
            println!("{}", input.kind.empty_message());
            Ok(None)
        }
        Err(err) => Err(err).context(input.kind.failure_message()),
    }
}
