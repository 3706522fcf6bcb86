//! notebook-admin: maintenance commands for a notebook's projections.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use event_store::EventStore;
use notebook::{Config, Notebook};
use projections::CatchUpReport;

/// Maintenance commands for a notebook's projections
#[derive(Parser, Debug)]
#[command(name = "notebook-admin")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Event log database URL
    #[arg(long, env = "NOTEBOOK_EVENTS_DB")]
    events_db: Option<String>,

    /// Projection database URL
    #[arg(long, env = "NOTEBOOK_PROJECTIONS_DB")]
    projections_db: Option<String>,

    /// Events read per catch-up batch
    #[arg(long, env = "NOTEBOOK_BATCH_SIZE")]
    batch_size: Option<usize>,

    /// Emit JSON log lines
    #[arg(long)]
    json: bool,

    /// Print the recorded metrics after the command finishes
    #[arg(long)]
    metrics: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Apply every event past the stored checkpoints
    CatchUp,

    /// Clear projections and replay the whole log
    Rebuild {
        /// Projection to rebuild (all when omitted)
        projection: Option<String>,
    },

    /// Compare each projection with a fresh replay of the log
    Verify,

    /// Show log head, checkpoints, lag and row counts
    Stats,
}

impl Cli {
    fn config(&self) -> Config {
        let mut config = Config::from_env();
        if let Some(url) = &self.events_db {
            config.events_db.clone_from(url);
        }
        if let Some(url) = &self.projections_db {
            config.projections_db.clone_from(url);
        }
        if let Some(size) = self.batch_size.filter(|n| *n > 0) {
            config.batch_size = size;
        }
        config.log_json |= self.json;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = cli.config();
    notebook::telemetry::init(&config)?;
    let metrics = notebook::telemetry::install_metrics()?;

    let notebook = Notebook::connect(&config)
        .await
        .with_context(|| format!("failed to open {}", config.events_db))?;
    let outcome = run(&notebook, &cli.command).await;
    notebook.close().await?;
    if cli.metrics {
        print!("{}", metrics.render());
    }
    outcome
}

async fn run(notebook: &Notebook, command: &Commands) -> Result<()> {
    let orchestrator = notebook.orchestrator();
    match command {
        Commands::CatchUp => {
            let report = orchestrator.catch_up().await.context("catch-up failed")?;
            print_report("catch-up", &report);
        }
        Commands::Rebuild { projection: None } => {
            let report = notebook.rebuild_all().await.context("rebuild failed")?;
            print_report("rebuild", &report);
        }
        Commands::Rebuild {
            projection: Some(name),
        } => {
            let report = orchestrator
                .rebuild(name)
                .await
                .with_context(|| format!("rebuild of {name} failed"))?;
            print_report(&format!("rebuild {name}"), &report);
        }
        Commands::Verify => {
            let report = orchestrator
                .verify_consistency()
                .await
                .context("consistency check failed to run")?;
            for health in &report.projections {
                let verdict = if health.rows_match { "ok" } else { "DIVERGED" };
                println!(
                    "{:<12} {:<8} checkpoint={} lag={}",
                    health.status.name, verdict, health.status.checkpoint, health.status.lag
                );
            }
            if !report.is_consistent() {
                let diverged: Vec<&str> = report.diverged().collect();
                anyhow::bail!(
                    "projections diverged from the log: {} (run `notebook-admin rebuild`)",
                    diverged.join(", ")
                );
            }
        }
        Commands::Stats => {
            let events = notebook
                .event_store()
                .event_count()
                .await
                .context("failed to count events")?;
            println!("events: {events}");
            for status in orchestrator.status().await? {
                println!(
                    "{:<12} checkpoint={} head={} lag={} rows={}",
                    status.name, status.checkpoint, status.head, status.lag, status.row_count
                );
            }
        }
    }
    Ok(())
}

fn print_report(label: &str, report: &CatchUpReport) {
    println!(
        "{label}: read={} applied={} skipped={} batches={} head={}",
        report.events_read,
        report.events_applied,
        report.events_skipped,
        report.batches,
        report.head
    );
}
