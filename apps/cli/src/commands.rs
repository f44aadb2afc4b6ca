//! CLI command definitions, routing, and tracing setup.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use color_eyre::eyre::{Result, eyre};
use heritagekb_checkpoint::CheckpointStore;
use heritagekb_core::{
    CandidateStatus, Orchestrator, Preview, ProgressReporter, RunReport, StopSignal,
};
use heritagekb_export::{ExportOptions, ExportSummary};
use heritagekb_shared::{AppConfig, Category, init_config, load_config, load_config_from};
use tracing::{info, warn};
use uuid::Uuid;

use crate::progress::{BarProgress, PlainProgress};

// ---------------------------------------------------------------------------
// CLI structure
// ---------------------------------------------------------------------------

/// heritagekb: build an enriched dataset of heritage sites.
#[derive(Parser)]
#[command(
    name = "heritagekb",
    version,
    about = "Enrich heritage-site listings into a structured, multilingual dataset.",
    long_about = None,
)]
pub(crate) struct Cli {
    /// Log format: text (default) or json.
    #[arg(long, default_value = "text", global = true)]
    pub log_format: LogFormat,

    /// Verbosity level (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Config file (defaults to ~/.heritagekb/heritagekb.toml).
    #[arg(long, global = true, env = "HERITAGEKB_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

/// Log output format.
#[derive(Clone, Debug, clap::ValueEnum)]
pub(crate) enum LogFormat {
    Text,
    Json,
}

/// Top-level CLI subcommands.
#[derive(Subcommand)]
pub(crate) enum Command {
    /// Enrich sites and write the output document.
    Run(RunArgs),

    /// Configuration management.
    Config {
        /// Config subcommand.
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(clap::Args, Debug)]
pub(crate) struct RunArgs {
    /// Category to process (repeatable). Defaults to all.
    #[arg(short = 't', long = "type", value_parser = parse_category)]
    pub categories: Vec<Category>,

    /// Output document path.
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Maximum candidates per category.
    #[arg(short, long)]
    pub max: Option<usize>,

    /// List candidates without enriching them.
    #[arg(long)]
    pub dry_run: bool,

    /// Continue from the checkpoint file.
    #[arg(long)]
    pub resume: bool,

    /// Checkpoint file path.
    #[arg(long)]
    pub checkpoint: Option<PathBuf>,

    /// Delete the checkpoint before starting.
    #[arg(long)]
    pub clear_checkpoint: bool,

    /// Skip sites whose name is already in the output document.
    #[arg(long)]
    pub skip_existing: bool,

    /// Print plain lines instead of progress bars.
    #[arg(long)]
    pub no_progress: bool,

    /// Hold back records with validation issues and exit non-zero.
    #[arg(long)]
    pub strict: bool,
}

/// Config subcommands.
#[derive(Subcommand)]
pub(crate) enum ConfigAction {
    /// Initialize config file with defaults.
    Init,
    /// Show resolved configuration.
    Show,
}

fn parse_category(s: &str) -> std::result::Result<Category, String> {
    s.parse::<Category>().map_err(|e| e.to_string())
}

// ---------------------------------------------------------------------------
// Tracing setup
// ---------------------------------------------------------------------------

/// Initialize tracing based on CLI flags.
pub(crate) fn init_tracing(cli: &Cli) {
    use tracing_subscriber::{EnvFilter, fmt};

    let filter = match cli.verbose {
        0 => "warn,heritagekb=info",
        1 => "warn,heritagekb=debug",
        _ => "info,heritagekb=trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    match cli.log_format {
        LogFormat::Text => {
            fmt()
                .with_env_filter(env_filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .init();
        }
        LogFormat::Json => {
            fmt()
                .json()
                .with_env_filter(env_filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}

// ---------------------------------------------------------------------------
// Command dispatch
// ---------------------------------------------------------------------------

/// Run the CLI command.
pub(crate) async fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Command::Run(args) => {
            let config = resolve_config(cli.config.as_deref())?;
            cmd_run(&config, args).await
        }
        Command::Config { action } => match action {
            ConfigAction::Init => cmd_config_init().await,
            ConfigAction::Show => cmd_config_show(cli.config.as_deref()).await,
        },
    }
}

fn resolve_config(path: Option<&Path>) -> Result<AppConfig> {
    Ok(match path {
        Some(p) => load_config_from(p)?,
        None => load_config()?,
    })
}

// ---------------------------------------------------------------------------
// run
// ---------------------------------------------------------------------------

async fn cmd_run(config: &AppConfig, args: RunArgs) -> Result<()> {
    let categories = if args.categories.is_empty() {
        Category::ALL.to_vec()
    } else {
        args.categories.clone()
    };
    let output = args
        .output
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.defaults.output_path));
    let checkpoint_path = args
        .checkpoint
        .clone()
        .unwrap_or_else(|| PathBuf::from(&config.defaults.checkpoint_path));
    let max = args.max.or(config.defaults.max_per_category);
    let merge = args.resume || args.skip_existing;

    let mut checkpoint = CheckpointStore::new(&checkpoint_path);
    if args.clear_checkpoint {
        checkpoint.clear()?;
        println!("Checkpoint cleared: {}", checkpoint_path.display());
    }
    if args.resume && checkpoint.load() {
        let stats = checkpoint.stats();
        println!(
            "Resuming: {} processed, {} categories complete",
            stats.total_processed,
            stats.completed_categories.len()
        );
    }

    let existing_names = if args.skip_existing {
        heritagekb_export::existing_site_names(&output)
    } else {
        Default::default()
    };
    let id_offset = if merge {
        heritagekb_export::existing_id_offset(&output)
    } else {
        0
    };

    let adapters = heritagekb_sources::default_adapters(config)?;
    let stop = StopSignal::new();
    let mut orchestrator = Orchestrator::new(adapters, checkpoint)
        .with_id_offset(id_offset)
        .with_existing_names(existing_names)
        .with_stop_signal(stop.clone());

    let run_id = Uuid::now_v7();
    info!(
        %run_id,
        categories = ?categories.iter().map(|c| c.slug()).collect::<Vec<_>>(),
        max = ?max,
        output = %output.display(),
        checkpoint = %checkpoint_path.display(),
        resume = args.resume,
        skip_existing = args.skip_existing,
        "starting run"
    );

    if args.dry_run {
        let preview = orchestrator.preview(&categories, max).await;
        print_preview(&preview);
        if preview.aborted_categories.len() == categories.len() {
            return Err(eyre!("listing failed for every requested category"));
        }
        return Ok(());
    }

    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, stopping after the current record");
            stop.stop();
        }
    });

    let progress: Box<dyn ProgressReporter> = if args.no_progress {
        Box::new(PlainProgress)
    } else {
        Box::new(BarProgress::new())
    };

    let report = orchestrator.run(&categories, max, progress.as_ref()).await;

    let options = ExportOptions {
        strict: args.strict || config.export.strict,
        merge,
    };
    let exported = heritagekb_export::export(&report.records, &output, options);

    if let Err(e) = orchestrator.shutdown() {
        warn!(error = %e, "final checkpoint save failed");
    }

    let summary = exported?;
    info!(%run_id, committed = report.committed, "run finished");
    print_summary(&report, &summary);

    if report.all_listings_failed() {
        return Err(eyre!("listing failed for every requested category"));
    }
    if summary.rejected > 0 {
        return Err(eyre!(
            "{} record(s) failed validation, see {}",
            summary.rejected,
            summary
                .rejected_path
                .as_deref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "the log".to_string())
        ));
    }
    Ok(())
}

fn print_preview(preview: &Preview) {
    println!();
    let mut current = None;
    for entry in &preview.entries {
        if current != Some(entry.category) {
            println!("  {}", entry.category.display_name());
            current = Some(entry.category);
        }
        println!(
            "    [{:<14}] {} ({})",
            entry.status.label(),
            entry.candidate.name,
            entry.candidate.location_hint
        );
    }
    for category in &preview.aborted_categories {
        println!("  {}: listing failed", category.display_name());
    }
    println!();
    println!(
        "  {} candidates: {} new, {} checkpointed, {} already exported",
        preview.entries.len(),
        preview.count(CandidateStatus::New),
        preview.count(CandidateStatus::Checkpointed),
        preview.count(CandidateStatus::AlreadyExists)
    );
    println!();
}

fn print_summary(report: &RunReport, summary: &ExportSummary) {
    println!();
    if report.stopped {
        println!("  Run interrupted; partial results saved.");
    } else {
        println!("  Run complete!");
    }
    println!("  Committed:      {}", report.committed);
    println!("  Skipped:        {}", report.skipped);
    println!("  Failed:         {}", report.failed);
    if !report.aborted_categories.is_empty() {
        let aborted: Vec<&str> = report.aborted_categories.iter().map(|c| c.slug()).collect();
        println!("  Aborted:        {}", aborted.join(", "));
    }
    println!("  Sites:          {}", summary.sites);
    println!("  Sub-locations:  {}", summary.sub_locations);
    println!("  Cards:          {}", summary.cards);
    println!("  Tips:           {}", summary.tips);
    println!("  Vocabulary:     {}", summary.vocabulary_terms);
    println!("  Output:         {}", summary.path.display());
    if let Some(requested) = &summary.diverted_from {
        println!("  (could not use {}, wrote a side file)", requested.display());
    }
    if let Some(rejected) = &summary.rejected_path {
        println!("  Rejected:       {} ({})", summary.rejected, rejected.display());
    }
    println!("  SHA-256:        {}", summary.sha256);
    println!("  Time:           {:.1}s", report.elapsed.as_secs_f64());
    println!();
}

// ---------------------------------------------------------------------------
// config
// ---------------------------------------------------------------------------

async fn cmd_config_init() -> Result<()> {
    let path = init_config()?;
    println!("Config initialized at: {}", path.display());
    Ok(())
}

async fn cmd_config_show(path: Option<&Path>) -> Result<()> {
    let config = resolve_config(path)?;
    let toml_str = toml::to_string_pretty(&config)?;
    println!("{toml_str}");
    Ok(())
}
