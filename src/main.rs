//! sortwise - Rule-based file classifier and organizer.
//!
//! Usage:
//!   sortwise -c organizer.yaml              Organize the configured source
//!   sortwise -c organizer.yaml --dry-run    Show what would happen
//!   sortwise -c organizer.yaml --validate   Check the configuration and exit
//!   sortwise --help                         Show help

mod logging;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};
use color_eyre::eyre::{Context, Result};
use tracing::info;

use sortwise_core::{OrganizerConfig, ReportFormat};
use sortwise_organize::{OrganizerRun, Reporter, RunOptions};

#[derive(Parser)]
#[command(
    name = "sortwise",
    version,
    about = "Rule-based file classifier and organizer",
    long_about = "sortwise scores every file in a source tree against weighted category \
                  rules and moves it into a matching folder under the destination.\n\n\
                  Use --dry-run first to see what would be moved."
)]
struct Cli {
    /// YAML configuration file
    #[arg(short, long)]
    config: PathBuf,

    /// Decide and report without moving anything
    #[arg(long)]
    dry_run: bool,

    /// Override the source directory
    #[arg(long)]
    source: Option<PathBuf>,

    /// Override the destination directory
    #[arg(long)]
    destination: Option<PathBuf>,

    /// Report format
    #[arg(short, long)]
    format: Option<OutputFormat>,

    /// Also write the report to this file
    #[arg(short, long)]
    report: Option<PathBuf>,

    /// Load and check the configuration, then exit
    #[arg(long)]
    validate: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OutputFormat {
    Text,
    Json,
}

impl From<OutputFormat> for ReportFormat {
    fn from(format: OutputFormat) -> Self {
        match format {
            OutputFormat::Text => Self::Text,
            OutputFormat::Json => Self::Json,
        }
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    if cli.validate {
        print_summary(&config)?;
        return Ok(());
    }

    let (dispatch, _guard) = logging::init(&config.logging)?;

    let options = RunOptions {
        dry_run: cli.dry_run,
        ..RunOptions::default()
    };
    let report = OrganizerRun::new(&config, options)
        .context("Failed to prepare run")?
        .run_with_dispatch(&dispatch)
        .context("Run failed")?;

    let reporter = Reporter::from_config(&config.report);
    println!("{}", reporter.render(&report)?);

    if let Some(path) = &config.report.file {
        reporter
            .write(&report, path)
            .with_context(|| format!("Failed to write report to {}", path.display()))?;
        tracing::dispatcher::with_default(&dispatch, || {
            info!(path = %path.display(), "report written");
        });
    }

    Ok(())
}

/// Parse the config file, apply command line overrides, then validate.
fn load_config(cli: &Cli) -> Result<OrganizerConfig> {
    let mut config = OrganizerConfig::parse(&cli.config)
        .with_context(|| format!("Failed to load {}", cli.config.display()))?;

    if let Some(source) = &cli.source {
        config.source_directory = source.clone();
    }
    if let Some(destination) = &cli.destination {
        config.organization.destination_directory = destination.clone();
    }
    if let Some(format) = cli.format {
        config.report.format = format.into();
    }
    if let Some(report) = &cli.report {
        config.report.file = Some(report.clone());
    }
    config.expand_paths();

    config
        .validate()
        .with_context(|| format!("Invalid configuration in {}", cli.config.display()))?;
    Ok(config)
}

/// Print what a validated configuration will do.
fn print_summary(config: &OrganizerConfig) -> Result<()> {
    let rules = config.rule_set()?;
    let org = &config.organization;

    println!("Configuration OK");
    println!("  Source:      {}", config.source_directory.display());
    println!("  Destination: {}", org.destination_directory.display());
    println!(
        "  Policies:    conflict={}, duplicates={}, operation={}, sub_bucket={}",
        org.conflict_policy, org.duplicate_policy, org.operation, org.sub_bucket
    );
    println!(
        "  Duplicates:  {}",
        if org.detect_duplicates { "detected" } else { "ignored" }
    );
    println!("  Min score:   {}", config.classification.min_score);
    println!("  Rules:       {}", rules.len());
    for rule in &rules {
        println!(
            "    {:<20} priority {:>3}, {} signal(s), max score {}",
            rule.category,
            rule.priority,
            rule.signals.len(),
            rule.max_score()
        );
    }

    Ok(())
}
