//! `DustOff` command line front end
//!
//! Thin consumer of the library: inventory with running-state correlation,
//! process listing, working-set reclamation and icon export.

mod cli;

use anyhow::{Context, Result, bail};
use clap::Parser;
use cli::{AppsArgs, Cli, Command, IconArgs, ProcessesArgs};
use dustoff::{
    ApplicationRecord, DustOffError,
    config::{AppConfig, ConfigManager},
    error::get_user_friendly_error,
    inventory::InventoryScanner,
    memory::{Reclaimer, memory_status},
    monitor::{Correlator, ProcessSnapshot, take_snapshot},
    utils::{self, Icon, IconResolver, LogTarget},
};
use serde::Serialize;
use std::collections::BTreeMap;
use tracing::{info, warn};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => ConfigManager::load_from(path),
        None => ConfigManager::load(),
    }
    .map_err(friendly)
    .context("Failed to load configuration")?;

    let (target, level) = if cli.verbose {
        (LogTarget::Stderr, "debug")
    } else {
        (
            LogTarget::File(ConfigManager::data_dir()),
            config.preferences.log_level.as_str(),
        )
    };
    utils::init_logging(target, level).context("Failed to initialize logging system")?;

    match cli.command {
        Command::Apps(args) => list_apps(&args, &config),
        Command::Processes(args) => list_processes(&args),
        Command::Reclaim => reclaim(),
        Command::Icon(args) => export_icon(&args, &config),
    }
}

/// Attach the user-facing explanation to a library error
fn friendly(error: DustOffError) -> anyhow::Error {
    let message = get_user_friendly_error(&error);
    anyhow::Error::new(error).context(message)
}

#[derive(Serialize)]
struct AppRow<'a> {
    #[serde(flatten)]
    record: &'a ApplicationRecord,
    pids: Vec<u32>,
}

fn list_apps(args: &AppsArgs, config: &AppConfig) -> Result<()> {
    let report = InventoryScanner::system().scan_with_report();
    if report.roots_unavailable > 0 {
        warn!("{} uninstall roots could not be read", report.roots_unavailable);
    }

    let snapshot = take_snapshot();
    let correlator = Correlator::with_extra_aliases(&config.process_aliases);

    let rows: Vec<AppRow<'_>> = report
        .records
        .iter()
        .map(|record| AppRow {
            record,
            pids: correlator
                .find_pids(&record.name, &snapshot)
                .into_iter()
                .collect(),
        })
        .filter(|row| !args.running || !row.pids.is_empty())
        .collect();

    info!(
        "Listing {} of {} applications",
        rows.len(),
        report.records.len()
    );

    if args.json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    println!(
        "{:<40} {:<16} {:<24} {:>10}  PIDS",
        "NAME", "VERSION", "PUBLISHER", "SIZE (MB)"
    );
    for row in &rows {
        let pids: Vec<String> = row.pids.iter().map(u32::to_string).collect();
        println!(
            "{:<40} {:<16} {:<24} {:>10.2}  {}",
            truncate(&row.record.name, 40),
            truncate(&row.record.version, 16),
            truncate(&row.record.publisher, 24),
            row.record.estimated_size_mb,
            pids.join(",")
        );
    }
    println!("\n{} applications", rows.len());

    Ok(())
}

fn list_processes(args: &ProcessesArgs) -> Result<()> {
    let snapshot = ProcessSnapshot::capture().map_err(friendly)?;
    let sorted: BTreeMap<&str, &[u32]> = snapshot.iter().collect();

    if args.json {
        println!("{}", serde_json::to_string_pretty(&sorted)?);
        return Ok(());
    }

    for (name, pids) in &sorted {
        let pids: Vec<String> = pids.iter().map(u32::to_string).collect();
        println!("{:<40} {}", truncate(name, 40), pids.join(","));
    }
    println!(
        "\n{} processes under {} names",
        snapshot.process_count(),
        snapshot.len()
    );

    Ok(())
}

fn reclaim() -> Result<()> {
    let before = memory_status().ok();

    let result = Reclaimer::new().try_reclaim_all().map_err(friendly)?;

    println!(
        "Trimmed {} processes ({} could not be trimmed)",
        result.success_count, result.fail_count
    );

    if let (Some(before), Ok(after)) = (before, memory_status()) {
        println!(
            "Available memory: {} MB -> {} MB ({:.1}% in use)",
            before.available_mb(),
            after.available_mb(),
            after.percent_used
        );
    }

    Ok(())
}

fn export_icon(args: &IconArgs, config: &AppConfig) -> Result<()> {
    let allow_fallback = !args.no_fallback && config.preferences.use_fallback_icons;
    let resolver = IconResolver::new();

    let icon = resolver.resolve(&args.path, allow_fallback);
    let image = match &icon {
        Icon::Extracted(image) => image,
        Icon::Fallback(image) => {
            warn!("No icon in {:?}, writing fallback", args.path);
            image
        }
        Icon::Empty => bail!("No icon found in {}", args.path),
    };

    let png = image.to_png().map_err(friendly)?;
    std::fs::write(&args.output, png)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    println!(
        "Wrote {}x{} {} icon to {}",
        image.width(),
        image.height(),
        if icon.is_fallback() { "fallback" } else { "extracted" },
        args.output.display()
    );

    Ok(())
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}
