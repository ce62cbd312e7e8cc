mod cli;
mod config;
mod error;
mod model;
mod parser;
mod report;
mod runner;
mod xlsx;

use std::fs;
use std::path::PathBuf;
use std::process;

use anyhow::Context;
use clap::Parser;
use colored::*;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

use crate::cli::Cli;
use crate::config::Config;
use crate::error::Result;
use crate::model::{canonical_port_keys, ScanInfo};

fn main() {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .init();

    if let Err(err) = run(cli) {
        error!("{err:#}");
        eprintln!("{} {}", "error:".truecolor(255, 0, 81).bold(), err);
        process::exit(err.exit_code());
    }
}

fn run(cli: Cli) -> Result<()> {
    let config = Config::load()?;
    config.validate()?;

    // Drive a live scan first when a target and profile are given; its
    // capture becomes the parser input unless an explicit file overrides.
    let mut live_info: Option<ScanInfo> = None;
    let mut input_file: Option<PathBuf> = None;

    if let (Some(target), Some(profile)) = (cli.target.as_deref(), cli.profile.as_deref()) {
        fs::create_dir_all(&config.scan_dir)
            .with_context(|| format!("cannot create scan dir '{}'", config.scan_dir.display()))?;
        let capture = config.scan_dir.join(runner::capture_file_name(profile));

        runner::run_scan(target, profile, &capture, &config)?;
        println!(
            "{} {}",
            "Scan complete, capture saved to:".truecolor(0, 255, 65),
            capture.display()
        );

        live_info = Some(ScanInfo {
            command: Some(format!("nmap {profile} {target}")),
            source_host: runner::local_ip(),
            ..ScanInfo::default()
        });
        input_file = Some(capture);
    }

    if let Some(path) = cli.input_file {
        input_file = Some(path);
    }

    let Some(input_file) = input_file else {
        eprintln!(
            "{} provide a report file, or --target together with --profile",
            "error:".truecolor(255, 0, 81).bold()
        );
        process::exit(1);
    };

    let (hosts, parsed_info) = parser::parse_file(&input_file)?;

    // Counts and start time come from the file either way; a live run
    // keeps its own command and source host.
    let info = match live_info {
        Some(mut seeded) => {
            seeded.merge_counts(&parsed_info);
            seeded
        }
        None => parsed_info,
    };

    let output_dir = cli.output_dir.unwrap_or_else(|| config.output_dir.clone());
    fs::create_dir_all(&output_dir)
        .with_context(|| format!("cannot create output dir '{}'", output_dir.display()))?;

    let stem = input_file
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("scan");
    let output_path = output_dir.join(format!("{stem}{}", config.output_suffix));

    if hosts.is_empty() {
        warn!("no host data found in '{}'", input_file.display());
        xlsx::write_empty(&output_path)?;
        println!(
            "{} {}",
            "No hosts parsed, empty report written to:".truecolor(255, 140, 0),
            output_path.display()
        );
        return Ok(());
    }

    let keys = canonical_port_keys(&hosts);
    let sheets = report::synthesize(&hosts, &info, &keys);
    xlsx::write_report(&sheets, &config.colors, &output_path)?;

    println!(
        "{} {}",
        "Report saved to:".truecolor(0, 255, 65),
        output_path.display()
    );
    Ok(())
}
