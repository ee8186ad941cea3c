// SPDX-License-Identifier: Apache-2.0
// Copyright (c) 2025 Polyframe Inc.

//! Polyframe Bridge CLI

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use clap::{Parser, Subcommand};
use colored::Colorize;
use polyframe_bridge::api::dto::{FileEncoding, SavedFile};
use polyframe_bridge::api::{KERNEL_METHODS, RUNTIME_METHODS};
use polyframe_bridge::script::Script;
use polyframe_bridge::{logging, BridgeConfig, Session};
use std::path::{Path, PathBuf};
use std::time::Duration;

#[derive(Parser)]
#[command(name = "polyframe-bridge")]
#[command(about = "Polyframe Bridge - drive a geometry kernel through opaque handles", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./bridge.toml when present)
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Per-call timeout in milliseconds (0 disables)
    #[arg(long, global = true)]
    timeout_ms: Option<u64>,

    /// Disable call memoization
    #[arg(long, global = true)]
    no_memo: bool,

    /// Verbose output
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List the methods the execution context understands
    Methods,

    /// Build a small part over several runs and report cache behaviour
    Demo {
        /// Number of runs
        #[arg(short, long, default_value = "3")]
        runs: u64,

        /// Write the final part as STL and STEP into this directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Replay a JSON call script
    Run {
        /// Script file
        script: PathBuf,

        /// Number of runs; the generational sweep happens between runs
        #[arg(short, long, default_value = "1")]
        runs: u64,

        /// Write files returned by io.* steps into this directory
        #[arg(short, long)]
        out: Option<PathBuf>,
    },

    /// Show version information
    Version,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let config = load_config(&cli)?;

    let filter = if cli.verbose {
        "polyframe_bridge=debug"
    } else {
        config.log_filter.as_str()
    };
    logging::init(filter);

    match &cli.command {
        Commands::Methods => methods_command(),
        Commands::Demo { runs, out } => demo_command(config, *runs, out.as_deref()).await?,
        Commands::Run { script, runs, out } => {
            run_command(config, script, *runs, out.as_deref(), cli.verbose).await?
        }
        Commands::Version => {
            println!("Polyframe Bridge v{}", env!("CARGO_PKG_VERSION"));
        }
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<BridgeConfig> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config = BridgeConfig::from_file(path)?;
            config.apply_overrides(|key| std::env::var(key).ok());
            config
        }
        None => BridgeConfig::load()?,
    };

    if let Some(ms) = cli.timeout_ms {
        config.call_timeout_ms = (ms > 0).then_some(ms);
    }
    if cli.no_memo {
        config.memoize_calls = false;
    }
    Ok(config)
}

fn methods_command() {
    println!("{}", "Kernel methods".bold());
    for method in KERNEL_METHODS {
        println!("  {}", method.cyan());
    }
    println!("{}", "Runtime methods".bold());
    for method in RUNTIME_METHODS {
        println!("  {}", method.yellow());
    }
}

async fn demo_command(config: BridgeConfig, runs: u64, out: Option<&Path>) -> Result<()> {
    let session = Session::spawn(config)?;
    let mut last_part = None;

    for pass in 0..runs.max(1) {
        // The post grows every other run so some results are reused and
        // some are not.
        let post_height = if pass % 2 == 0 { 15.0 } else { 20.0 };

        let base = session.create_box(40.0, 40.0, 5.0, true).await?;
        let post = session.create_cylinder(4.0, post_height, false).await?;
        let post = session.translate(&post, [0.0, 0.0, 2.5]).await?;
        let part = session.union(&[base, post]).await?;

        let volume = session.solid_volume(&part).await?;
        let bbox = session.bounding_box(&part).await?;
        let stats = session.cache_stats().await?;
        let report = session.begin_new_run().await?;

        println!(
            "{} {}  volume {}  size {:?}  live {}  memo hits {}  freed {}",
            "run".bright_black(),
            pass.to_string().cyan(),
            format!("{:.2}", volume).green(),
            bbox.size,
            stats.live_handles,
            stats.memo_hits,
            report.freed.to_string().yellow(),
        );
        last_part = Some(part);
    }

    if let (Some(dir), Some(part)) = (out, last_part) {
        std::fs::create_dir_all(dir)?;
        for saved in [
            session.save_shape_stl(&part, "demo.stl").await?,
            session.save_shape_step(&part, "demo.step").await?,
        ] {
            let path = write_saved(dir, &saved)?;
            println!("{} {}", "Wrote".green(), path.display());
        }
    }

    session.shutdown().await?;
    Ok(())
}

async fn run_command(
    config: BridgeConfig,
    script_path: &Path,
    runs: u64,
    out: Option<&Path>,
    verbose: bool,
) -> Result<()> {
    let script = Script::from_file(script_path)?;
    let session = Session::spawn(config)?;
    let mut failures = 0usize;

    for pass in 0..runs.max(1) {
        let outcomes = script.run_once(&session).await;
        let total: Duration = outcomes.iter().map(|o| o.elapsed).sum();

        for outcome in &outcomes {
            match &outcome.result {
                Ok(value) => {
                    if verbose {
                        println!("  {} {} {:.2?}", "ok".green(), outcome.method, outcome.elapsed);
                    }
                    if let (Some(dir), Ok(saved)) =
                        (out, serde_json::from_value::<SavedFile>(value.clone()))
                    {
                        std::fs::create_dir_all(dir)?;
                        let path = write_saved(dir, &saved)?;
                        if verbose {
                            println!("    {} {}", "wrote".bright_black(), path.display());
                        }
                    }
                }
                Err(e) => {
                    failures += 1;
                    println!("  {} {}: {}", "failed".red(), outcome.method, e);
                }
            }
        }

        let report = session.begin_new_run().await?;
        println!(
            "{} {}  {} steps in {:.2?}  freed {}",
            "run".bright_black(),
            pass.to_string().cyan(),
            outcomes.len(),
            total,
            report.freed.to_string().yellow(),
        );
    }

    let stats = session.cache_stats().await?;
    println!(
        "{} live handles {}, memoized calls {}, memo hits {}",
        "Done:".bold(),
        stats.live_handles,
        stats.memoized_calls,
        stats.memo_hits
    );
    session.shutdown().await?;

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

fn write_saved(dir: &Path, saved: &SavedFile) -> Result<PathBuf> {
    let name = Path::new(&saved.file_name)
        .file_name()
        .context("saved file has no file name")?;
    let path = dir.join(name);
    let bytes = match saved.encoding {
        FileEncoding::Base64 => BASE64
            .decode(&saved.content)
            .context("saved file is not valid base64")?,
        FileEncoding::Text => saved.content.clone().into_bytes(),
    };
    std::fs::write(&path, bytes).with_context(|| format!("Failed to write {:?}", path))?;
    Ok(path)
}
