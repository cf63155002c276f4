//! SonoLHC CLI
//!
//! Turn a HYPATIA event export into one sound file and one plot per event.

use anyhow::{Context, Result};
use clap::Parser;
use sonolhc_cli::{logging, AppConfig, EventRunner, RunOptions};
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::FmtSubscriber;

#[cfg(feature = "visualization")]
use sonolhc_render::rerun_plot::RerunPlotter;

/// Sonify LHC collision events
#[derive(Parser, Debug)]
#[command(name = "sonolhc")]
#[command(about = "Render LHC collision events as sound and 3D plots", long_about = None)]
struct Args {
    /// HYPATIA text export to read
    input: PathBuf,

    /// Directory for the generated files
    #[arg(short, long, default_value = "sonolhc-outputs")]
    output_dir: PathBuf,

    /// JSON file overriding matching, synth and figure settings
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Skip the PNG plots
    #[arg(long)]
    no_plot: bool,

    /// Skip the WAV files
    #[arg(long)]
    no_audio: bool,

    /// Also write the recorded plot scene of each event as JSON
    #[arg(long)]
    scene_json: bool,

    /// JSON summary on stdout
    #[arg(long)]
    json: bool,

    /// Verbose output (ignored when RUST_LOG is set)
    #[arg(short, long)]
    verbose: bool,

    /// Save every event scene to a Rerun recording
    #[cfg(feature = "visualization")]
    #[arg(long)]
    rerun: Option<String>,
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging (stderr, so --json output stays clean)
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(logging::env_filter(args.verbose))
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set tracing subscriber")?;

    info!("SonoLHC v{}", env!("CARGO_PKG_VERSION"));

    let config = match &args.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };

    let options = RunOptions {
        output_dir: args.output_dir.clone(),
        plot: !args.no_plot,
        audio: !args.no_audio,
        scene_json: args.scene_json,
    };

    #[allow(unused_mut)]
    let mut runner = EventRunner::new(config, options);

    #[cfg(feature = "visualization")]
    if let Some(path) = &args.rerun {
        let plotter = RerunPlotter::to_file("sonolhc", path)
            .with_context(|| format!("Failed to open Rerun recording {}", path))?;
        runner = runner.with_rerun(plotter);
        info!("Streaming scenes to {}", path);
    }

    let report = runner.run_file(&args.input)?;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        info!("━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━");
        info!(
            "✅ {} events, {} entities rendered into {}",
            report.events.len(),
            report.entity_count(),
            args.output_dir.display()
        );
        if report.anomalies() > 0 {
            warn!("{} tracks pointed at more than one cluster", report.anomalies());
        }
    }

    Ok(())
}
