//! # Mecha Sim Binary
//!
//! Runs a force-regulation loop on a simulated rig.
//!
//! # Usage
//!
//! ```bash
//! # 5 s at 1 kHz, regulating 5 N
//! mecha_sim --config config/rig.toml --ticks 5000 --target-force 5
//!
//! # Wall-clock paced, JSON logs
//! mecha_sim -c config/rig.toml --realtime --json
//! ```

#![deny(warnings)]

use clap::Parser;
use mecha_common::config::{ConfigLoader, LogLevel};
use mecha_common::rig::RigConfig;
use mecha_sim::SimRig;
use std::path::PathBuf;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

/// Mecha Sim - force control against a simulated spring contact
#[derive(Parser, Debug)]
#[command(name = "mecha_sim")]
#[command(author = "RTS007")]
#[command(version)]
#[command(about = "Force control loop on a simulated haptic rig")]
#[command(long_about = None)]
struct Args {
    /// Rig configuration file (devices, PID and [plant] tables).
    #[arg(short, long, default_value = "config/rig.toml")]
    config: PathBuf,

    /// Number of control cycles to run.
    #[arg(short, long, default_value_t = 5000)]
    ticks: u32,

    /// Contact force setpoint [N].
    #[arg(long, default_value_t = 5.0)]
    target_force: f64,

    /// Sleep out each cycle instead of running as fast as possible
    #[arg(long)]
    realtime: bool,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    /// Output logs in JSON format
    #[arg(long)]
    json: bool,
}

fn main() {
    if let Err(e) = run() {
        error!("Simulation failed: {}", e);
        std::process::exit(1);
    }
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Log level comes from [shared] when the file parses; load errors are
    // reported again, with tracing up, by SimRig::load.
    let log_level = RigConfig::load(&args.config)
        .map(|rig| rig.shared.log_level)
        .unwrap_or_default();
    setup_tracing(&args, log_level);

    info!("Mecha Sim v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Loading rig from {}", args.config.display());

    let mut rig = SimRig::load(&args.config)?;
    let summary = rig.run(args.ticks, args.target_force, args.realtime)?;

    info!(
        "Done: {} ticks, force {:.3} N (target {} N), settled error {:.4} N, peak current {:.3} A",
        summary.ticks,
        summary.final_force,
        args.target_force,
        summary.settled_error,
        summary.peak_current
    );
    if summary.throttled_ticks > 0 {
        warn!("Motor limiter throttled {} ticks", summary.throttled_ticks);
    }
    if summary.timing_violations > 0 {
        warn!("{} cycles overran the cycle time", summary.timing_violations);
    }
    Ok(())
}

/// Setup tracing subscriber based on CLI arguments and the rig's log level.
fn setup_tracing(args: &Args, log_level: LogLevel) {
    let directive = if args.verbose {
        LogLevel::Debug.as_directive()
    } else {
        log_level.as_directive()
    };

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directive));

    if args.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}
