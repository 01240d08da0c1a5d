//! CLI argument definitions and shared statics.

use clap::{ArgAction, Args, Parser, Subcommand};
use std::path::PathBuf;
use std::sync::OnceLock;

pub static FILE_GUARD: OnceLock<tracing_appender::non_blocking::WorkerGuard> = OnceLock::new();
/// Whether the user asked for JSON output (controls structured error output).
pub static JSON_MODE: OnceLock<bool> = OnceLock::new();

#[derive(Parser, Debug)]
#[command(name = "enrich", version, about = "Transient fuel enrichment replay tool")]
pub struct Cli {
    /// Path to config TOML (typed); built-in defaults when omitted
    #[arg(long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Throttle table CSV (strict header: from,to,extra_ms); overrides [throttle.table]
    #[arg(long, value_name = "FILE")]
    pub table: Option<PathBuf>,

    /// Load taper CSV (strict header: distance,mult); overrides load.taper_*
    #[arg(long, value_name = "FILE")]
    pub taper: Option<PathBuf>,

    /// Emit JSON lines instead of text
    #[arg(long, action = ArgAction::SetTrue)]
    pub json: bool,

    /// Console log level (error|warn|info|debug|trace); falls back to [logging] level
    #[arg(long = "log-level", value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Command to execute
    #[command(subcommand)]
    pub cmd: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a recorded sensor trace and print the corrections per tick
    Replay(ReplayOpts),
    /// Print the effective enrichment parameters
    Info,
}

/// Runtime overrides, applied after the strategies are built.
#[derive(Args, Debug, Default, Clone)]
pub struct ReplayOpts {
    /// Trace CSV (strict header: tps,load,cycle_end)
    #[arg(long, value_name = "FILE")]
    pub trace: PathBuf,

    /// TPS history length; out-of-range values are rejected and the configured length kept
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub tps_accel_len: Option<i64>,

    /// Load history length; out-of-range values are rejected and the configured length kept
    #[arg(long, value_name = "N", allow_negative_numbers = true)]
    pub load_accel_len: Option<i64>,

    /// TPS rise per sample (%) that triggers the table enrichment
    #[arg(long, value_name = "X")]
    pub tps_accel_thr: Option<f32>,

    /// TPS drop per sample (%) that triggers the decel enleanment
    #[arg(long, value_name = "X")]
    pub tps_decel_thr: Option<f32>,

    /// ms removed per % of TPS drop
    #[arg(long, value_name = "X")]
    pub tps_decel_mult: Option<f32>,

    #[arg(long, value_name = "X")]
    pub load_accel_thr: Option<f32>,

    #[arg(long, value_name = "X")]
    pub load_accel_mult: Option<f32>,

    #[arg(long, value_name = "X")]
    pub load_decel_thr: Option<f32>,

    #[arg(long, value_name = "X")]
    pub load_decel_mult: Option<f32>,

    /// Print per-tick latency stats
    #[arg(long, action = ArgAction::SetTrue)]
    pub stats: bool,
}
