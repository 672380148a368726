use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Result, bail};
use clap::{Args, Parser, Subcommand};

use ekslogs_logs::{DEFAULT_TAIL_INTERVAL, DEFAULT_TICK_LIMIT, FilterPresets, Preset};
use ekslogs_output::{ColorMode, OutputFormat};

use crate::config::Config;

/// ekslogs - Retrieve and monitor EKS control plane logs
#[derive(Parser, Debug)]
#[command(name = "ekslogs")]
#[command(author, version, about, long_about = None)]
#[command(args_conflicts_with_subcommands = true, subcommand_negates_reqs = true)]
#[command(after_help = "Examples:
  ekslogs my-cluster                          Get all logs from the past hour
  ekslogs my-cluster api audit -f -F error    Follow API and audit errors
  ekslogs my-cluster -s -1h -e now            Get logs from a time range
  ekslogs my-cluster -p api-errors            Use a filter preset
  ekslogs my-cluster -F volume -I health      Include volume logs, exclude health checks")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,

    #[command(flatten)]
    pub logs: LogsArgs,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Print version information
    Version,
    /// Show the available log types and their aliases
    Logtypes,
    /// List filter presets
    Presets {
        /// Show only advanced presets
        #[arg(long)]
        advanced: bool,
        /// Show basic and advanced presets
        #[arg(long, conflicts_with = "advanced")]
        all: bool,
    },
}

#[derive(Args, Debug, Default)]
pub struct LogsArgs {
    /// EKS cluster name
    #[arg(value_name = "CLUSTER", required = true)]
    pub cluster: Option<String>,

    /// Log types: api, audit, auth, kcm, ccm, scheduler (default: all available)
    #[arg(value_name = "LOG_TYPE")]
    pub log_types: Vec<String>,

    /// AWS region
    #[arg(short, long)]
    pub region: Option<String>,

    /// Start time (RFC3339 or relative: -1h, -15m, -30s, -2d)
    #[arg(short = 's', long, allow_hyphen_values = true)]
    pub start_time: Option<String>,

    /// End time (RFC3339, relative, or "now")
    #[arg(short = 'e', long, allow_hyphen_values = true)]
    pub end_time: Option<String>,

    /// Filter pattern; repeat for AND
    #[arg(short = 'F', long = "filter-pattern", value_name = "PATTERN")]
    pub include: Vec<String>,

    /// Ignore pattern; repeat for OR
    #[arg(
        short = 'I',
        long = "ignore-filter-pattern",
        value_name = "PATTERN",
        allow_hyphen_values = true
    )]
    pub exclude: Vec<String>,

    /// Use a filter preset (see 'ekslogs presets')
    #[arg(short, long)]
    pub preset: Option<String>,

    /// Maximum number of entries to retrieve (default: unlimited)
    #[arg(short, long)]
    pub limit: Option<usize>,

    /// Continuously monitor logs
    #[arg(short, long)]
    pub follow: bool,

    /// Polling interval for follow mode, e.g. 500ms, 2s, 1m (bare numbers are seconds)
    #[arg(long, value_name = "DURATION", value_parser = parse_interval)]
    pub interval: Option<Duration>,

    /// Print only the log message
    #[arg(short, long)]
    pub message_only: bool,

    /// Color output: auto, always, never
    #[arg(long, value_name = "MODE")]
    pub color: Option<ColorMode>,

    /// Output format: text, json
    #[arg(short, long, value_name = "FORMAT")]
    pub output: Option<OutputFormat>,

    /// Verbose output
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file path
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Effective settings after merging flags, config file and defaults
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub region: Option<String>,
    pub color: ColorMode,
    pub interval: Duration,
    pub message_only: bool,
    pub output: OutputFormat,
    pub tail_limit: usize,
}

impl Settings {
    pub fn resolve(args: &LogsArgs, config: &Config) -> Self {
        Self {
            region: args.region.clone().or_else(|| config.region.clone()),
            color: args.color.or(config.color).unwrap_or_default(),
            interval: args
                .interval
                .or(config.interval)
                .unwrap_or(DEFAULT_TAIL_INTERVAL),
            message_only: args.message_only || config.message_only.unwrap_or(false),
            output: args.output.or(config.output).unwrap_or_default(),
            tail_limit: config.tail_limit.unwrap_or(DEFAULT_TICK_LIMIT),
        }
    }
}

/// Patterns and log types after applying a preset.
/// A preset only fills in what the user left empty.
/// Parse a positive polling interval
fn parse_interval(s: &str) -> std::result::Result<Duration, String> {
    let interval = match s.parse::<u64>() {
        Ok(secs) => Duration::from_secs(secs),
        Err(_) => humantime::parse_duration(s).map_err(|e| e.to_string())?,
    };
    if interval.is_zero() {
        return Err("interval must be greater than zero".to_string());
    }
    Ok(interval)
}

pub fn apply_preset(
    preset: Option<&str>,
    includes: Vec<String>,
    log_types: Vec<String>,
) -> Result<(Vec<String>, Vec<String>, Option<&'static Preset>)> {
    let Some(name) = preset else {
        return Ok((includes, log_types, None));
    };
    let Some(preset) = FilterPresets::get(name) else {
        bail!(
            "preset filter '{}' not found. Run 'ekslogs presets' to see available presets",
            name
        );
    };

    let includes = if includes.is_empty() {
        vec![preset.pattern.to_string()]
    } else {
        includes
    };
    let log_types = if log_types.is_empty() {
        preset.log_types.iter().map(|t| t.to_string()).collect()
    } else {
        log_types
    };
    Ok((includes, log_types, Some(preset)))
}
