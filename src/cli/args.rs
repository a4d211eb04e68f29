//! Command-line interface components.

use crate::config::AnalyticsConfig;
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(name = "rainflow")]
#[command(about = "Analyze rainfall CSV data: trends, charts and JSON reports")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
    #[command(subcommand)]
    pub command: Command,

    /// Increase logging verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Only log errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,

    /// TOML configuration file
    #[arg(long, value_name = "FILE", global = true)]
    pub config: Option<PathBuf>,

    /// Quantile above which a day counts as an extreme event
    #[arg(long, value_name = "Q", global = true)]
    pub extreme_quantile: Option<f64>,

    /// Number of most recent rows on the time series chart
    #[arg(long, value_name = "ROWS", global = true)]
    pub window: Option<usize>,

    /// Chart width in pixels
    #[arg(long, global = true)]
    pub width: Option<u32>,

    /// Chart height in pixels
    #[arg(long, global = true)]
    pub height: Option<u32>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Load a CSV and report the number of rows
    Load {
        #[arg(value_name = "CSV")]
        csv: PathBuf,
    },

    /// Identify trends in a CSV
    Analyze {
        #[arg(value_name = "CSV")]
        csv: PathBuf,
    },

    /// Render a chart (basic_stats, extreme_events, time_series)
    Visualize {
        #[arg(value_name = "CSV")]
        csv: PathBuf,

        /// Chart kind
        #[arg(short, long)]
        kind: String,

        /// Also write the raw PNG to this file
        #[arg(long, value_name = "FILE")]
        png: Option<PathBuf>,
    },

    /// Compose the full analysis report
    Report {
        #[arg(value_name = "CSV")]
        csv: PathBuf,

        /// Write the report to a file, or into a directory with a dated name
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Load, analyze, render every chart and write the report
    Dashboard {
        #[arg(value_name = "CSV")]
        csv: PathBuf,

        /// Directory receiving the PNG charts and the report
        #[arg(short, long)]
        output_dir: PathBuf,
    },
}

impl Command {
    pub fn csv_path(&self) -> &Path {
        match self {
            Command::Load { csv }
            | Command::Analyze { csv }
            | Command::Visualize { csv, .. }
            | Command::Report { csv, .. }
            | Command::Dashboard { csv, .. } => csv,
        }
    }
}

impl Args {
    pub fn get_log_level(&self) -> &'static str {
        if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => "warn",
                1 => "info",
                2 => "debug",
                _ => "trace",
            }
        }
    }

    /// Apply command-line overrides on top of a loaded configuration
    pub fn apply_overrides(&self, mut config: AnalyticsConfig) -> AnalyticsConfig {
        if let Some(quantile) = self.extreme_quantile {
            config = config.with_extreme_quantile(quantile);
        }
        if let Some(window) = self.window {
            config = config.with_recent_window(window);
        }
        if let Some(width) = self.width {
            config.chart.width = width;
        }
        if let Some(height) = self.height {
            config.chart.height = height;
        }
        config
    }
}
