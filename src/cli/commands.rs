//! Command implementations behind the CLI.
//!
//! Every command loads the CSV into a fresh [`AnalysisSession`], performs its
//! request and prints the JSON payload to stdout. The returned flag tells
//! `main` whether the payload was a success or an error body.

use crate::cli::args::{Args, Command};
use crate::config::AnalyticsConfig;
use crate::constants::REPORT_FILE_PREFIX;
use crate::models::ChartKind;
use crate::response;
use crate::session::AnalysisSession;
use anyhow::{Context, Result};
use chrono::Local;
use colored::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Run the parsed command; `Ok(false)` means an error payload was emitted
pub fn run(args: Args) -> Result<bool> {
    setup_logging(&args);

    let config = load_configuration(&args)?;
    let mut session = AnalysisSession::new(config);
    let pretty = args.pretty;

    let loaded = match response::load(&mut session, args.command.csv_path()) {
        Ok(body) => body,
        Err(body) => {
            emit(&body, pretty)?;
            return Ok(false);
        }
    };

    match &args.command {
        Command::Load { .. } => {
            emit(&loaded, pretty)?;
            Ok(true)
        }
        Command::Analyze { .. } => match response::analyze(&mut session) {
            Ok(body) => {
                emit(&body, pretty)?;
                Ok(true)
            }
            Err(body) => {
                emit(&body, pretty)?;
                Ok(false)
            }
        },
        Command::Visualize { kind, png, .. } => visualize(&session, kind, png.as_deref(), pretty),
        Command::Report { output, .. } => report(&mut session, output.as_deref(), pretty),
        Command::Dashboard { output_dir, .. } => dashboard(&mut session, output_dir),
    }
}

/// Set up structured logging based on CLI arguments
fn setup_logging(args: &Args) {
    use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

    let log_level = args.get_log_level();

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("rainflow_analytics={}", log_level)));

    // A subscriber may already be installed when run from tests
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_target(false)
                .with_level(true)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .try_init();

    debug!("Logging initialized at level: {}", log_level);
}

/// Load configuration from file (if given) then apply CLI overrides
fn load_configuration(args: &Args) -> Result<AnalyticsConfig> {
    let base = match &args.config {
        Some(path) => {
            info!("Using config file: {}", path.display());
            AnalyticsConfig::from_file(path)
                .with_context(|| format!("Failed to load config {}", path.display()))?
        }
        None => AnalyticsConfig::default(),
    };

    let config = args.apply_overrides(base);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

fn emit<T: Serialize>(body: &T, pretty: bool) -> Result<()> {
    let text = if pretty {
        serde_json::to_string_pretty(body)?
    } else {
        serde_json::to_string(body)?
    };
    println!("{}", text);
    Ok(())
}

fn visualize(
    session: &AnalysisSession,
    kind: &str,
    png: Option<&Path>,
    pretty: bool,
) -> Result<bool> {
    let body = match response::visualize(session, kind) {
        Ok(body) => body,
        Err(body) => {
            emit(&body, pretty)?;
            return Ok(false);
        }
    };

    if let Some(path) = png {
        // Re-render rather than decode the base64 payload
        let chart = session.render(kind.parse::<ChartKind>()?)?;
        fs::write(path, chart.png_bytes())
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!("Wrote {} chart to {}", kind, path.display());
    }

    emit(&body, pretty)?;
    Ok(true)
}

fn report(session: &mut AnalysisSession, output: Option<&Path>, pretty: bool) -> Result<bool> {
    let body = response::report(session, Local::now().naive_local());

    let Some(output) = output else {
        emit(&body, pretty)?;
        return Ok(true);
    };

    match write_report(&body, output) {
        Ok(path) => {
            info!("Report written to {}", path.display());
            emit(&body, pretty)?;
            Ok(true)
        }
        Err(e) => {
            emit(&response::report_error(format!("{:#}", e)), pretty)?;
            Ok(false)
        }
    }
}

/// Write a report as pretty JSON; directories get a dated file name
fn write_report(body: &response::Report, output: &Path) -> Result<PathBuf> {
    let path = if output.is_dir() {
        output.join(report_file_name(&Local::now().date_naive()))
    } else {
        output.to_path_buf()
    };

    let json = serde_json::to_string_pretty(body)?;
    fs::write(&path, json).with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(path)
}

fn report_file_name(date: &chrono::NaiveDate) -> String {
    format!("{}-{}.json", REPORT_FILE_PREFIX, date.format("%Y-%m-%d"))
}

fn dashboard(session: &mut AnalysisSession, output_dir: &Path) -> Result<bool> {
    fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;

    println!("{}", "Rainflow Analysis".bright_green().bold());
    match response::analyze(session) {
        Ok(analysis) => {
            println!(
                "  {} {}",
                "Data points:".bright_cyan(),
                analysis.data_points.to_string().bright_white().bold()
            );
            println!(
                "  {} {}",
                "Trends identified:".bright_cyan(),
                analysis.total_trends.to_string().bright_white().bold()
            );
            for trend in &analysis.trends {
                println!("    {} {}", format!("{}:", trend.name).bright_yellow(), trend.description);
            }
        }
        Err(body) => println!("  {}", body.error.bright_red()),
    }

    println!("\n{}", "Charts".bright_green().bold());
    let mut failed = Vec::new();
    for kind in ChartKind::ALL {
        let path = output_dir.join(format!("{}.png", kind));
        match session.render(kind) {
            Ok(chart) => {
                fs::write(&path, chart.png_bytes())
                    .with_context(|| format!("Failed to write {}", path.display()))?;
                let note = if chart.has_series() { "" } else { " (no data)" };
                println!("  {} {}{}", "Wrote".bright_cyan(), path.display(), note.bright_black());
            }
            Err(e) => {
                println!("  {} {}: {}", "Failed".bright_red(), kind, e);
                failed.push(kind);
            }
        }
    }

    let body = response::report(session, Local::now().naive_local());
    let report_path = write_report(&body, output_dir)?;
    println!(
        "\n  {} {}",
        "Report:".bright_cyan(),
        report_path.display().to_string().bright_white()
    );

    if !failed.is_empty() {
        let message = format!("{} chart(s) could not be generated", failed.len());
        eprintln!("{}", message.bright_red());
        return Ok(false);
    }

    Ok(true)
}
