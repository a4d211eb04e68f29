//! Transport payloads for load, analyze, visualize and report requests.
//!
//! Each function drives an [`AnalysisSession`] and returns the structured
//! body a front end consumes. Failures become an [`ErrorResponse`] whose
//! message carries no internal detail beyond what the user can act on.

use crate::constants::messages;
use crate::models::Trend;
use crate::session::AnalysisSession;
use chrono::{NaiveDateTime, Timelike};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Successful response or a user-facing error body
pub type Reply<T> = std::result::Result<T, ErrorResponse>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadResponse {
    pub message: String,
    pub rows: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalyzeResponse {
    pub trends: Vec<Trend>,
    pub total_trends: usize,
    pub data_points: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualizationResponse {
    pub plot_type: String,
    /// Base64-encoded PNG
    pub image_data: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    pub generated_at: String,
    pub total_data_points: usize,
    pub trends_identified: usize,
    pub analysis_summary: Vec<Trend>,
    pub interpretation_time_saved: String,
}

/// Load a CSV file into the session
pub fn load(session: &mut AnalysisSession, path: &Path) -> Reply<LoadResponse> {
    session
        .load_path(path)
        .map(|rows| LoadResponse {
            message: messages::LOAD_SUCCESS.to_string(),
            rows,
        })
        .map_err(|_| ErrorResponse::new(messages::LOAD_FAILURE))
}

/// Load CSV content already in memory into the session
pub fn load_bytes(session: &mut AnalysisSession, bytes: Vec<u8>) -> Reply<LoadResponse> {
    session
        .load_bytes(bytes)
        .map(|rows| LoadResponse {
            message: messages::LOAD_SUCCESS.to_string(),
            rows,
        })
        .map_err(|_| ErrorResponse::new(messages::LOAD_FAILURE))
}

/// Analyze the current table
///
/// Partial results are still a success; a fault that left no trends at all
/// becomes an analysis error.
pub fn analyze(session: &mut AnalysisSession) -> Reply<AnalyzeResponse> {
    let analysis = session.analyze_trends();
    if let (Some(fault), true) = (&analysis.fault, analysis.trends.is_empty()) {
        return Err(analysis_error(fault));
    }

    Ok(AnalyzeResponse {
        total_trends: analysis.trends.len(),
        data_points: session.data_points(),
        trends: analysis.trends,
    })
}

/// Render a chart by kind name
pub fn visualize(session: &AnalysisSession, kind: &str) -> Reply<VisualizationResponse> {
    session
        .render_kind(kind)
        .map(|chart| VisualizationResponse {
            plot_type: kind.to_string(),
            image_data: chart.to_base64(),
        })
        .ok_or_else(|| ErrorResponse::new(messages::VISUALIZATION_FAILURE))
}

/// Compose the full report stamped with `generated_at`
pub fn report(session: &mut AnalysisSession, generated_at: NaiveDateTime) -> Report {
    let analysis = session.analyze_trends();
    Report {
        generated_at: iso_timestamp(&generated_at),
        total_data_points: session.data_points(),
        trends_identified: analysis.trends.len(),
        analysis_summary: analysis.trends,
        interpretation_time_saved: session.config().time_saved_label.clone(),
    }
}

/// ISO 8601 timestamp with microseconds only when they are non-zero
fn iso_timestamp(at: &NaiveDateTime) -> String {
    if at.nanosecond() / 1_000 == 0 {
        at.format("%Y-%m-%dT%H:%M:%S").to_string()
    } else {
        at.format("%Y-%m-%dT%H:%M:%S%.6f").to_string()
    }
}

/// Error body for a failed analysis request
pub fn analysis_error(detail: impl std::fmt::Display) -> ErrorResponse {
    ErrorResponse::new(format!("{}: {}", messages::ANALYSIS_ERROR_PREFIX, detail))
}

/// Error body for a failed report request
pub fn report_error(detail: impl std::fmt::Display) -> ErrorResponse {
    ErrorResponse::new(format!("{}: {}", messages::REPORT_ERROR_PREFIX, detail))
}
