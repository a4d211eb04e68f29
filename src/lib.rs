//! Rainflow Analytics Library
//!
//! Loads a rainfall time series from CSV, derives a fixed set of descriptive
//! trends and renders them as PNG charts for embedding in reports.
//!
//! This library provides tools for:
//! - Loading CSV data with an optional timestamp index
//! - Computing basic statistics, the wettest month, extreme events and dry days
//! - Rendering bar and line charts to base64-encoded PNG
//! - Composing JSON payloads and reports for a front end

pub mod analysis;
pub mod chart;
pub mod config;
pub mod constants;
pub mod error;
pub mod loader;
pub mod models;
pub mod response;
pub mod session;
pub mod stats;

// CLI modules
pub mod cli {
    pub mod args;
    pub mod commands;
}

// Re-export commonly used types
pub use analysis::{TrendAnalysis, TrendEngine};
pub use chart::{ChartRenderer, RenderedChart};
pub use config::AnalyticsConfig;
pub use error::{ErrorCategory, RainflowError, Result};
pub use models::{ChartKind, Observation, Table, Trend, TrendValue};
pub use session::AnalysisSession;
