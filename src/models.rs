//! Core data structures and types for rainfall analysis.
//!
//! Defines the loaded table, the trends derived from it and the chart kinds
//! the engine can render.

use crate::error::RainflowError;
use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// One row of the loaded dataset
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub timestamp: Option<NaiveDateTime>,
    /// Missing cells stay `None` and are skipped by every statistic
    pub rainfall: Option<f64>,
}

impl Observation {
    pub fn new(timestamp: Option<NaiveDateTime>, rainfall: Option<f64>) -> Self {
        Self {
            timestamp,
            rainfall,
        }
    }
}

/// In-memory rainfall dataset
///
/// When built with a time index the rows are kept in chronological order;
/// rows sharing a timestamp keep their file order.
#[derive(Debug, Clone)]
pub struct Table {
    columns: Vec<String>,
    rows: Vec<Observation>,
    time_indexed: bool,
}

impl Table {
    /// Build a table from rows without a time index
    pub fn new(columns: Vec<String>, rows: Vec<Observation>) -> Self {
        Self {
            columns,
            rows,
            time_indexed: false,
        }
    }

    /// Build a table indexed by timestamp
    ///
    /// Every row must carry a timestamp; the loader guarantees this.
    pub fn with_time_index(columns: Vec<String>, mut rows: Vec<Observation>) -> Self {
        rows.sort_by_key(|row| row.timestamp);
        Self {
            columns,
            rows,
            time_indexed: true,
        }
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Column names as they appeared in the source header
    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[Observation] {
        &self.rows
    }

    /// Whether rows can be grouped by month and addressed by day
    pub fn has_time_index(&self) -> bool {
        self.time_indexed
    }

    /// Present rainfall values in table order
    pub fn rainfall_values(&self) -> Vec<f64> {
        self.rows.iter().filter_map(|row| row.rainfall).collect()
    }

    /// The last `n` rows in index order
    pub fn tail(&self, n: usize) -> &[Observation] {
        let start = self.rows.len().saturating_sub(n);
        &self.rows[start..]
    }
}

/// Scalar finding attached to a trend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TrendValue {
    Count(u64),
    Text(String),
}

impl fmt::Display for TrendValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TrendValue::Count(count) => write!(f, "{}", count),
            TrendValue::Text(text) => f.write_str(text),
        }
    }
}

/// One named, described insight derived from the table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub name: String,
    pub description: String,
    pub value: TrendValue,
}

impl Trend {
    pub fn new(name: impl Into<String>, description: impl Into<String>, value: TrendValue) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            value,
        }
    }
}

/// Visualizations the engine knows how to draw
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    BasicStats,
    ExtremeEvents,
    TimeSeries,
}

impl ChartKind {
    pub const ALL: [ChartKind; 3] = [
        ChartKind::BasicStats,
        ChartKind::ExtremeEvents,
        ChartKind::TimeSeries,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartKind::BasicStats => "basic_stats",
            ChartKind::ExtremeEvents => "extreme_events",
            ChartKind::TimeSeries => "time_series",
        }
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChartKind {
    type Err = RainflowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic_stats" => Ok(ChartKind::BasicStats),
            "extreme_events" => Ok(ChartKind::ExtremeEvents),
            "time_series" => Ok(ChartKind::TimeSeries),
            other => Err(RainflowError::UnsupportedChart {
                kind: other.to_string(),
            }),
        }
    }
}
