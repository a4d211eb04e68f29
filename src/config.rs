//! Configuration management and validation.
//!
//! Provides the analysis settings (column names, statistical thresholds and
//! chart layout) with defaults that reproduce the standard report, plus
//! loading from a TOML file.

use crate::constants::*;
use crate::error::{RainflowError, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::debug;

/// Chart canvas settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    /// Canvas width in pixels
    pub width: u32,

    /// Canvas height in pixels
    pub height: u32,

    /// Requested rotation of date labels on the time series chart (degrees)
    pub label_rotation: u16,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: DEFAULT_CHART_WIDTH,
            height: DEFAULT_CHART_HEIGHT,
            label_rotation: DEFAULT_LABEL_ROTATION,
        }
    }
}

/// Settings for loading, trend analysis and rendering
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalyticsConfig {
    /// Name of the required measurement column
    pub rainfall_column: String,

    /// Name of the optional timestamp column
    pub timestamp_column: String,

    /// Quantile used as the extreme event threshold
    pub extreme_quantile: f64,

    /// Maximum bars on the extreme events chart
    pub max_extreme_bars: usize,

    /// Rows shown on the time series chart
    pub recent_window: usize,

    /// Headline figure reported as interpretation time saved
    pub time_saved_label: String,

    pub chart: ChartConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            rainfall_column: RAINFALL_COLUMN.to_string(),
            timestamp_column: TIMESTAMP_COLUMN.to_string(),
            extreme_quantile: DEFAULT_EXTREME_QUANTILE,
            max_extreme_bars: DEFAULT_MAX_EXTREME_BARS,
            recent_window: DEFAULT_RECENT_WINDOW,
            time_saved_label: DEFAULT_TIME_SAVED_LABEL.to_string(),
            chart: ChartConfig::default(),
        }
    }
}

impl AnalyticsConfig {
    /// Load configuration from a TOML file, filling unset keys with defaults
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AnalyticsConfig =
            toml::from_str(&contents).map_err(|e| RainflowError::Configuration {
                message: format!("{}: {}", path.display(), e),
            })?;
        debug!("Loaded configuration from {}", path.display());
        config.validate()?;
        Ok(config)
    }

    /// Use a different extreme event quantile
    pub fn with_extreme_quantile(mut self, quantile: f64) -> Self {
        self.extreme_quantile = quantile;
        self
    }

    /// Use a different time series window
    pub fn with_recent_window(mut self, window: usize) -> Self {
        self.recent_window = window;
        self
    }

    /// Use a different chart canvas size
    pub fn with_chart_size(mut self, width: u32, height: u32) -> Self {
        self.chart.width = width;
        self.chart.height = height;
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.rainfall_column.trim().is_empty() {
            return Err(RainflowError::Configuration {
                message: "rainfall_column must not be empty".to_string(),
            });
        }

        if self.rainfall_column == self.timestamp_column {
            return Err(RainflowError::Configuration {
                message: "rainfall_column and timestamp_column must differ".to_string(),
            });
        }

        if !(0.0..=1.0).contains(&self.extreme_quantile) {
            return Err(RainflowError::Configuration {
                message: format!(
                    "extreme_quantile must be within [0, 1], got {}",
                    self.extreme_quantile
                ),
            });
        }

        if self.recent_window == 0 || self.max_extreme_bars == 0 {
            return Err(RainflowError::Configuration {
                message: "recent_window and max_extreme_bars must be positive".to_string(),
            });
        }

        // Plotters needs room for the label areas and margins
        if self.chart.width < 200 || self.chart.height < 150 {
            return Err(RainflowError::Configuration {
                message: format!(
                    "chart size {}x{} is too small (minimum 200x150)",
                    self.chart.width, self.chart.height
                ),
            });
        }

        Ok(())
    }
}
