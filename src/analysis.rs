//! Trend analysis over a loaded rainfall table.
//!
//! Computes the fixed battery of findings in order: basic statistics,
//! seasonal pattern (time-indexed tables only), extreme events and dry days.
//! A fault in any step stops the remaining steps; whatever was computed
//! before the fault is still returned.

use crate::config::AnalyticsConfig;
use crate::constants::trend_names;
use crate::error::{RainflowError, Result};
use crate::models::{Table, Trend, TrendValue};
use crate::stats::{self, Summary};
use tracing::{debug, error};

/// Outcome of one analysis run
#[derive(Debug)]
pub struct TrendAnalysis {
    pub trends: Vec<Trend>,
    /// Fault that cut the run short, if any
    pub fault: Option<RainflowError>,
}

impl TrendAnalysis {
    fn empty() -> Self {
        Self {
            trends: Vec::new(),
            fault: None,
        }
    }

    /// True when every applicable step ran
    pub fn is_complete(&self) -> bool {
        self.fault.is_none()
    }
}

/// Computes trends from a table
#[derive(Debug, Clone)]
pub struct TrendEngine {
    rainfall_column: String,
    extreme_quantile: f64,
}

impl Default for TrendEngine {
    fn default() -> Self {
        Self::new(&AnalyticsConfig::default())
    }
}

impl TrendEngine {
    pub fn new(config: &AnalyticsConfig) -> Self {
        Self {
            rainfall_column: config.rainfall_column.clone(),
            extreme_quantile: config.extreme_quantile,
        }
    }

    /// Quantile used for extreme events, shared with the chart renderer
    pub fn extreme_quantile(&self) -> f64 {
        self.extreme_quantile
    }

    /// Run every step against the table
    ///
    /// A missing or empty table yields no trends and no fault.
    pub fn analyze(&self, table: Option<&Table>) -> TrendAnalysis {
        let Some(table) = table.filter(|t| !t.is_empty()) else {
            debug!("No data loaded, skipping trend analysis");
            return TrendAnalysis::empty();
        };

        let mut trends = Vec::new();
        let fault = self.run_steps(table, &mut trends).err();

        if let Some(e) = &fault {
            error!(
                "Error in trend analysis after {} trends: {}",
                trends.len(),
                e
            );
        }

        debug!("Identified {} trends over {} rows", trends.len(), table.len());
        TrendAnalysis { trends, fault }
    }

    fn run_steps(&self, table: &Table, trends: &mut Vec<Trend>) -> Result<()> {
        let values = table.rainfall_values();

        trends.push(self.basic_statistics(&values)?);

        if table.has_time_index() {
            trends.push(self.seasonal_pattern(table)?);
        }

        trends.push(self.extreme_events(&values)?);
        trends.push(dry_days(&values));

        Ok(())
    }

    fn basic_statistics(&self, values: &[f64]) -> Result<Trend> {
        let summary = Summary::compute(values).ok_or_else(|| self.no_values())?;

        Ok(Trend::new(
            trend_names::BASIC_STATISTICS,
            format!(
                "Average: {:.2}mm, Max: {:.2}mm, Min: {:.2}mm",
                summary.mean, summary.max, summary.min
            ),
            TrendValue::Text(format!("{:.2}", summary.mean)),
        ))
    }

    fn seasonal_pattern(&self, table: &Table) -> Result<Trend> {
        let means = stats::monthly_means(table);
        let (month, average) = stats::wettest_month(&means).ok_or_else(|| self.no_values())?;

        Ok(Trend::new(
            trend_names::SEASONAL_PATTERN,
            format!(
                "Wettest month is month #{} with {:.2}mm average",
                month, average
            ),
            TrendValue::Count(u64::from(month)),
        ))
    }

    fn extreme_events(&self, values: &[f64]) -> Result<Trend> {
        let threshold = self.extreme_threshold(values)?;
        let count = stats::exceedances(values, threshold).len();

        Ok(Trend::new(
            trend_names::EXTREME_EVENTS,
            format!(
                "Found {} days with rainfall above {:.2}mm",
                count, threshold
            ),
            TrendValue::Count(count as u64),
        ))
    }

    /// Extreme event threshold for the given values
    pub fn extreme_threshold(&self, values: &[f64]) -> Result<f64> {
        stats::quantile(values, self.extreme_quantile).ok_or_else(|| self.no_values())
    }

    fn no_values(&self) -> RainflowError {
        RainflowError::NoValues {
            column: self.rainfall_column.clone(),
        }
    }
}

fn dry_days(values: &[f64]) -> Trend {
    let count = stats::dry_count(values);
    Trend::new(
        trend_names::DRY_DAYS,
        format!("Found {} days with no rainfall", count),
        TrendValue::Count(count as u64),
    )
}
