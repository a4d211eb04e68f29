//! Descriptive statistics over rainfall values.
//!
//! Shared by trend analysis and chart rendering so that both report the same
//! numbers for the same table.

use crate::models::Table;
use chrono::Datelike;
use std::collections::BTreeMap;

/// Min, mean and max of a set of values
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Summary {
    pub count: usize,
    pub mean: f64,
    pub min: f64,
    pub max: f64,
}

impl Summary {
    /// Summarise values, or `None` when there are none
    pub fn compute(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let count = values.len();
        let mean = values.iter().sum::<f64>() / count as f64;
        let min = values.iter().copied().fold(f64::INFINITY, f64::min);
        let max = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);

        Some(Self {
            count,
            mean,
            min,
            max,
        })
    }
}

/// Linear-interpolation quantile at position `q * (n - 1)` of the sorted values
pub fn quantile(values: &[f64], q: f64) -> Option<f64> {
    if values.is_empty() {
        return None;
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));

    let position = q.clamp(0.0, 1.0) * (sorted.len() - 1) as f64;
    let lower = position.floor() as usize;
    let upper = position.ceil() as usize;
    let fraction = position - lower as f64;

    Some(sorted[lower] + (sorted[upper] - sorted[lower]) * fraction)
}

/// Values strictly above the threshold, in their original order
pub fn exceedances(values: &[f64], threshold: f64) -> Vec<f64> {
    values.iter().copied().filter(|v| *v > threshold).collect()
}

/// Number of values exactly equal to zero
pub fn dry_count(values: &[f64]) -> usize {
    values.iter().filter(|v| **v == 0.0).count()
}

/// Mean rainfall per calendar month (1-12) of a time-indexed table
///
/// Rows without a timestamp or a rainfall value are ignored; months with no
/// values are absent from the map.
pub fn monthly_means(table: &Table) -> BTreeMap<u32, f64> {
    let mut sums: BTreeMap<u32, (f64, usize)> = BTreeMap::new();

    for row in table.rows() {
        if let (Some(ts), Some(value)) = (row.timestamp, row.rainfall) {
            let entry = sums.entry(ts.month()).or_insert((0.0, 0));
            entry.0 += value;
            entry.1 += 1;
        }
    }

    sums.into_iter()
        .map(|(month, (sum, count))| (month, sum / count as f64))
        .collect()
}

/// Month with the highest mean; ties resolve to the earliest month
pub fn wettest_month(means: &BTreeMap<u32, f64>) -> Option<(u32, f64)> {
    means
        .iter()
        .fold(None, |best: Option<(u32, f64)>, (&month, &mean)| match best {
            Some((_, best_mean)) if best_mean >= mean => best,
            _ => Some((month, mean)),
        })
}
