//! Analysis session holding the current dataset.
//!
//! A session owns at most one loaded [`Table`]. Loading replaces it only on
//! success; analysis and rendering read it on every call.

use crate::analysis::{TrendAnalysis, TrendEngine};
use crate::chart::{ChartRenderer, RenderedChart};
use crate::config::AnalyticsConfig;
use crate::error::{RainflowError, Result};
use crate::loader::DatasetLoader;
use crate::models::{ChartKind, Table, Trend};
use std::path::Path;
use tracing::{error, info, warn};

#[derive(Debug, Clone)]
pub struct AnalysisSession {
    config: AnalyticsConfig,
    loader: DatasetLoader,
    engine: TrendEngine,
    renderer: ChartRenderer,
    table: Option<Table>,
    last_trends: Vec<Trend>,
}

impl Default for AnalysisSession {
    fn default() -> Self {
        Self::new(AnalyticsConfig::default())
    }
}

impl AnalysisSession {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self {
            loader: DatasetLoader::new(&config),
            engine: TrendEngine::new(&config),
            renderer: ChartRenderer::new(&config),
            config,
            table: None,
            last_trends: Vec::new(),
        }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Load a CSV file, returning the number of rows
    pub fn load_path(&mut self, path: &Path) -> Result<usize> {
        let table = self.loader.load_path(path);
        self.replace_table(table, &path.display().to_string())
    }

    /// Load CSV content held in memory, returning the number of rows
    pub fn load_bytes(&mut self, bytes: Vec<u8>) -> Result<usize> {
        let table = self.loader.load_bytes(bytes);
        self.replace_table(table, "in-memory CSV")
    }

    /// Load a CSV file and report only whether it succeeded
    pub fn try_load(&mut self, path: &Path) -> bool {
        self.load_path(path).is_ok()
    }

    fn replace_table(&mut self, table: Result<Table>, source: &str) -> Result<usize> {
        match table {
            Ok(table) => {
                let rows = table.len();
                info!(
                    "Loaded {} rows from {} (time index: {})",
                    rows,
                    source,
                    table.has_time_index()
                );
                self.table = Some(table);
                Ok(rows)
            }
            Err(e) => {
                warn!("Error loading data from {}: {}", source, e);
                Err(e)
            }
        }
    }

    pub fn table(&self) -> Option<&Table> {
        self.table.as_ref()
    }

    /// Rows in the current table, zero when nothing is loaded
    pub fn data_points(&self) -> usize {
        self.table.as_ref().map_or(0, Table::len)
    }

    /// Recompute trends from the current table and remember them
    pub fn analyze_trends(&mut self) -> TrendAnalysis {
        let analysis = self.engine.analyze(self.table.as_ref());
        self.last_trends = analysis.trends.clone();
        analysis
    }

    /// Trends from the most recent analysis
    pub fn last_trends(&self) -> &[Trend] {
        &self.last_trends
    }

    /// Render a chart of the current table
    pub fn render(&self, kind: ChartKind) -> Result<RenderedChart> {
        let table = self.table.as_ref().ok_or(RainflowError::NoDataset)?;
        self.renderer.render(kind, table)
    }

    /// Render by kind name; unknown kinds and failures yield `None`
    pub fn render_kind(&self, kind: &str) -> Option<RenderedChart> {
        let result = kind.parse::<ChartKind>().and_then(|kind| self.render(kind));
        match result {
            Ok(chart) => Some(chart),
            Err(e) => {
                error!("Error generating visualization '{}': {}", kind, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::TrendValue;

    const SAMPLE: &str = "rainfall\n0\n0\n5\n10\n0\n20\n3\n0\n7\n50\n";

    #[test]
    fn test_fresh_session_is_empty() {
        let mut session = AnalysisSession::default();
        assert_eq!(session.data_points(), 0);
        assert!(session.analyze_trends().trends.is_empty());
        assert!(matches!(
            session.render(ChartKind::BasicStats),
            Err(RainflowError::NoDataset)
        ));
        assert!(session.render_kind("basic_stats").is_none());
    }

    #[test]
    fn test_failed_load_keeps_previous_table() {
        let mut session = AnalysisSession::default();
        assert_eq!(session.load_bytes(SAMPLE.as_bytes().to_vec()).unwrap(), 10);

        let result = session.load_bytes(b"precip\n1\n2\n".to_vec());
        assert!(matches!(result, Err(RainflowError::MissingColumn { .. })));
        assert_eq!(session.data_points(), 10);
    }

    #[test]
    fn test_reload_replaces_table() {
        let mut session = AnalysisSession::default();
        session.load_bytes(SAMPLE.as_bytes().to_vec()).unwrap();
        session.load_bytes(b"rainfall\n2\n4\n".to_vec()).unwrap();

        let analysis = session.analyze_trends();
        assert_eq!(session.data_points(), 2);
        assert_eq!(analysis.trends[0].value, TrendValue::Text("3.00".to_string()));
        assert_eq!(analysis.trends[2].value, TrendValue::Count(0));
    }

    #[test]
    fn test_last_trends_cached() {
        let mut session = AnalysisSession::default();
        session.load_bytes(SAMPLE.as_bytes().to_vec()).unwrap();
        assert!(session.last_trends().is_empty());

        let analysis = session.analyze_trends();
        assert_eq!(session.last_trends(), analysis.trends.as_slice());
    }

    #[test]
    fn test_render_kind_unknown_is_absent() {
        let mut session = AnalysisSession::default();
        session.load_bytes(SAMPLE.as_bytes().to_vec()).unwrap();

        assert!(session.render_kind("unknown_kind").is_none());
        assert!(session.render_kind("basic_stats").is_some());
    }
}
