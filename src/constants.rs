//! Application constants for rainfall analytics
//!
//! Column names, statistical defaults, chart labels and user-facing messages
//! shared by the loader, the trend engine and the CLI.

// =============================================================================
// Dataset Columns
// =============================================================================

/// Required measurement column
pub const RAINFALL_COLUMN: &str = "rainfall";

/// Optional chronological index column
pub const TIMESTAMP_COLUMN: &str = "timestamp";

/// Cell contents read as missing values, matching pandas' default NA set
pub const MISSING_VALUE_TOKENS: &[&str] = &[
    "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Timestamp layouts accepted in addition to RFC 3339, tried in order
pub const TIMESTAMP_FORMATS: &[&str] = &[
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M",
    "%Y-%m-%dT%H:%M",
    "%Y/%m/%d %H:%M:%S",
];

/// Date-only layouts, interpreted as midnight
pub const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

// =============================================================================
// Statistics
// =============================================================================

/// Quantile above which a day counts as an extreme event
pub const DEFAULT_EXTREME_QUANTILE: f64 = 0.90;

/// Maximum bars drawn on the extreme events chart
pub const DEFAULT_MAX_EXTREME_BARS: usize = 10;

/// Rows shown on the recent time series chart
pub const DEFAULT_RECENT_WINDOW: usize = 30;

// =============================================================================
// Trend Names
// =============================================================================

pub mod trend_names {
    pub const BASIC_STATISTICS: &str = "Basic Rainfall Statistics";
    pub const SEASONAL_PATTERN: &str = "Seasonal Pattern";
    pub const EXTREME_EVENTS: &str = "Extreme Rainfall Events";
    pub const DRY_DAYS: &str = "Dry Days";
}

// =============================================================================
// Chart Layout
// =============================================================================

/// Default chart size in pixels (10x6 inches at 100 dpi)
pub const DEFAULT_CHART_WIDTH: u32 = 1000;
pub const DEFAULT_CHART_HEIGHT: u32 = 600;

/// Requested rotation of time series date labels, in degrees
pub const DEFAULT_LABEL_ROTATION: u16 = 45;

pub mod chart_labels {
    pub const BASIC_STATS_TITLE: &str = "Rainfall Basic Statistics";
    pub const RAINFALL_AXIS: &str = "Rainfall (mm)";
    pub const EVENT_INDEX_AXIS: &str = "Event Index";
    pub const DATE_AXIS: &str = "Date";
    pub const BASIC_STATS_BARS: [&str; 3] = ["Min", "Avg", "Max"];
}

/// Prefix for embedding PNG output in HTML
pub const PNG_DATA_URL_PREFIX: &str = "data:image/png;base64,";

// =============================================================================
// Transport Messages
// =============================================================================

pub mod messages {
    pub const LOAD_SUCCESS: &str = "Data loaded successfully";
    pub const LOAD_FAILURE: &str = "Failed to load data. Ensure CSV has \"rainfall\" column.";
    pub const ANALYSIS_ERROR_PREFIX: &str = "Analysis error";
    pub const VISUALIZATION_FAILURE: &str = "Could not generate visualization";
    pub const REPORT_ERROR_PREFIX: &str = "Report generation error";
}

/// Headline figure carried in every report
pub const DEFAULT_TIME_SAVED_LABEL: &str = "40%";

/// File name prefix used when a report is written into a directory
pub const REPORT_FILE_PREFIX: &str = "rainflow-report";
