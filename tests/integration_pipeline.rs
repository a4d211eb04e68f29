//! Integration tests for the load -> analyze -> render -> report pipeline
//!
//! These tests write small CSV fixtures to temporary files and drive the
//! public session and response API the way the CLI does.

use chrono::NaiveDate;
use rainflow_analytics::response;
use rainflow_analytics::{
    AnalysisSession, AnalyticsConfig, ChartKind, RainflowError, TrendEngine, TrendValue, stats,
};
use std::io::Write;
use tempfile::NamedTempFile;

const REFERENCE_CSV: &str = "rainfall\n0\n0\n5\n10\n0\n20\n3\n0\n7\n50\n";

fn write_csv(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file
}

fn two_month_csv() -> String {
    let mut csv = String::from("timestamp,rainfall,station\n");
    for day in 1..=30 {
        csv.push_str(&format!("2024-06-{:02},{},north\n", day, 4 + day % 3));
    }
    for day in 1..=31 {
        csv.push_str(&format!("2024-07-{:02},{},north\n", day, day % 2));
    }
    csv
}

/// Purpose: the reference table from the product description
/// Benefit: pins every number the basic, extreme and dry-day trends report
#[test]
fn test_reference_scenario_end_to_end() {
    let file = write_csv(REFERENCE_CSV);
    let mut session = AnalysisSession::default();
    assert!(session.try_load(file.path()));

    let analysis = session.analyze_trends();
    assert!(analysis.is_complete());
    assert_eq!(analysis.trends.len(), 3);

    let basic = &analysis.trends[0];
    assert_eq!(basic.name, "Basic Rainfall Statistics");
    assert_eq!(basic.description, "Average: 9.50mm, Max: 50.00mm, Min: 0.00mm");

    let extreme = &analysis.trends[1];
    assert_eq!(extreme.description, "Found 1 days with rainfall above 23.00mm");
    assert_eq!(extreme.value, TrendValue::Count(1));

    let dry = &analysis.trends[2];
    assert_eq!(dry.value, TrendValue::Count(4));
}

/// Purpose: wettest month detection over a timestamped file
/// Benefit: covers timestamp parsing, month grouping and trend ordering together
#[test]
fn test_seasonal_pattern_from_timestamped_csv() {
    let file = write_csv(&two_month_csv());
    let mut session = AnalysisSession::default();
    session.load_path(file.path()).unwrap();

    let analysis = session.analyze_trends();
    let names: Vec<&str> = analysis.trends.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(
        names,
        vec![
            "Basic Rainfall Statistics",
            "Seasonal Pattern",
            "Extreme Rainfall Events",
            "Dry Days"
        ]
    );
    assert_eq!(analysis.trends[1].value, TrendValue::Count(6));
    assert_eq!(analysis.trends[3].value, TrendValue::Count(15));
}

/// Purpose: the chart and the trend use one threshold
/// Benefit: the extreme events chart never disagrees with the reported count
#[test]
fn test_extreme_threshold_agrees_between_analysis_and_chart() {
    let mut session = AnalysisSession::default();
    session.load_bytes(REFERENCE_CSV.as_bytes().to_vec()).unwrap();

    let values = session.table().unwrap().rainfall_values();
    let threshold = TrendEngine::default().extreme_threshold(&values).unwrap();
    assert!((threshold - 23.0).abs() < 1e-9);
    assert_eq!(stats::exceedances(&values, threshold).len(), 1);

    let chart = session.render(ChartKind::ExtremeEvents).unwrap();
    assert_eq!(chart.series_points, 1);
}

/// Purpose: time series without a timestamp column
/// Benefit: confirms a blank chart rather than an error
#[test]
fn test_time_series_without_timestamp_is_blank() {
    let mut session = AnalysisSession::default();
    session.load_bytes(REFERENCE_CSV.as_bytes().to_vec()).unwrap();

    let chart = session.render(ChartKind::TimeSeries).unwrap();
    assert!(!chart.has_series());

    let timed = write_csv(&two_month_csv());
    session.load_path(timed.path()).unwrap();
    let chart = session.render(ChartKind::TimeSeries).unwrap();
    assert_eq!(chart.series_points, 30);
}

#[test]
fn test_unknown_chart_kind_is_absent() {
    let mut session = AnalysisSession::default();
    session.load_bytes(REFERENCE_CSV.as_bytes().to_vec()).unwrap();

    assert!(session.render_kind("unknown_kind").is_none());
    assert!(response::visualize(&session, "unknown_kind").is_err());
}

/// Purpose: reload semantics
/// Benefit: nothing from the first file leaks into analysis of the second
#[test]
fn test_reload_replaces_previous_data() {
    let mut session = AnalysisSession::default();
    session.load_path(write_csv(&two_month_csv()).path()).unwrap();
    session.load_path(write_csv("rainfall\n1\n1\n1\n").path()).unwrap();

    let analysis = session.analyze_trends();
    assert_eq!(session.data_points(), 3);
    assert_eq!(analysis.trends.len(), 3);
    assert!(analysis.trends.iter().all(|t| t.name != "Seasonal Pattern"));
    assert_eq!(analysis.trends[0].value, TrendValue::Text("1.00".to_string()));
}

#[test]
fn test_bad_timestamp_rejects_file_and_keeps_old_table() {
    let mut session = AnalysisSession::default();
    session.load_bytes(REFERENCE_CSV.as_bytes().to_vec()).unwrap();

    let bad = write_csv("timestamp,rainfall\n2024-01-01,1\n31/31/2024,2\n");
    let err = session.load_path(bad.path()).unwrap_err();
    assert!(matches!(err, RainflowError::InvalidTimestamp { row: 1, .. }));
    assert_eq!(session.data_points(), 10);

    let body = response::load(&mut session, bad.path()).unwrap_err();
    assert_eq!(
        body.error,
        "Failed to load data. Ensure CSV has \"rainfall\" column."
    );
}

#[test]
fn test_report_composition() {
    let mut session = AnalysisSession::new(AnalyticsConfig::default());
    session.load_path(write_csv(&two_month_csv()).path()).unwrap();

    let at = NaiveDate::from_ymd_opt(2024, 8, 1)
        .and_then(|d| d.and_hms_opt(12, 0, 0))
        .unwrap();
    let report = response::report(&mut session, at);
    let json = serde_json::to_value(&report).unwrap();

    assert_eq!(json["generated_at"], "2024-08-01T12:00:00");
    assert_eq!(json["total_data_points"], 61);
    assert_eq!(json["trends_identified"], 4);
    assert_eq!(json["analysis_summary"][1]["value"], 6);
    assert_eq!(json["interpretation_time_saved"], "40%");
    assert_eq!(session.last_trends().len(), 4);
}
