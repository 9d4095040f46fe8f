//! Validation report assembly.
//!
//! One `ValidationReport` carries everything a run produced: the parameters
//! used, the metrics, the per-basin breakdown, and the threshold advice.
//! It serializes to JSON for machines and renders to plain text for humans;
//! `write_files` emits both next to each other.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::calibration::{CalibrationParams, CalibrationRecommendations, Recommendation};
use crate::error::Result;
use crate::matching::basin::{basin_name, BasinStats};
use crate::matching::metrics::ValidationMetrics;

const RULE: &str = "============================================================";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ValidationReport {
    pub parameters: CalibrationParams,
    pub metrics: ValidationMetrics,
    pub recommendations: CalibrationRecommendations,
    pub detected_cyclones: usize,
    pub reference_tracks: usize,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub basin_analysis: Option<BTreeMap<String, BasinStats>>,
}

/// Paths written by [`ValidationReport::write_files`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFiles {
    pub text: PathBuf,
    pub json: PathBuf,
}

impl ValidationReport {
    /// Plain-text rendering, section by section.
    pub fn render_text(&self) -> String {
        let mut lines: Vec<String> = Vec::new();
        lines.push(RULE.to_string());
        lines.push("CYCLONE DETECTION VALIDATION REPORT".to_string());
        lines.push(RULE.to_string());

        let det = &self.metrics.detection;
        lines.push(String::new());
        lines.push("DETECTION METRICS:".to_string());
        lines.push(format!("  Total Reference Storms: {}", det.total_references));
        lines.push(format!("  Total Detected Storms: {}", det.total_detected));
        lines.push(format!("  Hits: {}", det.hits));
        lines.push(format!("  Misses: {}", det.misses));
        lines.push(format!("  False Alarms: {}", det.false_alarms));
        lines.push(format!("  Recall: {}", pct(det.recall)));
        lines.push(format!("  Precision: {}", pct(det.precision)));
        lines.push(format!("  False Alarm Rate: {}", pct(det.false_alarm_rate)));

        let tq = &self.metrics.track_quality;
        lines.push(String::new());
        lines.push("TRACK QUALITY:".to_string());
        lines.push(format!(
            "  Mean Position Error: {}",
            km_or_na(tq.mean_position_error_km)
        ));
        lines.push(format!(
            "  Max Position Error: {}",
            km_or_na(tq.max_position_error_km)
        ));
        lines.push(format!(
            "  Mean Overlap: {}",
            hours_or_na(tq.mean_overlap_hours)
        ));
        lines.push(format!(
            "  Max Overlap: {}",
            hours_or_na(tq.max_overlap_hours)
        ));

        let pa = &self.metrics.performance_assessment;
        lines.push(String::new());
        lines.push("PERFORMANCE ASSESSMENT:".to_string());
        lines.push(format!(
            "  Meets Recall Target (>=60%): {}",
            yes_no(pa.meets_recall_target)
        ));
        lines.push(format!(
            "  Meets Precision Target (>=50%): {}",
            yes_no(pa.meets_precision_target)
        ));
        lines.push(format!(
            "  Meets Position Error Target (<=300km): {}",
            yes_no(pa.meets_position_error_target)
        ));
        lines.push(format!(
            "  Overall Assessment: {}",
            pa.overall_assessment.label()
        ));

        if let Some(basins) = self.basin_analysis.as_ref().filter(|b| !b.is_empty()) {
            lines.push(String::new());
            lines.push("BASIN-SPECIFIC ANALYSIS:".to_string());
            for (code, stats) in basins {
                lines.push(format!("  {}:", basin_heading(code)));
                lines.push(format!("    Total: {}", stats.total_references));
                lines.push(format!("    Detected: {}", stats.detected));
                lines.push(format!("    Recall: {}", pct(stats.recall)));
                if let Some(err) = stats.mean_position_error_km {
                    lines.push(format!("    Mean Error: {err:.1} km"));
                }
            }
        }

        lines.push(String::new());
        lines.push(RULE.to_string());

        let p = &self.parameters;
        lines.push(String::new());
        lines.push("CALIBRATION PARAMETERS:".to_string());
        lines.push(format!("  Vorticity Percentile: {}%", p.vorticity_percentile));
        lines.push(format!("  Wind Percentile: {}%", p.wind_percentile));
        lines.push(format!("  Max Cyclone Speed: {} km/h", p.max_cyclone_speed_kmh));
        lines.push(format!("  Cluster Radius: {} km", p.cluster_radius_km));
        lines.push(format!("  Min Lifetime Steps: {}", p.min_lifetime_steps));

        lines.push(String::new());
        lines.push("VALIDATION SUMMARY:".to_string());
        lines.push(format!("  Detected Cyclones: {}", self.detected_cyclones));
        lines.push(format!("  Reference Tracks: {}", self.reference_tracks));
        lines.push(format!(
            "  Validation Period: {} to {}",
            format_window(self.window_start),
            format_window(self.window_end)
        ));

        lines.push(String::new());
        lines.push("CALIBRATION RECOMMENDATIONS:".to_string());
        push_recommendation(&mut lines, "RECALL", &self.recommendations.recall);
        push_recommendation(&mut lines, "PRECISION", &self.recommendations.precision);
        push_recommendation(&mut lines, "POSITION", &self.recommendations.position);

        lines.push(String::new());
        lines.push(RULE.to_string());

        lines.join("\n")
    }

    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn from_json(json: &str) -> Result<ValidationReport> {
        Ok(serde_json::from_str(json)?)
    }

    /// JSON schema for the serialized report.
    pub fn json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ValidationReport)
    }

    /// Writes `{prefix}_report.txt` and `{prefix}_results.json`.
    pub fn write_files(&self, output_prefix: &Path) -> Result<ReportFiles> {
        let files = ReportFiles {
            text: with_appended(output_prefix, "_report.txt"),
            json: with_appended(output_prefix, "_results.json"),
        };

        if let Some(parent) = output_prefix.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        fs::write(&files.text, format!("{}\n", self.render_text()))?;
        fs::write(&files.json, self.to_json_pretty()?)?;

        log::info!("report written to {:?} and {:?}", files.text, files.json);
        Ok(files)
    }
}

fn pct(value: f64) -> String {
    format!("{:.1}%", value * 100.0)
}

fn km_or_na(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1} km"),
        None => "n/a".to_string(),
    }
}

fn hours_or_na(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:.1} hours"),
        None => "n/a".to_string(),
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn basin_heading(code: &str) -> String {
    let name = basin_name(code);
    if name == code {
        code.to_string()
    } else {
        format!("{code} ({name})")
    }
}

fn format_window(t: DateTime<Utc>) -> String {
    t.format("%Y-%m-%d %H:%M UTC").to_string()
}

fn push_recommendation(lines: &mut Vec<String>, axis: &str, rec: &Recommendation) {
    lines.push(format!("  {axis}:"));
    lines.push(format!("    Status: {}", rec.status.label()));
    lines.push(format!("    Suggestion: {}", rec.suggestion));
    lines.push(format!("    Reason: {}", rec.reason));
}

fn with_appended(prefix: &Path, suffix: &str) -> PathBuf {
    let mut name = prefix
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(suffix);
    prefix.with_file_name(name)
}

// ============================================================================
// Tests
// ============================================================================
