//! Validation metrics derived from a match set.
//!
//! Quality aggregates are `None` when nothing matched; they are never NaN,
//! so serialized results stay comparable and sortable.

use serde::{Deserialize, Serialize};

use crate::matching::matcher::MatchSet;
use crate::stats::mean;

pub const RECALL_TARGET: f64 = 0.60;
pub const PRECISION_TARGET: f64 = 0.50;
pub const POSITION_ERROR_TARGET_KM: f64 = 300.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub enum Assessment {
    #[serde(rename = "GOOD")]
    Good,
    #[serde(rename = "NEEDS_IMPROVEMENT")]
    NeedsImprovement,
}

impl Assessment {
    pub fn label(&self) -> &'static str {
        match self {
            Assessment::Good => "GOOD",
            Assessment::NeedsImprovement => "NEEDS_IMPROVEMENT",
        }
    }
}

/// Hit/miss accounting over whole storms.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DetectionMetrics {
    pub total_detected: usize,
    pub total_references: usize,
    pub hits: usize,
    pub misses: usize,
    pub false_alarms: usize,
    /// hits / total_references; 0 when the archive is empty.
    pub recall: f64,
    /// hits / total_detected; 0 when nothing was detected.
    pub precision: f64,
    /// false_alarms / total_detected; 0 when nothing was detected.
    pub false_alarm_rate: f64,
}

/// Positional quality over the matched pairs only.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct TrackQualityMetrics {
    pub mean_position_error_km: Option<f64>,
    pub max_position_error_km: Option<f64>,
    pub mean_overlap_hours: Option<f64>,
    pub max_overlap_hours: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct PerformanceAssessment {
    pub meets_recall_target: bool,
    pub meets_precision_target: bool,
    pub meets_position_error_target: bool,
    pub overall_assessment: Assessment,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ValidationMetrics {
    pub detection: DetectionMetrics,
    pub track_quality: TrackQualityMetrics,
    pub performance_assessment: PerformanceAssessment,
}

fn ratio(numerator: usize, denominator: usize) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}

fn max_of(values: &[f64]) -> Option<f64> {
    values
        .iter()
        .copied()
        .fold(None, |acc: Option<f64>, v| Some(acc.map_or(v, |a| a.max(v))))
}

pub fn compute_metrics(match_set: &MatchSet) -> ValidationMetrics {
    let hits = match_set.matches.len();
    let misses = match_set.unmatched_reference_sids.len();
    let false_alarms = match_set.unmatched_detected_ids.len();

    let recall = ratio(hits, match_set.total_references);
    let precision = ratio(hits, match_set.total_detected);
    let false_alarm_rate = ratio(false_alarms, match_set.total_detected);

    let mean_errors: Vec<f64> = match_set
        .matches
        .iter()
        .map(|m| m.mean_separation_km)
        .collect();
    let overlaps: Vec<f64> = match_set.matches.iter().map(|m| m.overlap_hours).collect();

    let track_quality = if match_set.matches.is_empty() {
        TrackQualityMetrics {
            mean_position_error_km: None,
            max_position_error_km: None,
            mean_overlap_hours: None,
            max_overlap_hours: None,
        }
    } else {
        TrackQualityMetrics {
            mean_position_error_km: Some(mean(&mean_errors)),
            max_position_error_km: max_of(&mean_errors),
            mean_overlap_hours: Some(mean(&overlaps)),
            max_overlap_hours: max_of(&overlaps),
        }
    };

    let meets_recall_target = recall >= RECALL_TARGET;
    let meets_precision_target = precision >= PRECISION_TARGET;
    let meets_position_error_target = track_quality
        .mean_position_error_km
        .map_or(false, |e| e <= POSITION_ERROR_TARGET_KM);
    let overall_assessment =
        if meets_recall_target && meets_precision_target && meets_position_error_target {
            Assessment::Good
        } else {
            Assessment::NeedsImprovement
        };

    ValidationMetrics {
        detection: DetectionMetrics {
            total_detected: match_set.total_detected,
            total_references: match_set.total_references,
            hits,
            misses,
            false_alarms,
            recall,
            precision,
            false_alarm_rate,
        },
        track_quality,
        performance_assessment: PerformanceAssessment {
            meets_recall_target,
            meets_precision_target,
            meets_position_error_target,
            overall_assessment,
        },
    }
}

// ============================================================================
// Tests
// ============================================================================
