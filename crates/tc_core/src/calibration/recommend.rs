//! Threshold adjustment advice derived from a calibration run.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::calibration::calibrator::CalibrationResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub enum RecommendationStatus {
    #[serde(rename = "LOW")]
    Low,
    #[serde(rename = "HIGH")]
    High,
    #[serde(rename = "GOOD")]
    Good,
}

impl RecommendationStatus {
    pub fn label(&self) -> &'static str {
        match self {
            RecommendationStatus::Low => "LOW",
            RecommendationStatus::High => "HIGH",
            RecommendationStatus::Good => "GOOD",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Recommendation {
    pub status: RecommendationStatus,
    pub suggestion: String,
    pub reason: String,
}

impl Recommendation {
    fn new(status: RecommendationStatus, suggestion: &str, reason: &str) -> Recommendation {
        Recommendation {
            status,
            suggestion: suggestion.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Advice on the three tunable axes: how many storms are found, how many
/// detections are spurious, and how closely tracks follow the truth.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct CalibrationRecommendations {
    pub recall: Recommendation,
    pub precision: Recommendation,
    pub position: Recommendation,
}

/// Maps a calibration result to concrete threshold adjustments.
///
/// An unreported position error (no matched tracks) leaves the position
/// axis on its good path; the recall axis already flags that situation.
pub fn recommend_adjustments(result: &CalibrationResult) -> CalibrationRecommendations {
    let detection = &result.metrics.detection;
    let quality = &result.metrics.track_quality;

    let recall = if detection.recall < 0.60 {
        Recommendation::new(
            RecommendationStatus::Low,
            "Decrease vorticity percentile (e.g., 99.5 -> 99.0) or wind percentile (90 -> 85)",
            "Recall below 60% target - detection too strict",
        )
    } else if detection.recall > 0.85 {
        Recommendation::new(
            RecommendationStatus::High,
            "Increase vorticity percentile (e.g., 99.5 -> 99.8) or wind percentile (90 -> 95)",
            "Recall above 85% - may be too permissive, check false alarms",
        )
    } else {
        Recommendation::new(
            RecommendationStatus::Good,
            "Maintain current vorticity and wind percentiles",
            "Recall within target range (60-85%)",
        )
    };

    let precision = if detection.false_alarm_rate > 0.5 {
        Recommendation::new(
            RecommendationStatus::Low,
            "Increase wind percentile threshold or add minimum pressure gradient requirement",
            "False alarm rate above 50% - too many false detections",
        )
    } else {
        Recommendation::new(
            RecommendationStatus::Good,
            "Current precision is acceptable",
            "Conservative false alarm rate",
        )
    };

    let position = match quality.mean_position_error_km {
        Some(err) if err > 300.0 => Recommendation::new(
            RecommendationStatus::High,
            "Reduce cluster radius or tighten temporal matching constraints",
            "Position error above 300km target",
        ),
        _ => Recommendation::new(
            RecommendationStatus::Good,
            "Current position accuracy is acceptable",
            "Position error within target range",
        ),
    };

    CalibrationRecommendations {
        recall,
        precision,
        position,
    }
}

// ============================================================================
// Tests
// ============================================================================
