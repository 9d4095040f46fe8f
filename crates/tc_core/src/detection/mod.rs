//! Cyclone detection pipeline: candidates, tracking, classification.

pub mod candidates;
pub mod classify;
pub mod tracker;

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationParams;
use crate::cube::FeatureCube;
use crate::error::Result;
use crate::stats::mean;

pub use candidates::{identify_candidates, CycloneCandidate, Hemisphere};
pub use classify::{
    classify_tracks, validate_structure, DetectedCyclone, DevelopmentStage, IntensityClass,
    StructureMetrics, TrackPoint,
};
pub use tracker::{track_candidates, track_length_stats, CycloneTrack, TIMESTEP_HOURS};

/// Runs the full detection pipeline on a feature cube.
///
/// Candidate identification, temporal linking, structural acceptance and
/// classification, in that order. Output order is deterministic: cyclones
/// appear in track creation order.
pub fn detect_cyclones(
    features: &FeatureCube,
    params: &CalibrationParams,
) -> Result<Vec<DetectedCyclone>> {
    params.validate()?;
    let per_step = identify_candidates(features, params)?;
    let tracks = track_candidates(&per_step, params);
    let tracks = validate_structure(tracks, features);
    let cyclones = classify_tracks(&tracks, &features.time);
    log::info!("detected {} cyclones", cyclones.len());
    Ok(cyclones)
}

// ============================================================================
// Detection summary
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct HemisphereCounts {
    pub nh: usize,
    pub sh: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct IntensityCounts {
    pub weak: usize,
    pub moderate: usize,
    pub strong: usize,
}

/// Aggregate view of a detection run, reported alongside the match metrics.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct DetectionSummary {
    pub total_cyclones: usize,
    pub hemisphere_distribution: HemisphereCounts,
    pub intensity_distribution: IntensityCounts,
    pub avg_lifetime_hours: f64,
    pub max_wind_speed: f64,
    /// Largest |vorticity| over all detections, s^-1.
    pub max_vorticity: f64,
}

pub fn detection_summary(cyclones: &[DetectedCyclone]) -> DetectionSummary {
    let mut hemis = HemisphereCounts::default();
    let mut intensity = IntensityCounts::default();
    let mut max_wind: f64 = 0.0;
    let mut max_vort: f64 = 0.0;
    for c in cyclones {
        match c.hemisphere {
            Hemisphere::Northern => hemis.nh += 1,
            Hemisphere::Southern => hemis.sh += 1,
        }
        match c.intensity_class {
            IntensityClass::Weak => intensity.weak += 1,
            IntensityClass::Moderate => intensity.moderate += 1,
            IntensityClass::Strong => intensity.strong += 1,
        }
        max_wind = max_wind.max(c.max_wind_10m);
        max_vort = max_vort.max(c.max_vorticity.abs());
    }
    let lifetimes: Vec<f64> = cyclones.iter().map(|c| c.lifetime_hours).collect();
    DetectionSummary {
        total_cyclones: cyclones.len(),
        hemisphere_distribution: hemis,
        intensity_distribution: intensity,
        avg_lifetime_hours: mean(&lifetimes),
        max_wind_speed: max_wind,
        max_vorticity: max_vort,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cube::{CubeMetadata, ForecastCube};
    use crate::features::extract_features;
    use chrono::{TimeZone, Utc};
    use ndarray::Array3;

    /// Drifting-anomaly cube reused across the pipeline tests; see the
    /// candidate tests for the construction of the velocity couple.
    fn drifting_cube(t_len: usize) -> ForecastCube {
        let (y_len, x_len) = (9, 24);
        let mut u10 = Array3::from_elem((t_len, y_len, x_len), 5.0);
        let mut v10 = Array3::zeros((t_len, y_len, x_len));
        let msl = Array3::from_elem((t_len, y_len, x_len), 101_325.0);
        let tp6 = Array3::zeros((t_len, y_len, x_len));
        for t in 0..t_len {
            let x = 4 + t;
            v10[[t, 4, x - 1]] = -30.0;
            v10[[t, 4, x + 1]] = 30.0;
            u10[[t, 3, x]] = 35.0;
            u10[[t, 5, x]] = -25.0;
            u10[[t, 4, x]] = 40.0;
        }
        let time = (0..t_len)
            .map(|i| {
                Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::hours(6 * i as i64)
            })
            .collect();
        ForecastCube::new(
            time,
            (0..y_len).map(|i| 10.0 + i as f64).collect(),
            (0..x_len).map(|i| 120.0 + i as f64).collect(),
            u10,
            v10,
            msl,
            tp6,
            CubeMetadata::for_model("WeatherNext2"),
        )
        .unwrap()
    }

    #[test]
    fn pipeline_detects_one_drifting_storm() {
        let cube = drifting_cube(8);
        let features = extract_features(&cube).unwrap();
        let cyclones = detect_cyclones(&features, &CalibrationParams::default()).unwrap();
        assert_eq!(cyclones.len(), 1, "one storm drifts through the cube");
        let c = &cyclones[0];
        assert_eq!(c.points.len(), 8);
        assert_eq!(c.lifetime_hours, 42.0);
        assert_eq!(c.hemisphere, Hemisphere::Northern);
        // The storm moves one degree of longitude per step.
        assert_eq!(c.points[0].lon, 124.0);
        assert_eq!(c.points[7].lon, 131.0);
        assert_eq!(c.points[0].lat, 14.0);
    }

    #[test]
    fn pipeline_rejects_invalid_params() {
        let cube = drifting_cube(4);
        let features = extract_features(&cube).unwrap();
        let params = CalibrationParams {
            vorticity_percentile: 120.0,
            ..CalibrationParams::default()
        };
        assert!(detect_cyclones(&features, &params).is_err());
    }

    #[test]
    fn summary_aggregates_distributions() {
        let cube = drifting_cube(8);
        let features = extract_features(&cube).unwrap();
        let cyclones = detect_cyclones(&features, &CalibrationParams::default()).unwrap();
        let summary = detection_summary(&cyclones);
        assert_eq!(summary.total_cyclones, 1);
        assert_eq!(summary.hemisphere_distribution.nh, 1);
        assert_eq!(summary.hemisphere_distribution.sh, 0);
        assert_eq!(summary.intensity_distribution.strong, 1);
        assert_eq!(summary.avg_lifetime_hours, 42.0);
        assert!(summary.max_wind_speed >= 40.0);
        assert!(summary.max_vorticity > 0.0);
    }

    #[test]
    fn summary_of_nothing_is_zeroed() {
        let summary = detection_summary(&[]);
        assert_eq!(summary.total_cyclones, 0);
        assert_eq!(summary.avg_lifetime_hours, 0.0);
        assert_eq!(summary.max_wind_speed, 0.0);
    }
}
