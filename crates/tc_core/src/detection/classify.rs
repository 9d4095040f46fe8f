//! Track classification and the final detected-cyclone record.
//!
//! Classification bands are fixed, not calibrated: they describe the output
//! rather than gate it, so sweeping them would only relabel the same tracks.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::detection::candidates::Hemisphere;
use crate::detection::tracker::CycloneTrack;
use crate::stats::mean;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum IntensityClass {
    Weak,
    Moderate,
    Strong,
}

impl IntensityClass {
    /// Banding on peak 10 m wind: below 15 m/s weak, below 25 moderate,
    /// otherwise strong.
    pub fn from_max_wind(max_wind: f64) -> IntensityClass {
        if max_wind < 15.0 {
            IntensityClass::Weak
        } else if max_wind < 25.0 {
            IntensityClass::Moderate
        } else {
            IntensityClass::Strong
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            IntensityClass::Weak => "weak",
            IntensityClass::Moderate => "moderate",
            IntensityClass::Strong => "strong",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum DevelopmentStage {
    ShortLived,
    Mature,
    LongLived,
}

impl DevelopmentStage {
    /// Banding on lifetime: under 48 h short-lived, under 120 h mature,
    /// otherwise long-lived.
    pub fn from_lifetime_hours(lifetime_hours: f64) -> DevelopmentStage {
        if lifetime_hours < 48.0 {
            DevelopmentStage::ShortLived
        } else if lifetime_hours < 120.0 {
            DevelopmentStage::Mature
        } else {
            DevelopmentStage::LongLived
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DevelopmentStage::ShortLived => "short_lived",
            DevelopmentStage::Mature => "mature",
            DevelopmentStage::LongLived => "long_lived",
        }
    }
}

/// One position along a detected track, with the timestep resolved to a
/// real timestamp through the cube time axis.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct TrackPoint {
    pub time: DateTime<Utc>,
    pub step: usize,
    pub lat: f64,
    pub lon: f64,
}

/// Per-track structure aggregates carried into reports.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct StructureMetrics {
    pub num_candidates: usize,
    pub mean_vorticity: f64,
    pub mean_wind_speed: f64,
}

/// The final product of detection: a classified track ready for matching
/// against a reference archive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct DetectedCyclone {
    pub track_id: u64,
    pub points: Vec<TrackPoint>,
    pub lifetime_hours: f64,
    pub max_wind_10m: f64,
    /// Signed peak vorticity (negative for southern storms).
    pub max_vorticity: f64,
    pub min_pressure_gradient: f64,
    pub hemisphere: Hemisphere,
    pub intensity_class: IntensityClass,
    pub development_stage: DevelopmentStage,
    pub structure: StructureMetrics,
}

impl DetectedCyclone {
    pub fn first_time(&self) -> DateTime<Utc> {
        self.points[0].time
    }

    pub fn last_time(&self) -> DateTime<Utc> {
        self.points[self.points.len() - 1].time
    }
}

/// Structural acceptance of linked tracks.
///
/// Every track that survives the lifetime filter is currently accepted;
/// the stage exists so warm-core or closed-contour criteria slot in
/// without touching the tracker.
pub fn validate_structure(tracks: Vec<CycloneTrack>, _features: &crate::cube::FeatureCube) -> Vec<CycloneTrack> {
    log::debug!("structure validation passed {} tracks through", tracks.len());
    tracks
}

/// Turns accepted tracks into classified cyclone records, resolving step
/// indices against the cube time axis.
pub fn classify_tracks(tracks: &[CycloneTrack], time_axis: &[DateTime<Utc>]) -> Vec<DetectedCyclone> {
    tracks
        .iter()
        .map(|track| {
            let points: Vec<TrackPoint> = track
                .candidates
                .iter()
                .map(|c| TrackPoint {
                    time: time_axis[c.step],
                    step: c.step,
                    lat: c.lat,
                    lon: c.lon,
                })
                .collect();
            let vort_mags: Vec<f64> = track
                .candidates
                .iter()
                .map(|c| c.vorticity_magnitude())
                .collect();
            let winds: Vec<f64> = track.candidates.iter().map(|c| c.wind_speed).collect();
            let lifetime_hours = track.lifetime_hours();
            DetectedCyclone {
                track_id: track.id,
                points,
                lifetime_hours,
                max_wind_10m: track.max_wind_speed,
                max_vorticity: track.max_vorticity,
                min_pressure_gradient: track.min_pressure_gradient,
                hemisphere: track.hemisphere,
                intensity_class: IntensityClass::from_max_wind(track.max_wind_speed),
                development_stage: DevelopmentStage::from_lifetime_hours(lifetime_hours),
                structure: StructureMetrics {
                    num_candidates: track.len(),
                    mean_vorticity: mean(&vort_mags),
                    mean_wind_speed: mean(&winds),
                },
            }
        })
        .collect()
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::CalibrationParams;
    use crate::detection::candidates::CycloneCandidate;
    use crate::detection::tracker::track_candidates;
    use chrono::TimeZone;

    fn cand(step: usize, wind: f64) -> CycloneCandidate {
        CycloneCandidate {
            step,
            y: 5,
            x: step,
            lat: 15.0,
            lon: 130.0 + 0.2 * step as f64,
            vorticity: 2.0e-4,
            wind_speed: wind,
            pressure_gradient: 0.01,
            hemisphere: Hemisphere::Northern,
        }
    }

    fn time_axis(len: usize) -> Vec<DateTime<Utc>> {
        (0..len)
            .map(|i| {
                Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap()
                    + chrono::Duration::hours(6 * i as i64)
            })
            .collect()
    }

    fn track_of(steps: usize, wind: f64) -> CycloneTrack {
        let per_step: Vec<Vec<CycloneCandidate>> =
            (0..steps).map(|t| vec![cand(t, wind)]).collect();
        let params = CalibrationParams {
            min_lifetime_steps: 1,
            ..CalibrationParams::default()
        };
        let mut tracks = track_candidates(&per_step, &params);
        tracks.remove(0)
    }

    #[test]
    fn intensity_bands_are_half_open() {
        assert_eq!(IntensityClass::from_max_wind(14.9), IntensityClass::Weak);
        assert_eq!(IntensityClass::from_max_wind(15.0), IntensityClass::Moderate);
        assert_eq!(IntensityClass::from_max_wind(24.9), IntensityClass::Moderate);
        assert_eq!(IntensityClass::from_max_wind(25.0), IntensityClass::Strong);
    }

    #[test]
    fn stage_bands_are_half_open() {
        assert_eq!(
            DevelopmentStage::from_lifetime_hours(47.9),
            DevelopmentStage::ShortLived
        );
        assert_eq!(
            DevelopmentStage::from_lifetime_hours(48.0),
            DevelopmentStage::Mature
        );
        assert_eq!(
            DevelopmentStage::from_lifetime_hours(120.0),
            DevelopmentStage::LongLived
        );
    }

    #[test]
    fn classification_resolves_timestamps() {
        let track = track_of(4, 20.0);
        let axis = time_axis(4);
        let cyclones = classify_tracks(&[track], &axis);
        assert_eq!(cyclones.len(), 1);
        let c = &cyclones[0];
        assert_eq!(c.points.len(), 4);
        assert_eq!(c.first_time(), axis[0]);
        assert_eq!(c.last_time(), axis[3]);
        assert_eq!(c.points[2].step, 2);
        assert_eq!(c.lifetime_hours, 18.0);
    }

    #[test]
    fn classification_bands_apply_to_track_extrema() {
        // 4 steps = 18 h lifetime, wind 20 m/s: moderate and short-lived.
        let cyclones = classify_tracks(&[track_of(4, 20.0)], &time_axis(4));
        assert_eq!(cyclones[0].intensity_class, IntensityClass::Moderate);
        assert_eq!(cyclones[0].development_stage, DevelopmentStage::ShortLived);

        // 9 steps = 48 h lifetime, wind 30 m/s: strong and mature.
        let cyclones = classify_tracks(&[track_of(9, 30.0)], &time_axis(9));
        assert_eq!(cyclones[0].intensity_class, IntensityClass::Strong);
        assert_eq!(cyclones[0].development_stage, DevelopmentStage::Mature);
    }

    #[test]
    fn structure_metrics_average_over_the_track() {
        let cyclones = classify_tracks(&[track_of(4, 21.0)], &time_axis(4));
        let s = &cyclones[0].structure;
        assert_eq!(s.num_candidates, 4);
        assert!((s.mean_vorticity - 2.0e-4).abs() < 1.0e-12);
        assert!((s.mean_wind_speed - 21.0).abs() < 1.0e-12);
    }

    #[test]
    fn labels_match_serde_names() {
        assert_eq!(
            serde_json::to_string(&IntensityClass::Strong).unwrap(),
            "\"strong\""
        );
        assert_eq!(
            serde_json::to_string(&DevelopmentStage::ShortLived).unwrap(),
            "\"short_lived\""
        );
        assert_eq!(IntensityClass::Strong.label(), "strong");
        assert_eq!(DevelopmentStage::ShortLived.label(), "short_lived");
    }
}
