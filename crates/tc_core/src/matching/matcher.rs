//! Greedy one-to-one matching of detected cyclones to reference tracks.
//!
//! A pair can match only when it clears three criteria: temporal overlap of
//! at least 24 h, mean separation at most 300 km, and at least one detected
//! point within 150 km. Each detected cyclone then claims the best-scoring
//! unclaimed reference, so no reference storm is counted twice.

use fxhash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::besttrack::BestTrack;
use crate::detection::DetectedCyclone;
use crate::geo::haversine_km;
use crate::stats::mean;

/// A detected point farther than this from every reference observation
/// contributes no distance.
pub const MAX_POINT_TIME_DIFF_HOURS: i64 = 12;
pub const MIN_OVERLAP_HOURS: f64 = 24.0;
pub const MAX_MEAN_SEPARATION_KM: f64 = 300.0;
pub const MAX_MIN_SEPARATION_KM: f64 = 150.0;

/// One confirmed pairing and its quality numbers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MatchResult {
    pub detected_id: u64,
    pub reference_sid: String,
    pub reference_basin: String,
    pub mean_separation_km: f64,
    pub min_separation_km: f64,
    pub overlap_hours: f64,
}

/// Full outcome of a matching run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct MatchSet {
    pub matches: Vec<MatchResult>,
    pub unmatched_detected_ids: Vec<u64>,
    pub unmatched_reference_sids: Vec<String>,
    pub total_detected: usize,
    pub total_references: usize,
}

/// Distance from every detected point to the temporally nearest reference
/// observation, in detected-point order. Infinity marks a point with no
/// reference observation within 12 h.
pub fn distance_series(detected: &DetectedCyclone, reference: &BestTrack) -> Vec<f64> {
    detected
        .points
        .iter()
        .map(|point| {
            let mut nearest: Option<(i64, usize)> = None;
            for (i, obs_time) in reference.times.iter().enumerate() {
                let diff = (*obs_time - point.time).num_seconds().abs();
                if nearest.map_or(true, |(best, _)| diff < best) {
                    nearest = Some((diff, i));
                }
            }
            match nearest {
                Some((diff_secs, i)) if diff_secs <= MAX_POINT_TIME_DIFF_HOURS * 3600 => {
                    haversine_km(point.lat, point.lon, reference.lats[i], reference.lons[i])
                }
                _ => f64::INFINITY,
            }
        })
        .collect()
}

/// Duration both tracks were active, clamped at zero for disjoint spans.
fn overlap_hours(detected: &DetectedCyclone, reference: &BestTrack) -> f64 {
    let start = detected.first_time().max(reference.start_time());
    let end = detected.last_time().min(reference.end_time());
    if end <= start {
        return 0.0;
    }
    (end - start).num_seconds() as f64 / 3600.0
}

struct SpatialProximity {
    passes: bool,
    mean_km: f64,
    min_km: f64,
}

/// Mean and minimum separation over the finite entries of the distance
/// series. All-infinite series fail outright.
fn spatial_proximity(detected: &DetectedCyclone, reference: &BestTrack) -> SpatialProximity {
    let finite: Vec<f64> = distance_series(detected, reference)
        .into_iter()
        .filter(|d| d.is_finite())
        .collect();
    if finite.is_empty() {
        return SpatialProximity {
            passes: false,
            mean_km: f64::INFINITY,
            min_km: f64::INFINITY,
        };
    }
    let mean_km = mean(&finite);
    let min_km = finite.iter().copied().fold(f64::INFINITY, f64::min);
    SpatialProximity {
        passes: mean_km <= MAX_MEAN_SEPARATION_KM && min_km <= MAX_MIN_SEPARATION_KM,
        mean_km,
        min_km,
    }
}

/// Matches detected cyclones against the reference archive.
///
/// Detected cyclones are visited in order; candidate references are scored
/// by `mean + 0.5 * min` separation and the lowest score wins. Ties break
/// to the earlier reference, which keeps reruns bit-identical.
pub fn match_tracks(detected: &[DetectedCyclone], references: &[BestTrack]) -> MatchSet {
    log::info!(
        "matching {} detected cyclones against {} reference tracks",
        detected.len(),
        references.len()
    );

    let mut claimed: FxHashSet<usize> = FxHashSet::default();
    let mut matches = Vec::new();
    let mut unmatched_detected_ids = Vec::new();

    for cyclone in detected {
        let mut best: Option<(usize, f64, SpatialProximity)> = None;
        for (ref_idx, reference) in references.iter().enumerate() {
            if claimed.contains(&ref_idx) {
                continue;
            }
            if overlap_hours(cyclone, reference) < MIN_OVERLAP_HOURS {
                continue;
            }
            let proximity = spatial_proximity(cyclone, reference);
            if !proximity.passes {
                continue;
            }
            let score = proximity.mean_km + 0.5 * proximity.min_km;
            if best.as_ref().map_or(true, |(_, best_score, _)| score < *best_score) {
                best = Some((ref_idx, score, proximity));
            }
        }

        match best {
            Some((ref_idx, _, proximity)) => {
                let reference = &references[ref_idx];
                claimed.insert(ref_idx);
                matches.push(MatchResult {
                    detected_id: cyclone.track_id,
                    reference_sid: reference.sid.clone(),
                    reference_basin: reference.basin.clone(),
                    mean_separation_km: proximity.mean_km,
                    min_separation_km: proximity.min_km,
                    overlap_hours: overlap_hours(cyclone, reference),
                });
            }
            None => unmatched_detected_ids.push(cyclone.track_id),
        }
    }

    let unmatched_reference_sids: Vec<String> = references
        .iter()
        .enumerate()
        .filter(|(i, _)| !claimed.contains(i))
        .map(|(_, r)| r.sid.clone())
        .collect();

    log::info!(
        "matching complete: {} matches, {} unmatched detected, {} unmatched references",
        matches.len(),
        unmatched_detected_ids.len(),
        unmatched_reference_sids.len()
    );

    MatchSet {
        matches,
        unmatched_detected_ids,
        unmatched_reference_sids,
        total_detected: detected.len(),
        total_references: references.len(),
    }
}

// ============================================================================
// Tests
// ============================================================================
