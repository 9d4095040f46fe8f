//! Temporal linking of candidates into tracks.
//!
//! Linking is greedy and deterministic: tracks are visited in creation
//! order, each claims its nearest unclaimed candidate within the speed cap,
//! and whatever is left over seeds new tracks. A track that misses a
//! timestep is closed; storms do not skip frames at 6 h resolution.

use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationParams;
use crate::detection::candidates::{CycloneCandidate, Hemisphere};

/// Forecast cadence in hours. Displacement caps and lifetimes both hang
/// off this value.
pub const TIMESTEP_HOURS: f64 = 6.0;

/// A completed track: an ordered run of candidates plus running extrema.
#[derive(Debug, Clone, PartialEq)]
pub struct CycloneTrack {
    pub id: u64,
    /// Candidates in timestep order, one per step, consecutive steps.
    pub candidates: Vec<CycloneCandidate>,
    /// Signed vorticity of the strongest-|vorticity| candidate.
    pub max_vorticity: f64,
    pub max_wind_speed: f64,
    pub min_pressure_gradient: f64,
    pub hemisphere: Hemisphere,
}

impl CycloneTrack {
    pub fn len(&self) -> usize {
        self.candidates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.candidates.is_empty()
    }

    pub fn first_step(&self) -> usize {
        self.candidates[0].step
    }

    pub fn last_step(&self) -> usize {
        self.candidates[self.candidates.len() - 1].step
    }

    /// Span between first and last candidate in hours. A single-candidate
    /// track has no duration.
    pub fn lifetime_hours(&self) -> f64 {
        if self.candidates.len() < 2 {
            return 0.0;
        }
        (self.last_step() - self.first_step()) as f64 * TIMESTEP_HOURS
    }
}

/// Accumulates candidates for one storm while linking is still running.
#[derive(Debug)]
pub struct TrackBuilder {
    id: u64,
    candidates: Vec<CycloneCandidate>,
    max_abs_vorticity: f64,
    max_vorticity: f64,
    max_wind_speed: f64,
    min_pressure_gradient: f64,
}

impl TrackBuilder {
    fn start(id: u64, first: CycloneCandidate) -> TrackBuilder {
        let mut builder = TrackBuilder {
            id,
            candidates: Vec::new(),
            max_abs_vorticity: 0.0,
            max_vorticity: 0.0,
            max_wind_speed: f64::NEG_INFINITY,
            min_pressure_gradient: f64::INFINITY,
        };
        builder.push(first);
        builder
    }

    fn push(&mut self, candidate: CycloneCandidate) {
        if candidate.vorticity_magnitude() >= self.max_abs_vorticity {
            self.max_abs_vorticity = candidate.vorticity_magnitude();
            self.max_vorticity = candidate.vorticity;
        }
        self.max_wind_speed = self.max_wind_speed.max(candidate.wind_speed);
        self.min_pressure_gradient = self.min_pressure_gradient.min(candidate.pressure_gradient);
        self.candidates.push(candidate);
    }

    fn last(&self) -> &CycloneCandidate {
        &self.candidates[self.candidates.len() - 1]
    }

    fn len(&self) -> usize {
        self.candidates.len()
    }

    fn finish(self) -> CycloneTrack {
        let hemisphere = self.candidates[0].hemisphere;
        CycloneTrack {
            id: self.id,
            candidates: self.candidates,
            max_vorticity: self.max_vorticity,
            max_wind_speed: self.max_wind_speed,
            min_pressure_gradient: self.min_pressure_gradient,
            hemisphere,
        }
    }
}

/// Links per-timestep candidates into tracks and drops anything shorter
/// than `min_lifetime_steps`.
///
/// Distances use the planar degree approximation so the displacement cap
/// matches the consolidation geometry.
pub fn track_candidates(
    per_step: &[Vec<CycloneCandidate>],
    params: &CalibrationParams,
) -> Vec<CycloneTrack> {
    let max_step_km = params.max_cyclone_speed_kmh * TIMESTEP_HOURS;
    let mut builders: Vec<TrackBuilder> = Vec::new();
    let mut next_id: u64 = 0;

    for (t, candidates) in per_step.iter().enumerate() {
        if candidates.is_empty() {
            continue;
        }
        let mut claimed = vec![false; candidates.len()];

        for builder in builders.iter_mut() {
            if builder.last().step + 1 != t {
                continue;
            }
            let tail = *builder.last();
            let mut best: Option<(usize, f64)> = None;
            for (i, candidate) in candidates.iter().enumerate() {
                if claimed[i] {
                    continue;
                }
                let d = crate::geo::planar_degree_km(tail.lat, tail.lon, candidate.lat, candidate.lon);
                if d <= max_step_km && best.map_or(true, |(_, best_d)| d < best_d) {
                    best = Some((i, d));
                }
            }
            if let Some((i, _)) = best {
                builder.push(candidates[i]);
                claimed[i] = true;
            }
        }

        for (i, candidate) in candidates.iter().enumerate() {
            if !claimed[i] {
                builders.push(TrackBuilder::start(next_id, *candidate));
                next_id += 1;
            }
        }
        log::trace!(
            "timestep {}: {} candidates, {} open tracks",
            t,
            candidates.len(),
            builders.len()
        );
    }

    let total = builders.len();
    let tracks: Vec<CycloneTrack> = builders
        .into_iter()
        .filter(|b| b.len() >= params.min_lifetime_steps)
        .map(TrackBuilder::finish)
        .collect();
    log::info!(
        "linked {} raw tracks, {} kept after lifetime filter (>= {} steps)",
        total,
        tracks.len(),
        params.min_lifetime_steps
    );
    tracks
}

/// Distribution of track lengths in candidates, for diagnostics output.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrackLengthStats {
    pub count: usize,
    pub min_len: usize,
    pub max_len: usize,
    pub mean_len: f64,
}

pub fn track_length_stats(tracks: &[CycloneTrack]) -> TrackLengthStats {
    if tracks.is_empty() {
        return TrackLengthStats {
            count: 0,
            min_len: 0,
            max_len: 0,
            mean_len: 0.0,
        };
    }
    let lens: Vec<usize> = tracks.iter().map(CycloneTrack::len).collect();
    let sum: usize = lens.iter().sum();
    TrackLengthStats {
        count: tracks.len(),
        min_len: lens.iter().copied().fold(usize::MAX, usize::min),
        max_len: lens.iter().copied().fold(0, usize::max),
        mean_len: sum as f64 / tracks.len() as f64,
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn cand(step: usize, lat: f64, lon: f64) -> CycloneCandidate {
        CycloneCandidate {
            step,
            y: 0,
            x: 0,
            lat,
            lon,
            vorticity: 1.0e-4,
            wind_speed: 18.0,
            pressure_gradient: 0.01,
            hemisphere: Hemisphere::of_latitude(lat),
        }
    }

    fn params_with_lifetime(min_lifetime_steps: usize) -> CalibrationParams {
        CalibrationParams {
            min_lifetime_steps,
            ..CalibrationParams::default()
        }
    }

    #[test]
    fn slow_drift_links_into_one_track() {
        // 0.5 degrees per step is ~55 km, well under the 600 km cap.
        let per_step: Vec<Vec<CycloneCandidate>> = (0..6)
            .map(|t| vec![cand(t, 15.0, 130.0 + 0.5 * t as f64)])
            .collect();
        let tracks = track_candidates(&per_step, &CalibrationParams::default());
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].len(), 6);
        assert_eq!(tracks[0].first_step(), 0);
        assert_eq!(tracks[0].last_step(), 5);
        assert_eq!(tracks[0].lifetime_hours(), 30.0);
    }

    #[test]
    fn teleporting_candidate_starts_a_new_track() {
        // A 20 degree jump (~2220 km) exceeds 100 km/h * 6 h = 600 km.
        let per_step = vec![
            vec![cand(0, 15.0, 130.0)],
            vec![cand(1, 15.0, 130.2)],
            vec![cand(2, 15.0, 130.4)],
            vec![cand(3, 15.0, 130.6)],
            vec![cand(4, 15.0, 150.6)],
            vec![cand(5, 15.0, 150.8)],
            vec![cand(6, 15.0, 151.0)],
            vec![cand(7, 15.0, 151.2)],
        ];
        let tracks = track_candidates(&per_step, &params_with_lifetime(4));
        assert_eq!(tracks.len(), 2, "the jump should split the storm in two");
        assert_eq!(tracks[0].candidates[0].lon, 130.0);
        assert_eq!(tracks[1].candidates[0].lon, 150.6);
    }

    #[test]
    fn displacement_cap_is_inclusive() {
        // 5.0 degrees = 555 km: inside the cap. 5.5 degrees = 610.5 km: out.
        let inside: Vec<Vec<CycloneCandidate>> = (0..4)
            .map(|t| vec![cand(t, 10.0, 100.0 + 5.0 * t as f64)])
            .collect();
        assert_eq!(track_candidates(&inside, &params_with_lifetime(4)).len(), 1);

        let outside: Vec<Vec<CycloneCandidate>> = (0..4)
            .map(|t| vec![cand(t, 10.0, 100.0 + 5.5 * t as f64)])
            .collect();
        assert!(track_candidates(&outside, &params_with_lifetime(4)).is_empty());
    }

    #[test]
    fn short_tracks_are_dropped() {
        let per_step: Vec<Vec<CycloneCandidate>> = (0..3)
            .map(|t| vec![cand(t, 15.0, 130.0)])
            .collect();
        assert!(track_candidates(&per_step, &params_with_lifetime(4)).is_empty());

        let per_step: Vec<Vec<CycloneCandidate>> = (0..4)
            .map(|t| vec![cand(t, 15.0, 130.0)])
            .collect();
        assert_eq!(track_candidates(&per_step, &params_with_lifetime(4)).len(), 1);
    }

    #[test]
    fn a_missed_timestep_closes_the_track() {
        let per_step = vec![
            vec![cand(0, 15.0, 130.0)],
            vec![cand(1, 15.0, 130.2)],
            vec![],
            vec![cand(3, 15.0, 130.4)],
            vec![cand(4, 15.0, 130.6)],
        ];
        let tracks = track_candidates(&per_step, &params_with_lifetime(2));
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].last_step(), 1);
        assert_eq!(tracks[1].first_step(), 3);
    }

    #[test]
    fn earlier_track_claims_the_shared_candidate() {
        // Two tracks converge on one candidate at t=2; the older track is
        // visited first and claims it, leaving the younger one to die.
        let per_step = vec![
            vec![cand(0, 15.0, 130.0)],
            vec![cand(1, 15.0, 130.0), cand(1, 16.0, 130.0)],
            vec![cand(2, 15.2, 130.0)],
            vec![cand(3, 15.4, 130.0)],
        ];
        let tracks = track_candidates(&per_step, &params_with_lifetime(4));
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].id, 0);
        assert_eq!(tracks[0].len(), 4);
    }

    #[test]
    fn nearest_candidate_wins_the_link() {
        let per_step = vec![
            vec![cand(0, 15.0, 130.0)],
            vec![cand(1, 15.0, 133.0), cand(1, 15.0, 131.0)],
        ];
        let tracks = track_candidates(&per_step, &params_with_lifetime(1));
        // The track extends to the closer candidate even though the farther
        // one appears first; the farther one seeds its own track.
        assert_eq!(tracks.len(), 2);
        assert_eq!(tracks[0].candidates[1].lon, 131.0);
        assert_eq!(tracks[1].candidates[0].lon, 133.0);
    }

    #[test]
    fn extrema_track_the_strongest_candidate() {
        let mut a = cand(0, 15.0, 130.0);
        a.vorticity = 1.0e-4;
        a.wind_speed = 12.0;
        a.pressure_gradient = 0.02;
        let mut b = cand(1, 15.0, 130.2);
        b.vorticity = 3.0e-4;
        b.wind_speed = 28.0;
        b.pressure_gradient = 0.005;
        let tracks = track_candidates(&[vec![a], vec![b]], &params_with_lifetime(2));
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].max_vorticity, 3.0e-4);
        assert_eq!(tracks[0].max_wind_speed, 28.0);
        assert_eq!(tracks[0].min_pressure_gradient, 0.005);
    }

    #[test]
    fn southern_track_reports_signed_peak_vorticity() {
        let mut a = cand(0, -15.0, 60.0);
        a.vorticity = -1.0e-4;
        let mut b = cand(1, -15.0, 60.2);
        b.vorticity = -4.0e-4;
        let tracks = track_candidates(&[vec![a], vec![b]], &params_with_lifetime(2));
        assert_eq!(tracks[0].max_vorticity, -4.0e-4);
        assert_eq!(tracks[0].hemisphere, Hemisphere::Southern);
    }

    #[test]
    fn no_candidates_no_tracks() {
        let tracks = track_candidates(&[vec![], vec![], vec![]], &CalibrationParams::default());
        assert!(tracks.is_empty());
        let stats = track_length_stats(&tracks);
        assert_eq!(stats.count, 0);
        assert_eq!(stats.mean_len, 0.0);
    }

    #[test]
    fn single_candidate_track_has_zero_lifetime() {
        let tracks = track_candidates(&[vec![cand(0, 15.0, 130.0)]], &params_with_lifetime(1));
        assert_eq!(tracks.len(), 1);
        assert_eq!(tracks[0].lifetime_hours(), 0.0);
    }
}
