//! Per-timestep candidate identification.
//!
//! A grid cell becomes a candidate when it clears the per-timestep vorticity
//! and wind percentile cutoffs, is a local extremum of |vorticity| in its
//! 5x5 neighborhood, and spins the right way for its hemisphere. Nearby
//! survivors are then consolidated so one storm yields one candidate.

use ndarray::{s, Array2, ArrayView2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::calibration::CalibrationParams;
use crate::cube::FeatureCube;
use crate::error::Result;
use crate::geo::KM_PER_DEGREE;
use crate::stats::percentile;

/// Half-width of the local-extremum neighborhood (5x5 window).
const EXTREMUM_HALF_WIDTH: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, schemars::JsonSchema)]
pub enum Hemisphere {
    #[serde(rename = "NH")]
    Northern,
    #[serde(rename = "SH")]
    Southern,
}

impl Hemisphere {
    /// The equator itself tags as southern.
    pub fn of_latitude(lat: f64) -> Hemisphere {
        if lat > 0.0 {
            Hemisphere::Northern
        } else {
            Hemisphere::Southern
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Hemisphere::Northern => "NH",
            Hemisphere::Southern => "SH",
        }
    }
}

/// A single-timestep detection, before any temporal linking.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CycloneCandidate {
    /// Index into the cube time axis.
    pub step: usize,
    /// Grid indices into the lat/lon axes.
    pub y: usize,
    pub x: usize,
    pub lat: f64,
    pub lon: f64,
    /// Signed relative vorticity at the cell, 1/s.
    pub vorticity: f64,
    pub wind_speed: f64,
    pub pressure_gradient: f64,
    pub hemisphere: Hemisphere,
}

impl CycloneCandidate {
    pub fn vorticity_magnitude(&self) -> f64 {
        self.vorticity.abs()
    }
}

/// Identifies candidates for every timestep of the feature cube.
///
/// The outer vec is indexed by timestep; timesteps are independent and run
/// in parallel. Percentile cutoffs are recomputed per timestep so a quiet
/// frame does not inherit thresholds from an active one.
pub fn identify_candidates(
    features: &FeatureCube,
    params: &CalibrationParams,
) -> Result<Vec<Vec<CycloneCandidate>>> {
    let t_len = features.time.len();
    log::info!(
        "identifying candidates over {} timesteps (vort p{}, wind p{})",
        t_len,
        params.vorticity_percentile,
        params.wind_percentile
    );

    let per_step: Vec<Vec<CycloneCandidate>> = (0..t_len)
        .into_par_iter()
        .map(|t| identify_candidates_at(features, params, t))
        .collect::<Result<Vec<_>>>()?;

    let total: usize = per_step.iter().map(Vec::len).sum();
    log::info!("identified {} candidates across {} timesteps", total, t_len);
    Ok(per_step)
}

fn identify_candidates_at(
    features: &FeatureCube,
    params: &CalibrationParams,
    t: usize,
) -> Result<Vec<CycloneCandidate>> {
    let vort = features.vorticity_10m.slice(s![t, .., ..]);
    let wind = features.wind_speed_10m.slice(s![t, .., ..]);
    let grad = features.pressure_gradient.slice(s![t, .., ..]);

    let vort_mag: Array2<f64> = vort.mapv(f64::abs);
    let mag_flat: Vec<f64> = vort_mag.iter().copied().collect();
    let wind_flat: Vec<f64> = wind.iter().copied().collect();

    let vort_cutoff = percentile(&mag_flat, params.vorticity_percentile)?;
    let wind_cutoff = percentile(&wind_flat, params.wind_percentile)?;

    let (y_len, x_len) = vort_mag.dim();
    let mut raw = Vec::new();
    for y in 0..y_len {
        for x in 0..x_len {
            if vort_mag[[y, x]] <= vort_cutoff || wind[[y, x]] <= wind_cutoff {
                continue;
            }
            if !is_local_extremum(&vort_mag, y, x) {
                continue;
            }
            let lat = features.lat[y];
            let signed = vort[[y, x]];
            // Cyclonic spin only: positive vorticity north of the equator,
            // negative south of it. Exactly on the equator either sign passes.
            if (lat > 0.0 && signed < 0.0) || (lat < 0.0 && signed > 0.0) {
                continue;
            }
            raw.push(CycloneCandidate {
                step: t,
                y,
                x,
                lat,
                lon: features.lon[x],
                vorticity: signed,
                wind_speed: wind[[y, x]],
                pressure_gradient: grad[[y, x]],
                hemisphere: Hemisphere::of_latitude(lat),
            });
        }
    }

    let consolidated = consolidate(raw, params.cluster_radius_km);
    log::trace!("timestep {}: {} candidates", t, consolidated.len());
    Ok(consolidated)
}

/// True when the cell holds the maximum of its clamped 5x5 neighborhood.
/// Plateau ties pass; consolidation collapses them afterwards.
fn is_local_extremum(mag: &Array2<f64>, y: usize, x: usize) -> bool {
    let (y_len, x_len) = mag.dim();
    let y0 = y.saturating_sub(EXTREMUM_HALF_WIDTH);
    let y1 = (y + EXTREMUM_HALF_WIDTH).min(y_len - 1);
    let x0 = x.saturating_sub(EXTREMUM_HALF_WIDTH);
    let x1 = (x + EXTREMUM_HALF_WIDTH).min(x_len - 1);
    let center = mag[[y, x]];
    for yy in y0..=y1 {
        for xx in x0..=x1 {
            if mag[[yy, xx]] > center {
                return false;
            }
        }
    }
    true
}

/// Greedy spatial consolidation in scan order: each unclaimed candidate
/// seeds a cluster of every unclaimed candidate within the radius, and only
/// the strongest |vorticity| member of the cluster survives.
///
/// Distances here are planar degree distances, matching the tracker.
fn consolidate(candidates: Vec<CycloneCandidate>, cluster_radius_km: f64) -> Vec<CycloneCandidate> {
    if candidates.len() <= 1 {
        return candidates;
    }
    let radius_deg = cluster_radius_km / KM_PER_DEGREE;
    let n = candidates.len();
    let mut claimed = vec![false; n];
    let mut kept = Vec::new();

    for i in 0..n {
        if claimed[i] {
            continue;
        }
        let mut cluster = Vec::new();
        for (j, cand) in candidates.iter().enumerate() {
            if claimed[j] {
                continue;
            }
            let d_lat = candidates[i].lat - cand.lat;
            let d_lon = candidates[i].lon - cand.lon;
            if (d_lat * d_lat + d_lon * d_lon).sqrt() <= radius_deg {
                cluster.push(j);
            }
        }
        let mut strongest = i;
        for &j in &cluster {
            if candidates[j].vorticity_magnitude() > candidates[strongest].vorticity_magnitude() {
                strongest = j;
            }
        }
        kept.push(candidates[strongest]);
        for j in cluster {
            claimed[j] = true;
        }
    }
    kept
}

// ============================================================================
// Tests
// ============================================================================
