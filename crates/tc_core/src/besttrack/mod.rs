//! Reference best-track archive loading.
//!
//! The archive is a JSON file of observed storm tracks, one record per
//! storm with parallel per-point arrays. Loading filters each storm to the
//! validation window and drops storms left with too few points, so the
//! matcher only ever sees tracks that could plausibly be detected.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};
use crate::stats::FieldSummary;

/// An observed storm track from the reference archive, filtered to the
/// validation window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BestTrack {
    /// Storm identifier from the archive.
    pub sid: String,
    pub basin: String,
    /// Observation times, ascending.
    pub times: Vec<DateTime<Utc>>,
    pub lats: Vec<f64>,
    pub lons: Vec<f64>,
    /// Peak sustained wind per point, kt, where reported.
    pub max_winds: Vec<Option<f64>>,
    /// Minimum central pressure per point, hPa, where reported.
    pub min_pressures: Vec<Option<f64>>,
}

impl BestTrack {
    pub fn len(&self) -> usize {
        self.times.len()
    }

    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }

    pub fn start_time(&self) -> DateTime<Utc> {
        self.times[0]
    }

    pub fn end_time(&self) -> DateTime<Utc> {
        self.times[self.times.len() - 1]
    }

    pub fn lifetime_hours(&self) -> f64 {
        if self.times.len() < 2 {
            return 0.0;
        }
        (self.end_time() - self.start_time()).num_seconds() as f64 / 3600.0
    }

    /// Largest reported wind over the track, if any point carries one.
    pub fn peak_wind(&self) -> Option<f64> {
        self.max_winds
            .iter()
            .flatten()
            .copied()
            .fold(None, |acc: Option<f64>, w| {
                Some(acc.map_or(w, |a| a.max(w)))
            })
    }

    /// Envelope of the track's positions.
    pub fn spatial_bounds(&self) -> Option<SpatialBounds> {
        if self.is_empty() {
            return None;
        }
        let mut b = SpatialBounds {
            lat_min: self.lats[0],
            lat_max: self.lats[0],
            lon_min: self.lons[0],
            lon_max: self.lons[0],
        };
        for i in 1..self.len() {
            b.lat_min = b.lat_min.min(self.lats[i]);
            b.lat_max = b.lat_max.max(self.lats[i]);
            b.lon_min = b.lon_min.min(self.lons[i]);
            b.lon_max = b.lon_max.max(self.lons[i]);
        }
        Some(b)
    }
}

/// Lat/lon envelope in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SpatialBounds {
    pub lat_min: f64,
    pub lat_max: f64,
    pub lon_min: f64,
    pub lon_max: f64,
}

// ============================================================================
// Archive wire format
// ============================================================================

/// On-disk archive shape. `wind` and `mslp` are optional and may be
/// shorter than the position arrays in sloppy archives; missing entries
/// read as unreported.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestTrackArchiveFile {
    pub storms: Vec<BestTrackRecord>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BestTrackRecord {
    pub sid: String,
    #[serde(default)]
    pub basin: String,
    pub times: Vec<DateTime<Utc>>,
    pub lats: Vec<Option<f64>>,
    pub lons: Vec<Option<f64>>,
    #[serde(default)]
    pub wind: Vec<Option<f64>>,
    #[serde(default)]
    pub mslp: Vec<Option<f64>>,
}

impl BestTrackRecord {
    fn check_parallel(&self) -> Result<()> {
        let n = self.times.len();
        if self.lats.len() != n || self.lons.len() != n {
            return Err(ValidationError::ArchiveFormat {
                reason: format!(
                    "storm {}: times/lats/lons lengths differ ({}, {}, {})",
                    self.sid,
                    n,
                    self.lats.len(),
                    self.lons.len()
                ),
            });
        }
        Ok(())
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Loads the archive and filters every storm to `[window_start, window_end]`
/// inclusive. Points without a position are dropped; storms with fewer than
/// `min_points` surviving points are dropped whole.
pub fn load_best_tracks(
    path: &Path,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    min_points: usize,
) -> Result<Vec<BestTrack>> {
    if !path.exists() {
        return Err(ValidationError::ArchiveNotFound {
            path: path.display().to_string(),
        });
    }
    let text = std::fs::read_to_string(path)?;
    let archive: BestTrackArchiveFile =
        serde_json::from_str(&text).map_err(|e| ValidationError::ArchiveFormat {
            reason: e.to_string(),
        })?;
    let tracks = tracks_from_archive(archive, window_start, window_end, min_points)?;
    log::info!(
        "loaded {} reference tracks from {} (window {} to {})",
        tracks.len(),
        path.display(),
        window_start,
        window_end
    );
    Ok(tracks)
}

/// Archive to tracks, window filter applied. Split out from the file read
/// so in-memory archives (synthetic scenarios) go through the same path.
pub fn tracks_from_archive(
    archive: BestTrackArchiveFile,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    min_points: usize,
) -> Result<Vec<BestTrack>> {
    let mut tracks = Vec::new();
    for record in archive.storms {
        record.check_parallel()?;

        let mut points: Vec<(DateTime<Utc>, f64, f64, Option<f64>, Option<f64>)> = Vec::new();
        for i in 0..record.times.len() {
            let (lat, lon) = match (record.lats[i], record.lons[i]) {
                (Some(lat), Some(lon)) => (lat, lon),
                _ => continue,
            };
            let t = record.times[i];
            if t < window_start || t > window_end {
                continue;
            }
            let wind = record.wind.get(i).copied().flatten();
            let mslp = record.mslp.get(i).copied().flatten();
            points.push((t, lat, lon, wind, mslp));
        }
        if points.len() < min_points {
            log::debug!(
                "storm {} dropped: {} in-window points (need {})",
                record.sid,
                points.len(),
                min_points
            );
            continue;
        }
        points.sort_by_key(|p| p.0);

        let basin = if record.basin.trim().is_empty() {
            "UNKNOWN".to_string()
        } else {
            record.basin.trim().to_string()
        };
        tracks.push(BestTrack {
            sid: record.sid,
            basin,
            times: points.iter().map(|p| p.0).collect(),
            lats: points.iter().map(|p| p.1).collect(),
            lons: points.iter().map(|p| p.2).collect(),
            max_winds: points.iter().map(|p| p.3).collect(),
            min_pressures: points.iter().map(|p| p.4).collect(),
        });
    }
    Ok(tracks)
}

/// Keeps only storms meeting a lifetime floor and, when given, a basin
/// allowlist.
pub fn filter_tracks(
    tracks: &[BestTrack],
    min_lifetime_hours: f64,
    basins: Option<&[String]>,
) -> Vec<BestTrack> {
    tracks
        .iter()
        .filter(|t| t.lifetime_hours() >= min_lifetime_hours)
        .filter(|t| match basins {
            Some(allowed) => allowed.iter().any(|b| b == &t.basin),
            None => true,
        })
        .cloned()
        .collect()
}

// ============================================================================
// Summary
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct ArchiveSummary {
    pub num_storms: usize,
    pub num_points: usize,
    /// Storm count per basin, sorted by basin code.
    pub basins: BTreeMap<String, usize>,
    /// Mean/std/min/max over storm lifetimes, hours.
    pub lifetime_hours: FieldSummary,
    pub first_time: Option<DateTime<Utc>>,
    pub last_time: Option<DateTime<Utc>>,
    /// Envelope of every track position; `None` for an empty archive.
    pub bounds: Option<SpatialBounds>,
}

pub fn archive_summary(tracks: &[BestTrack]) -> ArchiveSummary {
    let mut basins: BTreeMap<String, usize> = BTreeMap::new();
    let mut first: Option<DateTime<Utc>> = None;
    let mut last: Option<DateTime<Utc>> = None;
    let mut bounds: Option<SpatialBounds> = None;
    let mut num_points = 0;
    for track in tracks {
        *basins.entry(track.basin.clone()).or_insert(0) += 1;
        num_points += track.len();
        if !track.is_empty() {
            first = Some(first.map_or(track.start_time(), |f| f.min(track.start_time())));
            last = Some(last.map_or(track.end_time(), |l| l.max(track.end_time())));
        }
        if let Some(tb) = track.spatial_bounds() {
            bounds = Some(match bounds {
                None => tb,
                Some(b) => SpatialBounds {
                    lat_min: b.lat_min.min(tb.lat_min),
                    lat_max: b.lat_max.max(tb.lat_max),
                    lon_min: b.lon_min.min(tb.lon_min),
                    lon_max: b.lon_max.max(tb.lon_max),
                },
            });
        }
    }
    let lifetimes: Vec<f64> = tracks.iter().map(BestTrack::lifetime_hours).collect();
    ArchiveSummary {
        num_storms: tracks.len(),
        num_points,
        basins,
        lifetime_hours: FieldSummary::of(lifetimes.iter().copied()),
        first_time: first,
        last_time: last,
        bounds,
    }
}

// ============================================================================
// Tests
// ============================================================================
