//! Per-basin breakdown of matching outcomes.
//!
//! Surfaces systematic regional bias: a detector tuned on Pacific storms
//! can look fine in aggregate while missing everything in the Atlantic.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};

use crate::besttrack::BestTrack;
use crate::matching::matcher::MatchSet;
use crate::stats::mean;

/// Standard archive basin codes and their display names.
pub static BASIN_NAMES: Lazy<BTreeMap<&'static str, &'static str>> = Lazy::new(|| {
    BTreeMap::from([
        ("NA", "North Atlantic"),
        ("EP", "Eastern North Pacific"),
        ("WP", "Western North Pacific"),
        ("NI", "North Indian"),
        ("SI", "South Indian"),
        ("SP", "Southern Pacific"),
        ("SA", "South Atlantic"),
    ])
});

/// Display name for a basin code; unknown codes pass through unchanged.
pub fn basin_name(code: &str) -> &str {
    BASIN_NAMES.get(code).copied().unwrap_or(code)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct BasinStats {
    pub total_references: usize,
    pub detected: usize,
    pub missed: usize,
    pub recall: f64,
    /// Mean of the matched pairs' mean separations; `None` with no matches.
    pub mean_position_error_km: Option<f64>,
}

/// Groups matching outcomes by reference basin. Keys are basin codes,
/// ordered, so serialized output is stable.
pub fn analyze_by_basin(
    match_set: &MatchSet,
    references: &[BestTrack],
) -> BTreeMap<String, BasinStats> {
    let mut detected: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for m in &match_set.matches {
        detected
            .entry(m.reference_basin.as_str())
            .or_default()
            .push(m.mean_separation_km);
    }

    let mut missed: BTreeMap<&str, usize> = BTreeMap::new();
    for sid in &match_set.unmatched_reference_sids {
        if let Some(reference) = references.iter().find(|r| &r.sid == sid) {
            *missed.entry(reference.basin.as_str()).or_insert(0) += 1;
        }
    }

    let mut totals: BTreeMap<&str, usize> = BTreeMap::new();
    for reference in references {
        *totals.entry(reference.basin.as_str()).or_insert(0) += 1;
    }

    let mut stats = BTreeMap::new();
    for (basin, total) in totals {
        let errors = detected.get(basin).cloned().unwrap_or_default();
        let hit = errors.len();
        stats.insert(
            basin.to_string(),
            BasinStats {
                total_references: total,
                detected: hit,
                missed: missed.get(basin).copied().unwrap_or(0),
                recall: if total > 0 { hit as f64 / total as f64 } else { 0.0 },
                mean_position_error_km: if errors.is_empty() {
                    None
                } else {
                    Some(mean(&errors))
                },
            },
        );
    }
    stats
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::matching::matcher::MatchResult;
    use chrono::{TimeZone, Utc};

    fn reference(sid: &str, basin: &str) -> BestTrack {
        let base = Utc.with_ymd_and_hms(2024, 9, 1, 0, 0, 0).unwrap();
        let times: Vec<_> = (0..5).map(|i| base + chrono::Duration::hours(6 * i)).collect();
        BestTrack {
            sid: sid.to_string(),
            basin: basin.to_string(),
            times,
            lats: vec![15.0; 5],
            lons: vec![130.0; 5],
            max_winds: vec![None; 5],
            min_pressures: vec![None; 5],
        }
    }

    fn match_for(sid: &str, basin: &str, mean_km: f64) -> MatchResult {
        MatchResult {
            detected_id: 0,
            reference_sid: sid.to_string(),
            reference_basin: basin.to_string(),
            mean_separation_km: mean_km,
            min_separation_km: mean_km,
            overlap_hours: 24.0,
        }
    }

    #[test]
    fn known_codes_resolve_to_names() {
        assert_eq!(basin_name("WP"), "Western North Pacific");
        assert_eq!(basin_name("NA"), "North Atlantic");
        assert_eq!(basin_name("XX"), "XX");
        assert_eq!(basin_name("UNKNOWN"), "UNKNOWN");
    }

    #[test]
    fn stats_split_hits_and_misses_by_basin() {
        let references = vec![
            reference("WP1", "WP"),
            reference("WP2", "WP"),
            reference("EP1", "EP"),
        ];
        let set = MatchSet {
            matches: vec![match_for("WP1", "WP", 120.0)],
            unmatched_detected_ids: vec![],
            unmatched_reference_sids: vec!["WP2".to_string(), "EP1".to_string()],
            total_detected: 1,
            total_references: 3,
        };
        let stats = analyze_by_basin(&set, &references);

        let wp = &stats["WP"];
        assert_eq!(wp.total_references, 2);
        assert_eq!(wp.detected, 1);
        assert_eq!(wp.missed, 1);
        assert_eq!(wp.recall, 0.5);
        assert_eq!(wp.mean_position_error_km, Some(120.0));

        let ep = &stats["EP"];
        assert_eq!(ep.total_references, 1);
        assert_eq!(ep.detected, 0);
        assert_eq!(ep.recall, 0.0);
        assert_eq!(ep.mean_position_error_km, None);
    }

    #[test]
    fn basins_with_no_references_do_not_appear() {
        let stats = analyze_by_basin(
            &MatchSet {
                matches: vec![],
                unmatched_detected_ids: vec![],
                unmatched_reference_sids: vec![],
                total_detected: 0,
                total_references: 0,
            },
            &[],
        );
        assert!(stats.is_empty());
    }

    #[test]
    fn mean_error_averages_within_the_basin() {
        let references = vec![reference("A", "NI"), reference("B", "NI")];
        let set = MatchSet {
            matches: vec![match_for("A", "NI", 100.0), match_for("B", "NI", 300.0)],
            unmatched_detected_ids: vec![],
            unmatched_reference_sids: vec![],
            total_detected: 2,
            total_references: 2,
        };
        let stats = analyze_by_basin(&set, &references);
        assert_eq!(stats["NI"].mean_position_error_km, Some(200.0));
        assert_eq!(stats["NI"].recall, 1.0);
    }
}
