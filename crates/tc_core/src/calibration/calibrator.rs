//! Evidence-based parameter calibration.
//!
//! One parameter moves at a time, and every tested value re-runs the whole
//! detect-and-match pipeline. Scores weigh recall over precision over
//! position accuracy, so a sweep never trades a found storm for a few km
//! of track error.

use std::path::Path;

use chrono::{DateTime, Utc};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::besttrack::BestTrack;
use crate::calibration::plan::{CalibrationPlan, SweepParameter};
use crate::calibration::CalibrationParams;
use crate::cube::FeatureCube;
use crate::detection::detect_cyclones;
use crate::error::Result;
use crate::matching::{compute_metrics, match_tracks, ValidationMetrics};

const RECALL_WEIGHT: f64 = 0.4;
const PRECISION_WEIGHT: f64 = 0.3;
const POSITION_WEIGHT: f64 = 0.3;
/// Position error treated as total loss, km.
const POSITION_ERROR_FLOOR_KM: f64 = 500.0;

/// Outcome of one pipeline run under one parameter set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct CalibrationResult {
    pub params: CalibrationParams,
    pub metrics: ValidationMetrics,
    pub score: f64,
}

impl CalibrationResult {
    pub fn new(params: CalibrationParams, metrics: ValidationMetrics) -> CalibrationResult {
        let score = calibration_score(&metrics);
        CalibrationResult {
            params,
            metrics,
            score,
        }
    }
}

/// Combined quality score in [0, 1]; higher is better.
///
/// With no matched tracks the position term contributes zero rather than
/// poisoning the score, so parameter sets that find nothing still rank
/// below ones that find anything.
pub fn calibration_score(metrics: &ValidationMetrics) -> f64 {
    let recall = metrics.detection.recall.min(1.0);
    let precision = metrics.detection.precision.min(1.0);
    let position = metrics
        .track_quality
        .mean_position_error_km
        .map_or(0.0, |err| (1.0 - err / POSITION_ERROR_FLOOR_KM).max(0.0));
    RECALL_WEIGHT * recall + PRECISION_WEIGHT * precision + POSITION_WEIGHT * position
}

/// Detect, match, and score once with the given parameters.
pub fn run_full_calibration(
    features: &FeatureCube,
    references: &[BestTrack],
    params: &CalibrationParams,
) -> Result<CalibrationResult> {
    let cyclones = detect_cyclones(features, params)?;
    let match_set = match_tracks(&cyclones, references);
    let metrics = compute_metrics(&match_set);
    let result = CalibrationResult::new(params.clone(), metrics);
    log::debug!(
        "calibration run: score {:.3}, recall {:.1}%",
        result.score,
        result.metrics.detection.recall * 100.0
    );
    Ok(result)
}

/// Sweeps one parameter over `values`, re-running the pipeline for each.
///
/// Values run in parallel; results come back sorted by descending score,
/// ties preserving the input value order.
pub fn calibrate_parameter(
    features: &FeatureCube,
    references: &[BestTrack],
    base: &CalibrationParams,
    parameter: SweepParameter,
    values: &[f64],
) -> Result<Vec<CalibrationResult>> {
    log::info!(
        "calibrating {} over {} values",
        parameter.key(),
        values.len()
    );
    let mut results: Vec<CalibrationResult> = values
        .par_iter()
        .map(|&value| {
            let params = parameter.apply(base, value);
            run_full_calibration(features, references, &params)
        })
        .collect::<Result<Vec<_>>>()?;
    results.sort_by(|a, b| b.score.total_cmp(&a.score));
    if let Some(best) = results.first() {
        log::info!(
            "best {}: {} (score {:.3})",
            parameter.key(),
            parameter.get(&best.params),
            best.score
        );
    }
    Ok(results)
}

/// Full sweep outcome: the adopted parameter set plus every run observed
/// along the way.
#[derive(Debug, Clone, Serialize, Deserialize, schemars::JsonSchema)]
pub struct SweepOutcome {
    pub best: CalibrationResult,
    /// Every result from every parameter sweep, in execution order.
    pub history: Vec<CalibrationResult>,
}

/// Walks the plan in priority order. After each parameter sweep the best
/// value is adopted only if it beats the incumbent score, so the sweep
/// never regresses on an earlier parameter's gains.
pub fn run_calibration_sweep(
    features: &FeatureCube,
    references: &[BestTrack],
    base: &CalibrationParams,
    plan: &CalibrationPlan,
) -> Result<SweepOutcome> {
    let mut incumbent = run_full_calibration(features, references, base)?;
    let mut history = vec![incumbent.clone()];

    for parameter in SweepParameter::ALL {
        let values = match plan.parameters.get(parameter.key()) {
            Some(p) => p.range.clone(),
            None => continue,
        };
        let results =
            calibrate_parameter(features, references, &incumbent.params, parameter, &values)?;
        if let Some(best) = results.first() {
            if best.score > incumbent.score {
                log::info!(
                    "adopting {} = {} (score {:.3} > {:.3})",
                    parameter.key(),
                    parameter.get(&best.params),
                    best.score,
                    incumbent.score
                );
                incumbent = best.clone();
            }
        }
        history.extend(results);
    }

    Ok(SweepOutcome {
        best: incumbent,
        history,
    })
}

// ============================================================================
// Persistence
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationRun {
    pub timestamp: DateTime<Utc>,
    pub total_runs: usize,
    pub best_result: Option<CalibrationResult>,
    pub all_results: Vec<CalibrationResult>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct CalibrationRunFile {
    calibration_run: CalibrationRun,
}

/// Writes sorted calibration results as pretty JSON, best first.
pub fn save_calibration_results(results: &[CalibrationResult], path: &Path) -> Result<()> {
    let file = CalibrationRunFile {
        calibration_run: CalibrationRun {
            timestamp: Utc::now(),
            total_runs: results.len(),
            best_result: results.first().cloned(),
            all_results: results.to_vec(),
        },
    };
    let json = serde_json::to_string_pretty(&file)?;
    std::fs::write(path, json)?;
    log::info!("calibration results saved to {}", path.display());
    Ok(())
}

pub fn load_calibration_results(path: &Path) -> Result<CalibrationRun> {
    let text = std::fs::read_to_string(path)?;
    let file: CalibrationRunFile = serde_json::from_str(&text)?;
    Ok(file.calibration_run)
}

// ============================================================================
// Tests
// ============================================================================
