//! End-to-end validation runs.
//!
//! Ties the pipeline together: load the reference archive, detect cyclones
//! in a feature cube, match against the references, compute metrics and
//! recommendations, and emit the report files. The provenance guardrail at
//! the entry refuses cubes that did not come from the canonical forecast
//! model, so calibration numbers never silently describe the wrong data.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use tracing::{info, warn};

use crate::besttrack::{load_best_tracks, BestTrack};
use crate::calibration::{recommend_adjustments, CalibrationParams, CalibrationResult};
use crate::cube::{CubeMetadata, FeatureCube};
use crate::detection::detect_cyclones;
use crate::error::{Result, ValidationError};
use crate::matching::{analyze_by_basin, compute_metrics, match_tracks, Assessment};
use crate::report::{ReportFiles, ValidationReport};

/// Forecast model whose output this validation chain is calibrated against.
pub const CANONICAL_MODEL_ID: &str = "WeatherNext2";

/// Storms need 24 hours of archive coverage at the 6-hour cadence.
pub const DEFAULT_MIN_ARCHIVE_POINTS: usize = 4;

/// Rejects cubes whose metadata does not carry the canonical model id.
/// An empty or defaulted model field fails the same way.
pub fn ensure_model_provenance(metadata: &CubeMetadata) -> Result<()> {
    if metadata.model != CANONICAL_MODEL_ID {
        return Err(ValidationError::ModelProvenance {
            found: metadata.model.clone(),
            expected: CANONICAL_MODEL_ID.to_string(),
        });
    }
    Ok(())
}

pub struct ValidationOrchestrator {
    archive_path: PathBuf,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    min_archive_points: usize,
    references: Vec<BestTrack>,
}

impl ValidationOrchestrator {
    pub fn new(
        archive_path: impl Into<PathBuf>,
        window_start: DateTime<Utc>,
        window_end: DateTime<Utc>,
    ) -> ValidationOrchestrator {
        ValidationOrchestrator {
            archive_path: archive_path.into(),
            window_start,
            window_end,
            min_archive_points: DEFAULT_MIN_ARCHIVE_POINTS,
            references: Vec::new(),
        }
    }

    pub fn with_min_archive_points(mut self, min_points: usize) -> ValidationOrchestrator {
        self.min_archive_points = min_points;
        self
    }

    /// Loads the reference archive for the validation window.
    pub fn load_references(&mut self) -> Result<usize> {
        self.references = load_best_tracks(
            &self.archive_path,
            self.window_start,
            self.window_end,
            self.min_archive_points,
        )?;
        info!(
            "loaded {} reference tracks from {:?}",
            self.references.len(),
            self.archive_path
        );
        Ok(self.references.len())
    }

    pub fn references(&self) -> &[BestTrack] {
        &self.references
    }

    /// Detection, matching, metrics, and advice for one parameter set.
    pub fn run_validation(
        &self,
        features: &FeatureCube,
        params: &CalibrationParams,
    ) -> Result<ValidationReport> {
        ensure_model_provenance(&features.metadata)?;

        let detected = detect_cyclones(features, params)?;
        info!("detected {} cyclones", detected.len());

        let match_set = match_tracks(&detected, &self.references);
        let metrics = compute_metrics(&match_set);
        let basin_analysis = analyze_by_basin(&match_set, &self.references);
        let recommendations =
            recommend_adjustments(&CalibrationResult::new(params.clone(), metrics.clone()));

        info!(
            "validation: recall {:.3}, precision {:.3}, assessment {}",
            metrics.detection.recall,
            metrics.detection.precision,
            metrics.performance_assessment.overall_assessment.label()
        );

        Ok(ValidationReport {
            parameters: params.clone(),
            metrics,
            recommendations,
            detected_cyclones: detected.len(),
            reference_tracks: self.references.len(),
            window_start: self.window_start,
            window_end: self.window_end,
            basin_analysis: Some(basin_analysis),
        })
    }
}

/// A finished validation run and where its artifacts landed.
#[derive(Debug)]
pub struct CompletedValidation {
    pub report: ValidationReport,
    pub files: ReportFiles,
}

/// Full pipeline with report files: `{output_prefix}_report.txt` and
/// `{output_prefix}_results.json`.
pub fn run_complete_validation(
    features: &FeatureCube,
    archive_path: &Path,
    window_start: DateTime<Utc>,
    window_end: DateTime<Utc>,
    params: Option<CalibrationParams>,
    output_prefix: &Path,
) -> Result<CompletedValidation> {
    ensure_model_provenance(&features.metadata)?;

    info!(
        "validation window {} to {}, archive {:?}",
        window_start, window_end, archive_path
    );

    let mut orchestrator = ValidationOrchestrator::new(archive_path, window_start, window_end);
    orchestrator.load_references()?;

    let params = params.unwrap_or_default();
    let report = orchestrator.run_validation(features, &params)?;
    let files = report.write_files(output_prefix)?;

    match report.metrics.performance_assessment.overall_assessment {
        Assessment::Good => info!("validation passed performance targets"),
        Assessment::NeedsImprovement => {
            warn!("validation did not meet performance targets; see {:?}", files.text)
        }
    }

    Ok(CompletedValidation { report, files })
}

// ============================================================================
// Tests
// ============================================================================
