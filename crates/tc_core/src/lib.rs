//! # tc_core - Tropical Cyclone Detection and Validation Engine
//!
//! This library detects tropical cyclones in gridded surface forecasts and
//! validates the detections against an observed best-track archive.
//!
//! ## Features
//! - Physical diagnostics (wind speed, vorticity, divergence, pressure
//!   gradients, precipitation accumulations) from raw forecast fields
//! - Candidate identification, temporal tracking, and intensity classification
//! - Storm-level matching against reference archives with recall, precision,
//!   and position-error scoring
//! - Parameter calibration sweeps with adjustment recommendations
//! - Compressed feature store and a JSON API for serving layers

pub mod api;
pub mod besttrack;
pub mod cache;
pub mod calibration;
pub mod cube;
pub mod detection;
pub mod error;
pub mod features;
pub mod geo;
pub mod matching;
pub mod orchestrator;
pub mod report;
pub mod stats;

// Re-export main API functions
pub use api::{
    run_calibration_json, run_validation_json, ApiError, ApiResponse, CalibrationRequest,
    CalibrationResponse, ValidationRequest, ValidationResponse, API_VERSION,
};
pub use error::{Result, ValidationError};

// Re-export cube and feature types
pub use cube::{CubeMetadata, FeatureCube, ForecastCube, ForecastCubeFile, SurfaceFields};
pub use features::{extract_features, feature_info, FeatureInfo};

// Re-export the detection pipeline
pub use detection::{detect_cyclones, detection_summary, DetectedCyclone, DetectionSummary};

// Re-export reference archive handling
pub use besttrack::{
    archive_summary, filter_tracks, load_best_tracks, ArchiveSummary, BestTrack,
    BestTrackArchiveFile, SpatialBounds,
};

// Re-export matching and metrics
pub use matching::{
    analyze_by_basin, compute_metrics, match_tracks, Assessment, BasinStats, MatchSet,
    ValidationMetrics,
};

// Re-export calibration
pub use calibration::{
    drifting_storm_scenario, generate_calibration_plan, quiet_scenario, recommend_adjustments,
    run_calibration_sweep, CalibrationParams, CalibrationPlan, CalibrationRecommendations,
    CalibrationResult, SweepOutcome, SyntheticScenario,
};

// Re-export the feature store
pub use cache::{load_features, save_features, StoreError};

// Re-export orchestration and reporting
pub use orchestrator::{
    run_complete_validation, CompletedValidation, ValidationOrchestrator, CANONICAL_MODEL_ID,
};
pub use report::ValidationReport;

// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
