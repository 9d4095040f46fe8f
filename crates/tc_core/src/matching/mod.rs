//! Matching detected cyclones against the reference archive and scoring
//! the agreement.

pub mod basin;
pub mod matcher;
pub mod metrics;

pub use basin::{analyze_by_basin, basin_name, BasinStats};
pub use matcher::{
    distance_series, match_tracks, MatchResult, MatchSet, MAX_MEAN_SEPARATION_KM,
    MAX_MIN_SEPARATION_KM, MAX_POINT_TIME_DIFF_HOURS, MIN_OVERLAP_HOURS,
};
pub use metrics::{
    compute_metrics, Assessment, DetectionMetrics, PerformanceAssessment, TrackQualityMetrics,
    ValidationMetrics, POSITION_ERROR_TARGET_KM, PRECISION_TARGET, RECALL_TARGET,
};
