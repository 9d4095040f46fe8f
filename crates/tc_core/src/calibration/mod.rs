//! Detection parameters, sweeps, and adjustment advice.

pub mod calibrator;
pub mod params;
pub mod plan;
pub mod recommend;
pub mod scenarios;

pub use calibrator::{
    calibrate_parameter, calibration_score, load_calibration_results, run_calibration_sweep,
    run_full_calibration, save_calibration_results, CalibrationResult, CalibrationRun,
    SweepOutcome,
};
pub use params::CalibrationParams;
pub use plan::{generate_calibration_plan, CalibrationPlan, ParameterPlan, SweepParameter};
pub use recommend::{
    recommend_adjustments, CalibrationRecommendations, Recommendation, RecommendationStatus,
};
pub use scenarios::{drifting_storm_scenario, quiet_scenario, SyntheticScenario};
