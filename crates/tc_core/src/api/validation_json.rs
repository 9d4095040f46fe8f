//! JSON API for validation and calibration runs.
//!
//! String-in, string-out endpoints for the serving layer: each function
//! takes a request JSON, runs the pipeline, and returns a response envelope
//! that always parses, carrying either the result or a coded error.

use std::collections::HashMap;
use std::path::Path;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{error, info, warn};

use crate::besttrack::load_best_tracks;
use crate::cache::load_features;
use crate::calibration::{
    generate_calibration_plan, run_calibration_sweep, CalibrationParams, CalibrationResult,
};
use crate::cube::{FeatureCube, ForecastCubeFile};
use crate::error::{Result, ValidationError};
use crate::features::extract_features;
use crate::orchestrator::{
    ensure_model_provenance, ValidationOrchestrator, DEFAULT_MIN_ARCHIVE_POINTS,
};
use crate::report::ValidationReport;

/// API version for schema compatibility.
pub const API_VERSION: &str = "v1";

/// Standard API response wrapper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<ApiError>,
    pub schema_version: String,
    pub timestamp: DateTime<Utc>,
}

/// Structured API error with a stable code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiError {
    pub code: String,
    pub message: String,
    pub details: Option<HashMap<String, serde_json::Value>>,
}

impl ApiError {
    pub fn new(code: &str, message: &str) -> ApiError {
        ApiError {
            code: code.to_string(),
            message: message.to_string(),
            details: None,
        }
    }

    pub fn with_details(
        code: &str,
        message: &str,
        details: HashMap<String, serde_json::Value>,
    ) -> ApiError {
        ApiError {
            code: code.to_string(),
            message: message.to_string(),
            details: Some(details),
        }
    }

    pub fn from_validation_error(err: &ValidationError) -> ApiError {
        match err {
            ValidationError::ModelProvenance { found, expected } => {
                let mut details = HashMap::new();
                details.insert(
                    "found".to_string(),
                    serde_json::Value::String(found.clone()),
                );
                details.insert(
                    "expected".to_string(),
                    serde_json::Value::String(expected.clone()),
                );
                ApiError::with_details(err.code(), &err.to_string(), details)
            }
            _ => ApiError::new(err.code(), &err.to_string()),
        }
    }
}

impl<T> ApiResponse<T> {
    pub fn success(data: T) -> ApiResponse<T> {
        ApiResponse {
            success: true,
            data: Some(data),
            error: None,
            schema_version: API_VERSION.to_string(),
            timestamp: Utc::now(),
        }
    }

    pub fn error(error: ApiError) -> ApiResponse<T> {
        ApiResponse {
            success: false,
            data: None,
            error: Some(error),
            schema_version: API_VERSION.to_string(),
            timestamp: Utc::now(),
        }
    }
}

/// Validation run request. The forecast data comes either as an inline
/// wire-format cube or as a path to a stored feature cube.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationRequest {
    pub schema_version: Option<String>,
    pub cube: Option<ForecastCubeFile>,
    pub features_path: Option<String>,
    pub archive_path: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub params: Option<CalibrationParams>,
    pub min_archive_points: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ValidationResponse {
    pub report: ValidationReport,
    pub report_text: String,
}

/// Calibration sweep request over the same data sources.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationRequest {
    pub schema_version: Option<String>,
    pub cube: Option<ForecastCubeFile>,
    pub features_path: Option<String>,
    pub archive_path: String,
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub base_params: Option<CalibrationParams>,
    pub min_archive_points: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalibrationResponse {
    pub best: CalibrationResult,
    pub total_runs: usize,
    pub history: Vec<CalibrationResult>,
}

fn validate_source(
    schema_version: Option<&str>,
    has_cube: bool,
    has_features_path: bool,
) -> std::result::Result<(), ApiError> {
    if let Some(version) = schema_version {
        if version != API_VERSION {
            return Err(ApiError::new(
                "unsupported_schema_version",
                &format!("expected schema_version {API_VERSION}, got {version}"),
            ));
        }
    }
    match (has_cube, has_features_path) {
        (true, true) => Err(ApiError::new(
            "invalid_request",
            "provide either an inline cube or a feature store path, not both",
        )),
        (false, false) => Err(ApiError::new(
            "invalid_request",
            "a forecast cube or a feature store path is required",
        )),
        _ => Ok(()),
    }
}

impl ValidationRequest {
    fn validate(&self) -> std::result::Result<(), ApiError> {
        validate_source(
            self.schema_version.as_deref(),
            self.cube.is_some(),
            self.features_path.is_some(),
        )
    }
}

impl CalibrationRequest {
    fn validate(&self) -> std::result::Result<(), ApiError> {
        validate_source(
            self.schema_version.as_deref(),
            self.cube.is_some(),
            self.features_path.is_some(),
        )
    }
}

fn resolve_features(
    cube: Option<ForecastCubeFile>,
    features_path: Option<&str>,
) -> Result<FeatureCube> {
    match (cube, features_path) {
        (Some(file), _) => {
            let cube = file.into_cube()?;
            extract_features(&cube)
        }
        (None, Some(path)) => Ok(load_features(Path::new(path))?),
        (None, None) => unreachable!("request validation enforces a data source"),
    }
}

fn encode<T: Serialize>(response: ApiResponse<T>) -> String {
    serde_json::to_string(&response).unwrap_or_else(|_| "{}".to_string())
}

/// Run one validation from a JSON request string.
///
/// Returns a JSON string containing `ApiResponse<ValidationResponse>`.
pub fn run_validation_json(request_json: &str) -> String {
    info!("processing validation request");

    let request: ValidationRequest = match serde_json::from_str(request_json) {
        Ok(req) => req,
        Err(e) => {
            error!("failed to parse ValidationRequest: {}", e);
            let error = ApiError::new("invalid_json", &format!("invalid JSON: {e}"));
            return encode(ApiResponse::<ValidationResponse>::error(error));
        }
    };

    if let Err(error) = request.validate() {
        warn!("validation request rejected: {}", error.message);
        return encode(ApiResponse::<ValidationResponse>::error(error));
    }

    match execute_validation(request) {
        Ok(data) => {
            info!(
                "validation finished: {} detected, {} hits",
                data.report.detected_cyclones, data.report.metrics.detection.hits
            );
            encode(ApiResponse::success(data))
        }
        Err(e) => {
            error!("validation run failed: {}", e);
            encode(ApiResponse::<ValidationResponse>::error(
                ApiError::from_validation_error(&e),
            ))
        }
    }
}

/// Run a calibration sweep from a JSON request string.
///
/// Returns a JSON string containing `ApiResponse<CalibrationResponse>`.
pub fn run_calibration_json(request_json: &str) -> String {
    info!("processing calibration request");

    let request: CalibrationRequest = match serde_json::from_str(request_json) {
        Ok(req) => req,
        Err(e) => {
            error!("failed to parse CalibrationRequest: {}", e);
            let error = ApiError::new("invalid_json", &format!("invalid JSON: {e}"));
            return encode(ApiResponse::<CalibrationResponse>::error(error));
        }
    };

    if let Err(error) = request.validate() {
        warn!("calibration request rejected: {}", error.message);
        return encode(ApiResponse::<CalibrationResponse>::error(error));
    }

    match execute_calibration(request) {
        Ok(data) => {
            info!(
                "calibration finished: {} runs, best score {:.3}",
                data.total_runs, data.best.score
            );
            encode(ApiResponse::success(data))
        }
        Err(e) => {
            error!("calibration run failed: {}", e);
            encode(ApiResponse::<CalibrationResponse>::error(
                ApiError::from_validation_error(&e),
            ))
        }
    }
}

fn execute_validation(request: ValidationRequest) -> Result<ValidationResponse> {
    let features = resolve_features(request.cube, request.features_path.as_deref())?;

    let mut orchestrator = ValidationOrchestrator::new(
        request.archive_path.as_str(),
        request.window_start,
        request.window_end,
    )
    .with_min_archive_points(
        request
            .min_archive_points
            .unwrap_or(DEFAULT_MIN_ARCHIVE_POINTS),
    );
    orchestrator.load_references()?;

    let params = request.params.unwrap_or_default();
    let report = orchestrator.run_validation(&features, &params)?;
    let report_text = report.render_text();
    Ok(ValidationResponse {
        report,
        report_text,
    })
}

fn execute_calibration(request: CalibrationRequest) -> Result<CalibrationResponse> {
    let features = resolve_features(request.cube, request.features_path.as_deref())?;
    ensure_model_provenance(&features.metadata)?;

    let references = load_best_tracks(
        Path::new(&request.archive_path),
        request.window_start,
        request.window_end,
        request
            .min_archive_points
            .unwrap_or(DEFAULT_MIN_ARCHIVE_POINTS),
    )?;

    let base = request.base_params.unwrap_or_default();
    let plan = generate_calibration_plan(&base);
    let outcome = run_calibration_sweep(&features, &references, &base, &plan)?;

    Ok(CalibrationResponse {
        best: outcome.best,
        total_runs: outcome.history.len(),
        history: outcome.history,
    })
}

// ============================================================================
// Tests
// ============================================================================
