//! JSON API surface.
//!
//! String-based endpoints plus the request/response envelope shared by all
//! of them. Callers embed these functions behind whatever transport they
//! have; everything here is synchronous and side-effect free apart from
//! reading the referenced files.

pub mod validation_json;

pub use validation_json::{
    run_calibration_json, run_validation_json, ApiError, ApiResponse, CalibrationRequest,
    CalibrationResponse, ValidationRequest, ValidationResponse, API_VERSION,
};
