//! Tunable detection thresholds, threaded explicitly through the pipeline.
//!
//! There is no process-wide configuration: every stage receives the params
//! it runs with, which is what makes calibration reruns trustworthy.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(default)]
pub struct CalibrationParams {
    /// Per-timestep percentile of |vorticity| used as the detection cutoff.
    pub vorticity_percentile: f64,
    /// Per-timestep percentile of wind speed used as the support cutoff.
    pub wind_percentile: f64,
    /// Physical cap on track displacement, km/h.
    pub max_cyclone_speed_kmh: f64,
    /// Consolidation radius for merging adjacent detections, km.
    pub cluster_radius_km: f64,
    /// Minimum candidate count for a track to be kept.
    pub min_lifetime_steps: usize,
}

impl Default for CalibrationParams {
    fn default() -> CalibrationParams {
        CalibrationParams {
            vorticity_percentile: 99.5,
            wind_percentile: 90.0,
            max_cyclone_speed_kmh: 100.0,
            cluster_radius_km: 300.0,
            min_lifetime_steps: 4,
        }
    }
}

impl CalibrationParams {
    /// Range checks; call before running a pipeline with user-supplied values.
    pub fn validate(&self) -> Result<()> {
        let fail = |reason: String| Err(ValidationError::InvalidParams { reason });

        if !(0.0 < self.vorticity_percentile && self.vorticity_percentile < 100.0) {
            return fail(format!(
                "vorticity_percentile must be in (0, 100), got {}",
                self.vorticity_percentile
            ));
        }
        if !(0.0 < self.wind_percentile && self.wind_percentile < 100.0) {
            return fail(format!(
                "wind_percentile must be in (0, 100), got {}",
                self.wind_percentile
            ));
        }
        if !(self.max_cyclone_speed_kmh > 0.0) {
            return fail(format!(
                "max_cyclone_speed_kmh must be positive, got {}",
                self.max_cyclone_speed_kmh
            ));
        }
        if !(self.cluster_radius_km > 0.0) {
            return fail(format!(
                "cluster_radius_km must be positive, got {}",
                self.cluster_radius_km
            ));
        }
        if self.min_lifetime_steps == 0 {
            return fail("min_lifetime_steps must be at least 1".to_string());
        }
        Ok(())
    }

    pub fn from_yaml_str(text: &str) -> Result<CalibrationParams> {
        let params: CalibrationParams = serde_yaml::from_str(text)?;
        params.validate()?;
        Ok(params)
    }

    pub fn from_yaml_file(path: &std::path::Path) -> Result<CalibrationParams> {
        let text = std::fs::read_to_string(path)?;
        CalibrationParams::from_yaml_str(&text)
    }
}
