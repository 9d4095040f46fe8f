//! Feature extraction: raw surface fields to physical diagnostics.
//!
//! Pure computation, no heuristics and no geography assumptions. Every
//! output is checked against the coordinate-implied shape before it leaves
//! this module; detection never sees a malformed FeatureCube.

pub mod diagnostics;
pub mod gradient;
pub mod hydrology;

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::cube::{FeatureCube, ForecastCube};
use crate::error::{Result, ValidationError};
use crate::stats::FieldSummary;

/// Rolling window lengths at the 6-hour timestep.
const WINDOW_24H_STEPS: usize = 4;
const WINDOW_72H_STEPS: usize = 12;

/// Derive the full diagnostic set from a forecast cube.
pub fn extract_features(cube: &ForecastCube) -> Result<FeatureCube> {
    cube.validate()?;

    let [t, y, x] = cube.expected_shape();
    log::info!("extracting diagnostics from ({t}, {y}, {x}) cube");

    let wind_speed_10m = diagnostics::wind_speed(&cube.u10, &cube.v10);
    let vorticity_10m = diagnostics::relative_vorticity(&cube.u10, &cube.v10, &cube.lat, &cube.lon);
    let divergence_10m = diagnostics::divergence(&cube.u10, &cube.v10, &cube.lat, &cube.lon);
    let pressure_gradient = diagnostics::pressure_gradient(&cube.msl, &cube.lat, &cube.lon);
    let precip_24h = hydrology::rolling_accumulation(&cube.tp6, WINDOW_24H_STEPS);
    let precip_72h = hydrology::rolling_accumulation(&cube.tp6, WINDOW_72H_STEPS);
    let api = hydrology::antecedent_precipitation_index(&cube.tp6, hydrology::API_DECAY_FACTOR);

    let features = FeatureCube {
        time: cube.time.clone(),
        lat: cube.lat.clone(),
        lon: cube.lon.clone(),
        wind_speed_10m,
        vorticity_10m,
        divergence_10m,
        pressure_gradient,
        precip_24h,
        precip_72h,
        api,
        metadata: cube.metadata.clone(),
    };

    let expected = features.expected_shape();
    for (name, field) in features.fields() {
        let found = field.shape();
        let found = [found[0], found[1], found[2]];
        if found != expected {
            return Err(ValidationError::ShapeMismatch {
                field: name.to_string(),
                expected,
                found,
            });
        }
    }

    log::debug!("extracted {} diagnostic fields", features.fields().len());
    Ok(features)
}

/// Per-field summary statistics for a FeatureCube.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureInfo {
    pub num_features: usize,
    pub shape: [usize; 3],
    pub fields: BTreeMap<String, FieldSummary>,
}

pub fn feature_info(features: &FeatureCube) -> FeatureInfo {
    let mut fields = BTreeMap::new();
    for (name, field) in features.fields() {
        fields.insert(name.to_string(), FieldSummary::of(field.iter().copied()));
    }
    FeatureInfo {
        num_features: fields.len(),
        shape: features.expected_shape(),
        fields,
    }
}
