//! Gridded forecast data structures.
//!
//! A [`ForecastCube`] carries the raw surface fields on a (time, lat, lon)
//! grid; a [`FeatureCube`] carries the derived diagnostics on the same grid.
//! Both keep their coordinate axes and provenance metadata attached so that
//! downstream stages never have to guess shapes or sources.

use chrono::{DateTime, Utc};
use ndarray::Array3;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Provenance record attached to every cube.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CubeMetadata {
    /// Forecast model identifier, checked by the validation guardrail.
    #[serde(default)]
    pub model: String,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub init_time: Option<DateTime<Utc>>,
}

impl CubeMetadata {
    pub fn for_model(model: &str) -> CubeMetadata {
        CubeMetadata {
            model: model.to_string(),
            source: String::new(),
            init_time: None,
        }
    }
}

/// Raw surface fields shaped (T, Y, X).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastCube {
    pub time: Vec<DateTime<Utc>>,
    /// Latitude in degrees, length Y.
    pub lat: Vec<f64>,
    /// Longitude in degrees, length X.
    pub lon: Vec<f64>,
    /// Eastward 10 m wind, m/s.
    pub u10: Array3<f64>,
    /// Northward 10 m wind, m/s.
    pub v10: Array3<f64>,
    /// Mean sea-level pressure, Pa.
    pub msl: Array3<f64>,
    /// 6-hour precipitation accumulation, m.
    pub tp6: Array3<f64>,
    pub metadata: CubeMetadata,
}

impl ForecastCube {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        time: Vec<DateTime<Utc>>,
        lat: Vec<f64>,
        lon: Vec<f64>,
        u10: Array3<f64>,
        v10: Array3<f64>,
        msl: Array3<f64>,
        tp6: Array3<f64>,
        metadata: CubeMetadata,
    ) -> Result<ForecastCube> {
        let cube = ForecastCube {
            time,
            lat,
            lon,
            u10,
            v10,
            msl,
            tp6,
            metadata,
        };
        cube.validate()?;
        Ok(cube)
    }

    /// Shape implied by the coordinate axes.
    pub fn expected_shape(&self) -> [usize; 3] {
        [self.time.len(), self.lat.len(), self.lon.len()]
    }

    /// Structural validation: axis minimums and exact field shapes.
    ///
    /// Finite differences need two points per spatial axis; anything less is
    /// rejected here rather than deep inside the derivative code.
    pub fn validate(&self) -> Result<()> {
        if self.time.is_empty() {
            return Err(ValidationError::AxisTooShort {
                axis: "time",
                len: 0,
                min: 1,
            });
        }
        for (axis, len) in [("lat", self.lat.len()), ("lon", self.lon.len())] {
            if len < 2 {
                return Err(ValidationError::AxisTooShort { axis, len, min: 2 });
            }
        }

        let expected = self.expected_shape();
        for (name, field) in self.fields() {
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
        Ok(())
    }

    pub fn fields(&self) -> [(&'static str, &Array3<f64>); 4] {
        [
            ("u10", &self.u10),
            ("v10", &self.v10),
            ("msl", &self.msl),
            ("tp6", &self.tp6),
        ]
    }
}

/// Derived diagnostics shaped (T, Y, X), with the axes carried over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeatureCube {
    pub time: Vec<DateTime<Utc>>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    /// |V| in m/s.
    pub wind_speed_10m: Array3<f64>,
    /// Relative vorticity in s^-1, sign preserved.
    pub vorticity_10m: Array3<f64>,
    /// Horizontal divergence in s^-1.
    pub divergence_10m: Array3<f64>,
    /// |grad p| in Pa/m.
    pub pressure_gradient: Array3<f64>,
    /// Rolling 24 h precipitation, m.
    pub precip_24h: Array3<f64>,
    /// Rolling 72 h precipitation, m.
    pub precip_72h: Array3<f64>,
    /// Antecedent precipitation index, m.
    pub api: Array3<f64>,
    pub metadata: CubeMetadata,
}

impl FeatureCube {
    pub fn expected_shape(&self) -> [usize; 3] {
        [self.time.len(), self.lat.len(), self.lon.len()]
    }

    pub fn fields(&self) -> [(&'static str, &Array3<f64>); 7] {
        [
            ("wind_speed_10m", &self.wind_speed_10m),
            ("vorticity_10m", &self.vorticity_10m),
            ("divergence_10m", &self.divergence_10m),
            ("pressure_gradient", &self.pressure_gradient),
            ("precip_24h", &self.precip_24h),
            ("precip_72h", &self.precip_72h),
            ("api", &self.api),
        ]
    }
}

// ============================================================================
// Wire format (ingestion handoff)
// ============================================================================

/// On-disk/wire form of a forecast cube: nested arrays grouped under
/// `surface`, the shape the ingestion service hands over.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastCubeFile {
    pub time: Vec<DateTime<Utc>>,
    pub lat: Vec<f64>,
    pub lon: Vec<f64>,
    pub surface: SurfaceFields,
    #[serde(default = "CubeMetadata::default_unknown")]
    pub metadata: CubeMetadata,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SurfaceFields {
    pub u10: Vec<Vec<Vec<f64>>>,
    pub v10: Vec<Vec<Vec<f64>>>,
    pub msl: Vec<Vec<Vec<f64>>>,
    pub tp6: Vec<Vec<Vec<f64>>>,
}

impl CubeMetadata {
    fn default_unknown() -> CubeMetadata {
        CubeMetadata::for_model("unknown")
    }
}

impl ForecastCubeFile {
    /// Convert to the dense in-memory form, validating shape on the way.
    pub fn into_cube(self) -> Result<ForecastCube> {
        let expected = [self.time.len(), self.lat.len(), self.lon.len()];
        let u10 = nested_to_array("u10", &self.surface.u10, expected)?;
        let v10 = nested_to_array("v10", &self.surface.v10, expected)?;
        let msl = nested_to_array("msl", &self.surface.msl, expected)?;
        let tp6 = nested_to_array("tp6", &self.surface.tp6, expected)?;
        ForecastCube::new(self.time, self.lat, self.lon, u10, v10, msl, tp6, self.metadata)
    }

    /// Build the wire form from a dense cube (the fixture-generator side
    /// of the handoff).
    pub fn from_cube(cube: &ForecastCube) -> ForecastCubeFile {
        ForecastCubeFile {
            time: cube.time.clone(),
            lat: cube.lat.clone(),
            lon: cube.lon.clone(),
            surface: SurfaceFields {
                u10: array_to_nested(&cube.u10),
                v10: array_to_nested(&cube.v10),
                msl: array_to_nested(&cube.msl),
                tp6: array_to_nested(&cube.tp6),
            },
            metadata: cube.metadata.clone(),
        }
    }
}

fn array_to_nested(array: &Array3<f64>) -> Vec<Vec<Vec<f64>>> {
    array
        .outer_iter()
        .map(|plane| plane.outer_iter().map(|row| row.to_vec()).collect())
        .collect()
}

fn nested_to_array(name: &str, nested: &[Vec<Vec<f64>>], expected: [usize; 3]) -> Result<Array3<f64>> {
    let [t, y, x] = expected;
    let mismatch = |found: [usize; 3]| ValidationError::ShapeMismatch {
        field: name.to_string(),
        expected,
        found,
    };

    if nested.len() != t {
        return Err(mismatch([nested.len(), 0, 0]));
    }
    let mut flat = Vec::with_capacity(t * y * x);
    for plane in nested {
        if plane.len() != y {
            return Err(mismatch([t, plane.len(), 0]));
        }
        for row in plane {
            if row.len() != x {
                return Err(mismatch([t, y, row.len()]));
            }
            flat.extend_from_slice(row);
        }
    }
    Array3::from_shape_vec((t, y, x), flat).map_err(|_| mismatch([t, y, x]))
}
