//! Report Builder Library
//!
//! IBTrACS CSV → best-track archive JSON
//! Forecast cube JSON → compressed feature store

pub mod archive_csv;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use tc_core::{extract_features, save_features, ForecastCubeFile};

// Re-export archive conversion
pub use archive_csv::{build_archive, ArchiveStats};

/// Feature store build metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreMetadata {
    /// Forecast model identifier carried through from the cube.
    pub model: String,
    /// Stored cube shape (time, lat, lon).
    pub shape: [usize; 3],
    /// Build time (RFC3339).
    pub created_at: String,
    /// Input JSON size in bytes.
    pub original_size: u64,
    /// Store size on disk in bytes.
    pub stored_size: u64,
    /// stored / original.
    pub compression_ratio: f64,
}

/// Reads a forecast cube JSON, derives the diagnostic features, and writes
/// them to a compressed feature store.
///
/// Provenance is stamped into the store but not enforced here; the
/// validation orchestrator refuses foreign models when the store is used.
pub fn build_feature_store(input_json: &Path, output: &Path) -> Result<StoreMetadata> {
    let json_str = fs::read_to_string(input_json)
        .with_context(|| format!("Failed to read forecast cube: {}", input_json.display()))?;
    let original_size = json_str.len() as u64;

    let file: ForecastCubeFile =
        serde_json::from_str(&json_str).context("Failed to parse forecast cube JSON")?;
    let cube = file.into_cube()?;
    let features = extract_features(&cube)?;
    save_features(output, &features)?;

    let stored_size = fs::metadata(output)?.len();
    Ok(StoreMetadata {
        model: features.metadata.model.clone(),
        shape: features.expected_shape(),
        created_at: chrono::Utc::now().to_rfc3339(),
        original_size,
        stored_size,
        compression_ratio: stored_size as f64 / original_size as f64,
    })
}
