//! On-disk feature cube store.
//!
//! Feature extraction dominates pipeline cost, so extracted cubes are
//! persisted and re-used across calibration sweeps. Layout per file:
//! MessagePack payload, LZ4 compressed with prepended size, SHA-256
//! checksum appended. The format version lives inside the payload and is
//! checked after decode.

use std::fs::{rename, File};
use std::io::{Read, Write};
use std::path::Path;

use lz4_flex::{compress_prepend_size, decompress_size_prepended};
use rmp_serde::{from_slice, to_vec_named};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use super::error::StoreError;
use super::STORE_VERSION;
use crate::cube::FeatureCube;

const CHECKSUM_LEN: usize = 32;

/// Versioned container written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredFeatures {
    pub version: u32,
    /// Write time, unix milliseconds.
    pub created_ms: u64,
    pub features: FeatureCube,
}

impl StoredFeatures {
    pub fn new(features: FeatureCube) -> StoredFeatures {
        StoredFeatures {
            version: STORE_VERSION,
            created_ms: now_ms(),
            features,
        }
    }
}

fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

pub fn serialize_and_compress(stored: &StoredFeatures) -> Result<Vec<u8>, StoreError> {
    let msgpack = to_vec_named(stored).map_err(StoreError::Serialization)?;
    let compressed = compress_prepend_size(&msgpack);

    let mut hasher = Sha256::new();
    hasher.update(&compressed);
    let checksum = hasher.finalize();

    let mut result = compressed;
    result.extend_from_slice(&checksum);
    Ok(result)
}

pub fn decompress_and_deserialize(bytes: &[u8]) -> Result<StoredFeatures, StoreError> {
    if bytes.len() <= CHECKSUM_LEN {
        return Err(StoreError::Corrupted);
    }

    let (payload, checksum_bytes) = bytes.split_at(bytes.len() - CHECKSUM_LEN);

    let mut hasher = Sha256::new();
    hasher.update(payload);
    let calculated = hasher.finalize();
    if &calculated[..] != checksum_bytes {
        return Err(StoreError::ChecksumMismatch);
    }

    let msgpack = decompress_size_prepended(payload).map_err(|_| StoreError::Decompression)?;
    let stored: StoredFeatures = from_slice(&msgpack).map_err(StoreError::Deserialization)?;

    if stored.version > STORE_VERSION {
        return Err(StoreError::VersionMismatch {
            found: stored.version,
            expected: STORE_VERSION,
        });
    }
    Ok(stored)
}

/// Writes a feature cube atomically: temp file, fsync, rename.
pub fn save_features(path: &Path, features: &FeatureCube) -> Result<(), StoreError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let data = serialize_and_compress(&StoredFeatures::new(features.clone()))?;

    let temp_path = path.with_extension("tmp");
    {
        let mut file = File::create(&temp_path)?;
        file.write_all(&data)?;
        file.flush()?;
        file.sync_all()?;
    }
    rename(&temp_path, path)?;

    log::debug!("saved {} bytes to {:?}", data.len(), path);
    Ok(())
}

pub fn load_features(path: &Path) -> Result<FeatureCube, StoreError> {
    if !path.exists() {
        return Err(StoreError::FileNotFound {
            path: path.display().to_string(),
        });
    }

    let mut file = File::open(path)?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;

    let stored = decompress_and_deserialize(&data)?;
    log::debug!("loaded {} bytes from {:?}", data.len(), path);
    Ok(stored.features)
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::calibration::drifting_storm_scenario;
    use crate::features::extract_features;

    fn sample_features() -> FeatureCube {
        let scenario = drifting_storm_scenario().unwrap();
        extract_features(&scenario.cube).unwrap()
    }

    #[test]
    fn round_trip_preserves_every_field() {
        let features = sample_features();
        let bytes = serialize_and_compress(&StoredFeatures::new(features.clone())).unwrap();
        let back = decompress_and_deserialize(&bytes).unwrap();
        assert_eq!(back.version, STORE_VERSION);
        assert_eq!(back.features.time, features.time);
        assert_eq!(back.features.vorticity_10m, features.vorticity_10m);
        assert_eq!(back.features.precip_72h, features.precip_72h);
        assert_eq!(back.features.metadata.model, "WeatherNext2");
    }

    #[test]
    fn corrupted_checksum_is_detected() {
        let features = sample_features();
        let mut bytes = serialize_and_compress(&StoredFeatures::new(features)).unwrap();
        if let Some(last) = bytes.last_mut() {
            *last = last.wrapping_add(1);
        }
        assert!(matches!(
            decompress_and_deserialize(&bytes),
            Err(StoreError::ChecksumMismatch)
        ));
    }

    #[test]
    fn corrupted_payload_is_detected() {
        let features = sample_features();
        let mut bytes = serialize_and_compress(&StoredFeatures::new(features)).unwrap();
        // Flip a payload byte and fix the checksum so decompression itself
        // has to notice.
        bytes[4] = bytes[4].wrapping_add(1);
        let n = bytes.len() - CHECKSUM_LEN;
        let mut hasher = Sha256::new();
        hasher.update(&bytes[..n]);
        let checksum = hasher.finalize();
        bytes[n..].copy_from_slice(&checksum);
        let result = decompress_and_deserialize(&bytes);
        assert!(
            matches!(
                result,
                Err(StoreError::Decompression) | Err(StoreError::Deserialization(_))
            ),
            "got {result:?}"
        );
    }

    #[test]
    fn truncated_input_is_corrupt() {
        assert!(matches!(
            decompress_and_deserialize(&[0u8; 16]),
            Err(StoreError::Corrupted)
        ));
    }

    #[test]
    fn future_version_is_rejected() {
        let features = sample_features();
        let mut stored = StoredFeatures::new(features);
        stored.version = STORE_VERSION + 1;
        let bytes = serialize_and_compress(&stored).unwrap();
        assert!(matches!(
            decompress_and_deserialize(&bytes),
            Err(StoreError::VersionMismatch { found, expected })
                if found == STORE_VERSION + 1 && expected == STORE_VERSION
        ));
    }

    #[test]
    fn file_round_trip() {
        let features = sample_features();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("features").join("cube.tcf");
        save_features(&path, &features).unwrap();

        let loaded = load_features(&path).unwrap();
        assert_eq!(loaded.wind_speed_10m, features.wind_speed_10m);
        assert!(!path.with_extension("tmp").exists(), "temp file cleaned up");
    }

    #[test]
    fn missing_file_reports_its_path() {
        let err = load_features(Path::new("/no/such/store.tcf")).unwrap_err();
        match err {
            StoreError::FileNotFound { path } => assert!(path.contains("store.tcf")),
            other => panic!("expected FileNotFound, got {other:?}"),
        }
    }

    #[test]
    fn compression_shrinks_smooth_fields() {
        let features = sample_features();
        let stored = StoredFeatures::new(features);
        let raw = to_vec_named(&stored).unwrap();
        let packed = serialize_and_compress(&stored).unwrap();
        assert!(
            packed.len() < raw.len(),
            "packed {} >= raw {}",
            packed.len(),
            raw.len()
        );
    }
}
