//! Small numeric helpers shared across the pipeline.

use serde::{Deserialize, Serialize};

use crate::error::{Result, ValidationError};

/// Percentile with linear interpolation between closest ranks.
///
/// `pct` is on the 0..=100 scale. The sample is copied and sorted; this is
/// called once per timestep on a full grid slice, which keeps the copy cost
/// bounded by the slice size.
pub fn percentile(values: &[f64], pct: f64) -> Result<f64> {
    if values.is_empty() {
        return Err(ValidationError::EmptySample);
    }

    let mut sorted = values.to_vec();
    sorted.sort_by(f64::total_cmp);

    let n = sorted.len();
    if n == 1 {
        return Ok(sorted[0]);
    }

    let rank = (pct / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = (lo + 1).min(n - 1);
    let frac = rank - lo as f64;

    Ok(sorted[lo] + frac * (sorted[hi] - sorted[lo]))
}

/// Summary statistics for one field or series.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, schemars::JsonSchema)]
pub struct FieldSummary {
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std: f64,
    pub has_nan: bool,
}

impl FieldSummary {
    /// Population statistics over an iterator of samples.
    ///
    /// An empty input yields a zeroed summary rather than NaN soup; callers
    /// treat it as "nothing to report".
    pub fn of(values: impl Iterator<Item = f64> + Clone) -> FieldSummary {
        let mut n = 0usize;
        let mut sum = 0.0;
        let mut min = f64::INFINITY;
        let mut max = f64::NEG_INFINITY;
        let mut has_nan = false;

        for v in values.clone() {
            if v.is_nan() {
                has_nan = true;
                continue;
            }
            n += 1;
            sum += v;
            min = min.min(v);
            max = max.max(v);
        }

        if n == 0 {
            return FieldSummary {
                min: 0.0,
                max: 0.0,
                mean: 0.0,
                std: 0.0,
                has_nan,
            };
        }

        let mean = sum / n as f64;
        let var = values
            .filter(|v| !v.is_nan())
            .map(|v| (v - mean) * (v - mean))
            .sum::<f64>()
            / n as f64;

        FieldSummary {
            min,
            max,
            mean,
            std: var.sqrt(),
            has_nan,
        }
    }
}

/// Mean of a slice; 0.0 for an empty slice.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}
