//! Precipitation memory diagnostics.

use ndarray::{s, Array3, Axis};

/// Standard antecedent-precipitation decay constant.
pub const API_DECAY_FACTOR: f64 = 0.85;

/// Causal rolling precipitation sum over `window_steps` timesteps.
///
/// For t >= window the sum covers [t - window, t), excluding the current
/// step. Early timesteps sum all available history including the current
/// step. Downstream thresholds are tuned to both facets.
pub fn rolling_accumulation(precip: &Array3<f64>, window_steps: usize) -> Array3<f64> {
    let t_len = precip.shape()[0];
    let mut out = Array3::zeros(precip.raw_dim());

    for t in window_steps..t_len {
        let sum = precip.slice(s![t - window_steps..t, .., ..]).sum_axis(Axis(0));
        out.slice_mut(s![t, .., ..]).assign(&sum);
    }
    for t in 0..window_steps.min(t_len) {
        let sum = precip.slice(s![..=t, .., ..]).sum_axis(Axis(0));
        out.slice_mut(s![t, .., ..]).assign(&sum);
    }

    out
}

/// Antecedent Precipitation Index: api[t] = p[t] + k * api[t-1], api[0] = 0.
///
/// Captures soil-wetness memory without soil data. Starts dry: api[0] = 0
/// regardless of p[0].
pub fn antecedent_precipitation_index(precip: &Array3<f64>, k: f64) -> Array3<f64> {
    let t_len = precip.shape()[0];
    let mut out = Array3::zeros(precip.raw_dim());

    for t in 1..t_len {
        let prev = out.slice(s![t - 1, .., ..]).to_owned();
        let cur = precip.slice(s![t, .., ..]);
        out.slice_mut(s![t, .., ..]).assign(&(&cur + &(prev * k)));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn series(values: &[f64]) -> Array3<f64> {
        let mut arr = Array3::zeros((values.len(), 1, 1));
        for (t, &v) in values.iter().enumerate() {
            arr[[t, 0, 0]] = v;
        }
        arr
    }

    #[test]
    fn rolling_sum_excludes_current_step_after_spinup() {
        let p = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let acc = rolling_accumulation(&p, 4);
        // t=4: sum of steps 0..4 = 1+2+3+4.
        assert_eq!(acc[[4, 0, 0]], 10.0);
        // t=5: sum of steps 1..5 = 2+3+4+5.
        assert_eq!(acc[[5, 0, 0]], 14.0);
    }

    #[test]
    fn rolling_sum_includes_current_step_during_spinup() {
        let p = series(&[1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
        let acc = rolling_accumulation(&p, 4);
        assert_eq!(acc[[0, 0, 0]], 1.0);
        assert_eq!(acc[[1, 0, 0]], 3.0);
        assert_eq!(acc[[2, 0, 0]], 6.0);
        assert_eq!(acc[[3, 0, 0]], 10.0);
    }

    #[test]
    fn rolling_sum_window_longer_than_series() {
        let p = series(&[1.0, 2.0]);
        let acc = rolling_accumulation(&p, 4);
        assert_eq!(acc[[0, 0, 0]], 1.0);
        assert_eq!(acc[[1, 0, 0]], 3.0);
    }

    #[test]
    fn api_recursion_hand_check() {
        let p = series(&[5.0, 1.0, 0.0, 2.0]);
        let api = antecedent_precipitation_index(&p, 0.85);
        assert_eq!(api[[0, 0, 0]], 0.0, "dry initial conditions");
        assert_eq!(api[[1, 0, 0]], 1.0);
        assert!((api[[2, 0, 0]] - 0.85).abs() < 1e-12);
        assert!((api[[3, 0, 0]] - (2.0 + 0.85 * 0.85)).abs() < 1e-12);
    }

    #[test]
    fn api_is_zero_everywhere_for_dry_series() {
        let p = series(&[0.0, 0.0, 0.0]);
        let api = antecedent_precipitation_index(&p, API_DECAY_FACTOR);
        assert!(api.iter().all(|&v| v == 0.0));
    }
}
