//! Finite differences on gridded fields.
//!
//! Central differences in the interior, one-sided at the edges, matching the
//! convention the diagnostic formulas were validated with.

use ndarray::{Array3, ArrayView1, ArrayViewMut1, Axis};

/// Gradient of a 1-D coordinate vector (per-element spacing).
pub fn gradient_1d(values: &[f64]) -> Vec<f64> {
    let n = values.len();
    let mut out = vec![0.0; n];
    if n < 2 {
        return out;
    }
    out[0] = values[1] - values[0];
    for i in 1..n - 1 {
        out[i] = (values[i + 1] - values[i - 1]) / 2.0;
    }
    out[n - 1] = values[n - 1] - values[n - 2];
    out
}

fn gradient_lane(lane: ArrayView1<f64>, out: &mut ArrayViewMut1<f64>) {
    let n = lane.len();
    if n < 2 {
        return;
    }
    out[0] = lane[1] - lane[0];
    for i in 1..n - 1 {
        out[i] = (lane[i + 1] - lane[i - 1]) / 2.0;
    }
    out[n - 1] = lane[n - 1] - lane[n - 2];
}

/// Per-lane gradient of a 3-D field along one axis.
pub fn gradient_along(field: &Array3<f64>, axis: Axis) -> Array3<f64> {
    let mut out = Array3::zeros(field.raw_dim());
    ndarray::Zip::from(field.lanes(axis))
        .and(out.lanes_mut(axis))
        .for_each(|lane, mut out_lane| gradient_lane(lane, &mut out_lane));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn gradient_1d_linear_ramp_is_constant() {
        let g = gradient_1d(&[0.0, 2.0, 4.0, 6.0]);
        assert_eq!(g, vec![2.0, 2.0, 2.0, 2.0]);
    }

    #[test]
    fn gradient_1d_quadratic_central_differences() {
        // f(i) = i^2: central difference at i is exactly 2i, edges one-sided.
        let vals: Vec<f64> = (0..5).map(|i| (i * i) as f64).collect();
        let g = gradient_1d(&vals);
        assert_eq!(g, vec![1.0, 2.0, 4.0, 6.0, 7.0]);
    }

    #[test]
    fn gradient_1d_two_elements() {
        assert_eq!(gradient_1d(&[1.0, 4.0]), vec![3.0, 3.0]);
    }

    #[test]
    fn gradient_along_lon_axis() {
        let field = array![[[0.0, 1.0, 4.0], [0.0, 2.0, 8.0]]];
        let g = gradient_along(&field, Axis(2));
        assert_eq!(g[[0, 0, 0]], 1.0);
        assert_eq!(g[[0, 0, 1]], 2.0);
        assert_eq!(g[[0, 0, 2]], 3.0);
        assert_eq!(g[[0, 1, 1]], 4.0);
    }

    #[test]
    fn gradient_along_lat_axis() {
        let field = array![[[0.0], [3.0], [9.0]]];
        let g = gradient_along(&field, Axis(1));
        assert_eq!(g[[0, 0, 0]], 3.0);
        assert_eq!(g[[0, 1, 0]], 4.5);
        assert_eq!(g[[0, 2, 0]], 6.0);
    }

    #[test]
    fn gradient_along_leaves_other_axes_independent() {
        let field = array![[[1.0, 2.0], [10.0, 20.0]], [[3.0, 6.0], [30.0, 60.0]]];
        let g = gradient_along(&field, Axis(2));
        assert_eq!(g[[0, 0, 0]], 1.0);
        assert_eq!(g[[0, 1, 0]], 10.0);
        assert_eq!(g[[1, 0, 0]], 3.0);
        assert_eq!(g[[1, 1, 1]], 30.0);
    }
}
