//! Physical diagnostics from surface wind and pressure fields.
//!
//! Simplified spherical approximations: the longitude derivative carries the
//! 1/(R cos(lat)) metric factor, the latitude derivative 1/R. Units are SI
//! throughout (m/s in, s^-1 and Pa/m out).

use ndarray::{Array3, Axis, Zip};

use super::gradient::{gradient_1d, gradient_along};
use crate::geo::EARTH_RADIUS_M;

/// |V| = sqrt(u^2 + v^2).
pub fn wind_speed(u: &Array3<f64>, v: &Array3<f64>) -> Array3<f64> {
    let mut out = Array3::zeros(u.raw_dim());
    Zip::from(&mut out)
        .and(u)
        .and(v)
        .for_each(|o, &u, &v| *o = (u * u + v * v).sqrt());
    out
}

/// Relative vorticity: dv/dx - du/dy on the sphere, sign preserved.
///
/// Positive for cyclonic rotation in the northern hemisphere, negative in
/// the southern. This is the primary discriminant for rotational systems.
pub fn relative_vorticity(
    u: &Array3<f64>,
    v: &Array3<f64>,
    lat_deg: &[f64],
    lon_deg: &[f64],
) -> Array3<f64> {
    let mut dvdx = gradient_along(v, Axis(2));
    scale_lon_derivative(&mut dvdx, lat_deg, lon_deg);

    let mut dudy = gradient_along(u, Axis(1));
    scale_lat_derivative(&mut dudy, lat_deg);

    dvdx - dudy
}

/// Horizontal divergence: du/dx + dv/dy on the sphere.
pub fn divergence(
    u: &Array3<f64>,
    v: &Array3<f64>,
    lat_deg: &[f64],
    lon_deg: &[f64],
) -> Array3<f64> {
    let mut dudx = gradient_along(u, Axis(2));
    scale_lon_derivative(&mut dudx, lat_deg, lon_deg);

    let mut dvdy = gradient_along(v, Axis(1));
    scale_lat_derivative(&mut dvdy, lat_deg);

    dudx + dvdy
}

/// Pressure gradient magnitude |grad p| in Pa/m.
///
/// Storms are gradient features, not simply local minima, so the magnitude
/// is what candidate scoring wants.
pub fn pressure_gradient(pressure: &Array3<f64>, lat_deg: &[f64], lon_deg: &[f64]) -> Array3<f64> {
    let mut dpdx = gradient_along(pressure, Axis(2));
    scale_lon_derivative(&mut dpdx, lat_deg, lon_deg);

    let mut dpdy = gradient_along(pressure, Axis(1));
    scale_lat_derivative(&mut dpdy, lat_deg);

    let mut out = Array3::zeros(pressure.raw_dim());
    Zip::from(&mut out)
        .and(&dpdx)
        .and(&dpdy)
        .for_each(|o, &x, &y| *o = (x * x + y * y).sqrt());
    out
}

/// Divide a raw longitude-axis difference by R cos(lat) dlon.
fn scale_lon_derivative(field: &mut Array3<f64>, lat_deg: &[f64], lon_deg: &[f64]) {
    let lat_rad: Vec<f64> = lat_deg.iter().map(|d| d.to_radians()).collect();
    let lon_rad: Vec<f64> = lon_deg.iter().map(|d| d.to_radians()).collect();
    let dlon = gradient_1d(&lon_rad);

    Zip::indexed(field).for_each(|(_, y, x), val| {
        *val /= EARTH_RADIUS_M * lat_rad[y].cos() * dlon[x];
    });
}

/// Divide a raw latitude-axis difference by R dlat.
fn scale_lat_derivative(field: &mut Array3<f64>, lat_deg: &[f64]) {
    let lat_rad: Vec<f64> = lat_deg.iter().map(|d| d.to_radians()).collect();
    let dlat = gradient_1d(&lat_rad);

    Zip::indexed(field).for_each(|(_, y, _), val| {
        *val /= EARTH_RADIUS_M * dlat[y];
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::Array3;

    fn axes() -> (Vec<f64>, Vec<f64>) {
        let lat: Vec<f64> = (0..5).map(|i| 10.0 + i as f64).collect();
        let lon: Vec<f64> = (0..6).map(|i| 20.0 + i as f64).collect();
        (lat, lon)
    }

    #[test]
    fn wind_speed_is_euclidean_magnitude() {
        let u = Array3::from_elem((1, 2, 2), 3.0);
        let v = Array3::from_elem((1, 2, 2), 4.0);
        let s = wind_speed(&u, &v);
        assert!(s.iter().all(|&x| (x - 5.0).abs() < 1e-12));
    }

    #[test]
    fn uniform_flow_has_zero_vorticity_and_divergence() {
        let (lat, lon) = axes();
        let u = Array3::from_elem((2, 5, 6), 7.0);
        let v = Array3::from_elem((2, 5, 6), -3.0);

        let vort = relative_vorticity(&u, &v, &lat, &lon);
        let div = divergence(&u, &v, &lat, &lon);
        assert!(vort.iter().all(|&x| x.abs() < 1e-12), "uniform flow must have no spin");
        assert!(div.iter().all(|&x| x.abs() < 1e-12), "uniform flow must not diverge");
    }

    #[test]
    fn eastward_increasing_v_gives_positive_vorticity() {
        let (lat, lon) = axes();
        let u = Array3::zeros((1, 5, 6));
        let mut v = Array3::zeros((1, 5, 6));
        for x in 0..6 {
            for y in 0..5 {
                v[[0, y, x]] = x as f64;
            }
        }
        let vort = relative_vorticity(&u, &v, &lat, &lon);
        assert!(
            vort.iter().all(|&z| z > 0.0),
            "dv/dx > 0 with du/dy = 0 must give positive vorticity"
        );
    }

    #[test]
    fn northward_increasing_u_gives_negative_vorticity() {
        let (lat, lon) = axes();
        let mut u = Array3::zeros((1, 5, 6));
        let v = Array3::zeros((1, 5, 6));
        for y in 0..5 {
            for x in 0..6 {
                u[[0, y, x]] = y as f64;
            }
        }
        let vort = relative_vorticity(&u, &v, &lat, &lon);
        assert!(vort.iter().all(|&z| z < 0.0));
    }

    #[test]
    fn pressure_ramp_gradient_matches_analytic_value() {
        let (lat, lon) = axes();
        // 100 Pa per degree of longitude, flat in latitude.
        let mut p = Array3::zeros((1, 5, 6));
        for y in 0..5 {
            for x in 0..6 {
                p[[0, y, x]] = 100.0 * x as f64;
            }
        }
        let g = pressure_gradient(&p, &lat, &lon);

        let dlon_m = EARTH_RADIUS_M * lat[2].to_radians().cos() * 1.0f64.to_radians();
        let expected = 100.0 / dlon_m;
        let got = g[[0, 2, 3]];
        assert!(
            (got - expected).abs() / expected < 1e-9,
            "got {got}, expected {expected}"
        );
    }

    #[test]
    fn outputs_preserve_input_shape() {
        let (lat, lon) = axes();
        let u = Array3::zeros((3, 5, 6));
        let v = Array3::zeros((3, 5, 6));
        assert_eq!(relative_vorticity(&u, &v, &lat, &lon).shape(), &[3, 5, 6]);
        assert_eq!(divergence(&u, &v, &lat, &lon).shape(), &[3, 5, 6]);
    }
}
