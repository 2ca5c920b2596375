#[inline]
pub fn lennard_jones_12_6(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return 1e10;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    well_depth * (rho12 - 2.0 * rho6)
}

/// Derivative of [`lennard_jones_12_6`] with respect to distance.
#[inline]
pub fn lennard_jones_12_6_derivative(dist: f64, r_min: f64, well_depth: f64) -> f64 {
    if dist < 1e-6 {
        return -1e10;
    }
    let rho = r_min / dist;
    let rho6 = rho.powi(6);
    let rho12 = rho6 * rho6;
    12.0 * well_depth * (rho6 - rho12) / dist
}

#[inline]
pub fn harmonic(dist: f64, x0: f64, sd: f64) -> f64 {
    let z = (dist - x0) / sd;
    z * z
}

#[inline]
pub fn harmonic_derivative(dist: f64, x0: f64, sd: f64) -> f64 {
    2.0 * (dist - x0) / (sd * sd)
}

/// Shifts `dist` towards `ideal` by up to `delta`, producing a flat well of
/// width `2 * delta` around the ideal value.
#[inline]
pub fn flat_bottom_distance(dist: f64, ideal: f64, delta: f64) -> f64 {
    if delta <= 1e-9 {
        return dist;
    }
    if dist >= ideal + delta {
        dist - delta
    } else if dist <= ideal - delta {
        dist + delta
    } else {
        ideal
    }
}
