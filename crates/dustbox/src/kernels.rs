//! Quadratic B-spline weight function for grain-grid interpolation.

/// 1D Quadratic B-spline weight.
/// Support: [-1.5, 1.5] (covers 3 grid cells)
#[inline]
pub fn quadratic_bspline_1d(r: f64) -> f64 {
    use crate::constants::BSPLINE_SUPPORT_RADIUS;
    let r_abs = r.abs();
    if r_abs < 0.5 {
        0.75 - r_abs * r_abs
    } else if r_abs < BSPLINE_SUPPORT_RADIUS {
        let t = BSPLINE_SUPPORT_RADIUS - r_abs;
        0.5 * t * t
    } else {
        0.0
    }
}

/// The 1D weight triple for a particle offset `d` from its cell's center,
/// `d` in cell units with |d| <= 0.5. Entry `n` weights cell `origin + n`.
#[inline]
pub fn bspline_triple(d: f64) -> [f64; 3] {
    [
        quadratic_bspline_1d(d + 1.0),
        quadratic_bspline_1d(d),
        quadratic_bspline_1d(d - 1.0),
    ]
}
