//! Grain-grid interpolation: weight stencils and gas sampling.

use glam::DVec3;

use crate::config::PhysicsConfig;
use crate::grid::Grid;
use crate::kernels::bspline_triple;

/// A 3x3x3 interpolation stencil anchored at cell `(i, j, k)`.
///
/// Weights are indexed `w[dk][dj][di]`, weighting cell
/// `(i + di, j + dj, k + dk)`. The anchor may stick out of the gas arrays
/// near edges; zero-weight entries there are benign, non-zero ones mean the
/// point left the integrable region.
#[derive(Clone, Copy, Debug)]
pub struct WeightStencil {
    pub w: [[[f64; 3]; 3]; 3],
    pub i: i64,
    pub j: i64,
    pub k: i64,
}

/// Gas state sampled at a point.
#[derive(Clone, Copy, Debug)]
pub struct GasSample {
    pub rho: f64,
    pub u: DVec3,
    pub cs: f64,
}

/// Build the interpolation stencil for a world position.
///
/// Active axes get the quadratic B-spline triple over the three cells
/// nearest the point; collapsed axes degrade to the single cell with unit
/// weight, so the same stencil walk serves every dimensionality.
pub fn weight_stencil(grid: &Grid, pos: DVec3) -> WeightStencil {
    let f = grid.cell_coord(pos);
    let active = grid.active();

    let (wx, i) = axis_weights(f.x, active[0]);
    let (wy, j) = axis_weights(f.y, active[1]);
    let (wz, k) = axis_weights(f.z, active[2]);

    let mut w = [[[0.0; 3]; 3]; 3];
    for (dk, row_k) in w.iter_mut().enumerate() {
        for (dj, row_j) in row_k.iter_mut().enumerate() {
            for (di, entry) in row_j.iter_mut().enumerate() {
                *entry = wz[dk] * wy[dj] * wx[di];
            }
        }
    }

    WeightStencil { w, i, j, k }
}

#[inline]
fn axis_weights(f: f64, active: bool) -> ([f64; 3], i64) {
    if active {
        let ic = f.floor() as i64;
        let d = f - ic as f64 - 0.5;
        (bspline_triple(d), ic - 1)
    } else {
        ([0.0, 1.0, 0.0], -1)
    }
}

/// Sample the gas state under a stencil.
///
/// Returns `None` when any positively-weighted cell falls outside the gas
/// arrays, the distinguished out-of-domain sentinel.
pub fn gas_values(grid: &Grid, st: &WeightStencil) -> Option<GasSample> {
    let (nt1, nt2, nt3) = grid.totals();

    let mut rho = 0.0;
    let mut u = DVec3::ZERO;
    let mut cs = 0.0;

    for dk in 0..3 {
        for dj in 0..3 {
            for di in 0..3 {
                let w = st.w[dk][dj][di];
                if w == 0.0 {
                    continue;
                }
                let i = st.i + di as i64;
                let j = st.j + dj as i64;
                let k = st.k + dk as i64;
                if i < 0 || j < 0 || k < 0 {
                    return None;
                }
                let (i, j, k) = (i as usize, j as usize, k as usize);
                if i >= nt1 || j >= nt2 || k >= nt3 {
                    return None;
                }
                let idx = grid.cell_index(i, j, k);
                rho += w * grid.rho[idx];
                u.x += w * grid.u1[idx];
                u.y += w * grid.u2[idx];
                u.z += w * grid.u3[idx];
                cs += w * grid.cs[idx];
            }
        }
    }

    Some(GasSample { rho, u, cs })
}

/// Apply the host problem's steady gas drift to a sampled velocity in place.
pub fn gas_velocity_shift(cfg: &PhysicsConfig, _pos: DVec3, u: &mut DVec3) {
    *u += cfg.gas_drift;
}
