//! Momentum feedback from grains onto the gas grid.
//!
//! Two deposition phases share one buffer. The predictor phase runs once
//! per step before the gas update and deposits a drag-impulse estimate with
//! the stopping time clamped to at least dt, so an arbitrarily stiff grain
//! population cannot destabilize the gas solver. The corrector phase runs
//! inside the integrator loop and deposits the momentum each grain actually
//! exchanged, with no clamp: the grain update already absorbed the
//! stiffness implicitly.
//!
//! The buffer accumulates momentum transferred from grain to gas; the gas
//! update converts it to a per-cell source density and the driver folds
//! ghost-cell deposits into neighbouring subdomains.

use glam::DVec3;

use crate::config::PhysicsConfig;
use crate::forces::frame_force;
use crate::grain::{Grain, GrainSpecies, Grains, POS_GHOST};
use crate::grid::Grid;
use crate::interp::{gas_values, gas_velocity_shift, weight_stencil, WeightStencil};

/// Grid-sized accumulator of momentum deposited onto each gas cell.
pub struct FeedbackBuffer {
    pub f: Vec<DVec3>,
    nt1: usize,
    nt2: usize,
    nt3: usize,
}

impl FeedbackBuffer {
    /// Create a buffer sized for the given grid (ghost zones included).
    pub fn new(grid: &Grid) -> Self {
        let (nt1, nt2, nt3) = grid.totals();
        Self {
            f: vec![DVec3::ZERO; nt1 * nt2 * nt3],
            nt1,
            nt2,
            nt3,
        }
    }

    /// Zero the buffer.
    pub fn clear(&mut self) {
        self.f.fill(DVec3::ZERO);
    }

    /// Momentum accumulated in one cell.
    #[inline]
    pub fn cell(&self, i: usize, j: usize, k: usize) -> DVec3 {
        self.f[(k * self.nt2 + j) * self.nt1 + i]
    }

    /// Total deposited momentum over all cells.
    pub fn total(&self) -> DVec3 {
        self.f.iter().copied().sum()
    }

    #[inline]
    fn add(&mut self, i: i64, j: i64, k: i64, v: DVec3) {
        if i < 0 || j < 0 || k < 0 {
            return;
        }
        let (i, j, k) = (i as usize, j as usize, k as usize);
        if i >= self.nt1 || j >= self.nt2 || k >= self.nt3 {
            return;
        }
        self.f[(k * self.nt2 + j) * self.nt1 + i] += v;
    }

    /// Distribute a momentum contribution over a stencil.
    pub fn deposit(&mut self, st: &WeightStencil, fb: DVec3) {
        for dk in 0..3 {
            for dj in 0..3 {
                for di in 0..3 {
                    let w = st.w[dk][dj][di];
                    if w == 0.0 {
                        continue;
                    }
                    self.add(st.i + di as i64, st.j + dj as i64, st.k + dk as i64, w * fb);
                }
            }
        }
    }

    /// Shear-remap correction for deposits landing in radial ghost columns
    /// (3D non-FARGO shearing sheet only).
    ///
    /// A ghost-column deposit will be folded into the opposite radial edge
    /// of the sheared neighbour, whose azimuth is offset by the fractional
    /// part of `vshear * time`. This moves each such deposit to the azimuth
    /// it will occupy after the remap, split between the two neighbouring
    /// azimuthal cells. Net change over the buffer is zero.
    pub fn deposit_shear(&mut self, grid: &Grid, cfg: &PhysicsConfig, st: &WeightStencil, fb: DVec3) {
        let (g1, g2, _) = grid.ghosts();
        let (g1, g2) = (g1 as i64, g2 as i64);
        let n1 = grid.n1 as i64;
        let n2 = grid.n2 as i64;

        // fractional azimuthal shift at the radial boundary, in cell units
        let lx = grid.n1 as f64 * grid.dx1;
        let vshear = 1.5 * cfg.omega * lx;
        let mut frac = (vshear * grid.time / grid.dx2).fract();
        if frac > 0.5 {
            frac -= 1.0;
        } else if frac < -0.5 {
            frac += 1.0;
        }

        let wrap_j = |j: i64| -> i64 { g2 + (j - g2).rem_euclid(n2) };

        for dk in 0..3 {
            for dj in 0..3 {
                for di in 0..3 {
                    let w = st.w[dk][dj][di];
                    if w == 0.0 {
                        continue;
                    }
                    let i = st.i + di as i64;
                    if i >= g1 && i < g1 + n1 {
                        continue; // interior column, remap leaves it alone
                    }
                    let j = st.j + dj as i64;
                    let k = st.k + dk as i64;

                    // inner-edge images shift forward, outer-edge backward
                    let sh = if i < g1 { frac } else { -frac };
                    let (jb, wa, wb) = if sh >= 0.0 {
                        (j + 1, 1.0 - sh, sh)
                    } else {
                        (j - 1, 1.0 + sh, -sh)
                    };

                    self.add(i, j, k, -w * fb);
                    self.add(i, wrap_j(j), k, wa * w * fb);
                    self.add(i, wrap_j(jb), k, wb * w * fb);
                }
            }
        }
    }
}

/// Predictor-phase deposition, called once per step before the gas update.
///
/// Refreshes the gas cache, clears the buffer, and deposits for every live
/// grain the drag impulse `m (u - v) dt / (2 t_s)` with `t_s` clamped to at
/// least dt.
pub fn feedback_predictor(
    grid: &mut Grid,
    grains: &Grains,
    feedback: &mut FeedbackBuffer,
    cfg: &PhysicsConfig,
) {
    grid.refresh_gas_cache();
    feedback.clear();

    for grain in grains.list.iter().filter(|g| g.pos != POS_GHOST) {
        let st = weight_stencil(grid, grain.position);
        let Some(gas) = gas_values(grid, &st) else {
            continue;
        };

        let mut u = gas.u;
        gas_velocity_shift(cfg, grain.position, &mut u);
        let vd = u - grain.velocity;

        let species = &grains.species[grain.property];
        // clamp to suppress the stiff dependence on t_s
        let tstop = species.drag.stopping_time(gas.rho, gas.cs, vd.length()).max(grid.dt);
        let ts1h = 0.5 * grid.dt / tstop;

        feedback.deposit(&st, species.mass * vd * ts1h);
    }
}

/// Corrector-phase deposition for one grain, called from the integrator
/// loop once its velocity update `dv` is known.
///
/// The drag part of the impulse is `dv` minus the non-drag force evaluated
/// at the midpoint state; it is deposited with the grain-to-gas sign.
pub(crate) fn feedback_corrector(
    grid: &Grid,
    cfg: &PhysicsConfig,
    species: &[GrainSpecies],
    old: &Grain,
    new: &Grain,
    dv: DVec3,
    feedback: &mut FeedbackBuffer,
) {
    let mass = species[old.property].mass;
    let mid_pos = 0.5 * (old.position + new.position);
    let mid_vel = 0.5 * (old.velocity + new.velocity);

    let f = frame_force(cfg, grid.three_d(), mid_pos, mid_vel);
    let fb = mass * (grid.dt * f - dv);

    let st = weight_stencil(grid, mid_pos);
    feedback.deposit(&st, fb);

    if cfg.shearing_box && !cfg.fargo && grid.three_d() {
        feedback.deposit_shear(grid, cfg, &st, fb);
    }
}
