//! Gas grid as seen by the grain integrators.
//!
//! The grid owns the gas state the drag model interpolates from (conserved
//! density, momentum and sound speed, plus a primitive-velocity cache) and
//! the geometric metadata of one subdomain. An interior cell count of 1 on
//! any axis marks that axis collapsed: grains never advance along it.
//!
//! Gas arrays carry [`NGHOST`](crate::constants::NGHOST) ghost cells on each
//! side of every active axis, so a grain anywhere in the live region has a
//! full 3x3x3 interpolation stencil and feedback deposited near an edge
//! lands in halo cells for the driver to exchange.

use glam::DVec3;

use crate::constants::NGHOST;

/// Geometry and gas state of one subdomain.
pub struct Grid {
    /// Interior cell count along x1 (1 = axis collapsed)
    pub n1: usize,
    /// Interior cell count along x2 (1 = axis collapsed)
    pub n2: usize,
    /// Interior cell count along x3 (1 = axis collapsed)
    pub n3: usize,
    /// Cell spacing along x1
    pub dx1: f64,
    /// Cell spacing along x2
    pub dx2: f64,
    /// Cell spacing along x3
    pub dx3: f64,
    /// Inner edge of the interior region along x1
    pub x1min: f64,
    /// Inner edge of the interior region along x2
    pub x2min: f64,
    /// Inner edge of the interior region along x3
    pub x3min: f64,

    /// Global simulation time, owned by the outer driver
    pub time: f64,
    /// Time step, owned by the outer driver
    pub dt: f64,
    /// Subdomain rank, diagnostics only
    pub rank: usize,

    /// Lower particle live-region bound along x1 (half-open interval)
    pub x1lpar: f64,
    /// Upper particle live-region bound along x1
    pub x1upar: f64,
    pub x2lpar: f64,
    pub x2upar: f64,
    pub x3lpar: f64,
    pub x3upar: f64,

    /// Gas density per cell (ghost zones included)
    pub rho: Vec<f64>,
    /// Gas momentum density per cell, x1 component
    pub m1: Vec<f64>,
    /// Gas momentum density per cell, x2 component
    pub m2: Vec<f64>,
    /// Gas momentum density per cell, x3 component
    pub m3: Vec<f64>,
    /// Gas sound speed per cell
    pub cs: Vec<f64>,

    // Primitive velocity cache, refreshed from momentum by
    // `refresh_gas_cache`. Interpolation reads these.
    pub(crate) u1: Vec<f64>,
    pub(crate) u2: Vec<f64>,
    pub(crate) u3: Vec<f64>,
}

impl Grid {
    /// Create a grid of `n1 x n2 x n3` interior cells with the given
    /// spacings, interior origin at zero, filled with quiescent unit-density
    /// gas (rho = 1, u = 0, c_s = 1).
    pub fn new(n1: usize, n2: usize, n3: usize, spacing: DVec3) -> Self {
        assert!(n1 >= 1 && n2 >= 1 && n3 >= 1, "cell counts must be >= 1");
        let (nt1, nt2, nt3) = (total(n1), total(n2), total(n3));
        let cells = nt1 * nt2 * nt3;

        let mut grid = Self {
            n1,
            n2,
            n3,
            dx1: spacing.x,
            dx2: spacing.y,
            dx3: spacing.z,
            x1min: 0.0,
            x2min: 0.0,
            x3min: 0.0,
            time: 0.0,
            dt: 0.0,
            rank: 0,
            x1lpar: 0.0,
            x1upar: 0.0,
            x2lpar: 0.0,
            x2upar: 0.0,
            x3lpar: 0.0,
            x3upar: 0.0,
            rho: vec![1.0; cells],
            m1: vec![0.0; cells],
            m2: vec![0.0; cells],
            m3: vec![0.0; cells],
            cs: vec![1.0; cells],
            u1: vec![0.0; cells],
            u2: vec![0.0; cells],
            u3: vec![0.0; cells],
        };
        grid.reset_par_bounds();
        grid
    }

    /// Move the interior origin, recomputing the live-region bounds.
    pub fn with_origin(mut self, origin: DVec3) -> Self {
        self.x1min = origin.x;
        self.x2min = origin.y;
        self.x3min = origin.z;
        self.reset_par_bounds();
        self
    }

    fn reset_par_bounds(&mut self) {
        self.x1lpar = self.x1min;
        self.x1upar = self.x1min + self.n1 as f64 * self.dx1;
        self.x2lpar = self.x2min;
        self.x2upar = self.x2min + self.n2 as f64 * self.dx2;
        self.x3lpar = self.x3min;
        self.x3upar = self.x3min + self.n3 as f64 * self.dx3;
    }

    // ========== Geometry queries ==========

    /// Per-axis "integrate this axis" mask (true where Ni > 1).
    #[inline]
    pub fn active(&self) -> [bool; 3] {
        [self.n1 > 1, self.n2 > 1, self.n3 > 1]
    }

    /// True when the third axis is active; selects the 3D (X,Y,Z) layout of
    /// the shearing sheet over the 2D (X,Z,Y) one.
    #[inline]
    pub fn three_d(&self) -> bool {
        self.n3 > 1
    }

    /// Total cell counts including ghost zones.
    #[inline]
    pub fn totals(&self) -> (usize, usize, usize) {
        (total(self.n1), total(self.n2), total(self.n3))
    }

    /// Ghost-zone depth per axis (0 on collapsed axes).
    #[inline]
    pub fn ghosts(&self) -> (usize, usize, usize) {
        (ghost(self.n1), ghost(self.n2), ghost(self.n3))
    }

    /// Index into the gas arrays.
    #[inline]
    pub fn cell_index(&self, i: usize, j: usize, k: usize) -> usize {
        let (nt1, nt2, _) = self.totals();
        (k * nt2 + j) * nt1 + i
    }

    /// Fractional cell coordinate of a world position, in total-index space
    /// (cell `i` spans [i, i+1)). Collapsed axes map to the single cell.
    #[inline]
    pub fn cell_coord(&self, pos: DVec3) -> DVec3 {
        let (g1, g2, g3) = self.ghosts();
        DVec3::new(
            if self.n1 > 1 {
                (pos.x - self.x1min) / self.dx1 + g1 as f64
            } else {
                0.5
            },
            if self.n2 > 1 {
                (pos.y - self.x2min) / self.dx2 + g2 as f64
            } else {
                0.5
            },
            if self.n3 > 1 {
                (pos.z - self.x3min) / self.dx3 + g3 as f64
            } else {
                0.5
            },
        )
    }

    /// Particle live-region bounds as per-axis half-open intervals.
    #[inline]
    pub fn par_bounds(&self) -> [(f64, f64); 3] {
        [
            (self.x1lpar, self.x1upar),
            (self.x2lpar, self.x2upar),
            (self.x3lpar, self.x3upar),
        ]
    }

    // ========== Gas state ==========

    /// Refresh the primitive velocity cache from the conserved state.
    /// Call after the gas solver has advanced the grid and before
    /// integrating grains against it.
    pub fn refresh_gas_cache(&mut self) {
        for idx in 0..self.rho.len() {
            let d = self.rho[idx];
            if d > 0.0 {
                self.u1[idx] = self.m1[idx] / d;
                self.u2[idx] = self.m2[idx] / d;
                self.u3[idx] = self.m3[idx] / d;
            } else {
                self.u1[idx] = 0.0;
                self.u2[idx] = 0.0;
                self.u3[idx] = 0.0;
            }
        }
    }

    /// Fill every cell (ghosts included) with one gas state.
    pub fn fill_uniform_gas(&mut self, rho: f64, u: DVec3, cs: f64) {
        self.rho.fill(rho);
        self.m1.fill(rho * u.x);
        self.m2.fill(rho * u.y);
        self.m3.fill(rho * u.z);
        self.cs.fill(cs);
        self.u1.fill(u.x);
        self.u2.fill(u.y);
        self.u3.fill(u.z);
    }

    /// Set one cell's gas state (and its cache entry) directly.
    pub fn set_gas_cell(&mut self, i: usize, j: usize, k: usize, rho: f64, u: DVec3, cs: f64) {
        let idx = self.cell_index(i, j, k);
        self.rho[idx] = rho;
        self.m1[idx] = rho * u.x;
        self.m2[idx] = rho * u.y;
        self.m3[idx] = rho * u.z;
        self.cs[idx] = cs;
        self.u1[idx] = u.x;
        self.u2[idx] = u.y;
        self.u3[idx] = u.z;
    }
}

#[inline]
fn total(n: usize) -> usize {
    if n > 1 {
        n + 2 * NGHOST
    } else {
        1
    }
}

#[inline]
fn ghost(n: usize) -> usize {
    if n > 1 {
        NGHOST
    } else {
        0
    }
}
