//! Shared numerical constants for the grain integrators.

/// Support radius of the quadratic B-spline weight function, in cell units.
/// The 3-point stencil covers [-1.5, 1.5] around the particle.
pub const BSPLINE_SUPPORT_RADIUS: f64 = 1.5;

/// Ghost-zone depth on every active axis of the gas grid.
///
/// One cell is enough for the 3x3x3 interpolation stencil of a grain inside
/// the live region; the second cell keeps grains that overshoot the live
/// region by less than a cell (awaiting migration) interpolable.
pub const NGHOST: usize = 2;
