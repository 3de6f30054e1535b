//! Forces on a dust grain: rotating-frame terms and linear gas drag.

use glam::DVec3;

use crate::config::PhysicsConfig;
use crate::grain::DragLaw;
use crate::grid::Grid;
use crate::interp::{gas_values, gas_velocity_shift, weight_stencil};

/// Non-drag force per unit mass on a grain at `(pos, vel)`.
///
/// In the 3D shearing sheet the axes are (X, Y, Z): x2 is azimuth. In 2D
/// they are (X, Z, Y): the simulated plane is radial-vertical and x3 is
/// azimuth. Outside the shearing sheet there are no frame forces. Pure.
pub fn frame_force(cfg: &PhysicsConfig, three_d: bool, pos: DVec3, vel: DVec3) -> DVec3 {
    let mut ft = DVec3::ZERO;

    if !cfg.shearing_box {
        return ft;
    }

    let omega = cfg.omega;
    let omega2 = omega * omega;

    if three_d {
        // 3D shearing sheet (x1,x2,x3) = (X,Y,Z)
        if cfg.fargo {
            ft.x += 2.0 * vel.y * omega;
            ft.y += -0.5 * vel.x * omega;
        } else {
            ft.x += 3.0 * omega2 * pos.x + 2.0 * vel.y * omega;
            ft.y += -2.0 * vel.x * omega;
        }
        if cfg.vertical_gravity {
            ft.z += -omega2 * pos.z;
        }
    } else {
        // 2D shearing sheet (x1,x2,x3) = (X,Z,Y)
        ft.x += 3.0 * omega2 * pos.x + 2.0 * vel.z * omega;
        ft.z += -2.0 * vel.x * omega;
        if cfg.vertical_gravity {
            ft.y += -omega2 * pos.y;
        }
    }

    ft
}

/// Linear gas drag on a grain at `(pos, vel)`.
///
/// Interpolates the gas state at `pos`, applies the steady drift
/// correction, and returns `(F_d, 1/t_s)` with `F_d = -(v - u) / t_s`.
/// A point outside the integrable region moves freely that sub-step:
/// the force and inverse stopping time are both zero, with a warning.
pub fn gas_drag(grid: &Grid, cfg: &PhysicsConfig, law: DragLaw, pos: DVec3, vel: DVec3) -> (DVec3, f64) {
    let st = weight_stencil(grid, pos);

    match gas_values(grid, &st) {
        Some(gas) => {
            let mut u = gas.u;
            gas_velocity_shift(cfg, pos, &mut u);

            let dv = vel - u;
            // dimension-independent Euclidean norm
            let ts = law.stopping_time(gas.rho, gas.cs, dv.length());
            let ts1 = 1.0 / ts;
            (-ts1 * dv, ts1)
        }
        None => {
            log::warn!("grain moved out of grid on rank {}", grid.rank);
            (DVec3::ZERO, 0.0)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn shear_cfg(fargo: bool) -> PhysicsConfig {
        PhysicsConfig {
            shearing_box: true,
            fargo,
            omega: 2.0,
            ..PhysicsConfig::default()
        }
    }

    #[test]
    fn test_no_shear_means_no_force() {
        let cfg = PhysicsConfig::default();
        let f = frame_force(&cfg, true, DVec3::new(1.0, 2.0, 3.0), DVec3::new(4.0, 5.0, 6.0));
        assert_eq!(f, DVec3::ZERO);
    }

    #[test]
    fn test_three_d_tidal_and_coriolis() {
        let cfg = shear_cfg(false);
        let f = frame_force(&cfg, true, DVec3::new(0.5, 0.0, 0.0), DVec3::new(1.0, 1.0, 0.0));
        // F1 = 3 O^2 x1 + 2 O v2 = 3*4*0.5 + 2*2 = 10
        assert!((f.x - 10.0).abs() < 1e-14);
        // F2 = -2 O v1 = -4
        assert!((f.y + 4.0).abs() < 1e-14);
        assert_eq!(f.z, 0.0);
    }

    #[test]
    fn test_fargo_drops_tidal_and_halves_coriolis() {
        let cfg = shear_cfg(true);
        let f = frame_force(&cfg, true, DVec3::new(0.5, 0.0, 0.0), DVec3::new(1.0, 1.0, 0.0));
        // F1 = 2 O v2, no tidal term
        assert!((f.x - 4.0).abs() < 1e-14);
        // F2 = -0.5 O v1
        assert!((f.y + 1.0).abs() < 1e-14);
    }

    #[test]
    fn test_two_d_couples_x1_x3() {
        let cfg = shear_cfg(false);
        let f = frame_force(&cfg, false, DVec3::new(0.5, 0.0, 0.0), DVec3::new(1.0, 0.0, 1.0));
        // F1 = 3 O^2 x1 + 2 O v3
        assert!((f.x - 10.0).abs() < 1e-14);
        // F3 = -2 O v1
        assert!((f.z + 4.0).abs() < 1e-14);
        assert_eq!(f.y, 0.0);
    }

    #[test]
    fn test_vertical_gravity_axis_per_dimensionality() {
        let mut cfg = shear_cfg(false);
        cfg.vertical_gravity = true;
        let pos = DVec3::new(0.0, 0.3, 0.7);
        let f3 = frame_force(&cfg, true, pos, DVec3::ZERO);
        assert!((f3.z + 4.0 * 0.7).abs() < 1e-14); // -O^2 x3 in 3D
        let f2 = frame_force(&cfg, false, pos, DVec3::ZERO);
        assert!((f2.y + 4.0 * 0.3).abs() < 1e-14); // -O^2 x2 in 2D
    }

    #[test]
    fn test_drag_relaxes_toward_gas() {
        let mut grid = Grid::new(8, 1, 1, DVec3::ONE);
        grid.fill_uniform_gas(1.0, DVec3::ZERO, 1.0);
        let cfg = PhysicsConfig::default();
        let (fd, ts1) = gas_drag(
            &grid,
            &cfg,
            DragLaw::Constant(0.5),
            DVec3::new(4.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
        );
        assert!((ts1 - 2.0).abs() < 1e-14);
        assert!((fd.x + 2.0).abs() < 1e-14); // -(v-u)/t_s
        assert_eq!(fd.y, 0.0);
    }

    #[test]
    fn test_drag_outside_grid_is_free_motion() {
        let grid = Grid::new(8, 1, 1, DVec3::ONE);
        let cfg = PhysicsConfig::default();
        let (fd, ts1) = gas_drag(
            &grid,
            &cfg,
            DragLaw::Constant(0.5),
            DVec3::new(50.0, 0.0, 0.0),
            DVec3::new(1.0, 0.0, 0.0),
        );
        assert_eq!(fd, DVec3::ZERO);
        assert_eq!(ts1, 0.0);
    }

    #[test]
    fn test_drift_correction_feeds_drag() {
        let mut grid = Grid::new(8, 1, 1, DVec3::ONE);
        grid.fill_uniform_gas(1.0, DVec3::ZERO, 1.0);
        let cfg = PhysicsConfig {
            gas_drift: DVec3::new(-0.1, 0.0, 0.0),
            ..PhysicsConfig::default()
        };
        // grain comoving with the shifted gas feels no drag
        let (fd, _) = gas_drag(
            &grid,
            &cfg,
            DragLaw::Constant(1.0),
            DVec3::new(4.0, 0.0, 0.0),
            DVec3::new(-0.1, 0.0, 0.0),
        );
        assert!(fd.length() < 1e-14);
    }
}
