//! Lagrangian dust-grain integration for gas-disk simulations.
//!
//! Advances a population of massive dust grains coupled to a background gas
//! grid by a linear drag law, optionally in the rotating shearing-sheet
//! frame (Coriolis, tidal and vertical-gravity terms) or the FARGO advected
//! frame. Three second-order schemes cover stopping-time-to-time-step
//! ratios from ~1e-3 to ~1e3, and grain-to-gas momentum feedback can be
//! accumulated for the gas update.
//!
//! The gas solver, boundary exchange, particle migration and IO live in the
//! host code; this crate only consumes a gas grid that has already been
//! advanced through its predictor step.
//!
//! # Example
//!
//! ```
//! use dustbox::{DragLaw, DustSimulation, Grid, GrainSpecies, PhysicsConfig, Scheme};
//! use glam::DVec3;
//!
//! // 1D gas column at rest, one grain species with a fixed stopping time
//! let mut grid = Grid::new(8, 1, 1, DVec3::ONE);
//! grid.dt = 0.01;
//! grid.fill_uniform_gas(1.0, DVec3::ZERO, 1.0);
//!
//! let species = vec![GrainSpecies::new(1.0, DragLaw::Constant(1.0))];
//! let mut sim = DustSimulation::new(grid, species, PhysicsConfig::default(), Scheme::SemiImplicit);
//! sim.spawn_grain(0, DVec3::new(4.5, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0));
//!
//! for _ in 0..100 {
//!     sim.step();
//! }
//!
//! // drag has bled off most of the initial velocity
//! assert!(sim.grains.list[0].velocity.x < 0.5);
//! ```

pub mod config;
pub mod constants;
pub mod feedback;
pub mod forces;
pub mod grain;
pub mod grid;
pub mod integrate;
pub mod interp;
pub mod kernels;
pub mod serde_utils;

pub use config::PhysicsConfig;
pub use feedback::{feedback_predictor, FeedbackBuffer};
pub use glam::DVec3;
pub use grain::{DragLaw, Grain, GrainSpecies, Grains, POS_EXIT, POS_GHOST};
pub use grid::Grid;
pub use integrate::{
    integrate, integrate_explicit, integrate_fully_implicit, integrate_semi_implicit, Scheme,
};
pub use interp::{gas_values, weight_stencil, GasSample, WeightStencil};

/// Owning facade over one subdomain's grain population.
///
/// Bundles the gas grid, the grain array, the feedback buffer and the
/// physics configuration, and drives one integrator per call to
/// [`step`](DustSimulation::step). Hosts that need finer control (separate
/// predictor feedback, custom time-step logic) call the free functions
/// directly.
pub struct DustSimulation {
    /// Gas grid and subdomain geometry
    pub grid: Grid,
    /// All grains in the subdomain
    pub grains: Grains,
    /// Per-cell momentum deposited by the grains this step
    pub feedback: FeedbackBuffer,
    /// Physics variant selection
    pub config: PhysicsConfig,
    /// Integrator used by `step`
    pub scheme: Scheme,
}

impl DustSimulation {
    /// Create a simulation over the given grid and species table.
    pub fn new(grid: Grid, species: Vec<GrainSpecies>, config: PhysicsConfig, scheme: Scheme) -> Self {
        let feedback = FeedbackBuffer::new(&grid);
        Self {
            grains: Grains::new(species),
            feedback,
            grid,
            config,
            scheme,
        }
    }

    /// Spawn a live grain of species `property`.
    pub fn spawn_grain(&mut self, property: usize, position: DVec3, velocity: DVec3) {
        self.grains.spawn(property, position, velocity);
    }

    /// Number of grains currently in the array.
    pub fn grain_count(&self) -> usize {
        self.grains.len()
    }

    /// Predictor-phase feedback deposition, to be called between the gas
    /// predictor and corrector when feedback is enabled.
    pub fn feedback_predictor(&mut self) {
        feedback::feedback_predictor(&mut self.grid, &self.grains, &mut self.feedback, &self.config);
    }

    /// Advance all grains by one time step and bump the clock.
    pub fn step(&mut self) {
        self.grid.refresh_gas_cache();
        integrate(
            &self.grid,
            &mut self.grains,
            &mut self.feedback,
            &self.config,
            self.scheme,
        );
        self.grid.time += self.grid.dt;
    }
}
