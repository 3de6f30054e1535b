//! Dust grains and the per-subdomain grain array.

use glam::DVec3;
use serde::{Deserialize, Serialize};

/// Status tag of a grain copied in from a neighbouring subdomain for
/// interpolation support. Purged before every integration pass.
pub const POS_GHOST: u8 = 0;

/// Status tag of a grain that left the live region during the current step.
/// The grain stays in the array; the boundary/migration layer consumes it.
pub const POS_EXIT: u8 = 10;

/// A single dust grain.
#[derive(Clone, Copy, Debug)]
pub struct Grain {
    /// World position (x1, x2, x3)
    pub position: DVec3,
    /// Current velocity (v1, v2, v3)
    pub velocity: DVec3,
    /// Index into the species table
    pub property: usize,
    /// Boundary/migration status tag: [`POS_GHOST`], live (>= 1), or
    /// [`POS_EXIT`]
    pub pos: u8,
    /// Azimuthal advection owed to the downstream remap (FARGO frame only)
    pub shift: f64,
}

impl Grain {
    /// Create a live grain of the given species.
    pub fn new(property: usize, position: DVec3, velocity: DVec3) -> Self {
        Self {
            position,
            velocity,
            property,
            pos: 1,
            shift: 0.0,
        }
    }
}

/// Species-dependent stopping-time law.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub enum DragLaw {
    /// Fixed stopping time, independent of the local gas state.
    Constant(f64),
    /// Epstein regime: t_s = rho_s a / (rho c_s), reduced by the standard
    /// supersonic correction sqrt(1 + 9 pi / 128 (|dv| / c_s)^2).
    Epstein { grain_radius: f64, grain_density: f64 },
    /// No drag coupling (1 / t_s = 0).
    Free,
}

impl DragLaw {
    /// Stopping time for a grain moving at |dv| relative to gas with
    /// density `rho` and sound speed `cs`.
    pub fn stopping_time(&self, rho: f64, cs: f64, dv: f64) -> f64 {
        match *self {
            DragLaw::Constant(ts) => ts,
            DragLaw::Epstein {
                grain_radius,
                grain_density,
            } => {
                let subsonic = grain_density * grain_radius / (rho * cs);
                let mach2 = (dv / cs) * (dv / cs);
                subsonic / (1.0 + 9.0 * std::f64::consts::PI / 128.0 * mach2).sqrt()
            }
            DragLaw::Free => f64::INFINITY,
        }
    }
}

/// Material constants shared by all grains of one species.
#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct GrainSpecies {
    /// Grain mass
    pub mass: f64,
    /// Stopping-time law
    pub drag: DragLaw,
    /// Live + exiting grain count of this species on this subdomain
    #[serde(default)]
    pub num: usize,
}

impl GrainSpecies {
    pub fn new(mass: f64, drag: DragLaw) -> Self {
        Self { mass, drag, num: 0 }
    }
}

/// The grain array of one subdomain.
///
/// Deletion is swap-with-last-and-shrink; indices are not stable across a
/// step and no caller may assume otherwise.
pub struct Grains {
    pub list: Vec<Grain>,
    pub species: Vec<GrainSpecies>,
}

impl Grains {
    /// Create an empty array over the given species table.
    pub fn new(species: Vec<GrainSpecies>) -> Self {
        Self {
            list: Vec::new(),
            species,
        }
    }

    /// Add a live grain and bump its species counter.
    pub fn spawn(&mut self, property: usize, position: DVec3, velocity: DVec3) {
        self.species[property].num += 1;
        self.list.push(Grain::new(property, position, velocity));
    }

    /// Add a grain with an explicit status tag (boundary-exchange injection).
    pub fn spawn_with_pos(&mut self, property: usize, position: DVec3, velocity: DVec3, pos: u8) {
        self.species[property].num += 1;
        let mut grain = Grain::new(property, position, velocity);
        grain.pos = pos;
        self.list.push(grain);
    }

    /// Number of grains currently in the array.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    /// Check if empty.
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Remove every ghost grain by swap-with-last-and-shrink.
    ///
    /// A swapped-in grain lands in the current slot and is re-tested, so a
    /// run of ghosts at the tail cannot survive. Idempotent.
    pub fn purge_ghosts(&mut self) {
        let mut p = 0;
        while p < self.list.len() {
            if self.list[p].pos == POS_GHOST {
                let property = self.list[p].property;
                let num = &mut self.species[property].num;
                assert!(
                    *num > 0,
                    "grain count underflow for species {} during compaction",
                    property
                );
                *num -= 1;
                self.list.swap_remove(p);
            } else {
                p += 1;
            }
        }
    }
}
