//! Hooks into the quantum synchrotron model. Only the optical depth
//! initialization is provided here; the emission physics lives elsewhere.

use crate::Float;
use rand::RngCore;
use rand_distr::{Distribution, Exp1};

/// Produces the optical depth a lepton starts with.
pub trait GetOpticalDepth {
    fn optical_depth(&self, rng: &mut dyn RngCore) -> Float;
}

/// Draws `-ln(U)` with `U` uniform in (0, 1], i.e. a unit exponential.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuantumSynchrotronGetOpticalDepth;

impl GetOpticalDepth for QuantumSynchrotronGetOpticalDepth {
    #[inline(always)]
    fn optical_depth(&self, rng: &mut dyn RngCore) -> Float {
        Exp1.sample(rng)
    }
}

#[derive(Clone, Debug, Default)]
pub struct QuantumSynchrotronEngine;

impl QuantumSynchrotronEngine {
    pub fn new() -> QuantumSynchrotronEngine {
        QuantumSynchrotronEngine
    }

    pub fn build_optical_depth_functor(&self) -> QuantumSynchrotronGetOpticalDepth {
        QuantumSynchrotronGetOpticalDepth
    }
}
