use crate::consts::C;
use crate::error::{ConfigError, Result};
use crate::{Float, PRTL_CHUNK_SIZE};
use itertools::izip;
use rand::prelude::*;
use rand_distr::{Standard, StandardNormal};
use rayon::prelude::*;

pub mod pusher;
pub mod qed;

use self::pusher::{lorentz_factor, PusherKind};
use self::qed::GetOpticalDepth;

/// Momenta and attached fields of one species, stored as arrays.
/// Positions and the field gather live outside this struct; the caller
/// fills `ext`..`bzt` before each push.
pub struct Prtl {
    pub name: String,
    pub ux: Vec<Float>,
    pub uy: Vec<Float>,
    pub uz: Vec<Float>,
    pub psa: Vec<Float>, // Lorentz Factors
    pub ext: Vec<Float>,
    pub eyt: Vec<Float>,
    pub ezt: Vec<Float>,
    pub bxt: Vec<Float>,
    pub byt: Vec<Float>,
    pub bzt: Vec<Float>,
    pub optical_depth: Option<Vec<Float>>,
    pub charge: Float,
    pub mass: Float,
    pub vth: Float,
    pub pusher: PusherKind,
}

impl Prtl {
    /// `num` particles at rest. Fails for a zero, negative or non-finite
    /// mass and for a non-finite charge.
    pub fn new(
        name: &str,
        num: usize,
        charge: Float,
        mass: Float,
        vth: Float,
        pusher: PusherKind,
    ) -> Result<Prtl> {
        if !(mass.is_finite() && mass > 0.) {
            return Err(ConfigError::InvalidSpecies {
                name: name.to_string(),
                reason: format!("mass must be positive, got {}", mass),
            });
        }
        if !charge.is_finite() || !vth.is_finite() || vth < 0. {
            return Err(ConfigError::InvalidSpecies {
                name: name.to_string(),
                reason: format!("charge {} and vth {} must be finite, vth >= 0", charge, vth),
            });
        }
        Ok(Prtl {
            name: name.to_string(),
            ux: vec![0.0; num],
            uy: vec![0.0; num],
            uz: vec![0.0; num],
            psa: vec![1.0; num],
            ext: vec![0.0; num],
            eyt: vec![0.0; num],
            ezt: vec![0.0; num],
            bxt: vec![0.0; num],
            byt: vec![0.0; num],
            bzt: vec![0.0; num],
            optical_depth: None,
            charge,
            mass,
            vth,
            pusher,
        })
    }

    pub fn len(&self) -> usize {
        self.ux.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ux.is_empty()
    }

    /// Thermal momenta with spread `vth * c` per component, boosted along
    /// x to Lorentz factor `gamma_inj` (no boost when it is 1). Drifting
    /// particles are flipped following Zenitani (2015) so the boosted
    /// distribution is a proper Juttner-Synge one.
    pub fn initialize_velocities<R: Rng>(&mut self, rng: &mut R, gamma_inj: Float) {
        let beta_inj = (1. - gamma_inj.powi(-2)).max(0.).sqrt();
        let spread = self.vth * C;
        for (ux, uy, uz, psa) in izip!(&mut self.ux, &mut self.uy, &mut self.uz, &mut self.psa) {
            let nx: Float = rng.sample(StandardNormal);
            let ny: Float = rng.sample(StandardNormal);
            let nz: Float = rng.sample(StandardNormal);
            *ux = nx * spread;
            *uy = ny * spread;
            *uz = nz * spread;
            *psa = lorentz_factor(*ux, *uy, *uz);

            if beta_inj > 0. {
                let mut ux_rest = *ux / C;
                let rand: Float = rng.sample(Standard);
                if -beta_inj * ux_rest > rand * *psa {
                    ux_rest *= -1.
                }
                *ux = gamma_inj * (ux_rest + beta_inj * *psa) * C;
                *psa = lorentz_factor(*ux, *uy, *uz);
            }
        }
    }

    /// Store the same field sample on every particle.
    pub fn set_uniform_fields(&mut self, e: [Float; 3], b: [Float; 3]) {
        for (fld, v) in [
            (&mut self.ext, e[0]),
            (&mut self.eyt, e[1]),
            (&mut self.ezt, e[2]),
            (&mut self.bxt, b[0]),
            (&mut self.byt, b[1]),
            (&mut self.bzt, b[2]),
        ]
        .iter_mut()
        {
            for f in fld.iter_mut() {
                *f = *v;
            }
        }
    }

    /// Advance every momentum by `dt` with the species' pusher using the
    /// attached field samples, then refresh the Lorentz factors.
    pub fn push_momenta(&mut self, dt: Float) {
        if !cfg!(feature = "unchecked") {
            let n = self.ux.len();
            let arrs = [
                &self.uy, &self.uz, &self.psa, &self.ext, &self.eyt, &self.ezt, &self.bxt,
                &self.byt, &self.bzt,
            ];
            for arr in &arrs {
                assert_eq!(arr.len(), n);
            }
        }
        let q = self.charge;
        let m = self.mass;
        let update = self.pusher.update_fn();
        (
            &mut self.ux,
            &mut self.uy,
            &mut self.uz,
            &mut self.psa,
            &self.ext,
            &self.eyt,
            &self.ezt,
            &self.bxt,
            &self.byt,
            &self.bzt,
        )
            .into_par_iter()
            .chunks(PRTL_CHUNK_SIZE)
            .for_each(|o| {
                o.into_iter().for_each(|(ux, uy, uz, psa, ex, ey, ez, bx, by, bz)| {
                    update(ux, uy, uz, *ex, *ey, *ez, *bx, *by, *bz, q, m, dt);
                    *psa = lorentz_factor(*ux, *uy, *uz);
                })
            });
    }

    /// Draw a fresh optical depth for every particle from `functor`.
    pub fn init_optical_depth<G: GetOpticalDepth>(&mut self, functor: &G, rng: &mut dyn RngCore) {
        let depths = (0..self.len()).map(|_| functor.optical_depth(rng)).collect();
        self.optical_depth = Some(depths);
    }

    /// Sum of `(gamma - 1) m c^2` over the species, in joules.
    pub fn kinetic_energy(&self) -> Float {
        let mc2 = self.mass * C * C;
        self.psa.par_iter().map(|g| (g - 1.) * mc2).sum()
    }
}
