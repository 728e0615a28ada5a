use super::{FieldIndex, SpectralAlgorithm, SpectralFieldData};
use crate::consts::{C, EP0};
use crate::error::{ConfigError, Result};
use crate::flds::wave_num::{ModifiedKVectors, SpectralKSpace, StencilOrder};
use crate::Float;
use itertools::izip;
use rustfft::num_complex::Complex;

/// Pseudo-spectral time domain update: leapfrog in time, spectral
/// derivatives in space. B is advanced in two half steps around the E
/// push, and E is projected so that Gauss's law holds with the current
/// rho.
pub struct PstdAlgorithm {
    modified_k: ModifiedKVectors,
    dt: Float,
    // per mode wavenumbers and 1/k^2 (0 at k = 0)
    k_x: Vec<Float>,
    k_y: Vec<Float>,
    k_z: Vec<Float>,
    k_norm: Vec<Float>,
}

impl PstdAlgorithm {
    pub fn new(
        kspace: &SpectralKSpace,
        orders: &[StencilOrder],
        nodal: bool,
        dt: Float,
    ) -> Result<PstdAlgorithm> {
        if !(dt.is_finite() && dt > 0.) {
            return Err(ConfigError::InvalidTimeStep(vec![dt as f64]));
        }
        let modified_k = ModifiedKVectors::new(kspace, orders, nodal)?;
        let n = kspace.n;
        let n_modes = kspace.n_modes();
        let mut k_x = Vec::with_capacity(n_modes);
        let mut k_y = Vec::with_capacity(n_modes);
        let mut k_z = Vec::with_capacity(n_modes);
        let mut k_norm = Vec::with_capacity(n_modes);
        for k in 0..n[2] {
            for j in 0..n[1] {
                for i in 0..n[0] {
                    let (kx, ky, kz) = (modified_k.kx[i], modified_k.ky[j], modified_k.kz[k]);
                    let k2 = kx * kx + ky * ky + kz * kz;
                    k_x.push(kx);
                    k_y.push(ky);
                    k_z.push(kz);
                    k_norm.push(if k2 != 0. { 1. / k2 } else { 0. });
                }
            }
        }
        Ok(PstdAlgorithm {
            modified_k,
            dt,
            k_x,
            k_y,
            k_z,
            k_norm,
        })
    }

    // B -= dt_half i k x E
    fn push_b_half(&self, fields: &mut [Vec<Complex<Float>>], dt_half: Float) {
        let (e, rest) = fields.split_at_mut(FieldIndex::Bx as usize);
        let (b_x, b_rest) = rest.split_at_mut(1);
        let (b_y, b_z) = b_rest.split_at_mut(1);
        let idt = Complex::new(0.0, dt_half);
        for (b_x, b_y, b_z, e_x, e_y, e_z, k_x, k_y, k_z) in izip!(
            &mut b_x[0],
            &mut b_y[0],
            &mut b_z[0],
            &e[0],
            &e[1],
            &e[2],
            &self.k_x,
            &self.k_y,
            &self.k_z
        ) {
            *b_x -= idt * (*k_y * *e_z - *k_z * *e_y);
            *b_y -= idt * (*k_z * *e_x - *k_x * *e_z);
            *b_z -= idt * (*k_x * *e_y - *k_y * *e_x);
        }
    }
}

impl SpectralAlgorithm for PstdAlgorithm {
    fn push_spectral_fields(&self, f: &mut SpectralFieldData) {
        let dt = self.dt;
        {
            let fields = f.fields_mut();
            if !cfg!(feature = "unchecked") {
                assert!(fields.len() >= self.required_number_of_fields());
                for fld in fields.iter() {
                    assert_eq!(fld.len(), self.k_norm.len());
                }
            }

            // B to the half step with the old E
            self.push_b_half(fields, 0.5 * dt);

            // push on electric field
            let (e, rest) = fields.split_at_mut(FieldIndex::Bx as usize);
            let (b, src) = rest.split_at_mut(3);
            let (e_x, e_rest) = e.split_at_mut(1);
            let (e_y, e_z) = e_rest.split_at_mut(1);
            let ic2dt = Complex::new(0.0, C * C * dt);
            let dt_ep0 = dt / EP0;
            for (e_x, e_y, e_z, b_x, b_y, b_z, j_x, j_y, j_z, k_x, k_y, k_z) in izip!(
                &mut e_x[0],
                &mut e_y[0],
                &mut e_z[0],
                &b[0],
                &b[1],
                &b[2],
                &src[0],
                &src[1],
                &src[2],
                &self.k_x,
                &self.k_y,
                &self.k_z
            ) {
                *e_x += ic2dt * (*k_y * *b_z - *k_z * *b_y) - dt_ep0 * *j_x;
                *e_y += ic2dt * (*k_z * *b_x - *k_x * *b_z) - dt_ep0 * *j_y;
                *e_z += ic2dt * (*k_x * *b_y - *k_y * *b_x) - dt_ep0 * *j_z;
            }

            // Boris correction: remove the part of E that violates i k.E = rho/eps0.
            // The k = 0 mode has no longitudinal direction and is left alone.
            let rho = &src[FieldIndex::RhoNew as usize - FieldIndex::Jx as usize];
            let i_ep0 = Complex::new(0.0, 1.0 / EP0);
            for (e_x, e_y, e_z, k_x, k_y, k_z, dsty, norm) in izip!(
                &mut e_x[0],
                &mut e_y[0],
                &mut e_z[0],
                &self.k_x,
                &self.k_y,
                &self.k_z,
                rho,
                &self.k_norm
            ) {
                let tmp = (*k_x * *e_x + *k_y * *e_y + *k_z * *e_z + i_ep0 * *dsty) * *norm;
                *e_x -= tmp * *k_x;
                *e_y -= tmp * *k_y;
                *e_z -= tmp * *k_z;
            }

            // and the second half of B with the new E
            self.push_b_half(fields, 0.5 * dt);
        }

        // Filter out the Nyquist frequency component, because it can cause
        // spurious imaginary quantities to show up in real space.
        for idx in FieldIndex::E.iter().chain(FieldIndex::B.iter()) {
            f.zero_nyquist(*idx);
        }
    }

    fn required_number_of_fields(&self) -> usize {
        10
    }

    fn modified_k(&self) -> &ModifiedKVectors {
        &self.modified_k
    }
}
