use super::{FieldIndex, SpectralAlgorithm, SpectralFieldData};
use crate::consts::{C, EP0};
use crate::error::{ConfigError, Result};
use crate::flds::wave_num::{ModifiedKVectors, SpectralKSpace, StencilOrder};
use crate::Float;
use rayon::prelude::*;
use rustfft::num_complex::Complex;

/// Pseudo-spectral analytical time domain update.
///
/// Integrates Maxwell's equations exactly over one step for each mode,
/// with J constant and rho linear in time across the step:
///
/// ```text
/// E+ = C E + S (c^2 i k x B - J/eps0) - i (X2 rho_new - X3 rho_old) k
/// B+ = C B - S i k x E + X1 i k x J
/// ```
///
/// with `C = cos(c|k|dt)`, `S = sin(c|k|dt)/(c|k|)`,
/// `X1 = (1 - C)/(eps0 c^2 k^2)`, `X2 = (1 - S/dt)/(eps0 k^2)` and
/// `X3 = (C - S/dt)/(eps0 k^2)`, all evaluated on the modified k.
pub struct PsatdAlgorithm {
    modified_k: ModifiedKVectors,
    n: [usize; 3],
    dt: Float,
    c_coef: Vec<Float>,
    s_ck: Vec<Float>,
    x1: Vec<Float>,
    x2: Vec<Float>,
    x3: Vec<Float>,
}

impl PsatdAlgorithm {
    pub fn new(
        kspace: &SpectralKSpace,
        orders: &[StencilOrder],
        nodal: bool,
        dt: Float,
    ) -> Result<PsatdAlgorithm> {
        if !(dt.is_finite() && dt > 0.) {
            return Err(ConfigError::InvalidTimeStep(vec![dt as f64]));
        }
        let modified_k = ModifiedKVectors::new(kspace, orders, nodal)?;
        let n = kspace.n;
        let n_modes = kspace.n_modes();
        let mut c_coef = vec![0.0; n_modes];
        let mut s_ck = vec![0.0; n_modes];
        let mut x1 = vec![0.0; n_modes];
        let mut x2 = vec![0.0; n_modes];
        let mut x3 = vec![0.0; n_modes];

        for k in 0..n[2] {
            for j in 0..n[1] {
                for i in 0..n[0] {
                    let m = (k * n[1] + j) * n[0] + i;
                    let kx = modified_k.kx[i];
                    let ky = modified_k.ky[j];
                    let kz = modified_k.kz[k];
                    let k2 = kx * kx + ky * ky + kz * kz;
                    if k2 != 0. {
                        let knorm = k2.sqrt();
                        let cos = (C * knorm * dt).cos();
                        let s = (C * knorm * dt).sin() / (C * knorm);
                        c_coef[m] = cos;
                        s_ck[m] = s;
                        x1[m] = (1. - cos) / (EP0 * C * C * k2);
                        x2[m] = (1. - s / dt) / (EP0 * k2);
                        x3[m] = (cos - s / dt) / (EP0 * k2);
                    } else {
                        // limits as |k| -> 0
                        c_coef[m] = 1.;
                        s_ck[m] = dt;
                        x1[m] = 0.5 * dt * dt / EP0;
                        x2[m] = C * C * dt * dt / (6. * EP0);
                        x3[m] = -C * C * dt * dt / (3. * EP0);
                    }
                }
            }
        }

        Ok(PsatdAlgorithm {
            modified_k,
            n,
            dt,
            c_coef,
            s_ck,
            x1,
            x2,
            x3,
        })
    }

    pub fn dt(&self) -> Float {
        self.dt
    }
}

impl SpectralAlgorithm for PsatdAlgorithm {
    fn push_spectral_fields(&self, f: &mut SpectralFieldData) {
        let n = self.n;
        let kv = &self.modified_k;
        let im = Complex::<Float>::i();
        let c2 = C * C;

        let fields = f.fields_mut();
        if !cfg!(feature = "unchecked") {
            assert!(fields.len() >= self.required_number_of_fields());
        }
        let (e, rest) = fields.split_at_mut(FieldIndex::Bx as usize);
        let (b, src) = rest.split_at_mut(3);
        let (ex, e_rest) = e.split_at_mut(1);
        let (ey, ez) = e_rest.split_at_mut(1);
        let (bx, b_rest) = b.split_at_mut(1);
        let (by, bz) = b_rest.split_at_mut(1);
        // src: Jx, Jy, Jz, RhoNew, RhoOld
        let (jx, jy, jz, rho_new, rho_old) = (&src[0], &src[1], &src[2], &src[3], &src[4]);

        (&mut ex[0], &mut ey[0], &mut ez[0], &mut bx[0], &mut by[0], &mut bz[0])
            .into_par_iter()
            .enumerate()
            .for_each(|(m, (ex, ey, ez, bx, by, bz))| {
                let i = m % n[0];
                let j = (m / n[0]) % n[1];
                let k = m / (n[0] * n[1]);
                let (kx, ky, kz) = (kv.kx[i], kv.ky[j], kv.kz[k]);

                let (ex0, ey0, ez0) = (*ex, *ey, *ez);
                let (bx0, by0, bz0) = (*bx, *by, *bz);
                let (jxm, jym, jzm) = (jx[m], jy[m], jz[m]);
                let cc = self.c_coef[m];
                let s = self.s_ck[m];
                let x1 = self.x1[m];
                let rho_term = im * (self.x2[m] * rho_new[m] - self.x3[m] * rho_old[m]);

                *ex = cc * ex0 + s * (c2 * im * (ky * bz0 - kz * by0) - jxm / EP0) - rho_term * kx;
                *ey = cc * ey0 + s * (c2 * im * (kz * bx0 - kx * bz0) - jym / EP0) - rho_term * ky;
                *ez = cc * ez0 + s * (c2 * im * (kx * by0 - ky * bx0) - jzm / EP0) - rho_term * kz;

                *bx = cc * bx0 - s * im * (ky * ez0 - kz * ey0) + x1 * im * (ky * jzm - kz * jym);
                *by = cc * by0 - s * im * (kz * ex0 - kx * ez0) + x1 * im * (kz * jxm - kx * jzm);
                *bz = cc * bz0 - s * im * (kx * ey0 - ky * ex0) + x1 * im * (kx * jym - ky * jxm);
            });
    }

    fn required_number_of_fields(&self) -> usize {
        11
    }

    fn modified_k(&self) -> &ModifiedKVectors {
        &self.modified_k
    }
}
