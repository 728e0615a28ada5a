use crate::consts::PI;
use crate::error::{ConfigError, Result};
use crate::flds::{Dim, Domain};
use crate::Float;
use rustfft::num_complex::Complex;

/// Order of the finite-difference derivative a spectral solver mimics.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StencilOrder {
    Finite(u32),
    Infinite,
}

impl StencilOrder {
    /// `-1` selects infinite order; otherwise the order must be positive
    /// and even.
    pub fn from_config(axis: usize, order: i64) -> Result<StencilOrder> {
        if order == -1 {
            Ok(StencilOrder::Infinite)
        } else if order > 0 && order % 2 == 0 {
            Ok(StencilOrder::Finite(order as u32))
        } else {
            Err(ConfigError::InvalidStencilOrder { axis, order })
        }
    }
}

/// Which way a spectral shift moves a cell-centered component.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ShiftType {
    TransformFromCellCentered,
    TransformToCellCentered,
}

/// FFT wavenumbers of the grid, one vector per axis. Unresolved axes
/// hold the single mode k = 0.
pub struct SpectralKSpace {
    pub dim: Dim,
    pub n: [usize; 3],
    pub dx: [Float; 3],
    pub k: [Vec<Float>; 3],
}

impl SpectralKSpace {
    pub fn new(domain: &Domain) -> Result<SpectralKSpace> {
        if domain.dim == Dim::Rz {
            return Err(ConfigError::UnsupportedGeometry {
                what: "the spectral solver",
                geometry: "rz",
            });
        }
        let dx = domain.dx();
        let n = domain.n_cell;
        let k_axis = |axis: usize| -> Vec<Float> {
            let size = n[axis];
            (0..size)
                .map(|j| {
                    // same layout as the FFT output: 0, 1, ..., n/2, -n/2+1, ..., -1
                    let mut kk = j as Float;
                    if j >= size / 2 + 1 {
                        kk -= size as Float;
                    }
                    kk * 2.0 * PI / (size as Float * dx[axis])
                })
                .collect()
        };
        Ok(SpectralKSpace {
            dim: domain.dim,
            n,
            dx,
            k: [k_axis(0), k_axis(1), k_axis(2)],
        })
    }

    pub fn n_modes(&self) -> usize {
        self.n[0] * self.n[1] * self.n[2]
    }

    /// `exp(-+ i k dx/2)` along `axis`: multiplying by it moves a
    /// cell-centered component onto (or back from) the nodal origin.
    pub fn shift_factor(&self, axis: usize, shift: ShiftType) -> Vec<Complex<Float>> {
        let sign = match shift {
            ShiftType::TransformFromCellCentered => -1.0,
            ShiftType::TransformToCellCentered => 1.0,
        };
        let half_dx = 0.5 * self.dx[axis];
        self.k[axis]
            .iter()
            .map(|&k| Complex::from_polar(1.0, sign * k * half_dx))
            .collect()
    }
}

/// Fornberg coefficients of the order-`order` centered first derivative.
///
/// Nodal: `f'(x) ~ sum_n c_n (f(x + n dx) - f(x - n dx)) / (2 n dx)`,
/// `n = 1..=order/2`. Staggered: the same with half-integer offsets
/// `n - 1/2`.
pub fn fornberg_stencil_coefficients(order: u32, nodal: bool) -> Vec<Float> {
    let m = (order / 2) as usize;
    let mut coefs = vec![0.0 as Float; m + 1];
    if nodal {
        coefs[0] = -2.;
        for n in 1..=m {
            coefs[n] = -((m + 1 - n) as Float) / ((m + n) as Float) * coefs[n - 1];
        }
        // the first entry only seeds the recurrence
        coefs.remove(0);
    } else {
        let mut prod: Float = 1.;
        for k in 1..=m {
            prod *= (m + k) as Float / (4 * k) as Float;
        }
        coefs[0] = 4. * m as Float * prod * prod;
        for n in 1..m {
            let num = ((2 * n - 1) * (m - n)) as Float;
            let den = ((2 * n + 1) * (m + n)) as Float;
            coefs[n] = -num / den * coefs[n - 1];
        }
        coefs.truncate(m);
    }
    coefs
}

/// Wavenumbers of the finite-order derivative, per axis. Using these
/// instead of the exact k keeps spectral operators consistent with the
/// stencil the update equations are built on.
#[derive(Clone, Debug)]
pub struct ModifiedKVectors {
    pub kx: Vec<Float>,
    pub ky: Vec<Float>,
    pub kz: Vec<Float>,
    pub nodal: bool,
}

impl ModifiedKVectors {
    /// `orders` holds one entry per resolved axis: x, y, z in 3d and x, z
    /// in xz.
    pub fn new(
        kspace: &SpectralKSpace,
        orders: &[StencilOrder],
        nodal: bool,
    ) -> Result<ModifiedKVectors> {
        let expected = kspace.dim.n_active();
        if orders.len() != expected {
            return Err(ConfigError::DimensionMismatch(format!(
                "{} stencil orders given for a {} grid with {} axes",
                orders.len(),
                kspace.dim.name(),
                expected
            )));
        }
        let order_of = |axis: usize| -> Option<StencilOrder> {
            match (kspace.dim, axis) {
                (Dim::ThreeD, a) => Some(orders[a]),
                (_, 0) => Some(orders[0]),
                (_, 2) => Some(orders[1]),
                _ => None,
            }
        };
        let axis_k = |axis: usize| -> Vec<Float> {
            match order_of(axis) {
                Some(order) => modified_k_component(&kspace.k[axis], kspace.dx[axis], order, nodal),
                None => kspace.k[axis].clone(),
            }
        };
        Ok(ModifiedKVectors {
            kx: axis_k(0),
            ky: axis_k(1),
            kz: axis_k(2),
            nodal,
        })
    }

    pub fn component(&self, axis: usize) -> &[Float] {
        match axis {
            0 => &self.kx,
            1 => &self.ky,
            _ => &self.kz,
        }
    }
}

pub fn modified_k_component(
    k: &[Float],
    dx: Float,
    order: StencilOrder,
    nodal: bool,
) -> Vec<Float> {
    let p = match order {
        StencilOrder::Infinite => return k.to_vec(),
        StencilOrder::Finite(p) => p,
    };
    let coefs = fornberg_stencil_coefficients(p, nodal);
    k.iter()
        .map(|&kk| {
            coefs
                .iter()
                .enumerate()
                .map(|(idx, &c)| {
                    let n = idx as Float + if nodal { 1.0 } else { 0.5 };
                    c * (kk * n * dx).sin() / (n * dx)
                })
                .sum()
        })
        .collect()
}
