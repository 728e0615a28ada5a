//! Field solvers that advance E and B in Fourier space.
//!
//! A [`SpectralSolver`] owns the transformed fields of one grid and a
//! single [`SpectralAlgorithm`], picked at setup. Each step the real
//! fields are transformed in, the algorithm is called once for all
//! modes, and E and B are transformed back.

use crate::error::Result;
use crate::flds::fft::Fft3D;
use crate::flds::field::GridField;
use crate::flds::wave_num::{ModifiedKVectors, ShiftType, SpectralKSpace, StencilOrder};
use crate::flds::{Domain, Flds, VectorField};
use crate::Float;
use num_traits::Zero;
use rustfft::num_complex::Complex;
use serde::Deserialize;
use tracing::debug;

pub mod psatd;
pub mod pstd;

pub use psatd::PsatdAlgorithm;
pub use pstd::PstdAlgorithm;

/// Named slots of [`SpectralFieldData`]. An algorithm that needs `n`
/// fields uses the first `n` of these.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldIndex {
    Ex = 0,
    Ey,
    Ez,
    Bx,
    By,
    Bz,
    Jx,
    Jy,
    Jz,
    RhoNew,
    RhoOld,
}

impl FieldIndex {
    pub const E: [FieldIndex; 3] = [FieldIndex::Ex, FieldIndex::Ey, FieldIndex::Ez];
    pub const B: [FieldIndex; 3] = [FieldIndex::Bx, FieldIndex::By, FieldIndex::Bz];
    pub const J: [FieldIndex; 3] = [FieldIndex::Jx, FieldIndex::Jy, FieldIndex::Jz];
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpectralKind {
    Psatd,
    Pstd,
}

/// Per-mode complex values of every field an algorithm works on, plus
/// the FFT plans that move data in and out.
pub struct SpectralFieldData {
    n: [usize; 3],
    fields: Vec<Vec<Complex<Float>>>,
    from_cell: [Vec<Complex<Float>>; 3],
    to_cell: [Vec<Complex<Float>>; 3],
    fft: Fft3D,
    work: Vec<Complex<Float>>,
}

impl SpectralFieldData {
    pub fn new(kspace: &SpectralKSpace, n_fields: usize) -> SpectralFieldData {
        let n_modes = kspace.n_modes();
        let shifts = |shift: ShiftType| {
            [
                kspace.shift_factor(0, shift),
                kspace.shift_factor(1, shift),
                kspace.shift_factor(2, shift),
            ]
        };
        SpectralFieldData {
            n: kspace.n,
            fields: vec![vec![Complex::zero(); n_modes]; n_fields],
            from_cell: shifts(ShiftType::TransformFromCellCentered),
            to_cell: shifts(ShiftType::TransformToCellCentered),
            fft: Fft3D::new(kspace.n),
            work: vec![Complex::zero(); n_modes],
        }
    }

    pub fn n(&self) -> [usize; 3] {
        self.n
    }

    pub fn n_fields(&self) -> usize {
        self.fields.len()
    }

    #[inline(always)]
    pub fn mode_index(&self, i: usize, j: usize, k: usize) -> usize {
        (k * self.n[1] + j) * self.n[0] + i
    }

    pub fn get(&self, idx: FieldIndex) -> &[Complex<Float>] {
        &self.fields[idx as usize]
    }

    pub fn get_mut(&mut self, idx: FieldIndex) -> &mut [Complex<Float>] {
        &mut self.fields[idx as usize]
    }

    /// All slots at once, indexed by `FieldIndex as usize`.
    pub fn fields_mut(&mut self) -> &mut [Vec<Complex<Float>>] {
        &mut self.fields
    }

    /// Transform the first `n` points of `field` along each axis (the
    /// periodic part) into slot `idx`. Cell-centered axes are shifted onto
    /// the nodal origin.
    pub fn forward(&mut self, field: &GridField, idx: FieldIndex) {
        let [nx, ny, nz] = self.n;
        if !cfg!(feature = "unchecked") {
            let len = field.len();
            assert!(
                len[0] >= nx && len[1] >= ny && len[2] >= nz,
                "{} is smaller than the spectral grid",
                field.name
            );
        }
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let m = (k * ny + j) * nx + i;
                    self.work[m] = Complex::new(field.get(i as isize, j as isize, k as isize), 0.0);
                }
            }
        }
        self.fft.forward(&mut self.work);
        apply_shift(&mut self.work, self.n, &self.from_cell, field);
        self.fields[idx as usize].copy_from_slice(&self.work);
    }

    /// Inverse transform of slot `idx` into the valid points of `field`.
    pub fn backward(&mut self, idx: FieldIndex, field: &mut GridField) {
        self.work.copy_from_slice(&self.fields[idx as usize]);
        self.work_to_real(field);
    }

    /// Inverse transform of an arbitrary set of mode values.
    pub fn backward_values(&mut self, values: &[Complex<Float>], field: &mut GridField) {
        self.work.copy_from_slice(values);
        self.work_to_real(field);
    }

    fn work_to_real(&mut self, field: &mut GridField) {
        apply_shift(&mut self.work, self.n, &self.to_cell, field);
        self.fft.inverse(&mut self.work);
        let [nx, ny, nz] = self.n;
        let work = &self.work;
        // the extra point of a nodal axis is the periodic image of point 0
        field.par_fill_valid(|c| {
            let i = c[0] as usize % nx;
            let j = c[1] as usize % ny;
            let k = c[2] as usize % nz;
            work[(k * ny + j) * nx + i].re
        });
    }

    /// Zero the Nyquist mode of every even-length axis in slot `idx`. It
    /// has no sign, so derivatives of it leave spurious imaginary parts.
    pub fn zero_nyquist(&mut self, idx: FieldIndex) {
        let [nx, ny, nz] = self.n;
        let fld = &mut self.fields[idx as usize];
        for k in 0..nz {
            for j in 0..ny {
                for i in 0..nx {
                    let on_nyquist = (nx > 1 && nx % 2 == 0 && i == nx / 2)
                        || (ny > 1 && ny % 2 == 0 && j == ny / 2)
                        || (nz > 1 && nz % 2 == 0 && k == nz / 2);
                    if on_nyquist {
                        fld[(k * ny + j) * nx + i] = Complex::zero();
                    }
                }
            }
        }
    }
}

fn apply_shift(
    work: &mut [Complex<Float>],
    n: [usize; 3],
    shift: &[Vec<Complex<Float>>; 3],
    field: &GridField,
) {
    let [nx, ny, nz] = n;
    let cell = [
        field.index_type.is_cell(0) && nx > 1,
        field.index_type.is_cell(1) && ny > 1,
        field.index_type.is_cell(2) && nz > 1,
    ];
    if !cell.iter().any(|&c| c) {
        return;
    }
    let one = Complex::new(1.0, 0.0);
    for k in 0..nz {
        let sz = if cell[2] { shift[2][k] } else { one };
        for j in 0..ny {
            let syz = sz * if cell[1] { shift[1][j] } else { one };
            for i in 0..nx {
                let s = syz * if cell[0] { shift[0][i] } else { one };
                work[(k * ny + j) * nx + i] *= s;
            }
        }
    }
}

/// A spectral update rule. Concrete rules differ in their per-mode
/// equations and in how many field slots they need.
pub trait SpectralAlgorithm: Send + Sync {
    /// Advance the transformed fields by one time step.
    fn push_spectral_fields(&self, f: &mut SpectralFieldData);

    /// Number of leading `FieldIndex` slots the rule reads or writes.
    fn required_number_of_fields(&self) -> usize;

    fn modified_k(&self) -> &ModifiedKVectors;

    /// div E computed in Fourier space as `i (kx Ex + ky Ey + kz Ez)` with
    /// the modified wavenumbers. Overwrites the E slots of `field_data`.
    fn compute_spectral_div_e(
        &self,
        field_data: &mut SpectralFieldData,
        e: &VectorField,
        div_e: &mut GridField,
    ) {
        field_data.forward(&e.x, FieldIndex::Ex);
        field_data.forward(&e.y, FieldIndex::Ey);
        field_data.forward(&e.z, FieldIndex::Ez);

        let k = self.modified_k();
        let [nx, ny, nz] = field_data.n();
        let im = Complex::<Float>::i();
        let mut div = vec![Complex::zero(); nx * ny * nz];
        {
            let ex = field_data.get(FieldIndex::Ex);
            let ey = field_data.get(FieldIndex::Ey);
            let ez = field_data.get(FieldIndex::Ez);
            for kk in 0..nz {
                for jj in 0..ny {
                    for ii in 0..nx {
                        let m = field_data.mode_index(ii, jj, kk);
                        div[m] = im * (k.kx[ii] * ex[m] + k.ky[jj] * ey[m] + k.kz[kk] * ez[m]);
                    }
                }
            }
        }
        field_data.backward_values(&div, div_e);
    }
}

/// Spectral field solver of one grid.
pub struct SpectralSolver {
    field_data: SpectralFieldData,
    algorithm: Box<dyn SpectralAlgorithm>,
}

impl SpectralSolver {
    pub fn new(
        domain: &Domain,
        kind: SpectralKind,
        orders: &[StencilOrder],
        nodal: bool,
        dt: Float,
    ) -> Result<SpectralSolver> {
        let kspace = SpectralKSpace::new(domain)?;
        let algorithm: Box<dyn SpectralAlgorithm> = match kind {
            SpectralKind::Psatd => Box::new(PsatdAlgorithm::new(&kspace, orders, nodal, dt)?),
            SpectralKind::Pstd => Box::new(PstdAlgorithm::new(&kspace, orders, nodal, dt)?),
        };
        let n_fields = algorithm.required_number_of_fields();
        debug!(?kind, ?orders, nodal, n_fields, "spectral solver ready");
        Ok(SpectralSolver {
            field_data: SpectralFieldData::new(&kspace, n_fields),
            algorithm,
        })
    }

    pub fn algorithm(&self) -> &dyn SpectralAlgorithm {
        self.algorithm.as_ref()
    }

    pub fn field_data(&self) -> &SpectralFieldData {
        &self.field_data
    }

    pub fn field_data_mut(&mut self) -> &mut SpectralFieldData {
        &mut self.field_data
    }

    /// Transform the sources and fields in, push once, transform E and B out.
    pub fn evolve(&mut self, flds: &mut Flds) {
        let fd = &mut self.field_data;
        for (fld, idx) in flds.e.components().iter().zip(FieldIndex::E.iter()) {
            fd.forward(fld, *idx);
        }
        for (fld, idx) in flds.b.components().iter().zip(FieldIndex::B.iter()) {
            fd.forward(fld, *idx);
        }
        for (fld, idx) in flds.j.components().iter().zip(FieldIndex::J.iter()) {
            fd.forward(fld, *idx);
        }
        fd.forward(&flds.rho, FieldIndex::RhoNew);
        if fd.n_fields() > FieldIndex::RhoOld as usize {
            fd.forward(&flds.rho_old, FieldIndex::RhoOld);
        }

        self.algorithm.push_spectral_fields(fd);

        for (fld, idx) in flds.e.components_mut().iter_mut().zip(FieldIndex::E.iter()) {
            fd.backward(*idx, fld);
        }
        for (fld, idx) in flds.b.components_mut().iter_mut().zip(FieldIndex::B.iter()) {
            fd.backward(*idx, fld);
        }
    }

    pub fn compute_div_e(&mut self, e: &VectorField, div_e: &mut GridField) {
        self.algorithm
            .compute_spectral_div_e(&mut self.field_data, e, div_e);
    }
}
