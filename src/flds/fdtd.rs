//! Finite-difference time-domain stencils on the Yee grid.
//!
//! Every kernel here works on one cell and returns a value (or an
//! increment); the loops that apply them to a whole field live on
//! [`FdtdSolver`] and in [`div_b_field`] / [`div_e_field`].
//!
//! Staggering follows Yee: `E_x` lives at `(i+1/2, j, k)`, `B_x` at
//! `(i, j+1/2, k+1/2)`, and so on. The divergence of B is therefore
//! cell centered (forward differences) and the divergence of E nodal
//! (backward differences).

use crate::consts::{C, EP0};
use crate::error::{ConfigError, Result};
use crate::flds::field::GridField;
use crate::flds::{CellGeometry, Dim, Domain, VectorField};
use crate::Float;
use serde::Deserialize;
use tracing::debug;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FdtdScheme {
    Yee,
    Ckc,
}

/// Cole-Karkkainen-Cowan coefficients. `beta_ab` weights the neighbours
/// offset along `b` in a derivative along `a`; `gamma_a` the diagonal
/// neighbours. All are already multiplied by `dt/d_a`.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct CkcCoefficients {
    pub alphax: Float,
    pub alphay: Float,
    pub alphaz: Float,
    pub betaxy: Float,
    pub betaxz: Float,
    pub betayx: Float,
    pub betayz: Float,
    pub betazx: Float,
    pub betazy: Float,
    pub gammax: Float,
    pub gammay: Float,
    pub gammaz: Float,
}

impl CkcCoefficients {
    /// Coefficients for `dt/dx` along each axis, after
    /// Cowan et al., PRST-AB 16, 041303 (2013).
    ///
    /// Fails for non-positive or non-finite ratios on a resolved axis, and
    /// in rz where the scheme does not exist.
    pub fn compute(dim: Dim, dtsd: [Float; 3]) -> Result<CkcCoefficients> {
        let bad = (0..3).any(|a| dim.is_active(a) && !(dtsd[a].is_finite() && dtsd[a] > 0.0));
        if bad {
            return Err(ConfigError::InvalidTimeStep(
                dtsd.iter().map(|&v| v as f64).collect(),
            ));
        }
        match dim {
            Dim::ThreeD => Ok(CkcCoefficients::three_d(dtsd[0], dtsd[1], dtsd[2])),
            Dim::Xz => Ok(CkcCoefficients::planar(dtsd[0], dtsd[2])),
            Dim::Rz => Err(ConfigError::UnsupportedGeometry {
                what: "the CKC scheme",
                geometry: "rz",
            }),
        }
    }

    pub fn three_d(dtsdx: Float, dtsdy: Float, dtsdz: Float) -> CkcCoefficients {
        let delta = dtsdx.max(dtsdy).max(dtsdz);
        let rx = (dtsdx / delta) * (dtsdx / delta);
        let ry = (dtsdy / delta) * (dtsdy / delta);
        let rz = (dtsdz / delta) * (dtsdz / delta);
        let rsum = ry * rz + rz * rx + rx * ry;
        let beta = 0.125 * (1. - rx * ry * rz / rsum);

        let betaxy = ry * beta;
        let betaxz = rz * beta;
        let betayx = rx * beta;
        let betayz = rz * beta;
        let betazx = rx * beta;
        let betazy = ry * beta;
        let gammax = ry * rz * (0.0625 - 0.125 * ry * rz / rsum);
        let gammay = rx * rz * (0.0625 - 0.125 * rx * rz / rsum);
        let gammaz = rx * ry * (0.0625 - 0.125 * rx * ry / rsum);
        let alphax = 1. - 2. * betaxy - 2. * betaxz - 4. * gammax;
        let alphay = 1. - 2. * betayx - 2. * betayz - 4. * gammay;
        let alphaz = 1. - 2. * betazx - 2. * betazy - 4. * gammaz;

        CkcCoefficients {
            alphax: alphax * dtsdx,
            alphay: alphay * dtsdy,
            alphaz: alphaz * dtsdz,
            betaxy: betaxy * dtsdx,
            betaxz: betaxz * dtsdx,
            betayx: betayx * dtsdy,
            betayz: betayz * dtsdy,
            betazx: betazx * dtsdz,
            betazy: betazy * dtsdz,
            gammax: gammax * dtsdx,
            gammay: gammay * dtsdy,
            gammaz: gammaz * dtsdz,
        }
    }

    /// Planar (xz) variant. Only the x and z coefficients are used; the
    /// rest stay zero.
    pub fn planar(dtsdx: Float, dtsdz: Float) -> CkcCoefficients {
        let delta = dtsdx.max(dtsdz);
        let rx = (dtsdx / delta) * (dtsdx / delta);
        let rz = (dtsdz / delta) * (dtsdz / delta);
        let betaxz = 0.125 * rz;
        let betazx = 0.125 * rx;
        let alphax = 1. - 2. * betaxz;
        let alphaz = 1. - 2. * betazx;

        CkcCoefficients {
            alphax: alphax * dtsdx,
            alphaz: alphaz * dtsdz,
            betaxz: betaxz * dtsdx,
            betazx: betazx * dtsdz,
            ..CkcCoefficients::default()
        }
    }
}

/// Largest stable time step of the scheme on `domain`.
pub fn courant_dt(domain: &Domain, scheme: FdtdScheme) -> Float {
    let dx = domain.dx();
    let active = (0..3).filter(|&a| domain.dim.is_active(a));
    match scheme {
        FdtdScheme::Yee => {
            let inv_sq: Float = active.map(|a| 1. / (dx[a] * dx[a])).sum();
            1. / (C * inv_sq.sqrt())
        }
        FdtdScheme::Ckc => active.map(|a| dx[a]).fold(Float::INFINITY, Float::min) / C,
    }
}

#[inline(always)]
fn shifted(c: [isize; 3], axis: usize, by: isize) -> [isize; 3] {
    let mut out = c;
    out[axis] += by;
    out
}

/// Forward difference of `f` along `d`, plus the CKC transverse terms.
/// `trans` lists (axis, beta) for each transverse axis; with two of them
/// the four diagonal neighbours are weighted by `gamma`.
#[inline(always)]
fn ckc_diff(
    f: &GridField,
    c: [isize; 3],
    d: usize,
    alpha: Float,
    trans: &[(usize, Float)],
    gamma: Float,
) -> Float {
    let diff = |p: [isize; 3]| f.at(shifted(p, d, 1)) - f.at(p);

    let mut sum = alpha * diff(c);
    for &(t, beta) in trans {
        sum += beta * (diff(shifted(c, t, 1)) + diff(shifted(c, t, -1)));
    }
    if let [(t1, _), (t2, _)] = trans {
        for &s1 in &[-1isize, 1] {
            for &s2 in &[-1isize, 1] {
                sum += gamma * diff(shifted(shifted(c, *t1, s1), *t2, s2));
            }
        }
    }
    sum
}

// Yee push of B: B -= dt curl E. `dtsd` is dt/dx per axis.

#[inline(always)]
pub fn push_bx_yee(
    c: [isize; 3],
    ey: &GridField,
    ez: &GridField,
    dtsd: [Float; 3],
    dim: Dim,
) -> Float {
    let [i, j, k] = c;
    let dz = dtsd[2] * (ey.get(i, j, k + 1) - ey.get(i, j, k));
    if dim == Dim::ThreeD {
        dz - dtsd[1] * (ez.get(i, j + 1, k) - ez.get(i, j, k))
    } else {
        dz
    }
}

#[inline(always)]
pub fn push_by_yee(c: [isize; 3], ex: &GridField, ez: &GridField, dtsd: [Float; 3]) -> Float {
    let [i, j, k] = c;
    -dtsd[2] * (ex.get(i, j, k + 1) - ex.get(i, j, k))
        + dtsd[0] * (ez.get(i + 1, j, k) - ez.get(i, j, k))
}

#[inline(always)]
pub fn push_bz_yee(
    c: [isize; 3],
    ex: &GridField,
    ey: &GridField,
    dtsd: [Float; 3],
    dim: Dim,
) -> Float {
    let [i, j, k] = c;
    let dx = -dtsd[0] * (ey.get(i + 1, j, k) - ey.get(i, j, k));
    if dim == Dim::ThreeD {
        dx + dtsd[1] * (ex.get(i, j + 1, k) - ex.get(i, j, k))
    } else {
        dx
    }
}

// CKC push of B. Same curl, with the derivatives smoothed transversely.

#[inline(always)]
pub fn push_bx_ckc(
    c: [isize; 3],
    ey: &GridField,
    ez: &GridField,
    k: &CkcCoefficients,
    dim: Dim,
) -> Float {
    if dim == Dim::ThreeD {
        -ckc_diff(ez, c, 1, k.alphay, &[(0, k.betayx), (2, k.betayz)], k.gammay)
            + ckc_diff(ey, c, 2, k.alphaz, &[(0, k.betazx), (1, k.betazy)], k.gammaz)
    } else {
        ckc_diff(ey, c, 2, k.alphaz, &[(0, k.betazx)], 0.)
    }
}

#[inline(always)]
pub fn push_by_ckc(
    c: [isize; 3],
    ex: &GridField,
    ez: &GridField,
    k: &CkcCoefficients,
    dim: Dim,
) -> Float {
    if dim == Dim::ThreeD {
        -ckc_diff(ex, c, 2, k.alphaz, &[(0, k.betazx), (1, k.betazy)], k.gammaz)
            + ckc_diff(ez, c, 0, k.alphax, &[(1, k.betaxy), (2, k.betaxz)], k.gammax)
    } else {
        -ckc_diff(ex, c, 2, k.alphaz, &[(0, k.betazx)], 0.)
            + ckc_diff(ez, c, 0, k.alphax, &[(2, k.betaxz)], 0.)
    }
}

#[inline(always)]
pub fn push_bz_ckc(
    c: [isize; 3],
    ex: &GridField,
    ey: &GridField,
    k: &CkcCoefficients,
    dim: Dim,
) -> Float {
    if dim == Dim::ThreeD {
        -ckc_diff(ey, c, 0, k.alphax, &[(1, k.betaxy), (2, k.betaxz)], k.gammax)
            + ckc_diff(ex, c, 1, k.alphay, &[(0, k.betayx), (2, k.betayz)], k.gammay)
    } else {
        -ckc_diff(ey, c, 0, k.alphax, &[(2, k.betaxz)], 0.)
    }
}

// Yee push of E: E += c^2 dt curl B - mu0 c^2 dt J. `dtsd_c2` is
// c^2 dt/dx per axis and `mu_c2_dt` is mu0 c^2 dt.

#[inline(always)]
pub fn push_ex_yee(
    c: [isize; 3],
    by: &GridField,
    bz: &GridField,
    jx: &GridField,
    dtsd_c2: [Float; 3],
    mu_c2_dt: Float,
    dim: Dim,
) -> Float {
    let [i, j, k] = c;
    let mut inc = -dtsd_c2[2] * (by.get(i, j, k) - by.get(i, j, k - 1));
    if dim == Dim::ThreeD {
        inc += dtsd_c2[1] * (bz.get(i, j, k) - bz.get(i, j - 1, k));
    }
    inc - mu_c2_dt * jx.get(i, j, k)
}

#[inline(always)]
pub fn push_ey_yee(
    c: [isize; 3],
    bx: &GridField,
    bz: &GridField,
    jy: &GridField,
    dtsd_c2: [Float; 3],
    mu_c2_dt: Float,
) -> Float {
    let [i, j, k] = c;
    -dtsd_c2[0] * (bz.get(i, j, k) - bz.get(i - 1, j, k))
        + dtsd_c2[2] * (bx.get(i, j, k) - bx.get(i, j, k - 1))
        - mu_c2_dt * jy.get(i, j, k)
}

#[inline(always)]
pub fn push_ez_yee(
    c: [isize; 3],
    bx: &GridField,
    by: &GridField,
    jz: &GridField,
    dtsd_c2: [Float; 3],
    mu_c2_dt: Float,
    dim: Dim,
) -> Float {
    let [i, j, k] = c;
    let mut inc = dtsd_c2[0] * (by.get(i, j, k) - by.get(i - 1, j, k));
    if dim == Dim::ThreeD {
        inc -= dtsd_c2[1] * (bx.get(i, j, k) - bx.get(i, j - 1, k));
    }
    inc - mu_c2_dt * jz.get(i, j, k)
}

/// Divergence of B at cell `c`, forward differences.
///
/// In rz the radial term carries the metric weights `1 +- 0.5/r`, with
/// `r` (in cells) taken at the cell center.
#[inline(always)]
pub fn compute_div_b(
    c: [isize; 3],
    bx: &GridField,
    by: &GridField,
    bz: &GridField,
    g: &CellGeometry,
) -> Float {
    let [i, j, k] = c;
    let [dxinv, dyinv, dzinv] = g.inv_dx;
    match g.dim {
        Dim::ThreeD => {
            (bx.get(i + 1, j, k) - bx.get(i, j, k)) * dxinv
                + (by.get(i, j + 1, k) - by.get(i, j, k)) * dyinv
                + (bz.get(i, j, k + 1) - bz.get(i, j, k)) * dzinv
        }
        Dim::Xz => {
            (bx.get(i + 1, j, k) - bx.get(i, j, k)) * dxinv
                + (bz.get(i, j, k + 1) - bz.get(i, j, k)) * dzinv
        }
        Dim::Rz => {
            let r = g.rmin * dxinv + i as Float + 0.5;
            let ru = 1. + 0.5 / r;
            let rd = 1. - 0.5 / r;
            (ru * bx.get(i + 1, j, k) - rd * bx.get(i, j, k)) * dxinv
                + (bz.get(i, j, k + 1) - bz.get(i, j, k)) * dzinv
        }
    }
}

/// Divergence of E at node `c`, backward differences.
///
/// In rz the bulk formula has a 1/r term that blows up on the axis; there
/// (`i == 0` with the domain starting at r = 0) the radial part is
/// replaced by its regularized limit `4 E_r(0) / dr`.
#[inline(always)]
pub fn compute_div_e(
    c: [isize; 3],
    ex: &GridField,
    ey: &GridField,
    ez: &GridField,
    g: &CellGeometry,
) -> Float {
    let [i, j, k] = c;
    let [dxinv, dyinv, dzinv] = g.inv_dx;
    match g.dim {
        Dim::ThreeD => {
            (ex.get(i, j, k) - ex.get(i - 1, j, k)) * dxinv
                + (ey.get(i, j, k) - ey.get(i, j - 1, k)) * dyinv
                + (ez.get(i, j, k) - ez.get(i, j, k - 1)) * dzinv
        }
        Dim::Xz => {
            (ex.get(i, j, k) - ex.get(i - 1, j, k)) * dxinv
                + (ez.get(i, j, k) - ez.get(i, j, k - 1)) * dzinv
        }
        Dim::Rz => {
            if i == 0 && g.rmin == 0. {
                4. * ex.get(i, j, k) * dxinv + (ez.get(i, j, k) - ez.get(i, j, k - 1)) * dzinv
            } else {
                let r = g.rmin * dxinv + i as Float;
                let ru = 1. + 0.5 / r;
                let rd = 1. - 0.5 / r;
                (ru * ex.get(i, j, k) - rd * ex.get(i - 1, j, k)) * dxinv
                    + (ez.get(i, j, k) - ez.get(i, j, k - 1)) * dzinv
            }
        }
    }
}

/// Write div B into every valid cell of `div_b`.
pub fn div_b_field(b: &VectorField, div_b: &mut GridField, g: &CellGeometry) {
    div_b.par_fill_valid(|c| compute_div_b(c, &b.x, &b.y, &b.z, g));
}

/// Write div E into every valid node of `div_e`.
pub fn div_e_field(e: &VectorField, div_e: &mut GridField, g: &CellGeometry) {
    div_e.par_fill_valid(|c| compute_div_e(c, &e.x, &e.y, &e.z, g));
}

/// Applies the stencils above over whole fields for a fixed time step.
/// Holds no field data.
#[derive(Clone, Debug)]
pub struct FdtdSolver {
    scheme: FdtdScheme,
    geom: CellGeometry,
    dt: Float,
    // dt/dx of the B half step
    half_dtsd: [Float; 3],
    ckc: Option<CkcCoefficients>,
}

impl FdtdSolver {
    /// Fails in rz, and for a `dt` that is not positive and finite. The CKC
    /// coefficients of the B half step are computed here once.
    pub fn new(domain: &Domain, scheme: FdtdScheme, dt: Float) -> Result<FdtdSolver> {
        if domain.dim == Dim::Rz {
            return Err(ConfigError::UnsupportedGeometry {
                what: "the finite-difference field push",
                geometry: "rz",
            });
        }
        let geom = domain.cell_geometry();
        let inv = geom.inv_dx;
        if !(dt.is_finite() && dt > 0.) {
            return Err(ConfigError::InvalidTimeStep(
                inv.iter().map(|&v| (dt * v) as f64).collect(),
            ));
        }
        let half_dtsd = [0.5 * dt * inv[0], 0.5 * dt * inv[1], 0.5 * dt * inv[2]];
        let ckc = match scheme {
            FdtdScheme::Ckc => {
                let ckc = CkcCoefficients::compute(domain.dim, half_dtsd)?;
                debug!(?ckc, "ckc coefficients");
                Some(ckc)
            }
            FdtdScheme::Yee => None,
        };
        debug!(?scheme, dim = domain.dim.name(), dt, "fdtd solver ready");
        Ok(FdtdSolver {
            scheme,
            geom,
            dt,
            half_dtsd,
            ckc,
        })
    }

    pub fn scheme(&self) -> FdtdScheme {
        self.scheme
    }

    pub fn dt(&self) -> Float {
        self.dt
    }

    /// CKC coefficients of the B half step, `None` for Yee.
    pub fn ckc(&self) -> Option<&CkcCoefficients> {
        self.ckc.as_ref()
    }

    /// B -= dt/2 curl E over all valid points of B. Ghosts of E must be
    /// current.
    pub fn evolve_b(&self, b: &mut VectorField, e: &VectorField) {
        let dim = self.geom.dim;
        let dtsd = self.half_dtsd;
        let VectorField { x: bx, y: by, z: bz } = b;
        match &self.ckc {
            None => {
                bx.par_update_valid(|c, v| v + push_bx_yee(c, &e.y, &e.z, dtsd, dim));
                by.par_update_valid(|c, v| v + push_by_yee(c, &e.x, &e.z, dtsd));
                bz.par_update_valid(|c, v| v + push_bz_yee(c, &e.x, &e.y, dtsd, dim));
            }
            Some(ckc) => {
                bx.par_update_valid(|c, v| v + push_bx_ckc(c, &e.y, &e.z, ckc, dim));
                by.par_update_valid(|c, v| v + push_by_ckc(c, &e.x, &e.z, ckc, dim));
                bz.par_update_valid(|c, v| v + push_bz_ckc(c, &e.x, &e.y, ckc, dim));
            }
        }
    }

    /// E += c^2 dt curl B - dt J / eps0. Both schemes use the Yee stencil
    /// for E.
    pub fn evolve_e(&self, e: &mut VectorField, b: &VectorField, j: &VectorField) {
        let dim = self.geom.dim;
        let inv = self.geom.inv_dx;
        let c2dt = C * C * self.dt;
        let dtsd_c2 = [c2dt * inv[0], c2dt * inv[1], c2dt * inv[2]];
        // mu0 c^2 = 1/eps0
        let mu_c2_dt = self.dt / EP0;
        let VectorField { x: ex, y: ey, z: ez } = e;
        ex.par_update_valid(|c, v| v + push_ex_yee(c, &b.y, &b.z, &j.x, dtsd_c2, mu_c2_dt, dim));
        ey.par_update_valid(|c, v| v + push_ey_yee(c, &b.x, &b.z, &j.y, dtsd_c2, mu_c2_dt));
        ez.par_update_valid(|c, v| v + push_ez_yee(c, &b.x, &b.y, &j.z, dtsd_c2, mu_c2_dt, dim));
    }

    pub fn compute_div_b(&self, b: &VectorField, div_b: &mut GridField) {
        div_b_field(b, div_b, &self.geom);
    }

    pub fn compute_div_e(&self, e: &VectorField, div_e: &mut GridField) {
        div_e_field(e, div_e, &self.geom);
    }
}
