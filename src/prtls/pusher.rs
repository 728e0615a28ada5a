use crate::consts::C;
use crate::Float;
use serde::Deserialize;

/// Momentum update rule of a species.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PusherKind {
    Vay,
    Boris,
}

/// Signature shared by the momentum updates: momenta in place, then the
/// fields at the particle, charge, mass and time step.
pub type MomentumUpdate = fn(
    &mut Float,
    &mut Float,
    &mut Float,
    Float,
    Float,
    Float,
    Float,
    Float,
    Float,
    Float,
    Float,
    Float,
);

impl PusherKind {
    pub fn update_fn(self) -> MomentumUpdate {
        match self {
            PusherKind::Vay => update_momentum_vay,
            PusherKind::Boris => update_momentum_boris,
        }
    }
}

#[inline(always)]
pub fn lorentz_factor(ux: Float, uy: Float, uz: Float) -> Float {
    (1. + (ux * ux + uy * uy + uz * uz) / (C * C)).sqrt()
}

/// Vay's relativistic momentum push, Phys. Plasmas 15, 056701 (2008).
///
/// `u = gamma v` in m/s. The implicit equation for the new gamma is
/// solved in closed form, so there is no iteration. Conserves `|u|`
/// exactly when `E = 0` and is exact for uniform static fields with
/// `E x B` drift.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
pub fn update_momentum_vay(
    ux: &mut Float,
    uy: &mut Float,
    uz: &mut Float,
    ex: Float,
    ey: Float,
    ez: Float,
    bx: Float,
    by: Float,
    bz: Float,
    q: Float,
    m: Float,
    dt: Float,
) {
    let econst = q * dt / m;
    let bconst = 0.5 * q * dt / m;
    let inv_c = 1. / C;
    let inv_c2 = inv_c * inv_c;

    let inv_gamma = 1. / (1. + (*ux * *ux + *uy * *uy + *uz * *uz) * inv_c2).sqrt();

    let taux = bconst * bx;
    let tauy = bconst * by;
    let tauz = bconst * bz;
    let tausq = taux * taux + tauy * tauy + tauz * tauz;

    // full electric kick and the first half of the rotation with the old gamma
    let uxpr = *ux + econst * ex + (*uy * tauz - *uz * tauy) * inv_gamma;
    let uypr = *uy + econst * ey + (*uz * taux - *ux * tauz) * inv_gamma;
    let uzpr = *uz + econst * ez + (*ux * tauy - *uy * taux) * inv_gamma;

    let gprsq = 1. + (uxpr * uxpr + uypr * uypr + uzpr * uzpr) * inv_c2;
    let ust = (uxpr * taux + uypr * tauy + uzpr * tauz) * inv_c;
    let sigma = gprsq - tausq;
    // 1/gamma^2 at the new time, positive root of the quadratic
    let gisq = 2. / (sigma + (sigma * sigma + 4. * (tausq + ust * ust)).sqrt());

    let bg = bconst * gisq.sqrt();
    let tx = bg * bx;
    let ty = bg * by;
    let tz = bg * bz;
    let s = 1. / (1. + tausq * gisq);
    let tu = tx * uxpr + ty * uypr + tz * uzpr;

    *ux = s * (uxpr + tx * tu + uypr * tz - uzpr * ty);
    *uy = s * (uypr + ty * tu + uzpr * tx - uxpr * tz);
    *uz = s * (uzpr + tz * tu + uxpr * ty - uypr * tx);
}

/// Boris push: half electric kick, magnetic rotation, half electric kick.
#[allow(clippy::too_many_arguments)]
#[inline(always)]
pub fn update_momentum_boris(
    ux: &mut Float,
    uy: &mut Float,
    uz: &mut Float,
    ex: Float,
    ey: Float,
    ez: Float,
    bx: Float,
    by: Float,
    bz: Float,
    q: Float,
    m: Float,
    dt: Float,
) {
    let beta = 0.5 * q * dt / m;
    let ext = beta * ex;
    let eyt = beta * ey;
    let ezt = beta * ez;

    let umx = *ux + ext;
    let umy = *uy + eyt;
    let umz = *uz + ezt;
    let gt = 1. / lorentz_factor(umx, umy, umz);

    let bxt = beta * bx * gt;
    let byt = beta * by * gt;
    let bzt = beta * bz * gt;

    let boris = 2.0 / (1.0 + bxt * bxt + byt * byt + bzt * bzt);

    let uxt = umx + umy * bzt - umz * byt;
    let uyt = umy + umz * bxt - umx * bzt;
    let uzt = umz + umx * byt - umy * bxt;

    *ux = umx + boris * (uyt * bzt - uzt * byt) + ext;
    *uy = umy + boris * (uzt * bxt - uxt * bzt) + eyt;
    *uz = umz + boris * (uxt * byt - uyt * bxt) + ezt;
}
