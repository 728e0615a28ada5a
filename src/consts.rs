//! Physical constants in SI units (CODATA 2018).
use crate::Float;

pub const PI: Float = std::f64::consts::PI as Float;

/// speed of light in vacuum [m/s]
pub const C: Float = 299_792_458.0;
/// vacuum permittivity [F/m]
pub const EP0: Float = 8.854_187_812_8e-12;
/// vacuum permeability [H/m]
pub const MU0: Float = 1.256_637_062_12e-6;
/// elementary charge [C]
pub const Q_E: Float = 1.602_176_634e-19;
/// electron mass [kg]
pub const M_E: Float = 9.109_383_701_5e-31;
/// proton mass [kg]
pub const M_P: Float = 1.672_621_923_69e-27;
