//! Configuration errors raised while building solvers, species and slices.
//!
//! Kernels themselves never fail; everything that can go wrong is caught
//! when an object is constructed.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("stencil order along axis {axis} must be a positive even number, got {order}")]
    InvalidStencilOrder { axis: usize, order: i64 },

    #[error("dimension mismatch: {0}")]
    DimensionMismatch(String),

    #[error("time step over cell size must be positive and finite, got {0:?}")]
    InvalidTimeStep(Vec<f64>),

    #[error("{what} is not supported in {geometry} geometry")]
    UnsupportedGeometry {
        what: &'static str,
        geometry: &'static str,
    },

    #[error("invalid grid: {0}")]
    InvalidGrid(String),

    #[error("slice box is malformed along axis {axis}: lo {lo} > hi {hi}")]
    InvalidSliceBox { axis: usize, lo: f64, hi: f64 },

    #[error("coarsening ratio along axis {axis} must be at least 1, got {ratio}")]
    InvalidCoarsening { axis: usize, ratio: usize },

    #[error("slice [{lo}, {hi}] along axis {axis} does not intersect domain [{dom_lo}, {dom_hi}]")]
    SliceOutsideDomain {
        axis: usize,
        lo: f64,
        hi: f64,
        dom_lo: f64,
        dom_hi: f64,
    },

    #[error("invalid species {name}: {reason}")]
    InvalidSpecies { name: String, reason: String },
}

pub type Result<T> = std::result::Result<T, ConfigError>;
