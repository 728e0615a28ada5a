//! Reduced copies of a grid field for output: a sub-box of the domain,
//! optionally coarsened, with planes that fall between samples filled by
//! linear interpolation.

use crate::error::{ConfigError, Result};
use crate::flds::field::{GridField, IndexType};
use crate::flds::Domain;
use crate::Float;
use serde::Deserialize;
use tracing::warn;

/// Fractional offsets below this (in samples) count as on a sample.
const SLICE_TOL: Float = 1e-6;

/// Physical box to extract and coarsening ratio per axis.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct SliceRequest {
    pub lo: [Float; 3],
    pub hi: [Float; 3],
    #[serde(default = "SliceRequest::no_coarsening")]
    pub coarsening: [usize; 3],
}

impl SliceRequest {
    fn no_coarsening() -> [usize; 3] {
        [1; 3]
    }

    pub fn whole_domain(domain: &Domain) -> SliceRequest {
        SliceRequest {
            lo: domain.prob_lo,
            hi: domain.prob_hi,
            coarsening: [1; 3],
        }
    }
}

/// A validated request in sample-index space of the source field.
#[derive(Clone, Debug, PartialEq)]
pub struct SliceBox {
    /// Fractional source index of the first output sample.
    pub start: [Float; 3],
    /// Number of output samples.
    pub n: [usize; 3],
    pub coarsening: [usize; 3],
    /// Physical position of the first and last output samples.
    pub prob_lo: [Float; 3],
    pub prob_hi: [Float; 3],
}

/// An extracted field and the physical box its samples span.
#[derive(Clone, Debug)]
pub struct Slice {
    pub field: GridField,
    pub prob_lo: [Float; 3],
    pub prob_hi: [Float; 3],
}

/// Validate `request` and clip it to `domain` for a field staggered as
/// `index_type`.
///
/// Errors on a coarsening ratio of zero, on `lo > hi`, and when the box
/// misses the domain along any resolved axis. Clipping is logged.
pub fn check_slice_input(
    domain: &Domain,
    index_type: IndexType,
    request: &SliceRequest,
) -> Result<SliceBox> {
    let dx = domain.dx();
    let mut start = [0.0; 3];
    let mut n = [1; 3];
    let mut prob_lo = domain.prob_lo;
    let mut prob_hi = domain.prob_hi;

    for axis in 0..3 {
        let cr = request.coarsening[axis];
        if cr == 0 {
            return Err(ConfigError::InvalidCoarsening { axis, ratio: cr });
        }
        if !domain.dim.is_active(axis) {
            continue;
        }
        let (lo, hi) = (request.lo[axis], request.hi[axis]);
        if !(lo <= hi) {
            return Err(ConfigError::InvalidSliceBox {
                axis,
                lo: lo as f64,
                hi: hi as f64,
            });
        }
        let (dom_lo, dom_hi) = (domain.prob_lo[axis], domain.prob_hi[axis]);
        if hi < dom_lo || lo > dom_hi {
            return Err(ConfigError::SliceOutsideDomain {
                axis,
                lo: lo as f64,
                hi: hi as f64,
                dom_lo: dom_lo as f64,
                dom_hi: dom_hi as f64,
            });
        }
        if lo < dom_lo || hi > dom_hi {
            warn!(axis, lo, hi, dom_lo, dom_hi, "slice clipped to the domain");
        }
        let lo = lo.max(dom_lo);
        let hi = hi.min(dom_hi);

        let off = index_type.offset(axis);
        let last = (stored_len(domain, index_type)[axis] - 1) as Float;
        let s_lo = ((lo - dom_lo) / dx[axis] - off).max(0.).min(last);
        let s_hi = ((hi - dom_lo) / dx[axis] - off).max(0.).min(last);

        let count = ((s_hi - s_lo) / cr as Float + SLICE_TOL).floor() as usize + 1;
        start[axis] = s_lo;
        n[axis] = count;
        prob_lo[axis] = dom_lo + (s_lo + off) * dx[axis];
        prob_hi[axis] = dom_lo + (s_lo + ((count - 1) * cr) as Float + off) * dx[axis];
    }

    Ok(SliceBox {
        start,
        n,
        coarsening: request.coarsening,
        prob_lo,
        prob_hi,
    })
}

// Valid points per axis of a field over `domain`.
fn stored_len(domain: &Domain, index_type: IndexType) -> [usize; 3] {
    let mut len = [1; 3];
    for axis in 0..3 {
        if domain.dim.is_active(axis) {
            len[axis] = domain.n_cell[axis] + if index_type.is_cell(axis) { 0 } else { 1 };
        }
    }
    len
}

// Lower source index and weight of the upper neighbour for a fractional
// sample position.
#[inline(always)]
fn lower_and_weight(s: Float, len: usize) -> (isize, Float) {
    let i0 = s.floor();
    let w = s - i0;
    let i0 = i0 as isize;
    if w < SLICE_TOL || i0 + 1 >= len as isize {
        (i0.min(len as isize - 1), 0.)
    } else if 1. - w < SLICE_TOL {
        (i0 + 1, 0.)
    } else {
        (i0, w)
    }
}

/// Sample `source` at the positions of `slice_box`, interpolating
/// linearly along each axis between the lower and upper neighbour. The
/// result has no ghosts.
pub fn interpolate_slice(source: &GridField, slice_box: &SliceBox) -> GridField {
    let len = source.len();
    let mut out = GridField::with_len(
        &format!("{}_slice", source.name),
        slice_box.n,
        source.index_type,
        [0; 3],
    );
    let start = slice_box.start;
    let cr = slice_box.coarsening;
    out.par_fill_valid(|c| {
        let mut lw = [(0isize, 0.0 as Float); 3];
        for axis in 0..3 {
            let s = start[axis] + (c[axis] as usize * cr[axis]) as Float;
            lw[axis] = lower_and_weight(s, len[axis]);
        }
        let mut val = 0.0;
        for dk in 0..2 {
            let wk = if dk == 0 { 1. - lw[2].1 } else { lw[2].1 };
            if wk == 0. {
                continue;
            }
            for dj in 0..2 {
                let wj = if dj == 0 { 1. - lw[1].1 } else { lw[1].1 };
                if wj == 0. {
                    continue;
                }
                for di in 0..2 {
                    let wi = if di == 0 { 1. - lw[0].1 } else { lw[0].1 };
                    if wi == 0. {
                        continue;
                    }
                    val += wi * wj * wk * source.get(lw[0].0 + di, lw[1].0 + dj, lw[2].0 + dk);
                }
            }
        }
        val
    });
    out
}

/// Extract `request` from `source`, which must span `domain`. The source
/// is left untouched.
pub fn create_slice(source: &GridField, domain: &Domain, request: &SliceRequest) -> Result<Slice> {
    let expected = stored_len(domain, source.index_type);
    if source.len() != expected {
        return Err(ConfigError::DimensionMismatch(format!(
            "{} has {:?} points, the domain implies {:?}",
            source.name,
            source.len(),
            expected
        )));
    }
    let slice_box = check_slice_input(domain, source.index_type, request)?;
    let field = interpolate_slice(source, &slice_box);
    Ok(Slice {
        field,
        prob_lo: slice_box.prob_lo,
        prob_hi: slice_box.prob_hi,
    })
}
