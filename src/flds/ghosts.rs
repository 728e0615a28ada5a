use crate::flds::field::GridField;

/// Fill the halo of `fld` assuming the domain is periodic along every axis
/// that has ghosts.
///
/// The period of an axis is its number of cells, so for a nodal axis the
/// last valid point (which sits on the upper domain edge) is overwritten by
/// the first one as well. Requires `n_ghost <= period`.
#[inline(always)]
pub fn update_ghosts(fld: &mut GridField) {
    let dim = fld.dim;
    let mut period = [0isize; 3];
    for axis in 0..3 {
        let nodal_extra = if fld.index_type.is_cell(axis) { 0 } else { 1 };
        period[axis] = (dim.len[axis] - nodal_extra).max(1) as isize;
        if !cfg!(feature = "unchecked") {
            assert!(
                dim.n_ghost[axis] as isize <= period[axis],
                "{} has more ghosts than cells along axis {}",
                fld.name,
                axis
            );
        }
    }

    let t = dim.with_ghosts();
    for kk in 0..t[2] {
        let k = kk as isize - dim.n_ghost[2] as isize;
        for jj in 0..t[1] {
            let j = jj as isize - dim.n_ghost[1] as isize;
            for ii in 0..t[0] {
                let i = ii as isize - dim.n_ghost[0] as isize;
                let src = [
                    i.rem_euclid(period[0]),
                    j.rem_euclid(period[1]),
                    k.rem_euclid(period[2]),
                ];
                // points already inside [0, period) are their own source and
                // are never written, so the copy can run in place
                if src != [i, j, k] {
                    let v = fld.at(src);
                    fld.set(i, j, k, v);
                }
            }
        }
    }
}
