use crate::flds::Domain;
use crate::Float;
use rayon::prelude::*;
use strength_reduce::StrengthReducedUsize;

/// Where a component sits along one axis of its cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Centering {
    Node,
    Cell,
}

/// Staggering of a field component along x, y and z.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct IndexType(pub [Centering; 3]);

impl IndexType {
    pub const NODAL: IndexType = IndexType([Centering::Node; 3]);
    pub const CELL: IndexType = IndexType([Centering::Cell; 3]);

    /// Yee position of E (and J) component `comp`: edge centered,
    /// so cell centered along `comp` and nodal along the others.
    pub fn yee_e(comp: usize) -> IndexType {
        let mut c = [Centering::Node; 3];
        c[comp] = Centering::Cell;
        IndexType(c)
    }

    /// Yee position of B component `comp`: face centered.
    pub fn yee_b(comp: usize) -> IndexType {
        let mut c = [Centering::Cell; 3];
        c[comp] = Centering::Node;
        IndexType(c)
    }

    #[inline(always)]
    pub fn is_cell(&self, axis: usize) -> bool {
        self.0[axis] == Centering::Cell
    }

    /// Offset of sample 0 from the lower domain edge, in cells.
    #[inline(always)]
    pub fn offset(&self, axis: usize) -> Float {
        if self.is_cell(axis) {
            0.5
        } else {
            0.0
        }
    }
}

/// Shape of a field: number of valid points and ghost layers per axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct FieldDim {
    pub len: [usize; 3],
    pub n_ghost: [usize; 3],
}

impl FieldDim {
    /// Number of stored points along each axis, ghosts included.
    #[inline(always)]
    pub fn with_ghosts(&self) -> [usize; 3] {
        [
            self.len[0] + 2 * self.n_ghost[0],
            self.len[1] + 2 * self.n_ghost[1],
            self.len[2] + 2 * self.n_ghost[2],
        ]
    }

    pub fn total(&self) -> usize {
        let t = self.with_ghosts();
        t[0] * t[1] * t[2]
    }

    #[inline(always)]
    pub fn is_valid(&self, cell: [isize; 3]) -> bool {
        cell.iter()
            .zip(self.len.iter())
            .all(|(&c, &l)| c >= 0 && (c as usize) < l)
    }

    #[inline(always)]
    pub fn in_bounds(&self, cell: [isize; 3]) -> bool {
        (0..3).all(|a| {
            let ng = self.n_ghost[a] as isize;
            cell[a] >= -ng && cell[a] < self.len[a] as isize + ng
        })
    }

    /// Flat position of a cell in the stored vector. Index -1 is the
    /// first ghost layer, `len` the first ghost past the valid region.
    /// x runs fastest, then y, then z.
    #[inline(always)]
    pub fn get_index(&self, cell: [isize; 3]) -> usize {
        if !cfg!(feature = "unchecked") {
            assert!(
                self.in_bounds(cell),
                "cell {:?} outside field of len {:?} with ghosts {:?}",
                cell,
                self.len,
                self.n_ghost
            );
        }
        let t = self.with_ghosts();
        let i = (cell[0] + self.n_ghost[0] as isize) as usize;
        let j = (cell[1] + self.n_ghost[1] as isize) as usize;
        let k = (cell[2] + self.n_ghost[2] as isize) as usize;
        (k * t[1] + j) * t[0] + i
    }
}

/// One scalar component sampled on the grid, plus its halo.
#[derive(Clone, Debug)]
pub struct GridField {
    pub name: String,
    pub data: Vec<Float>,
    pub dim: FieldDim,
    pub index_type: IndexType,
}

impl GridField {
    /// Allocate a zeroed component over `domain`. Nodal axes carry one
    /// more point than cell-centered ones. Axes the domain does not
    /// resolve get a single point and no ghosts.
    pub fn new(name: &str, domain: &Domain, index_type: IndexType, n_ghost: usize) -> GridField {
        let mut len = [1; 3];
        let mut ng = [0; 3];
        for axis in 0..3 {
            if domain.dim.is_active(axis) {
                len[axis] = domain.n_cell[axis] + if index_type.is_cell(axis) { 0 } else { 1 };
                ng[axis] = n_ghost;
            }
        }
        GridField::with_len(name, len, index_type, ng)
    }

    pub fn with_len(
        name: &str,
        len: [usize; 3],
        index_type: IndexType,
        n_ghost: [usize; 3],
    ) -> GridField {
        let dim = FieldDim { len, n_ghost };
        GridField {
            name: name.to_string(),
            data: vec![0.0; dim.total()],
            dim,
            index_type,
        }
    }

    #[inline(always)]
    pub fn len(&self) -> [usize; 3] {
        self.dim.len
    }

    #[inline(always)]
    pub fn get(&self, i: isize, j: isize, k: isize) -> Float {
        let ind = self.dim.get_index([i, j, k]);
        unsafe {
            // get_index asserts the cell is stored unless unchecked is on
            *self.data.get_unchecked(ind)
        }
    }

    #[inline(always)]
    pub fn at(&self, cell: [isize; 3]) -> Float {
        self.get(cell[0], cell[1], cell[2])
    }

    #[inline(always)]
    pub fn set(&mut self, i: isize, j: isize, k: isize, val: Float) {
        let ind = self.dim.get_index([i, j, k]);
        self.data[ind] = val;
    }

    pub fn fill(&mut self, val: Float) {
        for v in self.data.iter_mut() {
            *v = val;
        }
    }

    /// Iterate over the valid (non-ghost) cells, x fastest.
    pub fn valid_cells(&self) -> impl Iterator<Item = [isize; 3]> {
        let [nx, ny, nz] = self.dim.len;
        (0..nz).flat_map(move |k| {
            (0..ny).flat_map(move |j| (0..nx).map(move |i| [i as isize, j as isize, k as isize]))
        })
    }

    /// Set every valid cell from `f(cell)`, in parallel. Ghosts are left
    /// untouched.
    pub fn par_fill_valid<F>(&mut self, f: F)
    where
        F: Fn([isize; 3]) -> Float + Sync + Send,
    {
        self.par_update_valid(|cell, _| f(cell));
    }

    /// Replace every valid cell by `f(cell, old value)`, in parallel.
    /// Each task writes only its own cell, so `f` may read any other field.
    pub fn par_update_valid<F>(&mut self, f: F)
    where
        F: Fn([isize; 3], Float) -> Float + Sync + Send,
    {
        let dim = self.dim;
        let t = dim.with_ghosts();
        let sx = StrengthReducedUsize::new(t[0]);
        let sy = StrengthReducedUsize::new(t[1]);
        let ng = dim.n_ghost;
        self.data.par_iter_mut().enumerate().for_each(|(n, v)| {
            let (rest, ii) = StrengthReducedUsize::div_rem(n, sx);
            let (kk, jj) = StrengthReducedUsize::div_rem(rest, sy);
            let cell = [
                ii as isize - ng[0] as isize,
                jj as isize - ng[1] as isize,
                kk as isize - ng[2] as isize,
            ];
            if dim.is_valid(cell) {
                *v = f(cell, *v);
            }
        });
    }

    /// Largest absolute value over the valid cells.
    pub fn max_abs(&self) -> Float {
        self.valid_cells()
            .map(|c| self.at(c).abs())
            .fold(0.0, Float::max)
    }

    /// Valid cells copied out in x-fastest order, ghosts dropped.
    pub fn valid_to_vec(&self) -> Vec<Float> {
        self.valid_cells().map(|c| self.at(c)).collect()
    }
}
