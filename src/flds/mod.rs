use crate::consts::{EP0, MU0};
use crate::error::{ConfigError, Result};
use crate::Float;
use serde::Deserialize;

pub mod fdtd;
pub mod fft;
pub mod field;
pub mod ghosts;
pub mod spectral;
pub mod wave_num;

use crate::flds::fdtd::FdtdSolver;
use crate::flds::field::{GridField, IndexType};
use crate::flds::ghosts::update_ghosts;
use crate::flds::spectral::SpectralSolver;

/// Dimensionality of the simulation. Planar (xz) and axisymmetric (rz)
/// runs resolve x (or r) and z; y then holds a single point.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub enum Dim {
    #[serde(rename = "3d")]
    ThreeD,
    #[serde(rename = "xz")]
    Xz,
    #[serde(rename = "rz")]
    Rz,
}

impl Dim {
    #[inline(always)]
    pub fn is_active(&self, axis: usize) -> bool {
        axis != 1 || *self == Dim::ThreeD
    }

    pub fn n_active(&self) -> usize {
        if *self == Dim::ThreeD {
            3
        } else {
            2
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dim::ThreeD => "3d",
            Dim::Xz => "xz",
            Dim::Rz => "rz",
        }
    }
}

/// Geometry of the (single level) grid.
#[derive(Clone, Debug, PartialEq)]
pub struct Domain {
    pub dim: Dim,
    pub n_cell: [usize; 3],
    pub prob_lo: [Float; 3],
    pub prob_hi: [Float; 3],
}

impl Domain {
    pub fn new(
        dim: Dim,
        n_cell: [usize; 3],
        prob_lo: [Float; 3],
        prob_hi: [Float; 3],
    ) -> Result<Domain> {
        let mut n_cell = n_cell;
        let mut prob_lo = prob_lo;
        let mut prob_hi = prob_hi;
        for axis in 0..3 {
            if !dim.is_active(axis) {
                n_cell[axis] = 1;
                if !(prob_hi[axis] > prob_lo[axis]) {
                    prob_lo[axis] = 0.0;
                    prob_hi[axis] = 1.0;
                }
                continue;
            }
            if n_cell[axis] == 0 {
                return Err(ConfigError::InvalidGrid(format!("no cells along axis {}", axis)));
            }
            if !prob_lo[axis].is_finite()
                || !prob_hi[axis].is_finite()
                || prob_hi[axis] <= prob_lo[axis]
            {
                return Err(ConfigError::InvalidGrid(format!(
                    "axis {} spans [{}, {}]",
                    axis, prob_lo[axis], prob_hi[axis]
                )));
            }
        }
        if dim == Dim::Rz && prob_lo[0] < 0.0 {
            return Err(ConfigError::InvalidGrid(format!(
                "minimum radius must be non-negative, got {}",
                prob_lo[0]
            )));
        }
        Ok(Domain {
            dim,
            n_cell,
            prob_lo,
            prob_hi,
        })
    }

    pub fn dx(&self) -> [Float; 3] {
        let mut dx = [0.0; 3];
        for axis in 0..3 {
            dx[axis] = (self.prob_hi[axis] - self.prob_lo[axis]) / self.n_cell[axis] as Float;
        }
        dx
    }

    /// Inverse cell size; zero along axes that are not resolved.
    pub fn inv_dx(&self) -> [Float; 3] {
        let dx = self.dx();
        let mut inv = [0.0; 3];
        for axis in 0..3 {
            if self.dim.is_active(axis) {
                inv[axis] = 1.0 / dx[axis];
            }
        }
        inv
    }

    /// Radius of the lower domain edge; only meaningful in rz.
    pub fn rmin(&self) -> Float {
        self.prob_lo[0]
    }

    pub fn cell_volume(&self) -> Float {
        let dx = self.dx();
        (0..3)
            .filter(|&a| self.dim.is_active(a))
            .map(|a| dx[a])
            .product()
    }

    pub fn cell_geometry(&self) -> CellGeometry {
        CellGeometry {
            dim: self.dim,
            inv_dx: self.inv_dx(),
            rmin: self.rmin(),
        }
    }
}

/// What a stencil needs to know about the grid: dimensionality, inverse
/// spacing and, in rz, the radius of the lower domain edge.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CellGeometry {
    pub dim: Dim,
    pub inv_dx: [Float; 3],
    pub rmin: Float,
}

/// The three components of a vector field.
#[derive(Clone, Debug)]
pub struct VectorField {
    pub x: GridField,
    pub y: GridField,
    pub z: GridField,
}

impl VectorField {
    pub fn new(
        name: &str,
        domain: &Domain,
        n_ghost: usize,
        index_types: [IndexType; 3],
    ) -> VectorField {
        VectorField {
            x: GridField::new(&format!("{}_x", name), domain, index_types[0], n_ghost),
            y: GridField::new(&format!("{}_y", name), domain, index_types[1], n_ghost),
            z: GridField::new(&format!("{}_z", name), domain, index_types[2], n_ghost),
        }
    }

    /// E or J: edge centered on a Yee grid, all nodal when `nodal`.
    pub fn new_edge(name: &str, domain: &Domain, n_ghost: usize, nodal: bool) -> VectorField {
        let it = if nodal {
            [IndexType::NODAL; 3]
        } else {
            [IndexType::yee_e(0), IndexType::yee_e(1), IndexType::yee_e(2)]
        };
        VectorField::new(name, domain, n_ghost, it)
    }

    /// B: face centered on a Yee grid, all nodal when `nodal`.
    pub fn new_face(name: &str, domain: &Domain, n_ghost: usize, nodal: bool) -> VectorField {
        let it = if nodal {
            [IndexType::NODAL; 3]
        } else {
            [IndexType::yee_b(0), IndexType::yee_b(1), IndexType::yee_b(2)]
        };
        VectorField::new(name, domain, n_ghost, it)
    }

    pub fn components(&self) -> [&GridField; 3] {
        [&self.x, &self.y, &self.z]
    }

    pub fn components_mut(&mut self) -> [&mut GridField; 3] {
        [&mut self.x, &mut self.y, &mut self.z]
    }

    pub fn fill(&mut self, v: [Float; 3]) {
        self.x.fill(v[0]);
        self.y.fill(v[1]);
        self.z.fill(v[2]);
    }
}

pub struct Flds {
    // The struct that holds all the fields of one level.
    pub e: VectorField,
    pub b: VectorField,
    pub j: VectorField,
    pub rho: GridField,
    pub rho_old: GridField,
    pub div_e: GridField,
    pub div_b: GridField,
}

impl Flds {
    pub fn new(domain: &Domain, n_ghost: usize, nodal: bool) -> Flds {
        let node_or_cell = if nodal { IndexType::NODAL } else { IndexType::CELL };
        Flds {
            e: VectorField::new_edge("e", domain, n_ghost, nodal),
            b: VectorField::new_face("b", domain, n_ghost, nodal),
            j: VectorField::new_edge("j", domain, n_ghost, nodal),
            rho: GridField::new("rho", domain, IndexType::NODAL, n_ghost),
            rho_old: GridField::new("rho_old", domain, IndexType::NODAL, n_ghost),
            div_e: GridField::new("div_e", domain, IndexType::NODAL, n_ghost),
            div_b: GridField::new("div_b", domain, node_or_cell, n_ghost),
        }
    }

    /// Periodic halo fill of E and B.
    pub fn update_ghosts(&mut self) {
        for fld in self.e.components_mut().iter_mut() {
            update_ghosts(fld);
        }
        for fld in self.b.components_mut().iter_mut() {
            update_ghosts(fld);
        }
    }

    /// Electromagnetic energy summed over valid points, eps0 E^2/2 + B^2/(2 mu0).
    pub fn field_energy(&self, domain: &Domain) -> Float {
        let dv = domain.cell_volume();
        let sum_sq = |f: &GridField| f.valid_cells().map(|c| f.at(c) * f.at(c)).sum::<Float>();
        let e2: Float = self.e.components().iter().map(|f| sum_sq(*f)).sum();
        let b2: Float = self.b.components().iter().map(|f| sum_sq(*f)).sum();
        dv * (0.5 * EP0 * e2 + 0.5 * b2 / MU0)
    }
}

/// The field solver of a run. Chosen once at setup.
pub enum FieldSolver {
    Fdtd(FdtdSolver),
    Spectral(SpectralSolver),
}

impl FieldSolver {
    /// Advance E and B by the time step the solver was built for.
    pub fn evolve(&mut self, flds: &mut Flds) {
        match self {
            FieldSolver::Fdtd(solver) => {
                // B half step, E full step, B half step
                solver.evolve_b(&mut flds.b, &flds.e);
                if cfg!(feature = "periodic") {
                    flds.update_ghosts();
                }
                solver.evolve_e(&mut flds.e, &flds.b, &flds.j);
                if cfg!(feature = "periodic") {
                    flds.update_ghosts();
                }
                solver.evolve_b(&mut flds.b, &flds.e);
                if cfg!(feature = "periodic") {
                    flds.update_ghosts();
                }
            }
            FieldSolver::Spectral(solver) => {
                solver.evolve(flds);
                if cfg!(feature = "periodic") {
                    flds.update_ghosts();
                }
            }
        }
    }

    /// Fill `flds.div_e` with the divergence of E consistent with the solver.
    pub fn compute_div_e(&mut self, flds: &mut Flds) {
        match self {
            FieldSolver::Fdtd(solver) => solver.compute_div_e(&flds.e, &mut flds.div_e),
            FieldSolver::Spectral(solver) => solver.compute_div_e(&flds.e, &mut flds.div_e),
        }
    }

    /// Fill `flds.div_b` with the divergence of B. Spectral runs use the
    /// finite difference operator on their (nodal) fields.
    pub fn compute_div_b(&self, flds: &mut Flds, domain: &Domain) {
        match self {
            FieldSolver::Fdtd(solver) => solver.compute_div_b(&flds.b, &mut flds.div_b),
            FieldSolver::Spectral(_) => {
                let geom = domain.cell_geometry();
                let b = &flds.b;
                flds.div_b
                    .par_fill_valid(|c| fdtd::compute_div_b(c, &b.x, &b.y, &b.z, &geom));
            }
        }
    }
}
