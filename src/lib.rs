use anyhow::{Context, Result};
use rand::prelude::*;
use rand::rngs::StdRng;
use serde::Deserialize;
use std::fs;
use tracing::{debug, info};

pub mod consts;
pub mod error;
pub mod flds;
pub mod prtls;
pub mod save;
pub mod slice;

use crate::consts::{C, EP0, PI};
use crate::error::ConfigError;
use crate::flds::fdtd::{courant_dt, FdtdScheme, FdtdSolver};
use crate::flds::spectral::{SpectralKind, SpectralSolver};
use crate::flds::wave_num::StencilOrder;
use crate::flds::{Dim, Domain, FieldSolver, Flds};
use crate::prtls::pusher::PusherKind;
use crate::prtls::qed::QuantumSynchrotronEngine;
use crate::prtls::Prtl;
use crate::slice::SliceRequest;

// We use a type alias for f64/Float to easily support
// double and single precision.
#[cfg(feature = "dprec")]
pub type Float = f64;

#[cfg(not(feature = "dprec"))]
pub type Float = f32;

/// Particles handed to one rayon task in the momentum push.
pub const PRTL_CHUNK_SIZE: usize = 2048;

#[derive(Deserialize)]
pub struct Config {
    pub grid: Grid,
    pub solver: Solver,
    #[serde(default)]
    pub species: Vec<Species>,
    #[serde(default)]
    pub external: External,
    #[serde(default)]
    pub init: Init,
    pub setup: Setup,
    pub output: Output,
}

#[derive(Deserialize)]
pub struct Grid {
    pub dim: Dim,
    pub n_cell: [usize; 3],
    pub prob_lo: [Float; 3],
    pub prob_hi: [Float; 3],
    #[serde(default = "Grid::default_ghosts")]
    pub n_ghost: usize,
    #[serde(default)]
    pub nodal: bool,
}

impl Grid {
    fn default_ghosts() -> usize {
        2
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SolverMethod {
    Yee,
    Ckc,
    Psatd,
    Pstd,
}

#[derive(Deserialize)]
pub struct Solver {
    pub method: SolverMethod,
    /// Fraction of the Courant limit. Ignored when `dt` is given.
    #[serde(default = "Solver::default_cfl")]
    pub cfl: Float,
    pub dt: Option<Float>,
    /// One entry per resolved axis; -1 is infinite order.
    #[serde(default)]
    pub stencil_order: Vec<i64>,
}

impl Solver {
    fn default_cfl() -> Float {
        0.99
    }
}

#[derive(Deserialize)]
pub struct Species {
    pub name: String,
    pub charge: Float,
    pub mass: Float,
    pub num: usize,
    #[serde(default)]
    pub vth: Float,
    #[serde(default = "Species::no_drift")]
    pub gamma_inj: Float,
    #[serde(default = "Species::default_pusher")]
    pub pusher: PusherKind,
    #[serde(default)]
    pub qed: bool,
}

impl Species {
    fn no_drift() -> Float {
        1.0
    }

    fn default_pusher() -> PusherKind {
        PusherKind::Vay
    }
}

/// Uniform fields attached to every particle. Gathering from the grid
/// happens outside this crate.
#[derive(Deserialize, Default)]
pub struct External {
    #[serde(default)]
    pub e: [Float; 3],
    #[serde(default)]
    pub b: [Float; 3],
}

/// Initial field: a plane wave `E_y = A cos(k x)`, `B_z = E_y / c` along
/// x with `mode` wavelengths in the box.
#[derive(Deserialize, Default)]
pub struct Init {
    #[serde(default)]
    pub wave_amplitude: Float,
    #[serde(default)]
    pub wave_mode: u32,
}

#[derive(Deserialize)]
pub struct Setup {
    pub t_final: u32,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Deserialize)]
pub struct Output {
    pub write_output: bool,
    pub output_interval: u32,
    pub stride: usize,
    pub slice: Option<SliceRequest>,
}

impl Config {
    pub fn new() -> Result<Config> {
        let contents =
            fs::read_to_string("config.toml").context("Could not open the config.toml file")?;
        Config::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Config> {
        toml::from_str(contents).with_context(|| "Could not parse Config file")
    }
}

/// Everything a run advances: grid, fields, solver and species.
pub struct Sim {
    pub config: Config,
    pub domain: Domain,
    pub dt: Float,
    pub flds: Flds,
    pub solver: FieldSolver,
    pub prtls: Vec<Prtl>,
    pub t: u32,
}

impl Sim {
    pub fn new(config: Config) -> Result<Sim> {
        let g = &config.grid;
        let domain = Domain::new(g.dim, g.n_cell, g.prob_lo, g.prob_hi)
            .context("Invalid [grid] section")?;
        if g.n_ghost < 1 {
            // every stencil reads one point past the valid box
            let err = ConfigError::InvalidGrid(format!(
                "n_ghost must be at least 1, got {}",
                g.n_ghost
            ));
            return Err(err).context("Invalid [grid] section");
        }

        let scheme = match config.solver.method {
            SolverMethod::Ckc => FdtdScheme::Ckc,
            _ => FdtdScheme::Yee,
        };
        let dt = match config.solver.dt {
            Some(dt) => dt,
            None => config.solver.cfl * courant_dt(&domain, scheme),
        };

        let solver = match config.solver.method {
            SolverMethod::Yee | SolverMethod::Ckc => {
                let solver = FdtdSolver::new(&domain, scheme, dt)
                    .context("Could not build the FDTD solver")?;
                FieldSolver::Fdtd(solver)
            }
            SolverMethod::Psatd | SolverMethod::Pstd => {
                let kind = if config.solver.method == SolverMethod::Psatd {
                    SpectralKind::Psatd
                } else {
                    SpectralKind::Pstd
                };
                let orders = if config.solver.stencil_order.is_empty() {
                    vec![StencilOrder::Infinite; domain.dim.n_active()]
                } else {
                    config
                        .solver
                        .stencil_order
                        .iter()
                        .enumerate()
                        .map(|(axis, &o)| StencilOrder::from_config(axis, o))
                        .collect::<std::result::Result<Vec<_>, _>>()
                        .context("Invalid stencil_order")?
                };
                let solver = SpectralSolver::new(&domain, kind, &orders, g.nodal, dt)
                    .context("Could not build the spectral solver")?;
                FieldSolver::Spectral(solver)
            }
        };
        info!(method = ?config.solver.method, dim = domain.dim.name(), dt, "field solver ready");

        let mut flds = Flds::new(&domain, g.n_ghost, g.nodal);
        init_plane_wave(&mut flds, &domain, &config.init);
        if cfg!(feature = "periodic") {
            flds.update_ghosts();
        }

        let mut rng = StdRng::seed_from_u64(config.setup.seed);
        let qed_engine = QuantumSynchrotronEngine::new();
        let mut prtls = Vec::with_capacity(config.species.len());
        for sp in &config.species {
            let mut prtl = Prtl::new(&sp.name, sp.num, sp.charge, sp.mass, sp.vth, sp.pusher)
                .with_context(|| format!("Invalid species {}", sp.name))?;
            prtl.initialize_velocities(&mut rng, sp.gamma_inj);
            if sp.qed {
                prtl.init_optical_depth(&qed_engine.build_optical_depth_functor(), &mut rng);
            }
            prtl.set_uniform_fields(config.external.e, config.external.b);
            debug!(name = %sp.name, num = sp.num, pusher = ?sp.pusher, "species initialized");
            prtls.push(prtl);
        }

        Ok(Sim {
            config,
            domain,
            dt,
            flds,
            solver,
            prtls,
            t: 0,
        })
    }

    /// One time step: fields, then momenta.
    pub fn step(&mut self) {
        self.solver.evolve(&mut self.flds);
        for prtl in self.prtls.iter_mut() {
            prtl.push_momenta(self.dt);
        }
        self.t += 1;
    }

    /// Largest |div E - rho/eps0| over the grid.
    pub fn gauss_residual(&mut self) -> Float {
        self.solver.compute_div_e(&mut self.flds);
        let div_e = &self.flds.div_e;
        let rho = &self.flds.rho;
        div_e
            .valid_cells()
            .map(|c| (div_e.at(c) - rho.at(c) / EP0).abs())
            .fold(0.0, Float::max)
    }

    pub fn max_div_b(&mut self) -> Float {
        self.solver.compute_div_b(&mut self.flds, &self.domain);
        self.flds.div_b.max_abs()
    }

    pub fn kinetic_energy(&self) -> Float {
        self.prtls.iter().map(|p| p.kinetic_energy()).sum()
    }
}

fn init_plane_wave(flds: &mut Flds, domain: &Domain, init: &Init) {
    if init.wave_amplitude == 0. || init.wave_mode == 0 {
        return;
    }
    let amp = init.wave_amplitude;
    let k = 2. * PI * init.wave_mode as Float / (domain.prob_hi[0] - domain.prob_lo[0]);
    let dx = domain.dx()[0];
    let x_of = |i: isize, cell: bool| (i as Float + if cell { 0.5 } else { 0. }) * dx;

    let ey_cell = flds.e.y.index_type.is_cell(0);
    flds.e.y.par_fill_valid(|c| amp * (k * x_of(c[0], ey_cell)).cos());
    let bz_cell = flds.b.z.index_type.is_cell(0);
    flds.b.z.par_fill_valid(|c| amp / C * (k * x_of(c[0], bz_cell)).cos());
}

pub fn run(cfg: Config) -> Result<()> {
    let mut sim = Sim::new(cfg)?;
    let t_final = sim.config.setup.t_final;
    let interval = sim.config.output.output_interval.max(1);

    for t in 0..=t_final {
        if t % interval == 0 {
            let field_energy = sim.flds.field_energy(&sim.domain);
            let kinetic_energy = sim.kinetic_energy();
            let residual = sim.gauss_residual();
            let div_b = sim.max_div_b();
            info!(t, field_energy, kinetic_energy, residual, div_b, "step");
            if sim.config.output.write_output {
                save::save_output(t / interval, &sim)?;
            }
        }
        sim.step();
    }
    info!(t_final, "done");
    Ok(())
}
