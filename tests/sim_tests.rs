mod common;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use pic_kernels::consts::{M_E, Q_E};
use pic_kernels::error::ConfigError;
use pic_kernels::flds::{Dim, FieldSolver};
use pic_kernels::prtls::pusher::PusherKind;
use pic_kernels::prtls::Prtl;
use pic_kernels::save::{prtl_records, save_slice};
use pic_kernels::slice::{create_slice, SliceRequest};
use pic_kernels::{Config, Sim, SolverMethod};

#[test]
fn test_repo_config_parses() {
    let cfg = Config::from_toml(include_str!("../config.toml")).unwrap();
    assert_eq!(cfg.grid.dim, Dim::Xz);
    assert_eq!(cfg.solver.method, SolverMethod::Ckc);
    assert_eq!(cfg.species.len(), 2);
    assert_eq!(cfg.species[1].pusher, PusherKind::Boris);
    let slice = cfg.output.slice.unwrap();
    assert_eq!(slice.coarsening, [2, 1, 2]);
}

#[test]
fn test_config_defaults() {
    let cfg = common::small_config("yee");
    assert_eq!(cfg.grid.n_ghost, 2);
    assert!(!cfg.grid.nodal);
    assert!(cfg.solver.dt.is_none());
    assert!(cfg.solver.stencil_order.is_empty());
    assert_eq!(cfg.species[0].pusher, PusherKind::Vay);
    assert_eq!(cfg.species[0].gamma_inj, 1.0);
    assert!(!cfg.species[1].qed);
    assert_eq!(cfg.external.e, [0.; 3]);
    assert!(cfg.output.slice.is_none());
}

#[test]
fn test_malformed_config_is_an_error() {
    assert!(Config::from_toml("[grid]\ndim = \"2d\"").is_err());
}

#[test]
fn test_sim_setup() {
    let sim = Sim::new(common::small_config("ckc")).unwrap();
    assert!(matches!(sim.solver, FieldSolver::Fdtd(_)));
    assert!(sim.dt > 0.);
    assert_eq!(sim.prtls.len(), 2);
    assert_eq!(sim.prtls[0].len(), 1000);
    assert!(sim.prtls[0].optical_depth.is_some());
    assert!(sim.prtls[1].optical_depth.is_none());
    assert!(sim.prtls[1].bzt.iter().all(|&b| b == 1.0));
    assert!(sim.flds.field_energy(&sim.domain) > 0.);
}

#[test]
fn test_fdtd_run_keeps_gauss_law_and_energy() {
    for method in &["yee", "ckc"] {
        let mut sim = Sim::new(common::small_config(method)).unwrap();
        let kinetic = sim.kinetic_energy();
        assert!(kinetic > 0.);
        for _ in 0..4 {
            sim.step();
        }
        assert_eq!(sim.t, 4);
        // E stays transverse to the wave, and there is no charge
        assert_abs_diff_eq!(sim.gauss_residual(), 0., epsilon = 1e-12);
        if *method == "yee" {
            // the CKC transverse stencil reads the (unfilled) z halo
            assert_abs_diff_eq!(sim.max_div_b(), 0., epsilon = 1e-12);
        }
        // only a magnetic field acts on the particles
        assert_relative_eq!(sim.kinetic_energy(), kinetic, max_relative = 1e-8);
    }
}

#[test]
fn test_spectral_runs() {
    for method in &["psatd", "pstd"] {
        let mut sim = Sim::new(common::small_config(method)).unwrap();
        assert!(matches!(sim.solver, FieldSolver::Spectral(_)));
        let energy = sim.flds.field_energy(&sim.domain);
        for _ in 0..4 {
            sim.step();
        }
        assert!(sim.flds.e.y.data.iter().all(|v| v.is_finite()));
        assert!(sim.flds.e.y.max_abs() < 1.05e5);
        assert!(sim.flds.field_energy(&sim.domain) <= 1.1 * energy);
        assert!(sim.gauss_residual() < 1e-6);
    }
}

#[test]
fn test_bad_solver_settings() {
    let mut cfg = common::small_config("psatd");
    cfg.solver.stencil_order = vec![3, 2];
    assert!(Sim::new(cfg).is_err());

    let mut cfg = common::small_config("pstd");
    cfg.solver.stencil_order = vec![2, 2, 2];
    assert!(Sim::new(cfg).is_err());

    let mut cfg = common::small_config("yee");
    cfg.grid.dim = Dim::Rz;
    assert!(Sim::new(cfg).is_err());

    let mut cfg = common::small_config("yee");
    cfg.species[0].mass = 0.;
    assert!(Sim::new(cfg).is_err());
}

#[test]
fn test_zero_ghosts_rejected() {
    for method in &["yee", "ckc", "psatd"] {
        let mut cfg = common::small_config(method);
        cfg.grid.n_ghost = 0;
        let err = Sim::new(cfg).err().unwrap();
        assert!(matches!(err.downcast_ref::<ConfigError>(), Some(ConfigError::InvalidGrid(_))));
    }
    let mut cfg = common::small_config("yee");
    cfg.grid.n_ghost = 1;
    let mut sim = Sim::new(cfg).unwrap();
    sim.step();
    assert_eq!(sim.t, 1);
}

#[test]
fn test_explicit_time_step() {
    let mut cfg = common::small_config("psatd");
    cfg.solver.dt = Some(1e-15);
    cfg.solver.stencil_order = vec![16, -1];
    let sim = Sim::new(cfg).unwrap();
    assert_eq!(sim.dt, 1e-15);
}

#[test]
fn test_prtl_records_stride() {
    let mut prtl = Prtl::new("electrons", 10, -Q_E, M_E, 0., PusherKind::Vay).unwrap();
    prtl.ux[3] = 5.;
    let records = prtl_records(&prtl, 3);
    assert_eq!(records.len(), 4);
    assert_eq!(records[1].ux, 5.);
    assert_eq!(records[0].gamma, 1.);
    assert_eq!(records[0].optical_depth, 0.);
    assert_eq!(prtl_records(&prtl, 0).len(), 10);
}

#[test]
fn test_save_slice_writes_files() {
    let sim = Sim::new(common::small_config("yee")).unwrap();
    let dir = std::env::temp_dir().join(format!("pic_kernels_slice_{}", std::process::id()));
    std::fs::create_dir_all(dir.join("flds")).unwrap();
    let request = SliceRequest::whole_domain(&sim.domain);
    let slice = create_slice(&sim.flds.e.y, &sim.domain, &request).unwrap();
    save_slice(&slice, dir.to_str().unwrap()).unwrap();
    assert!(dir.join("flds/e_y_slice.npy").exists());
    assert!(dir.join("flds/e_y_slice_box.npy").exists());
    std::fs::remove_dir_all(&dir).unwrap();
}
