mod common;

use approx::{assert_abs_diff_eq, assert_relative_eq};
use pic_kernels::consts::C;
use pic_kernels::error::ConfigError;
use pic_kernels::flds::fdtd::{self, courant_dt, CkcCoefficients, FdtdScheme, FdtdSolver};
use pic_kernels::flds::field::{GridField, IndexType};
use pic_kernels::flds::ghosts::update_ghosts;
use pic_kernels::flds::{Dim, Flds, VectorField};
use pic_kernels::Float;

#[test]
fn test_field_init() {
    let domain = common::domain_3d(6);
    let flds = Flds::new(&domain, 2, false);
    // Yee staggering: E_x is cell centered along x only
    assert_eq!(flds.e.x.len(), [6, 7, 7]);
    assert_eq!(flds.b.x.len(), [7, 6, 6]);
    assert_eq!(flds.div_e.len(), [7, 7, 7]);
    assert_eq!(flds.div_b.len(), [6, 6, 6]);
    assert_eq!(flds.e.x.data.len(), 10 * 11 * 11);
    for fld in flds.e.components().iter().chain(flds.b.components().iter()) {
        assert!(fld.data.iter().all(|&v| v == 0.));
    }
}

#[test]
fn test_planar_fields_have_flat_y() {
    let domain = common::domain_xz(8, 4);
    let flds = Flds::new(&domain, 2, false);
    assert_eq!(flds.e.y.len(), [9, 1, 5]);
    assert_eq!(flds.e.y.dim.n_ghost, [2, 0, 2]);
    assert_eq!(flds.b.y.len(), [8, 1, 4]);
}

#[test]
fn test_ghosts_wrap_periodically() {
    let domain = common::domain_xz(4, 4);
    let mut fld = GridField::new("f", &domain, IndexType::CELL, 1);
    fld.par_fill_valid(|c| (10 * c[2] + c[0]) as Float);
    update_ghosts(&mut fld);
    assert_eq!(fld.get(-1, 0, 0), 3.);
    assert_eq!(fld.get(4, 0, 2), 20.);
    assert_eq!(fld.get(-1, 0, -1), 33.);

    // the upper nodal point is the image of the lower one
    let mut nodal = GridField::new("n", &domain, IndexType::NODAL, 1);
    nodal.par_fill_valid(|c| (10 * c[2] + c[0]) as Float);
    update_ghosts(&mut nodal);
    assert_eq!(nodal.get(4, 0, 1), 10.);
    assert_eq!(nodal.get(-1, 0, 1), 13.);
}

#[test]
fn test_ckc_cubic_cells() {
    let dtsd = 0.5;
    let k = CkcCoefficients::compute(Dim::ThreeD, [dtsd; 3]).unwrap();
    assert_relative_eq!(k.alphax / dtsd, 7. / 12., max_relative = 1e-12);
    assert_relative_eq!(k.betaxy / dtsd, 1. / 12., max_relative = 1e-12);
    assert_relative_eq!(k.gammaz / dtsd, 1. / 48., max_relative = 1e-12);
}

#[test]
fn test_ckc_identity() {
    for &(dx, dy, dz) in &[(0.3, 0.4, 0.5), (0.9, 0.1, 0.2), (0.57, 0.57, 0.2)] {
        let k = CkcCoefficients::compute(Dim::ThreeD, [dx, dy, dz]).unwrap();
        let sx = k.alphax + 2. * k.betaxy + 2. * k.betaxz + 4. * k.gammax;
        let sy = k.alphay + 2. * k.betayx + 2. * k.betayz + 4. * k.gammay;
        let sz = k.alphaz + 2. * k.betazx + 2. * k.betazy + 4. * k.gammaz;
        assert_relative_eq!(sx / dx, 1., max_relative = 1e-12);
        assert_relative_eq!(sy / dy, 1., max_relative = 1e-12);
        assert_relative_eq!(sz / dz, 1., max_relative = 1e-12);
    }

    let k = CkcCoefficients::compute(Dim::Xz, [0.4, 0.0, 0.7]).unwrap();
    assert_relative_eq!((k.alphax + 2. * k.betaxz) / 0.4, 1., max_relative = 1e-12);
    assert_relative_eq!((k.alphaz + 2. * k.betazx) / 0.7, 1., max_relative = 1e-12);
    assert_eq!(k.betaxy, 0.);
    assert_eq!(k.gammax, 0.);
}

#[test]
fn test_ckc_rejects_bad_input() {
    match CkcCoefficients::compute(Dim::ThreeD, [0.5, -0.1, 0.5]) {
        Err(ConfigError::InvalidTimeStep(_)) => {}
        other => panic!("expected InvalidTimeStep, got {:?}", other),
    }
    match CkcCoefficients::compute(Dim::Rz, [0.5, 0.0, 0.5]) {
        Err(ConfigError::UnsupportedGeometry { .. }) => {}
        other => panic!("expected UnsupportedGeometry, got {:?}", other),
    }
    // y is not resolved in xz, so its ratio is not checked
    assert!(CkcCoefficients::compute(Dim::Xz, [0.5, 0.0, 0.5]).is_ok());
}

#[test]
fn test_fdtd_solver_rejects_rz() {
    let domain = common::domain_rz(4, 4, 0.);
    assert!(matches!(
        FdtdSolver::new(&domain, FdtdScheme::Yee, 1e-10),
        Err(ConfigError::UnsupportedGeometry { .. })
    ));
}

#[test]
fn test_fdtd_solver_keeps_half_step_ckc() {
    let domain = common::domain_xz(8, 8);
    let dt = 0.9 * courant_dt(&domain, FdtdScheme::Ckc);
    let inv = domain.inv_dx();
    let solver = FdtdSolver::new(&domain, FdtdScheme::Ckc, dt).unwrap();
    let half = [0.5 * dt * inv[0], 0.5 * dt * inv[1], 0.5 * dt * inv[2]];
    assert_eq!(solver.dt(), dt);
    assert_eq!(solver.ckc(), Some(&CkcCoefficients::compute(Dim::Xz, half).unwrap()));

    let yee = FdtdSolver::new(&domain, FdtdScheme::Yee, dt).unwrap();
    assert!(yee.ckc().is_none());
}

#[test]
fn test_fdtd_solver_rejects_bad_dt() {
    let domain = common::domain_3d(4);
    for &scheme in &[FdtdScheme::Yee, FdtdScheme::Ckc] {
        for &dt in &[0., -1e-9, Float::NAN, Float::INFINITY] {
            assert!(matches!(
                FdtdSolver::new(&domain, scheme, dt),
                Err(ConfigError::InvalidTimeStep(_))
            ));
        }
    }
}

#[test]
fn test_courant_dt() {
    let domain = common::domain_3d(4);
    let yee = 1. / (C * (3.0 as Float).sqrt());
    assert_relative_eq!(courant_dt(&domain, FdtdScheme::Yee), yee, max_relative = 1e-12);
    assert_relative_eq!(courant_dt(&domain, FdtdScheme::Ckc), 1. / C, max_relative = 1e-12);
}

#[test]
fn test_uniform_fields_do_not_change() {
    let domain = common::domain_3d(6);
    let dt = 0.9 * courant_dt(&domain, FdtdScheme::Ckc);
    for &scheme in &[FdtdScheme::Yee, FdtdScheme::Ckc] {
        let solver = FdtdSolver::new(&domain, scheme, dt).unwrap();
        let mut flds = Flds::new(&domain, 1, false);
        flds.e.fill([1.0, -2.0, 3.0]);
        flds.b.fill([0.5, 0.25, -0.75]);
        solver.evolve_b(&mut flds.b, &flds.e);
        solver.evolve_e(&mut flds.e, &flds.b, &flds.j);
        for c in flds.b.x.valid_cells() {
            assert_abs_diff_eq!(flds.b.x.at(c), 0.5, epsilon = 1e-12);
            assert_abs_diff_eq!(flds.b.y.at(c), 0.25, epsilon = 1e-12);
            assert_abs_diff_eq!(flds.b.z.at(c), -0.75, epsilon = 1e-12);
        }
        for c in flds.e.y.valid_cells() {
            assert_abs_diff_eq!(flds.e.y.at(c), -2.0, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_current_drives_e() {
    let domain = common::domain_xz(4, 4);
    let dt = 1e-9;
    let solver = FdtdSolver::new(&domain, FdtdScheme::Yee, dt).unwrap();
    let mut flds = Flds::new(&domain, 1, false);
    flds.j.fill([0.0, 2.0, 0.0]);
    solver.evolve_e(&mut flds.e, &flds.b, &flds.j);
    let expected = -dt * 2.0 / pic_kernels::consts::EP0;
    for c in flds.e.y.valid_cells() {
        assert_relative_eq!(flds.e.y.at(c), expected, max_relative = 1e-12);
    }
}

#[test]
fn test_yee_push_preserves_div_b() {
    let domain = common::domain_3d(6);
    // large step so B comes out of order one
    let dt = 1.0;
    let solver = FdtdSolver::new(&domain, FdtdScheme::Yee, dt).unwrap();
    let mut flds = Flds::new(&domain, 1, false);
    common::scramble(&mut flds.e.x, 0.1);
    common::scramble(&mut flds.e.y, 2.3);
    common::scramble(&mut flds.e.z, 4.7);

    solver.evolve_b(&mut flds.b, &flds.e);
    solver.compute_div_b(&flds.b, &mut flds.div_b);

    let b_max = flds.b.x.max_abs().max(flds.b.y.max_abs()).max(flds.b.z.max_abs());
    assert!(b_max > 0.01);
    assert!(flds.div_b.max_abs() < 1e-12 * b_max);
}

#[test]
fn test_div_e_of_linear_field() {
    let domain = common::domain_3d(5);
    let g = domain.cell_geometry();
    let mut e = VectorField::new_edge("e", &domain, 1, false);
    // E_x sits at x = i + 1/2
    e.x.par_fill_valid(|c| 3.0 * (c[0] as Float + 0.5));
    e.z.par_fill_valid(|c| -1.0 * (c[2] as Float + 0.5));
    let mut div_e = GridField::new("div_e", &domain, IndexType::NODAL, 1);
    fdtd::div_e_field(&e, &mut div_e, &g);
    // the lowest and highest nodes read ghosts
    for c in div_e.valid_cells().filter(|c| c.iter().all(|&i| i > 0 && i < 5)) {
        assert_abs_diff_eq!(div_e.at(c), 2.0, epsilon = 1e-12);
    }
}

#[test]
fn test_rz_div_e_of_linear_radial_field() {
    for &rmin in &[0.0, 2.0] {
        let domain = common::domain_rz(8, 4, rmin);
        let g = domain.cell_geometry();
        let a = 1.5;
        let mut e = VectorField::new_edge("e", &domain, 1, false);
        // E_r = a r, sampled at r = rmin + i + 1/2
        e.x.par_fill_valid(|c| a * (rmin + c[0] as Float + 0.5));
        let mut div_e = GridField::new("div_e", &domain, IndexType::NODAL, 1);
        fdtd::div_e_field(&e, &mut div_e, &g);
        for c in div_e.valid_cells().filter(|c| c[0] < 8) {
            if rmin > 0. && c[0] == 0 {
                // reads the ghost below the domain
                continue;
            }
            assert_abs_diff_eq!(div_e.at(c), 2. * a, epsilon = 1e-12);
        }
    }
}

#[test]
fn test_rz_on_axis_div_e() {
    let domain = common::domain_rz(4, 4, 0.);
    let g = domain.cell_geometry();
    let mut e = VectorField::new_edge("e", &domain, 1, false);
    e.x.fill(0.25);
    e.z.par_fill_valid(|c| c[2] as Float);
    // on the axis: 4 E_r(0)/dr + dE_z/dz
    let v = fdtd::compute_div_e([0, 0, 2], &e.x, &e.y, &e.z, &g);
    assert_abs_diff_eq!(v, 4. * 0.25 + 1., epsilon = 1e-12);
}

#[test]
fn test_rz_div_e_is_finite_on_axis() {
    let domain = common::domain_rz(6, 6, 0.);
    let mut e = VectorField::new_edge("e", &domain, 1, false);
    common::scramble(&mut e.x, 0.5);
    common::scramble(&mut e.z, 1.5);
    let mut div_e = GridField::new("div_e", &domain, IndexType::NODAL, 1);
    fdtd::div_e_field(&e, &mut div_e, &domain.cell_geometry());
    assert!(div_e.data.iter().all(|v| v.is_finite()));
}

#[test]
fn test_rz_div_b_of_linear_radial_field() {
    let domain = common::domain_rz(6, 3, 0.);
    let g = domain.cell_geometry();
    let a = -0.75;
    let mut b = VectorField::new_face("b", &domain, 1, false);
    // B_r is nodal along r
    b.x.par_fill_valid(|c| a * c[0] as Float);
    let mut div_b = GridField::new("div_b", &domain, IndexType::CELL, 1);
    fdtd::div_b_field(&b, &mut div_b, &g);
    for c in div_b.valid_cells() {
        assert_abs_diff_eq!(div_b.at(c), 2. * a, epsilon = 1e-12);
    }
}

#[test]
fn test_xz_div_b_skips_y() {
    let domain = common::domain_xz(4, 4);
    let g = domain.cell_geometry();
    let mut b = VectorField::new_face("b", &domain, 1, false);
    b.y.fill(100.);
    b.x.par_fill_valid(|c| c[0] as Float);
    let mut div_b = GridField::new("div_b", &domain, IndexType::CELL, 1);
    fdtd::div_b_field(&b, &mut div_b, &g);
    for c in div_b.valid_cells() {
        assert_abs_diff_eq!(div_b.at(c), 1., epsilon = 1e-12);
    }
}

#[test]
fn test_field_energy() {
    let domain = common::domain_xz(4, 4);
    let mut flds = Flds::new(&domain, 1, false);
    flds.b.z.fill(2.0);
    let n = (flds.b.z.len()[0] * flds.b.z.len()[2]) as Float;
    let expected = n * 0.5 * 4.0 / pic_kernels::consts::MU0;
    assert_relative_eq!(flds.field_energy(&domain), expected, max_relative = 1e-12);
}
