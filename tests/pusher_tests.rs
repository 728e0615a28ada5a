use approx::{assert_abs_diff_eq, assert_relative_eq};
use pic_kernels::consts::{C, M_E, Q_E};
use pic_kernels::error::ConfigError;
use pic_kernels::prtls::pusher::{
    lorentz_factor, update_momentum_boris, update_momentum_vay, PusherKind,
};
use pic_kernels::prtls::qed::QuantumSynchrotronEngine;
use pic_kernels::prtls::Prtl;
use pic_kernels::Float;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn norm(u: [Float; 3]) -> Float {
    (u[0] * u[0] + u[1] * u[1] + u[2] * u[2]).sqrt()
}

#[test]
fn test_vay_conserves_momentum_in_magnetic_field() {
    for &u0 in &[1.0, 3.0 * C] {
        let (mut ux, mut uy, mut uz) = (u0, 0.2 * u0, -0.1 * u0);
        let start = norm([ux, uy, uz]);
        for _ in 0..1000 {
            let (e, b) = ([0.; 3], [0.3, -0.2, 1.0]);
            update_momentum_vay(
                &mut ux, &mut uy, &mut uz, e[0], e[1], e[2], b[0], b[1], b[2], 1., 1., 1e-3,
            );
        }
        assert_relative_eq!(norm([ux, uy, uz]), start, max_relative = 1e-10);
    }
}

#[test]
fn test_vay_gyration_sense() {
    // positive charge in +z field turns from +x towards -y
    let (mut ux, mut uy, mut uz) = (1.0, 0.0, 0.0);
    update_momentum_vay(&mut ux, &mut uy, &mut uz, 0., 0., 0., 0., 0., 1., 1., 1., 1e-3);
    assert_relative_eq!(uy, -1e-3, max_relative = 1e-5);
    assert_relative_eq!(ux * ux + uy * uy, 1.0, max_relative = 1e-12);
    assert!(ux < 1.0 && ux > 0.999);
    assert_eq!(uz, 0.);
}

#[test]
fn test_electric_kick_from_rest() {
    let (q, m, dt) = (Q_E, M_E, 1e-15);
    let e = [1e3, -2e3, 5e2];
    for update in &[PusherKind::Vay.update_fn(), PusherKind::Boris.update_fn()] {
        let (mut ux, mut uy, mut uz) = (0.0, 0.0, 0.0);
        update(&mut ux, &mut uy, &mut uz, e[0], e[1], e[2], 0., 0., 0., q, m, dt);
        assert_relative_eq!(ux, q * e[0] * dt / m, max_relative = 1e-12);
        assert_relative_eq!(uy, q * e[1] * dt / m, max_relative = 1e-12);
        assert_relative_eq!(uz, q * e[2] * dt / m, max_relative = 1e-12);
    }
}

#[test]
fn test_boris_conserves_momentum_in_magnetic_field() {
    let (mut ux, mut uy, mut uz) = (0.5 * C, 0.1 * C, 0.0);
    let start = norm([ux, uy, uz]);
    for _ in 0..1000 {
        update_momentum_boris(&mut ux, &mut uy, &mut uz, 0., 0., 0., 0., 0.5, 1.0, 1., 1., 1e-3);
    }
    assert_relative_eq!(norm([ux, uy, uz]), start, max_relative = 1e-10);
}

#[test]
fn test_vay_keeps_e_cross_b_drift() {
    // at the drift velocity E + v x B vanishes and the momentum is steady
    let bz = 1.0;
    let ey = 0.1 * C * bz;
    let v = ey / bz;
    let u_drift = v / (1. - (v / C) * (v / C)).sqrt();
    let (mut ux, mut uy, mut uz) = (u_drift, 0.0, 0.0);
    for _ in 0..100 {
        update_momentum_vay(&mut ux, &mut uy, &mut uz, 0., ey, 0., 0., 0., bz, 1., 1., 1e-3);
    }
    assert_relative_eq!(ux, u_drift, max_relative = 1e-9);
    assert_abs_diff_eq!(uy, 0., epsilon = 1e-9 * u_drift);
    assert_eq!(uz, 0.);
}

#[test]
fn test_push_momenta_matches_scalar_update() {
    let mut rng = StdRng::seed_from_u64(3);
    let mut prtl = Prtl::new("electrons", 5000, -Q_E, M_E, 0.1, PusherKind::Vay).unwrap();
    prtl.initialize_velocities(&mut rng, 1.0);
    prtl.set_uniform_fields([1e9, 0., -3e8], [0.2, 0.5, 1.0]);
    let before: Vec<[Float; 3]> = (0..prtl.len())
        .map(|n| [prtl.ux[n], prtl.uy[n], prtl.uz[n]])
        .collect();

    let dt = 1e-13;
    prtl.push_momenta(dt);

    for (n, u) in before.iter().enumerate() {
        let (mut ux, mut uy, mut uz) = (u[0], u[1], u[2]);
        update_momentum_vay(&mut ux, &mut uy, &mut uz, 1e9, 0., -3e8, 0.2, 0.5, 1.0, -Q_E, M_E, dt);
        assert_relative_eq!(prtl.ux[n], ux, max_relative = 1e-14);
        assert_relative_eq!(prtl.uy[n], uy, max_relative = 1e-14);
        assert_relative_eq!(prtl.uz[n], uz, max_relative = 1e-14);
        assert_relative_eq!(prtl.psa[n], lorentz_factor(ux, uy, uz), max_relative = 1e-14);
    }
}

#[test]
fn test_species_validation() {
    assert!(matches!(
        Prtl::new("bad", 10, Q_E, 0., 0., PusherKind::Vay),
        Err(ConfigError::InvalidSpecies { .. })
    ));
    assert!(matches!(
        Prtl::new("bad", 10, Q_E, M_E, -0.1, PusherKind::Boris),
        Err(ConfigError::InvalidSpecies { .. })
    ));
    let prtl = Prtl::new("ok", 0, Q_E, M_E, 0., PusherKind::Boris).unwrap();
    assert!(prtl.is_empty());
}

#[test]
fn test_drifting_cold_species() {
    let mut rng = StdRng::seed_from_u64(11);
    let mut prtl = Prtl::new("beam", 100, Q_E, M_E, 0., PusherKind::Vay).unwrap();
    let gamma: Float = 2.0;
    prtl.initialize_velocities(&mut rng, gamma);
    let gamma_beta = (gamma * gamma - 1.).sqrt();
    for n in 0..prtl.len() {
        assert_relative_eq!(prtl.ux[n], gamma_beta * C, max_relative = 1e-12);
        assert_relative_eq!(prtl.psa[n], gamma, max_relative = 1e-12);
        assert_eq!(prtl.uy[n], 0.);
    }
    let expected = 100. * (gamma - 1.) * M_E * C * C;
    assert_relative_eq!(prtl.kinetic_energy(), expected, max_relative = 1e-10);
}

#[test]
fn test_thermal_spread() {
    let mut rng = StdRng::seed_from_u64(5);
    let vth = 0.01;
    let mut prtl = Prtl::new("ions", 50_000, Q_E, M_E, vth, PusherKind::Boris).unwrap();
    prtl.initialize_velocities(&mut rng, 1.0);
    let n = prtl.len() as Float;
    let mean = prtl.uz.iter().sum::<Float>() / n;
    let var = prtl.uz.iter().map(|u| (u - mean) * (u - mean)).sum::<Float>() / n;
    assert_abs_diff_eq!(mean / C, 0., epsilon = 5e-4);
    assert_relative_eq!(var.sqrt() / C, vth, max_relative = 0.02);
}

#[test]
fn test_optical_depths_are_unit_exponential() {
    let mut rng = StdRng::seed_from_u64(42);
    let engine = QuantumSynchrotronEngine::new();
    let mut prtl = Prtl::new("electrons", 20_000, -Q_E, M_E, 0., PusherKind::Vay).unwrap();
    assert!(prtl.optical_depth.is_none());
    prtl.init_optical_depth(&engine.build_optical_depth_functor(), &mut rng);

    let tau = prtl.optical_depth.as_ref().unwrap();
    assert_eq!(tau.len(), prtl.len());
    assert!(tau.iter().all(|&t| t > 0. && t.is_finite()));
    let mean = tau.iter().sum::<Float>() / tau.len() as Float;
    assert_abs_diff_eq!(mean, 1.0, epsilon = 0.05);
}
