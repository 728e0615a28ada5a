#![allow(dead_code)]
use pic_kernels::flds::field::GridField;
use pic_kernels::flds::{Dim, Domain};
use pic_kernels::{Config, Float};

// Small grids with unit cells so stencil values are easy to check by hand.

pub fn domain_3d(n: usize) -> Domain {
    let l = n as Float;
    Domain::new(Dim::ThreeD, [n; 3], [0.; 3], [l; 3]).unwrap()
}

pub fn domain_xz(nx: usize, nz: usize) -> Domain {
    Domain::new(
        Dim::Xz,
        [nx, 1, nz],
        [0.; 3],
        [nx as Float, 1., nz as Float],
    )
    .unwrap()
}

pub fn domain_rz(nr: usize, nz: usize, rmin: Float) -> Domain {
    Domain::new(
        Dim::Rz,
        [nr, 1, nz],
        [rmin, 0., 0.],
        [rmin + nr as Float, 1., nz as Float],
    )
    .unwrap()
}

/// Deterministic values with no particular structure.
pub fn scramble(fld: &mut GridField, seed: Float) {
    fld.par_fill_valid(|c| {
        let x = c[0] as Float * 0.731 + c[1] as Float * 1.173 + c[2] as Float * 0.419 + seed;
        (x * 12.9898).sin() * 0.5 + (x * 3.1).cos() * 0.25
    });
}

pub fn small_config(method: &str) -> Config {
    let toml = format!(
        r#"
[grid]
dim = "xz"
n_cell = [16, 1, 16]
prob_lo = [0.0, 0.0, 0.0]
prob_hi = [1.6e-5, 1.0e-6, 1.6e-5]
n_ghost = 2

[solver]
method = "{}"
cfl = 0.9

[[species]]
name = "electrons"
charge = -1.602176634e-19
mass = 9.1093837015e-31
num = 1000
vth = 0.01
qed = true

[[species]]
name = "positrons"
charge = 1.602176634e-19
mass = 9.1093837015e-31
num = 500
pusher = "boris"

[external]
b = [0.0, 0.0, 1.0]

[init]
wave_amplitude = 1.0e5
wave_mode = 1

[setup]
t_final = 4
seed = 7

[output]
write_output = false
output_interval = 2
stride = 10
"#,
        method
    );
    Config::from_toml(&toml).unwrap()
}
