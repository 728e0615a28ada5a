use crate::Float;
use num_traits::Zero;
use rustfft::num_complex::Complex;
use rustfft::{Fft, FftPlanner};
use std::sync::Arc;

/// Complex FFT over an `nx * ny * nz` block stored x fastest.
///
/// Lines along x are contiguous and transformed in place in one call.
/// Lines along y and z are gathered into `line`, transformed, and
/// scattered back. Axes of length one are skipped.
pub struct Fft3D {
    n: [usize; 3],
    fft: [Arc<dyn Fft<Float>>; 3],
    ifft: [Arc<dyn Fft<Float>>; 3],
    line: Vec<Complex<Float>>,
    scratch: Vec<Complex<Float>>,
}

impl Fft3D {
    pub fn new(n: [usize; 3]) -> Fft3D {
        let mut planner = FftPlanner::new();
        let fft = [
            planner.plan_fft_forward(n[0]),
            planner.plan_fft_forward(n[1]),
            planner.plan_fft_forward(n[2]),
        ];
        let ifft = [
            planner.plan_fft_inverse(n[0]),
            planner.plan_fft_inverse(n[1]),
            planner.plan_fft_inverse(n[2]),
        ];
        let scratch_len = fft
            .iter()
            .chain(ifft.iter())
            .map(|p| p.get_inplace_scratch_len())
            .max()
            .unwrap_or(0);
        Fft3D {
            n,
            fft,
            ifft,
            line: vec![Complex::zero(); n[0].max(n[1]).max(n[2])],
            scratch: vec![Complex::zero(); scratch_len],
        }
    }

    pub fn len(&self) -> usize {
        self.n[0] * self.n[1] * self.n[2]
    }

    pub fn forward(&mut self, data: &mut [Complex<Float>]) {
        for axis in 0..3 {
            let plan = self.fft[axis].clone();
            self.process_axis(plan.as_ref(), axis, data);
        }
    }

    /// Inverse transform, normalized so that `inverse(forward(x)) == x`.
    pub fn inverse(&mut self, data: &mut [Complex<Float>]) {
        for axis in 0..3 {
            let plan = self.ifft[axis].clone();
            self.process_axis(plan.as_ref(), axis, data);
        }
        let norm = 1.0 / (self.len() as Float);
        for v in data.iter_mut() {
            *v *= norm;
        }
    }

    fn process_axis(&mut self, plan: &dyn Fft<Float>, axis: usize, data: &mut [Complex<Float>]) {
        let [nx, ny, nz] = self.n;
        if !cfg!(feature = "unchecked") {
            assert_eq!(data.len(), nx * ny * nz);
        }
        if self.n[axis] == 1 {
            return;
        }
        match axis {
            0 => plan.process_with_scratch(data, &mut self.scratch),
            1 => {
                for k in 0..nz {
                    for i in 0..nx {
                        let start = k * ny * nx + i;
                        self.strided_line(plan, data, start, nx, ny);
                    }
                }
            }
            _ => {
                for j in 0..ny {
                    for i in 0..nx {
                        let start = j * nx + i;
                        self.strided_line(plan, data, start, nx * ny, nz);
                    }
                }
            }
        }
    }

    #[inline(always)]
    fn strided_line(
        &mut self,
        plan: &dyn Fft<Float>,
        data: &mut [Complex<Float>],
        start: usize,
        stride: usize,
        len: usize,
    ) {
        let line = &mut self.line[..len];
        for (m, v) in line.iter_mut().enumerate() {
            *v = data[start + m * stride];
        }
        plan.process_with_scratch(line, &mut self.scratch);
        for (m, v) in line.iter().enumerate() {
            data[start + m * stride] = *v;
        }
    }
}
