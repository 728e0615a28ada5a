use crate::{
    prtls::Prtl,
    slice::{create_slice, Slice, SliceRequest},
    Float, Sim,
};
use anyhow::{Context, Result};
use npy_derive::Serializable;
use tracing::debug;

/// One particle as written to `<species>.npy`.
#[derive(Serializable, Debug, Clone, Copy, PartialEq)]
pub struct PrtlRecord {
    pub ux: Float,
    pub uy: Float,
    pub uz: Float,
    pub gamma: Float,
    pub optical_depth: Float,
}

/// Every `stride`-th particle of `prtl`. Species without optical depths
/// record 0.
pub fn prtl_records(prtl: &Prtl, stride: usize) -> Vec<PrtlRecord> {
    let stride = stride.max(1);
    (0..prtl.len())
        .step_by(stride)
        .map(|n| PrtlRecord {
            ux: prtl.ux[n],
            uy: prtl.uy[n],
            uz: prtl.uz[n],
            gamma: prtl.psa[n],
            optical_depth: prtl.optical_depth.as_ref().map_or(0.0, |tau| tau[n]),
        })
        .collect()
}

pub fn save_slice(slice: &Slice, outdir: &str) -> Result<()> {
    let name = &slice.field.name;
    npy::to_file(format!("{}/flds/{}.npy", outdir, name), slice.field.valid_to_vec())
        .context(format!("Could not save {} data to file", name))?;
    let bounds: Vec<Float> = slice.prob_lo.iter().chain(slice.prob_hi.iter()).copied().collect();
    npy::to_file(format!("{}/flds/{}_box.npy", outdir, name), bounds)
        .context(format!("Could not save the box of {}", name))?;
    Ok(())
}

/// Write the E and B slices and a strided particle sample to
/// `output/dat_<n>`.
pub fn save_output(n: u32, sim: &Sim) -> Result<()> {
    let cfg = &sim.config;
    let output_prefix = format!("output/dat_{:05}", n);
    std::fs::create_dir_all(&format!("{}/flds", &output_prefix))
        .context("Unable to create output directory")?;

    let request = cfg
        .output
        .slice
        .clone()
        .unwrap_or_else(|| SliceRequest::whole_domain(&sim.domain));
    let flds = &sim.flds;
    for fld in flds.e.components().iter().chain(flds.b.components().iter()) {
        let slice = create_slice(fld, &sim.domain, &request)
            .with_context(|| format!("Could not slice {}", fld.name))?;
        save_slice(&slice, &output_prefix)?;
    }

    for prtl in &sim.prtls {
        let records = prtl_records(prtl, cfg.output.stride);
        npy::to_file(format!("{}/{}.npy", output_prefix, prtl.name), records)
            .context(format!("Could not save {} prtl data", prtl.name))?;
    }
    debug!(dir = %output_prefix, "output written");
    Ok(())
}
