//! Data-parallel pass runner and the process-lifetime [`BlurProgram`].

use std::sync::OnceLock;

use rayon::prelude::*;
use smallvec::SmallVec;

use crate::foundation::core::RasterSize;
use crate::foundation::error::{BlurError, BlurResult};
use crate::foundation::math::f32_to_rgba8;
use crate::kernel::gaussian::ConvolutionKernel;
use crate::kernel::program::{
    BlurMapMode, FLOAT_SLOTS, PassParameters, PassSamplers, SAMPLER_SLOTS, sample_strength,
    shade_resolved,
};

static PROGRAM: OnceLock<BlurProgram> = OnceLock::new();

/// Options used the first time the program is built.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ProgramOpts {
    /// Worker threads; `None` lets rayon decide.
    pub threads: Option<usize>,
}

impl ProgramOpts {
    /// Return options with a fixed worker count.
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }
}

/// The "compiled" blur program: a dedicated worker pool plus the parameter slot layout.
///
/// Built once per process by [`precache_program`] and shared by every pipeline.
pub struct BlurProgram {
    pool: rayon::ThreadPool,
}

impl std::fmt::Debug for BlurProgram {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlurProgram")
            .field("threads", &self.threads())
            .finish()
    }
}

/// Build the process-lifetime [`BlurProgram`], or return the existing one.
///
/// Only the first successful call's options take effect.
pub fn precache_program(opts: ProgramOpts) -> BlurResult<&'static BlurProgram> {
    if let Some(p) = PROGRAM.get() {
        return Ok(p);
    }
    let pool = build_thread_pool(opts.threads)?;
    if PROGRAM.set(BlurProgram { pool }).is_err() {
        tracing::debug!("blur program built concurrently; keeping the first instance");
    }
    let program = PROGRAM
        .get()
        .ok_or_else(|| BlurError::render("blur program missing after initialization"))?;
    tracing::debug!(threads = program.threads(), "blur program precached");
    Ok(program)
}

fn build_thread_pool(threads: Option<usize>) -> BlurResult<rayon::ThreadPool> {
    if let Some(n) = threads
        && n == 0
    {
        return Err(BlurError::validation(
            "program 'threads' must be >= 1 when set",
        ));
    }

    let mut builder = rayon::ThreadPoolBuilder::new().thread_name(|i| format!("progblur-{i}"));
    if let Some(n) = threads {
        builder = builder.num_threads(n);
    }
    builder
        .build()
        .map_err(|e| BlurError::render(format!("failed to build rayon thread pool: {e}")))
}

impl BlurProgram {
    /// Worker threads in the pool.
    pub fn threads(&self) -> usize {
        self.pool.current_num_threads()
    }

    /// Sampler bindings in slot order.
    pub fn sampler_slots(&self) -> &'static [&'static str] {
        &SAMPLER_SLOTS
    }

    /// Float bindings and component counts in slot order.
    pub fn float_slots(&self) -> &'static [(&'static str, usize)] {
        &FLOAT_SLOTS
    }

    /// Evaluate one pass over the `output` grid into `dst` (tightly packed RGBA8).
    ///
    /// Returns once every row is written.
    pub fn run_pass(
        &self,
        samplers: &PassSamplers<'_>,
        params: &PassParameters,
        output: RasterSize,
        dst: &mut [u8],
    ) -> BlurResult<()> {
        if dst.len() != output.byte_len() {
            return Err(BlurError::render(format!(
                "pass target expects {} bytes for {}x{}, got {}",
                output.byte_len(),
                output.width,
                output.height,
                dst.len()
            )));
        }
        if samplers.child.size() != params.child_size {
            return Err(BlurError::render(format!(
                "child texture is {:?} but pass expects {:?}",
                samplers.child.size(),
                params.child_size
            )));
        }
        if params.is_final
            && params.map_mode == BlurMapMode::BlendWithBlurred
            && samplers.original.is_none()
        {
            return Err(BlurError::render(
                "final blend pass requires an original texture",
            ));
        }
        tracing::trace!(uniforms = ?params.uniforms().to_floats(), ?output, "run pass");

        // Blend mode uses one sigma for the whole pass.
        let constant = match params.map_mode {
            BlurMapMode::BlendWithBlurred => {
                Some(ConvolutionKernel::new(params.sigma, params.effective_side()))
            }
            BlurMapMode::ModulateSigma => None,
        };

        let (ow, oh) = (output.width as f32, output.height as f32);
        let row_bytes = output.width as usize * 4;
        self.pool.install(|| {
            dst.par_chunks_mut(row_bytes)
                .enumerate()
                .for_each(|(y, row)| {
                    let v = (y as f32 + 0.5) / oh;
                    let mut memo: Option<(u32, Option<ConvolutionKernel>)> = None;
                    for (x, px) in row.chunks_exact_mut(4).enumerate() {
                        let uv = [(x as f32 + 0.5) / ow, v];
                        let strength = sample_strength(uv, samplers, params);
                        let color = match &constant {
                            Some(kernel) => {
                                shade_resolved(uv, samplers, params, strength, kernel.as_ref())
                            }
                            None => {
                                let sigma = params.pixel_sigma(strength);
                                let key = sigma.to_bits();
                                if !matches!(&memo, Some((k, _)) if *k == key) {
                                    memo = Some((
                                        key,
                                        ConvolutionKernel::new(sigma, params.effective_side()),
                                    ));
                                }
                                let kernel = memo.as_ref().and_then(|(_, k)| k.as_ref());
                                shade_resolved(uv, samplers, params, strength, kernel)
                            }
                        };
                        px.copy_from_slice(&f32_to_rgba8(color));
                    }
                });
        });
        Ok(())
    }
}

impl BlurProgram {
    /// Area-weighted resample of `src` onto `dst_size`: every output pixel averages the source
    /// texels its footprint covers, weighted by overlap. Channels stay premultiplied.
    pub fn downscale_box(
        &self,
        src: &[u8],
        src_size: RasterSize,
        dst_size: RasterSize,
        dst: &mut [u8],
    ) -> BlurResult<()> {
        if src.len() != src_size.byte_len() || dst.len() != dst_size.byte_len() {
            return Err(BlurError::render(format!(
                "downscale expects {} -> {} bytes, got {} -> {}",
                src_size.byte_len(),
                dst_size.byte_len(),
                src.len(),
                dst.len()
            )));
        }
        let cols = box_footprints(src_size.width, dst_size.width);
        let rows = box_footprints(src_size.height, dst_size.height);
        let src_row = src_size.width as usize * 4;

        self.pool.install(|| {
            dst.par_chunks_mut(dst_size.width as usize * 4)
                .zip(rows.par_iter())
                .for_each(|(out, row_taps)| {
                    for (px, col_taps) in out.chunks_exact_mut(4).zip(&cols) {
                        let mut acc = [0.0f32; 4];
                        let mut total = 0.0f32;
                        for &(sy, wy) in row_taps {
                            for &(sx, wx) in col_taps {
                                let w = wx * wy;
                                let i = sy * src_row + sx * 4;
                                for c in 0..4 {
                                    acc[c] += f32::from(src[i + c]) * w;
                                }
                                total += w;
                            }
                        }
                        for c in 0..4 {
                            px[c] = (acc[c] / total).round().clamp(0.0, 255.0) as u8;
                        }
                    }
                });
        });
        Ok(())
    }
}

type Footprint = SmallVec<[(usize, f32); 8]>;

/// Source texels (and overlap) under each of `dst` cells spread evenly over `src` texels.
fn box_footprints(src: u32, dst: u32) -> Vec<Footprint> {
    let ratio = f64::from(src) / f64::from(dst);
    (0..dst)
        .map(|o| {
            let a = f64::from(o) * ratio;
            let b = f64::from(o + 1) * ratio;
            let first = a.floor() as u32;
            let last = (b.ceil() as u32).clamp(first + 1, src);
            let taps: Footprint = (first..last)
                .filter_map(|i| {
                    let w = b.min(f64::from(i) + 1.0) - a.max(f64::from(i));
                    (w > 0.0).then_some((i as usize, w as f32))
                })
                .collect();
            if taps.is_empty() {
                smallvec::smallvec![(first.min(src - 1) as usize, 1.0)]
            } else {
                taps
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/pass.rs"]
mod tests;
