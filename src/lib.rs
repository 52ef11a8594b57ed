//! Progressive (spatially varying) Gaussian blur.
//!
//! A strength map, usually rasterized from a declarative [`GradientBlurSpec`], controls how
//! strongly each pixel of a captured frame is blurred. Frames run through two separable passes:
//!
//! - Describe the ramp with [`EdgeBlur`] or [`GradientBlurSpec::new`]
//! - Configure sigma, tint and map mode with [`BlurConfig`]
//! - Create a [`ProgressiveBlur`] and call [`ProgressiveBlur::render_frame`] with a [`FrameSource`]
//!
//! The per-pixel program ([`shade_pixel`]) is a pure function; [`PassUniforms`] is its numeric
//! parameter contract for hosts that run it elsewhere.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod config;
mod foundation;
mod gradient;
mod kernel;
mod render;

pub use crate::config::{
    BlurConfig, BlurDocument, DEFAULT_BLUR_TEXTURE_DIMENSIONS, DEFAULT_MAP_EXPONENT,
    DEFAULT_SIGMA, StrengthSpec,
};
pub use crate::foundation::core::{Axis, MAX_RASTER_EDGE, Point, RasterSize, TintColor};
pub use crate::foundation::error::{BlurError, BlurResult};

pub use crate::gradient::curve::Curve;
pub use crate::gradient::spec::{
    BlurEdge, EdgeBlur, GradientBlurSpec, MAX_EDGE_SAMPLES, MIN_EDGE_SAMPLES,
};
pub use crate::gradient::strength_map::{STRENGTH_CHANNEL, StrengthTexture, generate_strength_map};

pub use crate::kernel::gaussian::{
    BlurAxisSide, ConvolutionKernel, MAX_KERNEL_RADIUS, MAX_KERNEL_TAPS, MIN_SIGMA, Tap,
    kernel_radius,
};
pub use crate::kernel::pass::{BlurProgram, ProgramOpts, precache_program};
pub use crate::kernel::program::{
    BlurMapMode, FLOAT_SLOTS, MIN_MAP_EXPONENT, OriginalSampling, PassParameters, PassSamplers,
    PassUniforms, SAMPLER_SLOTS, TextureView, UNIFORM_FLOATS, sample_strength, shade_pixel,
};

pub use crate::render::frame::FrameRGBA;
pub use crate::render::orchestrator::{PipelineStats, ProgressiveBlur, StrengthSource};
pub use crate::render::pipeline::{CapturedFrame, CompositedFrame, FrameStage, HorizontalPassed};
pub use crate::render::source::{CaptureFn, FrameSource, ImageSource, SceneRect, SceneSource};
