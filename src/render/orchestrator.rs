//! Frame orchestration: strength-texture cache plus the two-pass sequence.

use std::sync::Arc;

use crate::config::BlurConfig;
use crate::foundation::core::RasterSize;
use crate::foundation::error::{BlurError, BlurResult};
use crate::gradient::spec::GradientBlurSpec;
use crate::gradient::strength_map::{StrengthTexture, generate_strength_map};
use crate::kernel::pass::{BlurProgram, ProgramOpts, precache_program};
use crate::render::frame::FrameRGBA;
use crate::render::pipeline::{CapturedFrame, FrameStage};
use crate::render::source::FrameSource;

/// Where per-pixel strength comes from. Exactly one source is active.
#[derive(Clone, Debug, PartialEq)]
pub enum StrengthSource {
    /// Rasterized on demand at `blur_texture_dimensions` and cached.
    Gradient(GradientBlurSpec),
    /// Caller-owned texture; shared, never regenerated or released here.
    Texture(Arc<StrengthTexture>),
}

impl From<GradientBlurSpec> for StrengthSource {
    fn from(spec: GradientBlurSpec) -> Self {
        Self::Gradient(spec)
    }
}

impl From<StrengthTexture> for StrengthSource {
    fn from(texture: StrengthTexture) -> Self {
        Self::Texture(Arc::new(texture))
    }
}

/// Rendering counters.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Frames that reached `Composited`.
    pub frames_rendered: u64,
    /// Frames abandoned by an error.
    pub frames_failed: u64,
    /// Times a strength texture was rasterized from a spec.
    pub strength_regenerations: u64,
}

#[derive(Debug)]
struct CachedStrength {
    spec: GradientBlurSpec,
    size: RasterSize,
    texture: StrengthTexture,
}

/// Applies a progressive blur to frames captured from a [`FrameSource`].
///
/// Owns the derived strength texture (memoized on spec and dimensions) and drives
/// `Idle -> CaptureSource -> PassHorizontal -> PassVertical -> Composited` once per frame.
#[derive(Debug)]
pub struct ProgressiveBlur {
    config: BlurConfig,
    strength: StrengthSource,
    cache: Option<CachedStrength>,
    program: &'static BlurProgram,
    stage: FrameStage,
    stats: PipelineStats,
}

impl ProgressiveBlur {
    /// Validate `config` and bind the process-wide program (built on first use).
    pub fn new(config: BlurConfig, strength: impl Into<StrengthSource>) -> BlurResult<Self> {
        let program = precache_program(ProgramOpts::default())?;
        Self::with_program(config, strength, program)
    }

    /// Like [`ProgressiveBlur::new`] with an explicit program.
    pub fn with_program(
        config: BlurConfig,
        strength: impl Into<StrengthSource>,
        program: &'static BlurProgram,
    ) -> BlurResult<Self> {
        config.validate()?;
        Ok(Self {
            config,
            strength: strength.into(),
            cache: None,
            program,
            stage: FrameStage::Idle,
            stats: PipelineStats::default(),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &BlurConfig {
        &self.config
    }

    /// Replace the configuration. A new `blur_texture_dimensions` regenerates on the next frame.
    pub fn set_config(&mut self, config: BlurConfig) -> BlurResult<()> {
        config.validate()?;
        self.config = config;
        Ok(())
    }

    /// Active strength source.
    pub fn strength_source(&self) -> &StrengthSource {
        &self.strength
    }

    /// Replace the strength source. An equal spec keeps the cached texture.
    pub fn set_strength(&mut self, strength: impl Into<StrengthSource>) {
        self.strength = strength.into();
        if matches!(self.strength, StrengthSource::Texture(_)) {
            self.release_cache();
        }
    }

    /// Shorthand for `set_strength(StrengthSource::Gradient(spec))`.
    pub fn set_spec(&mut self, spec: GradientBlurSpec) {
        self.set_strength(StrengthSource::Gradient(spec));
    }

    /// Stage reached by the last frame; `Idle` after a failed frame or teardown.
    pub fn last_stage(&self) -> FrameStage {
        self.stage
    }

    /// Counters since construction.
    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// The strength texture the next frame will use, rasterizing it if needed.
    pub fn strength_texture(&mut self) -> BlurResult<&StrengthTexture> {
        self.ensure_strength()?;
        self.active_strength()
    }

    /// Release the owned strength texture. Caller-supplied textures are left alone.
    pub fn teardown(&mut self) {
        self.release_cache();
        self.stage = FrameStage::Idle;
    }

    /// Capture, blur and composite one frame at `logical` size.
    #[tracing::instrument(skip(self, source), fields(width = logical.width, height = logical.height))]
    pub fn render_frame(
        &mut self,
        source: &mut dyn FrameSource,
        logical: RasterSize,
    ) -> BlurResult<FrameRGBA> {
        match self.run_frame(source, logical) {
            Ok(frame) => {
                self.stats.frames_rendered += 1;
                Ok(frame)
            }
            Err(e) => {
                tracing::debug!(stage = %self.stage, error = %e, "frame abandoned");
                self.stats.frames_failed += 1;
                self.stage = FrameStage::Idle;
                Err(e)
            }
        }
    }

    fn run_frame(
        &mut self,
        source: &mut dyn FrameSource,
        logical: RasterSize,
    ) -> BlurResult<FrameRGBA> {
        self.ensure_strength()?;

        self.stage = FrameStage::CaptureSource;
        let captured = CapturedFrame::capture(source, logical, self.config.device_pixel_scale)?;

        let strength = match &self.strength {
            StrengthSource::Texture(t) => t.as_ref(),
            StrengthSource::Gradient(_) => match &self.cache {
                Some(c) => &c.texture,
                None => return Err(BlurError::render("strength texture missing")),
            },
        };

        self.stage = FrameStage::PassHorizontal;
        let horizontal = captured.horizontal_pass(self.program, strength, &self.config)?;

        self.stage = FrameStage::PassVertical;
        let composited = horizontal.vertical_pass(self.program, strength, &self.config)?;

        self.stage = FrameStage::Composited;
        tracing::trace!(stage = %self.stage, "frame composited");
        Ok(composited.into_frame())
    }

    fn active_strength(&self) -> BlurResult<&StrengthTexture> {
        match &self.strength {
            StrengthSource::Texture(t) => Ok(t.as_ref()),
            StrengthSource::Gradient(_) => self
                .cache
                .as_ref()
                .map(|c| &c.texture)
                .ok_or_else(|| BlurError::render("strength texture missing")),
        }
    }

    fn ensure_strength(&mut self) -> BlurResult<()> {
        let StrengthSource::Gradient(spec) = &self.strength else {
            return Ok(());
        };
        let size = self.config.strength_map_size()?;
        if let Some(c) = &self.cache
            && c.spec == *spec
            && c.size == size
        {
            return Ok(());
        }

        // Release the stale texture before rasterizing its replacement.
        if let Some(old) = self.cache.take() {
            tracing::debug!(size = ?old.size, "released strength texture");
            drop(old);
        }
        let texture = generate_strength_map(spec, size);
        self.stats.strength_regenerations += 1;
        tracing::debug!(?size, stops = spec.len(), "regenerated strength texture");
        self.cache = Some(CachedStrength {
            spec: spec.clone(),
            size,
            texture,
        });
        Ok(())
    }

    fn release_cache(&mut self) {
        if let Some(old) = self.cache.take() {
            tracing::debug!(size = ?old.size, "released strength texture");
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/orchestrator.rs"]
mod tests;
