//! Per-frame pass sequencing as typestate.
//!
//! `CapturedFrame -> HorizontalPassed -> CompositedFrame`: the vertical pass can only be built from
//! a finished horizontal pass, and it consumes the intermediate raster it reads.

use crate::config::BlurConfig;
use crate::foundation::core::{Axis, RasterSize};
use crate::foundation::error::{BlurError, BlurResult};
use crate::gradient::strength_map::StrengthTexture;
use crate::kernel::pass::BlurProgram;
use crate::kernel::program::{PassSamplers, TextureView};
use crate::render::frame::FrameRGBA;
use crate::render::source::{FrameSource, pixmap_size};

/// Orchestrator state, in the order a frame moves through it.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum FrameStage {
    /// No frame in flight.
    #[default]
    Idle,
    /// Capturing the source raster.
    CaptureSource,
    /// Horizontal pass into the intermediate target.
    PassHorizontal,
    /// Final vertical pass into the output.
    PassVertical,
    /// Output ready.
    Composited,
}

impl std::fmt::Display for FrameStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Idle => "idle",
            Self::CaptureSource => "capture_source",
            Self::PassHorizontal => "pass_horizontal",
            Self::PassVertical => "pass_vertical",
            Self::Composited => "composited",
        })
    }
}

/// The captured source at `ceil(logical * scale)`.
pub struct CapturedFrame {
    logical: RasterSize,
    scaled: RasterSize,
    source: vello_cpu::Pixmap,
}

/// The horizontal pass has fully written the intermediate raster.
pub struct HorizontalPassed {
    captured: CapturedFrame,
    intermediate: Vec<u8>,
}

/// Final output on the logical grid.
pub struct CompositedFrame {
    frame: FrameRGBA,
}

fn strength_view(strength: &StrengthTexture) -> BlurResult<TextureView<'_>> {
    TextureView::new(strength.data(), strength.size())
}

impl CapturedFrame {
    /// Capture `logical` at `scale`; the source must honour the scaled size exactly.
    pub fn capture(
        source: &mut dyn FrameSource,
        logical: RasterSize,
        scale: f32,
    ) -> BlurResult<Self> {
        let scaled = logical.scaled(scale)?;
        let pixmap = source.capture(logical, scale)?;
        let got = pixmap_size(&pixmap)?;
        if got != scaled {
            return Err(BlurError::render(format!(
                "frame source returned {}x{}, expected {}x{}",
                got.width, got.height, scaled.width, scaled.height
            )));
        }
        tracing::trace!(stage = %FrameStage::CaptureSource, ?scaled, "captured source");
        Ok(Self {
            logical,
            scaled,
            source: pixmap,
        })
    }

    /// Scaled capture size.
    pub fn scaled_size(&self) -> RasterSize {
        self.scaled
    }

    /// Horizontal pass over the captured raster into a freshly allocated intermediate.
    pub fn horizontal_pass(
        self,
        program: &BlurProgram,
        strength: &StrengthTexture,
        config: &BlurConfig,
    ) -> BlurResult<HorizontalPassed> {
        let params = config.pass_parameters(Axis::Horizontal, self.scaled);
        let samplers = PassSamplers {
            child: TextureView::new(self.source.data_as_u8_slice(), self.scaled)?,
            strength: strength_view(strength)?,
            original: None,
        };
        let mut intermediate = vec![0u8; self.scaled.byte_len()];
        program.run_pass(&samplers, &params, self.scaled, &mut intermediate)?;
        tracing::trace!(stage = %FrameStage::PassHorizontal, "intermediate written");
        Ok(HorizontalPassed {
            captured: self,
            intermediate,
        })
    }
}

impl HorizontalPassed {
    /// Final vertical pass at the scaled size, reading the intermediate and the captured original.
    /// Both are released before the result is box-filtered down to the logical size.
    pub fn vertical_pass(
        self,
        program: &BlurProgram,
        strength: &StrengthTexture,
        config: &BlurConfig,
    ) -> BlurResult<CompositedFrame> {
        let Self {
            captured,
            intermediate,
        } = self;
        let params = config.pass_parameters(Axis::Vertical, captured.scaled);
        let samplers = PassSamplers {
            child: TextureView::new(&intermediate, captured.scaled)?,
            strength: strength_view(strength)?,
            original: Some(TextureView::new(
                captured.source.data_as_u8_slice(),
                captured.scaled,
            )?),
        };
        let (logical, scaled) = (captured.logical, captured.scaled);
        let mut composited = vec![0u8; scaled.byte_len()];
        program.run_pass(&samplers, &params, scaled, &mut composited)?;

        drop(intermediate);
        tracing::trace!(stage = %FrameStage::PassVertical, "intermediate released");
        drop(captured);

        // Each logical pixel averages the physical texels under it.
        let data = if scaled == logical {
            composited
        } else {
            let mut data = vec![0u8; logical.byte_len()];
            program.downscale_box(&composited, scaled, logical, &mut data)?;
            data
        };

        Ok(CompositedFrame {
            frame: FrameRGBA {
                width: logical.width,
                height: logical.height,
                data,
                premultiplied: true,
            },
        })
    }

    /// The intermediate raster (premultiplied RGBA8 at the scaled size).
    pub fn intermediate(&self) -> &[u8] {
        &self.intermediate
    }
}

impl CompositedFrame {
    /// Take the output frame.
    pub fn into_frame(self) -> FrameRGBA {
        self.frame
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
