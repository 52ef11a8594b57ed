//! Blur configuration, JSON loading and validation.

use std::path::Path;

use crate::foundation::core::{Axis, MAX_RASTER_EDGE, RasterSize, TintColor};
use crate::foundation::error::{BlurError, BlurResult};
use crate::gradient::spec::{EdgeBlur, GradientBlurSpec};
use crate::kernel::gaussian::BlurAxisSide;
use crate::kernel::program::{BlurMapMode, OriginalSampling, PassParameters};

/// Default base sigma, in captured pixels.
pub const DEFAULT_SIGMA: f32 = 8.0;
/// Default strength-map edge length.
pub const DEFAULT_BLUR_TEXTURE_DIMENSIONS: u32 = 128;
/// Default strength response exponent.
pub const DEFAULT_MAP_EXPONENT: f32 = 2.0;

/// Everything that shapes the blur except the strength source.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BlurConfig {
    /// Base sigma (`>= 0`, finite).
    pub sigma: f32,
    /// Edge length of the square strength map generated from a spec. Raise it to fix blockiness.
    pub blur_texture_dimensions: u32,
    /// Tint mixed in proportionally to strength.
    pub tint_color: TintColor,
    /// Run the horizontal pass with `sigma` (otherwise with 0).
    pub enable_horizontal_pass: bool,
    /// Run the vertical pass with `sigma` (otherwise with 0).
    pub enable_vertical_pass: bool,
    /// Kernel side for the horizontal pass.
    pub horizontal_side: BlurAxisSide,
    /// Kernel side for the vertical pass.
    pub vertical_side: BlurAxisSide,
    /// Strength interpretation.
    pub map_mode: BlurMapMode,
    /// Strength response exponent; floored at `1e-4` when applied.
    pub map_exponent: f32,
    /// Capture density relative to the logical size.
    pub device_pixel_scale: f32,
    /// Original-raster lookup convention for the final blend.
    pub original_sampling: OriginalSampling,
}

impl Default for BlurConfig {
    fn default() -> Self {
        Self {
            sigma: DEFAULT_SIGMA,
            blur_texture_dimensions: DEFAULT_BLUR_TEXTURE_DIMENSIONS,
            tint_color: TintColor::transparent(),
            enable_horizontal_pass: true,
            enable_vertical_pass: true,
            horizontal_side: BlurAxisSide::Symmetric,
            vertical_side: BlurAxisSide::Symmetric,
            map_mode: BlurMapMode::BlendWithBlurred,
            map_exponent: DEFAULT_MAP_EXPONENT,
            device_pixel_scale: 1.0,
            original_sampling: OriginalSampling::Direct,
        }
    }
}

impl BlurConfig {
    /// Parse JSON; missing fields take their defaults. The result is validated.
    pub fn from_json_str(s: &str) -> BlurResult<Self> {
        let cfg: Self = serde_json::from_str(s)
            .map_err(|e| BlurError::serde(format!("invalid blur config: {e}")))?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read and parse a JSON file.
    pub fn from_path(path: impl AsRef<Path>) -> BlurResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BlurError::validation(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }

    /// Serialize to pretty JSON.
    pub fn to_json_string(&self) -> BlurResult<String> {
        serde_json::to_string_pretty(self).map_err(|e| BlurError::serde(e.to_string()))
    }

    /// Reject settings the pipeline cannot run with.
    ///
    /// Tint channels and the exponent are clamped at use rather than rejected.
    pub fn validate(&self) -> BlurResult<()> {
        if !self.sigma.is_finite() || self.sigma < 0.0 {
            return Err(BlurError::validation(format!(
                "sigma must be finite and >= 0, got {}",
                self.sigma
            )));
        }
        if self.blur_texture_dimensions == 0 || self.blur_texture_dimensions > MAX_RASTER_EDGE {
            return Err(BlurError::validation(format!(
                "blur_texture_dimensions must be in 1..={MAX_RASTER_EDGE}, got {}",
                self.blur_texture_dimensions
            )));
        }
        if !self.device_pixel_scale.is_finite() || self.device_pixel_scale <= 0.0 {
            return Err(BlurError::validation(format!(
                "device_pixel_scale must be finite and > 0, got {}",
                self.device_pixel_scale
            )));
        }
        Ok(())
    }

    /// Set the base sigma.
    pub fn with_sigma(mut self, sigma: f32) -> Self {
        self.sigma = sigma;
        self
    }

    /// Set the strength-map edge length.
    pub fn with_blur_texture_dimensions(mut self, dims: u32) -> Self {
        self.blur_texture_dimensions = dims;
        self
    }

    /// Set the tint.
    pub fn with_tint_color(mut self, tint: TintColor) -> Self {
        self.tint_color = tint;
        self
    }

    /// Enable or disable each pass.
    pub fn with_passes(mut self, horizontal: bool, vertical: bool) -> Self {
        self.enable_horizontal_pass = horizontal;
        self.enable_vertical_pass = vertical;
        self
    }

    /// Set the kernel side per axis.
    pub fn with_sides(mut self, horizontal: BlurAxisSide, vertical: BlurAxisSide) -> Self {
        self.horizontal_side = horizontal;
        self.vertical_side = vertical;
        self
    }

    /// Set the map mode.
    pub fn with_map_mode(mut self, mode: BlurMapMode) -> Self {
        self.map_mode = mode;
        self
    }

    /// Set the response exponent.
    pub fn with_map_exponent(mut self, exponent: f32) -> Self {
        self.map_exponent = exponent;
        self
    }

    /// Set the capture density.
    pub fn with_device_pixel_scale(mut self, scale: f32) -> Self {
        self.device_pixel_scale = scale;
        self
    }

    /// Set the original-raster lookup convention.
    pub fn with_original_sampling(mut self, sampling: OriginalSampling) -> Self {
        self.original_sampling = sampling;
        self
    }

    /// Size of the strength map generated from a spec.
    pub fn strength_map_size(&self) -> BlurResult<RasterSize> {
        RasterSize::square(self.blur_texture_dimensions)
    }

    pub(crate) fn pass_parameters(&self, axis: Axis, child_size: RasterSize) -> PassParameters {
        let (enabled, side) = match axis {
            Axis::Horizontal => (self.enable_horizontal_pass, self.horizontal_side),
            Axis::Vertical => (self.enable_vertical_pass, self.vertical_side),
        };
        PassParameters {
            sigma: if enabled { self.sigma } else { 0.0 },
            axis,
            side,
            map_mode: self.map_mode,
            is_final: axis == Axis::Vertical,
            tint: self.tint_color.clamped(),
            map_exponent: self.map_exponent,
            child_size,
            device_pixel_scale: self.device_pixel_scale,
            original_sampling: self.original_sampling,
        }
    }
}

/// Declarative strength description as it appears in JSON documents.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrengthSpec {
    /// Edge-anchored ramp.
    Edge(EdgeBlur),
    /// Explicit stops and values.
    Gradient(GradientBlurSpec),
}

impl StrengthSpec {
    /// Resolve into a gradient spec.
    pub fn to_gradient(&self) -> GradientBlurSpec {
        match self {
            Self::Edge(edge) => edge.build(),
            Self::Gradient(spec) => spec.clone(),
        }
    }
}

/// A config file: blur settings plus an optional strength description.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct BlurDocument {
    /// Blur settings.
    pub config: BlurConfig,
    /// Strength description; callers supply their own when absent.
    pub strength: Option<StrengthSpec>,
}

impl BlurDocument {
    /// Parse and validate a JSON document.
    pub fn from_json_str(s: &str) -> BlurResult<Self> {
        let doc: Self = serde_json::from_str(s)
            .map_err(|e| BlurError::serde(format!("invalid blur document: {e}")))?;
        doc.config.validate()?;
        Ok(doc)
    }

    /// Read and parse a JSON document file.
    pub fn from_path(path: impl AsRef<Path>) -> BlurResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            BlurError::validation(format!("failed to read '{}': {e}", path.display()))
        })?;
        Self::from_json_str(&text)
    }
}

#[cfg(test)]
#[path = "../tests/unit/config/config.rs"]
mod tests;
