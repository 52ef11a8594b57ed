//! The per-pixel blur program.
//!
//! [`shade_pixel`] is a pure function `(uv, samplers, params) -> color`: it reads nothing but its
//! arguments, so the same math can back a GPU shader or the CPU pass runner.
//! Tagged enums stay typed here; [`PassUniforms`] is the only place they become numbers.

use crate::foundation::core::{Axis, RasterSize, TintColor};
use crate::foundation::error::{BlurError, BlurResult};
use crate::foundation::math::{mix4, rgba8_to_f32};
use crate::gradient::strength_map::STRENGTH_CHANNEL;
use crate::kernel::gaussian::{BlurAxisSide, ConvolutionKernel};

/// Smallest response exponent; lower (or NaN) exponents are raised to it.
pub const MIN_MAP_EXPONENT: f32 = 1e-4;

/// How the strength map is interpreted.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurMapMode {
    /// Scale sigma per pixel by strength.
    ModulateSigma,
    /// Blur with constant sigma, then blend with the unblurred source using strength as alpha.
    #[default]
    BlendWithBlurred,
}

impl std::str::FromStr for BlurMapMode {
    type Err = BlurError;

    fn from_str(s: &str) -> BlurResult<Self> {
        match s.trim().to_ascii_lowercase().replace(['-', '_'], "").as_str() {
            "modulatesigma" | "modulate" => Ok(Self::ModulateSigma),
            "blendwithblurred" | "blend" => Ok(Self::BlendWithBlurred),
            _ => Err(BlurError::validation(format!("unknown map mode '{s}'"))),
        }
    }
}

/// Where the final pass reads the original raster relative to `uv`.
///
/// `Direct` reads at `uv`. `MirroredY` reads at `(uv.x, 1 - uv.y)`, the lookup some hosts need
/// when the captured frame and the off-screen target disagree on the y origin. Captured sources
/// and pass targets in this crate share a top-left origin, so `Direct` is the default.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginalSampling {
    /// Same coordinate as the child sample.
    #[default]
    Direct,
    /// Vertically mirrored coordinate.
    MirroredY,
}

impl OriginalSampling {
    /// Map the main sampling coordinate to the original-raster coordinate.
    pub fn map_uv(self, uv: [f32; 2]) -> [f32; 2] {
        match self {
            Self::Direct => uv,
            Self::MirroredY => [uv[0], 1.0 - uv[1]],
        }
    }
}

/// Everything one pass needs besides its textures. Rebuilt every frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassParameters {
    /// Base sigma in child texels.
    pub sigma: f32,
    /// Pass axis.
    pub axis: Axis,
    /// Requested kernel side (see [`PassParameters::effective_side`]).
    pub side: BlurAxisSide,
    /// Strength interpretation.
    pub map_mode: BlurMapMode,
    /// Final pass: tint and blend against the original.
    pub is_final: bool,
    /// Tint mixed in by `strength * tint.a`.
    pub tint: TintColor,
    /// Strength response exponent.
    pub map_exponent: f32,
    /// Child texture dimensions (the sampling space).
    pub child_size: RasterSize,
    /// Device pixel scale the child was captured at.
    pub device_pixel_scale: f32,
    /// Original-raster lookup convention for the final blend.
    pub original_sampling: OriginalSampling,
}

impl PassParameters {
    /// Side actually sampled: one-sided kernels are honoured only when modulating sigma.
    pub fn effective_side(&self) -> BlurAxisSide {
        match self.map_mode {
            BlurMapMode::ModulateSigma => self.side,
            BlurMapMode::BlendWithBlurred => BlurAxisSide::Symmetric,
        }
    }

    /// Response exponent floored at [`MIN_MAP_EXPONENT`].
    pub fn exponent(&self) -> f32 {
        if self.map_exponent.is_nan() {
            MIN_MAP_EXPONENT
        } else {
            self.map_exponent.max(MIN_MAP_EXPONENT)
        }
    }

    /// Apply the response curve to a raw strength sample.
    pub fn response(&self, raw: f32) -> f32 {
        raw.clamp(0.0, 1.0).powf(self.exponent())
    }

    /// Sigma used at a pixel with the given (post-response) strength.
    pub fn pixel_sigma(&self, strength: f32) -> f32 {
        match self.map_mode {
            BlurMapMode::ModulateSigma => self.sigma * strength,
            BlurMapMode::BlendWithBlurred => self.sigma,
        }
    }

    /// Numeric encoding for a GPU host.
    pub fn uniforms(&self) -> PassUniforms {
        PassUniforms {
            child_size: [self.child_size.width as f32, self.child_size.height as f32],
            blur_sigma: self.sigma,
            blur_direction: match self.axis {
                Axis::Horizontal => 0.0,
                Axis::Vertical => 1.0,
            },
            blur_side: match self.side {
                BlurAxisSide::Negative => -1.0,
                BlurAxisSide::Symmetric => 0.0,
                BlurAxisSide::Positive => 1.0,
            },
            blur_map_mode: match self.map_mode {
                BlurMapMode::ModulateSigma => 0.0,
                BlurMapMode::BlendWithBlurred => 1.0,
            },
            is_final_pass: if self.is_final { 1.0 } else { 0.0 },
            tint_color: self.tint.clamped().to_array(),
            map_exponent: self.exponent(),
        }
    }
}

/// Sampler bindings, in slot order.
pub const SAMPLER_SLOTS: [&str; 3] = ["child_texture", "blur_texture", "original_texture"];

/// Float bindings and their component counts, in slot order.
pub const FLOAT_SLOTS: [(&str, usize); 8] = [
    ("child_size", 2),
    ("blur_sigma", 1),
    ("blur_direction", 1),
    ("blur_side", 1),
    ("blur_map_mode", 1),
    ("is_final_pass", 1),
    ("tint_color", 4),
    ("map_exponent", 1),
];

/// Total float components across [`FLOAT_SLOTS`].
pub const UNIFORM_FLOATS: usize = {
    let mut n = 0;
    let mut i = 0;
    while i < FLOAT_SLOTS.len() {
        n += FLOAT_SLOTS[i].1;
        i += 1;
    }
    n
};

/// Float uniforms of one pass, laid out as in [`FLOAT_SLOTS`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PassUniforms {
    /// Child texture size `(w, h)`.
    pub child_size: [f32; 2],
    /// Base sigma.
    pub blur_sigma: f32,
    /// `0` horizontal, `1` vertical.
    pub blur_direction: f32,
    /// `-1` negative, `0` symmetric, `+1` positive.
    pub blur_side: f32,
    /// `0` modulate sigma, `1` blend with blurred.
    pub blur_map_mode: f32,
    /// `0` or `1`.
    pub is_final_pass: f32,
    /// RGBA tint, `0..=1`.
    pub tint_color: [f32; 4],
    /// Response exponent, already floored.
    pub map_exponent: f32,
}

impl PassUniforms {
    /// Flatten into slot order.
    pub fn to_floats(&self) -> [f32; UNIFORM_FLOATS] {
        let [w, h] = self.child_size;
        let [r, g, b, a] = self.tint_color;
        [
            w,
            h,
            self.blur_sigma,
            self.blur_direction,
            self.blur_side,
            self.blur_map_mode,
            self.is_final_pass,
            r,
            g,
            b,
            a,
            self.map_exponent,
        ]
    }

    /// Read back from slot order.
    pub fn from_floats(f: [f32; UNIFORM_FLOATS]) -> Self {
        Self {
            child_size: [f[0], f[1]],
            blur_sigma: f[2],
            blur_direction: f[3],
            blur_side: f[4],
            blur_map_mode: f[5],
            is_final_pass: f[6],
            tint_color: [f[7], f[8], f[9], f[10]],
            map_exponent: f[11],
        }
    }

    /// Decode into typed parameters. Unknown enum encodings are rejected.
    pub fn to_parameters(
        &self,
        device_pixel_scale: f32,
        original_sampling: OriginalSampling,
    ) -> BlurResult<PassParameters> {
        let d = self.blur_direction;
        let axis = if d == 0.0 {
            Axis::Horizontal
        } else if d == 1.0 {
            Axis::Vertical
        } else {
            return Err(BlurError::validation(format!("bad blur_direction {d}")));
        };

        let sd = self.blur_side;
        let side = if sd == -1.0 {
            BlurAxisSide::Negative
        } else if sd == 0.0 {
            BlurAxisSide::Symmetric
        } else if sd == 1.0 {
            BlurAxisSide::Positive
        } else {
            return Err(BlurError::validation(format!("bad blur_side {sd}")));
        };

        let m = self.blur_map_mode;
        let map_mode = if m == 0.0 {
            BlurMapMode::ModulateSigma
        } else if m == 1.0 {
            BlurMapMode::BlendWithBlurred
        } else {
            return Err(BlurError::validation(format!("bad blur_map_mode {m}")));
        };

        let [cw, ch] = self.child_size;
        if !(cw.fract() == 0.0 && ch.fract() == 0.0 && cw >= 1.0 && ch >= 1.0) {
            return Err(BlurError::validation(
                "child_size must be positive integers",
            ));
        }
        let [r, g, b, a] = self.tint_color;
        Ok(PassParameters {
            sigma: self.blur_sigma,
            axis,
            side,
            map_mode,
            is_final: self.is_final_pass != 0.0,
            tint: TintColor { r, g, b, a },
            map_exponent: self.map_exponent,
            child_size: RasterSize::new(cw as u32, ch as u32)?,
            device_pixel_scale,
            original_sampling,
        })
    }
}

/// Read-only view over a tightly packed RGBA8 raster, sampled with clamp-to-edge addressing.
#[derive(Clone, Copy, Debug)]
pub struct TextureView<'a> {
    data: &'a [u8],
    size: RasterSize,
}

impl<'a> TextureView<'a> {
    /// Wrap `data`, which must be exactly `size.byte_len()` bytes.
    pub fn new(data: &'a [u8], size: RasterSize) -> BlurResult<Self> {
        if data.len() != size.byte_len() {
            return Err(BlurError::render(format!(
                "texture expects {} bytes for {}x{}, got {}",
                size.byte_len(),
                size.width,
                size.height,
                data.len()
            )));
        }
        Ok(Self { data, size })
    }

    /// Texture dimensions.
    pub fn size(&self) -> RasterSize {
        self.size
    }

    /// Texel containing `uv`, clamped to the edge.
    pub fn texel_of(&self, uv: [f32; 2]) -> (i64, i64) {
        let x = (uv[0] * self.size.width as f32).floor() as i64;
        let y = (uv[1] * self.size.height as f32).floor() as i64;
        self.clamp(x, y)
    }

    fn clamp(&self, x: i64, y: i64) -> (i64, i64) {
        (
            x.clamp(0, i64::from(self.size.width) - 1),
            y.clamp(0, i64::from(self.size.height) - 1),
        )
    }

    /// Texel at integer coordinates, clamped to the edge, as `0..=1` floats.
    pub fn fetch(&self, x: i64, y: i64) -> [f32; 4] {
        let (x, y) = self.clamp(x, y);
        let idx = (y as usize * self.size.width as usize + x as usize) * 4;
        rgba8_to_f32([
            self.data[idx],
            self.data[idx + 1],
            self.data[idx + 2],
            self.data[idx + 3],
        ])
    }

    /// Nearest-texel sample.
    pub fn sample_nearest(&self, uv: [f32; 2]) -> [f32; 4] {
        let (x, y) = self.texel_of(uv);
        self.fetch(x, y)
    }

    /// Bilinear sample with texel centres at `(i + 0.5) / size`.
    pub fn sample_bilinear(&self, uv: [f32; 2]) -> [f32; 4] {
        let fx = uv[0] * self.size.width as f32 - 0.5;
        let fy = uv[1] * self.size.height as f32 - 0.5;
        let (x0, y0) = (fx.floor(), fy.floor());
        let (tx, ty) = (fx - x0, fy - y0);
        let (x0, y0) = (x0 as i64, y0 as i64);

        let top = mix4(self.fetch(x0, y0), self.fetch(x0 + 1, y0), tx);
        let bottom = mix4(self.fetch(x0, y0 + 1), self.fetch(x0 + 1, y0 + 1), tx);
        mix4(top, bottom, ty)
    }
}

/// Textures bound to one pass.
#[derive(Clone, Copy, Debug)]
pub struct PassSamplers<'a> {
    /// Current pass input.
    pub child: TextureView<'a>,
    /// Strength map.
    pub strength: TextureView<'a>,
    /// Pre-blur source; read only by the final blend.
    pub original: Option<TextureView<'a>>,
}

/// Post-response strength at `uv`.
pub fn sample_strength(
    uv: [f32; 2],
    samplers: &PassSamplers<'_>,
    params: &PassParameters,
) -> f32 {
    let raw = samplers.strength.sample_bilinear(uv)[STRENGTH_CHANNEL];
    params.response(raw)
}

/// Evaluate the blur program at `uv`.
///
/// Builds the kernel for this pixel's sigma. The pass runner reuses kernels across pixels but
/// produces the same colors.
pub fn shade_pixel(
    uv: [f32; 2],
    samplers: &PassSamplers<'_>,
    params: &PassParameters,
) -> [f32; 4] {
    let strength = sample_strength(uv, samplers, params);
    let kernel = ConvolutionKernel::new(params.pixel_sigma(strength), params.effective_side());
    shade_resolved(uv, samplers, params, strength, kernel.as_ref())
}

/// Shade with an already resolved strength and kernel (`None` for the degenerate sigma case).
pub(crate) fn shade_resolved(
    uv: [f32; 2],
    samplers: &PassSamplers<'_>,
    params: &PassParameters,
    strength: f32,
    kernel: Option<&ConvolutionKernel>,
) -> [f32; 4] {
    let child = &samplers.child;
    let (cx, cy) = child.texel_of(uv);
    let color = match kernel {
        None => child.fetch(cx, cy),
        Some(k) => k.convolve(|v| match params.axis {
            Axis::Horizontal => child.fetch(cx + i64::from(v), cy),
            Axis::Vertical => child.fetch(cx, cy + i64::from(v)),
        }),
    };

    let tint = params.tint.clamped().to_array();
    match params.map_mode {
        // Sigma already carries the map, so only the final pass tints.
        BlurMapMode::ModulateSigma if !params.is_final => color,
        BlurMapMode::ModulateSigma => mix4(color, tint, strength * tint[3]),
        BlurMapMode::BlendWithBlurred if !params.is_final => color,
        BlurMapMode::BlendWithBlurred => {
            let tinted = mix4(color, tint, strength * tint[3]);
            // Without an original binding the blend degenerates to the tinted color.
            let original = samplers
                .original
                .map(|o| o.sample_nearest(params.original_sampling.map_uv(uv)))
                .unwrap_or(tinted);
            mix4(original, tinted, strength)
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/program.rs"]
mod tests;
