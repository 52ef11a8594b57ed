use smallvec::SmallVec;

use crate::foundation::core::{Point, RasterSize};
use crate::foundation::error::{BlurError, BlurResult};
use crate::foundation::math::f32_to_unorm8;
use crate::gradient::spec::GradientBlurSpec;

/// Channel index holding strength in a [`StrengthTexture`] texel.
pub const STRENGTH_CHANNEL: usize = 0;

/// RGBA8 raster whose red channel encodes per-pixel strength in `[0, 1]`.
///
/// Textures generated from a [`GradientBlurSpec`] carry `(strength, 0, 0, 255)` texels. Caller
/// supplied textures may carry anything in the other channels; only red is read.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct StrengthTexture {
    size: RasterSize,
    data: Vec<u8>,
}

impl StrengthTexture {
    /// Wrap tightly packed RGBA8 bytes.
    pub fn from_rgba8(size: RasterSize, data: Vec<u8>) -> BlurResult<Self> {
        if data.len() != size.byte_len() {
            return Err(BlurError::validation(format!(
                "strength texture expects {} bytes for {}x{}, got {}",
                size.byte_len(),
                size.width,
                size.height,
                data.len()
            )));
        }
        Ok(Self { size, data })
    }

    /// Build from one strength per pixel (row-major, clamped into `[0, 1]`).
    pub fn from_strengths(size: RasterSize, strengths: &[f32]) -> BlurResult<Self> {
        if strengths.len() != size.pixel_count() {
            return Err(BlurError::validation(format!(
                "strength texture expects {} values, got {}",
                size.pixel_count(),
                strengths.len()
            )));
        }
        let data = strengths
            .iter()
            .flat_map(|&s| [f32_to_unorm8(s), 0, 0, 255])
            .collect();
        Ok(Self { size, data })
    }

    /// Build from a grayscale image; luma becomes strength.
    pub fn from_luma_image(img: &image::GrayImage) -> BlurResult<Self> {
        let size = RasterSize::new(img.width(), img.height())?;
        let data = img.as_raw().iter().flat_map(|&l| [l, 0, 0, 255]).collect();
        Ok(Self { size, data })
    }

    /// Texture dimensions.
    pub fn size(&self) -> RasterSize {
        self.size
    }

    /// Raw RGBA8 texels.
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Quantized strength at pixel `(x, y)`; coordinates are clamped to the edge.
    pub fn strength_at(&self, x: u32, y: u32) -> u8 {
        let x = x.min(self.size.width - 1) as usize;
        let y = y.min(self.size.height - 1) as usize;
        self.data[(y * self.size.width as usize + x) * 4 + STRENGTH_CHANNEL]
    }

    /// Strength channel as an 8-bit grayscale image, for previews.
    pub fn to_luma_image(&self) -> BlurResult<image::GrayImage> {
        let luma: Vec<u8> = self
            .data
            .chunks_exact(4)
            .map(|px| px[STRENGTH_CHANNEL])
            .collect();
        image::GrayImage::from_raw(self.size.width, self.size.height, luma)
            .ok_or_else(|| BlurError::render("strength preview buffer size mismatch"))
    }
}

#[derive(Clone, Copy, Debug)]
struct RampStop {
    pos: f32,
    color: [u8; 4],
}

/// Linear color ramp along a normalized axis, padded with the end colors.
#[derive(Clone, Debug)]
struct LinearRamp {
    start: Point,
    end: Point,
    stops: SmallVec<[RampStop; 16]>,
}

impl LinearRamp {
    fn from_spec(spec: &GradientBlurSpec) -> Self {
        let mut stops = SmallVec::<[RampStop; 16]>::with_capacity(spec.len());
        let mut floor = f32::NEG_INFINITY;
        for (pos, value) in spec.pairs() {
            // Out-of-order stops collapse onto their predecessor.
            let pos = pos.max(floor);
            floor = pos;
            stops.push(RampStop {
                pos,
                color: [f32_to_unorm8(value), 0, 0, 255],
            });
        }
        Self {
            start: spec.start(),
            end: spec.end(),
            stops,
        }
    }

    /// Project a normalized point onto the ramp axis.
    fn position_of(&self, p: Point) -> f32 {
        let axis = self.end - self.start;
        let len2 = axis.hypot2();
        if len2 <= f64::EPSILON {
            return 0.0;
        }
        ((p - self.start).dot(axis) / len2) as f32
    }

    fn color_at(&self, t: f32) -> [u8; 4] {
        let (Some(first), Some(last)) = (self.stops.first(), self.stops.last()) else {
            return [0, 0, 0, 255];
        };
        if t <= first.pos {
            return first.color;
        }
        if t >= last.pos {
            return last.color;
        }
        for w in self.stops.windows(2) {
            let (a, b) = (w[0], w[1]);
            if t >= b.pos {
                continue;
            }
            let span = b.pos - a.pos;
            if span <= 0.0 {
                return b.color;
            }
            let f = (t - a.pos) / span;
            let lerp = |x: u8, y: u8| -> u8 {
                let (x, y) = (f32::from(x), f32::from(y));
                (x + (y - x) * f).round().clamp(0.0, 255.0) as u8
            };
            return [
                lerp(a.color[0], b.color[0]),
                lerp(a.color[1], b.color[1]),
                lerp(a.color[2], b.color[2]),
                lerp(a.color[3], b.color[3]),
            ];
        }
        last.color
    }

    fn fill_rect(&self, size: RasterSize) -> Vec<u8> {
        let (w, h) = (size.width as usize, size.height as usize);
        let mut bytes = vec![0u8; size.byte_len()];
        for y in 0..h {
            let py = (y as f64 + 0.5) / h as f64;
            for x in 0..w {
                let px = (x as f64 + 0.5) / w as f64;
                let c = self.color_at(self.position_of(Point::new(px, py)));
                let idx = (y * w + x) * 4;
                bytes[idx..idx + 4].copy_from_slice(&c);
            }
        }
        bytes
    }
}

/// Rasterize `spec` into a `size` strength texture.
///
/// Deterministic: structurally equal specs produce bit-identical textures. The texture keeps no
/// reference to `spec`.
#[tracing::instrument(skip(spec), fields(stops = spec.len()))]
pub fn generate_strength_map(spec: &GradientBlurSpec, size: RasterSize) -> StrengthTexture {
    let ramp = LinearRamp::from_spec(spec);
    StrengthTexture {
        size,
        data: ramp.fill_rect(size),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gradient/strength_map.rs"]
mod tests;
