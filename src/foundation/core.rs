use crate::foundation::error::{BlurError, BlurResult};

pub use kurbo::Point;

/// Largest raster edge the `vello_cpu` surfaces can address.
pub const MAX_RASTER_EDGE: u32 = u16::MAX as u32;

/// Raster dimensions in physical pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
pub struct RasterSize {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl RasterSize {
    /// Create a validated size: both edges must be in `1..=65535`.
    pub fn new(width: u32, height: u32) -> BlurResult<Self> {
        if width == 0 || height == 0 {
            return Err(BlurError::validation("raster size must be > 0"));
        }
        if width > MAX_RASTER_EDGE || height > MAX_RASTER_EDGE {
            return Err(BlurError::validation(format!(
                "raster size {width}x{height} exceeds {MAX_RASTER_EDGE}"
            )));
        }
        Ok(Self { width, height })
    }

    /// Square size with edge `n`.
    pub fn square(n: u32) -> BlurResult<Self> {
        Self::new(n, n)
    }

    /// Scale by a device pixel ratio, rounding each edge up.
    pub fn scaled(self, scale: f32) -> BlurResult<Self> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(BlurError::validation("device pixel scale must be finite and > 0"));
        }
        let w = (self.width as f64 * scale as f64).ceil().max(1.0);
        let h = (self.height as f64 * scale as f64).ceil().max(1.0);
        if w > MAX_RASTER_EDGE as f64 || h > MAX_RASTER_EDGE as f64 {
            return Err(BlurError::validation(format!(
                "scaled raster {w}x{h} exceeds {MAX_RASTER_EDGE}"
            )));
        }
        Self::new(w as u32, h as u32)
    }

    /// Number of pixels.
    pub fn pixel_count(self) -> usize {
        (self.width as usize).saturating_mul(self.height as usize)
    }

    /// Number of bytes of a tightly packed RGBA8 raster of this size.
    pub fn byte_len(self) -> usize {
        self.pixel_count().saturating_mul(4)
    }

    pub(crate) fn to_u16(self) -> BlurResult<(u16, u16)> {
        let w: u16 = self
            .width
            .try_into()
            .map_err(|_| BlurError::render("surface width exceeds u16"))?;
        let h: u16 = self
            .height
            .try_into()
            .map_err(|_| BlurError::render("surface height exceeds u16"))?;
        Ok((w, h))
    }
}

/// Pass axis. Offsets advance along x only for `Horizontal` and along y only for `Vertical`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Axis {
    /// Sample along x.
    Horizontal,
    /// Sample along y.
    Vertical,
}

/// RGBA tint in `0..=1` per channel. No premultiplication is implied.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct TintColor {
    /// Red.
    pub r: f32,
    /// Green.
    pub g: f32,
    /// Blue.
    pub b: f32,
    /// Alpha; scales how strongly the tint is mixed in.
    pub a: f32,
}

impl Default for TintColor {
    fn default() -> Self {
        Self::transparent()
    }
}

impl TintColor {
    /// Fully transparent black (no tint).
    pub const fn transparent() -> Self {
        Self {
            r: 0.0,
            g: 0.0,
            b: 0.0,
            a: 0.0,
        }
    }

    /// Build from floating-point channels, clamping each into `0..=1`.
    pub fn new(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }.clamped()
    }

    /// Build from 8-bit channels.
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self {
            r: f32::from(r) / 255.0,
            g: f32::from(g) / 255.0,
            b: f32::from(b) / 255.0,
            a: f32::from(a) / 255.0,
        }
    }

    /// Parse `#rrggbb` or `#rrggbbaa`.
    pub fn from_hex(s: &str) -> BlurResult<Self> {
        let hex = s.trim().trim_start_matches('#');
        let byte = |i: usize| -> BlurResult<u8> {
            hex.get(i..i + 2)
                .and_then(|h| u8::from_str_radix(h, 16).ok())
                .ok_or_else(|| BlurError::validation(format!("invalid hex color '{s}'")))
        };
        match hex.len() {
            6 => Ok(Self::from_rgba8(byte(0)?, byte(2)?, byte(4)?, 255)),
            8 => Ok(Self::from_rgba8(byte(0)?, byte(2)?, byte(4)?, byte(6)?)),
            _ => Err(BlurError::validation(format!("invalid hex color '{s}'"))),
        }
    }

    /// Clamp each channel into `0..=1`; non-finite channels become 0.
    pub fn clamped(self) -> Self {
        let c = |v: f32| if v.is_finite() { v.clamp(0.0, 1.0) } else { 0.0 };
        Self {
            r: c(self.r),
            g: c(self.g),
            b: c(self.b),
            a: c(self.a),
        }
    }

    /// Channels as `[r, g, b, a]`.
    pub fn to_array(self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

/// Convert straight-alpha RGBA8 into premultiplied RGBA8 in place.
pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = ((u16::from(*c) * a + 127) / 255) as u8;
        }
    }
}

/// Convert premultiplied RGBA8 into straight-alpha RGBA8 in place.
pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u32::from(px[3]);
        if a == 0 {
            px[..3].fill(0);
            continue;
        }
        for c in &mut px[..3] {
            *c = ((u32::from(*c) * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
