use smallvec::SmallVec;

use crate::foundation::error::{BlurError, BlurResult};

/// Maximum number of taps a symmetric kernel may use.
pub const MAX_KERNEL_TAPS: u32 = 255;
/// Radius a kernel is truncated to when `2r + 1` would exceed [`MAX_KERNEL_TAPS`].
pub const MAX_KERNEL_RADIUS: u32 = (MAX_KERNEL_TAPS - 1) / 2;
/// Sigmas below this skip convolution entirely.
pub const MIN_SIGMA: f32 = 1e-5;

/// Which offsets along the pass axis a kernel samples.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurAxisSide {
    /// Offsets `-r..=r`.
    #[default]
    Symmetric,
    /// Offsets `0..=r` (toward increasing x / y).
    Positive,
    /// Offsets `-r..=0` (toward decreasing x / y).
    Negative,
}

impl std::str::FromStr for BlurAxisSide {
    type Err = BlurError;

    fn from_str(s: &str) -> BlurResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "symmetric" | "both" | "0" => Ok(Self::Symmetric),
            "positive" | "pos" | "+" | "+1" => Ok(Self::Positive),
            "negative" | "neg" | "-" | "-1" => Ok(Self::Negative),
            _ => Err(BlurError::validation(format!("unknown blur side '{s}'"))),
        }
    }
}

/// Kernel radius for `sigma`: `ceil(3 * sigma)`, truncated to [`MAX_KERNEL_RADIUS`].
pub fn kernel_radius(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return if sigma == f32::INFINITY {
            MAX_KERNEL_RADIUS
        } else {
            0
        };
    }
    let r = (3.0 * f64::from(sigma)).ceil();
    if 2.0 * r + 1.0 > f64::from(MAX_KERNEL_TAPS) {
        MAX_KERNEL_RADIUS
    } else {
        r as u32
    }
}

/// One kernel sample: texel offset along the pass axis and its normalized weight.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tap {
    /// Offset in texels along the pass axis.
    pub offset: i32,
    /// Normalized weight.
    pub weight: f32,
}

/// Normalized 1D Gaussian kernel, symmetric or one-sided.
///
/// Weights are `exp(-v^2 / (2 sigma^2))` divided by the sum of the weights actually used, so a
/// truncated or one-sided kernel still sums to 1.
#[derive(Clone, Debug)]
pub struct ConvolutionKernel {
    sigma: f32,
    radius: u32,
    side: BlurAxisSide,
    taps: SmallVec<[Tap; 64]>,
}

impl ConvolutionKernel {
    /// Build a kernel, or `None` when `sigma < MIN_SIGMA` (no convolution).
    pub fn new(sigma: f32, side: BlurAxisSide) -> Option<Self> {
        if sigma.is_nan() || sigma < MIN_SIGMA {
            return None;
        }
        let radius = kernel_radius(sigma);
        let r = radius as i32;
        let offsets: Box<dyn Iterator<Item = i32>> = match side {
            BlurAxisSide::Symmetric => Box::new(-r..=r),
            BlurAxisSide::Positive => Box::new(0..=r),
            BlurAxisSide::Negative => Box::new((0..=r).map(|v| -v)),
        };

        let denom = 2.0 * f64::from(sigma) * f64::from(sigma);
        let mut raw = SmallVec::<[(i32, f64); 64]>::new();
        let mut sum = 0.0f64;
        for v in offsets {
            let w = (-f64::from(v * v) / denom).exp();
            raw.push((v, w));
            sum += w;
        }
        // The centre tap has weight 1, so `sum >= 1` whenever the kernel is non-empty.
        let taps = raw
            .into_iter()
            .map(|(offset, w)| Tap {
                offset,
                weight: (w / sum) as f32,
            })
            .collect();

        Some(Self {
            sigma,
            radius,
            side,
            taps,
        })
    }

    /// Sigma the kernel was built for.
    pub fn sigma(&self) -> f32 {
        self.sigma
    }

    /// Radius after truncation.
    pub fn radius(&self) -> u32 {
        self.radius
    }

    /// Side the kernel samples.
    pub fn side(&self) -> BlurAxisSide {
        self.side
    }

    /// Number of taps (`2r + 1` symmetric, `r + 1` one-sided).
    pub fn width(&self) -> u32 {
        self.taps.len() as u32
    }

    /// Taps in offset order.
    pub fn taps(&self) -> &[Tap] {
        &self.taps
    }

    /// Sum of the normalized weights.
    pub fn weight_sum(&self) -> f32 {
        self.taps.iter().map(|t| t.weight).sum()
    }

    /// Weighted average of `sample(offset)` over every tap.
    pub fn convolve(&self, mut sample: impl FnMut(i32) -> [f32; 4]) -> [f32; 4] {
        let mut acc = [0.0f32; 4];
        for tap in &self.taps {
            let c = sample(tap.offset);
            for i in 0..4 {
                acc[i] += c[i] * tap.weight;
            }
        }
        acc
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/gaussian.rs"]
mod tests;
