use crate::foundation::core::{Axis, Point};
use crate::foundation::error::{BlurError, BlurResult};
use crate::gradient::curve::Curve;

/// Edge an edge-anchored blur starts from.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlurEdge {
    /// Strong at the top, fading downward.
    Top,
    /// Strong at the bottom, fading upward.
    Bottom,
    /// Strong at the left, fading rightward.
    Left,
    /// Strong at the right, fading leftward.
    Right,
}

impl BlurEdge {
    /// Axis the gradient runs along.
    pub fn axis(self) -> Axis {
        match self {
            Self::Top | Self::Bottom => Axis::Vertical,
            Self::Left | Self::Right => Axis::Horizontal,
        }
    }

    /// `true` for edges at the far end of the canonical top-to-bottom / left-to-right axis.
    fn is_far_edge(self) -> bool {
        matches!(self, Self::Bottom | Self::Right)
    }
}

impl std::str::FromStr for BlurEdge {
    type Err = BlurError;

    fn from_str(s: &str) -> BlurResult<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "top" | "t" => Ok(Self::Top),
            "bottom" | "b" => Ok(Self::Bottom),
            "left" | "l" => Ok(Self::Left),
            "right" | "r" => Ok(Self::Right),
            _ => Err(BlurError::validation(format!("unknown blur edge '{s}'"))),
        }
    }
}

/// Declarative strength ramp: `(stop, value)` pairs along the axis `start -> end`.
///
/// `start` and `end` are normalized positions inside the target rectangle (`(0,0)` top-left,
/// `(1,1)` bottom-right). Positions before the first stop take the first value, positions after
/// the last stop take the last value.
///
/// Immutable once built. Equality is structural and is what strength-texture caching keys on.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(try_from = "GradientBlurSpecDef", into = "GradientBlurSpecDef")]
pub struct GradientBlurSpec {
    stops: Vec<f32>,
    values: Vec<f32>,
    start: Point,
    end: Point,
}

#[derive(serde::Serialize, serde::Deserialize)]
struct GradientBlurSpecDef {
    stops: Vec<f32>,
    values: Vec<f32>,
    start: Point,
    end: Point,
}

impl TryFrom<GradientBlurSpecDef> for GradientBlurSpec {
    type Error = BlurError;

    fn try_from(d: GradientBlurSpecDef) -> BlurResult<Self> {
        Self::new(d.stops, d.values, d.start, d.end)
    }
}

impl From<GradientBlurSpec> for GradientBlurSpecDef {
    fn from(s: GradientBlurSpec) -> Self {
        Self {
            stops: s.stops,
            values: s.values,
            start: s.start,
            end: s.end,
        }
    }
}

impl GradientBlurSpec {
    /// Build a spec from parallel stop/value sequences.
    ///
    /// Mismatched lengths, fewer than two pairs and non-finite numbers are rejected. Stops and
    /// values outside `[0, 1]` are clamped.
    pub fn new(
        stops: Vec<f32>,
        values: Vec<f32>,
        start: Point,
        end: Point,
    ) -> BlurResult<Self> {
        if stops.len() != values.len() {
            return Err(BlurError::validation(format!(
                "gradient spec has {} stops but {} values",
                stops.len(),
                values.len()
            )));
        }
        if stops.len() < 2 {
            return Err(BlurError::validation(
                "gradient spec needs at least 2 stops",
            ));
        }
        if stops.iter().chain(values.iter()).any(|v| !v.is_finite()) {
            return Err(BlurError::validation(
                "gradient stops and values must be finite",
            ));
        }
        if !(start.is_finite() && end.is_finite()) {
            return Err(BlurError::validation(
                "gradient endpoints must be finite",
            ));
        }
        let clamp01 = |v: Vec<f32>| v.into_iter().map(|x| x.clamp(0.0, 1.0)).collect();
        Ok(Self {
            stops: clamp01(stops),
            values: clamp01(values),
            start,
            end,
        })
    }

    /// Start an edge-anchored builder. See [`EdgeBlur`].
    pub fn from_edge(edge: BlurEdge, start: f32) -> EdgeBlur {
        EdgeBlur::new(edge, start)
    }

    /// Ramp positions.
    pub fn stops(&self) -> &[f32] {
        &self.stops
    }

    /// Strength at each stop.
    pub fn values(&self) -> &[f32] {
        &self.values
    }

    /// Normalized axis start point.
    pub fn start(&self) -> Point {
        self.start
    }

    /// Normalized axis end point.
    pub fn end(&self) -> Point {
        self.end
    }

    /// Number of `(stop, value)` pairs.
    pub fn len(&self) -> usize {
        self.stops.len()
    }

    /// Always `false`: a valid spec has at least two pairs.
    pub fn is_empty(&self) -> bool {
        self.stops.is_empty()
    }

    /// Iterate `(stop, value)` pairs in order.
    pub fn pairs(&self) -> impl Iterator<Item = (f32, f32)> + '_ {
        self.stops.iter().copied().zip(self.values.iter().copied())
    }
}

/// Builder for edge-anchored gradient specs.
///
/// `start`/`end` are fractions of the target measured from the anchor edge: `from_edge(Bottom,
/// 0.2)` is at full strength from the bottom edge up to the 20% mark, then fades out toward the
/// top.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct EdgeBlur {
    /// Anchor edge.
    pub edge: BlurEdge,
    /// Start fraction, clamped into `[0, 1]`.
    pub start: f32,
    /// End fraction, clamped into `[0, 1]`.
    #[serde(default = "default_end")]
    pub end: f32,
    /// Curve applied along the sample sequence.
    #[serde(default)]
    pub curve: Curve,
    /// Number of generated stops, clamped into `[2, 64]`.
    #[serde(default = "default_samples")]
    pub samples: u32,
    /// When `true` the ramp is strongest at the anchor edge.
    #[serde(default = "default_strong_at_edge")]
    pub strong_at_edge: bool,
}

/// Minimum generated stop count.
pub const MIN_EDGE_SAMPLES: u32 = 2;
/// Maximum generated stop count.
pub const MAX_EDGE_SAMPLES: u32 = 64;

fn default_end() -> f32 {
    1.0
}

fn default_samples() -> u32 {
    MIN_EDGE_SAMPLES
}

fn default_strong_at_edge() -> bool {
    true
}

impl EdgeBlur {
    /// Builder with default end (1.0), linear curve, 2 samples, strong at edge.
    pub fn new(edge: BlurEdge, start: f32) -> Self {
        Self {
            edge,
            start,
            end: default_end(),
            curve: Curve::Linear,
            samples: default_samples(),
            strong_at_edge: default_strong_at_edge(),
        }
    }

    /// Set the end fraction.
    pub fn with_end(mut self, end: f32) -> Self {
        self.end = end;
        self
    }

    /// Set the curve.
    pub fn with_curve(mut self, curve: Curve) -> Self {
        self.curve = curve;
        self
    }

    /// Set the sample count.
    pub fn with_samples(mut self, samples: u32) -> Self {
        self.samples = samples;
        self
    }

    /// Choose whether the anchor edge is the strong end of the ramp.
    pub fn with_strong_at_edge(mut self, strong: bool) -> Self {
        self.strong_at_edge = strong;
        self
    }

    /// Produce the gradient spec.
    pub fn build(&self) -> GradientBlurSpec {
        let frac = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        let (a, b) = (frac(self.start), frac(self.end));

        // Map every edge onto the canonical top-to-bottom / left-to-right axis.
        let (mut s, mut e) = if self.edge.is_far_edge() {
            (1.0 - b, 1.0 - a)
        } else {
            (a, b)
        };
        if e < s {
            std::mem::swap(&mut s, &mut e);
        }

        let (start, end) = match self.edge.axis() {
            Axis::Vertical => (Point::new(0.5, 0.0), Point::new(0.5, 1.0)),
            Axis::Horizontal => (Point::new(0.0, 0.5), Point::new(1.0, 0.5)),
        };

        let n = self.samples.clamp(MIN_EDGE_SAMPLES, MAX_EDGE_SAMPLES) as usize;
        let last = (n - 1) as f32;
        let mut stops = Vec::with_capacity(n);
        let mut values = Vec::with_capacity(n);
        for i in 0..n {
            let along = i as f32 / last;
            stops.push(s + (e - s) * along);

            // Ramp position is measured from the anchor edge, so far edges read the sequence
            // backwards.
            let t = if self.edge.is_far_edge() {
                1.0 - along
            } else {
                along
            };
            let v = self.curve.transform(t).clamp(0.0, 1.0);
            values.push(if self.strong_at_edge { 1.0 - v } else { v });
        }

        GradientBlurSpec {
            stops,
            values,
            start,
            end,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/gradient/spec.rs"]
mod tests;
