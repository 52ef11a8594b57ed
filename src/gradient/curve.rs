use crate::foundation::error::{BlurError, BlurResult};

/// Easing curves mapping normalized ramp position `t` in `[0, 1]` to a strength in `[0, 1]`.
///
/// The named Bézier presets use the control points common to UI toolkits, so an edge blur built
/// with `EaseInOut` fades the way a host's `easeInOut` animation would.
#[derive(Clone, Copy, Debug, Default, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Curve {
    /// Identity.
    #[default]
    Linear,
    /// Cubic Bézier `(0.42, 0, 1, 1)`.
    EaseIn,
    /// Cubic Bézier `(0, 0, 0.58, 1)`.
    EaseOut,
    /// Cubic Bézier `(0.42, 0, 0.58, 1)`.
    EaseInOut,
    /// Cubic Bézier `(0.4, 0, 0.2, 1)`.
    FastOutSlowIn,
    /// `1 - (1 - t)^2`.
    Decelerate,
    /// `t^2`.
    InQuad,
    /// `1 - (1 - t)^2`, same shape as `Decelerate`.
    OutQuad,
    /// `t^3`.
    InCubic,
    /// `1 - (1 - t)^3`.
    OutCubic,
    /// Arbitrary cubic Bézier through `(0,0)`, `(x1,y1)`, `(x2,y2)`, `(1,1)`.
    CubicBezier {
        /// First control point x, clamped into `[0, 1]`.
        x1: f32,
        /// First control point y.
        y1: f32,
        /// Second control point x, clamped into `[0, 1]`.
        x2: f32,
        /// Second control point y.
        y2: f32,
    },
}

impl Curve {
    /// Evaluate the curve at `t`. Input is clamped into `[0, 1]`; NaN is treated as 0.
    pub fn transform(self, t: f32) -> f32 {
        let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
        match self {
            Self::Linear => t,
            Self::EaseIn => cubic_bezier(0.42, 0.0, 1.0, 1.0, t),
            Self::EaseOut => cubic_bezier(0.0, 0.0, 0.58, 1.0, t),
            Self::EaseInOut => cubic_bezier(0.42, 0.0, 0.58, 1.0, t),
            Self::FastOutSlowIn => cubic_bezier(0.4, 0.0, 0.2, 1.0, t),
            Self::Decelerate | Self::OutQuad => 1.0 - (1.0 - t) * (1.0 - t),
            Self::InQuad => t * t,
            Self::InCubic => t * t * t,
            Self::OutCubic => 1.0 - (1.0 - t).powi(3),
            Self::CubicBezier { x1, y1, x2, y2 } => {
                cubic_bezier(x1.clamp(0.0, 1.0), y1, x2.clamp(0.0, 1.0), y2, t)
            }
        }
    }
}

impl std::str::FromStr for Curve {
    type Err = BlurError;

    fn from_str(s: &str) -> BlurResult<Self> {
        let key: String = s
            .trim()
            .chars()
            .filter(|c| *c != '-' && *c != '_')
            .flat_map(char::to_lowercase)
            .collect();
        Ok(match key.as_str() {
            "linear" => Self::Linear,
            "easein" => Self::EaseIn,
            "easeout" => Self::EaseOut,
            "easeinout" | "ease" => Self::EaseInOut,
            "fastoutslowin" => Self::FastOutSlowIn,
            "decelerate" => Self::Decelerate,
            "inquad" => Self::InQuad,
            "outquad" => Self::OutQuad,
            "incubic" => Self::InCubic,
            "outcubic" => Self::OutCubic,
            _ => return Err(BlurError::validation(format!("unknown curve '{s}'"))),
        })
    }
}

fn bezier_component(a: f32, b: f32, m: f32) -> f32 {
    3.0 * a * (1.0 - m) * (1.0 - m) * m + 3.0 * b * (1.0 - m) * m * m + m * m * m
}

fn cubic_bezier(x1: f32, y1: f32, x2: f32, y2: f32, t: f32) -> f32 {
    if t <= 0.0 {
        return 0.0;
    }
    if t >= 1.0 {
        return 1.0;
    }
    // x(m) is monotonic for x1, x2 in [0, 1]; bisect for the parameter whose x is t.
    let (mut lo, mut hi) = (0.0f32, 1.0f32);
    let mut mid = 0.5;
    for _ in 0..48 {
        mid = 0.5 * (lo + hi);
        let x = bezier_component(x1, x2, mid);
        if (t - x).abs() < 1e-5 {
            break;
        }
        if x < t {
            lo = mid;
        } else {
            hi = mid;
        }
    }
    bezier_component(y1, y2, mid)
}

#[cfg(test)]
#[path = "../../tests/unit/gradient/curve.rs"]
mod tests;
