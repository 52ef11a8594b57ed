/// GLSL-style `mix`: `a * (1 - t) + b * t`.
pub(crate) fn mix(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

pub(crate) fn mix4(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [
        mix(a[0], b[0], t),
        mix(a[1], b[1], t),
        mix(a[2], b[2], t),
        mix(a[3], b[3], t),
    ]
}

pub(crate) fn unorm8_to_f32(v: u8) -> f32 {
    f32::from(v) / 255.0
}

pub(crate) fn f32_to_unorm8(v: f32) -> u8 {
    // NaN maps to 0 via the saturating cast.
    (v * 255.0).round().clamp(0.0, 255.0) as u8
}

pub(crate) fn rgba8_to_f32(px: [u8; 4]) -> [f32; 4] {
    px.map(unorm8_to_f32)
}

pub(crate) fn f32_to_rgba8(px: [f32; 4]) -> [u8; 4] {
    px.map(f32_to_unorm8)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
