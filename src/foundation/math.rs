use crate::foundation::core::Rgba;

/// `premultiplied.rgb = straight.rgb * straight.a`.
pub(crate) fn premultiply(c: Rgba) -> Rgba {
    [c[0] * c[3], c[1] * c[3], c[2] * c[3], c[3]]
}

/// Inverse of [`premultiply`]. Zero alpha yields transparent black.
pub(crate) fn unpremultiply(c: Rgba) -> Rgba {
    if c[3] <= 0.0 {
        return [0.0; 4];
    }
    let inv = 1.0 / c[3];
    [c[0] * inv, c[1] * inv, c[2] * inv, c[3]]
}

/// Porter-Duff source-over on premultiplied colors.
pub(crate) fn over(src: Rgba, dst: Rgba) -> Rgba {
    let k = 1.0 - src[3];
    [
        src[0] + dst[0] * k,
        src[1] + dst[1] * k,
        src[2] + dst[2] * k,
        src[3] + dst[3] * k,
    ]
}

pub(crate) fn lerp4(a: Rgba, b: Rgba, t: f32) -> Rgba {
    [
        a[0] + (b[0] - a[0]) * t,
        a[1] + (b[1] - a[1]) * t,
        a[2] + (b[2] - a[2]) * t,
        a[3] + (b[3] - a[3]) * t,
    ]
}

pub(crate) fn unit_to_u8(v: f32) -> u8 {
    if v.is_nan() {
        return 0;
    }
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

pub(crate) fn u8_to_unit(v: u8) -> f32 {
    f32::from(v) / 255.0
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/math.rs"]
mod tests;
