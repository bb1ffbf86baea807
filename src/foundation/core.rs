pub use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Premultiplied RGBA color with `f32` channels.
pub type Rgba = [f32; 4];

/// Fully transparent black.
pub const TRANSPARENT: Rgba = [0.0, 0.0, 0.0, 0.0];

const HALF_F32_MAX: f64 = 0.5 * f32::MAX as f64;

/// Extent reported by samplers that cover the whole plane.
///
/// Origin is `(-0.5 * f32::MAX, -0.5 * f32::MAX)` and size is `f32::MAX` in both axes.
pub const INFINITE_EXTENT: Rect = Rect {
    x0: -HALF_F32_MAX,
    y0: -HALF_F32_MAX,
    x1: HALF_F32_MAX,
    y1: HALF_F32_MAX,
};

/// Build a rectangle from origin and size.
pub fn rect_xywh(x: f64, y: f64, width: f64, height: f64) -> Rect {
    Rect::new(x, y, x + width, y + height)
}

/// `(x, y, width, height)` of a rectangle.
pub fn rect_to_xywh(r: Rect) -> [f64; 4] {
    [r.x0, r.y0, r.width(), r.height()]
}

/// True when `r` is (or contains) the conventional infinite extent.
pub fn is_infinite(r: Rect) -> bool {
    r.width() >= HALF_F32_MAX || r.height() >= HALF_F32_MAX
}

/// True when `r` covers no area.
pub fn is_empty_extent(r: Rect) -> bool {
    !(r.width() > 0.0 && r.height() > 0.0)
}

/// Shrink `r` by `dx`/`dy` on each side. Negative values grow it.
pub fn inset_extent(r: Rect, dx: f64, dy: f64) -> Rect {
    if is_infinite(r) {
        return INFINITE_EXTENT;
    }
    let (mut x0, mut x1) = (r.x0 + dx, r.x1 - dx);
    let (mut y0, mut y1) = (r.y0 + dy, r.y1 - dy);
    if x1 < x0 {
        let mid = 0.5 * (x0 + x1);
        (x0, x1) = (mid, mid);
    }
    if y1 < y0 {
        let mid = 0.5 * (y0 + y1);
        (y0, y1) = (mid, mid);
    }
    Rect::new(x0, y0, x1, y1)
}

/// Smallest rectangle containing both. Empty inputs do not contribute.
pub fn union_extent(a: Rect, b: Rect) -> Rect {
    if is_infinite(a) || is_infinite(b) {
        return INFINITE_EXTENT;
    }
    match (is_empty_extent(a), is_empty_extent(b)) {
        (true, _) => b,
        (_, true) => a,
        _ => a.union(b),
    }
}

/// Geometric intersection; disjoint inputs yield a zero-area rectangle.
pub fn intersect_extent(a: Rect, b: Rect) -> Rect {
    if is_infinite(a) {
        return b;
    }
    if is_infinite(b) {
        return a;
    }
    let x0 = a.x0.max(b.x0);
    let y0 = a.y0.max(b.y0);
    let x1 = a.x1.min(b.x1).max(x0);
    let y1 = a.y1.min(b.y1).max(y0);
    Rect::new(x0, y0, x1, y1)
}

/// Bounding box of `r` mapped through `a`. The infinite extent stays infinite.
pub fn transform_extent(a: Affine, r: Rect) -> Rect {
    if is_infinite(r) {
        return INFINITE_EXTENT;
    }
    a.transform_rect_bbox(r)
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
