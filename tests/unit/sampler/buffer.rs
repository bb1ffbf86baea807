use super::*;
use crate::render::format::PixelFormat;

fn checker() -> BufferSampler {
    // 2x2: red, green / blue, white
    let data = [
        255, 0, 0, 255, 0, 255, 0, 255, //
        0, 0, 255, 255, 255, 255, 255, 255,
    ];
    BufferSampler::new(&data, BufferDesc::packed(2, 2, PixelFormat::Rgba32)).unwrap()
}

fn approx4(a: Rgba, b: Rgba) -> bool {
    a.iter().zip(b).all(|(x, y)| (x - y).abs() < 1e-5)
}

#[test]
fn decodes_pixels_and_reports_extent() {
    let b = checker();
    assert_eq!((b.width(), b.height()), (2, 2));
    assert_eq!(b.pixel(1, 0), Some([0.0, 1.0, 0.0, 1.0]));
    assert_eq!(b.pixel(2, 0), None);
    assert_eq!(b.extent(), Rect::new(0.0, 0.0, 2.0, 2.0));

    let custom = b.with_extent(Rect::new(-1.0, -1.0, 5.0, 5.0));
    assert_eq!(custom.extent(), Rect::new(-1.0, -1.0, 5.0, 5.0));
}

#[test]
fn short_buffer_is_a_format_error() {
    let err = BufferSampler::new(&[0; 15], BufferDesc::packed(2, 2, PixelFormat::Rgba32));
    assert!(matches!(err, Err(FirtreeError::Format(_))));
    assert!(BufferSampler::from_premultiplied(2, 2, vec![TRANSPARENT; 3]).is_err());
}

#[test]
fn empty_buffer_has_zero_extent() {
    let b = BufferSampler::empty();
    assert_eq!(b.extent(), Rect::ZERO);
    assert_eq!(b.store().sample(Point::new(0.5, 0.5), true), TRANSPARENT);
}

#[test]
fn nearest_uses_floor() {
    let s = checker();
    let store = s.store();
    assert_eq!(store.sample_nearest(Point::new(0.5, 0.5)), [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(store.sample_nearest(Point::new(1.99, 0.0)), [0.0, 1.0, 0.0, 1.0]);
    assert_eq!(store.sample_nearest(Point::new(0.2, 1.0)), [0.0, 0.0, 1.0, 1.0]);
    assert_eq!(store.sample_nearest(Point::new(-0.01, 0.5)), TRANSPARENT);
    assert_eq!(store.sample_nearest(Point::new(2.0, 0.5)), TRANSPARENT);
    assert_eq!(store.sample_nearest(Point::new(f64::NAN, 0.5)), TRANSPARENT);
}

#[test]
fn bilinear_hits_texel_centers_exactly() {
    let store = checker().store().clone();
    assert!(approx4(
        store.sample_bilinear(Point::new(0.5, 0.5)),
        [1.0, 0.0, 0.0, 1.0]
    ));
    assert!(approx4(
        store.sample_bilinear(Point::new(1.5, 1.5)),
        [1.0, 1.0, 1.0, 1.0]
    ));
}

#[test]
fn bilinear_blends_neighbours() {
    let store = checker().store().clone();
    let mid = store.sample_bilinear(Point::new(1.0, 0.5));
    assert!(approx4(mid, [0.5, 0.5, 0.0, 1.0]));
    let centre = store.sample_bilinear(Point::new(1.0, 1.0));
    assert!(approx4(centre, [0.5, 0.5, 0.5, 1.0]));
}

#[test]
fn bilinear_fades_to_transparent_at_edges() {
    let store = checker().store().clone();
    let edge = store.sample_bilinear(Point::new(0.0, 0.5));
    assert!(approx4(edge, [0.5, 0.0, 0.0, 0.5]));
    assert_eq!(store.sample_bilinear(Point::new(-1.0, -1.0)), TRANSPARENT);
}

#[test]
fn interpolation_flag_selects_filter() {
    let b = checker();
    assert!(!b.interpolate());
    let smooth = b.clone().with_interpolation(true);
    let p = Point::new(1.0, 0.5);
    assert_eq!(b.store().sample(p, b.interpolate()), [0.0, 1.0, 0.0, 1.0]);
    assert!(approx4(
        smooth.store().sample(p, smooth.interpolate()),
        [0.5, 0.5, 0.0, 1.0]
    ));
}
