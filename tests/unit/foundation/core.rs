use super::*;

#[test]
fn infinite_extent_matches_convention() {
    let [x, y, w, h] = rect_to_xywh(INFINITE_EXTENT);
    assert_eq!(x, -0.5 * f32::MAX as f64);
    assert_eq!(y, -0.5 * f32::MAX as f64);
    assert_eq!(w, f32::MAX as f64);
    assert_eq!(h, f32::MAX as f64);
    assert!(is_infinite(INFINITE_EXTENT));
    assert!(!is_infinite(rect_xywh(0.0, 0.0, 1e9, 1e9)));
}

#[test]
fn inset_grows_with_negative_margins() {
    let r = inset_extent(rect_xywh(0.0, 0.0, 10.0, 20.0), -2.0, -3.0);
    assert_eq!(rect_to_xywh(r), [-2.0, -3.0, 14.0, 26.0]);

    let collapsed = inset_extent(rect_xywh(0.0, 0.0, 4.0, 4.0), 5.0, 1.0);
    assert_eq!(collapsed.width(), 0.0);
    assert_eq!(collapsed.height(), 2.0);

    assert!(is_infinite(inset_extent(INFINITE_EXTENT, 10.0, 10.0)));
}

#[test]
fn union_ignores_empty_and_absorbs_infinite() {
    let a = rect_xywh(10.0, 10.0, 5.0, 5.0);
    let empty = Rect::ZERO;
    assert_eq!(union_extent(empty, a), a);
    assert_eq!(union_extent(a, empty), a);
    let b = rect_xywh(-5.0, 0.0, 1.0, 1.0);
    assert_eq!(rect_to_xywh(union_extent(a, b)), [-5.0, 0.0, 20.0, 15.0]);
    assert!(is_infinite(union_extent(a, INFINITE_EXTENT)));
}

#[test]
fn intersect_disjoint_is_empty() {
    let a = rect_xywh(0.0, 0.0, 10.0, 10.0);
    let b = rect_xywh(20.0, 20.0, 10.0, 10.0);
    assert!(is_empty_extent(intersect_extent(a, b)));
    assert_eq!(intersect_extent(INFINITE_EXTENT, a), a);
    let c = rect_xywh(5.0, -5.0, 10.0, 10.0);
    assert_eq!(rect_to_xywh(intersect_extent(a, c)), [5.0, 0.0, 5.0, 5.0]);
}

#[test]
fn transform_extent_takes_bounding_box() {
    let r = transform_extent(
        Affine::translate((1.0, 2.0)) * Affine::scale(2.0),
        rect_xywh(0.0, 0.0, 3.0, 4.0),
    );
    assert_eq!(rect_to_xywh(r), [1.0, 2.0, 6.0, 8.0]);
    assert!(is_infinite(transform_extent(
        Affine::scale(0.5),
        INFINITE_EXTENT
    )));
}
