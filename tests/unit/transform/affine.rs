use super::*;

fn approx(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-4
}

fn assert_elements(t: &AffineTransform, expected: [f64; 6]) {
    let got = t.elements();
    for (g, e) in got.iter().zip(expected) {
        assert!(approx(*g, e), "got {got:?}, expected {expected:?}");
    }
}

#[test]
fn new_transform_is_identity() {
    let t = AffineTransform::identity();
    assert!(t.is_identity());
    assert_eq!(t.elements(), [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn elements_roundtrip_and_map() {
    let t = AffineTransform::from_elements(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
    assert_eq!(t.elements(), [1.0, 2.0, 3.0, 4.0, 5.0, 6.0]);
    assert!(!t.is_identity());
    assert_eq!(t.transform_point(Point::new(4.0, 5.0)), Point::new(19.0, 38.0));
    assert_eq!(t.transform_size(Size::new(4.0, 5.0)), Size::new(14.0, 32.0));
}

#[test]
fn append_and_prepend_compose_in_order() {
    let t1 = AffineTransform::from_elements(6.0, 5.0, 4.0, 3.0, 2.0, 1.0);

    let mut t2 = AffineTransform::from_elements(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
    t2.append(&t1);
    assert_elements(&t2, [21.0, 32.0, 13.0, 20.0, 62.0, 39.0]);

    let mut t2 = AffineTransform::from_elements(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
    t2.prepend(&t1);
    assert_elements(&t2, [14.0, 11.0, 34.0, 27.0, 9.0, 16.0]);
}

#[test]
fn scale_then_translate() {
    let mut t = AffineTransform::identity();
    t.scale(3.0, 4.0).translate(1.0, 2.0);
    assert_eq!(t.transform_point(Point::new(1.0, 2.0)), Point::new(4.0, 10.0));
    assert_eq!(t.transform_size(Size::new(1.0, 2.0)), Size::new(3.0, 8.0));

    let mut t = AffineTransform::identity();
    t.translate(1.0, 2.0).scale(3.0, 4.0);
    assert_eq!(t.transform_point(Point::new(1.0, 2.0)), Point::new(6.0, 16.0));
}

#[test]
fn invert_roundtrips_to_identity() {
    let mut t = AffineTransform::from_elements(1.0, 2.0, 3.0, 4.0, 5.0, 6.0);
    t.rotate_by_degrees(33.0).scale(0.5, 2.0);
    let original = t;
    t.invert().unwrap();
    t.append(&original);
    assert_elements(&t, [1.0, 0.0, 0.0, 1.0, 0.0, 0.0]);
}

#[test]
fn invert_singular_fails_and_leaves_transform_unchanged() {
    let mut t = AffineTransform::from_elements(1.0, 0.0, 3.0, 0.0, 5.0, 6.0);
    let before = t;
    let err = t.invert().unwrap_err();
    assert!(matches!(err, FirtreeError::SingularTransform(_)));
    assert_eq!(t, before);
}

#[test]
fn rotation_preserves_radius_and_advances_angle() {
    let p = Point::new(3.0, 1.5);
    let r0 = p.to_vec2().hypot();
    let a0 = p.y.atan2(p.x);
    for theta in [
        0.0,
        10f64.to_radians(),
        -10f64.to_radians(),
        128f64.to_radians(),
        -128f64.to_radians(),
        3.0,
        -1.4,
    ] {
        let mut t = AffineTransform::identity();
        t.rotate_by_radians(theta);
        let q = t.transform_point(p);
        assert!(approx(q.to_vec2().hypot(), r0));
        let advanced = (q.y.atan2(q.x) - a0 - theta).rem_euclid(std::f64::consts::TAU);
        assert!(approx(advanced, 0.0) || approx(advanced, std::f64::consts::TAU));
    }
}

#[test]
fn degrees_and_radians_agree() {
    let mut a = AffineTransform::identity();
    a.rotate_by_degrees(90.0);
    let mut b = AffineTransform::identity();
    b.rotate_by_radians(std::f64::consts::FRAC_PI_2);
    assert_elements(&a, b.elements());
    assert_elements(&a, [0.0, -1.0, 1.0, 0.0, 0.0, 0.0]);
}
