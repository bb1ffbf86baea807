use super::*;

#[test]
fn zero_values_follow_type() {
    assert_eq!(Value::zero(Type::Color), Value::Vec4([0.0; 4]));
    assert_eq!(Value::zero(Type::Int), Value::Int(0));
    assert_eq!(Value::zero(Type::Sampler), Value::Sampler(None));
}

#[test]
fn zip_broadcasts_scalars() {
    let v = Value::Vec3([1.0, 2.0, 3.0]);
    let s = Value::Float(2.0);
    assert_eq!(zip_components(&v, &s, |a, b| a * b), Some(Value::Vec3([2.0, 4.0, 6.0])));
    assert_eq!(zip_components(&s, &v, |a, b| a - b), Some(Value::Vec3([1.0, 0.0, -1.0])));
    assert_eq!(zip_components(&v, &Value::Vec2([1.0, 1.0]), |a, b| a + b), None);
    assert_eq!(zip_components(&Value::Bool(true), &s, |a, b| a + b), None);
}

#[test]
fn map_keeps_width() {
    let v = Value::Vec2([-1.5, 2.5]);
    assert_eq!(map_components(&v, f32::abs), Some(Value::Vec2([1.5, 2.5])));
}
