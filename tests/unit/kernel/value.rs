use super::*;

fn spec(name: &str, ty: Type) -> ArgumentSpec {
    ArgumentSpec {
        name: name.to_owned(),
        ty,
        is_static: false,
    }
}

#[test]
fn int_widens_to_float() {
    let v = coerce(&spec("x", Type::Float), ArgValue::Int(3)).unwrap();
    assert_eq!(v, ArgValue::Float(3.0));
}

#[test]
fn float_truncates_to_int() {
    let s = spec("n", Type::Int);
    assert_eq!(coerce(&s, ArgValue::Float(3.5)).unwrap(), ArgValue::Int(3));
    assert_eq!(coerce(&s, ArgValue::Float(-2.9)).unwrap(), ArgValue::Int(-2));
}

#[test]
fn vectors_need_exact_length() {
    let err = coerce(&spec("v", Type::Vec2), ArgValue::Vec3([1.0, 2.0, 3.0])).unwrap_err();
    assert!(matches!(err, FirtreeError::TypeMismatch(_)));
    assert!(err.to_string().contains("vec2"));

    let c = coerce(&spec("c", Type::Color), ArgValue::Vec4([1.0; 4])).unwrap();
    assert_eq!(c, ArgValue::Vec4([1.0; 4]));
}

#[test]
fn bool_and_sampler_do_not_convert() {
    assert!(coerce(&spec("b", Type::Bool), ArgValue::Int(1)).is_err());
    assert!(coerce(&spec("s", Type::Sampler), ArgValue::Float(0.0)).is_err());
    assert!(coerce(&spec("f", Type::Float), ArgValue::Sampler(Sampler::empty())).is_err());
}

#[test]
fn json_values_map_to_arguments() {
    use serde_json::json;
    assert_eq!(ArgValue::from_json(&json!(null)).unwrap(), None);
    assert_eq!(
        ArgValue::from_json(&json!(7)).unwrap(),
        Some(ArgValue::Int(7))
    );
    assert_eq!(
        ArgValue::from_json(&json!(0.25)).unwrap(),
        Some(ArgValue::Float(0.25))
    );
    assert_eq!(
        ArgValue::from_json(&json!(true)).unwrap(),
        Some(ArgValue::Bool(true))
    );
    assert_eq!(
        ArgValue::from_json(&json!([1, 2.5, 3])).unwrap(),
        Some(ArgValue::Vec3([1.0, 2.5, 3.0]))
    );
    assert_eq!(
        ArgValue::from_json(&json!(5_000_000_000u64)).unwrap(),
        Some(ArgValue::Float(5.0e9))
    );
}

#[test]
fn json_rejects_strings_objects_and_odd_arrays() {
    use serde_json::json;
    for bad in [json!("hello"), json!({"x": 1}), json!([1]), json!([1, "a"])] {
        assert!(matches!(
            ArgValue::from_json(&bad),
            Err(FirtreeError::TypeMismatch(_))
        ));
    }
}

#[test]
fn samplers_compare_by_identity() {
    let a = Sampler::empty();
    let b = Sampler::empty();
    assert_eq!(ArgValue::from(&a), ArgValue::from(a.clone()));
    assert_ne!(ArgValue::from(&a), ArgValue::from(&b));
}
