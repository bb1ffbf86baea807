use super::*;
use crate::foundation::core::rect_xywh;
use crate::sampler::{BufferSampler, Sampler};

const FIND_RED: &str = r#"
kernel __reduce void findRed(sampler src) {
    vec4 c = sample(src, samplerCoord(src));
    if (c.r > 0.5) {
        emit(vec4(destCoord(), 1.0, 0.0));
    }
}
"#;

#[test]
fn records_come_back_in_scan_order() {
    let texels = vec![
        [1.0, 0.0, 0.0, 1.0],
        [0.0, 0.0, 0.0, 1.0],
        [0.0, 0.0, 0.0, 1.0],
        [1.0, 0.0, 0.0, 1.0],
    ];
    let k = Kernel::from_source(FIND_RED);
    k.set_argument(
        "src",
        Sampler::from_buffer(BufferSampler::from_premultiplied(2, 2, texels).unwrap()),
    )
    .unwrap();

    let records = reduce(&k, rect_xywh(0.0, 0.0, 2.0, 2.0), 2, 2).unwrap();
    assert_eq!(
        records,
        vec![
            ReduceRecord::from([0.5, 0.5, 1.0, 0.0]),
            ReduceRecord::from([1.5, 1.5, 1.0, 0.0]),
        ]
    );
}

#[test]
fn multiple_emits_per_pixel_keep_their_order() {
    let k = Kernel::from_source(
        "kernel __reduce void twice() { emit(vec4(1.0)); emit(vec4(2.0)); }",
    );
    let records = reduce(&k, rect_xywh(0.0, 0.0, 1.0, 1.0), 2, 1).unwrap();
    let tags: Vec<f32> = records.iter().map(|r| r.tag).collect();
    assert_eq!(tags, vec![1.0, 2.0, 1.0, 2.0]);
}

#[test]
fn engine_requires_a_valid_reduce_kernel() {
    let mut engine = ReduceEngine::new();
    assert!(matches!(
        engine.run(rect_xywh(0.0, 0.0, 1.0, 1.0), 1, 1),
        Err(FirtreeError::InvalidGraph(_))
    ));

    engine.set_kernel(Kernel::from_source(
        "kernel vec4 plain() { return vec4(1.0); }",
    ));
    assert!(engine.run(rect_xywh(0.0, 0.0, 1.0, 1.0), 1, 1).is_err());

    engine.set_kernel(Kernel::from_source(FIND_RED));
    assert!(engine.kernel().is_some());
    let none = engine.run(rect_xywh(0.0, 0.0, 4.0, 4.0), 4, 4).unwrap();
    assert!(none.is_empty());
}

#[test]
fn records_serialize_with_named_fields() {
    let json = serde_json::to_value(ReduceRecord::from([1.0, 2.0, 3.0, 4.0])).unwrap();
    assert_eq!(json, serde_json::json!({ "x": 1.0, "y": 2.0, "tag": 3.0, "extra": 4.0 }));
}
