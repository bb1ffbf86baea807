use super::*;
use crate::foundation::core::rect_xywh;
use crate::kernel::Kernel;
use crate::sampler::{BufferSampler, Sampler};
use crate::transform::affine::AffineTransform;

fn eval_at(sampler: &Sampler, x: f64, y: f64) -> Rgba {
    let opts = RenderOpts::default();
    let plan = GraphPlan::for_sampler(sampler, &opts).unwrap();
    Evaluator::new(&plan, &opts).eval_root(Point::new(x, y)).unwrap()
}

fn checker() -> Sampler {
    let texels = vec![
        [1.0, 0.0, 0.0, 1.0],
        [0.0, 1.0, 0.0, 1.0],
        [0.0, 0.0, 1.0, 1.0],
        [1.0, 1.0, 1.0, 1.0],
    ];
    Sampler::from_buffer(BufferSampler::from_premultiplied(2, 2, texels).unwrap())
}

#[test]
fn dest_coord_is_the_evaluation_point() {
    let k = Kernel::from_source("kernel vec4 at() { vec2 d = destCoord(); return vec4(d.x, d.y, 0.0, 1.0); }");
    let s = Sampler::from_kernel(&k).unwrap();
    assert_eq!(eval_at(&s, 3.5, -2.25), [3.5, -2.25, 0.0, 1.0]);
}

#[test]
fn transform_moves_child_content() {
    let mut t = AffineTransform::identity();
    t.translate(10.0, 0.0);
    let s = checker().transformed(t);
    assert_eq!(eval_at(&s, 10.5, 0.5), [1.0, 0.0, 0.0, 1.0]);
    assert_eq!(eval_at(&s, 11.5, 1.5), [1.0, 1.0, 1.0, 1.0]);
    assert_eq!(eval_at(&s, 0.5, 0.5), [0.0; 4]);
}

#[test]
fn crop_masks_outside_rect() {
    let s = checker().cropped(rect_xywh(1.0, 0.0, 1.0, 2.0));
    assert_eq!(eval_at(&s, 0.5, 0.5), [0.0; 4]);
    assert_eq!(eval_at(&s, 1.5, 0.5), [0.0, 1.0, 0.0, 1.0]);
}

#[test]
fn sampler_coord_follows_input_transform() {
    let mut t = AffineTransform::identity();
    t.scale(2.0, 2.0);
    let k = Kernel::from_source("kernel vec4 pass(sampler src) { return sample(src, samplerCoord(src)); }");
    k.set_argument("src", checker().transformed(t)).unwrap();
    let s = Sampler::from_kernel(&k).unwrap();
    // texel (1, 0) is stretched over [2, 4) x [0, 2)
    assert_eq!(eval_at(&s, 3.0, 1.0), [0.0, 1.0, 0.0, 1.0]);
    assert_eq!(eval_at(&s, 1.0, 3.0), [0.0, 0.0, 1.0, 1.0]);
}

#[test]
fn sampler_extent_is_reported_in_sampler_space() {
    let mut t = AffineTransform::identity();
    t.translate(5.0, 7.0);
    let k = Kernel::from_source("kernel vec4 ext(sampler src) { return samplerExtent(src); }");
    k.set_argument("src", checker().transformed(t)).unwrap();
    let s = Sampler::from_kernel(&k).unwrap();
    assert_eq!(eval_at(&s, 0.0, 0.0), [0.0, 0.0, 2.0, 2.0]);
}

#[test]
fn unbound_sampler_reads_transparent() {
    let k = Kernel::from_source("kernel vec4 pass(sampler src) { return sample(src, samplerCoord(src)) + vec4(0.0, 0.0, 0.0, 0.5); }");
    let s = Sampler::from_kernel(&k).unwrap();
    assert_eq!(eval_at(&s, 1.0, 1.0), [0.0, 0.0, 0.0, 0.5]);
}

#[test]
fn runaway_loop_hits_the_budget() {
    let k = Kernel::from_source(
        "kernel vec4 spin() { float x = 0.0; while (x >= 0.0) { x += 1.0; } return vec4(x); }",
    );
    let s = Sampler::from_kernel(&k).unwrap();
    let opts = RenderOpts::default().with_instruction_budget(10_000);
    let plan = GraphPlan::for_sampler(&s, &opts).unwrap();
    assert!(Evaluator::new(&plan, &opts).eval_root(Point::ORIGIN).is_err());
}

#[test]
fn emit_outside_reduce_is_an_error() {
    let k = Kernel::from_source("kernel __reduce void r() { emit(vec4(1.0)); }");
    let opts = RenderOpts::default();
    let plan = GraphPlan::for_reduce(&k, &opts).unwrap();
    let eval = Evaluator::new(&plan, &opts);

    let mut out = Vec::new();
    eval.run_reduce(Point::new(0.5, 0.5), &mut out).unwrap();
    assert_eq!(out, vec![[1.0; 4]]);
    assert!(eval.eval_root(Point::ORIGIN).is_err());
}

#[test]
fn vm_errors_become_evaluation_errors() {
    let err: FirtreeError = VmError::new("boom").into();
    assert!(matches!(err, FirtreeError::Evaluation(_)));
    assert!(err.to_string().contains("boom"));
}
