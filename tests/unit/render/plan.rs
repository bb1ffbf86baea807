use super::*;
use crate::foundation::core::rect_xywh;
use crate::sampler::BufferSampler;
use crate::transform::affine::AffineTransform;

const PASS: &str = "kernel vec4 pass(sampler src) { return sample(src, samplerCoord(src)); }";
const GAIN: &str = "kernel vec4 gain(sampler src, static float k) { return k * sample(src, samplerCoord(src)); }";

fn leaf() -> Sampler {
    Sampler::from_buffer(BufferSampler::solid(4, 4, [1.0, 1.0, 1.0, 1.0]))
}

#[test]
fn shared_nodes_are_planned_once() {
    let shared = leaf();
    let mix = Kernel::from_source(
        "kernel vec4 m(sampler a, sampler b) { return sample(a, samplerCoord(a)) + sample(b, samplerCoord(b)); }",
    );
    mix.set_argument("a", &shared).unwrap();
    mix.set_argument("b", &shared).unwrap();
    let root = Sampler::from_kernel(&mix).unwrap();

    let plan = GraphPlan::for_sampler(&root, &RenderOpts::default()).unwrap();
    assert_eq!(plan.nodes.len(), 2);
    let PlanOp::Kernel { args, .. } = &plan.nodes[plan.root].op else {
        panic!("root should be a kernel");
    };
    assert_eq!(args[0], args[1]);
}

#[test]
fn unbound_sampler_plans_as_none() {
    let k = Kernel::from_source(PASS);
    let plan = GraphPlan::for_sampler(&Sampler::from_kernel(&k).unwrap(), &RenderOpts::default())
        .unwrap();
    let PlanOp::Kernel { args, .. } = &plan.nodes[plan.root].op else {
        panic!("root should be a kernel");
    };
    assert_eq!(args, &vec![Value::Sampler(None)]);
}

#[test]
fn invalid_kernels_anywhere_fail_the_plan() {
    let inner = Kernel::from_source(GAIN);
    inner.set_argument("src", leaf()).unwrap();
    let outer = Kernel::from_source(PASS);
    outer
        .set_argument("src", Sampler::from_kernel(&inner).unwrap())
        .unwrap();
    let root = Sampler::from_kernel(&outer).unwrap();

    let err = GraphPlan::for_sampler(&root, &RenderOpts::default()).err().unwrap();
    assert!(matches!(err, FirtreeError::InvalidGraph(_)));
    assert!(err.to_string().contains("'k'"), "{err}");

    inner.set_argument("k", 0.5).unwrap();
    assert!(GraphPlan::for_sampler(&root, &RenderOpts::default()).is_ok());

    let uncompiled = Sampler::from_kernel(&Kernel::new()).unwrap();
    assert!(matches!(
        GraphPlan::for_sampler(&uncompiled, &RenderOpts::default()),
        Err(FirtreeError::InvalidGraph(_))
    ));
}

#[test]
fn kernel_recompiled_as_reduce_is_rejected() {
    let k = Kernel::from_source(PASS);
    let s = Sampler::from_kernel(&k).unwrap();
    k.compile_from_source("kernel __reduce void r() { emit(vec4(0.0)); }")
        .unwrap();
    assert!(matches!(
        GraphPlan::for_sampler(&s, &RenderOpts::default()),
        Err(FirtreeError::InvalidGraph(_))
    ));
    assert!(GraphPlan::for_reduce(&k, &RenderOpts::default()).is_ok());
    let normal = Kernel::from_source(PASS);
    assert!(GraphPlan::for_reduce(&normal, &RenderOpts::default()).is_err());
}

#[test]
fn depth_limit_is_enforced() {
    let mut s = leaf();
    for _ in 0..10 {
        s = s.transformed(AffineTransform::identity());
    }
    let shallow = RenderOpts::default().with_max_graph_depth(5);
    assert!(matches!(
        GraphPlan::for_sampler(&s, &shallow),
        Err(FirtreeError::InvalidGraph(_))
    ));
    assert!(GraphPlan::for_sampler(&s, &RenderOpts::default()).is_ok());
}

#[test]
fn singular_transform_is_rejected() {
    let s = leaf().transformed(AffineTransform::from_elements(1.0, 0.0, 3.0, 0.0, 5.0, 6.0));
    assert!(matches!(
        GraphPlan::for_sampler(&s, &RenderOpts::default()),
        Err(FirtreeError::SingularTransform(_))
    ));
}

#[test]
fn transforms_compose_into_node_mappings() {
    let mut t = AffineTransform::identity();
    t.scale(2.0, 2.0).translate(10.0, 0.0);
    let s = leaf().transformed(t).cropped(rect_xywh(0.0, 0.0, 12.0, 100.0));
    let plan = GraphPlan::for_sampler(&s, &RenderOpts::default()).unwrap();
    let root = &plan.nodes[plan.root];
    assert_eq!(root.to_world * Point::new(1.0, 1.0), Point::new(12.0, 2.0));
    assert_eq!(root.from_world * Point::new(12.0, 2.0), Point::new(1.0, 1.0));
    assert_eq!(root.extent, rect_xywh(10.0, 0.0, 2.0, 8.0));
}
