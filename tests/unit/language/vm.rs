use super::*;
use crate::language::compile_source;

struct TestHost {
    dest: [f32; 2],
    emitted: Vec<Rgba>,
}

impl TestHost {
    fn at(x: f32, y: f32) -> Self {
        Self {
            dest: [x, y],
            emitted: Vec::new(),
        }
    }
}

impl KernelHost for TestHost {
    fn dest_coord(&self) -> [f32; 2] {
        self.dest
    }

    fn sample(&mut self, sampler: Option<u32>, coord: [f32; 2]) -> Result<Rgba, VmError> {
        Ok(match sampler {
            Some(_) => [coord[0], coord[1], 0.0, 1.0],
            None => [0.0; 4],
        })
    }

    fn sampler_transform(&self, sampler: Option<u32>, p: [f32; 2]) -> [f32; 2] {
        match sampler {
            Some(_) => [p[0] - 10.0, p[1]],
            None => p,
        }
    }

    fn sampler_extent(&self, _sampler: Option<u32>) -> [f32; 4] {
        [1.0, 2.0, 4.0, 8.0]
    }

    fn emit(&mut self, value: Rgba) -> Result<(), VmError> {
        self.emitted.push(value);
        Ok(())
    }
}

fn run(src: &str, args: &[Value]) -> Result<Option<Value>, VmError> {
    let p = compile_source(src).unwrap();
    let mut host = TestHost::at(3.5, 4.5);
    let mut budget = 100_000;
    run_kernel(&p, args, &mut host, &mut budget)
}

fn color(src: &str, args: &[Value]) -> [f32; 4] {
    run(src, args).unwrap().unwrap().as_vec4().unwrap()
}

#[test]
fn arithmetic_promotes_ints() {
    let c = color(
        "kernel vec4 k(float a, int b) { return vec4(a * b, b / 2, 1, 0.5); }",
        &[Value::Float(1.5), Value::Int(3)],
    );
    assert_eq!(c, [4.5, 1.0, 1.0, 0.5]);
}

#[test]
fn loops_accumulate() {
    let c = color(
        "kernel vec4 k() {\n\
           float s = 0.0;\n\
           for (int i = 0; i < 4; i++) { s += float(i); }\n\
           float n = 0.0;\n\
           for (float d = -2.0; d <= 2.0; d += 1.0) n += 1.0;\n\
           int w = 0;\n\
           while (true) { w++; if (w == 3) { continue; } if (w > 5) { break; } }\n\
           int dw = 10;\n\
           do { dw -= 1; } while (dw > 100);\n\
           return vec4(s, n, float(w), float(dw));\n\
         }",
        &[],
    );
    assert_eq!(c, [6.0, 5.0, 6.0, 9.0]);
}

#[test]
fn swizzle_compound_assignment() {
    let c = color(
        "kernel vec4 k() { vec2 p = vec2(1.0, 2.0); p.yx += 20.0; vec4 o = vec4(p, 0.0, 1.0); o.ba = o.xy; return o; }",
        &[],
    );
    assert_eq!(c, [21.0, 22.0, 21.0, 22.0]);
}

#[test]
fn increments_and_ternary() {
    let c = color(
        "kernel vec4 k() {\n\
           int i = 0; int a = i++; int b = ++i;\n\
           float t = (b > 1) ? 1 : 0.5;\n\
           return vec4(float(a), float(b), float(i), t);\n\
         }",
        &[],
    );
    assert_eq!(c, [0.0, 2.0, 2.0, 1.0]);
}

#[test]
fn logical_operators_short_circuit() {
    let c = color(
        "kernel vec4 k() {\n\
           int hits = 0;\n\
           bool a = false && (++hits > 0);\n\
           bool b = true || (++hits > 0);\n\
           bool c = true && (++hits > 0);\n\
           return vec4(float(hits), float(a), float(b), float(c));\n\
         }",
        &[],
    );
    assert_eq!(c, [1.0, 0.0, 1.0, 1.0]);
}

#[test]
fn helper_functions_and_builtins() {
    let c = color(
        "float twice(float x) { return 2.0 * x; }\n\
         vec2 swap(vec2 v) { return v.yx; }\n\
         kernel vec4 k() { return vec4(twice(1.5), swap(vec2(7, 8)), clamp(5.0, 0.0, 1.0)); }",
        &[],
    );
    assert_eq!(c, [3.0, 8.0, 7.0, 1.0]);
}

#[test]
fn sampler_builtins_go_through_host() {
    let c = color(
        "kernel vec4 k(sampler src) { return sample(src, samplerCoord(src)); }",
        &[Value::Sampler(Some(0))],
    );
    assert_eq!(c, [-6.5, 4.5, 0.0, 1.0]);

    let c = color(
        "kernel vec4 k(sampler src) { return sample(src, samplerCoord(src)); }",
        &[Value::Sampler(None)],
    );
    assert_eq!(c, [0.0; 4]);

    let c = color(
        "kernel vec4 k(sampler src) { return vec4(samplerOrigin(src), samplerSize(src)) + samplerExtent(src); }",
        &[Value::Sampler(Some(1))],
    );
    assert_eq!(c, [2.0, 4.0, 8.0, 16.0]);

    let c = color("kernel vec4 k() { return vec4(destCoord(), 0, 1); }", &[]);
    assert_eq!(c, [3.5, 4.5, 0.0, 1.0]);
}

#[test]
fn reduce_emits_in_source_order() {
    let p = compile_source(
        "kernel __reduce void k() { emit(vec4(destCoord(), 1, 0)); emit(vec4(destCoord(), 2, 0)); }",
    )
    .unwrap();
    let mut host = TestHost::at(1.5, 2.5);
    let mut budget = 1000;
    assert_eq!(run_kernel(&p, &[], &mut host, &mut budget).unwrap(), None);
    assert_eq!(host.emitted, vec![[1.5, 2.5, 1.0, 0.0], [1.5, 2.5, 2.0, 0.0]]);
}

#[test]
fn infinite_loop_exhausts_budget() {
    let p = compile_source("kernel vec4 k() { while (true) { } return vec4(0.0); }").unwrap();
    let mut host = TestHost::at(0.0, 0.0);
    let mut budget = 500;
    let e = run_kernel(&p, &[], &mut host, &mut budget).unwrap_err();
    assert!(e.message.contains("budget"));
}

#[test]
fn missing_return_is_a_runtime_error() {
    let e = run(
        "float f(float x) { if (x > 0.0) { return 1.0; } }\n\
         kernel vec4 k() { return vec4(f(-1.0)); }",
        &[],
    )
    .unwrap_err();
    assert!(e.message.contains("without returning"));
}
