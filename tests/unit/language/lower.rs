use crate::language::compile_source;
use crate::language::types::{KernelTarget, Type};

fn err(src: &str) -> String {
    compile_source(src).unwrap_err().message
}

#[test]
fn compiles_argument_schema_in_order() {
    let p = compile_source(
        "kernel vec4 k(int arg1, static float arg2, sampler src, __color tint) {\n\
           return tint * float(arg1) * arg2 + sample(src, samplerCoord(src));\n\
         }",
    )
    .unwrap();
    assert_eq!(p.kernel_name(), "k");
    assert_eq!(p.target(), KernelTarget::Normal);
    let specs: Vec<_> = p
        .arguments()
        .iter()
        .map(|a| (a.name.as_str(), a.ty, a.is_static))
        .collect();
    assert_eq!(
        specs,
        vec![
            ("arg1", Type::Int, false),
            ("arg2", Type::Float, true),
            ("src", Type::Sampler, false),
            ("tint", Type::Color, false),
        ]
    );
    assert!(p.arguments()[2].is_sampler());
}

#[test]
fn unknown_function_is_a_single_diagnostic() {
    let d = compile_source(
        "kernel vec4 k() { int a = doesNotExist(); return vec4(1,0,0,1); }",
    )
    .unwrap_err();
    assert_eq!(d.line, 1);
    assert!(d.message.contains("undeclared function 'doesNotExist'"));
    assert!(d.to_string().starts_with("1:"));
}

#[test]
fn kernel_tagging_rules() {
    assert!(err("vec4 f() { return vec4(0.0); }").contains("no function tagged 'kernel'"));
    assert!(
        err("kernel vec4 a() { return vec4(0.0); } kernel vec4 b() { return vec4(0.0); }")
            .contains("multiple kernel functions")
    );
    assert!(err("kernel float k() { return 1.0; }").contains("must return vec4"));
    assert!(err("kernel __reduce vec4 k() { return vec4(0.0); }").contains("must return void"));
}

#[test]
fn emit_requires_reduce_target() {
    assert!(
        err("kernel vec4 k() { emit(vec4(0.0)); return vec4(0.0); }")
            .contains("only allowed in the body of a __reduce kernel")
    );
    let p = compile_source("kernel __reduce void k() { emit(vec4(destCoord(), 1, 0)); }").unwrap();
    assert_eq!(p.target(), KernelTarget::Reduce);
}

#[test]
fn type_errors_are_reported() {
    assert!(err("kernel vec4 k() { vec2 a = vec3(1.0); return vec4(0.0); }").contains("initializer has type vec3"));
    assert!(err("kernel vec4 k() { int i = 1.5; return vec4(0.0); }").contains("but int was expected"));
    assert!(err("kernel vec4 k() { return vec4(1.0, 2.0); }").contains("needs 4 components"));
    assert!(err("kernel vec4 k() { if (1.0) { } return vec4(0.0); }").contains("condition must be bool"));
    assert!(err("kernel vec4 k() { vec2 a = vec2(0.0) + vec3(0.0); return vec4(0.0); }").contains("cannot be applied"));
    assert!(err("kernel vec4 k() { return vec4(x); }").contains("undeclared identifier 'x'"));
    assert!(err("kernel vec4 k() { break; return vec4(0.0); }").contains("outside of a loop"));
}

#[test]
fn swizzle_rules() {
    assert!(err("kernel vec4 k() { vec2 p = vec2(0.0); p.xx = vec2(1.0); return vec4(0.0); }").contains("repeats"));
    assert!(err("kernel vec4 k() { vec2 p = vec2(0.0); float z = p.z; return vec4(0.0); }").contains("out of range"));
    assert!(err("kernel vec4 k() { vec4 p = vec4(0.0); vec2 q = p.xg; return vec4(0.0); }").contains("cannot mix"));
    assert!(compile_source("kernel vec4 k() { vec4 c = vec4(0.0); c.rgb = c.bgr; return c.abgr; }").is_ok());
}

#[test]
fn assignments_respect_const_and_samplers() {
    assert!(err("kernel vec4 k() { const float a = 1.0; a = 2.0; return vec4(a); }").contains("const"));
    assert!(err("kernel vec4 k(sampler s) { s = s; return vec4(0.0); }").contains("cannot assign to sampler"));
}

#[test]
fn functions_must_be_defined_before_use() {
    assert!(
        err("kernel vec4 k() { return vec4(later()); } float later() { return 1.0; }")
            .contains("undeclared function 'later'")
    );
    assert!(err("float sin(float x) { return x; } kernel vec4 k() { return vec4(0.0); }").contains("builtin"));
}

#[test]
fn diagnostics_locate_lines() {
    let d = compile_source("kernel vec4 k() {\n  float a = 1.0;\n  return vec4(b);\n}").unwrap_err();
    assert_eq!((d.line, d.column), (3, 15));
}

#[test]
fn ir_dump_lists_functions_and_ops() {
    let p = compile_source(
        "float twice(float x) { return 2.0 * x; }\n\
         kernel vec4 k(static float a) { return vec4(twice(a)); }",
    )
    .unwrap();
    let dump = p.to_string();
    assert!(dump.contains("float twice(float)"));
    assert!(dump.contains("kernel vec4 k(float)"));
    assert!(dump.contains("call twice/1"));
    assert!(p.op_count() > 0);
}
