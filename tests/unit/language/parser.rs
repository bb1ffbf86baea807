use super::*;

#[test]
fn parses_helper_and_kernel() {
    let m = parse_module(
        "float twice(float x) { return 2.0 * x; }\n\
         kernel vec4 k(static float arg, sampler src) { return vec4(twice(arg)); }",
    )
    .unwrap();
    assert_eq!(m.functions.len(), 2);
    assert_eq!(m.functions[0].kernel, None);
    assert_eq!(m.functions[1].kernel, Some(KernelTarget::Normal));
    assert_eq!(m.functions[1].ret, Type::Vec4);
    let params = &m.functions[1].params;
    assert_eq!(params.len(), 2);
    assert_eq!((params[0].name.as_str(), params[0].ty, params[0].is_static), ("arg", Type::Float, true));
    assert_eq!((params[1].name.as_str(), params[1].ty, params[1].is_static), ("src", Type::Sampler, false));
}

#[test]
fn parses_reduce_kernel_and_color_alias() {
    let m = parse_module("kernel __reduce void r(__color c) { emit(c); }").unwrap();
    assert_eq!(m.functions[0].kernel, Some(KernelTarget::Reduce));
    assert_eq!(m.functions[0].ret, Type::Void);
    assert_eq!(m.functions[0].params[0].ty, Type::Color);
}

#[test]
fn precedence_binds_multiplication_tighter() {
    let m = parse_module("kernel vec4 k() { float a = 1.0 + 2.0 * 3.0; return vec4(a); }").unwrap();
    let Stmt::Decl { vars, .. } = &m.functions[0].body[0] else {
        panic!("expected declaration");
    };
    let init = vars[0].init.as_ref().unwrap();
    let ExprKind::Binary { op, right, .. } = &init.kind else {
        panic!("expected binary");
    };
    assert_eq!(*op, BinaryOp::Add);
    assert!(matches!(right.kind, ExprKind::Binary { op: BinaryOp::Mul, .. }));
}

#[test]
fn parses_loops_and_swizzle_assignment() {
    let m = parse_module(
        "kernel vec4 k() {\n\
           vec2 pos = destCoord();\n\
           for (int i = 0; i < 3; i++) { pos.yx += 20.0; }\n\
           while (false) { break; }\n\
           do { pos.x -= 1.0; } while (pos.x > 0.0);\n\
           return vec4(pos, 0.0, 1.0);\n\
         }",
    )
    .unwrap();
    let body = &m.functions[0].body;
    assert!(matches!(body[1], Stmt::For { .. }));
    assert!(matches!(body[2], Stmt::While { .. }));
    assert!(matches!(body[3], Stmt::DoWhile { .. }));
    let Stmt::For { body: loop_body, .. } = &body[1] else {
        unreachable!()
    };
    let Stmt::Block(inner) = loop_body.as_ref() else {
        panic!("expected block");
    };
    let Stmt::Expr(e) = &inner[0] else {
        panic!("expected expression statement");
    };
    let ExprKind::Assign { op, target, .. } = &e.kind else {
        panic!("expected assignment");
    };
    assert_eq!(*op, AssignOp::Add);
    assert!(matches!(&target.kind, ExprKind::Swizzle { fields, .. } if fields == "yx"));
}

#[test]
fn void_parameter_list_is_empty() {
    let m = parse_module("kernel vec4 k(void) { return vec4(0.0); }").unwrap();
    assert!(m.functions[0].params.is_empty());
}

#[test]
fn reports_offsets_for_syntax_errors() {
    let src = "kernel vec4 k() { return vec4(1.0) }";
    let err = parse_module(src).unwrap_err();
    assert_eq!(err.offset, src.len() - 1);
    assert!(err.message.contains("expected ';'"));

    let err = parse_module("kernel vec5 k() { }").unwrap_err();
    assert!(err.message.contains("unknown type 'vec5'"));

    let err = parse_module("kernel vec4 k() { return (1.0 + ; }").unwrap_err();
    assert!(err.message.contains("expected an expression"));
}

#[test]
fn moderate_nesting_parses() {
    let src = format!("kernel vec4 k() {{ return vec4({}1.0{}); }}", "(".repeat(40), ")".repeat(40));
    assert!(parse_module(&src).is_ok());
}

#[test]
fn deep_parentheses_are_reported() {
    let src = format!("kernel vec4 k() {{ return vec4({}1.0{}); }}", "(".repeat(2000), ")".repeat(2000));
    let d = parse_module(&src).unwrap_err();
    assert!(d.message.contains("expression nesting"), "{}", d.message);
}

#[test]
fn long_unary_runs_are_reported() {
    let src = format!("kernel vec4 k() {{ return vec4({}1.0); }}", "- ".repeat(5000));
    assert!(parse_module(&src).unwrap_err().message.contains("nesting"));
}

#[test]
fn long_operator_chains_are_reported() {
    let src = format!("kernel vec4 k() {{ float a = {}1.0; return vec4(a); }}", "1.0 + ".repeat(5000));
    assert!(parse_module(&src).unwrap_err().message.contains("nesting"));

    let src = format!("kernel vec4 k() {{ vec4 c = vec4(1.0){}; return c; }}", ".x".repeat(5000));
    assert!(parse_module(&src).unwrap_err().message.contains("nesting"));
}

#[test]
fn deep_blocks_are_reported() {
    let src = format!("kernel vec4 k() {{ {} return vec4(1.0); }}", "{".repeat(5000));
    let d = parse_module(&src).unwrap_err();
    assert!(d.message.contains("statement nesting"), "{}", d.message);
}
