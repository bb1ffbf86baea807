//! Type checking and lowering of the parsed module into [`KernelProgram`] bytecode.

use std::collections::HashMap;

use crate::language::ast::{
    AssignOp, BinaryOp, Expr, ExprKind, FunctionDef, Lit, Module, Stmt, UnaryOp,
};
use crate::language::builtins::{self, BuiltinId};
use crate::language::bytecode::{
    ArgumentSpec, ArithOp, CmpOp, ConstIdx, Function, KernelProgram, Op, Swizzle,
};
use crate::language::error::Diagnostic;
use crate::language::types::{KernelTarget, Type};
use crate::language::value::Value;

pub(crate) fn lower_module(module: &Module) -> Result<KernelProgram, Diagnostic> {
    let kernels: Vec<&FunctionDef> = module
        .functions
        .iter()
        .filter(|f| f.kernel.is_some())
        .collect();
    let kernel = match kernels.as_slice() {
        [] => return Err(Diagnostic::new(0, "no function tagged 'kernel' was found")),
        [k] => *k,
        [first, second, ..] => {
            return Err(Diagnostic::new(
                second.offset,
                format!(
                    "multiple kernel functions ('{}' and '{}')",
                    first.name, second.name
                ),
            ));
        }
    };

    let mut lw = Lowerer {
        functions: Vec::new(),
        by_name: HashMap::new(),
        consts: Vec::new(),
    };
    let mut entry = 0;
    for def in &module.functions {
        let idx = lw.lower_function(def)?;
        if def.kernel.is_some() {
            entry = idx;
        }
    }

    let arguments = kernel
        .params
        .iter()
        .map(|p| ArgumentSpec {
            name: p.name.clone(),
            ty: p.ty,
            is_static: p.is_static,
        })
        .collect();

    Ok(KernelProgram {
        functions: lw.functions,
        consts: lw.consts,
        entry,
        target: kernel.kernel.unwrap_or(KernelTarget::Normal),
        arguments,
    })
}

struct Lowerer {
    functions: Vec<Function>,
    by_name: HashMap<String, usize>,
    consts: Vec<Value>,
}

#[derive(Debug, Clone, Copy)]
struct Local {
    slot: u16,
    ty: Type,
    is_const: bool,
}

#[derive(Default)]
struct LoopCtx {
    breaks: Vec<usize>,
    continues: Vec<usize>,
}

struct FnCtx {
    name: String,
    ret: Type,
    target: Option<KernelTarget>,
    scopes: Vec<HashMap<String, Local>>,
    locals: Vec<Type>,
    code: Vec<Op>,
    loops: Vec<LoopCtx>,
}

impl FnCtx {
    fn lookup(&self, name: &str) -> Option<Local> {
        self.scopes.iter().rev().find_map(|s| s.get(name).copied())
    }

    fn declare(
        &mut self,
        name: &str,
        ty: Type,
        is_const: bool,
        offset: usize,
    ) -> Result<u16, Diagnostic> {
        let scope = self
            .scopes
            .last_mut()
            .ok_or_else(|| Diagnostic::new(offset, "internal error: no open scope"))?;
        if scope.contains_key(name) {
            return Err(Diagnostic::new(
                offset,
                format!("redeclaration of '{name}' in the same scope"),
            ));
        }
        let slot = u16::try_from(self.locals.len())
            .map_err(|_| Diagnostic::new(offset, "too many local variables"))?;
        self.locals.push(ty);
        scope.insert(name.to_owned(), Local { slot, ty, is_const });
        Ok(slot)
    }

    fn emit(&mut self, op: Op) -> usize {
        self.code.push(op);
        self.code.len() - 1
    }

    fn here(&self) -> usize {
        self.code.len()
    }

    /// Point the jump at `site` to `target`.
    fn patch(&mut self, site: usize, target: usize) {
        let rel = target as i32 - site as i32;
        self.code[site] = match self.code[site] {
            Op::Jump(_) => Op::Jump(rel),
            Op::JumpIfFalse(_) => Op::JumpIfFalse(rel),
            Op::JumpIfTrue(_) => Op::JumpIfTrue(rel),
            other => other,
        };
    }

    fn jump_to(&mut self, target: usize) {
        let site = self.here();
        self.emit(Op::Jump(target as i32 - site as i32));
    }
}

fn type_err(offset: usize, msg: impl Into<String>) -> Diagnostic {
    Diagnostic::new(offset, msg)
}

fn arith_name(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Eq => "==",
        BinaryOp::Ne => "!=",
        BinaryOp::Lt => "<",
        BinaryOp::Le => "<=",
        BinaryOp::Gt => ">",
        BinaryOp::Ge => ">=",
        BinaryOp::And => "&&",
        BinaryOp::Or => "||",
    }
}

fn parse_swizzle(fields: &str, width: usize, offset: usize) -> Result<Swizzle, Diagnostic> {
    const SETS: [&str; 3] = ["xyzw", "rgba", "stpq"];
    if fields.is_empty() || fields.len() > 4 {
        return Err(type_err(offset, format!("invalid component selection '.{fields}'")));
    }
    let set = fields
        .chars()
        .next()
        .and_then(|c| SETS.iter().find(|s| s.contains(c)))
        .ok_or_else(|| type_err(offset, format!("invalid component selection '.{fields}'")))?;
    let mut idx = [0u8; 4];
    for (i, c) in fields.chars().enumerate() {
        let pos = set.find(c).ok_or_else(|| {
            type_err(offset, format!("cannot mix component sets in '.{fields}'"))
        })?;
        if pos >= width {
            return Err(type_err(
                offset,
                format!("component '{c}' is out of range for a {width}-component vector"),
            ));
        }
        idx[i] = pos as u8;
    }
    Ok(Swizzle {
        idx,
        len: fields.len() as u8,
    })
}

/// Result type of `l op r` for arithmetic after int→float promotion, or `None`.
fn arith_result(l: Type, r: Type) -> Option<Type> {
    match (l, r) {
        (Type::Int, Type::Int) => Some(Type::Int),
        _ => {
            let (lw, rw) = (l.float_width()?, r.float_width()?);
            if lw == rw || rw == 1 {
                Some(l)
            } else if lw == 1 {
                Some(r)
            } else {
                None
            }
        }
    }
}

impl Lowerer {
    fn add_const(&mut self, v: Value) -> ConstIdx {
        if let Some(i) = self.consts.iter().position(|c| *c == v) {
            return ConstIdx(i as u32);
        }
        self.consts.push(v);
        ConstIdx((self.consts.len() - 1) as u32)
    }

    fn lower_function(&mut self, def: &FunctionDef) -> Result<usize, Diagnostic> {
        if self.by_name.contains_key(&def.name) {
            return Err(type_err(
                def.offset,
                format!("redefinition of function '{}'", def.name),
            ));
        }
        if builtins::is_builtin_name(&def.name) || Type::from_name(&def.name).is_some() {
            return Err(type_err(
                def.offset,
                format!("'{}' is a builtin and cannot be redefined", def.name),
            ));
        }
        if def.ret == Type::Sampler {
            return Err(type_err(def.offset, "functions cannot return a sampler"));
        }
        match def.kernel {
            Some(KernelTarget::Normal) if def.ret.expr_type() != Type::Vec4 => {
                return Err(type_err(
                    def.offset,
                    format!(
                        "kernel '{}' must return vec4, not {}",
                        def.name, def.ret
                    ),
                ));
            }
            Some(KernelTarget::Reduce) if def.ret != Type::Void => {
                return Err(type_err(
                    def.offset,
                    format!("__reduce kernel '{}' must return void", def.name),
                ));
            }
            _ => {}
        }

        let mut fx = FnCtx {
            name: def.name.clone(),
            ret: def.ret,
            target: def.kernel,
            scopes: vec![HashMap::new()],
            locals: Vec::new(),
            code: Vec::new(),
            loops: Vec::new(),
        };
        for p in &def.params {
            if p.ty == Type::Void {
                return Err(type_err(p.offset, format!("parameter '{}' cannot be void", p.name)));
            }
            if p.is_static && def.kernel.is_none() {
                return Err(type_err(
                    p.offset,
                    "'static' is only allowed on kernel arguments",
                ));
            }
            fx.declare(&p.name, p.ty, false, p.offset)?;
        }

        for stmt in &def.body {
            self.stmt(&mut fx, stmt)?;
        }
        if fx.ret == Type::Void {
            fx.emit(Op::ReturnVoid);
        } else {
            fx.emit(Op::MissingReturn);
        }

        let idx = self.functions.len();
        self.functions.push(Function {
            name: def.name.clone(),
            params: def.params.iter().map(|p| p.ty).collect(),
            ret: def.ret,
            locals: fx.locals,
            code: fx.code,
        });
        self.by_name.insert(def.name.clone(), idx);
        Ok(idx)
    }

    // ---- statements ----

    fn stmt(&mut self, fx: &mut FnCtx, stmt: &Stmt) -> Result<(), Diagnostic> {
        match stmt {
            Stmt::Empty => Ok(()),
            Stmt::Expr(e) => {
                let t = self.expr(fx, e)?;
                if t != Type::Void {
                    fx.emit(Op::Pop);
                }
                Ok(())
            }
            Stmt::Block(stmts) => {
                fx.scopes.push(HashMap::new());
                for s in stmts {
                    self.stmt(fx, s)?;
                }
                fx.scopes.pop();
                Ok(())
            }
            Stmt::Decl {
                ty,
                is_const,
                vars,
                offset,
            } => {
                if *ty == Type::Void {
                    return Err(type_err(*offset, "variables cannot be void"));
                }
                if *ty == Type::Sampler {
                    return Err(type_err(
                        *offset,
                        "sampler variables can only be declared as arguments",
                    ));
                }
                for var in vars {
                    match &var.init {
                        Some(init) => {
                            let got = self.expr(fx, init)?;
                            self.coerce(fx, got, ty.expr_type(), init.offset, "initializer")?;
                        }
                        None if *is_const => {
                            return Err(type_err(
                                var.offset,
                                format!("const variable '{}' needs an initializer", var.name),
                            ));
                        }
                        None => {
                            let c = self.add_const(Value::zero(*ty));
                            fx.emit(Op::PushConst(c));
                        }
                    }
                    let slot = fx.declare(&var.name, *ty, *is_const, var.offset)?;
                    fx.emit(Op::Store(slot));
                }
                Ok(())
            }
            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                self.condition(fx, cond)?;
                let to_else = fx.emit(Op::JumpIfFalse(0));
                self.scoped_stmt(fx, then)?;
                match otherwise {
                    Some(other) => {
                        let to_end = fx.emit(Op::Jump(0));
                        let else_start = fx.here();
                        fx.patch(to_else, else_start);
                        self.scoped_stmt(fx, other)?;
                        let end = fx.here();
                        fx.patch(to_end, end);
                    }
                    None => {
                        let end = fx.here();
                        fx.patch(to_else, end);
                    }
                }
                Ok(())
            }
            Stmt::While { cond, body } => {
                let start = fx.here();
                self.condition(fx, cond)?;
                let exit = fx.emit(Op::JumpIfFalse(0));
                fx.loops.push(LoopCtx::default());
                self.scoped_stmt(fx, body)?;
                fx.jump_to(start);
                let end = fx.here();
                fx.patch(exit, end);
                self.close_loop(fx, start, end);
                Ok(())
            }
            Stmt::DoWhile { body, cond } => {
                let start = fx.here();
                fx.loops.push(LoopCtx::default());
                self.scoped_stmt(fx, body)?;
                let cond_start = fx.here();
                self.condition(fx, cond)?;
                let back = fx.here();
                fx.emit(Op::JumpIfTrue(start as i32 - back as i32));
                let end = fx.here();
                self.close_loop(fx, cond_start, end);
                Ok(())
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
            } => {
                fx.scopes.push(HashMap::new());
                if let Some(init) = init {
                    self.stmt(fx, init)?;
                }
                let start = fx.here();
                let exit = match cond {
                    Some(c) => {
                        self.condition(fx, c)?;
                        Some(fx.emit(Op::JumpIfFalse(0)))
                    }
                    None => None,
                };
                fx.loops.push(LoopCtx::default());
                self.scoped_stmt(fx, body)?;
                let step_start = fx.here();
                if let Some(step) = step {
                    let t = self.expr(fx, step)?;
                    if t != Type::Void {
                        fx.emit(Op::Pop);
                    }
                }
                fx.jump_to(start);
                let end = fx.here();
                if let Some(exit) = exit {
                    fx.patch(exit, end);
                }
                self.close_loop(fx, step_start, end);
                fx.scopes.pop();
                Ok(())
            }
            Stmt::Break(offset) => {
                let site = fx.emit(Op::Jump(0));
                fx.loops
                    .last_mut()
                    .ok_or_else(|| type_err(*offset, "'break' outside of a loop"))?
                    .breaks
                    .push(site);
                Ok(())
            }
            Stmt::Continue(offset) => {
                let site = fx.emit(Op::Jump(0));
                fx.loops
                    .last_mut()
                    .ok_or_else(|| type_err(*offset, "'continue' outside of a loop"))?
                    .continues
                    .push(site);
                Ok(())
            }
            Stmt::Return { value, offset } => {
                match (value, fx.ret) {
                    (None, Type::Void) => {
                        fx.emit(Op::ReturnVoid);
                    }
                    (None, ret) => {
                        return Err(type_err(
                            *offset,
                            format!("function '{}' must return a {ret}", fx.name),
                        ));
                    }
                    (Some(_), Type::Void) => {
                        return Err(type_err(
                            *offset,
                            format!("void function '{}' cannot return a value", fx.name),
                        ));
                    }
                    (Some(v), ret) => {
                        let got = self.expr(fx, v)?;
                        self.coerce(fx, got, ret.expr_type(), v.offset, "return value")?;
                        fx.emit(Op::Return);
                    }
                }
                Ok(())
            }
        }
    }

    fn scoped_stmt(&mut self, fx: &mut FnCtx, stmt: &Stmt) -> Result<(), Diagnostic> {
        fx.scopes.push(HashMap::new());
        let r = self.stmt(fx, stmt);
        fx.scopes.pop();
        r
    }

    fn close_loop(&mut self, fx: &mut FnCtx, continue_target: usize, end: usize) {
        if let Some(ctx) = fx.loops.pop() {
            for site in ctx.breaks {
                fx.patch(site, end);
            }
            for site in ctx.continues {
                fx.patch(site, continue_target);
            }
        }
    }

    fn condition(&mut self, fx: &mut FnCtx, cond: &Expr) -> Result<(), Diagnostic> {
        let t = self.expr(fx, cond)?;
        if t != Type::Bool {
            return Err(type_err(
                cond.offset,
                format!("condition must be bool, found {t}"),
            ));
        }
        Ok(())
    }

    /// Make the value on top of the stack (of type `got`) usable as `want`.
    fn coerce(
        &mut self,
        fx: &mut FnCtx,
        got: Type,
        want: Type,
        offset: usize,
        what: &str,
    ) -> Result<(), Diagnostic> {
        if got == want {
            return Ok(());
        }
        if got == Type::Int && want == Type::Float {
            fx.emit(Op::ToFloat { depth: 0 });
            return Ok(());
        }
        Err(type_err(
            offset,
            format!("{what} has type {got} but {want} was expected"),
        ))
    }

    // ---- expressions ----

    /// Lower `e` into a detached chunk. Chunks are position independent.
    fn expr_chunk(&mut self, fx: &mut FnCtx, e: &Expr) -> Result<(Vec<Op>, Type), Diagnostic> {
        let saved = std::mem::take(&mut fx.code);
        let r = self.expr(fx, e);
        let chunk = std::mem::replace(&mut fx.code, saved);
        Ok((chunk, r?))
    }

    fn expr(&mut self, fx: &mut FnCtx, e: &Expr) -> Result<Type, Diagnostic> {
        match &e.kind {
            ExprKind::Lit(lit) => {
                let v = match *lit {
                    Lit::Int(v) => Value::Int(i32::try_from(v).map_err(|_| {
                        type_err(e.offset, format!("integer literal {v} is out of range"))
                    })?),
                    Lit::Float(v) => Value::Float(v as f32),
                    Lit::Bool(v) => Value::Bool(v),
                };
                let ty = v.ty();
                let c = self.add_const(v);
                fx.emit(Op::PushConst(c));
                Ok(ty)
            }
            ExprKind::Var(name) => {
                let local = fx.lookup(name).ok_or_else(|| {
                    type_err(e.offset, format!("undeclared identifier '{name}'"))
                })?;
                fx.emit(Op::Load(local.slot));
                Ok(local.ty.expr_type())
            }
            ExprKind::Unary { op, expr } => {
                let t = self.expr(fx, expr)?;
                match op {
                    UnaryOp::Neg if t == Type::Int || t.float_width().is_some() => {
                        fx.emit(Op::Neg);
                        Ok(t)
                    }
                    UnaryOp::Not if t == Type::Bool => {
                        fx.emit(Op::Not);
                        Ok(t)
                    }
                    UnaryOp::Neg => Err(type_err(e.offset, format!("cannot negate a {t}"))),
                    UnaryOp::Not => Err(type_err(e.offset, format!("'!' needs a bool, found {t}"))),
                }
            }
            ExprKind::Binary { op, left, right } => self.binary(fx, *op, left, right, e.offset),
            ExprKind::Ternary {
                cond,
                then,
                otherwise,
            } => {
                self.condition(fx, cond)?;
                let (mut a, mut ta) = self.expr_chunk(fx, then)?;
                let (mut b, mut tb) = self.expr_chunk(fx, otherwise)?;
                if ta == Type::Int && tb == Type::Float {
                    a.push(Op::ToFloat { depth: 0 });
                    ta = Type::Float;
                } else if tb == Type::Int && ta == Type::Float {
                    b.push(Op::ToFloat { depth: 0 });
                    tb = Type::Float;
                }
                if ta != tb || ta == Type::Void {
                    return Err(type_err(
                        e.offset,
                        format!("conditional branches have different types ({ta} and {tb})"),
                    ));
                }
                // cond ? a : b  =>  jif(+len(a)+2) a jump(+len(b)+1) b
                fx.emit(Op::JumpIfFalse(a.len() as i32 + 2));
                fx.code.extend(a);
                fx.emit(Op::Jump(b.len() as i32 + 1));
                fx.code.extend(b);
                Ok(ta)
            }
            ExprKind::Call { func, args } => self.call(fx, func, args, e.offset),
            ExprKind::Swizzle { base, fields } => {
                let t = self.expr(fx, base)?;
                let width = match t {
                    Type::Vec2 | Type::Vec3 | Type::Vec4 => t.float_width().unwrap_or(4),
                    _ => {
                        return Err(type_err(
                            e.offset,
                            format!("cannot select components '.{fields}' of a {t}"),
                        ));
                    }
                };
                let swz = parse_swizzle(fields, width, e.offset)?;
                fx.emit(Op::Swizzle(swz));
                Ok(Type::float_vec(usize::from(swz.len)).unwrap_or(Type::Float))
            }
            ExprKind::Assign { op, target, value } => self.assign(fx, *op, target, value, e.offset),
            ExprKind::Step {
                target,
                increment,
                prefix,
            } => {
                let (local, swizzle) = self.lvalue(fx, target)?;
                if swizzle.is_some() || !matches!(local.ty, Type::Int | Type::Float) {
                    return Err(type_err(
                        e.offset,
                        "'++'/'--' need an int or float variable",
                    ));
                }
                let one = self.add_const(if local.ty == Type::Int {
                    Value::Int(1)
                } else {
                    Value::Float(1.0)
                });
                let op = if *increment { ArithOp::Add } else { ArithOp::Sub };
                fx.emit(Op::Load(local.slot));
                if *prefix {
                    fx.emit(Op::PushConst(one));
                    fx.emit(Op::Arith(op));
                    fx.emit(Op::Dup);
                    fx.emit(Op::Store(local.slot));
                } else {
                    fx.emit(Op::Dup);
                    fx.emit(Op::PushConst(one));
                    fx.emit(Op::Arith(op));
                    fx.emit(Op::Store(local.slot));
                }
                Ok(local.ty)
            }
        }
    }

    fn binary(
        &mut self,
        fx: &mut FnCtx,
        op: BinaryOp,
        left: &Expr,
        right: &Expr,
        offset: usize,
    ) -> Result<Type, Diagnostic> {
        if matches!(op, BinaryOp::And | BinaryOp::Or) {
            let lt = self.expr(fx, left)?;
            if lt != Type::Bool {
                return Err(type_err(left.offset, format!("'{}' needs bool operands", arith_name(op))));
            }
            let (chunk, rt) = self.expr_chunk(fx, right)?;
            if rt != Type::Bool {
                return Err(type_err(right.offset, format!("'{}' needs bool operands", arith_name(op))));
            }
            // short circuit: dup; jump_if(+len+2); pop; right
            fx.emit(Op::Dup);
            let skip = chunk.len() as i32 + 2;
            fx.emit(if op == BinaryOp::And {
                Op::JumpIfFalse(skip)
            } else {
                Op::JumpIfTrue(skip)
            });
            fx.emit(Op::Pop);
            fx.code.extend(chunk);
            return Ok(Type::Bool);
        }

        let mut lt = self.expr(fx, left)?;
        let mut rt = self.expr(fx, right)?;
        if lt == Type::Int && rt != Type::Int && rt.float_width().is_some() {
            fx.emit(Op::ToFloat { depth: 1 });
            lt = Type::Float;
        } else if rt == Type::Int && lt != Type::Int && lt.float_width().is_some() {
            fx.emit(Op::ToFloat { depth: 0 });
            rt = Type::Float;
        }

        let incompatible = || {
            type_err(
                offset,
                format!(
                    "operator '{}' cannot be applied to {lt} and {rt}",
                    arith_name(op)
                ),
            )
        };

        match op {
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div => {
                let t = arith_result(lt, rt).ok_or_else(incompatible)?;
                fx.emit(Op::Arith(match op {
                    BinaryOp::Add => ArithOp::Add,
                    BinaryOp::Sub => ArithOp::Sub,
                    BinaryOp::Mul => ArithOp::Mul,
                    _ => ArithOp::Div,
                }));
                Ok(t)
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                if lt != rt || !lt.is_scalar_numeric() {
                    return Err(incompatible());
                }
                fx.emit(Op::Compare(match op {
                    BinaryOp::Lt => CmpOp::Lt,
                    BinaryOp::Le => CmpOp::Le,
                    BinaryOp::Gt => CmpOp::Gt,
                    _ => CmpOp::Ge,
                }));
                Ok(Type::Bool)
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                if lt != rt || matches!(lt, Type::Sampler | Type::Void) {
                    return Err(incompatible());
                }
                fx.emit(Op::Compare(if op == BinaryOp::Eq {
                    CmpOp::Eq
                } else {
                    CmpOp::Ne
                }));
                Ok(Type::Bool)
            }
            BinaryOp::And | BinaryOp::Or => Err(incompatible()),
        }
    }

    /// Resolve an assignable expression: a local, optionally with a write swizzle.
    fn lvalue(&self, fx: &FnCtx, target: &Expr) -> Result<(Local, Option<Swizzle>), Diagnostic> {
        let (name, fields) = match &target.kind {
            ExprKind::Var(name) => (name, None),
            ExprKind::Swizzle { base, fields } => match &base.kind {
                ExprKind::Var(name) => (name, Some(fields)),
                _ => return Err(type_err(target.offset, "expression is not assignable")),
            },
            _ => return Err(type_err(target.offset, "expression is not assignable")),
        };
        let local = fx
            .lookup(name)
            .ok_or_else(|| type_err(target.offset, format!("undeclared identifier '{name}'")))?;
        if local.is_const {
            return Err(type_err(
                target.offset,
                format!("cannot assign to const variable '{name}'"),
            ));
        }
        if local.ty == Type::Sampler {
            return Err(type_err(
                target.offset,
                format!("cannot assign to sampler '{name}'"),
            ));
        }
        let swizzle = match fields {
            None => None,
            Some(fields) => {
                let width = match local.ty.expr_type() {
                    t @ (Type::Vec2 | Type::Vec3 | Type::Vec4) => t.float_width().unwrap_or(4),
                    t => {
                        return Err(type_err(
                            target.offset,
                            format!("cannot select components '.{fields}' of a {t}"),
                        ));
                    }
                };
                let swz = parse_swizzle(fields, width, target.offset)?;
                let idx = swz.indices();
                if (1..idx.len()).any(|i| idx[..i].contains(&idx[i])) {
                    return Err(type_err(
                        target.offset,
                        format!("component '.{fields}' repeats in an assignment"),
                    ));
                }
                Some(swz)
            }
        };
        Ok((local, swizzle))
    }

    fn assign(
        &mut self,
        fx: &mut FnCtx,
        op: AssignOp,
        target: &Expr,
        value: &Expr,
        offset: usize,
    ) -> Result<Type, Diagnostic> {
        let (local, swizzle) = self.lvalue(fx, target)?;
        let target_ty = match swizzle {
            Some(s) => Type::float_vec(usize::from(s.len)).unwrap_or(Type::Float),
            None => local.ty.expr_type(),
        };

        if op == AssignOp::Set {
            let got = self.expr(fx, value)?;
            self.coerce(fx, got, target_ty, value.offset, "assigned value")?;
        } else {
            fx.emit(Op::Load(local.slot));
            if let Some(s) = swizzle {
                fx.emit(Op::Swizzle(s));
            }
            let mut rt = self.expr(fx, value)?;
            if rt == Type::Int && target_ty != Type::Int {
                fx.emit(Op::ToFloat { depth: 0 });
                rt = Type::Float;
            }
            if arith_result(target_ty, rt) != Some(target_ty) {
                return Err(type_err(
                    offset,
                    format!("cannot combine {target_ty} with {rt} in compound assignment"),
                ));
            }
            fx.emit(Op::Arith(match op {
                AssignOp::Add => ArithOp::Add,
                AssignOp::Sub => ArithOp::Sub,
                AssignOp::Mul => ArithOp::Mul,
                _ => ArithOp::Div,
            }));
        }

        fx.emit(Op::Dup);
        match swizzle {
            Some(swizzle) => fx.emit(Op::StoreSwizzle {
                slot: local.slot,
                swizzle,
            }),
            None => fx.emit(Op::Store(local.slot)),
        };
        Ok(target_ty)
    }

    fn call(
        &mut self,
        fx: &mut FnCtx,
        func: &str,
        args: &[Expr],
        offset: usize,
    ) -> Result<Type, Diagnostic> {
        let argc = u8::try_from(args.len())
            .map_err(|_| type_err(offset, "too many call arguments"))?;

        // user functions
        if let Some(&idx) = self.by_name.get(func) {
            let params = self.functions[idx].params.clone();
            let ret = self.functions[idx].ret;
            if params.len() != args.len() {
                return Err(type_err(
                    offset,
                    format!(
                        "'{func}' expects {} argument(s) but {} were given",
                        params.len(),
                        args.len()
                    ),
                ));
            }
            for (arg, want) in args.iter().zip(&params) {
                let got = self.expr(fx, arg)?;
                self.coerce(fx, got, want.expr_type(), arg.offset, "argument")?;
            }
            fx.emit(Op::Call {
                func: idx as u16,
                argc,
            });
            return Ok(ret.expr_type());
        }

        // casts and constructors
        match func {
            "float" | "int" | "bool" => {
                let [arg] = args else {
                    return Err(type_err(offset, format!("'{func}' takes one argument")));
                };
                let t = self.expr(fx, arg)?;
                if !matches!(t, Type::Int | Type::Float | Type::Bool) {
                    return Err(type_err(offset, format!("cannot convert {t} to {func}")));
                }
                let (op, out) = match func {
                    "float" => (Op::ToFloat { depth: 0 }, Type::Float),
                    "int" => (Op::ToInt, Type::Int),
                    _ => (Op::ToBool, Type::Bool),
                };
                fx.emit(op);
                return Ok(out);
            }
            "vec2" | "vec3" | "vec4" | "color" => {
                let width = match func {
                    "vec2" => 2,
                    "vec3" => 3,
                    _ => 4,
                };
                let mut total = 0usize;
                for arg in args {
                    let t = self.expr(fx, arg)?;
                    let n = match t {
                        Type::Int | Type::Bool => {
                            fx.emit(Op::ToFloat { depth: 0 });
                            1
                        }
                        other => other.float_width().ok_or_else(|| {
                            type_err(arg.offset, format!("cannot build {func} from a {other}"))
                        })?,
                    };
                    total += n;
                }
                let broadcast = args.len() == 1 && total == 1;
                if total != width && !broadcast {
                    return Err(type_err(
                        offset,
                        format!("{func} needs {width} components but {total} were given"),
                    ));
                }
                fx.emit(Op::Construct {
                    width: width as u8,
                    argc,
                });
                return Type::float_vec(width)
                    .ok_or_else(|| type_err(offset, "invalid vector width"));
            }
            _ => {}
        }

        // builtins
        if builtins::resolve(func, &[]).is_none() {
            return Err(type_err(offset, format!("undeclared function '{func}'")));
        }
        let mut types = Vec::with_capacity(args.len());
        for arg in args {
            let t = match self.expr(fx, arg)? {
                Type::Int => {
                    fx.emit(Op::ToFloat { depth: 0 });
                    Type::Float
                }
                t => t,
            };
            types.push(t);
        }
        let (id, ret) = builtins::resolve(func, &types)
            .unwrap_or_else(|| Err(format!("undeclared function '{func}'")))
            .map_err(|m| type_err(offset, m))?;
        if id == BuiltinId::Emit && fx.target != Some(KernelTarget::Reduce) {
            return Err(type_err(
                offset,
                "'emit' is only allowed in the body of a __reduce kernel",
            ));
        }
        fx.emit(Op::CallBuiltin { id, argc });
        Ok(ret)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/language/lower.rs"]
mod tests;
