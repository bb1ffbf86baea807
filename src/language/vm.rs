use smallvec::SmallVec;

use crate::foundation::core::Rgba;
use crate::language::builtins::{self, BuiltinId};
use crate::language::bytecode::{ArithOp, CmpOp, KernelProgram, Op};
use crate::language::value::{Value, map_components, zip_components};

#[derive(Debug, Clone)]
pub(crate) struct VmError {
    pub(crate) message: String,
}

impl VmError {
    pub(crate) fn new(msg: impl Into<String>) -> Self {
        Self {
            message: msg.into(),
        }
    }
}

impl std::fmt::Display for VmError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "vm error: {}", self.message)
    }
}

impl std::error::Error for VmError {}

/// Services a running kernel needs from the evaluator.
///
/// Sampler handles are the `Value::Sampler` payloads bound by the host; `None` is an unbound
/// sampler, which reads as transparent black over an infinite, untransformed plane.
pub(crate) trait KernelHost {
    fn dest_coord(&self) -> [f32; 2];
    fn sample(&mut self, sampler: Option<u32>, coord: [f32; 2]) -> Result<Rgba, VmError>;
    /// Destination space to sampler space.
    fn sampler_transform(&self, sampler: Option<u32>, p: [f32; 2]) -> [f32; 2];
    /// Sampler-space extent as `(x, y, width, height)`.
    fn sampler_extent(&self, sampler: Option<u32>) -> [f32; 4];
    fn emit(&mut self, value: Rgba) -> Result<(), VmError>;
}

type Stack = SmallVec<[Value; 16]>;

pub(crate) const MAX_CALL_DEPTH: usize = 64;

/// Run the kernel entry point with `args` bound to its parameters in declaration order.
///
/// `budget` is decremented once per executed instruction, across nested calls.
pub(crate) fn run_kernel(
    program: &KernelProgram,
    args: &[Value],
    host: &mut dyn KernelHost,
    budget: &mut u64,
) -> Result<Option<Value>, VmError> {
    let mut vm = Vm {
        program,
        host,
        budget,
        depth: 0,
    };
    vm.exec(program.entry, args)
}

struct Vm<'a> {
    program: &'a KernelProgram,
    host: &'a mut dyn KernelHost,
    budget: &'a mut u64,
    depth: usize,
}

fn pop(stack: &mut Stack) -> Result<Value, VmError> {
    stack
        .pop()
        .ok_or_else(|| VmError::new("stack underflow"))
}

fn jump_target(site: usize, offset: i32, len: usize) -> Result<usize, VmError> {
    let target = site as i64 + i64::from(offset);
    if target < 0 || target as usize > len {
        return Err(VmError::new(format!("jump target {target} out of range")));
    }
    Ok(target as usize)
}

fn to_float(v: Value) -> Result<Value, VmError> {
    match v {
        Value::Int(i) => Ok(Value::Float(i as f32)),
        Value::Bool(b) => Ok(Value::Float(if b { 1.0 } else { 0.0 })),
        Value::Float(_) => Ok(v),
        other => Err(VmError::new(format!("cannot convert {:?} to float", other.ty()))),
    }
}

fn arith(op: ArithOp, a: Value, b: Value) -> Result<Value, VmError> {
    if let (Value::Int(x), Value::Int(y)) = (a, b) {
        return Ok(Value::Int(match op {
            ArithOp::Add => x.wrapping_add(y),
            ArithOp::Sub => x.wrapping_sub(y),
            ArithOp::Mul => x.wrapping_mul(y),
            ArithOp::Div => x.checked_div(y).unwrap_or(0),
        }));
    }
    let f: fn(f32, f32) -> f32 = match op {
        ArithOp::Add => |x, y| x + y,
        ArithOp::Sub => |x, y| x - y,
        ArithOp::Mul => |x, y| x * y,
        ArithOp::Div => |x, y| x / y,
    };
    zip_components(&a, &b, f).ok_or_else(|| {
        VmError::new(format!(
            "arithmetic on incompatible operands {} and {}",
            a.ty(),
            b.ty()
        ))
    })
}

fn compare(op: CmpOp, a: Value, b: Value) -> Result<bool, VmError> {
    match op {
        CmpOp::Eq => return Ok(a == b),
        CmpOp::Ne => return Ok(a != b),
        _ => {}
    }
    let ord = match (a, b) {
        (Value::Int(x), Value::Int(y)) => x.partial_cmp(&y),
        (Value::Float(x), Value::Float(y)) => x.partial_cmp(&y),
        _ => {
            return Err(VmError::new(format!(
                "cannot order {} and {}",
                a.ty(),
                b.ty()
            )));
        }
    };
    // NaN compares false for every ordering.
    Ok(match ord {
        None => false,
        Some(o) => match op {
            CmpOp::Lt => o.is_lt(),
            CmpOp::Le => o.is_le(),
            CmpOp::Gt => o.is_gt(),
            _ => o.is_ge(),
        },
    })
}

fn sampler_arg(v: &Value) -> Result<Option<u32>, VmError> {
    match *v {
        Value::Sampler(s) => Ok(s),
        other => Err(VmError::new(format!("expected sampler, found {}", other.ty()))),
    }
}

fn vec2_arg(v: &Value) -> Result<[f32; 2], VmError> {
    v.as_vec2()
        .ok_or_else(|| VmError::new(format!("expected vec2, found {}", v.ty())))
}

impl Vm<'_> {
    fn exec(&mut self, func_idx: usize, args: &[Value]) -> Result<Option<Value>, VmError> {
        let program = self.program;
        let func = program
            .functions
            .get(func_idx)
            .ok_or_else(|| VmError::new(format!("function index {func_idx} out of range")))?;
        if args.len() != func.params.len() {
            return Err(VmError::new(format!(
                "'{}' expects {} argument(s), got {}",
                func.name,
                func.params.len(),
                args.len()
            )));
        }
        self.depth += 1;
        if self.depth > MAX_CALL_DEPTH {
            return Err(VmError::new("call depth exceeded"));
        }

        let mut locals: SmallVec<[Value; 16]> = SmallVec::with_capacity(func.locals.len());
        locals.extend_from_slice(args);
        for ty in &func.locals[args.len()..] {
            locals.push(Value::zero(*ty));
        }

        let mut stack = Stack::new();
        let mut pc = 0usize;
        let result = loop {
            if *self.budget == 0 {
                return Err(VmError::new("instruction budget exhausted"));
            }
            *self.budget -= 1;

            let site = pc;
            let op = *func
                .code
                .get(pc)
                .ok_or_else(|| VmError::new(format!("pc {pc} out of range in '{}'", func.name)))?;
            pc += 1;

            match op {
                Op::PushConst(idx) => {
                    let c = program
                        .consts
                        .get(idx.0 as usize)
                        .ok_or_else(|| VmError::new("const idx out of range"))?;
                    stack.push(*c);
                }
                Op::Load(slot) => {
                    let v = locals
                        .get(usize::from(slot))
                        .ok_or_else(|| VmError::new("local slot out of range"))?;
                    stack.push(*v);
                }
                Op::Store(slot) => {
                    let v = pop(&mut stack)?;
                    let dst = locals
                        .get_mut(usize::from(slot))
                        .ok_or_else(|| VmError::new("local slot out of range"))?;
                    *dst = v;
                }
                Op::StoreSwizzle { slot, swizzle } => {
                    let v = pop(&mut stack)?;
                    let dst = locals
                        .get_mut(usize::from(slot))
                        .ok_or_else(|| VmError::new("local slot out of range"))?;
                    let (mut comps, n) = dst
                        .components()
                        .ok_or_else(|| VmError::new("swizzle store into non-vector"))?;
                    let (src, _) = v
                        .components()
                        .ok_or_else(|| VmError::new("swizzle store of non-vector value"))?;
                    for (k, &i) in swizzle.indices().iter().enumerate() {
                        comps[usize::from(i)] = src[k];
                    }
                    *dst = Value::from_components(comps, n);
                }
                Op::Swizzle(swizzle) => {
                    let v = pop(&mut stack)?;
                    let (comps, _) = v
                        .components()
                        .ok_or_else(|| VmError::new("swizzle of non-vector"))?;
                    let mut out = [0.0; 4];
                    for (k, &i) in swizzle.indices().iter().enumerate() {
                        out[k] = comps[usize::from(i)];
                    }
                    stack.push(Value::from_components(out, usize::from(swizzle.len)));
                }
                Op::Dup => {
                    let v = *stack.last().ok_or_else(|| VmError::new("stack underflow"))?;
                    stack.push(v);
                }
                Op::Pop => {
                    pop(&mut stack)?;
                }
                Op::Neg => {
                    let v = pop(&mut stack)?;
                    stack.push(match v {
                        Value::Int(i) => Value::Int(i.wrapping_neg()),
                        other => map_components(&other, |x| -x)
                            .ok_or_else(|| VmError::new("negation of non-numeric value"))?,
                    });
                }
                Op::Not => {
                    let v = pop(&mut stack)?
                        .truthy()
                        .ok_or_else(|| VmError::new("'!' on non-bool"))?;
                    stack.push(Value::Bool(!v));
                }
                Op::Arith(op) => {
                    let b = pop(&mut stack)?;
                    let a = pop(&mut stack)?;
                    stack.push(arith(op, a, b)?);
                }
                Op::Compare(op) => {
                    let b = pop(&mut stack)?;
                    let a = pop(&mut stack)?;
                    stack.push(Value::Bool(compare(op, a, b)?));
                }
                Op::ToFloat { depth } => {
                    let len = stack.len();
                    let i = len
                        .checked_sub(1 + usize::from(depth))
                        .ok_or_else(|| VmError::new("stack underflow"))?;
                    stack[i] = to_float(stack[i])?;
                }
                Op::ToInt => {
                    let v = pop(&mut stack)?;
                    stack.push(match v {
                        Value::Int(_) => v,
                        Value::Float(f) => Value::Int(f as i32),
                        Value::Bool(b) => Value::Int(i32::from(b)),
                        other => {
                            return Err(VmError::new(format!("cannot convert {} to int", other.ty())));
                        }
                    });
                }
                Op::ToBool => {
                    let v = pop(&mut stack)?;
                    stack.push(match v {
                        Value::Bool(_) => v,
                        Value::Int(i) => Value::Bool(i != 0),
                        Value::Float(f) => Value::Bool(f != 0.0),
                        other => {
                            return Err(VmError::new(format!("cannot convert {} to bool", other.ty())));
                        }
                    });
                }
                Op::Construct { width, argc } => {
                    let argc = usize::from(argc);
                    let start = stack
                        .len()
                        .checked_sub(argc)
                        .ok_or_else(|| VmError::new("stack underflow"))?;
                    let mut comps: SmallVec<[f32; 4]> = SmallVec::new();
                    for v in stack.drain(start..) {
                        let (c, n) = v
                            .components()
                            .ok_or_else(|| VmError::new("vector constructor of non-numeric"))?;
                        comps.extend_from_slice(&c[..n]);
                    }
                    let width = usize::from(width);
                    let mut out = [0.0; 4];
                    if comps.len() == 1 {
                        out = [comps[0]; 4];
                    } else if comps.len() == width {
                        out[..width].copy_from_slice(&comps);
                    } else {
                        return Err(VmError::new("vector constructor component count mismatch"));
                    }
                    stack.push(Value::from_components(out, width));
                }
                Op::CallBuiltin { id, argc } => {
                    let start = stack
                        .len()
                        .checked_sub(usize::from(argc))
                        .ok_or_else(|| VmError::new("stack underflow"))?;
                    let args: SmallVec<[Value; 4]> = stack.drain(start..).collect();
                    if let Some(v) = self.call_builtin(id, &args)? {
                        stack.push(v);
                    }
                }
                Op::Call { func: callee, argc } => {
                    let start = stack
                        .len()
                        .checked_sub(usize::from(argc))
                        .ok_or_else(|| VmError::new("stack underflow"))?;
                    let args: SmallVec<[Value; 8]> = stack.drain(start..).collect();
                    if let Some(v) = self.exec(usize::from(callee), &args)? {
                        stack.push(v);
                    }
                }
                Op::Jump(offset) => {
                    pc = jump_target(site, offset, func.code.len())?;
                }
                Op::JumpIfFalse(offset) => {
                    let c = pop(&mut stack)?
                        .truthy()
                        .ok_or_else(|| VmError::new("branch on non-bool"))?;
                    if !c {
                        pc = jump_target(site, offset, func.code.len())?;
                    }
                }
                Op::JumpIfTrue(offset) => {
                    let c = pop(&mut stack)?
                        .truthy()
                        .ok_or_else(|| VmError::new("branch on non-bool"))?;
                    if c {
                        pc = jump_target(site, offset, func.code.len())?;
                    }
                }
                Op::Return => break Some(pop(&mut stack)?),
                Op::ReturnVoid => break None,
                Op::MissingReturn => {
                    return Err(VmError::new(format!(
                        "'{}' reached its end without returning a value",
                        func.name
                    )));
                }
            }
        };
        self.depth -= 1;
        Ok(result)
    }

    fn call_builtin(&mut self, id: BuiltinId, args: &[Value]) -> Result<Option<Value>, VmError> {
        use BuiltinId as B;
        let v = match (id, args) {
            (B::DestCoord, []) => Value::Vec2(self.host.dest_coord()),
            (B::SamplerCoord, [s]) => {
                let dest = self.host.dest_coord();
                Value::Vec2(self.host.sampler_transform(sampler_arg(s)?, dest))
            }
            (B::SamplerTransform, [s, p]) => {
                Value::Vec2(self.host.sampler_transform(sampler_arg(s)?, vec2_arg(p)?))
            }
            (B::SamplerOrigin, [s]) => {
                let [x, y, _, _] = self.host.sampler_extent(sampler_arg(s)?);
                Value::Vec2([x, y])
            }
            (B::SamplerSize, [s]) => {
                let [_, _, w, h] = self.host.sampler_extent(sampler_arg(s)?);
                Value::Vec2([w, h])
            }
            (B::SamplerExtent, [s]) => Value::Vec4(self.host.sampler_extent(sampler_arg(s)?)),
            (B::Sample, [s, p]) => Value::Vec4(self.host.sample(sampler_arg(s)?, vec2_arg(p)?)?),
            (B::Emit, [v]) => {
                let c = v
                    .as_vec4()
                    .ok_or_else(|| VmError::new("emit expects a vec4"))?;
                self.host.emit(c)?;
                return Ok(None);
            }
            _ => builtins::eval_pure(id, args).ok_or_else(|| {
                VmError::new(format!("bad arguments for builtin '{}'", id.name()))
            })?,
        };
        Ok(Some(v))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/language/vm.rs"]
mod tests;
