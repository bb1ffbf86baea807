//! Backend-neutral kernel IR: one stack-machine function per source function.

use std::fmt;

use crate::language::builtins::BuiltinId;
use crate::language::types::{KernelTarget, Type};
use crate::language::value::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct ConstIdx(pub(crate) u32);

/// Component selection such as `.yx` (indices into x/y/z/w).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Swizzle {
    pub(crate) idx: [u8; 4],
    pub(crate) len: u8,
}

impl Swizzle {
    pub(crate) fn indices(&self) -> &[u8] {
        &self.idx[..usize::from(self.len)]
    }
}

impl fmt::Display for Swizzle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for &i in self.indices() {
            f.write_str(["x", "y", "z", "w"][usize::from(i)])?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ArithOp {
    Add,
    Sub,
    Mul,
    Div,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum CmpOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Op {
    PushConst(ConstIdx),
    Load(u16),
    /// Pops the top of stack into a local.
    Store(u16),
    /// Pops the top of stack into selected components of a local vector.
    StoreSwizzle { slot: u16, swizzle: Swizzle },
    Swizzle(Swizzle),
    Dup,
    Pop,

    Neg,
    Not,
    Arith(ArithOp),
    Compare(CmpOp),

    /// Convert the int/bool `depth` entries below the top of stack to float.
    ToFloat { depth: u8 },
    ToInt,
    ToBool,
    /// Build a float vector of `width` components from `argc` scalars/vectors.
    Construct { width: u8, argc: u8 },

    CallBuiltin { id: BuiltinId, argc: u8 },
    Call { func: u16, argc: u8 },

    /// Relative jumps: the target is `index_of_this_op + offset`.
    Jump(i32),
    JumpIfFalse(i32),
    JumpIfTrue(i32),

    Return,
    ReturnVoid,
    /// Control reached the end of a non-void function.
    MissingReturn,
}

#[derive(Debug, Clone)]
pub(crate) struct Function {
    pub(crate) name: String,
    pub(crate) params: Vec<Type>,
    pub(crate) ret: Type,
    /// Slot types; parameters occupy the first slots.
    pub(crate) locals: Vec<Type>,
    pub(crate) code: Vec<Op>,
}

/// A declared kernel argument.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct ArgumentSpec {
    /// Declared name.
    pub name: String,
    /// Declared type.
    #[serde(rename = "type")]
    pub ty: Type,
    /// Declared with the `static` qualifier.
    pub is_static: bool,
}

impl ArgumentSpec {
    /// Sampler arguments are the graph edges of a pipeline.
    pub fn is_sampler(&self) -> bool {
        self.ty == Type::Sampler
    }
}

/// A successfully compiled kernel module.
#[derive(Debug, Clone)]
pub struct KernelProgram {
    pub(crate) functions: Vec<Function>,
    pub(crate) consts: Vec<Value>,
    pub(crate) entry: usize,
    pub(crate) target: KernelTarget,
    pub(crate) arguments: Vec<ArgumentSpec>,
}

impl KernelProgram {
    /// Name of the `kernel` function.
    pub fn kernel_name(&self) -> &str {
        &self.functions[self.entry].name
    }

    /// Normal or reduce.
    pub fn target(&self) -> KernelTarget {
        self.target
    }

    /// Kernel arguments in declaration order.
    pub fn arguments(&self) -> &[ArgumentSpec] {
        &self.arguments
    }

    /// Total number of IR instructions across all functions.
    pub fn op_count(&self) -> usize {
        self.functions.iter().map(|f| f.code.len()).sum()
    }
}

fn fmt_const(v: &Value) -> String {
    match v {
        Value::Bool(b) => b.to_string(),
        Value::Int(i) => i.to_string(),
        Value::Float(x) => format!("{x:?}"),
        Value::Vec2(c) => format!("vec2{c:?}"),
        Value::Vec3(c) => format!("vec3{c:?}"),
        Value::Vec4(c) => format!("vec4{c:?}"),
        Value::Sampler(_) => "sampler".to_owned(),
    }
}

impl fmt::Display for KernelProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (fi, func) in self.functions.iter().enumerate() {
            let params = func
                .params
                .iter()
                .map(|t| t.name())
                .collect::<Vec<_>>()
                .join(", ");
            let tag = match (fi == self.entry, self.target) {
                (true, KernelTarget::Normal) => "kernel ",
                (true, KernelTarget::Reduce) => "kernel __reduce ",
                (false, _) => "",
            };
            writeln!(
                f,
                "{tag}{} {}({params}) locals={}",
                func.ret,
                func.name,
                func.locals.len()
            )?;
            for (pc, op) in func.code.iter().enumerate() {
                let text = match op {
                    Op::PushConst(c) => match self.consts.get(c.0 as usize) {
                        Some(v) => format!("const {}", fmt_const(v)),
                        None => format!("const #{}", c.0),
                    },
                    Op::Load(s) => format!("load %{s}"),
                    Op::Store(s) => format!("store %{s}"),
                    Op::StoreSwizzle { slot, swizzle } => format!("store %{slot}.{swizzle}"),
                    Op::Swizzle(s) => format!("swizzle .{s}"),
                    Op::CallBuiltin { id, argc } => format!("builtin {}/{argc}", id.name()),
                    Op::Call { func: callee, argc } => {
                        let name = self
                            .functions
                            .get(usize::from(*callee))
                            .map(|c| c.name.as_str())
                            .unwrap_or("?");
                        format!("call {name}/{argc}")
                    }
                    Op::Jump(o) => format!("jump {}", pc as i64 + i64::from(*o)),
                    Op::JumpIfFalse(o) => format!("jump_if_false {}", pc as i64 + i64::from(*o)),
                    Op::JumpIfTrue(o) => format!("jump_if_true {}", pc as i64 + i64::from(*o)),
                    other => format!("{other:?}").to_lowercase(),
                };
                writeln!(f, "  {pc:04} {text}")?;
            }
        }
        Ok(())
    }
}
