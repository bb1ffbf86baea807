//! Builtin function table: name/overload resolution and the pure math implementations.
//!
//! Sampler access and `emit` need the evaluation host and are executed by the VM.

use crate::foundation::math;
use crate::language::types::Type;
use crate::language::value::{Value, map_components, zip_components};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum BuiltinId {
    Radians,
    Degrees,
    Sin,
    Cos,
    Tan,
    Asin,
    Acos,
    Atan,
    Atan2,
    SinCos,
    CosSin,
    Pow,
    Exp,
    Log,
    Exp2,
    Log2,
    Sqrt,
    InverseSqrt,
    Abs,
    Sign,
    Floor,
    Ceil,
    Fract,
    Mod,
    Min,
    Max,
    Clamp,
    Mix,
    Step,
    Smoothstep,
    Compare,
    Length,
    Distance,
    Dot,
    Cross,
    Normalize,
    Premultiply,
    Unpremultiply,
    DestCoord,
    SamplerCoord,
    SamplerTransform,
    SamplerOrigin,
    SamplerSize,
    SamplerExtent,
    Sample,
    Emit,
}

impl BuiltinId {
    pub(crate) fn name(self) -> &'static str {
        match self {
            Self::Radians => "radians",
            Self::Degrees => "degrees",
            Self::Sin => "sin",
            Self::Cos => "cos",
            Self::Tan => "tan",
            Self::Asin => "asin",
            Self::Acos => "acos",
            Self::Atan | Self::Atan2 => "atan",
            Self::SinCos => "sincos",
            Self::CosSin => "cossin",
            Self::Pow => "pow",
            Self::Exp => "exp",
            Self::Log => "log",
            Self::Exp2 => "exp2",
            Self::Log2 => "log2",
            Self::Sqrt => "sqrt",
            Self::InverseSqrt => "inversesqrt",
            Self::Abs => "abs",
            Self::Sign => "sign",
            Self::Floor => "floor",
            Self::Ceil => "ceil",
            Self::Fract => "fract",
            Self::Mod => "mod",
            Self::Min => "min",
            Self::Max => "max",
            Self::Clamp => "clamp",
            Self::Mix => "mix",
            Self::Step => "step",
            Self::Smoothstep => "smoothstep",
            Self::Compare => "compare",
            Self::Length => "length",
            Self::Distance => "distance",
            Self::Dot => "dot",
            Self::Cross => "cross",
            Self::Normalize => "normalize",
            Self::Premultiply => "premultiply",
            Self::Unpremultiply => "unpremultiply",
            Self::DestCoord => "destCoord",
            Self::SamplerCoord => "samplerCoord",
            Self::SamplerTransform => "samplerTransform",
            Self::SamplerOrigin => "samplerOrigin",
            Self::SamplerSize => "samplerSize",
            Self::SamplerExtent => "samplerExtent",
            Self::Sample => "sample",
            Self::Emit => "emit",
        }
    }
}

/// True for names that resolve to a builtin (used to reject redefinition).
pub(crate) fn is_builtin_name(name: &str) -> bool {
    resolve(name, &[]).is_some()
}

fn is_gen(t: Type) -> bool {
    t.float_width().is_some()
}

fn signature(args: &[Type]) -> String {
    args.iter().map(|t| t.name()).collect::<Vec<_>>().join(", ")
}

/// Resolve `name` called with argument types `args` (ints already promoted to float).
///
/// Returns `None` when `name` is not a builtin, `Some(Err(..))` on an overload mismatch.
pub(crate) fn resolve(name: &str, args: &[Type]) -> Option<Result<(BuiltinId, Type), String>> {
    use BuiltinId as B;

    let unary = |id: BuiltinId| -> Result<(BuiltinId, Type), String> {
        match args {
            [t] if is_gen(*t) => Ok((id, *t)),
            _ => Err(mismatch(name, args)),
        }
    };
    let same2 = |id: BuiltinId| match args {
        [a, b] if is_gen(*a) && a == b => Ok((id, *a)),
        _ => Err(mismatch(name, args)),
    };
    let vec_or_float2 = |id: BuiltinId| match args {
        [a, b] if is_gen(*a) && (a == b || *b == Type::Float) => Ok((id, *a)),
        _ => Err(mismatch(name, args)),
    };

    let r = match name {
        "radians" => unary(B::Radians),
        "degrees" => unary(B::Degrees),
        "sin" | "sin_" => unary(B::Sin),
        "cos" | "cos_" => unary(B::Cos),
        "tan" | "tan_" => unary(B::Tan),
        "asin" => unary(B::Asin),
        "acos" => unary(B::Acos),
        "atan" => {
            if args.len() == 2 {
                same2(B::Atan2)
            } else {
                unary(B::Atan)
            }
        }
        "sincos" | "cossin" => match args {
            [Type::Float] => Ok((
                if name == "sincos" { B::SinCos } else { B::CosSin },
                Type::Vec2,
            )),
            _ => Err(mismatch(name, args)),
        },
        "pow" => same2(B::Pow),
        "exp" => unary(B::Exp),
        "log" => unary(B::Log),
        "exp2" => unary(B::Exp2),
        "log2" => unary(B::Log2),
        "sqrt" => unary(B::Sqrt),
        "inversesqrt" => unary(B::InverseSqrt),
        "abs" => unary(B::Abs),
        "sign" => unary(B::Sign),
        "floor" => unary(B::Floor),
        "ceil" => unary(B::Ceil),
        "fract" => unary(B::Fract),
        "normalize" => unary(B::Normalize),
        "mod" => vec_or_float2(B::Mod),
        "min" => vec_or_float2(B::Min),
        "max" => vec_or_float2(B::Max),
        "step" => match args {
            [e, x] if is_gen(*x) && (e == x || *e == Type::Float) => Ok((B::Step, *x)),
            _ => Err(mismatch(name, args)),
        },
        "clamp" => match args {
            [x, lo, hi] if is_gen(*x) && lo == hi && (lo == x || *lo == Type::Float) => {
                Ok((B::Clamp, *x))
            }
            _ => Err(mismatch(name, args)),
        },
        "mix" => match args {
            [x, y, a] if is_gen(*x) && x == y && (a == x || *a == Type::Float) => {
                Ok((B::Mix, *x))
            }
            _ => Err(mismatch(name, args)),
        },
        "smoothstep" => match args {
            [e0, e1, x] if is_gen(*x) && e0 == e1 && (e0 == x || *e0 == Type::Float) => {
                Ok((B::Smoothstep, *x))
            }
            _ => Err(mismatch(name, args)),
        },
        "compare" => match args {
            [x, y, z] if is_gen(*x) && x == y && y == z => Ok((B::Compare, *x)),
            _ => Err(mismatch(name, args)),
        },
        "length" => match args {
            [t] if is_gen(*t) => Ok((B::Length, Type::Float)),
            _ => Err(mismatch(name, args)),
        },
        "distance" | "dot" => match args {
            [a, b] if is_gen(*a) && a == b => Ok((
                if name == "dot" { B::Dot } else { B::Distance },
                Type::Float,
            )),
            _ => Err(mismatch(name, args)),
        },
        "cross" => match args {
            [Type::Vec3, Type::Vec3] => Ok((B::Cross, Type::Vec3)),
            _ => Err(mismatch(name, args)),
        },
        "premultiply" | "unpremultiply" => match args {
            [Type::Vec4] => Ok((
                if name == "premultiply" { B::Premultiply } else { B::Unpremultiply },
                Type::Vec4,
            )),
            _ => Err(mismatch(name, args)),
        },
        "destCoord" => match args {
            [] => Ok((B::DestCoord, Type::Vec2)),
            _ => Err(mismatch(name, args)),
        },
        "samplerCoord" | "samplerOrigin" | "samplerSize" | "samplerExtent" => match args {
            [Type::Sampler] => Ok(match name {
                "samplerCoord" => (B::SamplerCoord, Type::Vec2),
                "samplerOrigin" => (B::SamplerOrigin, Type::Vec2),
                "samplerSize" => (B::SamplerSize, Type::Vec2),
                _ => (B::SamplerExtent, Type::Vec4),
            }),
            _ => Err(mismatch(name, args)),
        },
        "samplerTransform" | "sample" => match args {
            [Type::Sampler, Type::Vec2] => Ok(if name == "sample" {
                (B::Sample, Type::Vec4)
            } else {
                (B::SamplerTransform, Type::Vec2)
            }),
            _ => Err(mismatch(name, args)),
        },
        "emit" => match args {
            [Type::Vec4] => Ok((B::Emit, Type::Void)),
            _ => Err(mismatch(name, args)),
        },
        _ => return None,
    };
    Some(r)
}

fn mismatch(name: &str, args: &[Type]) -> String {
    format!("no overload of '{name}' accepts ({})", signature(args))
}

fn sign(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }
}

fn dot(a: &Value, b: &Value) -> Option<f32> {
    let (ca, na) = a.components()?;
    let (cb, _) = b.components()?;
    Some((0..na).map(|i| ca[i] * cb[i]).sum())
}

/// Three-operand component-wise helper; one-component operands broadcast.
fn zip3(a: &Value, b: &Value, c: &Value, f: impl Fn(f32, f32, f32) -> f32) -> Option<Value> {
    let (ca, na) = a.components()?;
    let (cb, nb) = b.components()?;
    let (cc, nc) = c.components()?;
    let n = na.max(nb).max(nc);
    let pick = |c: &[f32; 4], w: usize, i: usize| if w == 1 { c[0] } else { c[i] };
    let mut out = [0.0; 4];
    for (i, slot) in out.iter_mut().enumerate().take(n) {
        *slot = f(pick(&ca, na, i), pick(&cb, nb, i), pick(&cc, nc, i));
    }
    Some(Value::from_components(out, n))
}

/// Evaluate a builtin that needs no host. Returns `None` for host builtins or malformed args.
pub(crate) fn eval_pure(id: BuiltinId, args: &[Value]) -> Option<Value> {
    use BuiltinId as B;
    match (id, args) {
        (B::Radians, [x]) => map_components(x, f32::to_radians),
        (B::Degrees, [x]) => map_components(x, f32::to_degrees),
        (B::Sin, [x]) => map_components(x, f32::sin),
        (B::Cos, [x]) => map_components(x, f32::cos),
        (B::Tan, [x]) => map_components(x, f32::tan),
        (B::Asin, [x]) => map_components(x, f32::asin),
        (B::Acos, [x]) => map_components(x, f32::acos),
        (B::Atan, [x]) => map_components(x, f32::atan),
        (B::Atan2, [y, x]) => zip_components(y, x, f32::atan2),
        (B::SinCos, [x]) => x.as_f32().map(|v| Value::Vec2([v.sin(), v.cos()])),
        (B::CosSin, [x]) => x.as_f32().map(|v| Value::Vec2([v.cos(), v.sin()])),
        (B::Pow, [x, y]) => zip_components(x, y, f32::powf),
        (B::Exp, [x]) => map_components(x, f32::exp),
        (B::Log, [x]) => map_components(x, f32::ln),
        (B::Exp2, [x]) => map_components(x, f32::exp2),
        (B::Log2, [x]) => map_components(x, f32::log2),
        (B::Sqrt, [x]) => map_components(x, f32::sqrt),
        (B::InverseSqrt, [x]) => map_components(x, |v| 1.0 / v.sqrt()),
        (B::Abs, [x]) => map_components(x, f32::abs),
        (B::Sign, [x]) => map_components(x, sign),
        (B::Floor, [x]) => map_components(x, f32::floor),
        (B::Ceil, [x]) => map_components(x, f32::ceil),
        (B::Fract, [x]) => map_components(x, |v| v - v.floor()),
        (B::Mod, [x, y]) => zip_components(x, y, |a, b| a - b * (a / b).floor()),
        (B::Min, [x, y]) => zip_components(x, y, f32::min),
        (B::Max, [x, y]) => zip_components(x, y, f32::max),
        (B::Clamp, [x, lo, hi]) => zip3(x, lo, hi, |v, l, h| v.max(l).min(h)),
        (B::Mix, [x, y, a]) => zip3(x, y, a, |p, q, t| p + (q - p) * t),
        (B::Step, [e, x]) => zip_components(e, x, |edge, v| if v < edge { 0.0 } else { 1.0 }),
        (B::Smoothstep, [e0, e1, x]) => zip3(e0, e1, x, |a, b, v| {
            let t = ((v - a) / (b - a)).clamp(0.0, 1.0);
            t * t * (3.0 - 2.0 * t)
        }),
        (B::Compare, [x, y, z]) => zip3(x, y, z, |c, p, q| if c < 0.0 { p } else { q }),
        (B::Length, [x]) => dot(x, x).map(|d| Value::Float(d.sqrt())),
        (B::Distance, [a, b]) => {
            let d = zip_components(a, b, |p, q| p - q)?;
            dot(&d, &d).map(|v| Value::Float(v.sqrt()))
        }
        (B::Dot, [a, b]) => dot(a, b).map(Value::Float),
        (B::Cross, [Value::Vec3(a), Value::Vec3(b)]) => Some(Value::Vec3([
            a[1] * b[2] - a[2] * b[1],
            a[2] * b[0] - a[0] * b[2],
            a[0] * b[1] - a[1] * b[0],
        ])),
        (B::Normalize, [x]) => {
            let len = dot(x, x)?.sqrt();
            if len == 0.0 {
                map_components(x, |_| 0.0)
            } else {
                map_components(x, |v| v / len)
            }
        }
        (B::Premultiply, [Value::Vec4(c)]) => Some(Value::Vec4(math::premultiply(*c))),
        (B::Unpremultiply, [Value::Vec4(c)]) => Some(Value::Vec4(math::unpremultiply(*c))),
        _ => None,
    }
}

#[cfg(test)]
#[path = "../../tests/unit/language/builtins.rs"]
mod tests;
