use crate::language::types::Type;

/// Runtime value held in VM locals, on the operand stack and in bound arguments.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(crate) enum Value {
    Bool(bool),
    Int(i32),
    Float(f32),
    Vec2([f32; 2]),
    Vec3([f32; 3]),
    Vec4([f32; 4]),
    /// Sampler reference resolved by the host; `None` is an unbound sampler.
    Sampler(Option<u32>),
}

impl Value {
    pub(crate) fn zero(ty: Type) -> Self {
        match ty.expr_type() {
            Type::Bool => Self::Bool(false),
            Type::Int => Self::Int(0),
            Type::Vec2 => Self::Vec2([0.0; 2]),
            Type::Vec3 => Self::Vec3([0.0; 3]),
            Type::Vec4 => Self::Vec4([0.0; 4]),
            Type::Sampler => Self::Sampler(None),
            _ => Self::Float(0.0),
        }
    }

    pub(crate) fn ty(&self) -> Type {
        match self {
            Self::Bool(_) => Type::Bool,
            Self::Int(_) => Type::Int,
            Self::Float(_) => Type::Float,
            Self::Vec2(_) => Type::Vec2,
            Self::Vec3(_) => Type::Vec3,
            Self::Vec4(_) => Type::Vec4,
            Self::Sampler(_) => Type::Sampler,
        }
    }

    /// Float components of a scalar or vector, padded with zeros.
    pub(crate) fn components(&self) -> Option<([f32; 4], usize)> {
        Some(match *self {
            Self::Float(v) => ([v, 0.0, 0.0, 0.0], 1),
            Self::Vec2([x, y]) => ([x, y, 0.0, 0.0], 2),
            Self::Vec3([x, y, z]) => ([x, y, z, 0.0], 3),
            Self::Vec4(v) => (v, 4),
            _ => return None,
        })
    }

    pub(crate) fn from_components(c: [f32; 4], n: usize) -> Self {
        match n {
            1 => Self::Float(c[0]),
            2 => Self::Vec2([c[0], c[1]]),
            3 => Self::Vec3([c[0], c[1], c[2]]),
            _ => Self::Vec4(c),
        }
    }

    pub(crate) fn as_f32(&self) -> Option<f32> {
        match *self {
            Self::Float(v) => Some(v),
            Self::Int(v) => Some(v as f32),
            Self::Bool(v) => Some(if v { 1.0 } else { 0.0 }),
            _ => None,
        }
    }

    pub(crate) fn as_vec2(&self) -> Option<[f32; 2]> {
        match *self {
            Self::Vec2(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn as_vec4(&self) -> Option<[f32; 4]> {
        match *self {
            Self::Vec4(v) => Some(v),
            _ => None,
        }
    }

    pub(crate) fn truthy(&self) -> Option<bool> {
        match *self {
            Self::Bool(v) => Some(v),
            _ => None,
        }
    }
}

/// Component-wise map over the float components of `v`.
pub(crate) fn map_components(v: &Value, f: impl Fn(f32) -> f32) -> Option<Value> {
    let (c, n) = v.components()?;
    let mut out = [0.0; 4];
    for i in 0..n {
        out[i] = f(c[i]);
    }
    Some(Value::from_components(out, n))
}

/// Component-wise combination; a one-component operand broadcasts.
pub(crate) fn zip_components(a: &Value, b: &Value, f: impl Fn(f32, f32) -> f32) -> Option<Value> {
    let (ca, na) = a.components()?;
    let (cb, nb) = b.components()?;
    if na != nb && na != 1 && nb != 1 {
        return None;
    }
    let n = na.max(nb);
    let mut out = [0.0; 4];
    for (i, slot) in out.iter_mut().enumerate().take(n) {
        let x = if na == 1 { ca[0] } else { ca[i] };
        let y = if nb == 1 { cb[0] } else { cb[i] };
        *slot = f(x, y);
    }
    Some(Value::from_components(out, n))
}

#[cfg(test)]
#[path = "../../tests/unit/language/value.rs"]
mod tests;
