use crate::foundation::error::{FirtreeError, FirtreeResult};
use crate::language::{ArgumentSpec, Type};
use crate::sampler::Sampler;

/// A value bound to a kernel argument.
#[derive(Clone, Debug)]
pub enum ArgValue {
    /// `bool` argument.
    Bool(bool),
    /// `int` argument.
    Int(i32),
    /// `float` argument.
    Float(f32),
    /// `vec2` argument.
    Vec2([f32; 2]),
    /// `vec3` argument.
    Vec3([f32; 3]),
    /// `vec4` or `color` argument. Colors are premultiplied.
    Vec4([f32; 4]),
    /// `sampler` argument: an upstream node of the graph.
    Sampler(Sampler),
}

impl ArgValue {
    /// Dynamic type of the value.
    pub fn ty(&self) -> Type {
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

    /// The bound sampler, if this is a sampler value.
    pub fn as_sampler(&self) -> Option<&Sampler> {
        match self {
            Self::Sampler(s) => Some(s),
            _ => None,
        }
    }

    /// Convert a dynamically typed host value.
    ///
    /// `null` maps to `None` (unset). Integral numbers that fit `i32` become [`ArgValue::Int`],
    /// other numbers [`ArgValue::Float`]; arrays of 2 to 4 numbers become vectors. Strings,
    /// objects and other arrays are rejected.
    pub fn from_json(value: &serde_json::Value) -> FirtreeResult<Option<Self>> {
        use serde_json::Value as J;
        Ok(Some(match value {
            J::Null => return Ok(None),
            J::Bool(b) => Self::Bool(*b),
            J::Number(n) => match n.as_i64().and_then(|i| i32::try_from(i).ok()) {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN) as f32),
            },
            J::Array(items) => {
                let mut c = [0.0f32; 4];
                if !(2..=4).contains(&items.len()) {
                    return Err(FirtreeError::type_mismatch(format!(
                        "cannot bind an array of {} elements",
                        items.len()
                    )));
                }
                for (slot, item) in c.iter_mut().zip(items) {
                    *slot = item.as_f64().ok_or_else(|| {
                        FirtreeError::type_mismatch(format!("non-numeric vector element {item}"))
                    })? as f32;
                }
                match items.len() {
                    2 => Self::Vec2([c[0], c[1]]),
                    3 => Self::Vec3([c[0], c[1], c[2]]),
                    _ => Self::Vec4(c),
                }
            }
            J::String(_) => return Err(FirtreeError::type_mismatch("cannot bind a string")),
            J::Object(_) => return Err(FirtreeError::type_mismatch("cannot bind an object")),
        }))
    }
}

impl PartialEq for ArgValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Vec2(a), Self::Vec2(b)) => a == b,
            (Self::Vec3(a), Self::Vec3(b)) => a == b,
            (Self::Vec4(a), Self::Vec4(b)) => a == b,
            (Self::Sampler(a), Self::Sampler(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

impl From<bool> for ArgValue {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i32> for ArgValue {
    fn from(v: i32) -> Self {
        Self::Int(v)
    }
}

impl From<f32> for ArgValue {
    fn from(v: f32) -> Self {
        Self::Float(v)
    }
}

impl From<f64> for ArgValue {
    fn from(v: f64) -> Self {
        Self::Float(v as f32)
    }
}

impl From<[f32; 2]> for ArgValue {
    fn from(v: [f32; 2]) -> Self {
        Self::Vec2(v)
    }
}

impl From<[f32; 3]> for ArgValue {
    fn from(v: [f32; 3]) -> Self {
        Self::Vec3(v)
    }
}

impl From<[f32; 4]> for ArgValue {
    fn from(v: [f32; 4]) -> Self {
        Self::Vec4(v)
    }
}

impl From<[f64; 2]> for ArgValue {
    fn from(v: [f64; 2]) -> Self {
        Self::Vec2(v.map(|c| c as f32))
    }
}

impl From<[f64; 3]> for ArgValue {
    fn from(v: [f64; 3]) -> Self {
        Self::Vec3(v.map(|c| c as f32))
    }
}

impl From<[f64; 4]> for ArgValue {
    fn from(v: [f64; 4]) -> Self {
        Self::Vec4(v.map(|c| c as f32))
    }
}

impl From<Sampler> for ArgValue {
    fn from(v: Sampler) -> Self {
        Self::Sampler(v)
    }
}

impl From<&Sampler> for ArgValue {
    fn from(v: &Sampler) -> Self {
        Self::Sampler(v.clone())
    }
}

/// Fit `value` to the declared type of `spec`.
///
/// Ints widen to floats and floats truncate toward zero into ints. Vectors must match in
/// length; `color` takes a `vec4`.
pub(crate) fn coerce(spec: &ArgumentSpec, value: ArgValue) -> FirtreeResult<ArgValue> {
    let coerced = match (spec.ty, value) {
        (Type::Float, ArgValue::Int(i)) => ArgValue::Float(i as f32),
        (Type::Float, v @ ArgValue::Float(_)) => v,
        (Type::Int, ArgValue::Float(f)) => ArgValue::Int(f.trunc() as i32),
        (Type::Int, v @ ArgValue::Int(_)) => v,
        (Type::Bool, v @ ArgValue::Bool(_)) => v,
        (Type::Vec2, v @ ArgValue::Vec2(_)) => v,
        (Type::Vec3, v @ ArgValue::Vec3(_)) => v,
        (Type::Vec4 | Type::Color, v @ ArgValue::Vec4(_)) => v,
        (Type::Sampler, v @ ArgValue::Sampler(_)) => v,
        (ty, v) => {
            return Err(FirtreeError::type_mismatch(format!(
                "argument '{}' is declared {ty} but was given {}",
                spec.name,
                v.ty()
            )));
        }
    };
    Ok(coerced)
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/value.rs"]
mod tests;
