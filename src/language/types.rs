use std::fmt;

/// Static types of the kernel language.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    /// No value (function results only).
    Void,
    /// Boolean.
    Bool,
    /// 32-bit signed integer.
    Int,
    /// 32-bit float.
    Float,
    /// Two-component float vector.
    Vec2,
    /// Three-component float vector.
    Vec3,
    /// Four-component float vector.
    Vec4,
    /// Premultiplied RGBA color; a `vec4` inside expressions.
    Color,
    /// Reference to a sampler graph node.
    Sampler,
}

impl Type {
    /// Parse a type keyword. `__color` is accepted as an alias of `color`.
    pub fn from_name(name: &str) -> Option<Self> {
        Some(match name {
            "void" => Self::Void,
            "bool" => Self::Bool,
            "int" => Self::Int,
            "float" => Self::Float,
            "vec2" => Self::Vec2,
            "vec3" => Self::Vec3,
            "vec4" => Self::Vec4,
            "color" | "__color" => Self::Color,
            "sampler" => Self::Sampler,
            _ => return None,
        })
    }

    /// Keyword spelling.
    pub fn name(self) -> &'static str {
        match self {
            Self::Void => "void",
            Self::Bool => "bool",
            Self::Int => "int",
            Self::Float => "float",
            Self::Vec2 => "vec2",
            Self::Vec3 => "vec3",
            Self::Vec4 => "vec4",
            Self::Color => "color",
            Self::Sampler => "sampler",
        }
    }

    /// Type used when the value takes part in an expression.
    pub(crate) fn expr_type(self) -> Self {
        match self {
            Self::Color => Self::Vec4,
            other => other,
        }
    }

    /// Float vector type with `n` components (`n == 1` is `float`).
    pub(crate) fn float_vec(n: usize) -> Option<Self> {
        match n {
            1 => Some(Self::Float),
            2 => Some(Self::Vec2),
            3 => Some(Self::Vec3),
            4 => Some(Self::Vec4),
            _ => None,
        }
    }

    /// Component count of a float scalar/vector, `None` otherwise.
    pub(crate) fn float_width(self) -> Option<usize> {
        match self.expr_type() {
            Self::Float => Some(1),
            Self::Vec2 => Some(2),
            Self::Vec3 => Some(3),
            Self::Vec4 => Some(4),
            _ => None,
        }
    }

    pub(crate) fn is_scalar_numeric(self) -> bool {
        matches!(self, Self::Int | Self::Float)
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// What a compiled kernel produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KernelTarget {
    /// Returns one premultiplied `vec4` per destination pixel.
    Normal,
    /// `__reduce` kernel: returns nothing and calls `emit()`.
    Reduce,
}
