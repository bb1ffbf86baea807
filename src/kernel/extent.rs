use std::sync::Arc;

use crate::foundation::core::{INFINITE_EXTENT, Rect, inset_extent, union_extent};
use crate::kernel::handle::Kernel;
use crate::kernel::value::ArgValue;

/// Policy deciding the extent of a kernel sampler.
#[derive(Clone, Default)]
pub enum ExtentProvider {
    /// The whole plane.
    #[default]
    Infinite,
    /// A fixed rectangle.
    Fixed(Rect),
    /// Derived from the kernel's sampler arguments.
    ///
    /// With `sampler` set, the extent of that argument; otherwise the union of every bound
    /// sampler argument, or the whole plane when none is bound. The result is inset by `dx`
    /// and `dy` on each side; negative values grow it, e.g. `-2σ` for a blur.
    Standard {
        /// Name of the sampler argument to follow.
        sampler: Option<String>,
        /// Horizontal inset per side.
        dx: f64,
        /// Vertical inset per side.
        dy: f64,
    },
    /// Caller-computed extent, re-evaluated on every query.
    Custom(Arc<dyn Fn(&Kernel) -> Rect + Send + Sync>),
}

impl ExtentProvider {
    /// Union of the bound sampler arguments, grown by `grow` on every side.
    pub fn grow_inputs(grow: f64) -> Self {
        Self::Standard {
            sampler: None,
            dx: -grow,
            dy: -grow,
        }
    }

    /// Extent of the named sampler argument inset by `dx`, `dy`.
    pub fn from_argument(name: impl Into<String>, dx: f64, dy: f64) -> Self {
        Self::Standard {
            sampler: Some(name.into()),
            dx,
            dy,
        }
    }

    pub(crate) fn resolve(&self, kernel: &Kernel) -> Rect {
        match self {
            Self::Infinite => INFINITE_EXTENT,
            Self::Fixed(r) => *r,
            Self::Standard { sampler, dx, dy } => {
                let base = match sampler {
                    Some(name) => match kernel.argument(name) {
                        Ok(Some(ArgValue::Sampler(s))) => s.extent(),
                        _ => INFINITE_EXTENT,
                    },
                    None => kernel
                        .bound_samplers()
                        .into_iter()
                        .map(|(_, s)| s.extent())
                        .reduce(union_extent)
                        .unwrap_or(INFINITE_EXTENT),
                };
                inset_extent(base, *dx, *dy)
            }
            Self::Custom(f) => f(kernel),
        }
    }
}

impl std::fmt::Debug for ExtentProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Infinite => f.write_str("Infinite"),
            Self::Fixed(r) => f.debug_tuple("Fixed").field(r).finish(),
            Self::Standard { sampler, dx, dy } => f
                .debug_struct("Standard")
                .field("sampler", sampler)
                .field("dx", dx)
                .field("dy", dy)
                .finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/extent.rs"]
mod tests;
