//! Kernel handles: compilation state, typed argument binding and change notifications.
//!
//! A [`Kernel`] owns its source, the compiled program and one binding slot per declared
//! argument. Sampler arguments are the edges of the image graph; binding one that would close
//! a cycle is refused.

/// Extent policies for kernel samplers.
pub mod extent;
/// The shared [`Kernel`] handle.
pub mod handle;
/// Argument values and coercion.
pub mod value;

pub use extent::ExtentProvider;
pub use handle::{Kernel, KernelEvent, SubscriptionId};
pub use value::ArgValue;
