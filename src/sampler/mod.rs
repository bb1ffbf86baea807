//! The image graph.
//!
//! A [`Sampler`] is an immutable, shareable node: an empty plane, a decoded pixel buffer,
//! a kernel, an affine remap or a crop of another sampler, or the contents of an
//! accumulation canvas. Nothing is evaluated until a renderer asks for a region.

/// Leaf samplers over decoded pixels.
pub mod buffer;
/// Sampler handles and node kinds.
pub mod graph;

pub use buffer::BufferSampler;
pub use graph::{Sampler, SamplerKind};
