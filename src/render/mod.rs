//! CPU evaluation of sampler graphs.
//!
//! Rendering happens in two stages:
//!
//! 1. **Plan**: walk the graph from the root, validate every kernel, snapshot bindings and
//!    precompute per-node coordinate mappings and extents. Any failure here aborts before a
//!    pixel is produced.
//! 2. **Evaluate**: for each output pixel, pull a premultiplied color through the plan, then
//!    pack it into the requested [`PixelFormat`].
//!
//! The same machinery drives [`AccumulationCanvas`] composites and [`ReduceEngine`] scans.

/// Persistent composite targets.
pub mod canvas;
/// The pixel-buffer renderer.
pub mod cpu;
pub(crate) mod eval;
/// Packed pixel formats and buffer descriptions.
pub mod format;
/// Evaluation limits.
pub mod opts;
pub(crate) mod plan;
/// Reduce kernel scans.
pub mod reduce;
pub(crate) mod stack;
/// Host surfaces.
pub mod surface;

pub use canvas::AccumulationCanvas;
pub use cpu::{CpuRenderer, render_into_buffer};
pub use format::{BufferDesc, PixelFormat};
pub use opts::RenderOpts;
pub use reduce::{ReduceEngine, ReduceRecord, reduce};
pub use surface::{ImageSurface, Surface};
