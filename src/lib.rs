//! Firtree is an embeddable image-processing kernel language with a lazy CPU compositing engine.
//!
//! Images are described as a graph and only evaluated when a region is rendered:
//!
//! - Compile a [`Kernel`] from C-like source (`kernel vec4 name(sampler src, ...) { ... }`)
//! - Wrap kernels, decoded buffers, transforms and crops as [`Sampler`] nodes
//! - Render a rectangle with [`CpuRenderer`] into any [`PixelFormat`], composite into an
//!   [`AccumulationCanvas`], or scan it with a [`ReduceEngine`]
#![forbid(unsafe_code)]
#![deny(missing_docs)]

/// Image codec adapter.
pub mod assets;
/// Errors, geometry and color helpers.
pub mod foundation;
/// Kernel handles and argument binding.
pub mod kernel;
/// The kernel language compiler and interpreter.
pub mod language;
/// Rendering, compositing and reduction.
pub mod render;
/// The image graph.
pub mod sampler;
/// Affine transforms.
pub mod transform;

pub use crate::assets::{decode_image, load_image};
pub use crate::foundation::core::{INFINITE_EXTENT, Point, Rect, Rgba, Size, rect_xywh};
pub use crate::foundation::error::{FirtreeError, FirtreeResult};
pub use crate::kernel::{ArgValue, ExtentProvider, Kernel, KernelEvent, SubscriptionId};
pub use crate::language::{ArgumentSpec, Diagnostic, KernelProgram, KernelTarget, Type, compile_source};
pub use crate::render::{
    AccumulationCanvas, BufferDesc, CpuRenderer, ImageSurface, PixelFormat, ReduceEngine, ReduceRecord,
    RenderOpts, Surface, reduce, render_into_buffer,
};
pub use crate::sampler::{BufferSampler, Sampler, SamplerKind};
pub use crate::transform::affine::AffineTransform;
