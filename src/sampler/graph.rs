use std::collections::HashSet;
use std::sync::Arc;

use crate::foundation::core::{INFINITE_EXTENT, Rect, intersect_extent, transform_extent};
use crate::foundation::error::{FirtreeError, FirtreeResult};
use crate::kernel::{ExtentProvider, Kernel};
use crate::language::KernelTarget;
use crate::render::canvas::AccumulationCanvas;
use crate::sampler::buffer::BufferSampler;
use crate::transform::affine::AffineTransform;

/// Node variants of the image graph.
pub(crate) enum SamplerNode {
    Empty,
    Buffer(BufferSampler),
    Kernel {
        kernel: Kernel,
        extent: ExtentProvider,
    },
    Transform {
        child: Sampler,
        transform: AffineTransform,
    },
    Crop {
        child: Sampler,
        rect: Rect,
    },
    Canvas(AccumulationCanvas),
}

/// Discriminant of a [`Sampler`] node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SamplerKind {
    /// Transparent everywhere.
    Empty,
    /// Decoded pixel buffer.
    Buffer,
    /// Output of a kernel.
    Kernel,
    /// Child remapped through an affine transform.
    Transform,
    /// Child clipped to a rectangle.
    Crop,
    /// Current contents of an accumulation canvas.
    Canvas,
}

/// A node of the lazily evaluated image graph.
///
/// Samplers are cheap shared handles. A node may have any number of parents; edges are
/// fixed at construction except kernel sampler arguments, which are rebound on the kernel.
#[derive(Clone)]
pub struct Sampler {
    node: Arc<SamplerNode>,
}

impl Sampler {
    fn from_node(node: SamplerNode) -> Self {
        Self {
            node: Arc::new(node),
        }
    }

    /// Transparent black over the whole plane.
    pub fn empty() -> Self {
        Self::from_node(SamplerNode::Empty)
    }

    /// Leaf node over decoded pixels.
    pub fn from_buffer(buffer: BufferSampler) -> Self {
        Self::from_node(SamplerNode::Buffer(buffer))
    }

    /// Node evaluating `kernel` with an infinite extent.
    pub fn from_kernel(kernel: &Kernel) -> FirtreeResult<Self> {
        Self::from_kernel_with_extent(kernel, ExtentProvider::Infinite)
    }

    /// Node evaluating `kernel`, with its extent computed by `extent`.
    ///
    /// Reduce kernels produce records, not images, and are rejected.
    pub fn from_kernel_with_extent(kernel: &Kernel, extent: ExtentProvider) -> FirtreeResult<Self> {
        if kernel.target() == Some(KernelTarget::Reduce) {
            return Err(FirtreeError::invalid_graph(
                "a __reduce kernel cannot be used as an image",
            ));
        }
        Ok(Self::from_node(SamplerNode::Kernel {
            kernel: kernel.clone(),
            extent,
        }))
    }

    pub(crate) fn from_canvas(canvas: AccumulationCanvas) -> Self {
        Self::from_node(SamplerNode::Canvas(canvas))
    }

    /// This sampler seen through `transform`: a point `p` of the result reads `T⁻¹·p` here.
    pub fn transformed(&self, transform: AffineTransform) -> Self {
        Self::from_node(SamplerNode::Transform {
            child: self.clone(),
            transform,
        })
    }

    /// This sampler clipped to `rect`; transparent outside it.
    pub fn cropped(&self, rect: Rect) -> Self {
        Self::from_node(SamplerNode::Crop {
            child: self.clone(),
            rect,
        })
    }

    /// Region outside which the sampler is transparent.
    ///
    /// Unbounded nodes report [`INFINITE_EXTENT`].
    pub fn extent(&self) -> Rect {
        match &*self.node {
            SamplerNode::Empty => INFINITE_EXTENT,
            SamplerNode::Buffer(b) => b.extent(),
            SamplerNode::Kernel { kernel, extent } => extent.resolve(kernel),
            SamplerNode::Transform { child, transform } => {
                transform_extent(transform.to_affine(), child.extent())
            }
            SamplerNode::Crop { child, rect } => intersect_extent(child.extent(), *rect),
            SamplerNode::Canvas(c) => c.extent(),
        }
    }

    /// Own transform of a transform node; identity for every other kind.
    pub fn transform(&self) -> AffineTransform {
        match &*self.node {
            SamplerNode::Transform { transform, .. } => *transform,
            _ => AffineTransform::identity(),
        }
    }

    /// Which kind of node this is.
    pub fn kind(&self) -> SamplerKind {
        match &*self.node {
            SamplerNode::Empty => SamplerKind::Empty,
            SamplerNode::Buffer(_) => SamplerKind::Buffer,
            SamplerNode::Kernel { .. } => SamplerKind::Kernel,
            SamplerNode::Transform { .. } => SamplerKind::Transform,
            SamplerNode::Crop { .. } => SamplerKind::Crop,
            SamplerNode::Canvas(_) => SamplerKind::Canvas,
        }
    }

    /// The wrapped kernel of a kernel node.
    pub fn kernel(&self) -> Option<&Kernel> {
        match &*self.node {
            SamplerNode::Kernel { kernel, .. } => Some(kernel),
            _ => None,
        }
    }

    /// True when both handles refer to the same node.
    pub fn ptr_eq(&self, other: &Sampler) -> bool {
        Arc::ptr_eq(&self.node, &other.node)
    }

    pub(crate) fn node(&self) -> &SamplerNode {
        &self.node
    }

    pub(crate) fn node_key(&self) -> usize {
        Arc::as_ptr(&self.node) as usize
    }

    /// True when evaluating this sampler would run the kernel with id `kernel_id`.
    pub(crate) fn reaches_kernel(&self, kernel_id: u64) -> bool {
        let mut seen = HashSet::new();
        let mut stack = vec![self.clone()];
        while let Some(s) = stack.pop() {
            if !seen.insert(s.node_key()) {
                continue;
            }
            match s.node() {
                SamplerNode::Kernel { kernel, .. } => {
                    if kernel.id() == kernel_id {
                        return true;
                    }
                    stack.extend(kernel.bound_samplers().into_iter().map(|(_, s)| s));
                }
                SamplerNode::Transform { child, .. } | SamplerNode::Crop { child, .. } => {
                    stack.push(child.clone());
                }
                SamplerNode::Empty | SamplerNode::Buffer(_) | SamplerNode::Canvas(_) => {}
            }
        }
        false
    }
}

impl Default for Sampler {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<BufferSampler> for Sampler {
    fn from(buffer: BufferSampler) -> Self {
        Self::from_buffer(buffer)
    }
}

impl std::fmt::Debug for Sampler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut d = f.debug_struct("Sampler");
        d.field("kind", &self.kind());
        match &*self.node {
            SamplerNode::Buffer(b) => d.field("size", &(b.width(), b.height())),
            SamplerNode::Kernel { kernel, extent } => {
                d.field("kernel", kernel).field("extent", extent)
            }
            SamplerNode::Transform { transform, .. } => d.field("transform", transform),
            SamplerNode::Crop { rect, .. } => d.field("rect", rect),
            SamplerNode::Canvas(c) => d.field("extent", &c.extent()),
            SamplerNode::Empty => &mut d,
        };
        d.finish_non_exhaustive()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/sampler/graph.rs"]
mod tests;
