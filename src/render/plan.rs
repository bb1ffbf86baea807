use std::collections::HashMap;
use std::sync::Arc;

use crate::foundation::core::{Affine, INFINITE_EXTENT, Point, Rect, intersect_extent, transform_extent};
use crate::foundation::error::{FirtreeError, FirtreeResult};
use crate::kernel::{ArgValue, Kernel};
use crate::language::value::Value;
use crate::language::{KernelProgram, KernelTarget};
use crate::render::opts::RenderOpts;
use crate::sampler::buffer::PixelStore;
use crate::sampler::graph::{Sampler, SamplerNode};

/// Executable form of one sampler node.
pub(crate) enum PlanOp {
    Empty,
    Pixels {
        store: Arc<PixelStore>,
        /// World position of texel `(0, 0)`'s corner.
        origin: Point,
        interpolate: bool,
    },
    Kernel {
        program: Arc<KernelProgram>,
        args: Vec<Value>,
    },
    Transform {
        child: usize,
        inverse: Affine,
    },
    Crop {
        child: usize,
        rect: Rect,
    },
}

pub(crate) struct PlanNode {
    pub(crate) op: PlanOp,
    /// Sampler space to the space the node's output is defined in.
    pub(crate) to_world: Affine,
    pub(crate) from_world: Affine,
    /// Extent in output space.
    pub(crate) extent: Rect,
}

/// A validated, frozen copy of a sampler graph.
///
/// Planning snapshots every kernel's program and bindings, so a render sees one consistent
/// graph even if arguments are rebound concurrently. Shared nodes are planned once.
pub(crate) struct GraphPlan {
    pub(crate) nodes: Vec<PlanNode>,
    pub(crate) root: usize,
}

impl GraphPlan {
    /// Plan an image graph. Every reachable kernel must be a valid normal kernel.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) fn for_sampler(root: &Sampler, opts: &RenderOpts) -> FirtreeResult<Self> {
        let mut planner = Planner::new(opts);
        let root = planner.visit(root, 0)?;
        tracing::debug!(nodes = planner.nodes.len(), "graph planned");
        Ok(Self {
            nodes: planner.nodes,
            root,
        })
    }

    /// Plan a reduce kernel and everything its sampler arguments reach. The root is the reduce
    /// kernel itself.
    #[tracing::instrument(level = "debug", skip_all)]
    pub(crate) fn for_reduce(kernel: &Kernel, opts: &RenderOpts) -> FirtreeResult<Self> {
        let mut planner = Planner::new(opts);
        let root = planner.kernel_node(kernel, KernelTarget::Reduce, INFINITE_EXTENT, 0)?;
        tracing::debug!(nodes = planner.nodes.len(), "reduce graph planned");
        Ok(Self {
            nodes: planner.nodes,
            root,
        })
    }
}

struct Planner<'o> {
    opts: &'o RenderOpts,
    nodes: Vec<PlanNode>,
    memo: HashMap<usize, usize>,
    active: Vec<u64>,
}

impl<'o> Planner<'o> {
    fn new(opts: &'o RenderOpts) -> Self {
        Self {
            opts,
            nodes: Vec::new(),
            memo: HashMap::new(),
            active: Vec::new(),
        }
    }

    fn push(&mut self, op: PlanOp, to_world: Affine, extent: Rect) -> usize {
        self.nodes.push(PlanNode {
            op,
            to_world,
            from_world: to_world.inverse(),
            extent,
        });
        self.nodes.len() - 1
    }

    fn visit(&mut self, sampler: &Sampler, depth: usize) -> FirtreeResult<usize> {
        if depth > self.opts.max_graph_depth {
            return Err(FirtreeError::invalid_graph(format!(
                "sampler graph is deeper than {} nodes",
                self.opts.max_graph_depth
            )));
        }
        let key = sampler.node_key();
        if let Some(&idx) = self.memo.get(&key) {
            return Ok(idx);
        }

        let idx = match sampler.node() {
            SamplerNode::Empty => self.push(PlanOp::Empty, Affine::IDENTITY, INFINITE_EXTENT),
            SamplerNode::Buffer(b) => self.push(
                PlanOp::Pixels {
                    store: Arc::clone(b.store()),
                    origin: Point::ORIGIN,
                    interpolate: b.interpolate(),
                },
                Affine::IDENTITY,
                b.extent(),
            ),
            SamplerNode::Canvas(c) => {
                let extent = c.extent();
                self.push(
                    PlanOp::Pixels {
                        store: c.snapshot(),
                        origin: extent.origin(),
                        interpolate: false,
                    },
                    Affine::IDENTITY,
                    extent,
                )
            }
            SamplerNode::Kernel { kernel, extent } => {
                self.kernel_node(kernel, KernelTarget::Normal, extent.resolve(kernel), depth)?
            }
            SamplerNode::Transform { child, transform } => {
                let c = self.visit(child, depth + 1)?;
                let t = transform.to_affine();
                let inverse = transform.inverse()?.to_affine();
                let child_node = &self.nodes[c];
                let to_world = t * child_node.to_world;
                let extent = transform_extent(t, child_node.extent);
                self.push(PlanOp::Transform { child: c, inverse }, to_world, extent)
            }
            SamplerNode::Crop { child, rect } => {
                let c = self.visit(child, depth + 1)?;
                let child_node = &self.nodes[c];
                let to_world = child_node.to_world;
                let extent = intersect_extent(child_node.extent, *rect);
                self.push(PlanOp::Crop { child: c, rect: *rect }, to_world, extent)
            }
        };
        self.memo.insert(key, idx);
        Ok(idx)
    }

    fn kernel_node(
        &mut self,
        kernel: &Kernel,
        target: KernelTarget,
        extent: Rect,
        depth: usize,
    ) -> FirtreeResult<usize> {
        if self.active.contains(&kernel.id()) {
            return Err(FirtreeError::invalid_graph("sampler graph contains a cycle"));
        }
        let snapshot = kernel
            .snapshot()
            .ok_or_else(|| FirtreeError::invalid_graph("kernel is not compiled"))?;
        let program = snapshot.program;
        if program.target() != target {
            return Err(FirtreeError::invalid_graph(format!(
                "kernel '{}' has target {:?}, expected {target:?}",
                program.kernel_name(),
                program.target()
            )));
        }

        self.active.push(kernel.id());
        let args = self.bind_args(&program, snapshot.values, depth);
        self.active.pop();
        let args = args?;

        Ok(self.push(PlanOp::Kernel { program, args }, Affine::IDENTITY, extent))
    }

    fn bind_args(
        &mut self,
        program: &KernelProgram,
        values: Vec<Option<ArgValue>>,
        depth: usize,
    ) -> FirtreeResult<Vec<Value>> {
        let mut args = Vec::with_capacity(values.len());
        for (spec, value) in program.arguments().iter().zip(values) {
            args.push(match value {
                None if spec.is_sampler() => Value::Sampler(None),
                None => {
                    return Err(FirtreeError::invalid_graph(format!(
                        "kernel '{}' argument '{}' is unbound",
                        program.kernel_name(),
                        spec.name
                    )));
                }
                Some(ArgValue::Sampler(s)) => {
                    let idx = self.visit(&s, depth + 1)?;
                    let idx = u32::try_from(idx)
                        .map_err(|_| FirtreeError::invalid_graph("sampler graph is too large"))?;
                    Value::Sampler(Some(idx))
                }
                Some(ArgValue::Bool(b)) => Value::Bool(b),
                Some(ArgValue::Int(i)) => Value::Int(i),
                Some(ArgValue::Float(f)) => Value::Float(f),
                Some(ArgValue::Vec2(v)) => Value::Vec2(v),
                Some(ArgValue::Vec3(v)) => Value::Vec3(v),
                Some(ArgValue::Vec4(v)) => Value::Vec4(v),
            });
        }
        Ok(args)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/plan.rs"]
mod tests;
