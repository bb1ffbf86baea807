use crate::foundation::core::{INFINITE_EXTENT, Point, Rgba, TRANSPARENT, rect_to_xywh, transform_extent};
use crate::foundation::error::FirtreeError;
use crate::language::value::Value;
use crate::language::vm::{KernelHost, VmError, run_kernel};
use crate::render::opts::RenderOpts;
use crate::render::plan::{GraphPlan, PlanOp};

impl From<VmError> for FirtreeError {
    fn from(err: VmError) -> Self {
        FirtreeError::evaluation(err.message)
    }
}

/// Pull-based evaluation of a [`GraphPlan`].
///
/// Each call answers "what color does node `n` have at point `p` of its output space". Kernel
/// nodes run their program with `destCoord() == p`; sampler builtins recurse into children.
pub(crate) struct Evaluator<'p> {
    plan: &'p GraphPlan,
    budget: u64,
}

impl<'p> Evaluator<'p> {
    pub(crate) fn new(plan: &'p GraphPlan, opts: &RenderOpts) -> Self {
        Self {
            plan,
            budget: opts.instruction_budget,
        }
    }

    /// Color of the plan root at `p`.
    pub(crate) fn eval_root(&self, p: Point) -> Result<Rgba, VmError> {
        self.eval(self.plan.root, p)
    }

    pub(crate) fn eval(&self, node: usize, p: Point) -> Result<Rgba, VmError> {
        let n = &self.plan.nodes[node];
        match &n.op {
            PlanOp::Empty => Ok(TRANSPARENT),
            PlanOp::Pixels {
                store,
                origin,
                interpolate,
            } => Ok(store.sample(p - origin.to_vec2(), *interpolate)),
            PlanOp::Kernel { program, args } => {
                let mut host = NodeHost::new(self, p, None);
                let mut budget = self.budget;
                match run_kernel(program, args, &mut host, &mut budget)? {
                    Some(Value::Vec4(c)) => Ok(c),
                    _ => Err(VmError::new(format!(
                        "kernel '{}' did not return a color",
                        program.kernel_name()
                    ))),
                }
            }
            PlanOp::Transform { child, inverse } => self.eval(*child, *inverse * p),
            PlanOp::Crop { child, rect } => {
                if rect.contains(p) {
                    self.eval(*child, p)
                } else {
                    Ok(TRANSPARENT)
                }
            }
        }
    }

    /// Run the reduce root at `p`, appending every emitted value to `out`.
    pub(crate) fn run_reduce(&self, p: Point, out: &mut Vec<Rgba>) -> Result<(), VmError> {
        let PlanOp::Kernel { program, args } = &self.plan.nodes[self.plan.root].op else {
            return Err(VmError::new("reduce plan has no kernel root"));
        };
        let mut host = NodeHost::new(self, p, Some(out));
        let mut budget = self.budget;
        run_kernel(program, args, &mut host, &mut budget)?;
        Ok(())
    }
}

struct NodeHost<'e, 'p> {
    eval: &'e Evaluator<'p>,
    dest: Point,
    emitted: Option<&'e mut Vec<Rgba>>,
}

impl<'e, 'p> NodeHost<'e, 'p> {
    fn new(eval: &'e Evaluator<'p>, dest: Point, emitted: Option<&'e mut Vec<Rgba>>) -> Self {
        Self {
            eval,
            dest,
            emitted,
        }
    }
}

fn point(p: [f32; 2]) -> Point {
    Point::new(f64::from(p[0]), f64::from(p[1]))
}

fn pair(p: Point) -> [f32; 2] {
    [p.x as f32, p.y as f32]
}

impl KernelHost for NodeHost<'_, '_> {
    fn dest_coord(&self) -> [f32; 2] {
        pair(self.dest)
    }

    fn sample(&mut self, sampler: Option<u32>, coord: [f32; 2]) -> Result<Rgba, VmError> {
        let Some(idx) = sampler else {
            return Ok(TRANSPARENT);
        };
        let idx = idx as usize;
        let node = &self.eval.plan.nodes[idx];
        self.eval.eval(idx, node.to_world * point(coord))
    }

    fn sampler_transform(&self, sampler: Option<u32>, p: [f32; 2]) -> [f32; 2] {
        match sampler {
            Some(idx) => pair(self.eval.plan.nodes[idx as usize].from_world * point(p)),
            None => p,
        }
    }

    fn sampler_extent(&self, sampler: Option<u32>) -> [f32; 4] {
        let extent = match sampler {
            Some(idx) => {
                let node = &self.eval.plan.nodes[idx as usize];
                transform_extent(node.from_world, node.extent)
            }
            None => INFINITE_EXTENT,
        };
        rect_to_xywh(extent).map(|v| v as f32)
    }

    fn emit(&mut self, value: Rgba) -> Result<(), VmError> {
        match self.emitted.as_deref_mut() {
            Some(out) => {
                out.push(value);
                Ok(())
            }
            None => Err(VmError::new("emit called outside a reduce kernel")),
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/eval.rs"]
mod tests;
