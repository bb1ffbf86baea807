use crate::foundation::core::Rect;
use crate::foundation::error::{FirtreeError, FirtreeResult};
use crate::kernel::Kernel;
use crate::render::cpu::pixel_center;
use crate::render::eval::Evaluator;
use crate::render::opts::RenderOpts;
use crate::render::plan::GraphPlan;
use crate::render::stack::on_eval_stack;

/// One value passed to `emit()` by a reduce kernel.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ReduceRecord {
    /// First component.
    pub x: f32,
    /// Second component.
    pub y: f32,
    /// Third component.
    pub tag: f32,
    /// Fourth component.
    pub extra: f32,
}

impl From<[f32; 4]> for ReduceRecord {
    fn from(v: [f32; 4]) -> Self {
        Self {
            x: v[0],
            y: v[1],
            tag: v[2],
            extra: v[3],
        }
    }
}

/// Runs `__reduce` kernels over a rectangle and collects their emissions.
#[derive(Clone, Debug, Default)]
pub struct ReduceEngine {
    kernel: Option<Kernel>,
    opts: RenderOpts,
}

impl ReduceEngine {
    /// Engine without a kernel and with default options.
    pub fn new() -> Self {
        Self::default()
    }

    /// Engine with explicit options.
    pub fn with_opts(opts: RenderOpts) -> Self {
        Self { kernel: None, opts }
    }

    /// Select the kernel run by [`run`](Self::run).
    pub fn set_kernel(&mut self, kernel: Kernel) {
        self.kernel = Some(kernel);
    }

    /// The selected kernel.
    pub fn kernel(&self) -> Option<&Kernel> {
        self.kernel.as_ref()
    }

    /// Execute the kernel once per pixel of a `width` x `height` grid over `rect`.
    ///
    /// Records come back in row-major scan order, and in emission order within a pixel. Fails
    /// before running anything when the kernel is missing, invalid or not a reduce kernel.
    #[tracing::instrument(skip(self), fields(records = tracing::field::Empty))]
    pub fn run(&self, rect: Rect, width: u32, height: u32) -> FirtreeResult<Vec<ReduceRecord>> {
        let kernel = self
            .kernel
            .as_ref()
            .ok_or_else(|| FirtreeError::invalid_graph("reduce engine has no kernel"))?;
        let opts = &self.opts;
        let emitted = on_eval_stack(opts, || {
            let plan = GraphPlan::for_reduce(kernel, opts).inspect_err(|err| {
                tracing::warn!(error = %err, "refusing to run invalid reduce kernel");
            })?;
            let eval = Evaluator::new(&plan, opts);

            let mut emitted = Vec::new();
            for row in 0..height {
                for col in 0..width {
                    eval.run_reduce(pixel_center(rect, col, row, width, height), &mut emitted)?;
                }
            }
            Ok(emitted)
        })?;
        tracing::Span::current().record("records", emitted.len());
        Ok(emitted.into_iter().map(ReduceRecord::from).collect())
    }
}

/// Run `kernel` over `rect` with default options.
pub fn reduce(kernel: &Kernel, rect: Rect, width: u32, height: u32) -> FirtreeResult<Vec<ReduceRecord>> {
    let mut engine = ReduceEngine::new();
    engine.set_kernel(kernel.clone());
    engine.run(rect, width, height)
}

#[cfg(test)]
#[path = "../../tests/unit/render/reduce.rs"]
mod tests;
