//! Evaluation runs on its own thread, with a stack sized for the deepest graph the options
//! admit.
//!
//! Each sampler level nests one kernel invocation, and up to [`MAX_CALL_DEPTH`] helper calls,
//! on the native stack.

use crate::foundation::error::{FirtreeError, FirtreeResult};
use crate::language::vm::MAX_CALL_DEPTH;
use crate::render::opts::RenderOpts;

const BASE_STACK: usize = 1 << 20;
/// Upper bound on one interpreter frame plus the host callback that re-enters evaluation.
const FRAME_STACK: usize = 16 << 10;

/// Stack size for evaluating graphs up to `opts.max_graph_depth` levels deep.
pub(crate) fn stack_size(opts: &RenderOpts) -> usize {
    opts.max_graph_depth
        .saturating_add(1)
        .saturating_mul(MAX_CALL_DEPTH * FRAME_STACK)
        .saturating_add(BASE_STACK)
}

/// Run `f` on a scoped evaluation thread and hand back its result.
///
/// The caller's tracing span is re-entered on the worker. Panics are resumed on the caller.
pub(crate) fn on_eval_stack<R, F>(opts: &RenderOpts, f: F) -> FirtreeResult<R>
where
    F: FnOnce() -> FirtreeResult<R> + Send,
    R: Send,
{
    let span = tracing::Span::current();
    std::thread::scope(|scope| {
        let handle = std::thread::Builder::new()
            .name("firtree-eval".to_owned())
            .stack_size(stack_size(opts))
            .spawn_scoped(scope, move || {
                let _entered = span.enter();
                f()
            })
            .map_err(|err| FirtreeError::evaluation(format!("cannot start evaluation thread: {err}")))?;
        match handle.join() {
            Ok(result) => result,
            Err(payload) => std::panic::resume_unwind(payload),
        }
    })
}

#[cfg(test)]
#[path = "../../tests/unit/render/stack.rs"]
mod tests;
