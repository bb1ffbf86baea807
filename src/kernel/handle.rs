use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::foundation::error::{FirtreeError, FirtreeResult};
use crate::kernel::value::{ArgValue, coerce};
use crate::language::{self, ArgumentSpec, KernelProgram, KernelTarget};
use crate::sampler::Sampler;

static NEXT_KERNEL_ID: AtomicU64 = AtomicU64::new(1);
static NEXT_SUBSCRIPTION_ID: AtomicU64 = AtomicU64::new(1);

/// Notification delivered to kernel observers.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum KernelEvent {
    /// The kernel was (re)compiled, successfully or not.
    ModuleChanged,
    /// An argument was set or unset.
    ArgumentChanged {
        /// Declared argument name.
        name: String,
    },
}

/// Token returned by [`Kernel::subscribe`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SubscriptionId(u64);

type Observer = Arc<dyn Fn(&Kernel, &KernelEvent) + Send + Sync>;

#[derive(Default)]
struct KernelState {
    source: String,
    program: Option<Arc<KernelProgram>>,
    compile_log: Option<Vec<String>>,
    values: Vec<Option<ArgValue>>,
}

struct KernelInner {
    id: u64,
    state: RwLock<KernelState>,
    observers: Mutex<Vec<(SubscriptionId, Observer)>>,
}

/// Compiled program plus a consistent copy of its argument bindings.
#[derive(Clone)]
pub(crate) struct KernelSnapshot {
    pub(crate) program: Arc<KernelProgram>,
    pub(crate) values: Vec<Option<ArgValue>>,
}

/// A compiled kernel with its argument bindings.
///
/// `Kernel` is a shared handle: clones refer to the same kernel, so rebinding an argument is
/// seen by every sampler that wraps it. Compilation is synchronous and its outcome is kept
/// until the next compile; a failed compile drops any previous program.
#[derive(Clone)]
pub struct Kernel {
    inner: Arc<KernelInner>,
}

impl Kernel {
    /// An uncompiled kernel with empty source.
    pub fn new() -> Self {
        Self {
            inner: Arc::new(KernelInner {
                id: NEXT_KERNEL_ID.fetch_add(1, Ordering::Relaxed),
                state: RwLock::new(KernelState::default()),
                observers: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Create a kernel and compile `source`. Check [`compile_status`](Self::compile_status).
    pub fn from_source(source: &str) -> Self {
        let kernel = Self::new();
        if let Err(err) = kernel.compile_from_source(source) {
            tracing::debug!(error = %err, "kernel created from source that does not compile");
        }
        kernel
    }

    /// Compile `source`, replacing the program, argument schema and all bindings.
    ///
    /// Fires [`KernelEvent::ModuleChanged`] whether or not compilation succeeds.
    #[tracing::instrument(skip(self, source), fields(kernel = self.inner.id))]
    pub fn compile_from_source(&self, source: &str) -> FirtreeResult<()> {
        let outcome = language::compile_source(source);
        let result = {
            let mut state = self.write_state();
            state.source = source.to_owned();
            state.values.clear();
            match outcome {
                Ok(program) => {
                    state.values = vec![None; program.arguments().len()];
                    state.program = Some(Arc::new(program));
                    state.compile_log = Some(Vec::new());
                    Ok(())
                }
                Err(diag) => {
                    let line = diag.to_string();
                    tracing::debug!(diagnostic = %line, "kernel failed to compile");
                    state.program = None;
                    state.compile_log = Some(vec![line.clone()]);
                    Err(FirtreeError::compile(line))
                }
            }
        };
        self.notify(&KernelEvent::ModuleChanged);
        result
    }

    /// Compile an ordered sequence of source lines joined with `\n`.
    pub fn compile_from_lines<S: AsRef<str>>(&self, lines: &[S]) -> FirtreeResult<()> {
        let source = lines
            .iter()
            .map(AsRef::as_ref)
            .collect::<Vec<_>>()
            .join("\n");
        self.compile_from_source(&source)
    }

    /// Source text of the last compile attempt.
    pub fn source(&self) -> String {
        self.read_state().source.clone()
    }

    /// True when the last compile succeeded.
    pub fn compile_status(&self) -> bool {
        self.read_state().program.is_some()
    }

    /// Diagnostics of the last compile; `None` if the kernel was never compiled.
    ///
    /// Compilation stops at the first error, so a failed compile logs exactly one line
    /// (`line:col: error: message`) and a successful one logs none.
    pub fn compile_log(&self) -> Option<Vec<String>> {
        self.read_state().compile_log.clone()
    }

    /// The compiled program, if any.
    pub fn program(&self) -> Option<Arc<KernelProgram>> {
        self.read_state().program.clone()
    }

    /// Declared arguments in declaration order; `None` until a compile succeeds.
    pub fn arguments(&self) -> Option<Vec<ArgumentSpec>> {
        self.read_state()
            .program
            .as_ref()
            .map(|p| p.arguments().to_vec())
    }

    /// Evaluation target of the compiled kernel.
    pub fn target(&self) -> Option<KernelTarget> {
        self.read_state().program.as_ref().map(|p| p.target())
    }

    /// Bind `value` to the argument `name`, coercing numeric types.
    ///
    /// Fails with [`FirtreeError::UnknownArgument`] or [`FirtreeError::TypeMismatch`], leaving the
    /// previous binding in place. Binding a sampler that already depends on this kernel is
    /// rejected with [`FirtreeError::InvalidGraph`].
    pub fn set_argument(&self, name: &str, value: impl Into<ArgValue>) -> FirtreeResult<()> {
        self.bind(name, Some(value.into()))
    }

    /// Remove the binding for `name`.
    pub fn unset_argument(&self, name: &str) -> FirtreeResult<()> {
        self.bind(name, None)
    }

    /// Bind a dynamically typed host value; `null` unsets the argument.
    pub fn set_argument_json(&self, name: &str, value: &serde_json::Value) -> FirtreeResult<()> {
        let value = ArgValue::from_json(value)?;
        self.bind(name, value)
    }

    /// Current binding for `name`.
    pub fn argument(&self, name: &str) -> FirtreeResult<Option<ArgValue>> {
        let state = self.read_state();
        let idx = Self::arg_index(&state, name)?;
        Ok(state.values[idx].clone())
    }

    /// True when compiled and every non-sampler argument is bound.
    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// Like [`is_valid`](Self::is_valid), but reports why the kernel cannot be evaluated.
    pub fn validate(&self) -> FirtreeResult<()> {
        let state = self.read_state();
        let Some(program) = state.program.as_ref() else {
            return Err(FirtreeError::invalid_graph("kernel is not compiled"));
        };
        for (spec, value) in program.arguments().iter().zip(&state.values) {
            if value.is_none() && !spec.is_sampler() {
                return Err(FirtreeError::invalid_graph(format!(
                    "kernel '{}' argument '{}' is unbound",
                    program.kernel_name(),
                    spec.name
                )));
            }
        }
        Ok(())
    }

    /// Register `observer` for compile and argument events.
    pub fn subscribe(
        &self,
        observer: impl Fn(&Kernel, &KernelEvent) + Send + Sync + 'static,
    ) -> SubscriptionId {
        let id = SubscriptionId(NEXT_SUBSCRIPTION_ID.fetch_add(1, Ordering::Relaxed));
        self.lock_observers().push((id, Arc::new(observer)));
        id
    }

    /// Remove an observer. Returns false if `id` was not registered on this kernel.
    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        let mut observers = self.lock_observers();
        let before = observers.len();
        observers.retain(|(sid, _)| *sid != id);
        observers.len() != before
    }

    /// True when both handles refer to the same kernel.
    pub fn ptr_eq(&self, other: &Kernel) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    pub(crate) fn id(&self) -> u64 {
        self.inner.id
    }

    pub(crate) fn snapshot(&self) -> Option<KernelSnapshot> {
        let state = self.read_state();
        let program = state.program.clone()?;
        Some(KernelSnapshot {
            program,
            values: state.values.clone(),
        })
    }

    /// Bound sampler arguments, in declaration order.
    pub(crate) fn bound_samplers(&self) -> Vec<(String, Sampler)> {
        let state = self.read_state();
        let Some(program) = state.program.as_ref() else {
            return Vec::new();
        };
        program
            .arguments()
            .iter()
            .zip(&state.values)
            .filter_map(|(spec, v)| match v {
                Some(ArgValue::Sampler(s)) => Some((spec.name.clone(), s.clone())),
                _ => None,
            })
            .collect()
    }

    fn bind(&self, name: &str, value: Option<ArgValue>) -> FirtreeResult<()> {
        let spec = {
            let state = self.read_state();
            let idx = Self::arg_index(&state, name)?;
            state
                .program
                .as_ref()
                .map(|p| p.arguments()[idx].clone())
                .ok_or_else(|| FirtreeError::unknown_argument(name))?
        };
        let value = value.map(|v| coerce(&spec, v)).transpose()?;
        if let Some(ArgValue::Sampler(s)) = &value
            && s.reaches_kernel(self.id())
        {
            return Err(FirtreeError::invalid_graph(format!(
                "binding '{name}' would make the kernel depend on itself"
            )));
        }
        {
            let mut state = self.write_state();
            // A concurrent recompile may have replaced the schema.
            let idx = Self::arg_index(&state, name)?;
            let current = state.program.as_ref().map(|p| &p.arguments()[idx]);
            if current != Some(&spec) {
                return Err(FirtreeError::unknown_argument(name));
            }
            state.values[idx] = value;
        }
        self.notify(&KernelEvent::ArgumentChanged {
            name: name.to_owned(),
        });
        Ok(())
    }

    fn arg_index(state: &KernelState, name: &str) -> FirtreeResult<usize> {
        state
            .program
            .as_ref()
            .and_then(|p| p.arguments().iter().position(|a| a.name == name))
            .ok_or_else(|| FirtreeError::unknown_argument(name))
    }

    fn notify(&self, event: &KernelEvent) {
        let observers: Vec<Observer> = self
            .lock_observers()
            .iter()
            .map(|(_, o)| Arc::clone(o))
            .collect();
        for observer in observers {
            observer(self, event);
        }
    }

    fn read_state(&self) -> RwLockReadGuard<'_, KernelState> {
        self.inner
            .state
            .read()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn write_state(&self) -> RwLockWriteGuard<'_, KernelState> {
        self.inner
            .state
            .write()
            .unwrap_or_else(PoisonError::into_inner)
    }

    fn lock_observers(&self) -> MutexGuard<'_, Vec<(SubscriptionId, Observer)>> {
        self.inner
            .observers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for Kernel {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for Kernel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let state = self.read_state();
        f.debug_struct("Kernel")
            .field("id", &self.inner.id)
            .field(
                "name",
                &state.program.as_ref().map(|p| p.kernel_name().to_owned()),
            )
            .field("compiled", &state.program.is_some())
            .finish()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/handle.rs"]
mod tests;
