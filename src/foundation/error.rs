/// Convenience result type used across Firtree.
pub type FirtreeResult<T> = Result<T, FirtreeError>;

/// Top-level error taxonomy used by engine APIs.
#[derive(thiserror::Error, Debug)]
pub enum FirtreeError {
    /// Kernel source failed to lex, parse or type check.
    #[error("compile error: {0}")]
    Compile(String),

    /// An argument name that the compiled kernel does not declare.
    #[error("unknown argument: {0}")]
    UnknownArgument(String),

    /// A value whose dynamic type does not fit the declared argument type.
    #[error("type mismatch: {0}")]
    TypeMismatch(String),

    /// A sampler graph that cannot be evaluated (invalid kernel, cycle, wrong target).
    #[error("invalid graph: {0}")]
    InvalidGraph(String),

    /// Inversion of a non-invertible affine transform.
    #[error("singular transform: {0}")]
    SingularTransform(String),

    /// Unsupported pixel format or a buffer that does not match its description.
    #[error("format error: {0}")]
    Format(String),

    /// Runtime fault while executing kernel code.
    #[error("evaluation error: {0}")]
    Evaluation(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl FirtreeError {
    /// Build a [`FirtreeError::Compile`] value.
    pub fn compile(msg: impl Into<String>) -> Self {
        Self::Compile(msg.into())
    }

    /// Build a [`FirtreeError::UnknownArgument`] value.
    pub fn unknown_argument(name: impl Into<String>) -> Self {
        Self::UnknownArgument(name.into())
    }

    /// Build a [`FirtreeError::TypeMismatch`] value.
    pub fn type_mismatch(msg: impl Into<String>) -> Self {
        Self::TypeMismatch(msg.into())
    }

    /// Build a [`FirtreeError::InvalidGraph`] value.
    pub fn invalid_graph(msg: impl Into<String>) -> Self {
        Self::InvalidGraph(msg.into())
    }

    /// Build a [`FirtreeError::SingularTransform`] value.
    pub fn singular_transform(msg: impl Into<String>) -> Self {
        Self::SingularTransform(msg.into())
    }

    /// Build a [`FirtreeError::Format`] value.
    pub fn format(msg: impl Into<String>) -> Self {
        Self::Format(msg.into())
    }

    /// Build a [`FirtreeError::Evaluation`] value.
    pub fn evaluation(msg: impl Into<String>) -> Self {
        Self::Evaluation(msg.into())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
