//! The kernel language: lexer, parser, type checker, bytecode IR and interpreter.
//!
//! Source text flows through [`compile_source`]:
//!
//! 1. **Lex/parse** into an AST of function definitions, exactly one tagged `kernel`.
//! 2. **Lower**: resolve names and types, then emit stack-machine bytecode per function.
//!
//! The resulting [`KernelProgram`] is backend-neutral; the CPU evaluator interprets it.

pub(crate) mod ast;
pub(crate) mod builtins;
pub(crate) mod bytecode;
pub(crate) mod error;
pub(crate) mod lexer;
pub(crate) mod lower;
pub(crate) mod parser;
pub(crate) mod types;
pub(crate) mod value;
pub(crate) mod vm;

pub use bytecode::{ArgumentSpec, KernelProgram};
pub use error::Diagnostic;
pub use types::{KernelTarget, Type};

/// Compile kernel source text. On failure the diagnostic carries a resolved line/column.
#[tracing::instrument(skip(source), fields(len = source.len()))]
pub fn compile_source(source: &str) -> Result<KernelProgram, Diagnostic> {
    let module = parser::parse_module(source).map_err(|d| d.locate(source))?;
    let program = lower::lower_module(&module).map_err(|d| d.locate(source))?;
    tracing::debug!(
        kernel = program.kernel_name(),
        ops = program.op_count(),
        "kernel compiled"
    );
    Ok(program)
}
