//! Error types shared by the interpreter and the session driver.
//!
//! Lexical, syntax and semantic problems are not errors in this sense: they
//! are collected as diagnostics of a unit and never stop the session.

use std::io;
use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

/// Faults raised while evaluating a unit.
///
/// A fault aborts the current unit only; the session restores the state it
/// had before the unit started.
#[derive(Debug, Error, Diagnostic)]
pub enum RuntimeError {
    #[error("arithmetic overflow")]
    #[diagnostic(code(cxl::runtime::overflow))]
    Overflow,

    #[error("arithmetic underflow")]
    #[diagnostic(code(cxl::runtime::underflow))]
    Underflow,

    #[error("division by zero")]
    #[diagnostic(code(cxl::runtime::division_by_zero))]
    DivisionByZero,

    /// Assigned in a branch that did not run.
    #[error("Variable {name} is not bound")]
    #[diagnostic(code(cxl::runtime::unbound_variable))]
    UnboundVariable { name: String },

    #[error("No function with name \"{name}\" defined")]
    #[diagnostic(code(cxl::runtime::undefined_function))]
    UndefinedFunction { name: String },

    #[error("call depth limit of {limit} exceeded")]
    #[diagnostic(
        code(cxl::runtime::call_depth),
        help("the program recursed deeper than the configured maximum")
    )]
    CallDepthExceeded { limit: usize },

    #[error("failed to write output: {0}")]
    #[diagnostic(code(cxl::runtime::output))]
    Output(#[from] io::Error),
}

/// Failures of the character source.
#[derive(Debug, Error, Diagnostic)]
pub enum SourceError {
    #[error("failed to open '{}'", path.display())]
    #[diagnostic(code(cxl::source::open), help("check that the file exists and is readable"))]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to read program text")]
    #[diagnostic(code(cxl::source::read))]
    Read(#[source] io::Error),
}

/// Fatal errors that end a session.
#[derive(Debug, Error, Diagnostic)]
pub enum SessionError {
    #[error(transparent)]
    #[diagnostic(transparent)]
    Source(#[from] SourceError),

    #[error("failed to write output")]
    #[diagnostic(code(cxl::session::output))]
    Output(#[from] io::Error),
}

/// Result type for evaluation.
pub type EvalResult<T> = Result<T, RuntimeError>;
