//! cxl Core Library
//!
//! This crate provides the core functionality for cxl, a small interactive
//! language over complex numbers: lexing, parsing, semantic checks, and
//! evaluation, driven one unit at a time by a [`Session`].

pub mod ast;
pub mod checker;
pub mod diagnostics;
pub mod environment;
pub mod error;
pub mod interpreter;
pub mod lexer;
pub mod parser;
pub mod session;
pub mod source;
pub mod span;
pub mod value;

pub use ast::*;
pub use checker::{Checker, SemanticError};
pub use diagnostics::{Diagnostic, DiagnosticKind, Diagnostics};
pub use environment::Environment;
pub use error::{EvalResult, RuntimeError, SessionError, SourceError};
pub use interpreter::{Flow, Interpreter};
pub use lexer::{LexFault, Lexer, Token, TokenKind};
pub use parser::{Parser, Unit};
pub use session::{Session, SessionOptions, UnitOutcome};
pub use source::{CharSource, LineFeed, ReaderFeed, Source};
pub use span::Position;
pub use value::{Complex, Value};
