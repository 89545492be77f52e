//! quartzc - semantic analysis core for the Quartz language
//!
//! This crate is the front-end middle stage of the Quartz compiler: it
//! consumes the token stream and AST produced by the lexing/parsing stage
//! and produces a layered symbol table, a resolved symbol on every AST
//! node, and the list of static errors found along the way.

pub mod analysis;
pub mod errors;
pub mod syntax;

// Re-export commonly used types
pub use analysis::{analyze, check, Analysis, Resolver, Scope, SymKind, Symbol, TypeEntry};
pub use errors::{AnalysisError, Diagnostic, ErrorKind, Pos};
pub use syntax::{Program, Token, TokenKind};
