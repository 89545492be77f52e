//! Error handling for quartzc
//!
//! Provides the static-error taxonomy, positioned diagnostic records,
//! and the crate-level error type.

mod diagnostic;

use std::fmt;
use thiserror::Error;

pub use diagnostic::{format_diagnostic, print_diagnostic, print_diagnostics};

/// A position in the source, as reported by the lexer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pos {
    /// 1-based line number
    pub line: u32,
    /// 1-based column number
    pub column: u32,
}

impl Pos {
    /// Create a new position
    pub fn new(line: u32, column: u32) -> Self {
        Self { line, column }
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[ {}, {} ]", self.line, self.column)
    }
}

/// The closed taxonomy of static errors the resolver can attach to a node
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Cascade marker: an error occurred in a descendant node
    None,
    Redeclaration,
    NotFound,
    SizeParameterNotNumber,
    LhsRhsTypeMismatch,
    CastFuncMultipleParams,
    CastFuncMultipleReturns,
    CastFuncReturnTypeMismatch,
    UnexpectedType,
    RuntimeCaseCondition,
    NoCastExists,
    UnknownVariable,
    NoMemberVariables,
    TypeDoesNotHaveMember,
    NotIterableType,
    DereferenceNonPointer,
    OpFuncParameterSizeMismatch,
    /// Internal assertion; never produced by correct input
    UhOh,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::None => "None",
            ErrorKind::Redeclaration => "Redeclaration",
            ErrorKind::NotFound => "NotFound",
            ErrorKind::SizeParameterNotNumber => "SizeParameterNotNumber",
            ErrorKind::LhsRhsTypeMismatch => "LhsRhsTypeMismatch",
            ErrorKind::CastFuncMultipleParams => "CastFuncMultipleParams",
            ErrorKind::CastFuncMultipleReturns => "CastFuncMultipleReturns",
            ErrorKind::CastFuncReturnTypeMismatch => "CastFuncReturnTypeMismatch",
            ErrorKind::UnexpectedType => "UnexpectedType",
            ErrorKind::RuntimeCaseCondition => "RuntimeCaseCondition",
            ErrorKind::NoCastExists => "NoCastExists",
            ErrorKind::UnknownVariable => "UnknownVariable",
            ErrorKind::NoMemberVariables => "NoMemberVariables",
            ErrorKind::TypeDoesNotHaveMember => "TypeDoesNotHaveMember",
            ErrorKind::NotIterableType => "NotIterableType",
            ErrorKind::DereferenceNonPointer => "DereferenceNonPointer",
            ErrorKind::OpFuncParameterSizeMismatch => "OpFuncParameterSizeMismatch",
            ErrorKind::UhOh => "UhOh",
        };
        write!(f, "{}", name)
    }
}

/// One reported static error
///
/// The `Display` impl renders the plain-text record; [`print_diagnostic`]
/// produces the annotated variant when the source text is available.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    /// Position of the token responsible for the error
    pub pos: Pos,
    /// Error taxonomy tag
    pub kind: ErrorKind,
    /// Human-readable message
    pub message: String,
    /// Rendering of the left-hand-side symbol, when the error has one
    pub lhs: Option<String>,
    /// Rendering of the right-hand-side symbol, when the error has one
    pub rhs: Option<String>,
}

impl Diagnostic {
    pub fn new(pos: Pos, kind: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            pos,
            kind,
            message: message.into(),
            lhs: None,
            rhs: None,
        }
    }

    pub fn with_sides(mut self, lhs: Option<String>, rhs: Option<String>) -> Self {
        self.lhs = lhs;
        self.rhs = rhs;
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Error {}: {}", self.pos, self.kind)?;
        write!(f, "\n\t{}", self.message)?;
        if let Some(lhs) = &self.lhs {
            write!(f, "\n\tLeft-Hand Side: {}", lhs)?;
        }
        if let Some(rhs) = &self.rhs {
            write!(f, "\n\tRight-Hand Side: {}", rhs)?;
        }
        Ok(())
    }
}

/// The error type returned when analysis finds static errors
#[derive(Error, Debug)]
#[error("semantic analysis failed with {} error(s)", .diagnostics.len())]
pub struct AnalysisError {
    /// Every diagnostic found, in traversal order
    pub diagnostics: Vec<Diagnostic>,
}

/// Render a diagnostic list as the newline-terminated plain-text stream
pub fn render_stream(diagnostics: &[Diagnostic]) -> String {
    let mut out = String::new();
    for diag in diagnostics {
        out.push_str(&diag.to_string());
        out.push('\n');
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_diagnostic_format() {
        let diag = Diagnostic::new(
            Pos::new(3, 7),
            ErrorKind::LhsRhsTypeMismatch,
            "The right hand side of the assignment does not have the same type as the left hand side.",
        )
        .with_sides(Some("bool".to_string()), Some("u64".to_string()));

        let text = diag.to_string();
        assert!(text.starts_with("Error [ 3, 7 ]: LhsRhsTypeMismatch"));
        assert!(text.contains("\n\tLeft-Hand Side: bool"));
        assert!(text.contains("\n\tRight-Hand Side: u64"));
    }

    #[test]
    fn test_stream_terminates_each_record() {
        let diags = vec![
            Diagnostic::new(Pos::new(1, 1), ErrorKind::UnknownVariable, "not found"),
            Diagnostic::new(Pos::new(2, 5), ErrorKind::NotFound, "no such type"),
        ];
        let stream = render_stream(&diags);
        assert_eq!(stream.matches("Error [ ").count(), 2);
        assert!(stream.ends_with('\n'));
    }
}
