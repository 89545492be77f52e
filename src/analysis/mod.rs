//! Semantic analysis for Quartz
//!
//! This module owns name resolution, type checking, and diagnostic
//! collection. One resolver pass walks the AST, attaches a symbol to
//! every node, and builds the scope tree; a second pass harvests the
//! diagnostics the resolver left behind.

mod diagnostics;
mod mangle;
mod resolver;
mod scope;
mod symbol;

pub use mangle::{cast_key, mangle_path, mangle_type};
pub use resolver::Resolver;
pub use scope::{Scope, ScopeStack};
pub use symbol::{same_entry, type_match, SymKind, Symbol, TypeEntry, TypeEntryRef};

use crate::errors::{AnalysisError, Diagnostic};
use crate::syntax::ast::Program;

/// The outcome of an analysis pass
///
/// The scope tree and the AST's attached symbols stay available even when
/// diagnostics were produced; later phases must check [`Analysis::success`]
/// before consuming them.
#[derive(Debug)]
pub struct Analysis {
    /// The global scope, with every nested scope reattached
    pub global_scope: Scope,
    /// Every static error found, in traversal order
    pub diagnostics: Vec<Diagnostic>,
}

impl Analysis {
    /// True when the program resolved without a single static error
    pub fn success(&self) -> bool {
        self.diagnostics.is_empty()
    }
}

/// Resolve names and types across the program and collect diagnostics
///
/// The pass never aborts: errors are attached to the offending nodes and
/// the walk continues, so one run reports every independent error. A tree
/// must not be resolved twice; build a fresh program per pass.
pub fn analyze(program: &mut Program) -> Analysis {
    let resolver = Resolver::new();
    let global_scope = resolver.resolve(program);
    let diagnostics = diagnostics::collect(program);
    Analysis {
        global_scope,
        diagnostics,
    }
}

/// Like [`analyze`], but fail when any static error was found
pub fn check(program: &mut Program) -> Result<Analysis, AnalysisError> {
    let analysis = analyze(program);
    if analysis.success() {
        Ok(analysis)
    } else {
        Err(AnalysisError {
            diagnostics: analysis.diagnostics,
        })
    }
}
