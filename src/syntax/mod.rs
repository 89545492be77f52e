//! Syntax-level data structures for Quartz
//!
//! The lexer and parser live upstream of this crate; what they hand over
//! is the token and AST shapes defined here.

pub mod ast;
pub mod token;

pub use ast::{
    Block, Decl, DeclKind, Expr, ExprKind, Param, Program, Stmt, StmtKind, SwitchCase, TypeExpr,
    TypeExprKind, VarPath,
};
pub use token::{Keyword, OpKind, Token, TokenKind, TokenValue};
