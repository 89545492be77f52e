//! Diagnostic collection
//!
//! A second traversal over a resolved tree. Every node whose symbol is a
//! real error (an `Error` symbol with a taxonomy tag) produces one
//! diagnostic; cascade symbols are skipped, since the leaf error they
//! point at sits on a descendant node and reports itself.

use crate::errors::{Diagnostic, ErrorKind, Pos};
use crate::syntax::ast::{
    Block, Decl, DeclKind, Expr, ExprKind, Param, Program, Stmt, StmtKind, SwitchCase, TypeExpr,
    TypeExprKind,
};

use super::symbol::Symbol;

/// Harvest every diagnostic from a resolved program, in traversal order
pub fn collect(program: &Program) -> Vec<Diagnostic> {
    let mut out = Vec::new();
    for stmt in &program.stmts {
        walk_stmt(stmt, &mut out);
    }
    out
}

fn report(symbol: Option<&Symbol>, sides: Option<(&Symbol, Option<&Symbol>)>, out: &mut Vec<Diagnostic>) {
    let Some(sym) = symbol else { return };
    if !sym.is_error() || sym.error == ErrorKind::None {
        return;
    }
    let pos = sym.pos.unwrap_or_else(|| Pos::new(0, 0));
    let mut diag = Diagnostic::new(pos, sym.error, sym.name.clone());
    if let Some((lhs, rhs)) = sides {
        diag = diag.with_sides(Some(lhs.to_string()), rhs.map(|s| s.to_string()));
    }
    out.push(diag);
}

fn walk_stmt(stmt: &Stmt, out: &mut Vec<Diagnostic>) {
    report(stmt.symbol.as_ref(), None, out);
    match &stmt.kind {
        StmtKind::Dec(decl) => walk_decl(decl, out),
        StmtKind::Expr(expr) => walk_expr(expr, out),
        StmtKind::Block(block) => walk_block(block, out),
        StmtKind::If {
            cond,
            body,
            else_body,
            ..
        } => {
            walk_expr(cond, out);
            walk_block(body, out);
            if let Some(else_stmt) = else_body {
                walk_stmt(else_stmt, out);
            }
        }
        StmtKind::Switch { cond, cases, .. } => {
            walk_expr(cond, out);
            for case in cases {
                walk_case(case, out);
            }
        }
        StmtKind::While { cond, body, .. } => {
            walk_expr(cond, out);
            walk_block(body, out);
        }
        StmtKind::For { iter, by, body, .. } => {
            walk_expr(iter, out);
            if let Some(by) = by {
                walk_expr(by, out);
            }
            walk_block(body, out);
        }
        StmtKind::Stop(_) | StmtKind::Break(_) | StmtKind::Continue(_) | StmtKind::Macro(_) => {}
    }
}

fn walk_block(block: &Block, out: &mut Vec<Diagnostic>) {
    report(block.symbol.as_ref(), None, out);
    for stmt in &block.stmts {
        walk_stmt(stmt, out);
    }
}

fn walk_case(case: &SwitchCase, out: &mut Vec<Diagnostic>) {
    report(case.symbol.as_ref(), None, out);
    if let Some(expr) = &case.case {
        walk_expr(expr, out);
    }
    walk_block(&case.body, out);
}

fn walk_decl(decl: &Decl, out: &mut Vec<Diagnostic>) {
    // variable declarations report the declared type against the
    // initializer type
    let sides = match &decl.kind {
        DeclKind::Var {
            init: Some(init), ..
        } => decl
            .symbol
            .as_ref()
            .and_then(|sym| sym.sub.as_deref())
            .map(|lhs| (lhs, init.symbol.as_ref())),
        _ => None,
    };
    report(decl.symbol.as_ref(), sides, out);

    match &decl.kind {
        DeclKind::Var { ty, init, .. } => {
            walk_type(ty, out);
            if let Some(init) = init {
                walk_expr(init, out);
            }
        }
        DeclKind::Func {
            params,
            returns,
            body,
            ..
        }
        | DeclKind::OpFunc {
            params,
            returns,
            body,
            ..
        } => {
            walk_params(params, out);
            walk_params(returns, out);
            walk_block(body, out);
        }
        DeclKind::CastFunc {
            target,
            params,
            returns,
            body,
        } => {
            walk_type(target, out);
            walk_params(params, out);
            walk_params(returns, out);
            walk_block(body, out);
        }
        DeclKind::Enum { base, members, .. } => {
            walk_type(base, out);
            for member in members {
                walk_decl(member, out);
            }
        }
        DeclKind::Pack { members, .. } | DeclKind::Variant { members, .. } => {
            for member in members {
                walk_decl(member, out);
            }
        }
    }
}

fn walk_params(params: &[Param], out: &mut Vec<Diagnostic>) {
    for param in params {
        report(param.symbol.as_ref(), None, out);
        walk_type(&param.ty, out);
    }
}

fn walk_type(ty: &TypeExpr, out: &mut Vec<Diagnostic>) {
    report(ty.symbol.as_ref(), None, out);
    match &ty.kind {
        TypeExprKind::Base { .. } | TypeExprKind::Custom { .. } => {}
        TypeExprKind::Func {
            params, returns, ..
        } => {
            for param in params {
                walk_type(param, out);
            }
            for ret in returns {
                walk_type(ret, out);
            }
        }
        TypeExprKind::Const(inner) | TypeExprKind::Pointer(inner) => walk_type(inner, out),
        TypeExprKind::Array { elem, len } => {
            walk_type(elem, out);
            if let Some(len) = len {
                walk_expr(len, out);
            }
        }
    }
}

fn walk_expr(expr: &Expr, out: &mut Vec<Diagnostic>) {
    // binary expressions and assignments report both operand types
    let sides = match &expr.kind {
        ExprKind::Binary { left, right, .. } => left
            .symbol
            .as_ref()
            .map(|lhs| (lhs, right.symbol.as_ref())),
        ExprKind::Assign { target, value, .. } => target
            .symbol
            .as_ref()
            .map(|lhs| (lhs, value.symbol.as_ref())),
        _ => None,
    };
    report(expr.symbol.as_ref(), sides, out);

    match &expr.kind {
        ExprKind::Variable(_)
        | ExprKind::Int(_)
        | ExprKind::Hex(_)
        | ExprKind::Bool(_)
        | ExprKind::Float(_)
        | ExprKind::Str(_) => {}
        ExprKind::Member { parent, .. } => walk_expr(parent, out),
        ExprKind::Index { parent, index } => {
            walk_expr(parent, out);
            walk_expr(index, out);
        }
        ExprKind::Call { callee, args } => {
            walk_expr(callee, out);
            for arg in args {
                walk_expr(arg, out);
            }
        }
        ExprKind::Assign { target, value, .. } => {
            walk_expr(target, out);
            walk_expr(value, out);
        }
        ExprKind::Binary { left, right, .. } => {
            walk_expr(left, out);
            walk_expr(right, out);
        }
        ExprKind::Unary { operand, .. } => walk_expr(operand, out),
        ExprKind::Cast { target, value } => {
            walk_type(target, out);
            walk_expr(value, out);
        }
        ExprKind::Array { elements } => {
            for element in elements {
                walk_expr(element, out);
            }
        }
        ExprKind::Object { members } => {
            for member in members {
                walk_decl(member, out);
            }
        }
    }
}
