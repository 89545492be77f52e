//! The resolution and type-checking pass
//!
//! A single recursive walk over the AST. Each node is visited once: the
//! walk recurses into the node's children, synthesizes a symbol for the
//! node (its type, or the error found at it), attaches that symbol to the
//! node, and hands it back to the caller.
//!
//! Errors never abort the walk. A node whose child failed attaches a
//! cascade symbol (`ErrorKind::None`) carrying the child error, so one
//! pass accumulates every independent error in the tree. Each leaf error
//! is attached to exactly one node; the diagnostic pass reports those and
//! skips the cascades.

use indexmap::IndexMap;

use crate::errors::{ErrorKind, Pos};
use crate::syntax::ast::{
    Block, Decl, DeclKind, Expr, ExprKind, Param, Program, Stmt, StmtKind, SwitchCase, TypeExpr,
    TypeExprKind,
};
use crate::syntax::token::{OpKind, Token, TokenKind};

use super::mangle::{cast_key, mangle_path};
use super::scope::{Scope, ScopeStack};
use super::symbol::{type_match, SymKind, Symbol, TypeEntry, TypeEntryRef};

const MSG_OPERATOR_TYPES: &str =
    "This operator does not have an implicit or explicit definition for the supplied types.";

/// A cascade symbol: not an error of its own, just a marker that `cause`
/// failed somewhere below this node
fn cascade(cause: Symbol, message: &str) -> Symbol {
    let pos = cause.pos;
    let mut sym = Symbol::error(ErrorKind::None, message);
    sym.pos = pos;
    sym.cause = Some(Box::new(cause));
    sym
}

/// The resolver walks the AST once, filling in every node's symbol slot
/// and building the scope tree as it goes
pub struct Resolver {
    scopes: ScopeStack,
    /// Counter for naming interned anonymous types
    anon_count: usize,
}

impl Resolver {
    pub fn new() -> Self {
        Self {
            scopes: ScopeStack::new(),
            anon_count: 0,
        }
    }

    /// Resolve a whole program and hand back the finished scope tree
    pub fn resolve(mut self, program: &mut Program) -> Scope {
        self.resolve_program(program);
        self.scopes.into_global()
    }

    fn resolve_program(&mut self, program: &mut Program) -> Symbol {
        let mut first_err = None;
        for stmt in &mut program.stmts {
            let res = self.resolve_stmt(stmt);
            if res.is_error() && first_err.is_none() {
                first_err = Some(res);
            }
        }
        let sym = match first_err {
            Some(err) => cascade(err, "There is an error further down the tree."),
            None => Symbol::none(),
        };
        program.symbol = Some(sym.clone());
        sym
    }

    /// Resolve a block in the current scope
    fn resolve_block(&mut self, block: &mut Block) -> Symbol {
        let mut first_err = None;
        for stmt in &mut block.stmts {
            let res = self.resolve_stmt(stmt);
            if res.is_error() && first_err.is_none() {
                first_err = Some(res);
            }
        }
        let sym = match first_err {
            Some(err) => cascade(err, "There is an error further down the tree."),
            None => Symbol::none(),
        };
        block.symbol = Some(sym.clone());
        sym
    }

    /// Resolve a block in a fresh child scope
    fn resolve_block_scoped(&mut self, name: &str, block: &mut Block) -> Symbol {
        self.scopes.push(name);
        let res = self.resolve_block(block);
        self.scopes.pop();
        res
    }

    fn resolve_stmt(&mut self, stmt: &mut Stmt) -> Symbol {
        let sym = match &mut stmt.kind {
            StmtKind::Dec(decl) => {
                let res = self.resolve_decl(decl);
                if res.is_error() {
                    cascade(res, "There is an error further down the tree.")
                } else {
                    Symbol::none()
                }
            }
            StmtKind::Expr(expr) => {
                let res = self.resolve_expr(expr);
                if res.is_error() {
                    cascade(res, "There is an error further down the tree.")
                } else {
                    Symbol::none()
                }
            }
            StmtKind::Block(block) => {
                let res = self.resolve_block(block);
                if res.is_error() {
                    cascade(res, "There is an error further down the tree.")
                } else {
                    Symbol::none()
                }
            }
            StmtKind::If {
                start,
                cond,
                body,
                else_body,
            } => {
                let start = start.clone();
                self.resolve_if(&start, cond, body, else_body.as_deref_mut())
            }
            StmtKind::Switch { cond, cases, .. } => {
                let cond_sym = self.resolve_expr(cond);
                let mut case_err = None;
                for case in cases.iter_mut() {
                    let res = self.resolve_switch_case(case, &cond_sym);
                    if res.is_error() && case_err.is_none() {
                        case_err = Some(res);
                    }
                }
                if cond_sym.is_error() {
                    cascade(
                        cond_sym,
                        "There was an error in the condition of this switch statement.",
                    )
                } else if let Some(err) = case_err {
                    cascade(err, "There was an error in one of the case statements.")
                } else {
                    Symbol::none()
                }
            }
            StmtKind::While { start, cond, body } => {
                let pos = start.pos;
                let cond_sym = self.resolve_expr(cond);
                let body_res = self.resolve_block_scoped("while", body);
                if cond_sym.is_error() {
                    cascade(
                        cond_sym,
                        "There was an error in the condition of this while loop.",
                    )
                } else if !cond_sym.is_boolean() {
                    Symbol::error(
                        ErrorKind::UnexpectedType,
                        "The while condition must evaluate to a boolean.",
                    )
                    .at(pos)
                } else if body_res.is_error() {
                    cascade(body_res, "The body of this while loop has an error in it.")
                } else {
                    Symbol::none()
                }
            }
            StmtKind::For {
                start,
                id,
                iter,
                by,
                body,
            } => {
                let pos = start.pos;
                let id = id.clone();
                self.resolve_for(pos, &id, iter, by.as_mut(), body)
            }
            StmtKind::Stop(_) | StmtKind::Break(_) | StmtKind::Continue(_) => Symbol::none(),
            // macros are opaque here and type-check as no-ops
            StmtKind::Macro(_) => Symbol::none(),
        };
        stmt.symbol = Some(sym.clone());
        sym
    }

    fn resolve_if(
        &mut self,
        start: &Token,
        cond: &mut Expr,
        body: &mut Block,
        else_body: Option<&mut Stmt>,
    ) -> Symbol {
        let cond_sym = self.resolve_expr(cond);
        let head_err = if cond_sym.is_error() {
            Some(cascade(
                cond_sym,
                "There was an error in the condition of this if statement.",
            ))
        } else if !cond_sym.is_boolean() {
            Some(
                Symbol::error(
                    ErrorKind::UnexpectedType,
                    "The condition for if statements must evaluate to a boolean.",
                )
                .at(start.pos),
            )
        } else {
            None
        };

        let body_res = self.resolve_block(body);
        let else_res = else_body.map(|stmt| self.resolve_stmt(stmt));

        if let Some(err) = head_err {
            err
        } else if body_res.is_error() {
            cascade(
                body_res,
                "There was an error in the true branch of this if block.",
            )
        } else if let Some(res) = else_res {
            if res.is_error() {
                cascade(res, "There was an error in the false branch of this if block.")
            } else {
                Symbol::none()
            }
        } else {
            Symbol::none()
        }
    }

    fn resolve_switch_case(&mut self, case: &mut SwitchCase, cond_sym: &Symbol) -> Symbol {
        let mut head_err = None;
        if let Some(expr) = &mut case.case {
            let pos = expr.pos();
            let case_sym = self.resolve_expr(expr);
            if case_sym.is_error() {
                head_err = Some(cascade(
                    case_sym,
                    "There was an error in the condition of this switch case.",
                ));
            } else if !case_sym.computed {
                head_err = Some(
                    Symbol::error(
                        ErrorKind::RuntimeCaseCondition,
                        "The case condition must be able to be evaluated at compile time. \
                         If you are doing calculations in the case condition make sure any \
                         variables are determined at compile-time.",
                    )
                    .at(pos),
                );
            } else if !cond_sym.is_error() && !type_match(&case_sym, cond_sym) {
                let mut err = Symbol::error(
                    ErrorKind::UnexpectedType,
                    "The case condition doesn't match the switch condition.",
                )
                .at(pos);
                err.sub = Some(Box::new(case_sym));
                head_err = Some(err);
            }
        }

        let body_res = self.resolve_block_scoped("case", &mut case.body);

        let sym = if let Some(err) = head_err {
            err
        } else if body_res.is_error() {
            cascade(body_res, "There was an error in the body of this case.")
        } else {
            Symbol::none()
        };
        case.symbol = Some(sym.clone());
        sym
    }

    fn resolve_for(
        &mut self,
        pos: Pos,
        id: &Token,
        iter: &mut Expr,
        by: Option<&mut Expr>,
        body: &mut Block,
    ) -> Symbol {
        let iter_sym = self.resolve_expr(iter);
        let by_sym = by.map(|expr| self.resolve_expr(expr));

        let head_err = if iter_sym.is_error() {
            Some(cascade(
                iter_sym.clone(),
                "There was an error in the iterator or the by expression.",
            ))
        } else if by_sym.as_ref().is_some_and(|s| s.is_error()) {
            Some(cascade(
                by_sym.clone().expect("by symbol was just checked"),
                "There was an error in the iterator or the by expression.",
            ))
        } else if !iter_sym.is_array() {
            Some(
                Symbol::error(
                    ErrorKind::UnexpectedType,
                    "The iterator must evaluate to an array type.",
                )
                .at(pos),
            )
        } else if by_sym.as_ref().is_some_and(|s| !s.is_number()) {
            Some(
                Symbol::error(ErrorKind::UnexpectedType, "By must evaluate to a number.").at(pos),
            )
        } else {
            None
        };

        // bind the loop variable to the iterator's element type
        let mut elem = match (&head_err, &iter_sym.sub) {
            (None, Some(sub)) => (**sub).clone(),
            _ => Symbol::unknown(),
        };
        elem.name = id.text.clone();
        elem.assignable = true;
        elem.computed = false;
        elem.pos = Some(id.pos);

        self.scopes.push("for");
        self.scopes.define(&id.text, elem);
        let body_res = self.resolve_block(body);
        self.scopes.pop();

        if let Some(err) = head_err {
            err
        } else if body_res.is_error() {
            cascade(body_res, "The body of this for loop has an error in it.")
        } else {
            Symbol::none()
        }
    }

    fn resolve_decl(&mut self, decl: &mut Decl) -> Symbol {
        let pos = decl.pos();
        let sym = match &mut decl.kind {
            DeclKind::Var { id, ty, init } => {
                let id = id.clone();
                self.resolve_var_dec(&id, ty, init.as_deref_mut())
            }
            DeclKind::Func {
                id,
                params,
                returns,
                body,
            } => {
                let id = id.clone();
                let param_syms = self.resolve_params(params);
                let return_syms = self.resolve_params(returns);
                let fn_sym =
                    Symbol::function(&id.text, param_syms.clone(), return_syms.clone()).at(id.pos);
                let conflict = self.scopes.define(&id.text, fn_sym.clone());
                let body_res = self.resolve_body(&id.text, &param_syms, &return_syms, body);

                if conflict.is_some() {
                    Symbol::error(
                        ErrorKind::Redeclaration,
                        "A function with this name and parameter types has already been declared.",
                    )
                    .at(id.pos)
                } else if body_res.is_error() {
                    let mut err =
                        cascade(body_res, "There was an error in the body of this function.");
                    err.sub = Some(Box::new(fn_sym));
                    err
                } else {
                    fn_sym
                }
            }
            DeclKind::OpFunc {
                op,
                params,
                returns,
                body,
            } => {
                let op = op.clone();
                self.resolve_op_func(&op, params, returns, body)
            }
            DeclKind::CastFunc {
                target,
                params,
                returns,
                body,
            } => self.resolve_cast_func(target, params, returns, body),
            DeclKind::Enum { id, base, members } => {
                let id = id.clone();
                self.resolve_enum_dec(&id, base, members)
            }
            DeclKind::Pack { id, members } => {
                let id = id.clone();
                self.resolve_aggregate_dec(&id, SymKind::Custom, members)
            }
            DeclKind::Variant { id, members } => {
                let id = id.clone();
                self.resolve_aggregate_dec(&id, SymKind::Variant, members)
            }
        };
        let sym = if sym.pos.is_none() { sym.at(pos) } else { sym };
        decl.symbol = Some(sym.clone());
        sym
    }

    fn resolve_var_dec(&mut self, id: &Token, ty: &mut TypeExpr, init: Option<&mut Expr>) -> Symbol {
        let ty_sym = self.resolve_type(ty);
        if ty_sym.is_error() {
            // still walk the initializer so its nodes carry symbols
            if let Some(expr) = init {
                self.resolve_expr(expr);
            }
            return cascade(ty_sym, "There is an error in the type of this declaration.")
                .at(id.pos);
        }

        let mut sym = ty_sym;
        sym.name = id.text.clone();
        sym.assignable = true;
        sym.pos = Some(id.pos);

        // the initializer is resolved before the name is bound, so the
        // right-hand side sees the outer binding when shadowing
        let init_sym = init.map(|expr| self.resolve_expr(expr));
        if sym.constant {
            if let Some(res) = &init_sym {
                if !res.is_error() && res.computed {
                    sym.computed = true;
                }
            }
        }

        let conflict = self.scopes.define(&id.text, sym.clone());

        let mut result = sym.clone();
        if let Some(res) = init_sym {
            if res.is_error() {
                let mut err =
                    cascade(res, "There is an error in the initializer of this declaration.");
                err.sub = Some(Box::new(sym.clone()));
                result = err;
            } else if !type_match(&sym, &res) {
                let mut err = Symbol::error(
                    ErrorKind::LhsRhsTypeMismatch,
                    "The right hand side of the assignment does not have the same type as the left hand side.",
                )
                .at(id.pos);
                err.sub = Some(Box::new(sym.clone()));
                result = err;
            }
        }
        if let Some(conflicting) = conflict {
            let mut err = Symbol::error(
                ErrorKind::Redeclaration,
                "This variable has already been declared.",
            )
            .at(id.pos);
            err.sub = Some(Box::new(conflicting));
            result = err;
        }
        result
    }

    fn resolve_op_func(
        &mut self,
        op: &Token,
        params: &mut Vec<Param>,
        returns: &mut Vec<Param>,
        body: &mut Block,
    ) -> Symbol {
        let param_syms = self.resolve_params(params);
        let return_syms = self.resolve_params(returns);

        let arity_msg = match op.kind {
            TokenKind::Op(OpKind::Add) => (params.is_empty() || params.len() > 2)
                .then_some("This operator function can only have one or two parameters."),
            TokenKind::Op(OpKind::Not) | TokenKind::Op(OpKind::Question) | TokenKind::Op(OpKind::Tilde) => {
                (params.len() != 1).then_some("This operator function can only have one parameter.")
            }
            TokenKind::Op(OpKind::Log)
            | TokenKind::Op(OpKind::Bit)
            | TokenKind::Op(OpKind::Eq)
            | TokenKind::Op(OpKind::Rel)
            | TokenKind::Op(OpKind::Shift)
            | TokenKind::Op(OpKind::Mul)
            | TokenKind::Op(OpKind::Range)
            | TokenKind::LeftAngle
            | TokenKind::RightAngle => {
                (params.len() != 2).then_some("This operator function can only have two parameters.")
            }
            _ => None,
        };

        let fn_sym =
            Symbol::function(&op.text, param_syms.clone(), return_syms.clone()).at(op.pos);
        let conflict = if arity_msg.is_none() {
            self.scopes.define(&op.text, fn_sym.clone())
        } else {
            None
        };
        let body_res = self.resolve_body(&op.text, &param_syms, &return_syms, body);

        if let Some(msg) = arity_msg {
            Symbol::error(ErrorKind::OpFuncParameterSizeMismatch, msg).at(op.pos)
        } else if conflict.is_some() {
            Symbol::error(
                ErrorKind::Redeclaration,
                "An operator function already exists for this operator and parameter types.",
            )
            .at(op.pos)
        } else if body_res.is_error() {
            let mut err = cascade(
                body_res,
                "There was an error in the body of this operator function.",
            );
            err.sub = Some(Box::new(fn_sym));
            err
        } else {
            fn_sym
        }
    }

    fn resolve_cast_func(
        &mut self,
        target: &mut TypeExpr,
        params: &mut Vec<Param>,
        returns: &mut Vec<Param>,
        body: &mut Block,
    ) -> Symbol {
        let pos = target.pos();
        let param_syms = self.resolve_params(params);
        let return_syms = self.resolve_params(returns);
        let target_sym = self.resolve_type(target);

        let head_err = if params.len() != 1 {
            Some(Symbol::error(
                ErrorKind::CastFuncMultipleParams,
                "A cast function can only have a single parameter.",
            ))
        } else if returns.len() != 1 {
            Some(Symbol::error(
                ErrorKind::CastFuncMultipleReturns,
                "A cast function can only have a single return.",
            ))
        } else if target_sym.is_error() {
            Some(cascade(
                target_sym.clone(),
                "There is an error in the casting type of this cast function.",
            ))
        } else if !type_match(&target_sym, &return_syms[0]) {
            Some(Symbol::error(
                ErrorKind::CastFuncReturnTypeMismatch,
                "The casting type must match the return type of a cast function.",
            ))
        } else {
            None
        };

        let name = cast_key(target);
        let fn_sym = Symbol::function(&name, param_syms.clone(), return_syms.clone()).at(pos);
        let conflict = if head_err.is_none() {
            self.scopes.define(&name, fn_sym.clone())
        } else {
            None
        };
        let body_res = self.resolve_body(&name, &param_syms, &return_syms, body);

        if let Some(err) = head_err {
            err.at(pos)
        } else if conflict.is_some() {
            Symbol::error(
                ErrorKind::Redeclaration,
                "A casting function already exists for this set of types in this order.",
            )
            .at(pos)
        } else if body_res.is_error() {
            let mut err = cascade(
                body_res,
                "There was an error in the body of this cast function.",
            );
            err.sub = Some(Box::new(fn_sym));
            err
        } else {
            fn_sym
        }
    }

    fn resolve_enum_dec(
        &mut self,
        id: &Token,
        base: &mut TypeExpr,
        members: &mut [Decl],
    ) -> Symbol {
        let base_sym = self.resolve_type(base);
        let mut entry = TypeEntry::new(&id.text, SymKind::Enum);
        if !base_sym.is_error() {
            entry.sub = Some(base_sym.clone());
        }
        let entry_ref = entry.into_ref();

        let mut member_err = None;
        for member in members.iter_mut() {
            if let Some((name, sym)) = self.resolve_enum_member(member, &base_sym) {
                if sym.is_error() {
                    if member_err.is_none() {
                        member_err = Some(sym);
                    }
                } else {
                    entry_ref.borrow_mut().add_member(name, sym);
                }
            } else if member_err.is_none() {
                if let Some(sym) = member.symbol.as_ref().filter(|s| s.is_error()) {
                    member_err = Some(sym.clone());
                }
            }
        }

        self.scopes.add_type(&id.text, entry_ref.clone());

        if base_sym.is_error() {
            cascade(base_sym, "There was an error in the base type of this enum.")
        } else if let Some(err) = member_err {
            cascade(err, "There was an error in one of the members of this enum.")
        } else {
            let mut sym = Symbol::new(&id.text, SymKind::Enum, Some(base_sym));
            sym.custom_type_name = id.text.clone();
            sym.type_ref = Some(entry_ref);
            sym
        }
    }

    /// Enum members take the enum's underlying type and are compile-time
    /// constants, so they are usable as switch-case conditions
    fn resolve_enum_member(&mut self, decl: &mut Decl, base: &Symbol) -> Option<(String, Symbol)> {
        match &mut decl.kind {
            DeclKind::Var { id, ty, init } => {
                let id = id.clone();
                self.resolve_type(ty);
                let mut member = if base.is_error() {
                    Symbol::unknown()
                } else {
                    base.clone()
                };
                member.name = id.text.clone();
                member.constant = true;
                member.computed = true;
                member.assignable = false;
                member.pos = Some(id.pos);

                let mut result = member.clone();
                if let Some(init) = init {
                    let init_sym = self.resolve_expr(init);
                    if init_sym.is_error() {
                        result = cascade(
                            init_sym,
                            "There is an error in the value of this enum member.",
                        );
                    } else if !base.is_error() && !type_match(base, &init_sym) {
                        let mut err = Symbol::error(
                            ErrorKind::LhsRhsTypeMismatch,
                            "The value of an enum member must match the enum's underlying type.",
                        )
                        .at(id.pos);
                        err.sub = Some(Box::new(member.clone()));
                        result = err;
                    }
                }
                decl.symbol = Some(result.clone());
                Some((id.text.clone(), if result.is_error() { result } else { member }))
            }
            _ => {
                self.resolve_decl(decl);
                None
            }
        }
    }

    fn resolve_aggregate_dec(
        &mut self,
        id: &Token,
        kind: SymKind,
        members: &mut [Decl],
    ) -> Symbol {
        let entry_ref = TypeEntry::new(&id.text, kind).into_ref();

        let mut member_err = None;
        for member in members.iter_mut() {
            if let Some((name, sym)) = self.resolve_aggregate_member(member) {
                if sym.is_error() {
                    if member_err.is_none() {
                        member_err = Some(sym);
                    }
                } else {
                    entry_ref.borrow_mut().add_member(name, sym);
                }
            } else if member_err.is_none() {
                if let Some(sym) = member.symbol.as_ref().filter(|s| s.is_error()) {
                    member_err = Some(sym.clone());
                }
            }
        }

        self.scopes.add_type(&id.text, entry_ref.clone());

        if let Some(err) = member_err {
            cascade(err, "There was an error in one of the members of this type.")
        } else {
            let mut sym = Symbol::new(&id.text, kind, None);
            sym.custom_type_name = id.text.clone();
            sym.type_ref = Some(entry_ref);
            sym
        }
    }

    /// Resolve one member of a pack, variant, or object literal without
    /// binding anything into the enclosing scope
    fn resolve_aggregate_member(&mut self, decl: &mut Decl) -> Option<(String, Symbol)> {
        match &mut decl.kind {
            DeclKind::Var { id, ty, init } => {
                let id = id.clone();
                let ty_sym = self.resolve_type(ty);
                if ty_sym.is_error() {
                    if let Some(init) = init {
                        self.resolve_expr(init);
                    }
                    let err = cascade(ty_sym, "There is an error in the type of this member.")
                        .at(id.pos);
                    decl.symbol = Some(err.clone());
                    return Some((id.text.clone(), err));
                }

                let mut member = ty_sym;
                member.name = id.text.clone();
                member.assignable = true;
                member.pos = Some(id.pos);

                let mut result = member.clone();
                if let Some(init) = init {
                    let init_sym = self.resolve_expr(init);
                    if init_sym.is_error() {
                        result = cascade(
                            init_sym,
                            "There is an error in the initializer of this member.",
                        );
                    } else if !type_match(&member, &init_sym) {
                        let mut err = Symbol::error(
                            ErrorKind::LhsRhsTypeMismatch,
                            "The right hand side of the assignment does not have the same type as the left hand side.",
                        )
                        .at(id.pos);
                        err.sub = Some(Box::new(member.clone()));
                        result = err;
                    } else {
                        member.computed = init_sym.computed;
                        result = member.clone();
                    }
                }
                decl.symbol = Some(result.clone());
                Some((id.text.clone(), if result.is_error() { result } else { member }))
            }
            DeclKind::Func {
                id,
                params,
                returns,
                body,
            } => {
                let id = id.clone();
                let param_syms = self.resolve_params(params);
                let return_syms = self.resolve_params(returns);
                let fn_sym =
                    Symbol::function(&id.text, param_syms.clone(), return_syms.clone()).at(id.pos);
                let body_res = self.resolve_body(&id.text, &param_syms, &return_syms, body);
                let result = if body_res.is_error() {
                    let mut err =
                        cascade(body_res, "There was an error in the body of this function.");
                    err.sub = Some(Box::new(fn_sym.clone()));
                    err
                } else {
                    fn_sym.clone()
                };
                decl.symbol = Some(result.clone());
                Some((id.text.clone(), if result.is_error() { result } else { fn_sym }))
            }
            _ => {
                self.resolve_decl(decl);
                None
            }
        }
    }

    /// Resolve parameter type annotations in the current scope
    fn resolve_params(&mut self, params: &mut [Param]) -> Vec<Symbol> {
        params
            .iter_mut()
            .map(|param| {
                let ty_sym = self.resolve_type(&mut param.ty);
                let sym = if ty_sym.is_error() {
                    cascade(ty_sym, "There is an error in the type of this parameter.")
                        .at(param.id.pos)
                } else {
                    let mut sym = ty_sym;
                    sym.name = param.id.text.clone();
                    sym.assignable = true;
                    sym.pos = Some(param.id.pos);
                    sym
                };
                param.symbol = Some(sym.clone());
                sym
            })
            .collect()
    }

    /// Resolve a callable body in a fresh child scope with the parameter
    /// and return names bound
    fn resolve_body(
        &mut self,
        name: &str,
        params: &[Symbol],
        returns: &[Symbol],
        body: &mut Block,
    ) -> Symbol {
        self.scopes.push(name);
        for sym in params.iter().chain(returns.iter()) {
            if !sym.is_error() {
                self.scopes.define(&sym.name, sym.clone());
            }
        }
        let res = self.resolve_block(body);
        self.scopes.pop();
        res
    }

    fn resolve_type(&mut self, ty: &mut TypeExpr) -> Symbol {
        let pos = ty.pos();
        let sym = match &mut ty.kind {
            TypeExprKind::Base { ty: tok, auto_name } => {
                if tok.kind == TokenKind::Auto {
                    let mut sym = Symbol::basic(SymKind::Auto);
                    if let Some(name) = auto_name {
                        let entry = TypeEntry::new(&name.text, SymKind::Unknown).into_ref();
                        if self.scopes.add_type(&name.text, entry.clone()).is_some() {
                            let mut err = Symbol::error(
                                ErrorKind::Redeclaration,
                                "This auto type name is already another type or another anonymous type in this scope.",
                            );
                            err.sub = Some(Box::new(sym));
                            err
                        } else {
                            sym.custom_type_name = name.text.clone();
                            sym.type_ref = Some(entry);
                            sym
                        }
                    } else {
                        sym
                    }
                } else {
                    Symbol::basic(SymKind::from_lexeme(&tok.text))
                }
            }
            TypeExprKind::Custom { path } => {
                let name = mangle_path(path);
                match self.scopes.lookup_type(&name) {
                    None => Symbol::error(ErrorKind::NotFound, "Type not found."),
                    Some(entry) => {
                        let (kind, sub, entry_name) = {
                            let borrowed = entry.borrow();
                            (borrowed.kind, borrowed.sub.clone(), borrowed.name.clone())
                        };
                        let mut sym = Symbol::new("", kind, sub);
                        sym.custom_type_name = entry_name;
                        sym.type_ref = Some(entry);
                        sym
                    }
                }
            }
            TypeExprKind::Func {
                params, returns, ..
            } => {
                let param_syms: Vec<Symbol> =
                    params.iter_mut().map(|p| self.resolve_type(p)).collect();
                let return_syms: Vec<Symbol> =
                    returns.iter_mut().map(|r| self.resolve_type(r)).collect();
                match param_syms
                    .iter()
                    .chain(return_syms.iter())
                    .find(|s| s.is_error())
                {
                    Some(err) => cascade(
                        err.clone(),
                        "There is an error in the signature of this function type.",
                    ),
                    None => Symbol::function("", param_syms, return_syms),
                }
            }
            TypeExprKind::Const(inner) => {
                let inner_sym = self.resolve_type(inner);
                if inner_sym.is_error() {
                    cascade(inner_sym, "There is an error further down the tree.")
                } else {
                    let mut sym = inner_sym;
                    sym.constant = true;
                    sym
                }
            }
            TypeExprKind::Pointer(inner) => {
                let inner_sym = self.resolve_type(inner);
                if inner_sym.is_error() {
                    cascade(inner_sym, "There is an error further down the tree.")
                } else {
                    let mut sym = inner_sym;
                    sym.ptr_depth += 1;
                    sym
                }
            }
            TypeExprKind::Array { elem, len } => {
                let elem_sym = self.resolve_type(elem);
                let len_sym = len.as_mut().map(|expr| self.resolve_expr(expr));
                if elem_sym.is_error() {
                    cascade(elem_sym, "There is an error further down the tree.")
                } else if len_sym.as_ref().is_some_and(|s| !s.is_number()) {
                    let mut err = Symbol::error(
                        ErrorKind::SizeParameterNotNumber,
                        "The size parameter of this array type is not a number.",
                    );
                    err.sub = Some(Box::new(Symbol::array(elem_sym)));
                    err
                } else {
                    Symbol::array(elem_sym)
                }
            }
        };
        let sym = if sym.pos.is_none() { sym.at(pos) } else { sym };
        ty.symbol = Some(sym.clone());
        sym
    }

    fn resolve_expr(&mut self, expr: &mut Expr) -> Symbol {
        let pos = expr.pos();
        let sym = match &mut expr.kind {
            ExprKind::Variable(path) => {
                let name = mangle_path(path);
                match self.scopes.lookup_var(&name) {
                    Some(found) => found,
                    None => Symbol::error(
                        ErrorKind::UnknownVariable,
                        "This variable could not be found from the current scope.",
                    ),
                }
            }
            ExprKind::Member { parent, field } => {
                let field = field.clone();
                let parent_sym = self.resolve_expr(parent);
                if parent_sym.is_error() {
                    cascade(
                        parent_sym,
                        "There was an error in the parent of this member access.",
                    )
                } else {
                    match &parent_sym.type_ref {
                        None => Symbol::error(
                            ErrorKind::NoMemberVariables,
                            "This variable has no member variables.",
                        ),
                        Some(entry) => match entry.borrow().member(&field.text) {
                            None => Symbol::error(
                                ErrorKind::TypeDoesNotHaveMember,
                                "This type does not have a member variable with that name.",
                            ),
                            Some(member) => member,
                        },
                    }
                }
            }
            ExprKind::Index { parent, index } => {
                let parent_sym = self.resolve_expr(parent);
                let index_sym = self.resolve_expr(index);
                if parent_sym.is_error() {
                    cascade(
                        parent_sym,
                        "There was an error in the parent of this array access.",
                    )
                } else if index_sym.is_error() {
                    cascade(
                        index_sym,
                        "There was an error in the index of this array access.",
                    )
                } else if parent_sym.kind != SymKind::Array {
                    Symbol::error(
                        ErrorKind::NotIterableType,
                        "This type is not iterable so it cannot be accessed through array access.",
                    )
                } else if !index_sym.is_number() {
                    Symbol::error(
                        ErrorKind::UnexpectedType,
                        "Indexes for an iterable type must be a number.",
                    )
                } else {
                    let mut elem = match &parent_sym.sub {
                        Some(sub) => (**sub).clone(),
                        None => Symbol::unknown(),
                    };
                    elem.assignable = parent_sym.assignable;
                    elem
                }
            }
            ExprKind::Call { callee, args } => self.resolve_call(callee, args),
            ExprKind::Assign { op, target, value } => {
                let op = op.clone();
                self.resolve_assign(&op, target, value)
            }
            ExprKind::Binary { op, left, right } => {
                let op = op.clone();
                self.resolve_binary(&op, left, right)
            }
            ExprKind::Unary { op, operand } => {
                let op = op.clone();
                self.resolve_unary(&op, operand)
            }
            ExprKind::Cast { target, value } => self.resolve_cast(target, value),
            ExprKind::Int(_) => {
                let mut sym = Symbol::basic(SymKind::U64);
                sym.computed = true;
                sym
            }
            ExprKind::Hex(tok) => {
                let byte_len = (tok.text.len() + 1) / 2;
                let mut sym = Symbol::hex(byte_len);
                sym.computed = true;
                sym
            }
            ExprKind::Bool(_) => {
                let mut sym = Symbol::boolean();
                sym.computed = true;
                sym
            }
            ExprKind::Float(_) => {
                let mut sym = Symbol::basic(SymKind::F128);
                sym.computed = true;
                sym
            }
            ExprKind::Str(_) => {
                let mut sym = Symbol::string();
                sym.computed = true;
                sym
            }
            ExprKind::Array { elements } => self.resolve_array_value(elements),
            ExprKind::Object { members } => self.resolve_object_value(members),
        };
        let sym = if sym.pos.is_none() || !sym.is_error() {
            sym.at(pos)
        } else {
            sym
        };
        expr.symbol = Some(sym.clone());
        sym
    }

    fn resolve_call(&mut self, callee: &mut Expr, args: &mut [Expr]) -> Symbol {
        let mut arg_syms = Vec::with_capacity(args.len());
        let mut arg_err = None;
        for arg in args.iter_mut() {
            let sym = self.resolve_expr(arg);
            if sym.is_error() && arg_err.is_none() {
                arg_err = Some(sym.clone());
            }
            arg_syms.push(sym);
        }

        if let Some(err) = arg_err {
            if callee.symbol.is_none() {
                callee.symbol = Some(Symbol::none().at(callee.pos()));
            }
            return cascade(err, "There was an error in an argument of this call.");
        }

        if let ExprKind::Variable(path) = &callee.kind {
            let name = mangle_path(path);
            match self.scopes.lookup_func(&name, &arg_syms) {
                None => {
                    callee.symbol = Some(Symbol::none().at(callee.pos()));
                    Symbol::error(
                        ErrorKind::NotFound,
                        "No function with this name and the supplied parameter types could be found from the current scope.",
                    )
                }
                Some(func) => {
                    callee.symbol = Some(func.clone().at(callee.pos()));
                    self.call_result(&func)
                }
            }
        } else {
            let callee_sym = self.resolve_expr(callee);
            if callee_sym.is_error() {
                cascade(callee_sym, "There was an error in the callee of this call.")
            } else if callee_sym.kind == SymKind::Func
                && callee_sym.params.as_ref().is_some_and(|params| {
                    params.len() == arg_syms.len()
                        && params
                            .iter()
                            .zip(arg_syms.iter())
                            .all(|(p, a)| type_match(p, a))
                })
            {
                self.call_result(&callee_sym)
            } else {
                Symbol::error(
                    ErrorKind::NotFound,
                    "No function with this name and the supplied parameter types could be found from the current scope.",
                )
            }
        }
    }

    /// The type of a call to `func`: nothing, the single return, or an
    /// interned anonymous pack wrapping the full return list
    fn call_result(&mut self, func: &Symbol) -> Symbol {
        let returns = func.returns.as_deref().unwrap_or(&[]);
        match returns {
            [] => Symbol::none(),
            [single] => {
                let mut sym = single.clone();
                sym.assignable = false;
                sym.computed = false;
                sym
            }
            many => {
                let mut members = IndexMap::new();
                for ret in many {
                    members.insert(ret.name.clone(), ret.clone());
                }
                let entry = self.intern_members(members);
                let (kind, entry_name) = {
                    let borrowed = entry.borrow();
                    (borrowed.kind, borrowed.name.clone())
                };
                let mut sym = Symbol::new("", kind, None);
                sym.custom_type_name = entry_name;
                sym.type_ref = Some(entry);
                sym
            }
        }
    }

    /// Find a registered type with this member shape, or register a fresh
    /// anonymous entry in the current scope
    fn intern_members(&mut self, members: IndexMap<String, Symbol>) -> TypeEntryRef {
        if let Some(entry) = self.scopes.lookup_type_by_members(&members) {
            return entry;
        }
        let name = format!("<anonymous-{}>", self.anon_count);
        self.anon_count += 1;
        let mut entry = TypeEntry::new(&name, SymKind::Custom);
        entry.members = members;
        let entry = entry.into_ref();
        self.scopes.add_type(&name, entry.clone());
        entry
    }

    fn resolve_assign(&mut self, op: &Token, target: &mut Expr, value: &mut Expr) -> Symbol {
        let target_sym = self.resolve_expr(target);
        let value_sym = self.resolve_expr(value);

        if target_sym.is_error() {
            cascade(
                target_sym,
                "There was an error in the target of this assignment.",
            )
        } else if value_sym.is_error() {
            cascade(
                value_sym,
                "There was an error in the value of this assignment.",
            )
        } else if !target_sym.assignable {
            Symbol::error(
                ErrorKind::UnexpectedType,
                "The left hand side of an assignment must be an assignable location.",
            )
            .at(op.pos)
        } else if target_sym.constant {
            Symbol::error(ErrorKind::UnexpectedType, "Cannot assign to a constant.").at(op.pos)
        } else if !type_match(&target_sym, &value_sym) {
            let mut err = Symbol::error(
                ErrorKind::LhsRhsTypeMismatch,
                "The right hand side of the assignment does not have the same type as the left hand side.",
            )
            .at(op.pos);
            err.sub = Some(Box::new(target_sym));
            err
        } else {
            target_sym
        }
    }

    fn resolve_binary(&mut self, op: &Token, left: &mut Expr, right: &mut Expr) -> Symbol {
        let l = self.resolve_expr(left);
        let r = self.resolve_expr(right);

        if l.is_error() {
            return cascade(l, "There was an error further down the tree.");
        }
        if r.is_error() {
            return cascade(r, "There was an error further down the tree.");
        }

        // a user-declared operator overload takes precedence over the
        // built-in rules
        if let Some(func) = self.scopes.lookup_func(&op.text, &[l.clone(), r.clone()]) {
            return self.call_result(&func);
        }

        let computed = l.computed && r.computed;
        let sub_is_number = |s: &Symbol| s.sub.as_ref().is_some_and(|x| x.is_number());
        let sub_is_boolean = |s: &Symbol| s.sub.as_ref().is_some_and(|x| x.is_boolean());

        let result = match op.kind {
            TokenKind::Op(OpKind::Eq) => {
                if type_match(&l, &r) {
                    Some(Symbol::boolean())
                } else {
                    None
                }
            }
            TokenKind::Op(OpKind::Rel) | TokenKind::LeftAngle | TokenKind::RightAngle => {
                if l.is_number() && r.is_number() {
                    Some(Symbol::boolean())
                } else {
                    None
                }
            }
            TokenKind::Op(OpKind::Shift) => {
                let shiftable = l.is_number()
                    || (l.is_array() && (sub_is_number(&l) || sub_is_boolean(&l)));
                if shiftable && r.is_number() {
                    Some(l.clone())
                } else {
                    None
                }
            }
            TokenKind::Op(OpKind::Log) => {
                if l.is_boolean() && r.is_boolean() {
                    Some(Symbol::boolean())
                } else {
                    None
                }
            }
            TokenKind::Op(OpKind::Bit) => {
                let bitable = l.is_number()
                    || l.is_boolean()
                    || (l.is_array() && (sub_is_number(&l) || sub_is_boolean(&l)));
                if type_match(&l, &r) && bitable {
                    Some(l.clone())
                } else {
                    None
                }
            }
            TokenKind::Op(OpKind::Add) => {
                if (l.is_number() && r.is_number()) || (l.is_string() && r.is_string()) {
                    Some(l.clone())
                } else {
                    None
                }
            }
            TokenKind::Op(OpKind::Mul) => {
                if l.is_number() && r.is_number() {
                    Some(l.clone())
                } else {
                    None
                }
            }
            TokenKind::Op(OpKind::Range) => {
                if l.is_number() && r.is_number() {
                    let mut elem = l.clone();
                    elem.assignable = false;
                    Some(Symbol::array(elem))
                } else {
                    None
                }
            }
            _ => {
                return Symbol::error(ErrorKind::UhOh, "Unknown binary expression operator.")
                    .at(op.pos)
            }
        };

        match result {
            Some(mut sym) => {
                sym.assignable = false;
                sym.computed = computed;
                sym.name = String::new();
                sym
            }
            None => Symbol::error(ErrorKind::UnexpectedType, MSG_OPERATOR_TYPES).at(op.pos),
        }
    }

    fn resolve_unary(&mut self, op: &Token, operand: &mut Expr) -> Symbol {
        let o = self.resolve_expr(operand);
        if o.is_error() {
            return cascade(o, "There was an error further down the tree.");
        }

        if let Some(func) = self.scopes.lookup_func(&op.text, &[o.clone()]) {
            return self.call_result(&func);
        }

        let sub_is_number = |s: &Symbol| s.sub.as_ref().is_some_and(|x| x.is_number());
        let sub_is_boolean = |s: &Symbol| s.sub.as_ref().is_some_and(|x| x.is_boolean());

        match op.kind {
            TokenKind::Op(OpKind::Not) => {
                if o.is_boolean() {
                    let mut sym = o.clone();
                    sym.assignable = false;
                    sym.name = String::new();
                    sym
                } else {
                    Symbol::error(ErrorKind::UnexpectedType, MSG_OPERATOR_TYPES).at(op.pos)
                }
            }
            TokenKind::Op(OpKind::Add) => {
                if o.is_number() {
                    let mut sym = o.clone();
                    sym.assignable = false;
                    sym.name = String::new();
                    sym
                } else {
                    Symbol::error(ErrorKind::UnexpectedType, MSG_OPERATOR_TYPES).at(op.pos)
                }
            }
            TokenKind::Op(OpKind::Tilde) => {
                let flippable = o.is_number()
                    || o.is_boolean()
                    || (o.is_array() && (sub_is_number(&o) || sub_is_boolean(&o)));
                if flippable {
                    let mut sym = o.clone();
                    sym.assignable = false;
                    sym.name = String::new();
                    sym
                } else {
                    Symbol::error(ErrorKind::UnexpectedType, MSG_OPERATOR_TYPES).at(op.pos)
                }
            }
            TokenKind::Op(OpKind::Question) => {
                if o.ptr_depth < 1 {
                    Symbol::error(
                        ErrorKind::DereferenceNonPointer,
                        "Cannot dereference a non-pointer.",
                    )
                    .at(op.pos)
                } else {
                    let mut sym = o.clone();
                    sym.ptr_depth -= 1;
                    sym
                }
            }
            _ => Symbol::error(ErrorKind::UhOh, "Unknown unary expression operator.").at(op.pos),
        }
    }

    fn resolve_cast(&mut self, target: &mut TypeExpr, value: &mut Expr) -> Symbol {
        let target_sym = self.resolve_type(target);
        let value_sym = self.resolve_expr(value);

        if target_sym.is_error() {
            return cascade(
                target_sym,
                "There was an error in the target type of this cast.",
            );
        }
        if value_sym.is_error() {
            return cascade(value_sym, "There was an error in the value of this cast.");
        }

        let fits = type_match(&target_sym, &value_sym)
            || self
                .scopes
                .lookup_func(&cast_key(target), &[value_sym.clone()])
                .is_some();
        if fits {
            let mut sym = target_sym;
            sym.assignable = false;
            sym.computed = value_sym.computed;
            sym
        } else {
            Symbol::error(
                ErrorKind::NoCastExists,
                "No cast exists to the supplied type. Define your own cast function or cast to a different type.",
            )
        }
    }

    fn resolve_array_value(&mut self, elements: &mut [Expr]) -> Symbol {
        let mut elem_type: Option<Symbol> = None;
        let mut first_err = None;
        let mut mismatched = false;
        let mut computed = true;

        for element in elements.iter_mut() {
            let sym = self.resolve_expr(element);
            if sym.is_error() {
                if first_err.is_none() {
                    first_err = Some(sym);
                }
                continue;
            }
            computed &= sym.computed;
            match &elem_type {
                None => elem_type = Some(sym),
                Some(first) => {
                    if !type_match(first, &sym) {
                        mismatched = true;
                    }
                }
            }
        }

        if let Some(err) = first_err {
            cascade(err, "There was an error in an element of this array.")
        } else if mismatched {
            Symbol::error(
                ErrorKind::UnexpectedType,
                "Each element of the array must evaluate to the same type.",
            )
        } else {
            let mut sym = Symbol::array(elem_type.unwrap_or_else(Symbol::unknown));
            sym.computed = computed;
            sym
        }
    }

    fn resolve_object_value(&mut self, members: &mut [Decl]) -> Symbol {
        let mut member_map = IndexMap::new();
        let mut first_err = None;
        let mut computed = true;

        for member in members.iter_mut() {
            match self.resolve_aggregate_member(member) {
                Some((name, sym)) => {
                    if sym.is_error() {
                        if first_err.is_none() {
                            first_err = Some(sym);
                        }
                    } else {
                        computed &= sym.computed;
                        member_map.insert(name, sym);
                    }
                }
                None => {
                    if let Some(sym) = member.symbol.as_ref().filter(|s| s.is_error()) {
                        if first_err.is_none() {
                            first_err = Some(sym.clone());
                        }
                    }
                }
            }
        }

        if let Some(err) = first_err {
            return cascade(err, "There was an error in a member of this object.");
        }

        let entry = self.intern_members(member_map);
        let (kind, entry_name) = {
            let borrowed = entry.borrow();
            (borrowed.kind, borrowed.name.clone())
        };
        let mut sym = Symbol::new("", kind, None);
        sym.custom_type_name = entry_name;
        sym.type_ref = Some(entry);
        sym.computed = computed;
        sym
    }
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}
