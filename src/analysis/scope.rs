//! Symbol tables and scopes for name resolution
//!
//! Scopes form a strict tree rooted at the global scope. Each scope owns
//! a symbol map (one non-function binding plus any number of function
//! overloads per name) and a type table of the user-declared types
//! registered in it.

use std::collections::HashMap;

use indexmap::IndexMap;

use super::symbol::{type_match, SymKind, Symbol, TypeEntryRef};

/// A lexical binding environment
#[derive(Debug, Clone, Default)]
pub struct Scope {
    /// Optional label, used for debugging and nested lookups
    pub name: String,
    /// Name to its ordered binding group
    symbols: HashMap<String, Vec<Symbol>>,
    /// Name to registered type entry, in registration order
    types: IndexMap<String, TypeEntryRef>,
    /// Nested scopes, in creation order
    children: Vec<Scope>,
}

impl Scope {
    /// Create a new empty scope
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            symbols: HashMap::new(),
            types: IndexMap::new(),
            children: Vec::new(),
        }
    }

    /// Bind a symbol in this scope
    ///
    /// Returns `None` on success and the conflicting symbol otherwise. A
    /// function conflicts only with an overload of the same parameter
    /// signature; anything else conflicts with any existing binding under
    /// the name.
    pub fn define(&mut self, name: impl Into<String>, sym: Symbol) -> Option<Symbol> {
        let name = name.into();
        let group = self.symbols.entry(name).or_default();
        if sym.kind == SymKind::Func {
            for existing in group.iter() {
                if existing.kind == SymKind::Func && existing.same_signature(&sym) {
                    return Some(existing.clone());
                }
            }
        } else if let Some(existing) = group.first() {
            return Some(existing.clone());
        }
        group.push(sym);
        None
    }

    /// Register a type entry; first registration wins
    ///
    /// Returns `None` on success and the already-registered entry on
    /// conflict.
    pub fn add_type(&mut self, name: impl Into<String>, entry: TypeEntryRef) -> Option<TypeEntryRef> {
        let name = name.into();
        if let Some(existing) = self.types.get(&name) {
            return Some(existing.clone());
        }
        self.types.insert(name, entry);
        None
    }

    /// The first non-function symbol bound to `name` in this scope only
    pub fn get_var(&self, name: &str) -> Option<&Symbol> {
        self.symbols
            .get(name)?
            .iter()
            .find(|sym| sym.kind != SymKind::Func)
    }

    /// The function overload under `name` whose parameters match `args`
    /// pairwise by structural type, in this scope only
    pub fn get_func(&self, name: &str, args: &[Symbol]) -> Option<&Symbol> {
        self.symbols.get(name)?.iter().find(|sym| {
            sym.kind == SymKind::Func
                && sym
                    .params
                    .as_ref()
                    .is_some_and(|params| {
                        params.len() == args.len()
                            && params.iter().zip(args.iter()).all(|(p, a)| p.same_type(a))
                    })
        })
    }

    /// Like [`Scope::get_func`], but parameters only need to be
    /// type-compatible with the arguments (numeric literals may select a
    /// differently-sized numeric overload)
    fn get_func_compatible(&self, name: &str, args: &[Symbol]) -> Option<&Symbol> {
        self.symbols.get(name)?.iter().find(|sym| {
            sym.kind == SymKind::Func
                && sym
                    .params
                    .as_ref()
                    .is_some_and(|params| {
                        params.len() == args.len()
                            && params
                                .iter()
                                .zip(args.iter())
                                .all(|(p, a)| type_match(p, a))
                    })
        })
    }

    /// The type entry registered under `name` in this scope only
    pub fn get_type(&self, name: &str) -> Option<TypeEntryRef> {
        self.types.get(name).cloned()
    }

    /// The first registered entry whose member set is structurally equal
    /// to `members`, in this scope only
    pub fn find_type_by_members(&self, members: &IndexMap<String, Symbol>) -> Option<TypeEntryRef> {
        self.types
            .values()
            .find(|entry| entry.borrow().match_members(members))
            .cloned()
    }

    /// All binding groups in this scope
    pub fn symbols(&self) -> impl Iterator<Item = (&String, &Vec<Symbol>)> {
        self.symbols.iter()
    }

    /// All registered types, in registration order
    pub fn types(&self) -> impl Iterator<Item = (&String, &TypeEntryRef)> {
        self.types.iter()
    }

    /// Attach a finished child scope
    pub fn add_child(&mut self, child: Scope) {
        self.children.push(child);
    }

    /// Nested scopes, in creation order
    pub fn children(&self) -> &[Scope] {
        &self.children
    }
}

/// The scope stack the resolver walks with
///
/// The innermost scope is last. Lookups walk from the innermost scope
/// outwards; popped scopes are reattached as children so the finished
/// tree can be inspected after the pass.
#[derive(Debug)]
pub struct ScopeStack {
    scopes: Vec<Scope>,
}

impl ScopeStack {
    /// Create a stack holding only the global scope
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new("global")],
        }
    }

    /// Enter a fresh child scope
    pub fn push(&mut self, name: &str) {
        self.scopes.push(Scope::new(name));
    }

    /// Leave the innermost scope, attaching it to its parent
    pub fn pop(&mut self) {
        if self.scopes.len() > 1 {
            let child = self.scopes.pop().expect("scope stack underflow");
            self.current_mut().add_child(child);
        }
    }

    fn current_mut(&mut self) -> &mut Scope {
        self.scopes.last_mut().expect("scope stack is never empty")
    }

    /// Bind a symbol in the innermost scope
    pub fn define(&mut self, name: impl Into<String>, sym: Symbol) -> Option<Symbol> {
        self.current_mut().define(name, sym)
    }

    /// Register a type in the innermost scope
    pub fn add_type(&mut self, name: impl Into<String>, entry: TypeEntryRef) -> Option<TypeEntryRef> {
        self.current_mut().add_type(name, entry)
    }

    /// Walk outwards for the first non-function binding of `name`
    pub fn lookup_var(&self, name: &str) -> Option<Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get_var(name))
            .cloned()
    }

    /// Walk outwards for the overload of `name` matching `args`
    ///
    /// Each enclosing scope is searched with the parameter-identity rule
    /// used at insertion first; if no overload in the scope matches
    /// exactly, a type-compatible overload is accepted before moving to
    /// the parent.
    pub fn lookup_func(&self, name: &str, args: &[Symbol]) -> Option<Symbol> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| {
                scope
                    .get_func(name, args)
                    .or_else(|| scope.get_func_compatible(name, args))
            })
            .cloned()
    }

    /// Walk outwards for the type registered under `name`
    pub fn lookup_type(&self, name: &str) -> Option<TypeEntryRef> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get_type(name))
    }

    /// Walk outwards for a registered type with this exact member shape
    pub fn lookup_type_by_members(
        &self,
        members: &IndexMap<String, Symbol>,
    ) -> Option<TypeEntryRef> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.find_type_by_members(members))
    }

    /// Collapse the stack into the global scope, reattaching anything
    /// still open
    pub fn into_global(mut self) -> Scope {
        while self.scopes.len() > 1 {
            self.pop();
        }
        self.scopes.pop().expect("scope stack is never empty")
    }
}

impl Default for ScopeStack {
    fn default() -> Self {
        Self::new()
    }
}
