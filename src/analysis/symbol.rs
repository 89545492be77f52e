//! Symbol representation for semantic analysis
//!
//! A [`Symbol`] describes the resolved type of an AST node, or the static
//! error found at it. Symbols are plain values: the resolver clones them
//! at every lookup site so per-reference adjustments (`assignable`,
//! `constant`, pointer depth) never corrupt the scope's canonical entry.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::errors::{ErrorKind, Pos};

/// The kind of a resolved symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymKind {
    /// A static error was found at this node
    Error,
    /// No type (statements, void results)
    None,
    /// Not yet determined (pending auto types)
    Unknown,
    /// Inferred type placeholder
    Auto,
    /// User-declared pack (aggregate) type
    Custom,
    /// User-declared variant type
    Variant,
    /// User-declared enum type
    Enum,
    Func,
    Array,
    String,
    Boolean,
    Byte,
    I16,
    I32,
    I64,
    S16,
    S32,
    S64,
    U16,
    U32,
    U64,
    F32,
    F64,
    F128,
}

impl SymKind {
    /// Map a built-in type keyword lexeme to its symbol kind
    ///
    /// Unrecognized lexemes resolve to `None`; later checks cascade from
    /// there.
    pub fn from_lexeme(lexeme: &str) -> SymKind {
        match lexeme {
            "string" => SymKind::String,
            "bool" => SymKind::Boolean,
            "byte" => SymKind::Byte,
            "i16" => SymKind::I16,
            "i32" => SymKind::I32,
            "i64" => SymKind::I64,
            "s16" => SymKind::S16,
            "s32" => SymKind::S32,
            "s64" => SymKind::S64,
            "u16" => SymKind::U16,
            "u32" => SymKind::U32,
            "u64" => SymKind::U64,
            "f32" => SymKind::F32,
            "f64" => SymKind::F64,
            "f128" => SymKind::F128,
            _ => SymKind::None,
        }
    }

    fn is_numeric(self) -> bool {
        matches!(
            self,
            SymKind::I16
                | SymKind::I32
                | SymKind::I64
                | SymKind::S16
                | SymKind::S32
                | SymKind::S64
                | SymKind::U16
                | SymKind::U32
                | SymKind::U64
                | SymKind::F32
                | SymKind::F64
                | SymKind::F128
                | SymKind::Byte
        )
    }
}

/// Shared handle to a registered type entry
///
/// Entries are registered once and compared by identity from then on.
pub type TypeEntryRef = Rc<RefCell<TypeEntry>>;

/// Identity comparison for registered type entries
pub fn same_entry(a: &TypeEntryRef, b: &TypeEntryRef) -> bool {
    Rc::ptr_eq(a, b)
}

/// A resolved symbol attached to an AST node
#[derive(Clone)]
pub struct Symbol {
    /// Bound identifier; holds the message text for error symbols
    pub name: String,
    pub kind: SymKind,
    /// Array element type, or the underlying type of an enum
    pub sub: Option<Box<Symbol>>,
    /// Name of the user-declared type, for aggregate-kinded symbols
    pub custom_type_name: String,
    /// Registered entry of the user-declared type
    pub type_ref: Option<TypeEntryRef>,
    /// Parameter symbols, for function-kinded symbols
    pub params: Option<Vec<Symbol>>,
    /// Return symbols, for function-kinded symbols
    pub returns: Option<Vec<Symbol>>,
    /// Error taxonomy tag; `ErrorKind::None` marks a cascade
    pub error: ErrorKind,
    /// The descendant error a cascade symbol carries
    pub cause: Option<Box<Symbol>>,
    /// Position of the responsible token, for diagnostics
    pub pos: Option<Pos>,
    /// True iff the bound storage is an l-value
    pub assignable: bool,
    /// True iff declared const
    pub constant: bool,
    /// True iff the value is known at compile time
    pub computed: bool,
    /// 0 = value, 1 = pointer, 2 = pointer to pointer, ...
    pub ptr_depth: u32,
}

impl Symbol {
    pub fn new(name: impl Into<String>, kind: SymKind, sub: Option<Symbol>) -> Self {
        Self {
            name: name.into(),
            kind,
            sub: sub.map(Box::new),
            custom_type_name: String::new(),
            type_ref: None,
            params: None,
            returns: None,
            error: ErrorKind::None,
            cause: None,
            pos: None,
            assignable: false,
            constant: false,
            computed: false,
            ptr_depth: 0,
        }
    }

    /// The no-type symbol produced by statements
    pub fn none() -> Self {
        Self::new("", SymKind::None, None)
    }

    pub fn unknown() -> Self {
        Self::new("", SymKind::Unknown, None)
    }

    /// A bare symbol of the given kind
    pub fn basic(kind: SymKind) -> Self {
        Self::new("", kind, None)
    }

    pub fn boolean() -> Self {
        Self::basic(SymKind::Boolean)
    }

    pub fn byte() -> Self {
        Self::basic(SymKind::Byte)
    }

    /// Strings carry their byte-array view in `sub`
    pub fn string() -> Self {
        Self::new("", SymKind::String, Some(Self::array(Self::byte())))
    }

    pub fn array(sub: Symbol) -> Self {
        Self::new("", SymKind::Array, Some(sub))
    }

    pub fn function(name: impl Into<String>, params: Vec<Symbol>, returns: Vec<Symbol>) -> Self {
        let mut sym = Self::new(name, SymKind::Func, None);
        sym.params = Some(params);
        sym.returns = Some(returns);
        sym
    }

    /// An error symbol; the message is carried in `name`
    pub fn error(kind: ErrorKind, message: impl Into<String>) -> Self {
        let mut sym = Self::new(message, SymKind::Error, None);
        sym.error = kind;
        sym
    }

    /// The symbol of a hex literal of the given byte length
    pub fn hex(byte_len: usize) -> Self {
        if byte_len > 1 {
            Self::array(Self::byte())
        } else {
            Self::byte()
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn at(mut self, pos: Pos) -> Self {
        self.pos = Some(pos);
        self
    }

    pub fn is_error(&self) -> bool {
        self.kind == SymKind::Error
    }

    /// True for the numeric family: sized ints, floats, byte, and symbols
    /// whose underlying type is numeric (enums over numbers). Arrays never
    /// chain through their element type here.
    pub fn is_number(&self) -> bool {
        if self.ptr_depth != 0 {
            return false;
        }
        self.kind.is_numeric()
            || (self.kind != SymKind::Array
                && self.sub.as_ref().is_some_and(|s| s.is_number()))
    }

    pub fn is_boolean(&self) -> bool {
        if self.ptr_depth != 0 {
            return false;
        }
        self.kind == SymKind::Boolean || self.sub.as_ref().is_some_and(|s| s.is_boolean())
    }

    pub fn is_array(&self) -> bool {
        if self.ptr_depth != 0 {
            return false;
        }
        matches!(self.kind, SymKind::Array | SymKind::String)
            || self.sub.as_ref().is_some_and(|s| s.is_array())
    }

    /// Strings and byte arrays are interchangeable for concatenation
    pub fn is_string(&self) -> bool {
        if self.ptr_depth != 0 {
            return false;
        }
        match self.kind {
            SymKind::String => true,
            SymKind::Array => self
                .sub
                .as_ref()
                .is_some_and(|s| s.kind == SymKind::Byte),
            _ => self.sub.as_ref().is_some_and(|s| s.is_string()),
        }
    }

    /// Structural type identity: kind, element type, pointer depth, and
    /// declared-type name. Names and parameter lists are not considered.
    pub fn same_type(&self, other: &Symbol) -> bool {
        if self.kind != other.kind
            || self.ptr_depth != other.ptr_depth
            || self.custom_type_name != other.custom_type_name
        {
            return false;
        }
        match (&self.sub, &other.sub) {
            (None, None) => true,
            (Some(a), Some(b)) => a.same_type(b),
            _ => false,
        }
    }

    /// Overload identity: parameter lists match pairwise by structural
    /// type; parameter names are ignored.
    pub fn same_signature(&self, other: &Symbol) -> bool {
        let ours = self.params.as_deref().unwrap_or(&[]);
        let theirs = other.params.as_deref().unwrap_or(&[]);
        ours.len() == theirs.len()
            && ours
                .iter()
                .zip(theirs.iter())
                .all(|(a, b)| a.same_type(b))
    }
}

/// Type compatibility
///
/// Two symbols match when they are structurally equal, or both sit in the
/// numeric family, or both are boolean, or both are array-like. Pointer
/// depth mismatches always fail (the family predicates require depth 0).
/// Function symbols match only by structural parameter equality; an auto
/// symbol adopts whatever type it meets.
pub fn type_match(a: &Symbol, b: &Symbol) -> bool {
    if a.is_error() || b.is_error() {
        return false;
    }
    if a.kind == SymKind::Auto || b.kind == SymKind::Auto {
        return true;
    }
    if a.kind == SymKind::Func || b.kind == SymKind::Func {
        return a.kind == b.kind && a.same_signature(b);
    }
    a.same_type(b)
        || (a.is_number() && b.is_number())
        || (a.is_boolean() && b.is_boolean())
        || (a.is_array() && b.is_array())
}

impl PartialEq for Symbol {
    /// Structural equality: kind, element type, pointer depth, declared
    /// type name, bound name, and the ordered parameter list. Returns are
    /// deliberately excluded; functions overload on parameters only.
    fn eq(&self, other: &Self) -> bool {
        self.kind == other.kind
            && self.ptr_depth == other.ptr_depth
            && self.custom_type_name == other.custom_type_name
            && self.name == other.name
            && self.sub == other.sub
            && self.params == other.params
    }
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // type_ref is omitted: entries can reference themselves through
        // their members.
        f.debug_struct("Symbol")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("sub", &self.sub)
            .field("custom_type_name", &self.custom_type_name)
            .field("params", &self.params)
            .field("returns", &self.returns)
            .field("error", &self.error)
            .field("assignable", &self.assignable)
            .field("constant", &self.constant)
            .field("computed", &self.computed)
            .field("ptr_depth", &self.ptr_depth)
            .finish()
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.constant {
            write!(f, "const ")?;
        }
        match self.kind {
            SymKind::Error => write!(f, "<error>")?,
            SymKind::None => write!(f, "()")?,
            SymKind::Unknown => write!(f, "<unknown>")?,
            SymKind::Auto => write!(f, "auto")?,
            SymKind::Custom | SymKind::Enum | SymKind::Variant => {
                if self.custom_type_name.is_empty() {
                    write!(f, "<anonymous>")?;
                } else {
                    write!(f, "{}", self.custom_type_name)?;
                }
            }
            SymKind::Func => {
                write!(f, "func(")?;
                for (i, p) in self.params.iter().flatten().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", p)?;
                }
                write!(f, ")(")?;
                for (i, r) in self.returns.iter().flatten().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", r)?;
                }
                write!(f, ")")?;
            }
            SymKind::Array => match &self.sub {
                Some(sub) => write!(f, "{}[]", sub)?,
                None => write!(f, "<unknown>[]")?,
            },
            SymKind::String => write!(f, "string")?,
            SymKind::Boolean => write!(f, "bool")?,
            SymKind::Byte => write!(f, "byte")?,
            SymKind::I16 => write!(f, "i16")?,
            SymKind::I32 => write!(f, "i32")?,
            SymKind::I64 => write!(f, "i64")?,
            SymKind::S16 => write!(f, "s16")?,
            SymKind::S32 => write!(f, "s32")?,
            SymKind::S64 => write!(f, "s64")?,
            SymKind::U16 => write!(f, "u16")?,
            SymKind::U32 => write!(f, "u32")?,
            SymKind::U64 => write!(f, "u64")?,
            SymKind::F32 => write!(f, "f32")?,
            SymKind::F64 => write!(f, "f64")?,
            SymKind::F128 => write!(f, "f128")?,
        }
        for _ in 0..self.ptr_depth {
            write!(f, "@")?;
        }
        Ok(())
    }
}

/// A registered user-declared type (pack, enum, variant, or a pending
/// auto type)
#[derive(Debug, Clone)]
pub struct TypeEntry {
    pub name: String,
    /// `Custom`, `Enum`, `Variant`, or `Unknown` for pending auto types
    pub kind: SymKind,
    /// The underlying base type, for enums
    pub sub: Option<Symbol>,
    /// Member name to member symbol, in declaration order
    pub members: IndexMap<String, Symbol>,
}

impl TypeEntry {
    pub fn new(name: impl Into<String>, kind: SymKind) -> Self {
        Self {
            name: name.into(),
            kind,
            sub: None,
            members: IndexMap::new(),
        }
    }

    pub fn into_ref(self) -> TypeEntryRef {
        Rc::new(RefCell::new(self))
    }

    /// First-wins member registration
    pub fn add_member(&mut self, name: impl Into<String>, sym: Symbol) {
        self.members.entry(name.into()).or_insert(sym);
    }

    pub fn member(&self, name: &str) -> Option<Symbol> {
        self.members.get(name).cloned()
    }

    /// True when the given member map is structurally equal to this
    /// entry's members (used to intern anonymous object shapes)
    pub fn match_members(&self, members: &IndexMap<String, Symbol>) -> bool {
        self.members.len() == members.len()
            && members
                .iter()
                .all(|(name, sym)| self.members.get(name).is_some_and(|m| m.same_type(sym)))
    }

    /// Build an entry from a function's return symbols, keyed by return
    /// name (used for the anonymous results of multi-return calls)
    pub fn from_returns(name: impl Into<String>, returns: &[Symbol]) -> Self {
        let mut entry = Self::new(name, SymKind::Custom);
        for ret in returns {
            entry.add_member(ret.name.clone(), ret.clone());
        }
        entry
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn representative_symbols() -> Vec<Symbol> {
        vec![
            Symbol::basic(SymKind::I32),
            Symbol::basic(SymKind::U64),
            Symbol::basic(SymKind::F128),
            Symbol::boolean(),
            Symbol::byte(),
            Symbol::string(),
            Symbol::array(Symbol::basic(SymKind::U64)),
            {
                let mut ptr = Symbol::basic(SymKind::I32);
                ptr.ptr_depth = 2;
                ptr
            },
            Symbol::function(
                "f",
                vec![Symbol::basic(SymKind::I32).named("x")],
                vec![Symbol::boolean().named("r")],
            ),
        ]
    }

    #[test]
    fn test_type_match_reflexive() {
        for sym in representative_symbols() {
            assert!(type_match(&sym, &sym), "not reflexive for {}", sym);
        }
    }

    #[test]
    fn test_type_match_symmetric() {
        let syms = representative_symbols();
        for a in &syms {
            for b in &syms {
                assert_eq!(type_match(a, b), type_match(b, a), "{} vs {}", a, b);
            }
        }
    }

    #[test]
    fn test_numeric_family_matches() {
        assert!(type_match(
            &Symbol::basic(SymKind::I32),
            &Symbol::basic(SymKind::U64)
        ));
        assert!(type_match(&Symbol::basic(SymKind::F32), &Symbol::byte()));
        assert!(!type_match(&Symbol::basic(SymKind::I32), &Symbol::boolean()));
    }

    #[test]
    fn test_pointer_depth_never_matches_value() {
        let mut ptr = Symbol::basic(SymKind::I32);
        ptr.ptr_depth = 1;
        assert!(!type_match(&ptr, &Symbol::basic(SymKind::I32)));
        assert!(!type_match(&ptr, &Symbol::basic(SymKind::U64)));
    }

    #[test]
    fn test_string_is_array_like() {
        let bytes = Symbol::array(Symbol::byte());
        assert!(Symbol::string().is_string());
        assert!(bytes.is_string());
        assert!(type_match(&Symbol::string(), &bytes));
        // strings never leak into the numeric family through their
        // byte-array view
        assert!(!Symbol::string().is_number());
    }

    #[test]
    fn test_enum_symbol_chains_to_base() {
        let e = Symbol::new("Color", SymKind::Enum, Some(Symbol::basic(SymKind::U16)));
        assert!(e.is_number());
        assert!(!e.is_boolean());
    }

    #[test]
    fn test_signature_ignores_parameter_names() {
        let f = Symbol::function("f", vec![Symbol::basic(SymKind::I32).named("a")], vec![]);
        let g = Symbol::function("f", vec![Symbol::basic(SymKind::I32).named("b")], vec![]);
        assert!(f.same_signature(&g));

        let h = Symbol::function("f", vec![Symbol::boolean().named("a")], vec![]);
        assert!(!f.same_signature(&h));
    }

    #[test]
    fn test_match_members_is_exact() {
        let mut entry = TypeEntry::new("P", SymKind::Custom);
        entry.add_member("a", Symbol::basic(SymKind::I32).named("a"));
        entry.add_member("b", Symbol::boolean().named("b"));

        let mut query = IndexMap::new();
        query.insert("a".to_string(), Symbol::basic(SymKind::I32).named("a"));
        query.insert("b".to_string(), Symbol::boolean().named("b"));
        assert!(entry.match_members(&query));

        query.shift_remove("b");
        assert!(!entry.match_members(&query));
    }
}
