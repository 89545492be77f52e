//! Deterministic type-name mangling
//!
//! Cast functions are stored in the symbol table under a key derived from
//! their target type. Declaration and lookup sites must produce
//! byte-identical strings, so the encoding below is the single source of
//! truth for both.

use crate::syntax::ast::{TypeExpr, TypeExprKind, VarPath};

/// The symbol-table key for the cast function targeting `ty`
pub fn cast_key(ty: &TypeExpr) -> String {
    format!("cast-{}", mangle_type(ty))
}

/// Encode a type expression as its canonical mangled string
pub fn mangle_type(ty: &TypeExpr) -> String {
    match &ty.kind {
        TypeExprKind::Base { ty, auto_name } => match auto_name {
            Some(name) => format!("{}-{}", ty.text, name.text),
            None => ty.text.clone(),
        },
        TypeExprKind::Custom { path } => mangle_path(path),
        TypeExprKind::Func {
            params, returns, ..
        } => {
            let params: Vec<String> = params.iter().map(mangle_type).collect();
            let returns: Vec<String> = returns.iter().map(mangle_type).collect();
            format!("func({})({})", params.join("+"), returns.join("+"))
        }
        TypeExprKind::Const(inner) => format!("{}-c", mangle_type(inner)),
        TypeExprKind::Pointer(inner) => format!("{}-p", mangle_type(inner)),
        TypeExprKind::Array { elem, .. } => format!("{}-a", mangle_type(elem)),
    }
}

/// Encode a possibly-namespaced name path
pub fn mangle_path(path: &VarPath) -> String {
    let segments: Vec<&str> = path.segments.iter().map(|tok| tok.text.as_str()).collect();
    segments.join(":")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Pos;
    use crate::syntax::token::Token;

    fn base(name: &str) -> TypeExpr {
        TypeExpr::new(TypeExprKind::Base {
            ty: Token::type_name(name, Pos::new(1, 1)),
            auto_name: None,
        })
    }

    #[test]
    fn test_base_types_mangle_to_their_lexeme() {
        assert_eq!(mangle_type(&base("i32")), "i32");
        assert_eq!(cast_key(&base("string")), "cast-string");
    }

    #[test]
    fn test_qualifiers_append_suffixes() {
        let ty = TypeExpr::new(TypeExprKind::Pointer(Box::new(TypeExpr::new(
            TypeExprKind::Const(Box::new(base("byte"))),
        ))));
        assert_eq!(mangle_type(&ty), "byte-c-p");

        let arr = TypeExpr::new(TypeExprKind::Array {
            elem: Box::new(base("u64")),
            len: None,
        });
        assert_eq!(mangle_type(&arr), "u64-a");
    }

    #[test]
    fn test_func_types_list_both_signatures() {
        let ty = TypeExpr::new(TypeExprKind::Func {
            func: Token::new(crate::syntax::token::TokenKind::Func, "func", Pos::new(1, 1)),
            params: vec![base("i32"), base("bool")],
            returns: vec![base("u64")],
        });
        assert_eq!(mangle_type(&ty), "func(i32+bool)(u64)");
    }

    #[test]
    fn test_namespaced_paths_join_with_colons() {
        let path = VarPath::new(vec![
            Token::ident("space", Pos::new(1, 1)),
            Token::ident("T", Pos::new(1, 8)),
        ]);
        let ty = TypeExpr::new(TypeExprKind::Custom { path });
        assert_eq!(mangle_type(&ty), "space:T");
    }

    #[test]
    fn test_mangling_distinguishes_types() {
        // distinct shapes over the same base never collide
        let plain = mangle_type(&base("i32"));
        let constant = mangle_type(&TypeExpr::new(TypeExprKind::Const(Box::new(base("i32")))));
        let pointer = mangle_type(&TypeExpr::new(TypeExprKind::Pointer(Box::new(base("i32")))));
        let array = mangle_type(&TypeExpr::new(TypeExprKind::Array {
            elem: Box::new(base("i32")),
            len: None,
        }));
        let all = [plain, constant, pointer, array];
        for (i, a) in all.iter().enumerate() {
            for (j, b) in all.iter().enumerate() {
                assert_eq!(i == j, a == b, "{} vs {}", a, b);
            }
        }
    }
}
