//!
//! Record Inference and Static Expression Types
//!
//! Two small inference jobs:
//!
//! - `infer_record` picks the declared record an unannotated map literal
//!   most plausibly instantiates. A definition matches when every one of
//!   its field names is a key of the literal; value types are not
//!   consulted. Among several matches the one with the most fields wins,
//!   then the lexicographically smallest name, so the result never depends
//!   on declaration order.
//! - `static_ty` computes what is statically known about an expression:
//!   literals, variables in scope, and member chains through record fields.
//!

use std::cmp::Ordering;

use lasso::Rodeo;

use crate::ast::{Expression, MapLiteral, TypeDefinition};

use super::env::TypeEnv;
use super::symbols::SymbolTable;
use super::types::Ty;

pub fn infer_record<'p>(
    map: &MapLiteral,
    symbols: &SymbolTable<'p>,
    interner: &Rodeo,
) -> Option<&'p TypeDefinition> {
    symbols
        .types()
        .filter(|def| def.fields.iter().all(|f| map.has_key(f.name.symbol)))
        .max_by(|a, b| rank(a, b, interner))
}

fn rank(a: &TypeDefinition, b: &TypeDefinition, interner: &Rodeo) -> Ordering {
    let name = |def: &TypeDefinition| interner.resolve(&def.name.symbol);
    a.fields
        .len()
        .cmp(&b.fields.len())
        .then_with(|| name(b).cmp(name(a)))
}

pub fn static_ty<'p>(
    expr: &Expression,
    env: &TypeEnv<'p>,
    symbols: &SymbolTable<'p>,
    interner: &Rodeo,
) -> Ty<'p> {
    match expr {
        Expression::Int(_) | Expression::String(_) => Ty::of_literal(expr),
        Expression::Identifier(ident) => env.lookup(ident.symbol),
        Expression::Member(member) => {
            let object = static_ty(&member.object, env, symbols, interner);
            object
                .record()
                .and_then(|def| def.field(member.property.symbol))
                .map(|field| symbols.field_ty(field, interner))
                .unwrap_or(Ty::Unknown)
        }
        _ => Ty::Unknown,
    }
}
