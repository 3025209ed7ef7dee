//!
//! Static Type Representation
//!
//! The checker only knows what annotations, literals and record definitions
//! tell it. A value is an `int`, a `string`, an instance of a declared
//! record (or of a nested record inside one), or unknown. Unknown values are
//! never reported on; the checks only fire where both sides are known.
//!

use lasso::{Rodeo, Spur};

use crate::ast::{Expression, TypeDefinition};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Ty<'p> {
    Int,
    String,
    Record(&'p TypeDefinition),
    Unknown,
}

impl<'p> Ty<'p> {
    /// The primitive a type name denotes, if any.
    pub fn primitive(name: Spur, interner: &Rodeo) -> Option<Ty<'p>> {
        match interner.resolve(&name) {
            "int" => Some(Ty::Int),
            "string" => Some(Ty::String),
            _ => None,
        }
    }

    /// The type of a literal, judged by its syntax alone.
    pub fn of_literal(expr: &Expression) -> Ty<'p> {
        match expr {
            Expression::Int(_) => Ty::Int,
            Expression::String(_) => Ty::String,
            _ => Ty::Unknown,
        }
    }

    pub fn record(&self) -> Option<&'p TypeDefinition> {
        match self {
            Ty::Record(def) => Some(def),
            _ => None,
        }
    }

    /// The name used in diagnostics, `None` when unknown.
    pub fn name<'i>(&self, interner: &'i Rodeo) -> Option<&'i str> {
        match self {
            Ty::Int => Some("int"),
            Ty::String => Some("string"),
            Ty::Record(def) => Some(interner.resolve(&def.name.symbol)),
            Ty::Unknown => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_names() {
        let mut interner = Rodeo::default();
        let int = interner.get_or_intern("int");
        let user = interner.get_or_intern("User");
        assert_eq!(Ty::primitive(int, &interner), Some(Ty::Int));
        assert_eq!(Ty::primitive(user, &interner), None);
        assert_eq!(Ty::Int.name(&interner), Some("int"));
        assert_eq!(Ty::Unknown.name(&interner), None);
    }
}
