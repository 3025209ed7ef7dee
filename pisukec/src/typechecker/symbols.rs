//!
//! Symbol Table - Global Definitions
//!
//! This module collects the program's top-level definitions:
//!
//! - Record type definitions, keyed by name
//! - Declared function signatures, keyed by name
//!
//! The table is built in one pass over the top-level statements before any
//! checking starts, so uses may precede definitions. Entries borrow from the
//! AST and keep declaration order, which the Go generator relies on when it
//! hoists types and functions. The table is rebuilt for every compilation.
//!

use indexmap::IndexMap;
use lasso::{Rodeo, Spur};

use crate::ast::{Field, FieldType, Ident, Parameter, Program, TypeDefinition};

use super::types::Ty;

#[derive(Debug, Clone)]
pub struct FunctionSig<'p> {
    pub name: Spur,
    pub params: &'p [Parameter],
    pub return_ty: Option<Ident>,
}

impl FunctionSig<'_> {
    pub fn arity(&self) -> usize {
        self.params.len()
    }
}

#[derive(Debug, Clone, Default)]
pub struct SymbolTable<'p> {
    types: IndexMap<Spur, &'p TypeDefinition>,
    functions: IndexMap<Spur, FunctionSig<'p>>,
}

impl<'p> SymbolTable<'p> {
    pub fn collect(program: &'p Program) -> Self {
        let mut table = SymbolTable::default();

        for def in program.type_definitions() {
            table.types.insert(def.name.symbol, def);
        }

        for func in program.declared_functions() {
            let Some(name) = func.name else { continue };
            table.functions.insert(
                name.symbol,
                FunctionSig {
                    name: name.symbol,
                    params: &func.params,
                    return_ty: func.return_ty,
                },
            );
        }

        table
    }

    pub fn get_type(&self, name: Spur) -> Option<&'p TypeDefinition> {
        self.types.get(&name).copied()
    }

    pub fn get_function(&self, name: Spur) -> Option<&FunctionSig<'p>> {
        self.functions.get(&name)
    }

    pub fn types(&self) -> impl Iterator<Item = &'p TypeDefinition> + '_ {
        self.types.values().copied()
    }

    /// The type an annotation names: a primitive or a declared record.
    pub fn resolve(&self, name: Spur, interner: &Rodeo) -> Option<Ty<'p>> {
        Ty::primitive(name, interner).or_else(|| self.get_type(name).map(Ty::Record))
    }

    /// The declared type of a record field; nested bodies are records.
    pub fn field_ty(&self, field: &'p Field, interner: &Rodeo) -> Ty<'p> {
        match &field.ty {
            FieldType::Named(name) => self.resolve(name.symbol, interner).unwrap_or(Ty::Unknown),
            FieldType::Nested(def) => Ty::Record(def),
        }
    }
}
