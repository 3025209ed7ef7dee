///
/// Type Environment - Scope Management
///
/// This module tracks what the checker knows about each variable in nested
/// lexical scopes. Scopes are managed as a stack: the global scope holds
/// top-level bindings, and a scope is pushed for every function body and
/// block. Lookups search innermost first, so inner bindings shadow outer
/// ones.
///

use std::collections::HashMap;

use lasso::Spur;

use super::types::Ty;

#[derive(Debug, Default)]
struct Scope<'p> {
    bindings: HashMap<Spur, Ty<'p>>,
}

#[derive(Debug)]
pub struct TypeEnv<'p> {
    scopes: Vec<Scope<'p>>,
}

impl<'p> TypeEnv<'p> {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::default()],
        }
    }

    pub fn push_scope(&mut self) {
        self.scopes.push(Scope::default());
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() > 1 {
            self.scopes.pop();
        }
    }

    pub fn define(&mut self, name: Spur, ty: Ty<'p>) {
        if let Some(scope) = self.scopes.last_mut() {
            scope.bindings.insert(name, ty);
        }
    }

    pub fn lookup(&self, name: Spur) -> Ty<'p> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.bindings.get(&name).copied())
            .unwrap_or(Ty::Unknown)
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl Default for TypeEnv<'_> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lasso::Rodeo;

    #[test]
    fn test_inner_scope_shadows_and_pops() {
        let mut interner = Rodeo::default();
        let x = interner.get_or_intern("x");
        let mut env = TypeEnv::new();
        env.define(x, Ty::Int);

        env.push_scope();
        env.define(x, Ty::String);
        assert_eq!(env.lookup(x), Ty::String);
        env.pop_scope();

        assert_eq!(env.lookup(x), Ty::Int);
    }

    #[test]
    fn test_global_scope_is_never_popped() {
        let mut interner = Rodeo::default();
        let x = interner.get_or_intern("x");
        let mut env = TypeEnv::new();
        env.define(x, Ty::Int);
        env.pop_scope();
        assert_eq!(env.depth(), 1);
        assert_eq!(env.lookup(x), Ty::Int);
    }
}
