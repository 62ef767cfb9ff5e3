//! Lexical scope stack for one function body.

use std::collections::HashMap;

use crate::symbol::LocalId;

/// Innermost scope last. The function scope (parameters and the top-level
/// body items) is pushed first; every nested block pushes one more.
#[derive(Debug, Default)]
pub(crate) struct Scopes {
    scopes: Vec<HashMap<String, LocalId>>,
}

impl Scopes {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    pub(crate) fn pop_scope(&mut self) {
        let _ = self.scopes.pop();
    }

    pub(crate) fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Binds `name` in the innermost scope. On a same-scope clash the
    /// earlier binding is kept and returned as the error.
    pub(crate) fn declare(&mut self, name: &str, id: LocalId) -> Result<(), LocalId> {
        let Some(scope) = self.scopes.last_mut() else {
            return Ok(());
        };
        if let Some(&prev) = scope.get(name) {
            return Err(prev);
        }
        scope.insert(name.to_string(), id);
        Ok(())
    }

    /// Innermost binding of `name`, if any scope has one.
    pub(crate) fn resolve(&self, name: &str) -> Option<LocalId> {
        for scope in self.scopes.iter().rev() {
            if let Some(&id) = scope.get(name) {
                return Some(id);
            }
        }
        None
    }
}
