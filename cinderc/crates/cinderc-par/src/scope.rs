//! Scoped symbol environments.
//!
//! Name resolution uses two independent stacks of scopes: the *value*
//! environment (variables, parameters, functions, typedef names) and the
//! *tag* environment (struct tags). Every construct that introduces a scope
//! pushes and pops both stacks as a pair.
//!
//! Each scope is an insertion-ordered map so that iteration (and therefore
//! diagnostics and code generation) is deterministic.

use indexmap::IndexMap;

use crate::ast::DeclId;
use crate::types::TypeId;

/// A stack of scopes mapping names to `V`.
///
/// The outermost (translation-unit) scope is created on construction and can
/// never be popped.
pub struct ScopeStack<V> {
    scopes: Vec<IndexMap<String, V>>,
}

impl<V: Copy> ScopeStack<V> {
    pub fn new() -> Self {
        Self {
            scopes: vec![IndexMap::new()],
        }
    }

    /// Opens a new innermost scope.
    pub fn push(&mut self) {
        self.scopes.push(IndexMap::new());
    }

    /// Closes the innermost scope. The outermost scope stays.
    pub fn pop(&mut self) {
        assert!(self.scopes.len() > 1, "cannot pop the outermost scope");
        self.scopes.pop();
    }

    /// Binds `name` in the innermost scope, shadowing outer bindings.
    ///
    /// Redefinition within the same scope is the caller's error to raise;
    /// it checks with `lookup(name, false)` first.
    pub fn define(&mut self, name: &str, value: V) {
        self.scopes
            .last_mut()
            .expect("scope stack is never empty")
            .insert(name.to_string(), value);
    }

    /// Looks `name` up.
    ///
    /// When `recursive`, scopes are searched from innermost to outermost,
    /// terminating at the outermost scope; otherwise only the innermost
    /// scope is consulted.
    pub fn lookup(&self, name: &str, recursive: bool) -> Option<V> {
        if recursive {
            for scope in self.scopes.iter().rev() {
                if let Some(value) = scope.get(name) {
                    return Some(*value);
                }
            }
            None
        } else {
            self.scopes
                .last()
                .expect("scope stack is never empty")
                .get(name)
                .copied()
        }
    }

    /// Number of active scopes (always at least 1).
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }
}

impl<V: Copy> Default for ScopeStack<V> {
    fn default() -> Self {
        Self::new()
    }
}

/// The combined environment: value scopes and tag scopes, pushed and popped
/// in lockstep.
pub struct Env {
    pub values: ScopeStack<DeclId>,
    pub tags: ScopeStack<TypeId>,
}

impl Env {
    pub fn new() -> Self {
        Self {
            values: ScopeStack::new(),
            tags: ScopeStack::new(),
        }
    }

    pub fn push(&mut self) {
        self.values.push();
        self.tags.push();
    }

    pub fn pop(&mut self) {
        self.tags.pop();
        self.values.pop();
    }

    pub fn depth(&self) -> usize {
        debug_assert_eq!(self.values.depth(), self.tags.depth());
        self.values.depth()
    }
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}
