//! Scoped symbol table
//!
//! This module provides the compile-time name environment shared by the
//! parser and the code generator:
//! - [`symbol`]: [`Symbol`] records, their [`SymbolKind`] and payload
//! - [`scope`]: a single level of bindings
//!
//! # Scoping
//!
//! Scopes form a stack. The bottom (global) scope is created with the table
//! and is never removed. Lookup walks from the innermost scope outwards, so a
//! local declaration shadows a global one of the same name.
//!
//! When the parser finishes a subprogram it pops the subprogram's scope and
//! attaches it to the subprogram's symbol. The code generator later detaches
//! it and pushes it again, reproducing the exact nesting seen while parsing.

pub mod scope;
pub mod symbol;

pub use scope::Scope;
pub use symbol::{ArrayBounds, Binding, Symbol, SymbolId, SymbolKind};

use log::debug;

/// Stack of scopes with innermost-first lookup.
#[derive(Debug, Clone)]
pub struct SymbolTable {
    scopes: Vec<Scope>,
    next_id: u32,
}

impl SymbolTable {
    /// Create a table holding only the global scope.
    pub fn new() -> Self {
        SymbolTable {
            scopes: vec![Scope::new()],
            next_id: 0,
        }
    }

    /// Push a fresh, empty scope.
    pub fn enter_scope(&mut self) {
        self.scopes.push(Scope::new());
        debug!("entered scope at depth {}", self.depth());
    }

    /// Push a previously built scope, e.g. one obtained from
    /// [`detach_local_scope`](Self::detach_local_scope).
    pub fn push_scope(&mut self, scope: Scope) {
        self.scopes.push(scope);
        debug!("re-entered scope at depth {}", self.depth());
    }

    /// Pop the innermost scope and hand it back.
    ///
    /// Returns `None` and leaves the table untouched when only the global
    /// scope remains.
    pub fn exit_scope(&mut self) -> Option<Scope> {
        if self.scopes.len() <= 1 {
            return None;
        }
        let scope = self.scopes.pop();
        debug!("left scope, depth now {}", self.depth());
        scope
    }

    /// Number of scopes on the stack, global included.
    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    /// Declare `symbol` in the innermost scope under its own name.
    ///
    /// Returns `false` without changing anything if the name is already
    /// declared in that same scope. Shadowing an outer declaration is fine.
    pub fn declare(&mut self, mut symbol: Symbol) -> bool {
        let Some(current) = self.scopes.last_mut() else {
            return false;
        };
        if current.contains(&symbol.name) {
            return false;
        }

        symbol.set_id(SymbolId(self.next_id));
        self.next_id += 1;
        debug!("declared {} '{}'", symbol.kind(), symbol.name);
        current.insert(symbol)
    }

    /// Find the innermost visible declaration of `name`.
    pub fn lookup(&self, name: &str) -> Option<&Symbol> {
        self.scopes.iter().rev().find_map(|scope| scope.get(name))
    }

    /// Like [`lookup`](Self::lookup), also reporting the scope depth the
    /// symbol was found at (1 is the global scope).
    pub fn lookup_with_depth(&self, name: &str) -> Option<(usize, &Symbol)> {
        self.scopes
            .iter()
            .enumerate()
            .rev()
            .find_map(|(index, scope)| scope.get(name).map(|symbol| (index + 1, symbol)))
    }

    fn lookup_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.scopes
            .iter_mut()
            .rev()
            .find_map(|scope| scope.get_mut(name))
    }

    /// Whether `name` resolves to a symbol of the given kind.
    pub fn is_kind(&self, name: &str, kind: SymbolKind) -> bool {
        self.lookup(name).is_some_and(|symbol| symbol.kind() == kind)
    }

    /// Store a subprogram's finished local scope on its symbol.
    ///
    /// Returns `false` if `name` does not resolve to a function or procedure.
    pub fn attach_local_scope(&mut self, name: &str, scope: Scope) -> bool {
        match self.lookup_mut(name) {
            Some(symbol) if matches!(symbol.kind(), SymbolKind::Function | SymbolKind::Procedure) => {
                symbol.local_scope = Some(scope);
                true
            }
            _ => false,
        }
    }

    /// Take a subprogram's local scope back off its symbol.
    pub fn detach_local_scope(&mut self, name: &str) -> Option<Scope> {
        self.lookup_mut(name)?.local_scope.take()
    }

    /// The outermost scope.
    pub fn global(&self) -> &Scope {
        &self.scopes[0]
    }

    /// The innermost scope.
    pub fn current(&self) -> &Scope {
        // The global scope is never popped, so the stack is never empty.
        &self.scopes[self.scopes.len() - 1]
    }
}

impl Default for SymbolTable {
    fn default() -> Self {
        Self::new()
    }
}
