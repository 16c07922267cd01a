//! A single level of name bindings.

use rustc_hash::FxHashMap;

use super::symbol::Symbol;

/// Mapping from names to the symbols declared at one nesting level.
///
/// Keys are unique: a second declaration of the same name is refused rather
/// than overwriting the first.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Scope {
    symbols: FxHashMap<String, Symbol>,
}

impl Scope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert `symbol` unless its name is already bound here.
    pub fn insert(&mut self, symbol: Symbol) -> bool {
        if self.symbols.contains_key(&symbol.name) {
            return false;
        }
        self.symbols.insert(symbol.name.clone(), symbol);
        true
    }

    /// Lookup a symbol by name within this scope only.
    pub fn get(&self, name: &str) -> Option<&Symbol> {
        self.symbols.get(name)
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut Symbol> {
        self.symbols.get_mut(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
