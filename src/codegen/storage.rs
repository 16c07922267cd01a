//! Storage locations assigned during code generation.
//!
//! Symbols come out of the parser without an address. The generator decides
//! where each one lives and records it here, keyed by [`SymbolId`], instead
//! of writing into the symbol table.

use rustc_hash::FxHashMap;
use std::fmt;

use super::constants::STACK_POINTER;
use crate::symbols::SymbolId;

/// Where a variable's first word lives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// Statically allocated word(s) under a data label
    Global(String),
    /// Byte offset from the stack pointer inside the current frame
    Stack(i32),
}

impl fmt::Display for Storage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Storage::Global(label) => f.write_str(label),
            Storage::Stack(offset) => write!(f, "{}({})", offset, STACK_POINTER),
        }
    }
}

/// Side table from symbol identity to storage location
#[derive(Debug, Clone, Default)]
pub struct StorageMap {
    slots: FxHashMap<SymbolId, Storage>,
}

impl StorageMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn assign(&mut self, id: SymbolId, storage: Storage) {
        self.slots.insert(id, storage);
    }

    pub fn get(&self, id: SymbolId) -> Option<&Storage> {
        self.slots.get(&id)
    }

    /// Forget a location once its frame is gone.
    pub fn release(&mut self, id: SymbolId) -> Option<Storage> {
        self.slots.remove(&id)
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}
