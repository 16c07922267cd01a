//! Symbol table entries.
//!
//! A [`Symbol`] records what the parser learned about a declared name. The
//! [`Binding`] carries the kind-specific payload, so only arrays have bounds
//! and only subprograms have argument types.

use std::fmt;

use super::scope::Scope;
use crate::parser::ast::ValueType;

/// Identity of a declared symbol, unique across the whole table.
///
/// Assigned by [`SymbolTable::declare`](super::SymbolTable::declare); code
/// generation keys its storage side table by it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct SymbolId(pub(crate) u32);

/// Classification of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SymbolKind {
    Program,
    Variable,
    Array,
    Function,
    Procedure,
}

impl SymbolKind {
    /// Human-readable description used in diagnostics.
    pub fn as_str(self) -> &'static str {
        match self {
            SymbolKind::Program => "program",
            SymbolKind::Variable => "variable",
            SymbolKind::Array => "array",
            SymbolKind::Function => "function",
            SymbolKind::Procedure => "procedure",
        }
    }
}

impl fmt::Display for SymbolKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Inclusive index range of an array declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ArrayBounds {
    pub lo: i32,
    pub hi: i32,
}

impl ArrayBounds {
    pub fn new(lo: i32, hi: i32) -> Self {
        ArrayBounds { lo, hi }
    }

    /// Number of elements, `hi - lo + 1`.
    pub fn len(&self) -> usize {
        (i64::from(self.hi) - i64::from(self.lo) + 1).max(0) as usize
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Kind-specific data of a symbol.
#[derive(Debug, Clone, PartialEq)]
pub enum Binding {
    Program,
    Variable,
    Array(ArrayBounds),
    Function(Vec<ValueType>),
    Procedure(Vec<ValueType>),
}

impl Binding {
    pub fn kind(&self) -> SymbolKind {
        match self {
            Binding::Program => SymbolKind::Program,
            Binding::Variable => SymbolKind::Variable,
            Binding::Array(_) => SymbolKind::Array,
            Binding::Function(_) => SymbolKind::Function,
            Binding::Procedure(_) => SymbolKind::Procedure,
        }
    }
}

/// Metadata describing a single declared name.
#[derive(Debug, Clone, PartialEq)]
pub struct Symbol {
    id: SymbolId,
    pub name: String,
    pub value_type: Option<ValueType>,
    pub binding: Binding,
    /// Local scope of a subprogram, attached once its body has been parsed.
    pub local_scope: Option<Scope>,
}

impl Symbol {
    fn new(name: impl Into<String>, value_type: Option<ValueType>, binding: Binding) -> Self {
        Symbol {
            id: SymbolId::default(),
            name: name.into(),
            value_type,
            binding,
            local_scope: None,
        }
    }

    pub fn program(name: impl Into<String>) -> Self {
        Symbol::new(name, None, Binding::Program)
    }

    pub fn variable(name: impl Into<String>, ty: ValueType) -> Self {
        Symbol::new(name, Some(ty), Binding::Variable)
    }

    pub fn array(name: impl Into<String>, ty: ValueType, bounds: ArrayBounds) -> Self {
        Symbol::new(name, Some(ty), Binding::Array(bounds))
    }

    pub fn function(name: impl Into<String>, return_type: ValueType, arg_types: Vec<ValueType>) -> Self {
        Symbol::new(name, Some(return_type), Binding::Function(arg_types))
    }

    pub fn procedure(name: impl Into<String>, arg_types: Vec<ValueType>) -> Self {
        Symbol::new(name, None, Binding::Procedure(arg_types))
    }

    pub fn id(&self) -> SymbolId {
        self.id
    }

    pub(crate) fn set_id(&mut self, id: SymbolId) {
        self.id = id;
    }

    pub fn kind(&self) -> SymbolKind {
        self.binding.kind()
    }

    pub fn array_bounds(&self) -> Option<ArrayBounds> {
        match self.binding {
            Binding::Array(bounds) => Some(bounds),
            _ => None,
        }
    }

    pub fn arg_types(&self) -> Option<&[ValueType]> {
        match &self.binding {
            Binding::Function(args) | Binding::Procedure(args) => Some(args),
            _ => None,
        }
    }
}
