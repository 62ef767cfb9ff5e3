//! Scope table and name resolution for SimpleC.
//!
//! Resolution runs after parsing in two steps. [`GlobalTable::build`] records
//! every global variable and function once; the table is then frozen and
//! shared. Each function body is resolved on its own by
//! [`resolve_function`], so functions can be processed in any order or in
//! parallel, with one diagnostics collector each.

mod resolver;
mod scope;
pub mod symbol;

pub use resolver::{resolve_function, resolve_globals, Resolution};
pub use symbol::{Binding, GlobalId, GlobalTable, LocalId, Symbol, SymbolKind};
