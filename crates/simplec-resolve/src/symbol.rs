//! Symbols and the translation-unit global table.

use std::collections::HashMap;

use serde::Serialize;
use simplec_syntax::ast::{Item, Pos, Program, Type};
use simplec_syntax::error::{DiagnosticKind, Diagnostics};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct GlobalId(pub usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct LocalId(pub usize);

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum SymbolKind {
    Global,
    Function { arity: usize },
    Param,
    Local,
}

/// A declared name.
///
/// For functions `ty` is the return type. `order` is the position of the
/// declaration among all global items; locals carry their function's order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Symbol {
    pub name: String,
    pub kind: SymbolKind,
    pub ty: Type,
    pub pos: Pos,
    pub order: usize,
}

impl Symbol {
    pub fn is_function(&self) -> bool {
        matches!(self.kind, SymbolKind::Function { .. })
    }

    /// Locals and parameters; the names dataflow analyses track.
    pub fn is_local(&self) -> bool {
        matches!(self.kind, SymbolKind::Param | SymbolKind::Local)
    }
}

/// What a reference resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "scope", content = "id", rename_all = "lowercase")]
pub enum Binding {
    Global(GlobalId),
    Local(LocalId),
}

/// Global variables and functions of one translation unit.
///
/// Built in a single pass before any function body is looked at, then only
/// read. Visibility follows declaration order: a lookup made at order `n`
/// sees only symbols declared at an order below `n`.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GlobalTable {
    symbols: Vec<Symbol>,
    #[serde(skip)]
    by_name: HashMap<String, GlobalId>,
    /// First order index of every item in `Program::items`.
    #[serde(skip)]
    item_orders: Vec<usize>,
}

impl GlobalTable {
    pub fn build(program: &Program) -> (GlobalTable, Diagnostics) {
        let mut table = GlobalTable::default();
        let mut diags = Diagnostics::new();
        let mut order = 0usize;

        for item in &program.items {
            table.item_orders.push(order);
            match item {
                Item::Declaration(decl) => {
                    for d in &decl.declarators {
                        if decl.ty == Type::Void {
                            diags.report(
                                DiagnosticKind::Semantic,
                                d.pos,
                                format!("variable '{}' declared void", d.name),
                            );
                        }
                        table.insert(
                            Symbol {
                                name: d.name.clone(),
                                kind: SymbolKind::Global,
                                ty: decl.ty,
                                pos: d.pos,
                                order,
                            },
                            &mut diags,
                        );
                        order += 1;
                    }
                }
                Item::Function(func) => {
                    table.insert(
                        Symbol {
                            name: func.name.clone(),
                            kind: SymbolKind::Function {
                                arity: func.params.len(),
                            },
                            ty: func.return_type,
                            pos: func.pos,
                            order,
                        },
                        &mut diags,
                    );
                    order += 1;
                }
            }
        }
        tracing::debug!(globals = table.symbols.len(), "built global table");
        (table, diags)
    }

    fn insert(&mut self, sym: Symbol, diags: &mut Diagnostics) {
        if let Some(prev) = self.by_name.get(&sym.name) {
            let prev = &self.symbols[prev.0];
            diags.report(
                DiagnosticKind::Semantic,
                sym.pos,
                format!(
                    "redeclaration of '{}' (previous declaration at {}:{})",
                    sym.name, prev.pos.line, prev.pos.col
                ),
            );
            return;
        }
        let id = GlobalId(self.symbols.len());
        self.by_name.insert(sym.name.clone(), id);
        self.symbols.push(sym);
    }

    /// Looks `name` up as seen from a point at order `before`.
    pub fn lookup(&self, name: &str, before: usize) -> Option<GlobalId> {
        self.by_name
            .get(name)
            .copied()
            .filter(|id| self.symbols[id.0].order < before)
    }

    pub fn get(&self, id: GlobalId) -> &Symbol {
        &self.symbols[id.0]
    }

    /// Order index of `program.items[index]`; for a declaration, that of its
    /// first declarator.
    pub fn item_order(&self, index: usize) -> usize {
        self.item_orders.get(index).copied().unwrap_or(usize::MAX)
    }

    pub fn iter(&self) -> impl Iterator<Item = (GlobalId, &Symbol)> {
        self.symbols.iter().enumerate().map(|(i, s)| (GlobalId(i), s))
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }
}
