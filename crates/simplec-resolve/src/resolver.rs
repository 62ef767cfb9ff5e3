//! Name resolution and semantic checks over one function body.

use std::collections::BTreeMap;

use serde::Serialize;
use simplec_syntax::ast::*;
use simplec_syntax::error::{Diagnostic, DiagnosticKind, Diagnostics, Result};

use crate::scope::Scopes;
use crate::symbol::{Binding, GlobalTable, LocalId, Symbol, SymbolKind};

/// Resolved references of one function (or of the global initializers).
///
/// `refs` maps the position of every identifier, call name and assignment
/// target to its declaration. A function whose resolution was aborted keeps
/// the references found before the abort.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Resolution {
    pub function: Option<String>,
    pub locals: Vec<Symbol>,
    #[serde(serialize_with = "refs_as_pairs")]
    pub refs: BTreeMap<Pos, Binding>,
    pub aborted: bool,
}

// JSON object keys must be strings, so positions go out as `[pos, binding]` pairs.
fn refs_as_pairs<S: serde::Serializer>(
    refs: &BTreeMap<Pos, Binding>,
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(refs.iter())
}

impl Resolution {
    pub fn binding_at(&self, pos: Pos) -> Option<Binding> {
        self.refs.get(&pos).copied()
    }

    /// Declaration the reference at `pos` resolved to.
    pub fn symbol_at<'a>(&'a self, globals: &'a GlobalTable, pos: Pos) -> Option<&'a Symbol> {
        match self.binding_at(pos)? {
            Binding::Global(id) => Some(globals.get(id)),
            Binding::Local(id) => self.locals.get(id.0),
        }
    }

    /// Local or parameter whose declarator sits at `pos`. Declarators after
    /// an aborting redeclaration were never bound and give `None`.
    pub fn declared_at(&self, pos: Pos) -> Option<LocalId> {
        self.locals.iter().position(|s| s.pos == pos).map(LocalId)
    }

    /// Whether the reference at `pos` names a local or a parameter.
    pub fn is_local_ref(&self, pos: Pos) -> bool {
        matches!(self.binding_at(pos), Some(Binding::Local(_)))
    }
}

struct Resolver<'g> {
    globals: &'g GlobalTable,
    /// Globals with an order below this are visible.
    visible_before: usize,
    order: usize,
    func: Option<(&'g str, Type)>,
    scopes: Scopes,
    res: Resolution,
    diags: Diagnostics,
}

impl<'g> Resolver<'g> {
    fn new(globals: &'g GlobalTable, order: usize) -> Self {
        Self {
            globals,
            visible_before: order,
            order,
            func: None,
            scopes: Scopes::new(),
            res: Resolution::default(),
            diags: Diagnostics::new(),
        }
    }

    fn finish(self) -> (Resolution, Diagnostics) {
        (self.res, self.diags)
    }

    fn lookup(&self, name: &str) -> Option<Binding> {
        if let Some(id) = self.scopes.resolve(name) {
            return Some(Binding::Local(id));
        }
        self.globals.lookup(name, self.visible_before).map(Binding::Global)
    }

    fn symbol(&self, binding: Binding) -> Option<&Symbol> {
        match binding {
            Binding::Global(id) => Some(self.globals.get(id)),
            Binding::Local(id) => self.res.locals.get(id.0),
        }
    }

    /// Declares a local or parameter in the innermost scope. A same-scope
    /// redeclaration is returned as an error and aborts the function.
    fn declare(&mut self, name: &str, kind: SymbolKind, ty: Type, pos: Pos) -> Result<()> {
        if ty == Type::Void {
            self.diags.report(
                DiagnosticKind::Semantic,
                pos,
                format!("variable '{}' declared void", name),
            );
        }
        let id = LocalId(self.res.locals.len());
        if let Err(prev) = self.scopes.declare(name, id) {
            let prev_pos = self.res.locals[prev.0].pos;
            return Err(Diagnostic::at(
                DiagnosticKind::Semantic,
                pos,
                format!(
                    "redeclaration of '{}' in the same scope (previous declaration at {}:{})",
                    name, prev_pos.line, prev_pos.col
                ),
            ));
        }
        tracing::trace!(name, depth = self.scopes.depth(), "declared local");
        self.res.locals.push(Symbol {
            name: name.to_string(),
            kind,
            ty,
            pos,
            order: self.order,
        });
        Ok(())
    }

    fn resolve_var(&mut self, name: &str, pos: Pos) {
        let Some(binding) = self.lookup(name) else {
            self.diags.report(
                DiagnosticKind::UnresolvedName,
                pos,
                format!("use of undeclared identifier '{}'", name),
            );
            return;
        };
        if self.symbol(binding).is_some_and(Symbol::is_function) {
            self.diags.report(
                DiagnosticKind::Semantic,
                pos,
                format!("function '{}' used as a variable", name),
            );
        }
        self.res.refs.insert(pos, binding);
    }

    fn resolve_call(&mut self, call: &Call, as_value: bool) {
        for arg in &call.args {
            self.expr(arg);
        }
        let Some(binding) = self.lookup(&call.name) else {
            self.diags.report(
                DiagnosticKind::UnresolvedName,
                call.pos,
                format!("call to undeclared function '{}'", call.name),
            );
            return;
        };
        self.res.refs.insert(call.pos, binding);

        let Some(sym) = self.symbol(binding) else {
            return;
        };
        let problem = match sym.kind {
            SymbolKind::Function { arity } if arity != call.args.len() => Some(format!(
                "function '{}' expects {} argument(s), found {}",
                call.name,
                arity,
                call.args.len()
            )),
            SymbolKind::Function { .. } if as_value && sym.ty == Type::Void => {
                Some(format!("void function '{}' used as a value", call.name))
            }
            SymbolKind::Function { .. } => None,
            _ => Some(format!("'{}' is not a function", call.name)),
        };
        if let Some(msg) = problem {
            self.diags.report(DiagnosticKind::Semantic, call.pos, msg);
        }
    }

    fn expr(&mut self, e: &Expr) {
        match e {
            Expr::IntLiteral(_) | Expr::FloatLiteral(_) => {}
            Expr::Ident { name, pos } => self.resolve_var(name, *pos),
            Expr::Unary { operand, .. } => self.expr(operand),
            Expr::Binary { lhs, rhs, .. } => {
                self.expr(lhs);
                self.expr(rhs);
            }
            Expr::Call(call) => self.resolve_call(call, true),
        }
    }

    fn assign(&mut self, a: &Assign) {
        self.resolve_var(&a.target, a.pos);
        self.expr(&a.expr);
    }

    /// Initializers are resolved before their declarator is bound, so
    /// `int x = x;` in a nested block reads the outer `x`.
    fn declaration(&mut self, decl: &Declaration) -> Result<()> {
        for d in &decl.declarators {
            if let Some(init) = &d.init {
                self.expr(init);
            }
            self.declare(&d.name, SymbolKind::Local, decl.ty, d.pos)?;
        }
        Ok(())
    }

    fn block_items(&mut self, block: &Block) -> Result<()> {
        for stmt in &block.stmts {
            self.stmt(stmt)?;
        }
        Ok(())
    }

    fn scoped_block(&mut self, block: &Block) -> Result<()> {
        self.scopes.push_scope();
        let result = self.block_items(block);
        self.scopes.pop_scope();
        result
    }

    fn stmt(&mut self, s: &Stmt) -> Result<()> {
        match &s.kind {
            StmtKind::Decl(decl) => self.declaration(decl)?,
            StmtKind::Assign(a) => self.assign(a),
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => {
                self.expr(cond);
                self.scoped_block(then_block)?;
                if let Some(else_block) = else_block {
                    self.scoped_block(else_block)?;
                }
            }
            StmtKind::While { cond, body } => {
                self.expr(cond);
                self.scoped_block(body)?;
            }
            StmtKind::For { init, cond, step, body } => {
                self.assign(init);
                self.expr(cond);
                self.assign(step);
                self.scoped_block(body)?;
            }
            StmtKind::Return(value) => {
                if let Some(value) = value {
                    self.expr(value);
                    if let Some((name, Type::Void)) = self.func {
                        self.diags.report(
                            DiagnosticKind::Semantic,
                            s.pos,
                            format!("void function '{}' should not return a value", name),
                        );
                    }
                }
            }
            StmtKind::Call(call) => self.resolve_call(call, false),
            StmtKind::Empty => {}
            StmtKind::Block(block) => self.scoped_block(block)?,
        }
        Ok(())
    }

    /// Parameters and the top-level items of the body share one scope.
    fn function(&mut self, func: &'g Function) -> Result<()> {
        self.func = Some((func.name.as_str(), func.return_type));
        self.scopes.push_scope();
        for p in &func.params {
            self.declare(&p.name, SymbolKind::Param, p.ty, p.pos)?;
        }
        let result = self.block_items(&func.body);
        self.scopes.pop_scope();
        result
    }
}

/// Resolve one function body against the frozen global table.
///
/// `order` is the function's order index (see [`GlobalTable::item_order`]);
/// the function itself is visible in its body. A same-scope redeclaration
/// stops resolution of this function only, with exactly one error for it.
pub fn resolve_function(globals: &GlobalTable, order: usize, func: &Function) -> (Resolution, Diagnostics) {
    let mut r = Resolver::new(globals, order);
    r.visible_before = order.saturating_add(1);
    r.res.function = Some(func.name.clone());
    if let Err(err) = r.function(func) {
        tracing::debug!(function = %func.name, "resolution aborted: {}", err);
        r.diags.push(err);
        r.res.aborted = true;
    }
    tracing::debug!(
        function = %func.name,
        locals = r.res.locals.len(),
        refs = r.res.refs.len(),
        "resolved function"
    );
    r.finish()
}

/// Resolve the initializers of global declarations. Each initializer sees
/// only the globals declared before its own declarator.
pub fn resolve_globals(globals: &GlobalTable, program: &Program) -> (Resolution, Diagnostics) {
    let mut r = Resolver::new(globals, 0);
    for (index, item) in program.items.iter().enumerate() {
        let Item::Declaration(decl) = item else {
            continue;
        };
        let first = globals.item_order(index);
        for (offset, d) in decl.declarators.iter().enumerate() {
            if let Some(init) = &d.init {
                r.visible_before = first + offset;
                r.expr(init);
            }
        }
    }
    r.finish()
}
