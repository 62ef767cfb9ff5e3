//! Live-variable analysis over a function CFG.
//!
//! A backwards may-analysis on locals and parameters:
//! `OUT[B] = ∪ IN[S]` over the successors `S` of `B`, and
//! `IN[B] = USE[B] ∪ (OUT[B] − DEF[B])`, iterated to a fixed point with a
//! worklist seeded in post-order. Parameters are live on entry by
//! construction; they never appear in the entry block's `DEF`.

use std::collections::{BTreeSet, VecDeque};
use std::fmt::Write;

use serde::Serialize;
use simplec_resolve::{Binding, LocalId, Resolution, Symbol};
use simplec_syntax::ast::{Expr, Pos};

use crate::graph::{BasicBlock, BlockId, Cfg, Instr, Terminator};

/// Variables by declaration, so a shadowing local never stands in for the
/// variable it hides.
pub type VarSet = BTreeSet<LocalId>;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlockLiveness {
    pub id: BlockId,
    /// Variables read before any write in the block.
    pub uses: VarSet,
    pub defs: VarSet,
    pub live_in: VarSet,
    pub live_out: VarSet,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Liveness {
    pub function: String,
    /// Locals and parameters, indexed by [`LocalId`].
    pub variables: Vec<Symbol>,
    pub blocks: Vec<BlockLiveness>,
    /// Blocks processed before the fixed point was reached.
    pub iterations: usize,
}

impl Liveness {
    pub fn block(&self, id: BlockId) -> &BlockLiveness {
        &self.blocks[id.0]
    }

    /// Sorted display names of `set`. A name shared by two members of the
    /// set is qualified with its declaration position, e.g. `a@1:11`.
    pub fn names(&self, set: &VarSet) -> Vec<String> {
        let name_of = |id: &LocalId| self.variables[id.0].name.as_str();
        let mut names: Vec<String> = set
            .iter()
            .map(|id| {
                let name = name_of(id);
                if set.iter().filter(|&other| name_of(other) == name).count() > 1 {
                    let pos = self.variables[id.0].pos;
                    format!("{}@{}:{}", name, pos.line, pos.col)
                } else {
                    name.to_string()
                }
            })
            .collect();
        names.sort();
        names
    }

    /// `B0-IN: a, b` / `B0-OUT: ;` lines under a `# <function>` header.
    pub fn render(&self) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# {}", self.function);
        for b in &self.blocks {
            let _ = writeln!(out, "{}-IN: {}", b.id, self.format_set(&b.live_in));
            let _ = writeln!(out, "{}-OUT: {}", b.id, self.format_set(&b.live_out));
        }
        out
    }

    fn format_set(&self, set: &VarSet) -> String {
        if set.is_empty() {
            return ";".to_string();
        }
        self.names(set).join(", ")
    }
}

/// Collects `USE`/`DEF` for one block, consulting `res` to keep only
/// references bound to locals and parameters.
struct UseDef<'r> {
    res: &'r Resolution,
    uses: VarSet,
    defs: VarSet,
}

fn local_at(res: &Resolution, pos: Pos) -> Option<LocalId> {
    match res.binding_at(pos)? {
        Binding::Local(id) => Some(id),
        Binding::Global(_) => None,
    }
}

impl UseDef<'_> {
    fn read(&mut self, e: &Expr) {
        let res = self.res;
        let (uses, defs) = (&mut self.uses, &self.defs);
        e.for_each_ident(&mut |_, pos| {
            if let Some(id) = local_at(res, pos) {
                if !defs.contains(&id) {
                    uses.insert(id);
                }
            }
        });
    }

    fn write(&mut self, id: Option<LocalId>) {
        if let Some(id) = id {
            self.defs.insert(id);
        }
    }

    fn block(mut self, block: &BasicBlock) -> (VarSet, VarSet) {
        for instr in &block.instrs {
            match instr {
                Instr::Decl { init, pos, .. } => {
                    if let Some(init) = init {
                        self.read(init);
                    }
                    let id = self.res.declared_at(*pos);
                    self.write(id);
                }
                Instr::Assign(a) => {
                    self.read(&a.expr);
                    let id = local_at(self.res, a.pos);
                    self.write(id);
                }
                Instr::Call(call) => {
                    for arg in &call.args {
                        self.read(arg);
                    }
                }
                Instr::Nop(_) => {}
            }
        }
        match &block.terminator {
            Terminator::Return { value: Some(e), .. } | Terminator::Branch { cond: e, .. } => self.read(e),
            _ => {}
        }
        (self.uses, self.defs)
    }
}

/// Solve liveness for `cfg`, using `res` (the function's name resolution)
/// to decide which names are locals.
pub fn analyze(cfg: &Cfg, res: &Resolution) -> Liveness {
    let mut blocks: Vec<BlockLiveness> = cfg
        .blocks
        .iter()
        .map(|b| {
            let (uses, defs) = UseDef {
                res,
                uses: VarSet::new(),
                defs: VarSet::new(),
            }
            .block(b);
            BlockLiveness {
                id: b.id,
                uses,
                defs,
                ..BlockLiveness::default()
            }
        })
        .collect();

    let preds = cfg.predecessor_map();
    let mut worklist: VecDeque<BlockId> = cfg.post_order().into();
    let mut queued = vec![false; blocks.len()];
    for id in &worklist {
        queued[id.0] = true;
    }

    let mut iterations = 0;
    while let Some(id) = worklist.pop_front() {
        queued[id.0] = false;
        iterations += 1;

        let mut out = VarSet::new();
        for succ in cfg.successors(id) {
            out.extend(blocks[succ.0].live_in.iter().copied());
        }
        let b = &blocks[id.0];
        let mut live_in = b.uses.clone();
        live_in.extend(out.difference(&b.defs).copied());

        let changed = live_in != b.live_in;
        blocks[id.0].live_out = out;
        if changed {
            blocks[id.0].live_in = live_in;
            for &p in &preds[id.0] {
                if !queued[p.0] {
                    queued[p.0] = true;
                    worklist.push_back(p);
                }
            }
        }
    }
    tracing::debug!(function = %cfg.function, iterations, "liveness converged");

    Liveness {
        function: cfg.function.clone(),
        variables: res.locals.clone(),
        blocks,
        iterations,
    }
}
