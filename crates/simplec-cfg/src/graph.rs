//! Control-flow graph data types.
//!
//! Blocks live in a flat arena owned by [`Cfg`] and refer to each other by
//! [`BlockId`] only, so loop back-edges are plain indices.

use std::fmt;

use serde::Serialize;
use simplec_syntax::ast::{Assign, Call, Expr, Param, Pos, Type};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct BlockId(pub usize);

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "B{}", self.0)
    }
}

/// A straight-line instruction inside a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "op", rename_all = "lowercase")]
pub enum Instr {
    /// One declarator of a local declaration.
    Decl {
        ty: Type,
        name: String,
        init: Option<Expr>,
        pos: Pos,
    },
    Assign(Assign),
    Call(Call),
    /// Marker left by a run of empty statements.
    Nop(Pos),
}

impl Instr {
    /// Calls made by this instruction, innermost first.
    pub fn calls(&self) -> Vec<&Call> {
        let mut out = Vec::new();
        match self {
            Instr::Decl { init: Some(e), .. } => e.for_each_call(&mut |c| out.push(c)),
            Instr::Assign(a) => a.expr.for_each_call(&mut |c| out.push(c)),
            Instr::Call(c) => {
                for arg in &c.args {
                    arg.for_each_call(&mut |inner| out.push(inner));
                }
                out.push(c);
            }
            Instr::Decl { init: None, .. } | Instr::Nop(_) => {}
        }
        out
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BranchKind {
    If { has_else: bool },
    While,
    For,
}

/// How control leaves a block.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "terminator", rename_all = "snake_case")]
pub enum Terminator {
    Return { value: Option<Expr>, pos: Pos },
    /// Control reaches the end of the function body without a `return`.
    FallOff,
    Jump { target: BlockId },
    Branch {
        kind: BranchKind,
        cond: Expr,
        on_true: BlockId,
        on_false: BlockId,
    },
}

impl Terminator {
    /// Rewrites every successor edge through `f`.
    pub(crate) fn retarget(&mut self, f: impl Fn(BlockId) -> BlockId) {
        match self {
            Terminator::Jump { target } => *target = f(*target),
            Terminator::Branch { on_true, on_false, .. } => {
                *on_true = f(*on_true);
                *on_false = f(*on_false);
            }
            Terminator::Return { .. } | Terminator::FallOff => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BasicBlock {
    pub id: BlockId,
    pub instrs: Vec<Instr>,
    pub terminator: Terminator,
}

impl BasicBlock {
    /// 0 successors for Return and FallOff, 1 for a jump, 2 for a branch
    /// (true edge first).
    pub fn successors(&self) -> Vec<BlockId> {
        match &self.terminator {
            Terminator::Return { .. } | Terminator::FallOff => Vec::new(),
            Terminator::Jump { target } => vec![*target],
            Terminator::Branch { on_true, on_false, .. } => vec![*on_true, *on_false],
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.terminator, Terminator::Return { .. } | Terminator::FallOff)
    }

    /// Names of the functions called from this block, in execution order.
    pub fn callees(&self) -> Vec<&str> {
        let mut calls: Vec<&Call> = self.instrs.iter().flat_map(Instr::calls).collect();
        match &self.terminator {
            Terminator::Return { value: Some(e), .. } | Terminator::Branch { cond: e, .. } => {
                e.for_each_call(&mut |c| calls.push(c))
            }
            _ => {}
        }
        calls.into_iter().map(|c| c.name.as_str()).collect()
    }
}

/// A statement that can never execute.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeadCode {
    pub pos: Pos,
    pub stmt: String,
}

/// Control-flow graph of one function. Block 0 is the entry.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cfg {
    pub function: String,
    pub return_type: Type,
    pub params: Vec<Param>,
    pub blocks: Vec<BasicBlock>,
    pub dead_code: Vec<DeadCode>,
}

impl Cfg {
    pub fn entry(&self) -> BlockId {
        BlockId(0)
    }

    pub fn block(&self, id: BlockId) -> &BasicBlock {
        &self.blocks[id.0]
    }

    pub fn successors(&self, id: BlockId) -> Vec<BlockId> {
        self.block(id).successors()
    }

    /// Predecessors of `id`, in block order.
    pub fn predecessors(&self, id: BlockId) -> Vec<BlockId> {
        self.blocks
            .iter()
            .filter(|b| b.successors().contains(&id))
            .map(|b| b.id)
            .collect()
    }

    /// All predecessor lists at once, indexed by block.
    pub fn predecessor_map(&self) -> Vec<Vec<BlockId>> {
        let mut preds = vec![Vec::new(); self.blocks.len()];
        for b in &self.blocks {
            for s in b.successors() {
                if !preds[s.0].contains(&b.id) {
                    preds[s.0].push(b.id);
                }
            }
        }
        preds
    }

    /// Blocks with no successors.
    pub fn exits(&self) -> Vec<BlockId> {
        self.blocks.iter().filter(|b| b.is_terminal()).map(|b| b.id).collect()
    }

    /// Blocks in DFS post-order from the entry; unreachable blocks are absent.
    pub fn post_order(&self) -> Vec<BlockId> {
        let mut visited = vec![false; self.blocks.len()];
        let mut order = Vec::with_capacity(self.blocks.len());
        if self.blocks.is_empty() {
            return order;
        }
        // explicit stack of (block, next successor index)
        let mut stack = vec![(self.entry(), 0usize)];
        visited[self.entry().0] = true;
        while let Some((id, next)) = stack.pop() {
            let succs = self.successors(id);
            if let Some(&succ) = succs.get(next) {
                stack.push((id, next + 1));
                if !visited[succ.0] {
                    visited[succ.0] = true;
                    stack.push((succ, 0));
                }
            } else {
                order.push(id);
            }
        }
        order
    }
}
