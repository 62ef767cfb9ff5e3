//! Lowering of a function body into basic blocks.

use simplec_syntax::ast::*;
use simplec_syntax::error::{DiagnosticKind, Diagnostics};

use crate::graph::{BasicBlock, BlockId, BranchKind, Cfg, DeadCode, Instr, Terminator};

/// A block under construction; the terminator is patched in when known.
#[derive(Default)]
struct PendingBlock {
    instrs: Vec<Instr>,
    terminator: Option<Terminator>,
}

pub(crate) struct FuncBuilder {
    blocks: Vec<PendingBlock>,
    /// Block receiving straight-line code; `None` while code is unreachable.
    current: Option<BlockId>,
    dead_code: Vec<DeadCode>,
    diags: Diagnostics,
}

impl FuncBuilder {
    pub(crate) fn new() -> Self {
        let mut b = Self {
            blocks: Vec::new(),
            current: None,
            dead_code: Vec::new(),
            diags: Diagnostics::new(),
        };
        b.current = Some(b.new_block());
        b
    }

    pub(crate) fn finish(mut self, func: &Function) -> (Cfg, Diagnostics) {
        if let Some(open) = self.current.take() {
            self.terminate(open, Terminator::FallOff);
        }
        let blocks = self
            .blocks
            .into_iter()
            .enumerate()
            .map(|(i, b)| BasicBlock {
                id: BlockId(i),
                instrs: b.instrs,
                terminator: b.terminator.unwrap_or(Terminator::FallOff),
            })
            .collect();
        let blocks = fold_jump_blocks(blocks);
        let cfg = Cfg {
            function: func.name.clone(),
            return_type: func.return_type,
            params: func.params.clone(),
            blocks,
            dead_code: self.dead_code,
        };
        (cfg, self.diags)
    }

    fn new_block(&mut self) -> BlockId {
        self.blocks.push(PendingBlock::default());
        BlockId(self.blocks.len() - 1)
    }

    fn terminate(&mut self, id: BlockId, term: Terminator) {
        self.blocks[id.0].terminator = Some(term);
    }

    /// Seals the current block with `term`; following code is unreachable
    /// until a new block is opened.
    fn seal(&mut self, term: Terminator) {
        if let Some(open) = self.current.take() {
            self.terminate(open, term);
        }
    }

    fn emit(&mut self, instr: Instr) {
        if let Some(open) = self.current {
            self.blocks[open.0].instrs.push(instr);
        }
    }

    /// Consecutive empty statements leave a single marker.
    fn emit_nop(&mut self, pos: Pos) {
        let Some(open) = self.current else { return };
        let instrs = &mut self.blocks[open.0].instrs;
        if !matches!(instrs.last(), Some(Instr::Nop(_))) {
            instrs.push(Instr::Nop(pos));
        }
    }

    pub(crate) fn emit_block(&mut self, block: &Block) {
        for stmt in &block.stmts {
            self.emit_stmt(stmt);
        }
    }

    fn emit_stmt(&mut self, s: &Stmt) {
        if self.current.is_none() {
            tracing::trace!(line = s.pos.line, col = s.pos.col, "unreachable statement");
            self.dead_code.push(DeadCode {
                pos: s.pos,
                stmt: s.summary(),
            });
            self.diags.report(
                DiagnosticKind::DeadCode,
                s.pos,
                format!("unreachable statement '{}'", s.summary()),
            );
            return;
        }
        match &s.kind {
            StmtKind::Decl(decl) => {
                for d in &decl.declarators {
                    self.emit(Instr::Decl {
                        ty: decl.ty,
                        name: d.name.clone(),
                        init: d.init.clone(),
                        pos: d.pos,
                    });
                }
            }
            StmtKind::Assign(a) => self.emit(Instr::Assign(a.clone())),
            StmtKind::Call(call) => self.emit(Instr::Call(call.clone())),
            StmtKind::Empty => self.emit_nop(s.pos),
            StmtKind::Return(value) => self.seal(Terminator::Return {
                value: value.clone(),
                pos: s.pos,
            }),
            StmtKind::Block(block) => self.emit_block(block),
            StmtKind::If {
                cond,
                then_block,
                else_block,
            } => self.emit_if(cond, then_block, else_block.as_ref()),
            StmtKind::While { cond, body } => {
                self.emit_loop(BranchKind::While, cond, body, None);
            }
            StmtKind::For { init, cond, step, body } => {
                self.emit(Instr::Assign(init.clone()));
                self.emit_loop(BranchKind::For, cond, body, Some(step));
            }
        }
    }

    fn emit_if(&mut self, cond: &Expr, then_block: &Block, else_block: Option<&Block>) {
        let Some(head) = self.current.take() else { return };

        let then_entry = self.new_block();
        self.current = Some(then_entry);
        self.emit_block(then_block);
        let then_end = self.current.take();

        let Some(else_block) = else_block else {
            // the merge block is the false-edge target itself
            let merge = self.new_block();
            self.terminate(
                head,
                Terminator::Branch {
                    kind: BranchKind::If { has_else: false },
                    cond: cond.clone(),
                    on_true: then_entry,
                    on_false: merge,
                },
            );
            if let Some(end) = then_end {
                self.terminate(end, Terminator::Jump { target: merge });
            }
            self.current = Some(merge);
            return;
        };

        let else_entry = self.new_block();
        self.current = Some(else_entry);
        self.emit_block(else_block);
        let else_end = self.current.take();

        self.terminate(
            head,
            Terminator::Branch {
                kind: BranchKind::If { has_else: true },
                cond: cond.clone(),
                on_true: then_entry,
                on_false: else_entry,
            },
        );

        // no merge block when neither branch falls through
        if then_end.is_none() && else_end.is_none() {
            return;
        }
        let merge = self.new_block();
        for end in [then_end, else_end].into_iter().flatten() {
            self.terminate(end, Terminator::Jump { target: merge });
        }
        self.current = Some(merge);
    }

    /// Condition test, body with back-edge, and exit block. The test reuses
    /// the open block when that block is empty and is not the entry.
    fn emit_loop(&mut self, kind: BranchKind, cond: &Expr, body: &Block, step: Option<&Assign>) {
        let Some(pre) = self.current.take() else { return };

        let header = if pre.0 != 0 && self.blocks[pre.0].instrs.is_empty() {
            pre
        } else {
            let header = self.new_block();
            self.terminate(pre, Terminator::Jump { target: header });
            header
        };

        let body_entry = self.new_block();
        self.current = Some(body_entry);
        self.emit_block(body);
        if let Some(step) = step {
            self.emit(Instr::Assign(step.clone()));
        }
        if let Some(end) = self.current.take() {
            self.terminate(end, Terminator::Jump { target: header });
        }

        let exit = self.new_block();
        self.terminate(
            header,
            Terminator::Branch {
                kind,
                cond: cond.clone(),
                on_true: body_entry,
                on_false: exit,
            },
        );
        self.current = Some(exit);
    }
}

/// Removes empty non-entry blocks whose terminator is a plain jump, sending
/// their incoming edges straight to the jump target, then renumbers the
/// remaining blocks densely in their original order.
fn fold_jump_blocks(blocks: Vec<BasicBlock>) -> Vec<BasicBlock> {
    let forward: Vec<Option<BlockId>> = blocks
        .iter()
        .map(|b| match b.terminator {
            Terminator::Jump { target } if b.id.0 != 0 && b.instrs.is_empty() && target != b.id => Some(target),
            _ => None,
        })
        .collect();
    if forward.iter().all(Option::is_none) {
        return blocks;
    }

    // final destination of each block after following chains of empty jumps
    let targets: Vec<BlockId> = (0..blocks.len())
        .map(|i| {
            let mut id = BlockId(i);
            for _ in 0..forward.len() {
                match forward[id.0] {
                    Some(next) => id = next,
                    None => break,
                }
            }
            id
        })
        .collect();

    let mut keep: Vec<bool> = forward.iter().map(Option::is_none).collect();
    // a cycle made only of empty jumps keeps the block the walk stopped on
    for t in &targets {
        keep[t.0] = true;
    }

    let mut renumber = vec![0; blocks.len()];
    let mut next = 0;
    for (i, kept) in keep.iter().enumerate() {
        if *kept {
            renumber[i] = next;
            next += 1;
        }
    }
    tracing::trace!(before = blocks.len(), after = next, "folded empty jump blocks");

    blocks
        .into_iter()
        .filter(|b| keep[b.id.0])
        .map(|mut b| {
            b.id = BlockId(renumber[b.id.0]);
            b.terminator.retarget(|t| BlockId(renumber[targets[t.0].0]));
            b
        })
        .collect()
}
