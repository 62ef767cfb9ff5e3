//! Text rendering of control-flow graphs.
//!
//! Each function prints as an `@<f>_entry` header carrying its signature,
//! its blocks `@<f>_B<n>` in id order, and an `@<f>_exit` block whose
//! predecessors are the blocks with no successors. Entry and exit exist
//! only in this rendering.

use std::fmt::Write;

use simplec_syntax::ast::{Call, Program};
use simplec_syntax::pretty::param_list;

use crate::graph::{BasicBlock, BlockId, BranchKind, Cfg, Instr, Terminator};

const INDENT: &str = "    ";

fn label(func: &str, id: BlockId) -> String {
    format!("{}_B{}", func, id.0)
}

fn label_list(func: &str, mut ids: Vec<BlockId>) -> String {
    if ids.is_empty() {
        return "-".to_string();
    }
    ids.sort();
    ids.iter().map(|&id| label(func, id)).collect::<Vec<_>>().join(", ")
}

fn annotate(line: &mut String, tag: &str, calls: &[&Call]) {
    for c in calls {
        let _ = write!(line, " # {}: {} -> {}_entry", tag, c.name, c.name);
    }
}

fn instr_line(instr: &Instr) -> String {
    let mut line = match instr {
        Instr::Decl { ty, name, init, .. } => match init {
            Some(e) => format!("{} {} = {};", ty, name, e),
            None => format!("{} {};", ty, name),
        },
        Instr::Assign(a) => format!("{};", a),
        Instr::Call(c) => format!("{};", c),
        Instr::Nop(_) => ";".to_string(),
    };
    let mut calls = instr.calls();
    if let Instr::Call(stmt_call) = instr {
        // the statement's own call is listed last by `calls`
        calls.pop();
        annotate(&mut line, "call", &[stmt_call]);
    }
    annotate(&mut line, "call in expr", &calls);
    line
}

fn terminator_line(func: &str, term: &Terminator) -> Option<String> {
    match term {
        Terminator::Return { value: Some(e), .. } => {
            let mut line = format!("return {};", e);
            let mut calls = Vec::new();
            e.for_each_call(&mut |c| calls.push(c));
            annotate(&mut line, "call in return", &calls);
            Some(line)
        }
        Terminator::Return { value: None, .. } => Some("return;".to_string()),
        Terminator::Branch {
            kind,
            cond,
            on_true,
            on_false,
        } => Some(match kind {
            BranchKind::If { has_else } => {
                let head = format!("if ({})", cond);
                let mut line = format!("{} # then: {}", head, label(func, *on_true));
                if *has_else {
                    let pad = " ".repeat(head.len());
                    let _ = write!(line, "\n{} # else: {}", pad, label(func, *on_false));
                }
                line
            }
            BranchKind::While => format!("while ({}) # loop_end: {}", cond, label(func, *on_false)),
            BranchKind::For => format!("for ({}) # loop_end: {}", cond, label(func, *on_false)),
        }),
        Terminator::FallOff | Terminator::Jump { .. } => None,
    }
}

fn write_lines(out: &mut String, lines: &[String]) {
    for line in lines {
        let _ = writeln!(out, "{}{}", INDENT, line.replace('\n', &format!("\n{}", INDENT)));
    }
}

fn write_block(out: &mut String, cfg: &Cfg, block: &BasicBlock, preds: Vec<BlockId>) {
    let func = cfg.function.as_str();
    let mut lines: Vec<String> = block.instrs.iter().map(instr_line).collect();
    lines.extend(terminator_line(func, &block.terminator));

    let _ = writeln!(out, "@{}\n{{", label(func, block.id));
    write_lines(out, &lines);
    let _ = writeln!(out, "}}");
    let _ = writeln!(out, "Predecessors: {}", label_list(func, preds));
    let _ = writeln!(out, "Successors: {}\n", label_list(func, block.successors()));
}

/// Render one function.
pub fn render_cfg(cfg: &Cfg) -> String {
    let mut out = String::new();
    let func = cfg.function.as_str();
    let params = param_list(&cfg.params);

    let _ = writeln!(out, "@{}_entry {{", func);
    let _ = writeln!(out, "{}name: {}", INDENT, func);
    let _ = writeln!(out, "{}ret_type: {}", INDENT, cfg.return_type);
    let _ = writeln!(out, "{}", format!("{}args: {}", INDENT, params).trim_end());
    let _ = writeln!(out, "}}");
    let _ = writeln!(out, "Predecessors: -");
    let _ = writeln!(out, "Successors: {}\n", label_list(func, vec![cfg.entry()]));

    let preds = cfg.predecessor_map();
    for block in &cfg.blocks {
        write_block(&mut out, cfg, block, preds[block.id.0].clone());
    }

    let _ = writeln!(out, "@{}_exit\n{{\n}}", func);
    let _ = writeln!(out, "Predecessors: {}", label_list(func, cfg.exits()));
    let _ = writeln!(out, "Successors: -\n");

    for dead in &cfg.dead_code {
        let _ = writeln!(out, "# dead code: {}:{} {}", dead.pos.line, dead.pos.col, dead.stmt);
    }
    if !cfg.dead_code.is_empty() {
        out.push('\n');
    }
    out
}

/// Render the whole translation unit: global declarations, then every
/// function CFG in order.
pub fn render_program<'a>(program: &Program, cfgs: impl IntoIterator<Item = &'a Cfg>) -> String {
    let mut out = String::from("# Control Flow Graph\n\n");
    let _ = writeln!(out, "@globals {{");
    let globals: Vec<String> = program.globals().map(|d| d.to_string()).collect();
    write_lines(&mut out, &globals);
    let _ = writeln!(out, "}}\nPredecessors: -\nSuccessors: -\n");
    for cfg in cfgs {
        out.push_str(&render_cfg(cfg));
    }
    out
}
