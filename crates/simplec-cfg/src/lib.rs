//! SimpleC control-flow graphs: construction, dead-code findings, liveness
//! and text rendering.

mod builder;
pub mod graph;
pub mod liveness;
pub mod render;

pub use graph::{BasicBlock, BlockId, BranchKind, Cfg, DeadCode, Instr, Terminator};
pub use liveness::{BlockLiveness, Liveness};
pub use render::{render_cfg, render_program};

use simplec_syntax::ast::Function;
use simplec_syntax::error::Diagnostics;

/// Build the CFG of one function. Unreachable statements are left out of
/// every block and reported both as [`DeadCode`] findings on the graph and
/// as warnings in the returned diagnostics.
pub fn build_cfg(func: &Function) -> (Cfg, Diagnostics) {
    let mut builder = builder::FuncBuilder::new();
    builder.emit_block(&func.body);
    let (cfg, diags) = builder.finish(func);
    tracing::debug!(
        function = %cfg.function,
        blocks = cfg.blocks.len(),
        dead = cfg.dead_code.len(),
        "built cfg"
    );
    (cfg, diags)
}

#[cfg(test)]
mod tests {
    use super::*;
    use liveness::VarSet;
    use simplec_resolve::{resolve_function, GlobalTable, LocalId};
    use simplec_syntax::ast::*;
    use simplec_syntax::error::DiagnosticKind;

    fn parse_str(input: &str) -> Program {
        let (program, diags) = simplec_parser::parse(input);
        assert!(diags.is_empty(), "unexpected parse errors: {:?}", diags);
        program
    }

    fn build_str(input: &str) -> Vec<Cfg> {
        parse_str(input).functions().map(|f| build_cfg(f).0).collect()
    }

    fn liveness_of(input: &str) -> Liveness {
        let program = parse_str(input);
        let (globals, _) = GlobalTable::build(&program);
        let (index, func) = program
            .items
            .iter()
            .enumerate()
            .find_map(|(i, item)| match item {
                Item::Function(f) => Some((i, f)),
                Item::Declaration(_) => None,
            })
            .unwrap();
        let (res, _) = resolve_function(&globals, globals.item_order(index), func);
        liveness::analyze(&build_cfg(func).0, &res)
    }

    fn build_one(input: &str) -> Cfg {
        let mut cfgs = build_str(input);
        assert_eq!(cfgs.len(), 1);
        cfgs.remove(0)
    }

    fn instr_texts(block: &BasicBlock) -> Vec<String> {
        block
            .instrs
            .iter()
            .map(|i| match i {
                Instr::Decl { ty, name, init: Some(e), .. } => format!("{} {} = {}", ty, name, e),
                Instr::Decl { ty, name, init: None, .. } => format!("{} {}", ty, name),
                Instr::Assign(a) => a.to_string(),
                Instr::Call(c) => c.to_string(),
                Instr::Nop(_) => ";".to_string(),
            })
            .collect()
    }

    fn returned(block: &BasicBlock) -> Option<String> {
        match &block.terminator {
            Terminator::Return { value: Some(e), .. } => Some(e.to_string()),
            _ => None,
        }
    }

    fn branch(block: &BasicBlock) -> (BranchKind, BlockId, BlockId) {
        match &block.terminator {
            Terminator::Branch {
                kind,
                on_true,
                on_false,
                ..
            } => (*kind, *on_true, *on_false),
            other => panic!("Expected branch, got {:?}", other),
        }
    }

    /// Structural properties every graph must have.
    fn check_shape(cfg: &Cfg) {
        assert!(cfg.predecessors(cfg.entry()).is_empty(), "entry has a predecessor");
        let reachable = cfg.post_order();
        for b in &cfg.blocks {
            assert!(reachable.contains(&b.id), "{} unreachable", b.id);
            if b.successors().is_empty() {
                assert!(matches!(b.terminator, Terminator::Return { .. } | Terminator::FallOff));
            }
        }
    }

    #[test]
    fn test_return_in_then_branch_makes_dead_code() {
        let cfg = build_one("int f(){ if (1) { return 1; x = 2; } return 3; }");
        check_shape(&cfg);
        assert_eq!(cfg.blocks.len(), 3);

        let (kind, then_b, else_b) = branch(&cfg.blocks[0]);
        assert_eq!(kind, BranchKind::If { has_else: false });
        assert_eq!(returned(cfg.block(then_b)).as_deref(), Some("1"));
        assert!(cfg.block(then_b).instrs.is_empty());
        assert_eq!(returned(cfg.block(else_b)).as_deref(), Some("3"));

        assert_eq!(cfg.dead_code.len(), 1);
        assert_eq!(cfg.dead_code[0].stmt, "x = 2;");
        assert_eq!(cfg.dead_code[0].pos, Pos::new(1, 29));
        assert!(cfg.blocks.iter().flat_map(|b| &b.instrs).all(|i| !matches!(i, Instr::Assign(_))));
    }

    #[test]
    fn test_while_loop_shape() {
        let cfg = build_one("int g(int n){ int s=0; while(n>0){ s=s+n; n=n-1; } return s; }");
        check_shape(&cfg);
        assert_eq!(cfg.blocks.len(), 4);

        assert_eq!(instr_texts(&cfg.blocks[0]), vec!["int s = 0"]);
        assert_eq!(cfg.blocks[0].terminator, Terminator::Jump { target: BlockId(1) });

        let (kind, body, exit) = branch(&cfg.blocks[1]);
        assert_eq!(kind, BranchKind::While);
        assert_eq!(instr_texts(cfg.block(body)), vec!["s = s + n", "n = n - 1"]);
        // back-edge
        assert_eq!(cfg.successors(body), vec![BlockId(1)]);
        assert_eq!(returned(cfg.block(exit)).as_deref(), Some("s"));
        assert_eq!(cfg.predecessors(BlockId(1)), vec![BlockId(0), body]);
    }

    #[test]
    fn test_if_without_else_false_edge_is_merge() {
        let cfg = build_one("void f(int a) { if (a > 0) { a = 1; } a = 2; }");
        check_shape(&cfg);
        let (_, then_b, merge) = branch(&cfg.blocks[0]);
        assert_eq!(cfg.successors(then_b), vec![merge]);
        assert_eq!(instr_texts(cfg.block(merge)), vec!["a = 2"]);
        assert_eq!(cfg.block(merge).terminator, Terminator::FallOff);
        assert_eq!(cfg.blocks.len(), 3);
    }

    #[test]
    fn test_if_else_with_both_returns_has_no_merge() {
        let cfg = build_one("int f(int a) {\n  if (a) return 1; else return 2;\n  a = 3;\n}");
        check_shape(&cfg);
        assert_eq!(cfg.blocks.len(), 3);
        assert_eq!(cfg.exits(), vec![BlockId(1), BlockId(2)]);
        assert_eq!(cfg.dead_code.len(), 1);
        assert_eq!(cfg.dead_code[0].pos, Pos::new(3, 3));
    }

    #[test]
    fn test_if_else_merge_when_one_branch_falls_through() {
        let cfg = build_one("int f(int a) { if (a) { return 1; } else { a = 2; } return a; }");
        check_shape(&cfg);
        let (_, then_b, else_b) = branch(&cfg.blocks[0]);
        assert!(cfg.successors(then_b).is_empty());
        let merge = cfg.successors(else_b)[0];
        assert_eq!(cfg.predecessors(merge), vec![else_b]);
        assert_eq!(returned(cfg.block(merge)).as_deref(), Some("a"));
    }

    #[test]
    fn test_empty_statements_collapse() {
        let cfg = build_one("void f(int a) { ;; ; a = 1; ; ; }");
        assert_eq!(cfg.blocks.len(), 1);
        assert_eq!(instr_texts(&cfg.blocks[0]), vec![";", "a = 1", ";"]);
    }

    #[test]
    fn test_loop_that_always_returns_keeps_test_and_exit() {
        let cfg = build_one("int f(int n) { while (n) { return 1; } return 0; }");
        check_shape(&cfg);
        // entry stays empty and jumps to the test
        assert!(cfg.blocks[0].instrs.is_empty());
        assert_eq!(cfg.successors(BlockId(0)), vec![BlockId(1)]);
        let (_, body, exit) = branch(&cfg.blocks[1]);
        assert_eq!(returned(cfg.block(body)).as_deref(), Some("1"));
        assert_eq!(returned(cfg.block(exit)).as_deref(), Some("0"));
        assert_eq!(cfg.predecessors(BlockId(1)), vec![BlockId(0)]);
    }

    #[test]
    fn test_for_loop_places_step_after_body() {
        let cfg = build_one(
            "int f() { int i, s; s = 0; for (i = 0; i < 3; i = i + 1) s = s + i; return s; }",
        );
        check_shape(&cfg);
        assert_eq!(instr_texts(&cfg.blocks[0]), vec!["int i", "int s", "s = 0", "i = 0"]);
        let (kind, body, exit) = branch(&cfg.blocks[1]);
        assert_eq!(kind, BranchKind::For);
        assert_eq!(instr_texts(cfg.block(body)), vec!["s = s + i", "i = i + 1"]);
        assert_eq!(cfg.successors(body), vec![BlockId(1)]);
        assert_eq!(returned(cfg.block(exit)).as_deref(), Some("s"));
    }

    #[test]
    fn test_empty_merge_block_becomes_loop_test() {
        let cfg = build_one("void f(int a) { if (a) { a = 1; } while (a) { a = a - 1; } }");
        check_shape(&cfg);
        let (_, _, merge) = branch(&cfg.blocks[0]);
        let (kind, body, exit) = branch(cfg.block(merge));
        assert_eq!(kind, BranchKind::While);
        assert_eq!(cfg.predecessors(merge), vec![BlockId(0), BlockId(1), body]);
        assert_eq!(cfg.block(exit).terminator, Terminator::FallOff);
    }

    fn assert_no_jump_only_blocks(cfg: &Cfg) {
        for b in cfg.blocks.iter().skip(1) {
            assert!(
                !(b.instrs.is_empty() && matches!(b.terminator, Terminator::Jump { .. })),
                "{} only jumps",
                b.id
            );
        }
    }

    #[test]
    fn test_nested_if_leaves_no_empty_jump_block() {
        let cfg = build_one("void f(int a) { if (a) { if (a) { a = 1; } } a = 2; }");
        check_shape(&cfg);
        assert_no_jump_only_blocks(&cfg);
        assert_eq!(cfg.blocks.len(), 4);

        let (_, inner, merge) = branch(&cfg.blocks[0]);
        assert_eq!(inner, BlockId(1));
        assert_eq!(instr_texts(cfg.block(merge)), vec!["a = 2"]);
        // the inner if's false edge goes straight to the outer merge
        let (_, then_b, inner_false) = branch(cfg.block(inner));
        assert_eq!(inner_false, merge);
        assert_eq!(cfg.successors(then_b), vec![merge]);
        assert_eq!(cfg.predecessors(merge), vec![BlockId(0), BlockId(1), then_b]);
    }

    #[test]
    fn test_empty_then_branch_goes_to_merge() {
        let cfg = build_one("void f(int a) { if (a) { } a = 1; }");
        check_shape(&cfg);
        assert_eq!(cfg.blocks.len(), 2);
        assert_eq!(cfg.successors(BlockId(0)), vec![BlockId(1), BlockId(1)]);
        assert_eq!(cfg.predecessors(BlockId(1)), vec![BlockId(0)]);
    }

    #[test]
    fn test_inner_loop_exit_returns_to_outer_test() {
        let cfg = build_one("void f(int a, int b) { while (a) { while (b) { b = b - 1; } } }");
        check_shape(&cfg);
        assert_no_jump_only_blocks(&cfg);
        assert_eq!(cfg.blocks.len(), 5);

        let (_, inner, outer_exit) = branch(&cfg.blocks[1]);
        let (kind, body, inner_exit) = branch(cfg.block(inner));
        assert_eq!(kind, BranchKind::While);
        assert_eq!(inner_exit, BlockId(1));
        assert_eq!(cfg.successors(body), vec![inner]);
        assert_eq!(cfg.predecessors(BlockId(1)), vec![BlockId(0), inner]);
        assert_eq!(cfg.block(outer_exit).terminator, Terminator::FallOff);
        assert!(render_cfg(&cfg).contains("while (b) # loop_end: f_B1\n"));
    }

    #[test]
    fn test_nested_blocks_are_spliced() {
        let cfg = build_one("void f() { int a; { a = 1; { a = 2; } } a = 3; }");
        assert_eq!(cfg.blocks.len(), 1);
        assert_eq!(instr_texts(&cfg.blocks[0]), vec!["int a", "a = 1", "a = 2", "a = 3"]);
    }

    #[test]
    fn test_dead_code_after_return_is_one_finding_per_statement() {
        let (program, _) = simplec_parser::parse("int f() { return 0; f(); { f(); f(); } while (1) { } }");
        let (cfg, diags) = build_cfg(program.functions().next().unwrap());
        assert_eq!(cfg.blocks.len(), 1);
        assert_eq!(cfg.dead_code.len(), 3);
        assert_eq!(diags.len(), 3);
        assert!(diags.iter().all(|d| d.kind == DiagnosticKind::DeadCode && !d.is_error()));
        assert_eq!(cfg.dead_code[2].stmt, "while (1) ...");
    }

    #[test]
    fn test_callees_per_block() {
        let cfg = build_one("int g(int x) { return x; }\n");
        assert!(cfg.blocks[0].callees().is_empty());
        let cfgs = build_str("int g(int x) { return x; }\nint f() { int a = g(1); print(g(a)); return g(2); }");
        assert_eq!(cfgs[1].blocks[0].callees(), vec!["g", "g", "print", "g"]);
    }

    #[test]
    fn test_render_while_function() {
        let cfg = build_one("int g(int n){ int s=0; while(n>0){ s=s+n; n=n-1; } return s; }");
        let text = render_cfg(&cfg);
        assert!(text.starts_with("@g_entry {\n    name: g\n    ret_type: int\n    args: int n\n}\n"));
        assert!(text.contains("@g_B0\n{\n    int s = 0;\n}\nPredecessors: -\nSuccessors: g_B1\n"));
        assert!(text.contains("@g_B1\n{\n    while (n > 0) # loop_end: g_B3\n}\nPredecessors: g_B0, g_B2\n"));
        assert!(text.contains("@g_exit\n{\n}\nPredecessors: g_B3\nSuccessors: -\n"));
    }

    #[test]
    fn test_render_if_else_and_calls() {
        let cfgs = build_str(
            "int g(int x) { return x; }\nvoid f(int a) { if (a == 1) { g(a); } else { a = g(2); }\n return; a = 1; }",
        );
        let text = render_cfg(&cfgs[1]);
        assert!(text.contains("    if (a == 1) # then: f_B1\n                # else: f_B2\n"));
        assert!(text.contains("    g(a); # call: g -> g_entry\n"));
        assert!(text.contains("    a = g(2); # call in expr: g -> g_entry\n"));
        assert!(text.contains("    return;\n"));
        assert!(text.contains("# dead code: 3:10 a = 1;\n"));

        let text = render_cfg(&cfgs[0]);
        assert!(text.contains("args: int x\n"));
    }

    #[test]
    fn test_render_program_lists_globals() {
        let program = parse_str("int g = 1, h;\nfloat k;\nvoid f() { }");
        let cfgs: Vec<_> = program.functions().map(|f| build_cfg(f).0).collect();
        let text = render_program(&program, &cfgs);
        assert!(text.starts_with(
            "# Control Flow Graph\n\n@globals {\n    int g = 1, h;\n    float k;\n}\nPredecessors: -\nSuccessors: -\n\n@f_entry {"
        ));
        assert!(text.contains("    args:\n"));
        assert!(text.contains("@f_exit\n{\n}\nPredecessors: f_B0\n"));
    }

    #[test]
    fn test_liveness_of_loop() {
        let live = liveness_of("int g(int n){ int s=0; while(n>0){ s=s+n; n=n-1; } return s; }");

        assert_eq!(live.names(&live.block(BlockId(0)).live_in), vec!["n"]);
        assert_eq!(live.names(&live.block(BlockId(0)).defs), vec!["s"]);
        assert_eq!(live.names(&live.block(BlockId(1)).live_in), vec!["n", "s"]);
        assert_eq!(live.names(&live.block(BlockId(2)).uses), vec!["n", "s"]);
        assert_eq!(live.names(&live.block(BlockId(3)).live_in), vec!["s"]);
        assert!(live.block(BlockId(3)).live_out.is_empty());

        let text = live.render();
        assert!(text.starts_with("# g\nB0-IN: n\nB0-OUT: n, s\n"));
        assert!(text.ends_with("B3-IN: s\nB3-OUT: ;\n"));
    }

    #[test]
    fn test_liveness_ignores_globals_and_kills_on_write() {
        let live = liveness_of("int g;\nint f(int a) { int b; b = a; a = 1; g = a + b; return g; }");
        let entry = live.block(BlockId(0));
        assert_eq!(live.names(&entry.uses), vec!["a"]);
        assert_eq!(live.names(&entry.defs), vec!["a", "b"]);
        assert!(entry.live_out.is_empty());
    }

    #[test]
    fn test_liveness_tracks_declarations_not_names() {
        // the inner `a` is written, the returned `a` is still the parameter
        let live = liveness_of("int f(int a) { { int a; a = 1; } return a; }");
        let entry = live.block(BlockId(0));
        assert_eq!(entry.live_in, VarSet::from([LocalId(0)]));
        assert_eq!(entry.defs, VarSet::from([LocalId(1)]));
        assert_eq!(live.render(), "# f\nB0-IN: a\nB0-OUT: ;\n");
    }

    #[test]
    fn test_liveness_names_both_shadowed_variables() {
        let live = liveness_of("int f(int a) { { int a = 1; if (a) { a = 0; } a = a + 1; } return a; }");
        assert_eq!(live.names(&live.block(BlockId(0)).live_in), vec!["a"]);
        assert_eq!(live.names(&live.block(BlockId(1)).live_in), vec!["a"]);
        assert_eq!(live.block(BlockId(1)).live_in, VarSet::from([LocalId(0)]));
        assert_eq!(live.names(&live.block(BlockId(2)).live_in), vec!["a@1:11", "a@1:22"]);
    }
}
