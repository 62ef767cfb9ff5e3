//! SimpleC front-end driver.
//!
//! [`analyze`] runs every phase over one translation unit: lexing and
//! parsing, the global table, then per function name resolution, CFG
//! construction and liveness. Functions only share the frozen global table,
//! so with [`Options::parallel`] they are processed on the rayon pool, each
//! with its own diagnostics collector; the collectors are merged in source
//! order afterwards, so the result does not depend on scheduling.

use rayon::prelude::*;
use serde::Serialize;

pub use simplec_cfg as cfg;
pub use simplec_lexer as lexer;
pub use simplec_parser as parser;
pub use simplec_resolve as resolve;
pub use simplec_syntax as syntax;

use simplec_cfg::{build_cfg, liveness, render_program, Cfg, Liveness};
use simplec_resolve::{resolve_function, resolve_globals, GlobalTable, Resolution};
use simplec_syntax::ast::{Function, Item, Program};
use simplec_syntax::error::Diagnostics;

/// Knobs for one analysis run.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// Analyze functions concurrently.
    pub parallel: bool,
}

/// Everything known about one function.
#[derive(Debug, Clone, Serialize)]
pub struct FunctionAnalysis {
    pub resolution: Resolution,
    pub cfg: Cfg,
    pub liveness: Liveness,
}

/// Result of analyzing a translation unit.
#[derive(Debug, Clone, Serialize)]
pub struct Analysis {
    pub program: Program,
    pub globals: GlobalTable,
    pub global_refs: Resolution,
    pub functions: Vec<FunctionAnalysis>,
    /// All diagnostics, sorted by position.
    pub diagnostics: Diagnostics,
}

impl Analysis {
    pub fn function(&self, name: &str) -> Option<&FunctionAnalysis> {
        self.functions.iter().find(|f| f.cfg.function == name)
    }

    pub fn has_errors(&self) -> bool {
        self.diagnostics.has_errors()
    }

    /// The textual CFG report for the whole unit.
    pub fn render_cfg(&self) -> String {
        render_program(&self.program, self.functions.iter().map(|f| &f.cfg))
    }

    pub fn render_liveness(&self) -> String {
        self.functions.iter().map(|f| f.liveness.render()).collect()
    }
}

fn analyze_function(globals: &GlobalTable, order: usize, func: &Function) -> (FunctionAnalysis, Diagnostics) {
    let (resolution, mut diags) = resolve_function(globals, order, func);
    let (cfg, cfg_diags) = build_cfg(func);
    diags.extend(cfg_diags);
    let liveness = liveness::analyze(&cfg, &resolution);
    (
        FunctionAnalysis {
            resolution,
            cfg,
            liveness,
        },
        diags,
    )
}

/// Analyze one translation unit.
pub fn analyze(src: &str, options: &Options) -> Analysis {
    let (program, mut diagnostics) = simplec_parser::parse(src);

    let (globals, table_diags) = GlobalTable::build(&program);
    diagnostics.extend(table_diags);
    let (global_refs, global_diags) = resolve_globals(&globals, &program);
    diagnostics.extend(global_diags);

    let jobs: Vec<(usize, &Function)> = program
        .items
        .iter()
        .enumerate()
        .filter_map(|(index, item)| match item {
            Item::Function(func) => Some((globals.item_order(index), func)),
            Item::Declaration(_) => None,
        })
        .collect();

    let run = |&(order, func): &(usize, &Function)| analyze_function(&globals, order, func);
    let results: Vec<(FunctionAnalysis, Diagnostics)> = if options.parallel {
        jobs.par_iter().map(run).collect()
    } else {
        jobs.iter().map(run).collect()
    };

    let mut functions = Vec::with_capacity(results.len());
    for (analysis, diags) in results {
        diagnostics.extend(diags);
        functions.push(analysis);
    }
    diagnostics.sort();

    tracing::debug!(
        functions = functions.len(),
        errors = diagnostics.error_count(),
        warnings = diagnostics.warning_count(),
        parallel = options.parallel,
        "analysis finished"
    );

    Analysis {
        program,
        globals,
        global_refs,
        functions,
        diagnostics,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use simplec_cfg::{BlockId, Terminator};
    use simplec_resolve::SymbolKind;
    use simplec_syntax::ast::Pos;
    use simplec_syntax::error::DiagnosticKind;

    fn analyze_str(input: &str) -> Analysis {
        analyze(input, &Options::default())
    }

    const MIXED: &str = "int total = 0;
int square(int v) { return v * v; }
int bad() {
  int x;
  int x;
  return x;
}
int sum(int n) {
  int s = 0, i;
  for (i = 0; i < n; i = i + 1) {
    s = s + square(i);
  }
  total = s;
  return s;
  s = 1;
}
void main() {
  sum(10);
  undefined_call();
}
";

    #[test]
    fn test_end_to_end_while_resolves_names() {
        let analysis = analyze_str("int g(int n){ int s=0; while(n>0){ s=s+n; n=n-1; } return s; }");
        assert!(analysis.diagnostics.is_empty());
        let g = analysis.function("g").unwrap();
        assert_eq!(g.cfg.blocks.len(), 4);

        // `s` and `n` in `s=s+n` (column 38 and 40)
        let s = g.resolution.symbol_at(&analysis.globals, Pos::new(1, 38)).unwrap();
        assert_eq!((s.name.as_str(), &s.kind), ("s", &SymbolKind::Local));
        let n = g.resolution.symbol_at(&analysis.globals, Pos::new(1, 40)).unwrap();
        assert_eq!((n.name.as_str(), &n.kind), ("n", &SymbolKind::Param));
    }

    #[test]
    fn test_end_to_end_if_with_dead_code() {
        let analysis = analyze_str("int f(){ if (1) { return 1; x = 2; } return 3; }");
        let f = analysis.function("f").unwrap();
        assert_eq!(f.cfg.blocks.len(), 3);
        assert_eq!(f.cfg.dead_code.len(), 1);
        // the dead assignment is still resolved, so the undeclared `x` is reported
        let kinds: Vec<_> = analysis.diagnostics.iter().map(|d| d.kind).collect();
        assert_eq!(kinds, vec![DiagnosticKind::UnresolvedName, DiagnosticKind::DeadCode]);
        assert!(matches!(f.cfg.blocks[2].terminator, Terminator::Return { .. }));
    }

    #[test]
    fn test_diagnostics_are_merged_in_source_order() {
        let analysis = analyze_str(MIXED);
        let positions: Vec<_> = analysis.diagnostics.iter().map(|d| (d.line, d.col)).collect();
        let mut sorted = positions.clone();
        sorted.sort();
        assert_eq!(positions, sorted);

        assert_eq!(analysis.diagnostics.of_kind(DiagnosticKind::Semantic).count(), 1);
        assert_eq!(analysis.diagnostics.of_kind(DiagnosticKind::UnresolvedName).count(), 1);
        assert_eq!(analysis.diagnostics.of_kind(DiagnosticKind::DeadCode).count(), 1);
        assert!(analysis.has_errors());

        // siblings of the aborted function are fully analyzed
        assert!(analysis.function("bad").unwrap().resolution.aborted);
        let sum = analysis.function("sum").unwrap();
        assert!(!sum.resolution.aborted);
        assert_eq!(sum.cfg.successors(BlockId(0)), vec![BlockId(1)]);
    }

    #[test]
    fn test_parallel_matches_sequential() {
        let sequential = analyze(MIXED, &Options { parallel: false });
        let parallel = analyze(MIXED, &Options { parallel: true });
        assert_eq!(sequential.diagnostics, parallel.diagnostics);
        assert_eq!(sequential.render_cfg(), parallel.render_cfg());
        assert_eq!(sequential.render_liveness(), parallel.render_liveness());
    }

    #[test]
    fn test_parse_errors_do_not_stop_analysis() {
        let analysis = analyze_str("int f() { x = ; return 1; }\nint g() { return 2; }");
        assert_eq!(analysis.diagnostics.of_kind(DiagnosticKind::Parse).count(), 1);
        assert_eq!(analysis.functions.len(), 2);
        assert!(analysis.render_cfg().contains("@g_entry {"));
    }

    #[test]
    fn test_empty_unit() {
        let analysis = analyze_str("");
        assert!(analysis.functions.is_empty());
        assert!(!analysis.has_errors());
        assert_eq!(
            analysis.render_cfg(),
            "# Control Flow Graph\n\n@globals {\n}\nPredecessors: -\nSuccessors: -\n\n"
        );
    }
}
