//! Report bodies for each `--emit` mode, as text or JSON.

use std::fmt::Write;

use clap::ValueEnum;
use serde::Serialize;
use simplec::Analysis;
use simplec_cfg::{Cfg, Liveness};
use simplec_lexer::Lexer;
use simplec_syntax::error::Diagnostics;
use simplec_syntax::token::Token;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Emit {
    /// Control-flow graph of every function
    Cfg,
    /// Live variables at block boundaries
    Liveness,
    /// The parsed syntax tree
    Ast,
    /// The token stream
    Tokens,
    /// Only the diagnostics
    Diagnostics,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Format {
    Text,
    Json,
}

#[derive(Debug, Serialize)]
struct CfgDoc<'a> {
    globals: Vec<String>,
    functions: Vec<&'a Cfg>,
}

#[derive(Debug, Serialize)]
struct JsonReport<'a, T: Serialize> {
    file: &'a str,
    emit: Emit,
    errors: usize,
    warnings: usize,
    diagnostics: &'a Diagnostics,
    result: T,
}

fn tokens_text(tokens: &[Token]) -> String {
    let mut out = String::new();
    for t in tokens {
        let _ = writeln!(out, "{}:{}\t{}\t{}", t.line, t.col, t.kind.class().label(), t);
    }
    out
}

fn diagnostics_text(diags: &Diagnostics) -> String {
    let mut out = String::new();
    for d in diags {
        let _ = writeln!(out, "{}:{}: {}: {}", d.line, d.col, d.kind.label(), d.msg);
    }
    let _ = writeln!(out, "{} error(s), {} warning(s)", diags.error_count(), diags.warning_count());
    out
}

fn to_json<T: Serialize>(file: &str, emit: Emit, analysis: &Analysis, result: T) -> serde_json::Result<String> {
    let report = JsonReport {
        file,
        emit,
        errors: analysis.diagnostics.error_count(),
        warnings: analysis.diagnostics.warning_count(),
        diagnostics: &analysis.diagnostics,
        result,
    };
    serde_json::to_string_pretty(&report)
}

/// Render the report selected by `emit` in the requested format.
pub fn render(
    file: &str,
    src: &str,
    analysis: &Analysis,
    emit: Emit,
    format: Format,
) -> serde_json::Result<String> {
    match (emit, format) {
        (Emit::Cfg, Format::Text) => Ok(analysis.render_cfg()),
        (Emit::Cfg, Format::Json) => {
            let doc = CfgDoc {
                globals: analysis.program.globals().map(|d| d.to_string()).collect(),
                functions: analysis.functions.iter().map(|f| &f.cfg).collect(),
            };
            to_json(file, emit, analysis, doc)
        }
        (Emit::Liveness, Format::Text) => Ok(analysis.render_liveness()),
        (Emit::Liveness, Format::Json) => {
            let live: Vec<&Liveness> = analysis.functions.iter().map(|f| &f.liveness).collect();
            to_json(file, emit, analysis, live)
        }
        (Emit::Ast, Format::Text) => Ok(format!("{:#?}\n", analysis.program)),
        (Emit::Ast, Format::Json) => to_json(file, emit, analysis, &analysis.program),
        (Emit::Tokens, fmt) => {
            // lexical errors are already part of the analysis diagnostics
            let (tokens, _) = Lexer::new(src).tokenize();
            match fmt {
                Format::Text => Ok(tokens_text(&tokens)),
                Format::Json => to_json(file, emit, analysis, &tokens),
            }
        }
        (Emit::Diagnostics, Format::Text) => Ok(diagnostics_text(&analysis.diagnostics)),
        (Emit::Diagnostics, Format::Json) => to_json(file, emit, analysis, ()),
    }
}
