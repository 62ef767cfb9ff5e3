mod common;
mod logging;
mod report;

use std::fs;
use std::io::IsTerminal;
use std::path::PathBuf;
use std::process;

use clap::{ArgAction, Parser};
use owo_colors::OwoColorize;
use simplec::{analyze, Options};
use simplec_syntax::error::{Diagnostic, Severity};

use crate::common::suggestion_for;
use crate::logging::{init_tracing, TracingOptions};
use crate::report::{Emit, Format};

#[derive(Parser, Debug)]
#[command(name = "simplec", version, about = "Analyze a SimpleC translation unit")]
struct Cli {
    /// Source file to analyze
    file: PathBuf,

    /// What to print
    #[arg(long, value_enum, env = "SIMPLEC_EMIT", default_value_t = Emit::Cfg)]
    emit: Emit,

    /// Output format
    #[arg(long, value_enum, default_value_t = Format::Text)]
    format: Format,

    /// Write the report to this file instead of stdout
    #[arg(short = 'o', long = "output")]
    output: Option<PathBuf>,

    /// Build function CFGs in parallel
    #[arg(short = 'j', long = "parallel", default_value_t = false)]
    parallel: bool,

    /// Disable colored diagnostics
    #[arg(long = "no-color", default_value_t = false)]
    no_color: bool,

    /// Log more (-v debug, -vv trace)
    #[arg(short = 'v', long = "verbose", action = ArgAction::Count)]
    verbose: u8,

    /// Silence logging
    #[arg(short = 'q', long = "quiet", default_value_t = false)]
    quiet: bool,
}

fn paint(text: &str, color: bool, style: impl Fn(&str) -> String) -> String {
    if color {
        style(text)
    } else {
        text.to_string()
    }
}

fn render_diagnostic(source: &str, diag: &Diagnostic, color: bool) {
    let header = match diag.severity {
        Severity::Error => paint(diag.kind.label(), color, |s| s.red().bold().to_string()),
        Severity::Warning => paint(diag.kind.label(), color, |s| s.yellow().bold().to_string()),
    };
    eprintln!("{}: {}", header, paint(&diag.msg, color, |s| s.bold().to_string()));
    eprintln!("  --> line {}, column {}", diag.line, diag.col);

    if let Some(src_line) = diag.line.checked_sub(1).and_then(|i| source.lines().nth(i)) {
        let line_num_str = format!("{:3} | ", diag.line);
        eprintln!("     |");
        eprintln!("{}{}", paint(&line_num_str, color, |s| s.bright_black().to_string()), src_line);

        let mut marker = " ".repeat(line_num_str.len());
        marker.push_str(&" ".repeat(diag.col.saturating_sub(1)));
        marker.push('^');
        let note = match diag.severity {
            Severity::Error => " error here",
            Severity::Warning => " never executed",
        };
        eprintln!("{}", paint(&format!("{}{}", marker, note), color, |s| s.red().to_string()));
        eprintln!("     |");
    }

    if let Some(hint) = suggestion_for(diag) {
        eprintln!("{}", paint(&format!("Help: {}", hint.help), color, |s| s.yellow().to_string()));
        if let Some(example) = hint.example {
            eprintln!("    {}", paint(&format!("Example: {}", example), color, |s| s.bright_black().to_string()));
        }
    }
}

fn fail(msg: String, color: bool) -> ! {
    eprintln!(
        "{}: {}",
        paint("error", color, |s| s.red().bold().to_string()),
        paint(&msg, color, |s| s.red().to_string())
    );
    process::exit(1);
}

fn main() {
    let cli = Cli::parse();
    let color = !cli.no_color && std::io::stderr().is_terminal();
    init_tracing(TracingOptions {
        verbosity: cli.verbose,
        quiet: cli.quiet,
        ansi: color,
    });

    let src = match fs::read_to_string(&cli.file) {
        Ok(s) => s,
        Err(e) => fail(format!("Failed to read {}: {}", cli.file.display(), e), color),
    };
    tracing::debug!(file = %cli.file.display(), bytes = src.len(), "read source");

    let analysis = analyze(&src, &Options { parallel: cli.parallel });

    let file_name = cli.file.display().to_string();
    let report = match report::render(&file_name, &src, &analysis, cli.emit, cli.format) {
        Ok(r) => r,
        Err(e) => fail(format!("Failed to serialize report: {}", e), color),
    };

    // text diagnostics go to stderr unless they are the report itself
    if cli.format == Format::Text && cli.emit != Emit::Diagnostics {
        for diag in &analysis.diagnostics {
            render_diagnostic(&src, diag, color);
        }
        if !analysis.diagnostics.is_empty() {
            eprintln!(
                "{} error(s), {} warning(s)",
                analysis.diagnostics.error_count(),
                analysis.diagnostics.warning_count()
            );
        }
    }

    match &cli.output {
        Some(path) => {
            if let Err(e) = fs::write(path, &report) {
                fail(format!("Failed to write {}: {}", path.display(), e), color);
            }
        }
        None => print!("{}", report),
    }

    if analysis.has_errors() {
        process::exit(1);
    }
}
