//! Diagnostics shared by every SimpleC front-end stage.
//!
//! Each stage reports problems as [`Diagnostic`] values and keeps going:
//! the lexer skips the offending character, the parser synchronizes at the
//! next statement boundary, the resolver abandons only the current function.
//! A [`Diagnostics`] collector is the sink every stage appends to.
//!
//! # Examples
//!
//! ## Creating diagnostics
//!
//! ```rust
//! use simplec_syntax::error::{Diagnostic, DiagnosticKind, Severity};
//!
//! let err = Diagnostic::new(DiagnosticKind::Parse, "expected ';', found 'x'", 3, 15);
//! assert_eq!(err.severity, Severity::Error);
//! assert_eq!(err.to_string(), "expected ';', found 'x' at 3:15");
//!
//! let dead = Diagnostic::new(DiagnosticKind::DeadCode, "unreachable statement", 7, 5);
//! assert_eq!(dead.severity, Severity::Warning);
//! ```
//!
//! ## Propagation with `?`
//!
//! ```rust
//! use simplec_syntax::error::{error_at, DiagnosticKind, Result};
//!
//! fn expect_positive(n: i64, line: usize, col: usize) -> Result<i64> {
//!     if n < 0 {
//!         error_at(DiagnosticKind::Semantic, line, col, "value must be positive")
//!     } else {
//!         Ok(n)
//!     }
//! }
//!
//! assert!(expect_positive(-1, 1, 1).is_err());
//! ```

use std::fmt;

use serde::Serialize;

use crate::ast::Pos;

/// Which stage raised a diagnostic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum DiagnosticKind {
    /// Unrecognized character, unterminated block comment, bad literal
    Lex,
    /// Unexpected token, unclosed grouping
    Parse,
    /// Duplicate declaration and other static rule violations
    Semantic,
    /// Identifier or call with no visible declaration
    UnresolvedName,
    /// Statement that can never execute; informational only
    DeadCode,
}

impl DiagnosticKind {
    /// Findings never count as errors.
    pub fn default_severity(self) -> Severity {
        match self {
            DiagnosticKind::DeadCode => Severity::Warning,
            _ => Severity::Error,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            DiagnosticKind::Lex => "Lex error",
            DiagnosticKind::Parse => "Parse error",
            DiagnosticKind::Semantic => "Semantic error",
            DiagnosticKind::UnresolvedName => "Unresolved name",
            DiagnosticKind::DeadCode => "Dead code",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Warning,
    Error,
}

/// A problem or finding at a source position.
///
/// # Fields
///
/// - `kind`: the stage-level category
/// - `severity`: derived from `kind` unless overridden
/// - `msg`: human-readable description
/// - `line`, `col`: 1-based position of the offending construct
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Diagnostic {
    pub kind: DiagnosticKind,
    pub severity: Severity,
    pub msg: String,
    pub line: usize,
    pub col: usize,
}

impl Diagnostic {
    /// Creates a diagnostic whose severity follows from its kind.
    pub fn new(kind: DiagnosticKind, msg: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind,
            severity: kind.default_severity(),
            msg: msg.into(),
            line,
            col,
        }
    }

    pub fn at(kind: DiagnosticKind, pos: Pos, msg: impl Into<String>) -> Self {
        Self::new(kind, msg, pos.line, pos.col)
    }

    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} at {}:{}", self.msg, self.line, self.col)
    }
}

impl std::error::Error for Diagnostic {}

/// A specialized `Result` type for front-end operations.
pub type Result<T> = std::result::Result<T, Diagnostic>;

/// Shorthand for `Err(Diagnostic::new(kind, msg, line, col))`.
pub fn error_at<T>(kind: DiagnosticKind, line: usize, col: usize, msg: impl Into<String>) -> Result<T> {
    Err(Diagnostic::new(kind, msg, line, col))
}

/// Ordered sink for diagnostics.
///
/// Stages append in discovery order. When several collectors are merged
/// (one per function), [`Diagnostics::sort`] restores source order; the sort
/// is stable, so diagnostics at the same position keep their relative order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct Diagnostics {
    items: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, diag: Diagnostic) {
        self.items.push(diag);
    }

    pub fn report(&mut self, kind: DiagnosticKind, pos: Pos, msg: impl Into<String>) {
        self.push(Diagnostic::at(kind, pos, msg));
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.items.extend(other.items);
    }

    pub fn sort(&mut self) {
        self.items.sort_by_key(|d| (d.line, d.col));
    }

    pub fn has_errors(&self) -> bool {
        self.items.iter().any(Diagnostic::is_error)
    }

    pub fn error_count(&self) -> usize {
        self.items.iter().filter(|d| d.is_error()).count()
    }

    pub fn warning_count(&self) -> usize {
        self.items.len() - self.error_count()
    }

    pub fn of_kind(&self, kind: DiagnosticKind) -> impl Iterator<Item = &Diagnostic> {
        self.items.iter().filter(move |d| d.kind == kind)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Diagnostic> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl<'a> IntoIterator for &'a Diagnostics {
    type Item = &'a Diagnostic;
    type IntoIter = std::slice::Iter<'a, Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.iter()
    }
}
