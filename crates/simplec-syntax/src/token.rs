//! Token definitions for the SimpleC language.
//!
//! Tokens are the smallest meaningful units of SimpleC source. The lexer
//! produces each token once, with the exact lexeme it was read from and the
//! 1-based position of its first character.
//!
//! # Token Categories
//!
//! - **Keywords**: `int`, `float`, `void`, `if`, `else`, `while`, `for`, `return`
//! - **Identifiers**: variable and function names (`sum`, `g_counter`)
//! - **Literals**: integer (`42`) and floating (`3.14`) numbers, kept distinct
//! - **Operators**: arithmetic, relational, equality and assignment
//! - **Punctuation**: parentheses, braces, `,` and `;`
//! - **Special**: end-of-input marker
//!
//! # Examples
//!
//! ```rust
//! use simplec_syntax::{Token, TokenKind, TokenClass};
//!
//! let tok = Token::new(TokenKind::FloatLit(3.14), "3.14", 2, 13);
//! assert_eq!(tok.kind.class(), TokenClass::FloatLiteral);
//! assert_eq!(tok.to_string(), "'3.14'");
//! ```

use std::fmt;

use serde::Serialize;

use crate::ast::Pos;

/// Token types that can be produced by the SimpleC lexer.
///
/// Literal and identifier variants carry their semantic content. Integer and
/// floating literals are separate variants because later stages must know
/// which kind of number was written.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum TokenKind {
    // === Literals ===
    /// An identifier (variable or function name)
    Ident(String),

    /// A digit sequence, e.g. `42`
    IntLit(i64),

    /// Digits, a dot, digits, e.g. `3.14`
    FloatLit(f64),

    // === Keywords ===
    Int,
    Float,
    Void,
    If,
    Else,
    While,
    For,
    Return,

    // === Punctuation ===
    LParen,
    RParen,
    LBrace,
    RBrace,
    Comma,
    Semi,

    // === Operators ===
    /// Assignment `=`
    Assign,
    Plus,
    Minus,
    Star,
    Slash,
    EqEq,
    NotEq,
    Less,
    LessEq,
    Greater,
    GreaterEq,

    /// End-of-input marker, produced exactly once
    Eof,
}

/// Coarse classification of a token, as reported to collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum TokenClass {
    Keyword,
    Identifier,
    IntLiteral,
    FloatLiteral,
    Operator,
    Punctuation,
    EndOfInput,
}

impl TokenClass {
    pub fn label(self) -> &'static str {
        match self {
            TokenClass::Keyword => "keyword",
            TokenClass::Identifier => "identifier",
            TokenClass::IntLiteral => "int-literal",
            TokenClass::FloatLiteral => "float-literal",
            TokenClass::Operator => "operator",
            TokenClass::Punctuation => "punctuation",
            TokenClass::EndOfInput => "end-of-input",
        }
    }
}

impl TokenKind {
    /// Maps a word to its keyword token, if it is one.
    pub fn keyword(word: &str) -> Option<TokenKind> {
        let kind = match word {
            "int" => TokenKind::Int,
            "float" => TokenKind::Float,
            "void" => TokenKind::Void,
            "if" => TokenKind::If,
            "else" => TokenKind::Else,
            "while" => TokenKind::While,
            "for" => TokenKind::For,
            "return" => TokenKind::Return,
            _ => return None,
        };
        Some(kind)
    }

    pub fn class(&self) -> TokenClass {
        match self {
            TokenKind::Ident(_) => TokenClass::Identifier,
            TokenKind::IntLit(_) => TokenClass::IntLiteral,
            TokenKind::FloatLit(_) => TokenClass::FloatLiteral,
            TokenKind::Int
            | TokenKind::Float
            | TokenKind::Void
            | TokenKind::If
            | TokenKind::Else
            | TokenKind::While
            | TokenKind::For
            | TokenKind::Return => TokenClass::Keyword,
            TokenKind::LParen
            | TokenKind::RParen
            | TokenKind::LBrace
            | TokenKind::RBrace
            | TokenKind::Comma
            | TokenKind::Semi => TokenClass::Punctuation,
            TokenKind::Assign
            | TokenKind::Plus
            | TokenKind::Minus
            | TokenKind::Star
            | TokenKind::Slash
            | TokenKind::EqEq
            | TokenKind::NotEq
            | TokenKind::Less
            | TokenKind::LessEq
            | TokenKind::Greater
            | TokenKind::GreaterEq => TokenClass::Operator,
            TokenKind::Eof => TokenClass::EndOfInput,
        }
    }

    /// True for the keywords that start a declaration or function definition.
    pub fn is_type_keyword(&self) -> bool {
        matches!(self, TokenKind::Int | TokenKind::Float | TokenKind::Void)
    }

    /// Fixed spelling used in "expected ..." messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Ident(_) => "identifier".to_string(),
            TokenKind::IntLit(_) => "integer literal".to_string(),
            TokenKind::FloatLit(_) => "float literal".to_string(),
            TokenKind::Eof => "end of input".to_string(),
            other => format!("'{}'", other.spelling()),
        }
    }

    fn spelling(&self) -> &'static str {
        match self {
            TokenKind::Int => "int",
            TokenKind::Float => "float",
            TokenKind::Void => "void",
            TokenKind::If => "if",
            TokenKind::Else => "else",
            TokenKind::While => "while",
            TokenKind::For => "for",
            TokenKind::Return => "return",
            TokenKind::LParen => "(",
            TokenKind::RParen => ")",
            TokenKind::LBrace => "{",
            TokenKind::RBrace => "}",
            TokenKind::Comma => ",",
            TokenKind::Semi => ";",
            TokenKind::Assign => "=",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Star => "*",
            TokenKind::Slash => "/",
            TokenKind::EqEq => "==",
            TokenKind::NotEq => "!=",
            TokenKind::Less => "<",
            TokenKind::LessEq => "<=",
            TokenKind::Greater => ">",
            TokenKind::GreaterEq => ">=",
            TokenKind::Ident(_) | TokenKind::IntLit(_) | TokenKind::FloatLit(_) | TokenKind::Eof => "",
        }
    }
}

/// A token with its lexeme and source position.
///
/// # Usage in Error Reporting
///
/// The parser quotes the lexeme of the offending token:
///
/// ```text
/// expected ';', found 'x' at 3:15
/// ```
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Token {
    /// The type and semantic content of this token
    pub kind: TokenKind,

    /// Exact source text of the token (empty for end of input)
    pub lexeme: String,

    /// Line number in the source file (1-based)
    pub line: usize,

    /// Column number in the source file (1-based)
    pub col: usize,
}

impl Token {
    pub fn new(kind: TokenKind, lexeme: impl Into<String>, line: usize, col: usize) -> Self {
        Self {
            kind,
            lexeme: lexeme.into(),
            line,
            col,
        }
    }

    pub fn pos(&self) -> Pos {
        Pos::new(self.line, self.col)
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            TokenKind::Eof => write!(f, "end of input"),
            _ => write!(f, "'{}'", self.lexeme),
        }
    }
}
