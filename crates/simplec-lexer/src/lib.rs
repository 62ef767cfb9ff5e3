//! SimpleC lexer: converts source text into tokens.
//!
//! [`Lexer`] is an [`Iterator`] that scans on demand and yields
//! `Result<Token>` items, finishing with exactly one [`TokenKind::Eof`].
//! A bad character produces an `Err` item and scanning resumes after it,
//! so one pass reports every lexical problem. An unterminated block comment
//! swallows the rest of the input; the next item is the end-of-input token.
use simplec_syntax::error::{Diagnostic, DiagnosticKind, Diagnostics, Result};
use simplec_syntax::token::{Token, TokenKind};

/// Streaming character scanner that produces tokens with positions.
pub struct Lexer {
    src: Vec<char>,
    pos: usize,
    line: usize,
    col: usize,
    done: bool,
}

impl Lexer {
    /// Create a new lexer over the given source string.
    pub fn new(input: &str) -> Self {
        Self {
            src: input.chars().collect(),
            pos: 0,
            line: 1,
            col: 1,
            done: false,
        }
    }

    fn peek(&self) -> Option<char> {
        self.src.get(self.pos).copied()
    }
    fn peek_next(&self) -> Option<char> {
        self.src.get(self.pos + 1).copied()
    }
    fn advance(&mut self) -> Option<char> {
        let ch = self.src.get(self.pos).copied();
        if let Some(c) = ch {
            self.pos += 1;
            if c == '\n' {
                self.line += 1;
                self.col = 1;
            } else {
                self.col += 1;
            }
        }
        ch
    }

    /// Skips whitespace and both comment styles.
    fn skip_trivia(&mut self) -> Result<()> {
        while let Some(c) = self.peek() {
            if c.is_whitespace() {
                self.advance();
            } else if c == '/' && self.peek_next() == Some('/') {
                while let Some(c2) = self.peek() {
                    if c2 == '\n' {
                        break;
                    }
                    self.advance();
                }
            } else if c == '/' && self.peek_next() == Some('*') {
                let (line, col) = (self.line, self.col);
                self.advance();
                self.advance();
                loop {
                    match self.advance() {
                        Some('*') if self.peek() == Some('/') => {
                            self.advance();
                            break;
                        }
                        Some(_) => {}
                        None => {
                            return Err(Diagnostic::new(
                                DiagnosticKind::Lex,
                                "Unterminated block comment",
                                line,
                                col,
                            ));
                        }
                    }
                }
            } else {
                break;
            }
        }
        Ok(())
    }

    fn read_digits(&mut self, s: &mut String) {
        while let Some(c) = self.peek() {
            if c.is_ascii_digit() {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
    }

    fn read_number(&mut self) -> Result<Token> {
        let start_line = self.line;
        let start_col = self.col;
        let mut s = String::new();
        self.read_digits(&mut s);

        // a float needs digits on both sides of the dot
        let is_float = self.peek() == Some('.') && self.peek_next().is_some_and(|c| c.is_ascii_digit());
        if is_float {
            s.push('.');
            self.advance();
            self.read_digits(&mut s);
            let val: f64 = s.parse().map_err(|_| {
                Diagnostic::new(DiagnosticKind::Lex, format!("Invalid float literal '{}'", s), start_line, start_col)
            })?;
            return Ok(Token::new(TokenKind::FloatLit(val), s, start_line, start_col));
        }

        let val: i64 = s.parse().map_err(|_| {
            Diagnostic::new(
                DiagnosticKind::Lex,
                format!("Integer literal '{}' is out of range", s),
                start_line,
                start_col,
            )
        })?;
        Ok(Token::new(TokenKind::IntLit(val), s, start_line, start_col))
    }

    fn read_ident_or_keyword(&mut self) -> Token {
        let start_line = self.line;
        let start_col = self.col;
        let mut s = String::new();
        while let Some(c) = self.peek() {
            if c.is_ascii_alphanumeric() || c == '_' {
                s.push(c);
                self.advance();
            } else {
                break;
            }
        }
        let kind = TokenKind::keyword(&s).unwrap_or_else(|| TokenKind::Ident(s.clone()));
        Token::new(kind, s, start_line, start_col)
    }

    /// Consumes one or two characters for an operator; the second only when
    /// it matches `second`.
    fn operator(&mut self, second: char, one: TokenKind, two: TokenKind) -> Token {
        let (line, col) = (self.line, self.col);
        let mut lexeme = String::new();
        if let Some(c) = self.advance() {
            lexeme.push(c);
        }
        if self.peek() == Some(second) {
            self.advance();
            lexeme.push(second);
            Token::new(two, lexeme, line, col)
        } else {
            Token::new(one, lexeme, line, col)
        }
    }

    fn single(&mut self, kind: TokenKind) -> Token {
        let (line, col) = (self.line, self.col);
        let lexeme = self.advance().map(String::from).unwrap_or_default();
        Token::new(kind, lexeme, line, col)
    }

    fn scan(&mut self) -> Result<Token> {
        self.skip_trivia()?;
        let line = self.line;
        let col = self.col;
        let tk = match self.peek() {
            None => Token::new(TokenKind::Eof, "", line, col),
            Some('(') => self.single(TokenKind::LParen),
            Some(')') => self.single(TokenKind::RParen),
            Some('{') => self.single(TokenKind::LBrace),
            Some('}') => self.single(TokenKind::RBrace),
            Some(',') => self.single(TokenKind::Comma),
            Some(';') => self.single(TokenKind::Semi),
            Some('+') => self.single(TokenKind::Plus),
            Some('-') => self.single(TokenKind::Minus),
            Some('*') => self.single(TokenKind::Star),
            Some('/') => self.single(TokenKind::Slash),
            Some('=') => self.operator('=', TokenKind::Assign, TokenKind::EqEq),
            Some('<') => self.operator('=', TokenKind::Less, TokenKind::LessEq),
            Some('>') => self.operator('=', TokenKind::Greater, TokenKind::GreaterEq),
            Some('!') if self.peek_next() == Some('=') => self.operator('=', TokenKind::NotEq, TokenKind::NotEq),
            Some(c) if c.is_ascii_digit() => self.read_number()?,
            Some(c) if c.is_ascii_alphabetic() || c == '_' => self.read_ident_or_keyword(),
            Some(other) => {
                self.advance();
                return Err(Diagnostic::new(
                    DiagnosticKind::Lex,
                    format!("Unexpected character '{}'", other),
                    line,
                    col,
                ));
            }
        };
        Ok(tk)
    }

    /// Tokenize the entire input into a vector of tokens ending with Eof,
    /// collecting lexical errors on the side.
    pub fn tokenize(&mut self) -> (Vec<Token>, Diagnostics) {
        let mut tokens = Vec::new();
        let mut diags = Diagnostics::new();
        for item in self.by_ref() {
            match item {
                Ok(tok) => tokens.push(tok),
                Err(e) => diags.push(e),
            }
        }
        tracing::debug!(tokens = tokens.len(), errors = diags.len(), "tokenized source");
        (tokens, diags)
    }
}

impl Iterator for Lexer {
    type Item = Result<Token>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let item = self.scan();
        if let Ok(Token { kind: TokenKind::Eof, .. }) = &item {
            self.done = true;
        }
        Some(item)
    }
}

impl std::iter::FusedIterator for Lexer {}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(input: &str) -> Vec<TokenKind> {
        let (tokens, diags) = Lexer::new(input).tokenize();
        assert!(diags.is_empty(), "unexpected lex errors: {:?}", diags);
        tokens.into_iter().map(|t| t.kind).collect()
    }

    #[test]
    fn test_keywords_and_identifiers() {
        assert_eq!(
            kinds("int float void if else while for return x_1 interior"),
            vec![
                TokenKind::Int,
                TokenKind::Float,
                TokenKind::Void,
                TokenKind::If,
                TokenKind::Else,
                TokenKind::While,
                TokenKind::For,
                TokenKind::Return,
                TokenKind::Ident("x_1".to_string()),
                TokenKind::Ident("interior".to_string()),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_int_and_float_literals_are_distinct() {
        assert_eq!(
            kinds("42 3.14 0.99 7"),
            vec![
                TokenKind::IntLit(42),
                TokenKind::FloatLit(3.14),
                TokenKind::FloatLit(0.99),
                TokenKind::IntLit(7),
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_operators() {
        assert_eq!(
            kinds("= == != < <= > >= + - * /"),
            vec![
                TokenKind::Assign,
                TokenKind::EqEq,
                TokenKind::NotEq,
                TokenKind::Less,
                TokenKind::LessEq,
                TokenKind::Greater,
                TokenKind::GreaterEq,
                TokenKind::Plus,
                TokenKind::Minus,
                TokenKind::Star,
                TokenKind::Slash,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_comments_are_skipped() {
        let src = "// line comment\nint /* block\n comment */ x; // trailing";
        assert_eq!(
            kinds(src),
            vec![TokenKind::Int, TokenKind::Ident("x".to_string()), TokenKind::Semi, TokenKind::Eof]
        );
    }

    #[test]
    fn test_positions_and_lexemes() {
        let (tokens, _) = Lexer::new("int x;\n  y = 2.5;").tokenize();
        let y = &tokens[3];
        assert_eq!((y.line, y.col), (2, 3));
        assert_eq!(y.lexeme, "y");
        assert_eq!(tokens[5].lexeme, "2.5");
        let eof = tokens.last().unwrap();
        assert_eq!(eof.kind, TokenKind::Eof);
    }

    #[test]
    fn test_bad_character_recovers() {
        let (tokens, diags) = Lexer::new("x = 1 @ 2;").tokenize();
        assert_eq!(diags.len(), 1);
        let err = diags.iter().next().unwrap();
        assert_eq!(err.kind, DiagnosticKind::Lex);
        assert_eq!((err.line, err.col), (1, 7));
        // scanning continued past '@'
        let ks: Vec<_> = tokens.into_iter().map(|t| t.kind).collect();
        assert_eq!(
            ks,
            vec![
                TokenKind::Ident("x".to_string()),
                TokenKind::Assign,
                TokenKind::IntLit(1),
                TokenKind::IntLit(2),
                TokenKind::Semi,
                TokenKind::Eof,
            ]
        );
    }

    #[test]
    fn test_unterminated_block_comment() {
        let (tokens, diags) = Lexer::new("int x; /* never closed\nint y;").tokenize();
        assert_eq!(diags.len(), 1);
        let err = diags.iter().next().unwrap();
        assert!(err.msg.contains("Unterminated block comment"));
        assert_eq!((err.line, err.col), (1, 8));
        assert_eq!(tokens.len(), 4);
        assert_eq!(tokens[3].kind, TokenKind::Eof);
    }

    #[test]
    fn test_single_eof_and_fused() {
        let mut lexer = Lexer::new("");
        assert!(matches!(lexer.next(), Some(Ok(Token { kind: TokenKind::Eof, .. }))));
        assert!(lexer.next().is_none());
        assert!(lexer.next().is_none());
    }

    #[test]
    fn test_dot_without_fraction_is_error() {
        let (_, diags) = Lexer::new("x = 3.;").tokenize();
        assert_eq!(diags.len(), 1);
        assert!(diags.iter().next().unwrap().msg.contains("'.'"));
    }

    #[test]
    fn test_lone_bang_is_error() {
        let (_, diags) = Lexer::new("!x").tokenize();
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn test_integer_overflow() {
        let (_, diags) = Lexer::new("99999999999999999999").tokenize();
        assert!(diags.iter().next().unwrap().msg.contains("out of range"));
    }
}
