//! Recursive-descent parser for SimpleC items and statements.
//!
//! The parser pulls tokens from any `Iterator<Item = Result<Token>>`
//! (normally a [`Lexer`]) and buffers at most two of them: every construct
//! is decided by its first token, except `type IDENT` at item level, which
//! needs the token after the name to tell a function from a declaration.
//!
//! Errors never abort the unit. A failed statement is recorded and the
//! parser skips to the next `;` or past a balanced `{ ... }` group, then
//! resumes; lexical errors met while pulling tokens are recorded as well.

use std::collections::VecDeque;

use simplec_lexer::Lexer;
use simplec_syntax::ast::*;
use simplec_syntax::error::{error_at, Diagnostic, DiagnosticKind, Diagnostics, Result};
use simplec_syntax::token::{Token, TokenKind};

pub struct Parser<I = Lexer>
where
    I: Iterator<Item = Result<Token>>,
{
    tokens: I,
    lookahead: VecDeque<Token>,
    diags: Diagnostics,
    /// Position of the last token pulled from the source, for a synthesized Eof.
    last: Pos,
    /// Tokens consumed so far; used to guarantee progress during recovery.
    consumed: usize,
}

impl Parser<Lexer> {
    /// Parser reading directly from source text.
    pub fn from_source(src: &str) -> Self {
        Self::new(Lexer::new(src))
    }
}

impl<I> Parser<I>
where
    I: Iterator<Item = Result<Token>>,
{
    pub fn new(tokens: I) -> Self {
        Self {
            tokens,
            lookahead: VecDeque::with_capacity(2),
            diags: Diagnostics::new(),
            last: Pos::new(1, 1),
            consumed: 0,
        }
    }

    /// Diagnostics recorded so far (lexical and syntactic).
    pub fn diagnostics(&self) -> &Diagnostics {
        &self.diags
    }

    pub fn into_diagnostics(self) -> Diagnostics {
        self.diags
    }

    // === token buffer ===

    fn fill(&mut self, n: usize) {
        while self.lookahead.len() <= n {
            match self.tokens.next() {
                Some(Ok(tok)) => {
                    self.last = tok.pos();
                    self.lookahead.push_back(tok);
                }
                Some(Err(e)) => self.diags.push(e),
                None => {
                    let eof = Token::new(TokenKind::Eof, "", self.last.line, self.last.col);
                    self.lookahead.push_back(eof);
                }
            }
        }
    }

    pub(crate) fn peek(&mut self) -> &Token {
        self.fill(0);
        &self.lookahead[0]
    }

    pub(crate) fn peek_kind(&mut self) -> &TokenKind {
        &self.peek().kind
    }

    pub(crate) fn peek_nth_kind(&mut self, n: usize) -> &TokenKind {
        self.fill(n);
        &self.lookahead[n].kind
    }

    /// Consumes the current token. End of input is never consumed.
    pub(crate) fn advance(&mut self) -> Token {
        self.fill(0);
        if self.lookahead[0].kind == TokenKind::Eof {
            return self.lookahead[0].clone();
        }
        self.consumed += 1;
        let last = self.last;
        self.lookahead
            .pop_front()
            .unwrap_or_else(|| Token::new(TokenKind::Eof, "", last.line, last.col))
    }

    pub(crate) fn check(&mut self, kind: &TokenKind) -> bool {
        self.peek_kind() == kind
    }

    pub(crate) fn eat(&mut self, kind: &TokenKind) -> bool {
        if self.check(kind) {
            self.advance();
            true
        } else {
            false
        }
    }

    pub(crate) fn expect(&mut self, kind: TokenKind) -> Result<Token> {
        if self.check(&kind) {
            Ok(self.advance())
        } else {
            self.unexpected(&kind.describe())
        }
    }

    pub(crate) fn expect_ident(&mut self) -> Result<(String, Pos)> {
        let tok = self.peek().clone();
        let pos = tok.pos();
        match tok.kind {
            TokenKind::Ident(name) => {
                self.advance();
                Ok((name, pos))
            }
            _ => self.unexpected("identifier"),
        }
    }

    /// Error at the current token: `expected <what>, found <token>`.
    pub(crate) fn unexpected<T>(&mut self, expected: &str) -> Result<T> {
        let found = self.peek().clone();
        error_at(
            DiagnosticKind::Parse,
            found.line,
            found.col,
            format!("expected {}, found {}", expected, found),
        )
    }

    /// Skips to the next statement boundary: past a `;`, past a balanced
    /// `{ ... }` group, or up to (not past) an unmatched `}`.
    fn synchronize(&mut self) {
        let mut depth = 0usize;
        loop {
            match self.peek_kind() {
                TokenKind::Eof => return,
                TokenKind::Semi if depth == 0 => {
                    self.advance();
                    return;
                }
                TokenKind::LBrace => {
                    depth += 1;
                    self.advance();
                }
                TokenKind::RBrace => {
                    if depth == 0 {
                        return;
                    }
                    depth -= 1;
                    self.advance();
                    if depth == 0 {
                        return;
                    }
                }
                _ => {
                    self.advance();
                }
            }
        }
    }

    /// Records `err`, synchronizes, and makes sure at least one token was
    /// consumed since `before`.
    fn recover(&mut self, err: Diagnostic, before: usize) {
        tracing::trace!(line = err.line, col = err.col, "recovering from parse error");
        self.diags.push(err);
        self.synchronize();
        if self.consumed == before && !self.check(&TokenKind::Eof) {
            self.advance();
        }
    }

    // === items ===

    /// Parse a whole translation unit. Never fails; problems are recorded
    /// in [`Parser::diagnostics`].
    pub fn parse_program(&mut self) -> Program {
        let mut items = Vec::new();
        while !self.check(&TokenKind::Eof) {
            let before = self.consumed;
            match self.parse_item() {
                Ok(item) => items.push(item),
                Err(e) => self.recover(e, before),
            }
        }
        tracing::debug!(items = items.len(), diagnostics = self.diags.len(), "parsed translation unit");
        Program { items }
    }

    fn parse_type(&mut self) -> Result<Type> {
        let ty = match self.peek_kind() {
            TokenKind::Int => Type::Int,
            TokenKind::Float => Type::Float,
            TokenKind::Void => Type::Void,
            _ => return self.unexpected("type ('int', 'float' or 'void')"),
        };
        self.advance();
        Ok(ty)
    }

    fn parse_item(&mut self) -> Result<Item> {
        let ty_pos = self.peek().pos();
        let ty = self.parse_type()?;
        let (name, name_pos) = self.expect_ident()?;
        if self.check(&TokenKind::LParen) {
            Ok(Item::Function(self.parse_function_rest(ty, name, name_pos)?))
        } else {
            Ok(Item::Declaration(self.parse_declaration_rest(ty, ty_pos, name, name_pos)?))
        }
    }

    fn parse_function_rest(&mut self, return_type: Type, name: String, pos: Pos) -> Result<Function> {
        self.expect(TokenKind::LParen)?;
        let mut params = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                let ty = self.parse_type()?;
                let (pname, ppos) = self.expect_ident()?;
                params.push(Param { ty, name: pname, pos: ppos });
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        let body = self.parse_block()?;
        Ok(Function {
            return_type,
            name,
            params,
            body,
            pos,
        })
    }

    /// Rest of `type name (= expr)? (, name (= expr)?)* ;` after the first name.
    fn parse_declaration_rest(&mut self, ty: Type, pos: Pos, name: String, name_pos: Pos) -> Result<Declaration> {
        let mut declarators = vec![self.parse_declarator_rest(name, name_pos)?];
        while self.eat(&TokenKind::Comma) {
            let (next, next_pos) = self.expect_ident()?;
            declarators.push(self.parse_declarator_rest(next, next_pos)?);
        }
        self.expect(TokenKind::Semi)?;
        Ok(Declaration { ty, declarators, pos })
    }

    fn parse_declarator_rest(&mut self, name: String, pos: Pos) -> Result<Declarator> {
        let init = if self.eat(&TokenKind::Assign) {
            Some(self.parse_expr()?)
        } else {
            None
        };
        Ok(Declarator { name, init, pos })
    }

    // === statements ===

    /// `{ item* }`. Errors inside are recovered from; only a missing `{`
    /// fails the block itself.
    pub(crate) fn parse_block(&mut self) -> Result<Block> {
        let open = self.expect(TokenKind::LBrace)?;
        let mut stmts = Vec::new();
        loop {
            match self.peek_kind() {
                TokenKind::RBrace => {
                    self.advance();
                    break;
                }
                TokenKind::Eof => {
                    self.diags.report(
                        DiagnosticKind::Parse,
                        open.pos(),
                        "unclosed '{': expected '}' before end of input",
                    );
                    break;
                }
                _ => {}
            }
            let before = self.consumed;
            match self.parse_block_item() {
                Ok(stmt) => stmts.push(stmt),
                Err(e) => self.recover(e, before),
            }
        }
        Ok(Block { stmts, pos: open.pos() })
    }

    fn parse_block_item(&mut self) -> Result<Stmt> {
        if self.peek_kind().is_type_keyword() {
            let pos = self.peek().pos();
            let ty = self.parse_type()?;
            let (name, name_pos) = self.expect_ident()?;
            let decl = self.parse_declaration_rest(ty, pos, name, name_pos)?;
            return Ok(Stmt {
                kind: StmtKind::Decl(decl),
                pos,
            });
        }
        self.parse_stmt()
    }

    pub fn parse_stmt(&mut self) -> Result<Stmt> {
        let tok = self.peek().clone();
        let pos = tok.pos();
        let kind = match tok.kind {
            TokenKind::If => self.parse_if()?,
            TokenKind::While => self.parse_while()?,
            TokenKind::For => self.parse_for()?,
            TokenKind::Return => self.parse_return()?,
            TokenKind::Semi => {
                self.advance();
                StmtKind::Empty
            }
            TokenKind::LBrace => StmtKind::Block(self.parse_block()?),
            TokenKind::Ident(_) => match self.peek_nth_kind(1) {
                TokenKind::Assign => {
                    let assign = self.parse_assign()?;
                    self.expect(TokenKind::Semi)?;
                    StmtKind::Assign(assign)
                }
                TokenKind::LParen => {
                    let (name, name_pos) = self.expect_ident()?;
                    let call = self.parse_call(name, name_pos)?;
                    self.expect(TokenKind::Semi)?;
                    StmtKind::Call(call)
                }
                _ => {
                    self.advance();
                    return self.unexpected("'=' or '(' after identifier");
                }
            },
            ref k if k.is_type_keyword() => {
                return error_at(
                    DiagnosticKind::Parse,
                    pos.line,
                    pos.col,
                    "declaration is not allowed here; wrap it in a block",
                );
            }
            _ => return self.unexpected("statement"),
        };
        Ok(Stmt { kind, pos })
    }

    /// A statement body: a block, or a lone statement wrapped into one.
    fn parse_body(&mut self) -> Result<Block> {
        if self.check(&TokenKind::LBrace) {
            return self.parse_block();
        }
        let stmt = self.parse_stmt()?;
        Ok(Block {
            pos: stmt.pos,
            stmts: vec![stmt],
        })
    }

    fn parse_condition(&mut self) -> Result<Expr> {
        self.expect(TokenKind::LParen)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::RParen)?;
        Ok(cond)
    }

    fn parse_if(&mut self) -> Result<StmtKind> {
        self.expect(TokenKind::If)?;
        let cond = self.parse_condition()?;
        let then_block = self.parse_body()?;
        let else_block = if self.eat(&TokenKind::Else) {
            Some(self.parse_body()?)
        } else {
            None
        };
        Ok(StmtKind::If {
            cond,
            then_block,
            else_block,
        })
    }

    fn parse_while(&mut self) -> Result<StmtKind> {
        self.expect(TokenKind::While)?;
        let cond = self.parse_condition()?;
        let body = self.parse_body()?;
        Ok(StmtKind::While { cond, body })
    }

    /// `for (assign; expr; assign) body`, nothing more general.
    fn parse_for(&mut self) -> Result<StmtKind> {
        self.expect(TokenKind::For)?;
        self.expect(TokenKind::LParen)?;
        let init = self.parse_assign()?;
        self.expect(TokenKind::Semi)?;
        let cond = self.parse_expr()?;
        self.expect(TokenKind::Semi)?;
        let step = self.parse_assign()?;
        self.expect(TokenKind::RParen)?;
        let body = self.parse_body()?;
        Ok(StmtKind::For { init, cond, step, body })
    }

    fn parse_return(&mut self) -> Result<StmtKind> {
        self.expect(TokenKind::Return)?;
        if self.eat(&TokenKind::Semi) {
            return Ok(StmtKind::Return(None));
        }
        let value = self.parse_expr()?;
        self.expect(TokenKind::Semi)?;
        Ok(StmtKind::Return(Some(value)))
    }

    fn parse_assign(&mut self) -> Result<Assign> {
        let (target, pos) = self.expect_ident()?;
        self.expect(TokenKind::Assign)?;
        let expr = self.parse_expr()?;
        Ok(Assign { target, expr, pos })
    }
}
