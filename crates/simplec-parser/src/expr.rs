use simplec_syntax::ast::{BinaryOp, Call, Expr, Pos, UnaryOp};
use simplec_syntax::error::Result;
use simplec_syntax::token::{Token, TokenKind};

use crate::parser::Parser;

fn equality_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::EqEq => Some(BinaryOp::Eq),
        TokenKind::NotEq => Some(BinaryOp::Ne),
        _ => None,
    }
}

fn relational_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Greater => Some(BinaryOp::Gt),
        TokenKind::Less => Some(BinaryOp::Lt),
        TokenKind::GreaterEq => Some(BinaryOp::Ge),
        TokenKind::LessEq => Some(BinaryOp::Le),
        _ => None,
    }
}

fn additive_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Plus => Some(BinaryOp::Add),
        TokenKind::Minus => Some(BinaryOp::Sub),
        _ => None,
    }
}

fn multiplicative_op(kind: &TokenKind) -> Option<BinaryOp> {
    match kind {
        TokenKind::Star => Some(BinaryOp::Mul),
        TokenKind::Slash => Some(BinaryOp::Div),
        _ => None,
    }
}

impl<I> Parser<I>
where
    I: Iterator<Item = Result<Token>>,
{
    /// Parse an expression. Precedence from loosest to tightest:
    /// `== !=`, `< <= > >=`, `+ -`, `* /`, unary `+ -`. All binary
    /// operators are left-associative.
    pub fn parse_expr(&mut self) -> Result<Expr> {
        self.parse_equality()
    }

    /// One left-associative precedence level.
    fn binary_level(
        &mut self,
        operand: fn(&mut Self) -> Result<Expr>,
        op_for: fn(&TokenKind) -> Option<BinaryOp>,
    ) -> Result<Expr> {
        let mut lhs = operand(self)?;
        while let Some(op) = op_for(self.peek_kind()) {
            self.advance();
            let rhs = operand(self)?;
            lhs = Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn parse_equality(&mut self) -> Result<Expr> {
        self.binary_level(Self::parse_relational, equality_op)
    }

    fn parse_relational(&mut self) -> Result<Expr> {
        self.binary_level(Self::parse_additive, relational_op)
    }

    fn parse_additive(&mut self) -> Result<Expr> {
        self.binary_level(Self::parse_multiplicative, additive_op)
    }

    fn parse_multiplicative(&mut self) -> Result<Expr> {
        self.binary_level(Self::parse_unary, multiplicative_op)
    }

    fn parse_unary(&mut self) -> Result<Expr> {
        let op = match self.peek_kind() {
            TokenKind::Minus => UnaryOp::Neg,
            TokenKind::Plus => UnaryOp::Pos,
            _ => return self.parse_primary(),
        };
        self.advance();
        let operand = self.parse_unary()?;
        Ok(Expr::Unary {
            op,
            operand: Box::new(operand),
        })
    }

    fn parse_primary(&mut self) -> Result<Expr> {
        let tok = self.peek().clone();
        let pos = tok.pos();
        match tok.kind {
            TokenKind::IntLit(n) => {
                self.advance();
                Ok(Expr::IntLiteral(n))
            }
            TokenKind::FloatLit(x) => {
                self.advance();
                Ok(Expr::FloatLiteral(x))
            }
            TokenKind::Ident(name) => {
                self.advance();
                if self.check(&TokenKind::LParen) {
                    Ok(Expr::Call(self.parse_call(name, pos)?))
                } else {
                    Ok(Expr::Ident { name, pos })
                }
            }
            TokenKind::LParen => {
                self.advance();
                let inner = self.parse_expr()?;
                self.expect(TokenKind::RParen)?;
                Ok(inner)
            }
            _ => self.unexpected("expression"),
        }
    }

    /// Argument list of a call whose name has already been consumed.
    pub(crate) fn parse_call(&mut self, name: String, pos: Pos) -> Result<Call> {
        self.expect(TokenKind::LParen)?;
        let mut args = Vec::new();
        if !self.check(&TokenKind::RParen) {
            loop {
                args.push(self.parse_expr()?);
                if !self.eat(&TokenKind::Comma) {
                    break;
                }
            }
        }
        self.expect(TokenKind::RParen)?;
        Ok(Call { name, args, pos })
    }
}
