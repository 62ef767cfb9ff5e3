pub mod ast;
pub mod error;
pub mod pretty;
pub mod token;

pub use ast::*;
pub use error::*;
pub use token::*;

#[cfg(test)]
mod tests {
    use super::*;

    fn ident(name: &str) -> Expr {
        Expr::Ident {
            name: name.to_string(),
            pos: Pos::default(),
        }
    }

    fn bin(op: BinaryOp, lhs: Expr, rhs: Expr) -> Expr {
        Expr::Binary {
            op,
            lhs: Box::new(lhs),
            rhs: Box::new(rhs),
        }
    }

    #[test]
    fn test_printer_drops_redundant_parens() {
        let e = bin(BinaryOp::Sub, bin(BinaryOp::Mul, ident("input"), Expr::IntLiteral(2)), Expr::IntLiteral(1));
        assert_eq!(e.to_string(), "input * 2 - 1");
    }

    #[test]
    fn test_printer_keeps_needed_parens() {
        let e = bin(BinaryOp::Mul, bin(BinaryOp::Add, ident("x"), ident("y")), Expr::FloatLiteral(2.0));
        assert_eq!(e.to_string(), "(x + y) * 2.0");

        let right = bin(BinaryOp::Sub, ident("a"), bin(BinaryOp::Sub, ident("b"), ident("c")));
        assert_eq!(right.to_string(), "a - (b - c)");

        let neg = Expr::Unary {
            op: UnaryOp::Neg,
            operand: Box::new(bin(BinaryOp::Add, ident("a"), ident("b"))),
        };
        assert_eq!(neg.to_string(), "-(a + b)");
    }

    #[test]
    fn test_float_literal_keeps_fraction() {
        assert_eq!(Expr::FloatLiteral(3.14).to_string(), "3.14");
        assert_eq!(Expr::FloatLiteral(0.0).to_string(), "0.0");
    }

    #[test]
    fn test_expr_walkers() {
        let call = Expr::Call(Call {
            name: "f".to_string(),
            args: vec![ident("a"), Expr::Call(Call { name: "g".to_string(), args: vec![ident("b")], pos: Pos::default() })],
            pos: Pos::default(),
        });
        let e = bin(BinaryOp::Add, call, ident("c"));

        let mut names = Vec::new();
        e.for_each_ident(&mut |n, _| names.push(n.to_string()));
        assert_eq!(names, vec!["a", "b", "c"]);

        let mut calls = Vec::new();
        e.for_each_call(&mut |c| calls.push(c.name.clone()));
        assert_eq!(calls, vec!["g", "f"]);
    }

    #[test]
    fn test_token_classes() {
        assert_eq!(TokenKind::keyword("while"), Some(TokenKind::While));
        assert_eq!(TokenKind::keyword("whilst"), None);
        assert_eq!(TokenKind::IntLit(1).class(), TokenClass::IntLiteral);
        assert_eq!(TokenKind::FloatLit(1.5).class(), TokenClass::FloatLiteral);
        assert_eq!(TokenKind::GreaterEq.class(), TokenClass::Operator);
        assert_eq!(TokenKind::Semi.class(), TokenClass::Punctuation);
        assert_eq!(TokenKind::Semi.describe(), "';'");
        assert_eq!(TokenKind::Eof.describe(), "end of input");
    }

    #[test]
    fn test_diagnostics_sort_and_counts() {
        let mut diags = Diagnostics::new();
        diags.push(Diagnostic::new(DiagnosticKind::DeadCode, "dead", 9, 1));
        diags.push(Diagnostic::new(DiagnosticKind::Parse, "second", 4, 2));
        diags.push(Diagnostic::new(DiagnosticKind::Lex, "first", 4, 1));
        diags.sort();

        let msgs: Vec<_> = diags.iter().map(|d| d.msg.as_str()).collect();
        assert_eq!(msgs, vec!["first", "second", "dead"]);
        assert_eq!(diags.error_count(), 2);
        assert_eq!(diags.warning_count(), 1);
        assert!(diags.has_errors());
    }
}
