//! Source-like printing of AST nodes.
//!
//! Output is normalized: redundant parentheses are dropped and operators are
//! separated by single spaces, so `(a*2)-1` prints as `a * 2 - 1`.

use std::fmt;

use crate::ast::*;

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Type::Int => "int",
            Type::Float => "float",
            Type::Void => "void",
        };
        f.write_str(s)
    }
}

impl fmt::Display for UnaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            UnaryOp::Neg => "-",
            UnaryOp::Pos => "+",
        })
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BinaryOp::Mul => "*",
            BinaryOp::Div => "/",
            BinaryOp::Add => "+",
            BinaryOp::Sub => "-",
            BinaryOp::Gt => ">",
            BinaryOp::Lt => "<",
            BinaryOp::Ge => ">=",
            BinaryOp::Le => "<=",
            BinaryOp::Eq => "==",
            BinaryOp::Ne => "!=",
        })
    }
}

const UNARY_PREC: u8 = 5;
const ATOM_PREC: u8 = 6;

fn expr_prec(e: &Expr) -> u8 {
    match e {
        Expr::Binary { op, .. } => op.precedence(),
        Expr::Unary { .. } => UNARY_PREC,
        _ => ATOM_PREC,
    }
}

fn write_operand(f: &mut fmt::Formatter<'_>, e: &Expr, parens: bool) -> fmt::Result {
    if parens {
        write!(f, "({})", e)
    } else {
        write!(f, "{}", e)
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::IntLiteral(n) => write!(f, "{}", n),
            Expr::FloatLiteral(x) => {
                // keep a fractional part so the literal reads back as a float
                if x.fract() == 0.0 && x.is_finite() {
                    write!(f, "{:.1}", x)
                } else {
                    write!(f, "{}", x)
                }
            }
            Expr::Ident { name, .. } => f.write_str(name),
            Expr::Unary { op, operand } => {
                write!(f, "{}", op)?;
                write_operand(f, operand, expr_prec(operand) < UNARY_PREC)
            }
            Expr::Binary { op, lhs, rhs } => {
                let prec = op.precedence();
                write_operand(f, lhs, expr_prec(lhs) < prec)?;
                write!(f, " {} ", op)?;
                // operators are left-associative
                write_operand(f, rhs, expr_prec(rhs) <= prec)
            }
            Expr::Call(call) => write!(f, "{}", call),
        }
    }
}

impl fmt::Display for Call {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}(", self.name)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", arg)?;
        }
        f.write_str(")")
    }
}

impl fmt::Display for Assign {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} = {}", self.target, self.expr)
    }
}

impl fmt::Display for Declarator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.init {
            Some(init) => write!(f, "{} = {}", self.name, init),
            None => f.write_str(&self.name),
        }
    }
}

impl fmt::Display for Declaration {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ", self.ty)?;
        for (i, d) in self.declarators.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", d)?;
        }
        f.write_str(";")
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.ty, self.name)
    }
}

/// Parameter list as written, e.g. `int a, int b`.
pub fn param_list(params: &[Param]) -> String {
    params.iter().map(|p| p.to_string()).collect::<Vec<_>>().join(", ")
}

impl Stmt {
    /// One-line rendering used in findings and reports. Compound statements
    /// print their header followed by `...`.
    pub fn summary(&self) -> String {
        match &self.kind {
            StmtKind::Decl(d) => d.to_string(),
            StmtKind::Assign(a) => format!("{};", a),
            StmtKind::If { cond, else_block, .. } => match else_block {
                Some(_) => format!("if ({}) ... else ...", cond),
                None => format!("if ({}) ...", cond),
            },
            StmtKind::While { cond, .. } => format!("while ({}) ...", cond),
            StmtKind::For { init, cond, step, .. } => {
                format!("for ({}; {}; {}) ...", init, cond, step)
            }
            StmtKind::Return(Some(e)) => format!("return {};", e),
            StmtKind::Return(None) => "return;".to_string(),
            StmtKind::Call(c) => format!("{};", c),
            StmtKind::Empty => ";".to_string(),
            StmtKind::Block(b) => format!("{{ {} statement(s) }}", b.stmts.len()),
        }
    }
}
