//! AST (abstract syntax tree) types for the SimpleC language.
//!
//! The tree is closed: every consumer matches exhaustively on [`StmtKind`] and
//! [`Expr`], so a new node kind has to be handled everywhere before the
//! workspace builds again. Parenthesized expressions are collapsed while
//! parsing and have no node of their own.

use serde::Serialize;

/// 1-based source position of the first character of a construct.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct Pos {
    pub line: usize,
    pub col: usize,
}

impl Pos {
    pub fn new(line: usize, col: usize) -> Self {
        Self { line, col }
    }
}

/// Declared types. `void` is only meaningful as a function return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Int,
    Float,
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UnaryOp {
    Neg,
    Pos,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BinaryOp {
    Mul,
    Div,
    Add,
    Sub,
    Gt,
    Lt,
    Ge,
    Le,
    Eq,
    Ne,
}

impl BinaryOp {
    /// Binding strength; higher binds tighter.
    pub fn precedence(self) -> u8 {
        match self {
            BinaryOp::Eq | BinaryOp::Ne => 1,
            BinaryOp::Gt | BinaryOp::Lt | BinaryOp::Ge | BinaryOp::Le => 2,
            BinaryOp::Add | BinaryOp::Sub => 3,
            BinaryOp::Mul | BinaryOp::Div => 4,
        }
    }
}

/// A function call, either inside an expression or as a statement.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Call {
    pub name: String,
    pub args: Vec<Expr>,
    pub pos: Pos,
}

/// Expressions (literals, names, operators, calls).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Expr {
    IntLiteral(i64),
    FloatLiteral(f64),
    Ident { name: String, pos: Pos },
    Unary { op: UnaryOp, operand: Box<Expr> },
    Binary { op: BinaryOp, lhs: Box<Expr>, rhs: Box<Expr> },
    Call(Call),
}

impl Expr {
    /// Visits every variable reference, left to right. Call names are not
    /// variables and are skipped; call arguments are visited.
    pub fn for_each_ident<'a, F: FnMut(&'a str, Pos)>(&'a self, f: &mut F) {
        match self {
            Expr::IntLiteral(_) | Expr::FloatLiteral(_) => {}
            Expr::Ident { name, pos } => f(name, *pos),
            Expr::Unary { operand, .. } => operand.for_each_ident(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_ident(f);
                rhs.for_each_ident(f);
            }
            Expr::Call(call) => {
                for arg in &call.args {
                    arg.for_each_ident(f);
                }
            }
        }
    }

    /// Visits every call in evaluation order (arguments before the call itself).
    pub fn for_each_call<'a, F: FnMut(&'a Call)>(&'a self, f: &mut F) {
        match self {
            Expr::IntLiteral(_) | Expr::FloatLiteral(_) | Expr::Ident { .. } => {}
            Expr::Unary { operand, .. } => operand.for_each_call(f),
            Expr::Binary { lhs, rhs, .. } => {
                lhs.for_each_call(f);
                rhs.for_each_call(f);
            }
            Expr::Call(call) => {
                for arg in &call.args {
                    arg.for_each_call(f);
                }
                f(call);
            }
        }
    }
}

/// One name in a declaration, with its optional initializer.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declarator {
    pub name: String,
    pub init: Option<Expr>,
    pub pos: Pos,
}

/// `int a, b = 1;` at global or local scope.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub ty: Type,
    pub declarators: Vec<Declarator>,
    pub pos: Pos,
}

/// `target = expr`, the only form of assignment; `pos` is the target's position.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Assign {
    pub target: String,
    pub expr: Expr,
    pub pos: Pos,
}

/// A braced statement sequence. Order is execution order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Block {
    pub stmts: Vec<Stmt>,
    pub pos: Pos,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Stmt {
    pub kind: StmtKind,
    pub pos: Pos,
}

/// Statements. Bodies of `if`/`while`/`for` are always blocks: the parser
/// wraps a lone statement body into a one-statement [`Block`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum StmtKind {
    Decl(Declaration),
    Assign(Assign),
    If {
        cond: Expr,
        then_block: Block,
        else_block: Option<Block>,
    },
    While {
        cond: Expr,
        body: Block,
    },
    For {
        init: Assign,
        cond: Expr,
        step: Assign,
        body: Block,
    },
    Return(Option<Expr>),
    Call(Call),
    Empty,
    Block(Block),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Param {
    pub ty: Type,
    pub name: String,
    pub pos: Pos,
}

/// Function definition.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Function {
    pub return_type: Type,
    pub name: String,
    pub params: Vec<Param>,
    pub body: Block,
    pub pos: Pos,
}

/// Top-level program items.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Item {
    Declaration(Declaration),
    Function(Function),
}

/// One translation unit, items in source order.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Program {
    pub items: Vec<Item>,
}

impl Program {
    pub fn functions(&self) -> impl Iterator<Item = &Function> {
        self.items.iter().filter_map(|item| match item {
            Item::Function(f) => Some(f),
            Item::Declaration(_) => None,
        })
    }

    pub fn globals(&self) -> impl Iterator<Item = &Declaration> {
        self.items.iter().filter_map(|item| match item {
            Item::Declaration(d) => Some(d),
            Item::Function(_) => None,
        })
    }
}
