use serde::Serialize;

use crate::token::Token;

/// Identity of a resolvable expression node (variable, assignment, `this`,
/// `super`).  Assigned once by the parser; the resolver records the binding
/// distance for that id, so the AST itself stays immutable after parsing.
pub type ExprId = usize;

/// Expression nodes.  A closed set of variants; evaluation is a `match` in
/// the interpreter, resolution a `match` in the resolver.
#[derive(Debug, Clone, Serialize)]
pub enum Expr {
    /// A literal value token: number, string, `true`, `false`, `nil`.
    Literal(Token),

    /// A parenthesized expression.
    Grouping(Box<Expr>),

    /// `-x` or `!x`.
    Unary { operator: Token, right: Box<Expr> },

    /// Arithmetic, comparison, and equality operators.
    Binary {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// `and` / `or`, short‑circuiting.
    Logical {
        left: Box<Expr>,
        operator: Token,
        right: Box<Expr>,
    },

    /// A variable reference.
    Variable { id: ExprId, name: Token },

    /// `name = value`.
    Assign {
        id: ExprId,
        name: Token,
        value: Box<Expr>,
    },

    /// `callee(arguments...)`; `paren` is the closing parenthesis, kept for
    /// error line reporting.
    Call {
        callee: Box<Expr>,
        paren: Token,
        arguments: Vec<Expr>,
    },

    /// Property read: `object.name`.
    Get { object: Box<Expr>, name: Token },

    /// Property write: `object.name = value`.
    Set {
        object: Box<Expr>,
        name: Token,
        value: Box<Expr>,
    },

    /// `this` inside a method body.
    This { id: ExprId, keyword: Token },

    /// `super.method` inside a subclass method body.
    Super {
        id: ExprId,
        keyword: Token,
        method: Token,
    },
}

impl Expr {
    /// Source line of the token that anchors this node, for diagnostics.
    pub fn line(&self) -> usize {
        match self {
            Expr::Literal(token) => token.line,

            Expr::Grouping(inner) => inner.line(),

            Expr::Unary { operator, .. } => operator.line,

            Expr::Binary { operator, .. } => operator.line,

            Expr::Logical { operator, .. } => operator.line,

            Expr::Variable { name, .. } => name.line,

            Expr::Assign { name, .. } => name.line,

            Expr::Call { paren, .. } => paren.line,

            Expr::Get { name, .. } => name.line,

            Expr::Set { name, .. } => name.line,

            Expr::This { keyword, .. } => keyword.line,

            Expr::Super { keyword, .. } => keyword.line,
        }
    }
}
