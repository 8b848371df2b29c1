// ABOUTME: Immutable AST types for expressions and statements (§3)

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum UnaryOp {
    #[serde(rename = "!")]
    Not,
    #[serde(rename = "-")]
    Neg,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BinaryOp {
    #[serde(rename = "**")]
    Pow,
    #[serde(rename = "*")]
    Mul,
    #[serde(rename = "/")]
    Div,
    #[serde(rename = "%")]
    Mod,
    #[serde(rename = "+")]
    Add,
    #[serde(rename = "-")]
    Sub,
    #[serde(rename = "<=")]
    Le,
    #[serde(rename = "<")]
    Lt,
    #[serde(rename = ">=")]
    Ge,
    #[serde(rename = ">")]
    Gt,
    #[serde(rename = "==")]
    Eq,
    #[serde(rename = "!=")]
    Ne,
    #[serde(rename = "&&")]
    And,
    #[serde(rename = "||")]
    Or,
}

impl BinaryOp {
    /// Higher number binds tighter. Mirrors the table in §3.
    pub fn precedence(self) -> u8 {
        use BinaryOp::*;
        match self {
            Pow => 6,
            Mul | Div | Mod => 5,
            Add | Sub => 4,
            Le | Lt | Ge | Gt => 3,
            Eq | Ne => 2,
            And => 1,
            Or => 0,
        }
    }

    pub fn from_token(tok: &str) -> Option<BinaryOp> {
        use BinaryOp::*;
        Some(match tok {
            "**" => Pow,
            "*" => Mul,
            "/" => Div,
            "%" => Mod,
            "+" => Add,
            "-" => Sub,
            "<=" => Le,
            "<" => Lt,
            ">=" => Ge,
            ">" => Gt,
            "==" => Eq,
            "!=" => Ne,
            "&&" => And,
            "||" => Or,
            _ => return None,
        })
    }
}

/// The expression AST (§3 "Expression AST (immutable)").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Expression {
    #[serde(rename = "number")]
    Number { value: f64 },
    #[serde(rename = "string")]
    Str { value: String },
    #[serde(rename = "variable")]
    Variable { name: String },
    #[serde(rename = "group")]
    Group { expr: Box<Expression> },
    #[serde(rename = "unary")]
    Unary { op: UnaryOp, expr: Box<Expression> },
    #[serde(rename = "binary")]
    Binary {
        op: BinaryOp,
        left: Box<Expression>,
        right: Box<Expression>,
    },
    #[serde(rename = "function")]
    Function { name: String, args: Vec<Expression> },
}

/// The statement AST (§3 "Statement AST (immutable, per function body and at
/// script top level)").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Statement {
    #[serde(rename = "expr")]
    Expr {
        name: Option<String>,
        expr: Expression,
    },
    #[serde(rename = "jump")]
    Jump {
        label: String,
        expr: Option<Expression>,
    },
    #[serde(rename = "return")]
    Return { expr: Option<Expression> },
    #[serde(rename = "label")]
    Label { name: String },
    #[serde(rename = "function")]
    Function {
        name: String,
        args: Vec<String>,
        last_arg_array: bool,
        is_async: bool,
        statements: Vec<Statement>,
    },
    #[serde(rename = "include")]
    Include { includes: Vec<IncludeEntry> },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncludeEntry {
    pub url: String,
    pub system: bool,
}

/// The top-level parse result of a script (§4.1 "Output").
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Script {
    pub statements: Vec<Statement>,
}
