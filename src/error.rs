// ABOUTME: Error types for parsing and evaluation failures

use thiserror::Error;

/// A syntax error raised while parsing a script or a standalone expression,
/// carrying enough context to render a caret diagnostic (§6, "Parser error
/// envelope").
#[derive(Error, Debug, Clone, PartialEq)]
#[error("{message}")]
pub struct ParseError {
    pub message: String,
    pub line: String,
    pub column_number: usize,
    pub line_number: Option<usize>,
}

impl ParseError {
    pub fn new(
        message: impl Into<String>,
        line: impl Into<String>,
        column_number: usize,
        line_number: Option<usize>,
    ) -> Self {
        ParseError {
            message: message.into(),
            line: line.into(),
            column_number,
            line_number,
        }
    }

    /// Renders a human-readable diagnostic: the offending line truncated to
    /// ~120 characters with ellipses, and a caret line marking the column.
    pub fn render(&self) -> String {
        const WINDOW: usize = 120;
        let chars: Vec<char> = self.line.chars().collect();
        let (start, end) = if chars.len() <= WINDOW {
            (0, chars.len())
        } else {
            let half = WINDOW / 2;
            let start = self.column_number.saturating_sub(half).min(chars.len());
            let end = (start + WINDOW).min(chars.len());
            (start, end)
        };
        let mut shown: String = chars[start..end].iter().collect();
        let mut caret_col = self.column_number.saturating_sub(start);
        if start > 0 {
            shown = format!("...{}", shown);
            caret_col += 3;
        }
        if end < chars.len() {
            shown.push_str("...");
        }
        let caret_line = format!("{}^", " ".repeat(caret_col));
        match self.line_number {
            Some(n) => format!("{} (line {})\n{}\n{}", self.message, n, shown, caret_line),
            None => format!("{}\n{}\n{}", self.message, shown, caret_line),
        }
    }
}

/// Errors raised while executing a parsed script (§7 "RuntimeError").
#[derive(Error, Debug, Clone, PartialEq)]
pub enum RuntimeError {
    #[error("Undefined function \"{0}\"")]
    UndefinedFunction(String),

    #[error("Unknown {0} label \"{1}\"")]
    UnknownLabel(String, String),

    #[error("Exceeded maximum script statements ({0})")]
    StatementBudgetExceeded(u64),

    #[error("{function}: expected {expected} argument{}, got {actual}", if expected == "1" { "" } else { "s" })]
    ArityError {
        function: String,
        expected: String,
        actual: usize,
    },

    #[error("{function}: expected {expected}, got {actual} at argument {position}")]
    TypeMismatch {
        function: String,
        expected: String,
        actual: String,
        position: usize,
    },

    #[error("value is not callable")]
    NotCallable,

    #[error("{0}")]
    Custom(String),
}

impl RuntimeError {
    pub fn arity(function: &str, expected: impl Into<String>, actual: usize) -> Self {
        RuntimeError::ArityError {
            function: function.to_string(),
            expected: expected.into(),
            actual,
        }
    }

    pub fn type_mismatch(
        function: &str,
        expected: &str,
        actual: &crate::value::Value,
        position: usize,
    ) -> Self {
        RuntimeError::TypeMismatch {
            function: function.to_string(),
            expected: expected.to_string(),
            actual: actual.type_name().to_string(),
            position,
        }
    }
}
