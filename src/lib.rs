// ABOUTME: BareScript/CalcScript — a line-oriented scripting language and expression evaluator

pub mod ast;
pub mod builtins;
pub mod error;
pub mod expr_parser;
pub mod host;
pub mod interpreter;
pub mod lint;
pub mod script_parser;
pub mod value;

use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

pub use ast::{Expression, Script, Statement};
pub use error::{ParseError, RuntimeError};
pub use host::{ExecOptions, FetchResponse, Fetcher, IncludeResolver, Logger};
pub use value::Value;

/// `parseScript(text, startLineNumber=1) -> Script | ParserError` (§6).
pub fn parse_script(text: &str, start_line_number: usize) -> Result<Script, ParseError> {
    script_parser::parse_script(text, start_line_number)
}

/// `parseExpression(text) -> Expression | ParserError` (§6).
pub fn parse_expression(text: &str) -> Result<Expression, ParseError> {
    expr_parser::parse_expression(text)
}

/// `execute(script, globals, options) -> Value | RuntimeError` (§6).
pub fn execute(
    script: &Script,
    globals: Rc<RefCell<IndexMap<String, Value>>>,
    options: &ExecOptions,
) -> Result<Value, RuntimeError> {
    interpreter::execute(script, globals, options)
}

/// `lint(script) -> [String]` (§6).
pub fn lint(script: &Script) -> Vec<String> {
    lint::lint(script)
}

/// Convenience constructor for a fresh, empty globals map.
pub fn new_globals() -> Rc<RefCell<IndexMap<String, Value>>> {
    Rc::new(RefCell::new(IndexMap::new()))
}
