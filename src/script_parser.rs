// ABOUTME: Line-oriented script parser; lowers structured control flow to flat Jump/Label/Expr (§4.1)

use regex::Regex;

use crate::ast::{BinaryOp, Expression, IncludeEntry, Script, Statement, UnaryOp};
use crate::error::ParseError;
use crate::expr_parser::parse_expression;

/// Parses script source (one string, or several joined with newlines) into a
/// flat `Script`, starting line numbers at `start_line_number`.
pub fn parse_script(text: &str, start_line_number: usize) -> Result<Script, ParseError> {
    let mut parser = ScriptParser::new(start_line_number);
    parser.run(text)?;
    parser.finish()
}

struct LogicalLine {
    text: String,
    line_number: usize,
}

enum BlockEntry {
    If {
        pending_jump_index: usize,
        pending_jump_label: String,
        done_label: String,
        has_else: bool,
    },
    While {
        loop_label: String,
        done_label: String,
        condition: Expression,
    },
    For {
        loop_label: String,
        done_label: String,
        continue_label: String,
        used_continue: bool,
        index_var: String,
        length_var: String,
    },
}

struct Scope {
    statements: Vec<Statement>,
    blocks: Vec<BlockEntry>,
    /// name/args recorded when this scope is a function body; None at top level.
    function_header: Option<(String, Vec<String>, bool, bool)>,
}

impl Scope {
    fn top() -> Self {
        Scope {
            statements: Vec::new(),
            blocks: Vec::new(),
            function_header: None,
        }
    }
}

struct ScriptParser {
    label_counter: u64,
    start_line_number: usize,
    scopes: Vec<Scope>,
    re: Recognizers,
}

struct Recognizers {
    assignment: Regex,
    func_begin: Regex,
    if_re: Regex,
    elif_re: Regex,
    else_re: Regex,
    while_re: Regex,
    for_re: Regex,
    jump_re: Regex,
    jumpif_re: Regex,
    return_re: Regex,
    label_re: Regex,
    include_user_re: Regex,
    include_system_re: Regex,
}

impl Recognizers {
    fn new() -> Self {
        Recognizers {
            assignment: Regex::new(r"^([A-Za-z_]\w*)\s*=\s*(.*)$").unwrap(),
            func_begin: Regex::new(
                r"^(async\s+)?function\s+([A-Za-z_]\w*)\s*\(\s*(.*?)\s*\)\s*:$",
            )
            .unwrap(),
            if_re: Regex::new(r"^if\s+(.+):$").unwrap(),
            elif_re: Regex::new(r"^elif\s+(.+):$").unwrap(),
            else_re: Regex::new(r"^else\s*:$").unwrap(),
            while_re: Regex::new(r"^while\s+(.+):$").unwrap(),
            for_re: Regex::new(r"^for\s+([A-Za-z_]\w*)(?:\s*,\s*([A-Za-z_]\w*))?\s+in\s+(.+):$")
                .unwrap(),
            jump_re: Regex::new(r"^jump\s+([A-Za-z_]\w*)$").unwrap(),
            jumpif_re: Regex::new(r"^jumpif\s*\(\s*(.+)\s*\)\s+([A-Za-z_]\w*)$").unwrap(),
            return_re: Regex::new(r"^return(?:\s+(.+))?$").unwrap(),
            label_re: Regex::new(r"^([A-Za-z_]\w*)\s*:$").unwrap(),
            include_user_re: Regex::new(r"^include\s+'([^']*)'$").unwrap(),
            include_system_re: Regex::new(r"^include\s+<([^>]*)>$").unwrap(),
        }
    }
}

impl ScriptParser {
    fn new(start_line_number: usize) -> Self {
        ScriptParser {
            label_counter: 0,
            start_line_number,
            scopes: vec![Scope::top()],
            re: Recognizers::new(),
        }
    }

    fn fresh_label(&mut self, prefix: &str) -> String {
        let n = self.label_counter;
        self.label_counter += 1;
        format!("{}{}", prefix, n)
    }

    fn scope(&mut self) -> &mut Scope {
        self.scopes.last_mut().unwrap()
    }

    fn emit(&mut self, stmt: Statement) -> usize {
        let scope = self.scope();
        scope.statements.push(stmt);
        scope.statements.len() - 1
    }

    fn run(&mut self, text: &str) -> Result<(), ParseError> {
        for line in logical_lines(text, self.start_line_number) {
            self.dispatch_line(&line)?;
        }
        Ok(())
    }

    fn dispatch_line(&mut self, line: &LogicalLine) -> Result<(), ParseError> {
        let trimmed = line.text.trim();
        let err = |msg: &str| ParseError::new(msg, line.text.clone(), 0, Some(line.line_number));

        if let Some(caps) = self.re.assignment.captures(trimmed) {
            let expr_text = caps.get(2).unwrap().as_str();
            if !expr_text.trim_start().starts_with('=') {
                let name = caps.get(1).unwrap().as_str().to_string();
                let expr = self.parse_expr_on_line(expr_text, line)?;
                self.emit(Statement::Expr {
                    name: Some(name),
                    expr,
                });
                return Ok(());
            }
        }

        if let Some(caps) = self.re.func_begin.captures(trimmed) {
            if self.scopes.len() > 1 {
                return Err(err("Nested function definition is not allowed"));
            }
            let is_async = caps.get(1).is_some();
            let name = caps.get(2).unwrap().as_str().to_string();
            let args_text = caps.get(3).unwrap().as_str();
            let (args, last_arg_array) = parse_arg_list(args_text);
            self.scopes.push(Scope {
                statements: Vec::new(),
                blocks: Vec::new(),
                function_header: Some((name, args, last_arg_array, is_async)),
            });
            return Ok(());
        }

        if trimmed == "endfunction" {
            if self.scopes.len() <= 1 {
                return Err(err("\"endfunction\" without matching \"function\""));
            }
            let scope = self.scopes.pop().unwrap();
            if !scope.blocks.is_empty() {
                return Err(err("Unbalanced block at \"endfunction\""));
            }
            let (name, args, last_arg_array, is_async) = scope.function_header.unwrap();
            self.emit(Statement::Function {
                name,
                args,
                last_arg_array,
                is_async,
                statements: scope.statements,
            });
            return Ok(());
        }

        if let Some(caps) = self.re.if_re.captures(trimmed) {
            let cond = self.parse_expr_on_line(caps.get(1).unwrap().as_str(), line)?;
            let then_label = self.fresh_label("$then");
            let done_label = self.fresh_label("$done");
            let idx = self.emit(Statement::Jump {
                label: then_label.clone(),
                expr: Some(negate(cond)),
            });
            self.scope().blocks.push(BlockEntry::If {
                pending_jump_index: idx,
                pending_jump_label: then_label,
                done_label,
                has_else: false,
            });
            return Ok(());
        }

        if let Some(caps) = self.re.elif_re.captures(trimmed) {
            let cond = self.parse_expr_on_line(caps.get(1).unwrap().as_str(), line)?;
            let (pending_label, done_label) = match self.scope().blocks.last() {
                Some(BlockEntry::If {
                    pending_jump_label,
                    done_label,
                    has_else: false,
                    ..
                }) => (pending_jump_label.clone(), done_label.clone()),
                Some(BlockEntry::If { has_else: true, .. }) => {
                    return Err(err("\"elif\" after \"else\""))
                }
                _ => return Err(err("\"elif\" without matching \"if\"")),
            };
            self.emit(Statement::Jump {
                label: done_label.clone(),
                expr: None,
            });
            self.emit(Statement::Label {
                name: pending_label,
            });
            let new_then = self.fresh_label("$then");
            let idx = self.emit(Statement::Jump {
                label: new_then.clone(),
                expr: Some(negate(cond)),
            });
            if let Some(BlockEntry::If {
                pending_jump_index,
                pending_jump_label,
                ..
            }) = self.scope().blocks.last_mut()
            {
                *pending_jump_index = idx;
                *pending_jump_label = new_then;
            }
            return Ok(());
        }

        if self.re.else_re.is_match(trimmed) {
            let (pending_label, done_label) = match self.scope().blocks.last() {
                Some(BlockEntry::If {
                    pending_jump_label,
                    done_label,
                    has_else: false,
                    ..
                }) => (pending_jump_label.clone(), done_label.clone()),
                Some(BlockEntry::If { has_else: true, .. }) => {
                    return Err(err("Multiple \"else\" blocks"))
                }
                _ => return Err(err("\"else\" without matching \"if\"")),
            };
            self.emit(Statement::Jump {
                label: done_label,
                expr: None,
            });
            self.emit(Statement::Label {
                name: pending_label,
            });
            if let Some(BlockEntry::If { has_else, .. }) = self.scope().blocks.last_mut() {
                *has_else = true;
            }
            return Ok(());
        }

        if trimmed == "endif" {
            match self.scope().blocks.pop() {
                Some(BlockEntry::If {
                    pending_jump_index,
                    done_label,
                    has_else,
                    ..
                }) => {
                    if !has_else {
                        if let Statement::Jump { label, .. } =
                            &mut self.scope().statements[pending_jump_index]
                        {
                            *label = done_label.clone();
                        }
                    }
                    self.emit(Statement::Label { name: done_label });
                }
                _ => return Err(err("\"endif\" without matching \"if\"")),
            }
            return Ok(());
        }

        if let Some(caps) = self.re.while_re.captures(trimmed) {
            let cond = self.parse_expr_on_line(caps.get(1).unwrap().as_str(), line)?;
            let loop_label = self.fresh_label("$loop");
            let done_label = self.fresh_label("$done");
            self.emit(Statement::Jump {
                label: done_label.clone(),
                expr: Some(negate(cond.clone())),
            });
            self.emit(Statement::Label {
                name: loop_label.clone(),
            });
            self.scope().blocks.push(BlockEntry::While {
                loop_label,
                done_label,
                condition: cond,
            });
            return Ok(());
        }

        if trimmed == "endwhile" {
            match self.scope().blocks.pop() {
                Some(BlockEntry::While {
                    loop_label,
                    done_label,
                    condition,
                }) => {
                    self.emit(Statement::Jump {
                        label: loop_label,
                        expr: Some(condition),
                    });
                    self.emit(Statement::Label { name: done_label });
                }
                _ => return Err(err("\"endwhile\" without matching \"while\"")),
            }
            return Ok(());
        }

        if let Some(caps) = self.re.for_re.captures(trimmed) {
            let value_var = caps.get(1).unwrap().as_str().to_string();
            let index_var = caps
                .get(2)
                .map(|m| m.as_str().to_string())
                .unwrap_or_else(|| self.fresh_label("$index"));
            let values_expr = self.parse_expr_on_line(caps.get(3).unwrap().as_str(), line)?;
            let values_var = self.fresh_label("$values");
            let length_var = self.fresh_label("$length");
            let loop_label = self.fresh_label("$loop");
            let done_label = self.fresh_label("$done");
            let continue_label = self.fresh_label("$continue");

            self.emit(Statement::Expr {
                name: Some(values_var.clone()),
                expr: values_expr,
            });
            self.emit(Statement::Expr {
                name: Some(length_var.clone()),
                expr: Expression::Function {
                    name: "arrayLength".to_string(),
                    args: vec![var(&values_var)],
                },
            });
            self.emit(Statement::Jump {
                label: done_label.clone(),
                expr: Some(negate(var(&length_var))),
            });
            self.emit(Statement::Expr {
                name: Some(index_var.clone()),
                expr: Expression::Number { value: 0.0 },
            });
            self.emit(Statement::Label {
                name: loop_label.clone(),
            });
            self.emit(Statement::Expr {
                name: Some(value_var),
                expr: Expression::Function {
                    name: "arrayGet".to_string(),
                    args: vec![var(&values_var), var(&index_var)],
                },
            });
            self.scope().blocks.push(BlockEntry::For {
                loop_label,
                done_label,
                continue_label,
                used_continue: false,
                index_var,
                length_var,
            });
            return Ok(());
        }

        if trimmed == "endfor" {
            match self.scope().blocks.pop() {
                Some(BlockEntry::For {
                    loop_label,
                    done_label,
                    continue_label,
                    used_continue,
                    index_var,
                    length_var,
                }) => {
                    if used_continue {
                        self.emit(Statement::Label {
                            name: continue_label,
                        });
                    }
                    self.emit(Statement::Expr {
                        name: Some(index_var.clone()),
                        expr: Expression::Binary {
                            op: BinaryOp::Add,
                            left: Box::new(var(&index_var)),
                            right: Box::new(Expression::Number { value: 1.0 }),
                        },
                    });
                    self.emit(Statement::Jump {
                        label: loop_label,
                        expr: Some(Expression::Binary {
                            op: BinaryOp::Lt,
                            left: Box::new(var(&index_var)),
                            right: Box::new(var(&length_var)),
                        }),
                    });
                    self.emit(Statement::Label { name: done_label });
                }
                _ => return Err(err("\"endfor\" without matching \"for\"")),
            }
            return Ok(());
        }

        if trimmed == "break" {
            let done_label = self.innermost_loop_done()?;
            self.emit(Statement::Jump {
                label: done_label,
                expr: None,
            });
            return Ok(());
        }

        if trimmed == "continue" {
            let continue_label = self.innermost_loop_continue()?;
            self.emit(Statement::Jump {
                label: continue_label,
                expr: None,
            });
            return Ok(());
        }

        if let Some(caps) = self.re.label_re.captures(trimmed) {
            self.emit(Statement::Label {
                name: caps.get(1).unwrap().as_str().to_string(),
            });
            return Ok(());
        }

        if let Some(caps) = self.re.jump_re.captures(trimmed) {
            self.emit(Statement::Jump {
                label: caps.get(1).unwrap().as_str().to_string(),
                expr: None,
            });
            return Ok(());
        }

        if let Some(caps) = self.re.jumpif_re.captures(trimmed) {
            let cond = self.parse_expr_on_line(caps.get(1).unwrap().as_str(), line)?;
            self.emit(Statement::Jump {
                label: caps.get(2).unwrap().as_str().to_string(),
                expr: Some(cond),
            });
            return Ok(());
        }

        if let Some(caps) = self.re.return_re.captures(trimmed) {
            let expr = match caps.get(1) {
                Some(m) => Some(self.parse_expr_on_line(m.as_str(), line)?),
                None => None,
            };
            self.emit(Statement::Return { expr });
            return Ok(());
        }

        if let Some(caps) = self.re.include_user_re.captures(trimmed) {
            self.append_include(caps.get(1).unwrap().as_str().to_string(), false);
            return Ok(());
        }
        if let Some(caps) = self.re.include_system_re.captures(trimmed) {
            self.append_include(caps.get(1).unwrap().as_str().to_string(), true);
            return Ok(());
        }

        let expr = self.parse_expr_on_line(trimmed, line)?;
        self.emit(Statement::Expr { name: None, expr });
        Ok(())
    }

    fn append_include(&mut self, url: String, system: bool) {
        let entry = IncludeEntry { url, system };
        let scope = self.scope();
        if let Some(Statement::Include { includes }) = scope.statements.last_mut() {
            includes.push(entry);
        } else {
            scope.statements.push(Statement::Include {
                includes: vec![entry],
            });
        }
    }

    fn innermost_loop_done(&mut self) -> Result<String, ParseError> {
        for block in self.scope().blocks.iter().rev() {
            match block {
                BlockEntry::If { .. } => continue,
                BlockEntry::While { done_label, .. } => return Ok(done_label.clone()),
                BlockEntry::For { done_label, .. } => return Ok(done_label.clone()),
            }
        }
        Err(ParseError::new(
            "\"break\"/\"continue\" outside a loop",
            String::new(),
            0,
            None,
        ))
    }

    fn innermost_loop_continue(&mut self) -> Result<String, ParseError> {
        for block in self.scope().blocks.iter_mut().rev() {
            match block {
                BlockEntry::If { .. } => continue,
                BlockEntry::While { loop_label, .. } => return Ok(loop_label.clone()),
                BlockEntry::For {
                    continue_label,
                    used_continue,
                    ..
                } => {
                    *used_continue = true;
                    return Ok(continue_label.clone());
                }
            }
        }
        Err(ParseError::new(
            "\"break\"/\"continue\" outside a loop",
            String::new(),
            0,
            None,
        ))
    }

    fn parse_expr_on_line(
        &self,
        text: &str,
        line: &LogicalLine,
    ) -> Result<Expression, ParseError> {
        parse_expression(text).map_err(|e| {
            ParseError::new(e.message, line.text.clone(), e.column_number, Some(line.line_number))
        })
    }

    fn finish(mut self) -> Result<Script, ParseError> {
        if self.scopes.len() > 1 {
            return Err(ParseError::new(
                "Dangling open \"function\" at end of input",
                String::new(),
                0,
                None,
            ));
        }
        let top = self.scopes.pop().unwrap();
        if !top.blocks.is_empty() {
            return Err(ParseError::new(
                "Dangling open block at end of input",
                String::new(),
                0,
                None,
            ));
        }
        Ok(Script {
            statements: top.statements,
        })
    }
}

fn var(name: &str) -> Expression {
    Expression::Variable {
        name: name.to_string(),
    }
}

fn negate(expr: Expression) -> Expression {
    Expression::Unary {
        op: UnaryOp::Not,
        expr: Box::new(expr),
    }
}

/// Splits `(a, b, c...)`-style argument lists, recognizing a trailing `...`
/// marker on the last parameter as `lastArgArray` (§3 "Function" statement).
fn parse_arg_list(text: &str) -> (Vec<String>, bool) {
    let text = text.trim();
    if text.is_empty() {
        return (Vec::new(), false);
    }
    let mut args: Vec<String> = text.split(',').map(|s| s.trim().to_string()).collect();
    let mut last_arg_array = false;
    if let Some(last) = args.last_mut() {
        if let Some(stripped) = last.strip_suffix("...") {
            *last = stripped.trim().to_string();
            last_arg_array = true;
        }
    }
    (args, last_arg_array)
}

/// Joins physical lines per the continuation/comment/blank rules of §4.1
/// "Lexical", skipping comment-only and blank lines entirely.
fn logical_lines(text: &str, start_line_number: usize) -> Vec<LogicalLine> {
    let physical: Vec<&str> = text.split('\n').map(|l| l.trim_end_matches('\r')).collect();
    let mut out = Vec::new();
    let mut i = 0usize;
    while i < physical.len() {
        let raw = physical[i];
        let trimmed = raw.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            i += 1;
            continue;
        }
        let line_number = start_line_number + i;
        let mut joined = raw.trim_end().to_string();
        while joined.ends_with('\\') {
            joined.truncate(joined.len() - 1);
            joined = joined.trim_end().to_string();
            i += 1;
            if i >= physical.len() {
                break;
            }
            joined.push(' ');
            joined.push_str(physical[i].trim_start());
        }
        out.push(LogicalLine {
            text: joined,
            line_number,
        });
        i += 1;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn assignment_statement() {
        let s = parse_script("x = 1 + 2", 1).unwrap();
        assert_eq!(s.statements.len(), 1);
        assert!(matches!(
            &s.statements[0],
            Statement::Expr { name: Some(n), .. } if n == "x"
        ));
    }

    #[test]
    fn if_elif_else_lowers_to_jumps_and_labels() {
        let script = "if a:\n    return 1\nelif b:\n    return 2\nelse:\n    return 3\nendif";
        let s = parse_script(script, 1).unwrap();
        let jumps = s
            .statements
            .iter()
            .filter(|st| matches!(st, Statement::Jump { .. }))
            .count();
        let labels = s
            .statements
            .iter()
            .filter(|st| matches!(st, Statement::Label { .. }))
            .count();
        assert!(jumps >= 3);
        assert!(labels >= 3);
    }

    #[test]
    fn for_each_lowers_with_hidden_vars() {
        let script = "for v in arrayNewArgs(1, 2):\n    total = total + v\nendfor";
        let s = parse_script(script, 1).unwrap();
        assert!(s.statements.len() > 5);
    }

    #[test]
    fn nested_function_definition_is_rejected() {
        let script = "function a():\n    function b():\n    endfunction\nendfunction";
        assert!(parse_script(script, 1).is_err());
    }

    #[test]
    fn unbalanced_endfunction_is_rejected() {
        assert!(parse_script("endfunction", 1).is_err());
    }

    #[test]
    fn break_outside_loop_is_rejected() {
        assert!(parse_script("break", 1).is_err());
    }

    #[test]
    fn line_continuation_joins_physical_lines() {
        let s = parse_script("x = 1 + \\\n    2", 1).unwrap();
        assert_eq!(s.statements.len(), 1);
    }

    #[test]
    fn start_line_number_offsets_error_line_numbers() {
        let err = parse_script("x = 1\ny = (", 100).unwrap_err();
        assert_eq!(err.line_number, Some(101));
    }

    #[test]
    fn comments_and_blank_lines_are_skipped() {
        let s = parse_script("# comment\n\nx = 1\n", 1).unwrap();
        assert_eq!(s.statements.len(), 1);
    }

    #[test]
    fn last_arg_array_marker_is_recognized() {
        let script = "function f(a, b...):\nendfunction";
        let s = parse_script(script, 1).unwrap();
        match &s.statements[0] {
            Statement::Function {
                args,
                last_arg_array,
                ..
            } => {
                assert_eq!(args, &vec!["a".to_string(), "b".to_string()]);
                assert!(*last_arg_array);
            }
            _ => panic!("expected Function statement"),
        }
    }

    #[test]
    fn include_statements_merge_into_one_list() {
        let script = "include 'a.bs'\ninclude <b.bs>\n";
        let s = parse_script(script, 1).unwrap();
        assert_eq!(s.statements.len(), 1);
        match &s.statements[0] {
            Statement::Include { includes } => assert_eq!(includes.len(), 2),
            _ => panic!("expected Include statement"),
        }
    }
}
