// ABOUTME: Static analysis over a parsed script model (§4.4)

use indexmap::IndexMap;
use std::collections::HashSet;

use crate::ast::{Expression, Script, Statement};

/// Analyses `script` and returns human-readable warnings. Pure; never
/// throws for well-typed inputs (§4.4 "Contract").
pub fn lint(script: &Script) -> Vec<String> {
    let mut messages = Vec::new();

    if script.statements.is_empty() {
        messages.push("Empty script".to_string());
        return messages;
    }

    lint_body(&script.statements, "global", &[], "global", &mut messages);

    let mut seen_functions: HashSet<String> = HashSet::new();
    for stmt in &script.statements {
        if let Statement::Function {
            name,
            args,
            statements,
            ..
        } = stmt
        {
            if !seen_functions.insert(name.clone()) {
                messages.push(format!("Duplicate function definition \"{}\"", name));
            }
            let scope_word = format!("function \"{}\"", name);
            lint_body(statements, "local", args, &scope_word, &mut messages);
        }
    }

    messages
}

fn lint_body(
    stmts: &[Statement],
    variable_kind: &str,
    params: &[String],
    label_scope: &str,
    out: &mut Vec<String>,
) {
    let mut assigns: IndexMap<String, usize> = IndexMap::new();
    let mut reads: IndexMap<String, usize> = IndexMap::new();
    let mut labels: IndexMap<String, usize> = IndexMap::new();
    let mut duplicate_labels: Vec<String> = Vec::new();
    let mut jump_targets: HashSet<String> = HashSet::new();
    let mut pointless: Vec<usize> = Vec::new();

    let mut seen_params: HashSet<String> = HashSet::new();
    for p in params {
        if !seen_params.insert(p.clone()) {
            out.push(format!("Duplicate parameter \"{}\" in {}", p, label_scope));
        }
    }

    for (i, stmt) in stmts.iter().enumerate() {
        match stmt {
            Statement::Expr { name, expr } => {
                collect_reads(expr, i, &mut reads);
                match name {
                    Some(n) => {
                        assigns.entry(n.clone()).or_insert(i);
                    }
                    None => {
                        if is_pure(expr) {
                            pointless.push(i);
                        }
                    }
                }
            }
            Statement::Jump { label, expr } => {
                jump_targets.insert(label.clone());
                if let Some(e) = expr {
                    collect_reads(e, i, &mut reads);
                }
            }
            Statement::Return { expr } => {
                if let Some(e) = expr {
                    collect_reads(e, i, &mut reads);
                }
            }
            Statement::Label { name } => {
                if labels.contains_key(name) {
                    duplicate_labels.push(name.clone());
                } else {
                    labels.insert(name.clone(), i);
                }
            }
            Statement::Function { .. } | Statement::Include { .. } => {}
        }
    }

    for name in &duplicate_labels {
        out.push(format!("Duplicate {} label \"{}\"", label_scope, name));
    }

    for target in &jump_targets {
        if !labels.contains_key(target) {
            out.push(format!("Unknown {} label \"{}\"", label_scope, target));
        }
    }

    for name in labels.keys() {
        if !jump_targets.contains(name) {
            out.push(format!("Unused {} label \"{}\"", label_scope, name));
        }
    }

    for (name, &assign_at) in &assigns {
        if let Some(&read_at) = reads.get(name) {
            if read_at <= assign_at {
                out.push(format!(
                    "{} variable \"{}\" used before assignment",
                    title_case(variable_kind),
                    name
                ));
            }
        }
        if !reads.contains_key(name) && !params.contains(name) {
            out.push(format!(
                "Unused {} variable \"{}\"",
                variable_kind, name
            ));
        }
    }

    for p in params {
        if !reads.contains_key(p) {
            out.push(format!("Unused parameter \"{}\" in {}", p, label_scope));
        }
    }

    for i in pointless {
        out.push(format!(
            "Pointless {} statement at position {}",
            variable_kind, i
        ));
    }
}

fn title_case(s: &str) -> String {
    let mut c = s.chars();
    match c.next() {
        Some(f) => f.to_uppercase().collect::<String>() + c.as_str(),
        None => String::new(),
    }
}

fn collect_reads(expr: &Expression, idx: usize, reads: &mut IndexMap<String, usize>) {
    match expr {
        Expression::Number { .. } | Expression::Str { .. } => {}
        Expression::Variable { name } => {
            reads.entry(name.clone()).or_insert(idx);
        }
        Expression::Group { expr } | Expression::Unary { expr, .. } => {
            collect_reads(expr, idx, reads);
        }
        Expression::Binary { left, right, .. } => {
            collect_reads(left, idx, reads);
            collect_reads(right, idx, reads);
        }
        Expression::Function { args, .. } => {
            for a in args {
                collect_reads(a, idx, reads);
            }
        }
    }
}

/// An expression is "pure" for the pointless-statement check when it
/// contains no function call — a bare literal/variable/group/unary/binary
/// has no observable effect when its result is discarded.
fn is_pure(expr: &Expression) -> bool {
    match expr {
        Expression::Number { .. } | Expression::Str { .. } | Expression::Variable { .. } => true,
        Expression::Group { expr } | Expression::Unary { expr, .. } => is_pure(expr),
        Expression::Binary { left, right, .. } => is_pure(left) && is_pure(right),
        Expression::Function { .. } => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script_parser::parse_script;

    #[test]
    fn empty_script_is_flagged() {
        let s = Script::default();
        assert_eq!(lint(&s), vec!["Empty script".to_string()]);
    }

    #[test]
    fn unused_global_variable_is_reported() {
        let s = parse_script("x = 1", 1).unwrap();
        let msgs = lint(&s);
        assert!(msgs.iter().any(|m| m.contains("Unused global variable \"x\"")));
    }

    #[test]
    fn self_referential_first_assignment_is_used_before_assignment() {
        // "total = total + 1" reads `total` at the same statement that
        // first assigns it, which is "at" its first assignment per §4.4.
        let s = parse_script("total = total + 1", 1).unwrap();
        let msgs = lint(&s);
        assert!(msgs
            .iter()
            .any(|m| m.contains("variable \"total\" used before assignment")));
    }

    #[test]
    fn unknown_jump_label_is_reported() {
        let s = parse_script("jump nowhere", 1).unwrap();
        let msgs = lint(&s);
        assert!(msgs.contains(&"Unknown global label \"nowhere\"".to_string()));
    }

    #[test]
    fn pointless_statement_is_reported() {
        let s = parse_script("1 + 2", 1).unwrap();
        let msgs = lint(&s);
        assert!(msgs.iter().any(|m| m.contains("Pointless")));
    }

    #[test]
    fn function_call_statement_is_not_pointless() {
        let s = parse_script("debugLog('hi')", 1).unwrap();
        let msgs = lint(&s);
        assert!(!msgs.iter().any(|m| m.contains("Pointless")));
    }

    #[test]
    fn unused_function_parameter_is_reported() {
        let s = parse_script("function f(a, b):\n    return a\nendfunction\nreturn f(1, 2)", 1).unwrap();
        let msgs = lint(&s);
        assert!(msgs
            .iter()
            .any(|m| m.contains("Unused parameter \"b\"")));
    }
}
