// Integration tests for the literal end-to-end scenarios (spec §8)

use barescript::{execute, lint, new_globals, parse_expression, parse_script, ExecOptions, Expression, Value};

fn run(src: &str) -> Value {
    let script = parse_script(src, 1).expect("parse");
    let globals = new_globals();
    let options = ExecOptions::new();
    execute(&script, globals, &options).expect("execute")
}

fn run_with_budget(src: &str, max_statements: u64) -> Result<Value, barescript::RuntimeError> {
    let script = parse_script(src, 1).expect("parse");
    let globals = new_globals();
    let mut options = ExecOptions::new();
    options.max_statements = max_statements;
    execute(&script, globals, &options)
}

#[test]
fn precedence_multiplication_binds_tighter_than_addition() {
    let e = parse_expression("1 + 2 * 3").unwrap();
    match e {
        Expression::Binary { op, right, .. } => {
            assert_eq!(op, barescript::ast::BinaryOp::Add);
            assert!(matches!(*right, Expression::Binary { op: barescript::ast::BinaryOp::Mul, .. }));
        }
        _ => panic!("expected top-level Binary"),
    }
    let v = run("return 1 + 2 * 3");
    assert!(matches!(v, Value::Number(n) if n == 7.0));
}

#[test]
fn pow_is_right_associative_and_evaluates_accordingly() {
    let v = run("return 2 ** 3 ** 2");
    assert!(matches!(v, Value::Number(n) if n == 512.0));
}

#[test]
fn for_each_sum_scenario() {
    let src = "\
total = 0
for v in arrayNewArgs(1, 2, 3, 4):
    total = total + v
endfor
return total";
    let v = run(src);
    assert!(matches!(v, Value::Number(n) if n == 10.0));
}

#[test]
fn if_elif_else_scenario() {
    let src = "\
function grade(n):
    if n >= 90:
        return \"A\"
    elif n >= 80:
        return \"B\"
    else:
        return \"C\"
    endif
endfunction
return grade(85)";
    let v = run(src);
    assert!(matches!(v, Value::String(s) if s == "B"));
}

#[test]
fn short_circuit_avoids_calling_undefined_function() {
    let v = run("return 0 && undef() || 42");
    assert!(matches!(v, Value::Number(n) if n == 42.0));
}

#[test]
fn statement_budget_aborts_with_named_limit() {
    let err = run_with_budget("while 1:\nendwhile", 100).unwrap_err();
    let message = err.to_string();
    assert!(message.contains("100"), "error should name the limit: {message}");
}

#[test]
fn lint_reports_unknown_label() {
    let script = parse_script("jump nowhere", 1).unwrap();
    let warnings = lint(&script);
    assert!(warnings.contains(&"Unknown global label \"nowhere\"".to_string()));
}

#[test]
fn lint_of_single_assignment_flags_unused_but_not_pointless() {
    let script = parse_script("x = 1", 1).unwrap();
    let warnings = lint(&script);
    assert!(warnings.iter().any(|w| w.contains("Unused global variable \"x\"")));
    assert!(!warnings.iter().any(|w| w.contains("Pointless global statement")));
}

#[test]
fn break_and_continue_inside_while() {
    let src = "\
total = 0
i = 0
while i < 10:
    i = i + 1
    if i == 3:
        continue
    endif
    if i == 7:
        break
    endif
    total = total + i
endwhile
return total";
    // 1+2+4+5+6 = 18 (skip 3 via continue, stop before adding 7 via break)
    let v = run(src);
    assert!(matches!(v, Value::Number(n) if n == 18.0));
}

#[test]
fn recursive_function_call() {
    let src = "\
function fact(n):
    if n <= 1:
        return 1
    endif
    return n * fact(n - 1)
endfunction
return fact(5)";
    let v = run(src);
    assert!(matches!(v, Value::Number(n) if n == 120.0));
}

#[test]
fn last_arg_array_collects_extra_positional_arguments() {
    let src = "\
function sumAll(rest...):
    total = 0
    for v in rest:
        total = total + v
    endfor
    return total
endfunction
return sumAll(1, 2, 3, 4, 5)";
    let v = run(src);
    assert!(matches!(v, Value::Number(n) if n == 15.0));
}

#[test]
fn object_and_array_builtins_compose() {
    let src = "\
o = objectNew('name', 'ada', 'age', 36)
keys = objectKeys(o)
return arrayJoin(keys, ',')";
    let v = run(src);
    assert!(matches!(v, Value::String(ref s) if s == "name,age"));
}
