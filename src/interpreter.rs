// ABOUTME: Statement-list interpreter: label resolution, dispatch, statement budget (§4.3)

use indexmap::IndexMap;
use std::cell::RefCell;
use std::collections::HashSet;
use std::rc::Rc;

use crate::ast::{BinaryOp, Expression, IncludeEntry, Script, Statement, UnaryOp};
use crate::error::RuntimeError;
use crate::host::ExecOptions;
use crate::value::{compare_values, values_equal, ScriptFunction, Value};

/// A statement list (function body or script top level) plus its lazily
/// memoized label index (§9 "Flat statement list + labels").
pub struct Body {
    pub statements: Vec<Statement>,
    /// `None` for the script top level, `Some(function name)` inside a
    /// function body — used only to phrase "unknown label" errors.
    scope_name: Option<String>,
    label_cache: RefCell<Option<IndexMap<String, usize>>>,
}

impl Body {
    pub fn new(statements: Vec<Statement>, scope_name: Option<String>) -> Self {
        Body {
            statements,
            scope_name,
            label_cache: RefCell::new(None),
        }
    }

    fn label_index(&self, label: &str) -> Option<usize> {
        let mut cache = self.label_cache.borrow_mut();
        if cache.is_none() {
            let mut map = IndexMap::new();
            for (i, stmt) in self.statements.iter().enumerate() {
                if let Statement::Label { name } = stmt {
                    map.entry(name.clone()).or_insert(i);
                }
            }
            *cache = Some(map);
        }
        cache.as_ref().unwrap().get(label).copied()
    }

    fn scope_label(&self) -> String {
        self.scope_name.clone().unwrap_or_else(|| "global".to_string())
    }
}

/// Registers the standard library and runs `script` against `globals`
/// (§4.3 "Contract"). Built-ins are installed only for names not already
/// present, so a caller may override any of them ahead of time.
pub fn execute(
    script: &Script,
    globals: Rc<RefCell<IndexMap<String, Value>>>,
    options: &ExecOptions,
) -> Result<Value, RuntimeError> {
    crate::builtins::register_builtins(&globals);
    let body = Rc::new(Body::new(script.statements.clone(), None));
    let mut interp = Interpreter::new(globals, options);
    interp.run_body(&body, None)
}

pub struct Interpreter<'a> {
    pub globals: Rc<RefCell<IndexMap<String, Value>>>,
    pub options: &'a ExecOptions,
    pub statement_count: u64,
    /// URLs already spliced in, keyed by resolved URL (§6 "deduplicate by URL").
    included: HashSet<String>,
    /// URLs currently being resolved, to terminate circular inclusion (§6).
    including: Vec<String>,
}

impl<'a> Interpreter<'a> {
    pub fn new(globals: Rc<RefCell<IndexMap<String, Value>>>, options: &'a ExecOptions) -> Self {
        Interpreter {
            globals,
            options,
            statement_count: 0,
            included: HashSet::new(),
            including: Vec::new(),
        }
    }

    pub fn run_body(
        &mut self,
        body: &Rc<Body>,
        mut locals: Option<&mut IndexMap<String, Value>>,
    ) -> Result<Value, RuntimeError> {
        let mut ix = 0usize;
        loop {
            if ix >= body.statements.len() {
                return Ok(Value::Null);
            }
            self.statement_count += 1;
            if self.options.max_statements != 0 && self.statement_count > self.options.max_statements
            {
                return Err(RuntimeError::StatementBudgetExceeded(self.options.max_statements));
            }
            match &body.statements[ix] {
                Statement::Label { .. } => ix += 1,
                Statement::Expr { name, expr } => {
                    let value = self.eval_expr(expr, locals.as_deref())?;
                    if let Some(n) = name {
                        match locals.as_deref_mut() {
                            Some(l) => {
                                l.insert(n.clone(), value);
                            }
                            None => {
                                self.globals.borrow_mut().insert(n.clone(), value);
                            }
                        }
                    }
                    ix += 1;
                }
                Statement::Jump { label, expr } => {
                    let do_jump = match expr {
                        None => true,
                        Some(e) => self.eval_expr(e, locals.as_deref())?.is_truthy(),
                    };
                    if do_jump {
                        ix = body.label_index(label).ok_or_else(|| {
                            RuntimeError::UnknownLabel(body.scope_label(), label.clone())
                        })?;
                    } else {
                        ix += 1;
                    }
                }
                Statement::Return { expr } => {
                    return match expr {
                        None => Ok(Value::Null),
                        Some(e) => self.eval_expr(e, locals.as_deref()),
                    };
                }
                Statement::Function {
                    name,
                    args,
                    last_arg_array,
                    is_async,
                    statements,
                } => {
                    let func = ScriptFunction {
                        name: name.clone(),
                        args: args.clone(),
                        last_arg_array: *last_arg_array,
                        is_async: *is_async,
                        body: Rc::new(Body::new(statements.clone(), Some(name.clone()))),
                    };
                    self.globals
                        .borrow_mut()
                        .insert(name.clone(), Value::Function(Rc::new(func)));
                    ix += 1;
                }
                Statement::Include { includes } => {
                    self.run_includes(includes)?;
                    ix += 1;
                }
            }
        }
    }

    /// Resolves and splices in `Include` statements (§6 "IncludeResolver").
    /// A no-op when no resolver is configured (§4.3). Entries already
    /// resolved this execution are skipped (dedup by URL); an entry whose
    /// resolution is already in progress is skipped too, terminating
    /// circular inclusion rather than recursing forever.
    fn run_includes(&mut self, includes: &[IncludeEntry]) -> Result<(), RuntimeError> {
        let resolver = match &self.options.resolver {
            Some(r) => r.clone(),
            None => return Ok(()),
        };
        let base_url = self.options.base_url.clone();
        for entry in includes {
            if self.included.contains(&entry.url) || self.including.contains(&entry.url) {
                continue;
            }
            let text = match resolver.resolve(&entry.url, entry.system, &base_url) {
                Some(t) => t,
                None => continue,
            };
            self.including.push(entry.url.clone());
            let parsed = crate::script_parser::parse_script(&text, 1);
            let result = match parsed {
                Ok(script) => {
                    let body = Rc::new(Body::new(script.statements, None));
                    self.run_body(&body, None).map(|_| ())
                }
                Err(e) => Err(RuntimeError::Custom(format!(
                    "include \"{}\": {}",
                    entry.url, e.message
                ))),
            };
            self.including.pop();
            result?;
            self.included.insert(entry.url.clone());
        }
        Ok(())
    }

    fn call_function(&mut self, func: &ScriptFunction, args: Vec<Value>) -> Result<Value, RuntimeError> {
        let mut locals: IndexMap<String, Value> = IndexMap::new();
        let n = func.args.len();
        if func.last_arg_array && n > 0 {
            for (i, pname) in func.args[..n - 1].iter().enumerate() {
                locals.insert(pname.clone(), args.get(i).cloned().unwrap_or(Value::Null));
            }
            let rest: Vec<Value> = if args.len() > n - 1 {
                args[n - 1..].to_vec()
            } else {
                Vec::new()
            };
            locals.insert(func.args[n - 1].clone(), Value::array_new(rest));
        } else {
            for (i, pname) in func.args.iter().enumerate() {
                locals.insert(pname.clone(), args.get(i).cloned().unwrap_or(Value::Null));
            }
        }
        self.run_body(&func.body, Some(&mut locals))
    }

    pub fn invoke(&mut self, callee: Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(f) => self.call_function(&f, args),
            Value::Builtin(_, f) => f(self, &args),
            _ => Err(RuntimeError::NotCallable),
        }
    }

    pub fn eval_expr(
        &mut self,
        expr: &Expression,
        locals: Option<&IndexMap<String, Value>>,
    ) -> Result<Value, RuntimeError> {
        match expr {
            Expression::Number { value } => Ok(Value::Number(*value)),
            Expression::Str { value } => Ok(Value::String(value.clone())),
            Expression::Variable { name } => {
                if name == "null" {
                    return Ok(Value::Null);
                }
                if let Some(l) = locals {
                    if let Some(v) = l.get(name) {
                        return Ok(v.clone());
                    }
                }
                let hit = self.globals.borrow().get(name).cloned();
                Ok(hit.unwrap_or(Value::Null))
            }
            Expression::Group { expr } => self.eval_expr(expr, locals),
            Expression::Unary { op, expr } => {
                let v = self.eval_expr(expr, locals)?;
                Ok(match op {
                    UnaryOp::Not => Value::Bool(!v.is_truthy()),
                    UnaryOp::Neg => Value::Number(-v.as_number().unwrap_or(f64::NAN)),
                })
            }
            Expression::Binary { op, left, right } => self.eval_binary(*op, left, right, locals),
            Expression::Function { name, args } => self.eval_call(name, args, locals),
        }
    }

    fn eval_binary(
        &mut self,
        op: BinaryOp,
        left: &Expression,
        right: &Expression,
        locals: Option<&IndexMap<String, Value>>,
    ) -> Result<Value, RuntimeError> {
        use std::cmp::Ordering;
        match op {
            BinaryOp::And => {
                let l = self.eval_expr(left, locals)?;
                if !l.is_truthy() {
                    return Ok(l);
                }
                self.eval_expr(right, locals)
            }
            BinaryOp::Or => {
                let l = self.eval_expr(left, locals)?;
                if l.is_truthy() {
                    return Ok(l);
                }
                self.eval_expr(right, locals)
            }
            BinaryOp::Eq | BinaryOp::Ne => {
                let l = self.eval_expr(left, locals)?;
                let r = self.eval_expr(right, locals)?;
                let eq = values_equal(&l, &r);
                Ok(Value::Bool(if op == BinaryOp::Eq { eq } else { !eq }))
            }
            BinaryOp::Lt | BinaryOp::Le | BinaryOp::Gt | BinaryOp::Ge => {
                let l = self.eval_expr(left, locals)?;
                let r = self.eval_expr(right, locals)?;
                let ord = compare_values(&l, &r);
                let result = match op {
                    BinaryOp::Lt => ord == Ordering::Less,
                    BinaryOp::Le => ord != Ordering::Greater,
                    BinaryOp::Gt => ord == Ordering::Greater,
                    BinaryOp::Ge => ord != Ordering::Less,
                    _ => unreachable!(),
                };
                Ok(Value::Bool(result))
            }
            BinaryOp::Add | BinaryOp::Sub | BinaryOp::Mul | BinaryOp::Div | BinaryOp::Mod
            | BinaryOp::Pow => {
                let l = self.eval_expr(left, locals)?;
                let r = self.eval_expr(right, locals)?;
                let a = l.as_number().unwrap_or(f64::NAN);
                let b = r.as_number().unwrap_or(f64::NAN);
                let v = match op {
                    BinaryOp::Add => a + b,
                    BinaryOp::Sub => a - b,
                    BinaryOp::Mul => a * b,
                    BinaryOp::Div => a / b,
                    BinaryOp::Mod => a % b,
                    BinaryOp::Pow => a.powf(b),
                    _ => unreachable!(),
                };
                Ok(Value::Number(v))
            }
        }
    }

    fn eval_call(
        &mut self,
        name: &str,
        args: &[Expression],
        locals: Option<&IndexMap<String, Value>>,
    ) -> Result<Value, RuntimeError> {
        if name == "if" {
            let cond = match args.first() {
                Some(e) => self.eval_expr(e, locals)?,
                None => Value::Null,
            };
            return if cond.is_truthy() {
                match args.get(1) {
                    Some(e) => self.eval_expr(e, locals),
                    None => Ok(Value::Null),
                }
            } else {
                match args.get(2) {
                    Some(e) => self.eval_expr(e, locals),
                    None => Ok(Value::Null),
                }
            };
        }

        let mut argv = Vec::with_capacity(args.len());
        for a in args {
            argv.push(self.eval_expr(a, locals)?);
        }

        let local_hit = locals.and_then(|l| l.get(name).cloned());
        if let Some(v) = local_hit {
            return self.invoke(v, argv);
        }
        let global_hit = self.globals.borrow().get(name).cloned();
        if let Some(v) = global_hit {
            return self.invoke(v, argv);
        }
        Err(RuntimeError::UndefinedFunction(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::script_parser::parse_script;

    fn run(src: &str) -> Result<Value, RuntimeError> {
        let script = parse_script(src, 1).unwrap();
        let globals = Rc::new(RefCell::new(IndexMap::new()));
        let options = ExecOptions::new();
        execute(&script, globals, &options)
    }

    #[test]
    fn for_each_sum_scenario() {
        let src = "total = 0\nfor v in arrayNewArgs(1, 2, 3, 4):\n    total = total + v\nendfor\nreturn total";
        let v = run(src).unwrap();
        assert!(matches!(v, Value::Number(n) if n == 10.0));
    }

    #[test]
    fn if_elif_else_scenario() {
        let src = "function grade(n):\n    if n >= 90:\n        return \"A\"\n    elif n >= 80:\n        return \"B\"\n    else:\n        return \"C\"\n    endif\nendfunction\nreturn grade(85)";
        let v = run(src).unwrap();
        assert!(matches!(v, Value::String(s) if s == "B"));
    }

    #[test]
    fn statement_budget_aborts() {
        let script = parse_script("while 1:\nendwhile", 1).unwrap();
        let globals = Rc::new(RefCell::new(IndexMap::new()));
        let mut options = ExecOptions::new();
        options.max_statements = 100;
        let err = execute(&script, globals, &options).unwrap_err();
        assert!(matches!(err, RuntimeError::StatementBudgetExceeded(100)));
    }

    #[test]
    fn undefined_function_errors() {
        let err = run("return undef()").unwrap_err();
        assert!(matches!(err, RuntimeError::UndefinedFunction(ref n) if n == "undef"));
    }

    #[test]
    fn unknown_variable_reads_as_null() {
        let v = run("return neverSet").unwrap();
        assert!(matches!(v, Value::Null));
    }

    struct MapResolver {
        sources: std::collections::HashMap<String, String>,
    }

    impl crate::host::IncludeResolver for MapResolver {
        fn resolve(&self, url: &str, _system: bool, _base_url: &str) -> Option<String> {
            self.sources.get(url).cloned()
        }
    }

    #[test]
    fn include_without_a_resolver_is_a_no_op() {
        let v = run("include 'lib.bs'\nreturn 1").unwrap();
        assert!(matches!(v, Value::Number(n) if n == 1.0));
    }

    #[test]
    fn include_splices_in_resolved_definitions() {
        let mut sources = std::collections::HashMap::new();
        sources.insert("lib.bs".to_string(), "function double(n):\n    return n * 2\nendfunction".to_string());
        let script = parse_script("include 'lib.bs'\nreturn double(21)", 1).unwrap();
        let globals = Rc::new(RefCell::new(IndexMap::new()));
        let mut options = ExecOptions::new();
        options.resolver = Some(Rc::new(MapResolver { sources }));
        let v = execute(&script, globals, &options).unwrap();
        assert!(matches!(v, Value::Number(n) if n == 42.0));
    }

    #[test]
    fn include_dedups_by_url() {
        let mut sources = std::collections::HashMap::new();
        sources.insert("lib.bs".to_string(), "count = count + 1".to_string());
        let script = parse_script(
            "count = 0\ninclude 'lib.bs'\ninclude 'lib.bs'\nreturn count",
            1,
        )
        .unwrap();
        let globals = Rc::new(RefCell::new(IndexMap::new()));
        let mut options = ExecOptions::new();
        options.resolver = Some(Rc::new(MapResolver { sources }));
        let v = execute(&script, globals, &options).unwrap();
        assert!(matches!(v, Value::Number(n) if n == 1.0));
    }

    #[test]
    fn circular_include_is_terminated() {
        let mut sources = std::collections::HashMap::new();
        sources.insert("a.bs".to_string(), "include 'b.bs'\nticks = ticks + 1".to_string());
        sources.insert("b.bs".to_string(), "include 'a.bs'\nticks = ticks + 1".to_string());
        let script = parse_script("ticks = 0\ninclude 'a.bs'\nreturn ticks", 1).unwrap();
        let globals = Rc::new(RefCell::new(IndexMap::new()));
        let mut options = ExecOptions::new();
        options.resolver = Some(Rc::new(MapResolver { sources }));
        // a.bs includes b.bs includes a.bs (skipped, in progress) then increments,
        // back in a.bs which increments once more: exactly two ticks, not infinite.
        let v = execute(&script, globals, &options).unwrap();
        assert!(matches!(v, Value::Number(n) if n == 2.0));
    }
}
