//! Numeric/math built-ins (§4.3 "Numeric/math").

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;

fn num(function: &str, args: &[Value], i: usize) -> Result<f64, RuntimeError> {
    args.get(i)
        .and_then(Value::as_number)
        .ok_or_else(|| RuntimeError::type_mismatch(function, "number", args.get(i).unwrap_or(&Value::Null), i))
}

macro_rules! unary_fn {
    ($name:ident, $fname:expr, $op:expr) => {
        pub fn $name(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
            let x = num($fname, args, 0)?;
            Ok(Value::Number(($op)(x)))
        }
    };
}

unary_fn!(abs, "abs", f64::abs);
unary_fn!(acos, "acos", f64::acos);
unary_fn!(asin, "asin", f64::asin);
unary_fn!(atan, "atan", f64::atan);
unary_fn!(ceil, "ceil", f64::ceil);
unary_fn!(cos, "cos", f64::cos);
unary_fn!(floor, "floor", f64::floor);
unary_fn!(ln, "ln", f64::ln);
unary_fn!(log10, "log10", f64::log10);
unary_fn!(sin, "sin", f64::sin);
unary_fn!(sqrt, "sqrt", f64::sqrt);
unary_fn!(tan, "tan", f64::tan);

pub fn atan2(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(num("atan2", args, 0)?.atan2(num("atan2", args, 1)?)))
}

pub fn log(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let x = num("log", args, 0)?;
    match args.get(1) {
        Some(_) => Ok(Value::Number(x.log(num("log", args, 1)?))),
        None => Ok(Value::Number(x.ln())),
    }
}

pub fn max(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::arity("max", "at least 1", 0));
    }
    let mut best = args[0].clone();
    for a in &args[1..] {
        if crate::value::compare_values(a, &best) == std::cmp::Ordering::Greater {
            best = a.clone();
        }
    }
    Ok(best)
}

pub fn min(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if args.is_empty() {
        return Err(RuntimeError::arity("min", "at least 1", 0));
    }
    let mut best = args[0].clone();
    for a in &args[1..] {
        if crate::value::compare_values(a, &best) == std::cmp::Ordering::Less {
            best = a.clone();
        }
    }
    Ok(best)
}

pub fn pi(_interp: &mut Interpreter, _args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(std::f64::consts::PI))
}

/// Linear congruential generator seeded from the process so repeated calls
/// within one execution diverge; `rand` is a documented source of
/// nondeterminism (§8 "Determinism").
pub fn rand(_interp: &mut Interpreter, _args: &[Value]) -> Result<Value, RuntimeError> {
    use std::cell::Cell;
    thread_local! {
        static STATE: Cell<u64> = Cell::new(0x9E3779B97F4A7C15);
    }
    let next = STATE.with(|s| {
        let mut x = s.get();
        x ^= x << 13;
        x ^= x >> 7;
        x ^= x << 17;
        s.set(x);
        x
    });
    Ok(Value::Number((next >> 11) as f64 / (1u64 << 53) as f64))
}

pub fn round(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let x = num("round", args, 0)?;
    let digits = match args.get(1) {
        Some(v) => v.as_number().unwrap_or(0.0) as i32,
        None => 0,
    };
    let factor = 10f64.powi(digits);
    Ok(Value::Number((x * factor).round() / factor))
}

pub fn sign(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let x = num("sign", args, 0)?;
    Ok(Value::Number(if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        0.0
    }))
}

pub fn fixed(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let x = num("fixed", args, 0)?;
    let decimals = match args.get(1) {
        Some(v) => v.as_number().unwrap_or(2.0) as usize,
        None => 2,
    };
    Ok(Value::String(format!("{:.*}", decimals, x)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ExecOptions;
    use indexmap::IndexMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn interp<'a>(options: &'a ExecOptions) -> Interpreter<'a> {
        Interpreter::new(Rc::new(RefCell::new(IndexMap::new())), options)
    }

    #[test]
    fn round_respects_decimals() {
        let options = ExecOptions::new();
        let mut i = interp(&options);
        let v = round(&mut i, &[Value::Number(3.14159), Value::Number(2.0)]).unwrap();
        assert!(matches!(v, Value::Number(n) if (n - 3.14).abs() < 1e-9));
    }

    #[test]
    fn max_uses_total_order() {
        let options = ExecOptions::new();
        let mut i = interp(&options);
        let v = max(&mut i, &[Value::Number(1.0), Value::Number(5.0), Value::Number(3.0)]).unwrap();
        assert!(matches!(v, Value::Number(n) if n == 5.0));
    }

    #[test]
    fn fixed_formats_as_string() {
        let options = ExecOptions::new();
        let mut i = interp(&options);
        let v = fixed(&mut i, &[Value::Number(1.5)]).unwrap();
        assert!(matches!(v, Value::String(s) if s == "1.50"));
    }
}
