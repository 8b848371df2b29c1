//! Date-time built-ins (§4.3 "Date-time").

use chrono::{Datelike, TimeZone, Timelike, Utc};

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;

fn as_datetime(function: &str, args: &[Value], i: usize) -> Result<chrono::DateTime<Utc>, RuntimeError> {
    match args.get(i) {
        Some(Value::DateTime(dt)) => Ok(*dt),
        other => Err(RuntimeError::type_mismatch(
            function,
            "datetime",
            other.unwrap_or(&Value::Null),
            i,
        )),
    }
}

fn as_int(args: &[Value], i: usize) -> i64 {
    args.get(i).and_then(Value::as_number).unwrap_or(0.0) as i64
}

/// `date(y, m, d)` with a 1-based month, per §4.3.
pub fn date(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let year = as_int(args, 0) as i32;
    let month = as_int(args, 1).max(1) as u32;
    let day = as_int(args, 2).max(1) as u32;
    let dt = Utc
        .with_ymd_and_hms(year, month, day, 0, 0, 0)
        .single()
        .ok_or_else(|| RuntimeError::Custom(format!("invalid date {}-{}-{}", year, month, day)))?;
    Ok(Value::DateTime(dt))
}

pub fn day(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(as_datetime("day", args, 0)?.day() as f64))
}

pub fn month(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(as_datetime("month", args, 0)?.month() as f64))
}

pub fn year(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(as_datetime("year", args, 0)?.year() as f64))
}

pub fn hour(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(as_datetime("hour", args, 0)?.hour() as f64))
}

pub fn minute(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(as_datetime("minute", args, 0)?.minute() as f64))
}

pub fn second(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(as_datetime("second", args, 0)?.second() as f64))
}

/// `now()`, the current instant; documented source of nondeterminism (§8).
pub fn now(_interp: &mut Interpreter, _args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::DateTime(Utc::now()))
}

/// `today()`, the current date at midnight UTC.
pub fn today(_interp: &mut Interpreter, _args: &[Value]) -> Result<Value, RuntimeError> {
    let now = Utc::now();
    let midnight = Utc
        .with_ymd_and_hms(now.year(), now.month(), now.day(), 0, 0, 0)
        .single()
        .unwrap();
    Ok(Value::DateTime(midnight))
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
    fn date_components_round_trip() {
        let options = ExecOptions::new();
        let mut i = interp(&options);
        let d = date(&mut i, &[Value::Number(2024.0), Value::Number(3.0), Value::Number(14.0)]).unwrap();
        assert!(matches!(year(&mut i, &[d.clone()]).unwrap(), Value::Number(n) if n == 2024.0));
        assert!(matches!(month(&mut i, &[d.clone()]).unwrap(), Value::Number(n) if n == 3.0));
        assert!(matches!(day(&mut i, &[d]).unwrap(), Value::Number(n) if n == 14.0));
    }
}
