//! Array built-ins (§4.3 "Array").

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::{values_equal, Array, Value};

fn as_array(function: &str, args: &[Value], i: usize) -> Result<Array, RuntimeError> {
    match args.get(i) {
        Some(Value::Array(a)) => Ok(a.clone()),
        other => Err(RuntimeError::type_mismatch(
            function,
            "array",
            other.unwrap_or(&Value::Null),
            i,
        )),
    }
}

/// `arrayNew(size=0, fill=0)` creates a fresh array of `size` elements, each
/// set to `fill`.
pub fn array_new(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let size = args.first().and_then(Value::as_number).unwrap_or(0.0).max(0.0) as usize;
    let fill = args.get(1).cloned().unwrap_or(Value::Number(0.0));
    Ok(Value::array_new(vec![fill; size]))
}

/// `arrayNewArgs(...args)` builds an array directly from its arguments, used
/// for array literals in expression position (§8 scenario 2).
pub fn array_new_args(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::array_new(args.to_vec()))
}

/// `arraySize(array, size=0, fill=0)` resizes an existing array in place,
/// padding with `fill` when growing, and returns it.
pub fn array_size(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let arr = as_array("arraySize", args, 0)?;
    let size = args.get(1).and_then(Value::as_number).unwrap_or(0.0).max(0.0) as usize;
    let fill = args.get(2).cloned().unwrap_or(Value::Number(0.0));
    let mut items = arr.borrow_mut();
    if size < items.len() {
        items.truncate(size);
    } else {
        while items.len() < size {
            items.push(fill.clone());
        }
    }
    drop(items);
    Ok(Value::Array(arr))
}

pub fn array_copy(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let arr = as_array("arrayCopy", args, 0)?;
    Ok(Value::array_new(arr.borrow().clone()))
}

pub fn array_get(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let arr = as_array("arrayGet", args, 0)?;
    let idx = args.get(1).and_then(Value::as_number).unwrap_or(-1.0);
    if idx < 0.0 {
        return Ok(Value::Null);
    }
    Ok(arr.borrow().get(idx as usize).cloned().unwrap_or(Value::Null))
}

pub fn array_set(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let arr = as_array("arraySet", args, 0)?;
    let idx = args.get(1).and_then(Value::as_number).unwrap_or(0.0).max(0.0) as usize;
    let value = args.get(2).cloned().unwrap_or(Value::Null);
    let mut items = arr.borrow_mut();
    while items.len() <= idx {
        items.push(Value::Null);
    }
    items[idx] = value;
    Ok(Value::Null)
}

pub fn array_push(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let arr = as_array("arrayPush", args, 0)?;
    for value in &args[1.min(args.len())..] {
        arr.borrow_mut().push(value.clone());
    }
    let len = arr.borrow().len();
    Ok(Value::Number(len as f64))
}

pub fn array_index_of(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let arr = as_array("arrayIndexOf", args, 0)?;
    let needle = args.get(1).cloned().unwrap_or(Value::Null);
    let start = args.get(2).and_then(Value::as_number).unwrap_or(0.0).max(0.0) as usize;
    let items = arr.borrow();
    for (i, item) in items.iter().enumerate().skip(start) {
        if values_equal(item, &needle) {
            return Ok(Value::Number(i as f64));
        }
    }
    Ok(Value::Number(-1.0))
}

pub fn array_join(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let arr = as_array("arrayJoin", args, 0)?;
    let sep = args.get(1).and_then(Value::as_str).unwrap_or("");
    let joined = arr
        .borrow()
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join(sep);
    Ok(Value::String(joined))
}

pub fn array_length(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let arr = as_array("arrayLength", args, 0)?;
    Ok(Value::Number(arr.borrow().len() as f64))
}

pub fn array_split(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let s = args
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::type_mismatch("arraySplit", "string", args.first().unwrap_or(&Value::Null), 0))?;
    let sep = args.get(1).and_then(Value::as_str).unwrap_or("");
    let parts: Vec<Value> = if sep.is_empty() {
        s.chars().map(|c| Value::String(c.to_string())).collect()
    } else {
        s.split(sep).map(|p| Value::String(p.to_string())).collect()
    };
    Ok(Value::array_new(parts))
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
    fn new_args_builds_array_from_arguments() {
        let options = ExecOptions::new();
        let mut i = interp(&options);
        let v = array_new_args(&mut i, &[Value::Number(1.0), Value::Number(2.0)]).unwrap();
        match v {
            Value::Array(a) => assert_eq!(a.borrow().len(), 2),
            _ => panic!("expected array"),
        }
    }

    #[test]
    fn push_returns_new_length() {
        let options = ExecOptions::new();
        let mut i = interp(&options);
        let arr = array_new(&mut i, &[]).unwrap();
        let len = array_push(&mut i, &[arr, Value::Number(9.0)]).unwrap();
        assert!(matches!(len, Value::Number(n) if n == 1.0));
    }

    #[test]
    fn get_out_of_bounds_is_null() {
        let options = ExecOptions::new();
        let mut i = interp(&options);
        let arr = array_new_args(&mut i, &[Value::Number(1.0)]).unwrap();
        let v = array_get(&mut i, &[arr, Value::Number(5.0)]).unwrap();
        assert!(matches!(v, Value::Null));
    }

    #[test]
    fn aliased_arrays_observe_mutation() {
        let options = ExecOptions::new();
        let mut i = interp(&options);
        let arr = array_new_args(&mut i, &[Value::Number(1.0)]).unwrap();
        let alias = arr.clone();
        array_push(&mut i, &[arr, Value::Number(2.0)]).unwrap();
        let len = array_length(&mut i, &[alias]).unwrap();
        assert!(matches!(len, Value::Number(n) if n == 2.0));
    }
}
