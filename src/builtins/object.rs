//! Object built-ins (§4.3 "Object").

use indexmap::IndexMap;

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::{Object, Value};

fn as_object(function: &str, args: &[Value], i: usize) -> Result<Object, RuntimeError> {
    match args.get(i) {
        Some(Value::Object(o)) => Ok(o.clone()),
        other => Err(RuntimeError::type_mismatch(
            function,
            "object",
            other.unwrap_or(&Value::Null),
            i,
        )),
    }
}

/// `objectNew(key, value, key, value, ...)` builds an object from alternating
/// key/value arguments, preserving the order given.
pub fn object_new(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let mut map = IndexMap::new();
    let mut pairs = args.chunks(2);
    for pair in &mut pairs {
        let key = pair
            .first()
            .and_then(Value::as_str)
            .ok_or_else(|| RuntimeError::type_mismatch("objectNew", "string key", pair.first().unwrap_or(&Value::Null), 0))?;
        let value = pair.get(1).cloned().unwrap_or(Value::Null);
        map.insert(key.to_string(), value);
    }
    Ok(Value::object_new(map))
}

pub fn object_copy(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let obj = as_object("objectCopy", args, 0)?;
    Ok(Value::object_new(obj.borrow().clone()))
}

pub fn object_keys(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let obj = as_object("objectKeys", args, 0)?;
    let keys = obj
        .borrow()
        .keys()
        .map(|k| Value::String(k.clone()))
        .collect();
    Ok(Value::array_new(keys))
}

pub fn object_get(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let obj = as_object("objectGet", args, 0)?;
    let key = args
        .get(1)
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::type_mismatch("objectGet", "string", args.get(1).unwrap_or(&Value::Null), 1))?;
    let default = args.get(2).cloned().unwrap_or(Value::Null);
    Ok(obj.borrow().get(key).cloned().unwrap_or(default))
}

pub fn object_set(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let obj = as_object("objectSet", args, 0)?;
    let key = args
        .get(1)
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::type_mismatch("objectSet", "string", args.get(1).unwrap_or(&Value::Null), 1))?;
    let value = args.get(2).cloned().unwrap_or(Value::Null);
    obj.borrow_mut().insert(key.to_string(), value);
    Ok(Value::Null)
}

pub fn object_delete(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let obj = as_object("objectDelete", args, 0)?;
    let key = args
        .get(1)
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::type_mismatch("objectDelete", "string", args.get(1).unwrap_or(&Value::Null), 1))?;
    obj.borrow_mut().shift_remove(key);
    Ok(Value::Null)
}
