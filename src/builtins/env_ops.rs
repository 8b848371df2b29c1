//! Environment built-ins: `getGlobal`/`setGlobal`/`typeof` (§4.3 "Environment").

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;

pub fn get_global(interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let name = args
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::type_mismatch("getGlobal", "string", args.first().unwrap_or(&Value::Null), 0))?;
    let hit = interp.globals.borrow().get(name).cloned();
    Ok(hit.unwrap_or(Value::Null))
}

pub fn set_global(interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let name = args
        .first()
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::type_mismatch("setGlobal", "string", args.first().unwrap_or(&Value::Null), 0))?
        .to_string();
    let value = args.get(1).cloned().unwrap_or(Value::Null);
    interp.globals.borrow_mut().insert(name, value.clone());
    Ok(value)
}

pub fn type_of(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::String(
        args.first().map(Value::type_name).unwrap_or("null").to_string(),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::ExecOptions;
    use indexmap::IndexMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn set_then_get_round_trips() {
        let options = ExecOptions::new();
        let mut i = Interpreter::new(Rc::new(RefCell::new(IndexMap::new())), &options);
        set_global(&mut i, &[Value::String("x".into()), Value::Number(3.0)]).unwrap();
        let v = get_global(&mut i, &[Value::String("x".into())]).unwrap();
        assert!(matches!(v, Value::Number(n) if n == 3.0));
    }

    #[test]
    fn type_of_reports_type_name() {
        let options = ExecOptions::new();
        let mut i = Interpreter::new(Rc::new(RefCell::new(IndexMap::new())), &options);
        let v = type_of(&mut i, &[Value::Bool(true)]).unwrap();
        assert!(matches!(v, Value::String(s) if s == "boolean"));
    }
}
