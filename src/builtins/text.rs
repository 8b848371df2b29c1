//! Text built-ins (§4.3 "Text").

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;

fn string_arg<'a>(function: &str, args: &'a [Value], i: usize) -> Result<&'a str, RuntimeError> {
    args.get(i)
        .and_then(Value::as_str)
        .ok_or_else(|| RuntimeError::type_mismatch(function, "string", args.get(i).unwrap_or(&Value::Null), i))
}

pub fn len(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::Number(string_arg("len", args, 0)?.chars().count() as f64))
}

pub fn lower(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::String(string_arg("lower", args, 0)?.to_lowercase()))
}

pub fn upper(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::String(string_arg("upper", args, 0)?.to_uppercase()))
}

pub fn trim(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::String(string_arg("trim", args, 0)?.trim().to_string()))
}

pub fn replace(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let s = string_arg("replace", args, 0)?;
    let old = string_arg("replace", args, 1)?;
    let new = string_arg("replace", args, 2)?;
    Ok(Value::String(s.replace(old, new)))
}

pub fn rept(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let s = string_arg("rept", args, 0)?;
    let n = args
        .get(1)
        .and_then(Value::as_number)
        .ok_or_else(|| RuntimeError::type_mismatch("rept", "number", args.get(1).unwrap_or(&Value::Null), 1))?;
    Ok(Value::String(s.repeat(n.max(0.0) as usize)))
}

pub fn slice(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let s = string_arg("slice", args, 0)?;
    let chars: Vec<char> = s.chars().collect();
    let len = chars.len() as f64;
    let a = args.get(1).and_then(Value::as_number).unwrap_or(0.0);
    let b = args.get(2).and_then(Value::as_number).unwrap_or(len);
    let start = clamp_index(a, len);
    let end = clamp_index(b, len).max(start);
    Ok(Value::String(chars[start..end].iter().collect()))
}

fn clamp_index(i: f64, len: f64) -> usize {
    let i = if i < 0.0 { (len + i).max(0.0) } else { i };
    i.min(len).max(0.0) as usize
}

pub fn index_of(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let s = string_arg("indexOf", args, 0)?;
    let find = string_arg("indexOf", args, 1)?;
    let start = args.get(2).and_then(Value::as_number).unwrap_or(0.0).max(0.0) as usize;
    let chars: Vec<char> = s.chars().collect();
    if start > chars.len() {
        return Ok(Value::Number(-1.0));
    }
    let haystack: String = chars[start..].iter().collect();
    match haystack.find(find) {
        Some(byte_idx) => {
            let char_idx = haystack[..byte_idx].chars().count();
            Ok(Value::Number((start + char_idx) as f64))
        }
        None => Ok(Value::Number(-1.0)),
    }
}

pub fn text(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    Ok(Value::String(
        args.first().map(|v| v.to_string()).unwrap_or_default(),
    ))
}

pub fn encode_uri_component(_interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    let s = string_arg("encodeURIComponent", args, 0)?;
    let mut out = String::with_capacity(s.len());
    for b in s.bytes() {
        match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(b as char)
            }
            _ => out.push_str(&format!("%{:02X}", b)),
        }
    }
    Ok(Value::String(out))
}
