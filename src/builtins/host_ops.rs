//! Host-provided capability built-ins: `debugLog`, `fetchText`, `fetchJSON`
//! (§4.3 "Host-provided"). Routed through the `logFn`/`fetchFn` the caller
//! supplied in `ExecOptions`; dropped or Null when absent.

use crate::error::RuntimeError;
use crate::interpreter::Interpreter;
use crate::value::Value;

pub fn debug_log(interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    if let Some(logger) = &interp.options.logger {
        let text = args.first().map(|v| v.to_string()).unwrap_or_default();
        logger.log(&text);
    }
    Ok(Value::Null)
}

fn fetch_one(interp: &mut Interpreter, url: &str, options: Option<&Value>, want_json: bool) -> Value {
    match &interp.options.fetcher {
        None => Value::Null,
        Some(fetcher) => {
            let resp = fetcher.fetch(url, options);
            if !resp.ok {
                return Value::Null;
            }
            if want_json {
                resp.json.unwrap_or(Value::Null)
            } else {
                resp.text.map(Value::String).unwrap_or(Value::Null)
            }
        }
    }
}

fn fetch_many(interp: &mut Interpreter, args: &[Value], want_json: bool) -> Result<Value, RuntimeError> {
    let options = args.get(1);
    match args.first() {
        Some(Value::String(url)) => Ok(fetch_one(interp, url, options, want_json)),
        Some(Value::Array(urls)) => {
            let urls: Vec<String> = urls
                .borrow()
                .iter()
                .filter_map(|v| v.as_str().map(|s| s.to_string()))
                .collect();
            let results: Vec<Value> = urls
                .iter()
                .map(|u| fetch_one(interp, u, options, want_json))
                .collect();
            Ok(Value::array_new(results))
        }
        other => Err(RuntimeError::type_mismatch(
            if want_json { "fetchJSON" } else { "fetchText" },
            "string or array of strings",
            other.unwrap_or(&Value::Null),
            0,
        )),
    }
}

pub fn fetch_text(interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    fetch_many(interp, args, false)
}

pub fn fetch_json(interp: &mut Interpreter, args: &[Value]) -> Result<Value, RuntimeError> {
    fetch_many(interp, args, true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::host::{ExecOptions, FetchResponse, Fetcher};
    use indexmap::IndexMap;
    use std::cell::RefCell;
    use std::rc::Rc;

    struct StaticFetcher;
    impl Fetcher for StaticFetcher {
        fn fetch(&self, url: &str, _options: Option<&Value>) -> FetchResponse {
            if url == "ok" {
                FetchResponse {
                    ok: true,
                    text: Some("body".to_string()),
                    json: None,
                }
            } else {
                FetchResponse {
                    ok: false,
                    text: None,
                    json: None,
                }
            }
        }
    }

    #[test]
    fn fetch_text_returns_null_without_a_fetcher() {
        let options = ExecOptions::new();
        let mut i = Interpreter::new(Rc::new(RefCell::new(IndexMap::new())), &options);
        let v = fetch_text(&mut i, &[Value::String("ok".into())]).unwrap();
        assert!(matches!(v, Value::Null));
    }

    #[test]
    fn fetch_text_returns_body_when_ok() {
        let mut options = ExecOptions::new();
        options.fetcher = Some(Rc::new(StaticFetcher));
        let mut i = Interpreter::new(Rc::new(RefCell::new(IndexMap::new())), &options);
        let v = fetch_text(&mut i, &[Value::String("ok".into())]).unwrap();
        assert!(matches!(v, Value::String(s) if s == "body"));
    }

    #[test]
    fn failing_response_yields_null_not_error() {
        let mut options = ExecOptions::new();
        options.fetcher = Some(Rc::new(StaticFetcher));
        let mut i = Interpreter::new(Rc::new(RefCell::new(IndexMap::new())), &options);
        let v = fetch_text(&mut i, &[Value::String("missing".into())]).unwrap();
        assert!(matches!(v, Value::Null));
    }
}
