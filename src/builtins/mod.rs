//! The standard library (§4.3 "Built-in library (minimum set, grouped)").
//!
//! Each submodule owns one category; `register_builtins` installs every
//! entry into `globals` as a `Value::Builtin`, skipping names the caller
//! already bound so a host may override any of them ahead of execution.

pub mod array;
pub mod datetime;
pub mod env_ops;
pub mod host_ops;
pub mod math;
pub mod object;
pub mod text;

use indexmap::IndexMap;
use std::cell::RefCell;
use std::rc::Rc;

use crate::value::{BuiltinFn, Value};

const TABLE: &[(&str, BuiltinFn)] = &[
    // Numeric/math
    ("abs", math::abs),
    ("acos", math::acos),
    ("asin", math::asin),
    ("atan", math::atan),
    ("atan2", math::atan2),
    ("ceil", math::ceil),
    ("cos", math::cos),
    ("floor", math::floor),
    ("ln", math::ln),
    ("log", math::log),
    ("log10", math::log10),
    ("max", math::max),
    ("min", math::min),
    ("pi", math::pi),
    ("rand", math::rand),
    ("round", math::round),
    ("sign", math::sign),
    ("sin", math::sin),
    ("sqrt", math::sqrt),
    ("tan", math::tan),
    ("fixed", math::fixed),
    // Text
    ("len", text::len),
    ("lower", text::lower),
    ("upper", text::upper),
    ("trim", text::trim),
    ("replace", text::replace),
    ("rept", text::rept),
    ("slice", text::slice),
    ("indexOf", text::index_of),
    ("text", text::text),
    ("encodeURIComponent", text::encode_uri_component),
    // Date-time
    ("date", datetime::date),
    ("day", datetime::day),
    ("month", datetime::month),
    ("hour", datetime::hour),
    ("minute", datetime::minute),
    ("second", datetime::second),
    ("year", datetime::year),
    ("now", datetime::now),
    ("today", datetime::today),
    // Array
    ("arrayNew", array::array_new),
    ("arrayNewArgs", array::array_new_args),
    ("arraySize", array::array_size),
    ("arrayCopy", array::array_copy),
    ("arrayGet", array::array_get),
    ("arraySet", array::array_set),
    ("arrayPush", array::array_push),
    ("arrayIndexOf", array::array_index_of),
    ("arrayJoin", array::array_join),
    ("arrayLength", array::array_length),
    ("arraySplit", array::array_split),
    // Object
    ("objectNew", object::object_new),
    ("objectCopy", object::object_copy),
    ("objectKeys", object::object_keys),
    ("objectGet", object::object_get),
    ("objectSet", object::object_set),
    ("objectDelete", object::object_delete),
    // Environment
    ("getGlobal", env_ops::get_global),
    ("setGlobal", env_ops::set_global),
    ("typeof", env_ops::type_of),
    // Host-provided
    ("debugLog", host_ops::debug_log),
    ("fetchText", host_ops::fetch_text),
    ("fetchJSON", host_ops::fetch_json),
];

/// Installs every standard-library entry into `globals` whose name isn't
/// already bound (§4.3 "Contract": "registers the standard library into
/// `globals` only if names are absent").
pub fn register_builtins(globals: &Rc<RefCell<IndexMap<String, Value>>>) {
    let mut map = globals.borrow_mut();
    for (name, func) in TABLE {
        map.entry((*name).to_string())
            .or_insert_with(|| Value::Builtin(name, *func));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_without_clobbering_existing_bindings() {
        let globals = Rc::new(RefCell::new(IndexMap::new()));
        globals.borrow_mut().insert("abs".to_string(), Value::Number(99.0));
        register_builtins(&globals);
        match globals.borrow().get("abs") {
            Some(Value::Number(n)) => assert_eq!(*n, 99.0),
            _ => panic!("expected caller override to survive"),
        }
        assert!(globals.borrow().contains_key("arrayLength"));
    }
}
