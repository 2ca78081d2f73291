//! JSON interchange: `from_json`/`to_json` map JSON null/bool/number/string
//! /array/object onto `Nil`/`Bool`/`Number`/`Str`/`Array`/`Map` (object keys
//! must be strings), built on `serde_json` rather than a hand-rolled parser.

use serde_json::Value as Json;

use crate::{
    common::{value::ValueMap, Value},
    vm::{trace::Trace, vm::VM},
};

fn json_to_value(json: &Json) -> Value {
    match json {
        Json::Null => Value::Nil,
        Json::Bool(b) => Value::Bool(*b),
        Json::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
        Json::String(s) => Value::string(s.clone()),
        Json::Array(items) => Value::array(items.iter().map(json_to_value).collect()),
        Json::Object(entries) => {
            let mut map = ValueMap::new();
            for (key, value) in entries {
                map.set(Value::string(key.clone()), json_to_value(value));
            }
            Value::map(map)
        },
    }
}

fn value_to_json(vm: &VM, value: &Value) -> Result<Json, Trace> {
    Ok(match value {
        Value::Nil => Json::Null,
        Value::Bool(b) => Json::Bool(*b),
        Value::Number(n) => serde_json::Number::from_f64(*n).map(Json::Number).unwrap_or(Json::Null),
        Value::Str(s) => Json::String(s.to_string()),
        Value::Array(a) => {
            let mut items = Vec::with_capacity(a.borrow().len());
            for item in a.borrow().iter() {
                items.push(value_to_json(vm, item)?);
            }
            Json::Array(items)
        },
        Value::Map(m) => {
            let mut object = serde_json::Map::new();
            for (key, v) in m.borrow().iter() {
                let key_str = match key {
                    Value::Str(s) => s.to_string(),
                    Value::Number(n) => n.to_string(),
                    Value::Bool(b) => b.to_string(),
                    Value::Nil => "nil".to_string(),
                    other => return Err(vm.runtime_error(format!(
                        "unsupported map key type for JSON serialization: {}", other.type_name()
                    ))),
                };
                object.insert(key_str, value_to_json(vm, v)?);
            }
            Json::Object(object)
        },
        Value::Callable(_) => return Err(vm.runtime_error("cannot serialize a function to JSON")),
    })
}

pub fn from_json(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    let text = match &args[0] {
        Value::Str(s) => s,
        other => return Err(vm.runtime_error(format!("from_json() requires a string, got {}", other.type_name()))),
    };
    let parsed: Json = serde_json::from_str(text)
        .map_err(|e| vm.runtime_error(format!("from_json(): {e}")))?;
    Ok(json_to_value(&parsed))
}

pub fn to_json(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    let json = value_to_json(vm, &args[0])?;
    Ok(Value::string(json.to_string()))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn round_trips_arrays_and_objects() {
        let mut vm = VM::new();
        let source = r#"{"a": [1, 2, "x"], "b": null, "c": true}"#;
        let value = from_json(&mut vm, &[Value::string(source)]).unwrap();
        let back = to_json(&mut vm, &[value]).unwrap();
        let reparsed = from_json(&mut vm, &[back]).unwrap();
        match reparsed {
            Value::Map(m) => assert_eq!(m.borrow().len(), 3),
            _ => panic!("expected map"),
        }
    }

    #[test]
    fn from_json_rejects_non_string() {
        let mut vm = VM::new();
        assert!(from_json(&mut vm, &[Value::Number(1.0)]).is_err());
    }

    #[test]
    fn to_json_rejects_callables() {
        let mut vm = VM::new();
        let native = crate::common::value::NativeFunction {
            name: "noop",
            arity: 0,
            function: Box::new(|_, _| Ok(Value::Nil)),
        };
        let callable = Value::Callable(std::rc::Rc::new(crate::common::value::Callable::Native(native)));
        assert!(to_json(&mut vm, &[callable]).is_err());
    }
}
