//! Array/map utilities with no direct opcode: `len`, `push`, `pop`,
//! `for_each`, `keys`.

use crate::{
    common::Value,
    vm::{trace::Trace, vm::VM},
};

pub fn len(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    match &args[0] {
        Value::Array(a) => Ok(Value::Number(a.borrow().len() as f64)),
        Value::Map(m) => Ok(Value::Number(m.borrow().len() as f64)),
        Value::Str(s) => Ok(Value::Number(s.chars().count() as f64)),
        other => Err(vm.runtime_error(format!("len() argument must be a string, array, or map, got {}", other.type_name()))),
    }
}

pub fn push(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    match &args[0] {
        Value::Array(a) => {
            a.borrow_mut().push(args[1].clone());
            Ok(args[1].clone())
        },
        other => Err(vm.runtime_error(format!("push(array, v) requires an array, got {}", other.type_name()))),
    }
}

pub fn pop(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    match &args[0] {
        Value::Array(a) => a.borrow_mut().pop().ok_or_else(|| vm.runtime_error("pop() called on an empty array")),
        other => Err(vm.runtime_error(format!("pop(array) requires an array, got {}", other.type_name()))),
    }
}

pub fn keys(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    match &args[0] {
        Value::Map(m) => Ok(Value::array(m.borrow().keys().cloned().collect())),
        other => Err(vm.runtime_error(format!("keys(map) requires a map, got {}", other.type_name()))),
    }
}

/// Re-enters the VM once per (key, value) pair to invoke the callback,
/// mirroring the original's `context->callFunction(f, {it.first, it.second})`.
pub fn for_each(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    let map = match &args[0] {
        Value::Map(m) => m.clone(),
        other => return Err(vm.runtime_error(format!("for_each(m, f) requires a map, got {}", other.type_name()))),
    };
    let callback = match &args[1] {
        Value::Callable(c) => {
            if c.arity() != 2 {
                return Err(vm.runtime_error("for_each(m, f): f must take 2 arguments (key, value)"));
            }
            args[1].clone()
        },
        other => return Err(vm.runtime_error(format!("for_each(m, f): f must be a function, got {}", other.type_name()))),
    };
    let pairs: Vec<(Value, Value)> = map.borrow().iter().map(|(k, v)| (k.clone(), v.clone())).collect();
    for (k, v) in pairs {
        vm.call_function(callback.clone(), &[k, v])?;
    }
    Ok(Value::Nil)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn push_and_pop_round_trip() {
        let mut vm = VM::new();
        let array = Value::array(vec![Value::Number(1.0)]);
        push(&mut vm, &[array.clone(), Value::Number(2.0)]).unwrap();
        assert!(matches!(len(&mut vm, &[array.clone()]).unwrap(), Value::Number(n) if n == 2.0));
        let popped = pop(&mut vm, &[array]).unwrap();
        assert!(matches!(popped, Value::Number(n) if n == 2.0));
    }

    #[test]
    fn len_rejects_non_container() {
        let mut vm = VM::new();
        assert!(len(&mut vm, &[Value::Bool(true)]).is_err());
    }
}
