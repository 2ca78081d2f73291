//! Process-environment natives: the clock, stdin readers, `assert`, and
//! numeric coercion. Grounded in the original `ClockCallable`,
//! `ReadlineCallable`, `SlurpCallable`, `AssertCallable`, and
//! `ToNumberCallable` (`original_source/src/native_func.hpp`).

use std::time::{SystemTime, UNIX_EPOCH};

use crate::{common::Value, vm::{trace::Trace, vm::VM}};

pub fn clock(vm: &mut VM, _args: &[Value]) -> Result<Value, Trace> {
    let _ = vm;
    let now = SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default();
    Ok(Value::Number(now.as_secs_f64()))
}

/// Returns the sentinel `false` on EOF, per spec §6.
pub fn readline(vm: &mut VM, _args: &[Value]) -> Result<Value, Trace> {
    match vm.read_line() {
        Some(line) => Ok(Value::string(line)),
        None => Ok(Value::Bool(false)),
    }
}

pub fn slurp(vm: &mut VM, _args: &[Value]) -> Result<Value, Trace> {
    Ok(Value::string(vm.read_all()))
}

pub fn assert(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    if args[0].is_truthy() {
        Ok(Value::Nil)
    } else {
        Err(vm.runtime_error("assert failed"))
    }
}

pub fn tonumber(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    match &args[0] {
        Value::Number(n) => Ok(Value::Number(*n)),
        Value::Bool(b) => Ok(Value::Number(if *b { 1.0 } else { 0.0 })),
        Value::Str(s) => s.trim().parse::<f64>()
            .map(Value::Number)
            .map_err(|_| vm.runtime_error(format!("tonumber(): cannot parse '{s}' as a number"))),
        other => Err(vm.runtime_error(format!("tonumber() cannot convert a {}", other.type_name()))),
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn assert_true_is_a_no_op() {
        let mut vm = VM::new();
        assert!(matches!(assert(&mut vm, &[Value::Bool(true)]), Ok(Value::Nil)));
    }

    #[test]
    fn assert_false_errors() {
        let mut vm = VM::new();
        assert!(assert(&mut vm, &[Value::Bool(false)]).is_err());
    }

    #[test]
    fn tonumber_parses_strings() {
        let mut vm = VM::new();
        let result = tonumber(&mut vm, &[Value::string("3.5")]).unwrap();
        assert!(matches!(result, Value::Number(n) if n == 3.5));
    }
}
