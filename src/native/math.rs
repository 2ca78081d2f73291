//! Unary/binary floating-point math natives and `random_int`, registered as
//! a flat table of one/two-argument functions — grounded in the original's
//! templated `NativeMath1ArgCallable`/`NativeMath2ArgsCallable` and
//! `UniformRandomIntegerCallable`
//! (`original_source/src/native_func_math.hpp`).

use rand::Rng;

use crate::{common::Value, vm::{trace::Trace, vm::VM}};

fn require_number(vm: &VM, v: &Value, who: &str) -> Result<f64, Trace> {
    match v {
        Value::Number(n) => Ok(*n),
        other => Err(vm.runtime_error(format!("{who}() argument must be a number, got {}", other.type_name()))),
    }
}

/// Registers a 1-argument `f64 -> f64` native under `name`.
pub fn unary(vm: &mut VM, name: &'static str, f: fn(f64) -> f64) {
    vm.define_native(name, 1, move |vm, args| {
        let a = require_number(vm, &args[0], name)?;
        Ok(Value::Number(f(a)))
    });
}

/// Registers a 2-argument `(f64, f64) -> f64` native under `name`.
pub fn binary(vm: &mut VM, name: &'static str, f: fn(f64, f64) -> f64) {
    vm.define_native(name, 2, move |vm, args| {
        let a = require_number(vm, &args[0], name)?;
        let b = require_number(vm, &args[1], name)?;
        Ok(Value::Number(f(a, b)))
    });
}

pub fn random_int(vm: &mut VM, args: &[Value]) -> Result<Value, Trace> {
    let a = require_number(vm, &args[0], "random_int")?;
    let b = require_number(vm, &args[1], "random_int")?;
    let n = require_number(vm, &args[2], "random_int")?;
    if a.fract() != 0.0 || b.fract() != 0.0 || n.fract() != 0.0 {
        return Err(vm.runtime_error("random_int needs three integer numbers"));
    }
    if a >= b {
        return Err(vm.runtime_error("random_int(a, b, n): a should be less than b"));
    }
    if n < 1.0 {
        return Err(vm.runtime_error("random_int(a, b, n): n cannot be less than 1"));
    }
    let (lo, hi, count) = (a as i64, b as i64, n as i64);
    let mut rng = rand::thread_rng();
    let results = (0..count).map(|_| Value::Number(rng.gen_range(lo..=hi) as f64)).collect();
    Ok(Value::array(results))
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn sqrt_of_four() {
        let vm = VM::new();
        let result = require_number(&vm, &Value::Number(4.0), "sqrt").map(f64::sqrt).unwrap();
        assert_eq!(result, 2.0);
    }

    #[test]
    fn random_int_rejects_empty_range() {
        let mut vm = VM::new();
        let err = random_int(&mut vm, &[Value::Number(5.0), Value::Number(5.0), Value::Number(1.0)]);
        assert!(err.is_err());
    }

    #[test]
    fn random_int_stays_in_bounds() {
        let mut vm = VM::new();
        let result = random_int(&mut vm, &[Value::Number(1.0), Value::Number(3.0), Value::Number(20.0)]).unwrap();
        if let Value::Array(a) = result {
            for v in a.borrow().iter() {
                let n = match v { Value::Number(n) => *n, _ => panic!("expected number") };
                assert!((1.0..=3.0).contains(&n));
            }
        } else {
            panic!("expected array");
        }
    }
}
