//! The fixed table of built-in functions installed into every VM's globals
//! before execution, split by concern: `native::{io, array, math, json,
//! format}`, each exposing a `register(vm)` called once from `install`.

pub mod array;
pub mod format;
pub mod io;
pub mod json;
pub mod math;

use crate::vm::vm::VM;

/// Installs every native function into `vm`'s global table. Called once,
/// from `VM::with_io`.
pub fn install(vm: &mut VM) {
    vm.define_native("clock", 0, io::clock);
    vm.define_native("readline", 0, io::readline);
    vm.define_native("slurp", 0, io::slurp);
    vm.define_native("assert", 1, io::assert);
    vm.define_native("tonumber", 1, io::tonumber);

    vm.define_native("printf", -1, format::printf);
    vm.define_native("sprintf", -1, format::sprintf);
    vm.define_native("split", 2, format::split);
    vm.define_native("substring", 3, format::substring);

    vm.define_native("len", 1, array::len);
    vm.define_native("push", 2, array::push);
    vm.define_native("pop", 1, array::pop);
    vm.define_native("for_each", 2, array::for_each);
    vm.define_native("keys", 1, array::keys);

    vm.define_native("from_json", 1, json::from_json);
    vm.define_native("to_json", 1, json::to_json);

    vm.define_native("random_int", 3, math::random_int);
    math::unary(vm, "floor", f64::floor);
    math::unary(vm, "ceil", f64::ceil);
    math::unary(vm, "sin", f64::sin);
    math::unary(vm, "cos", f64::cos);
    math::unary(vm, "tan", f64::tan);
    math::unary(vm, "asin", f64::asin);
    math::unary(vm, "acos", f64::acos);
    math::unary(vm, "atan", f64::atan);
    math::unary(vm, "log", f64::ln);
    math::unary(vm, "log10", f64::log10);
    math::unary(vm, "sqrt", f64::sqrt);
    math::unary(vm, "exp", f64::exp);
    math::unary(vm, "fabs", f64::abs);
    math::binary(vm, "pow", f64::powf);
    math::binary(vm, "atan2", f64::atan2);
    math::binary(vm, "fmod", |a, b| a % b);
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn installs_every_documented_builtin() {
        let vm = VM::new();
        let names = [
            "clock", "printf", "sprintf", "len", "push", "pop", "readline", "slurp", "split",
            "assert", "for_each", "keys", "tonumber", "from_json", "to_json", "substring",
            "random_int", "floor", "ceil", "sin", "cos", "tan", "asin", "acos", "atan", "log",
            "log10", "sqrt", "exp", "fabs", "pow", "atan2", "fmod",
        ];
        for name in names {
            assert!(vm.has_global(name), "missing native '{name}'");
        }
    }
}
