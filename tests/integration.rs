//! End-to-end scenarios exercising the full scanner → parser → compiler →
//! VM pipeline and asserting on captured stdout, grounded in the teacher's
//! own snippet-style pipeline tests (`passerine/tests/fledgling.rs`) but
//! simplified to plain `#[test]` functions per scenario.

use std::{
    cell::RefCell,
    io::{self, BufReader, Write},
    rc::Rc,
};

use rhythm::{common::Source, compiler, vm::VM};

#[derive(Clone, Default)]
struct SharedBuffer(Rc<RefCell<Vec<u8>>>);

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.borrow_mut().extend_from_slice(buf);
        Ok(buf.len())
    }
    fn flush(&mut self) -> io::Result<()> { Ok(()) }
}

/// Compiles and runs `source` on a fresh VM, returning everything written to
/// its stdout.
fn run_captured(source: &str) -> Result<String, String> {
    let stdout = SharedBuffer::default();
    let mut vm = VM::with_io(Box::new(stdout.clone()), Box::new(BufReader::new(io::empty())));
    let closure = compiler::compile(Source::new("<test>", source), false).map_err(|e| e.to_string())?;
    vm.interpret(closure).map_err(|e| e.to_string())?;
    Ok(String::from_utf8(stdout.0.borrow().clone()).unwrap())
}

fn run_ok(source: &str) -> String {
    run_captured(source).unwrap_or_else(|e| panic!("expected success, got error: {e}"))
}

#[test]
fn arithmetic_and_precedence() {
    let out = run_ok(r#"
        print 1 + 2 * 3;
        print (1 + 2) * 3;
        print 7 % 3;
    "#);
    assert_eq!(out, "7\n9\n1\n");
}

#[test]
fn closures_capture_a_shared_counter() {
    let out = run_ok(r#"
        fun makeCounter() {
            var n = 0;
            fun inc() { n = n + 1; return n; }
            return inc;
        }
        var c = makeCounter();
        print c(); print c(); print c();
    "#);
    assert_eq!(out, "1\n2\n3\n");
}

#[test]
fn control_flow_with_break_and_continue() {
    let out = run_ok(r#"
        var s = 0;
        for (var i = 0; i < 10; i = i + 1) {
            if (i == 3) continue;
            if (i == 7) break;
            s = s + i;
        }
        print s;
    "#);
    assert_eq!(out, "18\n");
}

#[test]
fn arrays_and_maps() {
    let out = run_ok(r#"
        var a = [10, 20, 30];
        push(a, 40);
        print len(a);
        print a[2];
        var m = {"x": 1};
        m["y"] = 2; m["x"] = nil;
        print len(m);
        print m["y"];
    "#);
    assert_eq!(out, "4\n30\n1\n2\n");
}

#[test]
fn recursive_fibonacci() {
    let out = run_ok(r#"
        fun fib(n) { if (n < 2) return n; return fib(n-1) + fib(n-2); }
        print fib(10);
    "#);
    assert_eq!(out, "55\n");
}

#[test]
fn upvalue_closes_on_scope_exit() {
    let out = run_ok(r#"
        fun outer() {
            var x = "captured";
            fun inner() { return x; }
            return inner;
        }
        print outer()();
    "#);
    assert_eq!(out, "captured\n");
}

#[test]
fn shadowing_restores_outer_value_at_scope_exit() {
    let out = run_ok(r#"
        var x = "outer";
        {
            var x = "inner";
            print x;
        }
        print x;
    "#);
    assert_eq!(out, "inner\nouter\n");
}

#[test]
fn continue_runs_the_for_loop_increment_before_retesting() {
    // If `continue` skipped the increment, this would loop forever instead
    // of terminating after three passes.
    let out = run_ok(r#"
        var count = 0;
        for (var i = 0; i < 3; i = i + 1) {
            if (i == 1) continue;
            count = count + 1;
        }
        print count;
    "#);
    assert_eq!(out, "2\n");
}

#[test]
fn division_by_zero_is_inf_not_an_error() {
    let out = run_ok(r#"
        print 1 / 0;
        print -1 / 0;
    "#);
    assert_eq!(out, "inf\n-inf\n");
}

#[test]
fn array_out_of_bounds_is_a_runtime_error() {
    let err = run_captured("var a = [1, 2]; print a[5];").unwrap_err();
    assert!(err.contains("out of bounds"), "unexpected message: {err}");
}

#[test]
fn map_missing_key_yields_nil() {
    let out = run_ok(r#"var m = {}; print m["missing"];"#);
    assert_eq!(out, "nil\n");
}

#[test]
fn no_loop_flag_rejects_while() {
    let err = compiler::compile(Source::new("<test>", "while (true) { print 1; }"), true).unwrap_err();
    assert!(err.to_string().contains("--no-loop"));
}

#[test]
fn assert_false_is_a_runtime_error() {
    let err = run_captured("assert(false);").unwrap_err();
    assert!(err.contains("assert"));
}

#[test]
fn printf_formats_mixed_specs() {
    let out = run_ok(r#"printf("%s scored %d points\n", "ada", 42);"#);
    assert_eq!(out, "ada scored 42 points\n");
}
