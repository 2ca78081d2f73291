//! A single activation record on the VM's frame stack.

use std::rc::Rc;

use crate::common::{function::Function, value::Callable};

/// Holds the same `Rc<Callable>` that sits on the operand stack as the
/// callee, rather than re-wrapping the closure — cheap to construct per
/// call and keeps exactly one owner chain alive for the duration of the call.
pub struct CallFrame {
    pub callable: Rc<Callable>,
    pub ip: usize,
    /// Index into the VM's operand stack where this call's slot 0 (the
    /// first argument) begins. The callee itself sits one slot below.
    pub frame_pointer: usize,
}

impl CallFrame {
    pub fn new(callable: Rc<Callable>, frame_pointer: usize) -> CallFrame {
        CallFrame { callable, ip: 0, frame_pointer }
    }

    /// Panics if `callable` isn't a `Closure` — only `VM::call_value`
    /// constructs frames, and it only ever does so for closures.
    pub fn function(&self) -> &Function {
        match self.callable.as_ref() {
            Callable::Closure(c) => &c.function,
            _ => unreachable!("call frames are only ever built over closures"),
        }
    }

    pub fn upvalues(&self) -> &[Rc<crate::vm::upvalue::Upvalue>] {
        match self.callable.as_ref() {
            Callable::Closure(c) => &c.upvalues,
            _ => unreachable!("call frames are only ever built over closures"),
        }
    }

    pub fn line(&self) -> usize {
        self.function().chunk.line_at(self.ip.saturating_sub(1))
    }
}
