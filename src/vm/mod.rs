//! Runtime: the stack machine, its call frames, upvalue handles, and the
//! runtime-error type used to unwind out of a failed instruction.

pub mod frame;
pub mod trace;
pub mod upvalue;
pub mod vm;

pub use trace::Trace;
pub use vm::VM;
