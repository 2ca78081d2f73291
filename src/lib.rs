//! # Rhythm
//!
//! Rhythm is a small dynamically-typed scripting language. This crate is its
//! canonical execution path: a scanner, a recursive-descent parser, a
//! single-pass bytecode compiler, and a stack-based virtual machine with
//! closures and upvalues.
//!
//! ```
//! use std::rc::Rc;
//! use rhythm::{common::Source, compiler, vm::VM};
//!
//! let source = Source::new("<example>", "print 1 + 2 * 3;");
//! let closure = compiler::compile(Rc::clone(&source), false).unwrap();
//! let mut vm = VM::new();
//! vm.interpret(closure).unwrap();
//! ```
//!
//! Pipeline, leaves first: [`compiler::scanner`] turns source text into
//! tokens; [`compiler::parser`] turns tokens into an [`compiler::ast`]; and
//! [`compiler::compiler`] walks that tree once, resolving every lexical
//! capture as it goes, emitting the [`common::chunk::Chunk`]s that make up a
//! [`common::function::Function`]. [`vm::VM`] executes the resulting
//! top-level [`common::closure::Closure`] to completion or to the first
//! uncaught runtime error.
//!
//! Each stage fully consumes its input before the next begins; the AST and
//! compiler state do not survive past `compile`. [`native`] is the fixed
//! table of built-in functions (`clock`, `printf`, array/map helpers, JSON,
//! math) installed into every VM's globals at construction.

pub mod common;
pub mod compiler;
pub mod native;
pub mod vm;

use std::rc::Rc;

pub use common::Source;
pub use compiler::Syntax;
pub use vm::{Trace, VM};

/// Compiles and runs `source` on a fresh VM with the process's real stdin/
/// stdout, returning the first error encountered in either stage.
pub fn run(source: Rc<Source>) -> Result<(), String> {
    run_with_options(source, false)
}

/// As [`run`], but rejects `while`/`for` at parse time when `no_loop` is set
/// (the `-n`/`--no-loop` CLI flag).
pub fn run_with_options(source: Rc<Source>, no_loop: bool) -> Result<(), String> {
    let closure = compiler::compile(Rc::clone(&source), no_loop).map_err(|e| e.to_string())?;
    let mut vm = VM::new();
    vm.interpret(closure).map_err(|e| e.to_string())
}
