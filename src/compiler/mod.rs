//! Front end: source text -> tokens -> AST -> compiled closure, with no
//! intermediate written to disk or kept around after `compile` returns
//! except what the caller holds on to.

pub mod ast;
pub mod compiler;
pub mod error;
pub mod parser;
pub mod scanner;
pub mod token;

use std::rc::Rc;

use crate::common::{closure::Closure, Source};
pub use error::Syntax;

/// Runs the whole front end over a complete, already-loaded source file or
/// REPL chunk. `no_loop` rejects `while`/`for` during parsing (see the
/// `--no-loop` CLI flag).
pub fn compile(source: Rc<Source>, no_loop: bool) -> Result<Closure, Syntax> {
    let tokens = scanner::Scanner::scan(Rc::clone(&source))?;
    let program = parser::Parser::parse_with_options(Rc::clone(&source), tokens, no_loop)?;
    compiler::Compiler::compile(source, program)
}

/// Parses only, for the `--ast` CLI flag; does not run the compiler.
pub fn parse(source: Rc<Source>, no_loop: bool) -> Result<Vec<ast::Stmt>, Syntax> {
    let tokens = scanner::Scanner::scan(Rc::clone(&source))?;
    parser::Parser::parse_with_options(source, tokens, no_loop)
}
