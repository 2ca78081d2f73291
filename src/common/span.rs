//! Source text and source-line spans, used throughout the compiler and VM
//! for error reporting.

use std::{fmt, rc::Rc};

/// The full text of a single source file (or REPL line), kept alive for the
/// whole pipeline so that error messages can quote it.
#[derive(Debug, PartialEq, Eq)]
pub struct Source {
    pub name: String,
    pub contents: String,
}

impl Source {
    pub fn new(name: &str, contents: &str) -> Rc<Source> {
        Rc::new(Source { name: name.to_string(), contents: contents.to_string() })
    }

    pub fn path(path: &std::path::Path) -> std::io::Result<Rc<Source>> {
        let contents = std::fs::read_to_string(path)?;
        Ok(Rc::new(Source { name: path.display().to_string(), contents }))
    }

    pub fn repl(contents: &str) -> Rc<Source> {
        Source::new("<repl>", contents)
    }
}

/// A single source line, 1-indexed, carried on every token and AST node so
/// that compile- and runtime-errors can point back at the offending text.
pub type Line = usize;

/// A region of a `Source`, used to render the `^^^^` under an offending
/// token when printing an error.
#[derive(Debug, Clone)]
pub struct Span {
    pub source: Rc<Source>,
    pub line: Line,
}

impl Span {
    pub fn new(source: &Rc<Source>, line: Line) -> Span {
        Span { source: Rc::clone(source), line }
    }

    /// The text of the offending line, or an empty string if the line is out
    /// of range (can happen for an error reported at end-of-file).
    fn line_text(&self) -> &str {
        self.source
            .contents
            .lines()
            .nth(self.line.saturating_sub(1))
            .unwrap_or("")
    }
}

impl fmt::Display for Span {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "In {}:{}", self.source.name, self.line)?;
        writeln!(f, "  |")?;
        writeln!(f, "{} | {}", self.line, self.line_text())?;
        write!(f, "  |")
    }
}

impl PartialEq for Span {
    fn eq(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.source, &other.source) && self.line == other.line
    }
}
impl Eq for Span {}
