//! `Trace` is the runtime-error counterpart to the compiler's `Syntax`:
//! built from the frame stack at the point of failure so it can render a
//! full call traceback, innermost frame first.

use std::fmt;

#[derive(Debug, Clone)]
pub struct TraceFrame {
    pub function_name: String,
    pub line: usize,
}

#[derive(Debug, Clone)]
pub struct Trace {
    pub message: String,
    /// Innermost frame first.
    pub frames: Vec<TraceFrame>,
}

impl Trace {
    pub fn error(message: impl Into<String>) -> Trace {
        Trace { message: message.into(), frames: vec![] }
    }
}

impl fmt::Display for Trace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(top) = self.frames.first() {
            writeln!(f, "line {}: {}", top.line, self.message)?;
        } else {
            writeln!(f, "{}", self.message)?;
        }
        writeln!(f, "stack traceback:")?;
        for frame in &self.frames {
            writeln!(f, "  at {} (line {})", frame.function_name, frame.line)?;
        }
        Ok(())
    }
}

impl std::error::Error for Trace {}
