//! `Syntax` represents any error raised while turning source text into
//! bytecode: lexical, syntactic, or compile (scope/resolution) errors all
//! share this one type, rendered as `line N: <text>` plus a source quote.

use std::fmt;

use crate::common::Span;

#[derive(Debug)]
pub struct Syntax {
    pub span: Span,
    pub reason: String,
}

impl Syntax {
    pub fn error(span: Span, reason: impl Into<String>) -> Syntax {
        Syntax { span, reason: reason.into() }
    }
}

impl fmt::Display for Syntax {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.span)?;
        write!(f, "line {}: {}", self.span.line, self.reason)
    }
}

impl std::error::Error for Syntax {}
