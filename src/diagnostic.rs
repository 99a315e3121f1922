use crate::location::{Located, SourceSpan};
use crate::symbols::{LError, Unresolved};
use serde::Serialize;
use std::fmt;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Symbols,
    Resolver,
    Identifier,
    Query,
}

#[derive(Debug, Serialize)]
pub struct Diagnostic {
    pub span: SourceSpan,
    pub severity: Severity,
    pub source: Source,
    pub message: String,
}

impl From<&LError> for Diagnostic {
    fn from(error: &LError) -> Self {
        Self {
            span: error.span,
            severity: Severity::Error,
            source: error.locatee.component(),
            message: error.locatee.to_string(),
        }
    }
}

impl From<&Located<Unresolved>> for Diagnostic {
    fn from(unresolved: &Located<Unresolved>) -> Self {
        Self {
            span: unresolved.span,
            severity: Severity::Warning,
            source: Source::Resolver,
            message: format!("Unresolved expression: {}.", unresolved.locatee),
        }
    }
}

impl Severity {
    fn as_str(self) -> &'static str {
        match self {
            Self::Warning => "warning",
            Self::Error => "error",
        }
    }
}

impl Source {
    fn as_str(self) -> &'static str {
        match self {
            Self::Symbols => "symbols",
            Self::Resolver => "resolver",
            Self::Identifier => "identifier",
            Self::Query => "query",
        }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Self { span, severity, source, message } = self;
        write!(f, "{} {} [{}]: {}", span, severity.as_str(), source.as_str(), message)
    }
}

impl Diagnostic {
    /// Shows the offending line of `input` with the span underlined. Spans
    /// across several lines, or outside of `input`, only get their location
    /// printed.
    pub fn layout(&self, input: &str) -> String {
        let Self { span, message, .. } = self;
        let line = input.lines().nth(span.start.line as usize);
        match line {
            Some(line) if span.start.line == span.end.line => {
                format!(
                    "{:3} | {}\n{}{}\n{}",
                    span.start.line + 1,
                    line,
                    " ".repeat((span.start.column + 6) as usize),
                    "~".repeat(span.end.column.saturating_sub(span.start.column).max(1) as usize),
                    message
                )
            }
            _ => format!("{}: {}", span, message),
        }
    }
}
