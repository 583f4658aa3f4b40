//! Error handling design (spec.md §7): the seven exception kinds, the
//! public `Exception` value a host sees when `Global_eval` fails, and the
//! internal `RunError` the evaluator actually propagates.
//!
//! Split between a private `RunError` and a public `Exception`, with
//! `ExcType` as a plain `strum`-derived enum for the kind (so it can double
//! as the thrown value's `.name`), no `thiserror`.

use strum::{Display, EnumString, IntoStaticStr};

/// ECMA-262's native error constructors (§15.11) plus `SyntaxError`, which
/// this crate's lexer/parser raise directly rather than only via `eval`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, IntoStaticStr)]
pub enum ExcType {
    Error,
    EvalError,
    RangeError,
    ReferenceError,
    SyntaxError,
    TypeError,
    URIError,
}

/// One frame of a thrown exception's traceback.
///
/// `call_location` is the source position of the call expression that
/// invoked `callee`; `call_kind` distinguishes a function call from a
/// constructor call so a traceback can print `new Foo()` rather than
/// `Foo()` at that frame, matching spec.md §7's traceback contract.
#[derive(Debug, Clone)]
pub struct StackFrame {
    pub call_location: CodeLoc,
    pub callee: Option<String>,
    pub call_kind: CallKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CallKind {
    Function,
    Constructor,
}

/// A source location: 1-based line/column, plus the optional source name a
/// host supplied via `Source` (spec.md §4.1/§6.1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CodeLoc {
    pub line: u32,
    pub column: u32,
}

impl std::fmt::Display for CodeLoc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}", self.line, self.column)
    }
}

/// The public exception value returned from [`crate::run::Global_eval`] and
/// the rest of the host entry points, and from a `ReplSession` step.
#[derive(Debug, Clone)]
pub struct Exception {
    pub kind: ExcType,
    pub message: String,
    pub throw_location: CodeLoc,
    pub traceback: Vec<StackFrame>,
}

impl Exception {
    #[must_use]
    pub fn new(kind: ExcType, message: impl Into<String>, throw_location: CodeLoc) -> Self {
        Self { kind, message: message.into(), throw_location, traceback: Vec::new() }
    }

    pub fn push_frame(&mut self, frame: StackFrame) {
        self.traceback.push(frame);
    }
}

impl std::fmt::Display for Exception {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {} (at {})", self.kind, self.message, self.throw_location)
    }
}
impl std::error::Error for Exception {}

/// Internal propagation type the evaluator actually uses. `Exc` is a
/// catchable script-level exception raised internally (`TypeError`,
/// `ReferenceError`, ...); `Throw` is a raw value a script's own `throw`
/// statement produced and needs no wrapping — binding it to a `catch`
/// parameter is just moving the value, ECMA-262 §12.14's `Result(3)`;
/// `Uncatchable` is a host-policy abort (a [`crate::resource::ResourceError`]
/// tripping) that unwinds straight through every `try`/`catch`/`finally`
/// frame to the top; `Internal` marks a bug in this crate rather than in the
/// script being run.
#[derive(Debug)]
pub enum RunError {
    Exc(Exception),
    Throw(Box<crate::value::Value>),
    Uncatchable(crate::resource::ResourceError),
    Internal(String),
}

impl From<Exception> for RunError {
    fn from(exc: Exception) -> Self {
        Self::Exc(exc)
    }
}

impl From<crate::resource::ResourceError> for RunError {
    fn from(err: crate::resource::ResourceError) -> Self {
        Self::Uncatchable(err)
    }
}

impl std::fmt::Display for RunError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Exc(e) => write!(f, "{e}"),
            Self::Throw(_) => write!(f, "uncaught exception"),
            Self::Uncatchable(e) => write!(f, "aborted: {e}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}
impl std::error::Error for RunError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exc_type_display_matches_ecma_name() {
        assert_eq!(ExcType::TypeError.to_string(), "TypeError");
        assert_eq!(ExcType::ReferenceError.to_string(), "ReferenceError");
    }

    #[test]
    fn resource_error_is_uncatchable() {
        let err: RunError = crate::resource::ResourceError::RecursionLimitExceeded { limit: 10 }.into();
        assert!(matches!(err, RunError::Uncatchable(_)));
    }
}
