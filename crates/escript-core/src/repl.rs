//! Persistent, incremental evaluation session (SPEC_FULL.md §11).
//!
//! [`Global_eval`](crate::run::Global_eval) parses and runs one `Program`;
//! `ReplSession` is the thin wrapper that keeps one [`Interpreter`] alive
//! across many such calls, so a later snippet sees every global variable,
//! function, and object a prior one created — what the `-i` flag (spec.md
//! §6.4) and a host's interactive loop both need.
//!
//! Deliberately minimal: no suspend/resume across external async calls and
//! no session serialization, since nothing in this grammar suspends
//! mid-statement. The essential property is just that the session owns a
//! long-lived heap, namespace table, and interner state across `execute()`
//! calls.

use std::rc::Rc;

use crate::{compat::CompatFlags, exception::Exception, run, source::Source, value::Value, Interpreter};

/// A long-lived [`Interpreter`] that evaluates successive snippets against
/// the same global object and scope chain.
pub struct ReplSession {
    interp: Interpreter,
}

impl ReplSession {
    #[must_use]
    pub fn new(compat: CompatFlags) -> Self {
        Self { interp: Interpreter::new(compat) }
    }

    /// Wraps an already-configured [`Interpreter`] (e.g. one a host set a
    /// [`crate::resource::ResourceTracker`]/[`crate::tracer::VmTracer`] on,
    /// or ran library files against) in a session.
    #[must_use]
    pub fn from_interpreter(interp: Interpreter) -> Self {
        Self { interp }
    }

    /// Parses and executes one snippet, with variables, functions, and
    /// objects from every prior call still in scope. Returns the snippet's
    /// completion value, mirroring `Global_eval` run once against this
    /// session's persistent interpreter.
    pub fn execute(&mut self, name: Option<&str>, text: &str) -> Result<Value, Exception> {
        let source = Rc::new(Source::from_str(name, text));
        run::Global_eval(&mut self.interp, source)
    }

    #[must_use]
    pub fn interpreter(&self) -> &Interpreter {
        &self.interp
    }

    pub fn interpreter_mut(&mut self) -> &mut Interpreter {
        &mut self.interp
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn later_snippet_sees_earlier_global_var() {
        let mut session = ReplSession::new(CompatFlags::default());
        session.execute(None, "var x = 41;").unwrap();
        let result = session.execute(None, "x + 1;").unwrap();
        assert!(matches!(result, Value::Number(n) if n == 42.0));
    }

    #[test]
    fn later_snippet_sees_earlier_function_decl() {
        let mut session = ReplSession::new(CompatFlags::default());
        session.execute(None, "function square(n) { return n * n; }").unwrap();
        let result = session.execute(None, "square(6);").unwrap();
        assert!(matches!(result, Value::Number(n) if n == 36.0));
    }

    #[test]
    fn uncaught_throw_surfaces_as_exception_without_poisoning_the_session() {
        let mut session = ReplSession::new(CompatFlags::default());
        let err = session.execute(None, "throw new TypeError('boom');").unwrap_err();
        assert_eq!(err.kind, crate::exception::ExcType::TypeError);
        let result = session.execute(None, "1 + 1;").unwrap();
        assert!(matches!(result, Value::Number(n) if n == 2.0));
    }
}
