//! The trace/observability layer (spec.md §3.7's "optional trace callback"):
//! a zero-cost `VmTracer` trait the evaluator and bytecode VM call at
//! dispatch points, rather than an external `log`/`tracing` dependency.
//! `NoopTracer` is the default and monomorphizes away entirely in a release
//! build, so paying for tracing is opt-in.

use crate::{ast::Span, intern::StringId, value::Value};

/// Called by the evaluator and bytecode VM at points a host may want to
/// observe. None of these calls can fail or influence evaluation; a tracer
/// is purely an observer.
pub trait VmTracer {
    fn on_statement(&mut self, _span: Span) {}
    fn on_call_enter(&mut self, _callee_name: Option<StringId>, _depth: u32) {}
    fn on_call_exit(&mut self, _callee_name: Option<StringId>, _depth: u32) {}
    fn on_throw(&mut self, _value: &Value) {}
    /// Fired once per bytecode instruction when running under
    /// [`crate::bytecode::Vm`]; unused by the tree-walking evaluator.
    fn on_instruction(&mut self, _pc: usize, _mnemonic: &'static str) {}
}

/// Does nothing; the default tracer for [`crate::Interpreter::new`].
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopTracer;
impl VmTracer for NoopTracer {}

/// Writes a one-line trace of every call enter/exit and thrown value to
/// stderr. Useful from the CLI's `-d` debug flag (spec.md §6.4).
#[derive(Debug, Default, Clone, Copy)]
pub struct StderrTracer;

impl VmTracer for StderrTracer {
    fn on_call_enter(&mut self, callee_name: Option<StringId>, depth: u32) {
        eprintln!("{:>width$}-> call (depth {depth})", "", width = (depth as usize) * 2);
        let _ = callee_name;
    }

    fn on_call_exit(&mut self, callee_name: Option<StringId>, depth: u32) {
        eprintln!("{:>width$}<- return (depth {depth})", "", width = (depth as usize) * 2);
        let _ = callee_name;
    }

    fn on_throw(&mut self, value: &Value) {
        eprintln!("throw: {value:?}");
    }
}

/// Records every call enter/exit and thrown value for later inspection —
/// used by conformance tests that want to assert on call shape without
/// scraping stderr text.
#[derive(Debug, Default)]
pub struct RecordingTracer {
    pub calls: Vec<TraceEvent>,
}

#[derive(Debug, Clone)]
pub enum TraceEvent {
    CallEnter { depth: u32 },
    CallExit { depth: u32 },
    Throw,
    Statement(Span),
}

impl VmTracer for RecordingTracer {
    fn on_statement(&mut self, span: Span) {
        self.calls.push(TraceEvent::Statement(span));
    }
    fn on_call_enter(&mut self, _callee_name: Option<StringId>, depth: u32) {
        self.calls.push(TraceEvent::CallEnter { depth });
    }
    fn on_call_exit(&mut self, _callee_name: Option<StringId>, depth: u32) {
        self.calls.push(TraceEvent::CallExit { depth });
    }
    fn on_throw(&mut self, _value: &Value) {
        self.calls.push(TraceEvent::Throw);
    }
}

/// Tracks which statement spans executed, for test-suite line-coverage
/// reporting over `tests/conformance/*.js`.
#[derive(Debug, Default)]
pub struct CoverageTracer {
    hit_spans: Vec<Span>,
}

impl CoverageTracer {
    #[must_use]
    pub fn hit_spans(&self) -> &[Span] {
        &self.hit_spans
    }
}

impl VmTracer for CoverageTracer {
    fn on_statement(&mut self, span: Span) {
        self.hit_spans.push(span);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_tracer_captures_call_shape() {
        let mut tracer = RecordingTracer::default();
        tracer.on_call_enter(None, 0);
        tracer.on_call_exit(None, 0);
        assert_eq!(tracer.calls.len(), 2);
    }
}
