//! The host embedding surface (spec.md §6.1): the handful of free functions
//! a host actually calls to run script text against an [`Interpreter`] —
//! `Global_eval`-as-`global_eval`, `parse_function`, and the uncaught-throw
//! to public-[`Exception`] conversion every top-level entry point shares.
//!
//! No coroutine or future machinery here: a host drives a whole program
//! through these functions synchronously, since nothing in this language
//! needs to suspend mid-evaluation.

use std::rc::Rc;

use crate::{
    exception::{CodeLoc, ExcType, Exception, RunError},
    heap::HeapId,
    value::{to_js_string, Completion, Value},
    Interpreter, Source,
};

/// `Global_eval(&i, input) -> Value` (spec.md §6.1): parses `source` as a
/// `Program`, hoists its `var`/function declarations onto the global
/// object, and executes it, returning the completion value of its last
/// expression statement (or `undefined`) — or the public [`Exception`] an
/// uncaught throw, parse error, or resource-limit trip produced.
#[allow(non_snake_case)]
pub fn Global_eval(interp: &mut Interpreter, source: Rc<Source>) -> Result<Value, Exception> {
    interp.set_current_source(Rc::clone(&source));
    let program = crate::parser::parse_program(&source, interp.interner_mut(), interp.compat)?;
    let scope = interp.global_scope();
    let global = interp.global_object();
    interp.hoist_declarations(&scope, &program.body);
    match interp.exec_block(&scope, &program.body, &Value::Object(global)) {
        Ok(Completion::Normal(v)) => Ok(v.map_or(Value::Undefined, |boxed| *boxed)),
        Ok(Completion::Return(v)) => Ok(*v),
        Ok(Completion::Break(_) | Completion::Continue(_)) => Ok(Value::Undefined),
        Ok(Completion::Throw(v)) => Err(exception_from_thrown(interp, *v)),
        Err(RunError::Exc(exc)) => Err(exc),
        Err(RunError::Throw(v)) => Err(exception_from_thrown(interp, *v)),
        Err(RunError::Uncatchable(err)) => Err(Exception::new(ExcType::Error, err.to_string(), interp.current_loc())),
        Err(RunError::Internal(msg)) => Err(Exception::new(ExcType::Error, msg, CodeLoc::default())),
    }
}

/// `parse_function(&i, name, params_input, body_input) -> Function`
/// (spec.md §6.1). There is no parser entry point that parses a bare
/// parameter list plus a bare body in isolation — function grammar is
/// always `function name (params) { body }` — so this wraps both inputs in
/// that shape and parses the result as an ordinary program, the same trick
/// `new Function(...)` uses in engines that support it. Returns the
/// resulting function object's heap handle.
pub fn parse_function(interp: &mut Interpreter, name: Option<&str>, params_source: &Source, body_source: &Source) -> Result<HeapId, Exception> {
    let params_text = params_source.slice(0, params_source.len());
    let body_text = body_source.slice(0, body_source.len());
    let synthetic = format!("function {}({params_text}) {{\n{body_text}\n}}", name.unwrap_or(""));
    let wrapper = Source::from_str(None, &synthetic);
    let program = crate::parser::parse_program(&wrapper, interp.interner_mut(), interp.compat)?;
    let Some(node) = program.body.into_iter().next() else {
        return Err(Exception::new(ExcType::SyntaxError, "parse_function produced an empty program", CodeLoc::default()));
    };
    let crate::ast::Stmt::FunctionDecl(def) = node.node else {
        return Err(Exception::new(ExcType::SyntaxError, "parse_function did not produce a function declaration", CodeLoc::default()));
    };
    let scope = interp.global_scope();
    Ok(interp.make_script_function(def.name, def.params, def.body, scope))
}

/// `eval_functionbody(f, &ctxt) -> Value` (spec.md §6.1): invokes a function
/// object produced by [`parse_function`] or a function expression/
/// declaration, with `this` bound to the global object and no arguments —
/// the "evaluate this function body in isolation" entry point a host uses to
/// run a callback it parsed ahead of time.
pub fn eval_functionbody(interp: &mut Interpreter, function: HeapId, args: &[Value]) -> Result<Value, Exception> {
    let global = Value::Object(interp.global_object());
    interp.call_function(function, global, args).map_err(|err| match err {
        RunError::Exc(exc) => exc,
        RunError::Throw(v) => exception_from_thrown(interp, *v),
        RunError::Uncatchable(e) => Exception::new(ExcType::Error, e.to_string(), interp.current_loc()),
        RunError::Internal(msg) => Exception::new(ExcType::Error, msg, CodeLoc::default()),
    })
}

/// `error_throw(&i, error_ctor, message) -> RunError` (spec.md §6.1): the
/// host-facing equivalent of a script's own `throw new SomeError(message)`,
/// for a native function (an embedder's `cfunction_make`-installed host
/// function) that needs to raise a script-catchable exception of a specific
/// kind rather than return a value.
pub fn error_throw(interp: &mut Interpreter, error_ctor: HeapId, message: &str) -> RunError {
    match interp.construct(error_ctor, &[Value::string(message)]) {
        Ok(Value::Object(id)) => RunError::Throw(Box::new(Value::Object(id))),
        _ => RunError::Exc(Exception::new(ExcType::Error, message.to_owned(), interp.current_loc())),
    }
}

/// Converts an uncaught thrown value into the public [`Exception`] a host
/// sees (spec.md §7): an `Error`-family object contributes its `.name`/
/// `.message`; anything else is stringified via `ToString` and reported as
/// a generic `Error`.
fn exception_from_thrown(interp: &mut Interpreter, value: Value) -> Exception {
    let loc = interp.current_loc();
    if let Value::Object(id) = value {
        let name_id = interp.intern("name");
        let message_id = interp.intern("message");
        let (name_value, message_value) = match interp.heap.get(id) {
            Some(obj) => (obj.get(&interp.heap, name_id, interp), obj.get(&interp.heap, message_id, interp)),
            None => (Value::Undefined, Value::Undefined),
        };
        let name = to_js_string(interp, &name_value).map(|s| s.to_string_lossy()).unwrap_or_else(|_| "Error".to_owned());
        let message = to_js_string(interp, &message_value).map(|s| s.to_string_lossy()).unwrap_or_default();
        let kind: ExcType = std::str::FromStr::from_str(&name).unwrap_or(ExcType::Error);
        return Exception::new(kind, message, loc);
    }
    let message = to_js_string(interp, &value).map(|s| s.to_string_lossy()).unwrap_or_else(|_| "uncaught exception".to_owned());
    Exception::new(ExcType::Error, message, loc)
}
