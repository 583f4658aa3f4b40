//! Integration tests for the `escript-core` host embedding surface
//! (spec.md §6.1): `Global_eval`, `parse_function`/`eval_functionbody`, and
//! `error_throw`. Exercises the public entry points a host actually calls,
//! rather than the crate's own internals.

use std::rc::Rc;

use escript_core::{error_throw, eval_functionbody, parse_function, CompatFlags, ExcType, Global_eval, Interpreter, RunError, Source, Value};

#[test]
fn global_eval_returns_last_expression_statement_value() {
    let mut interp = Interpreter::new(CompatFlags::default());
    let source = Rc::new(Source::from_str(None, "var a = 2; var b = 3; a * b;"));
    let result = Global_eval(&mut interp, source).unwrap();
    assert!(matches!(result, Value::Number(n) if n == 6.0));
}

#[test]
fn global_eval_surfaces_uncaught_throw_as_exception() {
    let mut interp = Interpreter::new(CompatFlags::default());
    let source = Rc::new(Source::from_str(None, "throw new RangeError('out of range');"));
    let err = Global_eval(&mut interp, source).unwrap_err();
    assert_eq!(err.kind, ExcType::RangeError);
    assert_eq!(err.message, "out of range");
}

#[test]
fn global_eval_surfaces_a_non_object_thrown_value() {
    let mut interp = Interpreter::new(CompatFlags::default());
    let source = Rc::new(Source::from_str(None, "throw 'plain string';"));
    let err = Global_eval(&mut interp, source).unwrap_err();
    assert_eq!(err.kind, ExcType::Error);
    assert_eq!(err.message, "plain string");
}

#[test]
fn parse_function_and_eval_functionbody_round_trip() {
    let mut interp = Interpreter::new(CompatFlags::default());
    let params = Source::from_str(None, "a, b");
    let body = Source::from_str(None, "return a + b;");
    let func = parse_function(&mut interp, Some("add"), &params, &body).unwrap();
    let result = eval_functionbody(&mut interp, func, &[Value::Number(4.0), Value::Number(5.0)]).unwrap();
    assert!(matches!(result, Value::Number(n) if n == 9.0));
}

#[test]
fn error_throw_produces_a_catchable_script_exception() {
    let mut interp = Interpreter::new(CompatFlags::default());
    let source = Rc::new(Source::from_str(None, "TypeError"));
    let type_error_ctor = match Global_eval(&mut interp, source).unwrap() {
        Value::Object(id) => id,
        other => panic!("expected the TypeError constructor object, got {other:?}"),
    };
    let run_error = error_throw(&mut interp, type_error_ctor, "host reported a type error");
    assert!(matches!(run_error, RunError::Throw(_)));
}
