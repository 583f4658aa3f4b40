//! Integration tests for `ReplSession`: one file covering the
//! persistent-session contract end to end, as opposed to the inline unit
//! tests in `repl.rs` that exercise individual methods.

use escript_core::{CompatFlags, ExcType, ReplSession};

#[test]
fn global_state_persists_across_multiple_snippets() {
    let mut session = ReplSession::new(CompatFlags::default());
    session.execute(None, "var total = 0;").unwrap();
    for i in 1..=5 {
        session.execute(None, &format!("total += {i};")).unwrap();
    }
    let result = session.execute(None, "total;").unwrap();
    assert!(matches!(result, escript_core::Value::Number(n) if n == 15.0));
}

#[test]
fn function_declared_in_one_snippet_is_callable_from_the_next() {
    let mut session = ReplSession::new(CompatFlags::default());
    session.execute(None, "function greet(name) { return 'hi ' + name; }").unwrap();
    let result = session.execute(None, "greet('world');").unwrap();
    match result {
        escript_core::Value::String(s) => assert_eq!(s.to_string_lossy(), "hi world"),
        other => panic!("expected String, got {other:?}"),
    }
}

#[test]
fn a_syntax_error_does_not_corrupt_the_session() {
    let mut session = ReplSession::new(CompatFlags::default());
    session.execute(None, "var y = 10;").unwrap();
    let err = session.execute(None, "var z = ;").unwrap_err();
    assert_eq!(err.kind, ExcType::SyntaxError);
    let result = session.execute(None, "y;").unwrap();
    assert!(matches!(result, escript_core::Value::Number(n) if n == 10.0));
}
