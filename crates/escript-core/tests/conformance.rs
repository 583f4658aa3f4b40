//! Golden-file conformance tests (spec.md §8's boundary scenarios). Each
//! fixture under `tests/conformance/` is a `.js` file whose first line is
//! `// expect: <Type> <value>`; the test evaluates the rest of the file with
//! `Global_eval` and checks the completion value against that comment.

use std::path::Path;

use escript_core::{CompatFlags, Global_eval, Interpreter, Value};

fn run(path: &Path) -> datatest_stable::Result<()> {
    let text = std::fs::read_to_string(path)?;
    let (expectation, source_text) = text.split_once('\n').expect("fixture must start with an `// expect:` line");
    let expectation = expectation.strip_prefix("// expect: ").expect("fixture's first line must be `// expect: ...`");

    let mut interp = Interpreter::new(CompatFlags::default());
    let source = std::rc::Rc::new(escript_core::Source::from_str(path.to_str(), source_text));
    let result = Global_eval(&mut interp, source).unwrap_or_else(|exc| panic!("{path:?}: uncaught {exc}"));

    let actual = describe(&result);
    assert_eq!(actual, expectation, "{path:?}: expected `{expectation}`, got `{actual}`");
    Ok(())
}

fn describe(value: &Value) -> String {
    match value {
        Value::Number(n) => format!("Number {n}"),
        Value::String(s) => format!("String {:?}", s.to_string_lossy()),
        Value::Boolean(b) => format!("Boolean {b}"),
        Value::Undefined => "Undefined".to_owned(),
        Value::Null => "Null".to_owned(),
        other => format!("{other:?}"),
    }
}

datatest_stable::harness! {
    { test = run, root = "tests/conformance", pattern = r"^.*\.js$" },
}
