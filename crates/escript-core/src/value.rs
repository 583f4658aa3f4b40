//! The value model (spec.md §3.1): the ECMA-262 language types plus the two
//! internal-only types — References and Completions — that the evaluator
//! threads through expression and statement evaluation.
//!
//! `Value` covers the six language types (Undefined, Null, Boolean, Number,
//! String, Object). `Reference` and `Completion` are not language values —
//! scripts can never observe one directly — but spec.md §3.1 models them as
//! part of the same tagged union the evaluator passes around, matching
//! ECMA-262's own "Reference Type" and "Completion Type" internal
//! specification types. Keeping them alongside `Value` rather than bolting
//! them on as a separate `enum EvalResult` is what lets `Reference`s get
//! `GetValue`/`PutValue`'d with the same dispatch the rest of evaluation uses.

use crate::{
    heap::HeapId,
    intern::StringId,
    strings::JsString,
};

/// One of the ECMA-262 language values, plus the internal Reference and
/// Completion pseudo-values the evaluator needs.
#[derive(Debug, Clone)]
pub enum Value {
    Undefined,
    Null,
    Boolean(bool),
    /// IEEE 754 double; NaN/Infinity/-0 follow ECMA-262 §8.5 exactly, which
    /// is also just what `f64` already does.
    Number(f64),
    String(JsString),
    Object(HeapId),
    /// ECMA-262 §8.7 Reference Type: the result of evaluating an identifier
    /// or a member expression before `GetValue`/`PutValue` resolves it.
    /// `base: None` models an unresolvable reference (spec.md §7's
    /// `ReferenceError` on reading an undeclared identifier).
    Reference(Reference),
    /// ECMA-262 §8.9 Completion Type: the result of evaluating a statement.
    /// Never appears as the result of evaluating an *expression* — only
    /// `eval::stmt` produces and consumes these.
    Completion(Completion),
}

/// A Reference: a base value plus a property name, not yet dereferenced.
#[derive(Debug, Clone)]
pub struct Reference {
    pub base: Option<ReferenceBase>,
    pub property_name: StringId,
}

#[derive(Debug, Clone)]
pub enum ReferenceBase {
    Object(HeapId),
    /// Reference into an activation/global object represented directly
    /// rather than going through `Value::Object`, used by the scope-chain
    /// walk in `namespace.rs` before a binding is known to exist as a real
    /// property.
    Environment(HeapId),
}

/// ECMA-262 §8.9 Completion Type.
#[derive(Debug, Clone)]
pub enum Completion {
    Normal(Option<Box<Value>>),
    Break(Option<StringId>),
    Continue(Option<StringId>),
    Return(Box<Value>),
    /// Carries the thrown value, not yet wrapped in [`crate::exception::Exception`];
    /// that wrapping happens once a `try` block (or the top-level evaluator)
    /// actually catches it, since a `throw 42` has no traceback attached
    /// until something observes it.
    Throw(Box<Value>),
}

impl Value {
    #[must_use]
    pub fn number(n: f64) -> Self {
        Self::Number(n)
    }

    #[must_use]
    pub fn string(s: &str) -> Self {
        Self::String(JsString::from_str(s))
    }

    #[must_use]
    pub fn is_undefined(&self) -> bool {
        matches!(self, Self::Undefined)
    }

    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    #[must_use]
    pub fn is_reference(&self) -> bool {
        matches!(self, Self::Reference(_))
    }

    /// ECMA-262 §8.6.2.6 `typeof`'s classification, minus the Reference/
    /// Completion pseudo-types which `GetValue` always strips before
    /// `typeof` ever sees them.
    #[must_use]
    pub fn type_of(&self) -> &'static str {
        match self {
            Self::Undefined => "undefined",
            Self::Null => "object",
            Self::Boolean(_) => "boolean",
            Self::Number(_) => "number",
            Self::String(_) => "string",
            Self::Object(_) => "object",
            Self::Reference(_) | Self::Completion(_) => {
                unreachable!("typeof operates on a dereferenced value")
            }
        }
    }
}

/// Errors raised by the abstract coercion operations below. These are always
/// converted into a `TypeError`/`RangeError` [`crate::exception::Exception`]
/// at the point an evaluator operation calls them; kept as a plain enum
/// rather than threading `RunError` through every coercion so this module
/// has no dependency on the exception machinery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoercionError {
    /// `ToPrimitive` exhausted both `valueOf` and `toString` without getting
    /// a primitive back (ECMA-262 §8.6.2.6).
    NoPrimitiveValue,
}

/// ECMA-262 §9.1 `ToPrimitive`.
///
/// Host objects implement this by trying `valueOf` then `toString` (hint
/// `"number"`) or the reverse order (hint `"string"`), dispatched through
/// [`crate::Interpreter::default_value`]; this free function handles the
/// cases that don't need an object lookup at all and delegates otherwise.
pub fn to_primitive(
    interp: &mut crate::Interpreter,
    value: &Value,
    hint: PreferredType,
) -> Result<Value, CoercionError> {
    match value {
        Value::Object(id) => interp.default_value(*id, hint).ok_or(CoercionError::NoPrimitiveValue),
        other => Ok(other.clone()),
    }
}

/// Hint passed to `ToPrimitive` / `[[DefaultValue]]` (ECMA-262 §8.6.2.6).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PreferredType {
    Number,
    StringType,
    /// No hint given; ECMA-262 treats this as `Number` except for `Date`
    /// objects, which this crate does not implement (spec.md §1), so it is
    /// always equivalent to `Number` here.
    Default,
}

/// ECMA-262 §9.2 `ToBoolean`. Total — never fails.
#[must_use]
pub fn to_boolean(value: &Value) -> bool {
    match value {
        Value::Undefined | Value::Null => false,
        Value::Boolean(b) => *b,
        Value::Number(n) => *n != 0.0 && !n.is_nan(),
        Value::String(s) => !s.is_empty(),
        Value::Object(_) => true,
        Value::Reference(_) | Value::Completion(_) => {
            unreachable!("ToBoolean operates on a dereferenced value")
        }
    }
}

/// ECMA-262 §9.3 `ToNumber`.
pub fn to_number(interp: &mut crate::Interpreter, value: &Value) -> Result<f64, CoercionError> {
    match value {
        Value::Undefined => Ok(f64::NAN),
        Value::Null => Ok(0.0),
        Value::Boolean(b) => Ok(if *b { 1.0 } else { 0.0 }),
        Value::Number(n) => Ok(*n),
        Value::String(s) => Ok(string_to_number(s)),
        Value::Object(_) => {
            let prim = to_primitive(interp, value, PreferredType::Number)?;
            to_number(interp, &prim)
        }
        Value::Reference(_) | Value::Completion(_) => {
            unreachable!("ToNumber operates on a dereferenced value")
        }
    }
}

/// ECMA-262 §9.3.1: `StringNumericLiteral` grammar, implemented directly
/// rather than by delegating to `str::parse` so that ECMA-262's permissive
/// leading/trailing whitespace and empty-string-is-zero rules hold exactly.
#[must_use]
fn string_to_number(s: &JsString) -> f64 {
    let text = s.to_string_lossy();
    let trimmed = text.trim_matches(|c: char| c.is_whitespace());
    if trimmed.is_empty() {
        return 0.0;
    }
    if let Some(hex) = trimmed.strip_prefix("0x").or_else(|| trimmed.strip_prefix("0X")) {
        return i64::from_str_radix(hex, 16).map_or(f64::NAN, |n| n as f64);
    }
    match trimmed {
        "Infinity" | "+Infinity" => f64::INFINITY,
        "-Infinity" => f64::NEG_INFINITY,
        _ => trimmed.parse::<f64>().unwrap_or(f64::NAN),
    }
}

/// ECMA-262 §9.8 `ToString`.
pub fn to_js_string(interp: &mut crate::Interpreter, value: &Value) -> Result<JsString, CoercionError> {
    match value {
        Value::Undefined => Ok(JsString::from_str("undefined")),
        Value::Null => Ok(JsString::from_str("null")),
        Value::Boolean(b) => Ok(JsString::from_str(if *b { "true" } else { "false" })),
        Value::Number(n) => Ok(JsString::from_str(&number_to_string(*n))),
        Value::String(s) => Ok(s.clone()),
        Value::Object(_) => {
            let prim = to_primitive(interp, value, PreferredType::StringType)?;
            to_js_string(interp, &prim)
        }
        Value::Reference(_) | Value::Completion(_) => {
            unreachable!("ToString operates on a dereferenced value")
        }
    }
}

/// ECMA-262 §9.8.1 `ToString` applied to a Number: shortest round-tripping
/// decimal representation, matching what `ryu` computes for the finite
/// case; special values are handled directly since `ryu` doesn't format them
/// the way ECMA-262 requires.
#[must_use]
pub fn number_to_string(n: f64) -> String {
    if n.is_nan() {
        return "NaN".to_owned();
    }
    if n == 0.0 {
        return "0".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { "Infinity".to_owned() } else { "-Infinity".to_owned() };
    }
    let mut buf = ryu::Buffer::new();
    let formatted = buf.format_finite(n);
    normalize_ryu_output(formatted)
}

/// `ryu` emits Rust float literal syntax (`1e0`, `1.5e10`); ECMA-262 wants
/// plain decimal or exponential notation without a guaranteed fractional
/// part. Strip a redundant trailing `.0` before an exponent marker, and a
/// bare trailing `.0` on integral values.
fn normalize_ryu_output(s: &str) -> String {
    if let Some(stripped) = s.strip_suffix(".0") {
        return stripped.to_owned();
    }
    if let Some(idx) = s.find(".0e") {
        let mut out = s.to_owned();
        out.replace_range(idx..idx + 2, "");
        return out;
    }
    s.to_owned()
}

/// ECMA-262 §9.9 `ToObject`. Errors (rather than producing a value) on
/// `undefined`/`null`, which `Global_eval` converts into a `TypeError`.
pub fn to_object(interp: &mut crate::Interpreter, value: &Value) -> Result<HeapId, CoercionError> {
    match value {
        Value::Undefined | Value::Null => Err(CoercionError::NoPrimitiveValue),
        Value::Object(id) => Ok(*id),
        Value::Boolean(_) | Value::Number(_) | Value::String(_) => Ok(interp.wrap_primitive(value.clone())),
        Value::Reference(_) | Value::Completion(_) => {
            unreachable!("ToObject operates on a dereferenced value")
        }
    }
}

/// ECMA-262 §9.5 `ToInt32`.
#[must_use]
pub fn to_int32(n: f64) -> i32 {
    to_uint32(n) as i32
}

/// ECMA-262 §9.6 `ToUint32`.
#[must_use]
pub fn to_uint32(n: f64) -> u32 {
    if n.is_nan() || n.is_infinite() {
        return 0;
    }
    let n = n.trunc();
    let modulus = 2f64.powi(32);
    let mut m = n % modulus;
    if m < 0.0 {
        m += modulus;
    }
    m as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn to_boolean_matches_ecma_falsy_set() {
        assert!(!to_boolean(&Value::Undefined));
        assert!(!to_boolean(&Value::Null));
        assert!(!to_boolean(&Value::Number(0.0)));
        assert!(!to_boolean(&Value::Number(f64::NAN)));
        assert!(!to_boolean(&Value::string("")));
        assert!(to_boolean(&Value::Number(1.0)));
        assert!(to_boolean(&Value::string("0")));
    }

    #[test]
    fn number_to_string_matches_ecma_specials() {
        assert_eq!(number_to_string(f64::NAN), "NaN");
        assert_eq!(number_to_string(f64::INFINITY), "Infinity");
        assert_eq!(number_to_string(-0.0), "0");
        assert_eq!(number_to_string(1.0), "1");
        assert_eq!(number_to_string(1.5), "1.5");
    }

    #[test]
    fn to_uint32_wraps_per_spec() {
        assert_eq!(to_uint32(-1.0), 0xFFFF_FFFF);
        assert_eq!(to_uint32(4_294_967_296.0), 0);
        assert_eq!(to_int32(4_294_967_295.0), -1);
    }

    #[test]
    fn string_to_number_handles_whitespace_and_hex() {
        assert_eq!(string_to_number(&JsString::from_str("   ")), 0.0);
        assert_eq!(string_to_number(&JsString::from_str(" 42 ")), 42.0);
        assert_eq!(string_to_number(&JsString::from_str("0x2A")), 42.0);
        assert!(string_to_number(&JsString::from_str("abc")).is_nan());
    }
}
