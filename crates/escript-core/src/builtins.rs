//! The minimal resident built-in object set (SPEC_FULL.md §11): just enough
//! of `Object`/`Array`/`String`/`Number`/`Boolean`/`Error` for the grammar
//! and the evaluator's own algorithms (`ToObject`, `[[DefaultValue]]`,
//! `for-in`, array-exotic `length`) to operate, and for spec.md §8's
//! boundary scenarios to run. Full library semantics (`Math`, `Date`,
//! `RegExp`, `Array.prototype` methods, ...) are out of scope (spec.md §1's
//! "external collaborators").
//!
//! One `install_*` function per built-in, wired together from a single
//! entry point.

use crate::{
    compat::CompatFlags,
    exception::ExcType,
    heap::HeapId,
    object::{JsObject, ObjectKind, Property, PropertyAttributes},
    value::{to_boolean, to_js_string, to_number, to_object, Value},
    Interpreter,
};

/// Installs every resident built-in and returns the global `eval`
/// function's heap handle, so [`Interpreter::new`] can cache it in
/// [`crate::WellKnown`] for direct-eval detection.
pub(crate) fn bootstrap(interp: &mut Interpreter) -> HeapId {
    install_object_prototype_methods(interp);
    install_function_prototype_methods(interp);
    install_error_prototype(interp, interp.well_known.error_prototype, "Error", "");

    let object_ctor = install_object_constructor(interp);
    let array_ctor = install_array_constructor(interp);
    let string_ctor = install_string_constructor(interp);
    let number_ctor = install_number_constructor(interp);
    let boolean_ctor = install_boolean_constructor(interp);
    let error_ctor = install_error_constructor(interp, "Error", interp.well_known.error_prototype);
    let eval_fn = interp.make_native_function("eval", 1, eval_native, None);

    let mut globals = vec![
        ("Object", object_ctor),
        ("Array", array_ctor),
        ("String", string_ctor),
        ("Number", number_ctor),
        ("Boolean", boolean_ctor),
        ("Error", error_ctor),
        ("eval", eval_fn),
    ];
    for kind in [ExcType::EvalError, ExcType::RangeError, ExcType::ReferenceError, ExcType::SyntaxError, ExcType::TypeError, ExcType::URIError] {
        let name: &'static str = kind.into();
        let prototype = interp.heap.alloc(JsObject::new_with_kind("Error", Some(interp.well_known.error_prototype), ObjectKind::Error));
        install_error_prototype(interp, prototype, name, "");
        let ctor = install_error_constructor(interp, name, prototype);
        globals.push((name, ctor));
    }

    let global = interp.global_object();
    for (name, id) in globals {
        let name_id = interp.intern(name);
        if let Some(obj) = interp.heap.get_mut(global) {
            obj.define_own_property(name_id, Property::with_attributes(Value::Object(id), PropertyAttributes::DONT_ENUM));
        }
    }

    eval_fn
}

/// ECMA-262 §15.1.2.1's indirect form: a non-string argument passes
/// through unchanged, otherwise the program text runs against the global
/// scope and global object. Reached from script for every call that isn't
/// the direct `eval(...)` form (`eval/expr.rs` routes that one to
/// `Interpreter::direct_eval` instead, using the caller's own scope/this).
///
/// Under `ext1`, an indirect call made with an object `this` runs against
/// that object instead: the receiver is pushed onto the global scope chain
/// and used as the program's `this`, rather than always falling back to
/// the global object.
fn eval_native(interp: &mut Interpreter, this: &Value, args: &[Value], _func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    let Some(arg) = args.first() else { return Ok(Value::Undefined) };
    let Value::String(text) = arg else { return Ok(arg.clone()) };
    let text = text.to_string_lossy();

    if interp.compat.contains(CompatFlags::EXT1) {
        if let Value::Object(receiver) = this {
            let mut scope = interp.global_scope();
            scope.push(*receiver);
            return interp.eval_program_text(&scope, this, &text);
        }
    }

    let scope = interp.global_scope();
    let global_this = Value::Object(interp.global_object());
    interp.eval_program_text(&scope, &global_this, &text)
}

fn define_method(interp: &mut Interpreter, target: HeapId, name: &'static str, length: u32, func: crate::function::NativeFn) {
    let func_id = interp.make_native_function(name, length, func, None);
    let name_id = interp.intern(name);
    if let Some(obj) = interp.heap.get_mut(target) {
        obj.define_own_property(name_id, Property::with_attributes(Value::Object(func_id), PropertyAttributes::DONT_ENUM));
    }
}

/// Links a constructor's `.prototype` to `prototype`, and `prototype`'s own
/// `constructor` back to the constructor (ECMA-262 §15.2.3.1 et al).
fn bind_constructor(interp: &mut Interpreter, ctor: HeapId, prototype: HeapId) {
    let prototype_id = interp.well_known.prototype;
    if let Some(obj) = interp.heap.get_mut(ctor) {
        obj.define_own_property(prototype_id, Property::with_attributes(Value::Object(prototype), PropertyAttributes::all()));
    }
    let constructor_id = interp.intern("constructor");
    if let Some(obj) = interp.heap.get_mut(prototype) {
        obj.define_own_property(constructor_id, Property::with_attributes(Value::Object(ctor), PropertyAttributes::DONT_ENUM));
    }
}

/// ECMA-262 §15.2.4: `Object.prototype.toString`/`valueOf`. Every other
/// object's `[[DefaultValue]]` bottoms out here through the prototype
/// chain, so these two are the only methods a truly minimal build cannot
/// skip.
fn install_object_prototype_methods(interp: &mut Interpreter) {
    let proto = interp.well_known.object_prototype;
    define_method(interp, proto, "toString", 0, object_to_string);
    define_method(interp, proto, "valueOf", 0, object_value_of);
}

fn object_to_string(interp: &mut Interpreter, this: &Value, _args: &[Value], _func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    let class = match this {
        Value::Object(id) => interp.heap.get(*id).map_or("Object", |o| o.class),
        Value::Undefined => "Undefined",
        Value::Null => "Null",
        _ => "Object",
    };
    Ok(Value::string(&format!("[object {class}]")))
}

fn object_value_of(interp: &mut Interpreter, this: &Value, _args: &[Value], _func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    if let Value::Object(id) = this {
        if let Some(obj) = interp.heap.get(*id) {
            return Ok(match &obj.kind {
                ObjectKind::StringObject(s) => Value::String(s.clone()),
                ObjectKind::NumberObject(n) => Value::Number(*n),
                ObjectKind::BooleanObject(b) => Value::Boolean(*b),
                _ => this.clone(),
            });
        }
    }
    Ok(this.clone())
}

/// ECMA-262 §15.3.4.2: not a faithful decompiler (there is no source text
/// retained on a `ScriptFunction` past parsing), just enough that
/// `String(f)`/`f + ''` on a function produces something recognizable.
fn install_function_prototype_methods(interp: &mut Interpreter) {
    let proto = interp.well_known.function_prototype;
    define_method(interp, proto, "toString", 0, function_to_string);
}

fn function_to_string(interp: &mut Interpreter, this: &Value, _args: &[Value], _func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    let Value::Object(id) = this else { return Ok(Value::string("function () {}")) };
    let Some(obj) = interp.heap.get(*id) else { return Ok(Value::string("function () {}")) };
    match obj.as_function() {
        Some(crate::function::FunctionData::Native(n)) => Ok(Value::string(&format!("function {}() {{ [native code] }}", n.name))),
        Some(crate::function::FunctionData::Script(s)) => {
            let name = s.name.map(|n| interp.resolve(n).to_owned()).unwrap_or_default();
            Ok(Value::string(&format!("function {name}() {{ ... }}")))
        }
        None => Ok(Value::string("function () {}")),
    }
}

/// ECMA-262 §15.11.4.4: `(name ? name : "Error")` then `": " + message` if
/// `message` is non-empty.
fn install_error_prototype(interp: &mut Interpreter, prototype: HeapId, name: &str, message: &str) {
    let name_id = interp.intern("name");
    let message_id = interp.intern("message");
    let name_value = Value::string(name);
    let message_value = Value::string(message);
    if let Some(obj) = interp.heap.get_mut(prototype) {
        obj.define_own_property(name_id, Property::with_attributes(name_value, PropertyAttributes::DONT_ENUM));
        obj.define_own_property(message_id, Property::with_attributes(message_value, PropertyAttributes::DONT_ENUM));
    }
    define_method(interp, prototype, "toString", 0, error_to_string);
}

fn error_to_string(interp: &mut Interpreter, this: &Value, _args: &[Value], _func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    let name_id = interp.intern("name");
    let message_id = interp.intern("message");
    let Value::Object(id) = this else { return Ok(Value::string("Error")) };
    let obj = interp.heap.get(*id).ok_or_else(|| interp.type_error("Error.prototype.toString called on dangling object"))?;
    let name = obj.get(&interp.heap, name_id, interp);
    let message = obj.get(&interp.heap, message_id, interp);
    let name = to_js_string(interp, &name).map_err(|_| interp.type_error("cannot convert name to string"))?;
    let message = to_js_string(interp, &message).map_err(|_| interp.type_error("cannot convert message to string"))?;
    if message.is_empty() {
        Ok(Value::String(name))
    } else {
        Ok(Value::string(&format!("{}: {}", name.to_string_lossy(), message.to_string_lossy())))
    }
}

/// ECMA-262 §15.2.2: `Object(value)` and `new Object(value)` behave
/// identically — an empty/`undefined`/`null` argument allocates a fresh
/// plain object, anything else goes through `ToObject`.
fn install_object_constructor(interp: &mut Interpreter) -> HeapId {
    let ctor = interp.make_native_function("Object", 1, object_call, Some(object_call));
    bind_constructor(interp, ctor, interp.well_known.object_prototype);
    ctor
}

fn object_call(interp: &mut Interpreter, _this: &Value, args: &[Value], _func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    match args.first() {
        None | Some(Value::Undefined | Value::Null) => {
            let proto = interp.well_known.object_prototype;
            Ok(Value::Object(interp.heap.alloc(JsObject::new_plain(Some(proto)))))
        }
        Some(v) => {
            let id = to_object(interp, v).map_err(|_| interp.type_error("cannot convert value to object"))?;
            Ok(Value::Object(id))
        }
    }
}

/// ECMA-262 §15.4.2: a single numeric argument sets `length` with no
/// elements; any other argument list becomes the array's elements in order.
fn install_array_constructor(interp: &mut Interpreter) -> HeapId {
    let ctor = interp.make_native_function("Array", 1, array_call, Some(array_call));
    bind_constructor(interp, ctor, interp.well_known.array_prototype);
    ctor
}

fn array_call(interp: &mut Interpreter, _this: &Value, args: &[Value], _func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    let proto = interp.well_known.array_prototype;
    let array_id = interp.heap.alloc(JsObject::new_with_kind("Array", Some(proto), ObjectKind::Array));
    let length_id = interp.well_known.length;
    if let [Value::Number(n)] = args {
        if *n < 0.0 || n.fract() != 0.0 || *n > f64::from(u32::MAX) {
            return Err(interp.range_error("invalid array length").into());
        }
        if let Some(obj) = interp.heap.get_mut(array_id) {
            obj.put_own(length_id, Value::Number(*n));
        }
        return Ok(Value::Object(array_id));
    }
    for (i, arg) in args.iter().enumerate() {
        let idx_id = interp.intern(&i.to_string());
        if let Some(obj) = interp.heap.get_mut(array_id) {
            obj.put_own(idx_id, arg.clone());
        }
    }
    if let Some(obj) = interp.heap.get_mut(array_id) {
        obj.put_own(length_id, Value::Number(args.len() as f64));
    }
    Ok(Value::Object(array_id))
}

/// ECMA-262 §15.5.2: called as a function, `ToString`; as a constructor,
/// wraps the string in a `String` object (§4.2's `StringObject` kind).
fn install_string_constructor(interp: &mut Interpreter) -> HeapId {
    let ctor = interp.make_native_function("String", 1, string_call, Some(string_construct));
    bind_constructor(interp, ctor, interp.well_known.string_prototype);
    ctor
}

fn string_call(interp: &mut Interpreter, _this: &Value, args: &[Value], _func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    match args.first() {
        None => Ok(Value::string("")),
        Some(v) => {
            let s = to_js_string(interp, v).map_err(|_| interp.type_error("cannot convert value to string"))?;
            Ok(Value::String(s))
        }
    }
}

fn string_construct(interp: &mut Interpreter, this: &Value, args: &[Value], func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    let prim = string_call(interp, this, args, func_id)?;
    Ok(Value::Object(interp.wrap_primitive(prim)))
}

/// ECMA-262 §15.7.2: called as a function, `ToNumber`; as a constructor,
/// wraps the number in a `Number` object.
fn install_number_constructor(interp: &mut Interpreter) -> HeapId {
    let ctor = interp.make_native_function("Number", 1, number_call, Some(number_construct));
    bind_constructor(interp, ctor, interp.well_known.number_prototype);
    ctor
}

fn number_call(interp: &mut Interpreter, _this: &Value, args: &[Value], _func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    match args.first() {
        None => Ok(Value::Number(0.0)),
        Some(v) => {
            let n = to_number(interp, v).map_err(|_| interp.type_error("cannot convert value to number"))?;
            Ok(Value::Number(n))
        }
    }
}

fn number_construct(interp: &mut Interpreter, this: &Value, args: &[Value], func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    let prim = number_call(interp, this, args, func_id)?;
    Ok(Value::Object(interp.wrap_primitive(prim)))
}

/// ECMA-262 §15.6.2: called as a function, `ToBoolean`; as a constructor,
/// wraps the boolean in a `Boolean` object.
fn install_boolean_constructor(interp: &mut Interpreter) -> HeapId {
    let ctor = interp.make_native_function("Boolean", 1, boolean_call, Some(boolean_construct));
    bind_constructor(interp, ctor, interp.well_known.boolean_prototype);
    ctor
}

fn boolean_call(_interp: &mut Interpreter, _this: &Value, args: &[Value], _func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    Ok(Value::Boolean(args.first().is_some_and(to_boolean)))
}

fn boolean_construct(interp: &mut Interpreter, this: &Value, args: &[Value], func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    let prim = boolean_call(interp, this, args, func_id)?;
    Ok(Value::Object(interp.wrap_primitive(prim)))
}

/// ECMA-262 §15.11.2/§15.11.6: `Error`/`EvalError`/`RangeError`/
/// `ReferenceError`/`SyntaxError`/`TypeError`/`URIError` all construct the
/// same way — an `Error`-kind object with `message` set from the first
/// argument if one was given — and called as a plain function (no `new`)
/// ECMA-262 specifies identical behavior. One `fn` pointer backs all seven;
/// `func_id` (the specific global constructor actually invoked) is how it
/// finds the right `.prototype` to attach, since a bare call passes `this`
/// as `undefined` and gives no other way to tell `TypeError(...)` apart from
/// `RangeError(...)`.
fn install_error_constructor(interp: &mut Interpreter, name: &'static str, prototype: HeapId) -> HeapId {
    let ctor = interp.make_native_function(name, 1, error_construct, Some(error_construct));
    bind_constructor(interp, ctor, prototype);
    ctor
}

fn error_construct(interp: &mut Interpreter, _this: &Value, args: &[Value], func_id: HeapId) -> Result<Value, crate::exception::RunError> {
    let prototype_id = interp.well_known.prototype;
    let proto = match interp.heap.get(func_id).map(|o| o.get(&interp.heap, prototype_id, interp)) {
        Some(Value::Object(p)) => p,
        _ => interp.well_known.error_prototype,
    };
    let obj_id = interp.heap.alloc(JsObject::new_with_kind("Error", Some(proto), ObjectKind::Error));
    if let Some(arg) = args.first() {
        let message = to_js_string(interp, arg).map_err(|_| interp.type_error("cannot convert message to string"))?;
        let message_id = interp.intern("message");
        if let Some(obj) = interp.heap.get_mut(obj_id) {
            obj.define_own_property(message_id, Property::with_attributes(Value::String(message), PropertyAttributes::DONT_ENUM));
        }
    }
    Ok(Value::Object(obj_id))
}
