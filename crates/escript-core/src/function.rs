//! Function objects and invocation (spec.md §3.6, §4.5).
//!
//! ES3 closures only need a snapshot of the enclosing scope chain — there is
//! no per-variable cell capture the way a block-scoped language needs, so a
//! [`ScriptFunction`] is just its parameter list, its body, and the
//! [`Scope`] it closed over. Parameter binding is positional-only: missing
//! arguments bind to `undefined`, extra arguments are still reachable via
//! `arguments` but not bound to a name (ECMA-262 §10.1.3, §10.1.8).

use std::rc::Rc;

use crate::{
    ast::{Node, Stmt},
    exception::RunError,
    heap::HeapId,
    intern::StringId,
    namespace::Scope,
    object::{JsObject, ObjectKind, Property, PropertyAttributes},
    value::Value,
    Interpreter,
};

/// `func_id` is the native function's own heap handle — needed by built-ins
/// like the `NativeError` family, where several distinct global constructors
/// (`Error`, `TypeError`, `RangeError`, ...) share one `fn` pointer and can
/// only tell which one was actually invoked by looking up their own
/// `.prototype` through this handle (`fn` items can't close over state the
/// way a closure would).
pub type NativeFn = fn(&mut Interpreter, &Value, &[Value], HeapId) -> Result<Value, RunError>;

#[derive(Clone)]
pub enum FunctionData {
    Script(Rc<ScriptFunction>),
    Native(NativeFunction),
}

impl std::fmt::Debug for FunctionData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Script(s) => f.debug_struct("Script").field("params", &s.params.len()).finish(),
            Self::Native(n) => f.debug_struct("Native").field("name", &n.name).finish(),
        }
    }
}

pub struct ScriptFunction {
    pub name: Option<StringId>,
    pub params: Vec<StringId>,
    pub body: Vec<Node<Stmt>>,
    pub scope: Scope,
}

#[derive(Clone, Copy)]
pub struct NativeFunction {
    pub name: &'static str,
    pub length: u32,
    pub func: NativeFn,
    /// Overrides `[[Construct]]` for built-ins whose constructed form
    /// differs from their called form (`String`, `Number`, `Boolean`,
    /// `Array`, `Object`, `Error` all wrap or allocate differently than
    /// their plain-call conversion/no-op). `None` falls back to the
    /// generic `[[Construct]]` algorithm (ECMA-262 §13.2.2).
    pub construct: Option<NativeFn>,
}

impl FunctionData {
    #[must_use]
    pub fn length(&self) -> u32 {
        match self {
            Self::Script(s) => u32::try_from(s.params.len()).unwrap_or(u32::MAX),
            Self::Native(n) => n.length,
        }
    }
}

impl Interpreter {
    /// Creates a `Function` object for a script-level function
    /// expression/declaration: allocates the object, a fresh `.prototype`
    /// object (so `new F()` has somewhere to hang instances off), and sets
    /// `.length`/`.name` (ECMA-262 §13.2).
    pub fn make_script_function(
        &mut self,
        name: Option<StringId>,
        params: Vec<StringId>,
        body: Vec<Node<Stmt>>,
        scope: Scope,
    ) -> HeapId {
        let data = Rc::new(ScriptFunction { name, params, body, scope });
        let length = u32::try_from(data.params.len()).unwrap_or(u32::MAX);
        let func_proto = self.well_known.function_prototype;
        let func_id = self.heap.alloc(JsObject::new_with_kind(
            "Function",
            Some(func_proto),
            ObjectKind::Function(FunctionData::Script(data)),
        ));

        let object_proto = self.well_known.object_prototype;
        let prototype_obj = self.heap.alloc(JsObject::new_plain(Some(object_proto)));
        let constructor_id = self.intern("constructor");
        self.heap.get_mut(prototype_obj).unwrap().define_own_property(
            constructor_id,
            Property::with_attributes(Value::Object(func_id), PropertyAttributes::DONT_ENUM),
        );

        let prototype_id = self.well_known.prototype;
        let length_id = self.well_known.length;
        if let Some(obj) = self.heap.get_mut(func_id) {
            obj.define_own_property(
                prototype_id,
                Property::with_attributes(Value::Object(prototype_obj), PropertyAttributes::DONT_DELETE),
            );
            obj.define_own_property(
                length_id,
                Property::with_attributes(Value::Number(f64::from(length)), PropertyAttributes::all()),
            );
        }
        func_id
    }

    /// Wraps a host function pointer as a callable object (spec.md §6.1's
    /// `cfunction_make`). `construct` overrides `[[Construct]]` for built-ins
    /// whose constructed form differs from their called form.
    pub fn make_native_function(&mut self, name: &'static str, length: u32, func: NativeFn, construct: Option<NativeFn>) -> HeapId {
        let func_proto = self.well_known.function_prototype;
        let func_id = self.heap.alloc(JsObject::new_with_kind(
            "Function",
            Some(func_proto),
            ObjectKind::Function(FunctionData::Native(NativeFunction { name, length, func, construct })),
        ));
        let length_id = self.well_known.length;
        if let Some(obj) = self.heap.get_mut(func_id) {
            obj.define_own_property(
                length_id,
                Property::with_attributes(Value::Number(f64::from(length)), PropertyAttributes::all()),
            );
        }
        func_id
    }

    /// Invokes a method found via `[[Get]]`, e.g. `valueOf`/`toString`
    /// during `[[DefaultValue]]`. Just `call_function` under a name that
    /// reads naturally at the call site.
    pub fn call_method(&mut self, func_id: HeapId, this: Value, args: &[Value]) -> Result<Value, RunError> {
        self.call_function(func_id, this, args)
    }

    /// ECMA-262 §13.2.1 `[[Call]]`.
    pub fn call_function(&mut self, func_id: HeapId, this: Value, args: &[Value]) -> Result<Value, RunError> {
        if let Err(err) = self.resources.enter_call() {
            // A recursion-depth trip is an ordinary, catchable `RangeError`
            // ("stack overflow never corrupts state") rather than a
            // host-fatal abort — other `ResourceError`s (allocation/time
            // limits) stay `Uncatchable` via the blanket conversion.
            return Err(match err {
                crate::resource::ResourceError::RecursionLimitExceeded { .. } => self.range_error("stack overflow").into(),
                other => other.into(),
            });
        }
        let result = self.call_function_inner(func_id, this, args);
        self.resources.exit_call();
        result
    }

    fn call_function_inner(&mut self, func_id: HeapId, this: Value, args: &[Value]) -> Result<Value, RunError> {
        let data = {
            let obj = self.heap.get(func_id).ok_or_else(|| RunError::Internal("call on dangling function".into()))?;
            obj.as_function().cloned().ok_or_else(|| RunError::Internal("call on non-function".into()))?
        };
        match data {
            FunctionData::Native(native) => (native.func)(self, &this, args, func_id),
            FunctionData::Script(script) => {
                let object_proto = self.well_known.object_prototype;
                let activation = self.heap.alloc(JsObject::new_plain(Some(object_proto)));
                self.bind_arguments(activation, func_id, &script, args);

                let mut chain = vec![activation];
                chain.extend_from_slice(script.scope.chain());
                let call_scope = Scope::from_chain(chain);

                self.hoist_declarations(&call_scope, &script.body);
                let completion = self.exec_block(&call_scope, &script.body, &this)?;
                Ok(match completion {
                    crate::value::Completion::Return(v) => *v,
                    _ => Value::Undefined,
                })
            }
        }
    }

    fn bind_arguments(&mut self, activation: HeapId, func_id: HeapId, script: &ScriptFunction, args: &[Value]) {
        for (i, &param) in script.params.iter().enumerate() {
            let value = args.get(i).cloned().unwrap_or(Value::Undefined);
            if let Some(obj) = self.heap.get_mut(activation) {
                obj.put_own(param, value);
            }
        }
        let arguments_id = self.intern("arguments");
        let object_proto = self.well_known.object_prototype;
        let arguments_obj = self.heap.alloc(JsObject::new_plain(Some(object_proto)));
        let length_id = self.well_known.length;
        if let Some(obj) = self.heap.get_mut(arguments_obj) {
            obj.define_own_property(
                length_id,
                Property::with_attributes(Value::Number(args.len() as f64), PropertyAttributes::DONT_ENUM),
            );
            for (i, arg) in args.iter().enumerate() {
                let idx_id = self.intern(&i.to_string());
                obj.put_own(idx_id, arg.clone());
            }
        }
        let callee_id = self.intern("callee");
        if let Some(obj) = self.heap.get_mut(arguments_obj) {
            obj.define_own_property(callee_id, Property::with_attributes(Value::Object(func_id), PropertyAttributes::DONT_ENUM));
        }
        if let Some(obj) = self.heap.get_mut(activation) {
            obj.define_own_property(arguments_id, Property::with_attributes(Value::Object(arguments_obj), PropertyAttributes::DONT_ENUM));
        }
    }

    /// ECMA-262 §13.2.2 `[[Construct]]`.
    pub fn construct(&mut self, func_id: HeapId, args: &[Value]) -> Result<Value, RunError> {
        let native_construct = self.heap.get(func_id).and_then(|o| match o.as_function() {
            Some(FunctionData::Native(n)) => n.construct,
            _ => None,
        });
        if let Some(ctor) = native_construct {
            return ctor(self, &Value::Undefined, args, func_id);
        }
        let prototype_id = self.well_known.prototype;
        let proto_value = self
            .heap
            .get(func_id)
            .ok_or_else(|| RunError::Internal("construct on dangling function".into()))?
            .get(&self.heap, prototype_id, self);
        let prototype = match proto_value {
            Value::Object(id) => Some(id),
            _ => Some(self.well_known.object_prototype),
        };
        let new_object = self.heap.alloc(JsObject::new_plain(prototype));
        let result = self.call_function(func_id, Value::Object(new_object), args)?;
        Ok(match result {
            Value::Object(_) => result,
            _ => Value::Object(new_object),
        })
    }
}
