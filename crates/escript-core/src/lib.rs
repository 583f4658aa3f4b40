//! escript — an embeddable ECMA-262 (3rd edition) scripting language
//! interpreter (spec.md §1-§9): lexer, recursive-descent parser, AST, and a
//! tree-walking evaluator/VM.
//!
//! [`Interpreter`] is the root object spec.md §3.7 describes: it owns the
//! object heap, the per-interpreter intern table, the global object/scope,
//! compatibility flags, the resource tracker, and the trace callback. A host
//! builds one with [`Interpreter::new`] and drives it through [`run::Global_eval`]
//! or a [`repl::ReplSession`].

#![expect(dead_code, reason = "some host-API surface has no internal caller yet")]

mod ast;
mod builtins;
mod compat;
mod eval;
mod exception;
mod function;
mod heap;
mod intern;
mod lexer;
mod namespace;
mod object;
mod parser;
mod repl;
mod resource;
mod run;
mod source;
mod strings;
mod token;
mod tracer;
mod value;

pub use crate::{
    ast::{pretty::Printer, Program},
    compat::{CompatFlags, UnknownCompatFlag},
    exception::{CallKind, CodeLoc, ExcType, Exception, RunError, StackFrame},
    function::NativeFn,
    heap::{Heap, HeapId, HeapStats},
    intern::{intern_global, resolve_global, Interner, StringId},
    object::{JsObject, ObjectKind, Property, PropertyAttributes},
    repl::ReplSession,
    resource::{LimitedTracker, NoLimitTracker, ResourceError, ResourceTracker},
    run::{error_throw, eval_functionbody, parse_function, Global_eval},
    source::{MalformedInputError, Source},
    strings::JsString,
    tracer::{CoverageTracer, NoopTracer, RecordingTracer, StderrTracer, TraceEvent, VmTracer},
    value::{to_boolean, to_number, Completion, PreferredType, Reference, ReferenceBase, Value},
};

use crate::{
    intern::StringId as Sid,
    object::JsObject as Obj,
    value::{to_primitive, PreferredType as Hint},
};

/// [`StringId`]s and [`HeapId`]s an [`Interpreter`] looks up often enough to
/// cache rather than re-intern/re-resolve every time — ECMA-262's own
/// algorithms reach for `prototype`, `length`, and the six built-in
/// prototype objects constantly (`[[Get]]` on `.prototype`, `[[Construct]]`,
/// `ToObject`, `[[DefaultValue]]`).
#[derive(Debug, Clone, Copy)]
pub(crate) struct WellKnown {
    pub prototype: Sid,
    pub length: Sid,
    pub object_prototype: HeapId,
    pub function_prototype: HeapId,
    pub array_prototype: HeapId,
    pub string_prototype: HeapId,
    pub number_prototype: HeapId,
    pub boolean_prototype: HeapId,
    pub error_prototype: HeapId,
    /// The global `eval` function's own heap handle, so a direct call
    /// (`eval(...)` reached via the bare identifier) can be told apart from
    /// an indirect one (any other expression producing the same function)
    /// without re-resolving `eval` by name at every call site.
    pub eval_function: HeapId,
}

/// The root object spec.md §3.7 describes. Not `Clone` — a heap full of
/// `HeapId`s is only meaningful relative to the one `Heap` that allocated
/// them, so copying an `Interpreter` would silently invalidate every handle
/// a script or a host currently holds.
pub struct Interpreter {
    pub(crate) heap: heap::Heap,
    interner: intern::Interner,
    pub(crate) well_known: WellKnown,
    global: heap::HeapId,
    pub(crate) resources: Box<dyn resource::ResourceTracker>,
    pub(crate) tracer: Box<dyn tracer::VmTracer>,
    pub compat: compat::CompatFlags,
    /// The `Source` the statement currently executing came from, and that
    /// statement's location within it — refreshed on every statement
    /// boundary (`tracer_on_statement`) so that `reference_error`/`type_error`
    /// can stamp the exceptions they raise with the real throw site (spec.md
    /// §7's "each throw captures the current `L`") instead of a placeholder.
    current_source: Option<std::rc::Rc<source::Source>>,
    current_loc: exception::CodeLoc,
}

impl Interpreter {
    /// `interpreter_new()` + `interpreter_init(&i)` from spec.md §6.1,
    /// collapsed into one call: allocates the heap, installs every built-in
    /// prototype/constructor (`builtins::bootstrap`), and returns a ready-to-run
    /// interpreter.
    #[must_use]
    pub fn new(compat: compat::CompatFlags) -> Self {
        let mut heap = heap::Heap::new();
        let mut interner = intern::Interner::new();

        let object_prototype = heap.alloc(object::JsObject::new_plain(None));
        let function_prototype =
            heap.alloc(object::JsObject::new_with_kind("Function", Some(object_prototype), object::ObjectKind::Plain));
        let array_prototype =
            heap.alloc(object::JsObject::new_with_kind("Array", Some(object_prototype), object::ObjectKind::Array));
        let string_prototype = heap.alloc(object::JsObject::new_with_kind(
            "String",
            Some(object_prototype),
            object::ObjectKind::StringObject(strings::JsString::from_str("")),
        ));
        let number_prototype = heap.alloc(object::JsObject::new_with_kind(
            "Number",
            Some(object_prototype),
            object::ObjectKind::NumberObject(0.0),
        ));
        let boolean_prototype = heap.alloc(object::JsObject::new_with_kind(
            "Boolean",
            Some(object_prototype),
            object::ObjectKind::BooleanObject(false),
        ));
        let error_prototype =
            heap.alloc(object::JsObject::new_with_kind("Error", Some(object_prototype), object::ObjectKind::Error));

        let well_known = WellKnown {
            prototype: interner.intern("prototype"),
            length: interner.intern("length"),
            object_prototype,
            function_prototype,
            array_prototype,
            string_prototype,
            number_prototype,
            boolean_prototype,
            error_prototype,
            // Overwritten below once `bootstrap` allocates the real `eval`
            // function; `object_prototype` is just a harmless placeholder
            // nothing will ever compare equal to a real function's id against
            // before then.
            eval_function: object_prototype,
        };

        let global = heap.alloc(object::JsObject::new_plain(Some(object_prototype)));

        let mut interp = Self {
            heap,
            interner,
            well_known,
            global,
            resources: Box::new(resource::NoLimitTracker),
            tracer: Box::new(tracer::NoopTracer),
            compat,
            current_source: None,
            current_loc: exception::CodeLoc::default(),
        };
        let eval_function = builtins::bootstrap(&mut interp);
        interp.well_known.eval_function = eval_function;
        interp
    }

    /// Swaps in a host-supplied [`resource::ResourceTracker`], e.g. a
    /// [`resource::LimitedTracker`] bounding recursion depth (spec.md §5).
    pub fn set_resource_tracker(&mut self, tracker: impl resource::ResourceTracker + 'static) {
        self.resources = Box::new(tracker);
    }

    /// Swaps in a host-supplied [`tracer::VmTracer`] (spec.md §3.7's
    /// "optional trace callback").
    pub fn set_tracer(&mut self, tracer: impl tracer::VmTracer + 'static) {
        self.tracer = Box::new(tracer);
    }

    #[must_use]
    pub fn global_object(&self) -> heap::HeapId {
        self.global
    }

    #[must_use]
    pub fn global_scope(&self) -> namespace::Scope {
        namespace::Scope::new(self.global)
    }

    /// Interns `s` in this interpreter's own table (spec.md §6.1's `intern`).
    pub fn intern(&mut self, s: &str) -> Sid {
        self.interner.intern(s)
    }

    #[must_use]
    pub fn resolve(&self, id: Sid) -> &str {
        self.interner.resolve(id)
    }

    /// `Expr::String` nodes carry a `StringId` into this same table rather
    /// than an already-built [`strings::JsString`], so evaluating a string
    /// literal goes through here to materialize the runtime value.
    #[must_use]
    pub(crate) fn resolve_js_string(&self, id: Sid) -> strings::JsString {
        strings::JsString::from_str(self.interner.resolve(id))
    }

    /// ECMA-262 §8.6.2.6 `[[DefaultValue]]`.
    ///
    /// Deliberately does not delegate to [`object::JsObject::default_value`]:
    /// that method takes `interp: &mut Interpreter` alongside a borrowed
    /// `heap: &Heap`, which cannot be obtained from a method already holding
    /// `&mut self` without aliasing `self.heap` as both shared and mutable at
    /// once. Every lookup below borrows `self`/`self.heap` only long enough
    /// to clone out an owned `Value`, so the borrow has already ended by the
    /// time `call_method` needs `&mut self`.
    pub fn default_value(&mut self, id: heap::HeapId, hint: Hint) -> Option<Value> {
        let order: [&str; 2] = match hint {
            Hint::StringType => ["toString", "valueOf"],
            Hint::Number | Hint::Default => ["valueOf", "toString"],
        };
        for method_name in order {
            let method_id = self.intern(method_name);
            let method = self.heap.get(id)?.get(&self.heap, method_id, self);
            if let Value::Object(callee) = method {
                if self.heap.get(callee).is_some_and(Obj::is_callable) {
                    if let Ok(result) = self.call_method(callee, Value::Object(id), &[]) {
                        if !matches!(result, Value::Object(_)) {
                            return Some(result);
                        }
                    }
                }
            }
        }
        None
    }

    /// ECMA-262 §9.9 `ToObject` applied to a primitive: boxes `value` in the
    /// wrapper kind matching its type, linked to that type's well-known
    /// `.prototype`. Panics on `Undefined`/`Null`/`Object` — callers (only
    /// [`value::to_object`]) have already excluded those.
    pub(crate) fn wrap_primitive(&mut self, value: Value) -> heap::HeapId {
        match value {
            Value::Boolean(b) => {
                let proto = self.well_known.boolean_prototype;
                self.heap.alloc(object::JsObject::new_with_kind("Boolean", Some(proto), object::ObjectKind::BooleanObject(b)))
            }
            Value::Number(n) => {
                let proto = self.well_known.number_prototype;
                self.heap.alloc(object::JsObject::new_with_kind("Number", Some(proto), object::ObjectKind::NumberObject(n)))
            }
            Value::String(s) => {
                let proto = self.well_known.string_prototype;
                self.heap.alloc(object::JsObject::new_with_kind("String", Some(proto), object::ObjectKind::StringObject(s)))
            }
            Value::Undefined | Value::Null | Value::Object(_) | Value::Reference(_) | Value::Completion(_) => {
                unreachable!("wrap_primitive only called for Boolean/Number/String")
            }
        }
    }

    pub(crate) fn current_source(&self) -> Option<&source::Source> {
        self.current_source.as_deref()
    }

    pub(crate) fn set_current_source(&mut self, source: std::rc::Rc<source::Source>) {
        self.current_source = Some(source);
        self.current_loc = exception::CodeLoc::default();
    }

    pub(crate) fn current_loc(&self) -> exception::CodeLoc {
        self.current_loc
    }

    pub(crate) fn interner_mut(&mut self) -> &mut intern::Interner {
        &mut self.interner
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_interpreter_has_distinct_well_known_prototypes() {
        let interp = Interpreter::new(CompatFlags::default());
        assert_ne!(interp.well_known.object_prototype, interp.well_known.array_prototype);
        assert_ne!(interp.well_known.object_prototype, interp.well_known.function_prototype);
    }

    #[test]
    fn default_value_of_boxed_number_is_the_wrapped_primitive() {
        let mut interp = Interpreter::new(CompatFlags::default());
        let id = interp.wrap_primitive(Value::Number(42.0));
        let result = interp.default_value(id, PreferredType::Number);
        assert!(matches!(result, Some(Value::Number(n)) if n == 42.0));
    }

    #[test]
    fn wrap_primitive_links_the_matching_prototype() {
        let mut interp = Interpreter::new(CompatFlags::default());
        let id = interp.wrap_primitive(Value::string("hi"));
        assert_eq!(interp.heap.get(id).unwrap().prototype, Some(interp.well_known.string_prototype));
    }

    #[test]
    fn to_primitive_round_trips_through_default_value() {
        let mut interp = Interpreter::new(CompatFlags::default());
        let id = interp.wrap_primitive(Value::Boolean(true));
        let prim = to_primitive(&mut interp, &Value::Object(id), PreferredType::Default).unwrap();
        assert!(matches!(prim, Value::Boolean(true)));
    }
}
