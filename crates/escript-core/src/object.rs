//! The object protocol (spec.md §4.2): the internal `[[...]]` dispatch
//! vector ECMA-262 §8.6.2 specifies, plus the handful of exotic object kinds
//! (Array, String wrapper, Function, Error) the minimal built-in set
//! (SPEC_FULL.md §11) needs.
//!
//! Every object is a property map plus a prototype link plus (for exotic
//! objects) a `kind` that overrides a few of the default algorithms: one
//! `struct` for every object, dispatch by matching on a `kind` enum rather
//! than a trait-object vtable, since the set of exotic kinds is closed and
//! small.

use indexmap::IndexMap;

use crate::{
    function::FunctionData,
    heap::{Heap, HeapId},
    intern::StringId,
    strings::JsString,
    value::{to_primitive, PreferredType, Value},
    Interpreter,
};

bitflags::bitflags! {
    /// ES3 §8.6.1 property attributes. Accessor properties (getters/setters)
    /// are an ES5 feature and out of scope (spec.md Non-goals); every
    /// property here is a plain data property with these three attributes.
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct PropertyAttributes: u8 {
        const READ_ONLY   = 0b001;
        const DONT_ENUM   = 0b010;
        const DONT_DELETE = 0b100;
    }
}

#[derive(Debug, Clone)]
pub struct Property {
    pub value: Value,
    pub attributes: PropertyAttributes,
}

impl Property {
    #[must_use]
    pub fn new(value: Value) -> Self {
        Self { value, attributes: PropertyAttributes::empty() }
    }

    #[must_use]
    pub fn with_attributes(value: Value, attributes: PropertyAttributes) -> Self {
        Self { value, attributes }
    }
}

/// Distinguishes the exotic object kinds from a plain `Object.prototype`
/// descendant. Each variant overrides exactly the `[[...]]` methods
/// ECMA-262 calls out for it; everything else falls through to the default
/// algorithm on `JsObject`.
#[derive(Debug, Clone)]
pub enum ObjectKind {
    Plain,
    /// ECMA-262 §15.4.5.1: `length` is a writable data property that
    /// truncates or extends the array's index range as a side effect of
    /// being written, and whose value is always (greatest index + 1).
    Array,
    /// A `String` wrapper object (the result of `new String(...)` or the
    /// boxed receiver `ToObject` produces for a string primitive). Indexed
    /// properties `0..length` are read-only views into the wrapped string
    /// (ECMA-262 §15.5.5.2).
    StringObject(JsString),
    NumberObject(f64),
    BooleanObject(bool),
    Function(FunctionData),
    /// `Error` and its `.prototype`-sharing siblings the minimal built-in
    /// set ships (spec.md §7's exception kinds need *something* a `throw`
    /// can construct and a host can introspect via `.message`/`.name`).
    Error,
}

/// A heap-resident ECMA-262 object.
#[derive(Debug, Clone)]
pub struct JsObject {
    pub class: &'static str,
    pub prototype: Option<HeapId>,
    pub extensible: bool,
    pub kind: ObjectKind,
    properties: IndexMap<StringId, Property>,
}

impl JsObject {
    #[must_use]
    pub fn new_plain(prototype: Option<HeapId>) -> Self {
        Self { class: "Object", prototype, extensible: true, kind: ObjectKind::Plain, properties: IndexMap::new() }
    }

    #[must_use]
    pub fn new_with_kind(class: &'static str, prototype: Option<HeapId>, kind: ObjectKind) -> Self {
        Self { class, prototype, extensible: true, kind, properties: IndexMap::new() }
    }

    /// Defines or overwrites a property directly, bypassing `[[CanPut]]`.
    /// Used for initial setup (binding arguments, installing built-ins)
    /// where ECMA-262 itself bypasses the normal put algorithm.
    pub fn define_own_property(&mut self, name: StringId, property: Property) {
        self.properties.insert(name, property);
    }

    #[must_use]
    pub fn own_property(&self, name: StringId) -> Option<&Property> {
        self.properties.get(&name)
    }

    pub fn own_property_mut(&mut self, name: StringId) -> Option<&mut Property> {
        self.properties.get_mut(&name)
    }

    pub fn remove_own_property(&mut self, name: StringId) -> Option<Property> {
        self.properties.shift_remove(&name)
    }

    #[must_use]
    pub fn own_property_names(&self) -> impl Iterator<Item = StringId> + '_ {
        self.properties.keys().copied()
    }

    /// ECMA-262 §8.6.2.1 `[[Get]]`, walking the prototype chain. Exotic
    /// string-index reads are resolved before falling back to the property
    /// map, matching §15.5.5.2.
    #[must_use]
    pub fn get(&self, heap: &Heap, name: StringId, interp: &Interpreter) -> Value {
        if let ObjectKind::StringObject(s) = &self.kind {
            if let Some(value) = string_indexed_get(s, name, interp) {
                return value;
            }
        }
        if let Some(prop) = self.properties.get(&name) {
            return prop.value.clone();
        }
        match self.prototype {
            Some(proto_id) => match heap.get(proto_id) {
                Some(proto) => proto.get(heap, name, interp),
                None => Value::Undefined,
            },
            None => Value::Undefined,
        }
    }

    /// ECMA-262 §8.6.2.2 `[[CanPut]]`.
    #[must_use]
    pub fn can_put(&self, heap: &Heap, name: StringId) -> bool {
        if let Some(prop) = self.properties.get(&name) {
            return !prop.attributes.contains(PropertyAttributes::READ_ONLY);
        }
        match self.prototype {
            Some(proto_id) => heap.get(proto_id).is_some_and(|proto| proto.can_put(heap, name)),
            None => self.extensible,
        }
    }

    /// ECMA-262 §8.6.2.3 `[[Put]]`. The array-exotic `length` side effect
    /// (truncating indices at or above a shrunk length) happens in the
    /// caller (`Interpreter::put_property`) since it needs mutable access to
    /// the heap to drop the truncated indices, which a `&mut self` method
    /// here cannot reach for prototype-chain writes.
    pub fn put_own(&mut self, name: StringId, value: Value) {
        match self.properties.get_mut(&name) {
            Some(prop) => prop.value = value,
            None => {
                self.properties.insert(name, Property::new(value));
            }
        }
    }

    /// ECMA-262 §8.6.2.4 `[[HasProperty]]`.
    #[must_use]
    pub fn has_property(&self, heap: &Heap, name: StringId) -> bool {
        if self.properties.contains_key(&name) {
            return true;
        }
        match self.prototype {
            Some(proto_id) => heap.get(proto_id).is_some_and(|proto| proto.has_property(heap, name)),
            None => false,
        }
    }

    /// ECMA-262 §8.6.2.5 `[[Delete]]`. Returns `false` when a `DontDelete`
    /// own property blocks the deletion.
    pub fn delete(&mut self, name: StringId) -> bool {
        match self.properties.get(&name) {
            Some(prop) if prop.attributes.contains(PropertyAttributes::DONT_DELETE) => false,
            Some(_) => {
                self.properties.shift_remove(&name);
                true
            }
            None => true,
        }
    }

    /// ECMA-262 §8.6.2.6 `[[DefaultValue]]`. `self_id` is this object's own
    /// handle, needed to pass as `this` when invoking `valueOf`/`toString`.
    #[must_use]
    pub fn default_value(&self, heap: &Heap, interp: &mut Interpreter, self_id: HeapId, hint: PreferredType) -> Option<Value> {
        let order: [&str; 2] = match hint {
            PreferredType::StringType => ["toString", "valueOf"],
            PreferredType::Number | PreferredType::Default => ["valueOf", "toString"],
        };
        for method_name in order {
            let id = interp.intern(method_name);
            let method = self.get(heap, id, interp);
            if let Value::Object(method_id) = &method {
                if heap.get(*method_id).is_some_and(JsObject::is_callable) {
                    if let Ok(result) = interp.call_method(*method_id, Value::Object(self_id), &[]) {
                        if !matches!(result, Value::Object(_)) {
                            return Some(result);
                        }
                    }
                }
            }
        }
        None
    }

    #[must_use]
    pub fn is_callable(&self) -> bool {
        matches!(self.kind, ObjectKind::Function(_))
    }

    #[must_use]
    pub fn as_function(&self) -> Option<&FunctionData> {
        match &self.kind {
            ObjectKind::Function(f) => Some(f),
            _ => None,
        }
    }

    /// ECMA-262 §15.3.5.3 `[[HasInstance]]`: walks `value`'s prototype chain
    /// looking for this function's own `.prototype` property value.
    #[must_use]
    pub fn has_instance(&self, heap: &Heap, interp: &Interpreter, value: &Value) -> bool {
        if !self.is_callable() {
            return false;
        }
        let proto_id_prop = interp.well_known.prototype;
        let target_proto = match self.get(heap, proto_id_prop, interp) {
            Value::Object(id) => id,
            _ => return false,
        };
        let Value::Object(mut current) = value.clone() else { return false };
        loop {
            let Some(obj) = heap.get(current) else { return false };
            match obj.prototype {
                Some(p) if p == target_proto => return true,
                Some(p) => current = p,
                None => return false,
            }
        }
    }

    /// ECMA-262 §8.6.2.7 `[[DefaultValue]]` enumeration order support: own
    /// enumerable property names in insertion order, as §12.6.4's `for-in`
    /// relies on (spec.md §8's boundary scenario over an object literal).
    pub fn enumerate_own(&self) -> impl Iterator<Item = StringId> + '_ {
        self.properties.iter().filter(|(_, p)| !p.attributes.contains(PropertyAttributes::DONT_ENUM)).map(|(k, _)| *k)
    }
}

fn string_indexed_get(s: &JsString, name: StringId, interp: &Interpreter) -> Option<Value> {
    let text = interp.resolve(name);
    if text == "length" {
        return Some(Value::Number(s.len() as f64));
    }
    let index: usize = text.parse().ok()?;
    s.units().get(index).map(|&unit| Value::String(JsString::from_units(vec![unit])))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{CompatFlags, Interpreter};

    fn interp() -> Interpreter {
        Interpreter::new(CompatFlags::default())
    }

    #[test]
    fn put_then_get_own_property() {
        let interp = interp();
        let mut obj = JsObject::new_plain(None);
        let name = crate::intern::intern_global("x");
        obj.put_own(name, Value::Number(1.0));
        assert!(matches!(obj.get(&crate::heap::Heap::new(), name, &interp), Value::Number(n) if n == 1.0));
    }

    #[test]
    fn dont_delete_blocks_deletion() {
        let mut obj = JsObject::new_plain(None);
        let name = crate::intern::intern_global("x");
        obj.define_own_property(name, Property::with_attributes(Value::Number(1.0), PropertyAttributes::DONT_DELETE));
        assert!(!obj.delete(name));
    }

    #[test]
    fn string_object_exposes_length_and_indices() {
        let interp = interp();
        let s = JsString::from_str("ab");
        let obj = JsObject::new_with_kind("String", None, ObjectKind::StringObject(s));
        let heap = crate::heap::Heap::new();
        let len_id = crate::intern::intern_global("length");
        assert!(matches!(obj.get(&heap, len_id, &interp), Value::Number(n) if n == 2.0));
    }
}
