//! Scope chains (spec.md §3.4): ES3 has no separate "environment record"
//! machinery distinct from objects — ECMA-262 itself models the variable
//! object of an execution context, the activation object of a function
//! call, and the object a `with` statement introduces as ordinary objects
//! threaded through a chain. This module is just that chain plus the
//! identifier-resolution walk over it (`resolve`), which is also exactly
//! what a `with` statement's dynamic scoping needs: pushing an arbitrary
//! object onto the chain and popping it on exit is the entire feature.
//!
//! Because closures only ever capture "a reference to the enclosing scope
//! chain" rather than per-variable cells, a closure is simply a
//! `Vec<HeapId>` snapshot taken when the function expression is evaluated —
//! there is no separate cell-capture step the way a language with block
//! scoping and `let` needs.

use crate::{heap::HeapId, intern::StringId, value::Value, Interpreter};

/// A scope chain: innermost scope last is intentionally avoided — this
/// crate stores innermost *first* so `resolve` is a straightforward
/// front-to-back walk, matching how a function's activation object needs to
/// shadow everything captured by its `[[Scope]]`.
#[derive(Debug, Clone)]
pub struct Scope {
    chain: Vec<HeapId>,
}

impl Scope {
    #[must_use]
    pub fn new(global: HeapId) -> Self {
        Self { chain: vec![global] }
    }

    #[must_use]
    pub fn from_chain(chain: Vec<HeapId>) -> Self {
        Self { chain }
    }

    #[must_use]
    pub fn chain(&self) -> &[HeapId] {
        &self.chain
    }

    pub fn push(&mut self, object: HeapId) {
        self.chain.insert(0, object);
    }

    pub fn pop(&mut self) {
        self.chain.remove(0);
    }

    #[must_use]
    pub fn global(&self) -> HeapId {
        *self.chain.last().expect("scope chain always has a global object")
    }

    /// ECMA-262 §10.1.4 Identifier Resolution: returns the first object in
    /// the chain that has `name` as a property, innermost scope wins.
    #[must_use]
    pub fn resolve(&self, interp: &Interpreter, name: StringId) -> Option<HeapId> {
        self.chain.iter().copied().find(|&id| {
            interp.heap.get(id).is_some_and(|obj| obj.has_property(&interp.heap, name))
        })
    }

    /// Reads a binding, raising nothing itself — an unresolved identifier is
    /// `Value::Reference` with `base: None`, which `GetValue` turns into a
    /// `ReferenceError` (spec.md §7).
    #[must_use]
    pub fn get(&self, interp: &Interpreter, name: StringId) -> Value {
        match self.resolve(interp, name) {
            Some(id) => interp.heap.get(id).expect("resolved binding must exist").get(&interp.heap, name, interp),
            None => Value::Undefined,
        }
    }

    /// Declares `name` as `undefined` on the innermost scope object if it is
    /// not already bound anywhere in the chain — `var` hoisting (ECMA-262
    /// §10.1.3).
    pub fn declare_var(&self, interp: &mut Interpreter, name: StringId) {
        if self.resolve(interp, name).is_some() {
            return;
        }
        let target = *self.chain.first().expect("scope chain never empty");
        if let Some(obj) = interp.heap.get_mut(target) {
            obj.put_own(name, Value::Undefined);
        }
    }

    /// Declares a function binding on the innermost scope object
    /// unconditionally overwriting an existing `var` placeholder, matching
    /// ECMA-262 §10.1.3's function-declarations-bind-first rule.
    pub fn declare_function(&self, interp: &mut Interpreter, name: StringId, value: Value) {
        let target = *self.chain.first().expect("scope chain never empty");
        if let Some(obj) = interp.heap.get_mut(target) {
            obj.put_own(name, value);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{object::JsObject, CompatFlags};

    #[test]
    fn inner_scope_shadows_outer() {
        let mut interp = Interpreter::new(CompatFlags::default());
        let outer = interp.heap.alloc(JsObject::new_plain(None));
        let inner = interp.heap.alloc(JsObject::new_plain(None));
        let name = interp.intern("x");
        interp.heap.get_mut(outer).unwrap().put_own(name, Value::Number(1.0));
        interp.heap.get_mut(inner).unwrap().put_own(name, Value::Number(2.0));
        let scope = Scope::from_chain(vec![inner, outer]);
        assert!(matches!(scope.get(&interp, name), Value::Number(n) if n == 2.0));
    }

    #[test]
    fn declare_var_does_not_clobber_existing_binding() {
        let mut interp = Interpreter::new(CompatFlags::default());
        let global = interp.heap.alloc(JsObject::new_plain(None));
        let scope = Scope::new(global);
        let name = interp.intern("x");
        interp.heap.get_mut(global).unwrap().put_own(name, Value::Number(5.0));
        scope.declare_var(&mut interp, name);
        assert!(matches!(scope.get(&interp, name), Value::Number(n) if n == 5.0));
    }
}
