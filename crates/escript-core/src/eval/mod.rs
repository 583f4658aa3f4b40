//! The tree-walking evaluator (spec.md §4.4): statement/expression
//! evaluation, completions, and the Reference dereferencing algorithms
//! (`GetValue`/`PutValue`, ECMA-262 §8.7.1/§8.7.2).
//!
//! Split the way the component table implies: this module holds the shared
//! machinery (hoisting, completions, reference resolution); [`expr`] and
//! [`stmt`] hold expression and statement evaluation respectively.

mod expr;
mod stmt;

use crate::{
    ast::{ForInit, Node, Stmt},
    exception::{ExcType, Exception, RunError},
    namespace::Scope,
    value::{Completion, Reference, ReferenceBase, Value},
    Interpreter,
};

impl Interpreter {
    /// ECMA-262 §10.1.3: hoists `var` and nested (non-function-body) `var`
    /// declarations as `undefined` bindings, and binds function
    /// declarations to their value, before executing a block's statements.
    /// Does not recurse into nested function bodies — those hoist
    /// independently when they are themselves invoked.
    pub(crate) fn hoist_declarations(&mut self, scope: &Scope, body: &[Node<Stmt>]) {
        for stmt in body {
            self.hoist_stmt(scope, &stmt.node);
        }
    }

    fn hoist_stmt(&mut self, scope: &Scope, stmt: &Stmt) {
        match stmt {
            Stmt::VarDecl(decls) => {
                for d in decls {
                    scope.declare_var(self, d.name);
                }
            }
            Stmt::FunctionDecl(def) => {
                if let Some(name) = def.name {
                    let func_scope = scope.clone();
                    let func_id = self.make_script_function(Some(name), def.params.clone(), def.body.clone(), func_scope);
                    scope.declare_function(self, name, Value::Object(func_id));
                }
            }
            Stmt::Block(body) => self.hoist_declarations(scope, body),
            Stmt::If { consequent, alternate, .. } => {
                self.hoist_stmt(scope, &consequent.node);
                if let Some(alt) = alternate {
                    self.hoist_stmt(scope, &alt.node);
                }
            }
            Stmt::While { body, .. } | Stmt::DoWhile { body, .. } | Stmt::With { body, .. } | Stmt::Labeled { body, .. } => {
                self.hoist_stmt(scope, &body.node);
            }
            Stmt::For { init, body, .. } => {
                if let Some(init) = init {
                    if let ForInit::VarDecl(decls) = init.as_ref() {
                        for d in decls {
                            scope.declare_var(self, d.name);
                        }
                    }
                }
                self.hoist_stmt(scope, &body.node);
            }
            Stmt::ForIn { left, body, .. } => {
                if let crate::ast::ForInTarget::VarDecl(name) = left {
                    scope.declare_var(self, *name);
                }
                self.hoist_stmt(scope, &body.node);
            }
            Stmt::Try { block, handler, finalizer } => {
                self.hoist_declarations(scope, block);
                if let Some(h) = handler {
                    self.hoist_declarations(scope, &h.body);
                }
                if let Some(f) = finalizer {
                    self.hoist_declarations(scope, f);
                }
            }
            Stmt::Switch { cases, .. } => {
                for case in cases {
                    self.hoist_declarations(scope, &case.consequent);
                }
            }
            _ => {}
        }
    }

    /// Executes a sequence of statements, stopping at the first abrupt
    /// completion (anything other than `Completion::Normal`).
    pub(crate) fn exec_block(&mut self, scope: &Scope, body: &[Node<Stmt>], this: &Value) -> Result<Completion, RunError> {
        let mut result = Completion::Normal(None);
        for stmt in body {
            self.resources.check_time()?;
            result = self.exec_stmt(scope, stmt, this)?;
            if !matches!(result, Completion::Normal(_)) {
                return Ok(result);
            }
        }
        Ok(result)
    }

    /// ECMA-262 §8.7.1 `GetValue`.
    pub(crate) fn get_value(&mut self, value: Value) -> Result<Value, RunError> {
        match value {
            Value::Reference(reference) => match reference.base {
                None => {
                    let name = self.resolve(reference.property_name).to_owned();
                    Err(self.reference_error(format!("{name} is not defined")).into())
                }
                Some(ReferenceBase::Object(id) | ReferenceBase::Environment(id)) => {
                    let obj = self.heap.get(id).ok_or_else(|| RunError::Internal("dangling reference base".into()))?;
                    Ok(obj.get(&self.heap, reference.property_name, self))
                }
            },
            other => Ok(other),
        }
    }

    /// ECMA-262 §8.7.2 `PutValue`.
    pub(crate) fn put_value(&mut self, reference: Reference, value: Value) -> Result<(), RunError> {
        match reference.base {
            None => {
                let global = self.global_object();
                self.put_property(global, reference.property_name, value)
            }
            Some(ReferenceBase::Object(id) | ReferenceBase::Environment(id)) => {
                self.put_property(id, reference.property_name, value)
            }
        }
    }

    /// ECMA-262 §8.6.2.3 `[[Put]]`, including the Array-exotic `length`
    /// truncation side effect (§15.4.5.1) this crate's `ObjectKind::Array`
    /// relies on.
    pub(crate) fn put_property(&mut self, id: crate::heap::HeapId, name: crate::intern::StringId, value: Value) -> Result<(), RunError> {
        let can_put = self.heap.get(id).is_some_and(|o| o.can_put(&self.heap, name));
        if !can_put {
            return Ok(());
        }
        let is_array_length = self.heap.get(id).is_some_and(|o| matches!(o.kind, crate::object::ObjectKind::Array))
            && self.resolve(name) == "length";
        if is_array_length {
            let new_len = crate::value::to_uint32(crate::value::to_number(self, &value).unwrap_or(0.0));
            if let Some(obj) = self.heap.get_mut(id) {
                let stale: Vec<_> = obj
                    .own_property_names()
                    .filter(|&n| self.resolve(n).parse::<u32>().is_ok_and(|i| i >= new_len))
                    .collect();
                for n in stale {
                    obj.remove_own_property(n);
                }
                obj.put_own(name, Value::Number(f64::from(new_len)));
            }
            return Ok(());
        }
        if let Some(obj) = self.heap.get_mut(id) {
            obj.put_own(name, value.clone());
            if matches!(obj.kind, crate::object::ObjectKind::Array) {
                let length_id = self.well_known.length;
                if let Ok(index) = self.resolve(name).parse::<u32>() {
                    let current_len = match obj.own_property(length_id) {
                        Some(p) => match &p.value {
                            Value::Number(n) => *n as u32,
                            _ => 0,
                        },
                        None => 0,
                    };
                    if index >= current_len {
                        obj.put_own(length_id, Value::Number(f64::from(index + 1)));
                    }
                }
            }
        }
        Ok(())
    }

    pub(crate) fn reference_error(&self, message: impl Into<String>) -> Exception {
        Exception::new(ExcType::ReferenceError, message, self.current_loc)
    }

    pub(crate) fn type_error(&self, message: impl Into<String>) -> Exception {
        Exception::new(ExcType::TypeError, message, self.current_loc)
    }

    pub(crate) fn range_error(&self, message: impl Into<String>) -> Exception {
        Exception::new(ExcType::RangeError, message, self.current_loc)
    }

    /// Refreshes `current_loc` to the statement about to execute, so a
    /// `TypeError`/`ReferenceError` raised while evaluating it reports the
    /// real throw site (spec.md §7) instead of the interpreter's last known
    /// position.
    pub(crate) fn tracer_on_statement(&mut self, span: crate::ast::Span) {
        if let Some(source) = self.current_source() {
            self.current_loc = source.loc_at(span.start as usize);
        }
        self.tracer.on_statement(span);
    }

    pub(crate) fn tracer_on_throw(&mut self, value: &Value) {
        self.tracer.on_throw(value);
    }

    /// Parses `text` as a program and runs it against `scope`/`this` —
    /// the machinery shared by direct eval (the caller's own scope) and the
    /// global `eval` built-in (the global scope, or `ext1`'s receiver
    /// extension). Mirrors [`crate::run::Global_eval`]'s completion handling
    /// but returns a `RunError` directly rather than converting to an
    /// `Exception`, since this runs mid-evaluation rather than at the host
    /// boundary.
    pub(crate) fn eval_program_text(&mut self, scope: &Scope, this: &Value, text: &str) -> Result<Value, RunError> {
        let source = crate::source::Source::from_str(None, text);
        let program = crate::parser::parse_program(&source, self.interner_mut(), self.compat)?;
        self.hoist_declarations(scope, &program.body);
        match self.exec_block(scope, &program.body, this)? {
            Completion::Normal(v) => Ok(v.map_or(Value::Undefined, |boxed| *boxed)),
            Completion::Return(v) => Ok(*v),
            Completion::Break(_) | Completion::Continue(_) => Ok(Value::Undefined),
            Completion::Throw(v) => Err(RunError::Throw(v)),
        }
    }
}
