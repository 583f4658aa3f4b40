//! Statement evaluation (spec.md §4.4): the completion-propagating
//! evaluation of every ES3 statement form, including the try/catch/finally
//! state machine and `for-in` enumeration.

use crate::{
    ast::{CatchClause, ForInTarget, ForInit, Node, Stmt, SwitchCase},
    exception::RunError,
    namespace::Scope,
    value::{to_boolean, to_object, Completion, Value},
    Interpreter,
};

impl Interpreter {
    pub(crate) fn exec_stmt(&mut self, scope: &Scope, stmt: &Node<Stmt>, this: &Value) -> Result<Completion, RunError> {
        self.tracer_on_statement(stmt.span);
        self.exec_stmt_labeled(scope, stmt, this, None)
    }

    fn exec_stmt_labeled(
        &mut self,
        scope: &Scope,
        stmt: &Node<Stmt>,
        this: &Value,
        label: Option<crate::intern::StringId>,
    ) -> Result<Completion, RunError> {
        match &stmt.node {
            Stmt::Expression(e) => {
                let v = self.eval_expr(scope, e, this)?;
                Ok(Completion::Normal(Some(Box::new(v))))
            }
            Stmt::Empty | Stmt::FunctionDecl(_) => Ok(Completion::Normal(None)),
            Stmt::VarDecl(decls) => {
                for d in decls {
                    if let Some(init) = &d.init {
                        let v = self.eval_expr(scope, init, this)?;
                        scope.declare_var(self, d.name);
                        if let Some(id) = scope.resolve(self, d.name) {
                            self.put_property(id, d.name, v)?;
                        }
                    }
                }
                Ok(Completion::Normal(None))
            }
            Stmt::Block(body) => self.exec_block(scope, body, this),
            Stmt::If { test, consequent, alternate } => {
                if to_boolean(&self.eval_expr(scope, test, this)?) {
                    self.exec_stmt(scope, consequent, this)
                } else if let Some(alt) = alternate {
                    self.exec_stmt(scope, alt, this)
                } else {
                    Ok(Completion::Normal(None))
                }
            }
            Stmt::While { test, body } => self.exec_while(scope, test, body, this, label),
            Stmt::DoWhile { body, test } => self.exec_do_while(scope, body, test, this, label),
            Stmt::For { init, test, update, body } => self.exec_for(scope, init, test, update, body, this, label),
            Stmt::ForIn { left, right, body } => self.exec_for_in(scope, left, right, body, this, label),
            Stmt::Continue(l) => Ok(Completion::Continue(*l)),
            Stmt::Break(l) => Ok(Completion::Break(*l)),
            Stmt::Return(value) => {
                let v = match value {
                    Some(e) => self.eval_expr(scope, e, this)?,
                    None => Value::Undefined,
                };
                Ok(Completion::Return(Box::new(v)))
            }
            Stmt::With { object, body } => {
                let obj_value = self.eval_expr(scope, object, this)?;
                let obj_id = to_object(self, &obj_value).map_err(|_| self.type_error("cannot convert to object"))?;
                let mut inner = scope.clone();
                inner.push(obj_id);
                self.exec_stmt(&inner, body, this)
            }
            Stmt::Labeled { label: l, body } => {
                let result = self.exec_stmt_labeled(scope, body, this, Some(*l))?;
                Ok(match result {
                    Completion::Break(Some(bl)) if bl == *l => Completion::Normal(None),
                    other => other,
                })
            }
            Stmt::Switch { discriminant, cases } => self.exec_switch(scope, discriminant, cases, this, label),
            Stmt::Throw(e) => {
                let v = self.eval_expr(scope, e, this)?;
                self.tracer_on_throw(&v);
                Err(RunError::Throw(Box::new(v)))
            }
            Stmt::Try { block, handler, finalizer } => self.exec_try(scope, block, handler, finalizer, this),
        }
    }

    fn exec_while(
        &mut self,
        scope: &Scope,
        test: &Node<crate::ast::Expr>,
        body: &Node<Stmt>,
        this: &Value,
        label: Option<crate::intern::StringId>,
    ) -> Result<Completion, RunError> {
        while to_boolean(&self.eval_expr(scope, test, this)?) {
            self.resources.check_time()?;
            match self.exec_stmt(scope, body, this)? {
                Completion::Break(l) if l.is_none() || l == label => break,
                Completion::Break(l) => return Ok(Completion::Break(l)),
                Completion::Continue(l) if l.is_none() || l == label => continue,
                Completion::Continue(l) => return Ok(Completion::Continue(l)),
                Completion::Normal(_) => {}
                other @ (Completion::Return(_) | Completion::Throw(_)) => return Ok(other),
            }
        }
        Ok(Completion::Normal(None))
    }

    fn exec_do_while(
        &mut self,
        scope: &Scope,
        body: &Node<Stmt>,
        test: &Node<crate::ast::Expr>,
        this: &Value,
        label: Option<crate::intern::StringId>,
    ) -> Result<Completion, RunError> {
        loop {
            self.resources.check_time()?;
            match self.exec_stmt(scope, body, this)? {
                Completion::Break(l) if l.is_none() || l == label => break,
                Completion::Break(l) => return Ok(Completion::Break(l)),
                Completion::Continue(l) if l.is_none() || l == label => {}
                Completion::Continue(l) => return Ok(Completion::Continue(l)),
                Completion::Normal(_) => {}
                other @ (Completion::Return(_) | Completion::Throw(_)) => return Ok(other),
            }
            if !to_boolean(&self.eval_expr(scope, test, this)?) {
                break;
            }
        }
        Ok(Completion::Normal(None))
    }

    #[allow(clippy::too_many_arguments)]
    fn exec_for(
        &mut self,
        scope: &Scope,
        init: &Option<Box<ForInit>>,
        test: &Option<Node<crate::ast::Expr>>,
        update: &Option<Node<crate::ast::Expr>>,
        body: &Node<Stmt>,
        this: &Value,
        label: Option<crate::intern::StringId>,
    ) -> Result<Completion, RunError> {
        match init.as_deref() {
            Some(ForInit::VarDecl(decls)) => {
                for d in decls {
                    scope.declare_var(self, d.name);
                    if let Some(e) = &d.init {
                        let v = self.eval_expr(scope, e, this)?;
                        if let Some(id) = scope.resolve(self, d.name) {
                            self.put_property(id, d.name, v)?;
                        }
                    }
                }
            }
            Some(ForInit::Expression(e)) => {
                self.eval_expr(scope, e, this)?;
            }
            None => {}
        }
        loop {
            if let Some(t) = test {
                if !to_boolean(&self.eval_expr(scope, t, this)?) {
                    break;
                }
            }
            self.resources.check_time()?;
            match self.exec_stmt(scope, body, this)? {
                Completion::Break(l) if l.is_none() || l == label => break,
                Completion::Break(l) => return Ok(Completion::Break(l)),
                Completion::Continue(l) if l.is_none() || l == label => {}
                Completion::Continue(l) => return Ok(Completion::Continue(l)),
                Completion::Normal(_) => {}
                other @ (Completion::Return(_) | Completion::Throw(_)) => return Ok(other),
            }
            if let Some(u) = update {
                self.eval_expr(scope, u, this)?;
            }
        }
        Ok(Completion::Normal(None))
    }

    fn exec_for_in(
        &mut self,
        scope: &Scope,
        left: &ForInTarget,
        right: &Node<crate::ast::Expr>,
        body: &Node<Stmt>,
        this: &Value,
        label: Option<crate::intern::StringId>,
    ) -> Result<Completion, RunError> {
        let right_value = self.eval_expr(scope, right, this)?;
        if matches!(right_value, Value::Undefined | Value::Null) {
            return Ok(Completion::Normal(None));
        }
        let Ok(obj_id) = to_object(self, &right_value) else { return Ok(Completion::Normal(None)) };

        // A `DontEnum` own property still shadows a same-named enumerable
        // property found deeper in the prototype chain, so `seen` tracks
        // every own name at each depth, not just the enumerable ones —
        // only the enumerable names are collected into `names` to yield.
        let mut names = Vec::new();
        let mut seen = std::collections::HashSet::new();
        let mut current = Some(obj_id);
        while let Some(id) = current {
            let Some(obj) = self.heap.get(id) else { break };
            let enumerable: std::collections::HashSet<_> = obj.enumerate_own().collect();
            for name in obj.own_property_names() {
                if seen.insert(name) && enumerable.contains(&name) {
                    names.push(name);
                }
            }
            current = obj.prototype;
        }

        for name in names {
            let still_present = self.heap.get(obj_id).is_some_and(|o| o.has_property(&self.heap, name));
            if !still_present {
                continue;
            }
            if let ForInTarget::VarDecl(var_name) = left {
                scope.declare_var(self, *var_name);
                if let Some(id) = scope.resolve(self, *var_name) {
                    let name_str = self.resolve(name).to_owned();
                    self.put_property(id, *var_name, Value::string(&name_str))?;
                }
            } else if let ForInTarget::Pattern(target) = left {
                let target_ref = self.eval_expr_ref(scope, target, this)?;
                if let Value::Reference(reference) = target_ref {
                    let name_str = self.resolve(name).to_owned();
                    self.put_value(reference, Value::string(&name_str))?;
                }
            }
            self.resources.check_time()?;
            match self.exec_stmt(scope, body, this)? {
                Completion::Break(l) if l.is_none() || l == label => break,
                Completion::Break(l) => return Ok(Completion::Break(l)),
                Completion::Continue(l) if l.is_none() || l == label => continue,
                Completion::Continue(l) => return Ok(Completion::Continue(l)),
                Completion::Normal(_) => {}
                other @ (Completion::Return(_) | Completion::Throw(_)) => return Ok(other),
            }
        }
        Ok(Completion::Normal(None))
    }

    fn exec_switch(
        &mut self,
        scope: &Scope,
        discriminant: &Node<crate::ast::Expr>,
        cases: &[SwitchCase],
        this: &Value,
        label: Option<crate::intern::StringId>,
    ) -> Result<Completion, RunError> {
        let disc = self.eval_expr(scope, discriminant, this)?;
        let mut matched_index = None;
        for (i, case) in cases.iter().enumerate() {
            if let Some(test) = &case.test {
                let t = self.eval_expr(scope, test, this)?;
                if strict_equals_pub(&disc, &t) {
                    matched_index = Some(i);
                    break;
                }
            }
        }
        let start = matched_index.or_else(|| cases.iter().position(|c| c.test.is_none()));
        let Some(start) = start else { return Ok(Completion::Normal(None)) };
        for case in &cases[start..] {
            for stmt in &case.consequent {
                match self.exec_stmt(scope, stmt, this)? {
                    Completion::Break(l) if l.is_none() || l == label => return Ok(Completion::Normal(None)),
                    Completion::Break(l) => return Ok(Completion::Break(l)),
                    Completion::Normal(_) => {}
                    other => return Ok(other),
                }
            }
        }
        Ok(Completion::Normal(None))
    }

    fn exec_try(
        &mut self,
        scope: &Scope,
        block: &[Node<Stmt>],
        handler: &Option<CatchClause>,
        finalizer: &Option<Vec<Node<Stmt>>>,
        this: &Value,
    ) -> Result<Completion, RunError> {
        let block_result = self.exec_block(scope, block, this);
        let mut outcome = match block_result {
            Ok(completion) => Ok(completion),
            Err(RunError::Exc(exc)) => self.run_catch(scope, handler, this, exception_to_value(self, exc.clone()), || RunError::Exc(exc)),
            Err(RunError::Throw(v)) => self.run_catch(scope, handler, this, *v.clone(), || RunError::Throw(v)),
            Err(other) => Err(other),
        };
        if let Some(finalizer_body) = finalizer {
            match self.exec_block(scope, finalizer_body, this) {
                Ok(Completion::Normal(_)) => {}
                Ok(abrupt) => outcome = Ok(abrupt),
                Err(e) => outcome = Err(e),
            }
        }
        outcome
    }

    /// Binds `thrown` to the `catch` parameter and runs its body, or
    /// re-raises via `reraise` when there is no handler (or its guard, an
    /// `ext1` extension, rejects the value).
    fn run_catch(
        &mut self,
        scope: &Scope,
        handler: &Option<CatchClause>,
        this: &Value,
        thrown: Value,
        reraise: impl FnOnce() -> RunError,
    ) -> Result<Completion, RunError> {
        let Some(CatchClause { param, guard, body }) = handler else { return Err(reraise()) };
        let mut catch_scope = scope.clone();
        let proto = self.well_known.object_prototype;
        let catch_obj = self.heap.alloc(crate::object::JsObject::new_plain(Some(proto)));
        if let Some(obj) = self.heap.get_mut(catch_obj) {
            obj.put_own(*param, thrown);
        }
        catch_scope.push(catch_obj);
        let guard_passes = match guard {
            Some(g) => to_boolean(&self.eval_expr(&catch_scope, g, this)?),
            None => true,
        };
        if guard_passes {
            self.exec_block(&catch_scope, body, this)
        } else {
            Err(reraise())
        }
    }
}

fn exception_to_value(interp: &mut Interpreter, exc: crate::exception::Exception) -> Value {
    let proto = interp.well_known.error_prototype;
    let obj_id = interp.heap.alloc(crate::object::JsObject::new_with_kind("Error", Some(proto), crate::object::ObjectKind::Error));
    let name_id = interp.intern("name");
    let message_id = interp.intern("message");
    if let Some(obj) = interp.heap.get_mut(obj_id) {
        obj.put_own(name_id, Value::string(&exc.kind.to_string()));
        obj.put_own(message_id, Value::string(&exc.message));
    }
    Value::Object(obj_id)
}

fn strict_equals_pub(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Object(a), Value::Object(b)) => a == b,
        _ => false,
    }
}
