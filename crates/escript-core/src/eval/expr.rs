//! Expression evaluation (spec.md §4.4): abstract/strict equality,
//! relational comparison, addition, bitwise/shift operators, `typeof`,
//! `delete`, `instanceof`/`in`, and the rest of ECMA-262 §11.

use crate::{
    ast::{AssignOp, BinaryOp, Expr, LogicalOp, MemberKey, Node, PropertyKey, UnaryOp, UpdateOp},
    exception::RunError,
    namespace::Scope,
    object::{JsObject, ObjectKind, Property, PropertyAttributes},
    strings::compare_code_units,
    value::{to_boolean, to_int32, to_js_string, to_number, to_object, to_primitive, to_uint32, PreferredType, Reference, ReferenceBase, Value},
    Interpreter,
};

impl Interpreter {
    /// Evaluates an expression and applies `GetValue`, yielding a plain
    /// language value — never a `Value::Reference`/`Value::Completion`.
    pub(crate) fn eval_expr(&mut self, scope: &Scope, expr: &Node<Expr>, this: &Value) -> Result<Value, RunError> {
        let raw = self.eval_expr_ref(scope, expr, this)?;
        self.get_value(raw)
    }

    /// Evaluates an expression without dereferencing a Reference result —
    /// needed by `typeof` (an unresolved identifier is `"undefined"`, not a
    /// `ReferenceError`), `delete`, and assignment targets.
    pub(crate) fn eval_expr_ref(&mut self, scope: &Scope, expr: &Node<Expr>, this: &Value) -> Result<Value, RunError> {
        match &expr.node {
            Expr::This => Ok(this.clone()),
            Expr::Identifier(name) => {
                let base = scope.resolve(self, *name).map(ReferenceBase::Environment);
                Ok(Value::Reference(Reference { base, property_name: *name }))
            }
            Expr::Null => Ok(Value::Null),
            Expr::Boolean(b) => Ok(Value::Boolean(*b)),
            Expr::Number(n) => Ok(Value::Number(*n)),
            Expr::String(id) => Ok(Value::String(self.resolve_js_string(*id))),
            Expr::RegExp { .. } => Ok(Value::Undefined),
            Expr::Array(elements) => self.eval_array_literal(scope, elements, this),
            Expr::Object(props) => self.eval_object_literal(scope, props, this),
            Expr::Function(def) => {
                let func_id = self.make_script_function(def.name, def.params.clone(), def.body.clone(), scope.clone());
                Ok(Value::Object(func_id))
            }
            Expr::Unary { op, argument } => self.eval_unary(scope, *op, argument, this),
            Expr::Update { op, argument, prefix } => self.eval_update(scope, *op, argument, *prefix, this),
            Expr::Binary { op, left, right } => self.eval_binary(scope, *op, left, right, this),
            Expr::Logical { op, left, right } => self.eval_logical(scope, *op, left, right, this),
            Expr::Assignment { op, target, value } => self.eval_assignment(scope, *op, target, value, this),
            Expr::Conditional { test, consequent, alternate } => {
                let t = self.eval_expr(scope, test, this)?;
                if to_boolean(&t) { self.eval_expr_ref(scope, consequent, this) } else { self.eval_expr_ref(scope, alternate, this) }
            }
            Expr::Call { callee, arguments } => self.eval_call(scope, callee, arguments, this),
            Expr::New { callee, arguments } => self.eval_new(scope, callee, arguments, this),
            Expr::Member { object, property } => self.eval_member(scope, object, property, this),
            Expr::Sequence(exprs) => {
                let mut last = Value::Undefined;
                for e in exprs {
                    last = self.eval_expr(scope, e, this)?;
                }
                Ok(last)
            }
        }
    }

    fn eval_array_literal(&mut self, scope: &Scope, elements: &[Option<Node<Expr>>], this: &Value) -> Result<Value, RunError> {
        let array_proto = self.well_known.array_prototype;
        let array_id = self.heap.alloc(JsObject::new_with_kind("Array", Some(array_proto), ObjectKind::Array));
        let length_id = self.well_known.length;
        for (i, el) in elements.iter().enumerate() {
            if let Some(e) = el {
                let value = self.eval_expr(scope, e, this)?;
                let idx_id = self.intern(&i.to_string());
                self.put_property(array_id, idx_id, value)?;
            }
        }
        if let Some(obj) = self.heap.get_mut(array_id) {
            let current = match obj.own_property(length_id) {
                Some(p) => match p.value {
                    Value::Number(n) => n as usize,
                    _ => 0,
                },
                None => 0,
            };
            if elements.len() > current {
                obj.put_own(length_id, Value::Number(elements.len() as f64));
            }
        }
        Ok(Value::Object(array_id))
    }

    fn eval_object_literal(&mut self, scope: &Scope, props: &[(PropertyKey, Node<Expr>)], this: &Value) -> Result<Value, RunError> {
        let object_proto = self.well_known.object_prototype;
        let obj_id = self.heap.alloc(JsObject::new_plain(Some(object_proto)));
        for (key, value_expr) in props {
            let name = match key {
                PropertyKey::Identifier(id) | PropertyKey::String(id) => *id,
                PropertyKey::Number(n) => self.intern(&crate::value::number_to_string(*n)),
            };
            let value = self.eval_expr(scope, value_expr, this)?;
            if let Some(obj) = self.heap.get_mut(obj_id) {
                obj.put_own(name, value);
            }
        }
        Ok(Value::Object(obj_id))
    }

    fn eval_unary(&mut self, scope: &Scope, op: UnaryOp, argument: &Node<Expr>, this: &Value) -> Result<Value, RunError> {
        if op == UnaryOp::TypeOf {
            let raw = self.eval_expr_ref(scope, argument, this)?;
            return Ok(match raw {
                Value::Reference(Reference { base: None, .. }) => Value::string("undefined"),
                other => {
                    let v = self.get_value(other)?;
                    Value::string(v.type_of())
                }
            });
        }
        if op == UnaryOp::Delete {
            let raw = self.eval_expr_ref(scope, argument, this)?;
            return Ok(Value::Boolean(self.delete_reference(raw)));
        }
        let value = self.eval_expr(scope, argument, this)?;
        Ok(match op {
            UnaryOp::Minus => Value::Number(-to_number(self, &value).map_err(|_| self.type_error("cannot convert to number"))?),
            UnaryOp::Plus => Value::Number(to_number(self, &value).map_err(|_| self.type_error("cannot convert to number"))?),
            UnaryOp::Not => Value::Boolean(!to_boolean(&value)),
            UnaryOp::BitNot => {
                let n = to_number(self, &value).map_err(|_| self.type_error("cannot convert to number"))?;
                Value::Number(f64::from(!to_int32(n)))
            }
            UnaryOp::Void => Value::Undefined,
            UnaryOp::TypeOf | UnaryOp::Delete => unreachable!("handled above"),
        })
    }

    fn delete_reference(&mut self, raw: Value) -> bool {
        match raw {
            Value::Reference(Reference { base: Some(ReferenceBase::Object(id) | ReferenceBase::Environment(id)), property_name }) => {
                self.heap.get_mut(id).is_none_or(|obj| obj.delete(property_name))
            }
            Value::Reference(Reference { base: None, .. }) => true,
            _ => true,
        }
    }

    fn eval_update(&mut self, scope: &Scope, op: UpdateOp, argument: &Node<Expr>, prefix: bool, this: &Value) -> Result<Value, RunError> {
        let raw = self.eval_expr_ref(scope, argument, this)?;
        let old = to_number(self, &self.get_value(raw.clone())?).map_err(|_| self.type_error("cannot convert to number"))?;
        let new = if op == UpdateOp::Increment { old + 1.0 } else { old - 1.0 };
        if let Value::Reference(reference) = raw {
            self.put_value(reference, Value::Number(new))?;
        }
        Ok(Value::Number(if prefix { new } else { old }))
    }

    fn eval_binary(&mut self, scope: &Scope, op: BinaryOp, left: &Node<Expr>, right: &Node<Expr>, this: &Value) -> Result<Value, RunError> {
        if op == BinaryOp::InstanceOf {
            let l = self.eval_expr(scope, left, this)?;
            let r = self.eval_expr(scope, right, this)?;
            let Value::Object(ctor_id) = r else { return Err(self.type_error("right-hand side of instanceof is not an object").into()) };
            let is_instance = self
                .heap
                .get(ctor_id)
                .ok_or_else(|| RunError::Internal("dangling instanceof target".into()))?
                .has_instance(&self.heap, self, &l);
            return Ok(Value::Boolean(is_instance));
        }
        if op == BinaryOp::In {
            let l = self.eval_expr(scope, left, this)?;
            let r = self.eval_expr(scope, right, this)?;
            let Value::Object(id) = r else { return Err(self.type_error("'in' requires an object right-hand side").into()) };
            let name_str = to_js_string(self, &l).map_err(|_| self.type_error("cannot convert to string"))?;
            let name = self.intern(&name_str.to_string_lossy());
            let has = self.heap.get(id).is_some_and(|o| o.has_property(&self.heap, name));
            return Ok(Value::Boolean(has));
        }
        let l = self.eval_expr(scope, left, this)?;
        let r = self.eval_expr(scope, right, this)?;
        self.apply_binary(op, l, r)
    }

    pub(crate) fn apply_binary(&mut self, op: BinaryOp, l: Value, r: Value) -> Result<Value, RunError> {
        Ok(match op {
            BinaryOp::Add => self.add(l, r)?,
            BinaryOp::Sub => Value::Number(self.num(l)? - self.num(r)?),
            BinaryOp::Mul => Value::Number(self.num(l)? * self.num(r)?),
            BinaryOp::Div => Value::Number(self.num(l)? / self.num(r)?),
            BinaryOp::Mod => Value::Number(self.num(l)? % self.num(r)?),
            BinaryOp::Eq => Value::Boolean(self.abstract_equals(l, r)?),
            BinaryOp::NotEq => Value::Boolean(!self.abstract_equals(l, r)?),
            BinaryOp::StrictEq => Value::Boolean(strict_equals(&l, &r)),
            BinaryOp::StrictNotEq => Value::Boolean(!strict_equals(&l, &r)),
            BinaryOp::Lt => self.relational(l, r, true)?,
            BinaryOp::Gt => self.relational(r, l, false)?,
            BinaryOp::LtEq => {
                let gt = self.relational(r, l, false)?;
                Value::Boolean(matches!(gt, Value::Boolean(false)))
            }
            BinaryOp::GtEq => {
                let lt = self.relational(l, r, true)?;
                Value::Boolean(matches!(lt, Value::Boolean(false)))
            }
            BinaryOp::ShiftLeft => Value::Number(f64::from(to_int32(self.num(l)?).wrapping_shl(to_uint32(self.num(r)?) & 31))),
            BinaryOp::ShiftRight => Value::Number(f64::from(to_int32(self.num(l)?).wrapping_shr(to_uint32(self.num(r)?) & 31))),
            BinaryOp::ShiftRightUnsigned => Value::Number(f64::from(to_uint32(self.num(l)?).wrapping_shr(to_uint32(self.num(r)?) & 31))),
            BinaryOp::BitAnd => Value::Number(f64::from(to_int32(self.num(l)?) & to_int32(self.num(r)?))),
            BinaryOp::BitOr => Value::Number(f64::from(to_int32(self.num(l)?) | to_int32(self.num(r)?))),
            BinaryOp::BitXor => Value::Number(f64::from(to_int32(self.num(l)?) ^ to_int32(self.num(r)?))),
            BinaryOp::In | BinaryOp::InstanceOf => unreachable!("handled by caller"),
        })
    }

    fn num(&mut self, v: Value) -> Result<f64, RunError> {
        to_number(self, &v).map_err(|_| self.type_error("cannot convert to number").into())
    }

    /// ECMA-262 §11.6.1 `+`: string concatenation if either operand's
    /// primitive form is a string, numeric addition otherwise.
    fn add(&mut self, l: Value, r: Value) -> Result<Value, RunError> {
        let lp = to_primitive(self, &l, PreferredType::Default).map_err(|_| self.type_error("cannot convert to primitive"))?;
        let rp = to_primitive(self, &r, PreferredType::Default).map_err(|_| self.type_error("cannot convert to primitive"))?;
        if matches!(lp, Value::String(_)) || matches!(rp, Value::String(_)) {
            let ls = to_js_string(self, &lp).map_err(|_| self.type_error("cannot convert to string"))?;
            let rs = to_js_string(self, &rp).map_err(|_| self.type_error("cannot convert to string"))?;
            Ok(Value::String(ls.concat(&rs)))
        } else {
            Ok(Value::Number(self.num(lp)? + self.num(rp)?))
        }
    }

    /// ECMA-262 §11.8.5 Abstract Relational Comparison. Returns
    /// `Value::Undefined` (treated as `false` by callers) when either
    /// operand's numeric form is `NaN`.
    fn relational(&mut self, l: Value, r: Value, left_first: bool) -> Result<Value, RunError> {
        let _ = left_first;
        let lp = to_primitive(self, &l, PreferredType::Number).map_err(|_| self.type_error("cannot convert to primitive"))?;
        let rp = to_primitive(self, &r, PreferredType::Number).map_err(|_| self.type_error("cannot convert to primitive"))?;
        if let (Value::String(a), Value::String(b)) = (&lp, &rp) {
            return Ok(Value::Boolean(compare_code_units(a, b) == std::cmp::Ordering::Less));
        }
        let a = self.num(lp)?;
        let b = self.num(rp)?;
        if a.is_nan() || b.is_nan() {
            return Ok(Value::Boolean(false));
        }
        Ok(Value::Boolean(a < b))
    }

    /// ECMA-262 §11.9.3 Abstract Equality Comparison.
    fn abstract_equals(&mut self, l: Value, r: Value) -> Result<bool, RunError> {
        Ok(match (&l, &r) {
            (Value::Undefined | Value::Null, Value::Undefined | Value::Null) => true,
            (Value::Number(_), Value::Number(_))
            | (Value::String(_), Value::String(_))
            | (Value::Boolean(_), Value::Boolean(_))
            | (Value::Object(_), Value::Object(_)) => strict_equals(&l, &r),
            (Value::Number(_), Value::String(_)) => {
                let rn = self.num(r)?;
                strict_equals(&l, &Value::Number(rn))
            }
            (Value::String(_), Value::Number(_)) => {
                let ln = self.num(l)?;
                strict_equals(&Value::Number(ln), &r)
            }
            (Value::Boolean(_), _) => {
                let ln = self.num(l)?;
                self.abstract_equals(Value::Number(ln), r)?
            }
            (_, Value::Boolean(_)) => {
                let rn = self.num(r)?;
                self.abstract_equals(l, Value::Number(rn))?
            }
            (Value::Object(_), Value::Number(_) | Value::String(_)) => {
                let lp = to_primitive(self, &l, PreferredType::Default).map_err(|_| self.type_error("cannot convert to primitive"))?;
                self.abstract_equals(lp, r)?
            }
            (Value::Number(_) | Value::String(_), Value::Object(_)) => {
                let rp = to_primitive(self, &r, PreferredType::Default).map_err(|_| self.type_error("cannot convert to primitive"))?;
                self.abstract_equals(l, rp)?
            }
            _ => false,
        })
    }

    fn eval_logical(&mut self, scope: &Scope, op: LogicalOp, left: &Node<Expr>, right: &Node<Expr>, this: &Value) -> Result<Value, RunError> {
        let l = self.eval_expr(scope, left, this)?;
        let short_circuit = match op {
            LogicalOp::And => !to_boolean(&l),
            LogicalOp::Or => to_boolean(&l),
        };
        if short_circuit {
            Ok(l)
        } else {
            self.eval_expr(scope, right, this)
        }
    }

    fn eval_assignment(&mut self, scope: &Scope, op: AssignOp, target: &Node<Expr>, value: &Node<Expr>, this: &Value) -> Result<Value, RunError> {
        let target_ref = self.eval_expr_ref(scope, target, this)?;
        let new_value = if op == AssignOp::Assign {
            self.eval_expr(scope, value, this)?
        } else {
            let old = self.get_value(target_ref.clone())?;
            let rhs = self.eval_expr(scope, value, this)?;
            self.apply_binary(compound_to_binary(op), old, rhs)?
        };
        if let Value::Reference(reference) = target_ref {
            self.put_value(reference, new_value.clone())?;
        }
        Ok(new_value)
    }

    fn eval_call(&mut self, scope: &Scope, callee: &Node<Expr>, arguments: &[Node<Expr>], this: &Value) -> Result<Value, RunError> {
        let callee_ref = self.eval_expr_ref(scope, callee, this)?;
        let call_this = match &callee_ref {
            Value::Reference(Reference { base: Some(ReferenceBase::Object(id)), .. }) => Value::Object(*id),
            _ => Value::Undefined,
        };
        let func_value = self.get_value(callee_ref)?;
        let Value::Object(func_id) = func_value else { return Err(self.type_error("value is not callable").into()) };
        if !self.heap.get(func_id).is_some_and(JsObject::is_callable) {
            return Err(self.type_error("value is not a function").into());
        }
        let mut args = Vec::with_capacity(arguments.len());
        for a in arguments {
            args.push(self.eval_expr(scope, a, this)?);
        }
        // A *direct* call — the bare identifier `eval`, not merely an
        // expression that happens to produce the same function — runs
        // against the caller's own scope chain and `this` rather than the
        // global object (ECMA-262 §15.1.2.1).
        if func_id == self.well_known.eval_function {
            if let Expr::Identifier(name) = &callee.node {
                if self.resolve(*name) == "eval" {
                    return self.direct_eval(scope, this, &args);
                }
            }
        }
        self.call_function(func_id, call_this, &args)
    }

    /// The direct-eval form: a non-string argument passes through
    /// unchanged, otherwise the program text runs against the calling
    /// scope and `this`.
    fn direct_eval(&mut self, scope: &Scope, this: &Value, args: &[Value]) -> Result<Value, RunError> {
        match args.first() {
            Some(Value::String(text)) => {
                let text = text.to_string_lossy();
                self.eval_program_text(scope, this, &text)
            }
            Some(v) => Ok(v.clone()),
            None => Ok(Value::Undefined),
        }
    }

    fn eval_new(&mut self, scope: &Scope, callee: &Node<Expr>, arguments: &[Node<Expr>], this: &Value) -> Result<Value, RunError> {
        let func_value = self.eval_expr(scope, callee, this)?;
        let Value::Object(func_id) = func_value else { return Err(self.type_error("value is not a constructor").into()) };
        if !self.heap.get(func_id).is_some_and(JsObject::is_callable) {
            return Err(self.type_error("value is not a constructor").into());
        }
        let mut args = Vec::with_capacity(arguments.len());
        for a in arguments {
            args.push(self.eval_expr(scope, a, this)?);
        }
        self.construct(func_id, &args)
    }

    fn eval_member(&mut self, scope: &Scope, object: &Node<Expr>, property: &MemberKey, this: &Value) -> Result<Value, RunError> {
        let base = self.eval_expr(scope, object, this)?;
        let name = match property {
            MemberKey::Static(id) => *id,
            MemberKey::Computed(e) => {
                let v = self.eval_expr(scope, e, this)?;
                let s = to_js_string(self, &v).map_err(|_| self.type_error("cannot convert to string"))?;
                self.intern(&s.to_string_lossy())
            }
        };
        let base_id = to_object(self, &base).map_err(|_| self.type_error("cannot read property of null or undefined"))?;
        Ok(Value::Reference(Reference { base: Some(ReferenceBase::Object(base_id)), property_name: name }))
    }
}

fn compound_to_binary(op: AssignOp) -> BinaryOp {
    match op {
        AssignOp::AddAssign => BinaryOp::Add,
        AssignOp::SubAssign => BinaryOp::Sub,
        AssignOp::MulAssign => BinaryOp::Mul,
        AssignOp::DivAssign => BinaryOp::Div,
        AssignOp::ModAssign => BinaryOp::Mod,
        AssignOp::ShiftLeftAssign => BinaryOp::ShiftLeft,
        AssignOp::ShiftRightAssign => BinaryOp::ShiftRight,
        AssignOp::ShiftRightUnsignedAssign => BinaryOp::ShiftRightUnsigned,
        AssignOp::BitAndAssign => BinaryOp::BitAnd,
        AssignOp::BitOrAssign => BinaryOp::BitOr,
        AssignOp::BitXorAssign => BinaryOp::BitXor,
        AssignOp::Assign => unreachable!("plain assignment has no binary op"),
    }
}

/// ECMA-262 §11.9.6 Strict Equality Comparison.
fn strict_equals(l: &Value, r: &Value) -> bool {
    match (l, r) {
        (Value::Undefined, Value::Undefined) | (Value::Null, Value::Null) => true,
        (Value::Boolean(a), Value::Boolean(b)) => a == b,
        (Value::Number(a), Value::Number(b)) => a == b,
        (Value::String(a), Value::String(b)) => a == b,
        (Value::Object(a), Value::Object(b)) => a == b,
        _ => false,
    }
}
