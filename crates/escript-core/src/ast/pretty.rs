//! Pretty-printer (SPEC_FULL.md §11): renders a [`Program`] back to source
//! text. Exists for spec.md §8's round-trip law — `parse(print(parse(src)))`
//! must be AST-equal to `parse(src)` — and for the CLI's `-g` flag, which
//! dumps the parsed-and-folded tree as source.
//!
//! Not a faithful re-formatter of the original source (whitespace and
//! comments are not preserved — the AST doesn't carry them); it prints
//! canonical, re-parseable JavaScript.

use std::fmt::Write as _;

use crate::{
    ast::{
        AssignOp, BinaryOp, CatchClause, Expr, ForInTarget, ForInit, FunctionDef, LogicalOp, MemberKey, Node,
        Program, PropertyKey, Stmt, UnaryOp, UpdateOp,
    },
    intern::Interner,
    value::number_to_string,
};

pub struct Printer<'a> {
    interner: &'a Interner,
    out: String,
    indent: usize,
}

impl<'a> Printer<'a> {
    #[must_use]
    pub fn new(interner: &'a Interner) -> Self {
        Self { interner, out: String::new(), indent: 0 }
    }

    #[must_use]
    pub fn print_program(mut self, program: &Program) -> String {
        for stmt in &program.body {
            self.print_stmt(stmt);
        }
        self.out
    }

    fn newline_indent(&mut self) {
        self.out.push('\n');
        for _ in 0..self.indent {
            self.out.push_str("  ");
        }
    }

    fn name(&self, id: crate::intern::StringId) -> &str {
        self.interner.resolve(id)
    }

    fn print_stmt(&mut self, stmt: &Node<Stmt>) {
        self.newline_indent();
        match &stmt.node {
            Stmt::Expression(e) => {
                self.print_expr(e);
                self.out.push(';');
            }
            Stmt::Empty => self.out.push(';'),
            Stmt::VarDecl(decls) => {
                self.out.push_str("var ");
                for (i, d) in decls.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.out.push_str(self.name(d.name));
                    if let Some(init) = &d.init {
                        self.out.push_str(" = ");
                        self.print_expr(init);
                    }
                }
                self.out.push(';');
            }
            Stmt::Block(body) => {
                self.out.push('{');
                self.indent += 1;
                for s in body {
                    self.print_stmt(s);
                }
                self.indent -= 1;
                self.newline_indent();
                self.out.push('}');
            }
            Stmt::If { test, consequent, alternate } => {
                self.out.push_str("if (");
                self.print_expr(test);
                self.out.push(')');
                self.indent += 1;
                self.print_stmt(consequent);
                self.indent -= 1;
                if let Some(alt) = alternate {
                    self.newline_indent();
                    self.out.push_str("else");
                    self.indent += 1;
                    self.print_stmt(alt);
                    self.indent -= 1;
                }
            }
            Stmt::While { test, body } => {
                self.out.push_str("while (");
                self.print_expr(test);
                self.out.push(')');
                self.indent += 1;
                self.print_stmt(body);
                self.indent -= 1;
            }
            Stmt::DoWhile { body, test } => {
                self.out.push_str("do");
                self.indent += 1;
                self.print_stmt(body);
                self.indent -= 1;
                self.newline_indent();
                self.out.push_str("while (");
                self.print_expr(test);
                self.out.push_str(");");
            }
            Stmt::For { init, test, update, body } => {
                self.out.push_str("for (");
                match init {
                    Some(init) => match init.as_ref() {
                        ForInit::VarDecl(decls) => {
                            self.out.push_str("var ");
                            for (i, d) in decls.iter().enumerate() {
                                if i > 0 {
                                    self.out.push_str(", ");
                                }
                                self.out.push_str(self.name(d.name));
                                if let Some(e) = &d.init {
                                    self.out.push_str(" = ");
                                    self.print_expr(e);
                                }
                            }
                        }
                        ForInit::Expression(e) => self.print_expr(e),
                    },
                    None => {}
                }
                self.out.push_str("; ");
                if let Some(test) = test {
                    self.print_expr(test);
                }
                self.out.push_str("; ");
                if let Some(update) = update {
                    self.print_expr(update);
                }
                self.out.push(')');
                self.indent += 1;
                self.print_stmt(body);
                self.indent -= 1;
            }
            Stmt::ForIn { left, right, body } => {
                self.out.push_str("for (");
                match left {
                    ForInTarget::VarDecl(name) => {
                        self.out.push_str("var ");
                        self.out.push_str(self.name(*name));
                    }
                    ForInTarget::Pattern(e) => self.print_expr(e),
                }
                self.out.push_str(" in ");
                self.print_expr(right);
                self.out.push(')');
                self.indent += 1;
                self.print_stmt(body);
                self.indent -= 1;
            }
            Stmt::Continue(label) => {
                self.out.push_str("continue");
                if let Some(l) = label {
                    let _ = write!(self.out, " {}", self.name(*l));
                }
                self.out.push(';');
            }
            Stmt::Break(label) => {
                self.out.push_str("break");
                if let Some(l) = label {
                    let _ = write!(self.out, " {}", self.name(*l));
                }
                self.out.push(';');
            }
            Stmt::Return(value) => {
                self.out.push_str("return");
                if let Some(v) = value {
                    self.out.push(' ');
                    self.print_expr(v);
                }
                self.out.push(';');
            }
            Stmt::With { object, body } => {
                self.out.push_str("with (");
                self.print_expr(object);
                self.out.push(')');
                self.indent += 1;
                self.print_stmt(body);
                self.indent -= 1;
            }
            Stmt::Labeled { label, body } => {
                let _ = write!(self.out, "{}: ", self.name(*label));
                self.print_stmt(body);
            }
            Stmt::Switch { discriminant, cases } => {
                self.out.push_str("switch (");
                self.print_expr(discriminant);
                self.out.push_str(") {");
                self.indent += 1;
                for case in cases {
                    self.newline_indent();
                    match &case.test {
                        Some(t) => {
                            self.out.push_str("case ");
                            self.print_expr(t);
                            self.out.push(':');
                        }
                        None => self.out.push_str("default:"),
                    }
                    self.indent += 1;
                    for s in &case.consequent {
                        self.print_stmt(s);
                    }
                    self.indent -= 1;
                }
                self.indent -= 1;
                self.newline_indent();
                self.out.push('}');
            }
            Stmt::Throw(e) => {
                self.out.push_str("throw ");
                self.print_expr(e);
                self.out.push(';');
            }
            Stmt::Try { block, handler, finalizer } => {
                self.out.push_str("try {");
                self.indent += 1;
                for s in block {
                    self.print_stmt(s);
                }
                self.indent -= 1;
                self.newline_indent();
                self.out.push('}');
                if let Some(CatchClause { param, guard, body }) = handler {
                    self.newline_indent();
                    self.out.push_str("catch (");
                    self.out.push_str(self.name(*param));
                    if let Some(g) = guard {
                        self.out.push_str(" if ");
                        self.print_expr(g);
                    }
                    self.out.push_str(") {");
                    self.indent += 1;
                    for s in body {
                        self.print_stmt(s);
                    }
                    self.indent -= 1;
                    self.newline_indent();
                    self.out.push('}');
                }
                if let Some(finalizer) = finalizer {
                    self.newline_indent();
                    self.out.push_str("finally {");
                    self.indent += 1;
                    for s in finalizer {
                        self.print_stmt(s);
                    }
                    self.indent -= 1;
                    self.newline_indent();
                    self.out.push('}');
                }
            }
            Stmt::FunctionDecl(def) => self.print_function(def, true),
        }
    }

    fn print_function(&mut self, def: &FunctionDef, is_decl: bool) {
        self.out.push_str("function ");
        if let Some(name) = def.name {
            self.out.push_str(self.name(name));
        }
        self.out.push('(');
        for (i, p) in def.params.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.out.push_str(self.name(*p));
        }
        self.out.push_str(") {");
        self.indent += 1;
        for s in &def.body {
            self.print_stmt(s);
        }
        self.indent -= 1;
        self.newline_indent();
        self.out.push('}');
        if !is_decl {
            // expression form: caller wraps parens if needed for precedence
        }
    }

    fn print_expr(&mut self, expr: &Node<Expr>) {
        match &expr.node {
            Expr::This => self.out.push_str("this"),
            Expr::Identifier(id) => self.out.push_str(self.name(*id)),
            Expr::Null => self.out.push_str("null"),
            Expr::Boolean(b) => self.out.push_str(if *b { "true" } else { "false" }),
            Expr::Number(n) => self.out.push_str(&number_to_string(*n)),
            Expr::String(id) => {
                let _ = write!(self.out, "{:?}", self.name(*id));
            }
            Expr::RegExp { pattern, flags } => {
                let _ = write!(self.out, "/{}/{}", self.name(*pattern), self.name(*flags));
            }
            Expr::Array(elements) => {
                self.out.push('[');
                for (i, el) in elements.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    if let Some(e) = el {
                        self.print_expr(e);
                    }
                }
                self.out.push(']');
            }
            Expr::Object(props) => {
                self.out.push('{');
                for (i, (key, value)) in props.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    match key {
                        PropertyKey::Identifier(id) => self.out.push_str(self.name(*id)),
                        PropertyKey::String(id) => {
                            let _ = write!(self.out, "{:?}", self.name(*id));
                        }
                        PropertyKey::Number(n) => self.out.push_str(&number_to_string(*n)),
                    }
                    self.out.push_str(": ");
                    self.print_expr(value);
                }
                self.out.push('}');
            }
            Expr::Function(def) => self.print_function(def, false),
            Expr::Unary { op, argument } => {
                self.out.push_str(unary_op_text(*op));
                if matches!(op, UnaryOp::TypeOf | UnaryOp::Void | UnaryOp::Delete) {
                    self.out.push(' ');
                }
                self.print_expr(argument);
            }
            Expr::Update { op, argument, prefix } => {
                let text = if *op == UpdateOp::Increment { "++" } else { "--" };
                if *prefix {
                    self.out.push_str(text);
                    self.print_expr(argument);
                } else {
                    self.print_expr(argument);
                    self.out.push_str(text);
                }
            }
            Expr::Binary { op, left, right } => {
                self.out.push('(');
                self.print_expr(left);
                let _ = write!(self.out, " {} ", binary_op_text(*op));
                self.print_expr(right);
                self.out.push(')');
            }
            Expr::Logical { op, left, right } => {
                self.out.push('(');
                self.print_expr(left);
                let text = if *op == LogicalOp::And { "&&" } else { "||" };
                let _ = write!(self.out, " {text} ");
                self.print_expr(right);
                self.out.push(')');
            }
            Expr::Assignment { op, target, value } => {
                self.print_expr(target);
                let _ = write!(self.out, " {} ", assign_op_text(*op));
                self.print_expr(value);
            }
            Expr::Conditional { test, consequent, alternate } => {
                self.out.push('(');
                self.print_expr(test);
                self.out.push_str(" ? ");
                self.print_expr(consequent);
                self.out.push_str(" : ");
                self.print_expr(alternate);
                self.out.push(')');
            }
            Expr::Call { callee, arguments } => {
                self.print_expr(callee);
                self.print_args(arguments);
            }
            Expr::New { callee, arguments } => {
                self.out.push_str("new ");
                self.print_expr(callee);
                self.print_args(arguments);
            }
            Expr::Member { object, property } => {
                self.print_expr(object);
                match property {
                    MemberKey::Static(name) => {
                        self.out.push('.');
                        self.out.push_str(self.name(*name));
                    }
                    MemberKey::Computed(e) => {
                        self.out.push('[');
                        self.print_expr(e);
                        self.out.push(']');
                    }
                }
            }
            Expr::Sequence(exprs) => {
                for (i, e) in exprs.iter().enumerate() {
                    if i > 0 {
                        self.out.push_str(", ");
                    }
                    self.print_expr(e);
                }
            }
        }
    }

    fn print_args(&mut self, arguments: &[Node<Expr>]) {
        self.out.push('(');
        for (i, a) in arguments.iter().enumerate() {
            if i > 0 {
                self.out.push_str(", ");
            }
            self.print_expr(a);
        }
        self.out.push(')');
    }
}

fn unary_op_text(op: UnaryOp) -> &'static str {
    match op {
        UnaryOp::Minus => "-",
        UnaryOp::Plus => "+",
        UnaryOp::Not => "!",
        UnaryOp::BitNot => "~",
        UnaryOp::TypeOf => "typeof",
        UnaryOp::Void => "void",
        UnaryOp::Delete => "delete",
    }
}

fn binary_op_text(op: BinaryOp) -> &'static str {
    match op {
        BinaryOp::Add => "+",
        BinaryOp::Sub => "-",
        BinaryOp::Mul => "*",
        BinaryOp::Div => "/",
        BinaryOp::Mod => "%",
        BinaryOp::Eq => "==",
        BinaryOp::NotEq => "!=",
        BinaryOp::StrictEq => "===",
        BinaryOp::StrictNotEq => "!==",
        BinaryOp::Lt => "<",
        BinaryOp::Gt => ">",
        BinaryOp::LtEq => "<=",
        BinaryOp::GtEq => ">=",
        BinaryOp::ShiftLeft => "<<",
        BinaryOp::ShiftRight => ">>",
        BinaryOp::ShiftRightUnsigned => ">>>",
        BinaryOp::BitAnd => "&",
        BinaryOp::BitOr => "|",
        BinaryOp::BitXor => "^",
        BinaryOp::In => "in",
        BinaryOp::InstanceOf => "instanceof",
    }
}

fn assign_op_text(op: AssignOp) -> &'static str {
    match op {
        AssignOp::Assign => "=",
        AssignOp::AddAssign => "+=",
        AssignOp::SubAssign => "-=",
        AssignOp::MulAssign => "*=",
        AssignOp::DivAssign => "/=",
        AssignOp::ModAssign => "%=",
        AssignOp::ShiftLeftAssign => "<<=",
        AssignOp::ShiftRightAssign => ">>=",
        AssignOp::ShiftRightUnsignedAssign => ">>>=",
        AssignOp::BitAndAssign => "&=",
        AssignOp::BitOrAssign => "|=",
        AssignOp::BitXorAssign => "^=",
    }
}
