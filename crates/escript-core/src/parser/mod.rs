//! The recursive-descent parser (spec.md §4.3): turns a token stream into
//! the [`crate::ast`] tree the evaluator walks.
//!
//! This module owns token navigation and the expression grammar; [`stmt`]
//! holds the statement grammar. The split mirrors `eval`'s
//! `mod.rs`/`expr.rs`/`stmt.rs` three-way division.
//!
//! Two ES3 ambiguities get resolved the standard recursive-descent way
//! rather than with an explicit multi-token lookahead buffer:
//!
//! - `new a.b(x)` vs `(new a.b)(x)`: [`Parser::parse_new_expression`] and
//!   [`Parser::parse_member_tail`] are mutually recursive in the classic
//!   shape — a `new` only consumes a parenthesized argument list that
//!   immediately follows the callee it just parsed, and member access
//!   (`.`/`[]`) binds to a `new` before any trailing call does.
//! - `foo: bar();` (a label) vs `foo ? bar() : baz();` (an expression): a
//!   leading `Identifier` is only reinterpreted as a label after a single
//!   token of lookahead confirms a `:` follows — see [`Parser::peek2`].
//!
//! Function-expression-vs-declaration is resolved by syntactic position:
//! [`stmt::Parser::parse_statement_core`] calls [`Parser::parse_function`]
//! with `is_declaration: true` only when `function` begins a statement;
//! [`Parser::parse_primary_expression`] always passes `false`.

mod stmt;

use crate::{
    ast::{AssignOp, BinaryOp, Expr, LogicalOp, Node, PropertyKey, Span, UnaryOp, UpdateOp},
    compat::CompatFlags,
    exception::{ExcType, Exception},
    intern::{Interner, StringId},
    lexer::Lexer,
    source::Source,
    token::{Keyword, Punct, Token, TokenKind},
};

/// A `break`/`continue` target: one per statement being parsed, tracking
/// which labels reach it and whether it is a loop (`continue`-reachable)
/// or a loop/switch (reachable by an unlabeled `break`).
struct Target {
    labels: Vec<StringId>,
    breakable_unlabeled: bool,
    continuable: bool,
}

pub struct Parser<'a> {
    lexer: Lexer<'a>,
    interner: &'a mut Interner,
    source: &'a Source,
    source_name: String,
    cur: Token,
    lookahead: Option<Token>,
    targets: Vec<Target>,
    func_depth: u32,
}

impl<'a> Parser<'a> {
    pub fn new(source: &'a Source, interner: &'a mut Interner, compat: CompatFlags) -> Result<Self, Exception> {
        let mut lexer = Lexer::new(source, compat);
        let cur = lexer.next_token(interner, false)?;
        Ok(Self {
            lexer,
            interner,
            source,
            source_name: source.name().unwrap_or("<input>").to_owned(),
            cur,
            lookahead: None,
            targets: Vec::new(),
            func_depth: 0,
        })
    }

    fn bump(&mut self) -> Result<(), Exception> {
        self.cur = match self.lookahead.take() {
            Some(tok) => tok,
            None => self.lexer.next_token(self.interner, false)?,
        };
        Ok(())
    }

    /// One token of lookahead past `self.cur`, buffered so a second `bump`
    /// returns it instead of scanning twice. Used only to tell a label
    /// (`ident:`) apart from an expression statement starting with an
    /// identifier.
    fn peek2(&mut self) -> Result<&Token, Exception> {
        if self.lookahead.is_none() {
            self.lookahead = Some(self.lexer.next_token(self.interner, false)?);
        }
        Ok(self.lookahead.as_ref().expect("just populated"))
    }

    fn error(&self, message: impl Into<String>) -> Exception {
        let loc = self.source.loc_at(self.cur.span.start as usize);
        Exception::new(ExcType::SyntaxError, format!("{}:{}: {}", self.source_name, loc.line, message.into()), loc)
    }

    fn expect_punct(&mut self, p: Punct) -> Result<Span, Exception> {
        if matches!(self.cur.kind, TokenKind::Punct(found) if found == p) {
            let span = self.cur.span;
            self.bump()?;
            Ok(span)
        } else {
            Err(self.error(format!("expected '{p:?}'")))
        }
    }

    fn expect_keyword(&mut self, k: Keyword) -> Result<Span, Exception> {
        if matches!(self.cur.kind, TokenKind::Keyword(found) if found == k) {
            let span = self.cur.span;
            self.bump()?;
            Ok(span)
        } else {
            Err(self.error(format!("expected '{k:?}'")))
        }
    }

    fn expect_identifier(&mut self) -> Result<StringId, Exception> {
        if let TokenKind::Identifier(id) = self.cur.kind {
            self.bump()?;
            Ok(id)
        } else {
            Err(self.error("expected identifier"))
        }
    }

    /// ECMA-262 §7.9's ASI: a `;` is satisfied by a literal semicolon, an
    /// upcoming `}`, end of input, or a line terminator before the current
    /// token (a syntax error otherwise).
    fn consume_semicolon(&mut self) -> Result<(), Exception> {
        if matches!(self.cur.kind, TokenKind::Punct(Punct::Semi)) {
            self.bump()?;
            return Ok(());
        }
        if matches!(self.cur.kind, TokenKind::Punct(Punct::RBrace) | TokenKind::Eof) || self.cur.preceded_by_newline {
            return Ok(());
        }
        Err(self.error("expected ';'"))
    }

    // ---- Expressions, loosest to tightest binding ----

    pub(crate) fn parse_expression(&mut self, no_in: bool) -> Result<Node<Expr>, Exception> {
        let first = self.parse_assignment_expression(no_in)?;
        if !matches!(self.cur.kind, TokenKind::Punct(Punct::Comma)) {
            return Ok(first);
        }
        let start = first.span;
        let mut exprs = vec![first];
        while matches!(self.cur.kind, TokenKind::Punct(Punct::Comma)) {
            self.bump()?;
            exprs.push(self.parse_assignment_expression(no_in)?);
        }
        let end = exprs.last().expect("at least the first element").span;
        Ok(Node::new(start.to(end), Expr::Sequence(exprs)))
    }

    fn parse_assignment_expression(&mut self, no_in: bool) -> Result<Node<Expr>, Exception> {
        let left = self.parse_conditional_expression(no_in)?;
        let Some(op) = assign_op_for(&self.cur.kind) else {
            return Ok(left);
        };
        self.bump()?;
        let right = self.parse_assignment_expression(no_in)?;
        let span = left.span.to(right.span);
        Ok(Node::new(span, Expr::Assignment { op, target: Box::new(left), value: Box::new(right) }))
    }

    fn parse_conditional_expression(&mut self, no_in: bool) -> Result<Node<Expr>, Exception> {
        let test = self.parse_logical_or(no_in)?;
        if !matches!(self.cur.kind, TokenKind::Punct(Punct::Question)) {
            return Ok(test);
        }
        self.bump()?;
        let consequent = self.parse_assignment_expression(false)?;
        self.expect_punct(Punct::Colon)?;
        let alternate = self.parse_assignment_expression(no_in)?;
        let span = test.span.to(alternate.span);
        Ok(Node::new(span, Expr::Conditional { test: Box::new(test), consequent: Box::new(consequent), alternate: Box::new(alternate) }))
    }

    fn parse_logical_or(&mut self, no_in: bool) -> Result<Node<Expr>, Exception> {
        let mut left = self.parse_logical_and(no_in)?;
        while matches!(self.cur.kind, TokenKind::Punct(Punct::PipePipe)) {
            self.bump()?;
            let right = self.parse_logical_and(no_in)?;
            let span = left.span.to(right.span);
            left = Node::new(span, Expr::Logical { op: LogicalOp::Or, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_logical_and(&mut self, no_in: bool) -> Result<Node<Expr>, Exception> {
        let mut left = self.parse_bitwise_or(no_in)?;
        while matches!(self.cur.kind, TokenKind::Punct(Punct::AmpAmp)) {
            self.bump()?;
            let right = self.parse_bitwise_or(no_in)?;
            let span = left.span.to(right.span);
            left = Node::new(span, Expr::Logical { op: LogicalOp::And, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_bitwise_or(&mut self, no_in: bool) -> Result<Node<Expr>, Exception> {
        let mut left = self.parse_bitwise_xor(no_in)?;
        while matches!(self.cur.kind, TokenKind::Punct(Punct::Pipe)) {
            self.bump()?;
            let right = self.parse_bitwise_xor(no_in)?;
            let span = left.span.to(right.span);
            left = Node::new(span, Expr::Binary { op: BinaryOp::BitOr, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_bitwise_xor(&mut self, no_in: bool) -> Result<Node<Expr>, Exception> {
        let mut left = self.parse_bitwise_and(no_in)?;
        while matches!(self.cur.kind, TokenKind::Punct(Punct::Caret)) {
            self.bump()?;
            let right = self.parse_bitwise_and(no_in)?;
            let span = left.span.to(right.span);
            left = Node::new(span, Expr::Binary { op: BinaryOp::BitXor, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_bitwise_and(&mut self, no_in: bool) -> Result<Node<Expr>, Exception> {
        let mut left = self.parse_equality(no_in)?;
        while matches!(self.cur.kind, TokenKind::Punct(Punct::Amp)) {
            self.bump()?;
            let right = self.parse_equality(no_in)?;
            let span = left.span.to(right.span);
            left = Node::new(span, Expr::Binary { op: BinaryOp::BitAnd, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_equality(&mut self, no_in: bool) -> Result<Node<Expr>, Exception> {
        let mut left = self.parse_relational(no_in)?;
        loop {
            let op = match self.cur.kind {
                TokenKind::Punct(Punct::Eq) => BinaryOp::Eq,
                TokenKind::Punct(Punct::NotEq) => BinaryOp::NotEq,
                TokenKind::Punct(Punct::StrictEq) => BinaryOp::StrictEq,
                TokenKind::Punct(Punct::StrictNotEq) => BinaryOp::StrictNotEq,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_relational(no_in)?;
            let span = left.span.to(right.span);
            left = Node::new(span, Expr::Binary { op, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    /// `no_in` suppresses the `in` operator here only — ECMA-262 §12.6's
    /// `for (... in ...)` header parses its first clause with this flag set
    /// so `in` is free to mean the loop's own keyword instead.
    fn parse_relational(&mut self, no_in: bool) -> Result<Node<Expr>, Exception> {
        let mut left = self.parse_shift()?;
        loop {
            let op = match self.cur.kind {
                TokenKind::Punct(Punct::Lt) => BinaryOp::Lt,
                TokenKind::Punct(Punct::Gt) => BinaryOp::Gt,
                TokenKind::Punct(Punct::LtEq) => BinaryOp::LtEq,
                TokenKind::Punct(Punct::GtEq) => BinaryOp::GtEq,
                TokenKind::Keyword(Keyword::InstanceOf) => BinaryOp::InstanceOf,
                TokenKind::Keyword(Keyword::In) if !no_in => BinaryOp::In,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_shift()?;
            let span = left.span.to(right.span);
            left = Node::new(span, Expr::Binary { op, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_shift(&mut self) -> Result<Node<Expr>, Exception> {
        let mut left = self.parse_additive()?;
        loop {
            let op = match self.cur.kind {
                TokenKind::Punct(Punct::ShiftLeft) => BinaryOp::ShiftLeft,
                TokenKind::Punct(Punct::ShiftRight) => BinaryOp::ShiftRight,
                TokenKind::Punct(Punct::ShiftRightUnsigned) => BinaryOp::ShiftRightUnsigned,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_additive()?;
            let span = left.span.to(right.span);
            left = Node::new(span, Expr::Binary { op, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_additive(&mut self) -> Result<Node<Expr>, Exception> {
        let mut left = self.parse_multiplicative()?;
        loop {
            let op = match self.cur.kind {
                TokenKind::Punct(Punct::Plus) => BinaryOp::Add,
                TokenKind::Punct(Punct::Minus) => BinaryOp::Sub,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_multiplicative()?;
            let span = left.span.to(right.span);
            left = Node::new(span, Expr::Binary { op, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_multiplicative(&mut self) -> Result<Node<Expr>, Exception> {
        let mut left = self.parse_unary()?;
        loop {
            let op = match self.cur.kind {
                TokenKind::Punct(Punct::Star) => BinaryOp::Mul,
                TokenKind::Punct(Punct::Slash) => BinaryOp::Div,
                TokenKind::Punct(Punct::Percent) => BinaryOp::Mod,
                _ => break,
            };
            self.bump()?;
            let right = self.parse_unary()?;
            let span = left.span.to(right.span);
            left = Node::new(span, Expr::Binary { op, left: Box::new(left), right: Box::new(right) });
        }
        Ok(left)
    }

    fn parse_unary(&mut self) -> Result<Node<Expr>, Exception> {
        let start = self.cur.span;
        let op = match self.cur.kind {
            TokenKind::Punct(Punct::Minus) => Some(UnaryOp::Minus),
            TokenKind::Punct(Punct::Plus) => Some(UnaryOp::Plus),
            TokenKind::Punct(Punct::Not) => Some(UnaryOp::Not),
            TokenKind::Punct(Punct::Tilde) => Some(UnaryOp::BitNot),
            TokenKind::Keyword(Keyword::TypeOf) => Some(UnaryOp::TypeOf),
            TokenKind::Keyword(Keyword::Void) => Some(UnaryOp::Void),
            TokenKind::Keyword(Keyword::Delete) => Some(UnaryOp::Delete),
            _ => None,
        };
        if let Some(op) = op {
            self.bump()?;
            let argument = self.parse_unary()?;
            let span = start.to(argument.span);
            // Constant-fold a literal sign onto a numeric literal rather
            // than wrapping it in a `Unary` node (spec.md §4.3's
            // compile-time-constant folding).
            if let (UnaryOp::Minus, Expr::Number(n)) = (op, &argument.node) {
                return Ok(Node::new(span, Expr::Number(-n)));
            }
            if let (UnaryOp::Plus, Expr::Number(n)) = (op, &argument.node) {
                return Ok(Node::new(span, Expr::Number(*n)));
            }
            return Ok(Node::new(span, Expr::Unary { op, argument: Box::new(argument) }));
        }
        if matches!(self.cur.kind, TokenKind::Punct(Punct::PlusPlus | Punct::MinusMinus)) {
            let op = if matches!(self.cur.kind, TokenKind::Punct(Punct::PlusPlus)) { UpdateOp::Increment } else { UpdateOp::Decrement };
            self.bump()?;
            let argument = self.parse_unary()?;
            let span = start.to(argument.span);
            return Ok(Node::new(span, Expr::Update { op, argument: Box::new(argument), prefix: true }));
        }
        self.parse_postfix_expression()
    }

    /// Postfix `++`/`--`: ECMA-262 §7.9.1 forbids a line terminator between
    /// the operand and the operator, so a preceding newline here means the
    /// operator starts a new statement instead (ASI).
    fn parse_postfix_expression(&mut self) -> Result<Node<Expr>, Exception> {
        let expr = self.parse_lhs_expression()?;
        if self.cur.preceded_by_newline {
            return Ok(expr);
        }
        if let TokenKind::Punct(Punct::PlusPlus | Punct::MinusMinus) = self.cur.kind {
            let op = if matches!(self.cur.kind, TokenKind::Punct(Punct::PlusPlus)) { UpdateOp::Increment } else { UpdateOp::Decrement };
            let end = self.cur.span;
            self.bump()?;
            let span = expr.span.to(end);
            return Ok(Node::new(span, Expr::Update { op, argument: Box::new(expr), prefix: false }));
        }
        Ok(expr)
    }

    /// `MemberExpression`/`CallExpression`/`NewExpression` combined: a
    /// `new`-free base (`parse_new_expression`, which recurses for `new`)
    /// followed by any run of `.`, `[]`, and `()`.
    fn parse_lhs_expression(&mut self) -> Result<Node<Expr>, Exception> {
        let mut expr = self.parse_new_expression()?;
        loop {
            match self.cur.kind {
                TokenKind::Punct(Punct::Dot) => {
                    self.bump()?;
                    let name = self.expect_identifier_allowing_keywords()?;
                    expr = self.member_static(expr, name);
                }
                TokenKind::Punct(Punct::LBracket) => {
                    expr = self.member_computed(expr)?;
                }
                TokenKind::Punct(Punct::LParen) => {
                    let (args, end) = self.parse_arguments()?;
                    let span = expr.span.to(end);
                    expr = Node::new(span, Expr::Call { callee: Box::new(expr), arguments: args });
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    /// `new` binds to the tightest member-access chain that follows it and
    /// consumes at most one argument list — the argument list that
    /// immediately trails that chain, if any — leaving any further `()` to
    /// the caller's `parse_lhs_expression` loop. This is what makes
    /// `new a.b(x)()` parse as `(new a.b(x))()` rather than
    /// `new (a.b(x)())`.
    fn parse_new_expression(&mut self) -> Result<Node<Expr>, Exception> {
        if !matches!(self.cur.kind, TokenKind::Keyword(Keyword::New)) {
            let primary = self.parse_primary_expression()?;
            return self.parse_member_tail(primary);
        }
        let start = self.cur.span;
        self.bump()?;
        let callee = self.parse_new_expression()?;
        if matches!(self.cur.kind, TokenKind::Punct(Punct::LParen)) {
            let (args, end) = self.parse_arguments()?;
            let new_expr = Node::new(start.to(end), Expr::New { callee: Box::new(callee), arguments: args });
            return self.parse_member_tail(new_expr);
        }
        let span = start.to(callee.span);
        let new_expr = Node::new(span, Expr::New { callee: Box::new(callee), arguments: Vec::new() });
        self.parse_member_tail(new_expr)
    }

    /// `.`/`[]` only — never consumes `(`, so a `new`'s own argument list
    /// (handled by its caller) and a following call on the whole
    /// expression (handled by `parse_lhs_expression`) both stay separate
    /// from plain member access.
    fn parse_member_tail(&mut self, mut expr: Node<Expr>) -> Result<Node<Expr>, Exception> {
        loop {
            match self.cur.kind {
                TokenKind::Punct(Punct::Dot) => {
                    self.bump()?;
                    let name = self.expect_identifier_allowing_keywords()?;
                    expr = self.member_static(expr, name);
                }
                TokenKind::Punct(Punct::LBracket) => {
                    expr = self.member_computed(expr)?;
                }
                _ => break,
            }
        }
        Ok(expr)
    }

    fn member_static(&mut self, object: Node<Expr>, name: StringId) -> Node<Expr> {
        let end = self.cur.span;
        let span = object.span.to(end);
        Node::new(span, Expr::Member { object: Box::new(object), property: crate::ast::MemberKey::Static(name) })
    }

    fn member_computed(&mut self, object: Node<Expr>) -> Result<Node<Expr>, Exception> {
        self.bump()?; // '['
        let prop = self.parse_expression(false)?;
        let end = self.expect_punct(Punct::RBracket)?;
        let span = object.span.to(end);
        Ok(Node::new(span, Expr::Member { object: Box::new(object), property: crate::ast::MemberKey::Computed(Box::new(prop)) }))
    }

    /// A property name after `.` may be any reserved word, not just an
    /// `Identifier` token (`obj.delete`, `obj.default` are legal in ES3).
    fn expect_identifier_allowing_keywords(&mut self) -> Result<StringId, Exception> {
        match self.cur.kind {
            TokenKind::Identifier(id) => {
                self.bump()?;
                Ok(id)
            }
            TokenKind::Keyword(kw) => {
                let id = self.interner.intern(keyword_text(kw));
                self.bump()?;
                Ok(id)
            }
            _ => Err(self.error("expected property name after '.'")),
        }
    }

    fn parse_arguments(&mut self) -> Result<(Vec<Node<Expr>>, Span), Exception> {
        self.expect_punct(Punct::LParen)?;
        let mut args = Vec::new();
        while !matches!(self.cur.kind, TokenKind::Punct(Punct::RParen)) {
            args.push(self.parse_assignment_expression(false)?);
            if matches!(self.cur.kind, TokenKind::Punct(Punct::Comma)) {
                self.bump()?;
            } else {
                break;
            }
        }
        let end = self.expect_punct(Punct::RParen)?;
        Ok((args, end))
    }

    fn parse_primary_expression(&mut self) -> Result<Node<Expr>, Exception> {
        let start = self.cur.span;
        match self.cur.kind {
            TokenKind::Keyword(Keyword::This) => {
                self.bump()?;
                Ok(Node::new(start, Expr::This))
            }
            TokenKind::Keyword(Keyword::Null) => {
                self.bump()?;
                Ok(Node::new(start, Expr::Null))
            }
            TokenKind::Keyword(Keyword::True) => {
                self.bump()?;
                Ok(Node::new(start, Expr::Boolean(true)))
            }
            TokenKind::Keyword(Keyword::False) => {
                self.bump()?;
                Ok(Node::new(start, Expr::Boolean(false)))
            }
            TokenKind::Keyword(Keyword::Function) => {
                let def = self.parse_function(false)?;
                let span = def.span;
                Ok(Node::new(span, Expr::Function(def)))
            }
            TokenKind::Identifier(id) => {
                self.bump()?;
                Ok(Node::new(start, Expr::Identifier(id)))
            }
            TokenKind::Number(n) => {
                self.bump()?;
                Ok(Node::new(start, Expr::Number(n)))
            }
            TokenKind::String(id) => {
                self.bump()?;
                Ok(Node::new(start, Expr::String(id)))
            }
            TokenKind::RegExp { pattern, flags } => {
                self.bump()?;
                Ok(Node::new(start, Expr::RegExp { pattern, flags }))
            }
            TokenKind::Punct(Punct::LBracket) => self.parse_array_literal(),
            TokenKind::Punct(Punct::LBrace) => self.parse_object_literal(),
            TokenKind::Punct(Punct::LParen) => {
                self.bump()?;
                let expr = self.parse_expression(false)?;
                self.expect_punct(Punct::RParen)?;
                Ok(expr)
            }
            TokenKind::Punct(Punct::Slash | Punct::SlashAssign) => {
                self.lookahead = None;
                let token = self.lexer.rescan_as_regex(self.cur.span, self.interner)?;
                self.cur = token;
                let TokenKind::RegExp { pattern, flags } = self.cur.kind else {
                    return Err(self.error("expected regular expression literal"));
                };
                let span = self.cur.span;
                self.bump()?;
                Ok(Node::new(span, Expr::RegExp { pattern, flags }))
            }
            _ => Err(self.error("unexpected token")),
        }
    }

    fn parse_array_literal(&mut self) -> Result<Node<Expr>, Exception> {
        let start = self.cur.span;
        self.bump()?; // '['
        let mut elements = Vec::new();
        while !matches!(self.cur.kind, TokenKind::Punct(Punct::RBracket)) {
            if matches!(self.cur.kind, TokenKind::Punct(Punct::Comma)) {
                elements.push(None);
                self.bump()?;
                continue;
            }
            elements.push(Some(self.parse_assignment_expression(false)?));
            if matches!(self.cur.kind, TokenKind::Punct(Punct::Comma)) {
                self.bump()?;
            } else {
                break;
            }
        }
        let end = self.expect_punct(Punct::RBracket)?;
        Ok(Node::new(start.to(end), Expr::Array(elements)))
    }

    fn parse_object_literal(&mut self) -> Result<Node<Expr>, Exception> {
        let start = self.cur.span;
        self.bump()?; // '{'
        let mut props = Vec::new();
        while !matches!(self.cur.kind, TokenKind::Punct(Punct::RBrace)) {
            let key = self.parse_property_key()?;
            self.expect_punct(Punct::Colon)?;
            let value = self.parse_assignment_expression(false)?;
            props.push((key, value));
            if matches!(self.cur.kind, TokenKind::Punct(Punct::Comma)) {
                self.bump()?;
            } else {
                break;
            }
        }
        let end = self.expect_punct(Punct::RBrace)?;
        Ok(Node::new(start.to(end), Expr::Object(props)))
    }

    fn parse_property_key(&mut self) -> Result<PropertyKey, Exception> {
        match self.cur.kind {
            TokenKind::Identifier(id) => {
                self.bump()?;
                Ok(PropertyKey::Identifier(id))
            }
            TokenKind::Keyword(kw) => {
                let id = self.interner.intern(keyword_text(kw));
                self.bump()?;
                Ok(PropertyKey::Identifier(id))
            }
            TokenKind::String(id) => {
                self.bump()?;
                Ok(PropertyKey::String(id))
            }
            TokenKind::Number(n) => {
                self.bump()?;
                Ok(PropertyKey::Number(n))
            }
            _ => Err(self.error("expected property name")),
        }
    }

    /// `function` [name] `(` params `)` `{` body `}` — shared by function
    /// declarations and function expressions; the caller tells the two
    /// apart by passing `is_declaration` (the name is mandatory only for
    /// declarations).
    fn parse_function(&mut self, is_declaration: bool) -> Result<crate::ast::FunctionDef, Exception> {
        let start = self.cur.span;
        self.bump()?; // 'function'
        let name = match self.cur.kind {
            TokenKind::Identifier(id) => {
                self.bump()?;
                Some(id)
            }
            _ if is_declaration => return Err(self.error("function declaration requires a name")),
            _ => None,
        };
        self.expect_punct(Punct::LParen)?;
        let mut params = Vec::new();
        while !matches!(self.cur.kind, TokenKind::Punct(Punct::RParen)) {
            params.push(self.expect_identifier()?);
            if matches!(self.cur.kind, TokenKind::Punct(Punct::Comma)) {
                self.bump()?;
            } else {
                break;
            }
        }
        self.expect_punct(Punct::RParen)?;
        self.expect_punct(Punct::LBrace)?;
        self.func_depth += 1;
        let body = self.parse_statement_list_until(Punct::RBrace);
        self.func_depth -= 1;
        let body = body?;
        let end = self.expect_punct(Punct::RBrace)?;
        Ok(crate::ast::FunctionDef { name, params, body, span: start.to(end) })
    }
}

fn assign_op_for(kind: &TokenKind) -> Option<AssignOp> {
    match kind {
        TokenKind::Punct(Punct::Assign) => Some(AssignOp::Assign),
        TokenKind::Punct(Punct::PlusAssign) => Some(AssignOp::AddAssign),
        TokenKind::Punct(Punct::MinusAssign) => Some(AssignOp::SubAssign),
        TokenKind::Punct(Punct::StarAssign) => Some(AssignOp::MulAssign),
        TokenKind::Punct(Punct::SlashAssign) => Some(AssignOp::DivAssign),
        TokenKind::Punct(Punct::PercentAssign) => Some(AssignOp::ModAssign),
        TokenKind::Punct(Punct::ShiftLeftAssign) => Some(AssignOp::ShiftLeftAssign),
        TokenKind::Punct(Punct::ShiftRightAssign) => Some(AssignOp::ShiftRightAssign),
        TokenKind::Punct(Punct::ShiftRightUnsignedAssign) => Some(AssignOp::ShiftRightUnsignedAssign),
        TokenKind::Punct(Punct::AmpAssign) => Some(AssignOp::BitAndAssign),
        TokenKind::Punct(Punct::PipeAssign) => Some(AssignOp::BitOrAssign),
        TokenKind::Punct(Punct::CaretAssign) => Some(AssignOp::BitXorAssign),
        _ => None,
    }
}

fn keyword_text(kw: Keyword) -> &'static str {
    match kw {
        Keyword::Break => "break",
        Keyword::Case => "case",
        Keyword::Catch => "catch",
        Keyword::Continue => "continue",
        Keyword::Default => "default",
        Keyword::Delete => "delete",
        Keyword::Do => "do",
        Keyword::Else => "else",
        Keyword::Finally => "finally",
        Keyword::For => "for",
        Keyword::Function => "function",
        Keyword::If => "if",
        Keyword::In => "in",
        Keyword::InstanceOf => "instanceof",
        Keyword::New => "new",
        Keyword::Return => "return",
        Keyword::Switch => "switch",
        Keyword::This => "this",
        Keyword::Throw => "throw",
        Keyword::Try => "try",
        Keyword::TypeOf => "typeof",
        Keyword::Var => "var",
        Keyword::Void => "void",
        Keyword::While => "while",
        Keyword::With => "with",
        Keyword::Null => "null",
        Keyword::True => "true",
        Keyword::False => "false",
    }
}

/// Parses a complete program (`Global_eval`'s and `parse_program`'s
/// entry point, spec.md §6.1).
pub fn parse_program(source: &Source, interner: &mut Interner, compat: CompatFlags) -> Result<crate::ast::Program, Exception> {
    let mut parser = Parser::new(source, interner, compat)?;
    let body = parser.parse_statement_list_until_eof()?;
    Ok(crate::ast::Program { body })
}

/// Parses a function body in isolation (`parse_function`'s host-API entry
/// point, spec.md §6.1): the source is just the statements between the
/// function's braces, so `return` is legal from the outset.
pub fn parse_function_body(source: &Source, interner: &mut Interner, compat: CompatFlags) -> Result<Vec<Node<crate::ast::Stmt>>, Exception> {
    let mut parser = Parser::new(source, interner, compat)?;
    parser.func_depth += 1;
    parser.parse_statement_list_until_eof()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Stmt;

    fn parse(src: &str) -> crate::ast::Program {
        let source = Source::from_str(None, src);
        let mut interner = Interner::new();
        parse_program(&source, &mut interner, CompatFlags::default()).unwrap()
    }

    #[test]
    fn parses_operator_precedence() {
        let program = parse("1 + 2 * 3;");
        let Stmt::Expression(expr) = &program.body[0].node else { panic!("expected expression statement") };
        match &expr.node {
            Expr::Binary { op: BinaryOp::Add, left, right } => {
                assert!(matches!(left.node, Expr::Number(n) if n == 1.0));
                assert!(matches!(right.node, Expr::Binary { op: BinaryOp::Mul, .. }));
            }
            other => panic!("expected Add at the top, got {other:?}"),
        }
    }

    #[test]
    fn new_binds_tighter_than_trailing_call() {
        let program = parse("new a.b(x)();");
        let Stmt::Expression(expr) = &program.body[0].node else { panic!("expected expression statement") };
        match &expr.node {
            Expr::Call { callee, arguments } => {
                assert!(arguments.is_empty());
                assert!(matches!(callee.node, Expr::New { .. }));
            }
            other => panic!("expected an outer Call, got {other:?}"),
        }
    }

    #[test]
    fn distinguishes_label_from_conditional() {
        let program = parse("foo: bar;");
        assert!(matches!(program.body[0].node, Stmt::Labeled { .. }));
        let program = parse("foo ? bar : baz;");
        assert!(matches!(program.body[0].node, Stmt::Expression(_)));
    }

    #[test]
    fn regex_after_assign_not_division() {
        let program = parse("var r = /ab+c/i;");
        let Stmt::VarDecl(decls) = &program.body[0].node else { panic!("expected var decl") };
        assert!(matches!(decls[0].init.as_ref().unwrap().node, Expr::RegExp { .. }));
    }

    #[test]
    fn division_after_identifier_not_regex() {
        let program = parse("a / b;");
        let Stmt::Expression(expr) = &program.body[0].node else { panic!("expected expression statement") };
        assert!(matches!(expr.node, Expr::Binary { op: BinaryOp::Div, .. }));
    }

    #[test]
    fn unary_minus_folds_numeric_literal() {
        let program = parse("-5;");
        let Stmt::Expression(expr) = &program.body[0].node else { panic!("expected expression statement") };
        assert!(matches!(expr.node, Expr::Number(n) if n == -5.0));
    }
}
