//! Statement grammar (spec.md §4.3): everything `parse_statement` can
//! produce, plus Automatic Semicolon Insertion and `break`/`continue`
//! target validation.

use super::{Parser, Target};
use crate::{
    ast::{CatchClause, ForInTarget, ForInit, Node, Span, Stmt, SwitchCase, VarDeclarator},
    exception::Exception,
    intern::StringId,
    token::{Keyword, Punct, TokenKind},
};

impl<'a> Parser<'a> {
    pub(crate) fn parse_statement_list_until_eof(&mut self) -> Result<Vec<Node<Stmt>>, Exception> {
        let mut stmts = Vec::new();
        while !matches!(self.cur.kind, TokenKind::Eof) {
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    pub(super) fn parse_statement_list_until(&mut self, end: Punct) -> Result<Vec<Node<Stmt>>, Exception> {
        let mut stmts = Vec::new();
        while !matches!(self.cur.kind, TokenKind::Punct(p) if p == end) && !matches!(self.cur.kind, TokenKind::Eof) {
            stmts.push(self.parse_statement()?);
        }
        Ok(stmts)
    }

    /// A statement may begin with one or more `Identifier :` labels
    /// (ECMA-262 §12.12) before the statement they label. An `Identifier`
    /// not followed by `:` is an ordinary expression statement instead —
    /// [`Parser::peek2`] resolves the ambiguity with one token of
    /// lookahead rather than backtracking.
    pub(crate) fn parse_statement(&mut self) -> Result<Node<Stmt>, Exception> {
        let mut labels: Vec<StringId> = Vec::new();
        while let TokenKind::Identifier(name) = self.cur.kind {
            if matches!(self.peek2()?.kind, TokenKind::Punct(Punct::Colon)) {
                labels.push(name);
                self.bump()?; // identifier
                self.bump()?; // ':'
            } else {
                break;
            }
        }
        self.parse_unlabeled_statement(labels)
    }

    fn parse_unlabeled_statement(&mut self, labels: Vec<StringId>) -> Result<Node<Stmt>, Exception> {
        let is_iteration = matches!(self.cur.kind, TokenKind::Keyword(Keyword::For | Keyword::While | Keyword::Do));
        let is_switch = matches!(self.cur.kind, TokenKind::Keyword(Keyword::Switch));
        self.targets.push(Target { labels: labels.clone(), breakable_unlabeled: is_iteration || is_switch, continuable: is_iteration });
        let result = self.parse_statement_core();
        self.targets.pop();
        let core = result?;
        Ok(wrap_in_labels(core, labels))
    }

    fn parse_statement_core(&mut self) -> Result<Node<Stmt>, Exception> {
        match self.cur.kind {
            TokenKind::Punct(Punct::LBrace) => self.parse_block(),
            TokenKind::Punct(Punct::Semi) => {
                let span = self.cur.span;
                self.bump()?;
                Ok(Node::new(span, Stmt::Empty))
            }
            TokenKind::Keyword(Keyword::Var) => self.parse_var_statement(),
            TokenKind::Keyword(Keyword::If) => self.parse_if_statement(),
            TokenKind::Keyword(Keyword::While) => self.parse_while_statement(),
            TokenKind::Keyword(Keyword::Do) => self.parse_do_while_statement(),
            TokenKind::Keyword(Keyword::For) => self.parse_for_statement(),
            TokenKind::Keyword(Keyword::Continue) => self.parse_break_or_continue(true),
            TokenKind::Keyword(Keyword::Break) => self.parse_break_or_continue(false),
            TokenKind::Keyword(Keyword::Return) => self.parse_return_statement(),
            TokenKind::Keyword(Keyword::With) => self.parse_with_statement(),
            TokenKind::Keyword(Keyword::Switch) => self.parse_switch_statement(),
            TokenKind::Keyword(Keyword::Throw) => self.parse_throw_statement(),
            TokenKind::Keyword(Keyword::Try) => self.parse_try_statement(),
            TokenKind::Keyword(Keyword::Function) => {
                let def = self.parse_function(true)?;
                let span = def.span;
                Ok(Node::new(span, Stmt::FunctionDecl(def)))
            }
            _ => self.parse_expression_statement(),
        }
    }

    fn parse_block(&mut self) -> Result<Node<Stmt>, Exception> {
        let start = self.cur.span;
        self.bump()?; // '{'
        let body = self.parse_statement_list_until(Punct::RBrace)?;
        let end = self.expect_punct(Punct::RBrace)?;
        Ok(Node::new(start.to(end), Stmt::Block(body)))
    }

    fn parse_one_var_declarator(&mut self, no_in: bool) -> Result<VarDeclarator, Exception> {
        let name = self.expect_identifier()?;
        let init = if matches!(self.cur.kind, TokenKind::Punct(Punct::Assign)) {
            self.bump()?;
            Some(self.parse_assignment_expression(no_in)?)
        } else {
            None
        };
        Ok(VarDeclarator { name, init })
    }

    fn parse_var_declarator_list(&mut self, no_in: bool) -> Result<Vec<VarDeclarator>, Exception> {
        let mut decls = vec![self.parse_one_var_declarator(no_in)?];
        while matches!(self.cur.kind, TokenKind::Punct(Punct::Comma)) {
            self.bump()?;
            decls.push(self.parse_one_var_declarator(no_in)?);
        }
        Ok(decls)
    }

    fn parse_var_statement(&mut self) -> Result<Node<Stmt>, Exception> {
        let start = self.cur.span;
        self.bump()?; // 'var'
        let decls = self.parse_var_declarator_list(false)?;
        self.consume_semicolon()?;
        Ok(Node::new(start, Stmt::VarDecl(decls)))
    }

    fn parse_if_statement(&mut self) -> Result<Node<Stmt>, Exception> {
        let start = self.cur.span;
        self.bump()?; // 'if'
        self.expect_punct(Punct::LParen)?;
        let test = self.parse_expression(false)?;
        self.expect_punct(Punct::RParen)?;
        let consequent = Box::new(self.parse_statement()?);
        let alternate = if matches!(self.cur.kind, TokenKind::Keyword(Keyword::Else)) {
            self.bump()?;
            Some(Box::new(self.parse_statement()?))
        } else {
            None
        };
        let end = alternate.as_ref().map_or(consequent.span, |alt| alt.span);
        Ok(Node::new(start.to(end), Stmt::If { test, consequent, alternate }))
    }

    fn parse_while_statement(&mut self) -> Result<Node<Stmt>, Exception> {
        let start = self.cur.span;
        self.bump()?; // 'while'
        self.expect_punct(Punct::LParen)?;
        let test = self.parse_expression(false)?;
        self.expect_punct(Punct::RParen)?;
        let body = Box::new(self.parse_statement()?);
        let span = start.to(body.span);
        Ok(Node::new(span, Stmt::While { test, body }))
    }

    fn parse_do_while_statement(&mut self) -> Result<Node<Stmt>, Exception> {
        let start = self.cur.span;
        self.bump()?; // 'do'
        let body = Box::new(self.parse_statement()?);
        self.expect_keyword(Keyword::While)?;
        self.expect_punct(Punct::LParen)?;
        let test = self.parse_expression(false)?;
        let end = self.expect_punct(Punct::RParen)?;
        // A do-while's trailing ';' is special-cased by ECMA-262 §12.6's
        // grammar to always be subject to ASI, never required literally.
        if matches!(self.cur.kind, TokenKind::Punct(Punct::Semi)) {
            self.bump()?;
        }
        Ok(Node::new(start.to(end), Stmt::DoWhile { body, test }))
    }

    fn parse_for_statement(&mut self) -> Result<Node<Stmt>, Exception> {
        let start = self.cur.span;
        self.bump()?; // 'for'
        self.expect_punct(Punct::LParen)?;

        if matches!(self.cur.kind, TokenKind::Keyword(Keyword::Var)) {
            self.bump()?;
            let first = self.parse_one_var_declarator(true)?;
            if first.init.is_none() && matches!(self.cur.kind, TokenKind::Keyword(Keyword::In)) {
                return self.finish_for_in(start, ForInTarget::VarDecl(first.name));
            }
            let mut decls = vec![first];
            while matches!(self.cur.kind, TokenKind::Punct(Punct::Comma)) {
                self.bump()?;
                decls.push(self.parse_one_var_declarator(true)?);
            }
            self.expect_punct(Punct::Semi)?;
            return self.finish_classic_for(start, Some(Box::new(ForInit::VarDecl(decls))));
        }

        if matches!(self.cur.kind, TokenKind::Punct(Punct::Semi)) {
            self.bump()?;
            return self.finish_classic_for(start, None);
        }

        let expr = self.parse_expression(true)?;
        if matches!(self.cur.kind, TokenKind::Keyword(Keyword::In)) {
            return self.finish_for_in(start, ForInTarget::Pattern(expr));
        }
        self.expect_punct(Punct::Semi)?;
        self.finish_classic_for(start, Some(Box::new(ForInit::Expression(expr))))
    }

    fn finish_for_in(&mut self, start: Span, left: ForInTarget) -> Result<Node<Stmt>, Exception> {
        self.bump()?; // 'in'
        let right = self.parse_expression(false)?;
        self.expect_punct(Punct::RParen)?;
        let body = Box::new(self.parse_statement()?);
        let span = start.to(body.span);
        Ok(Node::new(span, Stmt::ForIn { left, right, body }))
    }

    fn finish_classic_for(&mut self, start: Span, init: Option<Box<ForInit>>) -> Result<Node<Stmt>, Exception> {
        let test = if matches!(self.cur.kind, TokenKind::Punct(Punct::Semi)) { None } else { Some(self.parse_expression(false)?) };
        self.expect_punct(Punct::Semi)?;
        let update = if matches!(self.cur.kind, TokenKind::Punct(Punct::RParen)) { None } else { Some(self.parse_expression(false)?) };
        self.expect_punct(Punct::RParen)?;
        let body = Box::new(self.parse_statement()?);
        let span = start.to(body.span);
        Ok(Node::new(span, Stmt::For { init, test, update, body }))
    }

    fn parse_break_or_continue(&mut self, is_continue: bool) -> Result<Node<Stmt>, Exception> {
        let start = self.cur.span;
        self.bump()?; // 'continue'/'break'
        // The label, if any, must be on the same line (ECMA-262 §7.9.1's
        // restricted production) — a line terminator here ends the
        // statement via ASI instead.
        let label = if !self.cur.preceded_by_newline {
            if let TokenKind::Identifier(name) = self.cur.kind {
                self.bump()?;
                Some(name)
            } else {
                None
            }
        } else {
            None
        };
        self.validate_target(label, is_continue)?;
        self.consume_semicolon()?;
        Ok(Node::new(start, if is_continue { Stmt::Continue(label) } else { Stmt::Break(label) }))
    }

    fn validate_target(&self, label: Option<StringId>, is_continue: bool) -> Result<(), Exception> {
        let ok = match label {
            None => self.targets.iter().rev().any(|t| if is_continue { t.continuable } else { t.breakable_unlabeled }),
            Some(name) => self.targets.iter().rev().any(|t| t.labels.contains(&name) && (!is_continue || t.continuable)),
        };
        if ok {
            Ok(())
        } else if is_continue {
            Err(self.error("illegal continue statement: no surrounding iteration statement"))
        } else {
            Err(self.error("illegal break statement: no surrounding loop, switch, or label"))
        }
    }

    fn parse_return_statement(&mut self) -> Result<Node<Stmt>, Exception> {
        let start = self.cur.span;
        if self.func_depth == 0 {
            return Err(self.error("return statement outside of function"));
        }
        self.bump()?; // 'return'
        let arg = if self.cur.preceded_by_newline || matches!(self.cur.kind, TokenKind::Punct(Punct::Semi | Punct::RBrace) | TokenKind::Eof) {
            None
        } else {
            Some(self.parse_expression(false)?)
        };
        self.consume_semicolon()?;
        Ok(Node::new(start, Stmt::Return(arg)))
    }

    fn parse_with_statement(&mut self) -> Result<Node<Stmt>, Exception> {
        let start = self.cur.span;
        self.bump()?; // 'with'
        self.expect_punct(Punct::LParen)?;
        let object = self.parse_expression(false)?;
        self.expect_punct(Punct::RParen)?;
        let body = Box::new(self.parse_statement()?);
        let span = start.to(body.span);
        Ok(Node::new(span, Stmt::With { object, body }))
    }

    fn parse_switch_statement(&mut self) -> Result<Node<Stmt>, Exception> {
        let start = self.cur.span;
        self.bump()?; // 'switch'
        self.expect_punct(Punct::LParen)?;
        let discriminant = self.parse_expression(false)?;
        self.expect_punct(Punct::RParen)?;
        self.expect_punct(Punct::LBrace)?;
        let mut cases = Vec::new();
        let mut seen_default = false;
        while !matches!(self.cur.kind, TokenKind::Punct(Punct::RBrace)) {
            let test = if matches!(self.cur.kind, TokenKind::Keyword(Keyword::Case)) {
                self.bump()?;
                let e = self.parse_expression(false)?;
                self.expect_punct(Punct::Colon)?;
                Some(e)
            } else if matches!(self.cur.kind, TokenKind::Keyword(Keyword::Default)) {
                if seen_default {
                    return Err(self.error("more than one default clause in switch statement"));
                }
                seen_default = true;
                self.bump()?;
                self.expect_punct(Punct::Colon)?;
                None
            } else {
                return Err(self.error("expected 'case' or 'default'"));
            };
            let mut consequent = Vec::new();
            while !matches!(
                self.cur.kind,
                TokenKind::Keyword(Keyword::Case | Keyword::Default) | TokenKind::Punct(Punct::RBrace)
            ) {
                consequent.push(self.parse_statement()?);
            }
            cases.push(SwitchCase { test, consequent });
        }
        let end = self.expect_punct(Punct::RBrace)?;
        Ok(Node::new(start.to(end), Stmt::Switch { discriminant, cases }))
    }

    fn parse_throw_statement(&mut self) -> Result<Node<Stmt>, Exception> {
        let start = self.cur.span;
        self.bump()?; // 'throw'
        if self.cur.preceded_by_newline {
            return Err(self.error("illegal newline after throw"));
        }
        let expr = self.parse_expression(false)?;
        self.consume_semicolon()?;
        Ok(Node::new(start.to(expr.span), Stmt::Throw(expr)))
    }

    fn parse_try_statement(&mut self) -> Result<Node<Stmt>, Exception> {
        let start = self.cur.span;
        self.bump()?; // 'try'
        self.expect_punct(Punct::LBrace)?;
        let block = self.parse_statement_list_until(Punct::RBrace)?;
        let mut end = self.expect_punct(Punct::RBrace)?;

        let handler = if matches!(self.cur.kind, TokenKind::Keyword(Keyword::Catch)) {
            self.bump()?;
            self.expect_punct(Punct::LParen)?;
            let param = self.expect_identifier()?;
            // `catch (e if cond)` — ext1 conditional catch (spec.md §6.2).
            let guard =
                if matches!(self.cur.kind, TokenKind::Keyword(Keyword::If)) { self.bump()?; Some(self.parse_expression(false)?) } else { None };
            self.expect_punct(Punct::RParen)?;
            self.expect_punct(Punct::LBrace)?;
            let body = self.parse_statement_list_until(Punct::RBrace)?;
            end = self.expect_punct(Punct::RBrace)?;
            Some(CatchClause { param, guard, body })
        } else {
            None
        };

        let finalizer = if matches!(self.cur.kind, TokenKind::Keyword(Keyword::Finally)) {
            self.bump()?;
            self.expect_punct(Punct::LBrace)?;
            let body = self.parse_statement_list_until(Punct::RBrace)?;
            end = self.expect_punct(Punct::RBrace)?;
            Some(body)
        } else {
            None
        };

        if handler.is_none() && finalizer.is_none() {
            return Err(self.error("missing catch or finally after try"));
        }
        Ok(Node::new(start.to(end), Stmt::Try { block, handler, finalizer }))
    }

    fn parse_expression_statement(&mut self) -> Result<Node<Stmt>, Exception> {
        let expr = self.parse_expression(false)?;
        let span = expr.span;
        self.consume_semicolon()?;
        Ok(Node::new(span, Stmt::Expression(expr)))
    }
}

fn wrap_in_labels(node: Node<Stmt>, labels: Vec<StringId>) -> Node<Stmt> {
    let span = node.span;
    labels.into_iter().rev().fold(node, |acc, label| Node::new(span, Stmt::Labeled { label, body: Box::new(acc) }))
}

#[cfg(test)]
mod tests {
    use super::super::parse_program;
    use crate::{ast::Stmt, compat::CompatFlags, intern::Interner, source::Source};

    fn parse(src: &str) -> Result<crate::ast::Program, crate::exception::Exception> {
        let source = Source::from_str(None, src);
        let mut interner = Interner::new();
        parse_program(&source, &mut interner, CompatFlags::default())
    }

    #[test]
    fn labeled_loop_continue_resolves() {
        let program = parse("outer: for (;;) { continue outer; }").unwrap();
        assert!(matches!(program.body[0].node, Stmt::Labeled { .. }));
    }

    #[test]
    fn continue_outside_loop_is_syntax_error() {
        assert!(parse("continue;").is_err());
    }

    #[test]
    fn break_inside_labeled_block_is_legal() {
        assert!(parse("foo: { break foo; }").is_ok());
    }

    #[test]
    fn continue_to_non_loop_label_is_syntax_error() {
        assert!(parse("foo: { continue foo; }").is_err());
    }

    #[test]
    fn for_in_with_var_binding() {
        let program = parse("for (var k in obj) { }").unwrap();
        assert!(matches!(program.body[0].node, Stmt::ForIn { left: crate::ast::ForInTarget::VarDecl(_), .. }));
    }

    #[test]
    fn classic_for_with_multiple_declarators() {
        let program = parse("for (var i = 0, j = 10; i < j; i++) { }").unwrap();
        let Stmt::For { init, .. } = &program.body[0].node else { panic!("expected a For statement") };
        let Some(boxed) = init else { panic!("expected an init clause") };
        let crate::ast::ForInit::VarDecl(decls) = boxed.as_ref() else { panic!("expected a VarDecl init") };
        assert_eq!(decls.len(), 2);
    }

    #[test]
    fn return_outside_function_is_syntax_error() {
        assert!(parse("return 1;").is_err());
    }

    #[test]
    fn try_without_catch_or_finally_is_syntax_error() {
        assert!(parse("try { }").is_err());
    }

    #[test]
    fn switch_rejects_second_default() {
        assert!(parse("switch (x) { default: break; default: break; }").is_err());
    }

    #[test]
    fn asi_inserts_semicolon_across_newline() {
        let program = parse("a = 1\nb = 2").unwrap();
        assert_eq!(program.body.len(), 2);
    }

    #[test]
    fn postfix_increment_not_applied_across_newline() {
        // ASI splits `a\n++b` into two statements: `a;` then `++b;`.
        let program = parse("a\n++b").unwrap();
        assert_eq!(program.body.len(), 2);
        assert!(matches!(program.body[0].node, Stmt::Expression(_)));
        let Stmt::Expression(expr) = &program.body[1].node else { panic!("expected expression statement") };
        assert!(matches!(expr.node, crate::ast::Expr::Update { prefix: true, .. }));
    }
}
