//! The lexer (spec.md §4.1): scans a [`Source`] into a stream of [`Token`]s.
//!
//! Structured the way `faxc-lex`'s `cursor.rs`/`lexer/*.rs` split scans by
//! token family: this module owns the cursor and dispatch, with identifier,
//! number, and string scanning broken into their own methods rather than one
//! giant match arm. Regex-vs-divide ambiguity (`/` can start a division
//! operator or a regex literal) is resolved the way every ECMA-262 lexer
//! resolves it: the parser tells the lexer which reading it expects via
//! [`Lexer::rescan_as_regex`], called only in expression-start position.

use crate::{
    ast::Span,
    compat::CompatFlags,
    exception::{CodeLoc, ExcType, Exception},
    intern::Interner,
    source::Source,
    token::{Keyword, Punct, Token, TokenKind},
};

pub struct Lexer<'a> {
    source: &'a Source,
    source_name: String,
    compat: CompatFlags,
    pos: usize,
    preceded_by_newline: bool,
}

type LexResult<T> = Result<T, Exception>;

impl<'a> Lexer<'a> {
    #[must_use]
    pub fn new(source: &'a Source, compat: CompatFlags) -> Self {
        Self { source, source_name: source.name().unwrap_or("<input>").to_owned(), compat, pos: 0, preceded_by_newline: false }
    }

    fn loc(&self) -> CodeLoc {
        self.source.loc_at(self.pos)
    }

    /// Matches [`crate::parser::Parser::error`]'s `"name:line: message"`
    /// format so a `SyntaxError` carries the same prefix regardless of
    /// whether the lexer or the parser raised it.
    fn error(&self, message: impl Into<String>) -> Exception {
        let loc = self.loc();
        Exception::new(ExcType::SyntaxError, format!("{}:{}: {}", self.source_name, loc.line, message.into()), loc)
    }

    fn peek(&self) -> Option<char> {
        self.source.at(self.pos)
    }

    fn peek_at(&self, offset: usize) -> Option<char> {
        self.source.at(self.pos + offset)
    }

    fn advance(&mut self) -> Option<char> {
        let c = self.source.at(self.pos);
        if c.is_some() {
            self.pos += 1;
        }
        c
    }

    fn eat(&mut self, c: char) -> bool {
        if self.peek() == Some(c) {
            self.pos += 1;
            true
        } else {
            false
        }
    }

    /// Skips whitespace and comments, recording whether a line terminator
    /// was crossed (ASI needs this on every token).
    fn skip_trivia(&mut self) -> LexResult<()> {
        self.preceded_by_newline = false;
        loop {
            match self.peek() {
                Some(c) if c == '\n' || c == '\u{2028}' || c == '\u{2029}' => {
                    self.preceded_by_newline = true;
                    self.pos += 1;
                }
                Some(c) if c.is_whitespace() => {
                    self.pos += 1;
                }
                Some('/') if self.peek_at(1) == Some('/') => {
                    self.pos += 2;
                    while !matches!(self.peek(), None | Some('\n') | Some('\u{2028}') | Some('\u{2029}')) {
                        self.pos += 1;
                    }
                }
                Some('/') if self.peek_at(1) == Some('*') => {
                    self.pos += 2;
                    loop {
                        match self.peek() {
                            None => return Err(self.error("unterminated block comment")),
                            Some('*') if self.peek_at(1) == Some('/') => {
                                self.pos += 2;
                                break;
                            }
                            Some('\n') => {
                                self.preceded_by_newline = true;
                                self.pos += 1;
                            }
                            Some(_) => self.pos += 1,
                        }
                    }
                }
                Some('<') if self.compat.contains(CompatFlags::SGML_COMMENTS) && self.matches_str("<!--") => {
                    self.pos += 4;
                    while !matches!(self.peek(), None | Some('\n')) {
                        self.pos += 1;
                    }
                }
                _ => break,
            }
        }
        Ok(())
    }

    fn matches_str(&self, s: &str) -> bool {
        s.chars().enumerate().all(|(i, c)| self.peek_at(i) == Some(c))
    }

    /// Scans the next token. `expect_regex` is set by the parser in
    /// expression-start position so `/` is read as a regex literal instead
    /// of the division operator (spec.md §4.1's documented ambiguity).
    pub fn next_token(&mut self, interner: &mut Interner, expect_regex: bool) -> LexResult<Token> {
        self.skip_trivia()?;
        let start = self.pos;
        let preceded_by_newline = self.preceded_by_newline;
        let Some(c) = self.peek() else {
            return Ok(Token { kind: TokenKind::Eof, span: Span::new(start as u32, start as u32), preceded_by_newline });
        };

        let kind = if c.is_ascii_digit() || (c == '.' && self.peek_at(1).is_some_and(|d| d.is_ascii_digit())) {
            self.scan_number()?
        } else if c == '"' || c == '\'' {
            self.scan_string(interner, c)?
        } else if c == '/' && expect_regex {
            self.scan_regex(interner)?
        } else if is_identifier_start(c) || c == '\\' {
            self.scan_identifier_or_keyword(interner)?
        } else {
            self.scan_punct()?
        };

        let end = self.pos;
        Ok(Token { kind, span: Span::new(start as u32, end as u32), preceded_by_newline })
    }

    fn scan_number(&mut self) -> LexResult<TokenKind> {
        let start = self.pos;
        if self.peek() == Some('0') && matches!(self.peek_at(1), Some('x') | Some('X')) {
            self.pos += 2;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                self.pos += 1;
            }
            let text = self.source.slice(digits_start, self.pos);
            let value = u64::from_str_radix(&text, 16).map_err(|_| self.error("invalid hex literal"))?;
            self.reject_trailing_identifier_start()?;
            return Ok(TokenKind::Number(value as f64));
        }
        if self.compat.contains(CompatFlags::EXT1) && self.peek() == Some('0') && self.peek_at(1).is_some_and(|c| c.is_ascii_digit()) {
            // `ext1` legacy leading-zero octal literal.
            self.pos += 1;
            let digits_start = self.pos;
            while self.peek().is_some_and(|c| ('0'..='7').contains(&c)) {
                self.pos += 1;
            }
            let text = self.source.slice(digits_start, self.pos);
            let value = u64::from_str_radix(&text, 8).unwrap_or(0);
            self.reject_trailing_identifier_start()?;
            return Ok(TokenKind::Number(value as f64));
        }
        while self.peek().is_some_and(|c| c.is_ascii_digit()) {
            self.pos += 1;
        }
        if self.peek() == Some('.') {
            self.pos += 1;
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        if matches!(self.peek(), Some('e') | Some('E')) {
            self.pos += 1;
            if matches!(self.peek(), Some('+') | Some('-')) {
                self.pos += 1;
            }
            if !self.peek().is_some_and(|c| c.is_ascii_digit()) {
                return Err(self.error("malformed exponent in numeric literal"));
            }
            while self.peek().is_some_and(|c| c.is_ascii_digit()) {
                self.pos += 1;
            }
        }
        let text = self.source.slice(start, self.pos);
        let value = text.parse::<f64>().map_err(|_| self.error("invalid numeric literal"))?;
        self.reject_trailing_identifier_start()?;
        Ok(TokenKind::Number(value))
    }

    /// A numeric literal may not be immediately followed by an
    /// identifier-start character (`3in x`, `0x1g`): ECMA-262 §7.8.3 makes
    /// this a `SyntaxError` rather than two adjacent tokens.
    fn reject_trailing_identifier_start(&self) -> LexResult<()> {
        if self.peek().is_some_and(is_identifier_start) {
            return Err(self.error("identifier starts immediately after numeric literal"));
        }
        Ok(())
    }

    fn scan_string(&mut self, interner: &mut Interner, quote: char) -> LexResult<TokenKind> {
        self.pos += 1;
        let mut content = String::new();
        loop {
            match self.advance() {
                None => return Err(self.error("unterminated string literal")),
                Some(c) if c == quote => break,
                Some('\n') => return Err(self.error("unterminated string literal")),
                Some('\\') => {
                    if let Some(escaped) = self.scan_escape()? {
                        content.push(escaped);
                    }
                }
                Some(c) => content.push(c),
            }
        }
        Ok(TokenKind::String(interner.intern(&content)))
    }

    /// Scans one escape sequence after the backslash has been consumed.
    /// Returns `None` for a LineContinuation (`\` followed by a line
    /// terminator), which contributes no character to the string's value
    /// (ECMA-262 §7.8.4).
    fn scan_escape(&mut self) -> LexResult<Option<char>> {
        match self.advance() {
            None => Err(self.error("unterminated escape sequence")),
            Some('n') => Ok(Some('\n')),
            Some('t') => Ok(Some('\t')),
            Some('r') => Ok(Some('\r')),
            Some('b') => Ok(Some('\u{8}')),
            Some('f') => Ok(Some('\u{c}')),
            Some('v') => Ok(Some('\u{b}')),
            Some('\n') | Some('\u{2028}') | Some('\u{2029}') => Ok(None),
            Some('0') if !self.peek().is_some_and(|c| c.is_ascii_digit()) => Ok(Some('\0')),
            Some('x') if self.compat.contains(CompatFlags::EXT1) => self.scan_hex_escape(2).map(Some),
            Some('u') if self.compat.contains(CompatFlags::EXT1) => self.scan_hex_escape(4).map(Some),
            Some(c @ ('x' | 'u')) => Err(self.error(format!("'\\{c}' escape requires the ext1 compatibility flag"))),
            Some(c) if self.compat.contains(CompatFlags::ECMA_262_3B) && ('0'..='7').contains(&c) => {
                let mut value = c.to_digit(8).unwrap();
                for _ in 0..2 {
                    if let Some(d) = self.peek().and_then(|c| c.to_digit(8)) {
                        value = value * 8 + d;
                        self.pos += 1;
                    } else {
                        break;
                    }
                }
                Ok(Some(char::from_u32(value).unwrap_or('\0')))
            }
            Some(c) => Ok(Some(c)),
        }
    }

    fn scan_hex_escape(&mut self, digits: usize) -> LexResult<char> {
        let start = self.pos;
        for _ in 0..digits {
            if !self.peek().is_some_and(|c| c.is_ascii_hexdigit()) {
                return Err(self.error("malformed Unicode/hex escape sequence"));
            }
            self.pos += 1;
        }
        let text = self.source.slice(start, self.pos);
        let code = u32::from_str_radix(&text, 16).map_err(|_| self.error("malformed hex escape"))?;
        char::from_u32(code).ok_or_else(|| self.error("escape sequence is not a valid scalar value"))
    }

    fn scan_identifier_or_keyword(&mut self, interner: &mut Interner) -> LexResult<TokenKind> {
        let mut text = String::new();
        loop {
            match self.peek() {
                Some('\\') if self.peek_at(1) == Some('u') => {
                    self.pos += 2;
                    text.push(self.scan_hex_escape(4)?);
                }
                Some(c) if (text.is_empty() && is_identifier_start(c)) || (!text.is_empty() && is_identifier_part(c)) => {
                    text.push(c);
                    self.pos += 1;
                }
                _ => break,
            }
        }
        if let Some(keyword) = Keyword::from_str(&text) {
            return Ok(TokenKind::Keyword(keyword));
        }
        Ok(TokenKind::Identifier(interner.intern(&text)))
    }

    fn scan_regex(&mut self, interner: &mut Interner) -> LexResult<TokenKind> {
        self.pos += 1; // opening '/'
        let pattern_start = self.pos;
        let mut in_class = false;
        loop {
            match self.peek() {
                None | Some('\n') => return Err(self.error("unterminated regular expression literal")),
                Some('\\') => self.pos += 2,
                Some('[') => {
                    in_class = true;
                    self.pos += 1;
                }
                Some(']') => {
                    in_class = false;
                    self.pos += 1;
                }
                Some('/') if !in_class => break,
                Some(_) => self.pos += 1,
            }
        }
        let pattern = self.source.slice(pattern_start, self.pos);
        self.pos += 1; // closing '/'
        let flags_start = self.pos;
        while self.peek().is_some_and(is_identifier_part) {
            self.pos += 1;
        }
        let flags = self.source.slice(flags_start, self.pos);
        Ok(TokenKind::RegExp { pattern: interner.intern(&pattern), flags: interner.intern(&flags) })
    }

    fn scan_punct(&mut self) -> LexResult<TokenKind> {
        let c = self.advance().expect("checked by caller");
        let p = match c {
            '{' => Punct::LBrace,
            '}' => Punct::RBrace,
            '(' => Punct::LParen,
            ')' => Punct::RParen,
            '[' => Punct::LBracket,
            ']' => Punct::RBracket,
            '.' => Punct::Dot,
            ';' => Punct::Semi,
            ',' => Punct::Comma,
            '~' => Punct::Tilde,
            '?' => Punct::Question,
            ':' => Punct::Colon,
            '<' => {
                if self.eat('<') {
                    if self.eat('=') { Punct::ShiftLeftAssign } else { Punct::ShiftLeft }
                } else if self.eat('=') {
                    Punct::LtEq
                } else {
                    Punct::Lt
                }
            }
            '>' => {
                if self.eat('>') {
                    if self.eat('>') {
                        if self.eat('=') { Punct::ShiftRightUnsignedAssign } else { Punct::ShiftRightUnsigned }
                    } else if self.eat('=') {
                        Punct::ShiftRightAssign
                    } else {
                        Punct::ShiftRight
                    }
                } else if self.eat('=') {
                    Punct::GtEq
                } else {
                    Punct::Gt
                }
            }
            '=' => {
                if self.eat('=') {
                    if self.eat('=') { Punct::StrictEq } else { Punct::Eq }
                } else {
                    Punct::Assign
                }
            }
            '!' => {
                if self.eat('=') {
                    if self.eat('=') { Punct::StrictNotEq } else { Punct::NotEq }
                } else {
                    Punct::Not
                }
            }
            '+' => {
                if self.eat('+') {
                    Punct::PlusPlus
                } else if self.eat('=') {
                    Punct::PlusAssign
                } else {
                    Punct::Plus
                }
            }
            '-' => {
                if self.eat('-') {
                    Punct::MinusMinus
                } else if self.eat('=') {
                    Punct::MinusAssign
                } else {
                    Punct::Minus
                }
            }
            '*' => {
                if self.eat('=') { Punct::StarAssign } else { Punct::Star }
            }
            '%' => {
                if self.eat('=') { Punct::PercentAssign } else { Punct::Percent }
            }
            '/' => {
                if self.eat('=') { Punct::SlashAssign } else { Punct::Slash }
            }
            '&' => {
                if self.eat('&') {
                    Punct::AmpAmp
                } else if self.eat('=') {
                    Punct::AmpAssign
                } else {
                    Punct::Amp
                }
            }
            '|' => {
                if self.eat('|') {
                    Punct::PipePipe
                } else if self.eat('=') {
                    Punct::PipeAssign
                } else {
                    Punct::Pipe
                }
            }
            '^' => {
                if self.eat('=') { Punct::CaretAssign } else { Punct::Caret }
            }
            other => return Err(self.error(format!("unexpected character {other:?}"))),
        };
        Ok(TokenKind::Punct(p))
    }

    /// Rewinds the cursor to `span.start` and rescans as a regex literal.
    /// Called by the parser when it discovers, after the fact, that a `/`
    /// it lexed as division actually starts a regex literal (spec.md §4.1).
    pub fn rescan_as_regex(&mut self, span: Span, interner: &mut Interner) -> LexResult<Token> {
        self.pos = span.start as usize;
        self.next_token(interner, true)
    }
}

#[must_use]
fn is_identifier_start(c: char) -> bool {
    c == '$' || c == '_' || c.is_ascii_alphabetic()
}

#[must_use]
fn is_identifier_part(c: char) -> bool {
    is_identifier_start(c) || c.is_ascii_digit()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(src: &str) -> Vec<TokenKind> {
        let source = Source::from_str(None, src);
        let mut lexer = Lexer::new(&source, CompatFlags::default());
        let mut interner = Interner::new();
        let mut out = Vec::new();
        loop {
            let tok = lexer.next_token(&mut interner, false).unwrap();
            let done = tok.kind == TokenKind::Eof;
            out.push(tok.kind);
            if done {
                break;
            }
        }
        out
    }

    #[test]
    fn scans_number_and_punct() {
        let toks = tokens("1 + 2");
        assert_eq!(toks, vec![
            TokenKind::Number(1.0),
            TokenKind::Punct(Punct::Plus),
            TokenKind::Number(2.0),
            TokenKind::Eof,
        ]);
    }

    #[test]
    fn scans_string_with_escapes() {
        let source = Source::from_str(None, r#""a\nb""#);
        let mut lexer = Lexer::new(&source, CompatFlags::default());
        let mut interner = Interner::new();
        let tok = lexer.next_token(&mut interner, false).unwrap();
        match tok.kind {
            TokenKind::String(id) => assert_eq!(interner.resolve(id), "a\nb"),
            other => panic!("expected string, got {other:?}"),
        }
    }

    #[test]
    fn distinguishes_keywords_from_identifiers() {
        assert_eq!(tokens("var x")[0], TokenKind::Keyword(Keyword::Var));
        assert!(matches!(tokens("varx")[0], TokenKind::Identifier(_)));
    }

    #[test]
    fn tracks_newline_before_token_for_asi() {
        let source = Source::from_str(None, "a\nb");
        let mut lexer = Lexer::new(&source, CompatFlags::default());
        let mut interner = Interner::new();
        let first = lexer.next_token(&mut interner, false).unwrap();
        let second = lexer.next_token(&mut interner, false).unwrap();
        assert!(!first.preceded_by_newline);
        assert!(second.preceded_by_newline);
    }

    #[test]
    fn hex_literal_parses() {
        assert_eq!(tokens("0xFF")[0], TokenKind::Number(255.0));
    }
}
