//! Token kinds the lexer produces (spec.md §4.1).

use crate::{ast::Span, intern::StringId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Keyword {
    Break,
    Case,
    Catch,
    Continue,
    Default,
    Delete,
    Do,
    Else,
    Finally,
    For,
    Function,
    If,
    In,
    InstanceOf,
    New,
    Return,
    Switch,
    This,
    Throw,
    Try,
    TypeOf,
    Var,
    Void,
    While,
    With,
    Null,
    True,
    False,
}

impl Keyword {
    #[must_use]
    pub fn from_str(s: &str) -> Option<Self> {
        Some(match s {
            "break" => Self::Break,
            "case" => Self::Case,
            "catch" => Self::Catch,
            "continue" => Self::Continue,
            "default" => Self::Default,
            "delete" => Self::Delete,
            "do" => Self::Do,
            "else" => Self::Else,
            "finally" => Self::Finally,
            "for" => Self::For,
            "function" => Self::Function,
            "if" => Self::If,
            "in" => Self::In,
            "instanceof" => Self::InstanceOf,
            "new" => Self::New,
            "return" => Self::Return,
            "switch" => Self::Switch,
            "this" => Self::This,
            "throw" => Self::Throw,
            "try" => Self::Try,
            "typeof" => Self::TypeOf,
            "var" => Self::Var,
            "void" => Self::Void,
            "while" => Self::While,
            "with" => Self::With,
            "null" => Self::Null,
            "true" => Self::True,
            "false" => Self::False,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Punct {
    LBrace,
    RBrace,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Dot,
    Semi,
    Comma,
    Lt,
    Gt,
    LtEq,
    GtEq,
    Eq,
    NotEq,
    StrictEq,
    StrictNotEq,
    Plus,
    Minus,
    Star,
    Percent,
    Slash,
    PlusPlus,
    MinusMinus,
    ShiftLeft,
    ShiftRight,
    ShiftRightUnsigned,
    Amp,
    Pipe,
    Caret,
    Not,
    Tilde,
    AmpAmp,
    PipePipe,
    Question,
    Colon,
    Assign,
    PlusAssign,
    MinusAssign,
    StarAssign,
    PercentAssign,
    SlashAssign,
    ShiftLeftAssign,
    ShiftRightAssign,
    ShiftRightUnsignedAssign,
    AmpAssign,
    PipeAssign,
    CaretAssign,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum TokenKind {
    Identifier(StringId),
    Keyword(Keyword),
    Number(f64),
    String(StringId),
    RegExp { pattern: StringId, flags: StringId },
    Punct(Punct),
    /// Emitted by Automatic Semicolon Insertion (spec.md §4.3) rather than
    /// scanned directly from source text.
    InsertedSemicolon,
    Eof,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub span: Span,
    /// Whether a line terminator appeared between this token and the
    /// previous one — ASI's trigger condition (ECMA-262 §7.9.1).
    pub preceded_by_newline: bool,
}
