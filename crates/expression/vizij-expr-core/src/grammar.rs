//! Lexical rules of the expression language.
//!
//! ```text
//! input          := IDENT '=' expression | expression
//! expression     := comparison ( '?' expression ':' expression )?
//! comparison     := logical ( ('==' | '!=' | '>' | '>=' | '<' | '<=') logical )?
//! logical        := additive ( ('|' | '&') additive )*
//! additive       := multiplicative ( ('+' | '-') multiplicative )*
//! multiplicative := exponent ( ('*' | '/' | '%') exponent )*
//! exponent       := unary ( '^' exponent )?
//! unary          := ('-' | '!')* atom ( '.' IDENT )*
//! atom           := NUMBER | KEYWORD | IDENT | IDENT '(' args ')' | '[' args ']' | '(' expression ')'
//! ```
//!
//! Exponentiation is right-associative; every other binary level is left-associative.
//! Assignment is only recognised as the very first two tokens, and `==` always lexes as
//! a comparison so `a == b` never reads as an assignment.

use std::fmt;

use crate::error::{ParseError, Span};

/// Raw lexical unit, before any grammar is applied.
#[derive(Debug, Clone, PartialEq)]
pub enum Lexeme {
    Number(String),
    Ident(String),
    Plus,
    Minus,
    Star,
    Slash,
    Caret,
    Percent,
    Pipe,
    Amp,
    Bang,
    EqEq,
    NotEq,
    Greater,
    GreaterEq,
    Less,
    LessEq,
    Question,
    Colon,
    Assign,
    LParen,
    RParen,
    LBracket,
    RBracket,
    Comma,
    Dot,
}

impl fmt::Display for Lexeme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            Lexeme::Number(text) => return write!(f, "number '{text}'"),
            Lexeme::Ident(name) => return write!(f, "identifier '{name}'"),
            Lexeme::Plus => "+",
            Lexeme::Minus => "-",
            Lexeme::Star => "*",
            Lexeme::Slash => "/",
            Lexeme::Caret => "^",
            Lexeme::Percent => "%",
            Lexeme::Pipe => "|",
            Lexeme::Amp => "&",
            Lexeme::Bang => "!",
            Lexeme::EqEq => "==",
            Lexeme::NotEq => "!=",
            Lexeme::Greater => ">",
            Lexeme::GreaterEq => ">=",
            Lexeme::Less => "<",
            Lexeme::LessEq => "<=",
            Lexeme::Question => "?",
            Lexeme::Colon => ":",
            Lexeme::Assign => "=",
            Lexeme::LParen => "(",
            Lexeme::RParen => ")",
            Lexeme::LBracket => "[",
            Lexeme::RBracket => "]",
            Lexeme::Comma => ",",
            Lexeme::Dot => ".",
        };
        write!(f, "'{text}'")
    }
}

/// A lexeme with its location in the source string.
#[derive(Debug, Clone, PartialEq)]
pub struct Lexed {
    pub lexeme: Lexeme,
    pub span: Span,
}

fn is_ident_start(b: u8) -> bool {
    b.is_ascii_alphabetic()
}

fn is_ident_continue(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_' || b == b'$'
}

/// Split `input` into lexemes. Numbers are unsigned; a leading sign is a unary operator.
pub fn tokenize(input: &str) -> Result<Vec<Lexed>, ParseError> {
    let bytes = input.as_bytes();
    let mut out = Vec::new();
    let mut i = 0usize;

    while i < bytes.len() {
        let b = bytes[i];
        if b.is_ascii_whitespace() {
            i += 1;
            continue;
        }

        let start = i;

        if b.is_ascii_digit() || (b == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit)) {
            i = scan_number(bytes, i);
            out.push(Lexed {
                lexeme: Lexeme::Number(input[start..i].to_string()),
                span: Span::new(start, i),
            });
            continue;
        }

        if is_ident_start(b) {
            while i < bytes.len() && is_ident_continue(bytes[i]) {
                i += 1;
            }
            out.push(Lexed {
                lexeme: Lexeme::Ident(input[start..i].to_string()),
                span: Span::new(start, i),
            });
            continue;
        }

        let next = bytes.get(i + 1).copied();
        let (lexeme, width) = match (b, next) {
            (b'=', Some(b'=')) => (Lexeme::EqEq, 2),
            (b'!', Some(b'=')) => (Lexeme::NotEq, 2),
            (b'>', Some(b'=')) => (Lexeme::GreaterEq, 2),
            (b'<', Some(b'=')) => (Lexeme::LessEq, 2),
            (b'+', _) => (Lexeme::Plus, 1),
            (b'-', _) => (Lexeme::Minus, 1),
            (b'*', _) => (Lexeme::Star, 1),
            (b'/', _) => (Lexeme::Slash, 1),
            (b'^', _) => (Lexeme::Caret, 1),
            (b'%', _) => (Lexeme::Percent, 1),
            (b'|', _) => (Lexeme::Pipe, 1),
            (b'&', _) => (Lexeme::Amp, 1),
            (b'!', _) => (Lexeme::Bang, 1),
            (b'>', _) => (Lexeme::Greater, 1),
            (b'<', _) => (Lexeme::Less, 1),
            (b'?', _) => (Lexeme::Question, 1),
            (b':', _) => (Lexeme::Colon, 1),
            (b'=', _) => (Lexeme::Assign, 1),
            (b'(', _) => (Lexeme::LParen, 1),
            (b')', _) => (Lexeme::RParen, 1),
            (b'[', _) => (Lexeme::LBracket, 1),
            (b']', _) => (Lexeme::RBracket, 1),
            (b',', _) => (Lexeme::Comma, 1),
            (b'.', _) => (Lexeme::Dot, 1),
            _ => {
                let ch = input[start..].chars().next().unwrap_or('\u{fffd}');
                return Err(ParseError::invalid_character(ch, start));
            }
        };
        i += width;
        out.push(Lexed {
            lexeme,
            span: Span::new(start, i),
        });
    }

    Ok(out)
}

/// Consume `digits [. digits] [(e|E) [+|-] digits]` and return the end offset.
fn scan_number(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() && bytes[i].is_ascii_digit() {
        i += 1;
    }
    if i < bytes.len() && bytes[i] == b'.' && bytes.get(i + 1).is_some_and(u8::is_ascii_digit) {
        i += 1;
        while i < bytes.len() && bytes[i].is_ascii_digit() {
            i += 1;
        }
    }
    if i < bytes.len() && (bytes[i] == b'e' || bytes[i] == b'E') {
        let mut j = i + 1;
        if j < bytes.len() && (bytes[j] == b'+' || bytes[j] == b'-') {
            j += 1;
        }
        // `2E` without digits leaves the `E` for the constant keyword.
        if bytes.get(j).is_some_and(u8::is_ascii_digit) {
            i = j;
            while i < bytes.len() && bytes[i].is_ascii_digit() {
                i += 1;
            }
        }
    }
    i
}
