//! Recursive-descent parser emitting a post-order token stream.
//!
//! Every production appends its own marker only after the productions it depends on have
//! appended theirs, so the output is the Reverse Polish linearisation of the parse tree
//! without building the tree or keeping an operator stack.

use crate::error::{CompileError, ParseError, ParseErrorKind, Span};
use crate::grammar::{tokenize, Lexed, Lexeme};
use crate::token::{BinaryOp, Comparison, Component, Constant, RotateOrder, Token, TokenStream};

/// Output of [`parse`]: the expression itself plus the optional `destination =` prefix.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParsedExpression {
    pub expression: TokenStream,
    /// Either empty or exactly `[Identifier(destination), Assign]`.
    pub assignment: TokenStream,
}

impl ParsedExpression {
    /// Expression stream followed by the assignment stream. Evaluation pops from the
    /// tail, so an assignment is resolved first and pulls its source from the expression.
    pub fn into_stream(self) -> TokenStream {
        let mut stream = self.expression;
        stream.append(self.assignment);
        stream
    }
}

/// Parse `input`, rejecting nesting deeper than `max_depth`.
pub fn parse(input: &str, max_depth: usize) -> Result<ParsedExpression, CompileError> {
    let lexed = tokenize(input)?;
    let mut parser = Parser {
        lexed,
        pos: 0,
        end: input.len(),
        depth: 0,
        max_depth,
        out: TokenStream::new(),
    };

    let mut assignment = TokenStream::new();
    if let [Lexed {
        lexeme: Lexeme::Ident(destination),
        ..
    }, Lexed {
        lexeme: Lexeme::Assign,
        ..
    }, ..] = parser.lexed.as_slice()
    {
        assignment.push(Token::Identifier(destination.clone()));
        assignment.push(Token::Assign);
        parser.pos = 2;
    }

    parser.expression()?;
    if let Some(extra) = parser.lexed.get(parser.pos) {
        return Err(ParseError::unexpected(
            &extra.lexeme.to_string(),
            "after the end of the expression",
            extra.span,
        )
        .into());
    }

    Ok(ParsedExpression {
        expression: parser.out,
        assignment,
    })
}

struct Parser {
    lexed: Vec<Lexed>,
    pos: usize,
    end: usize,
    depth: usize,
    max_depth: usize,
    out: TokenStream,
}

impl Parser {
    fn peek(&self) -> Option<&Lexeme> {
        self.lexed.get(self.pos).map(|l| &l.lexeme)
    }

    fn advance(&mut self) -> Option<Lexed> {
        let lexed = self.lexed.get(self.pos).cloned();
        if lexed.is_some() {
            self.pos += 1;
        }
        lexed
    }

    fn current_span(&self) -> Span {
        self.lexed
            .get(self.pos)
            .map(|l| l.span)
            .unwrap_or(Span::new(self.end, self.end))
    }

    fn expect(&mut self, expected: Lexeme, context: &str) -> Result<(), CompileError> {
        match self.advance() {
            Some(lexed) if lexed.lexeme == expected => Ok(()),
            Some(lexed) => Err(ParseError::unexpected(
                &lexed.lexeme.to_string(),
                &format!("{context}, expected {expected}"),
                lexed.span,
            )
            .into()),
            None => Err(ParseError::eof(&format!("{context}, expected {expected}"), self.end).into()),
        }
    }

    fn enter(&mut self) -> Result<(), CompileError> {
        self.depth += 1;
        if self.depth > self.max_depth {
            return Err(CompileError::TooDeep {
                limit: self.max_depth,
            });
        }
        Ok(())
    }

    fn leave(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// `comparison ( '?' expression ':' expression )?`
    fn expression(&mut self) -> Result<(), CompileError> {
        self.enter()?;
        let condition_span = self.current_span();
        let is_comparison = self.comparison()?;

        if matches!(self.peek(), Some(Lexeme::Question)) {
            if !is_comparison {
                return Err(ParseError::new(
                    ParseErrorKind::InvalidSyntax,
                    condition_span,
                    "ternary condition must be a comparison",
                )
                .into());
            }
            self.advance();
            self.expression()?;
            self.expect(Lexeme::Colon, "in ternary")?;
            self.expression()?;
            self.out.push(Token::Ternary);
        } else if is_comparison {
            // A bare comparison reads as `a op b ? TRUE : FALSE`.
            self.out.push(Token::Constant(Constant::True));
            self.out.push(Token::Constant(Constant::False));
            self.out.push(Token::Ternary);
        }

        self.leave();
        Ok(())
    }

    /// Returns whether a comparison marker was emitted. Comparisons do not chain.
    fn comparison(&mut self) -> Result<bool, CompileError> {
        self.logical()?;
        let op = match self.peek() {
            Some(Lexeme::EqEq) => Comparison::Equal,
            Some(Lexeme::NotEq) => Comparison::NotEqual,
            Some(Lexeme::Greater) => Comparison::Greater,
            Some(Lexeme::GreaterEq) => Comparison::GreaterEqual,
            Some(Lexeme::Less) => Comparison::Less,
            Some(Lexeme::LessEq) => Comparison::LessEqual,
            _ => return Ok(false),
        };
        self.advance();
        self.logical()?;
        self.out.push(Token::Comparison(op));
        Ok(true)
    }

    fn logical(&mut self) -> Result<(), CompileError> {
        self.additive()?;
        loop {
            let op = match self.peek() {
                Some(Lexeme::Pipe) => BinaryOp::Or,
                Some(Lexeme::Amp) => BinaryOp::And,
                _ => return Ok(()),
            };
            self.advance();
            self.additive()?;
            self.out.push(Token::Binary(op));
        }
    }

    fn additive(&mut self) -> Result<(), CompileError> {
        self.multiplicative()?;
        loop {
            let op = match self.peek() {
                Some(Lexeme::Plus) => BinaryOp::Add,
                Some(Lexeme::Minus) => BinaryOp::Subtract,
                _ => return Ok(()),
            };
            self.advance();
            self.multiplicative()?;
            self.out.push(Token::Binary(op));
        }
    }

    fn multiplicative(&mut self) -> Result<(), CompileError> {
        self.exponent()?;
        loop {
            let op = match self.peek() {
                Some(Lexeme::Star) => BinaryOp::Multiply,
                Some(Lexeme::Slash) => BinaryOp::Divide,
                Some(Lexeme::Percent) => BinaryOp::Modulo,
                _ => return Ok(()),
            };
            self.advance();
            self.exponent()?;
            self.out.push(Token::Binary(op));
        }
    }

    /// Right-associative: the right operand recurses into `exponent` itself.
    fn exponent(&mut self) -> Result<(), CompileError> {
        self.unary()?;
        if matches!(self.peek(), Some(Lexeme::Caret)) {
            self.advance();
            self.enter()?;
            self.exponent()?;
            self.leave();
            self.out.push(Token::Binary(BinaryOp::Power));
        }
        Ok(())
    }

    /// Prefix markers are appended after the atom and its component accesses,
    /// innermost first.
    fn unary(&mut self) -> Result<(), CompileError> {
        let mut prefixes = Vec::new();
        loop {
            match self.peek() {
                Some(Lexeme::Minus) => prefixes.push(Token::Negate),
                Some(Lexeme::Bang) => prefixes.push(Token::Not),
                _ => break,
            }
            self.advance();
        }
        if prefixes.len() > self.max_depth {
            return Err(CompileError::TooDeep {
                limit: self.max_depth,
            });
        }

        self.atom()?;
        while matches!(self.peek(), Some(Lexeme::Dot)) {
            self.advance();
            match self.advance() {
                Some(Lexed {
                    lexeme: Lexeme::Ident(name),
                    ..
                }) => self.out.push(Token::Component(Component::parse(&name))),
                Some(other) => {
                    return Err(ParseError::unexpected(
                        &other.lexeme.to_string(),
                        "after '.', expected a component name",
                        other.span,
                    )
                    .into())
                }
                None => return Err(ParseError::eof("after '.'", self.end).into()),
            }
        }

        for marker in prefixes.into_iter().rev() {
            self.out.push(marker);
        }
        Ok(())
    }

    fn atom(&mut self) -> Result<(), CompileError> {
        let Some(lexed) = self.advance() else {
            return Err(ParseError::eof("while expecting an operand", self.end).into());
        };

        match lexed.lexeme {
            Lexeme::Number(text) => self.out.push(Token::Number(text)),
            Lexeme::Ident(name) if matches!(self.peek(), Some(Lexeme::LParen)) => {
                self.advance();
                let arity = self.arguments(Lexeme::RParen, "in call arguments")?;
                self.out.push(Token::Call { name, arity });
            }
            Lexeme::Ident(name) => {
                let token = if let Some(constant) = Constant::from_keyword(&name) {
                    Token::Constant(constant)
                } else if let Some(order) = RotateOrder::from_keyword(&name) {
                    Token::RotateOrder(order)
                } else {
                    Token::Identifier(name)
                };
                self.out.push(token);
            }
            Lexeme::LBracket => {
                let arity = self.arguments(Lexeme::RBracket, "in list literal")?;
                self.out.push(Token::List { arity });
            }
            Lexeme::LParen => {
                self.expression()?;
                self.expect(Lexeme::RParen, "in parenthesised group")?;
            }
            other => {
                return Err(
                    ParseError::unexpected(&other.to_string(), "where an operand was expected", lexed.span)
                        .into(),
                )
            }
        }
        Ok(())
    }

    /// Comma-separated expressions up to `close`; returns how many were parsed.
    fn arguments(&mut self, close: Lexeme, context: &str) -> Result<usize, CompileError> {
        if self.peek() == Some(&close) {
            self.advance();
            return Ok(0);
        }
        let mut count = 0;
        loop {
            self.expression()?;
            count += 1;
            match self.advance() {
                Some(Lexed {
                    lexeme: Lexeme::Comma,
                    ..
                }) => {
                    if self.peek() == Some(&close) {
                        let span = self.current_span();
                        return Err(ParseError::unexpected(&close.to_string(), "after ','", span).into());
                    }
                }
                Some(lexed) if lexed.lexeme == close => return Ok(count),
                Some(lexed) => {
                    return Err(ParseError::unexpected(
                        &lexed.lexeme.to_string(),
                        &format!("{context}, expected ',' or {close}"),
                        lexed.span,
                    )
                    .into())
                }
                None => {
                    return Err(ParseError::eof(&format!("{context}, expected {close}"), self.end).into())
                }
            }
        }
    }
}
