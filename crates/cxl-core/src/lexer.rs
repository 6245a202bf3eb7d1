//! Lexer for the cxl language.
//!
//! Pulls characters from a [`Source`] only as far as the current token needs,
//! so an interactive session never waits for input past the end of a unit.
//! Number literals are converted to values while they are scanned.

use std::fmt;

use thiserror::Error;

use crate::ast::Builtin;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::source::{Source, END_OF_TEXT};
use crate::span::Position;
use crate::value::{Complex, ZERO};

/// Token kinds for the cxl language.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    OpenParenthesis,
    CloseParenthesis,
    OpenBrace,
    CloseBrace,
    /// `=`
    Assignment,
    /// `+` or `-`
    AdditiveOperator,
    /// `*`, `/` or `%`
    MultiplicativeOperator,
    /// `^`
    PowerOperator,
    /// `<`, `<=`, `>`, `>=`, `==` or `!=`
    RelationalOperator,
    /// `&&`
    LogicalAnd,
    /// `||`
    LogicalOr,
    /// `!`
    Negation,

    // Keywords
    ForKeyword,
    IfKeyword,
    ElseKeyword,
    ReturnKeyword,
    FunKeyword,
    BreakKeyword,
    ContinueKeyword,

    Number,
    Identifier,
    BuiltInFunction,
    Comma,
    Semicolon,
    /// Statement separator; line breaks are significant
    LineBreak,
    /// End of input: the end of the text or the word `exit`
    EndOfInput,
    /// Placeholder returned after a lexical fault
    Empty,
}

impl TokenKind {
    pub fn name(&self) -> &'static str {
        match self {
            TokenKind::OpenParenthesis => "OPEN_PARENTHESIS",
            TokenKind::CloseParenthesis => "CLOSE_PARENTHESIS",
            TokenKind::OpenBrace => "OPEN_BRACE",
            TokenKind::CloseBrace => "CLOSE_BRACE",
            TokenKind::Assignment => "ASSIGNMENT",
            TokenKind::AdditiveOperator => "ADDITIVE_OPERATOR",
            TokenKind::MultiplicativeOperator => "MULTIPLICATIVE_OPERATOR",
            TokenKind::PowerOperator => "POWER_OPERATOR",
            TokenKind::RelationalOperator => "RELATIONAL_OPERATOR",
            TokenKind::LogicalAnd => "LOGICAL_AND",
            TokenKind::LogicalOr => "LOGICAL_OR",
            TokenKind::Negation => "NEGATION",
            TokenKind::ForKeyword => "FOR_KEYWORD",
            TokenKind::IfKeyword => "IF_KEYWORD",
            TokenKind::ElseKeyword => "ELSE_KEYWORD",
            TokenKind::ReturnKeyword => "RETURN_KEYWORD",
            TokenKind::FunKeyword => "FUN_KEYWORD",
            TokenKind::BreakKeyword => "BREAK_KEYWORD",
            TokenKind::ContinueKeyword => "CONTINUE_KEYWORD",
            TokenKind::Number => "NUMBER",
            TokenKind::Identifier => "IDENTIFIER",
            TokenKind::BuiltInFunction => "BUILT_IN_FUNCTION",
            TokenKind::Comma => "COMMA",
            TokenKind::Semicolon => "SEMICOLON",
            TokenKind::LineBreak => "LINE_BREAK",
            TokenKind::EndOfInput => "EOT",
            TokenKind::Empty => "EMPTY",
        }
    }
}

impl fmt::Display for TokenKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

const KEYWORDS: [(&str, TokenKind); 7] = [
    ("for", TokenKind::ForKeyword),
    ("if", TokenKind::IfKeyword),
    ("else", TokenKind::ElseKeyword),
    ("return", TokenKind::ReturnKeyword),
    ("fun", TokenKind::FunKeyword),
    ("break", TokenKind::BreakKeyword),
    ("continue", TokenKind::ContinueKeyword),
];

/// Words that end the input like the end of the text does.
const END_MARKERS: [&str; 1] = ["exit"];

/// Fraction digits beyond this are not rounded.
const MAX_ROUNDED_DIGITS: i32 = 16;

/// A token with its kind, text, and position.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub text: String,
    pub position: Position,
    /// Value of a number literal
    pub value: Option<Complex>,
}

impl Token {
    pub fn new(kind: TokenKind, text: impl Into<String>, position: Position) -> Self {
        Self {
            kind,
            text: text.into(),
            position,
            value: None,
        }
    }

    pub fn number(text: impl Into<String>, position: Position, value: Complex) -> Self {
        Self {
            value: Some(value),
            ..Self::new(TokenKind::Number, text, position)
        }
    }
}

/// Problems found while scanning characters. None of them stops the lexer.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LexFault {
    #[error("invalid character: {0}")]
    InvalidCharacter(char),
    #[error("malformed fraction in literal {0}")]
    MalformedFraction(String),
    #[error("unmatched operator {0}")]
    UnmatchedOperator(char),
    #[error("number literal out of range")]
    LiteralOutOfRange,
}

/// Lexer for the cxl language.
pub struct Lexer<S> {
    source: S,
    diagnostics: Diagnostics,
}

impl<S: Source> Lexer<S> {
    pub fn new(source: S) -> Self {
        Self {
            source,
            diagnostics: Diagnostics::new(),
        }
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Lexical faults reported since the last call.
    pub fn take_diagnostics(&mut self) -> Diagnostics {
        std::mem::take(&mut self.diagnostics)
    }

    /// Get the next token.
    pub fn next_token(&mut self) -> Token {
        let mut ch = self.source.current_char();
        while ch == ' ' || ch == '\t' {
            ch = self.source.advance_and_read();
        }

        let position = self.source.position();
        match ch {
            END_OF_TEXT => Token::new(TokenKind::EndOfInput, "", position),
            '\n' | '\r' => self.single(TokenKind::LineBreak, "\n", position),
            '0'..='9' => self.number(ch, position),
            'a'..='z' | 'A'..='Z' => self.word(position),
            '=' => self.pair(ch, '=', TokenKind::RelationalOperator, Some(TokenKind::Assignment), position),
            '!' => self.pair(ch, '=', TokenKind::RelationalOperator, Some(TokenKind::Negation), position),
            '<' | '>' => self.pair(
                ch,
                '=',
                TokenKind::RelationalOperator,
                Some(TokenKind::RelationalOperator),
                position,
            ),
            '&' => self.pair(ch, '&', TokenKind::LogicalAnd, None, position),
            '|' => self.pair(ch, '|', TokenKind::LogicalOr, None, position),
            '+' | '-' => self.single(TokenKind::AdditiveOperator, ch, position),
            '*' | '/' | '%' => self.single(TokenKind::MultiplicativeOperator, ch, position),
            '^' => self.single(TokenKind::PowerOperator, ch, position),
            '(' => self.single(TokenKind::OpenParenthesis, ch, position),
            ')' => self.single(TokenKind::CloseParenthesis, ch, position),
            '{' => self.single(TokenKind::OpenBrace, ch, position),
            '}' => self.single(TokenKind::CloseBrace, ch, position),
            ',' => self.single(TokenKind::Comma, ch, position),
            ';' => self.single(TokenKind::Semicolon, ch, position),
            _ => {
                self.source.request_advance();
                self.fault(LexFault::InvalidCharacter(ch), ch, position)
            }
        }
    }

    /// Tokenize up to and including the end of input.
    pub fn tokenize(&mut self) -> Vec<Token> {
        let mut tokens = Vec::new();
        loop {
            let token = self.next_token();
            let is_end = token.kind == TokenKind::EndOfInput;
            tokens.push(token);
            if is_end {
                break;
            }
        }
        tokens
    }

    fn single(&mut self, kind: TokenKind, text: impl Into<String>, position: Position) -> Token {
        self.source.request_advance();
        Token::new(kind, text.into(), position)
    }

    /// Two-character operator `first second`, falling back to `single` when
    /// the second character does not follow.
    fn pair(
        &mut self,
        first: char,
        second: char,
        paired: TokenKind,
        single: Option<TokenKind>,
        position: Position,
    ) -> Token {
        if self.source.advance_and_read() == second {
            self.source.request_advance();
            return Token::new(paired, format!("{first}{second}"), position);
        }
        match single {
            Some(kind) => Token::new(kind, first, position),
            None => self.fault(LexFault::UnmatchedOperator(first), first, position),
        }
    }

    fn word(&mut self, position: Position) -> Token {
        let mut text = String::new();
        let mut ch = self.source.current_char();
        while ch.is_ascii_alphanumeric() {
            text.push(ch);
            ch = self.source.advance_and_read();
        }

        let kind = if let Some((_, kind)) = KEYWORDS.iter().find(|(word, _)| *word == text) {
            *kind
        } else if Builtin::from_name(&text).is_some() {
            TokenKind::BuiltInFunction
        } else if END_MARKERS.contains(&text.as_str()) {
            TokenKind::EndOfInput
        } else {
            TokenKind::Identifier
        };
        Token::new(kind, text, position)
    }

    /// Scan a number literal starting with the digit `first`.
    ///
    /// A leading `0` selects the base from the next character: `x` for 16,
    /// `b` for 2, an octal digit for 8, `.` for a decimal fraction. A trailing
    /// `i` makes the literal imaginary.
    fn number(&mut self, first: char, position: Position) -> Token {
        let mut text = String::from(first);
        let mut value = f64::from(first.to_digit(10).unwrap_or(0));
        let mut ch = self.source.advance_and_read();

        let base = if first == '0' {
            match ch {
                'x' | 'b' => {
                    text.push(ch);
                    let base = if ch == 'x' { 16 } else { 2 };
                    ch = self.source.advance_and_read();
                    base
                }
                '0'..='7' => 8,
                '.' | 'i' => 10,
                _ => return Token::number(text, position, ZERO),
            }
        } else {
            10
        };
        let radix = f64::from(base);

        while let Some(digit) = ch.to_digit(base) {
            value = value * radix + f64::from(digit);
            text.push(ch);
            ch = self.source.advance_and_read();
        }

        if ch == '.' {
            text.push('.');
            ch = self.source.advance_and_read();
            if ch.to_digit(base).is_none() {
                return self.fault(LexFault::MalformedFraction(text.clone()), text, position);
            }
            let mut divider = radix;
            let mut digits = 0;
            while let Some(digit) = ch.to_digit(base) {
                value += f64::from(digit) / divider;
                divider *= radix;
                digits += 1;
                text.push(ch);
                ch = self.source.advance_and_read();
            }
            value = round_half_up(value, digits);
        }

        let number = if ch == 'i' {
            text.push('i');
            self.source.request_advance();
            Complex::imaginary(value)
        } else {
            Complex::real(value)
        };
        match number {
            Ok(number) => Token::number(text, position, number),
            Err(_) => self.fault(LexFault::LiteralOutOfRange, text, position),
        }
    }

    /// Record a fault and hand back a placeholder token.
    fn fault(&mut self, fault: LexFault, text: impl Into<String>, position: Position) -> Token {
        let token = Token::new(TokenKind::Empty, text.into(), position);
        self.diagnostics.push(Diagnostic::lexical(&token, fault));
        token
    }
}

/// Round half-up to `digits` decimal places.
fn round_half_up(value: f64, digits: i32) -> f64 {
    if digits == 0 || digits >= MAX_ROUNDED_DIGITS {
        return value;
    }
    let scale = 10f64.powi(digits);
    let rounded = (value * scale + 0.5).floor() / scale;
    if rounded.is_finite() {
        rounded
    } else {
        value
    }
}
