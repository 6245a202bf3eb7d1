//! Diagnostic types for error reporting.
//!
//! Lexical and syntax problems are collected per unit and rendered against
//! the unit's own text: the offending line, a caret under the column, then
//! the position and message.

use std::fmt;

use crate::lexer::{LexFault, Token, TokenKind};

/// What went wrong at a token.
#[derive(Debug, Clone, PartialEq)]
pub enum DiagnosticKind {
    /// Another token kind was required here
    Expected(TokenKind),
    /// The token cannot start or continue anything here
    UnexpectedToken,
    /// The lexer could not make a token from the text
    Lexical(LexFault),
    /// Blocks or expressions nested deeper than the parser allows
    NestingTooDeep,
}

/// A diagnostic message anchored at a token.
#[derive(Debug, Clone, PartialEq)]
pub struct Diagnostic {
    pub token: Token,
    pub kind: DiagnosticKind,
}

impl Diagnostic {
    pub fn expected(token: &Token, kind: TokenKind) -> Self {
        Self::new(token, DiagnosticKind::Expected(kind))
    }

    pub fn unexpected(token: &Token) -> Self {
        Self::new(token, DiagnosticKind::UnexpectedToken)
    }

    pub fn lexical(token: &Token, fault: LexFault) -> Self {
        Self::new(token, DiagnosticKind::Lexical(fault))
    }

    pub fn nesting_too_deep(token: &Token) -> Self {
        Self::new(token, DiagnosticKind::NestingTooDeep)
    }

    fn new(token: &Token, kind: DiagnosticKind) -> Self {
        Self {
            token: token.clone(),
            kind,
        }
    }

    pub fn message(&self) -> String {
        match &self.kind {
            DiagnosticKind::Expected(kind) => format!("expected {kind}"),
            DiagnosticKind::UnexpectedToken => format!("unexpected token: {}", self.token.text),
            DiagnosticKind::Lexical(fault) => fault.to_string(),
            DiagnosticKind::NestingTooDeep => "nesting too deep".to_string(),
        }
    }

    /// Three lines: the source line, a caret under the column, and the
    /// position with the message. Line breaks sit at column 0 and get the
    /// caret in the first column.
    pub fn render(&self, source_text: &str) -> String {
        let position = self.token.position;
        let line = source_text.split('\n').nth(position.line).unwrap_or("");
        let indent = " ".repeat(position.column.saturating_sub(1));
        format!("{line}\n{indent}^\n{self}")
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}", self.token.position, self.message())
    }
}

/// Collection of diagnostics.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Diagnostics {
    diagnostics: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self {
            diagnostics: Vec::new(),
        }
    }

    pub fn push(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    pub fn extend(&mut self, other: Diagnostics) {
        self.diagnostics.extend(other.diagnostics);
    }

    pub fn is_empty(&self) -> bool {
        self.diagnostics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.diagnostics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.diagnostics.iter()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.diagnostics
    }

    /// Render every diagnostic in order, one block after another.
    pub fn render(&self, source_text: &str) -> String {
        self.diagnostics
            .iter()
            .map(|diagnostic| diagnostic.render(source_text))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl IntoIterator for Diagnostics {
    type Item = Diagnostic;
    type IntoIter = std::vec::IntoIter<Diagnostic>;

    fn into_iter(self) -> Self::IntoIter {
        self.diagnostics.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::span::Position;

    fn token(kind: TokenKind, text: &str, line: usize, column: usize) -> Token {
        Token::new(kind, text, Position::new(line, column, column))
    }

    #[test]
    fn test_expected_render() {
        let diagnostic = Diagnostic::expected(
            &token(TokenKind::Comma, ",", 0, 6),
            TokenKind::LineBreak,
        );
        insta::assert_snapshot!(diagnostic.render("a = 5,5\n"), @r"
        a = 5,5
             ^
        line: 0, column: 6 expected LINE_BREAK
        ");
    }

    #[test]
    fn test_unexpected_render_on_second_line() {
        let diagnostic = Diagnostic::unexpected(&token(TokenKind::CloseBrace, "}", 1, 3));
        insta::assert_snapshot!(diagnostic.render("if (a) {\n  }}\n"), @r"
          }}
          ^
        line: 1, column: 3 unexpected token: }
        ");
    }

    #[test]
    fn test_line_break_caret_sits_in_first_column() {
        let diagnostic = Diagnostic::expected(
            &token(TokenKind::LineBreak, "\n", 1, 0),
            TokenKind::CloseParenthesis,
        );
        assert_eq!(
            diagnostic.render("(1\n"),
            "\n^\nline: 1, column: 0 expected CLOSE_PARENTHESIS"
        );
    }

    #[test]
    fn test_lexical_message() {
        let diagnostic = Diagnostic::lexical(
            &token(TokenKind::Empty, "$", 0, 1),
            LexFault::InvalidCharacter('$'),
        );
        assert_eq!(diagnostic.to_string(), "line: 0, column: 1 invalid character: $");
    }

    #[test]
    fn test_render_all_in_order() {
        let mut diagnostics = Diagnostics::new();
        diagnostics.push(Diagnostic::expected(
            &token(TokenKind::Comma, ",", 0, 6),
            TokenKind::LineBreak,
        ));
        diagnostics.push(Diagnostic::unexpected(&token(TokenKind::Comma, ",", 0, 6)));
        assert_eq!(diagnostics.len(), 2);
        insta::assert_snapshot!(diagnostics.render("a = 5,5\n"), @r"
        a = 5,5
             ^
        line: 0, column: 6 expected LINE_BREAK
        a = 5,5
             ^
        line: 0, column: 6 unexpected token: ,
        ");
    }
}
