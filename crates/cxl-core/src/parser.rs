//! Parser for the cxl language.
//!
//! A recursive-descent parser with one token of lookahead that is fetched
//! only when a rule needs it. Each call to [`Parser::parse_next`] yields one
//! top-level unit, so a session can evaluate a statement before the next line
//! of input exists.
//!
//! Binary operators are parsed by right-recursive rules and therefore group
//! to the right: `8 - 4 - 2` is `8 - (4 - 2)`.

use std::rc::Rc;

use crate::ast::*;
use crate::diagnostics::{Diagnostic, Diagnostics};
use crate::lexer::{Lexer, Token, TokenKind};
use crate::source::Source;
use crate::span::Position;
use crate::value::ZERO;

/// Default limit for nested groups, blocks and unary operators.
pub const DEFAULT_MAX_NESTING: usize = 200;

/// Default limit for operands chained by binary operators, and for
/// statements run together without terminators.
pub const DEFAULT_MAX_CHAIN: usize = 5_000;

/// One parsed top-level item.
#[derive(Debug, Clone, PartialEq)]
pub struct Unit {
    pub node: Node,
    pub diagnostics: Diagnostics,
    /// Text read while parsing the unit, for rendering its diagnostics
    pub source_text: String,
}

impl Unit {
    pub fn is_end(&self) -> bool {
        matches!(self.node, Node::EndOfInput)
    }
}

/// Parser for the cxl language.
pub struct Parser<S> {
    lexer: Lexer<S>,
    token: Token,
    /// The current token has been consumed; the next look fetches a new one.
    consumed: bool,
    diagnostics: Diagnostics,
    /// Open groups, argument lists and statement headers
    paren_depth: usize,
    depth: usize,
    max_nesting: usize,
    chain: usize,
    max_chain: usize,
    /// Set when nesting got too deep; the rest of the line is dropped and
    /// further diagnostics of the unit are suppressed.
    abandoned: bool,
}

impl<S: Source> Parser<S> {
    pub fn new(source: S) -> Self {
        Self {
            lexer: Lexer::new(source),
            token: Token::new(TokenKind::Empty, "", Position::default()),
            consumed: true,
            diagnostics: Diagnostics::new(),
            paren_depth: 0,
            depth: 0,
            max_nesting: DEFAULT_MAX_NESTING,
            chain: 0,
            max_chain: DEFAULT_MAX_CHAIN,
            abandoned: false,
        }
    }

    pub fn with_max_nesting(mut self, max_nesting: usize) -> Self {
        self.max_nesting = max_nesting;
        self
    }

    pub fn with_max_chain(mut self, max_chain: usize) -> Self {
        self.max_chain = max_chain;
        self
    }

    pub fn source_mut(&mut self) -> &mut S {
        self.lexer.source_mut()
    }

    /// Parse the next unit: a function definition or one statement.
    ///
    /// The source's unit buffer is reset afterwards, so positions in the
    /// next unit start over.
    pub fn parse_next(&mut self) -> Unit {
        self.paren_depth = 0;
        self.depth = 0;
        self.chain = 0;
        self.abandoned = false;

        let node = if self.accept(TokenKind::FunKeyword) {
            let definition = self.parse_function_definition();
            self.parse_terminator(definition, false)
        } else {
            self.parse_statement(false)
        };

        let source = self.lexer.source_mut();
        let source_text = source.raw_text().to_string();
        source.reset_unit_buffer();

        Unit {
            node,
            diagnostics: std::mem::take(&mut self.diagnostics),
            source_text,
        }
    }

    /// `fun name(params) { body }`
    fn parse_function_definition(&mut self) -> Node {
        let name = self.expect_identifier().unwrap_or_default();
        self.expect(TokenKind::OpenParenthesis);

        let mut params = Vec::new();
        if self.accept(TokenKind::Identifier) {
            params.push(self.token.text.clone());
            while self.accept(TokenKind::Comma) {
                if let Some(param) = self.expect_identifier() {
                    params.push(param);
                }
            }
        }
        self.expect(TokenKind::CloseParenthesis);
        self.accept(TokenKind::LineBreak);
        let body = self.parse_block();

        Node::FunctionDefinition(Rc::new(FunctionDefinition { name, params, body }))
    }

    fn parse_statement(&mut self, in_block: bool) -> Node {
        if self.accept(TokenKind::LineBreak) || self.accept(TokenKind::Semicolon) {
            return Node::NoOp;
        }
        if self.accept(TokenKind::EndOfInput) {
            return Node::EndOfInput;
        }
        let statement = self.parse_instruction();
        self.parse_terminator(statement, in_block)
    }

    /// A statement ends with a line break or `;`, at the end of input, or
    /// inside a block before `}` or after its own closing brace. Anything else
    /// is reported and the rest is parsed as a following statement.
    fn parse_terminator(&mut self, statement: Node, in_block: bool) -> Node {
        if self.accept(TokenKind::LineBreak)
            || self.accept(TokenKind::Semicolon)
            || self.check(TokenKind::EndOfInput)
            || self.abandoned
        {
            return statement;
        }
        if in_block && (self.check(TokenKind::CloseBrace) || statement.ends_with_block()) {
            return statement;
        }
        self.report(Diagnostic::expected(&self.token, TokenKind::LineBreak));
        let rest = self.chained(|parser| parser.parse_statement(in_block));
        Node::InstructionList(vec![statement, rest])
    }

    fn parse_instruction(&mut self) -> Node {
        if self.accept(TokenKind::BreakKeyword) {
            Node::Break
        } else if self.accept(TokenKind::ContinueKeyword) {
            Node::Continue
        } else if self.accept(TokenKind::ForKeyword) {
            self.parse_loop()
        } else if self.accept(TokenKind::IfKeyword) {
            self.parse_conditional()
        } else if self.accept(TokenKind::ReturnKeyword) {
            self.parse_return()
        } else {
            self.parse_assignment()
        }
    }

    /// `{ statements }`. Empty statements are dropped.
    fn parse_block(&mut self) -> Node {
        if !self.expect(TokenKind::OpenBrace) {
            return Node::InstructionList(Vec::new());
        }
        self.nested(|parser| {
            let mut statements = Vec::new();
            while !parser.accept(TokenKind::CloseBrace) {
                if parser.abandoned || parser.check(TokenKind::EndOfInput) {
                    parser.report(Diagnostic::expected(&parser.token, TokenKind::CloseBrace));
                    break;
                }
                match parser.parse_statement(true) {
                    Node::NoOp => {}
                    statement => statements.push(statement),
                }
            }
            Node::InstructionList(statements)
        })
    }

    /// `for (init; condition; step) { body }`
    fn parse_loop(&mut self) -> Node {
        self.expect(TokenKind::OpenParenthesis);
        self.paren_depth += 1;
        let init = self.parse_assignment();
        self.expect(TokenKind::Semicolon);
        let condition = self.parse_comparison();
        self.expect(TokenKind::Semicolon);
        let step = self.parse_assignment();
        self.paren_depth -= 1;
        self.expect(TokenKind::CloseParenthesis);
        self.accept(TokenKind::LineBreak);
        let body = self.parse_block();

        Node::Loop {
            init: Box::new(init),
            condition: Box::new(condition),
            step: Box::new(step),
            body: Box::new(body),
        }
    }

    /// `if (condition) { ... } [else if ... | else { ... }]`
    fn parse_conditional(&mut self) -> Node {
        self.expect(TokenKind::OpenParenthesis);
        self.paren_depth += 1;
        let condition = self.parse_assignment();
        self.paren_depth -= 1;
        self.expect(TokenKind::CloseParenthesis);
        self.accept(TokenKind::LineBreak);
        let then_block = self.parse_block();

        let otherwise = if self.accept(TokenKind::ElseKeyword) {
            let otherwise = if self.accept(TokenKind::IfKeyword) {
                self.nested(|parser| parser.parse_conditional())
            } else {
                self.parse_block()
            };
            Some(Box::new(otherwise))
        } else {
            None
        };

        Node::Conditional {
            condition: Box::new(condition),
            then_block: Box::new(then_block),
            otherwise,
        }
    }

    fn parse_return(&mut self) -> Node {
        let bare = [
            TokenKind::LineBreak,
            TokenKind::Semicolon,
            TokenKind::CloseBrace,
            TokenKind::EndOfInput,
        ];
        if bare.into_iter().any(|kind| self.check(kind)) {
            Node::Return(None)
        } else {
            Node::Return(Some(Box::new(self.parse_assignment())))
        }
    }

    /// `target = value`, right-associative; the target must be a variable.
    fn parse_assignment(&mut self) -> Node {
        self.look();
        let start = self.token.clone();
        let target = self.parse_comparison();
        if !self.accept(TokenKind::Assignment) {
            return target;
        }
        let value = self.chained(|parser| parser.parse_assignment());
        match target {
            Node::Identifier(name) => Node::Assignment {
                target: name,
                value: Box::new(value),
            },
            _ => {
                self.report(Diagnostic::expected(&start, TokenKind::Identifier));
                Node::NoOp
            }
        }
    }

    fn parse_comparison(&mut self) -> Node {
        let left = self.parse_logical();
        if !self.accept(TokenKind::RelationalOperator) {
            return left;
        }
        let op = self.operator();
        let right = self.chained(|parser| parser.parse_comparison());
        Self::binary(op, left, right)
    }

    fn parse_logical(&mut self) -> Node {
        let left = self.parse_power();
        let op = if self.accept(TokenKind::LogicalAnd) {
            BinaryOp::And
        } else if self.accept(TokenKind::LogicalOr) {
            BinaryOp::Or
        } else {
            return left;
        };
        let right = self.chained(|parser| parser.parse_logical());
        Node::binary(op, left, right)
    }

    fn parse_power(&mut self) -> Node {
        let left = self.parse_additive();
        if !self.accept(TokenKind::PowerOperator) {
            return left;
        }
        let right = self.chained(|parser| parser.parse_power());
        Node::binary(BinaryOp::Power, left, right)
    }

    fn parse_additive(&mut self) -> Node {
        let left = self.parse_multiplicative();
        if !self.accept(TokenKind::AdditiveOperator) {
            return left;
        }
        let op = self.operator();
        let right = self.chained(|parser| parser.parse_additive());
        Self::binary(op, left, right)
    }

    fn parse_multiplicative(&mut self) -> Node {
        let left = self.parse_value();
        if !self.accept(TokenKind::MultiplicativeOperator) {
            return left;
        }
        let op = self.operator();
        let right = self.chained(|parser| parser.parse_multiplicative());
        Self::binary(op, left, right)
    }

    /// Primary expressions and the prefix operators.
    fn parse_value(&mut self) -> Node {
        if self.accept(TokenKind::OpenParenthesis) {
            return self.nested(|parser| parser.parse_group());
        }
        if self.accept(TokenKind::Number) {
            return Node::Literal(self.token.value.unwrap_or(ZERO));
        }
        if self.accept(TokenKind::BuiltInFunction) {
            let name = self.token.text.clone();
            self.expect(TokenKind::OpenParenthesis);
            let arguments = self.parse_call_arguments();
            return match Builtin::from_name(&name) {
                Some(builtin) => Node::BuiltinCall { builtin, arguments },
                None => Node::NoOp,
            };
        }
        if self.accept(TokenKind::Identifier) {
            let name = self.token.text.clone();
            if self.accept(TokenKind::OpenParenthesis) {
                let arguments = self.parse_call_arguments();
                return Node::Call { name, arguments };
            }
            return Node::Identifier(name);
        }
        if self.accept(TokenKind::Negation) {
            return self.nested(|parser| Node::Negation(Box::new(parser.parse_comparison())));
        }
        if self.accept(TokenKind::AdditiveOperator) {
            let op = self.operator();
            return self.nested(|parser| {
                let operand = parser.parse_value();
                Self::binary(op, Node::Literal(ZERO), operand)
            });
        }
        if self.accept(TokenKind::CloseParenthesis) {
            return Node::NoOp;
        }
        if self.check(TokenKind::LineBreak) || self.check(TokenKind::EndOfInput) {
            return Node::NoOp;
        }

        self.report(Diagnostic::unexpected(&self.token));
        self.consumed = true;
        Node::NoOp
    }

    /// The inside of `( ... )` after the opening parenthesis. Surplus closing
    /// parentheses after an outermost group are dropped.
    fn parse_group(&mut self) -> Node {
        self.paren_depth += 1;
        let inner = self.parse_assignment();
        self.paren_depth -= 1;
        self.expect(TokenKind::CloseParenthesis);
        if self.paren_depth == 0 {
            while self.accept(TokenKind::CloseParenthesis) {}
        }
        inner
    }

    /// Arguments after the opening parenthesis of a call, through the
    /// closing one.
    fn parse_call_arguments(&mut self) -> Vec<Node> {
        let mut arguments = Vec::new();
        if self.accept(TokenKind::CloseParenthesis) {
            return arguments;
        }
        self.paren_depth += 1;
        loop {
            arguments.push(self.parse_comparison());
            if !self.accept(TokenKind::Comma) {
                break;
            }
        }
        self.paren_depth -= 1;
        self.expect(TokenKind::CloseParenthesis);
        arguments
    }

    // Helper methods

    fn binary(op: Option<BinaryOp>, left: Node, right: Node) -> Node {
        match op {
            Some(op) => Node::binary(op, left, right),
            None => Node::NoOp,
        }
    }

    /// Operator spelled by the token just accepted.
    fn operator(&self) -> Option<BinaryOp> {
        BinaryOp::from_lexeme(&self.token.text)
    }

    /// Run `rule` one nesting level deeper, unless that exceeds the limit.
    fn nested(&mut self, rule: impl FnOnce(&mut Self) -> Node) -> Node {
        self.depth += 1;
        let node = if self.depth > self.max_nesting {
            self.too_deep();
            Node::NoOp
        } else {
            rule(self)
        };
        self.depth -= 1;
        node
    }

    /// Run `rule` for the next link of a right-recursive chain, unless the
    /// chain is already at its limit.
    fn chained(&mut self, rule: impl FnOnce(&mut Self) -> Node) -> Node {
        self.chain += 1;
        let node = if self.chain > self.max_chain {
            self.too_deep();
            Node::NoOp
        } else {
            rule(self)
        };
        self.chain -= 1;
        node
    }

    fn too_deep(&mut self) {
        if self.abandoned {
            return;
        }
        self.look();
        self.report(Diagnostic::nesting_too_deep(&self.token));
        self.abandoned = true;
        while !self.check(TokenKind::LineBreak) && !self.check(TokenKind::EndOfInput) {
            self.consumed = true;
        }
    }

    /// Fetch the next token if the current one has been consumed. Lexical
    /// faults found on the way join the unit's diagnostics.
    fn look(&mut self) {
        if self.consumed {
            self.token = self.lexer.next_token();
            self.consumed = false;
            self.diagnostics.extend(self.lexer.take_diagnostics());
        }
    }

    fn check(&mut self, kind: TokenKind) -> bool {
        self.look();
        self.token.kind == kind
    }

    /// Consume the current token if it has the given kind. The end of input
    /// is never consumed, so every later look sees it again.
    fn accept(&mut self, kind: TokenKind) -> bool {
        if !self.check(kind) {
            return false;
        }
        if kind != TokenKind::EndOfInput {
            self.consumed = true;
        }
        true
    }

    /// Like [`accept`](Self::accept), but a mismatch is reported and the
    /// offending token skipped. Line breaks and the end of input are left
    /// in place for the statement rules.
    fn expect(&mut self, kind: TokenKind) -> bool {
        if self.accept(kind) {
            return true;
        }
        self.report(Diagnostic::expected(&self.token, kind));
        let keep = matches!(self.token.kind, TokenKind::LineBreak | TokenKind::EndOfInput);
        if !keep && !self.abandoned {
            self.consumed = true;
        }
        false
    }

    fn expect_identifier(&mut self) -> Option<String> {
        if self.expect(TokenKind::Identifier) {
            Some(self.token.text.clone())
        } else {
            None
        }
    }

    fn report(&mut self, diagnostic: Diagnostic) {
        if !self.abandoned {
            self.diagnostics.push(diagnostic);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{CharSource, ReaderFeed};
    use crate::value::Complex;
    use std::io::Cursor;

    fn parser(text: &str) -> Parser<CharSource<ReaderFeed<Cursor<String>>>> {
        Parser::new(CharSource::from_text(text))
    }

    fn parse_one(text: &str) -> Unit {
        parser(text).parse_next()
    }

    fn parse_clean(text: &str) -> Node {
        let unit = parse_one(text);
        assert!(
            unit.diagnostics.is_empty(),
            "unexpected diagnostics:\n{}",
            unit.diagnostics.render(&unit.source_text)
        );
        unit.node
    }

    fn num(value: f64) -> Node {
        Node::Literal(Complex::real(value).unwrap())
    }

    fn ident(name: &str) -> Node {
        Node::Identifier(name.into())
    }

    #[test]
    fn test_parse_assignment() {
        assert_eq!(
            parse_clean("a = 5\n"),
            Node::Assignment {
                target: "a".into(),
                value: Box::new(num(5.0)),
            }
        );
    }

    #[test]
    fn test_operators_group_to_the_right() {
        assert_eq!(
            parse_clean("8 - 4 - 2\n"),
            Node::binary(
                BinaryOp::Subtract,
                num(8.0),
                Node::binary(BinaryOp::Subtract, num(4.0), num(2.0))
            )
        );
        assert_eq!(
            parse_clean("2 ^ 3 ^ 2\n"),
            Node::binary(
                BinaryOp::Power,
                num(2.0),
                Node::binary(BinaryOp::Power, num(3.0), num(2.0))
            )
        );
    }

    #[test]
    fn test_precedence_levels() {
        // relational is looser than logical, which is looser than arithmetic
        assert_eq!(
            parse_clean("a < b && c + 1\n"),
            Node::binary(
                BinaryOp::Less,
                ident("a"),
                Node::binary(
                    BinaryOp::And,
                    ident("b"),
                    Node::binary(BinaryOp::Add, ident("c"), num(1.0))
                )
            )
        );
    }

    #[test]
    fn test_unary_sign_and_negation() {
        assert_eq!(
            parse_clean("-x\n"),
            Node::binary(BinaryOp::Subtract, Node::Literal(ZERO), ident("x"))
        );
        assert_eq!(
            parse_clean("!a == b\n"),
            Node::Negation(Box::new(Node::binary(BinaryOp::Equal, ident("a"), ident("b"))))
        );
    }

    #[test]
    fn test_parse_groups() {
        assert_eq!(
            parse_clean("((5 + 3) * (4 + 4)) / 16\n"),
            Node::binary(
                BinaryOp::Divide,
                Node::binary(
                    BinaryOp::Multiply,
                    Node::binary(BinaryOp::Add, num(5.0), num(3.0)),
                    Node::binary(BinaryOp::Add, num(4.0), num(4.0))
                ),
                num(16.0)
            )
        );
        assert_eq!(parse_clean("(1))\n"), num(1.0));
    }

    #[test]
    fn test_missing_close_parenthesis() {
        let unit = parse_one("(1\n");
        assert_eq!(
            unit.diagnostics.render(&unit.source_text),
            "\n^\nline: 1, column: 0 expected CLOSE_PARENTHESIS"
        );
        assert_eq!(unit.node, num(1.0));
    }

    #[test]
    fn test_parse_calls() {
        assert_eq!(
            parse_clean("f(1, x)\n"),
            Node::Call {
                name: "f".into(),
                arguments: vec![num(1.0), ident("x")],
            }
        );
        assert_eq!(
            parse_clean("g()\n"),
            Node::Call {
                name: "g".into(),
                arguments: Vec::new(),
            }
        );
        assert_eq!(
            parse_clean("println(sqrt(4))\n"),
            Node::BuiltinCall {
                builtin: Builtin::Println,
                arguments: vec![Node::BuiltinCall {
                    builtin: Builtin::Sqrt,
                    arguments: vec![num(4.0)],
                }],
            }
        );
    }

    #[test]
    fn test_parse_function_definition() {
        let node = parse_clean("fun f(x){ if (x==1){return 1} return x*f(x-1) }\n");
        let Node::FunctionDefinition(definition) = node else {
            panic!("expected a function definition, got {node:?}");
        };
        assert_eq!(definition.name, "f");
        assert_eq!(definition.params, vec!["x".to_string()]);
        let Node::InstructionList(body) = &definition.body else {
            panic!("expected a block");
        };
        assert_eq!(body.len(), 2);
        assert!(matches!(body[0], Node::Conditional { .. }));
        assert!(matches!(body[1], Node::Return(Some(_))));
    }

    #[test]
    fn test_multi_line_function() {
        let node = parse_clean("fun add(a, b) {\n  c = a + b\n\n  return c\n}\n");
        let Node::FunctionDefinition(definition) = node else {
            panic!("expected a function definition");
        };
        assert_eq!(definition.params, vec!["a".to_string(), "b".to_string()]);
        assert_eq!(
            definition.body,
            Node::InstructionList(vec![
                Node::Assignment {
                    target: "c".into(),
                    value: Box::new(Node::binary(BinaryOp::Add, ident("a"), ident("b"))),
                },
                Node::Return(Some(Box::new(ident("c")))),
            ])
        );
    }

    #[test]
    fn test_parse_loop_on_one_line() {
        let node = parse_clean("for (i=0;i<10;i=i+1){ a=a+1; if(a>5){break} }\n");
        let Node::Loop { init, body, .. } = node else {
            panic!("expected a loop");
        };
        assert_eq!(init.assigned_name(), Some("i"));
        let Node::InstructionList(body) = *body else {
            panic!("expected a block");
        };
        assert_eq!(body.len(), 2);
    }

    #[test]
    fn test_else_if_chain() {
        let node = parse_clean("if (a) {1} else if (b) {2} else {3}\n");
        let Node::Conditional { otherwise: Some(otherwise), .. } = node else {
            panic!("expected an else branch");
        };
        let Node::Conditional { otherwise: Some(last), .. } = *otherwise else {
            panic!("expected a nested conditional");
        };
        assert_eq!(*last, Node::InstructionList(vec![num(3.0)]));
    }

    #[test]
    fn test_bare_return() {
        let node = parse_clean("fun f() {\n return\n}\n");
        let Node::FunctionDefinition(definition) = node else {
            panic!("expected a function definition");
        };
        assert_eq!(definition.body, Node::InstructionList(vec![Node::Return(None)]));
    }

    #[test]
    fn test_missing_terminator_recovers() {
        let unit = parse_one("a = 5,5\n");
        insta::assert_snapshot!(unit.diagnostics.render(&unit.source_text), @r"
        a = 5,5
             ^
        line: 0, column: 6 expected LINE_BREAK
        a = 5,5
             ^
        line: 0, column: 6 unexpected token: ,
        a = 5,5
              ^
        line: 0, column: 7 expected LINE_BREAK
        ");
    }

    #[test]
    fn test_loop_header_with_commas() {
        let unit = parse_one("for (j = 0, j < 5, j = j + 1) {\n}\n");
        let messages: Vec<_> = unit.diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "line: 0, column: 11 expected SEMICOLON",
                "line: 0, column: 18 expected SEMICOLON",
            ]
        );
    }

    #[test]
    fn test_assignment_target_must_be_identifier() {
        let unit = parse_one("5 = 3\n");
        let messages: Vec<_> = unit.diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(messages, vec!["line: 0, column: 1 expected IDENTIFIER"]);
    }

    #[test]
    fn test_unclosed_block_at_end_of_input() {
        let mut parser = parser("if (a) {\n b = 1\n");
        let unit = parser.parse_next();
        let messages: Vec<_> = unit.diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(messages, vec!["line: 2, column: 0 expected CLOSE_BRACE"]);
        assert!(parser.parse_next().is_end());
    }

    #[test]
    fn test_lexical_fault_is_a_diagnostic() {
        let unit = parse_one("a = 1 $\n");
        let messages: Vec<_> = unit.diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(
            messages,
            vec![
                "line: 0, column: 7 invalid character: $",
                "line: 0, column: 7 expected LINE_BREAK",
                "line: 0, column: 7 unexpected token: $",
            ]
        );
    }

    #[test]
    fn test_units_in_sequence() {
        let mut parser = parser("a = 1\n\nb = 2; exit\nc = 3\n");
        assert_eq!(parser.parse_next().node.assigned_name(), Some("a"));
        assert_eq!(parser.parse_next().node, Node::NoOp);

        let unit = parser.parse_next();
        assert_eq!(unit.node.assigned_name(), Some("b"));
        assert_eq!(unit.source_text, "b = 2;");

        assert!(parser.parse_next().is_end());
        assert!(parser.parse_next().is_end());
    }

    #[test]
    fn test_positions_restart_per_unit() {
        let mut parser = parser("a = 1\nb = ,\n");
        parser.parse_next();
        let unit = parser.parse_next();
        let first = unit.diagnostics.iter().next().unwrap();
        assert_eq!(first.token.position.line, 0);
        assert_eq!(first.token.position.column, 5);
        assert_eq!(unit.source_text, "b = ,\n");
    }

    #[test]
    fn test_nesting_limit() {
        let text = format!("{}1{}\n", "(".repeat(10), ")".repeat(10));
        let mut parser = parser(&text).with_max_nesting(5);
        let unit = parser.parse_next();
        let messages: Vec<_> = unit.diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(messages, vec!["line: 0, column: 7 nesting too deep"]);
        assert!(parser.parse_next().is_end());
    }

    #[test]
    fn test_operator_chain_at_limit() {
        let unit = parser("1+1+1+1\n").with_max_chain(3).parse_next();
        assert!(unit.diagnostics.is_empty());
        assert_eq!(
            unit.node,
            Node::binary(
                BinaryOp::Add,
                num(1.0),
                Node::binary(
                    BinaryOp::Add,
                    num(1.0),
                    Node::binary(BinaryOp::Add, num(1.0), num(1.0))
                )
            )
        );
    }

    #[test]
    fn test_operator_chain_limit() {
        let mut parser = parser("1+1+1+1+1+1\n").with_max_chain(3);
        let unit = parser.parse_next();
        let messages: Vec<_> = unit.diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(messages, vec!["line: 0, column: 9 nesting too deep"]);
        assert!(parser.parse_next().is_end());
    }

    #[test]
    fn test_missing_terminator_chain_limit() {
        let mut parser = parser("1 1 1 1 1 1\n").with_max_chain(3);
        let unit = parser.parse_next();
        let messages: Vec<_> = unit.diagnostics.iter().map(|d| d.to_string()).collect();
        assert_eq!(messages.len(), 5);
        assert_eq!(messages[3], "line: 0, column: 9 expected LINE_BREAK");
        assert_eq!(messages[4], "line: 0, column: 9 nesting too deep");

        let rest = parser.parse_next();
        assert_eq!(rest.node, Node::NoOp);
        assert!(rest.diagnostics.is_empty());
        assert!(parser.parse_next().is_end());
    }
}
