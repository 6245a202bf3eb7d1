//! The read-check-evaluate loop.

use std::io::Write;

use crate::ast::Node;
use crate::checker::Checker;
use crate::error::{RuntimeError, SessionError};
use crate::interpreter::{Interpreter, DEFAULT_MAX_CALL_DEPTH};
use crate::parser::{Parser, DEFAULT_MAX_CHAIN, DEFAULT_MAX_NESTING};
use crate::source::Source;
use crate::value::Complex;

/// Options for running a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionOptions {
    /// Calls nested deeper than this fault
    pub max_call_depth: usize,
    /// Groups, blocks and unary operators nested deeper than this are a
    /// syntax error
    pub max_nesting: usize,
    /// Longer runs of binary operators, or of statements missing their
    /// terminators, are a syntax error
    pub max_chain: usize,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
            max_nesting: DEFAULT_MAX_NESTING,
            max_chain: DEFAULT_MAX_CHAIN,
        }
    }
}

/// What happened to one unit.
#[derive(Debug)]
pub enum UnitOutcome {
    /// The input has ended
    Finished,
    /// An empty statement
    Empty,
    /// Syntax or semantic errors; nothing was evaluated
    Rejected,
    /// Evaluated, with the printed result if there was one
    Evaluated(Option<Complex>),
    /// Evaluation faulted and the unit's effects were undone
    Faulted(RuntimeError),
}

/// An interpreter session over one source.
///
/// Definitions and top-level variables accumulate from unit to unit. A unit
/// is parsed, checked and evaluated completely before the next one is read.
pub struct Session<S, W> {
    parser: Parser<S>,
    checker: Checker,
    interpreter: Interpreter,
    out: W,
}

impl<S: Source, W: Write> Session<S, W> {
    pub fn new(source: S, out: W) -> Self {
        Self::with_options(source, out, SessionOptions::default())
    }

    pub fn with_options(source: S, out: W, options: SessionOptions) -> Self {
        Self {
            parser: Parser::new(source)
                .with_max_nesting(options.max_nesting)
                .with_max_chain(options.max_chain),
            checker: Checker::new(),
            interpreter: Interpreter::new().with_max_call_depth(options.max_call_depth),
            out,
        }
    }

    pub fn output(&self) -> &W {
        &self.out
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Process units until the input ends.
    pub fn run(&mut self) -> Result<(), SessionError> {
        while !matches!(self.step()?, UnitOutcome::Finished) {}
        Ok(())
    }

    /// Parse, check and evaluate the next unit, writing its diagnostics or
    /// result to the output.
    ///
    /// A unit rejected by the checker or faulting at run time leaves no
    /// trace: variables, functions and checker state are put back the way
    /// they were before it.
    pub fn step(&mut self) -> Result<UnitOutcome, SessionError> {
        let unit = self.parser.parse_next();
        if let Some(error) = self.parser.source_mut().take_error() {
            return Err(error.into());
        }

        let outcome = if unit.is_end() {
            UnitOutcome::Finished
        } else if !unit.diagnostics.is_empty() {
            for diagnostic in unit.diagnostics.iter() {
                writeln!(self.out, "{}", diagnostic.render(&unit.source_text))?;
            }
            UnitOutcome::Rejected
        } else if matches!(unit.node, Node::NoOp) {
            UnitOutcome::Empty
        } else {
            self.evaluate(&unit.node)?
        };
        self.out.flush()?;
        Ok(outcome)
    }

    fn evaluate(&mut self, node: &Node) -> Result<UnitOutcome, SessionError> {
        let checker_state = self.checker.snapshot();
        let errors = self.checker.check(node);
        if !errors.is_empty() {
            for error in &errors {
                writeln!(self.out, "{error}")?;
            }
            self.checker.restore(checker_state);
            return Ok(UnitOutcome::Rejected);
        }

        let env_state = self.interpreter.environment().snapshot();
        match self.interpreter.evaluate(node, &mut self.out) {
            Ok(flow) => {
                let printable = flow.printable();
                if let Some(number) = printable {
                    writeln!(self.out, "{number}")?;
                }
                Ok(UnitOutcome::Evaluated(printable))
            }
            Err(RuntimeError::Output(error)) => Err(SessionError::Output(error)),
            Err(fault) => {
                self.interpreter.environment_mut().restore(env_state);
                self.checker.restore(checker_state);
                writeln!(self.out, "Runtime error: {fault}")?;
                Ok(UnitOutcome::Faulted(fault))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::SourceError;
    use crate::source::{CharSource, LineFeed};
    use std::io;

    fn transcript_with(text: &str, options: SessionOptions) -> String {
        let mut session = Session::with_options(CharSource::from_text(text), Vec::new(), options);
        session.run().unwrap();
        String::from_utf8(session.into_output()).unwrap()
    }

    fn transcript(text: &str) -> String {
        transcript_with(text, SessionOptions::default())
    }

    #[test]
    fn test_assignment_prints_nothing() {
        assert_eq!(transcript("a = 5\na\n"), "5.0\n");
    }

    #[test]
    fn test_nested_groups() {
        assert_eq!(transcript("((5 + 3) * (4 + 4)) / 16\n"), "4.0\n");
    }

    #[test]
    fn test_factorial() {
        assert_eq!(
            transcript("fun f(x){ if (x==1){return 1} return x*f(x-1) }\nf(4)\n"),
            "24.0\n"
        );
    }

    #[test]
    fn test_loop_break_and_scope() {
        let output = transcript("a = 0\nfor (i=0;i<10;i=i+1){ a=a+1; if(a>5){break} }\na\ni\n");
        assert_eq!(output, "6.0\nVariable i is not initialized\n");
    }

    #[test]
    fn test_uninitialized_variable_prints_no_value() {
        assert_eq!(transcript("a\n"), "Variable a is not initialized\n");
    }

    #[test]
    fn test_undeclared_function() {
        assert_eq!(
            transcript("a()\n"),
            "No function with name \"a\" and 0 arguments defined\n"
        );
    }

    #[test]
    fn test_fault_aborts_only_current_unit() {
        let output = transcript("a = 1\nb = a / 0\na\nb\na = a + 1\na\n");
        insta::assert_snapshot!(output.trim_end(), @r"
        Runtime error: division by zero
        1.0
        Variable b is not initialized
        2.0
        ");
    }

    #[test]
    fn test_fault_undoes_whole_unit() {
        let output = transcript("x = 1\nfun f() { return 1 / 0 }\nif (1) { x = 2; y = f() }\nx\n");
        assert_eq!(output, "Runtime error: division by zero\n1.0\n");
    }

    #[test]
    fn test_misplaced_control_statements() {
        let output = transcript("break\ncontinue\nreturn 5\n");
        assert_eq!(
            output,
            "Unexpected break statement\nUnexpected continue statement\nUnexpected return statement\n"
        );
    }

    #[test]
    fn test_syntax_errors_discard_unit() {
        let output = transcript("a = 5,5\na\n");
        insta::assert_snapshot!(output.trim_end(), @r"
        a = 5,5
             ^
        line: 0, column: 6 expected LINE_BREAK
        a = 5,5
             ^
        line: 0, column: 6 unexpected token: ,
        a = 5,5
              ^
        line: 0, column: 7 expected LINE_BREAK
        Variable a is not initialized
        ");
    }

    #[test]
    fn test_rejected_unit_leaves_no_bindings() {
        let output = transcript("a = b\na\n");
        assert_eq!(
            output,
            "Variable b is not initialized\nVariable a is not initialized\n"
        );
    }

    #[test]
    fn test_builtin_output_and_values() {
        let output = transcript("print(1)\nprintln(2)\nsqrt(16)\nx = 1 - 2i\nx\n0.5i\n");
        assert_eq!(output, "1.02.0\n4.0\n1.0-2.0i\n0.5i\n");
    }

    #[test]
    fn test_functions_persist_across_units() {
        let text = "fun sq(v) {\n  return v * v\n}\n\nfun sum(a, b) { return sq(a) + sq(b) }\nsum(3, 4)\n";
        assert_eq!(transcript(text), "25.0\n");
    }

    #[test]
    fn test_call_depth_limit_is_reported() {
        let options = SessionOptions {
            max_call_depth: 20,
            ..SessionOptions::default()
        };
        let output = transcript_with("fun r(n) { return r(n + 1) }\nr(0)\nr\n", options);
        assert!(output.starts_with("Runtime error: call depth limit of 20 exceeded\n"));
    }

    #[test]
    fn test_long_operator_chain_is_a_syntax_error() {
        let options = SessionOptions {
            max_chain: 50,
            ..SessionOptions::default()
        };
        let text = format!("{}1\n7\n", "1+".repeat(100));
        let output = transcript_with(&text, options);
        assert_eq!(output.matches("nesting too deep").count(), 1);
        assert!(output.ends_with("7.0\n"));
    }

    #[test]
    fn test_each_diagnostic_is_written_in_order() {
        assert_eq!(
            transcript("1 2 3\n"),
            "1 2 3\n  ^\nline: 0, column: 3 expected LINE_BREAK\n\
             1 2 3\n    ^\nline: 0, column: 5 expected LINE_BREAK\n"
        );
    }

    #[test]
    fn test_step_outcomes() {
        let text = "a = 1\n\na\n)(\nq\n1/0\n";
        let mut session = Session::new(CharSource::from_text(text), Vec::new());
        assert!(matches!(session.step().unwrap(), UnitOutcome::Evaluated(None)));
        assert!(matches!(session.step().unwrap(), UnitOutcome::Empty));
        assert!(matches!(
            session.step().unwrap(),
            UnitOutcome::Evaluated(Some(value)) if value == Complex::real(1.0).unwrap()
        ));
        assert!(matches!(session.step().unwrap(), UnitOutcome::Rejected));
        assert!(matches!(session.step().unwrap(), UnitOutcome::Rejected));
        assert!(matches!(
            session.step().unwrap(),
            UnitOutcome::Faulted(RuntimeError::DivisionByZero)
        ));
        assert!(matches!(session.step().unwrap(), UnitOutcome::Finished));
        assert!(matches!(session.step().unwrap(), UnitOutcome::Finished));
    }

    #[test]
    fn test_exit_ends_session() {
        assert_eq!(transcript("1\nexit\n2\n"), "1.0\n");
    }

    struct BrokenFeed {
        lines: Vec<String>,
    }

    impl LineFeed for BrokenFeed {
        fn next_line(&mut self, _continuation: bool) -> io::Result<Option<String>> {
            if self.lines.is_empty() {
                return Err(io::Error::new(io::ErrorKind::Other, "terminal lost"));
            }
            Ok(Some(self.lines.remove(0)))
        }
    }

    #[test]
    fn test_source_failure_is_fatal() {
        let feed = BrokenFeed {
            lines: vec!["1 + 1\n".to_string()],
        };
        let mut session = Session::new(CharSource::new(feed), Vec::new());
        assert!(matches!(session.step().unwrap(), UnitOutcome::Evaluated(Some(_))));
        assert!(matches!(
            session.run(),
            Err(SessionError::Source(SourceError::Read(_)))
        ));
        assert_eq!(session.output(), b"2.0\n");
    }
}
