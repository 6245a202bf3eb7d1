//! Interpreter for the cxl language.
//!
//! Walks a checked unit against a persistent [`Environment`]. Control
//! statements do not unwind the host stack: they come back as [`Flow`]
//! signals that every composite node checks after each child.

use std::io::Write;

use crate::ast::*;
use crate::environment::{Environment, Frame};
use crate::error::{EvalResult, RuntimeError};
use crate::value::{Complex, Value, ZERO};

/// Default limit for nested calls.
pub const DEFAULT_MAX_CALL_DEPTH: usize = 1000;

/// Outcome of evaluating a node.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Flow {
    /// A value the session prints when it is the result of a unit
    Value(Value),
    /// A value that is never printed, such as the result of an assignment
    Silent(Value),
    Return(Value),
    Break,
    Continue,
}

impl Flow {
    const NOTHING: Flow = Flow::Silent(Value::None);

    pub fn value(&self) -> Value {
        match self {
            Flow::Value(value) | Flow::Silent(value) | Flow::Return(value) => *value,
            Flow::Break | Flow::Continue => Value::None,
        }
    }

    /// Whether this is a control signal that stops the enclosing list.
    pub fn is_signal(&self) -> bool {
        matches!(self, Flow::Return(_) | Flow::Break | Flow::Continue)
    }

    /// The number to show for this result, if any.
    pub fn printable(&self) -> Option<Complex> {
        match self {
            Flow::Value(value) => value.as_number(),
            _ => None,
        }
    }
}

/// The cxl interpreter.
pub struct Interpreter {
    env: Environment,
    max_call_depth: usize,
}

impl Default for Interpreter {
    fn default() -> Self {
        Self::new()
    }
}

impl Interpreter {
    pub fn new() -> Self {
        Self {
            env: Environment::new(),
            max_call_depth: DEFAULT_MAX_CALL_DEPTH,
        }
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.max_call_depth = max_call_depth;
        self
    }

    pub fn environment(&self) -> &Environment {
        &self.env
    }

    pub fn environment_mut(&mut self) -> &mut Environment {
        &mut self.env
    }

    /// Evaluate a node. Output of the built-ins goes to `out`.
    pub fn evaluate(&mut self, node: &Node, out: &mut dyn Write) -> EvalResult<Flow> {
        let flow = match node {
            Node::Literal(number) => Flow::Value(Value::Number(*number)),
            Node::Identifier(name) => match self.env.get(name) {
                Some(number) => Flow::Value(Value::Number(number)),
                None => return Err(RuntimeError::UnboundVariable { name: name.clone() }),
            },
            Node::Negation(operand) => Flow::Value(self.value_of(operand, out)?.negate()),
            Node::Binary { op, left, right } => {
                let left = self.value_of(left, out)?;
                let right = self.value_of(right, out)?;
                Flow::Value(left.binary(*op, right)?)
            }
            Node::Assignment { target, value } => {
                let bound = self.value_of(value, out)?.as_number().unwrap_or(ZERO);
                self.env.set(target.as_str(), bound);
                Flow::Silent(Value::Number(bound))
            }
            Node::InstructionList(statements) => {
                let mut flow = Flow::NOTHING;
                for statement in statements {
                    flow = self.evaluate(statement, out)?;
                    if flow.is_signal() {
                        break;
                    }
                }
                flow
            }
            Node::Conditional {
                condition,
                then_block,
                otherwise,
            } => {
                let flow = if self.value_of(condition, out)?.is_truthy() {
                    self.evaluate(then_block, out)?
                } else if let Some(otherwise) = otherwise {
                    self.evaluate(otherwise, out)?
                } else {
                    Flow::NOTHING
                };
                if flow.is_signal() {
                    flow
                } else {
                    Flow::NOTHING
                }
            }
            Node::Loop {
                init,
                condition,
                step,
                body,
            } => self.evaluate_loop(init, condition, step, body, out)?,
            Node::FunctionDefinition(definition) => {
                self.env.define(definition.clone());
                Flow::NOTHING
            }
            Node::Call { name, arguments } => self.call(name, arguments, out)?,
            Node::BuiltinCall { builtin, arguments } => {
                self.call_builtin(*builtin, arguments, out)?
            }
            Node::Return(value) => {
                let value = match value {
                    Some(value) => self.value_of(value, out)?,
                    None => Value::None,
                };
                Flow::Return(value)
            }
            Node::Break => Flow::Break,
            Node::Continue => Flow::Continue,
            Node::NoOp | Node::EndOfInput => Flow::NOTHING,
        };
        Ok(flow)
    }

    fn value_of(&mut self, node: &Node, out: &mut dyn Write) -> EvalResult<Value> {
        Ok(self.evaluate(node, out)?.value())
    }

    /// The induction variable (the one `init` assigns) is put back the way
    /// it was before the loop on every exit, faults included.
    fn evaluate_loop(
        &mut self,
        init: &Node,
        condition: &Node,
        step: &Node,
        body: &Node,
        out: &mut dyn Write,
    ) -> EvalResult<Flow> {
        let induction = init.assigned_name();
        let saved = induction.and_then(|name| self.env.get(name));

        let result = self.run_loop(init, condition, step, body, out);

        if let Some(name) = induction {
            match saved {
                Some(value) => self.env.set(name, value),
                None => {
                    self.env.remove(name);
                }
            }
        }
        result
    }

    fn run_loop(
        &mut self,
        init: &Node,
        condition: &Node,
        step: &Node,
        body: &Node,
        out: &mut dyn Write,
    ) -> EvalResult<Flow> {
        self.evaluate(init, out)?;
        while self.value_of(condition, out)?.is_truthy() {
            match self.evaluate(body, out)? {
                Flow::Break => break,
                Flow::Return(value) => return Ok(Flow::Return(value)),
                _ => {}
            }
            self.evaluate(step, out)?;
        }
        Ok(Flow::NOTHING)
    }

    fn call(&mut self, name: &str, arguments: &[Node], out: &mut dyn Write) -> EvalResult<Flow> {
        let definition = self
            .env
            .function(name)
            .ok_or_else(|| RuntimeError::UndefinedFunction {
                name: name.to_string(),
            })?;
        if self.env.call_depth() >= self.max_call_depth {
            return Err(RuntimeError::CallDepthExceeded {
                limit: self.max_call_depth,
            });
        }

        // Arguments are evaluated in the caller's frame.
        let mut frame = Frame::new();
        for (param, argument) in definition.params.iter().zip(arguments) {
            let value = self.value_of(argument, out)?.as_number().unwrap_or(ZERO);
            frame.insert(param.clone(), value);
        }

        self.env.push_frame(frame);
        let result = self.evaluate(&definition.body, out);
        self.env.pop_frame();

        Ok(match result? {
            Flow::Return(value) => Flow::Value(value),
            flow => Flow::Silent(flow.value()),
        })
    }

    fn call_builtin(
        &mut self,
        builtin: Builtin,
        arguments: &[Node],
        out: &mut dyn Write,
    ) -> EvalResult<Flow> {
        let argument = match arguments.first() {
            Some(argument) => self.value_of(argument, out)?,
            None => Value::None,
        };
        match builtin {
            Builtin::Print => {
                write!(out, "{argument}")?;
                Ok(Flow::NOTHING)
            }
            Builtin::Println => {
                writeln!(out, "{argument}")?;
                Ok(Flow::NOTHING)
            }
            Builtin::Sqrt => {
                let root = match argument {
                    Value::Number(number) => Value::Number(number.sqrt()?),
                    Value::None => Value::None,
                };
                Ok(Flow::Value(root))
            }
        }
    }
}
