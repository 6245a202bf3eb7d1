//! Semantic checks run on each unit before it is evaluated.
//!
//! The checker remembers across units which variables have been assigned at
//! top level and which functions exist with which arity. The checks are flow
//! insensitive: an assignment anywhere earlier in the text counts, whether or
//! not it will run.

use std::collections::{HashMap, HashSet};

use thiserror::Error;

use crate::ast::{Builtin, FunctionDefinition, Node};

/// A semantic problem. The message is shown to the user as is.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SemanticError {
    #[error("Variable {name} is not initialized")]
    Uninitialized { name: String },

    #[error("No function with name \"{name}\" and {arity} arguments defined")]
    UndefinedFunction { name: String, arity: usize },

    #[error("Unknown built-in function \"{name}\"")]
    UnknownBuiltin { name: String },

    #[error("Too many arguments for built-in function \"{name}\": expected {expected}, got {got}")]
    TooManyArguments {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Too few arguments for built-in function \"{name}\": expected {expected}, got {got}")]
    TooFewArguments {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("Unexpected return statement")]
    UnexpectedReturn,

    #[error("Unexpected break statement")]
    UnexpectedBreak,

    #[error("Unexpected continue statement")]
    UnexpectedContinue,
}

/// Saved checker state, see [`Checker::snapshot`].
#[derive(Debug, Clone)]
pub struct CheckerState {
    initialized: HashSet<String>,
    signatures: HashMap<String, usize>,
}

/// Persistent semantic checker.
#[derive(Debug, Clone)]
pub struct Checker {
    initialized: HashSet<String>,
    /// Function name to arity, built-ins included
    signatures: HashMap<String, usize>,
    errors: Vec<SemanticError>,
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

impl Checker {
    pub fn new() -> Self {
        let signatures = Builtin::ALL
            .iter()
            .map(|builtin| (builtin.name().to_string(), builtin.arity()))
            .collect();
        Self {
            initialized: HashSet::new(),
            signatures,
            errors: Vec::new(),
        }
    }

    /// Check a top-level unit. An empty result means it may be evaluated.
    pub fn check(&mut self, node: &Node) -> Vec<SemanticError> {
        self.check_node(node, false, false);
        std::mem::take(&mut self.errors)
    }

    pub fn is_initialized(&self, name: &str) -> bool {
        self.initialized.contains(name)
    }

    pub fn arity(&self, name: &str) -> Option<usize> {
        self.signatures.get(name).copied()
    }

    pub fn snapshot(&self) -> CheckerState {
        CheckerState {
            initialized: self.initialized.clone(),
            signatures: self.signatures.clone(),
        }
    }

    pub fn restore(&mut self, state: CheckerState) {
        self.initialized = state.initialized;
        self.signatures = state.signatures;
    }

    fn check_node(&mut self, node: &Node, in_loop: bool, in_function: bool) {
        match node {
            Node::Literal(_) | Node::NoOp | Node::EndOfInput => {}
            Node::Identifier(name) => {
                if !self.initialized.contains(name) {
                    self.errors.push(SemanticError::Uninitialized { name: name.clone() });
                }
            }
            Node::Negation(operand) => self.check_node(operand, in_loop, in_function),
            Node::Binary { left, right, .. } => {
                self.check_node(left, in_loop, in_function);
                self.check_node(right, in_loop, in_function);
            }
            Node::Assignment { target, value } => {
                self.check_node(value, in_loop, in_function);
                self.initialized.insert(target.clone());
            }
            Node::InstructionList(statements) => {
                for statement in statements {
                    self.check_node(statement, in_loop, in_function);
                }
            }
            Node::Conditional {
                condition,
                then_block,
                otherwise,
            } => {
                self.check_node(condition, in_loop, in_function);
                self.check_node(then_block, in_loop, in_function);
                if let Some(otherwise) = otherwise {
                    self.check_node(otherwise, in_loop, in_function);
                }
            }
            Node::Loop {
                init,
                condition,
                step,
                body,
            } => {
                let fresh = init
                    .assigned_name()
                    .filter(|name| !self.initialized.contains(*name))
                    .map(str::to_string);
                self.check_node(init, in_loop, in_function);
                self.check_node(condition, in_loop, in_function);
                self.check_node(body, true, in_function);
                self.check_node(step, in_loop, in_function);
                if let Some(name) = fresh {
                    self.initialized.remove(&name);
                }
            }
            Node::FunctionDefinition(definition) => self.check_definition(definition),
            Node::Call { name, arguments } => {
                for argument in arguments {
                    self.check_node(argument, in_loop, in_function);
                }
                if self.arity(name) != Some(arguments.len()) {
                    self.errors.push(SemanticError::UndefinedFunction {
                        name: name.clone(),
                        arity: arguments.len(),
                    });
                }
            }
            Node::BuiltinCall { builtin, arguments } => {
                for argument in arguments {
                    self.check_node(argument, in_loop, in_function);
                }
                self.check_builtin_arity(*builtin, arguments.len());
            }
            Node::Return(value) => {
                if !in_function {
                    self.errors.push(SemanticError::UnexpectedReturn);
                } else if let Some(value) = value {
                    self.check_node(value, in_loop, in_function);
                }
            }
            Node::Break => {
                if !in_loop {
                    self.errors.push(SemanticError::UnexpectedBreak);
                }
            }
            Node::Continue => {
                if !in_loop {
                    self.errors.push(SemanticError::UnexpectedContinue);
                }
            }
        }
    }

    /// The signature is visible to the body so the function can recurse. A
    /// body with errors leaves the previous signature (or none) in place.
    fn check_definition(&mut self, definition: &FunctionDefinition) {
        let errors_before = self.errors.len();
        let previous = self
            .signatures
            .insert(definition.name.clone(), definition.params.len());
        let outer = std::mem::replace(
            &mut self.initialized,
            definition.params.iter().cloned().collect(),
        );

        self.check_node(&definition.body, false, true);

        self.initialized = outer;
        if self.errors.len() > errors_before {
            match previous {
                Some(arity) => self.signatures.insert(definition.name.clone(), arity),
                None => self.signatures.remove(&definition.name),
            };
        }
    }

    fn check_builtin_arity(&mut self, builtin: Builtin, got: usize) {
        let name = builtin.name().to_string();
        let Some(expected) = self.arity(&name) else {
            self.errors.push(SemanticError::UnknownBuiltin { name });
            return;
        };
        if got > expected {
            self.errors.push(SemanticError::TooManyArguments { name, expected, got });
        } else if got < expected {
            self.errors.push(SemanticError::TooFewArguments { name, expected, got });
        }
    }
}
