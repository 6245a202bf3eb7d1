//! Abstract Syntax Tree for cxl.

use std::fmt;
use std::rc::Rc;

use crate::value::Complex;

/// A node of the syntax tree. Each node owns its children.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Number literal
    Literal(Complex),
    /// Variable reference
    Identifier(String),
    /// Logical negation `!expr`
    Negation(Box<Node>),
    /// Binary operation
    Binary {
        op: BinaryOp,
        left: Box<Node>,
        right: Box<Node>,
    },
    /// `target = value`
    Assignment { target: String, value: Box<Node> },
    /// Statements run in order
    InstructionList(Vec<Node>),
    /// `if (condition) {...} else {...}`; an `else if` chain nests another
    /// conditional in `otherwise`.
    Conditional {
        condition: Box<Node>,
        then_block: Box<Node>,
        otherwise: Option<Box<Node>>,
    },
    /// `for (init; condition; step) {...}`
    Loop {
        init: Box<Node>,
        condition: Box<Node>,
        step: Box<Node>,
        body: Box<Node>,
    },
    /// `fun name(params) {...}`
    FunctionDefinition(Rc<FunctionDefinition>),
    /// Call of a user-defined function
    Call { name: String, arguments: Vec<Node> },
    /// Call of a built-in function
    BuiltinCall {
        builtin: Builtin,
        arguments: Vec<Node>,
    },
    /// `return [value]`
    Return(Option<Box<Node>>),
    Break,
    Continue,
    NoOp,
    EndOfInput,
}

impl Node {
    pub fn binary(op: BinaryOp, left: Node, right: Node) -> Self {
        Node::Binary {
            op,
            left: Box::new(left),
            right: Box::new(right),
        }
    }

    /// Variable bound by this node when it is an assignment.
    pub fn assigned_name(&self) -> Option<&str> {
        match self {
            Node::Assignment { target, .. } => Some(target),
            _ => None,
        }
    }

    /// Whether the node's text ends with a closing brace.
    pub fn ends_with_block(&self) -> bool {
        matches!(
            self,
            Node::Conditional { .. } | Node::Loop { .. } | Node::FunctionDefinition(_)
        )
    }
}

/// A user-defined function.
#[derive(Debug, Clone, PartialEq)]
pub struct FunctionDefinition {
    /// Function name
    pub name: String,
    /// Parameter names, bound positionally
    pub params: Vec<String>,
    /// Function body (an instruction list)
    pub body: Node,
}

/// Binary operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Subtract,
    Multiply,
    Divide,
    Modulo,
    Power,
    And,
    Or,
    Less,
    LessOrEqual,
    Greater,
    GreaterOrEqual,
    Equal,
    NotEqual,
}

impl BinaryOp {
    /// Operator spelled by an operator token's lexeme.
    pub fn from_lexeme(lexeme: &str) -> Option<Self> {
        let op = match lexeme {
            "+" => BinaryOp::Add,
            "-" => BinaryOp::Subtract,
            "*" => BinaryOp::Multiply,
            "/" => BinaryOp::Divide,
            "%" => BinaryOp::Modulo,
            "^" => BinaryOp::Power,
            "&&" => BinaryOp::And,
            "||" => BinaryOp::Or,
            "<" => BinaryOp::Less,
            "<=" => BinaryOp::LessOrEqual,
            ">" => BinaryOp::Greater,
            ">=" => BinaryOp::GreaterOrEqual,
            "==" => BinaryOp::Equal,
            "!=" => BinaryOp::NotEqual,
            _ => return None,
        };
        Some(op)
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            BinaryOp::Add => "+",
            BinaryOp::Subtract => "-",
            BinaryOp::Multiply => "*",
            BinaryOp::Divide => "/",
            BinaryOp::Modulo => "%",
            BinaryOp::Power => "^",
            BinaryOp::And => "&&",
            BinaryOp::Or => "||",
            BinaryOp::Less => "<",
            BinaryOp::LessOrEqual => "<=",
            BinaryOp::Greater => ">",
            BinaryOp::GreaterOrEqual => ">=",
            BinaryOp::Equal => "==",
            BinaryOp::NotEqual => "!=",
        }
    }
}

impl fmt::Display for BinaryOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Functions provided by the interpreter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    Print,
    Println,
    Sqrt,
}

impl Builtin {
    pub const ALL: [Builtin; 3] = [Builtin::Print, Builtin::Println, Builtin::Sqrt];

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|builtin| builtin.name() == name)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Builtin::Print => "print",
            Builtin::Println => "println",
            Builtin::Sqrt => "sqrt",
        }
    }

    /// Number of arguments the built-in takes.
    pub fn arity(&self) -> usize {
        1
    }
}
