//! Runtime values.
//!
//! Every number in cxl is a [`Complex`]. Its components are never infinite:
//! constructing one from an infinite component is an overflow or underflow
//! fault. [`Value`] adds the `NONE` sentinel produced by statements that have
//! no value.

use std::fmt;

use crate::ast::BinaryOp;
use crate::error::{EvalResult, RuntimeError};

/// `0.0` as a complex number.
pub const ZERO: Complex = Complex { re: 0.0, im: 0.0 };
/// Result of a false comparison or logical operation. Same as [`ZERO`].
pub const FALSE: Complex = ZERO;
/// Result of a true comparison or logical operation.
pub const TRUE: Complex = Complex { re: 1.0, im: 0.0 };

/// A complex number with finite components.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Complex {
    re: f64,
    im: f64,
}

impl Complex {
    /// Build a number, faulting if a component is infinite.
    pub fn new(re: f64, im: f64) -> EvalResult<Self> {
        Ok(Self {
            re: finite(re)?,
            im: finite(im)?,
        })
    }

    pub fn real(re: f64) -> EvalResult<Self> {
        Self::new(re, 0.0)
    }

    pub fn imaginary(im: f64) -> EvalResult<Self> {
        Self::new(0.0, im)
    }

    pub const fn from_bool(value: bool) -> Self {
        if value {
            TRUE
        } else {
            FALSE
        }
    }

    pub const fn re(&self) -> f64 {
        self.re
    }

    pub const fn im(&self) -> f64 {
        self.im
    }

    /// Only the real part decides; the imaginary part is ignored.
    pub fn is_truthy(&self) -> bool {
        self.re > 0.0
    }

    pub const fn conj(&self) -> Self {
        Self {
            re: self.re,
            im: -self.im,
        }
    }

    pub fn checked_add(self, rhs: Self) -> EvalResult<Self> {
        Self::new(self.re + rhs.re, self.im + rhs.im)
    }

    pub fn checked_sub(self, rhs: Self) -> EvalResult<Self> {
        Self::new(self.re - rhs.re, self.im - rhs.im)
    }

    pub fn checked_mul(self, rhs: Self) -> EvalResult<Self> {
        Self::new(
            self.re * rhs.re - self.im * rhs.im,
            self.re * rhs.im + self.im * rhs.re,
        )
    }

    /// Division by multiplying with the conjugate of the divisor.
    pub fn checked_div(self, rhs: Self) -> EvalResult<Self> {
        if rhs == ZERO {
            return Err(RuntimeError::DivisionByZero);
        }
        let numerator = self.checked_mul(rhs.conj())?;
        let denominator = rhs.re * rhs.re + rhs.im * rhs.im;
        Self::new(numerator.re / denominator, numerator.im / denominator)
    }

    /// Remainder of the real parts; the imaginary part of the result is 0.
    pub fn checked_rem(self, rhs: Self) -> EvalResult<Self> {
        if rhs == ZERO {
            return Err(RuntimeError::DivisionByZero);
        }
        Self::real(self.re % rhs.re)
    }

    /// Real part raised to the real part of `rhs`.
    pub fn checked_pow(self, rhs: Self) -> EvalResult<Self> {
        Self::real(self.re.powf(rhs.re))
    }

    /// Real square root of the real part; the imaginary part is discarded.
    pub fn sqrt(self) -> EvalResult<Self> {
        Self::real(self.re.sqrt())
    }

    /// Apply a binary operator to two numbers.
    pub fn apply(self, op: BinaryOp, rhs: Self) -> EvalResult<Self> {
        match op {
            BinaryOp::Add => self.checked_add(rhs),
            BinaryOp::Subtract => self.checked_sub(rhs),
            BinaryOp::Multiply => self.checked_mul(rhs),
            BinaryOp::Divide => self.checked_div(rhs),
            BinaryOp::Modulo => self.checked_rem(rhs),
            BinaryOp::Power => self.checked_pow(rhs),
            BinaryOp::And => Ok(Self::from_bool(self.is_truthy() && rhs.is_truthy())),
            BinaryOp::Or => Ok(Self::from_bool(self.is_truthy() || rhs.is_truthy())),
            BinaryOp::Less => Ok(Self::from_bool(self.re < rhs.re)),
            BinaryOp::LessOrEqual => Ok(Self::from_bool(self.re <= rhs.re)),
            BinaryOp::Greater => Ok(Self::from_bool(self.re > rhs.re)),
            BinaryOp::GreaterOrEqual => Ok(Self::from_bool(self.re >= rhs.re)),
            BinaryOp::Equal => Ok(Self::from_bool(self == rhs)),
            BinaryOp::NotEqual => Ok(Self::from_bool(self != rhs)),
        }
    }
}

fn finite(component: f64) -> EvalResult<f64> {
    if component == f64::INFINITY {
        Err(RuntimeError::Overflow)
    } else if component == f64::NEG_INFINITY {
        Err(RuntimeError::Underflow)
    } else {
        Ok(component)
    }
}

impl fmt::Display for Complex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.re, self.im) {
            (re, im) if im == 0.0 => write!(f, "{re:?}"),
            (re, im) if re == 0.0 => write!(f, "{im:?}i"),
            (re, im) if im < 0.0 => write!(f, "{re:?}-{:?}i", -im),
            (re, im) => write!(f, "{re:?}+{im:?}i"),
        }
    }
}

/// A number or the `NONE` sentinel.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Number(Complex),
    /// No value: an empty statement, a built-in with no result, or a function
    /// body that ran off its end without producing a number.
    None,
}

impl Value {
    pub fn as_number(&self) -> Option<Complex> {
        match self {
            Value::Number(number) => Some(*number),
            Value::None => None,
        }
    }

    pub fn is_truthy(&self) -> bool {
        matches!(self, Value::Number(number) if number.is_truthy())
    }

    /// Logical negation. `NONE` stays `NONE`.
    pub fn negate(&self) -> Value {
        match self {
            Value::Number(number) => Value::Number(Complex::from_bool(!number.is_truthy())),
            Value::None => Value::None,
        }
    }

    /// Apply a binary operator.
    ///
    /// `NONE` on the left absorbs every operator. `NONE` on the right is an
    /// identity for the arithmetic operators, makes `and` test the left
    /// operand alone, and yields `NONE` for everything else.
    pub fn binary(self, op: BinaryOp, rhs: Value) -> EvalResult<Value> {
        match (self, rhs) {
            (Value::None, _) => Ok(Value::None),
            (Value::Number(lhs), Value::None) => Ok(match op {
                BinaryOp::Add
                | BinaryOp::Subtract
                | BinaryOp::Multiply
                | BinaryOp::Divide
                | BinaryOp::Modulo
                | BinaryOp::Power => Value::Number(lhs),
                BinaryOp::And => Value::Number(Complex::from_bool(lhs.is_truthy())),
                _ => Value::None,
            }),
            (Value::Number(lhs), Value::Number(rhs)) => lhs.apply(op, rhs).map(Value::Number),
        }
    }
}

impl From<Complex> for Value {
    fn from(number: Complex) -> Self {
        Value::Number(number)
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(number) => write!(f, "{number}"),
            Value::None => write!(f, "none"),
        }
    }
}
