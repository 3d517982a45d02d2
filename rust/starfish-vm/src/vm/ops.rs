//! Arithmetic and comparison on stack values.

use super::FaultKind;
use starfish_core::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
}

impl BinaryOp {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '+' => Some(BinaryOp::Add),
            '-' => Some(BinaryOp::Sub),
            '*' => Some(BinaryOp::Mul),
            ',' => Some(BinaryOp::Div),
            '%' => Some(BinaryOp::Mod),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Equal,
    Greater,
    Less,
}

impl Comparison {
    pub fn from_char(c: char) -> Option<Self> {
        match c {
            '=' => Some(Comparison::Equal),
            ')' => Some(Comparison::Greater),
            '(' => Some(Comparison::Less),
            _ => None,
        }
    }
}

/// Apply `op` with `lhs` being the value that was second from the top.
///
/// Two integers stay integers while the result is exact; overflow and
/// inexact quotients fall back to float arithmetic.
pub(crate) fn arith(op: BinaryOp, lhs: Value, rhs: Value) -> Result<Value, FaultKind> {
    if matches!(op, BinaryOp::Div | BinaryOp::Mod) && rhs.is_zero() {
        return Err(FaultKind::DivisionByZero);
    }

    fn int_op(op: BinaryOp, x: i64, y: i64) -> Option<i64> {
        match op {
            BinaryOp::Add => x.checked_add(y),
            BinaryOp::Sub => x.checked_sub(y),
            BinaryOp::Mul => x.checked_mul(y),
            BinaryOp::Div => match x.checked_rem(y) {
                Some(0) => x.checked_div(y),
                _ => None,
            },
            BinaryOp::Mod => x.checked_rem_euclid(y),
        }
    }

    fn float_op(op: BinaryOp, x: f64, y: f64) -> f64 {
        match op {
            BinaryOp::Add => x + y,
            BinaryOp::Sub => x - y,
            BinaryOp::Mul => x * y,
            BinaryOp::Div => x / y,
            BinaryOp::Mod => x.rem_euclid(y),
        }
    }

    if let (Value::Int(x), Value::Int(y)) = (lhs, rhs) {
        if let Some(n) = int_op(op, x, y) {
            return Ok(Value::Int(n));
        }
    }
    Ok(Value::Float(float_op(op, lhs.as_float(), rhs.as_float())))
}

/// `1` when the relation holds, otherwise `0`. NaN never compares.
pub(crate) fn compare(op: Comparison, lhs: Value, rhs: Value) -> Value {
    let holds = match op {
        Comparison::Equal => lhs.num_eq(&rhs),
        Comparison::Greater => lhs.num_cmp(&rhs) == Some(Ordering::Greater),
        Comparison::Less => lhs.num_cmp(&rhs) == Some(Ordering::Less),
    };
    Value::Int(holds as i64)
}
