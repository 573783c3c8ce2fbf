use crate::error::*;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt::{Display, Formatter};

#[repr(u8)]
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValType {
    I32 = 0x7f,
    I64 = 0x7e,
    F32 = 0x7d,
    F64 = 0x7c,
}

#[inline]
pub fn val_type_from_byte(byte: u8) -> Option<ValType> {
    match byte {
        0x7f => Some(ValType::I32),
        0x7e => Some(ValType::I64),
        0x7d => Some(ValType::F32),
        0x7c => Some(ValType::F64),
        _ => None,
    }
}

impl Display for ValType {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            ValType::I32 => "i32",
            ValType::I64 => "i64",
            ValType::F32 => "f32",
            ValType::F64 => "f64",
        })
    }
}

/// A single operand. Integers and floats never mix in arithmetic; comparisons
/// produce `I32(0)` or `I32(1)`.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Value {
    I32(i32),
    F64(f64),
}

impl Default for Value {
    fn default() -> Self { Value::I32(0) }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self { Value::I32(v) }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self { Value::F64(v) }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self { Value::I32(v as i32) }
}

impl Value {
    /// The zero of a declared local type. Only the two engine types have a
    /// runtime representation.
    pub fn zero(ty: ValType) -> Result<Self, Error> {
        match ty {
            ValType::I32 => Ok(Value::I32(0)),
            ValType::F64 => Ok(Value::F64(0.0)),
            ValType::I64 | ValType::F32 => Err(Error::trap(TYPE_MISMATCH)),
        }
    }

    pub fn ty(self) -> ValType {
        match self {
            Value::I32(_) => ValType::I32,
            Value::F64(_) => ValType::F64,
        }
    }

    #[inline]
    pub fn as_i32(self) -> Result<i32, Error> {
        match self {
            Value::I32(v) => Ok(v),
            Value::F64(_) => Err(Error::trap(TYPE_MISMATCH)),
        }
    }

    #[inline]
    pub fn as_f64(self) -> Result<f64, Error> {
        match self {
            Value::F64(v) => Ok(v),
            Value::I32(_) => Err(Error::trap(TYPE_MISMATCH)),
        }
    }

    #[inline]
    pub fn is_truthy(self) -> bool {
        match self {
            Value::I32(v) => v != 0,
            Value::F64(v) => v != 0.0,
        }
    }

    pub fn add(self, rhs: Value) -> Result<Value, Error> {
        match (self, rhs) {
            (Value::I32(a), Value::I32(b)) => Ok(Value::I32(a.wrapping_add(b))),
            (Value::F64(a), Value::F64(b)) => Ok(Value::F64(a + b)),
            _ => Err(Error::trap(TYPE_MISMATCH)),
        }
    }

    pub fn sub(self, rhs: Value) -> Result<Value, Error> {
        match (self, rhs) {
            (Value::I32(a), Value::I32(b)) => Ok(Value::I32(a.wrapping_sub(b))),
            (Value::F64(a), Value::F64(b)) => Ok(Value::F64(a - b)),
            _ => Err(Error::trap(TYPE_MISMATCH)),
        }
    }

    pub fn mul(self, rhs: Value) -> Result<Value, Error> {
        match (self, rhs) {
            (Value::I32(a), Value::I32(b)) => Ok(Value::I32(a.wrapping_mul(b))),
            (Value::F64(a), Value::F64(b)) => Ok(Value::F64(a * b)),
            _ => Err(Error::trap(TYPE_MISMATCH)),
        }
    }

    pub fn div(self, rhs: Value) -> Result<Value, Error> {
        match (self, rhs) {
            (Value::I32(_), Value::I32(0)) => Err(Error::trap(DIVIDE_BY_ZERO)),
            (Value::I32(i32::MIN), Value::I32(-1)) => Err(Error::trap(INTEGER_OVERFLOW)),
            (Value::I32(a), Value::I32(b)) => Ok(Value::I32(a / b)),
            (Value::F64(a), Value::F64(b)) => Ok(Value::F64(a / b)),
            _ => Err(Error::trap(TYPE_MISMATCH)),
        }
    }

    pub fn compare_eq(self, rhs: Value) -> Result<Value, Error> { self.compare(rhs, |o| o == Some(Ordering::Equal)) }
    pub fn compare_ne(self, rhs: Value) -> Result<Value, Error> { self.compare(rhs, |o| o != Some(Ordering::Equal)) }
    pub fn compare_lt(self, rhs: Value) -> Result<Value, Error> { self.compare(rhs, |o| o == Some(Ordering::Less)) }
    pub fn compare_gt(self, rhs: Value) -> Result<Value, Error> { self.compare(rhs, |o| o == Some(Ordering::Greater)) }
    pub fn compare_le(self, rhs: Value) -> Result<Value, Error> {
        self.compare(rhs, |o| matches!(o, Some(Ordering::Less | Ordering::Equal)))
    }
    pub fn compare_ge(self, rhs: Value) -> Result<Value, Error> {
        self.compare(rhs, |o| matches!(o, Some(Ordering::Greater | Ordering::Equal)))
    }

    // NaN compares unordered, so every predicate but `ne` is false for it.
    fn compare(self, rhs: Value, pred: impl Fn(Option<Ordering>) -> bool) -> Result<Value, Error> {
        let ord = match (self, rhs) {
            (Value::I32(a), Value::I32(b)) => Some(a.cmp(&b)),
            (Value::F64(a), Value::F64(b)) => a.partial_cmp(&b),
            _ => return Err(Error::trap(TYPE_MISMATCH)),
        };
        Ok(Value::from(pred(ord)))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::I32(v) => write!(f, "{} (i32)", v),
            Value::F64(v) => write!(f, "{} (f64)", v),
        }
    }
}
