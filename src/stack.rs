use crate::error::*;
use crate::value::Value;

/// The operand stack shared by every activation of one machine.
#[derive(Debug, Default, Clone)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    pub fn new() -> Self { Self { values: Vec::with_capacity(1024) } }

    #[inline(always)]
    pub fn push(&mut self, value: Value) { self.values.push(value); }

    #[inline(always)]
    pub fn pop(&mut self) -> Result<Value, Error> {
        self.values.pop().ok_or(Error::trap(STACK_UNDERFLOW))
    }

    /// Pops `n` values and returns them in the order they were pushed.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, Error> {
        if n > self.values.len() { return Err(Error::trap(STACK_UNDERFLOW)); }
        let mut args = Vec::with_capacity(n);
        for _ in 0..n {
            args.push(self.pop()?);
        }
        args.reverse();
        Ok(args)
    }

    pub fn peek(&self) -> Option<Value> { self.values.last().copied() }
    pub fn len(&self) -> usize { self.values.len() }
    pub fn is_empty(&self) -> bool { self.values.is_empty() }
    pub fn clear(&mut self) { self.values.clear(); }
    pub fn as_slice(&self) -> &[Value] { &self.values }
}
