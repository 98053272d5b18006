//! Operand stack

use super::{RuntimeError, Value};
use crate::parser::module::ValueType;

#[derive(Debug, Default)]
pub struct Stack {
    values: Vec<Value>,
}

impl Stack {
    pub fn new() -> Self {
        Stack { values: Vec::new() }
    }

    pub fn push(&mut self, value: Value) {
        self.values.push(value);
    }

    pub fn push_all(&mut self, values: impl IntoIterator<Item = Value>) {
        self.values.extend(values);
    }

    pub fn pop(&mut self) -> Result<Value, RuntimeError> {
        self.values.pop().ok_or(RuntimeError::StackUnderflow)
    }

    /// Pops `n` values, returned in push order.
    pub fn pop_n(&mut self, n: usize) -> Result<Vec<Value>, RuntimeError> {
        if n > self.values.len() {
            return Err(RuntimeError::StackUnderflow);
        }
        let at = self.values.len() - n;
        Ok(self.values.split_off(at))
    }

    /// Pop a value and check its type
    pub fn pop_typed(&mut self, expected_type: ValueType) -> Result<Value, RuntimeError> {
        let value = self.pop()?;
        if value.typ() != expected_type {
            return Err(RuntimeError::TypeMismatch {
                expected: expected_type.to_string(),
                actual: value.typ().to_string(),
            });
        }
        Ok(value)
    }

    pub fn pop_i32(&mut self) -> Result<i32, RuntimeError> {
        match self.pop()? {
            Value::I32(v) => Ok(v),
            other => Err(mismatch(ValueType::I32, &other)),
        }
    }

    pub fn pop_i64(&mut self) -> Result<i64, RuntimeError> {
        match self.pop()? {
            Value::I64(v) => Ok(v),
            other => Err(mismatch(ValueType::I64, &other)),
        }
    }

    pub fn pop_f32(&mut self) -> Result<f32, RuntimeError> {
        match self.pop()? {
            Value::F32(v) => Ok(v),
            other => Err(mismatch(ValueType::F32, &other)),
        }
    }

    pub fn pop_f64(&mut self) -> Result<f64, RuntimeError> {
        match self.pop()? {
            Value::F64(v) => Ok(v),
            other => Err(mismatch(ValueType::F64, &other)),
        }
    }

    /// Current stack depth
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Drops everything above `height`.
    pub fn truncate(&mut self, height: usize) {
        self.values.truncate(height);
    }

    pub fn peek(&self) -> Option<&Value> {
        self.values.last()
    }
}

fn mismatch(expected: ValueType, actual: &Value) -> RuntimeError {
    RuntimeError::TypeMismatch {
        expected: expected.to_string(),
        actual: actual.typ().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_pop() {
        let mut stack = Stack::new();
        stack.push(Value::I32(42));
        stack.push(Value::I64(100));

        assert_eq!(stack.len(), 2);
        assert_eq!(stack.pop().unwrap(), Value::I64(100));
        assert_eq!(stack.pop().unwrap(), Value::I32(42));
        assert!(matches!(stack.pop(), Err(RuntimeError::StackUnderflow)));
    }

    #[test]
    fn test_pop_n_keeps_order() {
        let mut stack = Stack::new();
        stack.push_all(vec![Value::I32(1), Value::I32(2), Value::I32(3)]);
        assert_eq!(stack.pop_n(2).unwrap(), vec![Value::I32(2), Value::I32(3)]);
        assert_eq!(stack.len(), 1);
        assert!(stack.pop_n(2).is_err());
    }

    #[test]
    fn test_typed_pops() {
        let mut stack = Stack::new();
        stack.push(Value::I32(42));
        assert_eq!(stack.pop_i32().unwrap(), 42);

        stack.push(Value::F64(2.5));
        assert_eq!(stack.pop_f64().unwrap(), 2.5);

        stack.push(Value::I32(1));
        assert!(matches!(stack.pop_i64(), Err(RuntimeError::TypeMismatch { .. })));

        stack.push(Value::I32(42));
        assert!(stack.pop_typed(ValueType::I64).is_err());
    }

    #[test]
    fn test_truncate_and_peek() {
        let mut stack = Stack::new();
        assert!(stack.peek().is_none());
        stack.push_all(vec![Value::I32(1), Value::I32(2), Value::I32(3)]);
        stack.truncate(1);
        assert_eq!(stack.peek(), Some(&Value::I32(1)));
        assert_eq!(stack.len(), 1);
    }
}
