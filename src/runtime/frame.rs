//! Call frame
//!
//! Holds the locals of one active function invocation: the arguments in
//! slots `0..argc`, followed by one typed zero per declared local.

use super::{RuntimeError, Value};
use crate::parser::module::ValueType;

#[derive(Debug, Default)]
pub struct Frame {
    locals: Vec<Value>,
}

impl Frame {
    pub fn new(args: Vec<Value>, local_types: impl IntoIterator<Item = ValueType>) -> Self {
        let mut locals = args;
        locals.extend(local_types.into_iter().map(Value::default_for));
        Frame { locals }
    }

    pub fn get(&self, idx: u32) -> Result<&Value, RuntimeError> {
        self.locals
            .get(idx as usize)
            .ok_or(RuntimeError::LocalIndexOutOfBounds(idx))
    }

    pub fn set(&mut self, idx: u32, value: Value) -> Result<(), RuntimeError> {
        let slot = self
            .locals
            .get_mut(idx as usize)
            .ok_or(RuntimeError::LocalIndexOutOfBounds(idx))?;
        *slot = value;
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.locals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.locals.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn args_then_typed_zeros() {
        let mut frame = Frame::new(vec![Value::I32(7)], [ValueType::I64, ValueType::F64]);
        assert_eq!(frame.len(), 3);
        assert_eq!(frame.get(0).unwrap(), &Value::I32(7));
        assert_eq!(frame.get(1).unwrap(), &Value::I64(0));
        assert_eq!(frame.get(2).unwrap(), &Value::F64(0.0));

        frame.set(1, Value::I64(9)).unwrap();
        assert_eq!(frame.get(1).unwrap(), &Value::I64(9));
        assert!(matches!(frame.get(3), Err(RuntimeError::LocalIndexOutOfBounds(3))));
    }
}
