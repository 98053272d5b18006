//! Variable operations
//!
//! Locals live in the current [`Frame`]; globals are shared cells owned by
//! the instance (or the host, when imported).

use super::*;
use crate::runtime::frame::Frame;
use crate::runtime::store::Global;

/// local.get x: pushes a copy of local x
pub fn local_get(stack: &mut Stack, frame: &Frame, local_idx: u32) -> Result<(), RuntimeError> {
    let value = frame.get(local_idx)?.clone();
    stack.push(value);
    Ok(())
}

/// local.set x: pops into local x
pub fn local_set(stack: &mut Stack, frame: &mut Frame, local_idx: u32) -> Result<(), RuntimeError> {
    let value = stack.pop()?;
    frame.set(local_idx, value)
}

/// local.tee x: like local.set, but leaves the value on the stack
pub fn local_tee(stack: &mut Stack, frame: &mut Frame, local_idx: u32) -> Result<(), RuntimeError> {
    let value = stack.pop()?;
    frame.set(local_idx, value.clone())?;
    stack.push(value);
    Ok(())
}

/// global.get x
pub fn global_get(stack: &mut Stack, global: &Global) -> Result<(), RuntimeError> {
    stack.push(global.get());
    Ok(())
}

/// global.set x
///
/// Mutability is not re-checked here; the host-facing [`Global::set`] is the
/// checked path.
pub fn global_set(stack: &mut Stack, global: &Global) -> Result<(), RuntimeError> {
    let value = stack.pop()?;
    global.set_unchecked(value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::parser::instruction::{Instruction, NumericOp};
    use crate::parser::module::{GlobalType, Mutability, ValueType};
    use crate::runtime::test_utils::test::ExecutorTest;
    use crate::runtime::Value;

    #[test]
    fn local_get_reads_argument() {
        ExecutorTest::new()
            .arg(Value::I32(7))
            .inst(Instruction::LocalGet { local_idx: 0 })
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(7)]);
    }

    #[test]
    fn declared_locals_start_at_typed_zero() {
        ExecutorTest::new()
            .arg(Value::I32(7))
            .local(ValueType::I64)
            .inst(Instruction::LocalGet { local_idx: 1 })
            .returns(vec![ValueType::I64])
            .expect_stack(vec![Value::I64(0)]);
    }

    #[test]
    fn local_set_and_tee() {
        ExecutorTest::new()
            .local(ValueType::I32)
            .inst(Instruction::I32Const { value: 5 })
            .inst(Instruction::LocalTee { local_idx: 0 })
            .inst(Instruction::LocalGet { local_idx: 0 })
            .inst(Instruction::Numeric(NumericOp::I32Add))
            .inst(Instruction::LocalSet { local_idx: 0 })
            .inst(Instruction::LocalGet { local_idx: 0 })
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(10)]);
    }

    #[test]
    fn local_index_out_of_bounds() {
        ExecutorTest::new()
            .inst(Instruction::LocalGet { local_idx: 3 })
            .expect_error("Local variable index out of bounds: 3");
    }

    #[test]
    fn globals_read_and_write() {
        let ty = GlobalType {
            value_type: ValueType::I32,
            mutability: Mutability::Var,
        };
        ExecutorTest::new()
            .global(ty, Value::I32(41))
            .inst(Instruction::GlobalGet { global_idx: 0 })
            .inst(Instruction::I32Const { value: 1 })
            .inst(Instruction::Numeric(NumericOp::I32Add))
            .inst(Instruction::GlobalSet { global_idx: 0 })
            .inst(Instruction::GlobalGet { global_idx: 0 })
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(42)]);
    }

    #[test]
    fn unknown_global() {
        ExecutorTest::new()
            .inst(Instruction::GlobalGet { global_idx: 0 })
            .expect_error("Global variable index out of bounds: 0");
    }
}
