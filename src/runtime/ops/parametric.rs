//! Parametric operations

use super::*;

/// drop: discards the top value
pub fn drop(stack: &mut Stack) -> Result<(), RuntimeError> {
    stack.pop()?;
    Ok(())
}

/// select
/// 1. Pop the i32 condition c
/// 2. Pop val2, then val1
/// 3. Push val1 if c is non-zero, else val2
///
/// The typed form shares this implementation.
pub fn select(stack: &mut Stack) -> Result<(), RuntimeError> {
    let condition = stack.pop_i32()?;
    let val2 = stack.pop()?;
    let val1 = stack.pop()?;
    if val1.typ() != val2.typ() {
        return Err(RuntimeError::TypeMismatch {
            expected: val1.typ().to_string(),
            actual: val2.typ().to_string(),
        });
    }
    stack.push(if condition != 0 { val1 } else { val2 });
    Ok(())
}

#[cfg(test)]
mod tests {
    use crate::parser::instruction::Instruction;
    use crate::parser::module::ValueType;
    use crate::runtime::test_utils::test::ExecutorTest;
    use crate::runtime::Value;

    #[test]
    fn drop_single_value() {
        ExecutorTest::new()
            .inst(Instruction::I32Const { value: 42 })
            .inst(Instruction::Drop)
            .inst(Instruction::I32Const { value: 100 })
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(100)]);
    }

    #[test]
    fn drop_empty_stack() {
        ExecutorTest::new()
            .inst(Instruction::Drop)
            .expect_error("Stack underflow");
    }

    #[test]
    fn select_picks_by_condition() {
        for (condition, expected) in [(1, 10), (0, 20), (-5, 10)] {
            ExecutorTest::new()
                .inst(Instruction::I32Const { value: 10 })
                .inst(Instruction::I32Const { value: 20 })
                .inst(Instruction::I32Const { value: condition })
                .inst(Instruction::Select)
                .returns(vec![ValueType::I32])
                .expect_stack(vec![Value::I32(expected)]);
        }
    }

    #[test]
    fn typed_select() {
        ExecutorTest::new()
            .inst(Instruction::F64Const { value: 1.0 })
            .inst(Instruction::F64Const { value: 2.0 })
            .inst(Instruction::I32Const { value: 0 })
            .inst(Instruction::SelectTyped {
                val_types: vec![ValueType::F64],
            })
            .returns(vec![ValueType::F64])
            .expect_stack(vec![Value::F64(2.0)]);
    }

    #[test]
    fn select_operands_must_agree() {
        ExecutorTest::new()
            .inst(Instruction::I32Const { value: 1 })
            .inst(Instruction::I64Const { value: 2 })
            .inst(Instruction::I32Const { value: 1 })
            .inst(Instruction::Select)
            .expect_error("Type mismatch");
    }
}
