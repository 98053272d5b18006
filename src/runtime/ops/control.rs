//! Control flow operations
//!
//! Branches do not jump. They unwind the operand stack to the target label's
//! entry height, keeping the label's arity of values, and return a
//! [`BlockEnd`] that the enclosing blocks propagate outward until the target
//! absorbs it.

use super::*;
use crate::runtime::control::{BlockEnd, LabelStack};

/// Shared by br, br_if and br_table
///
/// 1. Look up the target label for its arity and entry height
/// 2. Pop arity values
/// 3. Drop everything above the entry height
/// 4. Push the kept values back
/// 5. Signal Branch(label_idx)
fn perform_branch(stack: &mut Stack, label_stack: &LabelStack, label_idx: u32) -> Result<BlockEnd, RuntimeError> {
    let label = label_stack
        .get(label_idx)
        .ok_or(RuntimeError::InvalidLabel(label_idx))?;

    let values = stack.pop_n(label.arity())?;
    stack.truncate(label.stack_height);
    stack.push_all(values);

    Ok(BlockEnd::Branch(label_idx))
}

/// br l: unconditional branch
pub fn br(stack: &mut Stack, label_stack: &LabelStack, label_idx: u32) -> Result<BlockEnd, RuntimeError> {
    perform_branch(stack, label_stack, label_idx)
}

/// br_if l: pops an i32 condition and branches if it is non-zero
pub fn br_if(stack: &mut Stack, label_stack: &LabelStack, label_idx: u32) -> Result<BlockEnd, RuntimeError> {
    let condition = stack.pop_i32()?;
    if condition != 0 {
        perform_branch(stack, label_stack, label_idx)
    } else {
        Ok(BlockEnd::Normal)
    }
}

/// br_table l* lN
///
/// Pops an i32 index, read as unsigned. Branches to `labels[index]`, or to
/// `default` when the index is out of range.
pub fn br_table(
    stack: &mut Stack,
    label_stack: &LabelStack,
    labels: &[u32],
    default: u32,
) -> Result<BlockEnd, RuntimeError> {
    let index = stack.pop_i32()? as u32;
    let target = labels.get(index as usize).copied().unwrap_or(default);
    perform_branch(stack, label_stack, target)
}

/// return: unwinds every block of the current function
pub fn return_op() -> Result<BlockEnd, RuntimeError> {
    Ok(BlockEnd::Return)
}

/// unreachable: traps unconditionally
pub fn unreachable() -> Result<BlockEnd, RuntimeError> {
    Err(RuntimeError::Unreachable)
}

#[cfg(test)]
mod tests {
    use crate::parser::instruction::{BlockType, Instruction, NumericOp};
    use crate::parser::module::ValueType;
    use crate::runtime::test_utils::test::ExecutorTest;
    use crate::runtime::Value;

    fn i32c(value: i32) -> Instruction {
        Instruction::I32Const { value }
    }

    fn block(block_type: BlockType, body: Vec<Instruction>) -> Instruction {
        Instruction::Block { block_type, body }
    }

    const I32: BlockType = BlockType::Value(ValueType::I32);

    // ============================================================================
    // Blocks and branches
    // ============================================================================

    #[test]
    fn block_empty() {
        ExecutorTest::new()
            .inst(block(BlockType::Empty, vec![]))
            .inst(i32c(42))
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(42)]);
    }

    #[test]
    fn block_with_value() {
        ExecutorTest::new()
            .inst(block(I32, vec![i32c(42)]))
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(42)]);
    }

    #[test]
    fn br_skips_rest_of_block() {
        ExecutorTest::new()
            .inst(block(
                I32,
                vec![i32c(42), Instruction::Br { label_idx: 0 }, Instruction::Drop, i32c(99)],
            ))
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(42)]);
    }

    #[test]
    fn br_discards_values_pushed_inside() {
        ExecutorTest::new()
            .inst(i32c(1))
            .inst(block(I32, vec![i32c(2), i32c(3), Instruction::Br { label_idx: 0 }]))
            .inst(Instruction::Numeric(NumericOp::I32Add))
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(4)]);
    }

    #[test]
    fn br_nested() {
        ExecutorTest::new()
            .inst(block(
                I32,
                vec![
                    i32c(42),
                    block(BlockType::Empty, vec![Instruction::Br { label_idx: 1 }, i32c(99)]),
                    Instruction::Drop,
                    i32c(88),
                ],
            ))
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(42)]);
    }

    #[test]
    fn br_if_taken_and_not_taken() {
        for (condition, expected) in [(1, 10), (0, 20)] {
            ExecutorTest::new()
                .inst(block(
                    I32,
                    vec![
                        i32c(10),
                        i32c(condition),
                        Instruction::BrIf { label_idx: 0 },
                        Instruction::Drop,
                        i32c(20),
                    ],
                ))
                .returns(vec![ValueType::I32])
                .expect_stack(vec![Value::I32(expected)]);
        }
    }

    #[test]
    fn br_to_function_body_returns() {
        ExecutorTest::new()
            .inst(i32c(5))
            .inst(Instruction::Br { label_idx: 0 })
            .inst(Instruction::Unreachable)
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(5)]);
    }

    #[test]
    fn br_invalid_label() {
        ExecutorTest::new()
            .inst(Instruction::Br { label_idx: 4 })
            .expect_error("Invalid label: 4");
    }

    // ============================================================================
    // Loops
    // ============================================================================

    #[test]
    fn loop_falls_through() {
        ExecutorTest::new()
            .inst(Instruction::Loop {
                block_type: I32,
                body: vec![i32c(7)],
            })
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(7)]);
    }

    #[test]
    fn loop_counts_down() {
        // local 0 counts from 5 to 0; local 1 counts iterations
        ExecutorTest::new()
            .local(ValueType::I32)
            .local(ValueType::I32)
            .inst(i32c(5))
            .inst(Instruction::LocalSet { local_idx: 0 })
            .inst(Instruction::Loop {
                block_type: BlockType::Empty,
                body: vec![
                    Instruction::LocalGet { local_idx: 1 },
                    i32c(1),
                    Instruction::Numeric(NumericOp::I32Add),
                    Instruction::LocalSet { local_idx: 1 },
                    Instruction::LocalGet { local_idx: 0 },
                    i32c(1),
                    Instruction::Numeric(NumericOp::I32Sub),
                    Instruction::LocalTee { local_idx: 0 },
                    Instruction::BrIf { label_idx: 0 },
                ],
            })
            .inst(Instruction::LocalGet { local_idx: 1 })
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(5)]);
    }

    // ============================================================================
    // If
    // ============================================================================

    fn if_else(condition: i32, else_branch: Option<Vec<Instruction>>) -> ExecutorTest {
        ExecutorTest::new()
            .inst(i32c(0))
            .inst(i32c(condition))
            .inst(Instruction::If {
                block_type: BlockType::Empty,
                then_branch: vec![Instruction::Drop, i32c(1)],
                else_branch,
            })
            .returns(vec![ValueType::I32])
    }

    #[test]
    fn if_without_else() {
        if_else(1, None).expect_stack(vec![Value::I32(1)]);
        if_else(0, None).expect_stack(vec![Value::I32(0)]);
    }

    #[test]
    fn if_with_else() {
        let else_branch = Some(vec![Instruction::Drop, i32c(2)]);
        if_else(7, else_branch.clone()).expect_stack(vec![Value::I32(1)]);
        if_else(0, else_branch).expect_stack(vec![Value::I32(2)]);
    }

    #[test]
    fn if_with_value_and_br() {
        ExecutorTest::new()
            .inst(i32c(1))
            .inst(Instruction::If {
                block_type: I32,
                then_branch: vec![i32c(3), Instruction::Br { label_idx: 0 }, Instruction::Unreachable],
                else_branch: Some(vec![i32c(4)]),
            })
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(3)]);
    }

    // ============================================================================
    // Return, br_table, unreachable
    // ============================================================================

    #[test]
    fn return_from_nested_blocks() {
        ExecutorTest::new()
            .inst(block(
                BlockType::Empty,
                vec![Instruction::Loop {
                    block_type: BlockType::Empty,
                    body: vec![i32c(9), Instruction::Return],
                }],
            ))
            .inst(Instruction::Unreachable)
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(9)]);
    }

    fn br_table_case(index: i32) -> ExecutorTest {
        // three nested blocks; each exit pushes a distinct marker
        ExecutorTest::new()
            .inst(block(
                I32,
                vec![
                    block(
                        BlockType::Empty,
                        vec![
                            block(
                                BlockType::Empty,
                                vec![
                                    i32c(300),
                                    i32c(index),
                                    Instruction::BrTable {
                                        labels: vec![0, 1],
                                        default: 2,
                                    },
                                ],
                            ),
                            i32c(100),
                            Instruction::Br { label_idx: 1 },
                        ],
                    ),
                    i32c(200),
                ],
            ))
            .returns(vec![ValueType::I32])
    }

    #[test]
    fn br_table_selects_target() {
        br_table_case(0).expect_stack(vec![Value::I32(100)]);
        br_table_case(1).expect_stack(vec![Value::I32(200)]);
    }

    #[test]
    fn br_table_default() {
        // the default target carries the value pushed before the index
        br_table_case(2).expect_stack(vec![Value::I32(300)]);
        br_table_case(-1).expect_stack(vec![Value::I32(300)]);
    }

    #[test]
    fn unreachable_traps() {
        ExecutorTest::new()
            .inst(i32c(1))
            .inst(Instruction::Unreachable)
            .expect_error("Unreachable executed");
        ExecutorTest::new()
            .inst(block(BlockType::Empty, vec![Instruction::Unreachable]))
            .expect_error("Unreachable executed");
    }
}
