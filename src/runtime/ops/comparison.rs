//! Test and comparison operations
//!
//! Every comparison pushes an i32: 1 when the relation holds, 0 otherwise.
//! Unsigned variants reinterpret both operands before comparing. Float
//! comparisons with a NaN operand are false, except `ne` which is true.

use super::{RuntimeError, Stack, Value};

macro_rules! relop {
    ($(#[$doc:meta])* $name:ident, $pop:ident, |$a:ident, $b:ident| $cmp:expr) => {
        $(#[$doc])*
        pub fn $name(stack: &mut Stack) -> Result<(), RuntimeError> {
            let $b = stack.$pop()?;
            let $a = stack.$pop()?;
            stack.push(Value::I32(($cmp) as i32));
            Ok(())
        }
    };
}

/// i32.eqz: 1 if the operand is zero
pub fn i32_eqz(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_i32()?;
    stack.push(Value::I32((c1 == 0) as i32));
    Ok(())
}

/// i64.eqz: 1 if the operand is zero; the result is an i32
pub fn i64_eqz(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_i64()?;
    stack.push(Value::I32((c1 == 0) as i32));
    Ok(())
}

relop!(
    /// i32.eq
    i32_eq, pop_i32, |a, b| a == b
);
relop!(
    /// i32.ne
    i32_ne, pop_i32, |a, b| a != b
);
relop!(
    /// i32.lt_s
    i32_lt_s, pop_i32, |a, b| a < b
);
relop!(
    /// i32.lt_u
    i32_lt_u, pop_i32, |a, b| (a as u32) < (b as u32)
);
relop!(
    /// i32.gt_s
    i32_gt_s, pop_i32, |a, b| a > b
);
relop!(
    /// i32.gt_u
    i32_gt_u, pop_i32, |a, b| (a as u32) > (b as u32)
);
relop!(
    /// i32.le_s
    i32_le_s, pop_i32, |a, b| a <= b
);
relop!(
    /// i32.le_u
    i32_le_u, pop_i32, |a, b| (a as u32) <= (b as u32)
);
relop!(
    /// i32.ge_s
    i32_ge_s, pop_i32, |a, b| a >= b
);
relop!(
    /// i32.ge_u
    i32_ge_u, pop_i32, |a, b| (a as u32) >= (b as u32)
);

relop!(
    /// i64.eq
    i64_eq, pop_i64, |a, b| a == b
);
relop!(
    /// i64.ne
    i64_ne, pop_i64, |a, b| a != b
);
relop!(
    /// i64.lt_s
    i64_lt_s, pop_i64, |a, b| a < b
);
relop!(
    /// i64.lt_u
    i64_lt_u, pop_i64, |a, b| (a as u64) < (b as u64)
);
relop!(
    /// i64.gt_s
    i64_gt_s, pop_i64, |a, b| a > b
);
relop!(
    /// i64.gt_u
    i64_gt_u, pop_i64, |a, b| (a as u64) > (b as u64)
);
relop!(
    /// i64.le_s
    i64_le_s, pop_i64, |a, b| a <= b
);
relop!(
    /// i64.le_u
    i64_le_u, pop_i64, |a, b| (a as u64) <= (b as u64)
);
relop!(
    /// i64.ge_s
    i64_ge_s, pop_i64, |a, b| a >= b
);
relop!(
    /// i64.ge_u
    i64_ge_u, pop_i64, |a, b| (a as u64) >= (b as u64)
);

relop!(
    /// f64.eq
    f64_eq, pop_f64, |a, b| a == b
);
relop!(
    /// f64.ne
    f64_ne, pop_f64, |a, b| a != b
);
relop!(
    /// f64.lt
    f64_lt, pop_f64, |a, b| a < b
);
relop!(
    /// f64.gt
    f64_gt, pop_f64, |a, b| a > b
);
relop!(
    /// f64.le
    f64_le, pop_f64, |a, b| a <= b
);
relop!(
    /// f64.ge
    f64_ge, pop_f64, |a, b| a >= b
);

#[cfg(test)]
mod tests {
    use crate::parser::instruction::{Instruction, NumericOp};
    use crate::parser::module::ValueType;
    use crate::runtime::test_utils::test::ExecutorTest;
    use crate::runtime::Value;
    use rstest::rstest;

    #[rstest]
    #[case(NumericOp::I32Eq, 3, 3, 1)]
    #[case(NumericOp::I32Ne, 3, 3, 0)]
    #[case(NumericOp::I32LtS, -1, 1, 1)]
    #[case(NumericOp::I32LtU, -1, 1, 0)]
    #[case(NumericOp::I32GtS, -1, 1, 0)]
    #[case(NumericOp::I32GtU, -1, 1, 1)]
    #[case(NumericOp::I32LeS, 2, 2, 1)]
    #[case(NumericOp::I32LeU, 3, 2, 0)]
    #[case(NumericOp::I32GeS, i32::MIN, 0, 0)]
    #[case(NumericOp::I32GeU, i32::MIN, 0, 1)]
    fn i32_relations(#[case] op: NumericOp, #[case] a: i32, #[case] b: i32, #[case] expected: i32) {
        ExecutorTest::new()
            .inst(Instruction::I32Const { value: a })
            .inst(Instruction::I32Const { value: b })
            .inst(Instruction::Numeric(op))
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(expected)]);
    }

    #[rstest]
    #[case(NumericOp::I64Eq, 1 << 40, 1 << 40, 1)]
    #[case(NumericOp::I64LtS, -5, 5, 1)]
    #[case(NumericOp::I64LtU, -5, 5, 0)]
    #[case(NumericOp::I64GeU, -1, 0, 1)]
    fn i64_relations_push_i32(#[case] op: NumericOp, #[case] a: i64, #[case] b: i64, #[case] expected: i32) {
        ExecutorTest::new()
            .inst(Instruction::I64Const { value: a })
            .inst(Instruction::I64Const { value: b })
            .inst(Instruction::Numeric(op))
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(expected)]);
    }

    #[rstest]
    #[case(NumericOp::F64Eq, f64::NAN, f64::NAN, 0)]
    #[case(NumericOp::F64Ne, f64::NAN, f64::NAN, 1)]
    #[case(NumericOp::F64Lt, 1.0, 2.0, 1)]
    #[case(NumericOp::F64Gt, 1.0, f64::NAN, 0)]
    #[case(NumericOp::F64Le, -0.0, 0.0, 1)]
    #[case(NumericOp::F64Ge, 2.0, 2.0, 1)]
    fn f64_relations(#[case] op: NumericOp, #[case] a: f64, #[case] b: f64, #[case] expected: i32) {
        ExecutorTest::new()
            .inst(Instruction::F64Const { value: a })
            .inst(Instruction::F64Const { value: b })
            .inst(Instruction::Numeric(op))
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(expected)]);
    }

    #[test]
    fn eqz() {
        ExecutorTest::new()
            .inst(Instruction::I32Const { value: 0 })
            .inst(Instruction::Numeric(NumericOp::I32Eqz))
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(1)]);
        ExecutorTest::new()
            .inst(Instruction::I64Const { value: 9 })
            .inst(Instruction::Numeric(NumericOp::I64Eqz))
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(0)]);
    }
}
