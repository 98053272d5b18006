//! Bitwise operations
//!
//! `and`, `or`, `xor`, shifts and rotates for i32 and i64. Shift and rotate
//! counts are taken modulo the bit width.

use super::{RuntimeError, Stack, Value};

macro_rules! bitop {
    ($(#[$doc:meta])* $name:ident, $pop:ident, $variant:ident, |$a:ident, $b:ident| $body:expr) => {
        $(#[$doc])*
        pub fn $name(stack: &mut Stack) -> Result<(), RuntimeError> {
            let $b = stack.$pop()?;
            let $a = stack.$pop()?;
            stack.push(Value::$variant($body));
            Ok(())
        }
    };
}

bitop!(
    /// i32.and
    i32_and, pop_i32, I32, |a, b| a & b
);
bitop!(
    /// i32.or
    i32_or, pop_i32, I32, |a, b| a | b
);
bitop!(
    /// i32.xor
    i32_xor, pop_i32, I32, |a, b| a ^ b
);
bitop!(
    /// i32.shl: shift count modulo 32
    i32_shl, pop_i32, I32, |a, b| a.wrapping_shl(b as u32)
);
bitop!(
    /// i32.shr_s: arithmetic shift, sign bit replicated
    i32_shr_s, pop_i32, I32, |a, b| a.wrapping_shr(b as u32)
);
bitop!(
    /// i32.shr_u: logical shift, zero filled
    i32_shr_u, pop_i32, I32, |a, b| (a as u32).wrapping_shr(b as u32) as i32
);
bitop!(
    /// i32.rotl
    i32_rotl, pop_i32, I32, |a, b| a.rotate_left(b as u32 % 32)
);
bitop!(
    /// i32.rotr
    i32_rotr, pop_i32, I32, |a, b| a.rotate_right(b as u32 % 32)
);

bitop!(
    /// i64.and
    i64_and, pop_i64, I64, |a, b| a & b
);
bitop!(
    /// i64.or
    i64_or, pop_i64, I64, |a, b| a | b
);
bitop!(
    /// i64.xor
    i64_xor, pop_i64, I64, |a, b| a ^ b
);
bitop!(
    /// i64.shl: shift count modulo 64
    i64_shl, pop_i64, I64, |a, b| a.wrapping_shl(b as u32)
);
bitop!(
    /// i64.shr_s
    i64_shr_s, pop_i64, I64, |a, b| a.wrapping_shr(b as u32)
);
bitop!(
    /// i64.shr_u
    i64_shr_u, pop_i64, I64, |a, b| (a as u64).wrapping_shr(b as u32) as i64
);
bitop!(
    /// i64.rotl
    i64_rotl, pop_i64, I64, |a, b| a.rotate_left((b as u64 % 64) as u32)
);
bitop!(
    /// i64.rotr
    i64_rotr, pop_i64, I64, |a, b| a.rotate_right((b as u64 % 64) as u32)
);

#[cfg(test)]
mod tests {
    use crate::parser::instruction::{Instruction, NumericOp};
    use crate::parser::module::ValueType;
    use crate::runtime::test_utils::test::ExecutorTest;
    use crate::runtime::Value;
    use rstest::rstest;

    #[rstest]
    #[case(NumericOp::I32And, 0b1100, 0b1010, 0b1000)]
    #[case(NumericOp::I32Or, 0b1100, 0b1010, 0b1110)]
    #[case(NumericOp::I32Xor, 0b1100, 0b1010, 0b0110)]
    #[case(NumericOp::I32Shl, 1, 33, 2)]
    #[case(NumericOp::I32ShrS, -8, 1, -4)]
    #[case(NumericOp::I32ShrU, -8, 28, 0xF)]
    #[case(NumericOp::I32Rotl, i32::MIN, 1, 1)]
    #[case(NumericOp::I32Rotr, 1, 1, i32::MIN)]
    #[case(NumericOp::I32Rotl, 0x12345678, -8, 0x78123456)]
    fn i32_ops(#[case] op: NumericOp, #[case] a: i32, #[case] b: i32, #[case] expected: i32) {
        ExecutorTest::new()
            .inst(Instruction::I32Const { value: a })
            .inst(Instruction::I32Const { value: b })
            .inst(Instruction::Numeric(op))
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(expected)]);
    }

    #[rstest]
    #[case(NumericOp::I64And, -1, 0xFF, 0xFF)]
    #[case(NumericOp::I64Shl, 1, 65, 2)]
    #[case(NumericOp::I64ShrS, i64::MIN, 63, -1)]
    #[case(NumericOp::I64ShrU, i64::MIN, 63, 1)]
    #[case(NumericOp::I64Rotl, i64::MIN, 1, 1)]
    #[case(NumericOp::I64Rotr, 1, -1, 2)]
    fn i64_ops(#[case] op: NumericOp, #[case] a: i64, #[case] b: i64, #[case] expected: i64) {
        ExecutorTest::new()
            .inst(Instruction::I64Const { value: a })
            .inst(Instruction::I64Const { value: b })
            .inst(Instruction::Numeric(op))
            .returns(vec![ValueType::I64])
            .expect_stack(vec![Value::I64(expected)]);
    }
}
