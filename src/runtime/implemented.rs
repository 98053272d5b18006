//! Single source of truth for which WebAssembly instructions are implemented
//!
//! Every instruction the decoder accepts can be encoded again, but only the
//! mnemonics listed here execute. Anything else traps with
//! [`RuntimeError::UnimplementedInstruction`](super::RuntimeError::UnimplementedInstruction).

use once_cell::sync::Lazy;
use std::collections::HashSet;

use crate::parser::instruction::Instruction;

static IMPLEMENTED: Lazy<HashSet<&'static str>> = Lazy::new(|| {
    let mut implemented = HashSet::new();

    // Control flow
    implemented.extend([
        "unreachable",
        "nop",
        "block",
        "loop",
        "if",
        "br",
        "br_if",
        "br_table",
        "return",
        "call",
        "call_indirect",
    ]);

    // References
    implemented.extend(["ref.null", "ref.is_null", "ref.func"]);

    // Parametric
    implemented.extend(["drop", "select"]);

    // Variables
    implemented.extend(["local.get", "local.set", "local.tee", "global.get", "global.set"]);

    // Tables
    implemented.extend(["table.get", "table.set", "table.size"]);

    // Memory
    implemented.extend([
        "i32.load",
        "i64.load",
        "f32.load",
        "f64.load",
        "i32.load8_s",
        "i32.load8_u",
        "i32.load16_s",
        "i32.load16_u",
        "i64.load8_s",
        "i64.load8_u",
        "i64.load16_s",
        "i64.load16_u",
        "i64.load32_s",
        "i64.load32_u",
        "i32.store",
        "i64.store",
        "f32.store",
        "f64.store",
        "i32.store8",
        "i32.store16",
        "i64.store8",
        "i64.store16",
        "i64.store32",
        "memory.size",
        "memory.grow",
    ]);

    // Constants
    implemented.extend(["i32.const", "i64.const", "f32.const", "f64.const"]);

    // i32
    implemented.extend([
        "i32.eqz", "i32.eq", "i32.ne", "i32.lt_s", "i32.lt_u", "i32.gt_s", "i32.gt_u", "i32.le_s", "i32.le_u",
        "i32.ge_s", "i32.ge_u", "i32.clz", "i32.ctz", "i32.popcnt", "i32.add", "i32.sub", "i32.mul", "i32.div_s",
        "i32.div_u", "i32.rem_s", "i32.rem_u", "i32.and", "i32.or", "i32.xor", "i32.shl", "i32.shr_s", "i32.shr_u",
        "i32.rotl", "i32.rotr",
    ]);

    // i64
    implemented.extend([
        "i64.eqz", "i64.eq", "i64.ne", "i64.lt_s", "i64.lt_u", "i64.gt_s", "i64.gt_u", "i64.le_s", "i64.le_u",
        "i64.ge_s", "i64.ge_u", "i64.clz", "i64.ctz", "i64.popcnt", "i64.add", "i64.sub", "i64.mul", "i64.div_s",
        "i64.div_u", "i64.rem_s", "i64.rem_u", "i64.and", "i64.or", "i64.xor", "i64.shl", "i64.shr_s", "i64.shr_u",
        "i64.rotl", "i64.rotr",
    ]);

    // f64
    implemented.extend([
        "f64.eq", "f64.ne", "f64.lt", "f64.gt", "f64.le", "f64.ge", "f64.abs", "f64.neg", "f64.sqrt", "f64.add",
        "f64.sub", "f64.mul", "f64.div",
    ]);

    // Conversions
    implemented.extend([
        "i32.wrap_i64",
        "i64.extend_i32_s",
        "i64.extend_i32_u",
        "f64.convert_i32_s",
        "f64.convert_i32_u",
    ]);

    // Sign extension
    implemented.extend([
        "i32.extend8_s",
        "i32.extend16_s",
        "i64.extend8_s",
        "i64.extend16_s",
        "i64.extend32_s",
    ]);

    implemented
});

/// Returns the set of all implemented instruction mnemonics
pub fn implemented_instructions() -> &'static HashSet<&'static str> {
    &IMPLEMENTED
}

/// Check if a mnemonic is executable
pub fn is_implemented(mnemonic: &str) -> bool {
    IMPLEMENTED.contains(mnemonic)
}

/// Check if a specific instruction is executable
pub fn is_instruction_implemented(instruction: &Instruction) -> bool {
    is_implemented(instruction.mnemonic())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::instruction::{MemArg, NumericOp};
    use crate::runtime::test_utils::test::ExecutorTest;
    use crate::runtime::RuntimeError;

    #[test]
    fn numeric_table_matches_executor() {
        // with an empty stack an executable op underflows, anything else
        // traps before reading operands
        for &op in NumericOp::ALL {
            let result = ExecutorTest::new().inst(Instruction::Numeric(op)).run();
            if is_implemented(op.mnemonic()) {
                assert!(
                    matches!(result, Err(RuntimeError::StackUnderflow)),
                    "{} should execute, got {:?}",
                    op.mnemonic(),
                    result
                );
            } else {
                assert!(
                    matches!(&result, Err(RuntimeError::UnimplementedInstruction(m)) if m == op.mnemonic()),
                    "{} should be decode-only, got {:?}",
                    op.mnemonic(),
                    result
                );
            }
        }
    }

    #[test]
    fn counts() {
        let numeric = NumericOp::ALL
            .iter()
            .filter(|op| is_implemented(op.mnemonic()))
            .count();
        assert_eq!(numeric, 2 * 29 + 13 + 5 + 5);
        assert_eq!(implemented_instructions().len(), numeric + 11 + 3 + 2 + 5 + 3 + 25 + 4);
    }

    #[test]
    fn instructions_with_immediates() {
        assert!(is_instruction_implemented(&Instruction::I64Store32 {
            memarg: MemArg { align: 2, offset: 0 },
        }));
        assert!(is_instruction_implemented(&Instruction::SelectTyped { val_types: vec![] }));
        assert!(!is_instruction_implemented(&Instruction::MemoryCopy));
        assert!(!is_instruction_implemented(&Instruction::TableFill { table_idx: 0 }));
        assert!(!is_instruction_implemented(&Instruction::I64TruncSatF64U));
        assert!(!is_instruction_implemented(&Instruction::Numeric(NumericOp::F32Add)));
    }
}
