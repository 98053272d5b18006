//! Instruction encoding to binary format

use super::{BlockType, Instruction, MemArg};
use crate::encoder::EncodeError;
use crate::parser::encoding::{self, write_f32, write_f64, write_vs32, write_vs64, write_vu32};

impl MemArg {
    pub fn encode(&self, buf: &mut Vec<u8>) {
        write_vu32(buf, self.align);
        write_vu32(buf, self.offset);
    }
}

impl BlockType {
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        match self {
            BlockType::Empty => buf.push(encoding::BLOCK_TYPE_EMPTY),
            BlockType::Value(vt) => buf.push(vt.to_byte()),
            BlockType::FuncType(idx) => {
                return Err(EncodeError::NotImplemented(format!(
                    "block type referencing type index {idx}"
                )))
            }
        }
        Ok(())
    }
}

/// Encodes a sequence followed by its `end`
pub fn encode_expr(body: &[Instruction], buf: &mut Vec<u8>) -> Result<(), EncodeError> {
    for instruction in body {
        instruction.encode(buf)?;
    }
    buf.push(encoding::OP_END);
    Ok(())
}

fn fc(buf: &mut Vec<u8>, subop: u32) {
    buf.push(encoding::OP_PREFIX_FC);
    write_vu32(buf, subop);
}

impl Instruction {
    /// The single-byte opcode for instructions outside the 0xFC family
    fn opcode(&self) -> Option<u8> {
        use Instruction::*;
        Some(match self {
            Unreachable => 0x00,
            Nop => 0x01,
            Block { .. } => 0x02,
            Loop { .. } => 0x03,
            If { .. } => 0x04,
            Br { .. } => 0x0C,
            BrIf { .. } => 0x0D,
            BrTable { .. } => 0x0E,
            Return => 0x0F,
            Call { .. } => 0x10,
            CallIndirect { .. } => 0x11,
            RefNull { .. } => 0xD0,
            RefIsNull => 0xD1,
            RefFunc { .. } => 0xD2,
            Drop => 0x1A,
            Select => 0x1B,
            SelectTyped { .. } => 0x1C,
            LocalGet { .. } => 0x20,
            LocalSet { .. } => 0x21,
            LocalTee { .. } => 0x22,
            GlobalGet { .. } => 0x23,
            GlobalSet { .. } => 0x24,
            TableGet { .. } => 0x25,
            TableSet { .. } => 0x26,
            I32Load { .. } => 0x28,
            I64Load { .. } => 0x29,
            F32Load { .. } => 0x2A,
            F64Load { .. } => 0x2B,
            I32Load8S { .. } => 0x2C,
            I32Load8U { .. } => 0x2D,
            I32Load16S { .. } => 0x2E,
            I32Load16U { .. } => 0x2F,
            I64Load8S { .. } => 0x30,
            I64Load8U { .. } => 0x31,
            I64Load16S { .. } => 0x32,
            I64Load16U { .. } => 0x33,
            I64Load32S { .. } => 0x34,
            I64Load32U { .. } => 0x35,
            I32Store { .. } => 0x36,
            I64Store { .. } => 0x37,
            F32Store { .. } => 0x38,
            F64Store { .. } => 0x39,
            I32Store8 { .. } => 0x3A,
            I32Store16 { .. } => 0x3B,
            I64Store8 { .. } => 0x3C,
            I64Store16 { .. } => 0x3D,
            I64Store32 { .. } => 0x3E,
            MemorySize => 0x3F,
            MemoryGrow => 0x40,
            I32Const { .. } => 0x41,
            I64Const { .. } => 0x42,
            F32Const { .. } => 0x43,
            F64Const { .. } => 0x44,
            Numeric(op) => op.opcode(),
            _ => return None,
        })
    }

    /// Appends the binary form of this instruction, including nested bodies
    /// and their terminators.
    pub fn encode(&self, buf: &mut Vec<u8>) -> Result<(), EncodeError> {
        use Instruction::*;

        if let Some(opcode) = self.opcode() {
            buf.push(opcode);
        }

        match self {
            Block { block_type, body } | Loop { block_type, body } => {
                block_type.encode(buf)?;
                encode_expr(body, buf)?;
            }
            If {
                block_type,
                then_branch,
                else_branch,
            } => {
                block_type.encode(buf)?;
                for instruction in then_branch {
                    instruction.encode(buf)?;
                }
                if let Some(else_branch) = else_branch {
                    buf.push(encoding::OP_ELSE);
                    for instruction in else_branch {
                        instruction.encode(buf)?;
                    }
                }
                buf.push(encoding::OP_END);
            }
            Br { label_idx } | BrIf { label_idx } => write_vu32(buf, *label_idx),
            BrTable { labels, default } => {
                encoding::write_vec(buf, labels, |b, l| write_vu32(b, *l));
                write_vu32(buf, *default);
            }
            Call { func_idx } | RefFunc { func_idx } => write_vu32(buf, *func_idx),
            CallIndirect {
                type_idx,
                table_idx,
            } => {
                write_vu32(buf, *type_idx);
                write_vu32(buf, *table_idx);
            }
            RefNull { ref_type } => buf.push(ref_type.to_byte()),
            SelectTyped { val_types } => {
                encoding::write_vec(buf, val_types, |b, vt| b.push(vt.to_byte()))
            }
            LocalGet { local_idx } | LocalSet { local_idx } | LocalTee { local_idx } => {
                write_vu32(buf, *local_idx)
            }
            GlobalGet { global_idx } | GlobalSet { global_idx } => write_vu32(buf, *global_idx),
            TableGet { table_idx } | TableSet { table_idx } => write_vu32(buf, *table_idx),
            MemorySize | MemoryGrow => buf.push(0x00),
            I32Const { value } => write_vs32(buf, *value),
            I64Const { value } => write_vs64(buf, *value),
            F32Const { value } => write_f32(buf, *value),
            F64Const { value } => write_f64(buf, *value),

            I32TruncSatF32S => fc(buf, 0),
            I32TruncSatF32U => fc(buf, 1),
            I32TruncSatF64S => fc(buf, 2),
            I32TruncSatF64U => fc(buf, 3),
            I64TruncSatF32S => fc(buf, 4),
            I64TruncSatF32U => fc(buf, 5),
            I64TruncSatF64S => fc(buf, 6),
            I64TruncSatF64U => fc(buf, 7),
            MemoryInit { data_idx } => {
                fc(buf, 8);
                write_vu32(buf, *data_idx);
                buf.push(0x00);
            }
            DataDrop { data_idx } => {
                fc(buf, 9);
                write_vu32(buf, *data_idx);
            }
            MemoryCopy => {
                fc(buf, 10);
                buf.extend_from_slice(&[0x00, 0x00]);
            }
            MemoryFill => {
                fc(buf, 11);
                buf.push(0x00);
            }
            TableInit {
                elem_idx,
                table_idx,
            } => {
                fc(buf, 12);
                write_vu32(buf, *elem_idx);
                write_vu32(buf, *table_idx);
            }
            ElemDrop { elem_idx } => {
                fc(buf, 13);
                write_vu32(buf, *elem_idx);
            }
            TableCopy {
                dst_table,
                src_table,
            } => {
                fc(buf, 14);
                write_vu32(buf, *dst_table);
                write_vu32(buf, *src_table);
            }
            TableGrow { table_idx } => {
                fc(buf, 15);
                write_vu32(buf, *table_idx);
            }
            TableSize { table_idx } => {
                fc(buf, 16);
                write_vu32(buf, *table_idx);
            }
            TableFill { table_idx } => {
                fc(buf, 17);
                write_vu32(buf, *table_idx);
            }

            _ => {
                if let Some(memarg) = self.memarg() {
                    memarg.encode(buf);
                }
            }
        }

        Ok(())
    }
}
