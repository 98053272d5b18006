//! Instruction decoding from binary format

use super::{BlockType, Instruction, MemArg, NumericOp};
use crate::parser::module::{RefType, ValueType};
use crate::parser::reader::Reader;
use crate::parser::{decode_value_type, encoding, DecodeError};

impl MemArg {
    /// Decode a memory argument from the reader
    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        let align = reader.read_vu32()?;
        let offset = reader.read_vu32()?;
        Ok(MemArg { align, offset })
    }
}

impl BlockType {
    /// Decode a block type: `0x40`, a value type byte, or a non-negative
    /// s33 type index. The index form is recognised but not supported.
    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        let b = reader.peek()?;
        if b == encoding::BLOCK_TYPE_EMPTY {
            reader.read_byte()?;
            return Ok(BlockType::Empty);
        }
        if let Some(vt) = ValueType::from_byte(b) {
            reader.read_byte()?;
            return Ok(BlockType::Value(vt));
        }
        let idx = reader.read_vs33()?;
        if idx < 0 {
            return Err(DecodeError::MalformedModule(format!("invalid block type {idx}")));
        }
        Err(DecodeError::NotImplemented(format!(
            "block type referencing type index {idx}"
        )))
    }
}

/// Reserved single byte immediate that must be zero
fn reserved_zero(reader: &mut Reader, what: &str) -> Result<(), DecodeError> {
    match reader.read_byte()? {
        0x00 => Ok(()),
        b => Err(DecodeError::MalformedModule(format!(
            "{what}: reserved byte must be zero, got {b:#04x}"
        ))),
    }
}

/// A `block`, `loop` or `if` whose body is still being decoded
struct OpenBlock {
    opcode: u8,
    block_type: BlockType,
    body: Vec<Instruction>,
    /// The finished `then` arm of an `if`, once its `else` was read
    then_branch: Option<Vec<Instruction>>,
}

impl OpenBlock {
    fn new(opcode: u8, block_type: BlockType) -> Self {
        OpenBlock {
            opcode,
            block_type,
            body: Vec::new(),
            then_branch: None,
        }
    }

    fn close(self) -> Instruction {
        let OpenBlock {
            opcode,
            block_type,
            body,
            then_branch,
        } = self;
        match (opcode, then_branch) {
            (encoding::OP_LOOP, _) => Instruction::Loop { block_type, body },
            (encoding::OP_IF, Some(then_branch)) => Instruction::If {
                block_type,
                then_branch,
                else_branch: Some(body),
            },
            (encoding::OP_IF, None) => Instruction::If {
                block_type,
                then_branch: body,
                else_branch: None,
            },
            _ => Instruction::Block { block_type, body },
        }
    }
}

/// Decodes instructions until the `end` that closes `outermost`, and returns
/// it with its body filled in.
///
/// Nested structured instructions are kept on an explicit stack rather than
/// decoded recursively; the stack may hold at most `reader.max_nesting()`
/// blocks besides `outermost`.
fn decode_block(reader: &mut Reader, outermost: OpenBlock) -> Result<OpenBlock, DecodeError> {
    let mut open = vec![outermost];
    loop {
        let opcode = reader.peek()?;
        match opcode {
            encoding::OP_END => {
                reader.read_byte()?;
                match (open.pop(), open.last_mut()) {
                    (Some(block), Some(parent)) => parent.body.push(block.close()),
                    (Some(block), None) => return Ok(block),
                    (None, _) => return Err(DecodeError::MalformedModule("unbalanced end".to_string())),
                }
            }
            encoding::OP_ELSE => {
                reader.read_byte()?;
                match open.last_mut() {
                    Some(block) if block.opcode == encoding::OP_IF && block.then_branch.is_none() => {
                        block.then_branch = Some(std::mem::take(&mut block.body));
                    }
                    _ => return Err(DecodeError::MalformedModule("else outside of if".to_string())),
                }
            }
            encoding::OP_BLOCK | encoding::OP_LOOP | encoding::OP_IF => {
                if open.len() > reader.max_nesting() {
                    return Err(DecodeError::MalformedModule(format!(
                        "blocks nested deeper than {}",
                        reader.max_nesting()
                    )));
                }
                reader.read_byte()?;
                let block_type = BlockType::decode(reader)?;
                open.push(OpenBlock::new(opcode, block_type));
            }
            _ => {
                let instruction = Instruction::decode(reader)?;
                if let Some(block) = open.last_mut() {
                    block.body.push(instruction);
                }
            }
        }
    }
}

/// Decodes an `end`-terminated expression (a function body or a constant
/// initializer). The `end` is consumed and not included.
pub fn decode_expr(reader: &mut Reader) -> Result<Vec<Instruction>, DecodeError> {
    // the expression itself is the outermost block; `else` is rejected there
    let expr = decode_block(reader, OpenBlock::new(encoding::OP_BLOCK, BlockType::Empty))?;
    Ok(expr.body)
}

impl Instruction {
    /// Decode a single instruction (and, for structured instructions, its
    /// nested bodies) from the reader
    pub fn decode(reader: &mut Reader) -> Result<Self, DecodeError> {
        let opcode = reader.read_byte()?;

        use Instruction::*;
        let instruction = match opcode {
            // Control instructions
            0x00 => Unreachable,
            0x01 => Nop,
            encoding::OP_BLOCK | encoding::OP_LOOP | encoding::OP_IF => {
                let block_type = BlockType::decode(reader)?;
                decode_block(reader, OpenBlock::new(opcode, block_type))?.close()
            }
            0x0C => Br {
                label_idx: reader.read_vu32()?,
            },
            0x0D => BrIf {
                label_idx: reader.read_vu32()?,
            },
            0x0E => {
                let labels = reader.read_vec(|r| r.read_vu32())?;
                BrTable {
                    labels,
                    default: reader.read_vu32()?,
                }
            }
            0x0F => Return,
            0x10 => Call {
                func_idx: reader.read_vu32()?,
            },
            0x11 => {
                let type_idx = reader.read_vu32()?;
                CallIndirect {
                    type_idx,
                    table_idx: reader.read_vu32()?,
                }
            }

            // Reference instructions
            0xD0 => {
                let b = reader.read_byte()?;
                RefNull {
                    ref_type: RefType::from_byte(b).ok_or(DecodeError::InvalidValueType(b))?,
                }
            }
            0xD1 => RefIsNull,
            0xD2 => RefFunc {
                func_idx: reader.read_vu32()?,
            },

            // Parametric instructions
            0x1A => Drop,
            0x1B => Select,
            0x1C => SelectTyped {
                val_types: reader.read_vec(decode_value_type)?,
            },

            // Variable instructions
            0x20 => LocalGet {
                local_idx: reader.read_vu32()?,
            },
            0x21 => LocalSet {
                local_idx: reader.read_vu32()?,
            },
            0x22 => LocalTee {
                local_idx: reader.read_vu32()?,
            },
            0x23 => GlobalGet {
                global_idx: reader.read_vu32()?,
            },
            0x24 => GlobalSet {
                global_idx: reader.read_vu32()?,
            },

            // Table instructions
            0x25 => TableGet {
                table_idx: reader.read_vu32()?,
            },
            0x26 => TableSet {
                table_idx: reader.read_vu32()?,
            },

            // Memory instructions
            0x28 => I32Load {
                memarg: MemArg::decode(reader)?,
            },
            0x29 => I64Load {
                memarg: MemArg::decode(reader)?,
            },
            0x2A => F32Load {
                memarg: MemArg::decode(reader)?,
            },
            0x2B => F64Load {
                memarg: MemArg::decode(reader)?,
            },
            0x2C => I32Load8S {
                memarg: MemArg::decode(reader)?,
            },
            0x2D => I32Load8U {
                memarg: MemArg::decode(reader)?,
            },
            0x2E => I32Load16S {
                memarg: MemArg::decode(reader)?,
            },
            0x2F => I32Load16U {
                memarg: MemArg::decode(reader)?,
            },
            0x30 => I64Load8S {
                memarg: MemArg::decode(reader)?,
            },
            0x31 => I64Load8U {
                memarg: MemArg::decode(reader)?,
            },
            0x32 => I64Load16S {
                memarg: MemArg::decode(reader)?,
            },
            0x33 => I64Load16U {
                memarg: MemArg::decode(reader)?,
            },
            0x34 => I64Load32S {
                memarg: MemArg::decode(reader)?,
            },
            0x35 => I64Load32U {
                memarg: MemArg::decode(reader)?,
            },
            0x36 => I32Store {
                memarg: MemArg::decode(reader)?,
            },
            0x37 => I64Store {
                memarg: MemArg::decode(reader)?,
            },
            0x38 => F32Store {
                memarg: MemArg::decode(reader)?,
            },
            0x39 => F64Store {
                memarg: MemArg::decode(reader)?,
            },
            0x3A => I32Store8 {
                memarg: MemArg::decode(reader)?,
            },
            0x3B => I32Store16 {
                memarg: MemArg::decode(reader)?,
            },
            0x3C => I64Store8 {
                memarg: MemArg::decode(reader)?,
            },
            0x3D => I64Store16 {
                memarg: MemArg::decode(reader)?,
            },
            0x3E => I64Store32 {
                memarg: MemArg::decode(reader)?,
            },
            0x3F => {
                reserved_zero(reader, "memory.size")?;
                MemorySize
            }
            0x40 => {
                reserved_zero(reader, "memory.grow")?;
                MemoryGrow
            }

            // Numeric instructions
            0x41 => I32Const {
                value: reader.read_vs32()?,
            },
            0x42 => I64Const {
                value: reader.read_vs64()?,
            },
            0x43 => F32Const {
                value: reader.read_f32()?,
            },
            0x44 => F64Const {
                value: reader.read_f64()?,
            },
            0x45..=0xC4 => match NumericOp::from_opcode(opcode) {
                Some(op) => Numeric(op),
                None => return Err(DecodeError::UnknownOpcode(opcode)),
            },

            encoding::OP_PREFIX_FC => decode_prefixed_fc(reader)?,

            _ => return Err(DecodeError::UnknownOpcode(opcode)),
        };

        Ok(instruction)
    }
}

/// The 0xFC family: saturating truncations and bulk memory/table operations
fn decode_prefixed_fc(reader: &mut Reader) -> Result<Instruction, DecodeError> {
    use Instruction::*;

    let subop = reader.read_vu32()?;
    Ok(match subop {
        0 => I32TruncSatF32S,
        1 => I32TruncSatF32U,
        2 => I32TruncSatF64S,
        3 => I32TruncSatF64U,
        4 => I64TruncSatF32S,
        5 => I64TruncSatF32U,
        6 => I64TruncSatF64S,
        7 => I64TruncSatF64U,
        8 => {
            let data_idx = reader.read_vu32()?;
            reserved_zero(reader, "memory.init")?;
            MemoryInit { data_idx }
        }
        9 => DataDrop {
            data_idx: reader.read_vu32()?,
        },
        10 => {
            reserved_zero(reader, "memory.copy")?;
            reserved_zero(reader, "memory.copy")?;
            MemoryCopy
        }
        11 => {
            reserved_zero(reader, "memory.fill")?;
            MemoryFill
        }
        12 => {
            let elem_idx = reader.read_vu32()?;
            TableInit {
                elem_idx,
                table_idx: reader.read_vu32()?,
            }
        }
        13 => ElemDrop {
            elem_idx: reader.read_vu32()?,
        },
        14 => {
            let dst_table = reader.read_vu32()?;
            TableCopy {
                dst_table,
                src_table: reader.read_vu32()?,
            }
        }
        15 => TableGrow {
            table_idx: reader.read_vu32()?,
        },
        16 => TableSize {
            table_idx: reader.read_vu32()?,
        },
        17 => TableFill {
            table_idx: reader.read_vu32()?,
        },
        _ => {
            return Err(DecodeError::UnknownPrefixedOpcode(encoding::OP_PREFIX_FC, subop))
        }
    })
}
