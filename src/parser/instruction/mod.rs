//! Instruction representation
//!
//! Instructions form a closed enum. Structured control instructions own their
//! nested bodies, so a decoded function body is a tree rather than a flat
//! opcode stream. Numeric instructions without immediates share one opcode
//! table ([`NumericOp`]) used by the decoder, the encoder and the executor.

pub mod decode;
pub mod encode;

pub use decode::decode_expr;
pub use encode::encode_expr;

use super::module::{RefType, ValueType};
use fhex::ToHex;
use serde::Serialize;
use std::fmt;

/// Memory argument for memory access instructions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MemArg {
    /// Alignment hint (as power of 2)
    pub align: u32,
    pub offset: u32,
}

/// Result annotation of a structured control instruction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum BlockType {
    /// No result
    Empty,
    /// Single value type result
    Value(ValueType),
    /// Function type index; representable but neither decoded nor encoded
    FuncType(u32),
}

impl BlockType {
    /// Number of values a branch to the end of this block carries
    pub fn arity(&self) -> usize {
        match self {
            BlockType::Empty => 0,
            BlockType::Value(_) => 1,
            BlockType::FuncType(_) => 0,
        }
    }
}

macro_rules! numeric_ops {
    ($($name:ident = $opcode:literal, $mnemonic:literal;)*) => {
        /// Numeric instructions that carry no immediates (opcodes 0x45..=0xC4)
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
        pub enum NumericOp {
            $($name,)*
        }

        impl NumericOp {
            pub const ALL: &'static [NumericOp] = &[$(NumericOp::$name,)*];

            pub fn from_opcode(opcode: u8) -> Option<Self> {
                match opcode {
                    $($opcode => Some(NumericOp::$name),)*
                    _ => None,
                }
            }

            pub fn opcode(self) -> u8 {
                match self {
                    $(NumericOp::$name => $opcode,)*
                }
            }

            pub fn mnemonic(self) -> &'static str {
                match self {
                    $(NumericOp::$name => $mnemonic,)*
                }
            }
        }
    };
}

numeric_ops! {
    I32Eqz = 0x45, "i32.eqz";
    I32Eq = 0x46, "i32.eq";
    I32Ne = 0x47, "i32.ne";
    I32LtS = 0x48, "i32.lt_s";
    I32LtU = 0x49, "i32.lt_u";
    I32GtS = 0x4A, "i32.gt_s";
    I32GtU = 0x4B, "i32.gt_u";
    I32LeS = 0x4C, "i32.le_s";
    I32LeU = 0x4D, "i32.le_u";
    I32GeS = 0x4E, "i32.ge_s";
    I32GeU = 0x4F, "i32.ge_u";

    I64Eqz = 0x50, "i64.eqz";
    I64Eq = 0x51, "i64.eq";
    I64Ne = 0x52, "i64.ne";
    I64LtS = 0x53, "i64.lt_s";
    I64LtU = 0x54, "i64.lt_u";
    I64GtS = 0x55, "i64.gt_s";
    I64GtU = 0x56, "i64.gt_u";
    I64LeS = 0x57, "i64.le_s";
    I64LeU = 0x58, "i64.le_u";
    I64GeS = 0x59, "i64.ge_s";
    I64GeU = 0x5A, "i64.ge_u";

    F32Eq = 0x5B, "f32.eq";
    F32Ne = 0x5C, "f32.ne";
    F32Lt = 0x5D, "f32.lt";
    F32Gt = 0x5E, "f32.gt";
    F32Le = 0x5F, "f32.le";
    F32Ge = 0x60, "f32.ge";

    F64Eq = 0x61, "f64.eq";
    F64Ne = 0x62, "f64.ne";
    F64Lt = 0x63, "f64.lt";
    F64Gt = 0x64, "f64.gt";
    F64Le = 0x65, "f64.le";
    F64Ge = 0x66, "f64.ge";

    I32Clz = 0x67, "i32.clz";
    I32Ctz = 0x68, "i32.ctz";
    I32Popcnt = 0x69, "i32.popcnt";
    I32Add = 0x6A, "i32.add";
    I32Sub = 0x6B, "i32.sub";
    I32Mul = 0x6C, "i32.mul";
    I32DivS = 0x6D, "i32.div_s";
    I32DivU = 0x6E, "i32.div_u";
    I32RemS = 0x6F, "i32.rem_s";
    I32RemU = 0x70, "i32.rem_u";
    I32And = 0x71, "i32.and";
    I32Or = 0x72, "i32.or";
    I32Xor = 0x73, "i32.xor";
    I32Shl = 0x74, "i32.shl";
    I32ShrS = 0x75, "i32.shr_s";
    I32ShrU = 0x76, "i32.shr_u";
    I32Rotl = 0x77, "i32.rotl";
    I32Rotr = 0x78, "i32.rotr";

    I64Clz = 0x79, "i64.clz";
    I64Ctz = 0x7A, "i64.ctz";
    I64Popcnt = 0x7B, "i64.popcnt";
    I64Add = 0x7C, "i64.add";
    I64Sub = 0x7D, "i64.sub";
    I64Mul = 0x7E, "i64.mul";
    I64DivS = 0x7F, "i64.div_s";
    I64DivU = 0x80, "i64.div_u";
    I64RemS = 0x81, "i64.rem_s";
    I64RemU = 0x82, "i64.rem_u";
    I64And = 0x83, "i64.and";
    I64Or = 0x84, "i64.or";
    I64Xor = 0x85, "i64.xor";
    I64Shl = 0x86, "i64.shl";
    I64ShrS = 0x87, "i64.shr_s";
    I64ShrU = 0x88, "i64.shr_u";
    I64Rotl = 0x89, "i64.rotl";
    I64Rotr = 0x8A, "i64.rotr";

    F32Abs = 0x8B, "f32.abs";
    F32Neg = 0x8C, "f32.neg";
    F32Ceil = 0x8D, "f32.ceil";
    F32Floor = 0x8E, "f32.floor";
    F32Trunc = 0x8F, "f32.trunc";
    F32Nearest = 0x90, "f32.nearest";
    F32Sqrt = 0x91, "f32.sqrt";
    F32Add = 0x92, "f32.add";
    F32Sub = 0x93, "f32.sub";
    F32Mul = 0x94, "f32.mul";
    F32Div = 0x95, "f32.div";
    F32Min = 0x96, "f32.min";
    F32Max = 0x97, "f32.max";
    F32Copysign = 0x98, "f32.copysign";

    F64Abs = 0x99, "f64.abs";
    F64Neg = 0x9A, "f64.neg";
    F64Ceil = 0x9B, "f64.ceil";
    F64Floor = 0x9C, "f64.floor";
    F64Trunc = 0x9D, "f64.trunc";
    F64Nearest = 0x9E, "f64.nearest";
    F64Sqrt = 0x9F, "f64.sqrt";
    F64Add = 0xA0, "f64.add";
    F64Sub = 0xA1, "f64.sub";
    F64Mul = 0xA2, "f64.mul";
    F64Div = 0xA3, "f64.div";
    F64Min = 0xA4, "f64.min";
    F64Max = 0xA5, "f64.max";
    F64Copysign = 0xA6, "f64.copysign";

    I32WrapI64 = 0xA7, "i32.wrap_i64";
    I32TruncF32S = 0xA8, "i32.trunc_f32_s";
    I32TruncF32U = 0xA9, "i32.trunc_f32_u";
    I32TruncF64S = 0xAA, "i32.trunc_f64_s";
    I32TruncF64U = 0xAB, "i32.trunc_f64_u";
    I64ExtendI32S = 0xAC, "i64.extend_i32_s";
    I64ExtendI32U = 0xAD, "i64.extend_i32_u";
    I64TruncF32S = 0xAE, "i64.trunc_f32_s";
    I64TruncF32U = 0xAF, "i64.trunc_f32_u";
    I64TruncF64S = 0xB0, "i64.trunc_f64_s";
    I64TruncF64U = 0xB1, "i64.trunc_f64_u";
    F32ConvertI32S = 0xB2, "f32.convert_i32_s";
    F32ConvertI32U = 0xB3, "f32.convert_i32_u";
    F32ConvertI64S = 0xB4, "f32.convert_i64_s";
    F32ConvertI64U = 0xB5, "f32.convert_i64_u";
    F32DemoteF64 = 0xB6, "f32.demote_f64";
    F64ConvertI32S = 0xB7, "f64.convert_i32_s";
    F64ConvertI32U = 0xB8, "f64.convert_i32_u";
    F64ConvertI64S = 0xB9, "f64.convert_i64_s";
    F64ConvertI64U = 0xBA, "f64.convert_i64_u";
    F64PromoteF32 = 0xBB, "f64.promote_f32";
    I32ReinterpretF32 = 0xBC, "i32.reinterpret_f32";
    I64ReinterpretF64 = 0xBD, "i64.reinterpret_f64";
    F32ReinterpretI32 = 0xBE, "f32.reinterpret_i32";
    F64ReinterpretI64 = 0xBF, "f64.reinterpret_i64";

    I32Extend8S = 0xC0, "i32.extend8_s";
    I32Extend16S = 0xC1, "i32.extend16_s";
    I64Extend8S = 0xC2, "i64.extend8_s";
    I64Extend16S = 0xC3, "i64.extend16_s";
    I64Extend32S = 0xC4, "i64.extend32_s";
}

/// Algebraic data type representing all supported instructions
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Instruction {
    // Control instructions
    Unreachable,
    Nop,
    Block { block_type: BlockType, body: Vec<Instruction> },
    Loop { block_type: BlockType, body: Vec<Instruction> },
    If {
        block_type: BlockType,
        then_branch: Vec<Instruction>,
        else_branch: Option<Vec<Instruction>>,
    },
    Br { label_idx: u32 },
    BrIf { label_idx: u32 },
    BrTable { labels: Vec<u32>, default: u32 },
    Return,
    Call { func_idx: u32 },
    CallIndirect { type_idx: u32, table_idx: u32 },

    // Reference instructions
    RefNull { ref_type: RefType },
    RefIsNull,
    RefFunc { func_idx: u32 },

    // Parametric instructions
    Drop,
    Select,
    SelectTyped { val_types: Vec<ValueType> },

    // Variable instructions
    LocalGet { local_idx: u32 },
    LocalSet { local_idx: u32 },
    LocalTee { local_idx: u32 },
    GlobalGet { global_idx: u32 },
    GlobalSet { global_idx: u32 },

    // Table instructions
    TableGet { table_idx: u32 },
    TableSet { table_idx: u32 },
    TableInit { elem_idx: u32, table_idx: u32 },
    ElemDrop { elem_idx: u32 },
    TableCopy { dst_table: u32, src_table: u32 },
    TableGrow { table_idx: u32 },
    TableSize { table_idx: u32 },
    TableFill { table_idx: u32 },

    // Memory instructions
    I32Load { memarg: MemArg },
    I64Load { memarg: MemArg },
    F32Load { memarg: MemArg },
    F64Load { memarg: MemArg },
    I32Load8S { memarg: MemArg },
    I32Load8U { memarg: MemArg },
    I32Load16S { memarg: MemArg },
    I32Load16U { memarg: MemArg },
    I64Load8S { memarg: MemArg },
    I64Load8U { memarg: MemArg },
    I64Load16S { memarg: MemArg },
    I64Load16U { memarg: MemArg },
    I64Load32S { memarg: MemArg },
    I64Load32U { memarg: MemArg },
    I32Store { memarg: MemArg },
    I64Store { memarg: MemArg },
    F32Store { memarg: MemArg },
    F64Store { memarg: MemArg },
    I32Store8 { memarg: MemArg },
    I32Store16 { memarg: MemArg },
    I64Store8 { memarg: MemArg },
    I64Store16 { memarg: MemArg },
    I64Store32 { memarg: MemArg },
    MemorySize,
    MemoryGrow,
    MemoryInit { data_idx: u32 },
    DataDrop { data_idx: u32 },
    MemoryCopy,
    MemoryFill,

    // Numeric instructions
    I32Const { value: i32 },
    I64Const { value: i64 },
    F32Const { value: f32 },
    F64Const { value: f64 },
    Numeric(NumericOp),

    // Saturating truncation (0xFC 0..=7)
    I32TruncSatF32S,
    I32TruncSatF32U,
    I32TruncSatF64S,
    I32TruncSatF64U,
    I64TruncSatF32S,
    I64TruncSatF32U,
    I64TruncSatF64S,
    I64TruncSatF64U,
}

impl Instruction {
    /// Get the mnemonic for this instruction
    pub fn mnemonic(&self) -> &'static str {
        use Instruction::*;
        match self {
            // Control
            Unreachable => "unreachable",
            Nop => "nop",
            Block { .. } => "block",
            Loop { .. } => "loop",
            If { .. } => "if",
            Br { .. } => "br",
            BrIf { .. } => "br_if",
            BrTable { .. } => "br_table",
            Return => "return",
            Call { .. } => "call",
            CallIndirect { .. } => "call_indirect",

            // Reference
            RefNull { .. } => "ref.null",
            RefIsNull => "ref.is_null",
            RefFunc { .. } => "ref.func",

            // Parametric
            Drop => "drop",
            Select => "select",
            SelectTyped { .. } => "select",

            // Variable
            LocalGet { .. } => "local.get",
            LocalSet { .. } => "local.set",
            LocalTee { .. } => "local.tee",
            GlobalGet { .. } => "global.get",
            GlobalSet { .. } => "global.set",

            // Table
            TableGet { .. } => "table.get",
            TableSet { .. } => "table.set",
            TableInit { .. } => "table.init",
            ElemDrop { .. } => "elem.drop",
            TableCopy { .. } => "table.copy",
            TableGrow { .. } => "table.grow",
            TableSize { .. } => "table.size",
            TableFill { .. } => "table.fill",

            // Memory
            I32Load { .. } => "i32.load",
            I64Load { .. } => "i64.load",
            F32Load { .. } => "f32.load",
            F64Load { .. } => "f64.load",
            I32Load8S { .. } => "i32.load8_s",
            I32Load8U { .. } => "i32.load8_u",
            I32Load16S { .. } => "i32.load16_s",
            I32Load16U { .. } => "i32.load16_u",
            I64Load8S { .. } => "i64.load8_s",
            I64Load8U { .. } => "i64.load8_u",
            I64Load16S { .. } => "i64.load16_s",
            I64Load16U { .. } => "i64.load16_u",
            I64Load32S { .. } => "i64.load32_s",
            I64Load32U { .. } => "i64.load32_u",
            I32Store { .. } => "i32.store",
            I64Store { .. } => "i64.store",
            F32Store { .. } => "f32.store",
            F64Store { .. } => "f64.store",
            I32Store8 { .. } => "i32.store8",
            I32Store16 { .. } => "i32.store16",
            I64Store8 { .. } => "i64.store8",
            I64Store16 { .. } => "i64.store16",
            I64Store32 { .. } => "i64.store32",
            MemorySize => "memory.size",
            MemoryGrow => "memory.grow",
            MemoryInit { .. } => "memory.init",
            DataDrop { .. } => "data.drop",
            MemoryCopy => "memory.copy",
            MemoryFill => "memory.fill",

            // Numeric
            I32Const { .. } => "i32.const",
            I64Const { .. } => "i64.const",
            F32Const { .. } => "f32.const",
            F64Const { .. } => "f64.const",
            Numeric(op) => op.mnemonic(),

            I32TruncSatF32S => "i32.trunc_sat_f32_s",
            I32TruncSatF32U => "i32.trunc_sat_f32_u",
            I32TruncSatF64S => "i32.trunc_sat_f64_s",
            I32TruncSatF64U => "i32.trunc_sat_f64_u",
            I64TruncSatF32S => "i64.trunc_sat_f32_s",
            I64TruncSatF32U => "i64.trunc_sat_f32_u",
            I64TruncSatF64S => "i64.trunc_sat_f64_s",
            I64TruncSatF64U => "i64.trunc_sat_f64_u",
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use Instruction::*;

        write!(f, "{}", self.mnemonic())?;

        match self {
            Block { block_type, .. } | Loop { block_type, .. } | If { block_type, .. } => {
                write!(f, "{block_type}")
            }
            Br { label_idx } | BrIf { label_idx } => write!(f, " {label_idx}"),
            BrTable { labels, default } => {
                for label in labels {
                    write!(f, " {label}")?;
                }
                write!(f, " {default}")
            }
            Call { func_idx } | RefFunc { func_idx } => write!(f, " {func_idx}"),
            CallIndirect { type_idx, table_idx } => write!(f, " {table_idx} (type {type_idx})"),
            RefNull { ref_type } => match ref_type {
                RefType::FuncRef => write!(f, " func"),
                RefType::ExternRef => write!(f, " extern"),
            },
            SelectTyped { val_types } => {
                for vt in val_types {
                    write!(f, " {vt}")?;
                }
                Ok(())
            }
            LocalGet { local_idx } | LocalSet { local_idx } | LocalTee { local_idx } => {
                write!(f, " {local_idx}")
            }
            GlobalGet { global_idx } | GlobalSet { global_idx } => write!(f, " {global_idx}"),
            TableGet { table_idx }
            | TableSet { table_idx }
            | TableGrow { table_idx }
            | TableSize { table_idx }
            | TableFill { table_idx } => write!(f, " {table_idx}"),
            TableInit { elem_idx, table_idx } => write!(f, " {elem_idx} {table_idx}"),
            ElemDrop { elem_idx } => write!(f, " {elem_idx}"),
            TableCopy { dst_table, src_table } => write!(f, " {dst_table} {src_table}"),
            MemoryInit { data_idx } | DataDrop { data_idx } => write!(f, " {data_idx}"),
            I32Const { value } => write!(f, " {value}"),
            I64Const { value } => write!(f, " {value}"),
            F32Const { value } => write!(f, " {}", value.to_hex()),
            F64Const { value } => write!(f, " {}", value.to_hex()),
            _ => match self.memarg() {
                Some(memarg) => write!(f, " offset={} align={}", memarg.offset, 1u64 << memarg.align.min(63)),
                None => Ok(()),
            },
        }
    }
}

impl Instruction {
    /// The memory argument of a load or store
    pub fn memarg(&self) -> Option<&MemArg> {
        use Instruction::*;
        match self {
            I32Load { memarg }
            | I64Load { memarg }
            | F32Load { memarg }
            | F64Load { memarg }
            | I32Load8S { memarg }
            | I32Load8U { memarg }
            | I32Load16S { memarg }
            | I32Load16U { memarg }
            | I64Load8S { memarg }
            | I64Load8U { memarg }
            | I64Load16S { memarg }
            | I64Load16U { memarg }
            | I64Load32S { memarg }
            | I64Load32U { memarg }
            | I32Store { memarg }
            | I64Store { memarg }
            | F32Store { memarg }
            | F64Store { memarg }
            | I32Store8 { memarg }
            | I32Store16 { memarg }
            | I64Store8 { memarg }
            | I64Store16 { memarg }
            | I64Store32 { memarg } => Some(memarg),
            _ => None,
        }
    }
}

impl fmt::Display for BlockType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BlockType::Empty => Ok(()),
            BlockType::Value(vt) => write!(f, " (result {vt})"),
            BlockType::FuncType(idx) => write!(f, " (type {idx})"),
        }
    }
}
