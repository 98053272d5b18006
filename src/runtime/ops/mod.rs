//! Instruction implementations
//!
//! One module per instruction family. Each operation pops its operands from
//! the [`Stack`], pushes its result, and reports traps as [`RuntimeError`].

pub mod bitwise;
pub mod comparison;
pub mod control;
pub mod conversion;
pub mod memory;
pub mod numeric;
pub mod parametric;
pub mod reference;
pub mod variable;

pub(crate) use crate::parser::instruction::MemArg;
pub(crate) use crate::runtime::memory::Memory;
pub(crate) use crate::runtime::stack::Stack;
pub(crate) use crate::runtime::{RuntimeError, Value};
