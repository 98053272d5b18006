//! Memory operations
//!
//! Loads and stores address memory 0. The effective address is the popped
//! i32 base, read as unsigned, plus the static offset from the memory
//! argument, computed in 64 bits so it cannot wrap. An access that does not
//! fit inside the current memory traps with `MemoryOutOfBounds`.

use super::*;

/// Effective address of an access
#[inline]
fn effective_address(base: i32, memarg: &MemArg) -> u64 {
    base as u32 as u64 + memarg.offset as u64
}

fn pop_address(stack: &mut Stack, memarg: &MemArg) -> Result<u64, RuntimeError> {
    let base = stack.pop_i32()?;
    Ok(effective_address(base, memarg))
}

// ============================================================================
// Loads
// ============================================================================

/// i32.load
/// [i32] -> [i32]
pub fn i32_load(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    let value = memory.read_u32(ea)?;
    stack.push(Value::I32(value as i32));
    Ok(())
}

/// i64.load
/// [i32] -> [i64]
pub fn i64_load(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    let value = memory.read_u64(ea)?;
    stack.push(Value::I64(value as i64));
    Ok(())
}

/// f32.load
pub fn f32_load(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    stack.push(Value::F32(memory.read_f32(ea)?));
    Ok(())
}

/// f64.load
pub fn f64_load(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    stack.push(Value::F64(memory.read_f64(ea)?));
    Ok(())
}

/// i32.load8_s: one byte, sign extended
pub fn i32_load8_s(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    let byte = memory.read_u8(ea)?;
    stack.push(Value::I32(byte as i8 as i32));
    Ok(())
}

/// i32.load8_u: one byte, zero extended
pub fn i32_load8_u(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    let byte = memory.read_u8(ea)?;
    stack.push(Value::I32(byte as i32));
    Ok(())
}

/// i32.load16_s
pub fn i32_load16_s(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    let half = memory.read_u16(ea)?;
    stack.push(Value::I32(half as i16 as i32));
    Ok(())
}

/// i32.load16_u
pub fn i32_load16_u(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    let half = memory.read_u16(ea)?;
    stack.push(Value::I32(half as i32));
    Ok(())
}

/// i64.load8_s
pub fn i64_load8_s(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    let byte = memory.read_u8(ea)?;
    stack.push(Value::I64(byte as i8 as i64));
    Ok(())
}

/// i64.load8_u
pub fn i64_load8_u(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    let byte = memory.read_u8(ea)?;
    stack.push(Value::I64(byte as i64));
    Ok(())
}

/// i64.load16_s
pub fn i64_load16_s(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    let half = memory.read_u16(ea)?;
    stack.push(Value::I64(half as i16 as i64));
    Ok(())
}

/// i64.load16_u
pub fn i64_load16_u(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    let half = memory.read_u16(ea)?;
    stack.push(Value::I64(half as i64));
    Ok(())
}

/// i64.load32_s
pub fn i64_load32_s(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    let word = memory.read_u32(ea)?;
    stack.push(Value::I64(word as i32 as i64));
    Ok(())
}

/// i64.load32_u
pub fn i64_load32_u(stack: &mut Stack, memory: &Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let ea = pop_address(stack, memarg)?;
    let word = memory.read_u32(ea)?;
    stack.push(Value::I64(word as i64));
    Ok(())
}

// ============================================================================
// Stores
// ============================================================================

/// i32.store
/// [i32 i32] -> []
/// The value is popped first, then the base address.
pub fn i32_store(stack: &mut Stack, memory: &mut Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let value = stack.pop_i32()?;
    let ea = pop_address(stack, memarg)?;
    memory.write_u32(ea, value as u32)
}

/// i64.store
pub fn i64_store(stack: &mut Stack, memory: &mut Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let value = stack.pop_i64()?;
    let ea = pop_address(stack, memarg)?;
    memory.write_u64(ea, value as u64)
}

/// f32.store
pub fn f32_store(stack: &mut Stack, memory: &mut Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let value = stack.pop_f32()?;
    let ea = pop_address(stack, memarg)?;
    memory.write_f32(ea, value)
}

/// f64.store
pub fn f64_store(stack: &mut Stack, memory: &mut Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let value = stack.pop_f64()?;
    let ea = pop_address(stack, memarg)?;
    memory.write_f64(ea, value)
}

/// i32.store8: stores the low byte
pub fn i32_store8(stack: &mut Stack, memory: &mut Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let value = stack.pop_i32()?;
    let ea = pop_address(stack, memarg)?;
    memory.write_u8(ea, value as u8)
}

/// i32.store16
pub fn i32_store16(stack: &mut Stack, memory: &mut Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let value = stack.pop_i32()?;
    let ea = pop_address(stack, memarg)?;
    memory.write_u16(ea, value as u16)
}

/// i64.store8
pub fn i64_store8(stack: &mut Stack, memory: &mut Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let value = stack.pop_i64()?;
    let ea = pop_address(stack, memarg)?;
    memory.write_u8(ea, value as u8)
}

/// i64.store16
pub fn i64_store16(stack: &mut Stack, memory: &mut Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let value = stack.pop_i64()?;
    let ea = pop_address(stack, memarg)?;
    memory.write_u16(ea, value as u16)
}

/// i64.store32
pub fn i64_store32(stack: &mut Stack, memory: &mut Memory, memarg: &MemArg) -> Result<(), RuntimeError> {
    let value = stack.pop_i64()?;
    let ea = pop_address(stack, memarg)?;
    memory.write_u32(ea, value as u32)
}

// ============================================================================
// Size and growth
// ============================================================================

/// memory.size: current size in pages
pub fn memory_size(stack: &mut Stack, memory: &Memory) -> Result<(), RuntimeError> {
    stack.push(Value::I32(memory.size() as i32));
    Ok(())
}

/// memory.grow: pops a page delta, pushes the old size in pages or -1
pub fn memory_grow(stack: &mut Stack, memory: &mut Memory) -> Result<(), RuntimeError> {
    let delta = stack.pop_i32()?;
    stack.push(Value::I32(memory.grow(delta as u32)));
    Ok(())
}
