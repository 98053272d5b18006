//! Conversion operations
//!
//! Integer width changes, in-place sign extension and the executable
//! integer to f64 conversions.

use super::{RuntimeError, Stack, Value};

/// i32.wrap_i64: keeps the low 32 bits
pub fn i32_wrap_i64(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_i64()?;
    stack.push(Value::I32(c1 as i32));
    Ok(())
}

/// i64.extend_i32_s
pub fn i64_extend_i32_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_i32()?;
    stack.push(Value::I64(c1 as i64));
    Ok(())
}

/// i64.extend_i32_u: zero extends
pub fn i64_extend_i32_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_i32()?;
    stack.push(Value::I64(c1 as u32 as i64));
    Ok(())
}

/// i32.extend8_s: sign extends the low 8 bits
pub fn i32_extend8_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_i32()?;
    stack.push(Value::I32(c1 as i8 as i32));
    Ok(())
}

/// i32.extend16_s
pub fn i32_extend16_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_i32()?;
    stack.push(Value::I32(c1 as i16 as i32));
    Ok(())
}

/// i64.extend8_s
pub fn i64_extend8_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_i64()?;
    stack.push(Value::I64(c1 as i8 as i64));
    Ok(())
}

/// i64.extend16_s
pub fn i64_extend16_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_i64()?;
    stack.push(Value::I64(c1 as i16 as i64));
    Ok(())
}

/// i64.extend32_s
pub fn i64_extend32_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_i64()?;
    stack.push(Value::I64(c1 as i32 as i64));
    Ok(())
}

/// f64.convert_i32_s: exact, every i32 is representable
pub fn f64_convert_i32_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_i32()?;
    stack.push(Value::F64(c1 as f64));
    Ok(())
}

/// f64.convert_i32_u
pub fn f64_convert_i32_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_i32()?;
    stack.push(Value::F64(c1 as u32 as f64));
    Ok(())
}
