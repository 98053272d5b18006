//! Numeric operations
//!
//! Constants, integer arithmetic and the executable subset of f64
//! arithmetic. Integer arithmetic is fixed width two's complement: sums,
//! differences and products wrap, while division and remainder trap on a
//! zero divisor and signed division traps on `MIN / -1`.

use super::{RuntimeError, Stack, Value};

// ============================================================================
// Constants
// ============================================================================

/// i32.const
pub fn i32_const(stack: &mut Stack, value: i32) -> Result<(), RuntimeError> {
    stack.push(Value::I32(value));
    Ok(())
}

/// i64.const
pub fn i64_const(stack: &mut Stack, value: i64) -> Result<(), RuntimeError> {
    stack.push(Value::I64(value));
    Ok(())
}

/// f32.const
pub fn f32_const(stack: &mut Stack, value: f32) -> Result<(), RuntimeError> {
    stack.push(Value::F32(value));
    Ok(())
}

/// f64.const
pub fn f64_const(stack: &mut Stack, value: f64) -> Result<(), RuntimeError> {
    stack.push(Value::F64(value));
    Ok(())
}

// ============================================================================
// Integer binary operations
// ============================================================================

macro_rules! int_binop {
    ($(#[$doc:meta])* $name:ident, $pop:ident, $variant:ident, $op:ident) => {
        $(#[$doc])*
        pub fn $name(stack: &mut Stack) -> Result<(), RuntimeError> {
            let c2 = stack.$pop()?;
            let c1 = stack.$pop()?;
            stack.push(Value::$variant(c1.$op(c2)));
            Ok(())
        }
    };
}

int_binop!(
    /// i32.add: c1 + c2 modulo 2^32
    i32_add, pop_i32, I32, wrapping_add
);
int_binop!(
    /// i32.sub: c1 - c2 modulo 2^32
    i32_sub, pop_i32, I32, wrapping_sub
);
int_binop!(
    /// i32.mul: c1 * c2 modulo 2^32
    i32_mul, pop_i32, I32, wrapping_mul
);
int_binop!(
    /// i64.add: c1 + c2 modulo 2^64
    i64_add, pop_i64, I64, wrapping_add
);
int_binop!(
    /// i64.sub: c1 - c2 modulo 2^64
    i64_sub, pop_i64, I64, wrapping_sub
);
int_binop!(
    /// i64.mul: c1 * c2 modulo 2^64
    i64_mul, pop_i64, I64, wrapping_mul
);

/// i32.div_s
/// 1. Pop c2, then c1
/// 2. If c2 is 0, trap
/// 3. If c1 is i32::MIN and c2 is -1, trap (2^31 is not representable)
/// 4. Push c1 / c2, truncated toward zero
pub fn i32_div_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    if c2 == 0 {
        return Err(RuntimeError::IntegerDivideByZero);
    }
    if c1 == i32::MIN && c2 == -1 {
        return Err(RuntimeError::IntegerOverflow);
    }
    stack.push(Value::I32(c1 / c2));
    Ok(())
}

/// i32.div_u: operands reinterpreted as unsigned; traps on a zero divisor
pub fn i32_div_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()? as u32;
    let c1 = stack.pop_i32()? as u32;
    if c2 == 0 {
        return Err(RuntimeError::IntegerDivideByZero);
    }
    stack.push(Value::I32((c1 / c2) as i32));
    Ok(())
}

/// i32.rem_s
///
/// The sign of the result follows the dividend. `i32::MIN % -1` is 0 rather
/// than a trap.
pub fn i32_rem_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()?;
    let c1 = stack.pop_i32()?;
    if c2 == 0 {
        return Err(RuntimeError::IntegerDivideByZero);
    }
    stack.push(Value::I32(c1.wrapping_rem(c2)));
    Ok(())
}

/// i32.rem_u
pub fn i32_rem_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i32()? as u32;
    let c1 = stack.pop_i32()? as u32;
    if c2 == 0 {
        return Err(RuntimeError::IntegerDivideByZero);
    }
    stack.push(Value::I32((c1 % c2) as i32));
    Ok(())
}

/// i64.div_s, see [`i32_div_s`]
pub fn i64_div_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    if c2 == 0 {
        return Err(RuntimeError::IntegerDivideByZero);
    }
    if c1 == i64::MIN && c2 == -1 {
        return Err(RuntimeError::IntegerOverflow);
    }
    stack.push(Value::I64(c1 / c2));
    Ok(())
}

/// i64.div_u
pub fn i64_div_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()? as u64;
    let c1 = stack.pop_i64()? as u64;
    if c2 == 0 {
        return Err(RuntimeError::IntegerDivideByZero);
    }
    stack.push(Value::I64((c1 / c2) as i64));
    Ok(())
}

/// i64.rem_s
pub fn i64_rem_s(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()?;
    let c1 = stack.pop_i64()?;
    if c2 == 0 {
        return Err(RuntimeError::IntegerDivideByZero);
    }
    stack.push(Value::I64(c1.wrapping_rem(c2)));
    Ok(())
}

/// i64.rem_u
pub fn i64_rem_u(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_i64()? as u64;
    let c1 = stack.pop_i64()? as u64;
    if c2 == 0 {
        return Err(RuntimeError::IntegerDivideByZero);
    }
    stack.push(Value::I64((c1 % c2) as i64));
    Ok(())
}

// ============================================================================
// Integer unary operations
// ============================================================================

macro_rules! int_bitcount {
    ($(#[$doc:meta])* $name:ident, $pop:ident, $variant:ident, $op:ident) => {
        $(#[$doc])*
        pub fn $name(stack: &mut Stack) -> Result<(), RuntimeError> {
            let c1 = stack.$pop()?;
            stack.push(Value::$variant(c1.$op() as _));
            Ok(())
        }
    };
}

int_bitcount!(
    /// i32.clz: count of leading zero bits (32 for zero)
    i32_clz, pop_i32, I32, leading_zeros
);
int_bitcount!(
    /// i32.ctz: count of trailing zero bits (32 for zero)
    i32_ctz, pop_i32, I32, trailing_zeros
);
int_bitcount!(
    /// i32.popcnt: count of set bits
    i32_popcnt, pop_i32, I32, count_ones
);
int_bitcount!(
    /// i64.clz
    i64_clz, pop_i64, I64, leading_zeros
);
int_bitcount!(
    /// i64.ctz
    i64_ctz, pop_i64, I64, trailing_zeros
);
int_bitcount!(
    /// i64.popcnt
    i64_popcnt, pop_i64, I64, count_ones
);

// ============================================================================
// f64 arithmetic
// ============================================================================

/// f64.add
pub fn f64_add(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_f64()?;
    let c1 = stack.pop_f64()?;
    stack.push(Value::F64(c1 + c2));
    Ok(())
}

/// f64.sub
pub fn f64_sub(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_f64()?;
    let c1 = stack.pop_f64()?;
    stack.push(Value::F64(c1 - c2));
    Ok(())
}

/// f64.mul
pub fn f64_mul(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_f64()?;
    let c1 = stack.pop_f64()?;
    stack.push(Value::F64(c1 * c2));
    Ok(())
}

/// f64.div: IEEE 754 division; a zero divisor yields an infinity or NaN,
/// never a trap
pub fn f64_div(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c2 = stack.pop_f64()?;
    let c1 = stack.pop_f64()?;
    stack.push(Value::F64(c1 / c2));
    Ok(())
}

/// f64.sqrt
pub fn f64_sqrt(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_f64()?;
    stack.push(Value::F64(c1.sqrt()));
    Ok(())
}

/// f64.abs: clears the sign bit, NaN payloads included
pub fn f64_abs(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_f64()?;
    stack.push(Value::F64(c1.abs()));
    Ok(())
}

/// f64.neg: flips the sign bit
pub fn f64_neg(stack: &mut Stack) -> Result<(), RuntimeError> {
    let c1 = stack.pop_f64()?;
    stack.push(Value::F64(-c1));
    Ok(())
}
