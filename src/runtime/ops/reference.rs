//! Reference and table operations
//!
//! `ref.null`, `ref.is_null` and `ref.func`, plus element access on a table
//! (`table.get`, `table.set`, `table.size`). Out of range table indices trap
//! with `TableIndexOutOfBounds`.

use super::*;
use crate::parser::module::RefType;
use crate::runtime::store::Func;
use crate::runtime::table::Table;

/// ref.null t
pub fn ref_null(stack: &mut Stack, ref_type: RefType) -> Result<(), RuntimeError> {
    stack.push(match ref_type {
        RefType::FuncRef => Value::FuncRef(None),
        RefType::ExternRef => Value::ExternRef(None),
    });
    Ok(())
}

/// ref.is_null: pushes 1 for a null reference, 0 otherwise
pub fn ref_is_null(stack: &mut Stack) -> Result<(), RuntimeError> {
    let value = stack.pop()?;
    let is_null = value.is_null_ref().ok_or_else(|| RuntimeError::TypeMismatch {
        expected: "reference".to_string(),
        actual: value.typ().to_string(),
    })?;
    stack.push(Value::I32(is_null as i32));
    Ok(())
}

/// ref.func x: the function is resolved by the caller
pub fn ref_func(stack: &mut Stack, func: Func) -> Result<(), RuntimeError> {
    stack.push(Value::FuncRef(Some(func)));
    Ok(())
}

/// table.get: [i32] -> [funcref]
pub fn table_get(stack: &mut Stack, table: &Table) -> Result<(), RuntimeError> {
    let index = stack.pop_i32()? as u32;
    let element = table.get(index)?;
    stack.push(Value::FuncRef(element));
    Ok(())
}

/// table.set: [i32 funcref] -> []
pub fn table_set(stack: &mut Stack, table: &mut Table) -> Result<(), RuntimeError> {
    let element = match stack.pop()? {
        Value::FuncRef(f) => f,
        other => {
            return Err(RuntimeError::TypeMismatch {
                expected: "funcref".to_string(),
                actual: other.typ().to_string(),
            })
        }
    };
    let index = stack.pop_i32()? as u32;
    table.set(index, element)
}

/// table.size: current number of slots
pub fn table_size(stack: &mut Stack, table: &Table) -> Result<(), RuntimeError> {
    stack.push(Value::I32(table.size() as i32));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::instruction::Instruction;
    use crate::parser::module::{FuncType, Limits, ValueType};
    use crate::runtime::test_utils::test::ExecutorTest;

    #[test]
    fn null_refs() {
        ExecutorTest::new()
            .inst(Instruction::RefNull {
                ref_type: RefType::FuncRef,
            })
            .inst(Instruction::RefIsNull)
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(1)]);
        ExecutorTest::new()
            .inst(Instruction::RefNull {
                ref_type: RefType::ExternRef,
            })
            .returns(vec![ValueType::ExternRef])
            .expect_stack(vec![Value::ExternRef(None)]);
    }

    #[test]
    fn is_null_rejects_numbers() {
        ExecutorTest::new()
            .inst(Instruction::I32Const { value: 0 })
            .inst(Instruction::RefIsNull)
            .expect_error("Type mismatch");
    }

    #[test]
    fn table_ops_on_stack() {
        let f = Func::wrap(FuncType::default(), |_| Ok(None));
        let mut table = Table::new(Limits::new(2, None)).unwrap();
        let mut stack = Stack::new();

        stack.push(Value::I32(1));
        stack.push(Value::FuncRef(Some(f.clone())));
        table_set(&mut stack, &mut table).unwrap();

        stack.push(Value::I32(1));
        table_get(&mut stack, &table).unwrap();
        assert_eq!(stack.pop().unwrap(), Value::FuncRef(Some(f)));

        table_size(&mut stack, &table).unwrap();
        assert_eq!(stack.pop().unwrap(), Value::I32(2));

        stack.push(Value::I32(2));
        assert!(matches!(
            table_get(&mut stack, &table),
            Err(RuntimeError::TableIndexOutOfBounds(2))
        ));
    }

    #[test]
    fn table_get_through_executor() {
        ExecutorTest::new()
            .with_table(3)
            .inst(Instruction::I32Const { value: 0 })
            .inst(Instruction::TableGet { table_idx: 0 })
            .inst(Instruction::RefIsNull)
            .inst(Instruction::TableSize { table_idx: 0 })
            .inst(Instruction::Numeric(crate::parser::instruction::NumericOp::I32Add))
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(4)]);
    }
}
