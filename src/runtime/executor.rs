//! Instruction executor
//!
//! A tree-walking interpreter over decoded function bodies. Each guest call
//! gets its own [`Executor`] holding the operand stack, the frame of locals
//! and the label stack; nested calls recurse through [`invoke`] and nested
//! blocks through [`Executor::execute_block`].
//!
//! Both kinds of recursion are bounded. A guest call deeper than
//! [`crate::config::Config::max_call_depth`], or any call or block entered
//! once the native stack below the outermost guest call exceeds
//! [`crate::config::Config::max_stack_bytes`], traps with
//! [`RuntimeError::CallStackOverflow`].

use std::cell::Cell;

use log::trace;

use super::{
    control::{BlockEnd, Label, LabelStack, LabelType},
    frame::Frame,
    instance::InstanceContext,
    ops,
    stack::Stack,
    store::Func,
    RuntimeError, Value,
};
use crate::config::Config;
use crate::parser::instruction::{BlockType, Instruction, NumericOp};
use crate::parser::module::{ValueType, MAX_LOCALS};

type NumericFn = fn(&mut Stack) -> Result<(), RuntimeError>;

thread_local! {
    /// Native stack position of the outermost guest call on this thread
    static STACK_BASE: Cell<Option<usize>> = const { Cell::new(None) };
}

/// Address of a local in the caller's frame
#[inline(always)]
fn stack_position() -> usize {
    let marker = 0u8;
    std::ptr::addr_of!(marker) as usize
}

/// Marks the outermost guest call on this thread. Calls made while one is
/// active, including host functions calling back into the guest, measure
/// their stack use from the same base.
struct StackBase {
    outermost: bool,
}

impl StackBase {
    fn enter() -> Self {
        let here = stack_position();
        let outermost = STACK_BASE.with(|base| match base.get() {
            Some(_) => false,
            None => {
                base.set(Some(here));
                true
            }
        });
        StackBase { outermost }
    }
}

impl Drop for StackBase {
    fn drop(&mut self) {
        if self.outermost {
            STACK_BASE.with(|base| base.set(None));
        }
    }
}

/// Traps once the native stack used since the outermost guest call passes
/// `config.max_stack_bytes`.
fn check_stack(config: &Config) -> Result<(), RuntimeError> {
    let here = stack_position();
    let used = STACK_BASE.with(|base| base.get().map_or(0, |base| base.abs_diff(here)));
    if used > config.max_stack_bytes {
        return Err(RuntimeError::CallStackOverflow);
    }
    Ok(())
}

/// Calls `func` with `args` at nesting `depth` (1 for a call from the host).
/// Host functions are called directly. Guest functions run against the
/// instance that defined them.
pub(crate) fn invoke(func: &Func, args: Vec<Value>, depth: usize) -> Result<Option<Value>, RuntimeError> {
    match func {
        Func::Host(host) => host.call(&args),
        Func::Wasm(wasm) => {
            let ctx = wasm.context()?;
            if depth > ctx.config.max_call_depth {
                return Err(RuntimeError::CallStackOverflow);
            }
            let _base = StackBase::enter();
            check_stack(&ctx.config)?;

            let code = wasm.code();
            if code.local_count() > MAX_LOCALS {
                return Err(RuntimeError::InvalidModule(format!(
                    "{} locals declared, at most {MAX_LOCALS} allowed",
                    code.local_count()
                )));
            }
            let frame = Frame::new(args, code.local_types());
            let mut executor = Executor::new(&ctx, frame, depth);
            let mut results = executor.execute_function(&code.body, &wasm.ty().results)?;
            Ok(results.pop())
        }
    }
}

/// Evaluates a constant expression (global initializer or segment offset).
/// Only `global.get` of the first `visible_globals` globals may be read.
pub(crate) fn eval_const(
    ctx: &InstanceContext,
    expr: &[Instruction],
    visible_globals: usize,
) -> Result<Value, RuntimeError> {
    let mut executor = Executor::new(ctx, Frame::default(), 0);
    for instruction in expr {
        match instruction {
            Instruction::GlobalGet { global_idx } if *global_idx as usize >= visible_globals => {
                return Err(RuntimeError::GlobalIndexOutOfBounds(*global_idx));
            }
            Instruction::I32Const { .. }
            | Instruction::I64Const { .. }
            | Instruction::F32Const { .. }
            | Instruction::F64Const { .. }
            | Instruction::GlobalGet { .. }
            | Instruction::RefNull { .. }
            | Instruction::RefFunc { .. } => {}
            other => return Err(RuntimeError::InvalidConstExpr(other.mnemonic().to_string())),
        }
        executor.execute_instruction(instruction)?;
    }

    let value = executor.stack.pop()?;
    if !executor.stack.is_empty() {
        return Err(RuntimeError::InvalidConstExpr(format!(
            "{} values left on the stack",
            executor.stack.len() + 1
        )));
    }
    Ok(value)
}

/// Executes instructions for one function activation
pub struct Executor<'a> {
    ctx: &'a InstanceContext,
    stack: Stack,
    /// Current execution frame (contains locals)
    frame: Frame,
    /// Label stack for control flow
    label_stack: LabelStack,
    /// Nesting depth of this activation
    depth: usize,
}

impl<'a> Executor<'a> {
    pub(crate) fn new(ctx: &'a InstanceContext, frame: Frame, depth: usize) -> Self {
        Executor {
            ctx,
            stack: Stack::new(),
            frame,
            label_stack: LabelStack::new(),
            depth,
        }
    }

    /// Runs a function body and collects its results.
    ///
    /// The body itself is a branch target: `br` to the outermost label
    /// behaves like `return`.
    pub(crate) fn execute_function(
        &mut self,
        body: &[Instruction],
        return_types: &[ValueType],
    ) -> Result<Vec<Value>, RuntimeError> {
        let block_type = match return_types {
            [ty] => BlockType::Value(*ty),
            _ => BlockType::Empty,
        };
        self.label_stack.push(Label::new(LabelType::Block, block_type, 0));

        match self.execute_instructions(body)? {
            BlockEnd::Normal | BlockEnd::Return | BlockEnd::Branch(0) => {}
            BlockEnd::Branch(depth) => return Err(RuntimeError::InvalidLabel(depth)),
        }
        self.label_stack.pop();

        let mut results = Vec::with_capacity(return_types.len());
        for return_type in return_types.iter().rev() {
            results.push(self.stack.pop_typed(*return_type)?);
        }
        results.reverse();
        Ok(results)
    }

    /// Execute a sequence of instructions
    fn execute_instructions(&mut self, instructions: &[Instruction]) -> Result<BlockEnd, RuntimeError> {
        for instruction in instructions {
            match self.execute_instruction(instruction)? {
                BlockEnd::Normal => continue,
                other => return Ok(other),
            }
        }
        Ok(BlockEnd::Normal)
    }

    /// Runs `body` under a new label and absorbs a branch that targets it.
    fn execute_block(
        &mut self,
        label_type: LabelType,
        block_type: BlockType,
        body: &[Instruction],
    ) -> Result<BlockEnd, RuntimeError> {
        check_stack(&self.ctx.config)?;
        self.label_stack
            .push(Label::new(label_type, block_type, self.stack.len()));
        let result = self.execute_instructions(body);
        self.label_stack.pop();

        match result? {
            BlockEnd::Branch(0) => Ok(BlockEnd::Normal),
            BlockEnd::Branch(depth) => Ok(BlockEnd::Branch(depth - 1)),
            other => Ok(other),
        }
    }

    /// Like [`Executor::execute_block`], but a branch to the loop's own label
    /// runs the body again.
    fn execute_loop(&mut self, block_type: BlockType, body: &[Instruction]) -> Result<BlockEnd, RuntimeError> {
        check_stack(&self.ctx.config)?;
        self.label_stack
            .push(Label::new(LabelType::Loop, block_type, self.stack.len()));
        let result = loop {
            match self.execute_instructions(body) {
                Ok(BlockEnd::Branch(0)) => continue,
                Ok(BlockEnd::Branch(depth)) => break Ok(BlockEnd::Branch(depth - 1)),
                other => break other,
            }
        };
        self.label_stack.pop();
        result
    }

    /// Pops the callee's arguments, calls it one level deeper and pushes its
    /// result.
    fn call(&mut self, func: &Func) -> Result<BlockEnd, RuntimeError> {
        let args = self.stack.pop_n(func.ty().params.len())?;
        if let Some(result) = invoke(func, args, self.depth + 1)? {
            self.stack.push(result);
        }
        Ok(BlockEnd::Normal)
    }

    /// Execute a single instruction. Control flow is handled here, so the
    /// frame that recursion passes through stays small; everything else goes
    /// to the out-of-line helpers below.
    fn execute_instruction(&mut self, instruction: &Instruction) -> Result<BlockEnd, RuntimeError> {
        use Instruction::*;

        let ctx = self.ctx;
        if ctx.config.debug {
            trace!("[{}] {}", self.depth, instruction);
        }

        match instruction {
            Unreachable => ops::control::unreachable(),
            Nop => Ok(BlockEnd::Normal),
            Block { block_type, body } => self.execute_block(LabelType::Block, *block_type, body),
            Loop { block_type, body } => self.execute_loop(*block_type, body),
            If {
                block_type,
                then_branch,
                else_branch,
            } => {
                let condition = self.stack.pop_i32()?;
                if condition != 0 {
                    self.execute_block(LabelType::If, *block_type, then_branch)
                } else if let Some(else_branch) = else_branch {
                    self.execute_block(LabelType::If, *block_type, else_branch)
                } else {
                    Ok(BlockEnd::Normal)
                }
            }
            Br { label_idx } => ops::control::br(&mut self.stack, &self.label_stack, *label_idx),
            BrIf { label_idx } => ops::control::br_if(&mut self.stack, &self.label_stack, *label_idx),
            BrTable { labels, default } => ops::control::br_table(&mut self.stack, &self.label_stack, labels, *default),
            Return => ops::control::return_op(),
            Call { func_idx } => {
                let func = ctx.function(*func_idx)?;
                self.call(func)
            }
            CallIndirect { table_idx, .. } => {
                let func = self.indirect_target(*table_idx)?;
                self.call(&func)
            }
            other => {
                self.execute_simple(other)?;
                Ok(BlockEnd::Normal)
            }
        }
    }

    /// Resolves the callee of a `call_indirect`. The callee's type is not
    /// compared against the type index.
    #[inline(never)]
    fn indirect_target(&mut self, table_idx: u32) -> Result<Func, RuntimeError> {
        let index = self.stack.pop_i32()? as u32;
        let slot = self.ctx.table(table_idx)?.borrow().get(index);
        slot.ok().flatten().ok_or(RuntimeError::IndirectCallFailed(index))
    }

    /// Instructions that never branch or call
    #[inline(never)]
    fn execute_simple(&mut self, instruction: &Instruction) -> Result<(), RuntimeError> {
        use Instruction::*;

        let ctx = self.ctx;
        match instruction {
            // ----------------------------------------------------------------
            // References
            RefNull { ref_type } => ops::reference::ref_null(&mut self.stack, *ref_type),
            RefIsNull => ops::reference::ref_is_null(&mut self.stack),
            RefFunc { func_idx } => {
                let func = ctx.function(*func_idx)?.clone();
                ops::reference::ref_func(&mut self.stack, func)
            }

            // ----------------------------------------------------------------
            // Parametric
            Drop => ops::parametric::drop(&mut self.stack),
            Select | SelectTyped { .. } => ops::parametric::select(&mut self.stack),

            // ----------------------------------------------------------------
            // Variables
            LocalGet { local_idx } => ops::variable::local_get(&mut self.stack, &self.frame, *local_idx),
            LocalSet { local_idx } => ops::variable::local_set(&mut self.stack, &mut self.frame, *local_idx),
            LocalTee { local_idx } => ops::variable::local_tee(&mut self.stack, &mut self.frame, *local_idx),
            GlobalGet { global_idx } => ops::variable::global_get(&mut self.stack, ctx.global(*global_idx)?),
            GlobalSet { global_idx } => ops::variable::global_set(&mut self.stack, ctx.global(*global_idx)?),

            // ----------------------------------------------------------------
            // Tables
            TableGet { table_idx } => {
                let table = ctx.table(*table_idx)?;
                ops::reference::table_get(&mut self.stack, &table.borrow())
            }
            TableSet { table_idx } => {
                let table = ctx.table(*table_idx)?;
                ops::reference::table_set(&mut self.stack, &mut table.borrow_mut())
            }
            TableSize { table_idx } => {
                let table = ctx.table(*table_idx)?;
                ops::reference::table_size(&mut self.stack, &table.borrow())
            }

            // ----------------------------------------------------------------
            // Numeric
            I32Const { value } => ops::numeric::i32_const(&mut self.stack, *value),
            I64Const { value } => ops::numeric::i64_const(&mut self.stack, *value),
            F32Const { value } => ops::numeric::f32_const(&mut self.stack, *value),
            F64Const { value } => ops::numeric::f64_const(&mut self.stack, *value),
            Numeric(op) => {
                let execute =
                    numeric_op(*op).ok_or_else(|| RuntimeError::UnimplementedInstruction(op.mnemonic().to_string()))?;
                execute(&mut self.stack)
            }

            other => self.execute_memory(other),
        }
    }

    /// Loads, stores, `memory.size` and `memory.grow` on memory 0. Anything
    /// else reaching here decodes and encodes but does not execute.
    #[inline(never)]
    fn execute_memory(&mut self, instruction: &Instruction) -> Result<(), RuntimeError> {
        use Instruction::*;

        let ctx = self.ctx;
        macro_rules! with_memory {
            (load $op:ident($memarg:expr)) => {{
                let memory = ctx.memory(0)?;
                ops::memory::$op(&mut self.stack, &memory.borrow(), $memarg)
            }};
            (store $op:ident($memarg:expr)) => {{
                let memory = ctx.memory(0)?;
                ops::memory::$op(&mut self.stack, &mut memory.borrow_mut(), $memarg)
            }};
        }

        match instruction {
            I32Load { memarg } => with_memory!(load i32_load(memarg)),
            I64Load { memarg } => with_memory!(load i64_load(memarg)),
            F32Load { memarg } => with_memory!(load f32_load(memarg)),
            F64Load { memarg } => with_memory!(load f64_load(memarg)),
            I32Load8S { memarg } => with_memory!(load i32_load8_s(memarg)),
            I32Load8U { memarg } => with_memory!(load i32_load8_u(memarg)),
            I32Load16S { memarg } => with_memory!(load i32_load16_s(memarg)),
            I32Load16U { memarg } => with_memory!(load i32_load16_u(memarg)),
            I64Load8S { memarg } => with_memory!(load i64_load8_s(memarg)),
            I64Load8U { memarg } => with_memory!(load i64_load8_u(memarg)),
            I64Load16S { memarg } => with_memory!(load i64_load16_s(memarg)),
            I64Load16U { memarg } => with_memory!(load i64_load16_u(memarg)),
            I64Load32S { memarg } => with_memory!(load i64_load32_s(memarg)),
            I64Load32U { memarg } => with_memory!(load i64_load32_u(memarg)),
            I32Store { memarg } => with_memory!(store i32_store(memarg)),
            I64Store { memarg } => with_memory!(store i64_store(memarg)),
            F32Store { memarg } => with_memory!(store f32_store(memarg)),
            F64Store { memarg } => with_memory!(store f64_store(memarg)),
            I32Store8 { memarg } => with_memory!(store i32_store8(memarg)),
            I32Store16 { memarg } => with_memory!(store i32_store16(memarg)),
            I64Store8 { memarg } => with_memory!(store i64_store8(memarg)),
            I64Store16 { memarg } => with_memory!(store i64_store16(memarg)),
            I64Store32 { memarg } => with_memory!(store i64_store32(memarg)),
            MemorySize => {
                let memory = ctx.memory(0)?;
                ops::memory::memory_size(&mut self.stack, &memory.borrow())
            }
            MemoryGrow => {
                let memory = ctx.memory(0)?;
                ops::memory::memory_grow(&mut self.stack, &mut memory.borrow_mut())
            }

            // Decoded and encoded, but not executed
            other => Err(RuntimeError::UnimplementedInstruction(other.mnemonic().to_string())),
        }
    }
}

/// The implementation of an executable numeric instruction
pub(crate) fn numeric_op(op: NumericOp) -> Option<NumericFn> {
    use ops::{bitwise, comparison, conversion, numeric};
    use NumericOp::*;

    let f: NumericFn = match op {
        I32Eqz => comparison::i32_eqz,
        I32Eq => comparison::i32_eq,
        I32Ne => comparison::i32_ne,
        I32LtS => comparison::i32_lt_s,
        I32LtU => comparison::i32_lt_u,
        I32GtS => comparison::i32_gt_s,
        I32GtU => comparison::i32_gt_u,
        I32LeS => comparison::i32_le_s,
        I32LeU => comparison::i32_le_u,
        I32GeS => comparison::i32_ge_s,
        I32GeU => comparison::i32_ge_u,

        I64Eqz => comparison::i64_eqz,
        I64Eq => comparison::i64_eq,
        I64Ne => comparison::i64_ne,
        I64LtS => comparison::i64_lt_s,
        I64LtU => comparison::i64_lt_u,
        I64GtS => comparison::i64_gt_s,
        I64GtU => comparison::i64_gt_u,
        I64LeS => comparison::i64_le_s,
        I64LeU => comparison::i64_le_u,
        I64GeS => comparison::i64_ge_s,
        I64GeU => comparison::i64_ge_u,

        F64Eq => comparison::f64_eq,
        F64Ne => comparison::f64_ne,
        F64Lt => comparison::f64_lt,
        F64Gt => comparison::f64_gt,
        F64Le => comparison::f64_le,
        F64Ge => comparison::f64_ge,

        I32Clz => numeric::i32_clz,
        I32Ctz => numeric::i32_ctz,
        I32Popcnt => numeric::i32_popcnt,
        I32Add => numeric::i32_add,
        I32Sub => numeric::i32_sub,
        I32Mul => numeric::i32_mul,
        I32DivS => numeric::i32_div_s,
        I32DivU => numeric::i32_div_u,
        I32RemS => numeric::i32_rem_s,
        I32RemU => numeric::i32_rem_u,
        I32And => bitwise::i32_and,
        I32Or => bitwise::i32_or,
        I32Xor => bitwise::i32_xor,
        I32Shl => bitwise::i32_shl,
        I32ShrS => bitwise::i32_shr_s,
        I32ShrU => bitwise::i32_shr_u,
        I32Rotl => bitwise::i32_rotl,
        I32Rotr => bitwise::i32_rotr,

        I64Clz => numeric::i64_clz,
        I64Ctz => numeric::i64_ctz,
        I64Popcnt => numeric::i64_popcnt,
        I64Add => numeric::i64_add,
        I64Sub => numeric::i64_sub,
        I64Mul => numeric::i64_mul,
        I64DivS => numeric::i64_div_s,
        I64DivU => numeric::i64_div_u,
        I64RemS => numeric::i64_rem_s,
        I64RemU => numeric::i64_rem_u,
        I64And => bitwise::i64_and,
        I64Or => bitwise::i64_or,
        I64Xor => bitwise::i64_xor,
        I64Shl => bitwise::i64_shl,
        I64ShrS => bitwise::i64_shr_s,
        I64ShrU => bitwise::i64_shr_u,
        I64Rotl => bitwise::i64_rotl,
        I64Rotr => bitwise::i64_rotr,

        F64Abs => numeric::f64_abs,
        F64Neg => numeric::f64_neg,
        F64Sqrt => numeric::f64_sqrt,
        F64Add => numeric::f64_add,
        F64Sub => numeric::f64_sub,
        F64Mul => numeric::f64_mul,
        F64Div => numeric::f64_div,

        I32WrapI64 => conversion::i32_wrap_i64,
        I64ExtendI32S => conversion::i64_extend_i32_s,
        I64ExtendI32U => conversion::i64_extend_i32_u,
        F64ConvertI32S => conversion::f64_convert_i32_s,
        F64ConvertI32U => conversion::f64_convert_i32_u,

        I32Extend8S => conversion::i32_extend8_s,
        I32Extend16S => conversion::i32_extend16_s,
        I64Extend8S => conversion::i64_extend8_s,
        I64Extend16S => conversion::i64_extend16_s,
        I64Extend32S => conversion::i64_extend32_s,

        _ => return None,
    };
    Some(f)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::instruction::MemArg;
    use crate::parser::module::{FuncType, RefType};
    use crate::runtime::test_utils::test::ExecutorTest;
    use rstest::rstest;

    #[rstest]
    #[case(Instruction::Numeric(NumericOp::F32Add), "f32.add")]
    #[case(Instruction::Numeric(NumericOp::F64Ceil), "f64.ceil")]
    #[case(Instruction::Numeric(NumericOp::I32TruncF64S), "i32.trunc_f64_s")]
    #[case(Instruction::I32TruncSatF32S, "i32.trunc_sat_f32_s")]
    #[case(Instruction::MemoryFill, "memory.fill")]
    #[case(Instruction::TableGrow { table_idx: 0 }, "table.grow")]
    #[case(Instruction::DataDrop { data_idx: 0 }, "data.drop")]
    fn decode_only_instructions_trap(#[case] instruction: Instruction, #[case] mnemonic: &str) {
        ExecutorTest::new()
            .inst(instruction)
            .expect_error(&format!("Unimplemented instruction: {mnemonic}"));
    }

    #[test]
    fn unimplemented_trap_happens_before_operands_are_read() {
        // the stack is empty; an executed f32.add would underflow instead
        ExecutorTest::new()
            .inst(Instruction::Numeric(NumericOp::F32Mul))
            .expect_error("Unimplemented instruction");
    }

    #[test]
    fn const_expr_accepts_constants() {
        let ctx = InstanceContext::default();
        let value = eval_const(&ctx, &[Instruction::I64Const { value: -3 }], 0).unwrap();
        assert_eq!(value, Value::I64(-3));

        let value = eval_const(
            &ctx,
            &[Instruction::RefNull {
                ref_type: RefType::FuncRef,
            }],
            0,
        )
        .unwrap();
        assert_eq!(value, Value::FuncRef(None));
    }

    #[test]
    fn const_expr_rejects_other_instructions() {
        let ctx = InstanceContext::default();
        let expr = [
            Instruction::I32Const { value: 1 },
            Instruction::I32Const { value: 2 },
            Instruction::Numeric(NumericOp::I32Add),
        ];
        assert!(matches!(
            eval_const(&ctx, &expr, 0),
            Err(RuntimeError::InvalidConstExpr(m)) if m == "i32.add"
        ));
        assert!(matches!(
            eval_const(&ctx, &[Instruction::GlobalGet { global_idx: 0 }], 0),
            Err(RuntimeError::GlobalIndexOutOfBounds(0))
        ));
        assert!(matches!(eval_const(&ctx, &[], 0), Err(RuntimeError::StackUnderflow)));
        assert!(matches!(
            eval_const(&ctx, &expr[..2], 0),
            Err(RuntimeError::InvalidConstExpr(_))
        ));
    }

    #[test]
    fn result_type_is_checked() {
        ExecutorTest::new()
            .inst(Instruction::I64Const { value: 1 })
            .returns(vec![ValueType::I32])
            .expect_error("Type mismatch");
    }

    #[test]
    fn trace_logging_does_not_change_results() {
        ExecutorTest::new()
            .debug()
            .with_memory()
            .inst(Instruction::I32Const { value: 0 })
            .inst(Instruction::I32Load {
                memarg: MemArg { align: 2, offset: 0 },
            })
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(0)]);
    }

    #[test]
    fn call_host_function() {
        let double = Func::wrap(FuncType::new(vec![ValueType::I32], vec![ValueType::I32]), |args| {
            let n = args[0].as_i32().unwrap_or_default();
            Ok(Some(Value::I32(n * 2)))
        });
        ExecutorTest::new()
            .func(double)
            .inst(Instruction::I32Const { value: 21 })
            .inst(Instruction::Call { func_idx: 0 })
            .returns(vec![ValueType::I32])
            .expect_stack(vec![Value::I32(42)]);
    }

    #[test]
    fn host_error_propagates() {
        let failing = Func::wrap(FuncType::default(), |_| Err(RuntimeError::Host("boom".to_string())));
        ExecutorTest::new()
            .func(failing)
            .inst(Instruction::Call { func_idx: 0 })
            .expect_error("Host error: boom");
    }

    #[test]
    fn call_unknown_function() {
        ExecutorTest::new()
            .inst(Instruction::Call { func_idx: 3 })
            .expect_error("Function index out of bounds: 3");
    }

    #[rstest]
    #[case(1)]
    #[case(5)]
    #[case(-1)]
    fn call_indirect_without_target(#[case] index: i32) {
        ExecutorTest::new()
            .with_table(2)
            .inst(Instruction::I32Const { value: index })
            .inst(Instruction::CallIndirect {
                type_idx: 0,
                table_idx: 0,
            })
            .expect_error(&format!("Indirect call failed: no function at table index {}", index as u32));
    }
}
