//! WebAssembly runtime implementation
//!
//! This module provides the execution engine for decoded modules: runtime
//! objects (memories, tables, globals, functions), the host import object,
//! the instantiation pipeline and the tree-walking instruction interpreter.

pub mod control;
pub mod executor;
pub mod frame;
pub mod implemented;
pub mod imports;
pub mod instance;
pub mod memory;
pub mod ops;
pub mod stack;
pub mod store;
pub mod table;
pub mod test_utils;
pub mod value;

pub use imports::ImportObject;
pub use instance::Instance;
pub use memory::Memory;
pub use store::{Extern, Func, Global, SharedGlobal, SharedMemory, SharedTable};
pub use table::Table;
pub use value::Value;

use crate::config::Config;
use crate::parser::module::Module;

#[derive(Debug, thiserror::Error)]
pub enum RuntimeError {
    #[error("Stack underflow")]
    StackUnderflow,
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
    #[error("Unresolved import: {module}.{name}")]
    UnresolvedImport { module: String, name: String },
    #[error("Incompatible import {module}.{name}: expected {expected}, got {actual}")]
    IncompatibleImport {
        module: String,
        name: String,
        expected: String,
        actual: String,
    },
    #[error("Unknown export: {0}")]
    UnknownExport(String),
    #[error("Invalid module: {0}")]
    InvalidModule(String),
    #[error("Function index out of bounds: {0}")]
    FunctionIndexOutOfBounds(u32),
    #[error("Invalid function type index: {0}")]
    InvalidFunctionType(u32),
    #[error("Local variable index out of bounds: {0}")]
    LocalIndexOutOfBounds(u32),
    #[error("Global variable index out of bounds: {0}")]
    GlobalIndexOutOfBounds(u32),
    #[error("Out of bounds memory access: {len} bytes at {addr}")]
    MemoryOutOfBounds { addr: u64, len: usize },
    #[error("Memory error: {0}")]
    MemoryError(String),
    #[error("Integer divide by zero")]
    IntegerDivideByZero,
    #[error("Integer overflow")]
    IntegerOverflow,
    #[error("Invalid conversion: {0}")]
    InvalidConversion(String),
    #[error("Unreachable executed")]
    Unreachable,
    #[error("Indirect call failed: no function at table index {0}")]
    IndirectCallFailed(u32),
    #[error("Table index out of bounds: {0}")]
    TableIndexOutOfBounds(u32),
    #[error("Unimplemented instruction: {0}")]
    UnimplementedInstruction(String),
    #[error("Invalid label: {0}")]
    InvalidLabel(u32),
    #[error("Invalid constant expression: {0}")]
    InvalidConstExpr(String),
    #[error("Call stack overflow")]
    CallStackOverflow,
    #[error("Cannot set immutable global")]
    ImmutableGlobal,
    #[error("Instance dropped")]
    InstanceDropped,
    #[error("Host error: {0}")]
    Host(String),
}

/// Instantiates decoded modules under a fixed [`Config`]
#[derive(Debug, Clone, Default)]
pub struct Interpreter {
    config: Config,
}

impl Interpreter {
    pub fn new(config: Config) -> Self {
        Interpreter { config }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs the instantiation pipeline: import resolution, allocation of
    /// functions, tables, memories and globals, export binding, data and
    /// element segment initialization, then the start function.
    pub fn instantiate(&self, module: &Module, imports: &ImportObject) -> Result<Instance, RuntimeError> {
        instance::instantiate(module, imports, &self.config)
    }
}

/// Instantiates `module` with the default configuration.
pub fn instantiate(module: &Module, imports: &ImportObject) -> Result<Instance, RuntimeError> {
    Interpreter::default().instantiate(module, imports)
}
