//! Module instantiation
//!
//! [`instantiate`] runs a fixed pipeline over a decoded [`Module`]:
//!
//! 1. resolve imports against the [`ImportObject`]
//! 2. allocate functions, tables, memories and globals (imports first, so
//!    they occupy the low indices of each index space)
//! 3. evaluate global initializers
//! 4. bind exports
//! 5. copy active data segments into memory
//! 6. copy element segments into table 0
//! 7. run the start function
//!
//! The order matters: each phase reads what the earlier ones allocated.

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use log::debug;

use super::executor::{eval_const, invoke};
use super::imports::ImportObject;
use super::memory::Memory;
use super::store::{Extern, Func, Global, SharedGlobal, SharedMemory, SharedTable, WasmFunc};
use super::table::Table;
use super::{RuntimeError, Value};
use crate::config::Config;
use crate::parser::instruction::Instruction;
use crate::parser::module::{Code, ExportDesc, FuncType, ImportDesc, Module};

/// The runtime state one instance owns or shares: every index space of the
/// module, imports included.
#[derive(Default)]
pub struct InstanceContext {
    pub(crate) config: Config,
    pub(crate) functions: Vec<Func>,
    pub(crate) tables: Vec<SharedTable>,
    pub(crate) memories: Vec<SharedMemory>,
    pub(crate) globals: Vec<SharedGlobal>,
    /// Instances whose guest functions this one imports
    pub(crate) linked: Vec<Rc<InstanceContext>>,
}

impl InstanceContext {
    pub(crate) fn function(&self, idx: u32) -> Result<&Func, RuntimeError> {
        self.functions
            .get(idx as usize)
            .ok_or(RuntimeError::FunctionIndexOutOfBounds(idx))
    }

    pub(crate) fn table(&self, idx: u32) -> Result<&SharedTable, RuntimeError> {
        self.tables
            .get(idx as usize)
            .ok_or_else(|| RuntimeError::InvalidModule(format!("no table {idx}")))
    }

    pub(crate) fn memory(&self, idx: u32) -> Result<&SharedMemory, RuntimeError> {
        self.memories
            .get(idx as usize)
            .ok_or_else(|| RuntimeError::MemoryError(format!("no memory {idx}")))
    }

    pub(crate) fn global(&self, idx: u32) -> Result<&SharedGlobal, RuntimeError> {
        self.globals
            .get(idx as usize)
            .ok_or(RuntimeError::GlobalIndexOutOfBounds(idx))
    }
}

/// Import bindings sorted into the four index spaces
#[derive(Default)]
struct Resolved {
    functions: Vec<Func>,
    tables: Vec<SharedTable>,
    memories: Vec<SharedMemory>,
    globals: Vec<SharedGlobal>,
    linked: Vec<Rc<InstanceContext>>,
}

fn resolve_imports(module: &Module, imports: &ImportObject) -> Result<Resolved, RuntimeError> {
    let mut resolved = Resolved::default();

    for import in module.imports() {
        let value = imports.resolve(&import.module, &import.name)?;
        let incompatible = || RuntimeError::IncompatibleImport {
            module: import.module.clone(),
            name: import.name.clone(),
            expected: import.desc.kind().to_string(),
            actual: value.kind().to_string(),
        };

        // kinds must agree; signatures and limits are not compared
        match (&import.desc, value) {
            (ImportDesc::Func(_), Extern::Function(f)) => {
                if let Func::Wasm(wasm) = f {
                    resolved.linked.push(wasm.context()?);
                }
                resolved.functions.push(f.clone())
            }
            (ImportDesc::Table(_), Extern::Table(t)) => resolved.tables.push(Rc::clone(t)),
            (ImportDesc::Memory(_), Extern::Memory(m)) => resolved.memories.push(Rc::clone(m)),
            (ImportDesc::Global(_), Extern::Global(g)) => resolved.globals.push(Rc::clone(g)),
            _ => return Err(incompatible()),
        }
    }

    Ok(resolved)
}

/// Pairs each declared function with its type and body.
fn function_bodies(module: &Module) -> Result<Vec<(FuncType, Code)>, RuntimeError> {
    let functions = module.functions();
    let codes = module.codes();
    if functions.len() != codes.len() {
        return Err(RuntimeError::InvalidModule(format!(
            "{} function declarations but {} bodies",
            functions.len(),
            codes.len()
        )));
    }

    functions
        .iter()
        .zip(codes)
        .map(|(&type_idx, code)| {
            let ty = module
                .types()
                .get(type_idx as usize)
                .ok_or(RuntimeError::InvalidFunctionType(type_idx))?;
            Ok((ty.clone(), code.clone()))
        })
        .collect()
}

/// Evaluates an offset expression to an unsigned 32-bit offset.
fn eval_offset(ctx: &InstanceContext, expr: &[Instruction]) -> Result<u32, RuntimeError> {
    match eval_const(ctx, expr, ctx.globals.len())? {
        Value::I32(offset) => Ok(offset as u32),
        other => Err(RuntimeError::TypeMismatch {
            expected: "i32".to_string(),
            actual: other.typ().to_string(),
        }),
    }
}

pub(crate) fn instantiate(module: &Module, imports: &ImportObject, config: &Config) -> Result<Instance, RuntimeError> {
    // 1. imports
    let resolved = resolve_imports(module, imports)?;
    if config.debug {
        debug!(
            "resolved {} imports: {} functions, {} tables, {} memories, {} globals",
            module.imports().len(),
            resolved.functions.len(),
            resolved.tables.len(),
            resolved.memories.len(),
            resolved.globals.len()
        );
    }

    // 2. allocation
    let bodies = function_bodies(module)?;

    let mut tables = resolved.tables;
    for table_type in module.tables() {
        tables.push(Rc::new(RefCell::new(Table::from_type(table_type)?)));
    }

    let mut memories = resolved.memories;
    for memory_type in module.memories() {
        let memory = Memory::new(memory_type.limits.min, memory_type.limits.max)?;
        memories.push(Rc::new(RefCell::new(memory)));
    }

    let imported_globals = resolved.globals.len();
    let mut globals = resolved.globals;
    for global in module.globals() {
        let placeholder = Global::new(global.ty, Value::default_for(global.ty.value_type))?;
        globals.push(Rc::new(placeholder));
    }

    let mut functions = resolved.functions;
    let context = Rc::new_cyclic(|weak| {
        functions.extend(
            bodies
                .into_iter()
                .map(|(ty, code)| Func::Wasm(Rc::new(WasmFunc::new(ty, code, weak.clone())))),
        );
        InstanceContext {
            config: config.clone(),
            functions,
            tables,
            memories,
            globals,
            linked: resolved.linked,
        }
    });
    if config.debug {
        debug!(
            "allocated {} functions, {} tables, {} memories, {} globals",
            context.functions.len(),
            context.tables.len(),
            context.memories.len(),
            context.globals.len()
        );
    }

    // 3. global initializers; each may read the globals before it
    for (i, global) in module.globals().iter().enumerate() {
        let idx = imported_globals + i;
        let value = eval_const(&context, &global.init, idx)?;
        if value.typ() != global.ty.value_type {
            return Err(RuntimeError::TypeMismatch {
                expected: global.ty.value_type.to_string(),
                actual: value.typ().to_string(),
            });
        }
        context.globals[idx].set_unchecked(value);
    }

    // 4. exports
    let mut exports = HashMap::new();
    for export in module.exports() {
        let value = match export.desc {
            ExportDesc::Func(idx) => Extern::Function(context.function(idx)?.clone()),
            ExportDesc::Table(idx) => Extern::Table(Rc::clone(context.table(idx)?)),
            ExportDesc::Memory(idx) => Extern::Memory(Rc::clone(context.memory(idx)?)),
            ExportDesc::Global(idx) => Extern::Global(Rc::clone(context.global(idx)?)),
        };
        exports.insert(export.name.clone(), value);
    }

    // 5. data segments
    for data in module.data() {
        let Some(offset_expr) = data.offset() else {
            continue;
        };
        let offset = eval_offset(&context, offset_expr)?;
        context
            .memory(data.memory_index())?
            .borrow_mut()
            .write(offset as u64, &data.bytes)?;
        if config.debug {
            debug!("data segment: {} bytes at {}", data.bytes.len(), offset);
        }
    }

    // 6. element segments; the table is not grown to fit
    for element in module.elements() {
        let offset = eval_offset(&context, &element.offset)?;
        let funcs = element
            .func_indices
            .iter()
            .map(|&idx| context.function(idx).cloned())
            .collect::<Result<Vec<_>, _>>()?;
        context.table(0)?.borrow_mut().init(offset, &funcs)?;
        if config.debug {
            debug!("element segment: {} functions at {}", funcs.len(), offset);
        }
    }

    // 7. start
    if let Some(start) = module.start() {
        let func = context.function(start)?.clone();
        if config.debug {
            debug!("running start function {start}");
        }
        invoke(&func, vec![], 1)?;
    }

    Ok(Instance { context, exports })
}

/// An instantiated module
///
/// Dropping the instance invalidates its guest functions: an exported
/// [`Func`] held by the host fails with [`RuntimeError::InstanceDropped`]
/// once the instance is gone. An instance that imported one of those
/// functions keeps the exporting instance alive, so linking through an
/// [`ImportObject`] is unaffected. Guest functions reached only through a
/// shared table are not kept alive this way.
pub struct Instance {
    context: Rc<InstanceContext>,
    exports: HashMap<String, Extern>,
}

impl Instance {
    pub fn export(&self, name: &str) -> Option<&Extern> {
        self.exports.get(name)
    }

    pub fn exports(&self) -> impl Iterator<Item = (&str, &Extern)> {
        self.exports.iter().map(|(name, value)| (name.as_str(), value))
    }

    /// Exported function `name`
    pub fn func(&self, name: &str) -> Result<&Func, RuntimeError> {
        self.export(name)
            .and_then(Extern::as_func)
            .ok_or_else(|| RuntimeError::UnknownExport(name.to_string()))
    }

    pub fn memory(&self, name: &str) -> Result<&SharedMemory, RuntimeError> {
        self.export(name)
            .and_then(Extern::as_memory)
            .ok_or_else(|| RuntimeError::UnknownExport(name.to_string()))
    }

    pub fn table(&self, name: &str) -> Result<&SharedTable, RuntimeError> {
        self.export(name)
            .and_then(Extern::as_table)
            .ok_or_else(|| RuntimeError::UnknownExport(name.to_string()))
    }

    pub fn global(&self, name: &str) -> Result<&SharedGlobal, RuntimeError> {
        self.export(name)
            .and_then(Extern::as_global)
            .ok_or_else(|| RuntimeError::UnknownExport(name.to_string()))
    }

    /// Invoke an exported function by name
    pub fn invoke(&self, name: &str, args: &[Value]) -> Result<Option<Value>, RuntimeError> {
        self.func(name)?.call(args)
    }

    pub fn config(&self) -> &Config {
        &self.context.config
    }
}
