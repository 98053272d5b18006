//! Runtime objects shared between instances and the host
//!
//! Functions, tables, memories and globals are reference counted so the host
//! can hand the same object to several instantiations through the import
//! object. Writes through one handle are visible through every other.
//!
//! ```text
//!   ImportObject ──"env"."mem"──► Rc<RefCell<Memory>> ◄── instance A memories[0]
//!                                         ▲
//!                                         └────────────── instance B memories[0]
//! ```
//!
//! Guest functions hold a weak reference back to the instance that defined
//! them, so a function stored in another instance's table still runs against
//! its own memories, tables and globals.

use std::cell::RefCell;
use std::fmt;
use std::rc::{Rc, Weak};

use super::executor;
use super::instance::InstanceContext;
use super::memory::Memory;
use super::table::Table;
use super::{RuntimeError, Value};
use crate::parser::module::{Code, FuncType, GlobalType};

/// Memory shared by reference between the host and instances
pub type SharedMemory = Rc<RefCell<Memory>>;

/// Table shared by reference between the host and instances
pub type SharedTable = Rc<RefCell<Table>>;

/// Global shared by reference between the host and instances. The value
/// lives in a `RefCell` inside [`Global`] because function references are
/// not `Copy`.
pub type SharedGlobal = Rc<Global>;

/// Signature of a host callback: positional arguments in, at most one
/// result out. An `Err` aborts the calling guest function unchanged.
pub type HostCallback = dyn Fn(&[Value]) -> Result<Option<Value>, RuntimeError>;

/// A native function supplied by the host
#[derive(Clone)]
pub struct HostFunc {
    ty: FuncType,
    callback: Rc<HostCallback>,
}

impl HostFunc {
    pub fn ty(&self) -> &FuncType {
        &self.ty
    }

    pub fn call(&self, args: &[Value]) -> Result<Option<Value>, RuntimeError> {
        (self.callback)(args)
    }
}

/// A function defined by a module
pub struct WasmFunc {
    ty: FuncType,
    code: Code,
    context: Weak<InstanceContext>,
}

impl WasmFunc {
    pub(crate) fn new(ty: FuncType, code: Code, context: Weak<InstanceContext>) -> Self {
        WasmFunc { ty, code, context }
    }

    pub fn ty(&self) -> &FuncType {
        &self.ty
    }

    pub fn code(&self) -> &Code {
        &self.code
    }

    /// The defining instance, if it is still alive
    pub(crate) fn context(&self) -> Result<Rc<InstanceContext>, RuntimeError> {
        self.context.upgrade().ok_or(RuntimeError::InstanceDropped)
    }
}

/// A callable: either a host function or a guest function
#[derive(Clone)]
pub enum Func {
    Host(HostFunc),
    Wasm(Rc<WasmFunc>),
}

impl Func {
    /// Wraps a host closure as a function of type `ty`.
    pub fn wrap<F>(ty: FuncType, callback: F) -> Self
    where
        F: Fn(&[Value]) -> Result<Option<Value>, RuntimeError> + 'static,
    {
        Func::Host(HostFunc {
            ty,
            callback: Rc::new(callback),
        })
    }

    pub fn ty(&self) -> &FuncType {
        match self {
            Func::Host(host) => host.ty(),
            Func::Wasm(wasm) => wasm.ty(),
        }
    }

    /// Reference identity
    pub fn same(&self, other: &Func) -> bool {
        match (self, other) {
            (Func::Host(a), Func::Host(b)) => Rc::ptr_eq(&a.callback, &b.callback),
            (Func::Wasm(a), Func::Wasm(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Calls the function from the host. Arguments are checked against the
    /// function type; the result is the single result value, if any.
    pub fn call(&self, args: &[Value]) -> Result<Option<Value>, RuntimeError> {
        check_args(self.ty(), args)?;
        executor::invoke(self, args.to_vec(), 1)
    }
}

impl fmt::Debug for Func {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Func::Host(host) => write!(f, "Func::Host({})", host.ty),
            Func::Wasm(wasm) => write!(f, "Func::Wasm({})", wasm.ty),
        }
    }
}

pub(crate) fn check_args(ty: &FuncType, args: &[Value]) -> Result<(), RuntimeError> {
    if args.len() != ty.params.len() {
        return Err(RuntimeError::TypeMismatch {
            expected: format!("{} arguments", ty.params.len()),
            actual: format!("{} arguments", args.len()),
        });
    }
    for (i, (arg, expected)) in args.iter().zip(&ty.params).enumerate() {
        if arg.typ() != *expected {
            return Err(RuntimeError::TypeMismatch {
                expected: format!("{expected} for argument {i}"),
                actual: arg.typ().to_string(),
            });
        }
    }
    Ok(())
}

/// A typed, possibly mutable value cell
#[derive(Debug)]
pub struct Global {
    ty: GlobalType,
    value: RefCell<Value>,
}

impl Global {
    pub fn new(ty: GlobalType, value: Value) -> Result<Self, RuntimeError> {
        if value.typ() != ty.value_type {
            return Err(RuntimeError::TypeMismatch {
                expected: ty.value_type.to_string(),
                actual: value.typ().to_string(),
            });
        }
        Ok(Global {
            ty,
            value: RefCell::new(value),
        })
    }

    pub fn ty(&self) -> &GlobalType {
        &self.ty
    }

    pub fn get(&self) -> Value {
        self.value.borrow().clone()
    }

    /// Host-side update: the global must be mutable and the value must have
    /// the global's type.
    pub fn set(&self, value: Value) -> Result<(), RuntimeError> {
        if !self.ty.is_mutable() {
            return Err(RuntimeError::ImmutableGlobal);
        }
        if value.typ() != self.ty.value_type {
            return Err(RuntimeError::TypeMismatch {
                expected: self.ty.value_type.to_string(),
                actual: value.typ().to_string(),
            });
        }
        *self.value.borrow_mut() = value;
        Ok(())
    }

    /// Guest-side update from `global.set` and initializers
    pub(crate) fn set_unchecked(&self, value: Value) {
        *self.value.borrow_mut() = value;
    }
}

/// Anything that can be imported or exported
#[derive(Debug, Clone)]
pub enum Extern {
    Function(Func),
    Table(SharedTable),
    Memory(SharedMemory),
    Global(SharedGlobal),
}

impl Extern {
    pub fn memory(memory: Memory) -> Self {
        Extern::Memory(Rc::new(RefCell::new(memory)))
    }

    pub fn table(table: Table) -> Self {
        Extern::Table(Rc::new(RefCell::new(table)))
    }

    pub fn global(global: Global) -> Self {
        Extern::Global(Rc::new(global))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Extern::Function(_) => "function",
            Extern::Table(_) => "table",
            Extern::Memory(_) => "memory",
            Extern::Global(_) => "global",
        }
    }

    pub fn as_func(&self) -> Option<&Func> {
        match self {
            Extern::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&SharedTable> {
        match self {
            Extern::Table(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_memory(&self) -> Option<&SharedMemory> {
        match self {
            Extern::Memory(m) => Some(m),
            _ => None,
        }
    }

    pub fn as_global(&self) -> Option<&SharedGlobal> {
        match self {
            Extern::Global(g) => Some(g),
            _ => None,
        }
    }
}

impl From<Func> for Extern {
    fn from(f: Func) -> Self {
        Extern::Function(f)
    }
}

impl From<SharedMemory> for Extern {
    fn from(m: SharedMemory) -> Self {
        Extern::Memory(m)
    }
}

impl From<SharedTable> for Extern {
    fn from(t: SharedTable) -> Self {
        Extern::Table(t)
    }
}

impl From<SharedGlobal> for Extern {
    fn from(g: SharedGlobal) -> Self {
        Extern::Global(g)
    }
}
