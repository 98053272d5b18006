//! Host import object
//!
//! Maps `(module, field)` pairs to the host objects a module may import.
//! Instantiation looks every import up here and fails with
//! [`RuntimeError::UnresolvedImport`] when a binding is missing.

use std::collections::HashMap;

use super::instance::Instance;
use super::store::{Extern, Func, SharedGlobal, SharedMemory, SharedTable};
use super::RuntimeError;

/// Container for host objects that a module can import
#[derive(Debug, Clone, Default)]
pub struct ImportObject {
    modules: HashMap<String, HashMap<String, Extern>>,
}

impl ImportObject {
    /// Create a new empty import object
    pub fn new() -> Self {
        Self::default()
    }

    /// Binds `module.name`, replacing any earlier binding.
    pub fn insert(&mut self, module: impl Into<String>, name: impl Into<String>, value: impl Into<Extern>) {
        self.modules
            .entry(module.into())
            .or_default()
            .insert(name.into(), value.into());
    }

    /// Add a function import
    pub fn add_function(&mut self, module: impl Into<String>, name: impl Into<String>, func: Func) {
        self.insert(module, name, func);
    }

    /// Add a memory import
    pub fn add_memory(&mut self, module: impl Into<String>, name: impl Into<String>, memory: SharedMemory) {
        self.insert(module, name, memory);
    }

    /// Add a table import
    pub fn add_table(&mut self, module: impl Into<String>, name: impl Into<String>, table: SharedTable) {
        self.insert(module, name, table);
    }

    /// Add a global import
    pub fn add_global(&mut self, module: impl Into<String>, name: impl Into<String>, global: SharedGlobal) {
        self.insert(module, name, global);
    }

    /// Makes every export of `instance` importable under `module`.
    pub fn add_instance(&mut self, module: impl Into<String>, instance: &Instance) {
        let fields = self.modules.entry(module.into()).or_default();
        for (name, value) in instance.exports() {
            fields.insert(name.to_string(), value.clone());
        }
    }

    pub fn get(&self, module: &str, name: &str) -> Option<&Extern> {
        self.modules.get(module)?.get(name)
    }

    /// Like [`ImportObject::get`], failing with `UnresolvedImport`.
    pub fn resolve(&self, module: &str, name: &str) -> Result<&Extern, RuntimeError> {
        self.get(module, name).ok_or_else(|| RuntimeError::UnresolvedImport {
            module: module.to_string(),
            name: name.to_string(),
        })
    }

    pub fn contains(&self, module: &str, name: &str) -> bool {
        self.get(module, name).is_some()
    }

    /// Total number of bindings
    pub fn len(&self) -> usize {
        self.modules.values().map(HashMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::module::FuncType;
    use crate::runtime::{Memory, Value};
    use std::cell::RefCell;
    use std::rc::Rc;

    #[test]
    fn test_function_import() {
        let mut imports = ImportObject::new();
        imports.add_function(
            "env",
            "answer",
            Func::wrap(FuncType::default(), |_| Ok(Some(Value::I32(42)))),
        );

        let func = imports.get("env", "answer").and_then(Extern::as_func).unwrap();
        assert_eq!(func.call(&[]).unwrap(), Some(Value::I32(42)));
        assert!(imports.get("env", "missing").is_none());
        assert!(imports.get("other", "answer").is_none());
    }

    #[test]
    fn test_shared_memory_binding() {
        let memory = Rc::new(RefCell::new(Memory::from_bytes(vec![0; 8])));
        let mut imports = ImportObject::new();
        imports.add_memory("js", "mem", memory.clone());

        let bound = imports.get("js", "mem").and_then(Extern::as_memory).unwrap();
        bound.borrow_mut().write_u8(3, 7).unwrap();
        assert_eq!(memory.borrow().read_u8(3).unwrap(), 7);
        assert_eq!(imports.len(), 1);
    }

    #[test]
    fn test_resolve_missing() {
        let imports = ImportObject::new();
        assert!(imports.is_empty());
        match imports.resolve("env", "f") {
            Err(RuntimeError::UnresolvedImport { module, name }) => {
                assert_eq!(module, "env");
                assert_eq!(name, "f");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_insert_replaces() {
        let mut imports = ImportObject::new();
        imports.insert("env", "m", Extern::memory(Memory::from_bytes(vec![1])));
        imports.insert("env", "m", Extern::memory(Memory::from_bytes(vec![2])));
        let memory = imports.get("env", "m").and_then(Extern::as_memory).unwrap();
        assert_eq!(memory.borrow().data(), &[2]);
        assert!(imports.contains("env", "m"));
    }
}
