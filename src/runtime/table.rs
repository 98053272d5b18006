//! Function reference tables
//!
//! A table is a resizable vector of nullable function references. It backs
//! `call_indirect` and can be handed to several instances through the import
//! object, in which case element segments and host writes are visible to all
//! of them.

use super::store::Func;
use super::RuntimeError;
use crate::parser::module::{Limits, TableType};

/// Most slots a table may hold
pub const MAX_TABLE_SIZE: u32 = 10_000_000;

#[derive(Debug, Clone, Default)]
pub struct Table {
    elements: Vec<Option<Func>>,
    max: Option<u32>,
}

impl Table {
    /// A table of `limits.min` null slots
    pub fn new(limits: Limits) -> Result<Self, RuntimeError> {
        if limits.min > MAX_TABLE_SIZE {
            return Err(RuntimeError::InvalidModule(format!(
                "table of {} elements exceeds {MAX_TABLE_SIZE} elements",
                limits.min
            )));
        }
        let mut elements = Vec::new();
        elements.try_reserve_exact(limits.min as usize).map_err(|e| {
            RuntimeError::InvalidModule(format!("table of {} elements: {e}", limits.min))
        })?;
        elements.resize(limits.min as usize, None);
        Ok(Table {
            elements,
            max: limits.max,
        })
    }

    /// A table pre-populated by the host
    pub fn from_elements(elements: Vec<Option<Func>>) -> Self {
        Table { elements, max: None }
    }

    pub fn from_type(table_type: &TableType) -> Result<Self, RuntimeError> {
        Self::new(table_type.limits)
    }

    pub fn size(&self) -> u32 {
        self.elements.len() as u32
    }

    /// The slot at `index`; `None` is a null reference.
    pub fn get(&self, index: u32) -> Result<Option<Func>, RuntimeError> {
        self.elements
            .get(index as usize)
            .cloned()
            .ok_or(RuntimeError::TableIndexOutOfBounds(index))
    }

    pub fn set(&mut self, index: u32, func: Option<Func>) -> Result<(), RuntimeError> {
        let slot = self
            .elements
            .get_mut(index as usize)
            .ok_or(RuntimeError::TableIndexOutOfBounds(index))?;
        *slot = func;
        Ok(())
    }

    /// Writes `funcs` starting at `offset`. Fails without writing anything
    /// when the run does not fit.
    pub fn init(&mut self, offset: u32, funcs: &[Func]) -> Result<(), RuntimeError> {
        let start = offset as usize;
        let end = start
            .checked_add(funcs.len())
            .filter(|end| *end <= self.elements.len())
            .ok_or(RuntimeError::TableIndexOutOfBounds(offset))?;
        for (slot, func) in self.elements[start..end].iter_mut().zip(funcs) {
            *slot = Some(func.clone());
        }
        Ok(())
    }

    /// Grows by `delta` slots filled with `init`. Returns the previous size,
    /// or -1 when the maximum would be exceeded.
    pub fn grow(&mut self, delta: u32, init: Option<Func>) -> i32 {
        let old_size = self.size();
        let Some(new_size) = old_size.checked_add(delta) else {
            return -1;
        };
        if new_size > self.max.unwrap_or(MAX_TABLE_SIZE).min(MAX_TABLE_SIZE) {
            return -1;
        }
        if self.elements.try_reserve(delta as usize).is_err() {
            return -1;
        }
        self.elements.resize(new_size as usize, init);
        old_size as i32
    }
}
