//! Module instance

use super::{MemoryAddr, RuntimeError};

/// A module instance
///
/// Only the part the syscall layer consumes is modelled: the table mapping the
/// module's local memory indices to store-global addresses. It is populated
/// at instantiation and never changes afterwards.
#[derive(Debug, Clone, Default)]
pub struct ModuleInstance {
    name: String,
    memaddrs: Vec<MemoryAddr>,
}

impl ModuleInstance {
    pub fn new(name: impl Into<String>, memaddrs: Vec<MemoryAddr>) -> Self {
        ModuleInstance {
            name: name.into(),
            memaddrs,
        }
    }

    /// Module name, for diagnostics
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Local memory index -> store address table
    pub fn memaddrs(&self) -> &[MemoryAddr] {
        &self.memaddrs
    }

    /// Resolve a local memory index
    ///
    /// Fails with `NoMemory` when the module declares no memory at all.
    pub fn memory_addr(&self, index: u32) -> Result<MemoryAddr, RuntimeError> {
        if self.memaddrs.is_empty() {
            return Err(RuntimeError::NoMemory);
        }
        self.memaddrs
            .get(index as usize)
            .copied()
            .ok_or(RuntimeError::NoMemory)
    }
}
