//! Store - process-wide table of runtime instances
//!
//! The Store owns every linear memory in the process and hands out
//! [`MemoryAddr`]s for them. Modules never hold memories directly; a
//! [`ModuleInstance`](super::ModuleInstance) maps its local memory indices to
//! store-global addresses, and the syscall layer resolves them here.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │                    Store                     │
//! │  Memory Space (MemoryAddr -> SharedMemory)   │
//! │   [0]: module_a memory 0                     │
//! │   [1]: module_b memory 0                     │
//! └──────────────────────────────────────────────┘
//!        ▲                      ▲
//!   module_a.memaddrs[0]   module_b.memaddrs[0]
//! ```

use super::{Memory, RuntimeError};
use std::cell::RefCell;
use std::rc::Rc;

/// Global memory address - index into the Store's memory registry
///
/// Stable for the lifetime of the Store once assigned.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MemoryAddr(pub usize);

/// Shared memory instance
///
/// Uses Rc<RefCell<>> since the VM is single-threaded and Memory is not Copy.
/// Memory growth (outside the syscall layer) and syscall handlers both reach
/// the same buffer through this handle.
pub type SharedMemory = Rc<RefCell<Memory>>;

/// Process-wide runtime store
#[derive(Debug, Default)]
pub struct Store {
    mems: Vec<SharedMemory>,
}

impl Store {
    /// Create an empty store
    pub fn new() -> Self {
        Store { mems: Vec::new() }
    }

    /// Take ownership of a memory and assign it the next address
    pub fn allocate_memory(&mut self, memory: Memory) -> MemoryAddr {
        let addr = MemoryAddr(self.mems.len());
        self.mems.push(Rc::new(RefCell::new(memory)));
        addr
    }

    /// Look up a memory by address
    pub fn get_memory(&self, addr: MemoryAddr) -> Option<&SharedMemory> {
        self.mems.get(addr.0)
    }

    /// Look up a memory by address, failing with `MemoryNotFound`
    pub fn memory(&self, addr: MemoryAddr) -> Result<&SharedMemory, RuntimeError> {
        self.get_memory(addr).ok_or(RuntimeError::MemoryNotFound(addr))
    }

    /// Number of memories in the store
    pub fn memory_count(&self) -> usize {
        self.mems.len()
    }
}
