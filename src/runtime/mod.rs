//! VM runtime shared state and the syscall bridge
//!
//! This module provides the value model, linear memory, the store, the operand
//! stack with its frame chain, and the syscall handlers that operate on them.

pub mod frame;
pub mod instance;
pub mod memory;
pub mod stack;
pub mod store;
pub mod syscall;
pub mod value;

pub use frame::CallFrame;
pub use instance::ModuleInstance;
pub use memory::Memory;
pub use stack::{Stack, StackSnapshot};
pub use store::{MemoryAddr, SharedMemory, Store};
pub use value::{FunctionType, Value, ValueType};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("Stack underflow")]
    StackUnderflow,
    #[error("Type mismatch: expected {expected}, got {actual}")]
    TypeMismatch { expected: String, actual: String },
    #[error("No memory exists in this module")]
    NoMemory,
    #[error("Memory {0:?} does not exist in the store")]
    MemoryNotFound(MemoryAddr),
    #[error("Out of bounds memory access: offset {offset} + length {len} exceeds memory size {size}")]
    OutOfBounds { offset: u32, len: usize, size: usize },
    #[error("Invalid length: {0}")]
    InvalidLength(i64),
    #[error("Memory error: {0}")]
    MemoryError(String),
    #[error("No active call frame")]
    NoFrame,
    #[error("{0}")]
    SyscallFailed(String),
    #[error("Capability denied: {0} is not permitted by the syscall configuration")]
    CapabilityDenied(&'static str),
    #[error("Unknown syscall: {0}")]
    UnknownSyscall(u32),
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),
}
