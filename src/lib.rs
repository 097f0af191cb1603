//! The native-syscall bridge of a stack-based WebAssembly-style virtual machine.
//!
//! Guest code cannot reach the host operating system directly. It pushes `i32`
//! operands onto the operand stack and traps with a syscall number; sysbridge
//! validates those operands, translates guest pointers into bounds-checked
//! regions of the module's linear memory, calls the host primitive and pushes
//! the result back as a guest value.
//!
//! # Modules
//!
//! - [`runtime`] -- Values, function types, linear memory, the store, the operand
//!   stack with its frame chain, and the [`runtime::syscall`] dispatch layer.
//!
//! # Example
//!
//! Call `getpid` from a frame whose module has one page of linear memory:
//!
//! ```
//! use std::rc::Rc;
//! use sysbridge::runtime::frame::CallFrame;
//! use sysbridge::runtime::instance::ModuleInstance;
//! use sysbridge::runtime::stack::Stack;
//! use sysbridge::runtime::store::Store;
//! use sysbridge::runtime::syscall::{self, Syscall, SyscallConfig};
//! use sysbridge::runtime::{Memory, Value};
//!
//! let mut store = Store::new();
//! let mem = store.allocate_memory(Memory::new(1, None).unwrap());
//! let module = Rc::new(ModuleInstance::new("guest", vec![mem]));
//!
//! let mut stack = Stack::new();
//! stack.push_frame(CallFrame::new(module, 0, vec![]));
//!
//! let config = SyscallConfig::default();
//! syscall::dispatch(Syscall::Getpid.number(), &store, &mut stack, &config).unwrap();
//! assert_eq!(stack.pop().unwrap(), Value::I32(std::process::id() as i32));
//! ```
//!
//! # Sandbox boundary
//!
//! Every guest-supplied offset is checked against the addressed memory before
//! any byte is read or written. Syscalls that escape the process boundary
//! (`exit`, `execve`, `fork`, `vfork`) are refused unless the embedder opts in
//! through [`runtime::syscall::SyscallConfig`].

pub mod runtime;
