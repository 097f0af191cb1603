//! Syscall bridge between guest code and the host operating system
//!
//! Guest code pushes i32 operands and traps with a syscall number. The
//! instruction loop hands the trap to [`dispatch`], which runs the handler for
//! that syscall against the live [`Store`] and [`Stack`].
//!
//! # Handler contract
//!
//! Every handler goes through the same steps, in order:
//!
//! 1. Capability check against [`SyscallConfig`]
//! 2. Arity check (`StackUnderflow`) and i32 type check (`TypeMismatch`) on the
//!    top operands, without removing them
//! 3. Guest memory resolution for pointer operands (`NoMemory`,
//!    `MemoryNotFound`, `OutOfBounds`)
//! 4. Operands are removed, the host primitive is called
//! 5. Host failure becomes `SyscallFailed`; success pushes one i32
//!
//! A failure in steps 1-3 leaves the stack exactly as it was. Operands are
//! popped last-pushed first, so the last argument of a call is the value on
//! top of the stack.
//!
//! # Guest pointers
//!
//! A guest pointer is an i32 reinterpreted as an unsigned offset into the
//! current module's memory 0. Every region is bounds-checked through
//! [`Memory::slice`](crate::runtime::Memory::slice) before use.

pub mod args;
pub mod config;
pub mod host;
mod process;
mod socket;
pub mod types;

pub use args::ExecveArgs;
pub use config::{SyscallConfig, SyscallConfigBuilder};
pub use host::{HostOutcome, SockAddrBuf};
pub use types::Syscall;

use crate::runtime::{Memory, RuntimeError, SharedMemory, Stack, StackSnapshot, Store, Value};
use std::cell::{Ref, RefMut};

/// Signature shared by every handler: takes the decoded operands in push
/// order and returns the value to push
type Handler = fn(&Store, &mut Stack, &[i32]) -> Result<i32, RuntimeError>;

/// A failed syscall, raised back to the instruction loop
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
#[error("[syscall][{label}] {error}")]
pub struct SyscallTrap {
    /// Syscall number as trapped by the guest
    pub number: u32,
    /// `sys_<name>`, or `unknown` for numbers outside the table
    pub label: String,
    #[source]
    pub error: RuntimeError,
    /// Stack state at the point of failure
    pub stack: StackSnapshot,
}

impl SyscallTrap {
    fn new(number: u32, error: RuntimeError, stack: &Stack) -> Self {
        let label = match Syscall::from_number(number) {
            Some(syscall) => syscall.to_string(),
            None => "unknown".to_string(),
        };
        SyscallTrap {
            number,
            label,
            error,
            stack: stack.snapshot(),
        }
    }

    pub fn syscall(&self) -> Option<Syscall> {
        Syscall::from_number(self.number)
    }

    /// The underlying error kind
    pub fn kind(&self) -> &RuntimeError {
        &self.error
    }
}

/// Run the handler for syscall `number`
pub fn dispatch(number: u32, store: &Store, stack: &mut Stack, config: &SyscallConfig) -> Result<(), SyscallTrap> {
    match Syscall::from_number(number) {
        Some(syscall) => syscall.invoke(store, stack, config),
        None => {
            log::debug!("unknown syscall {number}");
            Err(SyscallTrap::new(number, RuntimeError::UnknownSyscall(number), stack))
        }
    }
}

impl Syscall {
    /// Run this syscall's handler
    pub fn invoke(self, store: &Store, stack: &mut Stack, config: &SyscallConfig) -> Result<(), SyscallTrap> {
        log::debug!("{self} (arity {}, {} operands available)", self.arity(), stack.value_num());
        self.run(store, stack, config)
            .map_err(|error| SyscallTrap::new(self.number(), error, stack))
    }

    fn run(self, store: &Store, stack: &mut Stack, config: &SyscallConfig) -> Result<(), RuntimeError> {
        config.check(self)?;
        let args = stack.peek_i32_args(self.arity())?;
        log::trace!("{self} args {args:?}");

        let ret = (self.handler())(store, stack, &args)?;
        stack.push(Value::I32(ret));
        Ok(())
    }

    fn handler(self) -> Handler {
        match self {
            Syscall::Exit => process::sys_exit,
            Syscall::Kill => process::sys_kill,
            Syscall::Pause => process::sys_pause,
            Syscall::Getpid => process::sys_getpid,
            Syscall::Execve => process::sys_execve,
            Syscall::Fork => process::sys_fork,
            Syscall::Vfork => process::sys_vfork,
            Syscall::Dup2 => process::sys_dup2,
            Syscall::Socket => socket::sys_socket,
            Syscall::Shutdown => socket::sys_shutdown,
            Syscall::Connect => socket::sys_connect,
            Syscall::Bind => socket::sys_bind,
            Syscall::Listen => socket::sys_listen,
            Syscall::Accept => socket::sys_accept,
            Syscall::Sendto => socket::sys_sendto,
            Syscall::Recvfrom => socket::sys_recvfrom,
            Syscall::Nanosleep => socket::sys_nanosleep,
        }
    }
}

/// Memory 0 of the module executing in the current frame
fn guest_memory<'s>(store: &'s Store, stack: &Stack) -> Result<&'s SharedMemory, RuntimeError> {
    let frame = stack.current_frame()?;
    let addr = frame.module.memory_addr(0)?;
    store.memory(addr)
}

/// Borrow memory 0 of the current module for reading
///
/// Fails with `MemoryError` instead of panicking when the embedder holds a
/// conflicting borrow.
fn guest_memory_ref<'s>(store: &'s Store, stack: &Stack) -> Result<Ref<'s, Memory>, RuntimeError> {
    guest_memory(store, stack)?
        .try_borrow()
        .map_err(|e| RuntimeError::MemoryError(format!("guest memory is in use: {e}")))
}

/// Borrow memory 0 of the current module for writing
fn guest_memory_mut<'s>(store: &'s Store, stack: &Stack) -> Result<RefMut<'s, Memory>, RuntimeError> {
    guest_memory(store, stack)?
        .try_borrow_mut()
        .map_err(|e| RuntimeError::MemoryError(format!("guest memory is in use: {e}")))
}

/// Reinterpret a guest pointer operand as a memory offset
fn guest_offset(ptr: i32) -> u32 {
    ptr as u32
}

/// Validate a guest length operand
fn guest_len(len: i32) -> Result<usize, RuntimeError> {
    usize::try_from(len).map_err(|_| RuntimeError::InvalidLength(len as i64))
}

/// Remove the handler's operands once validation is complete
fn consume(stack: &mut Stack, args: &[i32]) -> Result<(), RuntimeError> {
    stack.discard(args.len())
}
