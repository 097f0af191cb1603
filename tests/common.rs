//! Common test utilities shared between integration tests

#![allow(dead_code)]

use std::net::SocketAddrV4;
use std::rc::Rc;
use sysbridge::runtime::syscall::{Syscall, SyscallConfig, SyscallTrap};
use sysbridge::runtime::{CallFrame, Memory, MemoryAddr, ModuleInstance, Stack, StackSnapshot, Store, Value};

/// A store and stack with one active frame, as the instruction loop would
/// hand them to a syscall handler
pub struct Guest {
    pub store: Store,
    pub stack: Stack,
    pub config: SyscallConfig,
}

impl Guest {
    /// Module with one page of linear memory
    pub fn new() -> Self {
        let mut store = Store::new();
        let addr = store.allocate_memory(Memory::new(1, None).unwrap());
        Self::with_memaddrs(store, vec![addr])
    }

    /// Module that declares no memory
    pub fn without_memory() -> Self {
        Self::with_memaddrs(Store::new(), vec![])
    }

    /// Module whose memory index points past the store's memory table
    pub fn with_dangling_memory() -> Self {
        let mut store = Store::new();
        store.allocate_memory(Memory::new(1, None).unwrap());
        Self::with_memaddrs(store, vec![MemoryAddr(5)])
    }

    fn with_memaddrs(store: Store, memaddrs: Vec<MemoryAddr>) -> Self {
        let mut stack = Stack::new();
        stack.push_frame(CallFrame::new(Rc::new(ModuleInstance::new("guest", memaddrs)), 0, vec![]));
        Guest {
            store,
            stack,
            config: SyscallConfig::permissive(),
        }
    }

    pub fn config(mut self, config: SyscallConfig) -> Self {
        self.config = config;
        self
    }

    pub fn memory(&self) -> &sysbridge::runtime::SharedMemory {
        self.store.get_memory(MemoryAddr(0)).expect("guest has no memory")
    }

    pub fn write(&self, offset: u32, bytes: &[u8]) {
        self.memory().borrow_mut().write_bytes(offset, bytes).unwrap();
    }

    pub fn write_u32(&self, offset: u32, value: u32) {
        self.memory().borrow_mut().write_u32(offset, value).unwrap();
    }

    pub fn read(&self, offset: u32, len: usize) -> Vec<u8> {
        self.memory().borrow().read_bytes(offset, len).unwrap()
    }

    pub fn read_u32(&self, offset: u32) -> u32 {
        self.memory().borrow().read_u32(offset).unwrap()
    }

    pub fn push_args(&mut self, args: &[i32]) {
        self.stack.push_all(args.iter().map(|&a| Value::I32(a)));
    }

    pub fn call(&mut self, syscall: Syscall) -> Result<(), SyscallTrap> {
        syscall.invoke(&self.store, &mut self.stack, &self.config)
    }

    /// Push `args` and invoke `syscall`, returning the pushed result
    pub fn call_with(&mut self, syscall: Syscall, args: &[i32]) -> Result<i32, SyscallTrap> {
        self.push_args(args);
        self.call(syscall)?;
        Ok(self.stack.pop_i32().unwrap())
    }

    pub fn snapshot(&self) -> StackSnapshot {
        self.stack.snapshot()
    }
}

/// Encode an IPv4 socket address the way a guest lays out `struct sockaddr_in`
pub fn sockaddr_in(addr: SocketAddrV4) -> Vec<u8> {
    let mut bytes = vec![0u8; 16];
    bytes[0..2].copy_from_slice(&(libc::AF_INET as u16).to_ne_bytes());
    bytes[2..4].copy_from_slice(&addr.port().to_be_bytes());
    bytes[4..8].copy_from_slice(&addr.ip().octets());
    bytes
}

/// Port of a guest `sockaddr_in`
pub fn sockaddr_in_port(bytes: &[u8]) -> u16 {
    u16::from_be_bytes([bytes[2], bytes[3]])
}

/// Wait for child `pid` and return its exit code
pub fn wait_for_exit(pid: libc::pid_t) -> i32 {
    let mut status = 0;
    // SAFETY: pid is a child of this process and status is a live c_int
    assert_eq!(unsafe { libc::waitpid(pid, &mut status, 0) }, pid);
    assert!(libc::WIFEXITED(status), "child {pid} did not exit normally: {status:#x}");
    libc::WEXITSTATUS(status)
}

/// Leave a forked child without returning into the test harness
pub fn exit_child(f: impl FnOnce() -> i32) -> ! {
    let code = std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)).unwrap_or(101);
    // SAFETY: _exit skips the harness's atexit handlers, which belong to the parent
    unsafe { libc::_exit(code) }
}

/// Run `f` in a forked child and return its exit code
///
/// The child is single-threaded, so descriptor numbering inside it is not
/// disturbed by tests running in parallel.
pub fn in_child(f: impl FnOnce() -> i32) -> i32 {
    // SAFETY: the child only runs `f` and then _exits
    let pid = unsafe { libc::fork() };
    assert!(pid >= 0, "fork failed: {}", std::io::Error::last_os_error());
    if pid == 0 {
        exit_child(f);
    }
    wait_for_exit(pid)
}
