//! Syscall identifiers
//!
//! Numbers follow the Linux x86_64 syscall table:
//! <https://github.com/torvalds/linux/blob/master/arch/x86/entry/syscalls/syscall_64.tbl>

use once_cell::sync::Lazy;
use std::collections::HashMap;
use std::fmt;

/// An emulated syscall
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum Syscall {
    Dup2 = 33,
    Pause = 34,
    Nanosleep = 35,
    Getpid = 39,
    Socket = 41,
    Connect = 42,
    Accept = 43,
    Sendto = 44,
    Recvfrom = 45,
    Shutdown = 48,
    Bind = 49,
    Listen = 50,
    Fork = 57,
    Vfork = 58,
    Execve = 59,
    Exit = 60,
    Kill = 62,
}

static BY_NUMBER: Lazy<HashMap<u32, Syscall>> =
    Lazy::new(|| Syscall::ALL.iter().map(|&syscall| (syscall.number(), syscall)).collect());

static BY_NAME: Lazy<HashMap<&'static str, Syscall>> =
    Lazy::new(|| Syscall::ALL.iter().map(|&syscall| (syscall.name(), syscall)).collect());

impl Syscall {
    /// Every syscall in the table
    pub const ALL: [Syscall; 17] = [
        Syscall::Exit,
        Syscall::Kill,
        Syscall::Pause,
        Syscall::Getpid,
        Syscall::Execve,
        Syscall::Fork,
        Syscall::Vfork,
        Syscall::Socket,
        Syscall::Shutdown,
        Syscall::Connect,
        Syscall::Bind,
        Syscall::Listen,
        Syscall::Accept,
        Syscall::Sendto,
        Syscall::Recvfrom,
        Syscall::Dup2,
        Syscall::Nanosleep,
    ];

    pub fn from_number(number: u32) -> Option<Syscall> {
        BY_NUMBER.get(&number).copied()
    }

    pub fn from_name(name: &str) -> Option<Syscall> {
        BY_NAME.get(name).copied()
    }

    pub fn number(self) -> u32 {
        self as u32
    }

    pub fn name(self) -> &'static str {
        match self {
            Syscall::Exit => "exit",
            Syscall::Kill => "kill",
            Syscall::Pause => "pause",
            Syscall::Getpid => "getpid",
            Syscall::Execve => "execve",
            Syscall::Fork => "fork",
            Syscall::Vfork => "vfork",
            Syscall::Socket => "socket",
            Syscall::Shutdown => "shutdown",
            Syscall::Connect => "connect",
            Syscall::Bind => "bind",
            Syscall::Listen => "listen",
            Syscall::Accept => "accept",
            Syscall::Sendto => "sendto",
            Syscall::Recvfrom => "recvfrom",
            Syscall::Dup2 => "dup2",
            Syscall::Nanosleep => "nanosleep",
        }
    }

    /// Number of i32 operands the handler consumes
    pub fn arity(self) -> usize {
        match self {
            Syscall::Pause | Syscall::Getpid | Syscall::Fork | Syscall::Vfork => 0,
            Syscall::Exit => 1,
            Syscall::Kill | Syscall::Shutdown | Syscall::Listen | Syscall::Dup2 => 2,
            Syscall::Execve | Syscall::Socket | Syscall::Connect | Syscall::Bind | Syscall::Accept => 3,
            Syscall::Sendto | Syscall::Recvfrom | Syscall::Nanosleep => 6,
        }
    }

    /// Whether any operand is a pointer into guest memory
    pub fn uses_memory(self) -> bool {
        matches!(
            self,
            Syscall::Execve
                | Syscall::Connect
                | Syscall::Bind
                | Syscall::Accept
                | Syscall::Sendto
                | Syscall::Recvfrom
                | Syscall::Nanosleep
        )
    }

    /// Syscalls that terminate, replace or duplicate the host process
    pub fn is_process_control(self) -> bool {
        matches!(self, Syscall::Exit | Syscall::Execve | Syscall::Fork | Syscall::Vfork)
    }
}

impl fmt::Display for Syscall {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sys_{}", self.name())
    }
}
