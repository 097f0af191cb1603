//! Process and descriptor syscalls

use super::{consume, guest_memory_ref, guest_offset, ExecveArgs, HostOutcome};
use crate::runtime::{RuntimeError, Stack, Store};

/// exit(status): terminate the host process, never returns
pub(super) fn sys_exit(_store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    let status = args[0];
    consume(stack, args)?;
    log::debug!("sys_exit({status}) terminating process");
    std::process::exit(status)
}

/// kill(pid, sig)
pub(super) fn sys_kill(_store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    let (pid, sig) = (args[0], args[1]);
    consume(stack, args)?;
    // SAFETY: kill takes plain integers
    HostOutcome::capture(unsafe { libc::kill(pid, sig) }).into_result()
}

/// pause(): blocks until a signal arrives
///
/// pause only ever returns -1 with EINTR, so it always ends in `SyscallFailed`.
pub(super) fn sys_pause(_store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    consume(stack, args)?;
    // SAFETY: pause has no arguments
    HostOutcome::capture(unsafe { libc::pause() }).into_result()
}

/// getpid(): cannot fail
pub(super) fn sys_getpid(_store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    consume(stack, args)?;
    // SAFETY: getpid has no arguments and always succeeds
    Ok(unsafe { libc::getpid() })
}

/// execve(filename_ptr, argv_ptr, envp_ptr)
///
/// Only returns on failure; on success the host process image is replaced.
pub(super) fn sys_execve(store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    let (filename, argv, envp) = (guest_offset(args[0]), guest_offset(args[1]), guest_offset(args[2]));

    let decoded = {
        let memory = guest_memory_ref(store, stack)?;
        ExecveArgs::decode(&memory, filename, argv, envp)?
    };
    log::debug!(
        "sys_execve({:?}, argv={:?}, envc={})",
        decoded.filename,
        decoded.argv,
        decoded.envp.len()
    );

    let argv_ptrs = decoded.argv_ptrs();
    let envp_ptrs = decoded.envp_ptrs();
    consume(stack, args)?;
    // SAFETY: filename and both null-terminated arrays point into `decoded`,
    // which outlives the call
    HostOutcome::capture(unsafe { libc::execve(decoded.filename.as_ptr(), argv_ptrs.as_ptr(), envp_ptrs.as_ptr()) })
        .into_result()
}

/// fork(): returns the child's pid in the parent and 0 in the child
pub(super) fn sys_fork(_store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    consume(stack, args)?;
    // SAFETY: the child continues running this single-threaded VM on its own copy of memory
    HostOutcome::capture(unsafe { libc::fork() }).into_result()
}

/// vfork(): served by fork
///
/// A vfork child may not return from the calling function, but the guest
/// child keeps running the VM after this handler returns. fork gives the same
/// observable results without sharing the parent's address space.
pub(super) fn sys_vfork(store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    sys_fork(store, stack, args)
}

/// dup2(oldfd, newfd)
pub(super) fn sys_dup2(_store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    let (oldfd, newfd) = (args[0], args[1]);
    consume(stack, args)?;
    // SAFETY: dup2 takes plain descriptors; an invalid one is reported through errno
    HostOutcome::capture(unsafe { libc::dup2(oldfd, newfd) }).into_result()
}
