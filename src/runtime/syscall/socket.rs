//! Socket syscalls
//!
//! Socket addresses cross the guest boundary by copy: guest bytes are staged
//! in a [`SockAddrBuf`] before the call, and addresses the host returns are
//! written back through the bounds-checked writers afterwards. Data buffers
//! are handed to the host as bounds-checked slices of guest memory.

use super::{consume, guest_len, guest_memory_mut, guest_memory_ref, guest_offset, HostOutcome, SockAddrBuf};
use crate::runtime::{Memory, RuntimeError, Stack, Store};
use std::ptr;

/// socket(domain, type, protocol)
pub(super) fn sys_socket(_store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    let (domain, ty, protocol) = (args[0], args[1], args[2]);
    consume(stack, args)?;
    // SAFETY: socket takes plain integers
    HostOutcome::capture(unsafe { libc::socket(domain, ty, protocol) }).into_result()
}

/// shutdown(sockfd, how)
pub(super) fn sys_shutdown(_store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    let (sockfd, how) = (args[0], args[1]);
    consume(stack, args)?;
    // SAFETY: shutdown takes plain integers
    HostOutcome::capture(unsafe { libc::shutdown(sockfd, how) }).into_result()
}

/// listen(sockfd, backlog)
pub(super) fn sys_listen(_store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    let (sockfd, backlog) = (args[0], args[1]);
    consume(stack, args)?;
    // SAFETY: listen takes plain integers
    HostOutcome::capture(unsafe { libc::listen(sockfd, backlog) }).into_result()
}

/// connect(sockfd, addr_ptr, addrlen)
pub(super) fn sys_connect(store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    let sockfd = args[0];
    let addr = stage_address(&*guest_memory_ref(store, stack)?, args[1], args[2])?;
    log::trace!("sys_connect({sockfd}, {addr:?})");
    consume(stack, args)?;
    // SAFETY: addr is a live sockaddr_storage holding addr.len() initialised bytes
    HostOutcome::capture(unsafe { libc::connect(sockfd, addr.as_ptr(), addr.len()) }).into_result()
}

/// bind(sockfd, addr_ptr, addrlen)
pub(super) fn sys_bind(store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    let sockfd = args[0];
    let addr = stage_address(&*guest_memory_ref(store, stack)?, args[1], args[2])?;
    log::trace!("sys_bind({sockfd}, {addr:?})");
    consume(stack, args)?;
    // SAFETY: addr is a live sockaddr_storage holding addr.len() initialised bytes
    HostOutcome::capture(unsafe { libc::bind(sockfd, addr.as_ptr(), addr.len()) }).into_result()
}

/// accept(sockfd, addr_ptr, addrlen_ptr)
///
/// A zero `addrlen_ptr` asks for no peer address. `addr_ptr` is an ordinary
/// guest offset, 0 included.
pub(super) fn sys_accept(store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    let sockfd = args[0];
    let mut memory = guest_memory_mut(store, stack)?;
    let mut peer = PeerAddress::request(&memory, args[1], args[2])?;
    consume(stack, args)?;

    let (addr_ptr, len_ptr) = PeerAddress::host_ptrs(&mut peer);
    // SAFETY: the pointers are null or point into `peer`, which outlives the call
    let fd = HostOutcome::capture(unsafe { libc::accept(sockfd, addr_ptr, len_ptr) }).into_result()?;

    if let Some(peer) = &peer {
        log::trace!("sys_accept({sockfd}) -> {fd} from {:?}", peer.buf);
        peer.write_back(&mut memory)?;
    }
    Ok(fd)
}

/// sendto(sockfd, buf_ptr, len, flags, dest_addr_ptr, addrlen)
///
/// An `addrlen` of zero sends without a destination address.
pub(super) fn sys_sendto(store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    let (sockfd, buf, flags) = (args[0], guest_offset(args[1]), args[3]);
    let len = guest_len(args[2])?;
    let memory = guest_memory_ref(store, stack)?;

    let data = memory.slice(buf, len)?;
    let dest = if args[5] == 0 {
        None
    } else {
        Some(stage_address(&memory, args[4], args[5])?)
    };
    log::trace!("sys_sendto({sockfd}, {len} bytes, flags {flags:#x}, {dest:?})");
    consume(stack, args)?;

    let (dest_ptr, dest_len) = match &dest {
        Some(addr) => (addr.as_ptr(), addr.len()),
        None => (ptr::null(), 0),
    };
    // SAFETY: data is a live slice of guest memory of exactly `len` bytes and
    // dest is null or a live staged address
    let sent = HostOutcome::capture(unsafe {
        libc::sendto(sockfd, data.as_ptr() as *const libc::c_void, len, flags, dest_ptr, dest_len)
    })
    .into_result()?;
    to_i32(sent)
}

/// recvfrom(sockfd, buf_ptr, len, flags, src_addr_ptr, addrlen_ptr)
///
/// A zero `addrlen_ptr` asks for no source address.
pub(super) fn sys_recvfrom(store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    let (sockfd, buf, flags) = (args[0], guest_offset(args[1]), args[3]);
    let len = guest_len(args[2])?;
    let mut memory = guest_memory_mut(store, stack)?;

    memory.slice(buf, len)?;
    let mut source = PeerAddress::request(&memory, args[4], args[5])?;
    consume(stack, args)?;

    let (addr_ptr, len_ptr) = PeerAddress::host_ptrs(&mut source);
    let received = {
        let data = memory.slice_mut(buf, len)?;
        // SAFETY: data is a live, exclusively borrowed slice of exactly `len`
        // bytes; the address pointers are null or point into `source`
        HostOutcome::capture(unsafe {
            libc::recvfrom(sockfd, data.as_mut_ptr() as *mut libc::c_void, len, flags, addr_ptr, len_ptr)
        })
        .into_result()?
    };

    if let Some(source) = &source {
        log::trace!("sys_recvfrom({sockfd}) {received} bytes from {:?}", source.buf);
        source.write_back(&mut memory)?;
    }
    to_i32(received)
}

/// nanosleep: takes recvfrom's six operands and performs a recvfrom
///
/// The name promises a sleep, but the handler has always decoded and issued a
/// socket receive. Kept as is until the intended contract is confirmed.
pub(super) fn sys_nanosleep(store: &Store, stack: &mut Stack, args: &[i32]) -> Result<i32, RuntimeError> {
    log::warn!("sys_nanosleep is routed to recvfrom, not a sleep primitive");
    sys_recvfrom(store, stack, args)
}

/// Copy a guest socket address into host memory
fn stage_address(memory: &Memory, ptr: i32, len: i32) -> Result<SockAddrBuf, RuntimeError> {
    SockAddrBuf::from_guest(memory.slice(guest_offset(ptr), guest_len(len)?)?)
}

fn to_i32(n: isize) -> Result<i32, RuntimeError> {
    i32::try_from(n).map_err(|_| RuntimeError::SyscallFailed(format!("result {n} does not fit in i32")))
}

/// An address the host fills in, plus where it goes in guest memory
struct PeerAddress {
    addr_ptr: u32,
    len_ptr: u32,
    capacity: u32,
    buf: SockAddrBuf,
}

impl PeerAddress {
    /// Validate the guest's address buffer and read its advertised capacity
    ///
    /// Only the length slot can opt out: offset 0 is a valid address buffer.
    fn request(memory: &Memory, addr_ptr: i32, len_ptr: i32) -> Result<Option<Self>, RuntimeError> {
        if len_ptr == 0 {
            return Ok(None);
        }
        let (addr_ptr, len_ptr) = (guest_offset(addr_ptr), guest_offset(len_ptr));
        let capacity = memory.read_u32(len_ptr)?;
        memory.slice(addr_ptr, capacity as usize)?;
        Ok(Some(PeerAddress {
            addr_ptr,
            len_ptr,
            capacity,
            buf: SockAddrBuf::for_output(capacity),
        }))
    }

    fn host_ptrs(peer: &mut Option<Self>) -> (*mut libc::sockaddr, *mut libc::socklen_t) {
        match peer {
            Some(peer) => {
                let addr = peer.buf.as_mut_ptr();
                (addr, peer.buf.len_mut() as *mut libc::socklen_t)
            }
            None => (ptr::null_mut(), ptr::null_mut()),
        }
    }

    /// Copy the returned address back, truncated to the guest's capacity,
    /// and store the full length the host reported
    fn write_back(&self, memory: &mut Memory) -> Result<(), RuntimeError> {
        let bytes = self.buf.bytes();
        let n = bytes.len().min(self.capacity as usize);
        memory.write_bytes(self.addr_ptr, &bytes[..n])?;
        memory.write_u32(self.len_ptr, self.buf.len())
    }
}
