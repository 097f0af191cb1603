//! Host call plumbing
//!
//! Host primitives report failure through `errno`. [`HostOutcome::capture`]
//! reads it in the same expression as the call, so nothing can clobber it
//! between the call and the check.

use crate::runtime::RuntimeError;
use std::io;
use std::mem;

/// The return value of a host primitive together with its error, if any
#[derive(Debug)]
pub struct HostOutcome<T> {
    pub ret: T,
    pub error: Option<io::Error>,
}

impl<T> HostOutcome<T>
where
    T: Copy + PartialEq + From<i8>,
{
    /// Wrap the return value of a primitive that signals failure with -1
    ///
    /// Must be applied directly to the call expression.
    pub fn capture(ret: T) -> Self {
        let error = if ret == T::from(-1) {
            Some(io::Error::last_os_error())
        } else {
            None
        };
        HostOutcome { ret, error }
    }

    /// Translate a failed call into `SyscallFailed` with the host's description
    pub fn into_result(self) -> Result<T, RuntimeError> {
        match self.error {
            None => Ok(self.ret),
            Some(error) => {
                log::debug!("host call failed: {error}");
                Err(RuntimeError::SyscallFailed(error.to_string()))
            }
        }
    }
}

/// A socket address staged in host memory
///
/// Guest address bytes are copied into an aligned `sockaddr_storage` so the
/// host never reads guest memory through a cast pointer.
pub struct SockAddrBuf {
    storage: libc::sockaddr_storage,
    len: libc::socklen_t,
}

impl SockAddrBuf {
    /// Largest address the buffer can hold
    pub const CAPACITY: usize = mem::size_of::<libc::sockaddr_storage>();

    fn zeroed() -> libc::sockaddr_storage {
        // SAFETY: sockaddr_storage is plain old data; all-zero is a valid value
        unsafe { mem::zeroed() }
    }

    /// Stage an address read from guest memory
    pub fn from_guest(bytes: &[u8]) -> Result<Self, RuntimeError> {
        if bytes.len() > Self::CAPACITY {
            return Err(RuntimeError::InvalidLength(bytes.len() as i64));
        }
        let mut storage = Self::zeroed();
        // SAFETY: bytes.len() <= size_of::<sockaddr_storage>() and the regions cannot overlap
        unsafe {
            std::ptr::copy_nonoverlapping(
                bytes.as_ptr(),
                &mut storage as *mut libc::sockaddr_storage as *mut u8,
                bytes.len(),
            );
        }
        Ok(SockAddrBuf {
            storage,
            len: bytes.len() as libc::socklen_t,
        })
    }

    /// An empty buffer for the host to fill in, advertising `capacity` bytes
    pub fn for_output(capacity: u32) -> Self {
        let len = (capacity as usize).min(Self::CAPACITY);
        SockAddrBuf {
            storage: Self::zeroed(),
            len: len as libc::socklen_t,
        }
    }

    pub fn as_ptr(&self) -> *const libc::sockaddr {
        &self.storage as *const libc::sockaddr_storage as *const libc::sockaddr
    }

    pub fn as_mut_ptr(&mut self) -> *mut libc::sockaddr {
        &mut self.storage as *mut libc::sockaddr_storage as *mut libc::sockaddr
    }

    /// Address length as reported to or by the host
    pub fn len(&self) -> libc::socklen_t {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len_mut(&mut self) -> &mut libc::socklen_t {
        &mut self.len
    }

    /// The staged bytes, at most `len` and never past the storage
    pub fn bytes(&self) -> &[u8] {
        let n = (self.len as usize).min(Self::CAPACITY);
        // SAFETY: n is within the storage, which lives as long as &self
        unsafe { std::slice::from_raw_parts(&self.storage as *const libc::sockaddr_storage as *const u8, n) }
    }
}

impl std::fmt::Debug for SockAddrBuf {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SockAddrBuf")
            .field("len", &self.len)
            .field("bytes", &hex::encode(self.bytes()))
            .finish()
    }
}
