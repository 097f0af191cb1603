//! Guest argument decoding for execve

use crate::runtime::{Memory, RuntimeError};
use std::ffi::CString;
use std::os::raw::c_char;

/// Host copies of the strings an execve call refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecveArgs {
    pub filename: CString,
    pub argv: Vec<CString>,
    pub envp: Vec<CString>,
}

impl ExecveArgs {
    /// Decode the filename string and the argv/envp vectors from guest memory
    ///
    /// Each vector is a run of NUL-terminated strings ended by an empty entry.
    pub fn decode(memory: &Memory, filename: u32, argv: u32, envp: u32) -> Result<Self, RuntimeError> {
        Ok(ExecveArgs {
            filename: to_cstring(memory.read_cstr(filename)?)?,
            argv: decode_vector(memory, argv)?,
            envp: decode_vector(memory, envp)?,
        })
    }

    /// Null-terminated pointer array for argv
    ///
    /// The pointers borrow from `self` and are valid while it is alive.
    pub fn argv_ptrs(&self) -> Vec<*const c_char> {
        null_terminated(&self.argv)
    }

    /// Null-terminated pointer array for envp
    pub fn envp_ptrs(&self) -> Vec<*const c_char> {
        null_terminated(&self.envp)
    }
}

fn to_cstring(bytes: &[u8]) -> Result<CString, RuntimeError> {
    CString::new(bytes).map_err(|e| RuntimeError::MemoryError(format!("invalid guest string: {e}")))
}

fn decode_vector(memory: &Memory, offset: u32) -> Result<Vec<CString>, RuntimeError> {
    memory
        .read_cstr_vector(offset)?
        .into_iter()
        .map(to_cstring)
        .collect()
}

fn null_terminated(strings: &[CString]) -> Vec<*const c_char> {
    strings
        .iter()
        .map(|s| s.as_ptr())
        .chain(std::iter::once(std::ptr::null()))
        .collect()
}
