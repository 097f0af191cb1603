//! Guest linear memory
//!
//! Every access from the syscall layer goes through [`Memory::slice`] or
//! [`Memory::slice_mut`], which check the whole `(offset, len)` range against
//! the current size. Out-of-range access fails; it is never clamped or wrapped.
//!
//! Memory layout:
//! - Page size: 64KB (65,536 bytes)
//! - Address space: 32-bit guest offsets
//! - Multi-byte values: little-endian

use super::RuntimeError;
use byteorder::{ByteOrder, LittleEndian};

/// Page size in bytes (64KB)
pub const PAGE_SIZE: usize = 65536;

/// Maximum number of pages (2^16 = 64K pages = 4GB total)
pub const MAX_PAGES: u32 = 65536;

/// A linear memory instance
#[derive(Debug)]
pub struct Memory {
    /// The actual memory data
    data: Vec<u8>,

    /// Current size in pages
    current_pages: u32,

    /// Maximum size in pages (None = default max)
    max_pages: Option<u32>,
}

impl Memory {
    /// Create a new zero-initialised memory
    ///
    /// # Errors
    /// - Initial pages exceeds maximum
    /// - Initial pages exceeds system maximum
    pub fn new(initial_pages: u32, max_pages: Option<u32>) -> Result<Self, RuntimeError> {
        if initial_pages > MAX_PAGES {
            return Err(RuntimeError::MemoryError(format!(
                "Initial memory size {initial_pages} pages exceeds maximum {MAX_PAGES} pages"
            )));
        }

        if let Some(max) = max_pages {
            if initial_pages > max {
                return Err(RuntimeError::MemoryError(format!(
                    "Initial size {initial_pages} pages exceeds specified maximum {max} pages"
                )));
            }
            if max > MAX_PAGES {
                return Err(RuntimeError::MemoryError(format!(
                    "Maximum size {max} pages exceeds system maximum {MAX_PAGES} pages"
                )));
            }
        }

        Ok(Memory {
            data: vec![0u8; initial_pages as usize * PAGE_SIZE],
            current_pages: initial_pages,
            max_pages,
        })
    }

    /// Get the current memory size in pages
    pub fn size(&self) -> u32 {
        self.current_pages
    }

    /// Get the current memory size in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Get the maximum memory size in pages (None = unbounded)
    pub fn max_pages(&self) -> Option<u32> {
        self.max_pages
    }

    /// Grow memory by the specified number of pages
    ///
    /// Returns the previous size in pages, or -1 if growth fails.
    pub fn grow(&mut self, delta_pages: u32) -> i32 {
        let current = self.current_pages;

        let Some(new_pages) = current.checked_add(delta_pages) else {
            return -1;
        };

        let effective_max = self.max_pages.unwrap_or(MAX_PAGES);
        if new_pages > effective_max {
            return -1;
        }

        let new_bytes = new_pages as usize * PAGE_SIZE;
        match self.data.try_reserve(new_bytes - self.data.len()) {
            Ok(()) => {
                self.data.resize(new_bytes, 0);
                self.current_pages = new_pages;
                current as i32
            }
            Err(_) => -1,
        }
    }

    /// Check that `[offset, offset + len)` lies inside the memory
    #[inline]
    fn check_bounds(&self, offset: u32, len: usize) -> Result<usize, RuntimeError> {
        let start = offset as usize;
        let out_of_bounds = RuntimeError::OutOfBounds {
            offset,
            len,
            size: self.data.len(),
        };

        let end = start.checked_add(len).ok_or_else(|| out_of_bounds.clone())?;
        if end > self.data.len() {
            return Err(out_of_bounds);
        }

        Ok(start)
    }

    /// Borrow `len` bytes starting at `offset`
    pub fn slice(&self, offset: u32, len: usize) -> Result<&[u8], RuntimeError> {
        let start = self.check_bounds(offset, len)?;
        Ok(&self.data[start..start + len])
    }

    /// Mutably borrow `len` bytes starting at `offset`
    pub fn slice_mut(&mut self, offset: u32, len: usize) -> Result<&mut [u8], RuntimeError> {
        let start = self.check_bounds(offset, len)?;
        Ok(&mut self.data[start..start + len])
    }

    /// Read a u8 from memory
    pub fn read_u8(&self, offset: u32) -> Result<u8, RuntimeError> {
        Ok(self.slice(offset, 1)?[0])
    }

    /// Read a u32 from memory (little-endian)
    pub fn read_u32(&self, offset: u32) -> Result<u32, RuntimeError> {
        Ok(LittleEndian::read_u32(self.slice(offset, 4)?))
    }

    /// Write a u8 to memory
    pub fn write_u8(&mut self, offset: u32, value: u8) -> Result<(), RuntimeError> {
        self.slice_mut(offset, 1)?[0] = value;
        Ok(())
    }

    /// Write a u32 to memory (little-endian)
    pub fn write_u32(&mut self, offset: u32, value: u32) -> Result<(), RuntimeError> {
        LittleEndian::write_u32(self.slice_mut(offset, 4)?, value);
        Ok(())
    }

    /// Copy a range of bytes out of memory
    pub fn read_bytes(&self, offset: u32, len: usize) -> Result<Vec<u8>, RuntimeError> {
        Ok(self.slice(offset, len)?.to_vec())
    }

    /// Copy bytes into memory
    pub fn write_bytes(&mut self, offset: u32, bytes: &[u8]) -> Result<(), RuntimeError> {
        self.slice_mut(offset, bytes.len())?.copy_from_slice(bytes);
        Ok(())
    }

    /// Read a NUL-terminated string starting at `offset`
    ///
    /// The returned bytes exclude the terminator. A string with no NUL before
    /// the end of memory is an out-of-bounds access.
    pub fn read_cstr(&self, offset: u32) -> Result<&[u8], RuntimeError> {
        let tail = self.slice(offset, self.data.len().saturating_sub(offset as usize))?;
        match tail.iter().position(|&b| b == 0) {
            Some(nul) => Ok(&tail[..nul]),
            None => Err(RuntimeError::OutOfBounds {
                offset,
                len: tail.len() + 1,
                size: self.data.len(),
            }),
        }
    }

    /// Read a vector of back-to-back NUL-terminated strings
    ///
    /// The vector ends at the first empty entry, i.e. an extra NUL directly
    /// after the previous terminator. `"a\0bc\0\0"` yields `["a", "bc"]` and a
    /// lone `"\0"` yields no entries.
    pub fn read_cstr_vector(&self, offset: u32) -> Result<Vec<&[u8]>, RuntimeError> {
        let mut entries = Vec::new();
        let mut cursor = offset;
        loop {
            let entry = self.read_cstr(cursor)?;
            if entry.is_empty() {
                return Ok(entries);
            }
            // cursor + len + 1 <= memory size
            let advance = u32::try_from(entry.len() + 1).map_err(|_| RuntimeError::OutOfBounds {
                offset: cursor,
                len: entry.len() + 1,
                size: self.data.len(),
            })?;
            entries.push(entry);
            cursor = cursor.checked_add(advance).ok_or(RuntimeError::OutOfBounds {
                offset: cursor,
                len: advance as usize,
                size: self.data.len(),
            })?;
        }
    }
}
