//! Byte-addressable buffers used as compress/decompress endpoints.
//!
//! The codec only needs indexed access to a contiguous region and the
//! ability to size that region before it writes. Where the bytes live
//! (heap, memory-mapped file, caller-owned slice) is the implementor's
//! business.

#[cfg(feature = "mmap")]
use std::fs::{File, OpenOptions};
#[cfg(feature = "mmap")]
use std::path::Path;

#[cfg(feature = "mmap")]
use memmap2::{MmapMut, MmapOptions};

use crate::error::{Error, Result};

/// A fixed-size, random-access byte region that can be resized before use.
pub trait ByteBuffer {
    /// The current contents.
    fn as_slice(&self) -> &[u8];

    /// The current contents, writable.
    fn as_mut_slice(&mut self) -> &mut [u8];

    /// Make `new_len` bytes available at the front of the buffer.
    ///
    /// Growable buffers change size to exactly `new_len`. Fixed-size buffers
    /// accept any `new_len` up to their length and keep the bytes past it;
    /// callers use only the leading `new_len` bytes.
    ///
    /// # Errors
    /// Returns `Error::BufferTooSmall` if the backing store cannot grow that far.
    fn resize(&mut self, new_len: usize) -> Result<()>;

    /// Current size in bytes.
    fn len(&self) -> usize {
        self.as_slice().len()
    }

    /// Whether the buffer holds no bytes.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Read the byte at `index`.
    fn read(&self, index: usize) -> Option<u8> {
        self.as_slice().get(index).copied()
    }

    /// Overwrite the byte at `index`; returns `false` if out of range.
    fn write(&mut self, index: usize, byte: u8) -> bool {
        match self.as_mut_slice().get_mut(index) {
            Some(slot) => {
                *slot = byte;
                true
            }
            None => false,
        }
    }
}

impl ByteBuffer for Vec<u8> {
    fn as_slice(&self) -> &[u8] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }

    fn resize(&mut self, new_len: usize) -> Result<()> {
        if new_len > self.len() {
            self.try_reserve_exact(new_len - self.len())?;
        }
        Vec::resize(self, new_len, 0);
        Ok(())
    }
}

/// A bare slice cannot change size. Shrinking succeeds and leaves the tail
/// in place; growing fails.
impl ByteBuffer for [u8] {
    fn as_slice(&self) -> &[u8] {
        self
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        self
    }

    fn resize(&mut self, new_len: usize) -> Result<()> {
        if new_len <= self.len() {
            return Ok(());
        }
        Err(Error::BufferTooSmall {
            required: new_len as u64,
            available: self.len() as u64,
        })
    }
}

/// A caller-owned slice viewed as a buffer whose capacity is the slice length.
///
/// Resizing only moves the logical end; growing past the slice fails.
#[derive(Debug)]
pub struct SliceBuffer<'a> {
    storage: &'a mut [u8],
    len: usize,
}

impl<'a> SliceBuffer<'a> {
    /// Wrap `storage`, initially using all of it.
    pub fn new(storage: &'a mut [u8]) -> Self {
        let len = storage.len();
        Self { storage, len }
    }

    /// Total bytes available for growth.
    pub fn capacity(&self) -> usize {
        self.storage.len()
    }
}

impl ByteBuffer for SliceBuffer<'_> {
    fn as_slice(&self) -> &[u8] {
        &self.storage[..self.len]
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.storage[..self.len]
    }

    fn resize(&mut self, new_len: usize) -> Result<()> {
        if new_len > self.storage.len() {
            return Err(Error::BufferTooSmall {
                required: new_len as u64,
                available: self.storage.len() as u64,
            });
        }
        if new_len > self.len {
            self.storage[self.len..new_len].fill(0);
        }
        self.len = new_len;
        Ok(())
    }
}

/// A file mapped read-write into memory.
///
/// Resizing sets the file length and remaps it, so bytes written through
/// the buffer land in the file without an intermediate copy. A zero-length
/// file is not mapped at all.
#[cfg(feature = "mmap")]
#[derive(Debug)]
pub struct MmapBuffer {
    file: File,
    map: Option<MmapMut>,
}

#[cfg(feature = "mmap")]
impl MmapBuffer {
    /// Create (or truncate) the file at `path` and size it to `len` bytes.
    pub fn create<P: AsRef<Path>>(path: P, len: usize) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;
        file.set_len(len as u64)?;
        let map = map_file(&file, len)?;
        Ok(Self { file, map })
    }

    /// Map an existing file at its current length.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(path)?;
        let len = usize::try_from(file.metadata()?.len()).map_err(|_| {
            Error::AllocationFailure("file does not fit the address space".to_string())
        })?;
        let map = map_file(&file, len)?;
        Ok(Self { file, map })
    }

    /// Write dirty pages back to the file.
    pub fn flush(&self) -> Result<()> {
        if let Some(map) = &self.map {
            map.flush()?;
        }
        Ok(())
    }
}

#[cfg(feature = "mmap")]
fn map_file(file: &File, len: usize) -> Result<Option<MmapMut>> {
    if len == 0 {
        return Ok(None);
    }
    // SAFETY: the mapping is owned by the buffer together with its file;
    // other processes changing the file underneath it is not supported.
    let map = unsafe { MmapOptions::new().len(len).map_mut(file)? };
    Ok(Some(map))
}

#[cfg(feature = "mmap")]
impl ByteBuffer for MmapBuffer {
    fn as_slice(&self) -> &[u8] {
        self.map.as_deref().unwrap_or(&[])
    }

    fn as_mut_slice(&mut self) -> &mut [u8] {
        match &mut self.map {
            Some(map) => &mut map[..],
            None => &mut [],
        }
    }

    fn resize(&mut self, new_len: usize) -> Result<()> {
        if new_len == self.len() {
            return Ok(());
        }
        if let Some(map) = self.map.take() {
            map.flush()?;
        }
        self.file.set_len(new_len as u64)?;
        self.map = map_file(&self.file, new_len)?;
        Ok(())
    }
}
