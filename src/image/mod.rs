// Mon Oct 19 2026 - Alex

use std::fmt;
use std::slice;

/// A loaded module's bytes, borrowed writable for one pass. The engine never
/// allocates, frees, or keeps hold of the memory behind it.
pub struct ModuleImage<'a> {
    name: String,
    base: u64,
    bytes: &'a mut [u8],
}

impl<'a> ModuleImage<'a> {
    pub fn new(name: &str, base: u64, bytes: &'a mut [u8]) -> Self {
        Self {
            name: name.to_string(),
            base,
            bytes,
        }
    }

    /// Wraps memory handed over by the firmware loader as base + size.
    /// Returns `None` for a null base.
    ///
    /// # Safety
    /// `base` must point to `size` bytes that are mapped writable and not
    /// accessed through any other path while the image is alive.
    pub unsafe fn from_raw(name: &str, base: *mut u8, size: usize) -> Option<Self> {
        if base.is_null() {
            return None;
        }

        Some(Self {
            name: name.to_string(),
            base: base as u64,
            bytes: slice::from_raw_parts_mut(base, size),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn base(&self) -> u64 {
        self.base
    }

    pub fn size(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn bytes(&self) -> &[u8] {
        &*self.bytes
    }

    pub fn bytes_mut(&mut self) -> &mut [u8] {
        &mut *self.bytes
    }

    pub fn address_of(&self, offset: usize) -> u64 {
        self.base + offset as u64
    }
}

impl fmt::Debug for ModuleImage<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ModuleImage")
            .field("name", &self.name)
            .field("base", &format_args!("0x{:x}", self.base))
            .field("size", &self.bytes.len())
            .finish()
    }
}
