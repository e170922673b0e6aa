use crate::arch::PhysAddr;
use ranges::MemoryRange;
use thiserror::Error;

pub mod ranges;

/// Errors that can occur while reserving physical memory.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ReserveError {
    #[error("Out of memory")]
    OutOfMemory,
    #[error("Alignment cannot be satisfied")]
    AlignmentUnsatisfiable,
    #[error("Invalid size")]
    InvalidSize,
}

/// A reserved physical memory window that loaded segments are copied into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DestinationWindow {
    base: PhysAddr,
    size: u64,
}

impl DestinationWindow {
    #[must_use]
    #[inline]
    /// Returns `None` if the window is empty or runs past the physical address space.
    pub const fn new(base: PhysAddr, size: u64) -> Option<Self> {
        if size == 0 {
            return None;
        }
        match base.checked_add(size - 1) {
            Some(_) => Some(Self { base, size }),
            None => None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn base(&self) -> PhysAddr {
        self.base
    }

    #[must_use]
    #[inline]
    pub const fn size(&self) -> u64 {
        self.size
    }

    #[must_use]
    #[inline]
    pub const fn range(&self) -> MemoryRange {
        MemoryRange::new(self.base.as_u64(), self.base.as_u64() + (self.size - 1))
    }

    #[must_use]
    /// Returns the offset of `[addr, addr + len)` inside the window,
    /// or `None` if any byte of it falls outside.
    pub const fn offset_of(&self, addr: PhysAddr, len: u64) -> Option<u64> {
        let Some(offset) = addr.offset_from(self.base) else {
            return None;
        };
        match offset.checked_add(len) {
            Some(end) if end <= self.size => Some(offset),
            _ => None,
        }
    }
}
