//! Physical memory access used by the segment loader.
use handoff_core::{arch::PhysAddr, mem::DestinationWindow};

#[expect(clippy::result_unit_err, reason = "Writes either happen or they don't")]
/// Writes into physical memory.
pub trait PhysicalMemory {
    /// Copy `src` to physical memory at `dest`.
    fn write(&mut self, dest: PhysAddr, src: &[u8]) -> core::result::Result<(), ()>;

    /// Set `size` bytes of physical memory at `dest` to `value`.
    fn fill(&mut self, dest: PhysAddr, size: u64, value: u8) -> core::result::Result<(), ()>;
}

/// Physical memory that is identity mapped in the current address space.
///
/// Only the bytes of a single destination window are accessible.
pub struct IdentityMapped {
    window: DestinationWindow,
}

impl IdentityMapped {
    #[must_use]
    #[inline]
    /// # Safety
    ///
    /// The whole window must be identity mapped, writable, and not used
    /// by anything else for as long as the returned value exists.
    pub const unsafe fn new(window: DestinationWindow) -> Self {
        Self { window }
    }

    #[must_use]
    #[inline]
    pub const fn window(&self) -> &DestinationWindow {
        &self.window
    }

    fn checked_len(&self, dest: PhysAddr, size: u64) -> core::result::Result<usize, ()> {
        self.window.offset_of(dest, size).ok_or(())?;
        usize::try_from(size).map_err(|_| ())
    }
}

impl PhysicalMemory for IdentityMapped {
    fn write(&mut self, dest: PhysAddr, src: &[u8]) -> core::result::Result<(), ()> {
        let len = self.checked_len(dest, src.len() as u64)?;
        // Safety:
        // The destination lies in the window, which is mapped and exclusively ours.
        // The image buffer is never part of the window.
        unsafe {
            core::ptr::copy_nonoverlapping(src.as_ptr(), dest.as_mut_ptr::<u8>(), len);
        }
        Ok(())
    }

    fn fill(&mut self, dest: PhysAddr, size: u64, value: u8) -> core::result::Result<(), ()> {
        let len = self.checked_len(dest, size)?;
        // Safety:
        // The destination lies in the window, which is mapped and exclusively ours.
        unsafe {
            core::ptr::write_bytes(dest.as_mut_ptr::<u8>(), value, len);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_identity_mapped_bounds() {
        let mut backing = vec![0xAA_u8; 0x100];
        let base = PhysAddr::new(backing.as_mut_ptr() as u64);
        let window = DestinationWindow::new(base, 0x100).unwrap();
        let mut memory = unsafe { IdentityMapped::new(window) };

        assert!(memory.write(base + 0x10, &[1, 2, 3]).is_ok());
        assert!(memory.fill(base + 0x13, 5, 0).is_ok());
        assert!(memory.write(base + 0xFF, &[1, 2]).is_err());
        assert!(memory.fill(base + 0x100, 1, 0).is_err());
        assert_eq!(memory.window().size(), 0x100);

        assert_eq!(&backing[0x10..0x18], &[1, 2, 3, 0, 0, 0, 0, 0]);
        assert_eq!(backing[0x18], 0xAA);
        assert_eq!(backing[0xFF], 0xAA);
    }
}
