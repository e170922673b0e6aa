pub struct Cr0;

impl Cr0 {
    pub const NOT_WRITE_THROUGH: u64 = 1 << 29;
    pub const CACHE_DISABLE: u64 = 1 << 30;

    #[must_use]
    #[inline]
    pub fn read() -> u64 {
        let value: u64;
        unsafe {
            core::arch::asm!("mov {}, cr0", out(reg) value, options(nomem, nostack, preserves_flags));
        }

        value
    }

    #[inline]
    /// ## Safety
    ///
    /// The value written must be a valid CR0 value.
    pub unsafe fn write(value: u64) {
        unsafe {
            core::arch::asm!("mov cr0, {}", in(reg) value, options(nostack, preserves_flags));
        }
    }
}

pub struct Cs;

impl Cs {
    #[must_use]
    #[inline]
    pub fn read() -> u16 {
        let value: u16;
        unsafe {
            core::arch::asm!("mov {:x}, cs", out(reg) value, options(nomem, nostack, preserves_flags));
        }
        value
    }

    #[must_use]
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    /// Current privilege level, taken from the requested privilege level of `CS`.
    pub fn ring() -> u8 {
        (Self::read() & 0b11) as u8
    }
}
