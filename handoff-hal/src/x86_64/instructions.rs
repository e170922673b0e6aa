#[inline]
pub fn halt() {
    unsafe {
        core::arch::asm!("hlt", options(nomem, nostack, preserves_flags));
    }
}

#[inline]
pub fn int_disable() {
    unsafe {
        core::arch::asm!("cli", options(nomem, preserves_flags, nostack));
    }
}

#[inline]
/// Writes back and invalidates every cache line.
pub fn wbinvd() {
    unsafe {
        core::arch::asm!("wbinvd", options(nostack, preserves_flags));
    }
}

#[inline]
/// Jumps to `entry` without touching the stack.
///
/// ## Safety
///
/// `entry` must point to valid code for the current mode and paging setup.
pub unsafe fn jump(entry: u64) -> ! {
    unsafe {
        core::arch::asm!("jmp {}", in(reg) entry, options(noreturn));
    }
}
