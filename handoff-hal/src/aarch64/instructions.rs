#[inline]
pub fn wfe() {
    unsafe {
        core::arch::asm!("wfe", options(nomem, nostack, preserves_flags));
    }
}

#[inline]
/// Masks debug, SError, IRQ and FIQ exceptions.
pub fn int_disable() {
    unsafe {
        core::arch::asm!("msr daifset, #0xf", options(nomem, nostack, preserves_flags));
    }
}

#[inline]
pub fn dsb_sy() {
    unsafe {
        core::arch::asm!("dsb sy", options(nostack, preserves_flags));
    }
}

#[inline]
pub fn isb() {
    unsafe {
        core::arch::asm!("isb", options(nostack, preserves_flags));
    }
}

#[inline]
/// Invalidates the whole instruction cache to the point of unification.
pub fn ic_iallu() {
    unsafe {
        core::arch::asm!("ic iallu", options(nostack, preserves_flags));
    }
}

#[inline]
/// Cleans and invalidates a data cache line by set/way.
pub fn dc_cisw(set_way: u64) {
    unsafe {
        core::arch::asm!("dc cisw, {}", in(reg) set_way, options(nostack, preserves_flags));
    }
}

#[inline]
/// Branches to `entry` at the current exception level.
///
/// ## Safety
///
/// `entry` must point to valid code for the current exception level.
pub unsafe fn branch(entry: u64) -> ! {
    unsafe {
        core::arch::asm!("br {}", in(reg) entry, options(noreturn));
    }
}

/// EL1h with D, A, I and F masked.
const SPSR_EL1H_MASKED: u64 = 0x3C5;
/// EL1 executes in AArch64 state.
const HCR_EL2_RW: u64 = 1 << 31;
/// `SCTLR_EL1` with only the RES1 bits set: MMU and caches off.
const SCTLR_EL1_RESET: u64 = 0x30D0_0800;

#[inline]
/// Drops from EL2 to EL1h and starts executing at `entry`.
///
/// ## Safety
///
/// Must be executed at EL2, and `entry` must point to valid EL1 code.
pub unsafe fn eret_to_el1(entry: u64) -> ! {
    unsafe {
        core::arch::asm!(
            "msr sctlr_el1, {sctlr}",
            "msr hcr_el2, {hcr}",
            "msr spsr_el2, {spsr}",
            "msr elr_el2, {entry}",
            "isb",
            "eret",
            sctlr = in(reg) SCTLR_EL1_RESET,
            hcr = in(reg) HCR_EL2_RW,
            spsr = in(reg) SPSR_EL1H_MASKED,
            entry = in(reg) entry,
            options(noreturn)
        );
    }
}
