macro_rules! system_register {
    ($name:ident, $reg:literal) => {
        pub struct $name;

        impl $name {
            #[must_use]
            #[inline]
            pub fn read() -> u64 {
                let value: u64;
                unsafe {
                    core::arch::asm!(
                        concat!("mrs {}, ", $reg),
                        out(reg) value,
                        options(nomem, nostack, preserves_flags)
                    );
                }
                value
            }

            #[inline]
            /// ## Safety
            ///
            /// The value written must be valid for the register.
            pub unsafe fn write(value: u64) {
                unsafe {
                    core::arch::asm!(
                        concat!("msr ", $reg, ", {}"),
                        in(reg) value,
                        options(nostack, preserves_flags)
                    );
                }
            }
        }
    };
}

system_register!(Clidr, "clidr_el1");
system_register!(Ccsidr, "ccsidr_el1");
system_register!(Csselr, "csselr_el1");
system_register!(SctlrEl1, "sctlr_el1");
system_register!(SctlrEl2, "sctlr_el2");

/// Bits shared by `SCTLR_EL1` and `SCTLR_EL2`.
pub struct Sctlr;

impl Sctlr {
    pub const MMU: u64 = 1 << 0;
    pub const DATA_CACHE: u64 = 1 << 2;
    pub const INSTRUCTION_CACHE: u64 = 1 << 12;
}

pub struct CurrentEl;

impl CurrentEl {
    #[must_use]
    #[inline]
    #[allow(clippy::cast_possible_truncation)]
    pub fn read() -> u8 {
        let value: u64;
        unsafe {
            core::arch::asm!("mrs {}, CurrentEL", out(reg) value, options(nomem, nostack, preserves_flags));
        }
        ((value >> 2) & 0b11) as u8
    }
}
