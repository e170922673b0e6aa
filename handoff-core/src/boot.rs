/// Privilege level the loaded image is started at.
///
/// On x86_64 both levels resolve to ring 0, as the hypervisor extensions
/// are not a distinct ring.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Privilege {
    /// Supervisor level: ring 0 on x86_64, EL1 on aarch64, SVC mode on ARMv7.
    #[default]
    Kernel,
    /// Hypervisor level: EL2 on aarch64, HYP mode on ARMv7.
    Hypervisor,
}

impl Privilege {
    #[must_use]
    #[inline]
    /// Returns the aarch64 exception level number.
    pub const fn exception_level(self) -> u8 {
        match self {
            Self::Kernel => 1,
            Self::Hypervisor => 2,
        }
    }

    #[must_use]
    #[inline]
    pub const fn from_exception_level(el: u8) -> Option<Self> {
        match el {
            1 => Some(Self::Kernel),
            2 => Some(Self::Hypervisor),
            _ => None,
        }
    }
}
