use core::fmt;
use core::ops::{Add, Sub};

/// Number of implemented physical address bits.
const PHYS_ADDR_BITS: u32 = 52;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct PhysAddr(u64);

impl PhysAddr {
    pub const MAX: Self = Self((1 << PHYS_ADDR_BITS) - 1);

    #[must_use]
    #[inline]
    pub const fn new(addr: u64) -> Self {
        let phys_addr = addr % (1 << PHYS_ADDR_BITS);
        assert!(phys_addr == addr);
        Self(phys_addr)
    }

    #[must_use]
    #[inline]
    /// Creates a physical address, returning `None` if `addr` does not fit
    /// in the implemented physical address bits.
    pub const fn try_new(addr: u64) -> Option<Self> {
        if addr >> PHYS_ADDR_BITS == 0 {
            Some(Self(addr))
        } else {
            None
        }
    }

    #[must_use]
    #[inline]
    pub const fn zero() -> Self {
        Self(0)
    }

    #[must_use]
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[must_use]
    #[inline]
    pub const fn as_ptr<T>(self) -> *const T {
        self.0 as _
    }

    #[must_use]
    #[inline]
    pub const fn as_mut_ptr<T>(self) -> *mut T {
        self.0 as _
    }

    #[must_use]
    #[inline]
    pub const fn align_down(self, align: Alignment) -> Self {
        Self(self.0 & !align.mask())
    }

    #[must_use]
    #[inline]
    /// Aligns the address upwards, returning `None` on overflow.
    pub const fn align_up(self, align: Alignment) -> Option<Self> {
        match self.0.checked_add(align.mask()) {
            Some(v) => Self::try_new(v & !align.mask()),
            None => None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn is_aligned(self, align: Alignment) -> bool {
        self.0 & align.mask() == 0
    }

    #[must_use]
    #[inline]
    pub const fn checked_add(self, rhs: u64) -> Option<Self> {
        match self.0.checked_add(rhs) {
            Some(v) => Self::try_new(v),
            None => None,
        }
    }

    #[must_use]
    #[inline]
    /// Returns the distance from `base` to `self`, or `None` if `self` is below `base`.
    pub const fn offset_from(self, base: Self) -> Option<u64> {
        self.0.checked_sub(base.0)
    }
}

impl Add<u64> for PhysAddr {
    type Output = Self;

    #[inline]
    fn add(self, rhs: u64) -> Self {
        Self::new(self.0 + rhs)
    }
}

impl Sub<u64> for PhysAddr {
    type Output = Self;

    #[inline]
    fn sub(self, rhs: u64) -> Self {
        Self::new(self.0 - rhs)
    }
}

impl Sub<Self> for PhysAddr {
    type Output = u64;

    #[inline]
    fn sub(self, rhs: Self) -> u64 {
        self.0 - rhs.0
    }
}

impl fmt::LowerHex for PhysAddr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::LowerHex::fmt(&self.0, f)
    }
}

/// A power-of-two alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Alignment(u64);

impl Alignment {
    pub const BYTE: Self = Self(1);
    pub const WORD: Self = Self(8);
    pub const CACHE_LINE: Self = Self(64);
    pub const PAGE: Self = Self(0x1000);
    pub const LARGE_PAGE: Self = Self(0x20_0000);

    #[must_use]
    #[inline]
    /// Returns `None` if `align` is not a power of two.
    pub const fn new(align: u64) -> Option<Self> {
        if align.is_power_of_two() {
            Some(Self(align))
        } else {
            None
        }
    }

    #[must_use]
    #[inline]
    pub const fn as_u64(self) -> u64 {
        self.0
    }

    #[must_use]
    #[inline]
    pub const fn mask(self) -> u64 {
        self.0 - 1
    }
}

impl Default for Alignment {
    fn default() -> Self {
        Self::BYTE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phys_addr_bounds() {
        assert!(PhysAddr::try_new(1 << 52).is_none());
        assert_eq!(PhysAddr::try_new(0x1000), Some(PhysAddr::new(0x1000)));
        assert_eq!(PhysAddr::MAX.checked_add(1), None);
    }

    #[test]
    fn test_phys_addr_align() {
        let addr = PhysAddr::new(0x1234);
        assert_eq!(addr.align_down(Alignment::PAGE), PhysAddr::new(0x1000));
        assert_eq!(addr.align_up(Alignment::PAGE), Some(PhysAddr::new(0x2000)));
        assert!(!addr.is_aligned(Alignment::PAGE));
        assert!(PhysAddr::new(0x2000).is_aligned(Alignment::PAGE));
        assert_eq!(PhysAddr::MAX.align_up(Alignment::PAGE), None);
    }

    #[test]
    fn test_offset_from() {
        let base = PhysAddr::new(0x8000);
        assert_eq!(PhysAddr::new(0x8010).offset_from(base), Some(0x10));
        assert_eq!(PhysAddr::new(0x7FFF).offset_from(base), None);
    }

    #[test]
    fn test_alignment() {
        assert!(Alignment::new(0).is_none());
        assert!(Alignment::new(24).is_none());
        assert_eq!(Alignment::new(0x1000), Some(Alignment::PAGE));
        assert_eq!(Alignment::PAGE.mask(), 0xFFF);
    }
}
