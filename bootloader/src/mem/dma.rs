use handoff_core::{
    arch::{Alignment, PhysAddr},
    mem::{
        DestinationWindow, ReserveError,
        ranges::{MemoryRange, MemoryRanges},
    },
};

/// Physical memory set aside by the board for loader reservations.
///
/// Reservations are carved out of the free ranges and never handed back,
/// so two windows reserved from the same pool never overlap.
#[derive(Debug, Clone, Copy)]
pub struct DmaPool<const N: usize = 16> {
    free: MemoryRanges<N>,
}

impl<const N: usize> Default for DmaPool<N> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<const N: usize> DmaPool<N> {
    #[must_use]
    #[inline]
    pub const fn empty() -> Self {
        Self {
            free: MemoryRanges::new(),
        }
    }

    #[must_use]
    /// Creates a pool covering `range`.
    pub fn new(range: MemoryRange) -> Self {
        let mut pool = Self::empty();
        pool.add(range);
        pool
    }

    /// Donates `range` to the pool.
    ///
    /// Returns `false` if the range is not physically addressable or if the pool is full.
    pub fn add(&mut self, range: MemoryRange) -> bool {
        range.end() <= PhysAddr::MAX.as_u64() && self.free.insert(range)
    }

    #[must_use]
    #[inline]
    /// Number of bytes left in the pool.
    pub fn available(&self) -> u64 {
        self.free.sum()
    }

    /// Reserves a contiguous window of `size` bytes aligned on `alignment`.
    ///
    /// ## Errors
    ///
    /// - `InvalidSize` if `size` is zero
    /// - `AlignmentUnsatisfiable` if `alignment` is not a power of two,
    ///   or if the pool only has room for an unaligned window
    /// - `OutOfMemory` if no free range is large enough
    pub fn reserve(
        &mut self,
        size: u64,
        alignment: u64,
    ) -> Result<DestinationWindow, ReserveError> {
        if size == 0 {
            return Err(ReserveError::InvalidSize);
        }
        let alignment = Alignment::new(alignment).ok_or(ReserveError::AlignmentUnsatisfiable)?;

        let Some(start) = self.free.allocate(size, alignment) else {
            // Tell apart a pool that is too small from one that is badly aligned
            let mut probe = self.free;
            return Err(if probe.allocate(size, Alignment::BYTE).is_some() {
                ReserveError::AlignmentUnsatisfiable
            } else {
                ReserveError::OutOfMemory
            });
        };

        Self::window(start, size)
    }

    /// Reserves exactly `[base, base + size)`.
    ///
    /// ## Errors
    ///
    /// - `InvalidSize` if `size` is zero
    /// - `OutOfMemory` if the range is not entirely free
    pub fn reserve_at(
        &mut self,
        base: PhysAddr,
        size: u64,
    ) -> Result<DestinationWindow, ReserveError> {
        if size == 0 {
            return Err(ReserveError::InvalidSize);
        }
        let range = MemoryRange::from_start_size(base.as_u64(), size)
            .ok_or(ReserveError::OutOfMemory)?;

        let start = self
            .free
            .allocate_exact(range)
            .ok_or(ReserveError::OutOfMemory)?;

        Self::window(start, size)
    }

    fn window(start: u64, size: u64) -> Result<DestinationWindow, ReserveError> {
        PhysAddr::try_new(start)
            .and_then(|base| DestinationWindow::new(base, size))
            .ok_or(ReserveError::OutOfMemory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn pool() -> DmaPool<4> {
        DmaPool::new(MemoryRange::new(0x9000_0000, 0x9FFF_FFFF))
    }

    #[test]
    fn test_reserve() {
        let mut pool = pool();

        let first = pool.reserve(0x1000, 0x1000).unwrap();
        assert!(first.base().is_aligned(Alignment::PAGE));
        assert_eq!(first.size(), 0x1000);

        let second = pool.reserve(0x10_0000, 0x20_0000).unwrap();
        assert!(second.base().is_aligned(Alignment::LARGE_PAGE));
        assert!(first.range().overlaps(&second.range()).is_none());

        assert_eq!(pool.available(), 0x1000_0000 - 0x1000 - 0x10_0000);
    }

    #[test]
    fn test_reserve_errors() {
        let mut pool = pool();

        assert_eq!(pool.reserve(0, 8), Err(ReserveError::InvalidSize));
        assert_eq!(
            pool.reserve(0x1000, 3),
            Err(ReserveError::AlignmentUnsatisfiable)
        );
        assert_eq!(
            pool.reserve(0x2000_0000, 8),
            Err(ReserveError::OutOfMemory)
        );
        // Fits, but not on a 1 GiB boundary
        assert_eq!(
            pool.reserve(0x1000, 0x4000_0000),
            Err(ReserveError::AlignmentUnsatisfiable)
        );

        // Failed reservations leave the pool untouched
        assert_eq!(pool.available(), 0x1000_0000);
    }

    #[test]
    fn test_reserve_whole_pool() {
        let mut pool = pool();

        let window = pool.reserve(0x1000_0000, 0x1000).unwrap();
        assert_eq!(window.base(), PhysAddr::new(0x9000_0000));
        assert_eq!(pool.available(), 0);
        assert_eq!(pool.reserve(1, 1), Err(ReserveError::OutOfMemory));
    }

    #[test]
    fn test_reserve_at() {
        let mut pool = pool();

        let window = pool.reserve_at(PhysAddr::new(0x9000_0000), 0x1000).unwrap();
        assert_eq!(window.base(), PhysAddr::new(0x9000_0000));

        assert_eq!(
            pool.reserve_at(PhysAddr::new(0x9000_0800), 0x1000),
            Err(ReserveError::OutOfMemory)
        );
        assert_eq!(
            pool.reserve_at(PhysAddr::new(0x9000_1000), 0),
            Err(ReserveError::InvalidSize)
        );
        assert_eq!(
            pool.reserve_at(PhysAddr::new(0x8000_0000), 0x1000),
            Err(ReserveError::OutOfMemory)
        );
    }

    #[test]
    fn test_add() {
        let mut pool = DmaPool::<2>::empty();
        assert_eq!(pool.reserve(0x1000, 1), Err(ReserveError::OutOfMemory));

        assert!(pool.add(MemoryRange::new(0x1000, 0x1FFF)));
        // Adjacent ranges are merged
        assert!(pool.add(MemoryRange::new(0x2000, 0x2FFF)));
        assert!(pool.add(MemoryRange::new(0x10_0000, 0x10_0FFF)));
        assert!(!pool.add(MemoryRange::new(0x20_0000, 0x20_0FFF)));
        assert!(!DmaPool::<2>::empty().add(MemoryRange::new(1 << 52, (1 << 52) + 1)));

        let window = pool.reserve(0x2000, 0x1000).unwrap();
        assert_eq!(window.base(), PhysAddr::new(0x1000));
    }
}
