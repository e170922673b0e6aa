use crate::arch::Alignment;

/// An inclusive range of physical addresses.
///
/// `start <= end` always holds, so a range is never empty.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MemoryRange {
    start: u64,
    end: u64,
}

impl MemoryRange {
    #[must_use]
    #[inline]
    pub const fn new(start: u64, end: u64) -> Self {
        debug_assert!(start <= end, "Invalid range");
        Self { start, end }
    }

    #[must_use]
    #[inline]
    /// Creates the range `[start, start + size)`.
    ///
    /// Returns `None` for empty ranges and ranges wrapping around the address space.
    pub const fn from_start_size(start: u64, size: u64) -> Option<Self> {
        if size == 0 {
            return None;
        }
        match start.checked_add(size - 1) {
            Some(end) => Some(Self { start, end }),
            None => None,
        }
    }

    #[must_use]
    #[inline]
    pub const fn start(&self) -> u64 {
        self.start
    }

    #[must_use]
    #[inline]
    pub const fn end(&self) -> u64 {
        self.end
    }

    #[must_use]
    #[inline]
    /// Size of the range in bytes, saturating for the whole 64-bit space.
    pub const fn size(&self) -> u64 {
        (self.end - self.start).saturating_add(1)
    }

    #[must_use]
    #[inline]
    pub const fn contains_addr(&self, addr: u64) -> bool {
        self.start <= addr && addr <= self.end
    }

    #[must_use]
    #[inline]
    /// Whether `other` lies entirely in `self`.
    pub const fn contains(&self, other: &Self) -> bool {
        self.start <= other.start && other.end <= self.end
    }

    #[must_use]
    /// Returns the intersection of both ranges.
    pub fn overlaps(&self, other: &Self) -> Option<Self> {
        let start = self.start.max(other.start);
        let end = self.end.min(other.end);
        (start <= end).then_some(Self { start, end })
    }

    /// Whether the ranges overlap or are directly adjacent.
    const fn touches(&self, other: &Self) -> bool {
        self.start <= other.end.saturating_add(1) && other.start <= self.end.saturating_add(1)
    }
}

/// A fixed capacity set of disjoint ranges, kept sorted by address.
///
/// Adjacent ranges are always merged.
#[derive(Debug, Clone, Copy)]
pub struct MemoryRanges<const N: usize> {
    slots: [MemoryRange; N],
    len: usize,
}

impl<const N: usize> Default for MemoryRanges<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MemoryRanges<N> {
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            slots: [MemoryRange { start: 0, end: 0 }; N],
            len: 0,
        }
    }

    #[must_use]
    #[inline]
    pub fn entries(&self) -> &[MemoryRange] {
        &self.slots[..self.len]
    }

    #[must_use]
    #[inline]
    pub const fn len(&self) -> usize {
        self.len
    }

    #[must_use]
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[must_use]
    #[inline]
    pub const fn is_full(&self) -> bool {
        self.len == N
    }

    #[must_use]
    /// Total number of bytes covered.
    pub fn sum(&self) -> u64 {
        self.entries()
            .iter()
            .map(MemoryRange::size)
            .fold(0, u64::saturating_add)
    }

    #[must_use]
    pub fn contains_addr(&self, addr: u64) -> bool {
        let index = self.entries().partition_point(|range| range.end < addr);
        self.entries()
            .get(index)
            .is_some_and(|range| range.contains_addr(addr))
    }

    /// Adds `range` to the set, merging it with the ranges it touches.
    ///
    /// Returns `false` if a new slot was needed and the set is full.
    pub fn insert(&mut self, range: MemoryRange) -> bool {
        // Ranges in `first..last` touch `range`
        let first = self
            .entries()
            .partition_point(|current| current.end.saturating_add(1) < range.start);
        let last = first
            + self.entries()[first..]
                .iter()
                .take_while(|current| current.touches(&range))
                .count();

        if first == last {
            if self.is_full() {
                return false;
            }
            self.slots.copy_within(first..self.len, first + 1);
            self.slots[first] = range;
            self.len += 1;
            return true;
        }

        self.slots[first] = MemoryRange {
            start: range.start.min(self.slots[first].start),
            end: range.end.max(self.slots[last - 1].end),
        };
        self.slots.copy_within(last..self.len, first + 1);
        self.len -= last - first - 1;
        true
    }

    /// Takes `taken` out of the slot at `index`, which must contain it.
    fn carve(&mut self, index: usize, taken: MemoryRange) -> bool {
        let free = self.slots[index];
        debug_assert!(free.contains(&taken));

        let below =
            (free.start < taken.start).then(|| MemoryRange::new(free.start, taken.start - 1));
        let above = (taken.end < free.end).then(|| MemoryRange::new(taken.end + 1, free.end));

        match (below, above) {
            (Some(below), Some(above)) => {
                if self.is_full() {
                    return false;
                }
                self.slots.copy_within(index + 1..self.len, index + 2);
                self.slots[index] = below;
                self.slots[index + 1] = above;
                self.len += 1;
            }
            (Some(rest), None) | (None, Some(rest)) => self.slots[index] = rest,
            (None, None) => {
                self.slots.copy_within(index + 1..self.len, index);
                self.len -= 1;
            }
        }
        true
    }

    #[must_use]
    /// Takes an aligned block of `size` bytes out of the set.
    ///
    /// The smallest range the block fits in is used. Returns the start of the block.
    pub fn allocate(&mut self, size: u64, alignment: Alignment) -> Option<u64> {
        let last_byte = size.checked_sub(1)?;

        let mut best: Option<(MemoryRange, usize, MemoryRange)> = None;
        for (index, free) in self.entries().iter().enumerate() {
            let Some(start) = free
                .start
                .checked_add(alignment.mask())
                .map(|unaligned| unaligned & !alignment.mask())
            else {
                continue;
            };
            let Some(end) = start.checked_add(last_byte) else {
                continue;
            };
            if end > free.end {
                continue;
            }
            // Splitting a range needs a free slot
            if self.is_full() && free.start < start && end < free.end {
                continue;
            }

            if best.is_none_or(|(best_free, _, _)| free.size() < best_free.size()) {
                best = Some((*free, index, MemoryRange::new(start, end)));
            }
        }

        let (_, index, taken) = best?;
        self.carve(index, taken).then_some(taken.start)
    }

    #[must_use]
    /// Takes exactly `range` out of the set.
    ///
    /// Fails if `range` is not entirely free.
    pub fn allocate_exact(&mut self, range: MemoryRange) -> Option<u64> {
        let index = self
            .entries()
            .iter()
            .position(|free| free.contains(&range))?;
        self.carve(index, range).then_some(range.start)
    }
}
