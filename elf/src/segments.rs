//! ELF segment descriptors.
use handoff_core::{arch::PhysAddr, mem::ranges::MemoryRange};

/// Maximum number of program headers an image may declare.
pub const MAX_SEGMENTS: usize = 32;

/// A program header, as far as loading is concerned.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Physical load address (`p_paddr`)
    pub physical_address: PhysAddr,
    /// Offset of the segment data in the image (`p_offset`)
    pub file_offset: u64,
    /// Number of bytes stored in the image (`p_filesz`)
    pub file_size: u64,
    /// Number of bytes occupied in memory (`p_memsz`)
    pub memory_size: u64,
    /// Whether this is a `PT_LOAD` segment
    pub loadable: bool,
}

impl Segment {
    #[must_use]
    #[inline]
    /// Physical range covered in memory, `None` for empty segments.
    pub const fn memory_range(&self) -> Option<MemoryRange> {
        MemoryRange::from_start_size(self.physical_address.as_u64(), self.memory_size)
    }

    #[must_use]
    #[inline]
    /// Number of bytes to zero after the file data.
    pub const fn zero_fill_size(&self) -> u64 {
        self.memory_size.saturating_sub(self.file_size)
    }
}

/// The program header table of an image, in declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segments {
    entries: [Segment; MAX_SEGMENTS],
    len: usize,
}

impl Default for Segments {
    fn default() -> Self {
        Self::new()
    }
}

impl Segments {
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self {
            entries: [Segment {
                physical_address: PhysAddr::zero(),
                file_offset: 0,
                file_size: 0,
                memory_size: 0,
                loadable: false,
            }; MAX_SEGMENTS],
            len: 0,
        }
    }

    /// Appends a segment, returning it back if the table is full.
    pub(crate) fn push(&mut self, segment: Segment) -> Result<(), Segment> {
        if self.len == MAX_SEGMENTS {
            return Err(segment);
        }
        self.entries[self.len] = segment;
        self.len += 1;
        Ok(())
    }

    #[must_use]
    #[inline]
    pub fn as_slice(&self) -> &[Segment] {
        &self.entries[..self.len]
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, Segment> {
        self.as_slice().iter()
    }

    #[inline]
    /// Iterates over `PT_LOAD` segments only.
    pub fn loadable(&self) -> impl Iterator<Item = &Segment> {
        self.iter().filter(|segment| segment.loadable)
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
}

impl<'a> IntoIterator for &'a Segments {
    type Item = &'a Segment;
    type IntoIter = core::slice::Iter<'a, Segment>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::vec::Vec;

    fn load(paddr: u64, file_size: u64, memory_size: u64) -> Segment {
        Segment {
            physical_address: PhysAddr::new(paddr),
            file_offset: 0,
            file_size,
            memory_size,
            loadable: true,
        }
    }

    #[test]
    fn test_segment_ranges() {
        let segment = load(0x1000, 0x10, 0x30);
        assert_eq!(segment.memory_range(), Some(MemoryRange::new(0x1000, 0x102F)));
        assert_eq!(segment.zero_fill_size(), 0x20);

        assert_eq!(load(0x1000, 0, 0).memory_range(), None);
    }

    #[test]
    fn test_segments_capacity() {
        let mut segments = Segments::new();
        for i in 0..MAX_SEGMENTS as u64 {
            assert!(segments.push(load(i * 0x1000, 0, 0x1000)).is_ok());
        }
        assert!(segments.push(load(0, 0, 0)).is_err());
        assert_eq!(segments.len(), MAX_SEGMENTS);
    }

    #[test]
    fn test_loadable_filter_keeps_order() {
        let mut segments = Segments::new();
        segments.push(load(0x3000, 0, 0x10)).unwrap();
        segments
            .push(Segment {
                loadable: false,
                ..load(0x2000, 0, 0x10)
            })
            .unwrap();
        segments.push(load(0x1000, 0, 0x10)).unwrap();

        let addrs = segments
            .loadable()
            .map(|s| s.physical_address.as_u64())
            .collect::<Vec<_>>();
        assert_eq!(addrs, [0x3000, 0x1000]);
    }
}
