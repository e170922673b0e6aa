//! Copies the loadable segments of a parsed image into physical memory.
use crate::{
    Result,
    error::ElfLoadError,
    memory::PhysicalMemory,
    parser::ParsedImage,
    segments::{MAX_SEGMENTS, Segment},
};
use handoff_core::{
    arch::PhysAddr,
    mem::{DestinationWindow, ranges::MemoryRanges},
};

/// Segment loader with pluggable physical memory.
pub struct SegmentLoader;

impl SegmentLoader {
    /// Load every loadable segment of `image` into `window`.
    ///
    /// Segments are processed in declaration order, so later segments
    /// overwrite earlier ones where they overlap.
    ///
    /// # Errors
    ///
    /// - `WindowOverflow` if any segment does not fit in the window.
    ///   Nothing has been written in that case.
    /// - `ReadFailure` if segment data cannot be found in the image
    /// - `WriteFailure` if the memory refuses a write
    pub fn load<M: PhysicalMemory>(
        image: &ParsedImage,
        window: &DestinationWindow,
        memory: &mut M,
    ) -> Result<LoadedImage> {
        Self::check_window(image, window)?;

        let mut ranges = MemoryRanges::new();

        for segment in image.segments().loadable() {
            Self::load_segment(image, segment, memory)?;

            if let Some(range) = segment.memory_range() {
                ranges.insert(range);
            }
        }

        Ok(LoadedImage {
            entry: image.entry(),
            window: *window,
            ranges,
        })
    }

    fn check_window(image: &ParsedImage, window: &DestinationWindow) -> Result<()> {
        let fits = image.segments().loadable().all(|segment| {
            window
                .offset_of(segment.physical_address, segment.memory_size)
                .is_some()
        });

        if fits {
            Ok(())
        } else {
            Err(ElfLoadError::WindowOverflow)
        }
    }

    fn load_segment<M: PhysicalMemory>(
        image: &ParsedImage,
        segment: &Segment,
        memory: &mut M,
    ) -> Result<()> {
        let data = image
            .segment_data(segment)
            .ok_or(ElfLoadError::ReadFailure)?;

        if !data.is_empty() {
            memory
                .write(segment.physical_address, data)
                .map_err(|()| ElfLoadError::WriteFailure)?;
        }

        // Zero out the rest of the segment (e.g. .bss)
        let zero_size = segment.zero_fill_size();
        if zero_size > 0 {
            memory
                .fill(segment.physical_address + segment.file_size, zero_size, 0)
                .map_err(|()| ElfLoadError::WriteFailure)?;
        }

        Ok(())
    }
}

/// An image whose segments sit in physical memory.
#[derive(Debug, Clone, Copy)]
pub struct LoadedImage {
    entry: PhysAddr,
    window: DestinationWindow,
    ranges: MemoryRanges<MAX_SEGMENTS>,
}

impl LoadedImage {
    #[must_use]
    #[inline]
    /// Entry point declared by the image.
    pub const fn entry(&self) -> PhysAddr {
        self.entry
    }

    #[must_use]
    #[inline]
    pub const fn window(&self) -> &DestinationWindow {
        &self.window
    }

    #[must_use]
    #[inline]
    /// Physical ranges written by the loader, merged where adjacent.
    pub const fn ranges(&self) -> &MemoryRanges<MAX_SEGMENTS> {
        &self.ranges
    }

    #[must_use]
    #[inline]
    /// Whether `addr` lies in one of the loaded segments.
    pub fn covers(&self, addr: PhysAddr) -> bool {
        self.ranges.contains_addr(addr.as_u64())
    }
}
