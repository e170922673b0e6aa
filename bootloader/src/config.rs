//! Boot configuration.
use elf::Target;
use handoff_core::{
    arch::{Alignment, PhysAddr},
    boot::Privilege,
    mem::ranges::MemoryRange,
};

/// What to do with an entry point that no loaded segment covers.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum EntryPolicy {
    /// Refuse to transfer control.
    #[default]
    Strict,
    /// Jump anyway. For images that start through a trampoline
    /// placed outside of their own segments.
    TrustTrampoline,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BootConfig {
    /// Physical memory the destination window is reserved from
    pub dma_pool: MemoryRange,
    /// Size of the destination window
    pub window_size: u64,
    /// Alignment of the destination window
    pub window_alignment: Alignment,
    /// Level the image is started at
    pub privilege: Privilege,
    pub entry_policy: EntryPolicy,
    /// Kind of image that is accepted
    pub target: Target,
    pub log_level: log::LevelFilter,
}

handoff_core::static_assert!(
    BootConfig::DEFAULT.window_size <= BootConfig::DEFAULT.dma_pool.size(),
    "The default window must fit in the default DMA pool"
);

impl Default for BootConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}

impl BootConfig {
    pub const DEFAULT: Self = Self {
        // 256 MiB at 2.25 GiB
        dma_pool: MemoryRange::new(0x9000_0000, 0x9FFF_FFFF),
        window_size: 0x1000_0000,
        window_alignment: Alignment::PAGE,
        privilege: Privilege::Kernel,
        entry_policy: EntryPolicy::Strict,
        target: Target::NATIVE,
        log_level: if cfg!(debug_assertions) {
            log::LevelFilter::Trace
        } else {
            log::LevelFilter::Info
        },
    };

    #[must_use]
    #[inline]
    /// Uses `size` bytes starting at `base` as the DMA pool.
    ///
    /// Returns `None` if the pool would be empty or run past the physical address space.
    pub const fn with_dma_pool(mut self, base: PhysAddr, size: u64) -> Option<Self> {
        if size == 0 || base.checked_add(size - 1).is_none() {
            return None;
        }
        self.dma_pool = MemoryRange::new(base.as_u64(), base.as_u64() + (size - 1));
        Some(self)
    }

    #[must_use]
    #[inline]
    pub const fn with_window(mut self, size: u64, alignment: Alignment) -> Self {
        self.window_size = size;
        self.window_alignment = alignment;
        self
    }

    #[must_use]
    #[inline]
    pub const fn with_privilege(mut self, privilege: Privilege) -> Self {
        self.privilege = privilege;
        self
    }

    #[must_use]
    #[inline]
    pub const fn with_entry_policy(mut self, entry_policy: EntryPolicy) -> Self {
        self.entry_policy = entry_policy;
        self
    }

    #[must_use]
    #[inline]
    pub const fn with_target(mut self, target: Target) -> Self {
        self.target = target;
        self
    }

    #[must_use]
    #[inline]
    pub const fn with_log_level(mut self, log_level: log::LevelFilter) -> Self {
        self.log_level = log_level;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_window_fits_pool() {
        let config = BootConfig::default();
        assert!(config.window_size <= config.dma_pool.size());
        assert_eq!(config.entry_policy, EntryPolicy::Strict);
        assert_eq!(config.privilege, Privilege::Kernel);
    }

    #[test]
    fn test_builders() {
        let config = BootConfig::DEFAULT
            .with_dma_pool(PhysAddr::new(0x4000_0000), 0x100_0000)
            .unwrap()
            .with_window(0x10_0000, Alignment::LARGE_PAGE)
            .with_privilege(Privilege::Hypervisor)
            .with_entry_policy(EntryPolicy::TrustTrampoline)
            .with_target(Target::ARM)
            .with_log_level(log::LevelFilter::Warn);

        assert_eq!(config.dma_pool, MemoryRange::new(0x4000_0000, 0x40FF_FFFF));
        assert_eq!(config.window_size, 0x10_0000);
        assert_eq!(config.window_alignment, Alignment::LARGE_PAGE);
        assert_eq!(config.privilege, Privilege::Hypervisor);
        assert_eq!(config.entry_policy, EntryPolicy::TrustTrampoline);
        assert_eq!(config.target, Target::ARM);
        assert_eq!(config.log_level, log::LevelFilter::Warn);

        assert!(BootConfig::DEFAULT.with_dma_pool(PhysAddr::new(0), 0).is_none());
        assert!(BootConfig::DEFAULT.with_dma_pool(PhysAddr::MAX, 2).is_none());
    }
}
