use super::{
    cache, instructions,
    registers::{CurrentEl, Sctlr, SctlrEl1, SctlrEl2},
};
use crate::{Platform, TransitionFault};
use core::cmp::Ordering;
use handoff_core::{arch::PhysAddr, boot::Privilege};

/// The executing aarch64 core.
///
/// Supports starting the image at the current exception level, or dropping
/// from EL2 to EL1.
#[derive(Debug, Default)]
pub struct NativePlatform {
    _private: (),
}

impl NativePlatform {
    #[must_use]
    #[inline]
    pub const fn new() -> Self {
        Self { _private: () }
    }
}

impl Platform for NativePlatform {
    fn check_transition(&self, level: Privilege) -> Result<(), TransitionFault> {
        let current = CurrentEl::read();
        let target = level.exception_level();

        if current == target || (current == 2 && target == 1) {
            Ok(())
        } else {
            Err(TransitionFault::UnsupportedPrivilege(level))
        }
    }

    fn disable_interrupts(&mut self) {
        instructions::int_disable();
    }

    fn flush_data_cache(&mut self) {
        cache::clean_invalidate_all();
    }

    fn disable_data_cache(&mut self) {
        // Safety:
        // Only the data cache enable bit of the current level is cleared,
        // and the cache was cleaned right before.
        match CurrentEl::read() {
            2 => unsafe { SctlrEl2::write(SctlrEl2::read() & !Sctlr::DATA_CACHE) },
            1 => unsafe { SctlrEl1::write(SctlrEl1::read() & !Sctlr::DATA_CACHE) },
            _ => {}
        }
        instructions::dsb_sy();
        instructions::isb();
        instructions::ic_iallu();
        instructions::dsb_sy();
        instructions::isb();
    }

    unsafe fn jump_with_privilege_change(
        &mut self,
        entry: PhysAddr,
        level: Privilege,
    ) -> TransitionFault {
        let current = CurrentEl::read();
        let target = level.exception_level();

        match current.cmp(&target) {
            // Safety:
            // The caller guarantees `entry` is the entry point of a loaded image.
            Ordering::Equal => unsafe { instructions::branch(entry.as_u64()) },
            Ordering::Greater if current == 2 => unsafe {
                instructions::eret_to_el1(entry.as_u64())
            },
            _ => TransitionFault::UnsupportedPrivilege(level),
        }
    }

    fn fatal(&mut self, _fault: TransitionFault) -> ! {
        instructions::int_disable();
        loop {
            instructions::wfe();
        }
    }
}
