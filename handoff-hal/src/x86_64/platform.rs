use super::{
    instructions,
    registers::{Cr0, Cs},
};
use crate::{Platform, TransitionFault};
use handoff_core::{arch::PhysAddr, boot::Privilege};

/// The executing x86_64 core.
///
/// Both [`Privilege`] levels map to ring 0, which is where the loader
/// itself runs, so the jump is a plain near jump.
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
        if Cs::ring() == 0 {
            Ok(())
        } else {
            Err(TransitionFault::UnsupportedPrivilege(level))
        }
    }

    fn disable_interrupts(&mut self) {
        instructions::int_disable();
    }

    fn flush_data_cache(&mut self) {
        instructions::wbinvd();
    }

    fn disable_data_cache(&mut self) {
        let cr0 = (Cr0::read() | Cr0::CACHE_DISABLE) & !Cr0::NOT_WRITE_THROUGH;
        // Safety:
        // Only the caching bits are changed.
        unsafe { Cr0::write(cr0) };
        // Lines filled between the flush and the CR0 write
        instructions::wbinvd();
    }

    unsafe fn jump_with_privilege_change(
        &mut self,
        entry: PhysAddr,
        level: Privilege,
    ) -> TransitionFault {
        if let Err(fault) = self.check_transition(level) {
            return fault;
        }
        // Safety:
        // The caller guarantees `entry` is the entry point of a loaded image,
        // and physical memory is identity mapped during boot.
        unsafe { instructions::jump(entry.as_u64()) }
    }

    fn fatal(&mut self, _fault: TransitionFault) -> ! {
        instructions::int_disable();
        loop {
            instructions::halt();
        }
    }
}
