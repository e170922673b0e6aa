//! The one-way jump into the loaded image.
use handoff_core::{arch::PhysAddr, boot::Privilege};
use handoff_hal::Platform;

/// Hands the executing core over to the image at `entry`.
///
/// Interrupts are masked, then dirty data cache lines are written back and
/// data caching is turned off, so that the image starts on coherent memory.
/// If the platform cannot perform the jump, its fatal handler takes over.
///
/// ## Safety
///
/// `entry` must be the entry point of an image entirely written to memory,
/// and nothing the caller owns may be needed afterwards.
pub unsafe fn transfer<P: Platform + ?Sized>(
    platform: &mut P,
    entry: PhysAddr,
    level: Privilege,
) -> ! {
    platform.before_handoff();
    platform.disable_interrupts();
    platform.flush_data_cache();
    platform.disable_data_cache();

    // Safety:
    // Guaranteed by the caller.
    let fault = unsafe { platform.jump_with_privilege_change(entry, level) };

    platform.fatal(fault)
}
