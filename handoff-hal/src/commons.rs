//! Architecture agnostic definitions of the handoff primitives.
use handoff_core::{arch::PhysAddr, boot::Privilege};
use thiserror::Error;

/// A fault reported by the privilege transition primitive.
///
/// Once one of these is produced the handoff has already started:
/// interrupts are masked and caches are off, so there is nothing to return to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TransitionFault {
    #[error("Cannot transition to {0:?} from the current privilege level")]
    UnsupportedPrivilege(Privilege),
    #[error("Entry address is not reachable")]
    UnreachableEntry,
    #[error("Unexpected exception {0} during transition")]
    Exception(u32),
}

/// Hardware capabilities needed to hand control over to a loaded image.
///
/// Every method acts on the core executing the boot sequence.
pub trait Platform {
    /// Board specific hook run right before the handoff starts,
    /// e.g. to switch off status LEDs.
    fn before_handoff(&mut self) {}

    /// Checks, before anything is torn down, that the executing core can
    /// transition to `level`.
    fn check_transition(&self, _level: Privilege) -> Result<(), TransitionFault> {
        Ok(())
    }

    /// Masks interrupt delivery on the executing core.
    fn disable_interrupts(&mut self);

    /// Writes every dirty data cache line back to memory.
    fn flush_data_cache(&mut self);

    /// Turns data caching off for the current privilege level.
    fn disable_data_cache(&mut self);

    /// Jumps to `entry`, switching to `level` on the way.
    ///
    /// Only returns if the transition could not be performed.
    ///
    /// ## Safety
    ///
    /// `entry` must be the entry point of an image fully written to memory,
    /// and the caller must be done with every resource it owns.
    unsafe fn jump_with_privilege_change(
        &mut self,
        entry: PhysAddr,
        level: Privilege,
    ) -> TransitionFault;

    /// Last resort once a transition fault happened.
    fn fatal(&mut self, fault: TransitionFault) -> !;
}

#[cfg(test)]
mod tests {
    extern crate std;

    use super::*;
    use std::string::ToString;

    #[test]
    fn test_fault_messages() {
        assert_eq!(
            TransitionFault::UnsupportedPrivilege(Privilege::Hypervisor).to_string(),
            "Cannot transition to Hypervisor from the current privilege level"
        );
        assert_eq!(
            TransitionFault::Exception(3).to_string(),
            "Unexpected exception 3 during transition"
        );
    }
}
