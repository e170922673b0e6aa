//! Errors of the boot sequence.
use elf::ElfLoadError;
use handoff_core::{arch::PhysAddr, mem::ReserveError};
use handoff_hal::TransitionFault;
use thiserror::Error;

/// Every way a boot attempt can fail before control is handed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum BootError {
    #[error("Image error: {0}")]
    Image(#[from] ElfLoadError),
    #[error("Reservation error: {0}")]
    Reserve(#[from] ReserveError),
    /// The entry point is not part of any loaded segment
    #[error("Entry point {0:#x} lies outside the loaded image")]
    EntryOutOfRange(PhysAddr),
    #[error("Privilege transition fault: {0}")]
    PrivilegeTransition(#[from] TransitionFault),
}

/// Result type for boot operations
pub type Result<T> = core::result::Result<T, BootError>;
