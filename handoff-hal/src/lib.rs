//! Hardware abstraction for the final boot handoff.
//!
//! The loader only ever talks to the hardware through the [`Platform`] trait.
//! Native implementations are provided for x86_64 and aarch64.
#![no_std]
#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(
    clippy::missing_panics_doc,
    clippy::missing_errors_doc,
    clippy::missing_safety_doc,
    clippy::doc_markdown
)]

mod commons;
pub use commons::*;

#[cfg(target_arch = "aarch64")]
pub mod aarch64;
#[cfg(target_arch = "x86_64")]
pub mod x86_64;

#[cfg(target_arch = "aarch64")]
pub use aarch64::NativePlatform;
#[cfg(target_arch = "x86_64")]
pub use x86_64::NativePlatform;
