//! Final stage of the boot chain: loads a static ELF image to the physical
//! addresses it was linked for, then hands the core over to it.
//!
//! ```rust,no_run
//! use bootloader::{BootSequence, config::BootConfig, mem::DmaPool};
//! use elf::IdentityMapped;
//! use handoff_hal::NativePlatform;
//!
//! # struct Console;
//! # impl core::fmt::Write for Console {
//! #     fn write_str(&mut self, _s: &str) -> core::fmt::Result { Ok(()) }
//! # }
//! # let image: &[u8] = &[];
//! let config = BootConfig::default();
//! bootloader::logging::init(Box::leak(Box::new(Console)), config.log_level);
//!
//! let mut pool = DmaPool::<16>::new(config.dma_pool);
//! let sequence = BootSequence::new(config);
//! let window = sequence.reserve_window(&mut pool)?;
//! let mut memory = unsafe { IdentityMapped::new(window) };
//!
//! let loaded = sequence.parse(image)?.load(&window, &mut memory)?;
//! let err = unsafe { loaded.transfer(&mut NativePlatform::new()) }.unwrap_err();
//! // Report `err` and halt
//! # Ok::<(), bootloader::BootError>(())
//! ```
#![no_std]
#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(clippy::pedantic, clippy::nursery)]
#![allow(clippy::missing_panics_doc)]

#[cfg(not(any(target_arch = "x86_64", target_arch = "aarch64")))]
compile_error!("The bootloader only supports x86_64 and aarch64 architectures");

pub mod config;
mod error;
pub mod handoff;
pub mod logging;
pub mod mem;
mod sequence;

pub use error::{BootError, Result};
pub use sequence::{BootSequence, Idle, Loaded, Parsed, boot_elf_image};
