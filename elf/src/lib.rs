//! ELF image loader for the final boot stage.
//!
//! Parses a statically linked ELF executable and copies its loadable segments
//! to the physical addresses they declare.
//!
//! # Usage
//!
//! Parse the image with `ParsedImage::parse`, then hand it to `SegmentLoader::load`
//! together with the destination window and a physical memory implementation.
//!
//! ```rust
//! # use elf::{ParsedImage, PhysicalMemory, SegmentLoader, Target};
//! # use handoff_core::{arch::PhysAddr, mem::DestinationWindow};
//! #
//! # #[derive(Debug, Default)]
//! # /// Mock physical memory for testing
//! # struct MockMemory {
//! #     writes: Vec<(PhysAddr, usize)>,
//! # }
//! #
//! # impl PhysicalMemory for MockMemory {
//! #     fn write(&mut self, dest: PhysAddr, src: &[u8]) -> core::result::Result<(), ()> {
//! #         self.writes.push((dest, src.len()));
//! #         Ok(())
//! #     }
//! #
//! #     fn fill(&mut self, _dest: PhysAddr, _size: u64, _value: u8) -> core::result::Result<(), ()> {
//! #         Ok(())
//! #     }
//! # }
//! #
//! let binary_data: &[u8] = &[/* Binary data */];
//! let window = DestinationWindow::new(PhysAddr::new(0x9000_0000), 0x1000_0000).unwrap();
//! let mut memory = MockMemory::default(); // Initialize your physical memory
//!
//! let res = ParsedImage::parse(binary_data, Target::X86_64)
//!     .and_then(|image| SegmentLoader::load(&image, &window, &mut memory));
//!
//! match res {
//!     Ok(loaded) => {
//!         // Jump to `loaded.entry()`
//!     },
//!     Err(e) => {
//!         // Handle loading error
//!     },
//! }
//! ```

#![forbid(unsafe_op_in_unsafe_fn)]
#![warn(clippy::pedantic, clippy::nursery)]
#![no_std]

#[cfg(any(test, feature = "testing"))]
extern crate alloc;

mod error;
mod loader;
pub mod memory;
pub mod parser;
pub mod segments;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use error::ElfLoadError;
pub use loader::{LoadedImage, SegmentLoader};
pub use memory::{IdentityMapped, PhysicalMemory};
pub use parser::{ParsedImage, Target};
pub use segments::Segment;

/// Result type for ELF loading operations
pub type Result<T> = core::result::Result<T, ElfLoadError>;
