//! aarch64 architecture specific code.
pub mod cache;
pub mod instructions;
pub mod registers;

mod platform;
pub use platform::NativePlatform;
