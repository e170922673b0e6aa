//! x86_64 architecture specific code.
pub mod instructions;
pub mod registers;

mod platform;
pub use platform::NativePlatform;
