//! Architecture agnostic address types.
mod addrs;
pub use addrs::*;
