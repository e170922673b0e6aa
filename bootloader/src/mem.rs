//! Physical memory reservations for the loader.
mod dma;
pub use dma::DmaPool;
