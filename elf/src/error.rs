//! Error types for ELF image loading.
use thiserror::Error;

/// Errors that can occur while parsing or loading an ELF image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ElfLoadError {
    /// Bad magic, class, encoding, version, machine or table layout
    #[error("Malformed ELF container")]
    MalformedContainer,
    /// A header, table or segment extends past the end of the buffer
    #[error("Truncated ELF container")]
    TruncatedContainer,
    /// Non-executable container, or dynamic linking required
    #[error("Unsupported ELF feature")]
    UnsupportedFeature,
    /// The buffer does not have the alignment of the ELF header
    #[error("Image buffer is misaligned")]
    UnalignedBuffer,
    /// A segment does not fit in the destination window
    #[error("Segment overflows the destination window")]
    WindowOverflow,
    /// Segment data could not be read from the image
    #[error("Failed to read segment data")]
    ReadFailure,
    /// The physical memory refused a write
    #[error("Failed to write to physical memory")]
    WriteFailure,
}
