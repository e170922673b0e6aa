//! The boot sequence, from raw image bytes to the handoff.
//!
//! Each step consumes the sequence and, on success, returns it in the next state:
//! `Idle` → `Parsed` → `Loaded` → transferred. A failed step leaves nothing to
//! resume from, a new sequence has to be started.
use crate::{
    config::{BootConfig, EntryPolicy},
    error::{BootError, Result},
    handoff,
    mem::DmaPool,
};
use core::convert::Infallible;
use elf::{IdentityMapped, LoadedImage, ParsedImage, PhysicalMemory, SegmentLoader};
use handoff_core::mem::DestinationWindow;
use handoff_hal::Platform;
use log::{debug, error, info, trace, warn};

/// Nothing has been looked at yet.
#[derive(Debug, Clone, Copy)]
pub struct Idle;

/// The image is structurally valid.
#[derive(Debug, Clone, Copy)]
pub struct Parsed<'a> {
    image: ParsedImage<'a>,
}

/// The image sits in its destination window.
#[derive(Debug, Clone, Copy)]
pub struct Loaded {
    image: LoadedImage,
}

#[derive(Debug, Clone, Copy)]
pub struct BootSequence<S> {
    config: BootConfig,
    state: S,
}

impl<S> BootSequence<S> {
    #[must_use]
    #[inline]
    pub const fn config(&self) -> &BootConfig {
        &self.config
    }

    /// Reserves the destination window described by the configuration.
    ///
    /// ## Errors
    ///
    /// Returns `BootError::Reserve` if the pool cannot provide the window.
    pub fn reserve_window<const N: usize>(
        &self,
        pool: &mut DmaPool<N>,
    ) -> Result<DestinationWindow> {
        let window = pool
            .reserve(
                self.config.window_size,
                self.config.window_alignment.as_u64(),
            )
            .inspect_err(|err| error!("Failed to reserve the destination window: {err}"))?;

        debug!(
            "Destination window reserved at {:#x} ({:#x} bytes)",
            window.base(),
            window.size()
        );
        Ok(window)
    }
}

impl BootSequence<Idle> {
    #[must_use]
    #[inline]
    pub const fn new(config: BootConfig) -> Self {
        Self {
            config,
            state: Idle,
        }
    }

    /// Validates `raw` as an image for the configured target.
    ///
    /// ## Errors
    ///
    /// Returns `BootError::Image` if the image is not a valid static executable.
    pub fn parse(self, raw: &[u8]) -> Result<BootSequence<Parsed<'_>>> {
        let image = ParsedImage::parse(raw, self.config.target)
            .inspect_err(|err| error!("Invalid image: {err}"))?;

        info!(
            "Image parsed: entry point {:#x}, {} program headers",
            image.entry(),
            image.segments().len()
        );

        Ok(BootSequence {
            config: self.config,
            state: Parsed { image },
        })
    }
}

impl<'a> BootSequence<Parsed<'a>> {
    #[must_use]
    #[inline]
    pub const fn image(&self) -> &ParsedImage<'a> {
        &self.state.image
    }

    /// Copies the loadable segments of the image into `window`.
    ///
    /// ## Errors
    ///
    /// Returns `BootError::Image` if a segment does not fit in the window
    /// or if memory could not be written.
    pub fn load<M: PhysicalMemory>(
        self,
        window: &DestinationWindow,
        memory: &mut M,
    ) -> Result<BootSequence<Loaded>> {
        for segment in self.state.image.segments() {
            if segment.loadable {
                debug!(
                    "Loading segment at {:#x}: {:#x} bytes from file, {:#x} in memory",
                    segment.physical_address, segment.file_size, segment.memory_size
                );
            } else {
                trace!("Skipping segment at file offset {:#x}", segment.file_offset);
            }
        }

        let image = SegmentLoader::load(&self.state.image, window, memory)
            .inspect_err(|err| error!("Failed to load the image: {err}"))?;

        info!("Image loaded");

        Ok(BootSequence {
            config: self.config,
            state: Loaded { image },
        })
    }
}

impl BootSequence<Loaded> {
    #[must_use]
    #[inline]
    pub const fn image(&self) -> &LoadedImage {
        &self.state.image
    }

    /// Hands control over to the loaded image.
    ///
    /// Only returns if the entry point or the privilege transition is refused
    /// before anything was torn down.
    ///
    /// ## Errors
    ///
    /// - `BootError::EntryOutOfRange` if the entry point is outside of the loaded
    ///   segments and the policy is `Strict`
    /// - `BootError::PrivilegeTransition` if the platform cannot reach the configured level
    ///
    /// ## Safety
    ///
    /// The window must be memory the platform executes from, as written by the loader.
    pub unsafe fn transfer<P: Platform + ?Sized>(self, platform: &mut P) -> Result<Infallible> {
        let entry = self.state.image.entry();

        if !self.state.image.covers(entry) {
            match self.config.entry_policy {
                EntryPolicy::Strict => {
                    error!("Entry point {entry:#x} is outside of the loaded image");
                    return Err(BootError::EntryOutOfRange(entry));
                }
                EntryPolicy::TrustTrampoline => {
                    warn!("Entry point {entry:#x} is outside of the loaded image, jumping anyway");
                }
            }
        }

        platform
            .check_transition(self.config.privilege)
            .inspect_err(|fault| error!("Cannot start the image: {fault}"))?;

        info!(
            "Transferring control to {entry:#x} at {:?} level",
            self.config.privilege
        );

        // Safety:
        // The image was loaded by this sequence and the caller guarantees
        // the window is executable.
        unsafe { handoff::transfer(platform, entry, self.config.privilege) }
    }
}

/// Runs the whole sequence on identity mapped memory.
///
/// The destination window is reserved from `pool` as configured in `config`.
///
/// ## Errors
///
/// Returns the first failure, see [`BootSequence`].
///
/// ## Safety
///
/// `pool` must only contain identity mapped memory that is free for the loader
/// to use and that the platform can execute from.
pub unsafe fn boot_elf_image<const N: usize, P: Platform + ?Sized>(
    raw: &[u8],
    config: BootConfig,
    pool: &mut DmaPool<N>,
    platform: &mut P,
) -> Result<Infallible> {
    let sequence = BootSequence::new(config);
    let window = sequence.reserve_window(pool)?;

    // Safety:
    // The window comes from the pool, which the caller guarantees to be usable.
    let mut memory = unsafe { IdentityMapped::new(window) };

    let loaded = sequence.parse(raw)?.load(&window, &mut memory)?;

    // Safety:
    // Guaranteed by the caller.
    unsafe { loaded.transfer(platform) }
}
