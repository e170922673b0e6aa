//! This module contains the global logger instance used by the `log` crate.
//!
//! Output goes to whatever console the board provides. The logger is only intended
//! to be used by the loader and will NOT be available after the jump to the image.

use core::fmt::Write;
use spin::{Mutex, Once};

/// The console the board handed over.
static SINK: Once<Mutex<&'static mut (dyn Write + Send)>> = Once::new();

/// The static API for the logger.
pub static LOGGER_API: LockedLogger = LockedLogger;

/// An API that is backed by a static locked console.
///
/// It is used to interface with the `log` crate.
pub struct LockedLogger;

/// Installs the logger, writing to `sink` every record up to `level`.
///
/// Only the first call sets the sink, later calls only change the level.
pub fn init(
    sink: &'static mut (dyn Write + Send),
    level: log::LevelFilter,
) -> &'static LockedLogger {
    SINK.call_once(|| Mutex::new(sink));
    // Fails if a logger is already installed, which is fine
    let _ = log::set_logger(&LOGGER_API);
    log::set_max_level(level);
    &LOGGER_API
}

impl log::Log for LockedLogger {
    fn enabled(&self, metadata: &log::Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &log::Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let Some(sink) = SINK.get() else {
            return;
        };

        let mut sink = sink.lock();
        // A failing console cannot be reported anywhere
        let _ = if cfg!(debug_assertions) {
            writeln!(
                sink,
                "[{:5}] {}:{}: {}",
                record.level(),
                record.file().unwrap_or("unknown"),
                record.line().unwrap_or(0),
                record.args()
            )
        } else {
            writeln!(sink, "[{:5}] {}", record.level(), record.args())
        };
    }

    fn flush(&self) {}
}
