//! Clock abstraction (injectable for testing).

/// Provides the current wall-clock time as Unix-epoch milliseconds.
///
/// Swap points are compared against artifact modification times, so the
/// registry and the reload sequencer take the clock through this trait
/// rather than calling `SystemTime::now()` directly. Tests inject a manual
/// clock to make timestamp assertions deterministic.
pub trait Clock: Send + Sync {
    /// Returns the current time as milliseconds since the Unix epoch.
    fn now_millis(&self) -> u64;
}

/// The default [`Clock`] implementation backed by the system clock.
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis()
            .try_into()
            .unwrap_or(u64::MAX)
    }
}
