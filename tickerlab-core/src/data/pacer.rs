//! Fetch pacing for rate-limited providers.
//!
//! Enforces "at most one fetch per interval" across every caller sharing the
//! pacer. The first fetch goes out immediately; later ones sleep for
//! whatever is left of the interval.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::info;

#[derive(Debug)]
pub struct FetchPacer {
    min_interval: Duration,
    last_fetch: Mutex<Option<Instant>>,
}

impl FetchPacer {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_fetch: Mutex::new(None),
        }
    }

    /// Pacer that never waits.
    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn min_interval(&self) -> Duration {
        self.min_interval
    }

    /// Time left before the next fetch may start.
    pub fn remaining(&self) -> Duration {
        let last = self.last_fetch.lock().unwrap_or_else(PoisonError::into_inner);
        match *last {
            Some(at) => self.min_interval.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        }
    }

    /// Block until a fetch is allowed, then claim the slot.
    ///
    /// The lock is held while sleeping so concurrent callers queue up
    /// behind each other. Returns how long the caller waited.
    pub fn wait(&self) -> Duration {
        let mut last = self.last_fetch.lock().unwrap_or_else(PoisonError::into_inner);
        let pending = match *last {
            Some(at) => self.min_interval.saturating_sub(at.elapsed()),
            None => Duration::ZERO,
        };
        if !pending.is_zero() {
            info!(
                wait_secs = pending.as_secs_f64(),
                "waiting for provider rate limit"
            );
            std::thread::sleep(pending);
        }
        *last = Some(Instant::now());
        pending
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_fetch_is_immediate() {
        let pacer = FetchPacer::new(Duration::from_secs(60));
        assert_eq!(pacer.remaining(), Duration::ZERO);
        assert_eq!(pacer.wait(), Duration::ZERO);
    }

    #[test]
    fn second_fetch_waits_out_interval() {
        let pacer = FetchPacer::new(Duration::from_millis(40));
        let start = Instant::now();
        pacer.wait();
        pacer.wait();
        assert!(start.elapsed() >= Duration::from_millis(40));
    }

    #[test]
    fn remaining_reflects_last_fetch() {
        let pacer = FetchPacer::new(Duration::from_secs(60));
        pacer.wait();
        assert!(pacer.remaining() > Duration::from_secs(59));
    }

    #[test]
    fn unpaced_never_waits() {
        let pacer = FetchPacer::unpaced();
        pacer.wait();
        assert_eq!(pacer.wait(), Duration::ZERO);
    }
}
