//! Minimum spacing between requests sent to one source.

use std::sync::{Mutex, PoisonError};
use std::time::{Duration, Instant};
use tracing::debug;

/// Enforces a minimum interval between consecutive requests.
///
/// Each call to [`RequestPacer::wait`] reserves the next free slot before
/// sleeping, so callers sharing a pacer never overlap.
#[derive(Debug)]
pub struct RequestPacer {
    interval: Duration,
    /// Extra random delay added on top of `interval`, up to this much
    jitter: Duration,
    next_slot: Mutex<Option<Instant>>,
}

impl RequestPacer {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            jitter: Duration::ZERO,
            next_slot: Mutex::new(None),
        }
    }

    /// Interval randomized within `[min, max]`, used for Scholar-like endpoints
    pub fn randomized(min: Duration, max: Duration) -> Self {
        Self {
            interval: min,
            jitter: max.saturating_sub(min),
            next_slot: Mutex::new(None),
        }
    }

    /// No spacing at all (tests, local mirrors)
    pub fn unpaced() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Sleep until this caller may send its request
    pub async fn wait(&self) {
        let now = Instant::now();
        let slot = {
            // a panic elsewhere cannot corrupt an Option<Instant>; keep pacing
            let mut next = self.next_slot.lock().unwrap_or_else(PoisonError::into_inner);
            let slot = match *next {
                Some(t) if t > now => t,
                _ => now,
            };
            *next = Some(slot + self.spacing());
            slot
        };

        if slot > now {
            let wait = slot - now;
            debug!(wait_ms = wait.as_millis() as u64, "Pacing request");
            tokio::time::sleep(wait).await;
        }
    }

    fn spacing(&self) -> Duration {
        if self.jitter.is_zero() {
            return self.interval;
        }
        let extra = rand::random::<u64>() % (self.jitter.as_millis() as u64 + 1);
        self.interval + Duration::from_millis(extra)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_first_request_is_immediate() {
        let pacer = RequestPacer::new(Duration::from_secs(60));
        let start = Instant::now();
        pacer.wait().await;
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[tokio::test]
    async fn test_second_request_waits() {
        let pacer = RequestPacer::new(Duration::from_millis(80));
        let start = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[tokio::test]
    async fn test_pacing_survives_poisoned_lock() {
        let pacer = std::sync::Arc::new(RequestPacer::new(Duration::from_millis(80)));
        let holder = pacer.clone();
        let _ = std::thread::spawn(move || {
            let _guard = holder.next_slot.lock();
            panic!("poison the pacer");
        })
        .join();
        assert!(pacer.next_slot.is_poisoned());

        let start = Instant::now();
        pacer.wait().await;
        pacer.wait().await;
        assert!(start.elapsed() >= Duration::from_millis(80));
    }

    #[test]
    fn test_randomized_spacing_bounds() {
        let pacer = RequestPacer::randomized(Duration::from_secs(2), Duration::from_secs(5));
        for _ in 0..50 {
            let spacing = pacer.spacing();
            assert!(spacing >= Duration::from_secs(2));
            assert!(spacing <= Duration::from_secs(5));
        }
    }
}
