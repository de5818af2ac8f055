#[cfg(test)]
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Milliseconds elapsed since a fixed, monotonic origin.
pub trait Clock: Send + Sync {
    fn now_millis(&self) -> u128;
}

pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    #[inline]
    fn now_millis(&self) -> u128 {
        self.origin.elapsed().as_millis()
    }
}

impl<C: Clock + ?Sized> Clock for Arc<C> {
    #[inline]
    fn now_millis(&self) -> u128 {
        (**self).now_millis()
    }
}

/// Clock advanced by hand.
#[cfg(test)]
#[derive(Default)]
pub struct ManualClock {
    millis: AtomicU64,
}

#[cfg(test)]
impl ManualClock {
    pub fn advance(&self, millis: u64) {
        self.millis.fetch_add(millis, Ordering::SeqCst);
    }
}

#[cfg(test)]
impl Clock for ManualClock {
    fn now_millis(&self) -> u128 {
        u128::from(self.millis.load(Ordering::SeqCst))
    }
}
