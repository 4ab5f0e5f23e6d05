//! Rate limiting utilities

use governor::{
    clock::DefaultClock,
    state::{InMemoryState, NotKeyed},
    Quota, RateLimiter,
};
use std::num::NonZeroU32;
use std::sync::Arc;

/// Rate limiter type alias
pub type Limiter = RateLimiter<NotKeyed, InMemoryState, DefaultClock>;

/// Create a rate limiter with the specified requests per second
pub fn create_limiter(requests_per_second: u32) -> Arc<Limiter> {
    let quota = Quota::per_second(NonZeroU32::new(requests_per_second).unwrap_or(NonZeroU32::MIN));
    Arc::new(RateLimiter::direct(quota))
}

/// Max intent messages per second from one socket. Clients stream `move`
/// at frame rate, so this sits above a 60 fps client with some headroom
/// for attack/block bursts.
pub const INTENT_RATE_LIMIT: u32 = 90;

/// Per-connection rate limiter state
#[derive(Clone)]
pub struct ClientRateLimiter {
    intent_limiter: Arc<Limiter>,
}

impl ClientRateLimiter {
    pub fn new() -> Self {
        Self::with_rate(INTENT_RATE_LIMIT)
    }

    pub fn with_rate(per_second: u32) -> Self {
        Self {
            intent_limiter: create_limiter(per_second),
        }
    }

    /// Check if an intent message is allowed (returns true if allowed)
    pub fn check_intent(&self) -> bool {
        self.intent_limiter.check().is_ok()
    }
}

impl Default for ClientRateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn burst_beyond_quota_is_rejected() {
        let limiter = ClientRateLimiter::with_rate(3);
        assert!(limiter.check_intent());
        assert!(limiter.check_intent());
        assert!(limiter.check_intent());
        assert!(!limiter.check_intent());
    }

    #[test]
    fn zero_rate_falls_back_to_one() {
        let limiter = ClientRateLimiter::with_rate(0);
        assert!(limiter.check_intent());
        assert!(!limiter.check_intent());
    }
}
