//! Time utilities and tick schedule for the arena

use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

/// Get current Unix timestamp in milliseconds
pub fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or(Duration::ZERO)
        .as_millis() as u64
}

/// Server start time for uptime tracking
static SERVER_START: std::sync::OnceLock<Instant> = std::sync::OnceLock::new();

/// Initialize server start time (call once at startup)
pub fn init_server_time() {
    SERVER_START.get_or_init(Instant::now);
}

/// Get server uptime in seconds
pub fn uptime_secs() -> u64 {
    SERVER_START
        .get()
        .map(|start| start.elapsed().as_secs())
        .unwrap_or(0)
}

/// Fast cycle: combat, survival clocks, state broadcast (20 Hz)
pub const FAST_TICK_MS: u64 = 50;
/// Medium cycle: bot decisions
pub const BOT_TICK_MS: u64 = 500;
/// Slow cycle: inactivity sweep and bot backfill
pub const ADMIN_SWEEP_MS: u64 = 10_000;

/// Real players silent for longer than this are evicted
pub const INACTIVITY_TIMEOUT_MS: u64 = 120_000;

/// Delay between a bot's death and its removal from the roster.
/// Dead players are never removed on a timer.
pub const BOT_DEATH_GRACE_MS: u64 = 1_000;

pub fn fast_tick() -> Duration {
    Duration::from_millis(FAST_TICK_MS)
}

pub fn bot_tick() -> Duration {
    Duration::from_millis(BOT_TICK_MS)
}

pub fn admin_sweep() -> Duration {
    Duration::from_millis(ADMIN_SWEEP_MS)
}

/// Whole seconds elapsed between two millisecond timestamps
pub fn elapsed_secs(since_ms: u64, now_ms: u64) -> u64 {
    now_ms.saturating_sub(since_ms) / 1000
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn elapsed_secs_floors() {
        assert_eq!(elapsed_secs(1_000, 13_999), 12);
        assert_eq!(elapsed_secs(1_000, 13_000), 12);
    }

    #[test]
    fn elapsed_secs_never_underflows() {
        assert_eq!(elapsed_secs(5_000, 1_000), 0);
    }

    #[test]
    fn tick_schedule_is_ordered() {
        assert!(fast_tick() < bot_tick());
        assert!(bot_tick() < admin_sweep());
    }
}
