//! Naive request throttle for the proposal endpoint.
//!
//! Fixed 60-second window, 10 requests per client identifier, lazy expiry of
//! finished windows. The state is an explicit object and the clock value is
//! passed into [`RateLimiter::check`], so window expiry is deterministic
//! under test. Advisory protection for the text-generation call only.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};

const WINDOW_SECS: i64 = 60;
const MAX_REQUESTS: u32 = 10;

/// Outcome of a rate-limit check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RateLimitDecision {
    Allowed,
    Limited { retry_after_secs: u64 },
}

#[derive(Debug)]
struct Entry {
    count: u32,
    reset_at: DateTime<Utc>,
}

/// Per-process request counter keyed by client identifier.
#[derive(Debug, Default)]
pub struct RateLimiter {
    entries: HashMap<String, Entry>,
}

impl RateLimiter {
    pub fn new() -> Self {
        RateLimiter::default()
    }

    /// Count one request from `identifier` at `now`.
    pub fn check(&mut self, identifier: &str, now: DateTime<Utc>) -> RateLimitDecision {
        // Lazy expiry of finished windows.
        self.entries.retain(|_, entry| now <= entry.reset_at);

        if let Some(entry) = self.entries.get_mut(identifier) {
            if entry.count >= MAX_REQUESTS {
                let remaining_ms = (entry.reset_at - now).num_milliseconds().max(0);
                let retry_after_secs = ((remaining_ms + 999) / 1000) as u64;
                return RateLimitDecision::Limited { retry_after_secs };
            }
            entry.count += 1;
        } else {
            self.entries.insert(
                identifier.to_string(),
                Entry {
                    count: 1,
                    reset_at: now + Duration::seconds(WINDOW_SECS),
                },
            );
        }

        RateLimitDecision::Allowed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn allows_up_to_the_cap_within_one_window() {
        let mut limiter = RateLimiter::new();
        let now = start();

        for _ in 0..MAX_REQUESTS {
            assert_eq!(limiter.check("10.0.0.1", now), RateLimitDecision::Allowed);
        }
        assert!(matches!(
            limiter.check("10.0.0.1", now),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[test]
    fn retry_after_counts_down_to_window_end() {
        let mut limiter = RateLimiter::new();
        let now = start();

        for _ in 0..MAX_REQUESTS {
            limiter.check("10.0.0.1", now);
        }

        assert_eq!(
            limiter.check("10.0.0.1", now),
            RateLimitDecision::Limited {
                retry_after_secs: 60
            }
        );
        assert_eq!(
            limiter.check("10.0.0.1", now + Duration::seconds(45)),
            RateLimitDecision::Limited {
                retry_after_secs: 15
            }
        );
    }

    #[test]
    fn window_expiry_resets_the_counter() {
        let mut limiter = RateLimiter::new();
        let now = start();

        for _ in 0..MAX_REQUESTS {
            limiter.check("10.0.0.1", now);
        }
        assert!(matches!(
            limiter.check("10.0.0.1", now),
            RateLimitDecision::Limited { .. }
        ));

        let later = now + Duration::seconds(WINDOW_SECS + 1);
        assert_eq!(limiter.check("10.0.0.1", later), RateLimitDecision::Allowed);

        // The fresh window starts from the first post-expiry request.
        for _ in 0..MAX_REQUESTS - 1 {
            assert_eq!(limiter.check("10.0.0.1", later), RateLimitDecision::Allowed);
        }
        assert!(matches!(
            limiter.check("10.0.0.1", later),
            RateLimitDecision::Limited { .. }
        ));
    }

    #[test]
    fn identifiers_are_counted_independently() {
        let mut limiter = RateLimiter::new();
        let now = start();

        for _ in 0..MAX_REQUESTS {
            limiter.check("10.0.0.1", now);
        }
        assert!(matches!(
            limiter.check("10.0.0.1", now),
            RateLimitDecision::Limited { .. }
        ));
        assert_eq!(limiter.check("10.0.0.2", now), RateLimitDecision::Allowed);
    }

    #[test]
    fn expired_entries_are_dropped_lazily() {
        let mut limiter = RateLimiter::new();
        let now = start();

        limiter.check("10.0.0.1", now);
        limiter.check("10.0.0.2", now);
        assert_eq!(limiter.entries.len(), 2);

        limiter.check("10.0.0.3", now + Duration::seconds(WINDOW_SECS + 1));
        assert_eq!(limiter.entries.len(), 1);
    }
}
