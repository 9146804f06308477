//! Time utilities and module-wide timing constants.

use chrono::{DateTime, Duration, Utc};

/// Timing constants for the currency module.
pub mod constants {
    use super::Duration;

    /// How long a cached rate stays fresh (5 minutes).
    pub fn cache_duration() -> Duration {
        Duration::minutes(5)
    }

    /// Minimum auto-update period for live providers (5 minutes).
    pub fn default_update_interval() -> Duration {
        Duration::minutes(5)
    }

    /// Timeout for a single provider call (10 seconds).
    pub fn provider_timeout() -> Duration {
        Duration::seconds(10)
    }

    /// Simulated latency for reference-data loads (500 milliseconds).
    pub fn network_delay() -> Duration {
        Duration::milliseconds(500)
    }
}

/// A timestamp with timezone (always UTC).
pub type Timestamp = DateTime<Utc>;

/// Get the current timestamp.
pub fn now() -> Timestamp {
    Utc::now()
}

/// Check if a timestamp has expired (is in the past).
pub fn is_expired(expiry: Timestamp) -> bool {
    now() > expiry
}

/// Calculate expiry time from now.
pub fn expires_in(duration: Duration) -> Timestamp {
    now() + duration
}

/// Duration extensions for convenient construction.
pub trait DurationExt {
    fn as_std(&self) -> std::time::Duration;
}

impl DurationExt for Duration {
    fn as_std(&self) -> std::time::Duration {
        self.to_std().unwrap_or(std::time::Duration::ZERO)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_expired() {
        let past = now() - Duration::seconds(10);
        assert!(is_expired(past));

        let future = now() + Duration::seconds(10);
        assert!(!is_expired(future));
    }

    #[test]
    fn test_expires_in() {
        let expiry = expires_in(constants::cache_duration());
        assert!(expiry > now());
        assert!(!is_expired(expiry));
    }

    #[test]
    fn test_duration_as_std() {
        assert_eq!(
            constants::network_delay().as_std(),
            std::time::Duration::from_millis(500)
        );
        assert_eq!(Duration::seconds(-1).as_std(), std::time::Duration::ZERO);
    }
}
