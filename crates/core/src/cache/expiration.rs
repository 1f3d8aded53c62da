//! Absolute and sliding expiration for cache entries.

use std::ops::Add;
use std::time::Duration;

/// When a cache entry stops being served.
///
/// An entry expires at the earlier of `created + absolute` and
/// `last_access + sliding`. Reads refresh `last_access`. With neither set
/// the entry lives until evicted or invalidated.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Expiration {
    pub absolute: Option<Duration>,
    pub sliding: Option<Duration>,
}

impl Expiration {
    pub fn never() -> Self {
        Self::default()
    }

    pub fn absolute(duration: Duration) -> Self {
        Self {
            absolute: Some(duration),
            sliding: None,
        }
    }

    pub fn sliding(duration: Duration) -> Self {
        Self {
            absolute: None,
            sliding: Some(duration),
        }
    }

    pub fn with_sliding(mut self, duration: Duration) -> Self {
        self.sliding = Some(duration);
        self
    }

    /// Builds an expiration from seconds, treating 0 as "not set".
    pub fn from_secs(absolute: u64, sliding: u64) -> Self {
        Self {
            absolute: (absolute > 0).then(|| Duration::from_secs(absolute)),
            sliding: (sliding > 0).then(|| Duration::from_secs(sliding)),
        }
    }

    pub fn is_never(&self) -> bool {
        self.absolute.is_none() && self.sliding.is_none()
    }

    /// Time-to-live right after the entry is written.
    pub fn initial_ttl(&self) -> Option<Duration> {
        match (self.absolute, self.sliding) {
            (Some(a), Some(s)) => Some(a.min(s)),
            (a, s) => a.or(s),
        }
    }

    /// The instant the entry expires given when it was written and last read.
    ///
    /// Generic over the clock so it works with both `Instant` and `SystemTime`.
    pub fn deadline<T>(&self, created: T, last_access: T) -> Option<T>
    where
        T: Add<Duration, Output = T> + Ord + Copy,
    {
        let absolute = self.absolute.map(|d| created + d);
        let sliding = self.sliding.map(|d| last_access + d);
        match (absolute, sliding) {
            (Some(a), Some(s)) => Some(a.min(s)),
            (a, s) => a.or(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_from_secs_zero_means_unset() {
        assert!(Expiration::from_secs(0, 0).is_never());
        assert_eq!(
            Expiration::from_secs(300, 0),
            Expiration::absolute(Duration::from_secs(300))
        );
        assert_eq!(
            Expiration::from_secs(0, 60),
            Expiration::sliding(Duration::from_secs(60))
        );
    }

    #[test]
    fn test_initial_ttl() {
        assert_eq!(Expiration::never().initial_ttl(), None);
        let both = Expiration::absolute(Duration::from_secs(300)).with_sliding(Duration::from_secs(60));
        assert_eq!(both.initial_ttl(), Some(Duration::from_secs(60)));
    }

    #[test]
    fn test_sliding_window_moves_with_access() {
        let start = Instant::now();
        let expiration = Expiration::sliding(Duration::from_secs(60));
        assert_eq!(
            expiration.deadline(start, start + Duration::from_secs(50)),
            Some(start + Duration::from_secs(110))
        );
    }

    #[test]
    fn test_absolute_caps_sliding() {
        let start = Instant::now();
        let expiration =
            Expiration::absolute(Duration::from_secs(100)).with_sliding(Duration::from_secs(60));
        // Accessed at 90s: sliding would allow until 150s, absolute stops at 100s.
        assert_eq!(
            expiration.deadline(start, start + Duration::from_secs(90)),
            Some(start + Duration::from_secs(100))
        );
    }

    #[test]
    fn test_never_has_no_deadline() {
        let start = Instant::now();
        assert_eq!(Expiration::never().deadline(start, start), None);
    }
}
