use std::time::Duration;

/// Lets an action through at most once per `min_interval`. Calls in between
/// are dropped, not queued.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RateLimiter {
    min_interval: Duration,
    last_fire: Option<Duration>,
}

impl RateLimiter {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_fire: None,
        }
    }

    /// Returns `true` and records `now` if enough time has passed since the
    /// last accepted call.
    pub fn try_fire(&mut self, now: Duration) -> bool {
        if let Some(last) = self.last_fire
            && now.saturating_sub(last) < self.min_interval
        {
            return false;
        }
        self.last_fire = Some(now);
        true
    }

    pub fn reset(&mut self) {
        self.last_fire = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn drops_calls_inside_interval() {
        let mut limiter = RateLimiter::new(Duration::from_millis(16));
        assert!(limiter.try_fire(Duration::from_millis(100)));
        assert!(!limiter.try_fire(Duration::from_millis(105)));
        assert!(!limiter.try_fire(Duration::from_millis(115)));
        assert!(limiter.try_fire(Duration::from_millis(116)));
        assert!(!limiter.try_fire(Duration::from_millis(120)));
    }

    #[test]
    fn reset_allows_immediate_fire() {
        let mut limiter = RateLimiter::new(Duration::from_secs(1));
        assert!(limiter.try_fire(Duration::ZERO));
        limiter.reset();
        assert!(limiter.try_fire(Duration::from_millis(1)));
    }

    #[test]
    fn zero_interval_never_drops() {
        let mut limiter = RateLimiter::new(Duration::ZERO);
        for _ in 0..3 {
            assert!(limiter.try_fire(Duration::from_secs(5)));
        }
    }
}
