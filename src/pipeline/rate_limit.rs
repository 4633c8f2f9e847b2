use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use tracing::{info, warn};

use crate::traits::KvStore;

/// Fixed-window message counter per user, backed by the KV store.
pub struct RateLimiter {
    kv: Arc<dyn KvStore>,
    max_messages: u32,
    window: Duration,
}

impl RateLimiter {
    pub fn new(kv: Arc<dyn KvStore>, max_messages: u32, window: Duration) -> Self {
        Self {
            kv,
            max_messages,
            window,
        }
    }

    fn window_index(&self, now_secs: i64) -> i64 {
        let len = self.window.as_secs().max(1) as i64;
        now_secs.div_euclid(len)
    }

    /// True when the message may proceed. A broken store never blocks anyone.
    pub async fn check(&self, user_id: &str) -> bool {
        if self.max_messages == 0 {
            return true;
        }
        let window = self.window_index(Utc::now().timestamp());
        let key = format!("rate:{}:{}", user_id, window);
        match self.kv.incr(&key, self.window).await {
            Ok(count) if count > i64::from(self.max_messages) => {
                info!(user_id, count, "Rate limit exceeded");
                false
            }
            Ok(_) => true,
            Err(e) => {
                warn!(user_id, error = %e, "Rate counter unavailable, allowing message");
                true
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::MemoryKvStore;
    use crate::testing::FailingKvStore;

    #[tokio::test]
    async fn blocks_after_limit_within_window() {
        let limiter = RateLimiter::new(
            Arc::new(MemoryKvStore::new()),
            2,
            Duration::from_secs(3600),
        );
        assert!(limiter.check("u1").await);
        assert!(limiter.check("u1").await);
        assert!(!limiter.check("u1").await);
        assert!(limiter.check("u2").await);
    }

    #[tokio::test]
    async fn zero_disables_and_failures_allow() {
        let off = RateLimiter::new(Arc::new(FailingKvStore), 0, Duration::from_secs(60));
        assert!(off.check("u1").await);
        let broken = RateLimiter::new(Arc::new(FailingKvStore), 1, Duration::from_secs(60));
        assert!(broken.check("u1").await);
        assert!(broken.check("u1").await);
    }

    #[test]
    fn windows_are_aligned() {
        let limiter = RateLimiter::new(Arc::new(FailingKvStore), 1, Duration::from_secs(60));
        assert_eq!(limiter.window_index(119), 1);
        assert_eq!(limiter.window_index(120), 2);
    }
}
