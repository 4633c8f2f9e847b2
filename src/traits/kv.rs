use std::time::Duration;

use async_trait::async_trait;

/// Short-lived key-value storage with per-key expiry.
///
/// Holds everything with a lifetime shorter than the ledger: pending
/// confirmations, idempotency markers, rate counters and recent turns.
/// Expiry is decided by the store; callers never compare timestamps.
#[async_trait]
pub trait KvStore: Send + Sync {
    async fn get(&self, key: &str) -> anyhow::Result<Option<String>>;

    /// Store `value` under `key`. `ttl = None` keeps the key until deleted.
    async fn put(&self, key: &str, value: &str, ttl: Option<Duration>) -> anyhow::Result<()>;

    async fn delete(&self, key: &str) -> anyhow::Result<()>;

    /// Increment a counter and return the new value. The TTL only applies
    /// when the increment creates the key.
    async fn incr(&self, key: &str, ttl: Duration) -> anyhow::Result<i64>;
}
