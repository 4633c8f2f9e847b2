use std::sync::Arc;
use std::time::Duration;

use tracing::warn;

use crate::traits::KvStore;
use crate::types::Turn;
use crate::utils::truncate_str;

/// Replies can be long lists; only the gist is useful as context.
const MAX_TURN_CHARS: usize = 500;

/// Recent conversation turns, kept in the KV store so any instance can
/// pick them up.
pub struct HistoryStore {
    kv: Arc<dyn KvStore>,
    max_turns: usize,
    ttl: Duration,
}

impl HistoryStore {
    pub fn new(kv: Arc<dyn KvStore>, max_turns: usize, ttl: Duration) -> Self {
        Self { kv, max_turns, ttl }
    }

    fn key(user_id: &str) -> String {
        format!("history:{}", user_id)
    }

    pub async fn load(&self, user_id: &str) -> Vec<Turn> {
        if self.max_turns == 0 {
            return Vec::new();
        }
        match self.kv.get(&Self::key(user_id)).await {
            Ok(Some(raw)) => serde_json::from_str(&raw).unwrap_or_else(|e| {
                warn!(user_id, error = %e, "Discarding unreadable history");
                Vec::new()
            }),
            Ok(None) => Vec::new(),
            Err(e) => {
                warn!(user_id, error = %e, "History lookup failed, continuing without it");
                Vec::new()
            }
        }
    }

    /// Append one user/assistant exchange, keeping the newest `max_turns`.
    pub async fn append(&self, user_id: &str, user_text: &str, reply: &str) {
        if self.max_turns == 0 {
            return;
        }
        let mut turns = self.load(user_id).await;
        turns.push(Turn {
            role: "user".to_string(),
            content: truncate_str(user_text, MAX_TURN_CHARS),
        });
        turns.push(Turn {
            role: "assistant".to_string(),
            content: truncate_str(reply, MAX_TURN_CHARS),
        });
        if turns.len() > self.max_turns {
            let excess = turns.len() - self.max_turns;
            turns.drain(..excess);
        }

        let result = match serde_json::to_string(&turns) {
            Ok(raw) => self.kv.put(&Self::key(user_id), &raw, Some(self.ttl)).await,
            Err(e) => Err(e.into()),
        };
        if let Err(e) = result {
            warn!(user_id, error = %e, "Failed to save history");
        }
    }
}
