//! Two-phase execution for destructive actions.
//!
//! ```text
//! NONE --propose--> PENDING --"ya"----> CONFIRMED  (stored payload runs, entry cleared)
//!                           --"batal"-> CANCELLED  (entry cleared, nothing runs)
//!                           --other---> SUPERSEDED (entry cleared, message handled normally)
//! PENDING --ttl elapses--> NONE (decided by the KV store)
//! ```
//!
//! All KV errors fail open: the user is never blocked by a broken store.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::traits::KvStore;
use crate::types::PendingConfirmation;

const AFFIRMATIVE: &[&str] = &[
    "ya", "iya", "iyaa", "iyah", "y", "yes", "yup", "ok", "oke", "okay", "okey", "confirm",
    "konfirmasi", "lanjut", "gas", "betul", "benar", "setuju", "sip", "yoi", "boleh",
];

const NEGATIVE: &[&str] = &[
    "tidak", "tdk", "gak", "ga", "nggak", "ngga", "enggak", "engga", "no", "n", "nope", "batal",
    "cancel", "jangan", "gajadi", "jadi",
];

/// Words that may accompany a yes/no without changing its meaning.
const FILLER: &[&str] = &[
    "aja", "saja", "dong", "deh", "bang", "kak", "min", "sih", "hapus", "dihapus", "hapusin",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplyKind {
    Affirmative,
    Negative,
    Other,
}

fn words(text: &str) -> Vec<String> {
    text.split_whitespace()
        .map(|w| {
            w.trim_matches(|c: char| !c.is_alphanumeric())
                .to_lowercase()
        })
        .filter(|w| !w.is_empty())
        .collect()
}

fn all_within(words: &[String], core: &[&str]) -> bool {
    words
        .iter()
        .all(|w| core.contains(&w.as_str()) || FILLER.contains(&w.as_str()))
        && words.iter().any(|w| core.contains(&w.as_str()))
}

/// Decide whether a message answers a pending yes/no prompt.
pub fn classify_reply(text: &str) -> ReplyKind {
    let words = words(text);
    if words.is_empty() {
        return ReplyKind::Other;
    }
    // "jadi" alone is not a negative; it only negates in "ga jadi".
    let negative_core = words.iter().any(|w| w != "jadi" && NEGATIVE.contains(&w.as_str()));
    if all_within(&words, AFFIRMATIVE) {
        ReplyKind::Affirmative
    } else if negative_core && all_within(&words, NEGATIVE) {
        ReplyKind::Negative
    } else {
        ReplyKind::Other
    }
}

/// What happened to a pending confirmation when a new message arrived.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Nothing was pending (or the store could not be read).
    None,
    /// Run exactly this stored payload.
    Confirmed(PendingConfirmation),
    Cancelled(PendingConfirmation),
    /// The message was about something else; handle it normally.
    Superseded,
}

pub struct ConfirmationStore {
    kv: Arc<dyn KvStore>,
    ttl: Duration,
}

impl ConfirmationStore {
    pub fn new(kv: Arc<dyn KvStore>, ttl: Duration) -> Self {
        Self { kv, ttl }
    }

    fn key(user_id: &str) -> String {
        format!("confirm:{}", user_id)
    }

    /// Park a destructive action. Replaces whatever was pending before.
    pub async fn propose(
        &self,
        user_id: &str,
        pending: &PendingConfirmation,
    ) -> anyhow::Result<()> {
        let value = serde_json::to_string(pending)?;
        self.kv
            .put(&Self::key(user_id), &value, Some(self.ttl))
            .await?;
        info!(
            user_id,
            action = %pending.payload.name,
            ttl_secs = self.ttl.as_secs(),
            "Destructive action awaiting confirmation"
        );
        Ok(())
    }

    /// Consume any pending entry against the user's new message.
    pub async fn resolve(&self, user_id: &str, text: &str) -> Resolution {
        let key = Self::key(user_id);
        let stored = match self.kv.get(&key).await {
            Ok(Some(v)) => v,
            Ok(None) => return Resolution::None,
            Err(e) => {
                warn!(user_id, error = %e, "Confirmation lookup failed, continuing without it");
                return Resolution::None;
            }
        };

        // Whatever the answer, the entry is single-use.
        if let Err(e) = self.kv.delete(&key).await {
            warn!(user_id, error = %e, "Failed to clear pending confirmation");
        }

        let pending: PendingConfirmation = match serde_json::from_str(&stored) {
            Ok(p) => p,
            Err(e) => {
                warn!(user_id, error = %e, "Discarding unreadable pending confirmation");
                return Resolution::None;
            }
        };

        match classify_reply(text) {
            ReplyKind::Affirmative => {
                info!(user_id, action = %pending.payload.name, "Confirmation accepted");
                Resolution::Confirmed(pending)
            }
            ReplyKind::Negative => {
                info!(user_id, action = %pending.payload.name, "Confirmation cancelled");
                Resolution::Cancelled(pending)
            }
            ReplyKind::Other => {
                debug!(user_id, "Pending confirmation superseded by new message");
                Resolution::Superseded
            }
        }
    }
}
