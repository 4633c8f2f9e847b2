//! Message handling from raw chat text to a reply.
//!
//! ```text
//! dedup -> rate limit -> pending confirmation -> classify -> normalize slang
//!   -> select tools -> inference -> normalize response -> validate -> route
//! ```

pub mod classifier;
pub mod confirmation;
pub mod history;
pub mod normalizer;
pub mod prompt;
pub mod rate_limit;
pub mod router;
pub mod slang;
pub mod tool_selector;
pub mod validator;

use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, Utc};
use tracing::{debug, error, info, warn};

use crate::actions::tool_definitions;
use crate::config::AppConfig;
use crate::providers::ProviderError;
use crate::traits::{InferenceRequest, KvStore, LedgerStore, ModelProvider};
use crate::types::InboundMessage;

use classifier::{can_skip_nlu, classify_input, InputClass};
use confirmation::{ConfirmationStore, Resolution};
use history::HistoryStore;
use normalizer::normalize_response;
use rate_limit::RateLimiter;
use router::ExecutionRouter;
use slang::expand_slang;
use tool_selector::{select_tools, ToolSelection};
use validator::{validate_actions, ValidationLimits};

const GENERIC_APOLOGY: &str =
    "Maaf, ada gangguan waktu memproses pesanmu. Coba kirim ulang sebentar lagi ya 🙏";
const NOT_UNDERSTOOD: &str = "Hmm, aku belum nangkep maksudnya. Coba tulis misalnya \
\"bensin 20rb\" atau \"dapet 150rb dari order\".";
const SLOW_DOWN: &str = "Pelan-pelan ya, pesannya kebanyakan. Tunggu sebentar lalu kirim lagi.";

/// The user's current date at a fixed UTC offset.
pub fn local_today(offset_hours: i32) -> NaiveDate {
    let now = Utc::now();
    match FixedOffset::east_opt(offset_hours.saturating_mul(3600)) {
        Some(tz) => now.with_timezone(&tz).date_naive(),
        None => now.date_naive(),
    }
}

pub struct Pipeline {
    provider: Arc<dyn ModelProvider>,
    kv: Arc<dyn KvStore>,
    confirmations: Arc<ConfirmationStore>,
    router: ExecutionRouter,
    history: HistoryStore,
    rate_limiter: RateLimiter,
    model: String,
    nlu_model: Option<String>,
    timezone_offset_hours: i32,
    dedup_ttl: Duration,
    limits: ValidationLimits,
}

impl Pipeline {
    pub fn new(
        config: &AppConfig,
        provider: Arc<dyn ModelProvider>,
        ledger: Arc<dyn LedgerStore>,
        kv: Arc<dyn KvStore>,
    ) -> Self {
        let pipeline = &config.pipeline;
        let confirmations = Arc::new(ConfirmationStore::new(
            kv.clone(),
            pipeline.confirmation_ttl(),
        ));
        Self {
            provider,
            router: ExecutionRouter::new(ledger, confirmations.clone()),
            confirmations,
            history: HistoryStore::new(kv.clone(), pipeline.history_turns, pipeline.history_ttl()),
            rate_limiter: RateLimiter::new(
                kv.clone(),
                config.rate_limit.max_messages,
                Duration::from_secs(config.rate_limit.window_secs),
            ),
            kv,
            model: config.provider.model.clone(),
            nlu_model: config.provider.nlu_model.clone(),
            timezone_offset_hours: pipeline.timezone_offset_hours,
            dedup_ttl: pipeline.dedup_ttl(),
            limits: pipeline.limits(),
        }
    }

    /// Handle one inbound message. `None` means send nothing back, which only
    /// happens for duplicate deliveries and empty messages.
    pub async fn handle_message(&self, msg: &InboundMessage) -> Option<String> {
        let text = msg.text.trim();
        if text.is_empty() {
            return None;
        }
        if self.is_duplicate(msg).await {
            info!(
                user_id = %msg.user_id,
                message_id = %msg.message_id,
                "Duplicate delivery ignored"
            );
            return None;
        }
        if !self.rate_limiter.check(&msg.user_id).await {
            return Some(SLOW_DOWN.to_string());
        }

        let reply = match self.process(&msg.user_id, text).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(user_id = %msg.user_id, error = %e, "Message handling failed");
                match e.downcast_ref::<ProviderError>() {
                    Some(provider_err) => provider_err.user_message(),
                    None => GENERIC_APOLOGY.to_string(),
                }
            }
        };
        self.history.append(&msg.user_id, text, &reply).await;
        Some(reply)
    }

    /// Atomic first-seen check on chat + message id. Fails open.
    async fn is_duplicate(&self, msg: &InboundMessage) -> bool {
        let key = format!("dedup:{}:{}", msg.chat_id, msg.message_id);
        match self.kv.incr(&key, self.dedup_ttl).await {
            Ok(count) => count > 1,
            Err(e) => {
                warn!(user_id = %msg.user_id, error = %e, "Dedup check failed, processing anyway");
                false
            }
        }
    }

    async fn process(&self, user_id: &str, text: &str) -> anyhow::Result<String> {
        let today = local_today(self.timezone_offset_hours);

        match self.confirmations.resolve(user_id, text).await {
            Resolution::Confirmed(pending) => {
                let outcome = self
                    .router
                    .execute_confirmed(user_id, today, &pending)
                    .await?;
                return Ok(outcome.message);
            }
            Resolution::Cancelled(pending) => {
                return Ok(format!(
                    "Oke, nggak jadi. {}",
                    cancelled_note(&pending.description)
                ));
            }
            Resolution::Superseded | Resolution::None => {}
        }

        let class = classify_input(text);
        let normalized = self.normalize_text(text, class).await;
        let selection = select_tools(&normalized);
        let tools = tool_definitions(&selection.actions);
        let system_prompt = prompt::system_prompt(today, class);
        let history = self.history.load(user_id).await;
        info!(
            user_id,
            class = class.as_str(),
            tools = selection.label,
            "Calling inference"
        );

        let raw = self
            .provider
            .chat(
                &self.model,
                &InferenceRequest {
                    system_prompt: &system_prompt,
                    history: &history,
                    user_text: &normalized,
                    tools: &tools,
                    require_action: must_act(class, &selection),
                },
            )
            .await?;

        let result = normalize_response(&raw);
        if result.action_calls.is_empty() {
            return Ok(result.text.unwrap_or_else(|| NOT_UNDERSTOOD.to_string()));
        }

        let batch = validate_actions(result.action_calls, self.limits);
        let outcomes = self.router.execute(user_id, today, batch.actions).await?;

        let mut parts: Vec<String> = outcomes.into_iter().map(|o| o.message).collect();
        if batch.failed_items > 0 {
            parts.push(format!(
                "⚠️ {} item gagal diproses karena nominalnya nggak valid.",
                batch.failed_items
            ));
        }
        if batch.dropped_destructive > 0 {
            parts.push("Satu penghapusan per pesan ya, sisanya aku abaikan.".to_string());
        }
        if parts.is_empty() {
            debug!(user_id, "No action survived validation");
            return Ok(NOT_UNDERSTOOD.to_string());
        }
        Ok(parts.join("\n\n"))
    }

    /// Expand slang to digits for classes that need it. An optional model pass
    /// runs first; any failure there falls back to the deterministic expander.
    async fn normalize_text(&self, text: &str, class: InputClass) -> String {
        if can_skip_nlu(class) {
            return text.to_string();
        }
        if let Some(model) = &self.nlu_model {
            let request = InferenceRequest {
                system_prompt: prompt::NLU_PROMPT,
                history: &[],
                user_text: text,
                tools: &[],
                require_action: false,
            };
            match self.provider.chat(model, &request).await {
                Ok(raw) => match normalize_response(&raw).text {
                    Some(rewritten) => {
                        debug!(class = class.as_str(), "Model normalization applied");
                        return expand_slang(&rewritten);
                    }
                    None => debug!("Model normalization returned nothing"),
                },
                Err(e) => warn!(error = %e, "Model normalization failed, using expander"),
            }
        }
        expand_slang(text)
    }
}

/// Force a tool call only when the offered subset can express the message.
/// A recording message whose subset lost `record_transactions` answers freely.
fn must_act(class: InputClass, selection: &ToolSelection) -> bool {
    match class {
        InputClass::Query => true,
        InputClass::Clean | InputClass::Edit => selection.can_record(),
        InputClass::Slang | InputClass::Complex => false,
    }
}

fn cancelled_note(description: &str) -> String {
    let subject = description
        .trim_start_matches("Hapus ")
        .trim_end_matches('?');
    format!("{} tetap disimpan.", subject)
}

#[cfg(test)]
mod tests;
