//! Test infrastructure: MockProvider, FailingKvStore and a wired-up harness.
//!
//! The harness runs the real pipeline against a temp-file SQLite ledger, an
//! in-memory KV store and a scripted model.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tokio::sync::Mutex;

use crate::actions::tool_name_from_definition;
use crate::config::AppConfig;
use crate::pipeline::Pipeline;
use crate::state::{open_pool, MemoryKvStore, SqliteLedgerStore};
use crate::traits::{InferenceRequest, KvStore, ModelProvider};
use crate::types::InboundMessage;

// ---------------------------------------------------------------------------
// MockProvider
// ---------------------------------------------------------------------------

/// A recorded call to `MockProvider::chat()`.
#[derive(Debug, Clone)]
pub struct MockChatCall {
    pub model: String,
    pub system_prompt: String,
    pub user_text: String,
    pub history_len: usize,
    pub tool_names: Vec<String>,
    pub require_action: bool,
}

/// Mock LLM provider that returns scripted raw response bodies.
pub struct MockProvider {
    responses: Mutex<Vec<anyhow::Result<Value>>>,
    pub call_log: Mutex<Vec<MockChatCall>>,
}

impl MockProvider {
    /// Create a provider that always answers with a short text reply.
    pub fn new() -> Self {
        Self::with_responses(Vec::new())
    }

    /// Create a provider with a FIFO queue of scripted bodies.
    pub fn with_responses(responses: Vec<Value>) -> Self {
        Self {
            responses: Mutex::new(responses.into_iter().map(Ok).collect()),
            call_log: Mutex::new(Vec::new()),
        }
    }

    /// Queue one more scripted body.
    pub async fn push_response(&self, body: Value) {
        self.responses.lock().await.push(Ok(body));
    }

    /// Queue an error.
    pub async fn push_error(&self, err: anyhow::Error) {
        self.responses.lock().await.push(Err(err));
    }

    /// Helper: chat-completion body with text only.
    pub fn text_response(text: &str) -> Value {
        json!({
            "choices": [{"message": {"role": "assistant", "content": text}}]
        })
    }

    /// Helper: chat-completion body with one tool call.
    pub fn tool_call_response(tool_name: &str, args: Value) -> Value {
        json!({
            "choices": [{"message": {
                "role": "assistant",
                "content": null,
                "tool_calls": [{
                    "id": format!("call_{}", uuid::Uuid::new_v4()),
                    "type": "function",
                    "function": {"name": tool_name, "arguments": args.to_string()}
                }]
            }}]
        })
    }

    /// How many times `chat()` was called.
    pub async fn call_count(&self) -> usize {
        self.call_log.lock().await.len()
    }
}

#[async_trait]
impl ModelProvider for MockProvider {
    async fn chat(&self, model: &str, request: &InferenceRequest<'_>) -> anyhow::Result<Value> {
        self.call_log.lock().await.push(MockChatCall {
            model: model.to_string(),
            system_prompt: request.system_prompt.to_string(),
            user_text: request.user_text.to_string(),
            history_len: request.history.len(),
            tool_names: request
                .tools
                .iter()
                .filter_map(|t| tool_name_from_definition(t).map(str::to_string))
                .collect(),
            require_action: request.require_action,
        });

        let mut responses = self.responses.lock().await;
        if responses.is_empty() {
            Ok(MockProvider::text_response("Mock response"))
        } else {
            responses.remove(0)
        }
    }
}

// ---------------------------------------------------------------------------
// FailingKvStore
// ---------------------------------------------------------------------------

/// KV store whose every call fails, for fail-open checks.
pub struct FailingKvStore;

#[async_trait]
impl KvStore for FailingKvStore {
    async fn get(&self, _key: &str) -> anyhow::Result<Option<String>> {
        anyhow::bail!("kv unavailable")
    }

    async fn put(&self, _key: &str, _value: &str, _ttl: Option<Duration>) -> anyhow::Result<()> {
        anyhow::bail!("kv unavailable")
    }

    async fn delete(&self, _key: &str) -> anyhow::Result<()> {
        anyhow::bail!("kv unavailable")
    }

    async fn incr(&self, _key: &str, _ttl: Duration) -> anyhow::Result<i64> {
        anyhow::bail!("kv unavailable")
    }
}

// ---------------------------------------------------------------------------
// Ledger + harness
// ---------------------------------------------------------------------------

/// Fresh SQLite ledger in a temp file. Keep the file handle alive for the
/// duration of the test.
pub async fn setup_test_ledger() -> (Arc<SqliteLedgerStore>, tempfile::NamedTempFile) {
    let db_file = tempfile::NamedTempFile::new().unwrap();
    let pool = open_pool(db_file.path().to_str().unwrap()).await.unwrap();
    (Arc::new(SqliteLedgerStore::new(pool)), db_file)
}

pub fn test_config(extra: &str) -> AppConfig {
    AppConfig::from_toml(&format!(
        "[provider]\napi_key = \"test\"\nmodel = \"main-model\"\n{}",
        extra
    ))
    .unwrap()
}

pub struct TestHarness {
    pub pipeline: Pipeline,
    pub provider: Arc<MockProvider>,
    pub ledger: Arc<SqliteLedgerStore>,
    pub kv: Arc<MemoryKvStore>,
    _db_file: tempfile::NamedTempFile,
}

impl TestHarness {
    pub async fn new(responses: Vec<Value>) -> Self {
        Self::with_config(responses, test_config("")).await
    }

    pub async fn with_config(responses: Vec<Value>, config: AppConfig) -> Self {
        let (ledger, db_file) = setup_test_ledger().await;
        let provider = Arc::new(MockProvider::with_responses(responses));
        let kv = Arc::new(MemoryKvStore::new());
        let pipeline = Pipeline::new(&config, provider.clone(), ledger.clone(), kv.clone());
        Self {
            pipeline,
            provider,
            ledger,
            kv,
            _db_file: db_file,
        }
    }

    /// Send a message with a fresh message id.
    pub async fn send(&self, user_id: &str, text: &str) -> Option<String> {
        self.send_with_id(user_id, &uuid::Uuid::new_v4().to_string(), text)
            .await
    }

    pub async fn send_with_id(&self, user_id: &str, message_id: &str, text: &str) -> Option<String> {
        self.pipeline
            .handle_message(&InboundMessage {
                user_id: user_id.to_string(),
                chat_id: format!("chat-{}", user_id),
                message_id: message_id.to_string(),
                text: text.to_string(),
            })
            .await
    }
}
