use async_trait::async_trait;
use serde_json::Value;

use crate::types::Turn;

/// Everything the inference layer gets to see for one call.
#[derive(Debug, Clone, Copy)]
pub struct InferenceRequest<'a> {
    pub system_prompt: &'a str,
    pub history: &'a [Turn],
    pub user_text: &'a str,
    /// OpenAI-format function definitions. Empty means no tools offered.
    pub tools: &'a [Value],
    /// Ask the model to call at least one tool instead of answering in text.
    pub require_action: bool,
}

/// Sends a prompt and tool definitions to an LLM and returns the raw
/// response body, unparsed. Backends differ in body shape; the response
/// normalizer handles all of them.
#[async_trait]
pub trait ModelProvider: Send + Sync {
    async fn chat(&self, model: &str, request: &InferenceRequest<'_>) -> anyhow::Result<Value>;
}
