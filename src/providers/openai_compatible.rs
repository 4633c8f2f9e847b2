use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use tracing::{debug, error, info, warn};
use zeroize::Zeroize;

use crate::providers::ProviderError;
use crate::traits::{InferenceRequest, ModelProvider};
use crate::utils::truncate_str;

/// Retries after the first attempt for transient failures.
const MAX_RETRIES: u32 = 2;
const MAX_RETRY_WAIT_SECS: u64 = 10;

pub struct OpenAiCompatibleProvider {
    client: Client,
    base_url: String,
    api_key: String,
}

impl Drop for OpenAiCompatibleProvider {
    fn drop(&mut self) {
        self.api_key.zeroize();
    }
}

/// Validate the base URL for security.
/// - HTTPS is required for remote URLs to protect API keys in transit
/// - HTTP is allowed only for localhost/127.0.0.1 (local LLM servers)
fn validate_base_url(base_url: &str) -> Result<(), String> {
    let parsed = reqwest::Url::parse(base_url)
        .map_err(|e| format!("Invalid base_url '{}': {}", base_url, e))?;

    let scheme = parsed.scheme();
    let host = parsed.host_str().unwrap_or("");

    match scheme {
        "https" => Ok(()),
        "http" => {
            let is_localhost =
                host == "localhost" || host == "127.0.0.1" || host == "[::1]" || host == "::1";

            if is_localhost {
                warn!(
                    "Using unencrypted HTTP for local LLM server at '{}'. \
                     API key will be transmitted in cleartext.",
                    base_url
                );
                Ok(())
            } else {
                Err(format!(
                    "HTTP is not allowed for remote URLs (base_url: '{}'). \
                     Use HTTPS to protect your API key in transit. \
                     HTTP is only permitted for localhost.",
                    base_url
                ))
            }
        }
        _ => Err(format!(
            "Unsupported URL scheme '{}' in base_url '{}'. Only http and https are allowed.",
            scheme, base_url
        )),
    }
}

/// Chat-completions request body for one inference call.
fn build_body(model: &str, request: &InferenceRequest<'_>) -> Value {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    messages.push(json!({"role": "system", "content": request.system_prompt}));
    for turn in request.history {
        messages.push(json!({"role": turn.role, "content": turn.content}));
    }
    messages.push(json!({"role": "user", "content": request.user_text}));

    let mut body = json!({
        "model": model,
        "messages": messages,
        "temperature": 0,
    });
    if !request.tools.is_empty() {
        body["tools"] = json!(request.tools);
        body["tool_choice"] = json!(if request.require_action {
            "required"
        } else {
            "auto"
        });
    }
    body
}

impl OpenAiCompatibleProvider {
    pub fn new(base_url: &str, api_key: &str, timeout: Duration) -> Result<Self, String> {
        validate_base_url(base_url)?;

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| format!("Failed to build HTTP client: {}", e))?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key: api_key.to_string(),
        })
    }

    async fn send_once(&self, url: &str, body: &Value) -> Result<Value, ProviderError> {
        let resp = match self
            .client
            .post(url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(body)
            .send()
            .await
        {
            Ok(r) => r,
            Err(e) => {
                error!("HTTP request failed: {}", e);
                return Err(ProviderError::network(&e));
            }
        };

        let status = resp.status();
        let text = resp.text().await.map_err(|e| ProviderError::network(&e))?;

        if !status.is_success() {
            error!(status = %status, "Provider API error: {}", truncate_str(&text, 500));
            return Err(ProviderError::from_status(status.as_u16(), &text));
        }
        debug!("Provider response: {}", truncate_str(&text, 2000));

        serde_json::from_str(&text).map_err(|e| ProviderError {
            kind: crate::providers::ProviderErrorKind::Unknown,
            status: Some(status.as_u16()),
            message: format!("Response is not JSON: {}", e),
            retry_after_secs: None,
        })
    }
}

#[async_trait]
impl ModelProvider for OpenAiCompatibleProvider {
    async fn chat(&self, model: &str, request: &InferenceRequest<'_>) -> anyhow::Result<Value> {
        let body = build_body(model, request);
        let url = format!("{}/chat/completions", self.base_url);
        info!(
            model,
            tools = request.tools.len(),
            require_action = request.require_action,
            "Calling LLM API"
        );

        let mut attempt = 0;
        loop {
            match self.send_once(&url, &body).await {
                Ok(data) => return Ok(data),
                Err(e) if e.is_retryable() && attempt < MAX_RETRIES => {
                    attempt += 1;
                    let wait = e
                        .retry_after_secs
                        .unwrap_or(u64::from(attempt))
                        .min(MAX_RETRY_WAIT_SECS);
                    warn!(model, attempt, wait_secs = wait, error = %e, "Retrying LLM call");
                    tokio::time::sleep(Duration::from_secs(wait)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
