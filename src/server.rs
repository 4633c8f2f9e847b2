use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};

use crate::pipeline::Pipeline;
use crate::types::InboundMessage;

const SECRET_HEADER: &str = "x-webhook-secret";

// ---------------------------------------------------------------------------
// State
// ---------------------------------------------------------------------------

#[derive(Clone)]
pub struct WebhookState {
    pub pipeline: Arc<Pipeline>,
    pub webhook_secret: Option<String>,
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

pub fn build_router(state: WebhookState) -> Router {
    let hooks = Router::new()
        .route("/webhook", post(webhook_handler))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            secret_middleware,
        ));

    Router::new()
        .route("/health", get(health_handler))
        .merge(hooks)
        .with_state(state)
}

// ---------------------------------------------------------------------------
// Auth middleware
// ---------------------------------------------------------------------------

fn secret_matches(expected: Option<&str>, headers: &HeaderMap) -> bool {
    let Some(expected) = expected else {
        return true;
    };
    headers
        .get(SECRET_HEADER)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|given| given == expected)
}

async fn secret_middleware(
    State(state): State<WebhookState>,
    headers: HeaderMap,
    request: axum::extract::Request,
    next: Next,
) -> Result<impl IntoResponse, StatusCode> {
    if !secret_matches(state.webhook_secret.as_deref(), &headers) {
        warn!("Webhook call rejected: bad or missing secret");
        return Err(StatusCode::UNAUTHORIZED);
    }
    Ok(next.run(request).await)
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

async fn health_handler() -> Json<serde_json::Value> {
    Json(json!({
        "status": "ok",
        "catalogue_version": crate::actions::CATALOGUE_VERSION,
    }))
}

/// `reply` is null when nothing should be sent back (duplicate or empty).
async fn webhook_handler(
    State(state): State<WebhookState>,
    Json(msg): Json<InboundMessage>,
) -> Json<serde_json::Value> {
    let reply = state.pipeline.handle_message(&msg).await;
    Json(json!({ "reply": reply }))
}

// ---------------------------------------------------------------------------
// Server entry point
// ---------------------------------------------------------------------------

pub async fn start_webhook_server(
    state: WebhookState,
    port: u16,
    bind_addr: &str,
) -> anyhow::Result<()> {
    let app = build_router(state);

    let ip: std::net::IpAddr = bind_addr
        .parse()
        .unwrap_or_else(|_| std::net::IpAddr::V4(std::net::Ipv4Addr::LOCALHOST));
    let addr = std::net::SocketAddr::new(ip, port);
    info!("Webhook server listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{test_config, MockProvider, TestHarness};
    use axum::http::HeaderValue;

    #[test]
    fn secret_check() {
        let mut headers = HeaderMap::new();
        assert!(secret_matches(None, &headers));
        assert!(!secret_matches(Some("s3cret"), &headers));
        headers.insert(SECRET_HEADER, HeaderValue::from_static("wrong"));
        assert!(!secret_matches(Some("s3cret"), &headers));
        headers.insert(SECRET_HEADER, HeaderValue::from_static("s3cret"));
        assert!(secret_matches(Some("s3cret"), &headers));
    }

    #[tokio::test]
    async fn health_reports_ok() {
        let Json(body) = health_handler().await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["catalogue_version"], crate::actions::CATALOGUE_VERSION);
    }

    #[tokio::test]
    async fn webhook_returns_reply_then_null_for_redelivery() {
        let h = TestHarness::with_config(
            vec![MockProvider::text_response("Halo juga!")],
            test_config(""),
        )
        .await;
        let state = WebhookState {
            pipeline: Arc::new(h.pipeline),
            webhook_secret: None,
        };
        let msg = InboundMessage {
            user_id: "u1".into(),
            chat_id: "c1".into(),
            message_id: "m1".into(),
            text: "halo".into(),
        };

        let Json(body) = webhook_handler(State(state.clone()), Json(msg.clone())).await;
        assert_eq!(body["reply"], "Halo juga!");
        let Json(body) = webhook_handler(State(state), Json(msg)).await;
        assert!(body["reply"].is_null());
    }
}
