use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::{AppConfig, KvBackend};
use crate::pipeline::Pipeline;
use crate::providers::OpenAiCompatibleProvider;
use crate::server::{self, WebhookState};
use crate::state::{open_pool, MemoryKvStore, SqliteKvStore, SqliteLedgerStore};
use crate::traits::KvStore;

pub async fn run(config: AppConfig) -> anyhow::Result<()> {
    // 1. Ledger
    let pool = open_pool(&config.state.db_path).await?;
    let ledger = Arc::new(SqliteLedgerStore::new(pool.clone()));
    info!("Ledger initialized ({})", config.state.db_path);

    // 2. Short-lived state
    let kv: Arc<dyn KvStore> = match config.kv.backend {
        KvBackend::Sqlite => Arc::new(SqliteKvStore::new(pool)),
        KvBackend::Memory => Arc::new(MemoryKvStore::new()),
    };
    info!(backend = ?config.kv.backend, "KV store initialized");

    // 3. Provider
    let provider = Arc::new(
        OpenAiCompatibleProvider::new(
            &config.provider.base_url,
            &config.provider.api_key,
            Duration::from_secs(config.provider.request_timeout_secs),
        )
        .map_err(|e| anyhow::anyhow!("{}", e))?,
    );
    info!(
        model = %config.provider.model,
        nlu_model = config.provider.nlu_model.as_deref().unwrap_or("-"),
        "Provider configured"
    );

    // 4. Pipeline
    let pipeline = Arc::new(Pipeline::new(&config, provider, ledger, kv));
    if config.server.webhook_secret.is_none() {
        warn!("No webhook_secret configured; /webhook accepts unauthenticated calls");
    }

    // 5. Webhook server
    let state = WebhookState {
        pipeline,
        webhook_secret: config.server.webhook_secret.clone(),
    };
    server::start_webhook_server(state, config.server.port, &config.server.bind_addr).await
}
