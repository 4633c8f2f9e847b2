mod actions;
mod config;
mod core;
mod finance;
mod pipeline;
mod providers;
mod server;
mod services;
mod state;
mod traits;
mod types;
pub mod utils;

#[cfg(test)]
mod testing;

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

fn main() -> anyhow::Result<()> {
    // Load .env if present
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let args: Vec<String> = std::env::args().collect();
    let mut config_path = PathBuf::from("config.toml");
    if args.len() > 1 {
        match args[1].as_str() {
            "--version" | "-V" => {
                println!("dompet {}", env!("CARGO_PKG_VERSION"));
                return Ok(());
            }
            "--help" | "-h" => {
                println!("dompet {}", env!("CARGO_PKG_VERSION"));
                println!("{}\n", env!("CARGO_PKG_DESCRIPTION"));
                println!("Usage: dompet [COMMAND | CONFIG_PATH]\n");
                println!("Commands:");
                println!("  check-config [PATH]   Validate a config file and exit");
                println!("\nOptions:");
                println!("  -h, --help       Print help");
                println!("  -V, --version    Print version");
                println!("\nWithout a path, ./config.toml is used.");
                return Ok(());
            }
            "check-config" => {
                let path = args
                    .get(2)
                    .map(PathBuf::from)
                    .unwrap_or(config_path);
                let config = config::AppConfig::load(&path).map_err(|e| {
                    anyhow::anyhow!("Config {} is invalid: {}", path.display(), e)
                })?;
                println!(
                    "Config OK: model={} kv={:?} listen={}:{}",
                    config.provider.model,
                    config.kv.backend,
                    config.server.bind_addr,
                    config.server.port
                );
                return Ok(());
            }
            other => config_path = PathBuf::from(other),
        }
    }

    if !config_path.exists() {
        anyhow::bail!(
            "Config file {} not found. Copy config.example.toml to get started.",
            config_path.display()
        );
    }
    let config = config::AppConfig::load(&config_path)?;

    // Run async
    tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()?
        .block_on(crate::core::run(config))
}
