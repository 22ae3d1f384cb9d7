use std::net::SocketAddr;

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use ironquote_web::config::Config;
use ironquote_web::{app, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug")),
        )
        .init();

    let config = Config::from_env()?;
    if config.anthropic_api_key.is_none() {
        tracing::warn!("ANTHROPIC_API_KEY not set; proposal views will use fallback content");
    }

    let state = AppState::new(&config)?;

    tracing::info!(
        addr = %config.bind_addr,
        data_dir = %config.data_dir.display(),
        "starting ironquote-web"
    );

    let listener = tokio::net::TcpListener::bind(config.bind_addr)
        .await
        .with_context(|| format!("bind {}", config.bind_addr))?;

    axum::serve(
        listener,
        app(state).into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await
    .context("server error")?;

    Ok(())
}
