//! Application configuration from environment variables.
//!
//! Loaded once at startup (after `dotenvy` has read any `.env` file). A
//! missing API key is not fatal here; only the proposal endpoint cares.

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use anyhow::Context;

/// Model used for proposal drafting unless overridden.
pub const DEFAULT_ANTHROPIC_MODEL: &str = "claude-sonnet-4-20250514";

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub data_dir: PathBuf,
    pub anthropic_api_key: Option<String>,
    pub anthropic_model: String,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let bind_addr = env::var("IRONQUOTE_BIND_ADDR")
            .unwrap_or_else(|_| "0.0.0.0:3000".to_string())
            .parse()
            .context("invalid IRONQUOTE_BIND_ADDR")?;

        let data_dir = env::var("IRONQUOTE_DATA_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("data"));

        let anthropic_api_key = env::var("ANTHROPIC_API_KEY")
            .ok()
            .filter(|key| !key.is_empty());

        let anthropic_model =
            env::var("ANTHROPIC_MODEL").unwrap_or_else(|_| DEFAULT_ANTHROPIC_MODEL.to_string());

        Ok(Config {
            bind_addr,
            data_dir,
            anthropic_api_key,
            anthropic_model,
        })
    }
}
