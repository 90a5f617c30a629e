use anyhow::{Context, Result};
use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

use crate::catalog::TMDB_BASE;

const DEFAULT_BIND: &str = "0.0.0.0:3146";

#[derive(Debug, Clone)]
pub struct Config {
    pub api_key: String,
    pub catalog_base_url: String,
    pub favorites_dir: PathBuf,
    pub bind_addr: SocketAddr,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let api_key = env::var("TMDB_API_KEY")
            .ok()
            .filter(|s| !s.trim().is_empty())
            .context("TMDB_API_KEY not set")?;
        let catalog_base_url =
            non_empty_var("TMDB_BASE_URL").unwrap_or_else(|| TMDB_BASE.to_string());
        let favorites_dir = non_empty_var("FAVORITES_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_favorites_dir);
        let bind = non_empty_var("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND.to_string());
        let bind_addr = bind
            .parse::<SocketAddr>()
            .with_context(|| format!("BIND_ADDR is not a socket address: {bind}"))?;

        Ok(Self {
            api_key,
            catalog_base_url,
            favorites_dir,
            bind_addr,
        })
    }
}

fn non_empty_var(key: &str) -> Option<String> {
    env::var(key).ok().filter(|s| !s.trim().is_empty())
}

fn default_favorites_dir() -> PathBuf {
    dirs::data_dir()
        .map(|d| d.join("marquee"))
        .unwrap_or_else(|| PathBuf::from("data"))
}
