use anyhow::{bail, Result};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_GENERATION: &str = "tapetally-v2.3.4";
pub const OFFLINE_URL: &str = "offline.html";

/// Shell files cached on worker install, resolved against the shell base URL.
pub const SHELL_FILES: [&str; 6] = [
    "./",
    "./index.html",
    "./styles.css",
    "./app.js",
    "./manifest.json",
    OFFLINE_URL,
];

#[derive(Debug, Clone)]
pub struct Config {
    pub backend_url: String,
    pub shell_base_url: Option<String>,
    pub cache_db: Option<PathBuf>,
    pub cache_generation: String,
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let backend_url = match env::var("TAPETALLY_BACKEND_URL") {
            Ok(v) if !v.trim().is_empty() => v.trim().to_string(),
            _ => bail!("TAPETALLY_BACKEND_URL is not set"),
        };
        let shell_base_url = env::var("TAPETALLY_SHELL_BASE_URL")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty());
        let cache_db = env::var("TAPETALLY_CACHE_DB")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .map(PathBuf::from);
        let cache_generation = env::var("TAPETALLY_CACHE_GENERATION")
            .ok()
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| DEFAULT_GENERATION.to_string());
        Ok(Config {
            backend_url,
            shell_base_url,
            cache_db,
            cache_generation,
        })
    }
}
