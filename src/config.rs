//! Process configuration loaded from the environment (and `.env`)

use std::net::SocketAddr;
use std::path::PathBuf;

pub const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3000";
pub const DEFAULT_ROSTER_FILE: &str = "roster.json";
pub const DEFAULT_STATIC_DIR: &str = "static";

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub bind_addr: SocketAddr,
    pub roster_file: PathBuf,
    pub static_dir: PathBuf,
    /// End the answering phase automatically when the round timer runs out
    pub auto_end: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            bind_addr: default_bind_addr(),
            roster_file: PathBuf::from(DEFAULT_ROSTER_FILE),
            static_dir: PathBuf::from(DEFAULT_STATIC_DIR),
            auto_end: true,
        }
    }
}

fn default_bind_addr() -> SocketAddr {
    SocketAddr::from(([0, 0, 0, 0], 3000))
}

impl AppConfig {
    /// Load config from environment variables
    /// Invalid values fall back to the defaults
    pub fn from_env() -> Self {
        let bind_addr = match std::env::var("BIND_ADDR") {
            Ok(raw) => raw.trim().parse().unwrap_or_else(|e| {
                tracing::warn!(
                    "Invalid BIND_ADDR {:?} ({}), using {}",
                    raw,
                    e,
                    DEFAULT_BIND_ADDR
                );
                default_bind_addr()
            }),
            Err(_) => default_bind_addr(),
        };

        let roster_file = std::env::var("ROSTER_FILE")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_ROSTER_FILE));

        let static_dir = std::env::var("STATIC_DIR")
            .ok()
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_STATIC_DIR));

        let auto_end = std::env::var("QUIZ_AUTO_END")
            .map(|v| v != "0" && v.to_lowercase() != "false")
            .unwrap_or(true);

        if !auto_end {
            tracing::info!("Round timer auto-end disabled, admin must end each round");
        }

        Self {
            bind_addr,
            roster_file,
            static_dir,
            auto_end,
        }
    }
}
