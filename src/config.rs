use anyhow::{Context, Result};

use std::env;
use std::net::SocketAddr;
use std::path::PathBuf;

const DEFAULT_DB_PATH: &str = "learnboard.db";
const DEFAULT_BIND: &str = "127.0.0.1:3000";
const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:3000";
const DEFAULT_STORAGE_DIR: &str = ".learnboard";

/// Settings read from the environment (and `.env`, if the binary loaded it).
#[derive(Debug, Clone)]
pub struct Config {
    /// `LEARNBOARD_DB`: SQLite database file used by the server.
    pub db_path: PathBuf,
    /// `LEARNBOARD_BIND`: address the server listens on.
    pub bind: SocketAddr,
    /// `LEARNBOARD_URL`: server the dashboard client talks to.
    pub server_url: String,
    /// `LEARNBOARD_STORAGE_DIR`: where the client keeps its local storage.
    pub storage_dir: PathBuf,
    /// `LEARNBOARD_USER_ID`: user the dashboard client acts as.
    pub user_id: Option<String>,
    /// `LEARNBOARD_AWARD_ONCE`: only the first completion of an item earns
    /// points. Off unless set to `1` or `true`.
    pub award_once: bool,
}

fn var_or(key: &str, default: &str) -> String {
    env::var(key).unwrap_or_else(|_| {
        log::debug!("[Config] ${key} not set, using default '{default}'");
        String::from(default)
    })
}

impl Config {
    pub fn from_env() -> Result<Self> {
        let bind = var_or("LEARNBOARD_BIND", DEFAULT_BIND);

        Ok(Self {
            db_path: PathBuf::from(var_or("LEARNBOARD_DB", DEFAULT_DB_PATH)),
            bind: bind
                .parse()
                .with_context(|| format!("LEARNBOARD_BIND='{bind}' is not a socket address"))?,
            server_url: var_or("LEARNBOARD_URL", DEFAULT_SERVER_URL)
                .trim_end_matches('/')
                .to_string(),
            storage_dir: PathBuf::from(var_or("LEARNBOARD_STORAGE_DIR", DEFAULT_STORAGE_DIR)),
            user_id: env::var("LEARNBOARD_USER_ID").ok().filter(|id| !id.trim().is_empty()),
            award_once: env::var("LEARNBOARD_AWARD_ONCE")
                .is_ok_and(|flag| matches!(flag.trim().to_lowercase().as_str(), "1" | "true")),
        })
    }

    /// The configured user, or an error telling the caller how to set one.
    pub fn require_user_id(&self) -> Result<&str> {
        self.user_id
            .as_deref()
            .context("Expected 'LEARNBOARD_USER_ID=<id>' in the environment or .env file.")
    }
}
