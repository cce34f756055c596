//! Environment-driven configuration.
//!
//! Values come from the process environment (a `.env` file in the working
//! directory is loaded first) and can be overridden by CLI flags.

use std::path::PathBuf;
use std::time::Duration;

use tracing::warn;

use crate::api::normalize_base_url;
use crate::error::{DashboardError, DashboardResult};

pub const DEFAULT_API_BASE: &str = "http://localhost:8080";
pub const DEFAULT_WS_PATH: &str = "/ws/websocket";
pub const DEFAULT_WAITER_POLL_SECS: u64 = 5;
pub const DEFAULT_PAGE_SIZE: usize = 10;

const APP_DIR_NAME: &str = "com.resto.admin";

/// Where the session token lives between invocations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionStoreKind {
    Keyring,
    File,
    Memory,
}

impl SessionStoreKind {
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "keyring" | "os" => Some(Self::Keyring),
            "file" => Some(Self::File),
            "memory" | "mem" => Some(Self::Memory),
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub api_base: String,
    pub ws_path: String,
    /// `None` keeps the transport default.
    pub request_timeout: Option<Duration>,
    pub waiter_poll_interval: Duration,
    pub page_size: usize,
    pub session_store: SessionStoreKind,
    pub data_dir: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            api_base: DEFAULT_API_BASE.to_string(),
            ws_path: DEFAULT_WS_PATH.to_string(),
            request_timeout: None,
            waiter_poll_interval: Duration::from_secs(DEFAULT_WAITER_POLL_SECS),
            page_size: DEFAULT_PAGE_SIZE,
            session_store: SessionStoreKind::Keyring,
            data_dir: default_data_dir(),
        }
    }
}

fn env_non_empty(key: &str) -> Option<String> {
    std::env::var(key)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn env_u64(key: &str) -> DashboardResult<Option<u64>> {
    match env_non_empty(key) {
        Some(raw) => raw
            .parse::<u64>()
            .map(Some)
            .map_err(|_| DashboardError::Config(format!("{key} must be a whole number, got {raw:?}"))),
        None => Ok(None),
    }
}

/// Per-user data directory, following the same lookup order the log
/// directory uses.
pub fn default_data_dir() -> PathBuf {
    let base = std::env::var("LOCALAPPDATA")
        .or_else(|_| std::env::var("XDG_DATA_HOME"))
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            #[cfg(target_os = "windows")]
            {
                PathBuf::from(std::env::var("USERPROFILE").unwrap_or_else(|_| ".".into()))
                    .join("AppData")
                    .join("Local")
            }
            #[cfg(not(target_os = "windows"))]
            {
                PathBuf::from(std::env::var("HOME").unwrap_or_else(|_| ".".into()))
                    .join(".local")
                    .join("share")
            }
        });
    base.join(APP_DIR_NAME)
}

impl AppConfig {
    /// Build the configuration from the environment.
    pub fn from_env() -> DashboardResult<Self> {
        let _ = dotenvy::dotenv();
        let mut cfg = Self::default();

        if let Some(base) = env_non_empty("RESTO_API_BASE").or_else(|| env_non_empty("VITE_API_BASE")) {
            cfg.api_base = base;
        }
        cfg.api_base = normalize_base_url(&cfg.api_base);
        if cfg.api_base.is_empty() {
            return Err(DashboardError::Config("API base URL is empty".into()));
        }

        if let Some(path) = env_non_empty("RESTO_WS_PATH") {
            cfg.ws_path = if path.starts_with('/') {
                path
            } else {
                format!("/{path}")
            };
        }

        if let Some(secs) = env_u64("RESTO_HTTP_TIMEOUT_SECS")? {
            cfg.request_timeout = (secs > 0).then(|| Duration::from_secs(secs));
        }
        if let Some(secs) = env_u64("RESTO_WAITER_POLL_SECS")? {
            if secs == 0 {
                warn!("RESTO_WAITER_POLL_SECS=0 ignored, keeping default interval");
            } else {
                cfg.waiter_poll_interval = Duration::from_secs(secs);
            }
        }
        if let Some(size) = env_u64("RESTO_PAGE_SIZE")? {
            cfg.page_size = (size as usize).max(1);
        }
        if let Some(kind) = env_non_empty("RESTO_SESSION_STORE") {
            cfg.session_store = SessionStoreKind::parse(&kind).ok_or_else(|| {
                DashboardError::Config(format!(
                    "RESTO_SESSION_STORE must be keyring, file or memory, got {kind:?}"
                ))
            })?;
        }
        if let Some(dir) = env_non_empty("RESTO_DATA_DIR") {
            cfg.data_dir = PathBuf::from(dir);
        }

        Ok(cfg)
    }

    pub fn with_api_base(mut self, base: &str) -> Self {
        self.api_base = normalize_base_url(base);
        self
    }

    pub fn log_dir(&self) -> PathBuf {
        self.data_dir.join("logs")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    const KEYS: &[&str] = &[
        "RESTO_API_BASE",
        "VITE_API_BASE",
        "RESTO_WS_PATH",
        "RESTO_HTTP_TIMEOUT_SECS",
        "RESTO_WAITER_POLL_SECS",
        "RESTO_PAGE_SIZE",
        "RESTO_SESSION_STORE",
        "RESTO_DATA_DIR",
    ];

    fn clear_env() {
        for key in KEYS {
            std::env::remove_var(key);
        }
    }

    #[test]
    #[serial]
    fn defaults_apply_without_environment() {
        clear_env();
        let cfg = AppConfig::from_env().expect("config from empty env");
        assert_eq!(cfg.api_base, DEFAULT_API_BASE);
        assert_eq!(cfg.waiter_poll_interval, Duration::from_secs(5));
        assert_eq!(cfg.page_size, 10);
        assert!(cfg.request_timeout.is_none());
        assert_eq!(cfg.session_store, SessionStoreKind::Keyring);
    }

    #[test]
    #[serial]
    fn vite_base_is_used_as_fallback_and_normalised() {
        clear_env();
        std::env::set_var("VITE_API_BASE", "backend.example.com/api/");
        let cfg = AppConfig::from_env().expect("config");
        assert_eq!(cfg.api_base, "https://backend.example.com");

        std::env::set_var("RESTO_API_BASE", "localhost:9000");
        let cfg = AppConfig::from_env().expect("config");
        assert_eq!(cfg.api_base, "http://localhost:9000");
        clear_env();
    }

    #[test]
    #[serial]
    fn invalid_numbers_and_store_kinds_are_rejected() {
        clear_env();
        std::env::set_var("RESTO_WAITER_POLL_SECS", "soon");
        assert!(matches!(
            AppConfig::from_env(),
            Err(DashboardError::Config(_))
        ));
        clear_env();

        std::env::set_var("RESTO_SESSION_STORE", "cookie");
        assert!(matches!(
            AppConfig::from_env(),
            Err(DashboardError::Config(_))
        ));
        clear_env();

        std::env::set_var("RESTO_SESSION_STORE", "file");
        std::env::set_var("RESTO_HTTP_TIMEOUT_SECS", "15");
        std::env::set_var("RESTO_WS_PATH", "stomp");
        let cfg = AppConfig::from_env().expect("config");
        assert_eq!(cfg.session_store, SessionStoreKind::File);
        assert_eq!(cfg.request_timeout, Some(Duration::from_secs(15)));
        assert_eq!(cfg.ws_path, "/stomp");
        clear_env();
    }
}
