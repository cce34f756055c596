//! Session token storage.
//!
//! Exactly one bearer token is kept under a fixed key. The default backend
//! is the OS credential store (via the `keyring` crate: DPAPI on Windows,
//! Keychain on macOS, Secret Service on Linux); a plain file and an
//! in-memory store are available for headless hosts and tests.

use std::fs;
use std::path::PathBuf;
use std::sync::Mutex;

use keyring::Entry;
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::config::{AppConfig, SessionStoreKind};
use crate::error::{DashboardError, DashboardResult};

const SERVICE_NAME: &str = "resto-admin";

/// The fixed key the session token is stored under.
pub const TOKEN_KEY: &str = "token";

const TOKEN_FILE_NAME: &str = "session";

/// Normalise a raw stored value: missing, blank, `"null"` and `"undefined"`
/// all mean "no session".
pub fn normalize_token(raw: Option<String>) -> Option<String> {
    let value = raw?;
    let trimmed = value.trim();
    if trimmed.is_empty() || trimmed == "null" || trimmed == "undefined" {
        return None;
    }
    Some(trimmed.to_string())
}

pub trait TokenStore: Send + Sync {
    /// Raw stored value, before normalisation.
    fn read_raw(&self) -> DashboardResult<Option<String>>;
    fn save(&self, token: &str) -> DashboardResult<()>;
    fn clear(&self) -> DashboardResult<()>;

    fn load(&self) -> Option<String> {
        match self.read_raw() {
            Ok(raw) => normalize_token(raw),
            Err(e) => {
                warn!(error = %e, "session store: failed to read token");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// OS keyring
// ---------------------------------------------------------------------------

pub struct KeyringTokenStore {
    service: String,
}

impl KeyringTokenStore {
    pub fn new() -> Self {
        Self {
            service: SERVICE_NAME.to_string(),
        }
    }

    fn entry(&self) -> DashboardResult<Entry> {
        Entry::new(&self.service, TOKEN_KEY).map_err(|e| DashboardError::Storage(e.to_string()))
    }
}

impl Default for KeyringTokenStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TokenStore for KeyringTokenStore {
    fn read_raw(&self) -> DashboardResult<Option<String>> {
        match self.entry()?.get_password() {
            Ok(pw) => Ok(Some(pw)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e) => Err(DashboardError::Storage(e.to_string())),
        }
    }

    fn save(&self, token: &str) -> DashboardResult<()> {
        self.entry()?
            .set_password(token)
            .map_err(|e| DashboardError::Storage(e.to_string()))
    }

    /// Silently succeeds if the entry does not exist.
    fn clear(&self) -> DashboardResult<()> {
        match self.entry()?.delete_credential() {
            Ok(()) => Ok(()),
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(DashboardError::Storage(e.to_string())),
        }
    }
}

// ---------------------------------------------------------------------------
// Plain file
// ---------------------------------------------------------------------------

pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn in_dir(dir: &std::path::Path) -> Self {
        Self::new(dir.join(TOKEN_FILE_NAME))
    }
}

impl TokenStore for FileTokenStore {
    fn read_raw(&self) -> DashboardResult<Option<String>> {
        match fs::read_to_string(&self.path) {
            Ok(contents) => Ok(Some(contents)),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(DashboardError::Storage(format!(
                "read {}: {e}",
                self.path.display()
            ))),
        }
    }

    fn save(&self, token: &str) -> DashboardResult<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&self.path, token)
            .map_err(|e| DashboardError::Storage(format!("write {}: {e}", self.path.display())))
    }

    fn clear(&self) -> DashboardResult<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(DashboardError::Storage(format!(
                "remove {}: {e}",
                self.path.display()
            ))),
        }
    }
}

// ---------------------------------------------------------------------------
// In-memory
// ---------------------------------------------------------------------------

#[derive(Default)]
pub struct MemoryTokenStore {
    value: Mutex<Option<String>>,
}

impl MemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        Self {
            value: Mutex::new(Some(token.to_string())),
        }
    }
}

impl TokenStore for MemoryTokenStore {
    fn read_raw(&self) -> DashboardResult<Option<String>> {
        let guard = self
            .value
            .lock()
            .map_err(|e| DashboardError::Storage(e.to_string()))?;
        Ok(guard.clone())
    }

    fn save(&self, token: &str) -> DashboardResult<()> {
        let mut guard = self
            .value
            .lock()
            .map_err(|e| DashboardError::Storage(e.to_string()))?;
        if let Some(mut previous) = guard.replace(token.to_string()) {
            previous.zeroize();
        }
        Ok(())
    }

    fn clear(&self) -> DashboardResult<()> {
        let mut guard = self
            .value
            .lock()
            .map_err(|e| DashboardError::Storage(e.to_string()))?;
        if let Some(mut token) = guard.take() {
            token.zeroize();
        }
        Ok(())
    }
}

/// Build the token store selected by the configuration.
pub fn open_store(cfg: &AppConfig) -> Box<dyn TokenStore> {
    info!(kind = ?cfg.session_store, "opening session store");
    match cfg.session_store {
        SessionStoreKind::Keyring => Box::new(KeyringTokenStore::new()),
        SessionStoreKind::File => Box::new(FileTokenStore::in_dir(&cfg.data_dir)),
        SessionStoreKind::Memory => Box::new(MemoryTokenStore::new()),
    }
}
