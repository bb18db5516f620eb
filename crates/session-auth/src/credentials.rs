//! Credential storage for session tokens
//!
//! A string-to-string map persisted as a JSON file. The in-memory map is the
//! authority inside the process: every `set`/`clear` updates it first, so the
//! next `get` from any component observes the change, and then persists with
//! an atomic temp-file + rename write.
//!
//! Storage problems never produce a logged-in state. An unreadable or corrupt
//! file loads as empty, and a poisoned lock reads as "no credentials".

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{PoisonError, RwLock};

use common::Secret;
use tracing::{debug, info, warn};

use crate::constants::{ACCESS_TOKEN_KEY, REFRESH_TOKEN_KEY, USERNAME_KEY};
use crate::error::{Error, Result};

/// The keys this crate reads and writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CredentialKey {
    AccessToken,
    RefreshToken,
    Username,
}

impl CredentialKey {
    pub const ALL: [CredentialKey; 3] = [
        CredentialKey::AccessToken,
        CredentialKey::RefreshToken,
        CredentialKey::Username,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            CredentialKey::AccessToken => ACCESS_TOKEN_KEY,
            CredentialKey::RefreshToken => REFRESH_TOKEN_KEY,
            CredentialKey::Username => USERNAME_KEY,
        }
    }
}

/// A complete login: both tokens plus the optional username.
#[derive(Debug, Clone)]
pub struct CredentialBundle {
    pub access_token: Secret,
    pub refresh_token: Secret,
    pub username: Option<String>,
}

/// Thread-safe credential map with optional file persistence.
pub struct CredentialStore {
    path: Option<PathBuf>,
    state: RwLock<HashMap<String, String>>,
}

impl CredentialStore {
    /// Open the store backed by `path`.
    ///
    /// A missing file is a cold start. An unreadable or unparsable file is
    /// logged and treated the same way; it is overwritten on the next write.
    pub fn open(path: PathBuf) -> Self {
        let state = match read_file(&path) {
            Ok(Some(state)) => {
                info!(path = %path.display(), keys = state.len(), "loaded credential store");
                state
            }
            Ok(None) => {
                info!(path = %path.display(), "credential file not found, starting logged out");
                HashMap::new()
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "credential store unavailable, starting logged out");
                HashMap::new()
            }
        };
        Self {
            path: Some(path),
            state: RwLock::new(state),
        }
    }

    /// A store that lives only as long as the process.
    pub fn in_memory() -> Self {
        Self {
            path: None,
            state: RwLock::new(HashMap::new()),
        }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn get(&self, key: CredentialKey) -> Option<String> {
        let Ok(state) = self.state.read() else {
            warn!(key = key.as_str(), "credential store lock poisoned, reading as absent");
            return None;
        };
        state.get(key.as_str()).cloned()
    }

    /// Set a single key. The new value is visible immediately even if
    /// persisting it fails.
    pub fn set(&self, key: CredentialKey, value: &str) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.insert(key.as_str().to_string(), value.to_string());
        debug!(key = key.as_str(), "credential set");
        self.persist(&state)
    }

    /// Remove `keys`. Absent keys are ignored; nothing is written when no key
    /// was present.
    pub fn clear(&self, keys: &[CredentialKey]) -> Result<()> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let mut removed = 0usize;
        for key in keys {
            if state.remove(key.as_str()).is_some() {
                removed += 1;
            }
        }
        if removed == 0 {
            return Ok(());
        }
        debug!(removed, "credentials cleared");
        self.persist(&state)
    }

    /// Remove the access token, refresh token and username.
    pub fn clear_all(&self) -> Result<()> {
        self.clear(&CredentialKey::ALL)
    }

    /// Logged in means an access token is present. Nothing else is consulted.
    pub fn is_logged_in(&self) -> bool {
        self.get(CredentialKey::AccessToken).is_some()
    }

    /// Store a full login in one write. A missing username removes any
    /// username left over from a previous session.
    pub fn store_bundle(&self, bundle: &CredentialBundle) -> Result<()> {
        if bundle.access_token.is_empty() || bundle.refresh_token.is_empty() {
            return Err(Error::CredentialParse("token pair contains an empty token".into()));
        }
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        state.insert(
            ACCESS_TOKEN_KEY.to_string(),
            bundle.access_token.expose().to_string(),
        );
        state.insert(
            REFRESH_TOKEN_KEY.to_string(),
            bundle.refresh_token.expose().to_string(),
        );
        match &bundle.username {
            Some(username) => {
                state.insert(USERNAME_KEY.to_string(), username.clone());
            }
            None => {
                state.remove(USERNAME_KEY);
            }
        }
        debug!(username = ?bundle.username, "credential bundle stored");
        self.persist(&state)
    }

    /// The full bundle, if both tokens are present.
    pub fn bundle(&self) -> Option<CredentialBundle> {
        let access = self.get(CredentialKey::AccessToken)?;
        let refresh = self.get(CredentialKey::RefreshToken)?;
        Some(CredentialBundle {
            access_token: Secret::new(access),
            refresh_token: Secret::new(refresh),
            username: self.get(CredentialKey::Username),
        })
    }

    fn persist(&self, state: &HashMap<String, String>) -> Result<()> {
        match &self.path {
            Some(path) => write_atomic(path, state),
            None => Ok(()),
        }
    }
}

fn read_file(path: &Path) -> Result<Option<HashMap<String, String>>> {
    if !path.exists() {
        return Ok(None);
    }
    let contents = std::fs::read_to_string(path)
        .map_err(|e| Error::Io(format!("reading credential file: {e}")))?;
    let state = serde_json::from_str(&contents)
        .map_err(|e| Error::CredentialParse(format!("parsing credential file: {e}")))?;
    Ok(Some(state))
}

/// Write the map to `path` atomically with 0600 permissions.
///
/// Writes to a temporary file in the same directory, then renames it over
/// the target so a crash never leaves a half-written token file behind.
fn write_atomic(path: &Path, data: &HashMap<String, String>) -> Result<()> {
    let json = serde_json::to_string_pretty(data)
        .map_err(|e| Error::CredentialParse(format!("serializing credentials: {e}")))?;

    let dir = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    std::fs::create_dir_all(dir)
        .map_err(|e| Error::Io(format!("creating credential directory: {e}")))?;

    let tmp_path = dir.join(format!(".credentials.tmp.{}", std::process::id()));

    std::fs::write(&tmp_path, json.as_bytes())
        .map_err(|e| Error::Io(format!("writing temp credential file: {e}")))?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        let perms = std::fs::Permissions::from_mode(0o600);
        std::fs::set_permissions(&tmp_path, perms)
            .map_err(|e| Error::Io(format!("setting credential file permissions: {e}")))?;
    }

    std::fs::rename(&tmp_path, path)
        .map_err(|e| Error::Io(format!("renaming temp credential file: {e}")))?;

    debug!(path = %path.display(), "persisted credentials");
    Ok(())
}
