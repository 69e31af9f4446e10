// src/session.rs

use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use tracing::{debug, info, warn};

use crate::error::{io_context, HrError};
use crate::models::{Role, User};

/// Who is logged in and the credential that authorizes their requests.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    pub user: Option<User>,
    pub token: Option<String>,
    pub authenticated: bool,
    /// A request is in flight. Never written to disk.
    #[serde(skip)]
    pub loading: bool,
}

impl Session {
    fn established(user: User, token: String) -> Self {
        Self {
            user: Some(user),
            token: Some(token),
            authenticated: true,
            loading: false,
        }
    }

    pub fn role(&self) -> Option<Role> {
        self.user.as_ref().map(|u| u.role)
    }
}

/// The single owner of session state.
///
/// Cloning is cheap and every clone sees the same session. State only changes through
/// `initialize` and the login/register/logout operations on `HrClient`; persisted fields
/// are written through to `storage_path` when one is configured.
#[derive(Debug, Clone, Default)]
pub struct SessionStore {
    state: Arc<RwLock<Session>>,
    storage_path: Option<PathBuf>,
}

impl SessionStore {
    pub fn new(storage_path: Option<PathBuf>) -> Self {
        Self {
            state: Arc::new(RwLock::new(Session::default())),
            storage_path,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(None)
    }

    pub fn storage_path(&self) -> Option<&Path> {
        self.storage_path.as_deref()
    }

    fn read(&self) -> RwLockReadGuard<'_, Session> {
        self.state.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, Session> {
        self.state.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    // --- Queries ---

    pub fn snapshot(&self) -> Session {
        self.read().clone()
    }

    pub fn token(&self) -> Option<String> {
        self.read().token.clone()
    }

    pub fn user(&self) -> Option<User> {
        self.read().user.clone()
    }

    pub fn role(&self) -> Option<Role> {
        self.read().role()
    }

    pub fn is_authenticated(&self) -> bool {
        self.read().authenticated
    }

    pub fn is_loading(&self) -> bool {
        self.read().loading
    }

    // --- Persistence ---

    pub fn load_session(path: &Path) -> Result<Option<Session>, HrError> {
        if !path.exists() {
            return Ok(None);
        }

        let json_string = fs::read_to_string(path)
            .map_err(|e| io_context(e, format!("Failed to read session file: {:?}", path)))?;
        let mut session: Session = serde_json::from_str(&json_string)?;
        session.authenticated = session.token.is_some();
        session.loading = false;
        Ok(Some(session))
    }

    fn save_session(&self, session: &Session) -> Result<(), HrError> {
        let Some(path) = &self.storage_path else {
            return Ok(());
        };

        let json_string = serde_json::to_string_pretty(session)?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                io_context(
                    e,
                    format!("Failed to create directory for session file: {:?}", parent),
                )
            })?;
        }

        let mut file = File::create(path)
            .map_err(|e| io_context(e, format!("Failed to create session file: {:?}", path)))?;
        file.write_all(json_string.as_bytes()).map_err(|e| {
            io_context(e, format!("Failed to write session to file: {:?}", path))
        })?;

        debug!("Session persisted to {:?}", path);
        Ok(())
    }

    fn remove_session_file(&self) -> Result<(), HrError> {
        match &self.storage_path {
            Some(path) if path.exists() => fs::remove_file(path)
                .map_err(|e| io_context(e, format!("Failed to remove session file: {:?}", path))),
            _ => Ok(()),
        }
    }

    // --- Lifecycle ---

    /// Restores a persisted session into live state. Returns `true` when a credential was
    /// recovered.
    ///
    /// A session file that cannot be parsed is treated as absent and left for the next
    /// login to overwrite.
    pub fn initialize(&self) -> Result<bool, HrError> {
        let Some(path) = &self.storage_path else {
            return Ok(false);
        };

        let restored = match Self::load_session(path) {
            Ok(restored) => restored,
            Err(HrError::Json(e)) => {
                warn!("Ignoring unreadable session file {:?}: {}", path, e);
                None
            }
            Err(e) => return Err(e),
        };

        match restored {
            Some(session) if session.token.is_some() => {
                info!(
                    "Restored session for {}",
                    session
                        .user
                        .as_ref()
                        .map(|u| u.email.as_str())
                        .unwrap_or("<unknown user>")
                );
                *self.write() = session;
                Ok(true)
            }
            _ => {
                debug!("No persisted credential found at {:?}", path);
                Ok(false)
            }
        }
    }

    pub(crate) fn establish(&self, user: User, token: String) -> Result<(), HrError> {
        let session = Session::established(user, token);
        *self.write() = session.clone();
        self.save_session(&session)
    }

    pub(crate) fn refresh_user(&self, user: User) -> Result<(), HrError> {
        let session = {
            let mut guard = self.write();
            guard.user = Some(user);
            guard.clone()
        };
        if session.authenticated {
            self.save_session(&session)?;
        }
        Ok(())
    }

    pub(crate) fn clear(&self) -> Result<(), HrError> {
        *self.write() = Session::default();
        self.remove_session_file()
    }

    pub(crate) fn set_loading(&self, loading: bool) {
        self.write().loading = loading;
    }
}
