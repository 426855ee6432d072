mod auth;

pub use auth::{AuthClient, SignUpOutcome};
pub(crate) use auth::provider_message;

use crate::error::SessionError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tokio::sync::watch;
use tracing::{debug, warn};

const SESSION_FILE: &str = "session.json";

/// The signed-in principal as handed to us by the identity provider
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Identity {
    pub user_id: String,

    #[serde(default)]
    pub email: Option<String>,

    pub access_token: String,
}

/// Source of the current identity and of identity changes
pub trait SessionProvider: Send + Sync {
    fn current_identity(&self) -> Option<Identity>;

    fn subscribe(&self) -> watch::Receiver<Option<Identity>>;
}

/// In-process session backed by a watch channel
#[derive(Debug)]
pub struct SessionHandle {
    tx: watch::Sender<Option<Identity>>,
}

impl SessionHandle {
    pub fn new(initial: Option<Identity>) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx }
    }

    pub fn sign_in(&self, identity: Identity) {
        debug!("Session signed in as {}", identity.user_id);
        self.tx.send_replace(Some(identity));
    }

    pub fn sign_out(&self) {
        debug!("Session signed out");
        self.tx.send_replace(None);
    }
}

impl SessionProvider for SessionHandle {
    fn current_identity(&self) -> Option<Identity> {
        self.tx.borrow().clone()
    }

    fn subscribe(&self) -> watch::Receiver<Option<Identity>> {
        self.tx.subscribe()
    }
}

/// Session persisted between runs of the CLI
#[derive(Debug, Clone)]
pub struct SessionFile {
    path: PathBuf,
}

impl SessionFile {
    pub fn new(data_dir: &Path) -> Self {
        Self {
            path: data_dir.join(SESSION_FILE),
        }
    }

    /// Read the stored identity. A damaged file reads as signed out.
    pub fn load(&self) -> Option<Identity> {
        let content = fs::read_to_string(&self.path).ok()?;
        match serde_json::from_str(&content) {
            Ok(identity) => Some(identity),
            Err(e) => {
                warn!("Ignoring unreadable session file {:?}: {}", self.path, e);
                None
            }
        }
    }

    pub fn store(&self, identity: &Identity) -> Result<(), SessionError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| SessionError::Persist {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        let json = serde_json::to_string_pretty(identity)?;
        fs::write(&self.path, json).map_err(|e| SessionError::Persist {
            path: self.path.clone(),
            source: e,
        })
    }

    pub fn clear(&self) -> Result<(), SessionError> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SessionError::Persist {
                path: self.path.clone(),
                source: e,
            }),
        }
    }
}
