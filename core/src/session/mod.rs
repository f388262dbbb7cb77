//! Holder of the current bearer token.
//!
//! # Design
//! One `SessionStore` lives for the whole client process and is shared as
//! `Arc<SessionStore>`. It hydrates from its `TokenStorage` exactly once,
//! when opened. Writes go to storage first and only then to memory, all
//! under the write lock, so memory never holds a token that failed to
//! persist and two writers cannot interleave.
//!
//! Only the login/logout flow calls `set_token`/`clear_token`; the HTTP
//! client only reads.

mod storage;

use std::fmt;
use std::sync::{PoisonError, RwLock};

pub use storage::{FileTokenStorage, MemoryTokenStorage, TokenStorage, TOKEN_SLOT};

use crate::error::SessionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticated,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SessionState::Anonymous => f.write_str("anonymous"),
            SessionState::Authenticated => f.write_str("authenticated"),
        }
    }
}

pub struct SessionStore {
    storage: Box<dyn TokenStorage>,
    token: RwLock<Option<String>>,
}

impl fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionStore")
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl SessionStore {
    /// Open the store and hydrate memory from `storage`. An empty slot
    /// yields the anonymous state.
    pub fn open(storage: impl TokenStorage + 'static) -> Result<Self, SessionError> {
        let token = storage.load()?;
        tracing::debug!(restored = token.is_some(), "session hydrated");
        Ok(Self {
            storage: Box::new(storage),
            token: RwLock::new(token),
        })
    }

    /// An anonymous store backed by a private in-memory slot.
    pub fn in_memory() -> Self {
        Self {
            storage: Box::new(MemoryTokenStorage::new()),
            token: RwLock::new(None),
        }
    }

    pub fn get_token(&self) -> Option<String> {
        self.token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn state(&self) -> SessionState {
        if self
            .token
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .is_some()
        {
            SessionState::Authenticated
        } else {
            SessionState::Anonymous
        }
    }

    pub fn is_authenticated(&self) -> bool {
        self.state() == SessionState::Authenticated
    }

    /// Store a freshly issued token, replacing any previous one.
    ///
    /// Surrounding whitespace is dropped before the token is persisted, so
    /// memory and storage hold the same value a later hydration reads back.
    pub fn set_token(&self, token: impl Into<String>) -> Result<(), SessionError> {
        let raw: String = token.into();
        let token = raw.trim();
        if token.is_empty() {
            return Err(SessionError::EmptyToken);
        }
        if token.chars().any(char::is_control) {
            return Err(SessionError::MalformedToken);
        }
        let token = token.to_string();
        let mut current = self.token.write().unwrap_or_else(PoisonError::into_inner);
        self.storage.save(&token)?;
        let replaced = current.replace(token).is_some();
        tracing::debug!(replaced, "session token stored");
        Ok(())
    }

    /// Forget the token. Clearing an anonymous session is a no-op.
    pub fn clear_token(&self) -> Result<(), SessionError> {
        let mut current = self.token.write().unwrap_or_else(PoisonError::into_inner);
        self.storage.remove()?;
        if current.take().is_some() {
            tracing::debug!("session token cleared");
        }
        Ok(())
    }
}
