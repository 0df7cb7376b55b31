//! Session manager
//!
//! Owns the active session and keeps it in step with the persisted copy and
//! the backend.

use super::api::AuthApi;
use super::store::TokenStore;
use super::types::{Session, UserIdentity};
use crate::error::{Error, Result};
use crate::http::TokenSource;
use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{debug, info, warn};

/// Active session plus its persistence and remote validation
#[derive(Debug)]
pub struct SessionManager<S, A> {
    store: S,
    api: A,
    current: RwLock<Option<Session>>,
}

impl<S: TokenStore, A: AuthApi> SessionManager<S, A> {
    /// Create a manager with no active session
    pub fn new(store: S, api: A) -> Self {
        Self {
            store,
            api,
            current: RwLock::new(None),
        }
    }

    /// The persistence backend
    pub fn store(&self) -> &S {
        &self.store
    }

    /// Restore the persisted session.
    ///
    /// An expired or unreadable session is cleared. With `validate`, the
    /// token is checked against the backend: success refreshes and persists
    /// the identity, any failure keeps the cached one.
    pub async fn init(&self, validate: bool) -> Result<Option<Session>> {
        let stored = match self.store.load().await {
            Ok(stored) => stored,
            Err(e) => {
                warn!("Discarding unreadable session: {}", e);
                self.store.clear().await?;
                None
            }
        };

        let Some(mut session) = stored else {
            debug!("No persisted session");
            *self.current.write().await = None;
            return Ok(None);
        };

        if session.is_expired() {
            info!("Persisted session for {} has expired", session.user.id);
            self.store.clear().await?;
            *self.current.write().await = None;
            return Ok(None);
        }

        if validate {
            match self.api.validate(&session.token).await {
                Ok(user) => {
                    if user != session.user {
                        debug!("Refreshing cached identity for {}", user.id);
                        session.user = user;
                        if let Err(e) = self.store.save(&session).await {
                            warn!("Failed to persist refreshed identity: {}", e);
                        }
                    }
                }
                Err(e) => {
                    warn!(
                        "Session validation failed, keeping cached identity for {}: {}",
                        session.user.id, e
                    );
                }
            }
        }

        *self.current.write().await = Some(session.clone());
        Ok(Some(session))
    }

    /// Validate `token`, then persist and activate the session it belongs to
    pub async fn establish(&self, token: &str) -> Result<Session> {
        let token = token.trim();
        if token.is_empty() {
            return Err(Error::auth("Token must not be empty"));
        }

        let user = self.api.validate(token).await.map_err(|e| {
            if e.is_unauthorized() {
                Error::auth("Token rejected by backend")
            } else {
                e
            }
        })?;

        let session = Session::new(token, user);
        self.store.save(&session).await?;
        info!("Signed in as {}", session.user.label());

        *self.current.write().await = Some(session.clone());
        Ok(session)
    }

    /// End the session locally and, best effort, on the backend.
    ///
    /// Calling this with no session is a no-op that still succeeds.
    pub async fn teardown(&self) -> Result<()> {
        let active = self.current.write().await.take();
        let session = match active {
            Some(session) => Some(session),
            None => self.store.load().await.unwrap_or_default(),
        };

        if let Some(session) = session {
            if let Err(e) = self.api.logout(&session.token).await {
                warn!("Remote logout failed for {}: {}", session.user.id, e);
            }
            info!("Signed out {}", session.user.label());
        }

        self.store.clear().await
    }

    /// The active session, if any
    pub async fn current(&self) -> Option<Session> {
        self.current.read().await.clone()
    }

    /// Identity of the active session
    pub async fn user(&self) -> Option<UserIdentity> {
        self.current.read().await.as_ref().map(|s| s.user.clone())
    }

    /// Whether an unexpired session is active
    pub async fn is_authenticated(&self) -> bool {
        self.current
            .read()
            .await
            .as_ref()
            .is_some_and(|s| !s.is_expired())
    }
}

#[async_trait]
impl<S: TokenStore, A: AuthApi> TokenSource for SessionManager<S, A> {
    async fn bearer_token(&self) -> Option<String> {
        self.current
            .read()
            .await
            .as_ref()
            .filter(|s| !s.is_expired())
            .map(|s| s.token.clone())
    }
}
