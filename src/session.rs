//! Authentication state machine.
//!
//! `SessionStore` is the only writer of authentication state. It is owned by
//! the composition root and lent (`&mut`) to whatever needs the token, so at
//! most one login or resolution can be in flight at a time.

use std::sync::Arc;
use tracing::{info, warn};

use crate::api::ApiGateway;
use crate::db::Database;
use crate::error::{ClientError, Result};
use crate::models::User;

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Unresolved,
    Authenticated(User),
    Anonymous,
}

pub struct SessionStore {
    gateway: Arc<dyn ApiGateway>,
    db: Database,
    state: SessionState,
    token: Option<String>,
}

impl SessionStore {
    pub fn new(gateway: Arc<dyn ApiGateway>, db: Database) -> Self {
        SessionStore {
            gateway,
            db,
            state: SessionState::Unresolved,
            token: None,
        }
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn user(&self) -> Option<&User> {
        match &self.state {
            SessionState::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated(_))
    }

    pub fn gateway(&self) -> Arc<dyn ApiGateway> {
        Arc::clone(&self.gateway)
    }

    /// The token to attach to an outgoing request.
    pub fn bearer(&self) -> Result<String> {
        match (&self.state, &self.token) {
            (SessionState::Authenticated(_), Some(token)) => Ok(token.clone()),
            _ => Err(ClientError::Auth("Please log in first".into())),
        }
    }

    /// Startup resolution of a persisted token. Any failure discards it.
    pub async fn resolve(&mut self) -> &SessionState {
        if self.state != SessionState::Unresolved {
            return &self.state;
        }

        let persisted = match self.db.token() {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "could not read persisted token");
                None
            }
        };

        match persisted {
            None => {
                self.state = SessionState::Anonymous;
            }
            Some(token) => match self.gateway.current_user(&token).await {
                Ok(user) => {
                    info!(user = %user.username, "session restored");
                    self.token = Some(token);
                    self.state = SessionState::Authenticated(user);
                }
                Err(e) => {
                    warn!(error = %e, "persisted token rejected; discarding");
                    self.discard();
                }
            },
        }

        &self.state
    }

    pub async fn login(&mut self, username: &str, password: &str) -> Result<User> {
        if username.trim().is_empty() {
            return Err(ClientError::validation("Username is required"));
        }
        if password.is_empty() {
            return Err(ClientError::validation("Password is required"));
        }

        // A fresh login replaces whatever was there before.
        self.discard();

        let token = match self.gateway.login(username, password).await {
            Ok(resp) => resp.access_token,
            Err(e) => {
                warn!(user = %username, error = %e, "login failed");
                return Err(e);
            }
        };

        if let Err(e) = self.db.save_token(&token) {
            warn!(error = %e, "could not persist token");
            return Err(e);
        }

        match self.gateway.current_user(&token).await {
            Ok(user) => {
                info!(user = %user.username, "logged in");
                self.token = Some(token);
                self.state = SessionState::Authenticated(user.clone());
                Ok(user)
            }
            Err(e) => {
                warn!(error = %e, "identity lookup after login failed");
                self.discard();
                Err(e)
            }
        }
    }

    /// Local only: no request is made. Safe to call repeatedly.
    pub fn logout(&mut self) {
        if self.is_authenticated() {
            info!("logged out");
        }
        self.discard();
    }

    /// Feed a request outcome through the session. An authentication failure
    /// ends the session before the error is handed back.
    pub fn observe<T>(&mut self, result: Result<T>) -> Result<T> {
        if let Err(e) = &result {
            if e.is_auth() && self.state != SessionState::Anonymous {
                warn!(error = %e, "authentication rejected; session ended");
                self.discard();
            }
        }
        result
    }

    fn discard(&mut self) {
        if let Err(e) = self.db.clear_token() {
            warn!(error = %e, "could not clear persisted token");
        }
        self.token = None;
        self.state = SessionState::Anonymous;
    }
}
