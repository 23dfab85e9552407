//! # Session Store
//!
//! Client-side view of the identity provider: holds the signed-in user for one
//! visitor and broadcasts every change.
//!
//! - One `watch` channel per store, the store is the only writer
//! - Screens call [`SessionStore::subscribe`] when mounted and drop the receiver when gone
//! - The handle is set by a successful credential check or creation, cleared by sign-out
use std::{fmt, sync::Arc};

use tokio::sync::watch;
use tracing::info;

use crate::identity::{IdentityError, IdentityProvider};

#[derive(Clone, PartialEq, Eq)]
pub struct SessionHandle {
    pub user_id: String,
    pub email: String,
    pub id_token: String,
}

impl fmt::Debug for SessionHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionHandle")
            .field("user_id", &self.user_id)
            .field("email", &self.email)
            .finish_non_exhaustive()
    }
}

pub type SessionWatch = watch::Receiver<Option<SessionHandle>>;

pub struct SessionStore {
    provider: Arc<dyn IdentityProvider>,
    current: watch::Sender<Option<SessionHandle>>,
}

impl SessionStore {
    pub fn new(provider: Arc<dyn IdentityProvider>) -> Self {
        let (current, _) = watch::channel(None);

        Self { provider, current }
    }

    pub async fn create_credential(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionHandle, IdentityError> {
        let handle = self.provider.sign_up(email, password).await?;
        info!(user_id = %handle.user_id, "Credential created");

        self.current.send_replace(Some(handle.clone()));
        Ok(handle)
    }

    pub async fn check_credential(
        &self,
        email: &str,
        password: &str,
    ) -> Result<SessionHandle, IdentityError> {
        let handle = self.provider.sign_in(email, password).await?;
        info!(user_id = %handle.user_id, "Signed in");

        self.current.send_replace(Some(handle.clone()));
        Ok(handle)
    }

    /// Removes the account behind `handle`, signing it out if it is the current one.
    pub async fn delete_credential(&self, handle: &SessionHandle) -> Result<(), IdentityError> {
        self.provider.delete_account(handle).await?;
        info!(user_id = %handle.user_id, "Credential deleted");

        self.current.send_if_modified(|current| {
            if current.as_ref().is_some_and(|c| c.user_id == handle.user_id) {
                *current = None;
                return true;
            }
            false
        });

        Ok(())
    }

    pub fn sign_out(&self) {
        let previous = self.current.send_replace(None);

        if let Some(handle) = previous {
            info!(user_id = %handle.user_id, "Signed out");
        }
    }

    pub fn subscribe(&self) -> SessionWatch {
        self.current.subscribe()
    }

    pub fn current(&self) -> Option<SessionHandle> {
        self.current.borrow().clone()
    }
}
