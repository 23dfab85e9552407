//! Process-local collaborators for `VITALS_BACKEND=memory` and tests.
use std::{
    collections::{HashMap, VecDeque},
    sync::atomic::{AtomicBool, Ordering},
};

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tracing::info;
use uuid::Uuid;

use crate::{
    identity::{IdentityError, IdentityProvider},
    relay::{AuditRelay, NotificationRelay, Payload, RelayError},
    session::SessionHandle,
};

struct Account {
    user_id: String,
    password: String,
    token: String,
}

/// Accounts keyed by email, with the provider's own password rule.
#[derive(Default)]
pub struct MemoryIdentity {
    accounts: Mutex<HashMap<String, Account>>,
}

impl MemoryIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contains(&self, email: &str) -> bool {
        self.accounts.lock().contains_key(email)
    }
}

fn handle(email: &str, account: &Account) -> SessionHandle {
    SessionHandle {
        user_id: account.user_id.clone(),
        email: email.to_string(),
        id_token: account.token.clone(),
    }
}

#[async_trait]
impl IdentityProvider for MemoryIdentity {
    async fn sign_up(&self, email: &str, password: &str) -> Result<SessionHandle, IdentityError> {
        if password.chars().count() < 6 {
            return Err(IdentityError::WeakPassword);
        }

        let mut accounts = self.accounts.lock();
        if accounts.contains_key(email) {
            return Err(IdentityError::EmailInUse);
        }

        let account = Account {
            user_id: Uuid::new_v4().simple().to_string(),
            password: password.to_string(),
            token: Uuid::new_v4().to_string(),
        };
        let session = handle(email, &account);

        accounts.insert(email.to_string(), account);
        Ok(session)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<SessionHandle, IdentityError> {
        let accounts = self.accounts.lock();
        let account = accounts.get(email).ok_or(IdentityError::UserNotFound)?;

        if account.password != password {
            return Err(IdentityError::WrongPassword);
        }

        Ok(handle(email, account))
    }

    async fn delete_account(&self, session: &SessionHandle) -> Result<(), IdentityError> {
        let mut accounts = self.accounts.lock();

        match accounts.get(&session.email) {
            Some(account) if account.token == session.id_token => {
                accounts.remove(&session.email);
                Ok(())
            }
            Some(_) => Err(IdentityError::Other("INVALID_ID_TOKEN".to_string())),
            None => Err(IdentityError::UserNotFound),
        }
    }
}

/// Notifications the outbox holds before the oldest is dropped.
pub const OUTBOX_LIMIT: usize = 64;

/// Keeps the latest sent notifications. Can be switched to fail for outage drills.
#[derive(Default)]
pub struct Outbox {
    sent: Mutex<VecDeque<(String, String, Payload)>>,
    failing: AtomicBool,
}

impl Outbox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        let outbox = Self::default();
        outbox.set_failing(true);
        outbox
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }

    pub fn sent(&self) -> Vec<(String, String, Payload)> {
        self.sent.lock().iter().cloned().collect()
    }
}

#[async_trait]
impl NotificationRelay for Outbox {
    async fn send(
        &self,
        service_id: &str,
        template_id: &str,
        payload: &Payload,
    ) -> Result<(), RelayError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(RelayError::Unavailable("outbox is failing".to_string()));
        }

        info!(service_id, template_id, "Notification stored in outbox");
        let mut sent = self.sent.lock();
        if sent.len() == OUTBOX_LIMIT {
            sent.pop_front();
        }
        sent.push_back((
            service_id.to_string(),
            template_id.to_string(),
            payload.clone(),
        ));

        Ok(())
    }
}

/// Writes audit messages to the local log.
pub struct LogAudit;

#[async_trait]
impl AuditRelay for LogAudit {
    async fn post(&self, message: &str) -> Result<(), RelayError> {
        info!(target: "vitals_audit", "{message}");
        Ok(())
    }
}

/// Hands every audit message to a channel.
pub struct ChannelAudit {
    messages: UnboundedSender<String>,
}

impl ChannelAudit {
    pub fn new() -> (Self, UnboundedReceiver<String>) {
        let (messages, receiver) = unbounded_channel();

        (Self { messages }, receiver)
    }
}

#[async_trait]
impl AuditRelay for ChannelAudit {
    async fn post(&self, message: &str) -> Result<(), RelayError> {
        self.messages
            .send(message.to_string())
            .map_err(|_| RelayError::Unavailable("audit receiver dropped".to_string()))
    }
}
