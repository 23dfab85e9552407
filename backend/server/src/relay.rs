//! # Relays
//!
//! Outbound, one-way integrations.
//!
//! - Notification relay: hosted email API, one template per form
//! - Audit relay: HTTP log sink taking `{ "message": string }`, best effort only
use std::{collections::BTreeMap, sync::Arc};

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum RelayError {
    #[error("Relay rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Relay request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Relay unavailable: {0}")]
    Unavailable(String),
}

pub type Payload = BTreeMap<String, String>;

#[async_trait]
pub trait NotificationRelay: Send + Sync {
    async fn send(
        &self,
        service_id: &str,
        template_id: &str,
        payload: &Payload,
    ) -> Result<(), RelayError>;
}

#[async_trait]
pub trait AuditRelay: Send + Sync {
    async fn post(&self, message: &str) -> Result<(), RelayError>;
}

async fn check_status(response: reqwest::Response) -> Result<(), RelayError> {
    let status = response.status();

    if status.is_success() {
        return Ok(());
    }

    let body = response.text().await.unwrap_or_default();
    Err(RelayError::Rejected {
        status: status.as_u16(),
        body,
    })
}

/// Hosted email API authenticated by a public key.
pub struct EmailApi {
    client: Client,
    endpoint: String,
    public_key: String,
}

#[derive(Serialize)]
struct EmailRequest<'a> {
    service_id: &'a str,
    template_id: &'a str,
    user_id: &'a str,
    template_params: &'a Payload,
}

impl EmailApi {
    pub fn new(client: Client, endpoint: &str, public_key: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
            public_key: public_key.to_string(),
        }
    }
}

#[async_trait]
impl NotificationRelay for EmailApi {
    async fn send(
        &self,
        service_id: &str,
        template_id: &str,
        payload: &Payload,
    ) -> Result<(), RelayError> {
        debug!(service_id, template_id, "Sending notification");

        let request = EmailRequest {
            service_id,
            template_id,
            user_id: &self.public_key,
            template_params: payload,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .json(&request)
            .send()
            .await?;

        check_status(response).await
    }
}

pub struct HttpAudit {
    client: Client,
    endpoint: String,
}

#[derive(Serialize)]
struct AuditRequest<'a> {
    message: &'a str,
}

impl HttpAudit {
    pub fn new(client: Client, endpoint: &str) -> Self {
        Self {
            client,
            endpoint: endpoint.to_string(),
        }
    }
}

#[async_trait]
impl AuditRelay for HttpAudit {
    async fn post(&self, message: &str) -> Result<(), RelayError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&AuditRequest { message })
            .send()
            .await?;

        check_status(response).await
    }
}

/// Fire-and-forget front for an [`AuditRelay`]. Failures are logged, never returned.
#[derive(Clone)]
pub struct Auditor {
    relay: Arc<dyn AuditRelay>,
}

impl Auditor {
    pub fn new(relay: Arc<dyn AuditRelay>) -> Self {
        Self { relay }
    }

    pub fn forward(&self, message: impl Into<String>) {
        let relay = self.relay.clone();
        let message = message.into();

        tokio::spawn(async move {
            if let Err(e) = relay.post(&message).await {
                warn!(error = %e, "Failed to forward audit message");
            }
        });
    }
}
