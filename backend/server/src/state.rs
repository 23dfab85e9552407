use std::sync::Arc;

use records::{RecordStore, memory::MemoryStore, remote::RealtimeDatabase};
use reqwest::Client;
use tracing::info;

use super::{
    config::{Backend, Config},
    error::StartupError,
    fakes::{LogAudit, MemoryIdentity, Outbox},
    identity::{IdentityProvider, IdentityToolkit},
    relay::{Auditor, EmailApi, HttpAudit, NotificationRelay},
    screens::contact::ContactSettings,
    shell::Shells,
};

/// Collaborators shared by every shell.
#[derive(Clone)]
pub struct Services {
    pub identity: Arc<dyn IdentityProvider>,
    pub records: Arc<dyn RecordStore>,
    pub notifications: Arc<dyn NotificationRelay>,
    pub auditor: Auditor,
}

impl Services {
    pub fn memory() -> Self {
        Self {
            identity: Arc::new(MemoryIdentity::new()),
            records: Arc::new(MemoryStore::new()),
            notifications: Arc::new(Outbox::new()),
            auditor: Auditor::new(Arc::new(LogAudit)),
        }
    }

    pub fn remote(config: &Config) -> Result<Self, StartupError> {
        let client = Client::new();

        let identity = IdentityToolkit::new(
            client.clone(),
            &config.identity.endpoint,
            config.identity.api_key.as_deref().unwrap_or_default(),
        );
        let records = RealtimeDatabase::new(
            client.clone(),
            &config.records.endpoint,
            config.records.api_key.clone(),
        )
        .map_err(|e| StartupError::Collaborator(e.to_string()))?;
        let notifications = EmailApi::new(
            client.clone(),
            &config.notification.endpoint,
            config.notification.api_key.as_deref().unwrap_or_default(),
        );
        let audit = HttpAudit::new(client, &config.audit.endpoint);

        Ok(Self {
            identity: Arc::new(identity),
            records: Arc::new(records),
            notifications: Arc::new(notifications),
            auditor: Auditor::new(Arc::new(audit)),
        })
    }
}

pub struct AppState {
    pub config: Config,
    pub records: Arc<dyn RecordStore>,
    pub notifications: Arc<dyn NotificationRelay>,
    pub auditor: Auditor,
    pub contact: ContactSettings,
    pub shells: Shells,
}

impl AppState {
    pub fn new(config: Config) -> Result<Arc<Self>, StartupError> {
        let services = match config.backend {
            Backend::Remote => {
                info!("Using remote collaborators");
                Services::remote(&config)?
            }
            Backend::Memory => {
                info!("Using in-memory collaborators");
                Services::memory()
            }
        };

        Ok(Self::with_services(config, services))
    }

    pub fn with_services(config: Config, services: Services) -> Arc<Self> {
        let contact = ContactSettings {
            service_id: config.notification_service_id.clone(),
            template_id: config.notification.template_id.clone().unwrap_or_default(),
            destination: config.contact_destination.clone(),
        };
        let shells = Shells::new(services.identity, config.shell_idle);

        Arc::new(Self {
            config,
            records: services.records,
            notifications: services.notifications,
            auditor: services.auditor,
            contact,
            shells,
        })
    }
}
