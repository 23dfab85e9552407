use std::{env, fmt::Display, fs::read_to_string, str::FromStr, time::Duration};

use thiserror::Error;
use tracing::{info, warn};

pub const DEFAULT_IDENTITY_ENDPOINT: &str = "https://identitytoolkit.googleapis.com/v1";
pub const DEFAULT_NOTIFY_ENDPOINT: &str = "https://api.emailjs.com/api/v1.0/email/send";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Invalid {key} value {value:?}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: String,
    },

    #[error("{0} must be set when VITALS_BACKEND=remote")]
    Missing(&'static str),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    /// Hosted identity provider, database, email API and log relay.
    Remote,
    /// Process-local stand-ins, nothing leaves the machine.
    Memory,
}

impl FromStr for Backend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "remote" => Ok(Backend::Remote),
            "memory" => Ok(Backend::Memory),
            other => Err(format!("expected remote or memory, got {other}")),
        }
    }
}

/// Options recognised for every external collaborator.
#[derive(Debug, Clone, Default)]
pub struct Collaborator {
    pub endpoint: String,
    pub api_key: Option<String>,
    pub template_id: Option<String>,
}

pub struct Config {
    pub port: u16,
    pub backend: Backend,
    pub shell_idle: Duration,
    pub identity: Collaborator,
    pub records: Collaborator,
    pub notification: Collaborator,
    pub notification_service_id: String,
    pub contact_destination: String,
    pub audit: Collaborator,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 1111,
            backend: Backend::Memory,
            shell_idle: Duration::from_secs(30 * 60),
            identity: Collaborator {
                endpoint: DEFAULT_IDENTITY_ENDPOINT.to_string(),
                ..Collaborator::default()
            },
            records: Collaborator::default(),
            notification: Collaborator {
                endpoint: DEFAULT_NOTIFY_ENDPOINT.to_string(),
                template_id: Some("contact_form".to_string()),
                ..Collaborator::default()
            },
            notification_service_id: "contact_service".to_string(),
            contact_destination: "care@localhost".to_string(),
            audit: Collaborator::default(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let config = Self {
            port: try_load("RUST_PORT", "1111")?,
            backend: try_load("VITALS_BACKEND", "memory")?,
            shell_idle: Duration::from_secs(try_load("SHELL_IDLE_SECS", "1800")?),
            identity: Collaborator {
                endpoint: load_or("IDENTITY_ENDPOINT", DEFAULT_IDENTITY_ENDPOINT),
                api_key: read_secret("IDENTITY_API_KEY"),
                template_id: None,
            },
            records: Collaborator {
                endpoint: load_or("RECORDS_ENDPOINT", ""),
                api_key: read_secret("RECORDS_AUTH"),
                template_id: None,
            },
            notification: Collaborator {
                endpoint: load_or("NOTIFY_ENDPOINT", DEFAULT_NOTIFY_ENDPOINT),
                api_key: read_secret("NOTIFY_PUBLIC_KEY"),
                template_id: var("NOTIFY_TEMPLATE_ID").ok().or(defaults.notification.template_id),
            },
            notification_service_id: load_or(
                "NOTIFY_SERVICE_ID",
                &defaults.notification_service_id,
            ),
            contact_destination: load_or("CONTACT_DESTINATION", &defaults.contact_destination),
            audit: Collaborator {
                endpoint: load_or("AUDIT_ENDPOINT", ""),
                api_key: None,
                template_id: None,
            },
        };

        config.validate()?;
        Ok(config)
    }

    /// Remote mode cannot start without every endpoint and credential.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.backend == Backend::Memory {
            return Ok(());
        }

        let required = [
            ("IDENTITY_API_KEY", self.identity.api_key.is_some()),
            ("RECORDS_ENDPOINT", !self.records.endpoint.is_empty()),
            ("NOTIFY_PUBLIC_KEY", self.notification.api_key.is_some()),
            ("NOTIFY_TEMPLATE_ID", self.notification.template_id.is_some()),
            ("AUDIT_ENDPOINT", !self.audit.endpoint.is_empty()),
        ];

        match required.into_iter().find(|(_, present)| !present) {
            Some((key, _)) => Err(ConfigError::Missing(key)),
            None => Ok(()),
        }
    }
}

fn var(key: &str) -> Result<String, ()> {
    env::var(key).map_err(|_| {
        warn!("Environment variable {key} not found, using default");
    })
}

fn load_or(key: &str, default: &str) -> String {
    var(key).unwrap_or_else(|_| default.to_string())
}

fn try_load<T: FromStr>(key: &'static str, default: &str) -> Result<T, ConfigError>
where
    T::Err: Display,
{
    let value = var(key).unwrap_or_else(|_| {
        info!("{key} not set, using default: {default}");
        default.to_string()
    });

    value.parse().map_err(|e: T::Err| {
        warn!("Invalid {key} value: {e}");

        ConfigError::Invalid {
            key,
            value: value.clone(),
            reason: e.to_string(),
        }
    })
}

/// Docker secrets first, then the environment.
fn read_secret(secret_name: &str) -> Option<String> {
    let path = format!("/run/secrets/{secret_name}");

    read_to_string(&path)
        .map(|s| s.trim().to_string())
        .map_err(|e| {
            info!("Secret {secret_name} not mounted: {e}");
        })
        .or_else(|_| env::var(secret_name).map_err(|_| ()))
        .map_err(|_| {
            warn!("Secret {secret_name} not provided");
        })
        .ok()
        .filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_memory() {
        let config = Config::default();

        assert_eq!(config.backend, Backend::Memory);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_remote_requires_credentials() {
        let mut config = Config {
            backend: Backend::Remote,
            ..Config::default()
        };

        assert!(matches!(
            config.validate(),
            Err(ConfigError::Missing("IDENTITY_API_KEY"))
        ));

        config.identity.api_key = Some("key".to_string());
        config.records.endpoint = "https://db.example.com".to_string();
        config.notification.api_key = Some("public".to_string());
        config.audit.endpoint = "https://logs.example.com".to_string();

        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_backend_parse() {
        assert_eq!("Remote".parse::<Backend>(), Ok(Backend::Remote));
        assert_eq!(" memory ".parse::<Backend>(), Ok(Backend::Memory));
        assert!("sqlite".parse::<Backend>().is_err());
    }
}
