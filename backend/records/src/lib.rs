//! # Records
//!
//! Client side of the realtime document store holding users and their vitals.
//!
//! ## Layout
//!
//! - `users/<prn>`: one [`UserRecord`] per PRN, the PRN is the storage key
//! - `users/<prn>/HealthData/<YYYY-MM-DD>`: one [`HealthSample`] per calendar day
//!
//! A second registration with an existing PRN overwrites the first record.
//!
//! ## Backends
//!
//! - [`remote::RealtimeDatabase`]: REST interface of the hosted database
//! - [`memory::MemoryStore`]: process-local map for offline runs and tests
use async_trait::async_trait;
use thiserror::Error;

pub mod memory;
pub mod models;
pub mod remote;

pub use models::{Gender, HealthSample, PRN_LEN, Reading, UNKNOWN, UserRecord};

#[derive(Error, Debug)]
pub enum RecordError {
    #[error("Invalid record key: {0:?}")]
    InvalidKey(String),

    #[error("Invalid store endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("Store rejected request with status {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Store request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed record: {0}")]
    Malformed(#[from] serde_json::Error),
}

#[async_trait]
pub trait RecordStore: Send + Sync {
    async fn write(&self, prn: &str, record: &UserRecord) -> Result<(), RecordError>;

    /// `Ok(None)` when nothing is stored under `prn`.
    async fn read(&self, prn: &str) -> Result<Option<UserRecord>, RecordError>;

    async fn write_sample(
        &self,
        prn: &str,
        date: &str,
        sample: &HealthSample,
    ) -> Result<(), RecordError>;
}

/// Keys become path segments in the store, which forbids `. $ # [ ] /`.
pub fn check_key(key: &str) -> Result<(), RecordError> {
    let forbidden = |c: char| matches!(c, '.' | '$' | '#' | '[' | ']' | '/') || c.is_control();

    if key.is_empty() || key.chars().any(forbidden) {
        return Err(RecordError::InvalidKey(key.to_string()));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::check_key;

    #[test]
    fn test_valid_keys() {
        assert!(check_key("123456789012").is_ok());
        assert!(check_key("2025-04-26").is_ok());
    }

    #[test]
    fn test_forbidden_keys() {
        for key in ["", "12.4", "../users", "a#b", "$x", "[0]", "a\nb"] {
            assert!(check_key(key).is_err(), "{key:?} should be rejected");
        }
    }
}
