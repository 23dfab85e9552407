use std::collections::HashMap;

use async_trait::async_trait;
use parking_lot::RwLock;

use crate::{HealthSample, RecordError, RecordStore, UserRecord, check_key};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<String, UserRecord>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, record: UserRecord) {
        self.users.write().insert(record.prn.clone(), record);
    }

    pub fn get(&self, prn: &str) -> Option<UserRecord> {
        self.users.read().get(prn).cloned()
    }

    pub fn len(&self) -> usize {
        self.users.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.read().is_empty()
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn write(&self, prn: &str, record: &UserRecord) -> Result<(), RecordError> {
        check_key(prn)?;

        self.users.write().insert(prn.to_string(), record.clone());
        Ok(())
    }

    async fn read(&self, prn: &str) -> Result<Option<UserRecord>, RecordError> {
        check_key(prn)?;

        Ok(self.get(prn))
    }

    async fn write_sample(
        &self,
        prn: &str,
        date: &str,
        sample: &HealthSample,
    ) -> Result<(), RecordError> {
        check_key(prn)?;
        check_key(date)?;

        // Writing below a missing user creates the parent path, as the hosted store does.
        self.users
            .write()
            .entry(prn.to_string())
            .or_insert_with(|| UserRecord {
                prn: prn.to_string(),
                ..UserRecord::default()
            })
            .health_data
            .insert(date.to_string(), sample.clone());

        Ok(())
    }
}
