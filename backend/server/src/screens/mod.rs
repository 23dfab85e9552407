//! # Screens
//!
//! Interaction state of every stateful page, independent of HTTP.
//!
//! A screen is mounted fresh when its page is opened, edited by form events,
//! and submitted against the collaborators it needs. Rendering lives in
//! [`crate::pages`].
use std::collections::BTreeMap;

pub mod contact;
pub mod dashboard;
pub mod login;
pub mod navigation;
pub mod registration;

/// In-progress field values plus a parallel map of field errors.
#[derive(Debug, Clone)]
pub struct FormDraft<F: Ord + Copy> {
    values: BTreeMap<F, String>,
    errors: BTreeMap<F, String>,
}

impl<F: Ord + Copy> Default for FormDraft<F> {
    fn default() -> Self {
        Self {
            values: BTreeMap::new(),
            errors: BTreeMap::new(),
        }
    }
}

impl<F: Ord + Copy> FormDraft<F> {
    pub fn value(&self, field: F) -> &str {
        self.values.get(&field).map_or("", String::as_str)
    }

    pub fn set_value(&mut self, field: F, value: impl Into<String>) {
        self.values.insert(field, value.into());
    }

    pub fn error(&self, field: F) -> Option<&str> {
        self.errors.get(&field).map(String::as_str)
    }

    /// `None` clears the error.
    pub fn set_error(&mut self, field: F, error: Option<&str>) {
        match error {
            Some(message) => self.errors.insert(field, message.to_string()),
            None => self.errors.remove(&field),
        };
    }

    pub fn has_errors(&self) -> bool {
        !self.errors.is_empty()
    }

    pub fn clear(&mut self) {
        self.values.clear();
        self.errors.clear();
    }
}
