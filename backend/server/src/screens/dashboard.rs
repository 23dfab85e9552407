//! # Dashboard
//!
//! Two-state machine over a single PRN lookup.
//!
//! - `Unverified`: holds the PRN being typed and the last lookup error
//! - `Verified`: holds the fetched record; the history panel and the report read from it
//!
//! Mounting always starts `Unverified`. Nothing is re-fetched once verified.
use records::{PRN_LEN, Reading, RecordStore, UserRecord};
use tracing::{error, info};

pub const PRN_LENGTH_REQUIRED: &str = "PRN must be exactly 12 digits";
pub const NO_USER_FOUND: &str = "No user found with this PRN";
pub const FETCH_FAILED: &str = "Failed to fetch user data";

const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Default)]
pub enum DashboardState {
    #[default]
    Unverified,
    Verified(Box<UserRecord>),
}

#[derive(Debug, Default)]
pub struct DashboardScreen {
    prn: String,
    state: DashboardState,
    error: Option<&'static str>,
    history_open: bool,
    signed_in_as: Option<String>,
}

impl DashboardScreen {
    /// `routed_uid` is the user id handed over by the login redirect.
    pub fn mount(routed_uid: Option<String>) -> Self {
        Self {
            signed_in_as: routed_uid.filter(|uid| !uid.is_empty()),
            ..Self::default()
        }
    }

    pub fn prn(&self) -> &str {
        &self.prn
    }

    pub fn set_prn(&mut self, prn: impl Into<String>) {
        self.prn = prn.into();
        self.error = None;
    }

    pub fn can_submit(&self) -> bool {
        self.prn.chars().count() == PRN_LEN
    }

    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    pub fn state(&self) -> &DashboardState {
        &self.state
    }

    pub fn record(&self) -> Option<&UserRecord> {
        match &self.state {
            DashboardState::Verified(record) => Some(record),
            DashboardState::Unverified => None,
        }
    }

    pub fn signed_in_as(&self) -> Option<&str> {
        self.signed_in_as.as_deref()
    }

    pub async fn verify(&mut self, records: &dyn RecordStore) {
        if !self.can_submit() {
            self.error = Some(PRN_LENGTH_REQUIRED);
            self.state = DashboardState::Unverified;
            return;
        }
        self.error = None;

        match records.read(&self.prn).await {
            Ok(Some(record)) => {
                info!(prn = %self.prn, "PRN verified");
                self.state = DashboardState::Verified(Box::new(record));
            }
            Ok(None) => {
                info!(prn = %self.prn, "No record for PRN");
                self.error = Some(NO_USER_FOUND);
                self.state = DashboardState::Unverified;
            }
            Err(e) => {
                error!(error = %e, prn = %self.prn, "Failed to fetch user record");
                self.error = Some(FETCH_FAILED);
                self.state = DashboardState::Unverified;
            }
        }
    }

    pub fn history_open(&self) -> bool {
        self.history_open && self.record().is_some()
    }

    pub fn open_history(&mut self) {
        self.history_open = true;
    }

    pub fn close_history(&mut self) {
        self.history_open = false;
    }

    /// Vitals of the latest sample, `None` while unverified.
    pub fn vitals(&self) -> Option<VitalsView> {
        self.record().map(VitalsView::latest)
    }
}

/// Display strings for one sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VitalsView {
    pub date: String,
    pub oxygen_saturation: String,
    pub heart_rate: String,
    pub weight: String,
}

impl VitalsView {
    pub fn latest(record: &UserRecord) -> Self {
        match record.latest_sample() {
            Some((date, sample)) => Self {
                date: date.to_string(),
                oxygen_saturation: with_unit(sample.oxygen_saturation, "%"),
                heart_rate: with_unit(sample.heart_rate, " bpm"),
                weight: with_unit(sample.weight.unwrap_or_default(), " kg"),
            },
            None => Self {
                date: NOT_AVAILABLE.to_string(),
                oxygen_saturation: NOT_AVAILABLE.to_string(),
                heart_rate: NOT_AVAILABLE.to_string(),
                weight: NOT_AVAILABLE.to_string(),
            },
        }
    }
}

fn with_unit(reading: Reading, unit: &str) -> String {
    match reading {
        Reading::Known(_) => format!("{reading}{unit}"),
        Reading::Unknown => NOT_AVAILABLE.to_string(),
    }
}
