//! # Registration
//!
//! Every field is validated on change, on blur and again on submit.
//!
//! ## Submit Saga
//! 1. Create the credential, the record embeds the returned user id
//! 2. Write the user record under its PRN with a placeholder sample for today
//! 3. Forward the outcome to the audit relay
//!
//! If step 2 fails the credential from step 1 is deleted again. When that
//! deletion fails too, the account is flagged for manual repair through the
//! audit relay.
use std::sync::LazyLock;

use records::{Gender, HealthSample, RecordStore, UserRecord};
use regex::Regex;
use tracing::{error, info, warn};

use crate::{
    identity::IdentityError, relay::Auditor, screens::FormDraft, session::SessionStore,
    utils::today,
};

pub const EMAIL_IN_USE: &str = "This email is already registered.";
pub const REGISTRATION_FAILED: &str = "Registration failed. Please try again.";

static EMAIL_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Field {
    FullName,
    Prn,
    Gender,
    Email,
    Password,
    Terms,
}

impl Field {
    pub const ALL: [Field; 6] = [
        Field::FullName,
        Field::Prn,
        Field::Gender,
        Field::Email,
        Field::Password,
        Field::Terms,
    ];

    /// Form control name.
    pub fn name(self) -> &'static str {
        match self {
            Field::FullName => "fullName",
            Field::Prn => "prnNumber",
            Field::Gender => "gender",
            Field::Email => "email",
            Field::Password => "password",
            Field::Terms => "terms",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.name() == name)
    }
}

pub fn is_checked(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "on" | "true" | "1" | "yes"
    )
}

/// `None` when `value` is acceptable for `field`.
pub fn validate_field(field: Field, value: &str) -> Option<&'static str> {
    match field {
        Field::FullName if value.trim().is_empty() => Some("Full name is required"),
        Field::FullName if value.chars().count() < 3 => Some("Name must be at least 3 characters"),
        Field::Prn if value.trim().is_empty() => Some("PRN number is required"),
        Field::Prn if !value.chars().all(|c| c.is_ascii_digit()) => {
            Some("PRN must contain only numbers")
        }
        Field::Gender if Gender::parse(value).is_none() => Some("Please select your gender"),
        Field::Email if value.is_empty() => Some("Email is required"),
        Field::Email if !EMAIL_SHAPE.is_match(value) => Some("Invalid email format"),
        Field::Password if value.is_empty() => Some("Password is required"),
        Field::Password if value.chars().count() < 6 => {
            Some("Password must be at least 6 characters")
        }
        Field::Terms if !is_checked(value) => Some("You must accept the terms"),
        _ => None,
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegistrationOutcome {
    /// At least one field failed validation, nothing was sent.
    Invalid,
    Registered { prn: String },
    Failed,
}

#[derive(Debug, Default)]
pub struct RegistrationScreen {
    draft: FormDraft<Field>,
    form_error: Option<String>,
}

impl RegistrationScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, field: Field) -> &str {
        self.draft.value(field)
    }

    pub fn error(&self, field: Field) -> Option<&str> {
        self.draft.error(field)
    }

    pub fn form_error(&self) -> Option<&str> {
        self.form_error.as_deref()
    }

    pub fn on_change(&mut self, field: Field, value: impl Into<String>) -> Option<&str> {
        self.draft.set_value(field, value);
        self.on_blur(field)
    }

    pub fn on_blur(&mut self, field: Field) -> Option<&str> {
        let error = validate_field(field, self.draft.value(field));
        self.draft.set_error(field, error);

        self.draft.error(field)
    }

    /// Re-validates every field, returns whether all passed.
    pub fn validate_all(&mut self) -> bool {
        for field in Field::ALL {
            self.on_blur(field);
        }

        !self.draft.has_errors()
    }

    pub async fn submit(
        &mut self,
        session: &SessionStore,
        records: &dyn RecordStore,
        audit: &Auditor,
    ) -> RegistrationOutcome {
        if !self.validate_all() {
            return RegistrationOutcome::Invalid;
        }
        self.form_error = None;

        let email = self.draft.value(Field::Email).to_string();
        let password = self.draft.value(Field::Password).to_string();
        let prn = self.draft.value(Field::Prn).to_string();

        let handle = match session.create_credential(&email, &password).await {
            Ok(handle) => handle,
            Err(e) => {
                warn!(error = %e, "Registration rejected by identity provider");

                match e {
                    IdentityError::EmailInUse => {
                        self.draft.set_error(Field::Email, Some(EMAIL_IN_USE));
                    }
                    _ => self.form_error = Some(REGISTRATION_FAILED.to_string()),
                }

                audit.forward(format!("Registration failed for {email}: {e}"));
                return RegistrationOutcome::Failed;
            }
        };

        let date = today();
        let mut record = UserRecord {
            user_id: handle.user_id.clone(),
            full_name: self.draft.value(Field::FullName).to_string(),
            email: email.clone(),
            prn: prn.clone(),
            gender: Gender::parse(self.draft.value(Field::Gender)),
            ..UserRecord::default()
        };
        record
            .health_data
            .insert(date, HealthSample::placeholder());

        if let Err(e) = records.write(&prn, &record).await {
            error!(error = %e, prn = %prn, "Failed to store user record, rolling back credential");

            if let Err(rollback) = session.delete_credential(&handle).await {
                error!(error = %rollback, user_id = %handle.user_id, "Credential rollback failed");

                audit.forward(format!(
                    "Manual repair required: account {} ({email}) has no record for PRN {prn}: {rollback}",
                    handle.user_id
                ));
            }

            session.sign_out();
            self.form_error = Some(REGISTRATION_FAILED.to_string());
            audit.forward(format!("Registration failed for {email}: {e}"));

            return RegistrationOutcome::Failed;
        }

        info!(prn = %prn, user_id = %handle.user_id, "User registered");
        audit.forward(format!(
            "User registered successfully: {} ({email}), PRN {prn}",
            record.full_name
        ));

        self.draft.clear();
        RegistrationOutcome::Registered { prn }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use async_trait::async_trait;
    use records::{Reading, RecordError, memory::MemoryStore};
    use tokio::sync::mpsc::UnboundedReceiver;

    use super::*;
    use crate::{
        fakes::{ChannelAudit, MemoryIdentity},
        identity::IdentityProvider,
        session::SessionHandle,
    };

    #[test]
    fn test_full_name_rules() {
        assert_eq!(
            validate_field(Field::FullName, "   "),
            Some("Full name is required")
        );
        assert_eq!(
            validate_field(Field::FullName, "Al"),
            Some("Name must be at least 3 characters")
        );
        assert_eq!(validate_field(Field::FullName, "Ada"), None);
    }

    #[test]
    fn test_prn_rules() {
        assert_eq!(validate_field(Field::Prn, ""), Some("PRN number is required"));
        assert_eq!(
            validate_field(Field::Prn, "12a"),
            Some("PRN must contain only numbers")
        );
        assert_eq!(
            validate_field(Field::Prn, " 12"),
            Some("PRN must contain only numbers")
        );
        assert_eq!(validate_field(Field::Prn, "123456789012"), None);
        assert_eq!(validate_field(Field::Prn, "7"), None);
    }

    #[test]
    fn test_gender_rules() {
        assert_eq!(
            validate_field(Field::Gender, ""),
            Some("Please select your gender")
        );
        assert_eq!(
            validate_field(Field::Gender, "male"),
            Some("Please select your gender")
        );
        for gender in Gender::ALL {
            assert_eq!(validate_field(Field::Gender, gender.as_str()), None);
        }
    }

    #[test]
    fn test_email_rules() {
        assert_eq!(validate_field(Field::Email, ""), Some("Email is required"));
        for bad in ["plain", "a@b", "a b@c.de", "@c.de", "a@@c.de"] {
            assert_eq!(
                validate_field(Field::Email, bad),
                Some("Invalid email format"),
                "{bad}"
            );
        }
        assert_eq!(validate_field(Field::Email, "ada@example.org"), None);
    }

    #[test]
    fn test_password_and_terms_rules() {
        assert_eq!(
            validate_field(Field::Password, ""),
            Some("Password is required")
        );
        assert_eq!(
            validate_field(Field::Password, "12345"),
            Some("Password must be at least 6 characters")
        );
        assert_eq!(validate_field(Field::Password, "123456"), None);

        assert_eq!(
            validate_field(Field::Terms, ""),
            Some("You must accept the terms")
        );
        assert_eq!(validate_field(Field::Terms, "on"), None);
        assert_eq!(validate_field(Field::Terms, "true"), None);
    }

    #[test]
    fn test_field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(Field::from_name(field.name()), Some(field));
        }
        assert_eq!(Field::from_name("prn"), None);
    }

    #[test]
    fn test_change_then_fix() {
        let mut screen = RegistrationScreen::new();

        assert_eq!(
            screen.on_change(Field::Prn, "12a"),
            Some("PRN must contain only numbers")
        );
        assert_eq!(screen.on_change(Field::Prn, "12"), None);
        assert_eq!(screen.error(Field::Prn), None);
    }

    struct Harness {
        screen: RegistrationScreen,
        session: SessionStore,
        identity: Arc<MemoryIdentity>,
        store: MemoryStore,
        audit: Auditor,
        messages: UnboundedReceiver<String>,
    }

    fn harness() -> Harness {
        let identity = Arc::new(MemoryIdentity::new());
        let (relay, messages) = ChannelAudit::new();

        Harness {
            screen: RegistrationScreen::new(),
            session: SessionStore::new(identity.clone()),
            identity,
            store: MemoryStore::new(),
            audit: Auditor::new(Arc::new(relay)),
            messages,
        }
    }

    fn fill(screen: &mut RegistrationScreen, email: &str, prn: &str) {
        screen.on_change(Field::FullName, "Ada Lovelace");
        screen.on_change(Field::Prn, prn);
        screen.on_change(Field::Gender, "Female");
        screen.on_change(Field::Email, email);
        screen.on_change(Field::Password, "analytical");
        screen.on_change(Field::Terms, "on");
    }

    #[tokio::test]
    async fn test_invalid_submit_sends_nothing() {
        let mut h = harness();
        h.screen.on_change(Field::FullName, "Ada");

        let outcome = h.screen.submit(&h.session, &h.store, &h.audit).await;

        assert_eq!(outcome, RegistrationOutcome::Invalid);
        assert_eq!(h.screen.error(Field::Email), Some("Email is required"));
        assert_eq!(
            h.screen.error(Field::Terms),
            Some("You must accept the terms")
        );
        assert_eq!(h.screen.error(Field::FullName), None);
        assert!(h.store.is_empty());
        assert!(h.session.current().is_none());
    }

    #[tokio::test]
    async fn test_successful_registration() {
        let mut h = harness();
        fill(&mut h.screen, "ada@example.org", "123456789012");

        let outcome = h.screen.submit(&h.session, &h.store, &h.audit).await;

        assert_eq!(
            outcome,
            RegistrationOutcome::Registered {
                prn: "123456789012".to_string()
            }
        );

        let record = h.store.get("123456789012").unwrap();
        let handle = h.session.current().unwrap();
        assert_eq!(record.user_id, handle.user_id);
        assert_eq!(record.full_name, "Ada Lovelace");
        assert_eq!(record.gender, Some(Gender::Female));

        let (date, sample) = record.latest_sample().unwrap();
        assert_eq!(date, today());
        assert_eq!(sample.oxygen_saturation, Reading::Unknown);
        assert_eq!(sample.heart_rate, Reading::Unknown);

        let message = h.messages.recv().await.unwrap();
        assert!(message.contains("registered successfully"));
        assert_eq!(h.screen.value(Field::Email), "");
    }

    #[tokio::test]
    async fn test_duplicate_email_is_field_error() {
        let mut h = harness();
        h.identity.sign_up("ada@example.org", "whatever").await.unwrap();
        fill(&mut h.screen, "ada@example.org", "123456789012");

        let outcome = h.screen.submit(&h.session, &h.store, &h.audit).await;

        assert_eq!(outcome, RegistrationOutcome::Failed);
        assert_eq!(h.screen.error(Field::Email), Some(EMAIL_IN_USE));
        assert_eq!(h.screen.form_error(), None);
        assert_eq!(h.screen.value(Field::FullName), "Ada Lovelace");

        let message = h.messages.recv().await.unwrap();
        assert!(message.contains("email-already-in-use"), "{message}");
    }

    struct RejectingStore;

    #[async_trait]
    impl RecordStore for RejectingStore {
        async fn write(&self, _prn: &str, _record: &UserRecord) -> Result<(), RecordError> {
            Err(RecordError::Rejected {
                status: 401,
                body: "Permission denied".to_string(),
            })
        }

        async fn read(&self, _prn: &str) -> Result<Option<UserRecord>, RecordError> {
            Ok(None)
        }

        async fn write_sample(
            &self,
            _prn: &str,
            _date: &str,
            _sample: &HealthSample,
        ) -> Result<(), RecordError> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_record_failure_rolls_back_credential() {
        let mut h = harness();
        fill(&mut h.screen, "ada@example.org", "123456789012");

        let outcome = h.screen.submit(&h.session, &RejectingStore, &h.audit).await;

        assert_eq!(outcome, RegistrationOutcome::Failed);
        assert_eq!(h.screen.form_error(), Some(REGISTRATION_FAILED));
        assert!(!h.identity.contains("ada@example.org"));
        assert!(h.session.current().is_none());

        let message = h.messages.recv().await.unwrap();
        assert!(message.starts_with("Registration failed"), "{message}");
    }

    #[derive(Default)]
    struct UndeletableIdentity(MemoryIdentity);

    #[async_trait]
    impl IdentityProvider for UndeletableIdentity {
        async fn sign_up(
            &self,
            email: &str,
            password: &str,
        ) -> Result<SessionHandle, IdentityError> {
            self.0.sign_up(email, password).await
        }

        async fn sign_in(
            &self,
            email: &str,
            password: &str,
        ) -> Result<SessionHandle, IdentityError> {
            self.0.sign_in(email, password).await
        }

        async fn delete_account(&self, _handle: &SessionHandle) -> Result<(), IdentityError> {
            Err(IdentityError::Other("TOKEN_EXPIRED".to_string()))
        }
    }

    #[tokio::test]
    async fn test_failed_rollback_flags_manual_repair() {
        let mut h = harness();
        let session = SessionStore::new(Arc::new(UndeletableIdentity::default()));
        fill(&mut h.screen, "ada@example.org", "123456789012");

        let outcome = h.screen.submit(&session, &RejectingStore, &h.audit).await;

        assert_eq!(outcome, RegistrationOutcome::Failed);
        assert!(session.current().is_none());

        let mut messages = Vec::new();
        for _ in 0..2 {
            messages.push(h.messages.recv().await.unwrap());
        }
        assert!(
            messages.iter().any(|m| m.starts_with("Manual repair required")),
            "{messages:?}"
        );
    }
}
