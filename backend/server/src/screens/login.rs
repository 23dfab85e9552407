use tracing::warn;

use crate::{identity::IdentityError, session::SessionStore};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoginOutcome {
    SignedIn { user_id: String },
    Failed,
}

/// The password only lives until the next submission.
#[derive(Debug, Default)]
pub struct LoginScreen {
    pub email: String,
    pub password: String,
    error: Option<&'static str>,
    registered: bool,
}

impl LoginScreen {
    /// `registered` is set when arriving straight from a completed registration.
    pub fn mount(registered: bool) -> Self {
        Self {
            registered,
            ..Self::default()
        }
    }

    pub fn error(&self) -> Option<&'static str> {
        self.error
    }

    pub fn registered(&self) -> bool {
        self.registered
    }

    pub async fn submit(&mut self, session: &SessionStore) -> LoginOutcome {
        self.error = None;
        let password = std::mem::take(&mut self.password);

        match session.check_credential(&self.email, &password).await {
            Ok(handle) => LoginOutcome::SignedIn {
                user_id: handle.user_id,
            },
            Err(e) => {
                warn!(error = %e, "Login failed");

                self.error = Some(login_message(&e));
                self.registered = false;
                LoginOutcome::Failed
            }
        }
    }
}

pub fn login_message(error: &IdentityError) -> &'static str {
    match error {
        IdentityError::UserNotFound => "User not found. Please check your email.",
        IdentityError::WrongPassword => "Incorrect password. Please try again.",
        _ => "Login failed. Please try again.",
    }
}
