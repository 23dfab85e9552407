use tracing::{error, info};

use super::FormDraft;
use crate::relay::{NotificationRelay, Payload};

pub const SENT: &str = "Message sent successfully! We'll get back to you soon.";
pub const SEND_FAILED: &str = "Failed to send message. Please try again later.";

const TITLE: &str = "New Contact Form Submission";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ContactField {
    Name,
    Email,
    Phone,
    Message,
}

impl ContactField {
    pub const ALL: [ContactField; 4] = [
        ContactField::Name,
        ContactField::Email,
        ContactField::Phone,
        ContactField::Message,
    ];

    pub fn name(self) -> &'static str {
        match self {
            ContactField::Name => "name",
            ContactField::Email => "email",
            ContactField::Phone => "phone",
            ContactField::Message => "message",
        }
    }
}

/// Where contact submissions go.
#[derive(Debug, Clone, Default)]
pub struct ContactSettings {
    pub service_id: String,
    pub template_id: String,
    pub destination: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Banner {
    Sent,
    Failed,
}

impl Banner {
    pub fn message(self) -> &'static str {
        match self {
            Banner::Sent => SENT,
            Banner::Failed => SEND_FAILED,
        }
    }
}

#[derive(Debug, Default)]
pub struct ContactScreen {
    draft: FormDraft<ContactField>,
    banner: Option<Banner>,
}

impl ContactScreen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn value(&self, field: ContactField) -> &str {
        self.draft.value(field)
    }

    pub fn set_value(&mut self, field: ContactField, value: impl Into<String>) {
        self.draft.set_value(field, value);
    }

    pub fn banner(&self) -> Option<Banner> {
        self.banner
    }

    fn payload(&self, destination: &str) -> Payload {
        let mut payload = Payload::new();
        payload.insert("to_email".to_string(), destination.to_string());
        payload.insert("title".to_string(), TITLE.to_string());

        for field in ContactField::ALL {
            payload.insert(field.name().to_string(), self.value(field).to_string());
        }

        payload
    }

    pub async fn submit(
        &mut self,
        relay: &dyn NotificationRelay,
        settings: &ContactSettings,
    ) -> Banner {
        let payload = self.payload(&settings.destination);

        let banner = match relay
            .send(&settings.service_id, &settings.template_id, &payload)
            .await
        {
            Ok(()) => {
                info!("Contact message sent");
                self.draft.clear();
                Banner::Sent
            }
            Err(e) => {
                error!(error = %e, "Failed to send contact message");
                Banner::Failed
            }
        };

        self.banner = Some(banner);
        banner
    }
}
