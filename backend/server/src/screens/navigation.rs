use crate::session::{SessionStore, SessionWatch};

/// Navigation bar state. Observes the session for the whole lifetime of its shell.
pub struct Navigation {
    session: SessionWatch,
    menu_open: bool,
}

impl Navigation {
    pub fn new(session: SessionWatch) -> Self {
        Self {
            session,
            menu_open: false,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.session.borrow().is_some()
    }

    pub fn menu_open(&self) -> bool {
        self.menu_open
    }

    pub fn toggle_menu(&mut self) {
        self.menu_open = !self.menu_open;
    }

    /// Returns the path to land on afterwards.
    pub fn logout(&mut self, session: &SessionStore) -> &'static str {
        session.sign_out();
        self.menu_open = false;
        "/"
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::fakes::MemoryIdentity;

    #[tokio::test]
    async fn test_follows_session() {
        let session = SessionStore::new(Arc::new(MemoryIdentity::new()));
        let mut navigation = Navigation::new(session.subscribe());
        assert!(!navigation.is_signed_in());

        session.create_credential("a@b.co", "secret1").await.unwrap();
        assert!(navigation.is_signed_in());

        navigation.toggle_menu();
        assert!(navigation.menu_open());

        assert_eq!(navigation.logout(&session), "/");
        assert!(!navigation.is_signed_in());
        assert!(!navigation.menu_open());
    }
}
