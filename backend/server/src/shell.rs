//! # Shells
//!
//! One shell per visitor, found through the `vitals_sid` cookie.
//!
//! - A shell owns the visitor's session store and one instance of every stateful screen
//! - Screens sit behind async mutexes: submissions `try_lock`, mounts wait
//! - Navigation sits behind a sync mutex and is never held across an await
//! - Shells untouched for longer than the idle timeout are evicted by [`sweep_idle`]
use std::{collections::HashMap, convert::Infallible, sync::Arc, time::Duration};

use axum::{
    extract::FromRequestParts,
    http::{HeaderValue, header::SET_COOKIE, request::Parts},
    response::{IntoResponse, Response},
};
use parking_lot::{Mutex, RwLock};
use tokio::{
    sync::{Mutex as ScreenLock, MutexGuard},
    time::{Instant, interval},
};
use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    error::AppError,
    identity::IdentityProvider,
    screens::{
        contact::ContactScreen, dashboard::DashboardScreen, login::LoginScreen,
        navigation::Navigation, registration::RegistrationScreen,
    },
    session::SessionStore,
    state::AppState,
    utils::{build_session_cookie, session_cookie},
};

pub struct Shell {
    pub session: SessionStore,
    pub navigation: Mutex<Navigation>,
    pub registration: ScreenLock<RegistrationScreen>,
    pub login: ScreenLock<LoginScreen>,
    pub dashboard: ScreenLock<DashboardScreen>,
    pub contact: ScreenLock<ContactScreen>,
    last_seen: Mutex<Instant>,
}

impl Shell {
    pub fn new(identity: Arc<dyn IdentityProvider>) -> Self {
        let session = SessionStore::new(identity);
        let navigation = Navigation::new(session.subscribe());

        Self {
            session,
            navigation: Mutex::new(navigation),
            registration: ScreenLock::new(RegistrationScreen::new()),
            login: ScreenLock::new(LoginScreen::default()),
            dashboard: ScreenLock::new(DashboardScreen::default()),
            contact: ScreenLock::new(ContactScreen::new()),
            last_seen: Mutex::new(Instant::now()),
        }
    }

    /// Puts every screen back to a fresh mount, dropping drafts and any verified record.
    pub async fn unmount_screens(&self) {
        *self.registration.lock().await = RegistrationScreen::new();
        *self.login.lock().await = LoginScreen::default();
        *self.dashboard.lock().await = DashboardScreen::default();
        *self.contact.lock().await = ContactScreen::new();
    }

    fn touch(&self) {
        *self.last_seen.lock() = Instant::now();
    }

    fn idle_for(&self) -> Duration {
        self.last_seen.lock().elapsed()
    }
}

/// Lock for a submission; a busy screen means one is already in flight.
pub fn submitting<T>(screen: &ScreenLock<T>) -> Result<MutexGuard<'_, T>, AppError> {
    screen.try_lock().map_err(|_| AppError::SubmissionPending)
}

pub struct Shells {
    shells: RwLock<HashMap<String, Arc<Shell>>>,
    identity: Arc<dyn IdentityProvider>,
    idle: Duration,
}

impl Shells {
    pub fn new(identity: Arc<dyn IdentityProvider>, idle: Duration) -> Self {
        Self {
            shells: RwLock::new(HashMap::new()),
            identity,
            idle,
        }
    }

    pub fn get(&self, id: &str) -> Option<Arc<Shell>> {
        let shell = self.shells.read().get(id).cloned()?;
        shell.touch();

        Some(shell)
    }

    pub fn create(&self) -> (String, Arc<Shell>) {
        let id = Uuid::new_v4().to_string();
        let shell = Arc::new(Shell::new(self.identity.clone()));

        self.shells.write().insert(id.clone(), shell.clone());
        debug!(shell = %id, "Shell created");

        (id, shell)
    }

    pub fn count(&self) -> usize {
        self.shells.read().len()
    }

    /// Drops every shell idle for at least the configured timeout. Returns how many went.
    pub fn evict_idle(&self) -> usize {
        let mut shells = self.shells.write();
        let before = shells.len();

        shells.retain(|_, shell| shell.idle_for() < self.idle);
        before - shells.len()
    }
}

pub async fn sweep_idle(state: Arc<AppState>) {
    let period = (state.config.shell_idle / 4).max(Duration::from_secs(1));
    let mut ticker = interval(period);

    loop {
        ticker.tick().await;

        let evicted = state.shells.evict_idle();
        if evicted > 0 {
            info!(evicted, remaining = state.shells.count(), "Evicted idle shells");
        }
    }
}

/// The shell behind the request's cookie, created on the spot when missing or expired.
pub struct Visitor {
    pub id: String,
    pub shell: Arc<Shell>,
    fresh: bool,
}

impl Visitor {
    /// Attaches the visitor cookie to `response` when the shell was just created.
    pub fn reply(&self, response: impl IntoResponse) -> Response {
        let mut response = response.into_response();

        if self.fresh {
            if let Ok(cookie) = HeaderValue::from_str(&build_session_cookie(&self.id)) {
                response.headers_mut().append(SET_COOKIE, cookie);
            }
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for Visitor {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        if let Some(id) = session_cookie(&parts.headers) {
            if let Some(shell) = state.shells.get(id) {
                return Ok(Self {
                    id: id.to_string(),
                    shell,
                    fresh: false,
                });
            }
        }

        let (id, shell) = state.shells.create();
        Ok(Self {
            id,
            shell,
            fresh: true,
        })
    }
}

/// The shell behind the request's cookie, if there is one. Never creates a shell.
pub struct Guest(pub Option<Arc<Shell>>);

impl FromRequestParts<Arc<AppState>> for Guest {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let shell = session_cookie(&parts.headers).and_then(|id| state.shells.get(id));

        Ok(Self(shell))
    }
}
