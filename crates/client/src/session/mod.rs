//! Authenticated session store.
//!
//! Owns the current user and bearer token through the
//! `Unauthenticated -> Authenticating -> Authenticated` lifecycle, and keeps
//! the persisted credential file consistent with the in-memory state: the
//! two are written/cleared as one step relative to every transition, so at
//! rest they never disagree.
//!
//! Local validation (email shape, password rules) happens here before any
//! network call; everything remote arrives pre-classified as
//! [`ApiError`](crate::gateway::ApiError). The state mutex is held only for
//! synchronous transitions, never across a gateway call - while a call is in
//! flight the store reads as `Authenticating`.

pub mod storage;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use secrecy::SecretString;
use tokio::sync::broadcast;
use tracing::{debug, warn};

use quitanda_core::{Email, EmailError, UserId};

use crate::gateway::types::RegisterPayload;
use crate::gateway::{ApiError, RemoteGateway};
use crate::models::User;
use storage::{CredentialStore, PersistedCredentials, StorageError};

const EVENT_CHANNEL_CAPACITY: usize = 16;

/// Minimum password length for registration.
const MIN_PASSWORD_LENGTH: usize = 8;

/// A discrete session change, published to subscribers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEvent {
    /// A user logged in, registered, or was restored from persisted
    /// credentials.
    Authenticated(UserId),
    /// The session ended (logout or detected auth failure).
    LoggedOut,
}

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// The email is not structurally valid. Local check, no network call.
    #[error("invalid email: {0}")]
    InvalidEmail(#[from] EmailError),

    /// The password does not meet requirements. Local check.
    #[error("password validation failed: {0}")]
    WeakPassword(String),

    /// Password and confirmation differ. Local check.
    #[error("passwords do not match")]
    PasswordMismatch,

    /// The profile name is empty. Local check.
    #[error("name is required")]
    NameRequired,

    /// The remote call failed; see the classified error.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// Credentials could not be persisted. The session stays
    /// unauthenticated so memory and disk cannot disagree.
    #[error("credential storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Registration form data.
#[derive(Debug, Clone)]
pub struct RegisterProfile {
    pub name: String,
    pub email: String,
    pub password: String,
    pub password_confirmation: String,
    pub phone: Option<String>,
}

enum AuthState {
    Unauthenticated,
    /// A login/register/restore call is in flight.
    Authenticating,
    Authenticated { user: User, token: SecretString },
}

/// Authentication state store with persisted credentials.
///
/// Shareable by handle: all operations take `&self`.
pub struct SessionStore {
    state: Mutex<AuthState>,
    gateway: Arc<dyn RemoteGateway>,
    storage: Arc<dyn CredentialStore>,
    events: broadcast::Sender<SessionEvent>,
}

impl SessionStore {
    /// Create an unauthenticated session store.
    #[must_use]
    pub fn new(gateway: Arc<dyn RemoteGateway>, storage: Arc<dyn CredentialStore>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            state: Mutex::new(AuthState::Unauthenticated),
            gateway,
            storage,
            events,
        }
    }

    fn lock(&self) -> MutexGuard<'_, AuthState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Subscribe to session change events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<SessionEvent> {
        self.events.subscribe()
    }

    /// `true` iff the current state is `Authenticated`.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(*self.lock(), AuthState::Authenticated { .. })
    }

    /// `true` while a login/register/restore call is in flight.
    #[must_use]
    pub fn is_authenticating(&self) -> bool {
        matches!(*self.lock(), AuthState::Authenticating)
    }

    /// The authenticated user, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        match &*self.lock() {
            AuthState::Authenticated { user, .. } => Some(user.clone()),
            _ => None,
        }
    }

    /// The current bearer token, if authenticated.
    #[must_use]
    pub fn token(&self) -> Option<SecretString> {
        match &*self.lock() {
            AuthState::Authenticated { token, .. } => Some(token.clone()),
            _ => None,
        }
    }

    /// The persisted user record, for display before `restore` completes.
    ///
    /// This is a cache, not an authenticated identity: only a successful
    /// [`restore`](Self::restore) makes the session authenticated.
    #[must_use]
    pub fn cached_user(&self) -> Option<User> {
        self.storage
            .load()
            .ok()
            .flatten()
            .map(|credentials| credentials.user)
    }

    /// Try to restore a session from persisted credentials.
    ///
    /// If a token is on disk, validates it by fetching the current user.
    /// Any failure - missing token, network error, expired token - discards
    /// the persisted credentials and leaves the session unauthenticated;
    /// details are logged. Idempotent: safe to call again after a failure.
    ///
    /// Returns whether the session is authenticated afterwards.
    pub async fn restore(&self) -> bool {
        let credentials = match self.storage.load() {
            Ok(Some(credentials)) => credentials,
            Ok(None) => {
                debug!("no persisted credentials to restore");
                return false;
            }
            Err(e) => {
                warn!(error = %e, "failed to read persisted credentials; discarding");
                self.discard_credentials();
                *self.lock() = AuthState::Unauthenticated;
                return false;
            }
        };

        *self.lock() = AuthState::Authenticating;
        let token = SecretString::from(credentials.token);

        match self.gateway.current_user(&token).await {
            Ok(user) => {
                let user_id = user.id;
                *self.lock() = AuthState::Authenticated { user, token };
                debug!(%user_id, "session restored from persisted credentials");
                self.publish(SessionEvent::Authenticated(user_id));
                true
            }
            Err(e) => {
                warn!(error = %e, "session restore failed; discarding persisted credentials");
                self.discard_credentials();
                *self.lock() = AuthState::Unauthenticated;
                false
            }
        }
    }

    /// Log in with email and password.
    ///
    /// On success the credentials are persisted and the session becomes
    /// authenticated. On failure the session stays unauthenticated and the
    /// classified error is returned - a failed login never looks like a
    /// success.
    ///
    /// # Errors
    ///
    /// [`SessionError::InvalidEmail`] before any network call;
    /// [`SessionError::Api`] for remote failures (invalid credentials,
    /// connection, server); [`SessionError::Storage`] if persisting fails.
    pub async fn login(&self, email: &str, password: &str) -> Result<(), SessionError> {
        let email = Email::parse(email)?;

        *self.lock() = AuthState::Authenticating;
        match self.gateway.login(&email, password).await {
            Ok(auth) => self.complete_authentication(auth.user, auth.token),
            Err(e) => {
                *self.lock() = AuthState::Unauthenticated;
                Err(e.into())
            }
        }
    }

    /// Register a new account and log in with it.
    ///
    /// # Errors
    ///
    /// Local validation errors ([`SessionError::NameRequired`],
    /// [`SessionError::InvalidEmail`], [`SessionError::WeakPassword`],
    /// [`SessionError::PasswordMismatch`]) before any network call;
    /// otherwise as [`login`](Self::login), with
    /// `Auth(EmailAlreadyRegistered)` when the email is taken.
    pub async fn register(&self, profile: RegisterProfile) -> Result<(), SessionError> {
        let payload = validate_profile(profile)?;

        *self.lock() = AuthState::Authenticating;
        match self.gateway.register(&payload).await {
            Ok(auth) => self.complete_authentication(auth.user, auth.token),
            Err(e) => {
                *self.lock() = AuthState::Unauthenticated;
                Err(e.into())
            }
        }
    }

    /// Log out.
    ///
    /// The remote logout is best-effort: its failure is logged and ignored.
    /// Persisted credentials are cleared and the session transitions to
    /// unauthenticated unconditionally.
    pub async fn logout(&self) {
        if let Some(token) = self.token()
            && let Err(e) = self.gateway.logout(&token).await
        {
            warn!(error = %e, "remote logout failed; clearing local session anyway");
        }

        self.clear_local_session();
    }

    /// Drop the session locally without calling the remote side.
    ///
    /// Used when an expired/invalid token is detected at the gateway
    /// boundary - there is no point telling the server to invalidate a token
    /// it already rejected.
    pub fn invalidate(&self) {
        debug!("invalidating local session");
        self.clear_local_session();
    }

    /// Persist credentials, then transition to authenticated.
    ///
    /// The write happens first: if it fails the session stays
    /// unauthenticated, so memory never claims a session that disk lost.
    fn complete_authentication(&self, user: User, token: String) -> Result<(), SessionError> {
        let persisted = PersistedCredentials {
            token: token.clone(),
            user: user.clone(),
        };
        if let Err(e) = self.storage.store(&persisted) {
            *self.lock() = AuthState::Unauthenticated;
            return Err(e.into());
        }

        let user_id = user.id;
        *self.lock() = AuthState::Authenticated {
            user,
            token: SecretString::from(token),
        };
        debug!(%user_id, "session authenticated");
        self.publish(SessionEvent::Authenticated(user_id));
        Ok(())
    }

    fn clear_local_session(&self) {
        self.discard_credentials();
        let was_active = {
            let mut state = self.lock();
            let was_active = !matches!(*state, AuthState::Unauthenticated);
            *state = AuthState::Unauthenticated;
            was_active
        };
        if was_active {
            self.publish(SessionEvent::LoggedOut);
        }
    }

    fn discard_credentials(&self) {
        if let Err(e) = self.storage.clear() {
            warn!(error = %e, "failed to clear persisted credentials");
        }
    }

    fn publish(&self, event: SessionEvent) {
        let _ = self.events.send(event);
    }
}

/// Validate registration input and build the wire payload.
fn validate_profile(profile: RegisterProfile) -> Result<RegisterPayload, SessionError> {
    if profile.name.trim().is_empty() {
        return Err(SessionError::NameRequired);
    }

    let email = Email::parse(&profile.email)?;

    if profile.password.len() < MIN_PASSWORD_LENGTH {
        return Err(SessionError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }

    if profile.password != profile.password_confirmation {
        return Err(SessionError::PasswordMismatch);
    }

    Ok(RegisterPayload {
        name: profile.name,
        email: email.into_inner(),
        password: profile.password,
        phone: profile.phone.filter(|phone| !phone.trim().is_empty()),
    })
}
