//! Session tracking on top of an external auth provider.
//!
//! The provider pushes state changes through
//! [`AuthManager::handle_auth_state_changed`]; the manager resolves a token for
//! the user before caching the new state and handing it to the registered
//! listener. A listener registered late receives the cached state right away.

use crate::api::TokenSource;
use crate::errors::AuthError;
use crate::feedback::Notifier;
use async_trait::async_trait;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{info, warn};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthUser {
    pub uid: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum AuthSession {
    #[default]
    SignedOut,
    SignedIn {
        user: AuthUser,
        /// `None` when the token lookup failed; requests then go out
        /// unauthenticated.
        token: Option<String>,
    },
}

impl AuthSession {
    pub fn user(&self) -> Option<&AuthUser> {
        match self {
            AuthSession::SignedIn { user, .. } => Some(user),
            AuthSession::SignedOut => None,
        }
    }

    pub fn is_signed_in(&self) -> bool {
        self.user().is_some()
    }
}

/// Capability set consumed from the identity provider.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn current_user(&self) -> Option<AuthUser>;
    async fn id_token(&self, user: &AuthUser) -> Result<String, AuthError>;
    async fn sign_in_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError>;
    async fn create_user_with_email_and_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<AuthUser, AuthError>;
    async fn update_profile(&self, user: &AuthUser, display_name: &str) -> Result<(), AuthError>;
    async fn sign_out(&self) -> Result<(), AuthError>;
}

pub type AuthListener = Box<dyn Fn(&AuthSession) + Send + Sync>;

pub fn humanize_error(code: Option<&str>) -> &'static str {
    match code {
        Some("auth/email-already-in-use") => "This email is already in use.",
        Some("auth/invalid-email") => "Please enter a valid email address.",
        Some("auth/weak-password") => "Password should be at least 6 characters long.",
        Some("auth/user-not-found") | Some("auth/wrong-password") => "Invalid email or password.",
        _ => "Authentication failed. Please try again.",
    }
}

pub struct AuthManager {
    provider: Arc<dyn AuthProvider>,
    toasts: Arc<dyn Notifier>,
    latest: Mutex<Option<AuthSession>>,
    listener: Mutex<Option<AuthListener>>,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

impl AuthManager {
    pub fn new(provider: Arc<dyn AuthProvider>, toasts: Arc<dyn Notifier>) -> Self {
        Self {
            provider,
            toasts,
            latest: Mutex::new(None),
            listener: Mutex::new(None),
        }
    }

    /// Latest known state; `SignedOut` until the provider reports anything.
    pub fn session(&self) -> AuthSession {
        lock(&self.latest).clone().unwrap_or_default()
    }

    /// Replays the latest state, then installs the listener. Both happen under
    /// the listener lock, so a change racing the registration is delivered
    /// after the replay instead of being dropped.
    pub fn register(&self, listener: AuthListener) {
        let mut slot = lock(&self.listener);
        let replay = lock(&self.latest).clone();
        if let Some(session) = replay {
            listener(&session);
        }
        *slot = Some(listener);
    }

    pub async fn handle_auth_state_changed(&self, user: Option<AuthUser>) {
        let session = match user {
            Some(user) => {
                let token = match self.provider.id_token(&user).await {
                    Ok(token) => Some(token),
                    Err(err) => {
                        warn!("failed to resolve id token for {}: {err}", user.uid);
                        None
                    }
                };
                AuthSession::SignedIn { user, token }
            }
            None => AuthSession::SignedOut,
        };

        // listener before latest, same order as register
        let listener = lock(&self.listener);
        *lock(&self.latest) = Some(session.clone());
        if let Some(listener) = listener.as_ref() {
            listener(&session);
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<AuthUser, AuthError> {
        match self
            .provider
            .sign_in_with_email_and_password(email, password)
            .await
        {
            Ok(user) => {
                info!("signed in as {}", user.uid);
                self.toasts.success("Welcome back!");
                self.handle_auth_state_changed(Some(user.clone())).await;
                Ok(user)
            }
            Err(err) => {
                warn!("sign in failed: {err}");
                self.toasts.error(humanize_error(err.code.as_deref()));
                Err(err)
            }
        }
    }

    pub async fn sign_up(
        &self,
        email: &str,
        password: &str,
        display_name: Option<&str>,
    ) -> Result<AuthUser, AuthError> {
        let mut user = match self
            .provider
            .create_user_with_email_and_password(email, password)
            .await
        {
            Ok(user) => user,
            Err(err) => {
                warn!("sign up failed: {err}");
                self.toasts.error(humanize_error(err.code.as_deref()));
                return Err(err);
            }
        };

        if let Some(name) = display_name.map(str::trim).filter(|name| !name.is_empty()) {
            match self.provider.update_profile(&user, name).await {
                Ok(()) => user.display_name = Some(name.to_string()),
                Err(err) => warn!("could not set display name: {err}"),
            }
        }

        self.toasts.success("Account created successfully!");
        self.handle_auth_state_changed(Some(user.clone())).await;
        Ok(user)
    }

    pub async fn logout(&self) -> Result<(), AuthError> {
        match self.provider.sign_out().await {
            Ok(()) => {
                self.toasts.success("Signed out successfully.");
                self.handle_auth_state_changed(None).await;
                Ok(())
            }
            Err(err) => {
                warn!("sign out failed: {err}");
                self.toasts.error("Failed to sign out.");
                Err(err)
            }
        }
    }
}

#[async_trait]
impl TokenSource for AuthManager {
    /// Always asks the provider for a fresh token.
    async fn id_token(&self) -> Result<Option<String>, AuthError> {
        match self.provider.current_user().await {
            Some(user) => self.provider.id_token(&user).await.map(Some),
            None => Ok(None),
        }
    }
}

/// Provider backed by a pre-issued token, e.g. one handed to the binary
/// through the environment. Interactive sign-in is not available.
#[derive(Debug, Default)]
pub struct StaticTokenProvider {
    token: Mutex<Option<String>>,
}

const STATIC_UID: &str = "static";

impl StaticTokenProvider {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: Mutex::new(token),
        }
    }

    fn unsupported() -> AuthError {
        AuthError::new(
            "auth/operation-not-allowed",
            "interactive sign-in is not available with a static token",
        )
    }
}

#[async_trait]
impl AuthProvider for StaticTokenProvider {
    async fn current_user(&self) -> Option<AuthUser> {
        lock(&self.token).as_ref().map(|_| AuthUser {
            uid: STATIC_UID.to_string(),
            email: None,
            display_name: None,
        })
    }

    async fn id_token(&self, _user: &AuthUser) -> Result<String, AuthError> {
        lock(&self.token)
            .clone()
            .ok_or_else(|| AuthError::new("auth/no-current-user", "no token configured"))
    }

    async fn sign_in_with_email_and_password(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<AuthUser, AuthError> {
        Err(Self::unsupported())
    }

    async fn create_user_with_email_and_password(
        &self,
        _email: &str,
        _password: &str,
    ) -> Result<AuthUser, AuthError> {
        Err(Self::unsupported())
    }

    async fn update_profile(&self, _user: &AuthUser, _display_name: &str) -> Result<(), AuthError> {
        Err(Self::unsupported())
    }

    async fn sign_out(&self) -> Result<(), AuthError> {
        *lock(&self.token) = None;
        Ok(())
    }
}
