//! Authentication session.
//!
//! Wraps the `/auth/*` gateway with the client-side rules: password policy,
//! token persistence under [`keys::AUTH_TOKEN`], bearer-token installation on
//! the shared [`ApiClient`], and Sentry user context.

mod error;

pub use error::AuthError;

use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use heirloom_core::Email;
use secrecy::SecretString;
use tracing::instrument;

use crate::api::auth::{
    ForgotPasswordRequest, LoginRequest, RegisterRequest, ResetPasswordRequest,
    UpdatePasswordRequest,
};
use crate::api::{ApiClient, AuthResponse, DEFAULT_ERROR_MESSAGE, User};
use crate::error::{clear_sentry_user, set_sentry_user};
use crate::storage::{LocalStorage, keys};

/// Minimum password length.
pub const MIN_PASSWORD_LENGTH: usize = 8;

/// Signed-in state shared by every command that needs a user.
pub struct AuthSession {
    client: ApiClient,
    storage: Arc<LocalStorage>,
    user: Mutex<Option<User>>,
}

impl std::fmt::Debug for AuthSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthSession")
            .field("authenticated", &self.is_authenticated())
            .field("user", &*self.lock())
            .finish_non_exhaustive()
    }
}

impl AuthSession {
    /// Create a session over a client and storage. Nothing is restored until
    /// [`Self::restore`] is called.
    #[must_use]
    pub fn new(client: ApiClient, storage: Arc<LocalStorage>) -> Self {
        Self {
            client,
            storage,
            user: Mutex::new(None),
        }
    }

    /// Returns `true` if a bearer token is installed.
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.client.has_token()
    }

    /// The last user the backend confirmed, if any.
    #[must_use]
    pub fn user(&self) -> Option<User> {
        self.lock().clone()
    }

    /// Reinstall a persisted token and load its profile.
    ///
    /// A token the backend no longer accepts is removed from storage. Returns
    /// the restored user, or `None` if nobody was signed in.
    ///
    /// # Errors
    ///
    /// Returns an error only if the stale token cannot be removed.
    #[instrument(skip(self))]
    pub async fn restore(&self) -> Result<Option<User>, AuthError> {
        let Some(token) = self
            .storage
            .get(keys::AUTH_TOKEN)
            .filter(|t| !t.trim().is_empty())
        else {
            return Ok(None);
        };

        self.client.set_token(Some(SecretString::from(token)));
        match self.me().await {
            Ok(user) => Ok(Some(user)),
            Err(e) => {
                tracing::warn!(error = %e, "Stored auth token rejected, signing out");
                self.forget()?;
                Ok(None)
            }
        }
    }

    /// Create an account and sign in with it.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or `AuthError::WeakPassword` before
    /// any request is made, or the backend's rejection.
    #[instrument(skip_all)]
    pub async fn register(
        &self,
        email: &str,
        password: &str,
        first_name: &str,
        last_name: &str,
    ) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        validate_password(password)?;

        let response = self
            .client
            .register(&RegisterRequest {
                email: email.as_str(),
                password,
                first_name: first_name.trim(),
                last_name: last_name.trim(),
            })
            .await?;
        self.accept(response)
    }

    /// Sign in with email and password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` for a malformed address, otherwise
    /// the backend's rejection.
    #[instrument(skip_all)]
    pub async fn login(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let email = Email::parse(email)?;
        let response = self
            .client
            .login(&LoginRequest {
                email: email.as_str(),
                password,
            })
            .await?;
        self.accept(response)
    }

    /// Refresh the profile of the signed-in user.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::NotSignedIn` without a token, otherwise the
    /// backend's rejection.
    pub async fn me(&self) -> Result<User, AuthError> {
        if !self.is_authenticated() {
            return Err(AuthError::NotSignedIn);
        }
        let response = checked(self.client.me().await?)?;
        let user = response.user().cloned().ok_or(AuthError::Incomplete("user"))?;
        self.remember(&user);
        Ok(user)
    }

    /// Sign out.
    ///
    /// The local token is always dropped; a failed server-side logout is only
    /// logged.
    ///
    /// # Errors
    ///
    /// Returns an error if the token cannot be removed from storage.
    #[instrument(skip(self))]
    pub async fn logout(&self) -> Result<(), AuthError> {
        if self.is_authenticated()
            && let Err(e) = self.client.logout().await
        {
            tracing::warn!(error = %e, "Server-side logout failed");
        }
        self.forget()
    }

    /// Change the signed-in user's password.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` before any request, `NotSignedIn`
    /// without a token, otherwise the backend's rejection.
    #[instrument(skip_all)]
    pub async fn update_password(
        &self,
        current_password: &str,
        new_password: &str,
    ) -> Result<(), AuthError> {
        validate_password(new_password)?;
        if !self.is_authenticated() {
            return Err(AuthError::NotSignedIn);
        }
        let response = checked(
            self.client
                .update_password(&UpdatePasswordRequest {
                    current_password,
                    new_password,
                })
                .await?,
        )?;
        // Some backends rotate the token on password change.
        if let Some(token) = response.token {
            self.install(token)?;
        }
        Ok(())
    }

    /// Request a reset email. Returns the reset token when the backend
    /// exposes it (development builds do).
    ///
    /// # Errors
    ///
    /// Returns `AuthError::InvalidEmail` or the backend's rejection.
    #[instrument(skip_all)]
    pub async fn forgot_password(&self, email: &str) -> Result<Option<String>, AuthError> {
        let email = Email::parse(email)?;
        let response = checked(
            self.client
                .forgot_password(&ForgotPasswordRequest {
                    email: email.as_str(),
                })
                .await?,
        )?;
        Ok(response.reset_token)
    }

    /// Set a new password with a reset token.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::WeakPassword` before any request, otherwise the
    /// backend's rejection.
    #[instrument(skip_all)]
    pub async fn reset_password(&self, token: &str, new_password: &str) -> Result<(), AuthError> {
        validate_password(new_password)?;
        checked(
            self.client
                .reset_password(&ResetPasswordRequest {
                    token: token.trim(),
                    new_password,
                })
                .await?,
        )?;
        Ok(())
    }

    fn accept(&self, response: AuthResponse) -> Result<User, AuthError> {
        let response = checked(response)?;
        let user = response.user().cloned().ok_or(AuthError::Incomplete("user"))?;
        let token = response.token.ok_or(AuthError::Incomplete("token"))?;
        self.install(token)?;
        self.remember(&user);
        tracing::info!(user_id = %user.id, "Signed in");
        Ok(user)
    }

    fn install(&self, token: String) -> Result<(), AuthError> {
        self.storage.set(keys::AUTH_TOKEN, token.clone())?;
        self.client.set_token(Some(SecretString::from(token)));
        Ok(())
    }

    fn remember(&self, user: &User) {
        set_sentry_user(&user.id, Some(&user.email));
        *self.lock() = Some(user.clone());
    }

    fn forget(&self) -> Result<(), AuthError> {
        self.client.set_token(None);
        *self.lock() = None;
        clear_sentry_user();
        self.storage.remove(keys::AUTH_TOKEN)?;
        Ok(())
    }

    fn lock(&self) -> MutexGuard<'_, Option<User>> {
        self.user.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Turn a `success: false` answer into an error carrying the server message.
fn checked(response: AuthResponse) -> Result<AuthResponse, AuthError> {
    if response.success {
        return Ok(response);
    }
    Err(AuthError::Rejected(
        response
            .message
            .filter(|m| !m.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ERROR_MESSAGE.to_string()),
    ))
}

/// Validate password requirements.
///
/// # Errors
///
/// Returns `AuthError::WeakPassword` if the password is shorter than
/// [`MIN_PASSWORD_LENGTH`] characters.
pub fn validate_password(password: &str) -> Result<(), AuthError> {
    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(AuthError::WeakPassword(format!(
            "password must be at least {MIN_PASSWORD_LENGTH} characters"
        )));
    }
    Ok(())
}
