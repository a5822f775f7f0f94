//! Auth gateway for the `/auth/*` endpoints.
//!
//! These methods only move requests and responses. Token persistence and
//! password policy live in [`crate::auth::AuthSession`].

use reqwest::Method;
use serde::Serialize;
use tracing::instrument;

use super::types::AuthResponse;
use super::{ApiClient, ApiError};

/// Body of `POST /auth/register`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
    pub first_name: &'a str,
    pub last_name: &'a str,
}

/// Body of `POST /auth/login`.
#[derive(Serialize)]
pub struct LoginRequest<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Body of `PUT /auth/update-password`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdatePasswordRequest<'a> {
    pub current_password: &'a str,
    pub new_password: &'a str,
}

/// Body of `POST /auth/forgot-password`.
#[derive(Serialize)]
pub struct ForgotPasswordRequest<'a> {
    pub email: &'a str,
}

/// Body of `POST /auth/reset-password`.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest<'a> {
    pub token: &'a str,
    pub new_password: &'a str,
}

impl ApiClient {
    /// Create an account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the backend rejects it.
    #[instrument(skip_all)]
    pub async fn register(&self, body: &RegisterRequest<'_>) -> Result<AuthResponse, ApiError> {
        self.auth_call(Method::POST, "register", Some(body)).await
    }

    /// Exchange credentials for a token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the credentials are rejected.
    #[instrument(skip_all)]
    pub async fn login(&self, body: &LoginRequest<'_>) -> Result<AuthResponse, ApiError> {
        self.auth_call(Method::POST, "login", Some(body)).await
    }

    /// Fetch the profile behind the current bearer token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or no valid token is installed.
    #[instrument(skip_all)]
    pub async fn me(&self) -> Result<AuthResponse, ApiError> {
        self.auth_call::<()>(Method::GET, "me", None).await
    }

    /// End the server-side session.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn logout(&self) -> Result<AuthResponse, ApiError> {
        self.auth_call::<()>(Method::POST, "logout", None).await
    }

    /// Change the password of the signed-in account.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the current password is wrong.
    #[instrument(skip_all)]
    pub async fn update_password(
        &self,
        body: &UpdatePasswordRequest<'_>,
    ) -> Result<AuthResponse, ApiError> {
        self.auth_call(Method::PUT, "update-password", Some(body))
            .await
    }

    /// Ask for a password reset email.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails.
    #[instrument(skip_all)]
    pub async fn forgot_password(
        &self,
        body: &ForgotPasswordRequest<'_>,
    ) -> Result<AuthResponse, ApiError> {
        self.auth_call(Method::POST, "forgot-password", Some(body))
            .await
    }

    /// Set a new password using a reset token.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the token is invalid.
    #[instrument(skip_all)]
    pub async fn reset_password(
        &self,
        body: &ResetPasswordRequest<'_>,
    ) -> Result<AuthResponse, ApiError> {
        self.auth_call(Method::POST, "reset-password", Some(body))
            .await
    }

    async fn auth_call<B: Serialize + Sync>(
        &self,
        method: Method,
        action: &str,
        body: Option<&B>,
    ) -> Result<AuthResponse, ApiError> {
        let url = self.endpoint(&["auth", action])?;
        let mut request = self.request(method, url);
        if let Some(body) = body {
            request = request.json(body);
        }
        self.send_json(request).await
    }
}
