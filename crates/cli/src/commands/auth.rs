//! Account commands.
//!
//! Passwords are read from flags or the `HEIRLOOM_PASSWORD` /
//! `HEIRLOOM_NEW_PASSWORD` environment variables so they stay out of shell
//! history when needed.

use clap::Subcommand;
use heirloom_storefront::auth::AuthError;
use heirloom_storefront::error::AppError;
use heirloom_storefront::state::Storefront;

use crate::output;

#[derive(Subcommand)]
pub enum AuthAction {
    /// Sign in
    Login {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "HEIRLOOM_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Create an account and sign in
    Register {
        #[arg(short, long)]
        email: String,
        #[arg(short, long, env = "HEIRLOOM_PASSWORD", hide_env_values = true)]
        password: String,
        #[arg(long, default_value = "")]
        first_name: String,
        #[arg(long, default_value = "")]
        last_name: String,
    },
    /// Sign out
    Logout,
    /// Show the signed-in account
    Me,
    /// Change the password
    Password {
        #[arg(long, env = "HEIRLOOM_PASSWORD", hide_env_values = true)]
        current: String,
        #[arg(long = "new", env = "HEIRLOOM_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },
    /// Request a password reset email
    Forgot {
        #[arg(short, long)]
        email: String,
    },
    /// Set a new password with a reset token
    Reset {
        /// Token from the reset email
        token: String,
        #[arg(long = "new", env = "HEIRLOOM_NEW_PASSWORD", hide_env_values = true)]
        new_password: String,
    },
}

pub async fn run(action: AuthAction, state: &Storefront) -> Result<(), AppError> {
    let auth = state.auth();
    match action {
        AuthAction::Login { email, password } => {
            let user = auth.login(&email, &password).await?;
            output::line(&format!("Signed in as {}.", user.display_name()));
        }
        AuthAction::Register {
            email,
            password,
            first_name,
            last_name,
        } => {
            let user = auth
                .register(&email, &password, &first_name, &last_name)
                .await?;
            output::line(&format!("Welcome, {}.", user.display_name()));
        }
        AuthAction::Logout => {
            auth.logout().await?;
            output::line("Signed out.");
        }
        AuthAction::Me => {
            let user = match auth.user() {
                Some(user) => user,
                None => auth.me().await?,
            };
            output::user(&user);
        }
        AuthAction::Password {
            current,
            new_password,
        } => {
            auth.update_password(&current, &new_password).await?;
            output::line("Password updated.");
        }
        AuthAction::Forgot { email } => {
            let reset_token = auth.forgot_password(&email).await?;
            output::line("If that address has an account, a reset link is on its way.");
            // Development backends hand the token back directly
            if let Some(token) = reset_token {
                output::line(&format!("Reset token: {token}"));
            }
        }
        AuthAction::Reset {
            token,
            new_password,
        } => {
            auth.reset_password(&token, &new_password).await?;
            output::line("Password reset. You can sign in now.");
        }
    }
    Ok(())
}

/// Fail early for commands that need a signed-in user.
pub fn require_login(state: &Storefront) -> Result<(), AppError> {
    if state.auth().is_authenticated() {
        Ok(())
    } else {
        Err(AuthError::NotSignedIn.into())
    }
}
