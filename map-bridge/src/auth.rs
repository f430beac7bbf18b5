//! Sign-in/sign-up flow around an external identity provider.
//!
//! The provider itself lives outside this crate; only its failure codes are
//! translated into messages fit for a user-facing alert.

use async_trait::async_trait;

use crate::notice::Notice;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    SignIn,
    SignUp,
}

impl AuthMode {
    fn failure_title(self) -> &'static str {
        match self {
            AuthMode::SignIn => "Login failed",
            AuthMode::SignUp => "Sign up failed",
        }
    }

    fn success_message(self) -> &'static str {
        match self {
            AuthMode::SignIn => "Logged in successfully",
            AuthMode::SignUp => "Account created successfully!",
        }
    }
}

/// Provider failure codes with a friendlier message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    InvalidEmail,
    MissingPassword,
    WeakPassword,
    EmailAlreadyInUse,
    UserNotFound,
    InvalidCredential,
    WrongPassword,
    TooManyRequests,
    NetworkRequestFailed,
}

impl AuthErrorCode {
    pub fn parse(code: &str) -> Option<Self> {
        let code = code.strip_prefix("auth/").unwrap_or(code);
        Some(match code {
            "invalid-email" => Self::InvalidEmail,
            "missing-password" => Self::MissingPassword,
            "weak-password" => Self::WeakPassword,
            "email-already-in-use" => Self::EmailAlreadyInUse,
            "user-not-found" => Self::UserNotFound,
            "invalid-credential" => Self::InvalidCredential,
            "wrong-password" => Self::WrongPassword,
            "too-many-requests" => Self::TooManyRequests,
            "network-request-failed" => Self::NetworkRequestFailed,
            _ => return None,
        })
    }

    pub fn readable(self) -> &'static str {
        match self {
            Self::InvalidEmail => "Enter a valid email address",
            Self::MissingPassword => "Enter your password",
            Self::WeakPassword => "Password should be at least 6 characters",
            Self::EmailAlreadyInUse => "Email is already in use",
            Self::UserNotFound | Self::InvalidCredential | Self::WrongPassword => {
                "Incorrect email or password"
            }
            Self::TooManyRequests => "Too many attempts. Try again later",
            Self::NetworkRequestFailed => "Network error. Check your connection",
        }
    }
}

/// What the provider reported when it refused the request.
#[derive(Debug, Clone, thiserror::Error, PartialEq, Eq)]
#[error("{code}: {message}")]
pub struct AuthFailure {
    pub code: String,
    pub message: String,
}

impl AuthFailure {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }

    /// Mapped message for known codes, the provider's own text otherwise.
    pub fn readable(&self) -> String {
        match AuthErrorCode::parse(&self.code) {
            Some(code) => code.readable().to_string(),
            None => self.message.clone(),
        }
    }
}

#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<(), AuthFailure>;
    async fn sign_up(&self, email: &str, password: &str) -> Result<(), AuthFailure>;
}

/// Run one sign-in or sign-up attempt and describe the result.
///
/// Empty credentials never reach the provider.
pub async fn authenticate(
    provider: &dyn AuthProvider,
    mode: AuthMode,
    email: &str,
    password: &str,
) -> Notice {
    let email = email.trim();
    if email.is_empty() || password.is_empty() {
        return Notice::error("Missing info", "Please enter email and password");
    }

    let result = match mode {
        AuthMode::SignIn => provider.sign_in(email, password).await,
        AuthMode::SignUp => provider.sign_up(email, password).await,
    };

    match result {
        Ok(()) => {
            tracing::info!(?mode, "authenticated");
            Notice::info("Success", mode.success_message())
        }
        Err(failure) => {
            tracing::warn!(?mode, code = %failure.code, "authentication failed");
            Notice::error(mode.failure_title(), failure.readable())
        }
    }
}
